//! Incremental DOM synchronization.
//!
//! A [`MutationNode`] describes the pending change of one client-side
//! element. A [`RenderSession`] turns created elements into markup, and
//! batches of updates into script that replays them on the client.

pub mod client;
pub mod error;
pub mod escape;
pub mod kind;
pub mod node;
pub mod property;
pub mod script;
pub mod session;

mod batch;
mod events;
mod markup;
mod style;

pub use client::{ClientProfile, RenderConfig, UserAgent};
pub use domsync_common::IDGenerator;
pub use error::{RenderError, RenderResult};
pub use escape::{escape, escape_into, url_encode, EscapeMode};
pub use kind::ElementKind;
pub use node::{EventAction, HideMode, Mode, MutationNode, Timeout, TimeoutEvent};
pub use property::{Property, PropertyRule};
pub use script::Phase;
pub use session::{MarkupOutput, RenderSession, ScriptOptions};
