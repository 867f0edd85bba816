use crate::batch;
use crate::client::{ClientProfile, RenderConfig};
use crate::error::RenderResult;
use crate::escape::{escaped, EscapeMode};
use crate::markup;
use crate::node::{MutationNode, TimeoutEvent};
use domsync_common::IDGenerator;
use std::fmt::Write;

/// Options of the script renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptOptions {
    /// Shortcut single-manipulation updates (a `display` change or one
    /// deferred call) to one helper call. The output is equivalent to the
    /// general rendering.
    pub fast_path: bool,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self { fast_path: true }
    }
}

/// Everything produced when rendering a created element as markup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkupOutput {
    pub html: String,
    /// Script to run once the markup is in the document
    pub script: String,
    pub timeouts: Vec<TimeoutEvent>,
}

/// State shared by the renderers during one or more passes.
///
/// Generated variable and function names are unique per session.
#[derive(Debug, Clone)]
pub struct RenderSession {
    pub(crate) config: RenderConfig,
    pub(crate) client: ClientProfile,
    pub(crate) ids: IDGenerator,
    pub(crate) options: ScriptOptions,
}

impl RenderSession {
    pub fn new(config: RenderConfig, client: ClientProfile) -> Self {
        Self {
            config,
            client,
            ids: IDGenerator::new(),
            options: ScriptOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScriptOptions) -> Self {
        self.options = options;
        self
    }

    /// Continue a name sequence from an earlier session
    pub fn with_ids(mut self, ids: IDGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn client(&self) -> &ClientProfile {
        &self.client
    }

    pub fn ids(&self) -> &IDGenerator {
        &self.ids
    }

    /// Render a created element, and its subtree, as markup
    pub fn render_markup(&mut self, node: MutationNode) -> RenderResult<MarkupOutput> {
        markup::render(node, self, false)
    }

    /// Render only the opening tag of a created element
    pub fn render_opening_tag(&mut self, node: MutationNode) -> RenderResult<MarkupOutput> {
        markup::render(node, self, true)
    }

    /// Render a batch of updates as one script, in Delete, Create, Update
    /// passes. Nothing is returned unless the whole batch renders.
    pub fn render_script(&mut self, nodes: Vec<MutationNode>) -> RenderResult<String> {
        batch::render(nodes, self)
    }

    /// Script registering the timers collected while rendering markup
    pub fn timeout_script(&self, timeouts: &[TimeoutEvent]) -> String {
        let mut out = String::new();
        for timeout in timeouts {
            push_timer(&mut out, &self.config, &timeout.id, timeout.delay_ms, timeout.repeat_ms);
        }
        out
    }
}

impl Default for RenderSession {
    fn default() -> Self {
        Self::new(RenderConfig::default(), ClientProfile::default())
    }
}

/// `APP._p_.addTimerEvent('id', delay,repeat);` where a one-shot timer
/// repeats every `-1` ms
pub(crate) fn push_timer(
    out: &mut String,
    config: &RenderConfig,
    id: &str,
    delay_ms: u32,
    repeat_ms: Option<u32>,
) {
    let repeat = repeat_ms.map_or(-1, i64::from);
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "{}._p_.addTimerEvent('{}', {},{});",
        config.app_class,
        escaped(id, EscapeMode::JsSingleQuoted),
        delay_ms,
        repeat
    );
}
