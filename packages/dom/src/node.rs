use crate::error::{RenderError, RenderResult};
use crate::kind::ElementKind;
use crate::property::Property;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Whether the element still has to be created or already exists client-side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Create,
    Update,
}

/// How a stub hides itself, which decides how its replacement is revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HideMode {
    /// `display: none`
    Display,
    /// `visibility: hidden` and offsets
    Visibility,
}

/// A timed callback registered client-side for an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeout {
    pub delay_ms: u32,
    /// Interval between repeats, `None` for a one-shot timer
    pub repeat_ms: Option<u32>,
}

/// Timer registration collected while rendering markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutEvent {
    pub delay_ms: u32,
    pub id: String,
    pub repeat_ms: Option<u32>,
}

/// One conditional step of an event handler
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventAction {
    /// Script condition guarding the step; empty for unconditional steps
    pub condition: String,
    pub code: String,
    /// Signal propagated to the server after `code`
    pub signal: Option<String>,
    pub exposed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct EventHandler {
    /// Signal delivered when the element is clicked without scripting
    pub signal: Option<String>,
    pub exposed: bool,
    pub actions: Vec<EventAction>,
    /// Whether the body gets the event prologue (`e`, `o`) and guards
    pub wrap: bool,
    /// Raw code appended through `add_event`
    pub appended: String,
}

/// Script attached to a node, resolved against the runtime names at render
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScriptItem {
    Code(String),
    /// `<element>.<method>;`
    Method(String),
    /// Removes the element by id
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChildInsertion {
    /// Position among the final children, `None` to append
    pub position: Option<usize>,
    pub child: MutationNode,
}

/// Child content written as literal markup after the inner markup
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FoldedChild {
    /// Markup already known to be safe
    Markup(String),
    Node(MutationNode),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Splice {
    Replace {
        node: Box<MutationNode>,
        unstub: Option<HideMode>,
    },
    InsertBefore(Box<MutationNode>),
}

/// Pending mutation of a single client-side element.
///
/// Built by a collaborator through the mutators below, then handed to one
/// renderer, which consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationNode {
    pub(crate) mode: Mode,
    pub(crate) kind: ElementKind,
    pub(crate) custom_tag: Option<String>,
    pub(crate) id: String,
    /// Script variable or expression holding the element, once known
    pub(crate) var: Option<String>,
    pub(crate) was_empty: bool,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) removed_attributes: BTreeSet<String>,
    pub(crate) properties: BTreeMap<Property, String>,
    pub(crate) min_max_size: bool,
    pub(crate) event_handlers: BTreeMap<String, EventHandler>,
    pub(crate) children_to_add: Vec<ChildInsertion>,
    pub(crate) folded_children: Vec<FoldedChild>,
    pub(crate) updated_children: Vec<MutationNode>,
    pub(crate) children_to_preserve: Vec<String>,
    pub(crate) splice: Option<Splice>,
    pub(crate) remove_children_from: Option<usize>,
    pub(crate) timeout: Option<Timeout>,
    pub(crate) deferred: Vec<ScriptItem>,
    pub(crate) even_if_deleted: Vec<ScriptItem>,
    pub(crate) unwrapped: bool,
    pub(crate) global_unfocused: bool,
    pub(crate) detach_global_focus: bool,
    pub(crate) manipulations: u32,
}

impl MutationNode {
    fn new(mode: Mode, kind: ElementKind) -> Self {
        Self {
            mode,
            kind,
            custom_tag: None,
            id: String::new(),
            var: None,
            was_empty: mode == Mode::Create,
            attributes: BTreeMap::new(),
            removed_attributes: BTreeSet::new(),
            properties: BTreeMap::new(),
            min_max_size: false,
            event_handlers: BTreeMap::new(),
            children_to_add: Vec::new(),
            folded_children: Vec::new(),
            updated_children: Vec::new(),
            children_to_preserve: Vec::new(),
            splice: None,
            remove_children_from: None,
            timeout: None,
            deferred: Vec::new(),
            even_if_deleted: Vec::new(),
            unwrapped: false,
            global_unfocused: false,
            detach_global_focus: false,
            manipulations: 0,
        }
    }

    /// A brand-new element
    pub fn create(kind: ElementKind) -> Self {
        Self::new(Mode::Create, kind)
    }

    /// An existing element addressed by id
    pub fn get_for_update(id: impl Into<String>, kind: ElementKind) -> RenderResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(RenderError::Unaddressable);
        }

        let mut node = Self::new(Mode::Update, kind);
        node.id = id;
        Ok(node)
    }

    /// An existing element addressed by a script expression
    pub fn update_given(expression: impl Into<String>, kind: ElementKind) -> RenderResult<Self> {
        let expression = expression.into();
        if expression.is_empty() {
            return Err(RenderError::Unaddressable);
        }

        let mut node = Self::new(Mode::Update, kind);
        node.var = Some(expression);
        Ok(node)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: ElementKind) {
        self.kind = kind;
    }

    /// Tag name for `ElementKind::Other`
    pub fn set_custom_tag(&mut self, tag: impl Into<String>) {
        self.kind = ElementKind::Other;
        self.custom_tag = Some(tag.into());
    }

    pub fn tag_name(&self) -> &str {
        match self.kind.tag_name() {
            Some(tag) => tag,
            None => self.custom_tag.as_deref().unwrap_or("span"),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Assign the identifier. Identifiers are immutable once set; a
    /// conflicting second assignment is ignored.
    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.id.is_empty() && self.id != id {
            warn!(current = %self.id, requested = %id, "Ignoring attempt to change an element id");
            return;
        }
        self.manipulations += 1;
        self.id = id;
    }

    /// Set the id and the `name` attribute to the same value
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.set_id(name.clone());
        self.set_attribute("name", name);
    }

    pub fn manipulation_count(&self) -> u32 {
        self.manipulations
    }

    /// Declare a created element empty (or not), which allows added children
    /// to be written as one markup string. Updates of existing elements
    /// always insert children one by one, whatever this flag says.
    pub fn set_was_empty(&mut self, empty: bool) {
        self.was_empty = empty;
    }

    pub(crate) fn can_write_inner_html(&self) -> bool {
        self.mode == Mode::Create && self.kind.accepts_bulk_rewrite()
    }

    /// Append a child. Created children of a still-empty element are folded
    /// into its literal content; updated children are rendered after this
    /// element.
    pub fn add_child(&mut self, child: MutationNode) {
        if child.mode == Mode::Create {
            self.manipulations += 2;

            if self.was_empty && self.can_write_inner_html() && !self.kind.is_self_closing() {
                self.folded_children.push(FoldedChild::Node(child));
            } else {
                self.children_to_add.push(ChildInsertion {
                    position: None,
                    child,
                });
            }
        } else {
            self.updated_children.push(child);
        }
    }

    /// Insert a created child at `position` among the final children
    pub fn insert_child_at(&mut self, child: MutationNode, position: usize) {
        self.manipulations += 1;
        self.children_to_add.push(ChildInsertion {
            position: Some(position),
            child,
        });
    }

    /// Append markup that is already safe to embed as children
    pub fn add_child_markup(&mut self, html: &str) {
        self.manipulations += 2;
        self.folded_children.push(FoldedChild::Markup(html.to_string()));
    }

    /// Keep the live child `id` across a rewrite of this element's content
    pub fn save_child(&mut self, id: impl Into<String>) {
        self.children_to_preserve.push(id.into());
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.manipulations += 1;
        self.removed_attributes.remove(&name);
        self.attributes.insert(name, value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn remove_attribute(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.manipulations += 1;
        self.attributes.remove(&name);
        self.removed_attributes.insert(name);
    }

    /// Set a managed property. Inner markup accumulates: a second value is
    /// appended to the first.
    pub fn set_property(&mut self, property: Property, value: impl Into<String>) {
        let value = value.into();
        self.manipulations += 1;

        if property.is_min_max_size() {
            self.min_max_size = true;
        }

        match self.properties.get_mut(&property) {
            Some(existing) if property == Property::InnerHtml => existing.push_str(&value),
            _ => {
                self.properties.insert(property, value);
            }
        }
    }

    pub fn set_properties<I, V>(&mut self, properties: I)
    where
        I: IntoIterator<Item = (Property, V)>,
        V: Into<String>,
    {
        for (property, value) in properties {
            self.set_property(property, value);
        }
    }

    pub fn property(&self, property: Property) -> Option<&str> {
        self.properties.get(&property).map(String::as_str)
    }

    pub fn remove_property(&mut self, property: Property) {
        if self.properties.remove(&property).is_some() {
            self.manipulations = self.manipulations.saturating_sub(1);
        }
    }

    pub fn clear_properties(&mut self) {
        self.manipulations = self
            .manipulations
            .saturating_sub(self.properties.len() as u32);
        self.properties.clear();
    }

    /// Add `word` to a space-separated property value unless present
    pub fn add_property_word(&mut self, property: Property, word: &str) {
        let current = self.property(property).unwrap_or("");
        if current.split_whitespace().any(|w| w == word) {
            return;
        }

        let value = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        self.properties.remove(&property);
        self.set_property(property, value);
    }

    /// Install a handler for `event`. Unless empty, the body runs with `e`
    /// bound to the event and `o` to the element; an exposed handler then
    /// propagates `signal` to the server.
    pub fn set_event(
        &mut self,
        event: impl Into<String>,
        code: impl Into<String>,
        signal: Option<String>,
        exposed: bool,
    ) {
        self.manipulations += 1;
        self.event_handlers.insert(
            event.into(),
            EventHandler {
                signal,
                exposed,
                actions: vec![EventAction {
                    code: code.into(),
                    ..EventAction::default()
                }],
                wrap: true,
                appended: String::new(),
            },
        );
    }

    /// Install a raw handler body, used verbatim
    pub fn set_event_code(&mut self, event: impl Into<String>, code: impl Into<String>) {
        self.event_handlers.insert(
            event.into(),
            EventHandler {
                actions: vec![EventAction {
                    code: code.into(),
                    ..EventAction::default()
                }],
                ..EventHandler::default()
            },
        );
    }

    /// Install a handler made of several guarded steps
    pub fn set_event_actions(&mut self, event: impl Into<String>, actions: Vec<EventAction>) {
        self.manipulations += 1;
        self.event_handlers.insert(
            event.into(),
            EventHandler {
                actions,
                wrap: true,
                ..EventHandler::default()
            },
        );
    }

    /// Append code to the handler for `event`
    pub fn add_event(&mut self, event: impl Into<String>, code: &str) {
        self.event_handlers
            .entry(event.into())
            .or_default()
            .appended
            .push_str(code);
    }

    pub fn has_event(&self, event: &str) -> bool {
        self.event_handlers.contains_key(event)
    }

    /// Register a timer firing after `delay_ms`, repeating at the same
    /// interval when `repeat` is set
    pub fn set_timeout(&mut self, delay_ms: u32, repeat: bool) {
        self.manipulations += 1;
        self.timeout = Some(Timeout {
            delay_ms,
            repeat_ms: repeat.then_some(delay_ms),
        });
    }

    pub fn set_timeout_interval(&mut self, delay_ms: u32, interval_ms: u32) {
        self.manipulations += 1;
        self.timeout = Some(Timeout {
            delay_ms,
            repeat_ms: Some(interval_ms),
        });
    }

    /// Call `method` (e.g. `focus()`) on the element after it is in place
    pub fn call_method(&mut self, method: impl Into<String>) {
        self.manipulations += 1;
        self.deferred.push(ScriptItem::Method(method.into()));
    }

    /// Run `code` once the element is in place. With `even_if_deleted` the
    /// code also runs when the element is being discarded.
    pub fn call_javascript(&mut self, code: &str, even_if_deleted: bool) {
        self.manipulations += 1;
        if code.is_empty() {
            return;
        }

        let mut code = code.to_string();
        if !code.ends_with(';') {
            code.push(';');
        }

        if even_if_deleted {
            self.even_if_deleted.push(ScriptItem::Code(code));
        } else {
            self.deferred.push(ScriptItem::Code(code));
        }
    }

    /// Remove the element from the document
    pub fn remove_from_parent(&mut self) {
        self.manipulations += 1;
        self.even_if_deleted.push(ScriptItem::Remove);
    }

    /// Destroy every existing child at or after `first_child`
    pub fn remove_all_children(&mut self, first_child: usize) {
        debug_assert!(self.mode == Mode::Update, "only existing elements have children to remove");
        self.manipulations += 1;
        self.remove_children_from = Some(first_child);
        self.was_empty = first_child == 0;
    }

    /// Replace the element with `node`
    pub fn replace_with(&mut self, node: MutationNode) {
        debug_assert!(self.mode == Mode::Update, "only existing elements can be replaced");
        self.manipulations += 1;
        self.splice = Some(Splice::Replace {
            node: Box::new(node),
            unstub: None,
        });
    }

    /// Replace a stub with its full rendering, revealing it the way the stub
    /// was hidden
    pub fn unstub_with(&mut self, node: MutationNode, hide: HideMode) {
        debug_assert!(self.mode == Mode::Update, "only existing elements can be unstubbed");
        self.manipulations += 1;
        self.splice = Some(Splice::Replace {
            node: Box::new(node),
            unstub: Some(hide),
        });
    }

    /// Insert `sibling` right before the element
    pub fn insert_before(&mut self, sibling: MutationNode) {
        debug_assert!(self.mode == Mode::Update, "only existing elements have siblings");
        self.manipulations += 1;
        self.splice = Some(Splice::InsertBefore(Box::new(sibling)));
    }

    /// Drop the wrapper the element was rendered in for non-scripted clients
    pub fn unwrap(&mut self) {
        self.manipulations += 1;
        self.unwrapped = true;
    }

    /// Bind the element's handlers to page-wide events instead of the
    /// element itself, for containers that receive events while nothing has
    /// focus
    pub fn set_global_unfocused(&mut self, global: bool) {
        self.global_unfocused = global;
    }

    /// Forget the page-wide handlers previously bound for this element
    pub fn detach_from_global_focus_table(&mut self) {
        self.manipulations += 1;
        self.detach_global_focus = true;
    }

    /// Turn the node into an update that only rewrites the element content
    pub fn update_inner_html_only(&mut self) {
        debug_assert!(self.splice.is_none());

        self.mode = Mode::Update;
        self.attributes.clear();
        self.removed_attributes.clear();
        self.event_handlers.clear();
        self.properties
            .retain(|p, _| matches!(p, Property::InnerHtml | Property::Target));
    }

    pub(crate) fn is_addressable(&self) -> bool {
        !self.id.is_empty() || self.var.is_some()
    }
}
