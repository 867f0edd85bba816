//! JSON description of a mutation batch, replayed through the mutation API.

use domsync_common::CommonError;
use domsync_dom::{
    ElementKind, EventAction, HideMode, Mode, MutationNode, Property, RenderError, Timeout,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Invalid batch description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot build node '{node}': {source}")]
    Build {
        node: String,
        #[source]
        source: RenderError,
    },
}

/// A file holding the roots of one rendering pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFile {
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
}

impl BatchFile {
    pub fn parse(source: &str) -> Result<Self, BatchError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn build(self) -> Result<Vec<MutationNode>, BatchError> {
        self.nodes.into_iter().map(NodeEntry::build).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEntry {
    pub event: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub signal: Option<String>,
    #[serde(default)]
    pub exposed: bool,
    /// Guarded steps; replaces `code` when present
    #[serde(default)]
    pub actions: Vec<EventAction>,
    /// Install `code` verbatim, without the event prologue
    #[serde(default)]
    pub raw: bool,
}

/// One element, in the order its mutators are applied
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeEntry {
    pub mode: Mode,
    /// Tag name; unknown tags are rendered as custom elements
    pub tag: String,
    pub id: Option<String>,
    /// Script expression addressing an existing element without id
    pub expression: Option<String>,
    pub name: Option<String>,
    pub was_empty: Option<bool>,
    /// Position among the parent's final children, appended when absent
    pub position: Option<usize>,
    pub remove_children_from: Option<usize>,
    pub attributes: BTreeMap<String, String>,
    pub removed_attributes: Vec<String>,
    pub properties: BTreeMap<Property, String>,
    /// Words added once to the class list
    pub classes: Vec<String>,
    pub events: Vec<EventEntry>,
    pub children: Vec<NodeEntry>,
    pub child_markup: Vec<String>,
    pub save_children: Vec<String>,
    pub replace_with: Option<Box<NodeEntry>>,
    pub unstub: Option<HideMode>,
    pub insert_before: Option<Box<NodeEntry>>,
    pub timeout: Option<Timeout>,
    pub methods: Vec<String>,
    pub script: Vec<String>,
    pub script_even_if_deleted: Vec<String>,
    pub remove: bool,
    pub unwrap: bool,
    pub global_unfocused: bool,
    pub detach_global_focus: bool,
    /// Keep only the inner markup of a created element and rewrite it in place
    pub inner_html_only: bool,
}

impl Default for NodeEntry {
    fn default() -> Self {
        Self {
            mode: Mode::Create,
            tag: "div".to_string(),
            id: None,
            expression: None,
            name: None,
            was_empty: None,
            position: None,
            remove_children_from: None,
            attributes: BTreeMap::new(),
            removed_attributes: Vec::new(),
            properties: BTreeMap::new(),
            classes: Vec::new(),
            events: Vec::new(),
            children: Vec::new(),
            child_markup: Vec::new(),
            save_children: Vec::new(),
            replace_with: None,
            unstub: None,
            insert_before: None,
            timeout: None,
            methods: Vec::new(),
            script: Vec::new(),
            script_even_if_deleted: Vec::new(),
            remove: false,
            unwrap: false,
            global_unfocused: false,
            detach_global_focus: false,
            inner_html_only: false,
        }
    }
}

impl NodeEntry {
    fn label(&self) -> String {
        match (&self.id, &self.expression) {
            (Some(id), _) => id.clone(),
            (None, Some(expression)) => expression.clone(),
            (None, None) => format!("<{}>", self.tag),
        }
    }

    pub fn build(self) -> Result<MutationNode, BatchError> {
        let label = self.label();
        self.replay().map_err(|source| BatchError::Build {
            node: label,
            source,
        })
    }

    fn replay(self) -> Result<MutationNode, RenderError> {
        let kind = ElementKind::parse_tag_name(&self.tag);

        let mut node = match (self.mode, &self.expression) {
            (Mode::Create, _) => {
                let mut node = MutationNode::create(kind.unwrap_or(ElementKind::Other));
                if let Some(id) = &self.id {
                    node.set_id(id.clone());
                }
                node
            }
            (Mode::Update, Some(expression)) => {
                MutationNode::update_given(expression.clone(), kind.unwrap_or(ElementKind::Other))?
            }
            (Mode::Update, None) => MutationNode::get_for_update(
                self.id.clone().unwrap_or_default(),
                kind.unwrap_or(ElementKind::Other),
            )?,
        };
        if kind.is_none() {
            node.set_custom_tag(self.tag.clone());
        }

        if self.mode == Mode::Create
            && (self.remove_children_from.is_some()
                || self.replace_with.is_some()
                || self.insert_before.is_some())
        {
            return Err(CommonError::configuration(
                "created elements cannot remove children, be replaced or get siblings",
            )
            .into());
        }
        if self.replace_with.is_some() && self.insert_before.is_some() {
            return Err(CommonError::configuration(
                "an element is either replaced or gets a sibling, not both",
            )
            .into());
        }

        if let Some(name) = self.name {
            node.set_name(name);
        }
        if let Some(first) = self.remove_children_from {
            node.remove_all_children(first);
        }
        if let Some(was_empty) = self.was_empty {
            node.set_was_empty(was_empty);
        }

        for (name, value) in self.attributes {
            node.set_attribute(name, value);
        }
        for name in self.removed_attributes {
            node.remove_attribute(name);
        }
        node.set_properties(self.properties);
        for word in &self.classes {
            node.add_property_word(Property::Class, word);
        }

        for event in self.events {
            if !event.actions.is_empty() {
                node.set_event_actions(event.event, event.actions);
            } else if event.raw {
                node.set_event_code(event.event, event.code);
            } else {
                node.set_event(event.event, event.code, event.signal, event.exposed);
            }
        }

        for id in self.save_children {
            node.save_child(id);
        }
        for child in self.children {
            let position = child.position;
            let child = child.replay()?;
            match position {
                Some(position) => node.insert_child_at(child, position),
                None => node.add_child(child),
            }
        }
        for markup in &self.child_markup {
            node.add_child_markup(markup);
        }

        if let Some(replacement) = self.replace_with {
            let replacement = replacement.replay()?;
            match self.unstub {
                Some(hide) => node.unstub_with(replacement, hide),
                None => node.replace_with(replacement),
            }
        }
        if let Some(sibling) = self.insert_before {
            node.insert_before(sibling.replay()?);
        }

        if let Some(timeout) = self.timeout {
            match timeout.repeat_ms {
                Some(interval) => node.set_timeout_interval(timeout.delay_ms, interval),
                None => node.set_timeout(timeout.delay_ms, false),
            }
        }
        for method in self.methods {
            node.call_method(method);
        }
        for code in &self.script {
            node.call_javascript(code, false);
        }
        for code in &self.script_even_if_deleted {
            node.call_javascript(code, true);
        }

        if self.remove {
            node.remove_from_parent();
        }
        if self.unwrap {
            node.unwrap();
        }
        node.set_global_unfocused(self.global_unfocused);
        if self.detach_global_focus {
            node.detach_from_global_focus_table();
        }

        if self.inner_html_only {
            if node.id().is_empty() {
                return Err(RenderError::Unaddressable);
            }
            node.update_inner_html_only();
        }

        Ok(node)
    }
}
