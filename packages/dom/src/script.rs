//! Rendering of mutation nodes as client-side script.
//!
//! Each node is rendered in three passes. The batch scheduler runs the
//! Delete pass over every root before any Create pass, and every Create pass
//! before any Update pass, so that removed content never collides with the
//! identifiers of content created in the same batch.

use crate::client::UserAgent;
use crate::error::{RenderError, RenderResult};
use crate::escape::{escape_into, escaped, EscapeMode};
use crate::events::handler_body;
use crate::kind::ElementKind;
use crate::markup;
use crate::node::{ChildInsertion, FoldedChild, HideMode, Mode, MutationNode, ScriptItem, Splice};
use crate::property::{Property, PropertyRule, ScriptValue};
use crate::session::{push_timer, MarkupOutput, RenderSession};
use crate::style::emulate_min_max;
use std::fmt::Write;
use std::mem;
use tracing::{debug, warn};

/// Pass of the script renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    /// Script that must run even for discarded elements, and bulk child
    /// removal
    Delete,
    /// Identity, attributes and properties of freshly created elements
    Create,
    /// Differences applied to existing elements
    Update,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Delete, Phase::Create, Phase::Update];
}

pub(crate) fn render_phase(
    node: &mut MutationNode,
    phase: Phase,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    match phase {
        Phase::Delete => render_removals(node, session, out),
        Phase::Create if node.mode == Mode::Create => render_creation(node, session, out),
        Phase::Create => Ok(()),
        Phase::Update => render_updates(node, session, out),
    }
}

/// Bind the element to a script variable, emitting the lookup on first use
pub(crate) fn declare(
    node: &mut MutationNode,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<String> {
    if let Some(var) = &node.var {
        return Ok(var.clone());
    }
    if node.id.is_empty() {
        return Err(RenderError::Unaddressable);
    }

    let var = session.ids.new_var();
    out.push_str("var ");
    out.push_str(&var);
    out.push('=');
    push_lookup(out, &node.id, session);
    out.push_str(";\n");

    node.var = Some(var.clone());
    Ok(var)
}

fn create_var(node: &mut MutationNode, session: &mut RenderSession) -> String {
    let var = session.ids.new_var();
    node.var = Some(var.clone());
    var
}

/// `Wt.$('id')`
fn push_lookup(out: &mut String, id: &str, session: &RenderSession) {
    out.push_str(&session.config.runtime_class);
    out.push_str(".$('");
    escape_into(out, id, EscapeMode::JsSingleQuoted);
    out.push_str("')");
}

/// `Wt.<helper>('id'` with the closing parenthesis left to the caller
fn push_helper_call(out: &mut String, helper: &str, id: &str, session: &RenderSession) {
    out.push_str(&session.config.runtime_class);
    out.push('.');
    out.push_str(helper);
    out.push_str("('");
    escape_into(out, id, EscapeMode::JsSingleQuoted);
    out.push('\'');
}

pub(crate) fn push_items(
    items: Vec<ScriptItem>,
    node: &mut MutationNode,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    for item in items {
        match item {
            ScriptItem::Code(code) => out.push_str(&code),
            ScriptItem::Method(method) => {
                let var = declare(node, session, out)?;
                out.push_str(&var);
                out.push('.');
                out.push_str(&method);
                out.push(';');
            }
            ScriptItem::Remove if node.id.is_empty() => {
                let var = declare(node, session, out)?;
                out.push_str(&var);
                out.push_str(".remove();");
            }
            ScriptItem::Remove => {
                push_helper_call(out, "remove", &node.id, session);
                out.push_str(");");
            }
        }
        out.push('\n');
    }
    Ok(())
}

fn render_removals(
    node: &mut MutationNode,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    let items = mem::take(&mut node.even_if_deleted);
    push_items(items, node, session, out)?;

    if node.detach_global_focus && !node.id.is_empty() {
        out.push_str(&session.config.app_class);
        out.push_str("._p_.unbindGlobal('");
        escape_into(out, &node.id, EscapeMode::JsSingleQuoted);
        out.push_str("');\n");
        node.detach_global_focus = false;
    }

    if let Some(first) = node.remove_children_from.take() {
        let var = declare(node, session, out)?;
        if first == 0 && node.kind.accepts_bulk_rewrite() {
            let _ = writeln!(out, "{}.setHtml({}, '');", session.config.runtime_class, var);
        } else {
            let _ = writeln!(
                out,
                "Array.from({}.querySelectorAll(':scope > *')).slice({}).forEach(elem => elem.remove());",
                var, first
            );
        }
    }

    for child in node.updated_children.iter_mut() {
        render_removals(child, session, out)?;
    }
    Ok(())
}

fn render_creation(
    node: &mut MutationNode,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    let var = match &node.var {
        Some(var) => var.clone(),
        None => create_var(node, session),
    };

    if !node.id.is_empty() {
        let _ = writeln!(
            out,
            "{}.setAttribute('id', '{}');",
            var,
            escaped(&node.id, EscapeMode::JsSingleQuoted)
        );
    }

    let items = mem::take(&mut node.even_if_deleted);
    push_items(items, node, session, out)?;

    emulate_min_max(node, &session.client, &session.config.runtime_class);
    set_attributes_js(node, session, out)?;
    set_properties_js(node, session, out)
}

fn render_updates(
    node: &mut MutationNode,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    if node.mode == Mode::Update && !node.is_addressable() {
        return Err(RenderError::Unaddressable);
    }

    let shortcut = if session.options.fast_path {
        fast_path(node, session)
    } else {
        None
    };

    match shortcut {
        Some(statement) => {
            debug!(id = %node.id, "Fast path update");
            out.push_str(&statement);
        }
        None => render_general_update(node, session, out)?,
    }

    for mut child in mem::take(&mut node.updated_children) {
        render_updates(&mut child, session, out)?;
    }
    Ok(())
}

/// One-statement rendering of an update that changes only the display style
/// or only runs one piece of deferred script.
fn fast_path(node: &mut MutationNode, session: &RenderSession) -> Option<String> {
    if node.mode != Mode::Update || node.manipulations != 1 {
        return None;
    }

    let untouched = node.attributes.is_empty()
        && node.removed_attributes.is_empty()
        && node.event_handlers.is_empty()
        && node.children_to_add.is_empty()
        && node.folded_children.is_empty()
        && node.children_to_preserve.is_empty()
        && node.splice.is_none()
        && node.timeout.is_none()
        && node.remove_children_from.is_none()
        && node.even_if_deleted.is_empty()
        && !node.unwrapped;
    if !untouched {
        return None;
    }

    if node.deferred.is_empty() && node.properties.len() == 1 && !node.id.is_empty() {
        let display = node.properties.get(&Property::StyleDisplay)?;
        let mut statement = String::new();
        match display.as_str() {
            "none" => push_helper_call(&mut statement, "hide", &node.id, session),
            "inline" => push_helper_call(&mut statement, "inline", &node.id, session),
            "block" => push_helper_call(&mut statement, "block", &node.id, session),
            other => {
                push_helper_call(&mut statement, "show", &node.id, session);
                statement.push_str(", '");
                escape_into(&mut statement, other, EscapeMode::JsSingleQuoted);
                statement.push('\'');
            }
        }
        statement.push_str(");\n");
        return Some(statement);
    }

    if node.properties.is_empty() && node.deferred.len() == 1 {
        if let Some(ScriptItem::Code(code)) = node.deferred.first() {
            let statement = format!("{}\n", code);
            node.deferred.clear();
            return Some(statement);
        }
    }

    None
}

fn render_general_update(
    node: &mut MutationNode,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    if node.unwrapped && !node.id.is_empty() {
        push_helper_call(out, "unwrap", &node.id, session);
        out.push_str(");\n");
    }

    let runtime_class = session.config.runtime_class.clone();
    emulate_min_max(node, &session.client, &runtime_class);

    // A spliced element is only the anchor of the splice.
    if let Some(splice) = node.splice.take() {
        let var = declare(node, session, out)?;
        match splice {
            Splice::Replace {
                node: mut replacement,
                unstub,
            } => {
                let new_var = create_var(&mut replacement, session);
                let insert = format!("{}.parentNode.replaceChild({},{});\n", var, new_var, var);
                create_element(&mut replacement, &insert, session, out)?;

                if let Some(hide) = unstub {
                    let with_display = u8::from(hide == HideMode::Display);
                    let _ = writeln!(
                        out,
                        "{}.unstub({},{},{});",
                        runtime_class, var, new_var, with_display
                    );
                }
            }
            Splice::InsertBefore(mut sibling) => {
                let new_var = create_var(&mut sibling, session);
                let insert = format!("{}.parentNode.insertBefore({},{});\n", var, new_var, var);
                create_element(&mut sibling, &insert, session, out)?;
            }
        }
        return Ok(());
    }

    let preserved = mem::take(&mut node.children_to_preserve);
    let mut parent_var = String::new();
    if !preserved.is_empty() {
        parent_var = declare(node, session, out)?;
        let _ = writeln!(out, "{}.saveReparented({});", runtime_class, parent_var);

        for (i, id) in preserved.iter().enumerate() {
            let _ = write!(out, "var c{}{}=", parent_var, i);
            push_lookup(out, id, session);
            // Content is destroyed with the rewrite on IE unless detached.
            if session.client.agent.is_ie() {
                out.push_str(".detach()");
            }
            out.push_str(";\n");
        }
    }

    if node.mode != Mode::Create {
        set_properties_js(node, session, out)?;
        set_attributes_js(node, session, out)?;
    }

    for (event, handler) in mem::take(&mut node.event_handlers) {
        let body = handler_body(&event, &handler, node.kind, &session.config);
        if node.mode == Mode::Update || !body.is_empty() {
            set_javascript_event(node, &event, &body, session, out)?;
        }
    }

    render_inner_html_js(node, session, out)?;

    for (i, id) in preserved.iter().enumerate() {
        push_helper_call(out, "replaceWith", id, session);
        let _ = writeln!(out, ",c{}{});", parent_var, i);
    }

    render_deferred(node, session, out)
}

fn render_deferred(
    node: &mut MutationNode,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    let items = mem::take(&mut node.deferred);
    if items.is_empty() {
        return Ok(());
    }
    declare(node, session, out)?;
    push_items(items, node, session, out)
}

/// Install a handler as a named function, bound to the element, or to the
/// page for elements receiving events while nothing has focus.
pub(crate) fn set_javascript_event(
    node: &mut MutationNode,
    event: &str,
    body: &str,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    let function = session.ids.new_function();
    let _ = writeln!(out, "function {}(event) {{ {}}}", function, body);

    if node.global_unfocused {
        let _ = writeln!(
            out,
            "{}._p_.bindGlobal('{}', '{}', {})",
            session.config.app_class,
            escaped(event, EscapeMode::JsSingleQuoted),
            escaped(&node.id, EscapeMode::JsSingleQuoted),
            function
        );
        return Ok(());
    }

    let var = declare(node, session, out)?;
    if event == "wheel" && session.client.agent.needs_wheel_listener() {
        let _ = writeln!(out, "{}.addEventListener('wheel', {}, false);", var, function);
    } else {
        let _ = writeln!(out, "{}.on{}={};", var, event, function);
    }
    Ok(())
}

/// Create the element, run `insert` to put it in place, then initialize it.
fn create_element(
    node: &mut MutationNode,
    insert: &str,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    let var = match &node.var {
        Some(var) => var.clone(),
        None => create_var(node, session),
    };

    let _ = write!(out, "var {}=document.createElement('", var);

    if session.client.agent.creates_from_opening_tag() && node.kind != ElementKind::Textarea {
        // The whole opening tag in one call, attributes and handlers included.
        let opening = markup::render_opening_tag_of(node, session)?;
        escape_into(out, &opening.html, EscapeMode::JsSingleQuoted);
        out.push_str("');");
        out.push_str(insert);
        out.push_str(&opening.script);

        if !will_render_inner_html_js(node) {
            for property in [Property::InnerHtml, Property::AddedInnerHtml] {
                if let Some(value) = node.properties.remove(&property) {
                    set_property_js(&var, node.kind, property, &value, session, out);
                    out.push('\n');
                }
            }
        }
        let items = mem::take(&mut node.even_if_deleted);
        push_items(items, node, session, out)?;
        render_inner_html_js(node, session, out)?;
        render_deferred(node, session, out)
    } else {
        escape_into(out, node.tag_name(), EscapeMode::JsSingleQuoted);
        out.push_str("');");
        out.push_str(insert);
        render_creation(node, session, out)?;
        render_updates(node, session, out)
    }
}

fn add_to_parent(
    insertion: ChildInsertion,
    parent_var: &str,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    let ChildInsertion {
        position,
        mut child,
    } = insertion;
    let var = create_var(&mut child, session);

    match child.kind {
        ElementKind::Td | ElementKind::Tr => {
            let method = if child.kind == ElementKind::Td {
                "insertCell"
            } else {
                "insertRow"
            };
            let position = position.map_or(-1, |p| p as i64);
            let _ = writeln!(out, "var {}={}.{}({});", var, parent_var, method, position);

            render_creation(&mut child, session, out)?;
            render_updates(&mut child, session, out)
        }
        _ => {
            let insert = match position {
                Some(position) => format!(
                    "{}.insertAt({},{},{});",
                    session.config.runtime_class, parent_var, var, position
                ),
                None => format!("{}.appendChild({});\n", parent_var, var),
            };
            create_element(&mut child, &insert, session, out)
        }
    }
}

/// Whether children and inner markup go out as one `setHtml` call
fn will_render_inner_html_js(node: &MutationNode) -> bool {
    !node.folded_children.is_empty() || (node.was_empty && node.can_write_inner_html())
}

fn render_inner_html_js(
    node: &mut MutationNode,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    if will_render_inner_html_js(node) {
        let mut inner = node.properties.remove(&Property::InnerHtml).unwrap_or_default();
        if let Some(added) = node.properties.remove(&Property::AddedInnerHtml) {
            inner.push_str(&added);
        }

        let placeholder = node.kind.needs_placeholder_when_empty()
            && session.client.has_empty_element_quirk();
        let children = mem::take(&mut node.children_to_add);
        let folded = mem::take(&mut node.folded_children);

        if placeholder || !children.is_empty() || !folded.is_empty() || !inner.is_empty() {
            let var = declare(node, session, out)?;

            let mut content = MarkupOutput::default();
            let empty = children.is_empty() && folded.is_empty() && inner.is_empty();
            for insertion in children {
                markup::write_html(insertion.child, session, &mut content)?;
            }
            content.html.push_str(&inner);
            for child in folded {
                match child {
                    FoldedChild::Markup(html) => content.html.push_str(&html),
                    FoldedChild::Node(child) => {
                        markup::write_html(child, session, &mut content)?
                    }
                }
            }
            if placeholder && empty {
                content.html.push_str("&nbsp;");
            }

            let _ = write!(out, "{}.setHtml({},'", session.config.runtime_class, var);
            escape_into(out, &content.html, EscapeMode::JsSingleQuoted);
            out.push_str("');\n");

            for timeout in &content.timeouts {
                push_timer(out, &session.config, &timeout.id, timeout.delay_ms, timeout.repeat_ms);
            }
            out.push_str(&content.script);
        }
    } else {
        let children = mem::take(&mut node.children_to_add);
        if !children.is_empty() {
            let var = declare(node, session, out)?;
            for insertion in children {
                add_to_parent(insertion, &var, session, out)?;
            }
        }
    }

    if let Some(timeout) = node.timeout.take() {
        push_timer(out, &session.config, &node.id, timeout.delay_ms, timeout.repeat_ms);
    }
    Ok(())
}

fn set_attributes_js(
    node: &mut MutationNode,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    let attributes = mem::take(&mut node.attributes);
    for (name, value) in &attributes {
        let var = declare(node, session, out)?;
        if name == "style" {
            let _ = writeln!(
                out,
                "{}.style.cssText = '{}';",
                var,
                escaped(value, EscapeMode::JsSingleQuoted)
            );
        } else {
            let _ = writeln!(
                out,
                "{}.setAttribute('{}','{}');",
                var,
                escaped(name, EscapeMode::JsSingleQuoted),
                escaped(value, EscapeMode::JsSingleQuoted)
            );
        }
    }

    for name in mem::take(&mut node.removed_attributes) {
        let var = declare(node, session, out)?;
        let _ = writeln!(
            out,
            "{}.removeAttribute('{}');",
            var,
            escaped(&name, EscapeMode::JsSingleQuoted)
        );
    }
    Ok(())
}

fn set_properties_js(
    node: &mut MutationNode,
    session: &mut RenderSession,
    out: &mut String,
) -> RenderResult<()> {
    let bulk = will_render_inner_html_js(node);
    let mut kept = Vec::new();

    for (property, value) in mem::take(&mut node.properties) {
        if bulk && property.rule() == PropertyRule::InnerMarkup {
            // Written together with the children.
            kept.push((property, value));
            continue;
        }

        let var = declare(node, session, out)?;
        set_property_js(&var, node.kind, property, &value, session, out);
        out.push('\n');
    }

    node.properties.extend(kept);
    Ok(())
}

fn set_property_js(
    var: &str,
    kind: ElementKind,
    property: Property,
    value: &str,
    session: &RenderSession,
    out: &mut String,
) {
    let quoted = escaped(value, EscapeMode::JsSingleQuoted);

    match property.rule() {
        PropertyRule::InnerMarkup => {
            let add = property == Property::AddedInnerHtml;
            let _ = write!(
                out,
                "{}.setHtml({},'{}',{});",
                session.config.runtime_class, var, quoted, add
            );
        }
        PropertyRule::Value => {
            let _ = write!(out, "{}.value='{}';", var, quoted);
        }
        PropertyRule::BooleanAttribute { attribute, .. }
            if kind == ElementKind::A && property == Property::Disabled =>
        {
            // Anchors have no disabled property, only the attribute.
            debug!(var, "Disabling an anchor through its attribute");
            if value == "true" {
                let _ = write!(out, "{}.setAttribute('{}', '{}');", var, attribute, attribute);
            } else {
                let _ = write!(out, "{}.removeAttribute('{}');", var, attribute);
            }
        }
        PropertyRule::BooleanAttribute { dom, .. } => {
            let _ = write!(out, "{}.{}={};", var, dom, value == "true");
        }
        PropertyRule::Attribute { attribute, script } => match script {
            ScriptValue::Quoted(dom) => {
                let _ = write!(out, "{}.{}='{}';", var, dom, quoted);
            }
            ScriptValue::Raw(dom) => {
                let _ = write!(out, "{}.{}={};", var, dom, raw_value(value));
            }
            ScriptValue::Attribute => {
                let _ = write!(out, "{}.setAttribute('{}','{}');", var, attribute, quoted);
            }
        },
        PropertyRule::ScriptOnly { dom, deferred: true } => {
            // Applied asynchronously by the DOM, so assigned on the next turn.
            let _ = write!(
                out,
                "setTimeout(function() {{ {}.{}={};}}, 0);",
                var,
                dom,
                raw_value(value)
            );
        }
        PropertyRule::ScriptOnly { dom, deferred: false } => {
            let _ = write!(out, "{}.{}={};", var, dom, raw_value(value));
        }
        PropertyRule::Css {
            name,
            js_name,
            vendor_prefixed,
        } => {
            let agent = session.client.agent;
            if agent == UserAgent::Ie6 {
                warn!(var, property = name, "Using bracketed style name for legacy client");
                let _ = write!(out, "{}.style['{}']='{}';", var, name, quoted);
            } else {
                let js_name = if property == Property::StyleFloat && agent.is_ie() {
                    "styleFloat"
                } else {
                    js_name
                };
                let _ = write!(out, "{}.style.{}='{}';", var, js_name, quoted);
            }

            if let (true, Some(prefix)) = (vendor_prefixed, agent.vendor_prefix()) {
                let _ = write!(out, "{}.style['{}{}']='{}';", var, prefix, name, quoted);
            }
        }
        PropertyRule::StyleText => {
            let _ = write!(out, "{}.style.cssText='{}';", var, quoted);
        }
        PropertyRule::WidthExpression => {
            let _ = write!(out, "{}.style.setExpression('width','{}');", var, quoted);
        }
    }
}

/// Numbers and booleans are assigned unquoted; anything else is not a valid
/// raw value and is quoted instead.
pub(crate) fn raw_value(value: &str) -> String {
    let numeric = !value.is_empty()
        && value
            .strip_prefix('-')
            .unwrap_or(value)
            .bytes()
            .all(|b| b.is_ascii_digit());
    if numeric || value == "true" || value == "false" {
        value.to_string()
    } else {
        format!("'{}'", escaped(value, EscapeMode::JsSingleQuoted))
    }
}
