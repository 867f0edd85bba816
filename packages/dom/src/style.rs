use crate::client::ClientProfile;
use crate::escape::{escaped, EscapeMode};
use crate::node::MutationNode;
use crate::property::{Property, PropertyRule};
use tracing::debug;

/// Collapse the CSS properties of `node` into one declaration list, in
/// property order, with the free-form style text last.
pub(crate) fn css_text(node: &MutationNode, client: &ClientProfile) -> String {
    let mut style = String::new();
    let prefix = client.agent.vendor_prefix();

    for (property, value) in &node.properties {
        match property.rule() {
            PropertyRule::Css {
                name,
                vendor_prefixed,
                ..
            } if !value.is_empty() => {
                push_declaration(&mut style, name, value);
                if let (true, Some(prefix)) = (vendor_prefixed, prefix) {
                    style.push_str(prefix);
                    push_declaration(&mut style, name, value);
                }
            }
            PropertyRule::WidthExpression => {
                style.push_str("width:expression(");
                style.push_str(value);
                style.push_str(");");
            }
            _ => {}
        }
    }

    if let Some(text) = node.property(Property::Style) {
        style.push_str(text);
    }

    style
}

fn push_declaration(style: &mut String, name: &str, value: &str) {
    style.push_str(name);
    style.push(':');
    style.push_str(value);
    style.push(';');
}

/// Rewrite min/max sizes for clients that do not support them: widths become
/// a width expression evaluated by the client runtime, and a minimum height
/// becomes a plain height.
pub(crate) fn emulate_min_max(node: &mut MutationNode, client: &ClientProfile, runtime_class: &str) {
    if !node.min_max_size || !client.needs_min_max_emulation() {
        return;
    }

    let min_width = node.properties.get(&Property::StyleMinWidth).cloned();
    let max_width = node.properties.get(&Property::StyleMaxWidth).cloned();

    if (min_width.is_some() || max_width.is_some())
        && !node.properties.contains_key(&Property::StyleWidth)
    {
        let expression = format!(
            "{}.IEwidth(this,'{}','{}')",
            runtime_class,
            escaped(min_width.as_deref().unwrap_or("0px"), EscapeMode::JsSingleQuoted),
            escaped(max_width.as_deref().unwrap_or("100000px"), EscapeMode::JsSingleQuoted),
        );
        debug!(id = %node.id, expression = %expression, "Emulating min/max width");

        node.properties.remove(&Property::StyleMinWidth);
        node.properties.remove(&Property::StyleMaxWidth);
        node.properties
            .insert(Property::StyleWidthExpression, expression);
    }

    if let Some(min_height) = node.properties.get(&Property::StyleMinHeight).cloned() {
        debug!(id = %node.id, "Emulating min-height with height");
        node.properties.insert(Property::StyleHeight, min_height);
    }

    node.min_max_size = false;
}
