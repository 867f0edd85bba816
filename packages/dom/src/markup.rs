//! Rendering of created elements as markup.
//!
//! The markup is usable as is by clients without scripting: clickable
//! elements that carry a signal are turned into form controls or links that
//! deliver the signal on submission. Anything that only script can do is
//! collected into the side script of the [`MarkupOutput`].

use crate::client::UserAgent;
use crate::error::{RenderError, RenderResult};
use crate::escape::{escape_into, html_attribute_value, url_encode, EscapeMode};
use crate::events::handler_body;
use crate::kind::{is_self_closing_tag, ElementKind};
use crate::node::{FoldedChild, Mode, MutationNode, ScriptItem, TimeoutEvent};
use crate::property::{Property, PropertyRule};
use crate::script::{push_items, raw_value, set_javascript_event};
use crate::session::{MarkupOutput, RenderSession};
use crate::style::{css_text, emulate_min_max};
use std::mem;
use tracing::debug;

pub(crate) fn render(
    mut node: MutationNode,
    session: &mut RenderSession,
    opening_tag_only: bool,
) -> RenderResult<MarkupOutput> {
    let mut output = MarkupOutput::default();
    write_element(&mut node, session, &mut output, opening_tag_only)?;
    Ok(output)
}

/// Append the markup of `node` and its subtree to `sink`
pub(crate) fn write_html(
    mut node: MutationNode,
    session: &mut RenderSession,
    sink: &mut MarkupOutput,
) -> RenderResult<()> {
    write_element(&mut node, session, sink, false)
}

/// Opening tag of `node`, leaving its content for a later rendering
pub(crate) fn render_opening_tag_of(
    node: &mut MutationNode,
    session: &mut RenderSession,
) -> RenderResult<MarkupOutput> {
    let mut output = MarkupOutput::default();
    write_element(node, session, &mut output, true)?;
    Ok(output)
}

/// How the element is presented to a client that cannot run script
struct Presentation {
    kind: ElementKind,
    tag: String,
    /// Signal delivered by the synthetic submit button around the element
    wrap_signal: Option<String>,
}

fn write_element(
    node: &mut MutationNode,
    session: &mut RenderSession,
    sink: &mut MarkupOutput,
    opening_tag_only: bool,
) -> RenderResult<()> {
    if node.mode != Mode::Create {
        return Err(RenderError::MarkupForUpdate {
            id: node.id.clone(),
        });
    }

    emulate_min_max(node, &session.client, &session.config.runtime_class);

    let presentation = present(node, session);
    let Presentation {
        kind,
        tag,
        wrap_signal,
    } = presentation;
    let html = &mut sink.html;

    if let Some(signal) = &wrap_signal {
        write_button_wrap(node, kind, signal, session, html);
    }

    html.push('<');
    html.push_str(&tag);

    if node.id.is_empty() && node.var.is_none() && needs_reference(node, session) {
        node.id = session.ids.new_element_id();
    }
    if !node.id.is_empty() {
        html.push_str(" id=");
        html_attribute_value(html, &node.id);
    }

    for (name, value) in &node.attributes {
        if session.client.spider_bot && name == "name" {
            continue;
        }
        html.push(' ');
        html.push_str(name);
        html.push('=');
        html_attribute_value(html, value);
    }

    if session.client.scripting {
        let handlers = mem::take(&mut node.event_handlers);
        for (event, handler) in &handlers {
            let body = handler_body(event, handler, node.kind, &session.config);
            if body.is_empty() {
                continue;
            }

            let listener_only = event == "wheel" && session.client.agent.needs_wheel_listener();
            if node.global_unfocused || listener_only {
                set_javascript_event(node, event, &body, session, &mut sink.script)?;
            } else {
                let html = &mut sink.html;
                html.push_str(" on");
                html.push_str(event);
                html.push('=');
                html_attribute_value(html, &body);
            }
        }
    }

    let html = &mut sink.html;
    let mut inner = String::new();
    let mut creation_script = Vec::new();

    for (property, value) in &node.properties {
        match property.rule() {
            PropertyRule::InnerMarkup => inner.push_str(value),
            PropertyRule::Value if kind == ElementKind::Textarea => {
                escape_into(&mut inner, value, EscapeMode::PlainText)
            }
            PropertyRule::Value => {
                html.push_str(" value=");
                html_attribute_value(html, value);
            }
            PropertyRule::BooleanAttribute { attribute, .. } => {
                if value == "true" {
                    html.push(' ');
                    html.push_str(attribute);
                    html.push_str("=\"");
                    html.push_str(attribute);
                    html.push('"');
                }
            }
            PropertyRule::Attribute { attribute, .. } => {
                html.push(' ');
                html.push_str(attribute);
                html.push('=');
                html_attribute_value(html, value);
            }
            PropertyRule::ScriptOnly { dom, .. } => {
                creation_script.push(format!("{}={}", dom, raw_value(value)));
            }
            PropertyRule::Css { .. } | PropertyRule::StyleText | PropertyRule::WidthExpression => {}
        }
    }

    if wrap_signal.is_none() {
        let style = css_text(node, &session.client);
        if !style.is_empty() {
            html.push_str(" style=");
            html_attribute_value(html, &style);
        }
    }

    for statement in creation_script {
        node.call_method(statement);
    }

    if opening_tag_only {
        sink.html.push('>');
        return Ok(());
    }

    let self_closing = match kind {
        ElementKind::Other => is_self_closing_tag(&tag),
        _ => kind.is_self_closing(),
    };

    if !self_closing || carries_datalist(node, kind) {
        sink.html.push('>');

        let children = mem::take(&mut node.children_to_add);
        let folded = mem::take(&mut node.folded_children);
        let empty = children.is_empty() && folded.is_empty() && inner.is_empty();

        for insertion in children {
            write_html(insertion.child, session, sink)?;
        }
        sink.html.push_str(&inner);
        for child in folded {
            match child {
                FoldedChild::Markup(markup) => sink.html.push_str(&markup),
                FoldedChild::Node(child) => write_html(child, session, sink)?,
            }
        }

        if empty && kind.needs_placeholder_when_empty() && session.client.has_empty_element_quirk() {
            sink.html.push_str("&nbsp;");
        }

        sink.html.push_str("</");
        sink.html.push_str(&tag);
        sink.html.push('>');
    } else {
        sink.html.push_str(" />");
    }

    if wrap_signal.is_some() {
        sink.html.push_str("</button>");
    }

    let mut items = mem::take(&mut node.even_if_deleted);
    items.append(&mut node.deferred);
    push_items(items, node, session, &mut sink.script)?;

    if let Some(timeout) = node.timeout.take() {
        sink.timeouts.push(TimeoutEvent {
            delay_ms: timeout.delay_ms,
            id: node.id.clone(),
            repeat_ms: timeout.repeat_ms,
        });
    }

    Ok(())
}

/// Whether the side script has to look the element up after the markup is
/// in place
fn needs_reference(node: &MutationNode, session: &RenderSession) -> bool {
    let script_only = node
        .properties
        .keys()
        .any(|p| matches!(p.rule(), PropertyRule::ScriptOnly { .. }));
    let addressed_items = node
        .deferred
        .iter()
        .chain(node.even_if_deleted.iter())
        .any(|item| !matches!(item, ScriptItem::Code(_)));
    let bound_by_script = session.client.scripting
        && (node.global_unfocused && !node.event_handlers.is_empty()
            || node.event_handlers.contains_key("wheel")
                && session.client.agent.needs_wheel_listener());

    script_only || addressed_items || bound_by_script
}

/// Decide the rendered kind, rewriting attributes of clickable elements for
/// clients without scripting.
fn present(node: &mut MutationNode, session: &RenderSession) -> Presentation {
    let mut presentation = Presentation {
        kind: node.kind,
        tag: node.tag_name().to_string(),
        wrap_signal: None,
    };

    let client = &session.client;
    if client.scripting || client.spider_bot {
        return presentation;
    }

    let signal = match node
        .event_handlers
        .get("click")
        .and_then(|handler| handler.signal.clone())
    {
        Some(signal) if !signal.is_empty() => signal,
        _ => return presentation,
    };

    let submit_name = format!("signal={}", signal);
    let signal_url = format!("{}&signal={}", client.page_url, url_encode(&signal, ""));

    match node.kind {
        ElementKind::Button => {
            node.set_attribute("type", "submit");
            node.set_attribute("name", submit_name);
        }
        ElementKind::Img => {
            presentation.kind = ElementKind::Input;
            presentation.tag = "input".to_string();
            node.set_attribute("type", "image");
            node.set_attribute("name", submit_name);
        }
        ElementKind::A => {
            let real_link = node.attribute("href").map_or(0, str::len) > 1;
            let legacy = matches!(client.agent, UserAgent::Ie7 | UserAgent::Ie8);
            if !real_link && !legacy {
                if client.anchor_as_button {
                    node.set_attribute("href", signal_url);
                } else {
                    presentation.wrap_signal = Some(signal);
                }
            }
        }
        ElementKind::Area => node.set_attribute("href", signal_url),
        ElementKind::Input | ElementKind::Select => {}
        _ => presentation.wrap_signal = Some(signal),
    }

    if let Some(signal) = &presentation.wrap_signal {
        debug!(id = %node.id, signal = %signal, "Wrapping clickable element in a submit button");
    }
    presentation
}

/// Opening of `<button type="submit">` carrying the signal, the class,
/// layout and state of the wrapped element
fn write_button_wrap(
    node: &mut MutationNode,
    kind: ElementKind,
    signal: &str,
    session: &RenderSession,
    html: &mut String,
) {
    html.push_str("<button type=\"submit\" name=");
    html_attribute_value(html, &format!("signal={}", signal));

    let mut class = format!("{}-wrap", session.config.runtime_class);
    if let Some(element_class) = node.properties.remove(&Property::Class) {
        class.push(' ');
        class.push_str(&element_class);
    }
    html.push_str(" class=");
    html_attribute_value(html, &class);

    let mut style = css_text(node, &session.client);
    if !kind.is_default_inline() {
        style.insert_str(0, "display: block;");
    }
    if !style.is_empty() {
        html.push_str(" style=");
        html_attribute_value(html, &style);
    }

    if node.property(Property::Disabled) == Some("true") {
        html.push_str(" disabled=\"disabled\"");
    }

    if let Some(title) = node.attribute("title") {
        html.push_str(" title=");
        html_attribute_value(html, title);
    }

    html.push('>');
}

fn carries_datalist(node: &MutationNode, kind: ElementKind) -> bool {
    if kind != ElementKind::Input {
        return false;
    }
    let first = node.children_to_add.first().map(|c| c.child.kind).or_else(|| {
        node.folded_children.iter().find_map(|child| match child {
            FoldedChild::Node(child) => Some(child.kind),
            FoldedChild::Markup(_) => None,
        })
    });
    first == Some(ElementKind::Datalist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientProfile;

    fn session_for(client: ClientProfile) -> RenderSession {
        RenderSession::new(Default::default(), client)
    }

    #[test]
    fn test_paragraph_with_class() {
        let mut p = MutationNode::create(ElementKind::P);
        p.set_property(Property::InnerHtml, "<b>hi</b>");
        p.set_property(Property::Class, "x");

        let output = RenderSession::default().render_markup(p).unwrap();
        assert_eq!(output.html, "<p class=\"x\"><b>hi</b></p>");
        assert!(output.script.is_empty());
        assert!(output.timeouts.is_empty());
    }

    #[test]
    fn test_update_node_is_rejected() {
        let node = MutationNode::get_for_update("w1", ElementKind::Div).unwrap();
        assert_eq!(
            RenderSession::default().render_markup(node),
            Err(RenderError::MarkupForUpdate {
                id: "w1".to_string()
            })
        );
    }

    #[test]
    fn test_attributes_and_inline_handlers_are_escaped() {
        let mut div = MutationNode::create(ElementKind::Div);
        div.set_id("w1");
        div.set_attribute("title", "a \"quoted\" <title>");
        div.set_event("click", "go('x');", None, false);

        let output = RenderSession::default().render_markup(div).unwrap();
        assert_eq!(
            output.html,
            "<div id=\"w1\" title=\"a &#34;quoted&#34; &lt;title&gt;\" \
             onclick=\"var e=event||window.event,o=this;go(&#39;x&#39;);\"></div>"
        );
    }

    #[test]
    fn test_self_closing_and_boolean_attributes() {
        let mut input = MutationNode::create(ElementKind::Input);
        input.set_attribute("type", "checkbox");
        input.set_property(Property::Checked, "true");
        input.set_property(Property::Disabled, "false");

        let output = RenderSession::default().render_markup(input).unwrap();
        assert_eq!(output.html, "<input type=\"checkbox\" checked=\"checked\" />");
    }

    #[test]
    fn test_input_with_datalist_is_closed() {
        let mut input = MutationNode::create(ElementKind::Input);
        input.add_child(MutationNode::create(ElementKind::Datalist));

        let output = RenderSession::default().render_markup(input).unwrap();
        assert_eq!(output.html, "<input><datalist></datalist></input>");
    }

    #[test]
    fn test_textarea_value_is_text() {
        let mut area = MutationNode::create(ElementKind::Textarea);
        area.set_property(Property::Value, "a < b & c");

        let output = RenderSession::default().render_markup(area).unwrap();
        assert_eq!(output.html, "<textarea>a &lt; b &amp; c</textarea>");
    }

    #[test]
    fn test_style_collapse_and_folded_children() {
        let mut div = MutationNode::create(ElementKind::Div);
        div.set_property(Property::Style, "color:red;");
        div.set_property(Property::StyleWidth, "10px");
        let mut span = MutationNode::create(ElementKind::Span);
        span.set_property(Property::InnerHtml, "a");
        div.add_child(span);
        div.add_child_markup("<br />");

        let output = RenderSession::default().render_markup(div).unwrap();
        assert_eq!(
            output.html,
            "<div style=\"width:10px;color:red;\"><span>a</span><br /></div>"
        );
    }

    #[test]
    fn test_script_only_properties_become_side_script() {
        let mut select = MutationNode::create(ElementKind::Select);
        select.set_id("s1");
        select.set_property(Property::SelectedIndex, "-1");

        let output = RenderSession::default().render_markup(select).unwrap();
        assert_eq!(output.html, "<select id=\"s1\"></select>");
        assert_eq!(output.script, "var j0=Wt.$('s1');\nj0.selectedIndex=-1;\n");
    }

    #[test]
    fn test_timeouts_are_collected() {
        let mut span = MutationNode::create(ElementKind::Span);
        span.set_id("t1");
        span.set_timeout(500, false);

        let output = RenderSession::default().render_markup(span).unwrap();
        assert_eq!(
            output.timeouts,
            vec![TimeoutEvent {
                delay_ms: 500,
                id: "t1".to_string(),
                repeat_ms: None
            }]
        );
    }

    #[test]
    fn test_global_handlers_go_to_side_script() {
        let mut div = MutationNode::create(ElementKind::Div);
        div.set_id("root");
        div.set_global_unfocused(true);
        div.set_event_code("keydown", "k();");

        let output = RenderSession::default().render_markup(div).unwrap();
        assert_eq!(output.html, "<div id=\"root\"></div>");
        assert_eq!(
            output.script,
            "function f0(event) { k();}\nAPP._p_.bindGlobal('keydown', 'root', f0)\n"
        );
    }

    #[test]
    fn test_clickable_div_is_wrapped_without_scripting() {
        let mut div = MutationNode::create(ElementKind::Div);
        div.set_id("w1");
        div.set_property(Property::Class, "card");
        div.set_attribute("title", "Open");
        div.set_event("click", "", Some("s1".to_string()), true);

        let output = session_for(ClientProfile::plain_html()).render_markup(div).unwrap();
        assert_eq!(
            output.html,
            "<button type=\"submit\" name=\"signal=s1\" class=\"Wt-wrap card\" \
             style=\"display: block;\" title=\"Open\">\
             <div id=\"w1\" title=\"Open\"></div></button>"
        );
    }

    #[test]
    fn test_clickable_controls_without_scripting() {
        let plain = ClientProfile::plain_html();

        let mut button = MutationNode::create(ElementKind::Button);
        button.set_event("click", "", Some("s1".to_string()), true);
        let output = session_for(plain.clone()).render_markup(button).unwrap();
        assert_eq!(
            output.html,
            "<button name=\"signal=s1\" type=\"submit\"></button>"
        );

        let mut img = MutationNode::create(ElementKind::Img);
        img.set_property(Property::Src, "a.png");
        img.set_event("click", "", Some("s2".to_string()), true);
        let output = session_for(plain.clone()).render_markup(img).unwrap();
        assert_eq!(
            output.html,
            "<input name=\"signal=s2\" type=\"image\" src=\"a.png\" />"
        );

        let mut link = MutationNode::create(ElementKind::A);
        link.set_event("click", "", Some("s3".to_string()), true);
        let output = session_for(plain).render_markup(link).unwrap();
        assert_eq!(output.html, "<a href=\"?&amp;signal=s3\"></a>");
    }

    #[test]
    fn test_spider_bots_see_no_names_nor_wraps() {
        let bot = ClientProfile {
            spider_bot: true,
            ..ClientProfile::plain_html()
        };
        let mut div = MutationNode::create(ElementKind::Div);
        div.set_name("field");
        div.set_event("click", "", Some("s1".to_string()), true);

        let output = session_for(bot).render_markup(div).unwrap();
        assert_eq!(output.html, "<div id=\"field\"></div>");
    }

    #[test]
    fn test_empty_div_placeholder_on_legacy_client() {
        let ie6 = ClientProfile::default().with_agent(UserAgent::Ie6);
        let output = session_for(ie6)
            .render_markup(MutationNode::create(ElementKind::Div))
            .unwrap();
        assert_eq!(output.html, "<div>&nbsp;</div>");

        let output = RenderSession::default()
            .render_markup(MutationNode::create(ElementKind::Div))
            .unwrap();
        assert_eq!(output.html, "<div></div>");
    }

    #[test]
    fn test_opening_tag_only() {
        let mut div = MutationNode::create(ElementKind::Div);
        div.set_id("w1");
        div.set_property(Property::InnerHtml, "content");

        let output = RenderSession::default().render_opening_tag(div).unwrap();
        assert_eq!(output.html, "<div id=\"w1\">");
    }

    #[test]
    fn test_custom_tag() {
        let mut node = MutationNode::create(ElementKind::Other);
        node.set_custom_tag("my-widget");
        node.set_property(Property::InnerHtml, "x");

        let output = RenderSession::default().render_markup(node).unwrap();
        assert_eq!(output.html, "<my-widget>x</my-widget>");
    }
}
