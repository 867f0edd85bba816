//! Composition of event handler bodies from their actions.

use crate::client::RenderConfig;
use crate::escape::{escape_into, EscapeMode};
use crate::kind::ElementKind;
use crate::node::EventHandler;

/// Final script body for `handler` installed on an element of `kind`.
///
/// An empty result means the handler has nothing to run.
pub(crate) fn handler_body(
    event: &str,
    handler: &EventHandler,
    kind: ElementKind,
    config: &RenderConfig,
) -> String {
    let mut body = String::new();

    if handler.wrap {
        let mut actions = String::new();
        for action in &handler.actions {
            let guarded = !action.condition.is_empty();
            if guarded {
                actions.push_str("if(");
                actions.push_str(&action.condition);
                actions.push_str("){");
            }
            actions.push_str(&action.code);
            if action.exposed {
                if let Some(signal) = &action.signal {
                    push_update_call(&mut actions, signal, config);
                }
            }
            if guarded {
                actions.push('}');
            }
        }

        let anchor_click = kind == ElementKind::A && event == "click";
        let exposed_signal = handler.signal.as_deref().filter(|_| handler.exposed);

        if anchor_click || exposed_signal.is_some() || !actions.is_empty() {
            body.push_str("var e=event||window.event,o=this;");
            if anchor_click {
                // Modified clicks open the link natively.
                body.push_str("if(e.ctrlKey||e.metaKey||e.shiftKey||(");
                body.push_str(&config.runtime_class);
                body.push_str(".button(e) > 1))return true;else{");
            }
            body.push_str(&actions);
            if let Some(signal) = exposed_signal {
                push_update_call(&mut body, signal, config);
            }
            if anchor_click {
                body.push('}');
            }
        }
    } else {
        for action in &handler.actions {
            body.push_str(&action.code);
        }
    }

    body.push_str(&handler.appended);

    if event == "keypress" && !body.is_empty() {
        body = format!(
            "if ({}.isKeyPress(event)){{{}}}",
            config.runtime_class, body
        );
    }

    body
}

fn push_update_call(out: &mut String, signal: &str, config: &RenderConfig) {
    out.push_str(&config.app_class);
    out.push_str("._p_.update(o,'");
    escape_into(out, signal, EscapeMode::JsSingleQuoted);
    out.push_str("',e,true);");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::EventAction;

    fn handler(code: &str, signal: Option<&str>, exposed: bool) -> EventHandler {
        EventHandler {
            signal: signal.map(str::to_string),
            exposed,
            actions: vec![EventAction {
                code: code.to_string(),
                ..EventAction::default()
            }],
            wrap: true,
            appended: String::new(),
        }
    }

    #[test]
    fn test_empty_handler_has_no_body() {
        let body = handler_body(
            "click",
            &handler("", Some("s1"), false),
            ElementKind::Div,
            &RenderConfig::default(),
        );
        assert_eq!(body, "");
    }

    #[test]
    fn test_exposed_signal_is_propagated() {
        let body = handler_body(
            "click",
            &handler("a();", Some("s1"), true),
            ElementKind::Div,
            &RenderConfig::default(),
        );
        assert_eq!(
            body,
            "var e=event||window.event,o=this;a();APP._p_.update(o,'s1',e,true);"
        );
    }

    #[test]
    fn test_anchor_click_guard() {
        let body = handler_body(
            "click",
            &handler("", None, false),
            ElementKind::A,
            &RenderConfig::default(),
        );
        assert_eq!(
            body,
            "var e=event||window.event,o=this;\
             if(e.ctrlKey||e.metaKey||e.shiftKey||(Wt.button(e) > 1))return true;else{}"
        );
    }

    #[test]
    fn test_keypress_is_filtered() {
        let config = RenderConfig {
            runtime_class: "Rt".to_string(),
            ..RenderConfig::default()
        };
        let mut h = handler("", None, false);
        h.wrap = false;
        h.appended = "k();".to_string();

        assert_eq!(
            handler_body("keypress", &h, ElementKind::Input, &config),
            "if (Rt.isKeyPress(event)){k();}"
        );
    }

    #[test]
    fn test_guarded_actions() {
        let h = EventHandler {
            actions: vec![
                EventAction {
                    condition: "e.keyCode==13".to_string(),
                    code: "enter();".to_string(),
                    signal: Some("s2".to_string()),
                    exposed: true,
                },
                EventAction {
                    code: "always();".to_string(),
                    ..EventAction::default()
                },
            ],
            wrap: true,
            ..EventHandler::default()
        };

        assert_eq!(
            handler_body("keydown", &h, ElementKind::Input, &RenderConfig::default()),
            "var e=event||window.event,o=this;\
             if(e.keyCode==13){enter();APP._p_.update(o,'s2',e,true);}always();"
        );
    }
}
