use crate::error::{RenderError, RenderResult};
use crate::node::{Mode, MutationNode};
use crate::script::{render_phase, Phase};
use crate::session::RenderSession;
use tracing::{debug, info, instrument};

/// Render a batch of update roots as one script.
///
/// Every root gets its Delete pass before any Create pass, and its Create
/// pass before any Update pass. The output is accumulated in a scratch buffer
/// that is dropped if any root fails.
#[instrument(skip(nodes, session), fields(roots = nodes.len(), agent = ?session.client.agent))]
pub(crate) fn render(mut nodes: Vec<MutationNode>, session: &mut RenderSession) -> RenderResult<String> {
    for node in &nodes {
        if node.mode == Mode::Create {
            return Err(RenderError::CreatedRoot {
                kind: node.tag_name().to_string(),
            });
        }
        if !node.is_addressable() {
            return Err(RenderError::Unaddressable);
        }
    }

    let mut scratch = String::new();
    for phase in Phase::ALL {
        let before = scratch.len();
        for node in nodes.iter_mut() {
            render_phase(node, phase, session, &mut scratch)?;
        }
        debug!(phase = ?phase, bytes = scratch.len() - before, "Rendered phase");
    }

    info!(bytes = scratch.len(), names = session.ids.count(), "Rendered script batch");
    Ok(scratch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ElementKind;
    use crate::property::Property;

    #[test]
    fn test_created_root_is_rejected() {
        let mut session = RenderSession::default();
        let result = render(vec![MutationNode::create(ElementKind::Div)], &mut session);
        assert_eq!(
            result,
            Err(RenderError::CreatedRoot {
                kind: "div".to_string()
            })
        );
    }

    #[test]
    fn test_phases_span_the_batch() {
        let mut session = RenderSession::default();

        let mut first = MutationNode::get_for_update("w1", ElementKind::Div).unwrap();
        first.set_property(Property::Class, "c");
        let mut second = MutationNode::get_for_update("w2", ElementKind::Div).unwrap();
        second.remove_from_parent();

        let script = render(vec![first, second], &mut session).unwrap();
        assert_eq!(script, "Wt.remove('w2');\nvar j0=Wt.$('w1');\nj0.className='c';\n");
    }

    #[test]
    fn test_empty_updates_render_nothing() {
        let mut session = RenderSession::default();
        let nodes = vec![
            MutationNode::get_for_update("w1", ElementKind::Div).unwrap(),
            MutationNode::update_given("document.body", ElementKind::Div).unwrap(),
        ];
        assert_eq!(render(nodes, &mut session).unwrap(), "");
    }
}
