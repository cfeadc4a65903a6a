/// Tests for positional diffing: reuse, replacement, removal and prop pushes
use crate::component::Output;
use crate::element::PrimitiveKind;
use crate::error::ReconcileError;
use crate::headless::{HeadlessNode, HostOp};
use crate::host::HostRef;
use crate::props::{prop_map, PropValue};
use crate::test_support::{el, stage, Log, Probe};
use std::rc::Rc;

fn text_of(node: &HeadlessNode, prop: &str) -> Option<PropValue> {
    node.props().get(prop).cloned()
}

#[test]
fn test_same_type_update_reuses_node() {
    let (backend, mut renderer) = stage();
    let log = Log::default();
    let app = Probe::new("App", &log, |cx| {
        let label = cx
            .state()
            .get("label")
            .and_then(|v| v.as_str())
            .unwrap_or("start")
            .to_string();
        Ok(el(PrimitiveKind::Container).prop("label", label).build()?.into())
    })
    .into_type();

    let id = renderer.render_root(&el(&app).build().unwrap()).unwrap();
    let container = backend.root.children()[0].clone();
    let container_id = renderer.node(id).unwrap().child_ids()[0];
    assert_eq!(backend.factory.created(), 1);

    renderer
        .handle(id)
        .unwrap()
        .set_state(prop_map([("label", "next")]));

    // Deferred: the backend still shows the old label
    assert_eq!(text_of(&container, "label"), Some("start".into()));
    assert_eq!(renderer.pending(), 1);

    let report = renderer.flush().unwrap();
    assert_eq!(report.passes, 1);
    assert_eq!(text_of(&container, "label"), Some("next".into()));
    assert_eq!(backend.factory.created(), 1);
    assert_eq!(renderer.node(id).unwrap().child_ids(), vec![container_id]);
}

#[test]
fn test_type_change_mounts_replacement_before_unmounting() {
    let (backend, mut renderer) = stage();
    let log = Log::default();
    let app = Probe::new("App", &log, |cx| {
        let kind = if cx.state().get("sprite").is_some_and(|v| v.is_truthy()) {
            PrimitiveKind::Sprite
        } else {
            PrimitiveKind::Text
        };
        Ok(el(kind).build()?.into())
    })
    .into_type();

    let id = renderer.render_root(&el(&app).build().unwrap()).unwrap();
    let text = backend.root.children()[0].clone();
    backend.journal.clear();

    renderer
        .handle(id)
        .unwrap()
        .set_state(prop_map([("sprite", true)]));
    renderer.flush().unwrap();

    assert_eq!(backend.root.child_labels(), vec!["sprite"]);
    assert_eq!(text.remove_count(), 1);
    assert_eq!(backend.factory.created(), 2);

    let ops = backend.journal.ops();
    let added = ops
        .iter()
        .position(|op| matches!(op, HostOp::Add { child, .. } if child.starts_with("sprite")))
        .unwrap();
    let removed = ops
        .iter()
        .position(|op| matches!(op, HostOp::Remove { node } if node.starts_with("text")))
        .unwrap();
    assert!(added < removed);
}

#[test]
fn test_empty_output_unmounts_child() {
    let (backend, mut renderer) = stage();
    let log = Log::default();
    let app = Probe::new("App", &log, |cx| {
        if cx.state().get("hidden").is_some_and(|v| v.is_truthy()) {
            return Ok(Output::Empty);
        }
        Ok(el(PrimitiveKind::Text).build()?.into())
    })
    .into_type();

    let id = renderer.render_root(&el(&app).build().unwrap()).unwrap();
    let text = backend.root.children()[0].clone();

    let handle = renderer.handle(id).unwrap();
    handle.set_state(prop_map([("hidden", true)]));
    renderer.flush().unwrap();

    assert!(backend.root.children().is_empty());
    assert_eq!(text.remove_count(), 1);
    assert_eq!(renderer.tree().len(), 1);

    // And back again: a fresh node is built
    handle.set_state(prop_map([("hidden", false)]));
    renderer.flush().unwrap();
    assert_eq!(backend.root.child_labels(), vec!["text"]);
    assert_eq!(backend.factory.created(), 2);
}

#[test]
fn test_trailing_slots_are_unmounted() {
    let (backend, mut renderer) = stage();
    let log = Log::default();
    let app = Probe::new("App", &log, |cx| {
        let count = cx.state().get("count").and_then(|v| v.as_int()).unwrap_or(3);
        let mut container = el(PrimitiveKind::Container);
        for i in 0..count {
            container = container.child(el(PrimitiveKind::Text).prop("index", i).build()?);
        }
        Ok(container.build()?.into())
    })
    .into_type();

    let id = renderer.render_root(&el(&app).build().unwrap()).unwrap();
    let container = backend.root.children()[0].clone();
    let texts = container.children();
    assert_eq!(texts.len(), 3);

    renderer
        .handle(id)
        .unwrap()
        .set_state(prop_map([("count", 1)]));
    renderer.flush().unwrap();

    assert_eq!(container.children().len(), 1);
    assert_eq!(texts[0].remove_count(), 0);
    assert_eq!(texts[1].remove_count(), 1);
    assert_eq!(texts[2].remove_count(), 1);
    // Container + 1 text + App
    assert_eq!(renderer.tree().len(), 3);
    assert_eq!(backend.factory.created(), 4);
}

#[test]
fn test_update_child_same_type_skips_factory() {
    let (backend, mut renderer) = stage();
    let element = el(PrimitiveKind::Container)
        .child(el(PrimitiveKind::Text).prop("text", "a").build().unwrap())
        .build()
        .unwrap();
    let root = renderer.render_root(&element).unwrap();
    let text_id = renderer.node(root).unwrap().child_ids()[0];
    let container: HostRef = backend.root.children()[0].clone();
    let created = backend.factory.created();

    let incoming = el(PrimitiveKind::Text).prop("text", "b").build().unwrap();
    let result = renderer
        .update_child(Some(text_id), Some(&incoming), root, &container)
        .unwrap();

    assert_eq!(result, Some(text_id));
    assert_eq!(backend.factory.created(), created);
    assert_eq!(
        renderer.props_of(text_id).unwrap().get("text"),
        Some(&PropValue::from("b"))
    );
}

#[test]
fn test_update_child_policy_edges() {
    let (backend, mut renderer) = stage();
    let root = renderer
        .render_root(&el(PrimitiveKind::Container).build().unwrap())
        .unwrap();
    let container: HostRef = backend.root.children()[0].clone();

    assert_eq!(renderer.update_child(None, None, root, &container).unwrap(), None);

    let incoming = el(PrimitiveKind::Sprite).build().unwrap();
    let built = renderer
        .update_child(None, Some(&incoming), root, &container)
        .unwrap()
        .unwrap();
    assert!(renderer.node(built).unwrap().is_mounted());

    let removed = renderer.update_child(Some(built), None, root, &container).unwrap();
    assert_eq!(removed, None);
    assert!(!renderer.tree().contains(built));
}

#[test]
fn test_props_flow_to_custom_child_in_next_turn() {
    let (backend, mut renderer) = stage();
    let log = Log::default();
    let child = Probe::new("Child", &log, |cx| {
        let n = cx.props().get("n").cloned().unwrap_or(PropValue::Null);
        Ok(el(PrimitiveKind::Text).prop("n", n).build()?.into())
    })
    .into_type();
    let parent = Probe::new("Parent", &log, move |cx| {
        let n = cx.state().get("n").and_then(|v| v.as_int()).unwrap_or(0);
        Ok(el(&child).prop("n", n).build()?.into())
    })
    .into_type();

    let id = renderer.render_root(&el(&parent).build().unwrap()).unwrap();
    let text = backend.root.children()[0].clone();
    log.clear();

    renderer
        .handle(id)
        .unwrap()
        .set_state(prop_map([("n", 7)]));
    let report = renderer.flush().unwrap();

    // Parent pass pushes props; the child's own pass runs a turn later
    assert_eq!(report.turns, 2);
    assert_eq!(report.passes, 2);
    assert_eq!(log.count("Child:will_receive_props"), 1);
    assert_eq!(text.props().get("n"), Some(&PropValue::Int(7)));
    assert_eq!(backend.factory.created(), 1);
}

#[test]
fn test_update_component_on_primitive_refreshes_in_place() {
    let (backend, mut renderer) = stage();
    let id = renderer
        .render_root(&el(PrimitiveKind::Sprite).build().unwrap())
        .unwrap();
    let sprite = backend.root.children()[0].clone();
    let updates = sprite.update_count();

    renderer.update_component(id, Output::Empty).unwrap();
    assert_eq!(sprite.update_count(), updates + 1);
    assert_eq!(backend.root.children().len(), 1);
    assert!(Rc::ptr_eq(&sprite, &backend.root.children()[0]));
}

#[test]
fn test_stale_id_is_unrecognized() {
    let (_backend, mut renderer) = stage();
    let id = renderer
        .render_root(&el(PrimitiveKind::Text).build().unwrap())
        .unwrap();
    renderer.unmount(id).unwrap();

    let element = el(PrimitiveKind::Text).build().unwrap();
    let result = renderer.update_component_props_by_type(id, &element);
    assert!(matches!(
        result,
        Err(ReconcileError::UnrecognizedComponent { .. })
    ));
}

#[test]
fn test_fragment_children_diffed_into_enclosing_container() {
    let (backend, mut renderer) = stage();
    let log = Log::default();
    let app = Probe::new("App", &log, |cx| {
        let extra = cx.state().get("extra").is_some_and(|v| v.is_truthy());
        let mut fragment = el(PrimitiveKind::Fragment).child(el(PrimitiveKind::Text).build()?);
        if extra {
            fragment = fragment.child(el(PrimitiveKind::Sprite).build()?);
        }
        Ok(el(PrimitiveKind::Container)
            .child(fragment.build()?)
            .build()?
            .into())
    })
    .into_type();

    let id = renderer.render_root(&el(&app).build().unwrap()).unwrap();
    let container = backend.root.children()[0].clone();
    assert_eq!(container.child_labels(), vec!["text"]);

    renderer
        .handle(id)
        .unwrap()
        .set_state(prop_map([("extra", true)]));
    renderer.flush().unwrap();

    assert_eq!(container.child_labels(), vec!["text", "sprite"]);
}
