/// Tests for keyed collection diffing
use crate::component::Output;
use crate::element::{Element, PrimitiveKind};
use crate::error::{LifecyclePhase, ReconcileError};
use crate::host::HostRef;
use crate::props::{prop_map, Key, PropValue};
use crate::test_support::{el, stage, Log, Probe};
use crate::tree::Slot;

fn item(key: i64, label: &str) -> Element {
    el(PrimitiveKind::Text)
        .key(key)
        .prop("label", label)
        .build()
        .unwrap()
}

#[test]
fn test_keyed_update_reuses_matches_and_unmounts_missing() {
    let (backend, mut renderer) = stage();
    let list = el(PrimitiveKind::Container)
        .group(vec![item(1, "A"), item(2, "B")])
        .build()
        .unwrap();
    let root = renderer.render_root(&list).unwrap();
    let container: HostRef = backend.root.children()[0].clone();
    let graphics = backend.root.children()[0].children();

    let a = renderer.tree().find_in_descendants(root).find(Key::Int(1)).unwrap();
    let b = renderer.tree().find_in_descendants(root).find(Key::Int(2)).unwrap();
    let created = backend.factory.created();

    let result = renderer
        .update_keyed_children(
            &[item(2, "B2"), item(3, "C")],
            vec![Some(a), Some(b)],
            root,
            &container,
        )
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result[0], Some(b));
    let c = result[1].unwrap();
    assert_ne!(c, a);
    assert_eq!(renderer.node(c).unwrap().key(), Some(&Key::Int(3)));

    // B reused with new props, C freshly built, A gone exactly once
    assert_eq!(
        renderer.props_of(b).unwrap().get("label"),
        Some(&PropValue::from("B2"))
    );
    assert_eq!(backend.factory.created(), created + 1);
    assert_eq!(graphics[0].remove_count(), 1);
    assert_eq!(graphics[1].remove_count(), 0);
    assert!(!renderer.tree().contains(a));
}

#[test]
fn test_keyed_result_follows_new_order() {
    let (backend, mut renderer) = stage();
    let list = el(PrimitiveKind::Container)
        .group(vec![item(1, "A"), item(2, "B"), item(3, "C")])
        .build()
        .unwrap();
    let root = renderer.render_root(&list).unwrap();
    let container: HostRef = backend.root.children()[0].clone();

    let ids = match &renderer.node(root).unwrap().slots()[0] {
        Slot::Keyed(ids) => ids.clone(),
        other => panic!("Expected keyed slot, got {:?}", other),
    };

    let result = renderer
        .update_keyed_children(
            &[item(3, "C"), item(1, "A"), item(2, "B")],
            ids.clone(),
            root,
            &container,
        )
        .unwrap();

    assert_eq!(result, vec![ids[2], ids[0], ids[1]]);
    assert_eq!(backend.factory.created(), 4);
}

#[test]
fn test_keyed_group_in_render_output() {
    let (backend, mut renderer) = stage();
    let log = Log::default();
    let app = Probe::new("App", &log, |cx| {
        let keys: Vec<i64> = cx
            .state()
            .get("keys")
            .and_then(|v| v.as_list())
            .map(|list| list.iter().filter_map(PropValue::as_int).collect())
            .unwrap_or_else(|| vec![1, 2]);
        let items = keys
            .iter()
            .map(|k| el(PrimitiveKind::Text).key(*k).prop("label", *k).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Output::Many(vec![items.into()]))
    })
    .into_type();

    let id = renderer.render_root(&el(&app).build().unwrap()).unwrap();
    let first = backend.root.children();
    assert_eq!(first.len(), 2);

    renderer.handle(id).unwrap().set_state(prop_map([(
        "keys",
        PropValue::List(vec![2.into(), 3.into()]),
    )]));
    renderer.flush().unwrap();

    assert_eq!(first[0].remove_count(), 1);
    assert_eq!(first[1].remove_count(), 0);
    assert_eq!(backend.root.children().len(), 2);
    assert_eq!(backend.factory.created(), 3);

    match &renderer.node(id).unwrap().slots()[0] {
        Slot::Keyed(ids) => {
            let keys: Vec<Option<Key>> = ids
                .iter()
                .map(|id| renderer.node(id.unwrap()).unwrap().key().cloned())
                .collect();
            assert_eq!(keys, vec![Some(Key::Int(2)), Some(Key::Int(3))]);
        }
        other => panic!("Expected keyed slot, got {:?}", other),
    }
}

#[test]
fn test_missing_key_fails_update() {
    let (backend, mut renderer) = stage();
    let list = el(PrimitiveKind::Container)
        .group(vec![item(1, "A")])
        .build()
        .unwrap();
    let root = renderer.render_root(&list).unwrap();
    let container: HostRef = backend.root.children()[0].clone();

    let unkeyed = el(PrimitiveKind::Text).build().unwrap();
    let result = renderer.update_keyed_children(
        &[item(1, "A"), unkeyed],
        vec![],
        root,
        &container,
    );

    match result {
        Err(ReconcileError::MissingKey { index, component }) => {
            assert_eq!(index, 1);
            assert_eq!(component, "container");
        }
        other => panic!("Expected MissingKey, got {:?}", other),
    }
}

#[test]
fn test_missing_key_fails_build() {
    let (_backend, mut renderer) = stage();
    let list = el(PrimitiveKind::Container)
        .group(vec![el(PrimitiveKind::Text).build().unwrap()])
        .build()
        .unwrap();

    let result = renderer.render_root(&list);
    assert!(matches!(
        result,
        Err(ReconcileError::MissingKey { index: 0, .. })
    ));
    assert!(renderer.tree().is_empty());
}

#[test]
fn test_keyed_type_change_replaces_instance() {
    let (backend, mut renderer) = stage();
    let list = el(PrimitiveKind::Container)
        .group(vec![item(1, "A")])
        .build()
        .unwrap();
    let root = renderer.render_root(&list).unwrap();
    let container: HostRef = backend.root.children()[0].clone();
    let a = renderer.tree().find_in_descendants(root).find(Key::Int(1)).unwrap();

    let sprite = el(PrimitiveKind::Sprite).key(1).build().unwrap();
    let result = renderer
        .update_keyed_children(&[sprite], vec![Some(a)], root, &container)
        .unwrap();

    let replacement = result[0].unwrap();
    assert_ne!(replacement, a);
    assert!(!renderer.tree().contains(a));
    assert_eq!(backend.root.children()[0].child_labels(), vec!["sprite"]);
}

#[test]
fn test_string_keys() {
    let (backend, mut renderer) = stage();
    let list = el(PrimitiveKind::Container)
        .group(vec![
            el(PrimitiveKind::Text).key("a").build().unwrap(),
            el(PrimitiveKind::Text).key("b").build().unwrap(),
        ])
        .build()
        .unwrap();
    let root = renderer.render_root(&list).unwrap();
    let container: HostRef = backend.root.children()[0].clone();
    let b = renderer
        .tree()
        .find_in_descendants(root)
        .find(Key::Str("b".into()))
        .unwrap();

    let current: Vec<_> = renderer.node(root).unwrap().slots()[0]
        .ids()
        .into_iter()
        .map(Some)
        .collect();

    let result = renderer
        .update_keyed_children(
            &[el(PrimitiveKind::Text).key("b").build().unwrap()],
            current,
            root,
            &container,
        )
        .unwrap();

    assert_eq!(result, vec![Some(b)]);
    assert_eq!(backend.root.children()[0].children().len(), 1);
}

#[test]
fn test_failed_keyed_update_keeps_mounted_nodes_reachable() {
    let (backend, mut renderer) = stage();
    let log = Log::default();
    let broken = Probe::new("Broken", &log, |_| Ok(Output::Empty))
        .failing(LifecyclePhase::Render)
        .into_type();
    let app = Probe::new("App", &log, move |cx| {
        let step = cx.state().get("step").and_then(|v| v.as_int()).unwrap_or(0);
        let items = match step {
            0 => vec![el(PrimitiveKind::Text).key(1).build()?],
            1 => vec![
                el(PrimitiveKind::Sprite).key(2).build()?,
                el(&broken).key(3).build()?,
            ],
            _ => vec![],
        };
        Ok(Output::Many(vec![items.into()]))
    })
    .into_type();

    let id = renderer.render_root(&el(&app).build().unwrap()).unwrap();
    let handle = renderer.handle(id).unwrap();

    handle.set_state(prop_map([("step", 1)]));
    assert!(matches!(
        renderer.flush(),
        Err(ReconcileError::RenderBoundary(ref e)) if e.component == "Broken"
    ));
    // No rollback: the new sprite stays, the unclaimed text is not removed yet
    assert_eq!(backend.root.child_labels(), vec!["text", "sprite"]);
    assert_eq!(renderer.node(id).unwrap().child_ids().len(), 2);

    handle.set_state(prop_map([("step", 2)]));
    renderer.flush().unwrap();

    assert!(backend.root.children().is_empty());
    assert_eq!(renderer.tree().len(), 1);
}

#[test]
fn test_large_keyed_list_reversal_reuses_every_node() {
    let (backend, mut renderer) = stage();
    let forward: Vec<_> = (0..500).map(|k| item(k, "row")).collect();
    let list = el(PrimitiveKind::Container).group(forward).build().unwrap();
    let root = renderer.render_root(&list).unwrap();
    let container: HostRef = backend.root.children()[0].clone();
    let current: Vec<_> = renderer.node(root).unwrap().slots()[0]
        .ids()
        .into_iter()
        .map(Some)
        .collect();
    let created = backend.factory.created();

    let reversed: Vec<_> = (0..500).rev().map(|k| item(k, "row")).collect();
    let result = renderer
        .update_keyed_children(&reversed, current.clone(), root, &container)
        .unwrap();

    let mut expected = current;
    expected.reverse();
    assert_eq!(result, expected);
    assert_eq!(backend.factory.created(), created);
    assert_eq!(renderer.stats().unmounted, 0);
}
