/// Tests for descendant / ancestor / sibling queries
use crate::component::ComponentType;
use crate::element::{ElementType, PrimitiveKind};
use crate::props::{prop_map, Key, PropValue};
use crate::renderer::Renderer;
use crate::selector::Criteria;
use crate::test_support::{el, stage, Log, Probe};
use crate::tree::NodeId;

struct Scene {
    renderer: Renderer,
    app_type: ComponentType,
    app: NodeId,
}

/// App
/// └─ container (name=panel)
///    ├─ text (label=a, key=1)
///    ├─ sprite (style.fill=red)
///    └─ container (name=inner)
///       └─ circle
fn scene() -> Scene {
    let (_backend, mut renderer) = stage();
    let log = Log::default();
    let app_type = Probe::new("App", &log, |_| {
        let inner = el(PrimitiveKind::Container)
            .prop("name", "inner")
            .child(el(PrimitiveKind::Circle).build()?)
            .build()?;
        Ok(el(PrimitiveKind::Container)
            .prop("name", "panel")
            .child(el(PrimitiveKind::Text).prop("label", "a").key(1).build()?)
            .child(
                el(PrimitiveKind::Sprite)
                    .prop("style", PropValue::Map(prop_map([("fill", "red")])))
                    .build()?,
            )
            .child(inner)
            .build()?
            .into())
    })
    .into_type();

    let app = renderer.render_root(&el(&app_type).build().unwrap()).unwrap();
    Scene {
        renderer,
        app_type,
        app,
    }
}

#[test]
fn test_find_in_descendants_by_type() {
    let scene = scene();
    let tree = scene.renderer.tree();

    let text = tree.find_in_descendants(scene.app).find(PrimitiveKind::Text).unwrap();
    assert_eq!(
        tree.node(text).unwrap().props().get("label"),
        Some(&PropValue::from("a"))
    );

    // Breadth first: the outer container comes before the inner one
    let containers = tree
        .find_in_descendants(scene.app)
        .find_all(PrimitiveKind::Container);
    assert_eq!(containers.len(), 2);
    assert_eq!(
        tree.node(containers[0]).unwrap().props().get("name"),
        Some(&PropValue::from("panel"))
    );

    // The start node is never a match
    assert_eq!(
        tree.find_in_descendants(scene.app).find(&scene.app_type),
        None
    );
}

#[test]
fn test_find_in_descendants_by_prop_path() {
    let scene = scene();
    let tree = scene.renderer.tree();

    let sprite = tree
        .find_in_descendants(scene.app)
        .find(Criteria::props([("style.fill", "red")]))
        .unwrap();
    assert_eq!(
        tree.node(sprite).unwrap().element_type(),
        &ElementType::Primitive(PrimitiveKind::Sprite)
    );

    assert_eq!(
        tree.find_in_descendants(scene.app)
            .find(Criteria::props([("style.fill", "blue")])),
        None
    );
}

#[test]
fn test_find_in_ancestors() {
    let scene = scene();
    let tree = scene.renderer.tree();
    let circle = tree
        .find_in_descendants(scene.app)
        .find(PrimitiveKind::Circle)
        .unwrap();

    let nearest = tree.find_in_ancestors(circle).find(PrimitiveKind::Container).unwrap();
    assert_eq!(
        tree.node(nearest).unwrap().props().get("name"),
        Some(&PropValue::from("inner"))
    );
    assert_eq!(
        tree.find_in_ancestors(circle).find(&scene.app_type),
        Some(scene.app)
    );
    assert_eq!(tree.find_in_ancestors(scene.app).find(PrimitiveKind::Container), None);
}

#[test]
fn test_find_in_siblings() {
    let scene = scene();
    let tree = scene.renderer.tree();
    let text = tree
        .find_in_descendants(scene.app)
        .find(Criteria::Key(Key::Int(1)))
        .unwrap();

    assert!(tree.find_in_siblings(text).find(PrimitiveKind::Sprite).is_some());
    assert!(tree.find_in_siblings(text).find(PrimitiveKind::Container).is_some());
    // Not recursive, and excludes the start node
    assert_eq!(tree.find_in_siblings(text).find(PrimitiveKind::Circle), None);
    assert_eq!(tree.find_in_siblings(text).find(PrimitiveKind::Text), None);
    assert_eq!(tree.find_in_siblings(scene.app).find(PrimitiveKind::Text), None);
}

#[test]
fn test_stale_start_finds_nothing() {
    let mut scene = scene();
    let app = scene.app;
    scene.renderer.unmount(app).unwrap();

    let tree = scene.renderer.tree();
    assert_eq!(tree.find_in_descendants(app).find(PrimitiveKind::Text), None);
    assert_eq!(tree.find_in_ancestors(app).find(PrimitiveKind::Text), None);
    assert_eq!(tree.find_in_siblings(app).find(PrimitiveKind::Text), None);
}
