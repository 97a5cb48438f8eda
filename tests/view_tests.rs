//! View Routing Tests
//!
//! Tests for:
//! - Instances partitioning across views by texture overrides
//! - Override changes moving instances between views
//! - Automatic creation and destruction of override views
//! - Default view lifecycle around the last instance

use stampede::{
    HandlerRegistry, ModelDefinition, ModelKey, NodeDefinition, Viewer, ViewerOptions,
};

fn blob_definition() -> ModelDefinition {
    let mut definition = ModelDefinition::new("blob");
    definition.nodes = vec![NodeDefinition::new("root", None)];
    definition.bone_lookup = vec![0];
    definition
}

fn viewer_with_blob() -> (Viewer, ModelKey) {
    let mut viewer = Viewer::new(HandlerRegistry::new(), ViewerOptions::default());
    let model = viewer.add_model(blob_definition()).unwrap();
    (viewer, model)
}

/// Every instance of the model appears in exactly one of its views.
fn assert_partition(viewer: &Viewer, model: ModelKey) {
    let entry = viewer.model(model).unwrap();
    let mut seen = Vec::new();
    for &view in entry.views() {
        for &instance in viewer.view(view).unwrap().instances() {
            assert!(
                !seen.contains(&instance),
                "instance appears in two views of the same model"
            );
            seen.push(instance);
        }
    }
    let mut all: Vec<_> = entry.instances().to_vec();
    seen.sort();
    all.sort();
    assert_eq!(seen, all, "view membership does not cover all instances");
}

// ============================================================================
// Partitioning by Overrides
// ============================================================================

#[test]
fn instances_without_overrides_share_the_default_view() {
    let (mut viewer, model) = viewer_with_blob();

    let a = viewer.create_instance(model).unwrap();
    let b = viewer.create_instance(model).unwrap();

    assert_eq!(viewer.instance(a).unwrap().view(), viewer.instance(b).unwrap().view());
    assert_eq!(viewer.model(model).unwrap().views().len(), 1);
    assert_partition(&viewer, model);
}

#[test]
fn an_override_splits_an_instance_into_its_own_view() {
    let (mut viewer, model) = viewer_with_blob();

    let plain = viewer.create_instance(model).unwrap();
    let tinted = viewer.create_instance(model).unwrap();
    viewer.override_texture(tinted, 0, 7).unwrap();

    assert_ne!(
        viewer.instance(plain).unwrap().view(),
        viewer.instance(tinted).unwrap().view()
    );
    assert_eq!(viewer.model(model).unwrap().views().len(), 2);
    assert_partition(&viewer, model);
}

#[test]
fn matching_overrides_converge_on_one_view() {
    let (mut viewer, model) = viewer_with_blob();

    let a = viewer.create_instance(model).unwrap();
    let b = viewer.create_instance(model).unwrap();

    // Same final override set, applied in different orders.
    viewer.override_texture(a, 0, 7).unwrap();
    viewer.override_texture(a, 1, 9).unwrap();
    viewer.override_texture(b, 1, 9).unwrap();
    viewer.override_texture(b, 0, 7).unwrap();

    assert_eq!(viewer.instance(a).unwrap().view(), viewer.instance(b).unwrap().view());
    assert_partition(&viewer, model);
}

// ============================================================================
// View Lifecycle
// ============================================================================

#[test]
fn clearing_the_override_returns_to_the_default_view() {
    let (mut viewer, model) = viewer_with_blob();

    let plain = viewer.create_instance(model).unwrap();
    let tinted = viewer.create_instance(model).unwrap();
    viewer.override_texture(tinted, 0, 7).unwrap();
    assert_eq!(viewer.model(model).unwrap().views().len(), 2);

    viewer.clear_texture_override(tinted, 0).unwrap();

    // The emptied override view is gone, both instances share the default.
    assert_eq!(viewer.model(model).unwrap().views().len(), 1);
    assert_eq!(
        viewer.instance(plain).unwrap().view(),
        viewer.instance(tinted).unwrap().view()
    );
    assert_partition(&viewer, model);
}

#[test]
fn removing_the_last_instance_destroys_its_view() {
    let (mut viewer, model) = viewer_with_blob();

    let only = viewer.create_instance(model).unwrap();
    let view = viewer.instance(only).unwrap().view().unwrap();

    viewer.remove_instance(only).unwrap();

    assert!(viewer.view(view).is_none());
    assert!(viewer.model(model).unwrap().views().is_empty());
    assert!(viewer.model(model).unwrap().instances().is_empty());
}

#[test]
fn creating_after_teardown_rebuilds_the_default_view() {
    let (mut viewer, model) = viewer_with_blob();

    let first = viewer.create_instance(model).unwrap();
    viewer.remove_instance(first).unwrap();

    let second = viewer.create_instance(model).unwrap();
    assert!(viewer.instance(second).unwrap().view().is_some());
    assert_eq!(viewer.model(model).unwrap().views().len(), 1);
}

#[test]
fn override_move_keeps_a_visible_instance_visible() {
    let (mut viewer, model) = viewer_with_blob();
    let scene = viewer.add_scene("main");

    let tinted = viewer.create_instance(model).unwrap();
    viewer.set_scene(tinted, Some(scene)).unwrap();
    let before = viewer.instance(tinted).unwrap().bucket();
    assert!(before.is_some());

    viewer.override_texture(tinted, 0, 7).unwrap();

    let after = viewer.instance(tinted).unwrap().bucket();
    assert!(after.is_some());
    assert_ne!(before.map(|(key, _)| key), after.map(|(key, _)| key));
    assert_eq!(viewer.batches(scene).count(), 1);
}
