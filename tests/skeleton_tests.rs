//! Skeleton Evaluation Tests
//!
//! Tests for:
//! - Parent-before-child world matrix propagation
//! - Instance placement applied above root nodes
//! - Static-pose shortcut for rigid rest poses
//! - Inverse bind application per render bone
//! - Animated channel sampling into the output buffer
//! - Re-parenting and cycle rejection

use glam::{Affine3A, Mat4, Quat, Vec3};

use stampede::animation::{InterpolationMode, KeyframeTrack, Sequence};
use stampede::errors::ViewerError;
use stampede::{ModelDefinition, NodeDefinition, Skeleton};

const EPSILON: f32 = 1e-5;

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

fn translation_of(m: &Mat4) -> Vec3 {
    m.w_axis.truncate()
}

/// Three-node chain: root, an arm offset (1, 0, 0) from it, and a hand
/// offset (0, 1, 0) from the arm. All three are render bones.
fn chain_definition() -> ModelDefinition {
    let mut definition = ModelDefinition::new("chain");
    definition.rigid_static_pose = false;

    let root = NodeDefinition::new("root", None);
    let mut arm = NodeDefinition::new("arm", Some(0));
    arm.translation.default = Vec3::new(1.0, 0.0, 0.0);
    let mut hand = NodeDefinition::new("hand", Some(1));
    hand.translation.default = Vec3::new(0.0, 1.0, 0.0);

    definition.nodes = vec![root, arm, hand];
    definition.bone_lookup = vec![0, 1, 2];
    definition
}

fn evaluate(
    skeleton: &mut Skeleton,
    definition: &ModelDefinition,
    sequence: Option<usize>,
    time: f32,
    placement: Affine3A,
) -> Vec<Mat4> {
    let mut dest = vec![Mat4::IDENTITY; definition.matrices_per_instance()];
    skeleton.update(definition, sequence, time, &placement, &mut dest);
    dest
}

// ============================================================================
// World Matrix Propagation
// ============================================================================

#[test]
fn chain_offsets_accumulate_parent_before_child() {
    let definition = chain_definition();
    let mut skeleton = Skeleton::from_definition(&definition);

    let dest = evaluate(&mut skeleton, &definition, None, 0.0, Affine3A::IDENTITY);

    assert!(approx_vec3(translation_of(&dest[0]), Vec3::ZERO));
    assert!(approx_vec3(translation_of(&dest[1]), Vec3::new(1.0, 0.0, 0.0)));
    assert!(approx_vec3(translation_of(&dest[2]), Vec3::new(1.0, 1.0, 0.0)));
}

#[test]
fn placement_applies_above_roots() {
    let definition = chain_definition();
    let mut skeleton = Skeleton::from_definition(&definition);

    let placement = Affine3A::from_translation(Vec3::new(10.0, 0.0, 0.0));
    let dest = evaluate(&mut skeleton, &definition, None, 0.0, placement);

    assert!(approx_vec3(
        translation_of(&dest[2]),
        Vec3::new(11.0, 1.0, 0.0)
    ));
}

#[test]
fn placement_rotation_carries_into_children() {
    let definition = chain_definition();
    let mut skeleton = Skeleton::from_definition(&definition);

    // Quarter turn around Z maps (1, 0, 0) onto (0, 1, 0).
    let placement = Affine3A::from_quat(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
    let dest = evaluate(&mut skeleton, &definition, None, 0.0, placement);

    assert!(approx_vec3(
        translation_of(&dest[1]),
        Vec3::new(0.0, 1.0, 0.0)
    ));
    assert!(approx_vec3(
        translation_of(&dest[2]),
        Vec3::new(-1.0, 1.0, 0.0)
    ));
}

// ============================================================================
// Static-Pose Shortcut
// ============================================================================

#[test]
fn rigid_static_pose_writes_placement_for_every_bone() {
    let mut definition = chain_definition();
    definition.rigid_static_pose = true;
    let mut skeleton = Skeleton::from_definition(&definition);

    let placement = Affine3A::from_translation(Vec3::new(3.0, 4.0, 5.0));
    let dest = evaluate(&mut skeleton, &definition, None, 0.0, placement);

    let expected = Mat4::from(placement);
    for matrix in &dest {
        assert_eq!(*matrix, expected);
    }
}

#[test]
fn shortcut_does_not_apply_while_a_sequence_plays() {
    let mut definition = chain_definition();
    definition.rigid_static_pose = true;
    definition.sequences.push(Sequence::new("idle", 1.0, true));
    let mut skeleton = Skeleton::from_definition(&definition);

    let dest = evaluate(&mut skeleton, &definition, Some(0), 0.0, Affine3A::IDENTITY);

    // No tracks, so channels fall back to defaults; the chain offsets must
    // still be present rather than the rigid placement.
    assert!(approx_vec3(translation_of(&dest[2]), Vec3::new(1.0, 1.0, 0.0)));
}

// ============================================================================
// Inverse Bind
// ============================================================================

#[test]
fn inverse_bind_is_applied_per_render_bone() {
    let mut definition = chain_definition();
    definition.nodes[1].inverse_bind = Mat4::from_translation(Vec3::new(-1.0, 0.0, 0.0));
    let mut skeleton = Skeleton::from_definition(&definition);

    let dest = evaluate(&mut skeleton, &definition, None, 0.0, Affine3A::IDENTITY);

    // World (1, 0, 0) composed with its bind-pose inverse cancels out.
    assert!(approx_vec3(translation_of(&dest[1]), Vec3::ZERO));
}

#[test]
fn bone_lookup_selects_and_orders_output() {
    let mut definition = chain_definition();
    definition.bone_lookup = vec![2, 0];
    let mut skeleton = Skeleton::from_definition(&definition);

    let dest = evaluate(&mut skeleton, &definition, None, 0.0, Affine3A::IDENTITY);

    assert_eq!(dest.len(), 2);
    assert!(approx_vec3(translation_of(&dest[0]), Vec3::new(1.0, 1.0, 0.0)));
    assert!(approx_vec3(translation_of(&dest[1]), Vec3::ZERO));
}

// ============================================================================
// Animated Channels
// ============================================================================

#[test]
fn tracked_channel_samples_into_world_matrices() {
    let mut definition = chain_definition();
    definition.sequences.push(Sequence::new("raise", 1.0, true));
    definition.nodes[2].translation.set_track(
        0,
        KeyframeTrack::new(
            vec![0.0, 1.0],
            vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 2.0, 0.0)],
            InterpolationMode::Linear,
        )
        .unwrap(),
    );
    let mut skeleton = Skeleton::from_definition(&definition);

    let dest = evaluate(&mut skeleton, &definition, Some(0), 0.5, Affine3A::IDENTITY);

    assert!(approx_vec3(
        translation_of(&dest[2]),
        Vec3::new(1.0, 1.5, 0.0)
    ));
}

#[test]
fn untracked_channels_hold_their_defaults_during_playback() {
    let mut definition = chain_definition();
    definition.sequences.push(Sequence::new("raise", 1.0, true));
    definition.nodes[2].translation.set_track(
        0,
        KeyframeTrack::new(
            vec![0.0, 1.0],
            vec![Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 2.0, 0.0)],
            InterpolationMode::Linear,
        )
        .unwrap(),
    );
    let mut skeleton = Skeleton::from_definition(&definition);

    let dest = evaluate(&mut skeleton, &definition, Some(0), 1.0, Affine3A::IDENTITY);

    // The arm has no tracks and must keep its authored offset.
    assert!(approx_vec3(translation_of(&dest[1]), Vec3::new(1.0, 0.0, 0.0)));
    assert!(approx_vec3(translation_of(&dest[2]), Vec3::new(1.0, 2.0, 0.0)));
}

// ============================================================================
// Re-parenting
// ============================================================================

#[test]
fn reparenting_changes_world_composition() {
    let definition = chain_definition();
    let mut skeleton = Skeleton::from_definition(&definition);

    // Move the hand directly under the root, skipping the arm.
    skeleton.set_parent(2, Some(0)).unwrap();
    let dest = evaluate(&mut skeleton, &definition, None, 0.0, Affine3A::IDENTITY);

    assert!(approx_vec3(translation_of(&dest[2]), Vec3::new(0.0, 1.0, 0.0)));
}

#[test]
fn detaching_makes_a_node_a_root() {
    let definition = chain_definition();
    let mut skeleton = Skeleton::from_definition(&definition);

    skeleton.set_parent(1, None).unwrap();
    let placement = Affine3A::from_translation(Vec3::new(5.0, 0.0, 0.0));
    let dest = evaluate(&mut skeleton, &definition, None, 0.0, placement);

    // The arm now composes with the placement alone.
    assert!(approx_vec3(translation_of(&dest[1]), Vec3::new(6.0, 0.0, 0.0)));
}

#[test]
fn self_parenting_is_rejected() {
    let definition = chain_definition();
    let mut skeleton = Skeleton::from_definition(&definition);

    let err = skeleton.set_parent(1, Some(1)).unwrap_err();
    assert!(matches!(err, ViewerError::HierarchyCycle { .. }));
}

#[test]
fn descendant_parenting_is_rejected() {
    let definition = chain_definition();
    let mut skeleton = Skeleton::from_definition(&definition);

    // The hand is a descendant of the arm, so the arm may not adopt it as
    // its parent.
    let err = skeleton.set_parent(1, Some(2)).unwrap_err();
    assert!(matches!(err, ViewerError::HierarchyCycle { .. }));
}

#[test]
fn out_of_range_indices_are_rejected() {
    let definition = chain_definition();
    let mut skeleton = Skeleton::from_definition(&definition);

    assert!(matches!(
        skeleton.set_parent(7, None),
        Err(ViewerError::NodeOutOfRange { .. })
    ));
    assert!(matches!(
        skeleton.set_parent(0, Some(7)),
        Err(ViewerError::NodeOutOfRange { .. })
    ));
}
