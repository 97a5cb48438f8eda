//! A flock of animated instances sharing one model, driven headless.
//!
//! Run with `RUST_LOG=debug cargo run --example flock` to watch buckets and
//! views get created as instances spread across texture variants.

use glam::{Quat, Vec3};
use stampede::{
    HandlerRegistry, InterpolationMode, KeyframeTrack, ModelDefinition, ModelParser,
    NodeDefinition, Result, Sequence, Viewer, ViewerOptions,
};

/// A toy decoder: ignores its input and produces a three-bone "bird" whose
/// wing bones flap in the single looping sequence.
struct BirdParser;

impl ModelParser for BirdParser {
    fn parse(&self, _data: &[u8]) -> Result<ModelDefinition> {
        let mut definition = ModelDefinition::new("bird");
        definition.sequences.push(Sequence::new("flap", 0.5, true));
        definition.rigid_static_pose = true;

        let body = NodeDefinition::new("body", None);

        let mut left = NodeDefinition::new("wing_l", Some(0));
        left.translation = stampede::AnimatedValue::constant(Vec3::new(-0.5, 0.0, 0.0));
        left.rotation.set_track(
            0,
            KeyframeTrack::new(
                vec![0.0, 0.25, 0.5],
                vec![
                    Quat::from_rotation_x(-0.8),
                    Quat::from_rotation_x(0.8),
                    Quat::from_rotation_x(-0.8),
                ],
                InterpolationMode::Linear,
            )?,
        );

        let mut right = NodeDefinition::new("wing_r", Some(0));
        right.translation = stampede::AnimatedValue::constant(Vec3::new(0.5, 0.0, 0.0));
        right.rotation.set_track(
            0,
            KeyframeTrack::new(
                vec![0.0, 0.25, 0.5],
                vec![
                    Quat::from_rotation_x(0.8),
                    Quat::from_rotation_x(-0.8),
                    Quat::from_rotation_x(0.8),
                ],
                InterpolationMode::Linear,
            )?,
        );

        definition.nodes = vec![body, left, right];
        definition.bone_lookup = vec![0, 1, 2];
        Ok(definition)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let mut registry = HandlerRegistry::new();
    registry.register("bird", Box::new(BirdParser));

    let mut viewer = Viewer::new(
        registry,
        ViewerOptions {
            max_instances_per_bucket: 16,
        },
    );
    let sky = viewer.add_scene("sky");
    let model = viewer.load_model("bird", &[])?;

    // 40 birds, two texture variants, one shared sequence.
    for i in 0..40 {
        let bird = viewer.create_instance(model)?;
        viewer.set_scene(bird, Some(sky))?;
        viewer.set_sequence(bird, Some(0))?;
        if i % 2 == 1 {
            viewer.override_texture(bird, 0, 1)?;
        }
        if let Some(instance) = viewer.instance_mut(bird) {
            instance
                .placement
                .translate(Vec3::new((i % 8) as f32 * 2.0, 0.0, (i / 8) as f32 * 2.0));
        }
    }

    // Three simulated seconds at 60 fps.
    for _frame in 0..180 {
        viewer.update(1.0 / 60.0);
    }

    let mut total_bytes = 0;
    for batch in viewer.batches(sky) {
        total_bytes += batch.bucket.as_bytes().len();
        println!(
            "batch: view {:?}, {} / {} instances, {} matrix bytes",
            batch.view,
            batch.bucket.occupied_count(),
            batch.bucket.capacity(),
            batch.bucket.as_bytes().len()
        );
    }
    println!("{total_bytes} bytes uploaded per frame");
    Ok(())
}
