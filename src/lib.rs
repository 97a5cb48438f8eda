//! Batched skeletal-instance rendering core.
//!
//! The crate turns many animated copies of a model into few draw calls.
//! Every model exposes one or more [`ModelView`]s (render configurations
//! distinguished by texture overrides); each view packs its visible
//! instances into fixed-capacity [`Bucket`]s whose bone-matrix buffers
//! upload as a single block per frame. A [`Scene`] is a render target that
//! tracks which buckets currently hold instances attached to it.
//!
//! The [`Viewer`] owns all of it and drives two frame passes: `update`
//! advances sequence time and evaluates skeletons into bucket buffers,
//! `batches` hands the render backend one upload-and-draw unit per bucket.
//!
//! ```no_run
//! use stampede::{HandlerRegistry, Viewer, ViewerOptions};
//!
//! let mut viewer = Viewer::new(HandlerRegistry::new(), ViewerOptions::default());
//! let scene = viewer.add_scene("main");
//! # let definition = stampede::ModelDefinition::new("demo");
//! let model = viewer.add_model(definition)?;
//! let instance = viewer.create_instance(model)?;
//! viewer.set_scene(instance, Some(scene))?;
//!
//! viewer.update(1.0 / 60.0);
//! for batch in viewer.batches(scene) {
//!     // upload batch.bucket.as_bytes(), draw batch.bucket.occupied_count() instances
//! }
//! # Ok::<(), stampede::ViewerError>(())
//! ```

pub mod animation;
pub mod bucket;
pub mod definition;
pub mod errors;
pub mod instance;
pub mod model;
pub mod node;
pub mod registry;
pub mod scene;
pub mod skeleton;
pub mod transform;
pub mod view;
pub mod viewer;

pub use animation::{AnimatedValue, InterpolationMode, KeyframeTrack, Sequence};
pub use bucket::Bucket;
pub use definition::{ModelDefinition, NodeDefinition};
pub use errors::{Result, ViewerError};
pub use instance::Instance;
pub use model::{LoadState, Model};
pub use node::HierarchyNode;
pub use registry::{HandlerRegistry, ModelParser};
pub use scene::Scene;
pub use skeleton::Skeleton;
pub use transform::Transform;
pub use view::{ModelView, TextureOverrides};
pub use viewer::{
    Batch, BucketKey, InstanceKey, ModelKey, SceneKey, ViewKey, Viewer, ViewerOptions,
};
