use slotmap::{SlotMap, new_key_type};

use crate::bucket::Bucket;
use crate::definition::ModelDefinition;
use crate::errors::{Result, ViewerError};
use crate::instance::Instance;
use crate::model::Model;
use crate::registry::HandlerRegistry;
use crate::scene::Scene;
use crate::view::ModelView;

new_key_type! {
    pub struct ModelKey;
    pub struct ViewKey;
    pub struct BucketKey;
    pub struct InstanceKey;
    pub struct SceneKey;
}

/// Construction-time configuration.
#[derive(Debug, Clone)]
pub struct ViewerOptions {
    /// Slot count of every bucket, decided once per viewer. This is the
    /// per-batch instance limit of the render backend.
    pub max_instances_per_bucket: usize,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            max_instances_per_bucket: 256,
        }
    }
}

/// Central storage for models, views, buckets, instances and render targets.
///
/// # Frame stepping
///
/// Execution is single-threaded and frame-stepped: one [`Viewer::update`]
/// pass evaluates all live skeletons and writes bucket buffers, then the
/// render pass reads them read-only through [`Viewer::batches`]. Structural
/// mutation (creating or removing instances, reassigning scenes or views)
/// must happen between frames, never inside a pass; nothing here blocks or
/// suspends.
pub struct Viewer {
    pub(crate) models: SlotMap<ModelKey, Model>,
    pub(crate) views: SlotMap<ViewKey, ModelView>,
    pub(crate) buckets: SlotMap<BucketKey, Bucket>,
    pub(crate) instances: SlotMap<InstanceKey, Instance>,
    pub(crate) scenes: SlotMap<SceneKey, Scene>,

    registry: HandlerRegistry,
    pub(crate) options: ViewerOptions,
}

impl Viewer {
    /// Creates a viewer with the format handlers the host chose to enable.
    #[must_use]
    pub fn new(registry: HandlerRegistry, options: ViewerOptions) -> Self {
        Self {
            models: SlotMap::with_key(),
            views: SlotMap::with_key(),
            buckets: SlotMap::with_key(),
            instances: SlotMap::with_key(),
            scenes: SlotMap::with_key(),
            registry,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    // ========================================================================
    // Render targets
    // ========================================================================

    pub fn add_scene(&mut self, name: &str) -> SceneKey {
        self.scenes.insert(Scene::new(name))
    }

    #[must_use]
    pub fn scene(&self, key: SceneKey) -> Option<&Scene> {
        self.scenes.get(key)
    }

    // ========================================================================
    // Models
    // ========================================================================

    /// Registers an already-parsed, immediately usable model definition.
    pub fn add_model(&mut self, definition: ModelDefinition) -> Result<ModelKey> {
        definition.validate()?;
        let name = definition.name.clone();

        let key = self.models.insert(Model::loaded(definition));
        self.add_view(key)?;

        log::debug!("added model \"{name}\"");
        Ok(key)
    }

    /// Registers a model whose definition is still being fetched. Instances
    /// may be created against it; their operations are queued until
    /// [`Viewer::finish_load`] resolves.
    pub fn add_model_pending(&mut self, name: &str) -> ModelKey {
        let key = self.models.insert(Model::pending(name));
        // The default view exists up front so early instances have a home.
        let view = self.add_view(key);
        debug_assert!(view.is_ok());

        log::debug!("added pending model \"{name}\"");
        key
    }

    /// Parses `data` with the handler registered for `format` and registers
    /// the resulting model.
    pub fn load_model(&mut self, format: &str, data: &[u8]) -> Result<ModelKey> {
        let Some(parser) = self.registry.get(format) else {
            return Err(ViewerError::UnknownFormat(format.to_string()));
        };
        let definition = parser.parse(data)?;
        self.add_model(definition)
    }

    #[must_use]
    pub fn model(&self, key: ModelKey) -> Option<&Model> {
        self.models.get(key)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn view(&self, key: ViewKey) -> Option<&ModelView> {
        self.views.get(key)
    }

    #[must_use]
    pub fn bucket(&self, key: BucketKey) -> Option<&Bucket> {
        self.buckets.get(key)
    }

    #[must_use]
    pub fn instance(&self, key: InstanceKey) -> Option<&Instance> {
        self.instances.get(key)
    }

    /// Mutable instance access, for placement mutation between frames.
    pub fn instance_mut(&mut self, key: InstanceKey) -> Option<&mut Instance> {
        self.instances.get_mut(key)
    }

    // ========================================================================
    // Frame passes
    // ========================================================================

    /// The update pass: advances every live instance's sequence time and,
    /// for each visible instance, evaluates its skeleton into its bucket
    /// slot. Instances whose model is still loading, or which hold no slot,
    /// are skipped.
    pub fn update(&mut self, dt: f32) {
        let Viewer {
            models,
            instances,
            buckets,
            ..
        } = self;

        for (_key, instance) in instances.iter_mut() {
            let Some(model) = models.get(instance.model) else {
                continue;
            };
            let Some(definition) = model.definition() else {
                continue;
            };

            instance.advance_time(definition, dt);
            instance.placement.update_local_matrix();

            let Some((bucket_key, slot)) = instance.bucket else {
                continue;
            };

            let placement = *instance.placement.local_matrix();
            let sequence = instance.sequence;
            let time = instance.time;

            let Some(skeleton) = instance.skeleton.as_mut() else {
                continue;
            };
            let Some(bucket) = buckets.get_mut(bucket_key) else {
                continue;
            };

            skeleton.update(
                definition,
                sequence,
                time,
                &placement,
                bucket.slot_matrices_mut(slot),
            );
        }
    }

    /// The render pass input: every bucket the target references, in
    /// registration order, each ready for one buffer upload and one batched
    /// draw.
    pub fn batches(&self, scene: SceneKey) -> impl Iterator<Item = Batch<'_>> + '_ {
        self.scenes
            .get(scene)
            .map(Scene::buckets)
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&key| {
                let bucket = self.buckets.get(key)?;
                let view = self.views.get(bucket.view())?;
                Some(Batch {
                    model: view.model(),
                    view: bucket.view(),
                    bucket_key: key,
                    bucket,
                })
            })
    }
}

/// One upload-and-draw unit of the render pass.
pub struct Batch<'a> {
    pub model: ModelKey,
    pub view: ViewKey,
    pub bucket_key: BucketKey,
    pub bucket: &'a Bucket,
}
