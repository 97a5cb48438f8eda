use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::bucket::Bucket;
use crate::errors::{Result, ViewerError};
use crate::viewer::{BucketKey, InstanceKey, ModelKey, SceneKey, ViewKey, Viewer};

// ============================================================================
// Texture overrides
// ============================================================================

/// A set of per-slot texture replacements. Two instances share a view, and
/// therefore draw batches, exactly when their override sets compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureOverrides {
    map: BTreeMap<u32, u32>,
}

impl TextureOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, slot: u32, texture: u32) {
        self.map.insert(slot, texture);
    }

    /// Removes the override for `slot`, restoring the model's own texture.
    pub fn clear(&mut self, slot: u32) {
        self.map.remove(&slot);
    }

    #[must_use]
    pub fn get(&self, slot: u32) -> Option<u32> {
        self.map.get(&slot).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.map.iter().map(|(&slot, &texture)| (slot, texture))
    }
}

// ============================================================================
// Model views
// ============================================================================

/// One render configuration of a model. Every instance belongs to exactly
/// one view; instances whose overrides match are routed to the same view so
/// they can share buckets.
pub struct ModelView {
    pub(crate) model: ModelKey,
    pub(crate) overrides: TextureOverrides,
    pub(crate) instances: Vec<InstanceKey>,
    pub(crate) buckets: Vec<BucketKey>,
    /// Per render target, the buckets of this view in creation order.
    pub(crate) scene_buckets: FxHashMap<SceneKey, Vec<BucketKey>>,
}

impl ModelView {
    pub(crate) fn new(model: ModelKey, overrides: TextureOverrides) -> Self {
        Self {
            model,
            overrides,
            instances: Vec::new(),
            buckets: Vec::new(),
            scene_buckets: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn model(&self) -> ModelKey {
        self.model
    }

    #[must_use]
    pub fn overrides(&self) -> &TextureOverrides {
        &self.overrides
    }

    #[must_use]
    pub fn instances(&self) -> &[InstanceKey] {
        &self.instances
    }

    #[must_use]
    pub fn buckets(&self) -> &[BucketKey] {
        &self.buckets
    }
}

// ============================================================================
// View membership and visibility
// ============================================================================

impl Viewer {
    /// Moves an instance into `view`, leaving its previous view first. A
    /// visible instance is re-bucketed under the new view.
    pub(crate) fn add_to_view(&mut self, view: ViewKey, instance: InstanceKey) -> Result<()> {
        let current = self
            .instances
            .get(instance)
            .ok_or(ViewerError::StaleHandle("instance"))?
            .view;
        if current == Some(view) {
            return Ok(());
        }
        if current.is_some() {
            self.remove_from_view(instance)?;
        }

        let model = {
            let target = self
                .views
                .get_mut(view)
                .ok_or(ViewerError::StaleHandle("view"))?;
            target.instances.push(instance);
            target.model
        };

        let (rendered, has_scene) = {
            let inst = self
                .instances
                .get_mut(instance)
                .ok_or(ViewerError::StaleHandle("instance"))?;
            inst.view = Some(view);
            (inst.rendered, inst.scene.is_some())
        };

        let loaded = self.models.get(model).is_some_and(crate::model::Model::is_loaded);
        if rendered && has_scene && loaded {
            self.set_visibility(instance, true)?;
        }
        Ok(())
    }

    /// Detaches an instance from its view, hiding it first if it holds a
    /// bucket slot. A view left with no instances is destroyed.
    pub(crate) fn remove_from_view(&mut self, instance: InstanceKey) -> Result<()> {
        let inst = self
            .instances
            .get(instance)
            .ok_or(ViewerError::StaleHandle("instance"))?;
        let Some(view) = inst.view else {
            return Ok(());
        };

        if inst.bucket.is_some() {
            self.set_visibility(instance, false)?;
        }
        if let Some(inst) = self.instances.get_mut(instance) {
            inst.view = None;
        }

        let now_empty = {
            let Some(target) = self.views.get_mut(view) else {
                return Ok(());
            };
            target.instances.retain(|&key| key != instance);
            target.instances.is_empty()
        };
        if now_empty {
            self.remove_view(view);
        }
        Ok(())
    }

    /// Grants or revokes an instance's bucket slot. Showing requires a
    /// render target; hiding releases the slot back to its bucket.
    pub(crate) fn set_visibility(&mut self, instance: InstanceKey, visible: bool) -> Result<()> {
        if visible {
            let (view, scene) = {
                let inst = self
                    .instances
                    .get(instance)
                    .ok_or(ViewerError::StaleHandle("instance"))?;
                if inst.bucket.is_some() {
                    return Err(ViewerError::AlreadyVisible);
                }
                let scene = inst.scene.ok_or(ViewerError::NoRenderTarget)?;
                let view = inst.view.ok_or(ViewerError::StaleHandle("view"))?;
                (view, scene)
            };

            let bucket_key = self.available_bucket(view, scene)?;
            let slot = self
                .buckets
                .get_mut(bucket_key)
                .ok_or(ViewerError::StaleHandle("bucket"))?
                .add_instance(instance)?;

            if let Some(inst) = self.instances.get_mut(instance) {
                inst.bucket = Some((bucket_key, slot));
            }
            self.scenes
                .get_mut(scene)
                .ok_or(ViewerError::StaleHandle("scene"))?
                .add_bucket(bucket_key);
        } else {
            let (bucket_key, scene) = {
                let inst = self
                    .instances
                    .get_mut(instance)
                    .ok_or(ViewerError::StaleHandle("instance"))?;
                let (bucket_key, _slot) = inst.bucket.take().ok_or(ViewerError::NotVisible)?;
                (bucket_key, inst.scene)
            };

            self.buckets
                .get_mut(bucket_key)
                .ok_or(ViewerError::StaleHandle("bucket"))?
                .remove_instance(instance)?;

            if let Some(scene) = scene
                && let Some(target) = self.scenes.get_mut(scene)
            {
                target.remove_bucket(bucket_key);
            }
        }
        Ok(())
    }

    /// Finds the first non-full bucket of `view` on `scene`, in creation
    /// order, creating one when all are full.
    pub(crate) fn available_bucket(&mut self, view: ViewKey, scene: SceneKey) -> Result<BucketKey> {
        let model = self
            .views
            .get(view)
            .ok_or(ViewerError::StaleHandle("view"))?
            .model;
        let matrices = self
            .models
            .get(model)
            .ok_or(ViewerError::StaleHandle("model"))?
            .definition()
            .ok_or(ViewerError::ModelNotLoaded)?
            .matrices_per_instance();

        if let Some(list) = self.views.get(view).and_then(|v| v.scene_buckets.get(&scene)) {
            for &key in list {
                if self.buckets.get(key).is_some_and(|bucket| !bucket.is_full()) {
                    return Ok(key);
                }
            }
        }

        let capacity = self.options.max_instances_per_bucket;
        let key = self.buckets.insert(Bucket::new(view, capacity, matrices));

        let target = self
            .views
            .get_mut(view)
            .ok_or(ViewerError::StaleHandle("view"))?;
        target.buckets.push(key);
        target.scene_buckets.entry(scene).or_default().push(key);

        log::debug!(
            "new bucket for model {model:?}: {capacity} slots, {matrices} matrices per instance"
        );
        Ok(key)
    }
}
