use crate::definition::ModelDefinition;
use crate::errors::{Result, ViewerError};
use crate::model::{LoadState, PendingOp};
use crate::skeleton::Skeleton;
use crate::transform::Transform;
use crate::view::TextureOverrides;
use crate::viewer::{BucketKey, InstanceKey, ModelKey, SceneKey, ViewKey, Viewer};

// ============================================================================
// Instances
// ============================================================================

/// One placed copy of a model: a world placement, an animation state, and
/// (while visible) a slot in one bucket.
pub struct Instance {
    pub(crate) model: ModelKey,
    pub(crate) view: Option<ViewKey>,
    pub(crate) scene: Option<SceneKey>,
    pub(crate) bucket: Option<(BucketKey, usize)>,

    /// World placement of the whole instance, applied above the root nodes.
    pub placement: Transform,

    pub(crate) skeleton: Option<Skeleton>,
    pub(crate) sequence: Option<usize>,
    pub(crate) time: f32,
    pub(crate) rendered: bool,
    pub(crate) overrides: TextureOverrides,
}

impl Instance {
    pub(crate) fn new(model: ModelKey, skeleton: Option<Skeleton>) -> Self {
        Self {
            model,
            view: None,
            scene: None,
            bucket: None,
            placement: Transform::new(),
            skeleton,
            sequence: None,
            time: 0.0,
            rendered: true,
            overrides: TextureOverrides::default(),
        }
    }

    #[must_use]
    pub fn model(&self) -> ModelKey {
        self.model
    }

    #[must_use]
    pub fn view(&self) -> Option<ViewKey> {
        self.view
    }

    #[must_use]
    pub fn scene(&self) -> Option<SceneKey> {
        self.scene
    }

    /// The bucket and slot this instance occupies while visible.
    #[must_use]
    pub fn bucket(&self) -> Option<(BucketKey, usize)> {
        self.bucket
    }

    #[must_use]
    pub fn sequence(&self) -> Option<usize> {
        self.sequence
    }

    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn rendered(&self) -> bool {
        self.rendered
    }

    #[must_use]
    pub fn overrides(&self) -> &TextureOverrides {
        &self.overrides
    }

    #[must_use]
    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.skeleton.as_ref()
    }

    pub fn skeleton_mut(&mut self) -> Option<&mut Skeleton> {
        self.skeleton.as_mut()
    }

    /// Advances sequence time, wrapping for looping sequences and clamping
    /// at the end otherwise. A no-op without an active sequence.
    pub(crate) fn advance_time(&mut self, definition: &ModelDefinition, dt: f32) {
        let Some(index) = self.sequence else {
            return;
        };
        let Some(sequence) = definition.sequences.get(index) else {
            return;
        };

        self.time += dt;
        if self.time > sequence.duration {
            if sequence.looping && sequence.duration > 0.0 {
                self.time %= sequence.duration;
            } else {
                self.time = sequence.duration;
            }
        }
    }
}

// ============================================================================
// Instance operations
// ============================================================================

impl Viewer {
    /// Attaches the instance to a render target, or detaches it with `None`.
    /// Visibility follows: a rendered instance gains a bucket slot on the
    /// new target and releases the one on the old.
    pub fn set_scene(&mut self, instance: InstanceKey, scene: Option<SceneKey>) -> Result<()> {
        if let Some(key) = scene
            && !self.scenes.contains_key(key)
        {
            return Err(ViewerError::StaleHandle("scene"));
        }
        self.dispatch(PendingOp::SetScene(instance, scene))
    }

    /// Selects the sequence the instance animates with, or `None` for the
    /// static pose. Sequence time restarts at zero.
    pub fn set_sequence(&mut self, instance: InstanceKey, sequence: Option<usize>) -> Result<()> {
        self.dispatch(PendingOp::SetSequence(instance, sequence))
    }

    /// Toggles whether the instance participates in rendering at all. A
    /// hidden instance keeps its scene and view but holds no bucket slot.
    pub fn set_rendered(&mut self, instance: InstanceKey, rendered: bool) -> Result<()> {
        self.dispatch(PendingOp::SetRendered(instance, rendered))
    }

    /// Replaces the texture in `slot` for this instance, moving it to the
    /// view whose overrides match the result.
    pub fn override_texture(
        &mut self,
        instance: InstanceKey,
        slot: u32,
        texture: u32,
    ) -> Result<()> {
        self.dispatch(PendingOp::OverrideTexture(instance, slot, texture))
    }

    /// Drops the override for `slot`, moving the instance back toward the
    /// view matching its remaining overrides.
    pub fn clear_texture_override(&mut self, instance: InstanceKey, slot: u32) -> Result<()> {
        self.dispatch(PendingOp::ClearTextureOverride(instance, slot))
    }

    /// Destroys an instance, releasing its bucket slot and view membership.
    /// Usable in every load state; queued operations against it are purged.
    pub fn remove_instance(&mut self, instance: InstanceKey) -> Result<()> {
        let model = self
            .instances
            .get(instance)
            .ok_or(ViewerError::StaleHandle("instance"))?
            .model;

        self.remove_from_view(instance)?;

        if let Some(entry) = self.models.get_mut(model) {
            entry.instances.retain(|&key| key != instance);
            entry.pending.retain(|op| op.instance() != instance);
        }
        self.instances.remove(instance);
        Ok(())
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Applies an operation now when the target's model is loaded, queues it
    /// when the model is pending, and rejects it when the load failed.
    fn dispatch(&mut self, op: PendingOp) -> Result<()> {
        let model = self
            .instances
            .get(op.instance())
            .ok_or(ViewerError::StaleHandle("instance"))?
            .model;
        let entry = self
            .models
            .get(model)
            .ok_or(ViewerError::StaleHandle("model"))?;

        match entry.load.clone() {
            LoadState::Pending => {
                if let Some(entry) = self.models.get_mut(model) {
                    entry.pending.push(op);
                }
                Ok(())
            }
            LoadState::Failed { reason } => Err(ViewerError::ModelLoadFailed {
                model: entry.name.clone(),
                reason,
            }),
            LoadState::Loaded => self.apply(op),
        }
    }

    pub(crate) fn apply(&mut self, op: PendingOp) -> Result<()> {
        match op {
            PendingOp::SetScene(instance, scene) => self.apply_set_scene(instance, scene),
            PendingOp::SetSequence(instance, sequence) => {
                self.apply_set_sequence(instance, sequence)
            }
            PendingOp::SetRendered(instance, rendered) => {
                self.apply_set_rendered(instance, rendered)
            }
            PendingOp::OverrideTexture(instance, slot, texture) => {
                self.apply_override(instance, slot, Some(texture))
            }
            PendingOp::ClearTextureOverride(instance, slot) => {
                self.apply_override(instance, slot, None)
            }
        }
    }

    fn apply_set_scene(&mut self, instance: InstanceKey, scene: Option<SceneKey>) -> Result<()> {
        {
            let inst = self
                .instances
                .get(instance)
                .ok_or(ViewerError::StaleHandle("instance"))?;
            if inst.scene == scene {
                return Ok(());
            }
            if let Some(key) = scene
                && !self.scenes.contains_key(key)
            {
                return Err(ViewerError::StaleHandle("scene"));
            }
        }

        if self
            .instances
            .get(instance)
            .is_some_and(|inst| inst.bucket.is_some())
        {
            self.set_visibility(instance, false)?;
        }

        let rendered = {
            let inst = self
                .instances
                .get_mut(instance)
                .ok_or(ViewerError::StaleHandle("instance"))?;
            inst.scene = scene;
            inst.rendered
        };

        if rendered && scene.is_some() {
            self.set_visibility(instance, true)?;
        }
        Ok(())
    }

    fn apply_set_sequence(
        &mut self,
        instance: InstanceKey,
        sequence: Option<usize>,
    ) -> Result<()> {
        let count = {
            let inst = self
                .instances
                .get(instance)
                .ok_or(ViewerError::StaleHandle("instance"))?;
            let entry = self
                .models
                .get(inst.model)
                .ok_or(ViewerError::StaleHandle("model"))?;
            entry
                .definition()
                .ok_or(ViewerError::ModelNotLoaded)?
                .sequences
                .len()
        };
        if let Some(index) = sequence
            && index >= count
        {
            return Err(ViewerError::UnknownSequence { index, count });
        }

        let inst = self
            .instances
            .get_mut(instance)
            .ok_or(ViewerError::StaleHandle("instance"))?;
        inst.sequence = sequence;
        inst.time = 0.0;
        Ok(())
    }

    fn apply_set_rendered(&mut self, instance: InstanceKey, rendered: bool) -> Result<()> {
        let (has_scene, bucketed) = {
            let inst = self
                .instances
                .get_mut(instance)
                .ok_or(ViewerError::StaleHandle("instance"))?;
            if inst.rendered == rendered {
                return Ok(());
            }
            inst.rendered = rendered;
            (inst.scene.is_some(), inst.bucket.is_some())
        };

        if rendered && has_scene && !bucketed {
            self.set_visibility(instance, true)?;
        } else if !rendered && bucketed {
            self.set_visibility(instance, false)?;
        }
        Ok(())
    }

    fn apply_override(
        &mut self,
        instance: InstanceKey,
        slot: u32,
        texture: Option<u32>,
    ) -> Result<()> {
        let desired = {
            let inst = self
                .instances
                .get_mut(instance)
                .ok_or(ViewerError::StaleHandle("instance"))?;
            match texture {
                Some(texture) => inst.overrides.set(slot, texture),
                None => inst.overrides.clear(slot),
            }
            inst.overrides.clone()
        };
        self.view_changed(instance, &desired)
    }
}
