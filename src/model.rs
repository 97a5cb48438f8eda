use std::sync::Arc;

use crate::definition::ModelDefinition;
use crate::errors::{Result, ViewerError};
use crate::instance::Instance;
use crate::skeleton::Skeleton;
use crate::view::TextureOverrides;
use crate::viewer::{InstanceKey, ModelKey, SceneKey, ViewKey, Viewer};

// ============================================================================
// Load state
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Definition not yet available. Operations against instances of this
    /// model are queued, not applied.
    Pending,
    Loaded,
    Failed { reason: String },
}

/// An operation deferred while the target's model was still loading,
/// replayed in submission order once the definition arrives.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingOp {
    SetScene(InstanceKey, Option<SceneKey>),
    SetSequence(InstanceKey, Option<usize>),
    SetRendered(InstanceKey, bool),
    OverrideTexture(InstanceKey, u32, u32),
    ClearTextureOverride(InstanceKey, u32),
}

impl PendingOp {
    pub(crate) fn instance(&self) -> InstanceKey {
        match *self {
            PendingOp::SetScene(key, _)
            | PendingOp::SetSequence(key, _)
            | PendingOp::SetRendered(key, _)
            | PendingOp::OverrideTexture(key, _, _)
            | PendingOp::ClearTextureOverride(key, _) => key,
        }
    }
}

// ============================================================================
// Models
// ============================================================================

/// A registered model: its definition (once loaded), its views, and the
/// instances created from it.
pub struct Model {
    pub name: String,
    pub(crate) definition: Option<Arc<ModelDefinition>>,
    pub(crate) load: LoadState,
    pub(crate) views: Vec<ViewKey>,
    pub(crate) instances: Vec<InstanceKey>,
    pub(crate) pending: Vec<PendingOp>,
}

impl Model {
    pub(crate) fn loaded(definition: ModelDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            definition: Some(Arc::new(definition)),
            load: LoadState::Loaded,
            views: Vec::new(),
            instances: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub(crate) fn pending(name: &str) -> Self {
        Self {
            name: name.to_string(),
            definition: None,
            load: LoadState::Pending,
            views: Vec::new(),
            instances: Vec::new(),
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn definition(&self) -> Option<&Arc<ModelDefinition>> {
        self.definition.as_ref()
    }

    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.load == LoadState::Loaded
    }

    #[must_use]
    pub fn views(&self) -> &[ViewKey] {
        &self.views
    }

    #[must_use]
    pub fn instances(&self) -> &[InstanceKey] {
        &self.instances
    }
}

// ============================================================================
// Model operations
// ============================================================================

impl Viewer {
    /// Adds a view with no texture overrides. The first view of a model is
    /// its default view.
    pub fn add_view(&mut self, model: ModelKey) -> Result<ViewKey> {
        self.add_view_with(model, TextureOverrides::default())
    }

    pub(crate) fn add_view_with(
        &mut self,
        model: ModelKey,
        overrides: TextureOverrides,
    ) -> Result<ViewKey> {
        if !self.models.contains_key(model) {
            return Err(ViewerError::StaleHandle("model"));
        }
        let key = self.views.insert(crate::view::ModelView::new(model, overrides));
        if let Some(entry) = self.models.get_mut(model) {
            entry.views.push(key);
        }
        Ok(key)
    }

    /// Destroys a view and its buckets. Callers hide and detach the view's
    /// instances first, so the buckets being dropped are empty.
    pub(crate) fn remove_view(&mut self, view: ViewKey) {
        let Some(entry) = self.views.remove(view) else {
            return;
        };
        for bucket in &entry.buckets {
            debug_assert!(self.buckets.get(*bucket).is_none_or(crate::bucket::Bucket::is_empty));
            self.buckets.remove(*bucket);
        }
        if let Some(model) = self.models.get_mut(entry.model) {
            model.views.retain(|&key| key != view);
        }
        log::debug!("removed empty view of model {:?}", entry.model);
    }

    /// Routes an instance to the view matching `desired`, creating one when
    /// no existing view of its model has the same overrides.
    pub(crate) fn view_changed(
        &mut self,
        instance: InstanceKey,
        desired: &TextureOverrides,
    ) -> Result<()> {
        let model = self
            .instances
            .get(instance)
            .ok_or(ViewerError::StaleHandle("instance"))?
            .model;

        let existing = self
            .models
            .get(model)
            .ok_or(ViewerError::StaleHandle("model"))?
            .views
            .iter()
            .copied()
            .find(|&key| {
                self.views
                    .get(key)
                    .is_some_and(|view| view.overrides == *desired)
            });

        let target = match existing {
            Some(view) => view,
            None => self.add_view_with(model, desired.clone())?,
        };
        self.add_to_view(target, instance)
    }

    /// Creates an instance of `model` and places it in the model's default
    /// view. Works before the model has loaded; the skeleton is built when
    /// the definition arrives.
    pub fn create_instance(&mut self, model: ModelKey) -> Result<InstanceKey> {
        let (skeleton, default_view) = {
            let entry = self
                .models
                .get(model)
                .ok_or(ViewerError::StaleHandle("model"))?;
            let skeleton = entry.definition().map(|def| Skeleton::from_definition(def));
            (skeleton, entry.views.first().copied())
        };

        let key = self.instances.insert(Instance::new(model, skeleton));
        if let Some(entry) = self.models.get_mut(model) {
            entry.instances.push(key);
        }

        // The default view may have been destroyed when its last instance
        // left; re-establish it.
        let view = match default_view {
            Some(view) if self.views.contains_key(view) => view,
            _ => self.add_view(model)?,
        };
        self.add_to_view(view, key)?;
        Ok(key)
    }

    /// Resolves a pending model load. On success the definition is
    /// validated, skeletons are built for existing instances, and queued
    /// operations are replayed in order; replay failures are logged and
    /// dropped. On failure the queue is discarded and the error is returned.
    pub fn finish_load(
        &mut self,
        model: ModelKey,
        result: std::result::Result<ModelDefinition, String>,
    ) -> Result<()> {
        let entry = self
            .models
            .get(model)
            .ok_or(ViewerError::StaleHandle("model"))?;
        let name = entry.name.clone();
        if entry.load != LoadState::Pending {
            log::warn!("model \"{name}\" load resolved twice, ignoring");
            return Ok(());
        }

        let definition = match result {
            Ok(definition) => definition,
            Err(reason) => return self.fail_load(model, &name, reason),
        };
        if let Err(err) = definition.validate() {
            return self.fail_load(model, &name, err.to_string());
        }

        let definition = Arc::new(definition);
        let instance_keys = {
            let entry = self
                .models
                .get_mut(model)
                .ok_or(ViewerError::StaleHandle("model"))?;
            entry.definition = Some(definition.clone());
            entry.load = LoadState::Loaded;
            entry.instances.clone()
        };

        for &key in &instance_keys {
            if let Some(instance) = self.instances.get_mut(key) {
                instance.skeleton = Some(Skeleton::from_definition(&definition));
            }
        }

        log::info!(
            "model \"{name}\" loaded: {} nodes, {} bones, {} sequences",
            definition.nodes.len(),
            definition.bone_lookup.len(),
            definition.sequences.len()
        );

        let ops = {
            let entry = self
                .models
                .get_mut(model)
                .ok_or(ViewerError::StaleHandle("model"))?;
            std::mem::take(&mut entry.pending)
        };
        for op in ops {
            if let Err(err) = self.apply(op) {
                log::warn!("deferred operation on model \"{name}\" dropped: {err}");
            }
        }
        Ok(())
    }

    fn fail_load(&mut self, model: ModelKey, name: &str, reason: String) -> Result<()> {
        let entry = self
            .models
            .get_mut(model)
            .ok_or(ViewerError::StaleHandle("model"))?;
        let dropped = entry.pending.len();
        entry.pending.clear();
        entry.load = LoadState::Failed {
            reason: reason.clone(),
        };
        if dropped > 0 {
            log::warn!("model \"{name}\" failed to load, dropping {dropped} deferred operations");
        }
        Err(ViewerError::ModelLoadFailed {
            model: name.to_string(),
            reason,
        })
    }
}
