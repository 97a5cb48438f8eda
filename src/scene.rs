use rustc_hash::FxHashMap;

use crate::viewer::BucketKey;

/// A render target: the external destination (viewport, scene) that draws
/// the buckets its visible instances reference.
///
/// Each distinct bucket is tracked once, in registration order, however many
/// instances reference it; a refcount drops it once the last referencing
/// instance in this target is gone.
#[derive(Debug, Default)]
pub struct Scene {
    pub name: String,

    /// Distinct registered buckets, in registration order
    buckets: Vec<BucketKey>,
    refs: FxHashMap<BucketKey, usize>,
}

impl Scene {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            buckets: Vec::new(),
            refs: FxHashMap::default(),
        }
    }

    /// Buckets this target needs uploaded and drawn, in registration order.
    #[must_use]
    pub fn buckets(&self) -> &[BucketKey] {
        &self.buckets
    }

    pub(crate) fn add_bucket(&mut self, bucket: BucketKey) {
        let count = self.refs.entry(bucket).or_insert(0);
        if *count == 0 {
            self.buckets.push(bucket);
        }
        *count += 1;
    }

    pub(crate) fn remove_bucket(&mut self, bucket: BucketKey) {
        let Some(count) = self.refs.get_mut(&bucket) else {
            return;
        };

        *count -= 1;
        if *count == 0 {
            self.refs.remove(&bucket);
            self.buckets.retain(|&b| b != bucket);
        }
    }
}
