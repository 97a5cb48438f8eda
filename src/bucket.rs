use std::collections::BTreeSet;

use glam::Mat4;

use crate::errors::{Result, ViewerError};
use crate::viewer::{InstanceKey, ViewKey};

/// A fixed-capacity batch of instances sharing one packed matrix buffer.
///
/// The buffer holds `capacity * matrices_per_instance` matrices; an
/// instance's slot is a stable sub-range of it, lent to the instance's
/// skeleton as its per-frame write destination. Slots are reused, never
/// compacted: removing an instance does not shift anyone else's offset.
///
/// A bucket with zero occupants is disposed of by its owning view; it never
/// destroys itself.
#[derive(Debug)]
pub struct Bucket {
    view: ViewKey,

    capacity: usize,
    matrices_per_instance: usize,

    /// Packed per-instance skin matrices, `capacity` slots wide regardless
    /// of occupancy
    buffer: Vec<Mat4>,

    /// Slot index -> occupying instance
    slots: Vec<Option<InstanceKey>>,
    /// Free slot indices; the smallest is assigned first
    free: BTreeSet<usize>,
}

impl Bucket {
    #[must_use]
    pub fn new(view: ViewKey, capacity: usize, matrices_per_instance: usize) -> Self {
        Self {
            view,
            capacity,
            matrices_per_instance,
            buffer: vec![Mat4::IDENTITY; capacity * matrices_per_instance],
            slots: vec![None; capacity],
            free: (0..capacity).collect(),
        }
    }

    /// The view that created and owns this bucket.
    #[inline]
    #[must_use]
    pub fn view(&self) -> ViewKey {
        self.view
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Matrices each slot holds (one per render bone).
    #[inline]
    #[must_use]
    pub fn matrices_per_instance(&self) -> usize {
        self.matrices_per_instance
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.free.len() == self.capacity
    }

    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.capacity - self.free.len()
    }

    /// Occupied slots in slot order, with their instances.
    pub fn occupied_slots(&self) -> impl Iterator<Item = (usize, InstanceKey)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, key)| key.map(|key| (slot, key)))
    }

    /// Assigns the lowest-numbered free slot to `instance`.
    ///
    /// Fails when the bucket is full (the caller allocates a new bucket) or
    /// when the instance already holds a slot here (a structural violation).
    pub fn add_instance(&mut self, instance: InstanceKey) -> Result<usize> {
        if self.slots.contains(&Some(instance)) {
            return Err(ViewerError::DuplicateSlot);
        }

        let Some(&slot) = self.free.iter().next() else {
            return Err(ViewerError::BucketFull);
        };

        self.free.remove(&slot);
        self.slots[slot] = Some(instance);
        Ok(slot)
    }

    /// Frees the slot held by `instance`. Other members keep their offsets;
    /// the slot's matrix data is left as-is until reassigned and rewritten.
    pub fn remove_instance(&mut self, instance: InstanceKey) -> Result<usize> {
        let Some(slot) = self
            .slots
            .iter()
            .position(|occupant| *occupant == Some(instance))
        else {
            return Err(ViewerError::NotInBucket);
        };

        self.slots[slot] = None;
        self.free.insert(slot);
        Ok(slot)
    }

    /// The matrix sub-view of one slot, handed to the occupying instance's
    /// skeleton as its write destination.
    pub fn slot_matrices_mut(&mut self, slot: usize) -> &mut [Mat4] {
        let start = slot * self.matrices_per_instance;
        &mut self.buffer[start..start + self.matrices_per_instance]
    }

    /// The whole packed buffer.
    #[must_use]
    pub fn matrices(&self) -> &[Mat4] {
        &self.buffer
    }

    /// The whole packed buffer as bytes, ready for a single upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys(n: usize) -> Vec<InstanceKey> {
        let mut map: SlotMap<InstanceKey, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn lowest_free_slot_is_assigned_first() {
        let view = ViewKey::default();
        let mut bucket = Bucket::new(view, 4, 2);
        let k = keys(3);

        assert_eq!(bucket.add_instance(k[0]).unwrap(), 0);
        assert_eq!(bucket.add_instance(k[1]).unwrap(), 1);

        bucket.remove_instance(k[0]).unwrap();
        assert_eq!(
            bucket.add_instance(k[2]).unwrap(),
            0,
            "freed slot 0 should be reused before slot 2"
        );
    }

    #[test]
    fn double_add_is_rejected() {
        let mut bucket = Bucket::new(ViewKey::default(), 2, 1);
        let k = keys(1);
        bucket.add_instance(k[0]).unwrap();
        assert_eq!(bucket.add_instance(k[0]), Err(ViewerError::DuplicateSlot));
    }

    #[test]
    fn removing_non_member_is_rejected() {
        let mut bucket = Bucket::new(ViewKey::default(), 2, 1);
        let k = keys(1);
        assert_eq!(bucket.remove_instance(k[0]), Err(ViewerError::NotInBucket));
    }

    #[test]
    fn removal_keeps_other_offsets() {
        let mut bucket = Bucket::new(ViewKey::default(), 3, 4);
        let k = keys(3);
        for key in &k {
            bucket.add_instance(*key).unwrap();
        }

        bucket.remove_instance(k[1]).unwrap();
        let occupied: Vec<_> = bucket.occupied_slots().collect();
        assert_eq!(occupied, vec![(0, k[0]), (2, k[2])]);
    }

    #[test]
    fn byte_view_covers_all_slots() {
        let bucket = Bucket::new(ViewKey::default(), 4, 3);
        assert_eq!(bucket.as_bytes().len(), 4 * 3 * 64);
    }
}
