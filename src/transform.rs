use glam::{Affine3A, Mat4, Quat, Vec3};

/// A local translation/rotation/scale with a cached local matrix.
///
/// Writing the public fields does not recompute the matrix; the evaluation
/// pass calls [`Transform::update_local_matrix`], which rebuilds the cache
/// only when a field actually changed (shadow-state check). This is shared by
/// hierarchy nodes and by instance placements.
#[derive(Debug, Clone)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    // Matrix cache, rebuilt lazily by update_local_matrix.
    pub(crate) local_matrix: Affine3A,

    // Shadow state for change detection.
    last_translation: Vec3,
    last_rotation: Quat,
    last_scale: Vec3,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,

            local_matrix: Affine3A::IDENTITY,

            last_translation: Vec3::ZERO,
            last_rotation: Quat::IDENTITY,
            last_scale: Vec3::ONE,
            force_update: true,
        }
    }

    #[must_use]
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        let mut transform = Self::new();
        transform.translation = translation;
        transform.rotation = rotation;
        transform.scale = scale;
        transform
    }

    /// Checks the shadow state and rebuilds the local matrix when needed.
    /// Returns whether anything changed.
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.translation != self.last_translation
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale
            || self.force_update;

        if changed {
            self.local_matrix = Affine3A::from_scale_rotation_translation(
                self.scale,
                self.rotation,
                self.translation,
            );

            self.last_translation = self.translation;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }

        changed
    }

    /// The cached local matrix. Valid after [`Transform::update_local_matrix`].
    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    /// The cached local matrix as a `Mat4`, for upload paths.
    #[inline]
    #[must_use]
    pub fn local_matrix_as_mat4(&self) -> Mat4 {
        Mat4::from(self.local_matrix)
    }

    /// Moves by `delta` in the parent frame.
    #[inline]
    pub fn translate(&mut self, delta: Vec3) {
        self.translation += delta;
    }

    /// Applies `rotation` on top of the current rotation.
    #[inline]
    pub fn rotate(&mut self, rotation: Quat) {
        self.rotation = rotation * self.rotation;
    }

    /// Replaces the scale on all three axes.
    #[inline]
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Forces the next [`Transform::update_local_matrix`] to rebuild.
    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_local_matrix_reports_changes() {
        let mut transform = Transform::new();
        assert!(transform.update_local_matrix(), "first update must rebuild");
        assert!(!transform.update_local_matrix(), "unchanged state is clean");

        transform.translation = Vec3::new(1.0, 2.0, 3.0);
        assert!(transform.update_local_matrix());
        assert_eq!(
            transform.local_matrix().translation,
            Vec3::new(1.0, 2.0, 3.0).into()
        );
    }

    #[test]
    fn mark_dirty_forces_rebuild() {
        let mut transform = Transform::new();
        transform.update_local_matrix();
        transform.mark_dirty();
        assert!(transform.update_local_matrix());
    }
}
