use glam::Affine3A;

use crate::transform::Transform;

/// A single node in a rigid transform tree (bone, helper, attachment).
///
/// # Design
///
/// - Only keeps data the evaluation pass touches every frame: the parent
///   link, the local [`Transform`] and the derived world matrix
/// - The parent is an index into the owning [`Skeleton`](crate::Skeleton)'s
///   node array; nodes never outlive their skeleton
/// - The world matrix is only valid after the skeleton's evaluation pass of
///   the current frame
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    /// Parent node index within the owning skeleton (None for root nodes)
    pub(crate) parent: Option<usize>,
    /// Local transform (hot data, written every animated frame)
    pub transform: Transform,
    /// Derived world matrix, written by the evaluation pass
    pub(crate) world_matrix: Affine3A,
}

impl HierarchyNode {
    #[must_use]
    pub fn new(parent: Option<usize>, transform: Transform) -> Self {
        Self {
            parent,
            transform,
            world_matrix: Affine3A::IDENTITY,
        }
    }

    /// Returns the parent node index, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Overwrites the local transform. The world matrix is not recomputed
    /// here; it is derived during the skeleton evaluation pass.
    #[inline]
    pub fn set_transformation(
        &mut self,
        translation: glam::Vec3,
        rotation: glam::Quat,
        scale: glam::Vec3,
    ) {
        self.transform.translation = translation;
        self.transform.rotation = rotation;
        self.transform.scale = scale;
    }

    /// The world matrix derived by the most recent evaluation pass.
    ///
    /// A root node's world matrix is the owning instance's placement composed
    /// with the local matrix; a child's is `parent.world * local`.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    #[inline]
    pub(crate) fn set_world_matrix(&mut self, world: Affine3A) {
        self.world_matrix = world;
    }
}
