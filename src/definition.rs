//! Parsed model definitions.
//!
//! Format decoders are external; they hand the viewer an already-parsed
//! [`ModelDefinition`]. [`ModelDefinition::validate`] runs at that boundary,
//! so the evaluation core may assume a structurally valid hierarchy.

use glam::{Mat4, Quat, Vec3};

use crate::animation::{AnimatedValue, Sequence};
use crate::errors::{Result, ViewerError};

/// One node of a model's rigid hierarchy, as produced by a format decoder.
#[derive(Debug, Clone)]
pub struct NodeDefinition {
    pub name: String,
    /// Parent node index; must be strictly less than this node's own index
    pub parent: Option<usize>,

    // Animated transform channels with authored defaults
    pub translation: AnimatedValue<Vec3>,
    pub rotation: AnimatedValue<Quat>,
    pub scale: AnimatedValue<Vec3>,

    /// Precomputed inverse bind (reference) pose matrix
    pub inverse_bind: Mat4,
}

impl NodeDefinition {
    /// A node with identity defaults and no animation.
    #[must_use]
    pub fn new(name: &str, parent: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            translation: AnimatedValue::constant(Vec3::ZERO),
            rotation: AnimatedValue::constant(Quat::IDENTITY),
            scale: AnimatedValue::constant(Vec3::ONE),
            inverse_bind: Mat4::IDENTITY,
        }
    }
}

/// A fully parsed model definition: the shared data every instance of the
/// model evaluates against.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    pub name: String,
    /// Ordered node list; parents precede children
    pub nodes: Vec<NodeDefinition>,
    /// Logical skin-bone index -> node index (subset/reordering of nodes)
    pub bone_lookup: Vec<usize>,
    pub sequences: Vec<Sequence>,
    /// Whether the rest pose is rigid, allowing the static-pose shortcut
    /// (every bone matrix == the instance placement when no sequence plays).
    /// Set by the decoder that knows its format.
    pub rigid_static_pose: bool,
}

impl ModelDefinition {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: Vec::new(),
            bone_lookup: Vec::new(),
            sequences: Vec::new(),
            rigid_static_pose: true,
        }
    }

    /// Matrices each instance writes per frame (one per render bone).
    #[inline]
    #[must_use]
    pub fn matrices_per_instance(&self) -> usize {
        self.bone_lookup.len()
    }

    /// Parse-boundary validation. The core never re-checks these invariants.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() || self.bone_lookup.is_empty() {
            return Err(ViewerError::EmptyDefinition {
                name: self.name.clone(),
            });
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent
                && parent >= index
            {
                return Err(ViewerError::InvalidParent {
                    node: index,
                    parent,
                });
            }

            let track_count = node
                .translation
                .track_count()
                .max(node.rotation.track_count())
                .max(node.scale.track_count());
            if track_count > self.sequences.len() {
                return Err(ViewerError::TrackTableOverflow {
                    node: index,
                    track_count,
                    sequence_count: self.sequences.len(),
                });
            }
        }

        for &bone in &self.bone_lookup {
            if bone >= self.nodes.len() {
                return Err(ViewerError::BoneOutOfRange {
                    bone,
                    node_count: self.nodes.len(),
                });
            }
        }

        Ok(())
    }
}
