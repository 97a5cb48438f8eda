use glam::{Affine3A, Mat4};

use crate::definition::ModelDefinition;
use crate::errors::{Result, ViewerError};
use crate::node::HierarchyNode;
use crate::transform::Transform;

/// The runtime hierarchy of one instance.
///
/// Owns a fixed-count node array (count from the model definition), the
/// per-node inverse bind matrices and the bone lookup. Mutated every frame by
/// [`Skeleton::update`]; destroyed with its owning instance.
///
/// The skeleton knows nothing of buckets: the write destination is a slice
/// supplied by the caller.
#[derive(Debug, Clone)]
pub struct Skeleton {
    nodes: Vec<HierarchyNode>,

    /// Logical skin-bone index -> node index
    bone_lookup: Vec<usize>,
    /// Inverse bind matrix per node
    inverse_bind: Vec<Mat4>,

    /// Parent-before-child node order for the world-matrix pass. Identity
    /// after construction (definitions are validated parent < child);
    /// recomputed after a successful re-parent.
    eval_order: Vec<usize>,
}

impl Skeleton {
    /// Builds the runtime hierarchy for one instance of a validated
    /// definition.
    #[must_use]
    pub fn from_definition(definition: &ModelDefinition) -> Self {
        let nodes = definition
            .nodes
            .iter()
            .map(|node| {
                HierarchyNode::new(
                    node.parent,
                    Transform::from_trs(
                        node.translation.default,
                        node.rotation.default,
                        node.scale.default,
                    ),
                )
            })
            .collect();

        Self {
            nodes,
            bone_lookup: definition.bone_lookup.clone(),
            inverse_bind: definition.nodes.iter().map(|n| n.inverse_bind).collect(),
            eval_order: (0..definition.nodes.len()).collect(),
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<&HierarchyNode> {
        self.nodes.get(index)
    }

    pub fn node_mut(&mut self, index: usize) -> Option<&mut HierarchyNode> {
        self.nodes.get_mut(index)
    }

    #[must_use]
    pub fn bone_lookup(&self) -> &[usize] {
        &self.bone_lookup
    }

    /// Re-parents `node` under `parent` (or detaches it when `None`).
    ///
    /// Rejects the operation when `parent` equals `node` or is a descendant
    /// of it, since either would create a cycle. On success the evaluation
    /// order is recomputed so the world-matrix pass stays parent-before-child.
    pub fn set_parent(&mut self, node: usize, parent: Option<usize>) -> Result<()> {
        let count = self.nodes.len();
        if node >= count {
            return Err(ViewerError::NodeOutOfRange {
                node,
                node_count: count,
            });
        }

        if let Some(parent) = parent {
            if parent >= count {
                return Err(ViewerError::NodeOutOfRange {
                    node: parent,
                    node_count: count,
                });
            }
            if parent == node || self.is_descendant(parent, node) {
                return Err(ViewerError::HierarchyCycle { node, parent });
            }
        }

        self.nodes[node].parent = parent;
        self.recompute_eval_order();
        Ok(())
    }

    /// Whether `candidate` sits in the subtree of `ancestor`.
    fn is_descendant(&self, candidate: usize, ancestor: usize) -> bool {
        let mut current = self.nodes[candidate].parent;
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = self.nodes[index].parent;
        }
        false
    }

    fn recompute_eval_order(&mut self) {
        let count = self.nodes.len();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut roots = Vec::new();

        for (index, node) in self.nodes.iter().enumerate() {
            match node.parent {
                Some(parent) => children[parent].push(index),
                None => roots.push(index),
            }
        }

        self.eval_order.clear();
        let mut stack: Vec<usize> = roots.into_iter().rev().collect();
        while let Some(index) = stack.pop() {
            self.eval_order.push(index);
            stack.extend(children[index].iter().rev());
        }
    }

    /// Evaluates the hierarchy for one frame and writes the final skin
    /// matrices into `dest` (the instance's bucket slot; one matrix per
    /// bone-lookup entry).
    ///
    /// 1. Each node's local transform is resolved: sampled from the active
    ///    sequence, or the authored default when `sequence` is `None`.
    /// 2. World matrices are composed top-down; root nodes compose with the
    ///    instance `placement`.
    /// 3. With no active sequence on a rigid-rest-pose model, every bone's
    ///    final matrix is the placement itself (an unanimated skeleton moves
    ///    rigidly with its instance). Otherwise the final matrix is
    ///    `node.world * node.inverse_bind`.
    pub fn update(
        &mut self,
        definition: &ModelDefinition,
        sequence: Option<usize>,
        time: f32,
        placement: &Affine3A,
        dest: &mut [Mat4],
    ) {
        for (node, node_def) in self.nodes.iter_mut().zip(&definition.nodes) {
            node.set_transformation(
                node_def.translation.sample(sequence, time),
                node_def.rotation.sample(sequence, time),
                node_def.scale.sample(sequence, time),
            );
        }

        for i in 0..self.eval_order.len() {
            let index = self.eval_order[i];
            let parent_world = match self.nodes[index].parent {
                Some(parent) => self.nodes[parent].world_matrix,
                None => *placement,
            };

            let node = &mut self.nodes[index];
            node.transform.update_local_matrix();
            node.set_world_matrix(parent_world * node.transform.local_matrix);
        }

        if sequence.is_none() && definition.rigid_static_pose {
            let rigid = Mat4::from(*placement);
            for out in dest.iter_mut().take(self.bone_lookup.len()) {
                *out = rigid;
            }
        } else {
            for (out, &node_index) in dest.iter_mut().zip(&self.bone_lookup) {
                *out = Mat4::from(self.nodes[node_index].world_matrix)
                    * self.inverse_bind[node_index];
            }
        }
    }
}
