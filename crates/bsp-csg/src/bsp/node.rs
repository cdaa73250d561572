//! Partition node implementation.

use nalgebra::Point3;

use crate::{PartitionPlane, PlaneSide, Side};

/// Index of a node inside a [`BspTree`](super::BspTree).
///
/// Nodes are never removed, so an index stays valid for the tree's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// The root node of any non-empty tree.
    pub const ROOT: NodeIndex = NodeIndex(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the node in the tree's node list.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A triangle stored on the node whose plane it lies on.
///
/// `source` is the caller's identifier for the inserted triangle (the
/// combiner uses the triangle's index in the mesh). The corners are the
/// original, unsplit triangle even when only a fragment reached this node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoplanarTriangle {
    pub source: usize,
    pub vertices: [Point3<f32>; 3],
}

/// A node in the BSP tree.
///
/// Each node partitions space with one plane and stores the triangles lying on
/// it. Once created, a node's plane never changes; only its coplanar list and
/// its (still empty) child slots grow.
#[derive(Debug, Clone)]
pub struct PartitionNode {
    /// The splitting plane for this node.
    plane: PartitionPlane,

    /// Node this one hangs from, `None` for the root.
    parent: Option<NodeIndex>,

    /// Triangles lying on the plane, in insertion order.
    coplanar: Vec<CoplanarTriangle>,

    /// Subtree in FRONT of the splitting plane.
    front: Option<NodeIndex>,

    /// Subtree BEHIND the splitting plane.
    back: Option<NodeIndex>,
}

impl PartitionNode {
    pub(crate) fn new(plane: PartitionPlane, parent: Option<NodeIndex>) -> Self {
        Self {
            plane,
            parent,
            coplanar: Vec::new(),
            front: None,
            back: None,
        }
    }

    /// Returns a reference to the splitting plane.
    #[inline]
    pub fn plane(&self) -> &PartitionPlane {
        &self.plane
    }

    /// Returns the parent node, `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Returns the triangles lying on this node's plane.
    #[inline]
    pub fn coplanar(&self) -> &[CoplanarTriangle] {
        &self.coplanar
    }

    /// Returns the front child.
    #[inline]
    pub fn front(&self) -> Option<NodeIndex> {
        self.front
    }

    /// Returns the back child.
    #[inline]
    pub fn back(&self) -> Option<NodeIndex> {
        self.back
    }

    /// Returns the child on the given side.
    #[inline]
    pub fn child(&self, side: Side) -> Option<NodeIndex> {
        match side {
            Side::Front => self.front,
            Side::Back => self.back,
        }
    }

    /// Checks if this node has any children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }

    /// Classifies a point against this node's plane.
    #[inline]
    pub fn classify_point(&self, point: Point3<f32>, epsilon: f32) -> PlaneSide {
        self.plane.classify_point(point, epsilon)
    }

    /// Fills an empty child slot. Occupied slots are never overwritten.
    pub(crate) fn attach(&mut self, side: Side, child: NodeIndex) -> bool {
        let slot = match side {
            Side::Front => &mut self.front,
            Side::Back => &mut self.back,
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(child);
        true
    }

    /// Appends a coplanar triangle unless one with the same source is already
    /// stored. Deduplication is by identifier, not geometry.
    pub(crate) fn add_coplanar(&mut self, triangle: CoplanarTriangle) -> bool {
        if self.coplanar.iter().any(|t| t.source == triangle.source) {
            return false;
        }
        self.coplanar.push(triangle);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn plane() -> PartitionPlane {
        PartitionPlane::new(Point3::origin(), Vector3::y()).unwrap()
    }

    fn triangle(source: usize) -> CoplanarTriangle {
        CoplanarTriangle {
            source,
            vertices: [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 0.0),
            ],
        }
    }

    #[test]
    fn new_node_is_empty_leaf() {
        let node = PartitionNode::new(plane(), None);
        assert!(node.is_leaf());
        assert!(node.coplanar().is_empty());
        assert_eq!(node.parent(), None);
    }

    #[test]
    fn attach_never_overwrites() {
        let mut node = PartitionNode::new(plane(), None);
        assert!(node.attach(Side::Front, NodeIndex::new(1)));
        assert!(!node.attach(Side::Front, NodeIndex::new(2)));
        assert_eq!(node.front(), Some(NodeIndex::new(1)));
        assert_eq!(node.child(Side::Back), None);
        assert!(!node.is_leaf());

        assert!(node.attach(Side::Back, NodeIndex::new(3)));
        assert_eq!(node.child(Side::Back), Some(NodeIndex::new(3)));
    }

    #[test]
    fn coplanar_deduplicates_by_source() {
        let mut node = PartitionNode::new(plane(), None);
        assert!(node.add_coplanar(triangle(4)));
        assert!(!node.add_coplanar(triangle(4)));
        assert!(node.add_coplanar(triangle(5)));
        assert_eq!(node.coplanar().len(), 2);
    }
}
