//! BSP tree container and triangle insertion.

use nalgebra::Point3;
use tracing::trace;

use crate::triangle::corners_coincide;
use crate::{Classification, PartitionPlane, PlaneSide, Side};

use super::node::{CoplanarTriangle, NodeIndex, PartitionNode};
use super::split::split_triangle;
use super::visitor::BspVisitor;

/// An append-only Binary Space Partitioning tree over triangles.
///
/// Nodes live in one `Vec` and refer to their children by [`NodeIndex`].
/// Node 0 is the root; a child is always created after its parent, so its
/// index is strictly larger. Nodes are never removed and their planes never
/// change.
///
/// # Construction
///
/// Triangles are merged one at a time with [`BspTree::insert_triangle`].
/// The first triangle's plane becomes the root; each later triangle is split
/// against the planes it crosses and opens new nodes where it reaches an
/// empty child slot.
///
/// The resulting shape depends on insertion order: the same triangle set
/// inserted in another order can yield a different (set-equivalent) tree,
/// and therefore different split points near epsilon boundaries.
///
/// ```ignore
/// use bsp_csg::{BspTree, CSG_EPSILON};
///
/// let mut tree = BspTree::new();
/// for (id, [a, b, c]) in triangles.iter().enumerate() {
///     tree.insert_triangle(id, [*a, *b, *c], CSG_EPSILON);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BspTree {
    nodes: Vec<PartitionNode>,
}

/// A fragment that reached an empty child slot during one insertion.
#[derive(Debug, Clone, Copy)]
struct PendingNode {
    parent: NodeIndex,
    side: Side,
    anchor: Point3<f32>,
}

/// Where a point ended up after walking down from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointLocation {
    /// The node the walk ended at.
    pub node: NodeIndex,
    /// `Front` or `Back` of the bounded volume, or `OnPlane` when the point
    /// lies on its surface (the plane of `node`).
    pub side: PlaneSide,
}

impl BspTree {
    /// Creates an empty BSP tree.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Returns `true` if the tree has no node.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of partition nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the root node index, if any.
    #[inline]
    pub fn root(&self) -> Option<NodeIndex> {
        (!self.nodes.is_empty()).then_some(NodeIndex::ROOT)
    }

    /// Returns a node by index.
    #[inline]
    pub fn node(&self, index: NodeIndex) -> Option<&PartitionNode> {
        self.nodes.get(index.index())
    }

    /// All nodes, in creation order.
    #[inline]
    pub fn nodes(&self) -> &[PartitionNode] {
        &self.nodes
    }

    /// Total number of coplanar triangle entries over all nodes.
    ///
    /// A triangle split across several empty slots is stored once per new
    /// node, so this can exceed the number of inserted triangles.
    pub fn triangle_count(&self) -> usize {
        self.nodes.iter().map(|n| n.coplanar().len()).sum()
    }

    /// Returns the maximum depth of the tree (0 for empty tree).
    pub fn depth(&self) -> usize {
        // Parents precede children, so one forward pass suffices.
        let mut depths = vec![0usize; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            depths[i] = node.parent().map_or(1, |p| depths[p.index()] + 1);
        }
        depths.into_iter().max().unwrap_or(0)
    }

    /// Merges one triangle into the tree.
    ///
    /// The triangle is pushed down from the root. At each node:
    /// - corners on both sides: it is split, and every piece continues into
    ///   the child on its side;
    /// - corners on one side only: it continues into that child;
    /// - all corners on the plane: `(source, triangle)` joins the node's
    ///   coplanar list (once per `source`).
    ///
    /// Pieces reaching an empty child slot are collected and only turned into
    /// new nodes once the walk is over. A new node's plane is the inserted
    /// triangle's plane anchored at the piece's leading corner, and it stores
    /// the whole original triangle.
    ///
    /// Pieces with two corners closer than `epsilon` are dropped, which keeps
    /// a cut landing on an existing corner from splitting forever.
    ///
    /// Returns `false` if the triangle is degenerate and was ignored.
    pub fn insert_triangle(
        &mut self,
        source: usize,
        triangle: [Point3<f32>; 3],
        epsilon: f32,
    ) -> bool {
        let [v0, v1, v2] = triangle;
        let plane = match PartitionPlane::from_triangle(v0, v1, v2) {
            Some(plane) if !corners_coincide(&triangle, epsilon) => plane,
            _ => {
                trace!(source, "skipping degenerate triangle");
                return false;
            }
        };
        let original = CoplanarTriangle {
            source,
            vertices: triangle,
        };

        if self.nodes.is_empty() {
            let root = self.push_node(plane, None);
            self.nodes[root.index()].add_coplanar(original);
            return true;
        }

        let mut stack: Vec<(NodeIndex, [Point3<f32>; 3])> = vec![(NodeIndex::ROOT, triangle)];
        let mut pending: Vec<PendingNode> = Vec::new();

        while let Some((index, corners)) = stack.pop() {
            let node = &self.nodes[index.index()];
            let node_plane = *node.plane();
            let sides = node_plane.classify_corners(&corners, epsilon);

            match sides.classification() {
                Classification::Spanning => {
                    let Some(split) = split_triangle(&node_plane, &corners, &sides, epsilon) else {
                        continue;
                    };
                    for piece in &split.pieces {
                        let points = split.points(&corners, piece);
                        if corners_coincide(&points, epsilon) {
                            trace!(source, node = index.index(), "dropping degenerate fragment");
                            continue;
                        }
                        match node.child(piece.side) {
                            Some(child) => stack.push((child, points)),
                            None => pending.push(PendingNode {
                                parent: index,
                                side: piece.side,
                                anchor: points[0],
                            }),
                        }
                    }
                }
                Classification::Front | Classification::Back => {
                    let side = if sides.front > 0 { Side::Front } else { Side::Back };
                    match node.child(side) {
                        Some(child) => stack.push((child, corners)),
                        None => pending.push(PendingNode {
                            parent: index,
                            side,
                            anchor: corners[0],
                        }),
                    }
                }
                Classification::Coplanar => {
                    self.nodes[index.index()].add_coplanar(original);
                }
            }
        }

        for leaf in pending {
            // Several pieces may target the same slot; the first one opens it.
            if self.nodes[leaf.parent.index()].child(leaf.side).is_some() {
                continue;
            }
            let child = self.push_node(plane.anchored_at(leaf.anchor), Some(leaf.parent));
            self.nodes[leaf.parent.index()].attach(leaf.side, child);
            self.nodes[child.index()].add_coplanar(original);
        }

        true
    }

    /// Walks a point down from the root until it reaches an empty child slot.
    ///
    /// A point lying on a node's plane is walked through both subtrees of
    /// that node. When both agree on a side, that side is the answer;
    /// otherwise the point is on the surface the tree bounds and the result
    /// is `OnPlane` at that node.
    ///
    /// Returns `None` for an empty tree.
    pub fn classify_point_in_tree(&self, point: Point3<f32>, epsilon: f32) -> Option<PointLocation> {
        let root = self.root()?;
        Some(self.classify_point_from(root, point, epsilon))
    }

    fn classify_point_from(&self, start: NodeIndex, point: Point3<f32>, epsilon: f32) -> PointLocation {
        let mut index = start;
        loop {
            let node = &self.nodes[index.index()];
            let side = node.classify_point(point, epsilon);
            let Some(half) = side.half_space() else {
                break;
            };
            match node.child(half) {
                Some(child) => index = child,
                None => return PointLocation { node: index, side },
            }
        }

        // On the plane of `index`: every walk through its subtrees must end
        // on the same side. A missing front slot counts as Front, a missing
        // back slot as Back.
        let surface = PointLocation {
            node: index,
            side: PlaneSide::OnPlane,
        };
        let mut agreed: Option<Side> = None;
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            let node = &self.nodes[current.index()];
            let slots = match node.classify_point(point, epsilon).half_space() {
                Some(half) => [Some((half, node.child(half))), None],
                None => [Some((Side::Front, node.front())), Some((Side::Back, node.back()))],
            };
            for (half, child) in slots.into_iter().flatten() {
                match child {
                    Some(child) => stack.push(child),
                    None if agreed.is_none_or(|side| side == half) => agreed = Some(half),
                    None => return surface,
                }
            }
        }

        match agreed {
            Some(side) => PointLocation {
                node: index,
                side: side.into(),
            },
            None => surface,
        }
    }

    /// Traverses the tree back-to-front relative to the given viewpoint.
    ///
    /// Useful for painter's algorithm rendering of the stored triangles: the
    /// visitor sees each node's coplanar triangles, farthest first.
    pub fn traverse_back_to_front<V: BspVisitor>(&self, eye: Point3<f32>, epsilon: f32, visitor: &mut V) {
        if let Some(root) = self.root() {
            self.traverse_back_to_front_from(root, eye, epsilon, visitor);
        }
    }

    /// Back-to-front traversal of the subtree rooted at `start`.
    pub fn traverse_back_to_front_from<V: BspVisitor>(
        &self,
        start: NodeIndex,
        eye: Point3<f32>,
        epsilon: f32,
        visitor: &mut V,
    ) {
        let Some(node) = self.node(start) else {
            return;
        };
        let (near, far) = match node.classify_point(eye, epsilon) {
            PlaneSide::Front | PlaneSide::OnPlane => (node.front(), node.back()),
            PlaneSide::Back => (node.back(), node.front()),
        };

        if let Some(far) = far {
            self.traverse_back_to_front_from(far, eye, epsilon, visitor);
        }
        if !node.coplanar().is_empty() {
            visitor.visit(start, node.coplanar());
        }
        if let Some(near) = near {
            self.traverse_back_to_front_from(near, eye, epsilon, visitor);
        }
    }

    /// Traverses the tree front-to-back relative to the given viewpoint.
    pub fn traverse_front_to_back<V: BspVisitor>(&self, eye: Point3<f32>, epsilon: f32, visitor: &mut V) {
        if let Some(root) = self.root() {
            self.traverse_front_to_back_from(root, eye, epsilon, visitor);
        }
    }

    fn traverse_front_to_back_from<V: BspVisitor>(
        &self,
        start: NodeIndex,
        eye: Point3<f32>,
        epsilon: f32,
        visitor: &mut V,
    ) {
        let node = &self.nodes[start.index()];
        let (near, far) = match node.classify_point(eye, epsilon) {
            PlaneSide::Front | PlaneSide::OnPlane => (node.front(), node.back()),
            PlaneSide::Back => (node.back(), node.front()),
        };

        if let Some(near) = near {
            self.traverse_front_to_back_from(near, eye, epsilon, visitor);
        }
        if !node.coplanar().is_empty() {
            visitor.visit(start, node.coplanar());
        }
        if let Some(far) = far {
            self.traverse_front_to_back_from(far, eye, epsilon, visitor);
        }
    }

    /// Appends a node and returns its index. Linking it to the parent is the
    /// caller's job.
    fn push_node(&mut self, plane: PartitionPlane, parent: Option<NodeIndex>) -> NodeIndex {
        let index = NodeIndex::new(self.nodes.len());
        self.nodes.push(PartitionNode::new(plane, parent));
        index
    }
}
