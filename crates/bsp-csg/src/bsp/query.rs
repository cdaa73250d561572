//! Classifying foreign triangles against a built tree.

use nalgebra::Point3;
use tracing::trace;

use crate::error::CsgError;
use crate::intersect::triangle_triangle;
use crate::triangle::corners_coincide;
use crate::{Classification, PlaneSide, Side, Triangle};

use super::node::NodeIndex;
use super::split::{Corner, split_triangle};
use super::tree::BspTree;

/// Where a split vertex comes from: the point at `alpha` along the edge
/// `from → to` of earlier entries in the same vertex list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeProvenance {
    pub from: usize,
    pub to: usize,
    pub alpha: f32,
}

/// A vertex of a classified triangle.
///
/// Entries 0..3 are the query triangle's own corners and carry no
/// provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitVertex {
    pub position: Point3<f32>,
    pub provenance: Option<EdgeProvenance>,
}

impl SplitVertex {
    fn original(position: Point3<f32>) -> Self {
        Self {
            position,
            provenance: None,
        }
    }
}

/// Side reached by a fragment while walking the tree, before the
/// sampling pass settles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentSide {
    Front,
    Back,
    /// Coplanar with a node, or straddling planes without touching any stored
    /// triangle.
    Unresolved,
}

impl From<Side> for FragmentSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Front => FragmentSide::Front,
            Side::Back => FragmentSide::Back,
        }
    }
}

/// Orientation of a fragment lying on the tree's surface, relative to the
/// surface there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Same winding: both solids lie on the same side of the shared face.
    Same,
    /// Opposite winding: the solids touch along the shared face.
    Opposite,
}

/// One output fragment, as indices into [`TriangleClassification::vertices`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedTriangle {
    pub vertices: [usize; 3],
    /// Final side, after sampling.
    pub side: Side,
    /// Side found by the walk itself.
    pub walked: FragmentSide,
    /// Set when every sample lies on the tree's surface. `side` is then
    /// `Front`.
    pub coplanar: Option<Facing>,
}

/// Result of [`BspTree::classify_triangle`].
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleClassification {
    pub vertices: Vec<SplitVertex>,
    pub triangles: Vec<ClassifiedTriangle>,
    /// `false` when the query came back whole as its single fragment.
    pub had_split: bool,
}

impl TriangleClassification {
    /// Positions of a fragment's corners.
    pub fn positions(&self, triangle: &ClassifiedTriangle) -> [Point3<f32>; 3] {
        triangle.vertices.map(|i| self.vertices[i].position)
    }
}

/// A fragment still being walked.
///
/// `path` holds the nodes it must still be tested against; the last entry is
/// tested next. It grows past one entry when a fragment straddles a plane
/// without touching the node's triangles and has to be tried in both
/// subtrees.
#[derive(Debug, Clone)]
struct PendingFragment {
    path: Vec<NodeIndex>,
    vertices: [usize; 3],
    point_test: bool,
}

impl BspTree {
    /// Classifies a triangle that is not part of this tree against the volume
    /// the tree bounds.
    ///
    /// The triangle is walked down the tree. At a plane it straddles, it is
    /// only split if it actually touches one of the node's stored triangles;
    /// otherwise it is sent into every existing child of that node and left
    /// unresolved. Fragments stop when they reach an empty child slot.
    ///
    /// Every finished fragment then gets its final side from four samples
    /// (its corners, then its centroid), each walked from the root with
    /// [`BspTree::classify_point_in_tree`]:
    /// - Front and Back both seen: `Back`;
    /// - otherwise the first sample that ended on a side;
    /// - all samples on the surface: `Front`, and
    ///   [`ClassifiedTriangle::coplanar`] tells how the fragment faces the
    ///   surface plane under its centroid.
    ///
    /// The first rule is a heuristic, not a proven-correct choice.
    ///
    /// # Errors
    ///
    /// [`CsgError::EmptyTree`] if the tree has no node.
    pub fn classify_triangle(
        &self,
        triangle: [Point3<f32>; 3],
        epsilon: f32,
    ) -> Result<TriangleClassification, CsgError> {
        let root = self.root().ok_or(CsgError::EmptyTree)?;

        let mut vertices: Vec<SplitVertex> = triangle.iter().copied().map(SplitVertex::original).collect();
        let mut queue = vec![PendingFragment {
            path: vec![root],
            vertices: [0, 1, 2],
            point_test: false,
        }];
        let mut finished: Vec<([usize; 3], FragmentSide)> = Vec::new();

        while let Some(mut fragment) = queue.pop() {
            let Some(&index) = fragment.path.last() else {
                finished.push((fragment.vertices, FragmentSide::Unresolved));
                continue;
            };
            let node = &self.nodes()[index.index()];
            let corners = fragment.vertices.map(|i| vertices[i].position);
            let sides = node.plane().classify_corners(&corners, epsilon);

            match sides.classification() {
                Classification::Spanning => {
                    let touches = node
                        .coplanar()
                        .iter()
                        .any(|stored| triangle_triangle(&corners, &stored.vertices, epsilon).is_some());

                    if touches {
                        let Some(split) = split_triangle(node.plane(), &corners, &sides, epsilon) else {
                            finished.push((fragment.vertices, FragmentSide::Unresolved));
                            continue;
                        };
                        trace!(node = index.index(), pieces = split.pieces.len(), "splitting fragment");

                        let cut_ids: Vec<usize> = split
                            .cuts
                            .iter()
                            .map(|cut| {
                                vertices.push(SplitVertex {
                                    position: cut.point,
                                    provenance: Some(EdgeProvenance {
                                        from: fragment.vertices[cut.from],
                                        to: fragment.vertices[cut.to],
                                        alpha: cut.alpha,
                                    }),
                                });
                                vertices.len() - 1
                            })
                            .collect();

                        for piece in &split.pieces {
                            let ids = piece.corners.map(|corner| match corner {
                                Corner::Original(k) => fragment.vertices[k],
                                Corner::Cut(i) => cut_ids[i],
                            });
                            if corners_coincide(&ids.map(|i| vertices[i].position), epsilon) {
                                trace!(node = index.index(), "dropping degenerate fragment");
                                continue;
                            }

                            let mut path = fragment.path.clone();
                            match node.child(piece.side) {
                                Some(child) => {
                                    if let Some(last) = path.last_mut() {
                                        *last = child;
                                    }
                                }
                                None if path.len() == 1 => {
                                    finished.push((ids, piece.side.into()));
                                    continue;
                                }
                                None => {
                                    path.pop();
                                }
                            }
                            queue.push(PendingFragment {
                                path,
                                vertices: ids,
                                point_test: false,
                            });
                        }
                    } else if node.is_leaf() && fragment.path.len() == 1 {
                        finished.push((fragment.vertices, FragmentSide::Unresolved));
                    } else {
                        fragment.path.pop();
                        fragment.path.extend(node.front());
                        fragment.path.extend(node.back());
                        fragment.point_test = true;
                        queue.push(fragment);
                    }
                }
                Classification::Front | Classification::Back => {
                    let side = if sides.front > 0 { Side::Front } else { Side::Back };
                    match node.child(side) {
                        Some(child) => {
                            if let Some(last) = fragment.path.last_mut() {
                                *last = child;
                            }
                            queue.push(fragment);
                        }
                        None if fragment.path.len() > 1 => {
                            fragment.path.pop();
                            queue.push(fragment);
                        }
                        None => {
                            let walked = if fragment.point_test {
                                FragmentSide::Unresolved
                            } else {
                                side.into()
                            };
                            finished.push((fragment.vertices, walked));
                        }
                    }
                }
                Classification::Coplanar => {
                    finished.push((fragment.vertices, FragmentSide::Unresolved));
                }
            }
        }

        let triangles: Vec<ClassifiedTriangle> = finished
            .into_iter()
            .map(|(ids, walked)| {
                let points = ids.map(|i| vertices[i].position);
                let (side, coplanar) = self.sample_side(&points, epsilon);
                if walked == FragmentSide::Unresolved {
                    trace!(?side, ?coplanar, "unresolved fragment settled by sampling");
                }
                ClassifiedTriangle {
                    vertices: ids,
                    side,
                    walked,
                    coplanar,
                }
            })
            .collect();

        let had_split = !(triangles.len() == 1 && triangles[0].vertices == [0, 1, 2]);

        Ok(TriangleClassification {
            vertices,
            triangles,
            had_split,
        })
    }

    /// Settles a fragment's side from its corners and centroid.
    fn sample_side(&self, corners: &[Point3<f32>; 3], epsilon: f32) -> (Side, Option<Facing>) {
        let centroid = Triangle::from(*corners).centroid();
        let samples = [corners[0], corners[1], corners[2], centroid]
            .map(|point| self.classify_point_in_tree(point, epsilon));
        let sides = samples.map(|location| location.map_or(PlaneSide::OnPlane, |l| l.side));

        if sides.contains(&PlaneSide::Front) && sides.contains(&PlaneSide::Back) {
            return (Side::Back, None);
        }
        if let Some(side) = sides.iter().find_map(|side| side.half_space()) {
            return (side, None);
        }

        let facing = samples[3].and_then(|location| {
            let surface = self.node(location.node)?.plane().normal();
            let normal = Triangle::from(*corners).normal();
            Some(if normal.dot(&surface) > 0.0 { Facing::Same } else { Facing::Opposite })
        });
        (Side::Front, facing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CSG_EPSILON;

    fn p(x: f32, y: f32, z: f32) -> Point3<f32> {
        Point3::new(x, y, z)
    }

    fn area(points: [Point3<f32>; 3]) -> f32 {
        Triangle::from(points).area()
    }

    /// Large triangle in y = 0, facing +y.
    fn ground_tree() -> BspTree {
        let mut tree = BspTree::new();
        tree.insert_triangle(0, [p(-5.0, 0.0, -5.0), p(-5.0, 0.0, 5.0), p(5.0, 0.0, 0.0)], CSG_EPSILON);
        tree
    }

    /// Small triangle in y = 0, facing +y, near the origin.
    fn small_ground_tree() -> BspTree {
        let mut tree = BspTree::new();
        tree.insert_triangle(0, [p(0.0, 0.0, 0.0), p(0.0, 0.0, 1.0), p(1.0, 0.0, 0.0)], CSG_EPSILON);
        tree
    }

    #[test]
    fn empty_tree_is_an_error() {
        let tree = BspTree::new();
        let result = tree.classify_triangle([p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)], CSG_EPSILON);
        assert_eq!(result, Err(CsgError::EmptyTree));
    }

    #[test]
    fn separate_triangle_is_not_split() {
        let mut tree = BspTree::new();
        tree.insert_triangle(0, [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)], CSG_EPSILON);

        let query = [p(0.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(0.0, 1.0, 1.0)];
        let result = tree.classify_triangle(query, CSG_EPSILON).unwrap();

        assert!(!result.had_split);
        assert_eq!(result.vertices.len(), 3);
        assert!(result.vertices.iter().all(|v| v.provenance.is_none()));
        assert_eq!(
            result.triangles,
            vec![ClassifiedTriangle {
                vertices: [0, 1, 2],
                side: Side::Front,
                walked: FragmentSide::Front,
                coplanar: None,
            }]
        );
    }

    #[test]
    fn crossing_triangle_is_split() {
        let tree = ground_tree();
        let query = [p(-0.5, -1.0, 0.5), p(0.5, -1.0, 0.5), p(0.0, 1.0, 0.5)];
        let result = tree.classify_triangle(query, CSG_EPSILON).unwrap();

        assert!(result.had_split);
        assert!((2..=3).contains(&result.triangles.len()));
        assert_eq!(result.vertices.len(), 5);

        let total: f32 = result.triangles.iter().map(|t| area(result.positions(t))).sum();
        assert!((total - area(query)).abs() <= 1e-4 * area(query));

        let front: Vec<_> = result.triangles.iter().filter(|t| t.side == Side::Front).collect();
        let back: Vec<_> = result.triangles.iter().filter(|t| t.side == Side::Back).collect();
        assert_eq!(front.len(), 1);
        assert_eq!(back.len(), 2);
        assert!(front[0].vertices.contains(&2));
        for t in &result.triangles {
            assert_eq!(FragmentSide::from(t.side), t.walked);
        }
    }

    #[test]
    fn split_vertices_record_their_edge() {
        let tree = ground_tree();
        let query = [p(-0.5, -1.0, 0.5), p(0.5, -1.0, 0.5), p(0.0, 1.0, 0.5)];
        let result = tree.classify_triangle(query, CSG_EPSILON).unwrap();

        for vertex in &result.vertices[3..] {
            let edge = vertex.provenance.unwrap();
            let a = result.vertices[edge.from].position;
            let b = result.vertices[edge.to].position;
            let expected = a + (b - a) * edge.alpha;
            assert!((vertex.position - expected).norm() < 1e-5);
            assert!(vertex.position.y.abs() < 1e-5);
            assert!((edge.alpha - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn one_corner_on_plane_gives_two_fragments() {
        let tree = ground_tree();
        let query = [p(0.0, 0.0, 0.5), p(0.5, -1.0, 0.5), p(0.5, 1.0, 0.5)];
        let result = tree.classify_triangle(query, CSG_EPSILON).unwrap();

        assert!(result.had_split);
        assert_eq!(result.triangles.len(), 2);
        let total: f32 = result.triangles.iter().map(|t| area(result.positions(t))).sum();
        assert!((total - area(query)).abs() <= 1e-4 * area(query));
    }

    #[test]
    fn descends_into_existing_children() {
        let mut tree = BspTree::new();
        tree.insert_triangle(0, [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)], CSG_EPSILON);
        tree.insert_triangle(1, [p(0.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(0.0, 1.0, 1.0)], CSG_EPSILON);

        let between = [p(0.0, 0.0, 0.5), p(1.0, 0.0, 0.5), p(0.0, 1.0, 0.5)];
        let result = tree.classify_triangle(between, CSG_EPSILON).unwrap();
        assert!(!result.had_split);
        assert_eq!(result.triangles[0].side, Side::Back);

        let above = [p(0.0, 0.0, 2.0), p(1.0, 0.0, 2.0), p(0.0, 1.0, 2.0)];
        let result = tree.classify_triangle(above, CSG_EPSILON).unwrap();
        assert_eq!(result.triangles[0].side, Side::Front);
    }

    #[test]
    fn coplanar_query_is_settled_by_sampling() {
        let tree = small_ground_tree();
        let query = [p(2.0, 0.0, 2.0), p(2.0, 0.0, 3.0), p(3.0, 0.0, 2.0)];
        let result = tree.classify_triangle(query, CSG_EPSILON).unwrap();

        assert!(!result.had_split);
        assert_eq!(result.triangles[0].walked, FragmentSide::Unresolved);
        // All samples lie on the root plane.
        assert_eq!(result.triangles[0].side, Side::Front);
        assert_eq!(result.triangles[0].coplanar, Some(Facing::Same));

        let flipped = [query[0], query[2], query[1]];
        let result = tree.classify_triangle(flipped, CSG_EPSILON).unwrap();
        assert_eq!(result.triangles[0].coplanar, Some(Facing::Opposite));
    }

    #[test]
    fn straddling_without_contact_resolves_to_back() {
        // Known heuristic: when the samples disagree, the fragment is Back.
        let tree = small_ground_tree();
        let query = [p(10.0, -1.0, 10.0), p(11.0, -1.0, 10.0), p(10.5, 1.0, 10.0)];
        let result = tree.classify_triangle(query, CSG_EPSILON).unwrap();

        assert!(!result.had_split);
        assert_eq!(result.vertices.len(), 3);
        assert_eq!(
            result.triangles,
            vec![ClassifiedTriangle {
                vertices: [0, 1, 2],
                side: Side::Back,
                walked: FragmentSide::Unresolved,
                coplanar: None,
            }]
        );
    }

    #[test]
    fn straddling_without_contact_tries_both_children() {
        let mut tree = small_ground_tree();
        tree.insert_triangle(1, [p(0.0, 2.0, 0.0), p(0.0, 2.0, 1.0), p(1.0, 2.0, 0.0)], CSG_EPSILON);
        tree.insert_triangle(2, [p(0.0, -2.0, 0.0), p(0.0, -2.0, 1.0), p(1.0, -2.0, 0.0)], CSG_EPSILON);
        assert_eq!(tree.len(), 3);

        let query = [p(10.0, -1.0, 10.0), p(11.0, -1.0, 10.0), p(10.5, 1.0, 10.0)];
        let result = tree.classify_triangle(query, CSG_EPSILON).unwrap();

        assert!(!result.had_split);
        assert_eq!(result.triangles.len(), 1);
        assert_eq!(result.triangles[0].walked, FragmentSide::Unresolved);
        assert_eq!(result.triangles[0].side, Side::Back);
    }
}
