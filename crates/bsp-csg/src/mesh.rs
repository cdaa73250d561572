//! Indexed triangle soup that CSG operations edit in place.

use std::ops::Range;

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::bsp::BspTree;
use crate::csg::{CsgOperator, CsgReport, combine};
use crate::error::CsgError;
use crate::options::{CLEANUP_EPSILON, CsgOptions};
use crate::triangle::corners_coincide;
use crate::vertex::VertexRecord;

/// Mesh size recorded when a brace was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BraceCursor {
    pub vertex: usize,
    pub triangle: usize,
}

/// Counts from [`MeshSoup::cleanup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupStats {
    pub triangles_removed: usize,
    pub vertices_removed: usize,
}

/// An ordered list of vertices plus an ordered list of index triples.
///
/// Two disjoint triangle ranges of one soup are the operands of a
/// [`combine`]. Braces give those ranges names while a mesh is being built:
///
/// ```ignore
/// mesh.open_brace();
/// /* append operand A */
/// mesh.open_brace();
/// /* append operand B */
/// mesh.csg_subtract()?;
/// mesh.close_brace()?;
/// mesh.close_brace()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeshSoup {
    vertices: Vec<VertexRecord>,
    triangles: Vec<[usize; 3]>,
    cursors: Vec<BraceCursor>,
}

impl MeshSoup {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn vertices(&self) -> &[VertexRecord] {
        &self.vertices
    }

    /// Vertex attributes can be edited in place; positions too, as long as
    /// no CSG is running.
    #[inline]
    pub fn vertices_mut(&mut self) -> &mut [VertexRecord] {
        &mut self.vertices
    }

    #[inline]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Currently open braces, innermost last.
    pub fn cursors(&self) -> &[BraceCursor] {
        &self.cursors
    }

    /// Appends a vertex and returns its index.
    pub fn add_vertex(&mut self, vertex: VertexRecord) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    /// Appends a triangle and returns its index.
    ///
    /// # Panics
    ///
    /// Panics if an index does not name an existing vertex.
    pub fn add_triangle(&mut self, indices: [usize; 3]) -> usize {
        assert!(
            indices.iter().all(|&i| i < self.vertices.len()),
            "triangle {indices:?} references a missing vertex ({} vertices)",
            self.vertices.len()
        );
        self.triangles.push(indices);
        self.triangles.len() - 1
    }

    /// Appends a copy of vertex `index` and returns the copy's index.
    pub fn duplicate_vertex(&mut self, index: usize) -> usize {
        let copy = self.vertices[index];
        self.add_vertex(copy)
    }

    /// Appends an axis-aligned box with outward winding: four vertices and
    /// two triangles per face, so every face keeps a flat normal. Returns the
    /// range of the twelve new triangles.
    pub fn append_box(&mut self, center: Point3<f32>, half_extent: f32) -> Range<usize> {
        // (normal, u, v) with u × v = normal
        let faces = [
            (Vector3::x(), Vector3::y(), Vector3::z()),
            (-Vector3::x(), Vector3::z(), Vector3::y()),
            (Vector3::y(), Vector3::z(), Vector3::x()),
            (-Vector3::y(), Vector3::x(), Vector3::z()),
            (Vector3::z(), Vector3::x(), Vector3::y()),
            (-Vector3::z(), Vector3::y(), Vector3::x()),
        ];

        let start = self.triangles.len();
        for (normal, u, v) in faces {
            let face_center = center + normal * half_extent;
            let ids = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)].map(|(su, sv): (f32, f32)| {
                let position = face_center + (u * su + v * sv) * half_extent;
                self.add_vertex(VertexRecord::new(position, normal))
            });
            self.triangles.push([ids[0], ids[1], ids[2]]);
            self.triangles.push([ids[0], ids[2], ids[3]]);
        }
        start..self.triangles.len()
    }

    /// Corner positions of triangle `index`.
    pub fn triangle_positions(&self, index: usize) -> [Point3<f32>; 3] {
        self.triangles[index].map(|i| self.vertices[i].position)
    }

    /// Builds a BSP tree over the triangles in `range`, each tagged with its
    /// index in this mesh. Degenerate triangles are left out.
    pub fn build_tree(&self, range: Range<usize>, epsilon: f32) -> BspTree {
        let mut tree = BspTree::new();
        for index in range {
            tree.insert_triangle(index, self.triangle_positions(index), epsilon);
        }
        tree
    }

    /// Recomputes smoothed vertex normals from the triangles in `range`.
    ///
    /// Each vertex used by the range gets the normalized mean of the distinct
    /// face normals around it. Face normals within `CLEANUP_EPSILON` of one
    /// already gathered for that vertex count once, so a flat quad split in
    /// two does not bias the mean. Vertices outside the range are untouched.
    pub fn compute_normals(&mut self, range: Range<usize>) {
        let mut gathered: Vec<Vec<Vector3<f32>>> = vec![Vec::new(); self.vertices.len()];

        for triangle in &self.triangles[range] {
            let [a, b, c] = triangle.map(|i| self.vertices[i].position);
            let Some(normal) = (b - a).cross(&(c - a)).try_normalize(f32::EPSILON) else {
                continue;
            };
            for &i in triangle {
                let normals = &mut gathered[i];
                if normals.iter().all(|n| 1.0 - n.dot(&normal) >= CLEANUP_EPSILON) {
                    normals.push(normal);
                }
            }
        }

        for (vertex, normals) in self.vertices.iter_mut().zip(&gathered) {
            if normals.is_empty() {
                continue;
            }
            let sum: Vector3<f32> = normals.iter().sum();
            if let Some(mean) = (sum / normals.len() as f32).try_normalize(f32::EPSILON) {
                vertex.normal = mean;
            }
        }
    }

    /// Reverses the winding of triangle `index` and refreshes the normals of
    /// its corners. With `detach`, the corners are duplicated first so no
    /// other triangle sees the change.
    pub fn invert_triangle(&mut self, index: usize, detach: bool) {
        if detach {
            for k in 0..3 {
                let copy = self.duplicate_vertex(self.triangles[index][k]);
                self.triangles[index][k] = copy;
            }
        }
        self.triangles[index].swap(1, 2);
        self.compute_normals(index..index + 1);
    }

    /// Removes the listed triangles. Indices may repeat and come in any order.
    ///
    /// Returns how many triangles were removed.
    pub fn remove_triangles(&mut self, mut indices: Vec<usize>) -> usize {
        indices.sort_unstable();
        indices.dedup();
        indices.retain(|&i| i < self.triangles.len());

        // Descending, so earlier removals never shift later ones.
        for &index in indices.iter().rev() {
            self.triangles.remove(index);
        }
        indices.len()
    }

    /// Drops triangles with two corners closer than `epsilon`, then vertices
    /// no triangle uses, and reindexes what is left.
    ///
    /// The relative order of surviving triangles and vertices is kept, so
    /// running it twice changes nothing the second time.
    pub fn cleanup(&mut self, epsilon: f32) -> CleanupStats {
        let triangles_before = self.triangles.len();
        let vertices = &self.vertices;
        self.triangles
            .retain(|t| !corners_coincide(&t.map(|i| vertices[i].position), epsilon));

        let mut used = vec![false; self.vertices.len()];
        for &i in self.triangles.iter().flatten() {
            used[i] = true;
        }

        // shift[i]: unused vertices up to and including i
        let mut shift = vec![0usize; self.vertices.len()];
        let mut removed = 0;
        for (i, &is_used) in used.iter().enumerate() {
            if !is_used {
                removed += 1;
            }
            shift[i] = removed;
        }

        let mut index = 0;
        self.vertices.retain(|_| {
            let keep = used[index];
            index += 1;
            keep
        });
        for corner in self.triangles.iter_mut().flatten() {
            *corner -= shift[*corner];
        }

        let stats = CleanupStats {
            triangles_removed: triangles_before - self.triangles.len(),
            vertices_removed: removed,
        };
        debug!(
            triangles_removed = stats.triangles_removed,
            vertices_removed = stats.vertices_removed,
            "mesh cleanup"
        );
        stats
    }

    /// Pushes a cursor at the current end of the mesh.
    pub fn open_brace(&mut self) {
        self.cursors.push(BraceCursor {
            vertex: self.vertices.len(),
            triangle: self.triangles.len(),
        });
    }

    /// Pops the innermost cursor.
    pub fn close_brace(&mut self) -> Result<BraceCursor, CsgError> {
        self.cursors.pop().ok_or(CsgError::UnbalancedBraces)
    }

    /// Triangle ranges a brace-driven CSG combines.
    ///
    /// Operand A runs from the previous cursor (or the mesh start) to the
    /// innermost cursor; operand B from the innermost cursor to the end.
    pub fn brace_operands(&self) -> Result<(Range<usize>, Range<usize>), CsgError> {
        let last = self.cursors.last().ok_or(CsgError::UnbalancedBraces)?;
        let start = match self.cursors.len() {
            0 | 1 => 0,
            n => self.cursors[n - 2].triangle,
        };
        Ok((start..last.triangle, last.triangle..self.triangles.len()))
    }

    /// Combines the two operands delimited by the open braces, then moves the
    /// innermost cursor to the new end of the mesh.
    pub fn csg(&mut self, operator: CsgOperator, options: &CsgOptions) -> Result<CsgReport, CsgError> {
        let (a, b) = self.brace_operands()?;
        let report = combine(self, a, b, operator, options)?;
        let end = BraceCursor {
            vertex: self.vertices.len(),
            triangle: self.triangles.len(),
        };
        if let Some(last) = self.cursors.last_mut() {
            *last = end;
        }
        Ok(report)
    }

    pub fn csg_union(&mut self) -> Result<CsgReport, CsgError> {
        self.csg(CsgOperator::Union, &CsgOptions::default())
    }

    pub fn csg_subtract(&mut self) -> Result<CsgReport, CsgError> {
        self.csg(CsgOperator::Subtract, &CsgOptions::default())
    }

    pub fn csg_subtract_loss(&mut self) -> Result<CsgReport, CsgError> {
        self.csg(CsgOperator::SubtractLoss, &CsgOptions::default())
    }

    pub fn csg_and(&mut self) -> Result<CsgReport, CsgError> {
        self.csg(CsgOperator::And, &CsgOptions::default())
    }

    pub fn csg_xor(&mut self) -> Result<CsgReport, CsgError> {
        self.csg(CsgOperator::Xor, &CsgOptions::default())
    }

    pub(crate) fn vertex(&self, index: usize) -> &VertexRecord {
        &self.vertices[index]
    }

    pub(crate) fn triangle(&self, index: usize) -> [usize; 3] {
        self.triangles[index]
    }

    pub(crate) fn push_triangle_unchecked(&mut self, indices: [usize; 3]) -> usize {
        self.triangles.push(indices);
        self.triangles.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{append_triangle, signed_volume};

    fn p(x: f32, y: f32, z: f32) -> Point3<f32> {
        Point3::new(x, y, z)
    }

    #[test]
    fn box_is_closed_and_outward() {
        let mut mesh = MeshSoup::new();
        let range = mesh.append_box(p(1.0, 0.0, 0.0), 1.0);
        assert_eq!(range, 0..12);
        assert_eq!(mesh.vertex_count(), 24);
        assert!((signed_volume(&mesh, range.clone()) - 8.0).abs() < 1e-4);

        let tree = mesh.build_tree(range, crate::CSG_EPSILON);
        assert_eq!(tree.triangle_count(), 12);
        let inside = tree.classify_point_in_tree(p(1.0, 0.1, 0.2), crate::CSG_EPSILON).unwrap();
        assert_eq!(inside.side, crate::PlaneSide::Back);
    }

    #[test]
    fn add_and_duplicate() {
        let mut mesh = MeshSoup::new();
        let t = append_triangle(&mut mesh, [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)]);
        assert_eq!(t, 0);
        assert_eq!(mesh.vertex_count(), 3);

        let copy = mesh.duplicate_vertex(1);
        assert_eq!(copy, 3);
        assert_eq!(mesh.vertices()[3], mesh.vertices()[1]);
    }

    #[test]
    #[should_panic]
    fn add_triangle_checks_indices() {
        let mut mesh = MeshSoup::new();
        mesh.add_vertex(VertexRecord::new(Point3::origin(), Vector3::z()));
        mesh.add_triangle([0, 0, 1]);
    }

    #[test]
    fn compute_normals_of_flat_triangle() {
        let mut mesh = MeshSoup::new();
        append_triangle(&mut mesh, [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)]);
        for i in 0..3 {
            mesh.vertices[i].normal = Vector3::zeros();
        }
        mesh.compute_normals(0..1);
        for v in mesh.vertices() {
            assert!((v.normal - Vector3::z()).norm() < 1e-6);
        }
    }

    #[test]
    fn compute_normals_ignores_repeated_faces() {
        // A quad (two coplanar triangles) and one perpendicular triangle share vertex 0.
        let mut mesh = MeshSoup::new();
        for position in [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 0.0, 1.0)] {
            mesh.add_vertex(VertexRecord::new(position, Vector3::zeros()));
        }
        mesh.add_triangle([0, 1, 2]);
        mesh.add_triangle([0, 2, 3]);
        mesh.add_triangle([0, 4, 1]);
        mesh.compute_normals(0..3);

        let expected = (Vector3::z() + Vector3::y()).normalize();
        assert!((mesh.vertices()[0].normal - expected).norm() < 1e-5);
        assert!((mesh.vertices()[2].normal - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn invert_with_detach() {
        let mut mesh = MeshSoup::new();
        append_triangle(&mut mesh, [p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)]);
        mesh.invert_triangle(0, true);

        assert_eq!(mesh.triangles()[0], [3, 5, 4]);
        assert_eq!(mesh.vertex_count(), 6);
        for i in 3..6 {
            assert!((mesh.vertices()[i].normal + Vector3::z()).norm() < 1e-6);
        }
        // The originals keep their normal.
        assert!((mesh.vertices()[0].normal - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn remove_triangles_handles_duplicates() {
        let mut mesh = MeshSoup::new();
        for k in 0..5 {
            let z = k as f32;
            append_triangle(&mut mesh, [p(0.0, 0.0, z), p(1.0, 0.0, z), p(0.0, 1.0, z)]);
        }
        let removed = mesh.remove_triangles(vec![3, 1, 3, 1, 4]);
        assert_eq!(removed, 3);
        assert_eq!(mesh.triangles(), &[[0, 1, 2], [6, 7, 8]]);
    }

    #[test]
    fn cleanup_drops_degenerate_and_orphans() {
        let mut mesh = MeshSoup::new();
        append_triangle(&mut mesh, [p(0.0, 0.0, 0.0), p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0)]);
        append_triangle(&mut mesh, [p(0.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(0.0, 1.0, 1.0)]);
        mesh.add_vertex(VertexRecord::new(p(9.0, 9.0, 9.0), Vector3::z()));

        let stats = mesh.cleanup(CLEANUP_EPSILON);
        assert_eq!(
            stats,
            CleanupStats {
                triangles_removed: 1,
                vertices_removed: 4,
            }
        );
        assert_eq!(mesh.triangles(), &[[0, 1, 2]]);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertices()[0].position, p(0.0, 0.0, 1.0));
    }

    #[test]
    fn cleanup_is_idempotent() {
        let mut mesh = MeshSoup::new();
        mesh.append_box(p(0.0, 0.0, 0.0), 1.0);
        append_triangle(&mut mesh, [p(5.0, 5.0, 5.0), p(5.0, 5.0, 5.000001), p(6.0, 5.0, 5.0)]);
        mesh.add_vertex(VertexRecord::new(p(9.0, 9.0, 9.0), Vector3::z()));

        mesh.cleanup(CLEANUP_EPSILON);
        let once = (mesh.vertices().to_vec(), mesh.triangles().to_vec());
        let stats = mesh.cleanup(CLEANUP_EPSILON);

        assert_eq!(stats, CleanupStats::default());
        assert_eq!(mesh.vertices(), once.0.as_slice());
        assert_eq!(mesh.triangles(), once.1.as_slice());
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn brace_operands_follow_cursors() {
        let mut mesh = MeshSoup::new();
        assert_eq!(mesh.brace_operands(), Err(CsgError::UnbalancedBraces));

        mesh.append_box(p(10.0, 0.0, 0.0), 1.0);
        mesh.open_brace();
        mesh.append_box(p(0.0, 0.0, 0.0), 1.0);
        mesh.open_brace();
        mesh.append_box(p(1.0, 0.0, 0.0), 1.0);

        assert_eq!(mesh.brace_operands(), Ok((12..24, 24..36)));
        assert_eq!(mesh.close_brace(), Ok(BraceCursor { vertex: 48, triangle: 24 }));
        assert_eq!(mesh.brace_operands(), Ok((0..12, 12..36)));
        assert!(mesh.close_brace().is_ok());
        assert_eq!(mesh.close_brace(), Err(CsgError::UnbalancedBraces));
    }
}
