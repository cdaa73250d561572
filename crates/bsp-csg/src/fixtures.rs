//! Mesh builders shared by the unit tests.

use std::ops::Range;

use nalgebra::{Point3, Vector3};

use crate::{MeshSoup, VertexRecord};

/// Appends one triangle with its own three vertices, each carrying the face
/// normal. Returns the triangle index.
pub(crate) fn append_triangle(mesh: &mut MeshSoup, corners: [Point3<f32>; 3]) -> usize {
    let [a, b, c] = corners;
    let normal = (b - a).cross(&(c - a)).try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros);
    let ids = corners.map(|position| mesh.add_vertex(VertexRecord::new(position, normal)));
    mesh.add_triangle(ids)
}

/// Signed volume enclosed by a triangle range (positive for outward winding).
pub(crate) fn signed_volume(mesh: &MeshSoup, range: Range<usize>) -> f32 {
    range
        .map(|i| {
            let [a, b, c] = mesh.triangle_positions(i);
            a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
        })
        .sum()
}
