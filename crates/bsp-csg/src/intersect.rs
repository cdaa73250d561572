//! Exact-geometry intersection tests.
//!
//! The tree classifies against infinite planes; these tests tell whether the
//! finite triangles stored on a node actually meet the queried triangle.

use nalgebra::{Point3, Vector3};

/// Intersects the segment `start → start + direction` with a triangle.
///
/// Möller–Trumbore, with barycentric bounds and the segment parameter
/// widened by `epsilon` so hits on edges and endpoints are kept. All tests
/// are relative, so the result does not depend on the mesh scale.
pub fn segment_triangle(
    start: Point3<f32>,
    direction: Vector3<f32>,
    triangle: &[Point3<f32>; 3],
    epsilon: f32,
) -> Option<Point3<f32>> {
    let [v0, v1, v2] = triangle;
    let e1 = v1 - v0;
    let e2 = v2 - v0;

    let h = direction.cross(&e2);
    let det = e1.dot(&h);
    // Segment parallel to the triangle plane. `det` scales with the cube of
    // the mesh size, so the cutoff does too.
    if det.abs() < epsilon * direction.norm() * e1.norm() * e2.norm() {
        return None;
    }

    let inv_det = 1.0 / det;
    let to_start = start - v0;
    let u = inv_det * to_start.dot(&h);
    if u < -epsilon || u > 1.0 + epsilon {
        return None;
    }

    let q = to_start.cross(&e1);
    let v = inv_det * direction.dot(&q);
    if v < -epsilon || u + v > 1.0 + epsilon {
        return None;
    }

    let t = inv_det * e2.dot(&q);
    if t < -epsilon || t > 1.0 + epsilon {
        return None;
    }

    Some(v0 + e1 * u + e2 * v)
}

/// Computes the segment along which two triangles intersect.
///
/// Every edge of each triangle is tested against the other triangle; the
/// first two distinct hits are returned. Hits within `epsilon` of any of the
/// six corners are snapped onto that corner. Parallel (including coplanar)
/// triangles never intersect here.
pub fn triangle_triangle(
    first: &[Point3<f32>; 3],
    second: &[Point3<f32>; 3],
    epsilon: f32,
) -> Option<(Point3<f32>, Point3<f32>)> {
    let n0 = (first[1] - first[0]).cross(&(first[2] - first[1])).try_normalize(f32::EPSILON)?;
    let n1 = (second[1] - second[0]).cross(&(second[2] - second[1])).try_normalize(f32::EPSILON)?;
    if n0.cross(&n1).norm() < epsilon {
        return None;
    }

    let corners: Vec<Point3<f32>> = first.iter().chain(second.iter()).copied().collect();
    let mut hits: Vec<Point3<f32>> = Vec::with_capacity(2);

    for (edges, target) in [(first, second), (second, first)] {
        for i in 0..3 {
            if hits.len() == 2 {
                break;
            }
            let start = edges[i];
            let direction = edges[(i + 1) % 3] - start;
            let Some(mut hit) = segment_triangle(start, direction, target, epsilon) else {
                continue;
            };

            if let Some(corner) = corners.iter().find(|c| (hit - **c).norm() < epsilon) {
                hit = *corner;
            }

            if hits.first().is_none_or(|first_hit| (hit - first_hit).norm() > epsilon) {
                hits.push(hit);
            }
        }
    }

    match hits.as_slice() {
        [a, b] => Some((*a, *b)),
        _ => None,
    }
}
