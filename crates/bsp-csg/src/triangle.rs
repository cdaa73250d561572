//! Triangle geometry shared by the tree and the classifier.

use nalgebra::{Point3, Vector3};

/// A triangle in 3D space, defined by three vertices.
///
/// The winding order determines the normal direction via the right-hand rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    vertices: [Point3<f32>; 3],
}

impl Triangle {
    /// Computes the (unnormalized) normal vector of the triangle.
    ///
    /// Its length is twice the triangle's area.
    pub fn normal(&self) -> Vector3<f32> {
        let [a, b, c] = &self.vertices;
        (b - a).cross(&(c - a))
    }

    /// Area of the triangle.
    pub fn area(&self) -> f32 {
        self.normal().norm() * 0.5
    }

    /// Computes the centroid (center of mass) of the triangle.
    pub fn centroid(&self) -> Point3<f32> {
        let [a, b, c] = &self.vertices;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }
}

impl From<[Point3<f32>; 3]> for Triangle {
    fn from(vertices: [Point3<f32>; 3]) -> Self {
        Self { vertices }
    }
}

/// Returns `true` if any two of the three points are closer than `epsilon`.
///
/// Such slivers are never inserted into a tree: splitting one again can
/// produce a cut point on top of an existing corner, forever.
pub(crate) fn corners_coincide(points: &[Point3<f32>; 3], epsilon: f32) -> bool {
    (0..3).any(|i| (points[i] - points[(i + 1) % 3]).norm() < epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Triangle {
        Triangle::from([Point3::from(a), Point3::from(b), Point3::from(c)])
    }

    #[test]
    fn area_and_normal() {
        let t = tri([0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]);
        assert!((t.area() - 2.0).abs() < 1e-6);
        assert!((t.normal().normalize() - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn centroid_is_average() {
        let t = tri([0.0, 0.0, 0.0], [3.0, 0.0, 0.0], [0.0, 3.0, 3.0]);
        assert_eq!(t.centroid(), Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn collinear_triangle_has_no_area() {
        let collinear = tri([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]);
        assert_eq!(collinear.area(), 0.0);
    }

    #[test]
    fn coincident_corners() {
        let collinear = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(!corners_coincide(&collinear, 1e-4));

        let sliver = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.00001, 0.0),
        ];
        assert!(corners_coincide(&sliver, 1e-4));
    }
}
