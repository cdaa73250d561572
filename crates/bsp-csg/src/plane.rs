//! Partition planes and the point classifier.

use nalgebra::{Point3, Vector3};

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

impl PlaneSide {
    /// The half-space this side selects, or `None` for [`PlaneSide::OnPlane`].
    #[inline]
    pub fn half_space(self) -> Option<Side> {
        match self {
            PlaneSide::Front => Some(Side::Front),
            PlaneSide::Back => Some(Side::Back),
            PlaneSide::OnPlane => None,
        }
    }
}

/// One of the two half-spaces of a partition plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Front,
    Back,
}

impl Side {
    /// The other half-space.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }
}

impl From<Side> for PlaneSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Front => PlaneSide::Front,
            Side::Back => PlaneSide::Back,
        }
    }
}

/// Classification of a triangle relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No corner behind, at least one in front
    Front,
    /// No corner in front, at least one behind
    Back,
    /// All corners on the plane
    Coplanar,
    /// Corners strictly on both sides
    Spanning,
}

/// Per-corner sides of a triangle against one plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerSides {
    pub sides: [PlaneSide; 3],
    pub front: usize,
    pub back: usize,
}

impl CornerSides {
    /// Overall classification. On-plane corners count toward neither side.
    pub fn classification(&self) -> Classification {
        match (self.front > 0, self.back > 0) {
            (true, true) => Classification::Spanning,
            (true, false) => Classification::Front,
            (false, true) => Classification::Back,
            (false, false) => Classification::Coplanar,
        }
    }
}

/// A partition plane: every point `p` with `dot(p - origin, normal) ≈ 0`.
///
/// Unlike a `normal · p = offset` plane, the origin is kept because the
/// classifier measures the *direction* from the origin to the tested point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionPlane {
    origin: Point3<f32>,
    normal: Vector3<f32>,
}

impl PartitionPlane {
    /// Creates a plane through `origin`. The normal is normalized.
    ///
    /// Returns `None` if the normal has (near) zero length.
    pub fn new(origin: Point3<f32>, normal: Vector3<f32>) -> Option<Self> {
        let normal = normal.try_normalize(f32::EPSILON)?;
        Some(Self { origin, normal })
    }

    /// Plane of the triangle `(a, b, c)`, anchored at `a`.
    ///
    /// The normal is `normalize(cross(b - a, c - b))`, so it follows the
    /// triangle's winding. Returns `None` for degenerate triangles.
    pub fn from_triangle(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Option<Self> {
        Self::new(a, (b - a).cross(&(c - b)))
    }

    /// The point the plane is anchored at.
    #[inline]
    pub fn origin(&self) -> Point3<f32> {
        self.origin
    }

    /// The unit normal of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Same plane, anchored at another point.
    #[inline]
    pub fn anchored_at(&self, origin: Point3<f32>) -> Self {
        Self {
            origin,
            normal: self.normal,
        }
    }

    /// Signed distance from a point to the plane.
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        (point - self.origin).dot(&self.normal)
    }

    /// Classifies which side of the plane a point lies on.
    ///
    /// Points closer than `epsilon` to the origin are on the plane. Otherwise
    /// the cosine between `point - origin` and the normal is compared against
    /// `±epsilon`, so the tolerance is angular rather than a distance.
    pub fn classify_point(&self, point: Point3<f32>, epsilon: f32) -> PlaneSide {
        let to_point = point - self.origin;
        let length = to_point.norm();
        if length < epsilon {
            return PlaneSide::OnPlane;
        }

        let cosine = (to_point / length).dot(&self.normal);
        if cosine > epsilon {
            PlaneSide::Front
        } else if cosine < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// Classifies the three corners of a triangle.
    pub fn classify_corners(&self, corners: &[Point3<f32>; 3], epsilon: f32) -> CornerSides {
        let sides = corners.map(|corner| self.classify_point(corner, epsilon));
        let front = sides.iter().filter(|s| **s == PlaneSide::Front).count();
        let back = sides.iter().filter(|s| **s == PlaneSide::Back).count();
        CornerSides { sides, front, back }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn ground() -> PartitionPlane {
        PartitionPlane::new(Point3::origin(), Vector3::new(0.0, 2.0, 0.0)).unwrap()
    }

    #[test]
    fn new_normalizes_and_rejects_zero() {
        let plane = ground();
        assert!((plane.normal().norm() - 1.0).abs() < 1e-6);
        assert!(PartitionPlane::new(Point3::origin(), Vector3::zeros()).is_none());
    }

    #[test]
    fn from_triangle_follows_winding() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let plane = PartitionPlane::from_triangle(a, b, c).unwrap();
        assert!((plane.normal() - Vector3::z()).norm() < 1e-6);

        let flipped = PartitionPlane::from_triangle(a, c, b).unwrap();
        assert!((flipped.normal() + Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn from_triangle_rejects_collinear() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        assert!(PartitionPlane::from_triangle(a, b, c).is_none());
    }

    #[test]
    fn classify_point_sides() {
        let plane = ground();
        assert_eq!(plane.classify_point(Point3::new(3.0, 1.0, 0.0), EPS), PlaneSide::Front);
        assert_eq!(plane.classify_point(Point3::new(0.0, -0.5, 7.0), EPS), PlaneSide::Back);
        assert_eq!(plane.classify_point(Point3::new(5.0, 0.0, 5.0), EPS), PlaneSide::OnPlane);
    }

    #[test]
    fn classify_point_near_origin_is_on_plane() {
        let plane = ground();
        assert_eq!(plane.classify_point(Point3::new(0.0, 5e-5, 0.0), EPS), PlaneSide::OnPlane);
    }

    #[test]
    fn classify_point_tolerance_is_angular() {
        let plane = ground();
        // 1e-3 above the plane but 100 units away: cosine is 1e-5, below epsilon.
        assert_eq!(plane.classify_point(Point3::new(100.0, 1e-3, 0.0), EPS), PlaneSide::OnPlane);
        // Same height close to the origin is clearly in front.
        assert_eq!(plane.classify_point(Point3::new(0.01, 1e-3, 0.0), EPS), PlaneSide::Front);
    }

    #[test]
    fn classify_corners_counts() {
        let plane = ground();
        let corners = [
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
        ];
        let result = plane.classify_corners(&corners, EPS);
        assert_eq!(result.sides, [PlaneSide::Front, PlaneSide::OnPlane, PlaneSide::Back]);
        assert_eq!((result.front, result.back), (1, 1));
        assert_eq!(result.classification(), Classification::Spanning);
    }

    #[test]
    fn classification_ignores_on_plane_corners() {
        let plane = ground();
        let corners = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        assert_eq!(plane.classify_corners(&corners, EPS).classification(), Classification::Front);

        let flat = [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
        ];
        assert_eq!(plane.classify_corners(&flat, EPS).classification(), Classification::Coplanar);
    }

    #[test]
    fn side_round_trip() {
        assert_eq!(PlaneSide::from(Side::Front).half_space(), Some(Side::Front));
        assert_eq!(Side::Back.opposite(), Side::Front);
        assert_eq!(PlaneSide::OnPlane.half_space(), None);
    }
}
