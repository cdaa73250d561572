//! Full vertex records stored in a [`MeshSoup`](crate::MeshSoup).

use nalgebra::{Point3, Vector2, Vector3, Vector4};

/// A mesh vertex: position plus the attributes carried through splitting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexRecord {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    /// RGBA
    pub color: Vector4<f32>,
    /// Up to four texture coordinates. Two-component texcoords use `xy`.
    pub texcoord: Vector4<f32>,
}

impl VertexRecord {
    /// Creates a white vertex with a zero texcoord.
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self {
            position,
            normal,
            color: Vector4::new(1.0, 1.0, 1.0, 1.0),
            texcoord: Vector4::zeros(),
        }
    }

    /// Sets the vertex color.
    pub fn with_color(mut self, color: Vector4<f32>) -> Self {
        self.color = color;
        self
    }

    /// Sets a two-component texcoord.
    pub fn with_uv(mut self, uv: Vector2<f32>) -> Self {
        self.texcoord = Vector4::new(uv.x, uv.y, 0.0, 0.0);
        self
    }

    /// Component-wise linear interpolation: `a` at `alpha = 0`, `b` at `alpha = 1`.
    pub fn lerp(a: &VertexRecord, b: &VertexRecord, alpha: f32) -> VertexRecord {
        VertexRecord {
            position: a.position + (b.position - a.position) * alpha,
            normal: a.normal.lerp(&b.normal, alpha),
            color: a.color.lerp(&b.color, alpha),
            texcoord: a.texcoord.lerp(&b.texcoord, alpha),
        }
    }

    /// Normalizes the normal in place, leaving (near) zero normals untouched.
    pub fn renormalize(&mut self) {
        if let Some(normal) = self.normal.try_normalize(f32::EPSILON) {
            self.normal = normal;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_is_component_wise() {
        let a = VertexRecord::new(Point3::new(0.0, 0.0, 0.0), Vector3::x())
            .with_color(Vector4::new(1.0, 0.0, 0.0, 1.0))
            .with_uv(Vector2::new(0.0, 0.0));
        let b = VertexRecord::new(Point3::new(4.0, 2.0, 0.0), Vector3::y())
            .with_color(Vector4::new(0.0, 0.0, 1.0, 1.0))
            .with_uv(Vector2::new(1.0, 0.5));

        let mid = VertexRecord::lerp(&a, &b, 0.25);
        assert_eq!(mid.position, Point3::new(1.0, 0.5, 0.0));
        assert_eq!(mid.normal, Vector3::new(0.75, 0.25, 0.0));
        assert_eq!(mid.color, Vector4::new(0.75, 0.0, 0.25, 1.0));
        assert_eq!(mid.texcoord, Vector4::new(0.25, 0.125, 0.0, 0.0));
    }

    #[test]
    fn lerp_endpoints() {
        let a = VertexRecord::new(Point3::new(1.0, 2.0, 3.0), Vector3::z());
        let b = VertexRecord::new(Point3::new(-1.0, 0.0, 5.0), Vector3::x());
        assert_eq!(VertexRecord::lerp(&a, &b, 0.0), a);
        assert_eq!(VertexRecord::lerp(&a, &b, 1.0), b);
    }

    #[test]
    fn renormalize_skips_zero_normals() {
        let mut v = VertexRecord::new(Point3::origin(), Vector3::new(0.0, 3.0, 4.0));
        v.renormalize();
        assert!((v.normal.norm() - 1.0).abs() < 1e-6);

        let mut zero = VertexRecord::new(Point3::origin(), Vector3::zeros());
        zero.renormalize();
        assert_eq!(zero.normal, Vector3::zeros());
    }
}
