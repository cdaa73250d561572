//! Shared visualization utilities for the CSG viewer.

use std::hash::{Hash, Hasher};
use std::ops::Range;

use bsp_csg::bsp::{BspVisitor, CoplanarTriangle};
use bsp_csg::{BspTree, CsgError, CsgOperator, CsgOptions, CsgReport, MeshSoup, NodeIndex};
use macroquad::models::{draw_mesh, Mesh, Vertex};
use macroquad::prelude::*;
use nalgebra::{Point3, Vector3, Vector4};

pub mod navigator;
pub use navigator::TreeNavigator;

/// Triangles per macroquad mesh; keeps indices within `u16`.
const TRIANGLES_PER_BATCH: usize = 20_000;

/// Generates a deterministic color from a triangle's corners using hashing.
/// Fragments of the same stored triangle keep their color across frames.
pub fn triangle_color(corners: &[Point3<f32>; 3]) -> Color {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    for v in corners {
        v.x.to_bits().hash(&mut hasher);
        v.y.to_bits().hash(&mut hasher);
        v.z.to_bits().hash(&mut hasher);
    }
    let hash = hasher.finish();

    let r = (((hash >> 16) & 0xFF) as u8).max(40);
    let g = (((hash >> 8) & 0xFF) as u8).max(40);
    let b = ((hash & 0xFF) as u8).max(40);

    Color::from_rgba(r, g, b, 255)
}

fn to_vec3(p: Point3<f32>) -> Vec3 {
    vec3(p.x, p.y, p.z)
}

/// Lambert shading against a fixed light direction.
fn shade(color: Color, normal: Vector3<f32>) -> Color {
    let light = Vector3::new(0.4, 0.8, 0.45).normalize();
    let intensity = 0.35 + 0.65 * normal.dot(&light).max(0.0);
    Color::new(color.r * intensity, color.g * intensity, color.b * intensity, color.a)
}

/// Draws a batch of flat triangles as one macroquad mesh.
fn draw_batch(vertices: Vec<Vertex>) {
    if vertices.is_empty() {
        return;
    }
    let indices = (0..vertices.len() as u16).collect();
    draw_mesh(&Mesh {
        vertices,
        indices,
        texture: None,
    });
}

/// Draws every triangle of a soup, colored by its vertex colors and shaded
/// by its vertex normals.
pub fn draw_soup(mesh: &MeshSoup) {
    let mut batch = Vec::with_capacity(TRIANGLES_PER_BATCH * 3);
    for triangle in mesh.triangles() {
        for &index in triangle {
            let vertex = &mesh.vertices()[index];
            let c = vertex.color;
            let color = shade(Color::new(c.x, c.y, c.z, c.w), vertex.normal);
            batch.push(Vertex::new2(to_vec3(vertex.position), vec2(0.0, 0.0), color));
        }
        if batch.len() >= TRIANGLES_PER_BATCH * 3 {
            draw_batch(std::mem::take(&mut batch));
        }
    }
    draw_batch(batch);
}

/// Draws the edges of every triangle of a soup.
pub fn draw_soup_wireframe(mesh: &MeshSoup, color: Color) {
    for index in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle_positions(index).map(to_vec3);
        draw_line_3d(a, b, color);
        draw_line_3d(b, c, color);
        draw_line_3d(c, a, color);
    }
}

/// Draws one triangle stored in a tree node, with a color hashed from its corners.
pub fn draw_stored_triangle(triangle: &CoplanarTriangle) {
    let color = triangle_color(&triangle.vertices);
    let [a, b, c] = triangle.vertices.map(to_vec3);
    draw_batch(vec![
        Vertex::new2(a, vec2(0.0, 0.0), color),
        Vertex::new2(b, vec2(0.0, 0.0), color),
        Vertex::new2(c, vec2(0.0, 0.0), color),
    ]);
}

/// Visitor that renders the triangles stored in the visited nodes.
pub struct RenderVisitor;

impl BspVisitor for RenderVisitor {
    fn visit(&mut self, _node: NodeIndex, triangles: &[CoplanarTriangle]) {
        for triangle in triangles {
            draw_stored_triangle(triangle);
        }
    }
}

/// Appends a box to the soup and paints its vertices with one color.
/// Returns the range of the new triangles.
pub fn append_colored_box(mesh: &mut MeshSoup, center: Point3<f32>, half_extent: f32, color: Color) -> Range<usize> {
    let first_vertex = mesh.vertex_count();
    let triangles = mesh.append_box(center, half_extent);
    let rgba = Vector4::new(color.r, color.g, color.b, color.a);
    for vertex in &mut mesh.vertices_mut()[first_vertex..] {
        vertex.color = rgba;
    }
    triangles
}

/// Two overlapping cubes, the tree of the first one, and the outcome of
/// combining them with the selected operator.
pub struct Scene {
    options: CsgOptions,
    operands: MeshSoup,
    tree: BspTree,
    operator: CsgOperator,
    result: MeshSoup,
    report: Result<CsgReport, CsgError>,
}

impl Scene {
    /// Cube A at the origin and cube B offset along the diagonal, each
    /// behind its own brace.
    pub fn new(operator: CsgOperator, options: CsgOptions) -> Self {
        let mut operands = MeshSoup::new();
        operands.open_brace();
        let operand_a = append_colored_box(&mut operands, Point3::origin(), 4.0, Color::new(0.9, 0.3, 0.25, 1.0));
        operands.open_brace();
        append_colored_box(&mut operands, Point3::new(2.5, 2.0, 1.5), 3.0, Color::new(0.25, 0.5, 0.9, 1.0));

        let tree = operands.build_tree(operand_a, options.epsilon);
        let (result, report) = combine_operands(&operands, operator, &options);
        Self {
            options,
            operands,
            tree,
            operator,
            result,
            report,
        }
    }

    /// Switches the operator and recombines. Returns true if it changed.
    pub fn set_operator(&mut self, operator: CsgOperator) -> bool {
        if operator == self.operator {
            return false;
        }
        self.operator = operator;
        (self.result, self.report) = combine_operands(&self.operands, operator, &self.options);
        true
    }

    pub fn operator(&self) -> CsgOperator {
        self.operator
    }

    pub fn operands(&self) -> &MeshSoup {
        &self.operands
    }

    pub fn result(&self) -> &MeshSoup {
        &self.result
    }

    pub fn report(&self) -> &Result<CsgReport, CsgError> {
        &self.report
    }

    pub fn tree(&self) -> &BspTree {
        &self.tree
    }

    pub fn epsilon(&self) -> f32 {
        self.options.epsilon
    }
}

/// Runs brace-driven CSG on a copy of the operands.
fn combine_operands(
    operands: &MeshSoup,
    operator: CsgOperator,
    options: &CsgOptions,
) -> (MeshSoup, Result<CsgReport, CsgError>) {
    let mut result = operands.clone();
    let report = result.csg(operator, options);
    (result, report)
}

/// Simple orbit camera for 3D scene navigation.
pub struct OrbitCamera {
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub target: Vec3,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitCamera {
    pub fn new(distance: f32, yaw: f32, pitch: f32) -> Self {
        Self {
            distance,
            yaw,
            pitch,
            target: vec3(0.0, 0.0, 0.0),
            zoom_speed: 1.5,
            min_distance: 4.0,
            max_distance: 80.0,
        }
    }

    /// Updates camera state from mouse drag, scroll and arrow keys.
    pub fn update(&mut self) {
        if is_mouse_button_down(MouseButton::Left) {
            let delta = mouse_delta_position();
            self.yaw -= delta.x * 2.0;
            self.pitch -= delta.y * 2.0;
        }

        let step = 0.02;
        if is_key_down(KeyCode::Left) {
            self.yaw += step;
        }
        if is_key_down(KeyCode::Right) {
            self.yaw -= step;
        }
        if is_key_down(KeyCode::Up) {
            self.pitch += step;
        }
        if is_key_down(KeyCode::Down) {
            self.pitch -= step;
        }
        self.pitch = self.pitch.clamp(-1.5, 1.5);

        self.distance = (self.distance - mouse_wheel().1 * self.zoom_speed)
            .clamp(self.min_distance, self.max_distance);
    }

    /// Returns the camera's world position.
    pub fn position(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target + self.distance * vec3(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw)
    }

    pub fn to_camera3d(&self) -> Camera3D {
        Camera3D {
            position: self.position(),
            up: vec3(0.0, 1.0, 0.0),
            target: self.target,
            ..Default::default()
        }
    }

    /// The eye point used for back-to-front tree traversal.
    pub fn eye_point(&self) -> Point3<f32> {
        let pos = self.position();
        Point3::new(pos.x, pos.y, pos.z)
    }
}
