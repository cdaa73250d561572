//! Visitor pattern for BSP tree traversal.
//!
//! Visitors allow custom processing of stored triangles during tree traversal
//! without coupling traversal logic to specific use cases.

use super::node::{CoplanarTriangle, NodeIndex};

/// Visitor for processing triangles during BSP tree traversal.
///
/// Common uses include:
/// - Rendering (painter's algorithm)
/// - Collecting triangles in sorted order
pub trait BspVisitor {
    /// Called once per node that stores triangles, with that node's coplanar
    /// list in insertion order.
    fn visit(&mut self, node: NodeIndex, triangles: &[CoplanarTriangle]);
}

/// A simple visitor that collects all visited triangles.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    collected: Vec<CoplanarTriangle>,
}

impl CollectingVisitor {
    /// Creates a new empty collecting visitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected triangles.
    pub fn into_triangles(self) -> Vec<CoplanarTriangle> {
        self.collected
    }

    /// Returns a reference to the collected triangles.
    pub fn triangles(&self) -> &[CoplanarTriangle] {
        &self.collected
    }
}

impl BspVisitor for CollectingVisitor {
    fn visit(&mut self, _node: NodeIndex, triangles: &[CoplanarTriangle]) {
        self.collected.extend_from_slice(triangles);
    }
}

/// A visitor that calls a closure for each node's triangles.
pub struct FnVisitor<F>
where
    F: FnMut(NodeIndex, &[CoplanarTriangle]),
{
    func: F,
}

impl<F> FnVisitor<F>
where
    F: FnMut(NodeIndex, &[CoplanarTriangle]),
{
    /// Creates a new visitor from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> BspVisitor for FnVisitor<F>
where
    F: FnMut(NodeIndex, &[CoplanarTriangle]),
{
    fn visit(&mut self, node: NodeIndex, triangles: &[CoplanarTriangle]) {
        (self.func)(node, triangles);
    }
}
