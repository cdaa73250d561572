//! Binary Space Partitioning tree over triangles.
//!
//! A tree is built from one operand's triangles and then answers, for
//! triangles of the other operand, which parts lie in front of and which
//! behind the surface it encodes:
//!
//! - [`BspTree::insert_triangle`] merges triangles one at a time, splitting
//!   them at the planes they cross;
//! - [`BspTree::classify_triangle`] splits a foreign triangle where it meets
//!   the stored geometry and tags every fragment `Front` or `Back`;
//! - front-to-back and back-to-front traversals hand the stored triangles to
//!   a [`BspVisitor`] in viewing order.
//!
//! # Example
//!
//! ```ignore
//! use bsp_csg::{BspTree, CSG_EPSILON};
//! use bsp_csg::bsp::CollectingVisitor;
//! use nalgebra::Point3;
//!
//! let mut tree = BspTree::new();
//! for (id, triangle) in operand.iter().enumerate() {
//!     tree.insert_triangle(id, *triangle, CSG_EPSILON);
//! }
//!
//! let result = tree.classify_triangle(query, CSG_EPSILON)?;
//! for fragment in &result.triangles {
//!     println!("{:?}: {:?}", fragment.side, result.positions(fragment));
//! }
//!
//! // Painter's order
//! let mut visitor = CollectingVisitor::new();
//! tree.traverse_back_to_front(Point3::new(0.0, 0.0, 10.0), CSG_EPSILON, &mut visitor);
//! ```
//!
//! # Architecture
//!
//! - [`BspTree`]: arena of [`PartitionNode`]s addressed by [`NodeIndex`]
//! - [`PartitionNode`]: a splitting plane plus the triangles lying on it
//! - [`TriangleClassification`]: fragments and split vertices of one query
//! - [`BspVisitor`]: visitor trait for custom traversal behavior

mod node;
mod query;
mod split;
mod tree;
mod visitor;

pub use node::{CoplanarTriangle, NodeIndex, PartitionNode};
pub use query::{
    ClassifiedTriangle, EdgeProvenance, Facing, FragmentSide, SplitVertex, TriangleClassification,
};
pub use tree::{BspTree, PointLocation};
pub use visitor::{BspVisitor, CollectingVisitor, FnVisitor};
