//! Constructive solid geometry on triangle soups, driven by BSP trees.
//!
//! Two disjoint triangle ranges of a [`MeshSoup`] are combined in place with
//! one of the [`CsgOperator`]s, either directly with [`combine`] or through
//! the mesh's brace cursors ([`MeshSoup::csg`]).

pub mod bsp;
mod csg;
mod error;
pub mod intersect;
mod mesh;
mod options;
mod plane;
mod triangle;
mod vertex;

#[cfg(test)]
mod fixtures;

pub use bsp::{BspTree, ClassifiedTriangle, FragmentSide, NodeIndex, SplitVertex, TriangleClassification};
pub use csg::{CsgOperator, CsgReport, combine};
pub use error::{CsgError, Operand};
pub use mesh::{BraceCursor, CleanupStats, MeshSoup};
pub use options::{CLEANUP_EPSILON, CLEANUP_EPSILON_ENV, CSG_EPSILON, CsgOptions, EPSILON_ENV};
pub use plane::{Classification, CornerSides, PartitionPlane, PlaneSide, Side};
pub use triangle::Triangle;
pub use vertex::VertexRecord;
