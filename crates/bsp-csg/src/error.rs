//! Error type for CSG operations.

use std::fmt;
use std::ops::Range;

/// Identifies one of the two operands of a combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// The first operand (`range_a`).
    A,
    /// The second operand (`range_b`).
    B,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::A => f.write_str("A"),
            Operand::B => f.write_str("B"),
        }
    }
}

/// Precondition failures reported by the CSG engine.
///
/// Numeric degeneracy never shows up here: near-coincident points and thin
/// slivers are absorbed by the epsilon policy. Every variant is detected
/// before the mesh is touched, so an error always means "nothing changed".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CsgError {
    /// A triangle was classified against a tree holding no partition node.
    #[error("cannot classify a triangle against an empty BSP tree")]
    EmptyTree,

    /// An operand range has no triangle, or only degenerate ones.
    #[error("operand {operand} has no usable triangle")]
    EmptyOperand { operand: Operand },

    /// An operand range reaches past the end of the mesh triangle list.
    #[error("operand {operand} range {range:?} exceeds the {len} triangles of the mesh")]
    RangeOutOfBounds {
        operand: Operand,
        range: Range<usize>,
        len: usize,
    },

    /// The two operand ranges share at least one triangle.
    #[error("operand ranges {a:?} and {b:?} overlap")]
    OverlappingOperands { a: Range<usize>, b: Range<usize> },

    /// Brace-driven CSG was requested without an open brace.
    #[error("brace-driven CSG needs at least one open brace")]
    UnbalancedBraces,
}
