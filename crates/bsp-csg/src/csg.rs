//! Boolean combination of two triangle ranges of one mesh.

use std::fmt;
use std::ops::Range;

use tracing::{debug, trace};

use crate::bsp::{Facing, FragmentSide, TriangleClassification};
use crate::error::{CsgError, Operand};
use crate::mesh::MeshSoup;
use crate::options::CsgOptions;
use crate::vertex::VertexRecord;
use crate::Side;

/// Boolean operator applied by [`combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CsgOperator {
    /// Outside of A plus outside of B.
    Union,
    /// Outside of A plus the inside of B, turned inside out.
    Subtract,
    /// Outside of A only; B is dropped entirely, leaving A open.
    SubtractLoss,
    /// Inside of A plus inside of B.
    And,
    /// Both shells kept; the parts inside the other operand are inverted.
    Xor,
}

impl CsgOperator {
    pub const ALL: [CsgOperator; 5] = [
        CsgOperator::Union,
        CsgOperator::Subtract,
        CsgOperator::SubtractLoss,
        CsgOperator::And,
        CsgOperator::Xor,
    ];

    /// Whether a fragment of `operand` on `side` of the other operand is removed.
    pub fn discards(self, operand: Operand, side: Side) -> bool {
        match self {
            CsgOperator::Union => side == Side::Back,
            CsgOperator::Subtract => match operand {
                Operand::A => side == Side::Back,
                Operand::B => side == Side::Front,
            },
            CsgOperator::SubtractLoss => operand == Operand::B || side == Side::Back,
            CsgOperator::And => side == Side::Front,
            CsgOperator::Xor => false,
        }
    }

    /// Whether a fragment of `operand` on `side` of the other operand is kept
    /// with reversed winding.
    pub fn inverts(self, operand: Operand, side: Side) -> bool {
        match self {
            CsgOperator::Subtract => operand == Operand::B && side == Side::Back,
            CsgOperator::Xor => side == Side::Back,
            _ => false,
        }
    }

    /// Whether a fragment of `operand` lying on the other operand's surface
    /// survives.
    ///
    /// Shared faces keep at most the copy from A: facing the same way it
    /// bounds the union and the intersection, facing the other way it bounds
    /// the difference.
    pub fn keeps_coplanar(self, operand: Operand, facing: Facing) -> bool {
        operand == Operand::A
            && match facing {
                Facing::Same => matches!(self, CsgOperator::Union | CsgOperator::And),
                Facing::Opposite => matches!(self, CsgOperator::Subtract | CsgOperator::SubtractLoss),
            }
    }

    /// Whether inverted fragments get their own vertices.
    pub fn detaches_inverted(self) -> bool {
        self == CsgOperator::Xor
    }
}

impl fmt::Display for CsgOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CsgOperator::Union => "union",
            CsgOperator::Subtract => "subtract",
            CsgOperator::SubtractLoss => "subtract-loss",
            CsgOperator::And => "and",
            CsgOperator::Xor => "xor",
        };
        f.write_str(name)
    }
}

/// What one [`combine`] did to the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CsgReport {
    /// Source triangles replaced by their fragments.
    pub split_triangles: usize,
    /// Fragments produced by classification, split or not.
    pub fragments: usize,
    /// Fragments left `Unresolved` by the walk and settled by sampling.
    pub unresolved: usize,
    /// Fragments lying on the other operand's surface.
    pub coplanar: usize,
    /// Triangles removed by the operator (and split sources).
    pub killed: usize,
    /// Triangles kept with reversed winding.
    pub inverted: usize,
    /// Degenerate triangles dropped by the cleanup pass.
    pub degenerate_removed: usize,
    /// Orphaned vertices dropped by the cleanup pass.
    pub vertices_removed: usize,
}

/// Replaces the triangles of `range_a` and `range_b` by their boolean
/// combination under `operator`.
///
/// Each operand is put in its own BSP tree, and every triangle of one operand
/// is classified against the other operand's tree. Split triangles are
/// removed and their fragments appended at the end of the mesh, with split
/// vertices interpolated from the corners they were cut between. The
/// operator then removes or inverts fragments depending on their side
/// ([`CsgOperator::discards`], [`CsgOperator::inverts`]), or on their facing
/// when they lie on the other operand's surface
/// ([`CsgOperator::keeps_coplanar`]). A final cleanup drops degenerate
/// triangles and unused vertices.
///
/// Triangle indices outside both ranges stay valid except where cleanup
/// removes a degenerate triangle.
///
/// # Errors
///
/// Fails, leaving the mesh untouched, when a range is out of bounds or
/// empty, when the ranges overlap, or when an operand holds only degenerate
/// triangles.
pub fn combine(
    mesh: &mut MeshSoup,
    range_a: Range<usize>,
    range_b: Range<usize>,
    operator: CsgOperator,
    options: &CsgOptions,
) -> Result<CsgReport, CsgError> {
    validate_range(mesh, &range_a, Operand::A)?;
    validate_range(mesh, &range_b, Operand::B)?;
    if range_a.start < range_b.end && range_b.start < range_a.end {
        return Err(CsgError::OverlappingOperands { a: range_a, b: range_b });
    }

    let tree_a = mesh.build_tree(range_a.clone(), options.epsilon);
    if tree_a.is_empty() {
        return Err(CsgError::EmptyOperand { operand: Operand::A });
    }
    let tree_b = mesh.build_tree(range_b.clone(), options.epsilon);
    if tree_b.is_empty() {
        return Err(CsgError::EmptyOperand { operand: Operand::B });
    }

    debug!(
        %operator,
        triangles_a = range_a.len(),
        triangles_b = range_b.len(),
        nodes_a = tree_a.len(),
        nodes_b = tree_b.len(),
        "combining operands"
    );

    let mut classified: Vec<(Operand, usize, TriangleClassification)> =
        Vec::with_capacity(range_a.len() + range_b.len());
    for (operand, range, other) in [(Operand::A, range_a, &tree_b), (Operand::B, range_b, &tree_a)] {
        for source in range {
            let result = other.classify_triangle(mesh.triangle_positions(source), options.epsilon)?;
            classified.push((operand, source, result));
        }
    }

    let mut report = CsgReport::default();
    let mut kill: Vec<usize> = Vec::new();

    for (operand, source, result) in classified {
        let first_new = mesh.triangle_count();
        if result.had_split {
            kill.push(source);
            report.split_triangles += 1;
            append_fragments(mesh, source, &result);
        }

        for (k, fragment) in result.triangles.iter().enumerate() {
            let target = if result.had_split { first_new + k } else { source };
            report.fragments += 1;
            if fragment.walked == FragmentSide::Unresolved {
                report.unresolved += 1;
            }

            if let Some(facing) = fragment.coplanar {
                report.coplanar += 1;
                if !operator.keeps_coplanar(operand, facing) {
                    kill.push(target);
                }
            } else if operator.discards(operand, fragment.side) {
                kill.push(target);
            } else if operator.inverts(operand, fragment.side) {
                mesh.invert_triangle(target, operator.detaches_inverted());
                report.inverted += 1;
            }
        }
    }

    report.killed = mesh.remove_triangles(kill);
    let cleanup = mesh.cleanup(options.cleanup_epsilon);
    report.degenerate_removed = cleanup.triangles_removed;
    report.vertices_removed = cleanup.vertices_removed;

    if options.recompute_normals {
        mesh.compute_normals(0..mesh.triangle_count());
    }

    debug!(
        %operator,
        split = report.split_triangles,
        fragments = report.fragments,
        unresolved = report.unresolved,
        killed = report.killed,
        inverted = report.inverted,
        "combination done"
    );
    Ok(report)
}

fn validate_range(mesh: &MeshSoup, range: &Range<usize>, operand: Operand) -> Result<(), CsgError> {
    let len = mesh.triangle_count();
    if range.end > len {
        return Err(CsgError::RangeOutOfBounds {
            operand,
            range: range.clone(),
            len,
        });
    }
    if range.is_empty() {
        return Err(CsgError::EmptyOperand { operand });
    }
    Ok(())
}

/// Appends the split vertices and fragments of triangle `source`.
///
/// Fragment vertex ids 0..3 are the source triangle's corners; later ids are
/// the split vertices, appended in order.
fn append_fragments(mesh: &mut MeshSoup, source: usize, result: &TriangleClassification) {
    let corners = mesh.triangle(source);
    let base = mesh.vertex_count();
    let resolve = move |id: usize| if id < 3 { corners[id] } else { base + id - 3 };

    for split in &result.vertices[3..] {
        let mut record = match split.provenance {
            Some(edge) => {
                VertexRecord::lerp(mesh.vertex(resolve(edge.from)), mesh.vertex(resolve(edge.to)), edge.alpha)
            }
            None => *mesh.vertex(corners[0]),
        };
        record.position = split.position;
        record.renormalize();
        mesh.add_vertex(record);
    }

    for fragment in &result.triangles {
        mesh.push_triangle_unchecked(fragment.vertices.map(resolve));
    }
    trace!(source, fragments = result.triangles.len(), "replaced split triangle");
}
