//! Splitting a spanning triangle along a partition plane.
//!
//! Shared by tree insertion (which works on positions) and triangle
//! classification (which works on vertex ids with provenance), so pieces
//! refer to corners symbolically.

use nalgebra::Point3;

use crate::{CornerSides, PartitionPlane, PlaneSide, Side};

/// A corner of a piece: either an original corner of the split triangle or
/// one of the new cut points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Corner {
    Original(usize),
    Cut(usize),
}

/// Where the plane crosses the edge `from → to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EdgeCut {
    pub from: usize,
    pub to: usize,
    pub alpha: f32,
    pub point: Point3<f32>,
}

/// One output triangle of a split, with the half-space it lies in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Piece {
    pub side: Side,
    pub corners: [Corner; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlaneSplit {
    pub cuts: Vec<EdgeCut>,
    pub pieces: Vec<Piece>,
}

impl PlaneSplit {
    /// Positions of a piece's corners.
    pub fn points(&self, corners: &[Point3<f32>; 3], piece: &Piece) -> [Point3<f32>; 3] {
        piece.corners.map(|corner| match corner {
            Corner::Original(i) => corners[i],
            Corner::Cut(i) => self.cuts[i].point,
        })
    }
}

/// Splits a triangle whose corners lie strictly on both sides of `plane`.
///
/// With no corner on the plane, the corner alone on its side gets a
/// triangle of its own and the remaining quad becomes two triangles: three
/// pieces. With one corner on the plane, a single edge is cut: two pieces.
/// Winding is preserved. A cut point within `epsilon` of an original corner
/// is replaced by that corner, which can leave pieces with coincident
/// corners; callers drop those.
///
/// Returns `None` unless `sides` is spanning.
pub(crate) fn split_triangle(
    plane: &PartitionPlane,
    corners: &[Point3<f32>; 3],
    sides: &CornerSides,
    epsilon: f32,
) -> Option<PlaneSplit> {
    if sides.front == 0 || sides.back == 0 {
        return None;
    }

    let side_of = |i: usize| sides.sides[i].half_space();
    let mut cuts = Vec::with_capacity(2);
    let mut cut = |from: usize, to: usize| -> Corner {
        let (alpha, point) = edge_crossing(plane, corners[from], corners[to]);
        if let Some(k) = (0..3).find(|&k| (corners[k] - point).norm() < epsilon) {
            return Corner::Original(k);
        }
        cuts.push(EdgeCut {
            from,
            to,
            alpha,
            point,
        });
        Corner::Cut(cuts.len() - 1)
    };

    let pieces = if let Some(k) = (0..3).find(|&i| sides.sides[i] == PlaneSide::OnPlane) {
        let (j, l) = ((k + 1) % 3, (k + 2) % 3);
        let (side_j, side_l) = (side_of(j)?, side_of(l)?);
        let c = cut(j, l);
        vec![
            Piece {
                side: side_j,
                corners: [Corner::Original(k), Corner::Original(j), c],
            },
            Piece {
                side: side_l,
                corners: [Corner::Original(k), c, Corner::Original(l)],
            },
        ]
    } else {
        let lonely = if sides.front == 1 { PlaneSide::Front } else { PlaneSide::Back };
        let k = (0..3).find(|&i| sides.sides[i] == lonely)?;
        let (j, l) = ((k + 1) % 3, (k + 2) % 3);
        let side_k = side_of(k)?;
        let c0 = cut(k, j);
        let c1 = cut(l, k);
        vec![
            Piece {
                side: side_k,
                corners: [Corner::Original(k), c0, c1],
            },
            Piece {
                side: side_k.opposite(),
                corners: [c0, Corner::Original(j), Corner::Original(l)],
            },
            Piece {
                side: side_k.opposite(),
                corners: [c0, Corner::Original(l), c1],
            },
        ]
    };

    Some(PlaneSplit { cuts, pieces })
}

/// Crossing of the plane by the edge `a → b`, whose ends lie strictly on
/// opposite sides.
fn edge_crossing(plane: &PartitionPlane, a: Point3<f32>, b: Point3<f32>) -> (f32, Point3<f32>) {
    let da = plane.signed_distance(a);
    let db = plane.signed_distance(b);
    let denom = da - db;
    let alpha = if denom.abs() > f32::EPSILON {
        (da / denom).clamp(0.0, 1.0)
    } else {
        0.5
    };
    (alpha, a + (b - a) * alpha)
}
