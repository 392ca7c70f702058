//! Anchor-augmented problem builder (component C).
//!
//! Adds one pseudo-edge per movable cell pulling it toward its last
//! legalized position, with a weight that grows over the outer iteration
//! schedule. Applied on top of whichever base net model
//! (`netmodel::build_base_system`) already populated the system — the
//! anchor term is additive, not a separate model.

use crate::circuit::{Axis, Circuit};
use crate::solver::SparseSystem;

/// The α growth schedule: `{0.005 for iter<5, 0.01 for iter<10, 0.02 for
/// iter<15, 0.03 thereafter}`, expressed as the schedule's
/// per-step target rather than an incremental "new = old + step" recurrence
/// — the two are equivalent for a monotonic step function sampled once per
/// outer iteration, and expressing it this way keeps the schedule
/// stateless, which matters once cg_iteration_max_num forces multiple inner
/// calls to reuse the same outer α.
pub fn alpha_for_iteration(outer_iter: usize) -> f64 {
    if outer_iter < 5 {
        0.005
    } else if outer_iter < 10 {
        0.01
    } else if outer_iter < 15 {
        0.02
    } else {
        0.03
    }
}

/// Add anchor pseudo-edges for every movable cell: weight `α / (|pos -
/// anchor| + ε)`, contributing `+w` to the cell's diagonal and `anchor * w`
/// to its `b` entry. `anchor` is indexed by cell, same length as
/// `circuit.cells`, holding the axis coordinate of each cell's center from
/// the previous legalization pass.
pub fn add_anchor_terms(
    circuit: &Circuit,
    axis: Axis,
    anchor: &[f64],
    alpha: f64,
    eps: f64,
    system: &mut SparseSystem,
) {
    for (i, cell) in circuit.cells.iter().enumerate() {
        if !cell.is_movable() {
            continue;
        }
        let (cx, cy) = circuit.cell_center(i);
        let pos = if axis == Axis::X { cx } else { cy };
        let dist = (pos - anchor[i]).abs();
        let weight = alpha / (dist + eps);
        system.add_diag(i, weight);
        system.add_b(i, anchor[i] * weight);
    }
}
