//! Per-axis net decomposition strategies (component B/C/K).
//!
//! Every strategy here builds (contributes to) a [`crate::solver::SparseSystem`]
//! sized to the *whole* cell list (movable and fixed alike) plus any extra
//! per-net unknowns a strategy needs (the star model's synthetic nodes).
//! Fixed cells are pinned to their position by an identity row rather than
//! eliminated from the system — this keeps every strategy's bookkeeping in
//! terms of plain cell indices, with no separate "movable index"
//! renumbering to keep in sync.

pub mod anchor;
pub mod b2b;
pub mod star;

use crate::circuit::{Axis, Circuit};
use crate::config::NetModel;
use crate::solver::SparseSystem;

/// Pin every fixed (non-movable) cell to its current position with an
/// identity equation: `+1` on the diagonal, `b = fixed LL` on that axis.
/// Shared by every net model builder, regardless of which model built the
/// rest of the row.
pub fn pin_fixed_cells(circuit: &Circuit, axis: Axis, system: &mut SparseSystem) {
    for (i, cell) in circuit.cells.iter().enumerate() {
        if !cell.is_movable() {
            let ll = if axis == Axis::X { cell.x } else { cell.y };
            system.add_diag(i, 1.0);
            system.add_b(i, ll);
        }
    }
}

/// Size of the base system before any per-net-model extra unknowns: one
/// unknown per cell (movable and fixed).
pub fn base_system_size(circuit: &Circuit) -> usize {
    circuit.cells.len()
}

/// Build the per-axis quadratic system for the configured net model,
/// dispatching to B2B (default), star, clique/HPWL, or the star/HPWL
/// threshold crossover. Does not apply anchor terms or region centering —
/// callers add those afterward (see `quadratic::solve_axis`).
pub fn build_base_system(
    circuit: &Circuit,
    axis: Axis,
    eps: f64,
    net_ignore_threshold: usize,
    net_model: NetModel,
    star_crossover_threshold: usize,
) -> SparseSystem {
    match net_model {
        NetModel::B2B => {
            let mut system = SparseSystem::new(base_system_size(circuit), estimate_capacity(circuit));
            b2b::build(circuit, axis, eps, net_ignore_threshold, &mut system);
            pin_fixed_cells(circuit, axis, &mut system);
            system
        }
        NetModel::Hpwl => {
            let mut system = SparseSystem::new(base_system_size(circuit), estimate_capacity(circuit));
            star::build_clique(circuit, axis, eps, net_ignore_threshold, &mut system);
            pin_fixed_cells(circuit, axis, &mut system);
            system
        }
        NetModel::Star => {
            let n_stars = star::count_star_nets(circuit, net_ignore_threshold, 0);
            let mut system = SparseSystem::new(
                base_system_size(circuit) + n_stars,
                estimate_capacity(circuit),
            );
            star::build_star(circuit, axis, eps, net_ignore_threshold, 0, &mut system);
            pin_fixed_cells(circuit, axis, &mut system);
            system
        }
        NetModel::StarHpwl => {
            let n_stars =
                star::count_star_nets(circuit, net_ignore_threshold, star_crossover_threshold);
            let mut system = SparseSystem::new(
                base_system_size(circuit) + n_stars,
                estimate_capacity(circuit),
            );
            star::build_threshold_crossover(
                circuit,
                axis,
                eps,
                net_ignore_threshold,
                star_crossover_threshold,
                &mut system,
            );
            pin_fixed_cells(circuit, axis, &mut system);
            system
        }
    }
}

/// Estimate triplet capacity: `Σ(2(p-2)+1)*4` over nets, plus `2n` extra
/// entries for anchors and region-centering.
pub fn estimate_capacity(circuit: &Circuit) -> usize {
    let net_term: usize = circuit
        .nets
        .iter()
        .filter(|n| n.pin_count() >= 2)
        .map(|n| {
            let p = n.pin_count();
            let inner = if p >= 2 { 2 * (p.saturating_sub(2)) + 1 } else { 1 };
            inner * 4
        })
        .sum();
    net_term + 2 * circuit.cells.len()
}
