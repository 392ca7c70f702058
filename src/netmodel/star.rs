//! Alternative net models (`net_model` ∈ {1, 2, 3}): moveable star, clique
//! (a.k.a. HPWL), and the star/HPWL threshold crossover.
//!
//! Each builds into the same per-axis weighted B2B-compatible
//! `SparseSystem` so all four `net_model` values share one CG pipeline.

use crate::circuit::{Axis, Circuit, NetPin};
use crate::solver::SparseSystem;

fn axis_coord(axis: Axis, x: f64, y: f64) -> f64 {
    if axis == Axis::X {
        x
    } else {
        y
    }
}

fn moveable_cells(circuit: &Circuit, pins: &[NetPin]) -> usize {
    pins.iter()
        .filter(|p| circuit.cells[p.cell].is_movable())
        .count()
}

/// A net is decomposed with the star model if it has at least
/// `crossover_threshold` moveable pins (2 at minimum, since a net with one
/// moveable pin has nothing to triangulate against). `crossover_threshold =
/// 0` means "always star once there's more than one moveable pin", giving
/// the pure `NetModel::Star` behavior.
fn use_star(moveable: usize, crossover_threshold: usize) -> bool {
    moveable >= 2 && moveable >= crossover_threshold.max(2)
}

/// Count how many nets the star/threshold-crossover builder will assign a
/// synthetic star unknown to, so the caller can size the system up front.
pub fn count_star_nets(
    circuit: &Circuit,
    net_ignore_threshold: usize,
    crossover_threshold: usize,
) -> usize {
    circuit
        .nets
        .iter()
        .filter(|n| {
            let p = n.pin_count();
            p >= 2 && p < net_ignore_threshold
        })
        .filter(|n| use_star(moveable_cells(circuit, &n.pins), crossover_threshold))
        .count()
}

/// Build the clique (HPWL) model: every pin pair in a net is linked
/// directly, with uniform weight `w / (p - 1)` (no distance weighting,
/// unlike B2B — this is the classic clique/HPWL quadratic net model).
pub fn build_clique(
    circuit: &Circuit,
    axis: Axis,
    _eps: f64,
    net_ignore_threshold: usize,
    system: &mut SparseSystem,
) {
    for net in circuit.nets.iter() {
        let p = net.pin_count();
        if p < 2 || p >= net_ignore_threshold {
            continue;
        }
        let weight = net.inv_p_weight();
        link_clique(circuit, axis, &net.pins, weight, system);
    }
}

fn link_clique(
    circuit: &Circuit,
    axis: Axis,
    pins: &[NetPin],
    weight: f64,
    system: &mut SparseSystem,
) {
    for i in 0..pins.len() {
        for k in (i + 1)..pins.len() {
            let (a, b) = (pins[i], pins[k]);
            if a.cell == b.cell {
                continue;
            }
            let a_movable = circuit.cells[a.cell].is_movable();
            let b_movable = circuit.cells[b.cell].is_movable();
            if !a_movable && !b_movable {
                continue;
            }
            let (ax, ay) = circuit.pin_abs(a);
            let (bx, by) = circuit.pin_abs(b);
            let (aox, aoy) = circuit.pin_offset(a);
            let (box_, boy) = circuit.pin_offset(b);
            let a_off = axis_coord(axis, aox, aoy);
            let b_off = axis_coord(axis, box_, boy);
            let a_loc = axis_coord(axis, ax, ay);
            let b_loc = axis_coord(axis, bx, by);

            match (a_movable, b_movable) {
                (false, true) => {
                    system.add_diag(b.cell, weight);
                    system.add_b(b.cell, (a_loc - b_off) * weight);
                }
                (true, false) => {
                    system.add_diag(a.cell, weight);
                    system.add_b(a.cell, (b_loc - a_off) * weight);
                }
                (true, true) => {
                    system.add_diag(a.cell, weight);
                    system.add_diag(b.cell, weight);
                    system.add_off_diag_symmetric(a.cell, b.cell, -weight);
                    let diff = (b_off - a_off) * weight;
                    system.add_b(a.cell, diff);
                    system.add_b(b.cell, -diff);
                }
                (false, false) => unreachable!(),
            }
        }
    }
}

/// Build the moveable-star model: every net with ≥2 moveable pins gets one
/// synthetic star unknown (index `base_system_size(circuit) + star_index`)
/// that all of the net's pins connect to with weight `w / moveable_cells`.
/// Nets with exactly one moveable pin fall back to a direct clique link,
/// since a star with a single moveable endpoint is just that link with
/// extra bookkeeping.
pub fn build_star(
    circuit: &Circuit,
    axis: Axis,
    _eps: f64,
    net_ignore_threshold: usize,
    crossover_threshold: usize,
    system: &mut SparseSystem,
) {
    build_threshold_crossover(
        circuit,
        axis,
        _eps,
        net_ignore_threshold,
        crossover_threshold,
        system,
    )
}

/// Build the star/HPWL threshold crossover: nets with fewer moveable pins
/// than `crossover_threshold` use the clique model, the rest use the star
/// model. `crossover_threshold = 0` recovers the pure star model (every
/// multi-moveable-pin net is a star).
pub fn build_threshold_crossover(
    circuit: &Circuit,
    axis: Axis,
    _eps: f64,
    net_ignore_threshold: usize,
    crossover_threshold: usize,
    system: &mut SparseSystem,
) {
    let base = circuit.cells.len();
    let mut next_star_idx = 0usize;

    for net in circuit.nets.iter() {
        let p = net.pin_count();
        if p < 2 || p >= net_ignore_threshold {
            continue;
        }
        let moveable = moveable_cells(circuit, &net.pins);
        if moveable == 0 {
            continue;
        }

        if use_star(moveable, crossover_threshold) {
            let star_idx = base + next_star_idx;
            next_star_idx += 1;
            let weight = net.weight / (moveable as f64);

            for &pin in &net.pins {
                let (x, y) = circuit.pin_abs(pin);
                let loc = axis_coord(axis, x, y);
                if circuit.cells[pin.cell].is_movable() {
                    system.add_diag(pin.cell, weight);
                    system.add_diag(star_idx, weight);
                    system.add_off_diag_symmetric(pin.cell, star_idx, -weight);
                } else {
                    system.add_diag(star_idx, weight);
                    system.add_b(star_idx, loc * weight);
                }
            }
        } else {
            let weight = net.inv_p_weight();
            link_clique(circuit, axis, &net.pins, weight, system);
        }
    }
}
