//! Bound-to-bound (B2B) problem builder (component B).
//!
//! Each pin pairs only with its net's axis-extremal pins (not with every
//! other pin), which keeps non-zero count linear in pin count per net
//! rather than quadratic.

use crate::circuit::{Axis, Circuit};
use crate::solver::SparseSystem;

fn axis_coord(axis: Axis, x: f64, y: f64) -> f64 {
    if axis == Axis::X {
        x
    } else {
        y
    }
}

/// Build the B2B system for one axis into `system`. Does not pin fixed
/// cells or apply region centering — the caller
/// (`netmodel::build_base_system`/`quadratic`) does both so that they're
/// shared uniformly across net models.
pub fn build(
    circuit: &Circuit,
    axis: Axis,
    eps: f64,
    net_ignore_threshold: usize,
    system: &mut SparseSystem,
) {
    for (net_idx, net) in circuit.nets.iter().enumerate() {
        let p = net.pin_count();
        if p < 2 || p >= net_ignore_threshold {
            continue;
        }

        let (max_i, min_i) = circuit.extremal_pins(net_idx, axis);
        let inv_p = net.inv_p_weight();

        for i in 0..p {
            let pin_i = net.pins[i];
            let (xi, yi) = circuit.pin_abs(pin_i);
            let loc_i = axis_coord(axis, xi, yi);
            let (off_xi, off_yi) = circuit.pin_offset(pin_i);
            let offset_i = axis_coord(axis, off_xi, off_yi);

            for k in (i + 1)..p {
                // i pairs with (max, min) unless i is one of them, in which
                // case it pairs with every other pin.
                if i != max_i && i != min_i && k != max_i && k != min_i {
                    continue;
                }

                let pin_k = net.pins[k];
                if pin_i.cell == pin_k.cell {
                    continue;
                }
                let (xk, yk) = circuit.pin_abs(pin_k);
                let loc_k = axis_coord(axis, xk, yk);
                let (off_xk, off_yk) = circuit.pin_offset(pin_k);
                let offset_k = axis_coord(axis, off_xk, off_yk);

                let cell_i_movable = circuit.cells[pin_i.cell].is_movable();
                let cell_k_movable = circuit.cells[pin_k.cell].is_movable();
                if !cell_i_movable && !cell_k_movable {
                    continue;
                }

                let dist = (loc_i - loc_k).abs();
                let weight = inv_p / (dist + eps);

                match (cell_i_movable, cell_k_movable) {
                    (false, true) => {
                        system.add_diag(pin_k.cell, weight);
                        system.add_b(pin_k.cell, (loc_i - offset_k) * weight);
                    }
                    (true, false) => {
                        system.add_diag(pin_i.cell, weight);
                        system.add_b(pin_i.cell, (loc_k - offset_i) * weight);
                    }
                    (true, true) => {
                        system.add_diag(pin_i.cell, weight);
                        system.add_diag(pin_k.cell, weight);
                        system.add_off_diag_symmetric(pin_i.cell, pin_k.cell, -weight);
                        let diff_offset = (offset_k - offset_i) * weight;
                        system.add_b(pin_i.cell, diff_offset);
                        system.add_b(pin_k.cell, -diff_offset);
                    }
                    (false, false) => unreachable!(),
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::circuit::{BlockType, Cell, NetPin, Net, Orientation, PinDef, PinPolarity, PlacementStatus};
    use crate::solver::SparseSystem;

    fn two_cell_net_circuit() -> Circuit {
        let block = BlockType {
            name: "CELL".into(),
            width: 2.0,
            height: 2.0,
            pins: vec![PinDef { offset_x: 1.0, offset_y: 1.0, polarity: PinPolarity::Load }],
        };
        let cells = vec![
            Cell { block_type: 0, x: 0.0, y: 0.0, status: PlacementStatus::Unplaced, orientation: Orientation::N },
            Cell { block_type: 0, x: 10.0, y: 10.0, status: PlacementStatus::Unplaced, orientation: Orientation::N },
        ];
        let nets = vec![Net::new(vec![NetPin { cell: 0, pin: 0 }, NetPin { cell: 1, pin: 0 }], 1.0)];
        Circuit {
            block_types: vec![block],
            cells,
            nets,
            region: crate::circuit::Rect { left: 0.0, bottom: 0.0, right: 20.0, top: 20.0 },
            row_height: 2.0,
            blockages: Vec::new(),
        }
    }

    #[test]
    fn two_movable_pins_with_equal_offsets_have_no_pull_at_rest() {
        // Both pins sit at the same local offset, so once the cells coincide
        // the net's contribution to `b` is zero on both sides: a zero-offset
        // initial guess is already a fixed point of the solve.
        let circuit = two_cell_net_circuit();
        let mut system = SparseSystem::new(2, 8);
        build(&circuit, Axis::X, 0.01, 100, &mut system);

        let (x, stats) = system.cg_solve(&[0.0, 0.0], 100, 1e-12);
        assert!(stats.converged);
        assert_eq!(x, vec![0.0, 0.0]);
    }

    #[test]
    fn single_pin_net_contributes_nothing() {
        let mut circuit = two_cell_net_circuit();
        circuit.nets[0].pins.pop();
        let mut system = SparseSystem::new(2, 8);
        build(&circuit, Axis::X, 0.01, 100, &mut system);
        assert_eq!(system.len_triplets(), 0);
    }

    #[test]
    fn net_above_ignore_threshold_is_skipped() {
        let circuit = two_cell_net_circuit();
        let mut system = SparseSystem::new(2, 8);
        build(&circuit, Axis::X, 0.01, 2, &mut system);
        assert_eq!(system.len_triplets(), 0);
    }
}
