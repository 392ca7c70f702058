//! Leaf placement (component I).
//!
//! Once bisection has narrowed a region down to a leaf box, cells are
//! assigned to standard-cell rows and packed left-to-right within each row,
//! abutting rather than overlapping. Row assignment sorts cells by their
//! quadratic-solve y-coordinate (so cells that were already close together
//! vertically land in the same row) and splits them into `row_count` equal
//! shares; within a row cells are packed in x order.

use crate::bisect::Leaf;
use crate::circuit::Circuit;

/// Pack every cell in `leaf` into rows within `leaf.rect`, writing final
/// positions back into `circuit`. HPWL accounting is left to the caller,
/// which needs the whole circuit rather than just this leaf.
pub fn place_leaf(circuit: &mut Circuit, leaf: &Leaf, row_height: f64) {
    if leaf.cells.is_empty() {
        return;
    }

    let row_count = ((leaf.rect.height() / row_height).floor() as usize).max(1);
    let mut by_y = leaf.cells.clone();
    by_y.sort_unstable_by(|&a, &b| {
        let (_, ay) = circuit.cell_center(a);
        let (_, by) = circuit.cell_center(b);
        ay.total_cmp(&by)
    });

    let per_row = (by_y.len() + row_count - 1) / row_count;
    for (row_idx, chunk) in by_y.chunks(per_row.max(1)).enumerate() {
        let row_y = (leaf.rect.bottom + row_idx as f64 * row_height).min(leaf.rect.top - row_height.min(leaf.rect.height()));

        let mut row_cells = chunk.to_vec();
        row_cells.sort_unstable_by(|&a, &b| {
            let (ax, _) = circuit.cell_center(a);
            let (bx, _) = circuit.cell_center(b);
            ax.total_cmp(&bx)
        });

        let mut cursor = leaf.rect.left;
        for &cell_idx in &row_cells {
            if !circuit.cells[cell_idx].is_movable() {
                continue;
            }
            let width = circuit.cell_width(cell_idx);
            circuit.cells[cell_idx].x = cursor;
            circuit.cells[cell_idx].y = row_y.max(leaf.rect.bottom);
            cursor += width;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::circuit::{BlockType, Cell, Orientation, PinDef, PinPolarity, PlacementStatus, Rect};

    fn cells_circuit(positions: &[(f64, f64)]) -> Circuit {
        let block = BlockType {
            name: "CELL".into(),
            width: 2.0,
            height: 2.0,
            pins: vec![PinDef { offset_x: 1.0, offset_y: 1.0, polarity: PinPolarity::Load }],
        };
        let cells = positions
            .iter()
            .map(|&(x, y)| Cell {
                block_type: 0,
                x,
                y,
                status: PlacementStatus::Unplaced,
                orientation: Orientation::N,
            })
            .collect();
        Circuit {
            block_types: vec![block],
            cells,
            nets: Vec::new(),
            region: Rect { left: 0.0, bottom: 0.0, right: 20.0, top: 20.0 },
            row_height: 2.0,
            blockages: Vec::new(),
        }
    }

    #[test]
    fn packs_one_row_left_to_right_without_overlap() {
        let mut circuit = cells_circuit(&[(5.0, 1.0), (1.0, 1.0), (9.0, 1.0)]);
        let leaf = Leaf {
            rect: Rect { left: 0.0, bottom: 0.0, right: 20.0, top: 2.0 },
            cells: vec![0, 1, 2],
        };

        place_leaf(&mut circuit, &leaf, 2.0);

        let mut xs: Vec<f64> = (0..3).map(|i| circuit.cells[i].x).collect();
        xs.sort_by(f64::total_cmp);
        assert_eq!(xs, vec![0.0, 2.0, 4.0]);
        for i in 0..3 {
            assert_eq!(circuit.cells[i].y, 0.0);
        }
    }

    #[test]
    fn skips_non_movable_cells() {
        let mut circuit = cells_circuit(&[(5.0, 1.0)]);
        circuit.cells[0].status = PlacementStatus::Fixed;
        let leaf = Leaf {
            rect: Rect { left: 0.0, bottom: 0.0, right: 20.0, top: 2.0 },
            cells: vec![0],
        };

        place_leaf(&mut circuit, &leaf, 2.0);

        assert_eq!(circuit.cells[0].x, 5.0);
    }
}
