//! Recursive box bisection (component H).
//!
//! Repeatedly splits a [`boxfinder::CellBox`] in two along whichever axis is
//! longer, choosing first a bin-grid cut line that roughly halves white
//! space (binary search over the white-space LUT) and then a continuous
//! cell-area cut line close to that bin boundary (binary search over cell
//! positions), until every box is small enough to hand to leaf placement.
//! Driven by an explicit FIFO queue rather than recursion so a box with a
//! huge cell count doesn't blow the call stack.

use std::collections::VecDeque;

use crate::circuit::{Axis, Circuit, Rect};
use crate::boxfinder::CellBox;
use crate::grid::{BinIndex, GridMesh};

/// A box small enough that no further bisection is useful: either it spans
/// a single bin, or it holds at most one row's worth of cells.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub rect: Rect,
    pub cells: Vec<usize>,
}

fn cut_axis(rect: Rect) -> Axis {
    if rect.width() >= rect.height() {
        Axis::X
    } else {
        Axis::Y
    }
}

/// Binary-search the bin index along `axis` whose white space on the "low"
/// side comes closest to half of the box's total white space, without
/// overshooting past it when possible.
fn bin_cut_index(mesh: &GridMesh, ll: BinIndex, ur: BinIndex, axis: Axis, total_white_space: f64) -> usize {
    let (lo, hi) = if axis == Axis::X { (ll.x, ur.x) } else { (ll.y, ur.y) };
    if lo >= hi {
        return lo;
    }

    let mut best_index = lo;
    let mut best_error = f64::MAX;
    for candidate in lo..hi {
        let cut_ur = if axis == Axis::X {
            BinIndex { x: candidate, y: ur.y }
        } else {
            BinIndex { x: ur.x, y: candidate }
        };
        let low_space = mesh.white_space_range(ll, cut_ur);
        let ratio = if total_white_space > 0.0 {
            low_space / total_white_space
        } else {
            0.0
        };
        let error = (ratio - 0.5).abs();
        if error < best_error {
            best_error = error;
            best_index = candidate;
        }
        if ratio > 0.5 {
            break;
        }
    }
    best_index
}

/// Binary-search (fixed 20-iteration budget) a continuous cut line along
/// `axis` so the cell area below it is close to `target_low_fraction` of
/// the box's total cell area.
fn cell_cut_line(
    circuit: &Circuit,
    cells: &[usize],
    axis: Axis,
    lo: f64,
    hi: f64,
    total_cell_area: f64,
    target_low_fraction: f64,
) -> f64 {
    let mut low = lo;
    let mut high = hi;
    let mut cut = (low + high) / 2.0;

    for _ in 0..20 {
        cut = (low + high) / 2.0;
        let area_low: f64 = cells
            .iter()
            .filter(|&&c| {
                let (cx, cy) = circuit.cell_center(c);
                (if axis == Axis::X { cx } else { cy }) < cut
            })
            .map(|&c| circuit.cell_area(c))
            .sum();

        let fraction = if total_cell_area > 0.0 {
            area_low / total_cell_area
        } else {
            0.0
        };
        if (fraction - target_low_fraction).abs() < 1e-9 {
            break;
        } else if fraction > target_low_fraction {
            high = cut;
        } else {
            low = cut;
        }
    }
    cut
}

/// Split cells into "low"/"high" halves around a continuous `cut` line on
/// `axis`.
fn split_cells(circuit: &Circuit, cells: &[usize], axis: Axis, cut: f64) -> (Vec<usize>, Vec<usize>) {
    let mut low = Vec::new();
    let mut high = Vec::new();
    for &c in cells {
        let (cx, cy) = circuit.cell_center(c);
        let pos = if axis == Axis::X { cx } else { cy };
        if pos < cut {
            low.push(c);
        } else {
            high.push(c);
        }
    }
    (low, high)
}

/// A box is a leaf once it covers a single grid bin — any smaller and there
/// is no white-space LUT granularity left to bisect against.
fn is_leaf_box(ll: BinIndex, ur: BinIndex) -> bool {
    ll.x == ur.x && ll.y == ur.y
}

/// Run recursive bisection over `root`, returning every leaf box reached.
pub fn bisect(circuit: &Circuit, mesh: &GridMesh, root: CellBox) -> Vec<Leaf> {
    let mut leaves = Vec::new();
    let mut queue: VecDeque<CellBox> = VecDeque::new();
    queue.push_back(root);

    while let Some(box_bin) = queue.pop_front() {
        if is_leaf_box(box_bin.ll, box_bin.ur) || box_bin.cells.len() <= 1 {
            leaves.push(Leaf {
                rect: box_bin.rect,
                cells: box_bin.cells,
            });
            continue;
        }

        let axis = cut_axis(box_bin.rect);
        let total_white_space = mesh.white_space_range(box_bin.ll, box_bin.ur);
        let total_cell_area: f64 = box_bin.cells.iter().map(|&c| circuit.cell_area(c)).sum();

        let bin_cut = bin_cut_index(mesh, box_bin.ll, box_bin.ur, axis, total_white_space);

        let (low_ll, low_ur, high_ll, high_ur) = if axis == Axis::X {
            (
                box_bin.ll,
                BinIndex { x: bin_cut, y: box_bin.ur.y },
                BinIndex { x: (bin_cut + 1).min(box_bin.ur.x), y: box_bin.ll.y },
                box_bin.ur,
            )
        } else {
            (
                box_bin.ll,
                BinIndex { x: box_bin.ur.x, y: bin_cut },
                BinIndex { x: box_bin.ll.x, y: (bin_cut + 1).min(box_bin.ur.y) },
                box_bin.ur,
            )
        };

        let low_white_space = mesh.white_space_range(low_ll, low_ur);
        let target_low_fraction = if total_white_space > 0.0 {
            low_white_space / total_white_space
        } else {
            0.5
        };

        let (lo, hi) = if axis == Axis::X {
            (box_bin.rect.left, box_bin.rect.right)
        } else {
            (box_bin.rect.bottom, box_bin.rect.top)
        };
        let cut_line = cell_cut_line(circuit, &box_bin.cells, axis, lo, hi, total_cell_area, target_low_fraction);
        let (cells_low, cells_high) = split_cells(circuit, &box_bin.cells, axis, cut_line);

        let low_rect = mesh.rect_of_range(low_ll, low_ur);
        let high_rect = mesh.rect_of_range(high_ll, high_ur);

        if cells_low.is_empty() || cells_high.is_empty() {
            // Degenerate split: cell distribution didn't actually straddle
            // the cut line (e.g. every cell clustered on one side). Treat
            // as a leaf rather than looping forever on an empty half.
            leaves.push(Leaf {
                rect: box_bin.rect,
                cells: box_bin.cells,
            });
            continue;
        }

        queue.push_back(CellBox {
            ll: low_ll,
            ur: low_ur,
            rect: low_rect,
            cells: cells_low,
        });
        queue.push_back(CellBox {
            ll: high_ll,
            ur: high_ur,
            rect: high_rect,
            cells: cells_high,
        });
    }

    leaves
}
