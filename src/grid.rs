//! Grid-bin density mesh (component E).
//!
//! Overlays the placement region with a square bin grid sized so each bin
//! holds roughly `number_of_cell_in_bin` average-sized cells, tracks cell
//! area and white space per bin, and exposes a 2-D prefix-sum lookup so a
//! bisection box can query white space over an arbitrary rectangular range
//! of bins in constant time.

use crate::circuit::{Axis, Circuit, Rect};
use crate::config::PlacerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinIndex {
    pub x: usize,
    pub y: usize,
}

#[derive(Debug, Clone)]
pub struct GridBin {
    pub index: BinIndex,
    pub rect: Rect,
    pub cell_area: f64,
    pub white_space: f64,
    pub cells: Vec<usize>,
    pub all_fixed: bool,
}

impl GridBin {
    pub fn filling_rate(&self) -> f64 {
        if self.white_space <= 0.0 {
            if self.cell_area > 0.0 {
                f64::INFINITY
            } else {
                0.0
            }
        } else {
            self.cell_area / self.white_space
        }
    }

    pub fn is_over_filled(&self, target: f64) -> bool {
        self.all_fixed || self.filling_rate() > target
    }
}

/// The density mesh and its derived white-space prefix sums.
pub struct GridMesh {
    pub nx: usize,
    pub ny: usize,
    pub bin_width: f64,
    pub bin_height: f64,
    pub bins: Vec<Vec<GridBin>>,
    /// Inclusive 2-D prefix sum of `white_space` over `bins[0..=x][0..=y]`.
    white_space_lut: Vec<Vec<f64>>,
}

impl GridMesh {
    /// Build the mesh over `circuit`'s region. Bin side length is chosen so
    /// each bin holds roughly `number_of_cell_in_bin` average-sized cells at
    /// the target filling rate: `side = sqrt(number_of_cell_in_bin *
    /// average_cell_area / target_filling_rate)`.
    pub fn build(circuit: &Circuit, config: &PlacerConfig) -> Self {
        let region = circuit.region;
        let avg_area = circuit.average_cell_area();
        let side = (config.number_of_cell_in_bin as f64 * avg_area / config.target_filling_rate)
            .sqrt()
            .max(1.0);

        let width = region.width().max(side);
        let height = region.height().max(side);
        let nx = (width / side).ceil().max(1.0) as usize;
        let ny = (height / side).ceil().max(1.0) as usize;
        let bin_width = width / nx as f64;
        let bin_height = height / ny as f64;

        let mut bins = Vec::with_capacity(nx);
        for x in 0..nx {
            let mut col = Vec::with_capacity(ny);
            for y in 0..ny {
                let rect = Rect {
                    left: region.left + x as f64 * bin_width,
                    right: region.left + (x + 1) as f64 * bin_width,
                    bottom: region.bottom + y as f64 * bin_height,
                    top: region.bottom + (y + 1) as f64 * bin_height,
                };
                col.push(GridBin {
                    index: BinIndex { x, y },
                    rect,
                    cell_area: 0.0,
                    white_space: rect.area(),
                    cells: Vec::new(),
                    all_fixed: false,
                });
            }
            bins.push(col);
        }

        let mut mesh = GridMesh {
            nx,
            ny,
            bin_width,
            bin_height,
            bins,
            white_space_lut: Vec::new(),
        };
        mesh.assign_cells(circuit);
        mesh.subtract_blockages(circuit);
        mesh.build_white_space_lut();
        mesh
    }

    fn bin_of(&self, x: f64, y: f64) -> BinIndex {
        let bx = ((x - self.bins[0][0].rect.left) / self.bin_width)
            .floor()
            .clamp(0.0, (self.nx - 1) as f64) as usize;
        let by = ((y - self.bins[0][0].rect.bottom) / self.bin_height)
            .floor()
            .clamp(0.0, (self.ny - 1) as f64) as usize;
        BinIndex { x: bx, y: by }
    }

    /// Assign every cell to the bin containing its center and accumulate
    /// that bin's occupied area. A cell whose footprint spans several bins
    /// is charged in full to its center bin rather than split proportionally
    /// across all overlapping bins, since bins are sized to be several times
    /// larger than an average cell.
    fn assign_cells(&mut self, circuit: &Circuit) {
        for (i, cell) in circuit.cells.iter().enumerate() {
            let (cx, cy) = circuit.cell_center(i);
            let idx = self.bin_of(cx, cy);
            let bin = &mut self.bins[idx.x][idx.y];
            bin.cells.push(i);
            bin.cell_area += circuit.cell_area(i);
            if !cell.is_movable() {
                bin.all_fixed = bin.cells.iter().all(|&c| !circuit.cells[c].is_movable());
            }
        }
    }

    /// Subtract placement blockages (and, implicitly, fixed cells already
    /// folded into `cell_area`) from each bin's white space.
    fn subtract_blockages(&mut self, circuit: &Circuit) {
        for col in self.bins.iter_mut() {
            for bin in col.iter_mut() {
                let mut occupied = 0.0;
                for blockage in &circuit.blockages {
                    occupied += bin.rect.overlap_area(blockage);
                }
                for &cell_idx in &bin.cells {
                    if !circuit.cells[cell_idx].is_movable() {
                        occupied += bin.rect.overlap_area(&circuit.cell_rect(cell_idx));
                    }
                }
                bin.white_space = (bin.rect.area() - occupied).max(0.0);
            }
        }
    }

    fn build_white_space_lut(&mut self) {
        let mut lut = vec![vec![0.0; self.ny]; self.nx];
        for x in 0..self.nx {
            for y in 0..self.ny {
                let left = if x > 0 { lut[x - 1][y] } else { 0.0 };
                let below = if y > 0 { lut[x][y - 1] } else { 0.0 };
                let diag = if x > 0 && y > 0 { lut[x - 1][y - 1] } else { 0.0 };
                lut[x][y] = self.bins[x][y].white_space + left + below - diag;
            }
        }
        self.white_space_lut = lut;
    }

    /// Total white space over the inclusive bin range `[ll, ur]`, queried
    /// via the 2-D prefix sum in O(1).
    pub fn white_space_range(&self, ll: BinIndex, ur: BinIndex) -> f64 {
        let ur_val = self.white_space_lut[ur.x][ur.y];
        let left = if ll.x > 0 {
            self.white_space_lut[ll.x - 1][ur.y]
        } else {
            0.0
        };
        let below = if ll.y > 0 {
            self.white_space_lut[ur.x][ll.y - 1]
        } else {
            0.0
        };
        let diag = if ll.x > 0 && ll.y > 0 {
            self.white_space_lut[ll.x - 1][ll.y - 1]
        } else {
            0.0
        };
        ur_val - left - below + diag
    }

    /// 4-neighbor adjacency, skipping out-of-range indices at the mesh edge.
    pub fn adjacent(&self, idx: BinIndex) -> Vec<BinIndex> {
        let mut out = Vec::with_capacity(4);
        if idx.x > 0 {
            out.push(BinIndex { x: idx.x - 1, y: idx.y });
        }
        if idx.x + 1 < self.nx {
            out.push(BinIndex { x: idx.x + 1, y: idx.y });
        }
        if idx.y > 0 {
            out.push(BinIndex { x: idx.x, y: idx.y - 1 });
        }
        if idx.y + 1 < self.ny {
            out.push(BinIndex { x: idx.x, y: idx.y + 1 });
        }
        out
    }

    pub fn bin(&self, idx: BinIndex) -> &GridBin {
        &self.bins[idx.x][idx.y]
    }

    /// Rectangle spanned by the inclusive bin range `[ll, ur]`.
    pub fn rect_of_range(&self, ll: BinIndex, ur: BinIndex) -> Rect {
        let ll_rect = self.bins[ll.x][ll.y].rect;
        let ur_rect = self.bins[ur.x][ur.y].rect;
        Rect {
            left: ll_rect.left,
            bottom: ll_rect.bottom,
            right: ur_rect.right,
            top: ur_rect.top,
        }
    }

    pub fn axis_bin_count(&self, axis: Axis) -> usize {
        if axis == Axis::X {
            self.nx
        } else {
            self.ny
        }
    }
}
