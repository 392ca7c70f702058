//! Read-only circuit data model: cells, pins, nets, and the placement region.
//!
//! The placer core never owns a [`Circuit`] for the lifetime of an
//! application — it borrows one for the duration of a `place()` call and
//! writes placement results back into it. Nets and pins are non-owning
//! back-references expressed as indices, following the flattened
//! ownership-graph style used throughout this crate (see module docs on
//! `solver` for why: it keeps the hot loops free of `Rc`/pointer chasing).

use serde::{Deserialize, Serialize};

/// One of the eight Manhattan orientations a cell's footprint may be placed
/// in. `N` (north, the identity orientation) is the only one exercised by
/// the end-to-end scenarios in this crate's test suite, but pin-offset
/// transforms are implemented for all eight so a caller feeding in placed
/// macros from a real flow gets correct pin locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    N,
    S,
    W,
    E,
    FN,
    FS,
    FW,
    FE,
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::N
    }
}

impl Orientation {
    /// Transform a pin offset `(dx, dy)` within a cell of size `(w, h)` from
    /// the cell's local (unrotated, unflipped) frame into the frame implied
    /// by this orientation.
    pub fn transform_offset(&self, dx: f64, dy: f64, w: f64, h: f64) -> (f64, f64) {
        match self {
            Orientation::N => (dx, dy),
            Orientation::S => (w - dx, h - dy),
            Orientation::W => (dy, w - dx),
            Orientation::E => (h - dy, dx),
            Orientation::FN => (w - dx, dy),
            Orientation::FS => (dx, h - dy),
            Orientation::FW => (dy, dx),
            Orientation::FE => (h - dy, w - dx),
        }
    }
}

/// Placement status of a cell. A cell is *movable* iff it is `Unplaced` or
/// `Placed`; `Fixed` and `Cover` cells act as coefficient-free constants in
/// the linear system (their position contributes only to the `b` vector of
/// whichever movable cell they connect to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementStatus {
    Unplaced,
    Placed,
    Fixed,
    Cover,
}

impl PlacementStatus {
    pub fn is_movable(&self) -> bool {
        matches!(self, PlacementStatus::Unplaced | PlacementStatus::Placed)
    }
}

/// Polarity of a pin, used only as metadata — the quadratic solver weights
/// all pins alike regardless of driver/load polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinPolarity {
    Driver,
    Load,
}

/// A single pin on a [`BlockType`], offset from the cell's lower-left
/// corner in the cell's unrotated local frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PinDef {
    pub offset_x: f64,
    pub offset_y: f64,
    pub polarity: PinPolarity,
}

/// Shape and pin geometry shared by every cell instance of a given type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockType {
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub pins: Vec<PinDef>,
}

impl BlockType {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// A single placeable instance: immutable identity (index into the
/// circuit's cell list, plus its [`BlockType`]) and mutable placement
/// state (lower-left corner, status, orientation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub block_type: usize,
    pub x: f64,
    pub y: f64,
    pub status: PlacementStatus,
    pub orientation: Orientation,
}

impl Cell {
    pub fn is_movable(&self) -> bool {
        self.status.is_movable()
    }
}

/// Axis selector used throughout the per-axis B2B/CG machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// One (cell, pin-index) edge of a [`Net`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NetPin {
    pub cell: usize,
    pub pin: usize,
}

/// An ordered list of pins connected by the same signal, with a
/// non-negative weight.
///
/// Axis-extremal pin indices are *not* cached on the net: they depend on
/// current cell positions and must be refreshed at the top of every B2B
/// build and never reused across axes, so `netmodel::b2b` recomputes them
/// fresh from a read-only `Circuit` borrow on every call (see
/// `Circuit::extremal_pins`) rather than carrying mutable cache fields that
/// would fight the borrow checker against the read-only circuit snapshot
/// the rest of the core holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    pub pins: Vec<NetPin>,
    pub weight: f64,
}

impl Net {
    pub fn new(pins: Vec<NetPin>, weight: f64) -> Self {
        Net { pins, weight }
    }

    /// Number of pins on this net. Nets with fewer than 2 pins contribute
    /// nothing to the quadratic model or to HPWL.
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// Inverse-p weighting factor `w / (p - 1)` used by the clique and B2B
    /// models. Undefined (and never called) for single-pin nets.
    pub fn inv_p_weight(&self) -> f64 {
        self.weight / ((self.pin_count() - 1) as f64)
    }
}

/// Axis-aligned rectangle, used for fixed blocks, placement blockages, and
/// the placement region itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Rect {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }
    pub fn area(&self) -> f64 {
        (self.width().max(0.0)) * (self.height().max(0.0))
    }

    /// Area of overlap between `self` and `other`, or 0 if disjoint.
    pub fn overlap_area(&self, other: &Rect) -> f64 {
        let left = self.left.max(other.left);
        let right = self.right.min(other.right);
        let bottom = self.bottom.max(other.bottom);
        let top = self.top.min(other.top);
        if right > left && top > bottom {
            (right - left) * (top - bottom)
        } else {
            0.0
        }
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.overlap_area(other) > 0.0
    }
}

/// Read-only snapshot of the netlist, types, region, and obstacles that the
/// placer core operates over. Cell positions are the only field the core
/// mutates, via `Circuit::cells`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circuit {
    pub block_types: Vec<BlockType>,
    pub cells: Vec<Cell>,
    pub nets: Vec<Net>,
    pub region: Rect,
    pub row_height: f64,
    /// Placement blockages: rectangles with no associated cell that still
    /// consume white space in the grid-bin mesh.
    pub blockages: Vec<Rect>,
}

impl Circuit {
    pub fn cell_width(&self, cell_idx: usize) -> f64 {
        self.block_types[self.cells[cell_idx].block_type].width
    }

    pub fn cell_height(&self, cell_idx: usize) -> f64 {
        self.block_types[self.cells[cell_idx].block_type].height
    }

    pub fn cell_area(&self, cell_idx: usize) -> f64 {
        self.block_types[self.cells[cell_idx].block_type].area()
    }

    pub fn cell_rect(&self, cell_idx: usize) -> Rect {
        let cell = &self.cells[cell_idx];
        let w = self.cell_width(cell_idx);
        let h = self.cell_height(cell_idx);
        Rect {
            left: cell.x,
            bottom: cell.y,
            right: cell.x + w,
            top: cell.y + h,
        }
    }

    pub fn cell_center(&self, cell_idx: usize) -> (f64, f64) {
        let r = self.cell_rect(cell_idx);
        ((r.left + r.right) / 2.0, (r.bottom + r.top) / 2.0)
    }

    /// Absolute location of pin `pin.pin` on `pin.cell`, applying the
    /// cell's orientation transform to the block type's local offset.
    pub fn pin_abs(&self, pin: NetPin) -> (f64, f64) {
        let cell = &self.cells[pin.cell];
        let bt = &self.block_types[cell.block_type];
        let def = &bt.pins[pin.pin];
        let (dx, dy) = cell
            .orientation
            .transform_offset(def.offset_x, def.offset_y, bt.width, bt.height);
        (cell.x + dx, cell.y + dy)
    }

    pub fn pin_offset(&self, pin: NetPin) -> (f64, f64) {
        let cell = &self.cells[pin.cell];
        let bt = &self.block_types[cell.block_type];
        let def = &bt.pins[pin.pin];
        cell.orientation
            .transform_offset(def.offset_x, def.offset_y, bt.width, bt.height)
    }

    pub fn movable_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_movable()).count()
    }

    /// Weighted HPWL along one axis: Σ over nets of `w * (max_pin - min_pin)`
    /// on that axis.
    pub fn weighted_hpwl_axis(&self, axis: Axis) -> f64 {
        self.nets
            .iter()
            .filter(|n| n.pin_count() >= 2)
            .map(|n| {
                let (mut max_v, mut min_v) = (f64::NEG_INFINITY, f64::INFINITY);
                for &p in &n.pins {
                    let (x, y) = self.pin_abs(p);
                    let v = if axis == Axis::X { x } else { y };
                    max_v = max_v.max(v);
                    min_v = min_v.min(v);
                }
                n.weight * (max_v - min_v)
            })
            .sum()
    }

    pub fn weighted_hpwl(&self) -> f64 {
        self.weighted_hpwl_axis(Axis::X) + self.weighted_hpwl_axis(Axis::Y)
    }

    pub fn average_movable_dimension(&self, axis: Axis) -> f64 {
        let (sum, count) = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_movable())
            .fold((0.0, 0usize), |(sum, count), (i, _)| {
                let dim = if axis == Axis::X {
                    self.cell_width(i)
                } else {
                    self.cell_height(i)
                };
                (sum + dim, count + 1)
            });
        if count == 0 {
            1.0
        } else {
            sum / (count as f64)
        }
    }

    /// Recompute net `net_idx`'s axis-extremal pin indices (index into
    /// `Net::pins`) from current cell positions. Ties broken by first
    /// occurrence.
    pub fn extremal_pins(&self, net_idx: usize, axis: Axis) -> (usize, usize) {
        let net = &self.nets[net_idx];
        let mut max_i = 0;
        let mut min_i = 0;
        let mut max_v = f64::NEG_INFINITY;
        let mut min_v = f64::INFINITY;
        for (i, &p) in net.pins.iter().enumerate() {
            let (x, y) = self.pin_abs(p);
            let v = if axis == Axis::X { x } else { y };
            if v > max_v {
                max_v = v;
                max_i = i;
            }
            if v < min_v {
                min_v = v;
                min_i = i;
            }
        }
        (max_i, min_i)
    }

    pub fn average_cell_area(&self) -> f64 {
        let movable: Vec<_> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_movable())
            .collect();
        if movable.is_empty() {
            return 1.0;
        }
        movable.iter().map(|(i, _)| self.cell_area(*i)).sum::<f64>() / (movable.len() as f64)
    }
}
