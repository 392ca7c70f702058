use b2b_placer::circuit::{
    BlockType, Cell, Net, NetPin, Orientation, PinDef, PinPolarity, PlacementStatus, Rect,
};

/// A square block type with a single center pin.
pub fn square_block(name: &str, side: f64) -> BlockType {
    rect_block(name, side, side)
}

/// A rectangular block type with a single center pin.
pub fn rect_block(name: &str, width: f64, height: f64) -> BlockType {
    BlockType {
        name: name.to_string(),
        width,
        height,
        pins: vec![PinDef {
            offset_x: width / 2.0,
            offset_y: height / 2.0,
            polarity: PinPolarity::Load,
        }],
    }
}

pub fn movable_cell(block_type: usize, x: f64, y: f64) -> Cell {
    Cell {
        block_type,
        x,
        y,
        status: PlacementStatus::Unplaced,
        orientation: Orientation::N,
    }
}

pub fn fixed_cell(block_type: usize, x: f64, y: f64) -> Cell {
    Cell {
        block_type,
        x,
        y,
        status: PlacementStatus::Fixed,
        orientation: Orientation::N,
    }
}

pub fn two_pin_net(cell_a: usize, cell_b: usize, weight: f64) -> Net {
    Net::new(
        vec![
            NetPin { cell: cell_a, pin: 0 },
            NetPin { cell: cell_b, pin: 0 },
        ],
        weight,
    )
}

pub fn region(left: f64, bottom: f64, right: f64, top: f64) -> Rect {
    Rect { left, bottom, right, top }
}

/// A grid of `side * side` identical movable cells wired into a ring of
/// two-pin nets (cell `i` to cell `(i + 1) % n`), overlaid on a square
/// region sized so the requested filling rate is achievable.
pub fn mesh_circuit(side: usize, cell_side: f64, region_side: f64) -> b2b_placer::Circuit {
    let n = side * side;
    let block = square_block("CELL", cell_side);
    let cells = (0..n).map(|i| movable_cell(0, (i as f64) * 0.01, 0.0)).collect();
    let nets = (0..n)
        .map(|i| two_pin_net(i, (i + 1) % n, 1.0))
        .collect();

    b2b_placer::Circuit {
        block_types: vec![block],
        cells,
        nets,
        region: region(0.0, 0.0, region_side, region_side),
        row_height: cell_side,
        blockages: Vec::new(),
    }
}
