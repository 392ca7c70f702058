mod common;

use approx::assert_abs_diff_eq;

use b2b_placer::circuit::Axis;
use b2b_placer::config::PlacerConfig;
use b2b_placer::{legalizer, place, quadratic, Circuit};

use common::{fixed_cell, mesh_circuit, movable_cell, rect_block, region, square_block, two_pin_net};

/// Two movable cells, one net, no fixed cells: the unanchored optimizer
/// should pull both cells' centers to (nearly) the same point.
#[test]
fn two_movable_cells_one_net() {
    let block = square_block("CELL10", 10.0);
    let mut circuit = Circuit {
        block_types: vec![block],
        cells: vec![movable_cell(0, 0.0, 0.0), movable_cell(0, 90.0, 90.0)],
        nets: vec![two_pin_net(0, 1, 1.0)],
        region: region(0.0, 0.0, 100.0, 100.0),
        row_height: 10.0,
        blockages: Vec::new(),
    };
    let config = PlacerConfig::default();

    let (hx, hy) = quadratic::unanchored_placement(&mut circuit, &config);

    let a = circuit.cell_center(0);
    let b = circuit.cell_center(1);
    assert_abs_diff_eq!(a.0, b.0, epsilon = 1e-2);
    assert_abs_diff_eq!(a.1, b.1, epsilon = 1e-2);
    assert!(hx + hy < 1e-1, "hpwl should be near zero, got {}", hx + hy);
}

/// One movable cell pulled equally by two fixed anchors placed symmetrically
/// around the region center should settle at the center.
#[test]
fn one_movable_two_fixed_anchors() {
    let block = square_block("CELL4", 4.0);
    let mut circuit = Circuit {
        block_types: vec![block],
        cells: vec![
            fixed_cell(0, 0.0, 0.0),
            fixed_cell(0, 96.0, 96.0),
            movable_cell(0, 48.0, 48.0),
        ],
        nets: vec![two_pin_net(2, 0, 1.0), two_pin_net(2, 1, 1.0)],
        region: region(0.0, 0.0, 100.0, 100.0),
        row_height: 4.0,
        blockages: Vec::new(),
    };
    let config = PlacerConfig::default();

    quadratic::unanchored_placement(&mut circuit, &config);

    let (cx, cy) = circuit.cell_center(2);
    assert_abs_diff_eq!(cx, 50.0, epsilon = 0.5);
    assert_abs_diff_eq!(cy, 50.0, epsilon = 0.5);
}

/// A uniform ring-connected grid of cells, legalized at a 0.5 target filling
/// rate, should leave no bin more than modestly over the target.
#[test]
fn uniform_density_grid() {
    let mut circuit = mesh_circuit(10, 10.0, 1000.0);
    let config = PlacerConfig {
        max_iter: 2,
        target_filling_rate: 0.5,
        ..PlacerConfig::default()
    };

    place(&mut circuit, &config).expect("placement should succeed");

    let mesh = b2b_placer::grid::GridMesh::build(&circuit, &config);
    for col in &mesh.bins {
        for bin in col {
            assert!(
                bin.filling_rate() <= 0.55,
                "bin {:?} filling rate {} exceeds target",
                bin.index,
                bin.filling_rate()
            );
        }
    }
}

/// A fixed macro spanning a full column must not have any movable cell's
/// center land inside it after a legalization pass.
#[test]
fn fixed_macro_blocks_a_column() {
    let macro_block = rect_block("MACRO", 20.0, 100.0);
    let cell_block = rect_block("CELL4", 4.0, 4.0);

    let mut cells = vec![fixed_cell(0, 40.0, 0.0)];
    for i in 0..20usize {
        let x = 42.0 + ((i % 4) as f64) * 4.0;
        let y = (i as f64) * 4.8;
        cells.push(movable_cell(1, x, y));
    }

    let nets = (1..20usize)
        .map(|i| two_pin_net(i, i + 1, 1.0))
        .collect();

    let mut circuit = Circuit {
        block_types: vec![macro_block, cell_block],
        cells,
        nets,
        region: region(0.0, 0.0, 100.0, 100.0),
        row_height: 4.0,
        blockages: Vec::new(),
    };
    let config = PlacerConfig::default();

    legalizer::look_ahead_legalize(&mut circuit, &config);

    for i in 1..circuit.cells.len() {
        let (cx, _) = circuit.cell_center(i);
        assert!(
            cx <= 40.0 || cx >= 60.0,
            "cell {} center x={} lies inside the fixed macro's column",
            i,
            cx
        );
    }
}

/// A net whose pin count is at or above `net_ignore_threshold` must not
/// perturb the result: adding one changes nothing about scenario #1.
#[test]
fn ignore_threshold_excludes_a_large_net() {
    let block = square_block("CELL10", 10.0);
    let dummy_block = square_block("DUMMY", 1.0);

    let block_types = vec![block, dummy_block];
    let mut cells = vec![movable_cell(0, 0.0, 0.0), movable_cell(0, 90.0, 90.0)];
    let mut nets = vec![two_pin_net(0, 1, 1.0)];

    let dummy_count = 150;
    let mut dummy_pins = Vec::with_capacity(dummy_count);
    for _ in 0..dummy_count {
        cells.push(fixed_cell(1, 0.0, 0.0));
        dummy_pins.push(b2b_placer::circuit::NetPin {
            cell: cells.len() - 1,
            pin: 0,
        });
    }
    nets.push(b2b_placer::circuit::Net::new(dummy_pins, 1.0));

    let mut circuit = Circuit {
        block_types,
        cells,
        nets,
        region: region(0.0, 0.0, 100.0, 100.0),
        row_height: 10.0,
        blockages: Vec::new(),
    };
    let config = PlacerConfig::default();
    assert!(circuit.nets[1].pin_count() >= config.net_ignore_threshold);

    quadratic::unanchored_placement(&mut circuit, &config);

    let mut baseline = Circuit {
        block_types: vec![square_block("CELL10", 10.0)],
        cells: vec![movable_cell(0, 0.0, 0.0), movable_cell(0, 90.0, 90.0)],
        nets: vec![two_pin_net(0, 1, 1.0)],
        region: region(0.0, 0.0, 100.0, 100.0),
        row_height: 10.0,
        blockages: Vec::new(),
    };
    quadratic::unanchored_placement(&mut baseline, &config);

    let a = circuit.cell_center(0);
    let base_a = baseline.cell_center(0);
    assert_abs_diff_eq!(a.0, base_a.0, epsilon = 1e-9);
    assert_abs_diff_eq!(a.1, base_a.1, epsilon = 1e-9);
    assert_abs_diff_eq!(
        circuit.weighted_hpwl_axis(Axis::X) + circuit.weighted_hpwl_axis(Axis::Y),
        baseline.weighted_hpwl_axis(Axis::X) + baseline.weighted_hpwl_axis(Axis::Y),
        epsilon = 1e-9
    );
}

/// The top-level loop on a 100-cell mesh should converge well before its
/// iteration cap, with a small final upper/lower-bound gap.
#[test]
fn convergence_terminates_with_small_gap() {
    let mut circuit = mesh_circuit(10, 10.0, 1000.0);
    let config = PlacerConfig {
        max_iter: 50,
        ..PlacerConfig::default()
    };

    let report = place(&mut circuit, &config).expect("placement should succeed");

    assert!(report.converged, "placement did not converge within max_iter");
    let gap_ratio = (report.upper_bound_hpwl / report.lower_bound_hpwl - 1.0).abs();
    assert!(
        gap_ratio < 0.1,
        "gap ratio {} should be below 0.1 at convergence",
        gap_ratio
    );
}
