//! Look-ahead legalization (component J): the grid/cluster/bisection
//! pipeline that turns a quadratic-solved (overlapping) placement into a
//! legal row-aligned one, cluster by cluster, worst congestion first.

use tracing::info_span;

use crate::bisect;
use crate::boxfinder;
use crate::circuit::{Axis, Circuit};
use crate::cluster;
use crate::config::PlacerConfig;
use crate::grid::GridMesh;
use crate::leaf;

/// Outcome of one look-ahead legalization pass: the upper-bound HPWL of the
/// now-legal placement, plus the anchor targets (the legalized center of
/// every cell) for the next anchored quadratic solve.
#[derive(Debug, Clone)]
pub struct LegalizationResult {
    pub upper_bound_hpwl: f64,
    pub anchor_x: Vec<f64>,
    pub anchor_y: Vec<f64>,
}

/// Run one full look-ahead legalization pass over `circuit`, mutating cell
/// positions in place.
pub fn look_ahead_legalize(circuit: &mut Circuit, config: &PlacerConfig) -> LegalizationResult {
    let span = info_span!("look_ahead_legalize");
    let _enter = span.enter();

    let mesh = GridMesh::build(circuit, config);
    let clusters = cluster::find_clusters(&mesh, config);

    for cluster in &clusters {
        let box_bin = boxfinder::find_box(cluster, &mesh, config);
        let leaves = bisect::bisect(circuit, &mesh, box_bin);
        for leaf in &leaves {
            leaf::place_leaf(circuit, leaf, circuit.row_height);
        }
    }

    let mut anchor_x = Vec::with_capacity(circuit.cells.len());
    let mut anchor_y = Vec::with_capacity(circuit.cells.len());
    for i in 0..circuit.cells.len() {
        let (cx, cy) = circuit.cell_center(i);
        anchor_x.push(cx);
        anchor_y.push(cy);
    }

    LegalizationResult {
        upper_bound_hpwl: circuit.weighted_hpwl_axis(Axis::X) + circuit.weighted_hpwl_axis(Axis::Y),
        anchor_x,
        anchor_y,
    }
}
