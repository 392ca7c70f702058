//! Minimum bounding box expansion (component G).
//!
//! Starting from an over-filled cluster's bin bounding box, grows the box
//! one ring of bins at a time until its white space covers the cluster's
//! cell area and its aspect ratio falls within bounds, or the box has
//! swallowed the whole mesh.

use crate::circuit::Rect;
use crate::cluster::BinCluster;
use crate::config::PlacerConfig;
use crate::grid::{BinIndex, GridMesh};

/// A bin-aligned box carved out around one cluster, ready to hand to the
/// recursive bisection pass.
#[derive(Debug, Clone)]
pub struct CellBox {
    pub ll: BinIndex,
    pub ur: BinIndex,
    pub rect: Rect,
    pub cells: Vec<usize>,
}

fn expand(ll: &mut BinIndex, ur: &mut BinIndex, mesh: &GridMesh) -> bool {
    let mut grew = false;
    if ll.x > 0 {
        ll.x -= 1;
        grew = true;
    }
    if ll.y > 0 {
        ll.y -= 1;
        grew = true;
    }
    if ur.x + 1 < mesh.nx {
        ur.x += 1;
        grew = true;
    }
    if ur.y + 1 < mesh.ny {
        ur.y += 1;
        grew = true;
    }
    grew
}

/// Find the minimum box around `cluster` satisfying both the white-space
/// coverage requirement and the configured aspect-ratio bound.
pub fn find_box(cluster: &BinCluster, mesh: &GridMesh, config: &PlacerConfig) -> CellBox {
    let mut ll = BinIndex {
        x: cluster.bins.iter().map(|b| b.x).min().unwrap(),
        y: cluster.bins.iter().map(|b| b.y).min().unwrap(),
    };
    let mut ur = BinIndex {
        x: cluster.bins.iter().map(|b| b.x).max().unwrap(),
        y: cluster.bins.iter().map(|b| b.y).max().unwrap(),
    };

    loop {
        let white_space = mesh.white_space_range(ll, ur);
        let rect = mesh.rect_of_range(ll, ur);
        let aspect = (rect.width() / rect.height()).max(rect.height() / rect.width());

        let covers_cluster = white_space >= cluster.total_cell_area;
        let aspect_ok = aspect <= config.box_aspect_ratio_bound;

        if covers_cluster && aspect_ok {
            break;
        }
        if !expand(&mut ll, &mut ur, mesh) {
            break;
        }
    }

    let rect = mesh.rect_of_range(ll, ur);
    let mut cells = Vec::new();
    for x in ll.x..=ur.x {
        for y in ll.y..=ur.y {
            cells.extend(mesh.bin(crate::grid::BinIndex { x, y }).cells.iter().copied());
        }
    }

    CellBox { ll, ur, rect, cells }
}
