//! Over-filled bin clustering (component F).
//!
//! Finds connected components of over-filled grid bins (4-neighbor
//! adjacency) via breadth-first search, and orders the resulting clusters
//! by total cell area descending so the legalizer always spreads the worst
//! congestion first.

use std::collections::{HashSet, VecDeque};

use crate::config::PlacerConfig;
use crate::grid::{BinIndex, GridMesh};

#[derive(Debug, Clone)]
pub struct BinCluster {
    pub bins: Vec<BinIndex>,
    pub total_cell_area: f64,
    pub total_white_space: f64,
}

/// Find every connected component of over-filled bins, sorted by
/// `total_cell_area` descending (largest congestion first).
pub fn find_clusters(mesh: &GridMesh, config: &PlacerConfig) -> Vec<BinCluster> {
    let mut visited: HashSet<BinIndex> = HashSet::new();
    let mut clusters = Vec::new();

    for x in 0..mesh.nx {
        for y in 0..mesh.ny {
            let start = BinIndex { x, y };
            if visited.contains(&start) || !mesh.bin(start).is_over_filled(config.target_filling_rate) {
                continue;
            }

            let mut bins = Vec::new();
            let mut total_cell_area = 0.0;
            let mut total_white_space = 0.0;
            let mut queue = VecDeque::new();
            queue.push_back(start);
            visited.insert(start);

            while let Some(idx) = queue.pop_front() {
                let bin = mesh.bin(idx);
                bins.push(idx);
                total_cell_area += bin.cell_area;
                total_white_space += bin.white_space;

                for neighbor in mesh.adjacent(idx) {
                    if !visited.contains(&neighbor)
                        && mesh.bin(neighbor).is_over_filled(config.target_filling_rate)
                    {
                        visited.insert(neighbor);
                        queue.push_back(neighbor);
                    }
                }
            }

            clusters.push(BinCluster {
                bins,
                total_cell_area,
                total_white_space,
            });
        }
    }

    clusters.sort_unstable_by(|a, b| b.total_cell_area.total_cmp(&a.total_cell_area));
    clusters
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::circuit::{BlockType, Cell, Circuit, Orientation, PinDef, PinPolarity, PlacementStatus, Rect};

    fn packed_circuit() -> Circuit {
        let block = BlockType {
            name: "CELL".into(),
            width: 2.0,
            height: 2.0,
            pins: vec![PinDef { offset_x: 1.0, offset_y: 1.0, polarity: PinPolarity::Load }],
        };
        let cells: Vec<Cell> = (0..16)
            .map(|i| Cell {
                block_type: 0,
                x: ((i % 4) * 2) as f64,
                y: ((i / 4) * 2) as f64,
                status: PlacementStatus::Unplaced,
                orientation: Orientation::N,
            })
            .collect();
        Circuit {
            block_types: vec![block],
            cells,
            nets: Vec::new(),
            region: Rect { left: 0.0, bottom: 0.0, right: 8.0, top: 8.0 },
            row_height: 2.0,
            blockages: Vec::new(),
        }
    }

    #[test]
    fn densely_packed_mesh_clusters_into_a_single_component() {
        let _ = tracing_subscriber::fmt::try_init();

        let circuit = packed_circuit();
        let config = PlacerConfig {
            number_of_cell_in_bin: 16,
            target_filling_rate: 0.1,
            ..PlacerConfig::default()
        };
        let mesh = GridMesh::build(&circuit, &config);

        let clusters = find_clusters(&mesh, &config);
        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].total_cell_area > 0.0);
    }

    #[test]
    fn empty_region_has_no_over_filled_clusters() {
        let circuit = packed_circuit();
        let config = PlacerConfig {
            number_of_cell_in_bin: 16,
            target_filling_rate: 100.0,
            ..PlacerConfig::default()
        };
        let mesh = GridMesh::build(&circuit, &config);

        assert!(find_clusters(&mesh, &config).is_empty());
    }

    #[test]
    fn clusters_are_sorted_by_cell_area_descending() {
        let circuit = packed_circuit();
        let config = PlacerConfig {
            number_of_cell_in_bin: 1,
            target_filling_rate: 0.01,
            ..PlacerConfig::default()
        };
        let mesh = GridMesh::build(&circuit, &config);

        let clusters = find_clusters(&mesh, &config);
        for pair in clusters.windows(2) {
            assert!(pair[0].total_cell_area >= pair[1].total_cell_area);
        }
    }
}
