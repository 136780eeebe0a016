//! Feature classification
//!
//! Flood-fills connected same-type (land/water) regions into features,
//! tags coastline cells on both sides, classifies each feature as ocean,
//! lake or island, and sweeps a signed distance-to-coast field over the
//! water side. After this stage every cell belongs to exactly one feature
//! and the feature's `land` flag is authoritative for land/water queries.

use std::collections::VecDeque;

use crate::error::{MapError, Result};
use crate::grid::{cell_type, Feature, FeatureId, FeatureKind, Grid, SEA_LEVEL};

/// Deepest water distance marker the coastal sweep produces
const MAX_WATER_DISTANCE: i8 = -10;

/// Partition the grid into features and tag coastlines
///
/// # Errors
///
/// `MissingPrerequisite` if heights have not been generated.
pub fn markup_grid(grid: &mut Grid) -> Result<()> {
    if grid.cells.height.is_empty() {
        return Err(MapError::MissingPrerequisite("height"));
    }

    let n = grid.cell_count();
    grid.cells.feature_id = vec![FeatureId::NONE; n];
    grid.cells.cell_type = vec![cell_type::UNMARKED; n];
    grid.features.clear();

    let cells = &mut grid.cells;
    let mut queue = VecDeque::new();
    let mut next_unmarked = 0usize;

    loop {
        while next_unmarked < n && !cells.feature_id[next_unmarked].is_none() {
            next_unmarked += 1;
        }
        if next_unmarked >= n || grid.features.len() >= usize::from(u16::MAX) {
            break;
        }

        let id = FeatureId((grid.features.len() + 1) as u16);
        let start = next_unmarked;
        let land = cells.height[start] >= SEA_LEVEL;
        let mut border = false;

        cells.feature_id[start] = id;
        queue.push_back(start);
        while let Some(q) = queue.pop_front() {
            if cells.is_border[q] {
                border = true;
            }
            for i in 0..cells.neighbors[q].len() {
                let c = cells.neighbors[q][i] as usize;
                let neighbor_land = cells.height[c] >= SEA_LEVEL;
                if land == neighbor_land && cells.feature_id[c].is_none() {
                    cells.feature_id[c] = id;
                    queue.push_back(c);
                } else if land && !neighbor_land {
                    cells.cell_type[q] = cell_type::LAND_COAST;
                    cells.cell_type[c] = cell_type::WATER_COAST;
                }
            }
        }

        let kind = if land {
            FeatureKind::Island
        } else if border {
            FeatureKind::Ocean
        } else {
            FeatureKind::Lake
        };
        grid.features.push(Feature {
            id,
            land,
            border,
            kind,
        });
    }

    markup(
        &mut grid.cells.cell_type,
        &grid.cells.neighbors,
        cell_type::DEEP_WATER,
        -1,
        MAX_WATER_DISTANCE,
    );

    log::debug!("classified {} features", grid.features.len());
    Ok(())
}

/// Distance-field sweep over the adjacency graph
///
/// Starting from cells already marked `start - increment`, marks their
/// unmarked neighbors `start`, then `start + increment` outward, stopping
/// at `limit` or when a sweep marks nothing. The cap guarantees
/// termination regardless of graph shape.
pub(crate) fn markup(
    cell_types: &mut [i8],
    neighbors: &[Vec<u32>],
    start: i8,
    increment: i8,
    limit: i8,
) {
    let mut distance = start;
    loop {
        let previous = distance - increment;
        let mut marked = 0usize;
        for i in 0..cell_types.len() {
            if cell_types[i] != previous {
                continue;
            }
            for &c in &neighbors[i] {
                let c = c as usize;
                if cell_types[c] == cell_type::UNMARKED {
                    cell_types[c] = distance;
                    marked += 1;
                }
            }
        }
        if marked == 0 || distance == limit {
            break;
        }
        distance += increment;
    }
}
