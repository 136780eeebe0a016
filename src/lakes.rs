//! Lake post-processing
//!
//! Two independent passes over a classified grid: closed depressions that
//! cannot drain become lakes, and lakes sitting close to the shoreline are
//! breached into the ocean. Both passes keep the feature invariants intact
//! (`land` flag matches `height >= 20`, coast tags stay symmetric).

use crate::error::{MapError, Result};
use crate::grid::{cell_type, Feature, FeatureId, FeatureKind, Grid, SEA_LEVEL};
use crate::heightmap::templates::ATOLL_TEMPLATE;

/// Lake surface height, one step below sea level
const LAKE_SURFACE: u8 = SEA_LEVEL - 1;

/// Elevation limit at or above which depression filling is disabled
const FILL_DISABLED: u8 = 80;

/// Land height below which a shoreline cell can be breached into the sea
const BREACH_LIMIT: u8 = 22;

/// Convert undrainable depressions into lakes
///
/// For each land cell that is a local elevation minimum, a bounded search
/// walks outward refusing to climb more than `elevation_limit` above the
/// minimum; if no water is reachable under that ceiling, the minimum and
/// its equal-height neighbors become a new lake feature.
///
/// `elevation_limit >= 80` turns the pass off (valid configuration, not an
/// error).
///
/// # Errors
///
/// `MissingPrerequisite` if heights or features are missing.
pub fn add_lakes_in_deep_depressions(grid: &mut Grid, elevation_limit: u8) -> Result<()> {
    if elevation_limit >= FILL_DISABLED {
        return Ok(());
    }
    if grid.cells.height.is_empty() {
        return Err(MapError::MissingPrerequisite("height"));
    }
    if grid.cells.feature_id.is_empty() {
        return Err(MapError::MissingPrerequisite("feature_id"));
    }

    let n = grid.cell_count();
    let mut added = 0usize;

    for i in 0..n {
        if grid.cells.is_border[i] || grid.cells.height[i] < SEA_LEVEL {
            continue;
        }

        let height = grid.cells.height[i];
        let min_neighbor = grid.cells.neighbors[i]
            .iter()
            .map(|c| grid.cells.height[*c as usize])
            .min()
            .unwrap_or(height);
        if height > min_neighbor {
            continue;
        }

        // Local minimum: can it pour to water under the ceiling?
        let threshold = height.saturating_add(elevation_limit);
        let mut deep = true;
        let mut checked = vec![false; n];
        checked[i] = true;
        let mut queue = vec![i];
        'search: while let Some(q) = queue.pop() {
            for &c in &grid.cells.neighbors[q] {
                let c = c as usize;
                if checked[c] {
                    continue;
                }
                if grid.cells.height[c] >= threshold {
                    continue;
                }
                if grid.cells.height[c] < SEA_LEVEL {
                    deep = false;
                    break 'search;
                }
                checked[c] = true;
                queue.push(c);
            }
        }

        if deep {
            let mut lake_cells = vec![i];
            lake_cells.extend(
                grid.cells.neighbors[i]
                    .iter()
                    .map(|c| *c as usize)
                    .filter(|c| grid.cells.height[*c] == height),
            );
            add_lake(grid, &lake_cells);
            added += 1;
        }
    }

    if added > 0 {
        log::debug!("filled {} deep depressions with lakes", added);
    }
    Ok(())
}

fn add_lake(grid: &mut Grid, lake_cells: &[usize]) {
    let id = FeatureId((grid.features.len() + 1) as u16);

    for &i in lake_cells {
        grid.cells.height[i] = LAKE_SURFACE;
        grid.cells.cell_type[i] = cell_type::WATER_COAST;
        grid.cells.feature_id[i] = id;
        for n in 0..grid.cells.neighbors[i].len() {
            let c = grid.cells.neighbors[i][n] as usize;
            if !lake_cells.contains(&c) {
                grid.cells.cell_type[c] = cell_type::LAND_COAST;
            }
        }
    }

    grid.features.push(Feature {
        id,
        land: false,
        border: false,
        kind: FeatureKind::Lake,
    });
}

/// Breach lakes lying close to the shoreline into the ocean
///
/// A lake opens into the sea when one of its coastal neighbors is low
/// enough (below 22) and itself borders an ocean cell; the threshold cell
/// is flooded and the whole lake joins the ocean feature. Skipped for the
/// atoll template, whose isolated lagoons are intentional.
///
/// # Errors
///
/// `MissingPrerequisite` if heights or features are missing.
pub fn open_near_sea_lakes(grid: &mut Grid, template: &str) -> Result<()> {
    if template == ATOLL_TEMPLATE {
        return Ok(());
    }
    if grid.cells.height.is_empty() {
        return Err(MapError::MissingPrerequisite("height"));
    }
    if grid.cells.feature_id.is_empty() {
        return Err(MapError::MissingPrerequisite("feature_id"));
    }
    if !grid.features.iter().any(|f| f.kind == FeatureKind::Lake) {
        return Ok(());
    }

    for i in 0..grid.cell_count() {
        let lake = grid.cells.feature_id[i];
        if grid.feature(lake).map(|f| f.kind) != Some(FeatureKind::Lake) {
            continue;
        }

        'neighbors: for n in 0..grid.cells.neighbors[i].len() {
            let c = grid.cells.neighbors[i][n] as usize;
            if grid.cells.cell_type[c] != cell_type::LAND_COAST
                || grid.cells.height[c] > BREACH_LIMIT
            {
                continue;
            }
            for m in 0..grid.cells.neighbors[c].len() {
                let o = grid.cells.neighbors[c][m] as usize;
                let ocean = grid.cells.feature_id[o];
                if grid.feature(ocean).map(|f| f.kind) == Some(FeatureKind::Ocean) {
                    breach_lake(grid, c, lake, ocean);
                    break 'neighbors;
                }
            }
        }
    }
    Ok(())
}

/// Flood the threshold cell and merge the lake into the ocean feature
fn breach_lake(grid: &mut Grid, threshold: usize, lake: FeatureId, ocean: FeatureId) {
    grid.cells.height[threshold] = LAKE_SURFACE;
    grid.cells.cell_type[threshold] = cell_type::WATER_COAST;
    grid.cells.feature_id[threshold] = ocean;
    for n in 0..grid.cells.neighbors[threshold].len() {
        let c = grid.cells.neighbors[threshold][n] as usize;
        if grid.cells.height[c] >= SEA_LEVEL {
            grid.cells.cell_type[c] = cell_type::LAND_COAST;
        }
    }

    for id in grid.cells.feature_id.iter_mut() {
        if *id == lake {
            *id = ocean;
        }
    }
    // The old entry stays in the append-only list but now owns no cells
    let entry = &mut grid.features[lake.0 as usize - 1];
    entry.kind = FeatureKind::Ocean;
    entry.border = true;

    log::debug!("opened lake {:?} into ocean {:?}", lake, ocean);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigBuilder;
    use crate::features::markup_grid;
    use crate::heightmap::{self, templates};
    use crate::rng::MapRng;

    fn classified_grid(seed: &str, template: &str) -> Grid {
        let config = MapConfigBuilder::new()
            .seed(seed)
            .dimensions(512.0, 512.0)
            .unwrap()
            .cells_desired(1_000)
            .unwrap()
            .build()
            .unwrap();
        let mut rng = MapRng::from_seed(&config.seed);
        let mut grid = Grid::build(&config, &mut rng).unwrap();
        heightmap::generate(&mut grid, templates::by_name(template).unwrap(), &mut rng)
            .unwrap();
        markup_grid(&mut grid).unwrap();
        grid
    }

    /// Every land cell must reach water or the border without climbing more
    /// than the elevation limit above its own height
    fn depression_free(grid: &Grid, elevation_limit: u8) -> bool {
        let n = grid.cell_count();
        for i in 0..n {
            if grid.cells.height[i] < SEA_LEVEL || grid.cells.is_border[i] {
                continue;
            }
            let threshold = grid.cells.height[i].saturating_add(elevation_limit);
            let mut checked = vec![false; n];
            checked[i] = true;
            let mut queue = vec![i];
            let mut drains = false;
            'bfs: while let Some(q) = queue.pop() {
                for &c in &grid.cells.neighbors[q] {
                    let c = c as usize;
                    if checked[c] || grid.cells.height[c] >= threshold {
                        continue;
                    }
                    if grid.cells.height[c] < SEA_LEVEL || grid.cells.is_border[c] {
                        drains = true;
                        break 'bfs;
                    }
                    checked[c] = true;
                    queue.push(c);
                }
            }
            if !drains {
                return false;
            }
        }
        true
    }

    #[test]
    fn test_requires_classification() {
        let config = MapConfigBuilder::new()
            .seed("lakes-precondition")
            .cells_desired(1_000)
            .unwrap()
            .build()
            .unwrap();
        let mut rng = MapRng::from_seed(&config.seed);
        let mut grid = Grid::build(&config, &mut rng).unwrap();

        let err = add_lakes_in_deep_depressions(&mut grid, 20).unwrap_err();
        assert!(matches!(err, MapError::MissingPrerequisite("height")));

        let err = open_near_sea_lakes(&mut grid, "continents").unwrap_err();
        assert!(matches!(err, MapError::MissingPrerequisite("height")));
    }

    #[test]
    fn test_high_limit_disables_filling() {
        let mut grid = classified_grid("disabled", "continents");
        let before = grid.features.len();

        add_lakes_in_deep_depressions(&mut grid, 80).unwrap();
        assert_eq!(grid.features.len(), before);

        // And the precondition is not even checked when disabled
        grid.cells.height.clear();
        assert!(add_lakes_in_deep_depressions(&mut grid, 100).is_ok());
    }

    #[test]
    fn test_depressions_eliminated() {
        let mut grid = classified_grid("depressions", "shattered");
        let limit = 20;

        add_lakes_in_deep_depressions(&mut grid, limit).unwrap();

        assert!(depression_free(&grid, limit));
    }

    #[test]
    fn test_lake_invariants_after_filling() {
        let mut grid = classified_grid("lake-invariants", "shattered");
        add_lakes_in_deep_depressions(&mut grid, 20).unwrap();

        for feature in &grid.features {
            if feature.kind == FeatureKind::Lake {
                assert!(!feature.land);
                assert!(!feature.border);
            }
        }
        // New lake cells are water with water-coast marking
        for i in 0..grid.cell_count() {
            if grid.cells.height[i] == LAKE_SURFACE
                && grid.feature(grid.cells.feature_id[i]).unwrap().kind == FeatureKind::Lake
            {
                assert_eq!(grid.cells.cell_type[i], cell_type::WATER_COAST);
            }
        }
    }

    #[test]
    fn test_atoll_keeps_its_lagoons() {
        let mut grid = classified_grid("lagoon", "atoll");
        let lakes_before = grid
            .features
            .iter()
            .filter(|f| f.kind == FeatureKind::Lake)
            .count();

        open_near_sea_lakes(&mut grid, ATOLL_TEMPLATE).unwrap();

        let lakes_after = grid
            .features
            .iter()
            .filter(|f| f.kind == FeatureKind::Lake)
            .count();
        assert_eq!(lakes_before, lakes_after);
    }

    #[test]
    fn test_breached_cells_join_ocean() {
        let mut grid = classified_grid("breach", "continents");
        add_lakes_in_deep_depressions(&mut grid, 20).unwrap();
        open_near_sea_lakes(&mut grid, "continents").unwrap();

        // No cell may reference a feature that was merged away while still
        // being typed as a lake cell
        for i in 0..grid.cell_count() {
            let feature = grid.feature(grid.cells.feature_id[i]).unwrap();
            assert_eq!(
                feature.land,
                grid.cells.height[i] >= SEA_LEVEL,
                "cell {} land flag broken after breach",
                i
            );
        }
    }
}
