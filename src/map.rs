//! WorldMap main structure
//!
//! Runs the full generation pipeline (points, Voronoi, heightmap,
//! features, lakes, climate, pack, rivers, biomes) as one synchronous
//! batch. Each stage completes before the next starts and consumes only
//! the buffers earlier stages produced; a run is pure given its
//! configuration.

use crate::climate;
use crate::config::MapConfig;
use crate::error::Result;
use crate::features;
use crate::geo::{MapCoordinates, Ruler};
use crate::grid::Grid;
use crate::heightmap::{self, templates};
use crate::hydrology::{self, DefaultBiomeClassifier, River, MIN_RIVER_FLUX};
use crate::lakes;
use crate::pack::{self, Pack};
use crate::rng::MapRng;

/// A complete generated world map
///
/// Owns the coarse `Grid`, the refined `Pack`, traced rivers, per-pack-cell
/// biome ids and the map scale. All of it is read-only output: to change
/// any parameter, generate a fresh map.
///
/// # Example
///
/// ```
/// use voronoi_mapgen::*;
///
/// let config = MapConfigBuilder::new()
///     .seed("12345")
///     .dimensions(512.0, 512.0)
///     .unwrap()
///     .cells_desired(1_000)
///     .unwrap()
///     .template("continents")
///     .build()
///     .unwrap();
///
/// let map = WorldMap::generate(config).unwrap();
/// println!("{} grid cells, {} pack cells", map.grid().cell_count(), map.pack().cell_count());
/// ```
pub struct WorldMap {
    /// Configuration used to generate this map
    config: MapConfig,
    /// The coarse simulation mesh
    grid: Grid,
    /// The coastline-refined output mesh
    pack: Pack,
    /// Traced rivers over the pack
    rivers: Vec<River>,
    /// Biome id per pack cell
    biomes: Vec<u8>,
    /// Geographic window the map is projected onto
    coordinates: MapCoordinates,
    /// Pixels-per-kilometre scale
    ruler: Ruler,
}

impl WorldMap {
    /// Generate a map from a configuration
    ///
    /// Deterministic: the same configuration always produces bit-identical
    /// buffers. All randomness flows from the seed through an explicit
    /// `MapRng` handle; no stage reads ambient randomness, wall-clock time
    /// or any other external input.
    ///
    /// # Errors
    ///
    /// Propagates stage failures (degenerate input geometry, violated
    /// stage preconditions). No partial map is ever returned.
    pub fn generate(config: MapConfig) -> Result<Self> {
        let mut rng = MapRng::from_seed(&config.seed);

        let mut grid = Grid::build(&config, &mut rng)?;

        let template = templates::by_name_or_default(&config.template);
        heightmap::generate(&mut grid, template, &mut rng)?;
        heightmap::apply_relief_levels(&mut grid, config.water_level, config.mountain_level)?;

        features::markup_grid(&mut grid)?;
        lakes::add_lakes_in_deep_depressions(&mut grid, config.lakes.elevation_limit)?;
        if config.lakes.open_near_sea {
            lakes::open_near_sea_lakes(&mut grid, template.name)?;
        }

        let coordinates = MapCoordinates::from_size(config.width, config.height);
        climate::calculate_temperatures(&mut grid, &config.temperature, &coordinates)?;
        climate::generate_precipitation(&mut grid, &config.precipitation, &coordinates, &mut rng)?;

        let pack = pack::regraph(&grid)?;
        let rivers = hydrology::trace_rivers(&pack, MIN_RIVER_FLUX);
        let classifier = DefaultBiomeClassifier::new(config.forest_level);
        let biomes = hydrology::assign_biomes(&pack, &classifier);

        let ruler = Ruler::new(config.height, &coordinates);

        Ok(Self {
            config,
            grid,
            pack,
            rivers,
            biomes,
            coordinates,
            ruler,
        })
    }

    /// The configuration this map was generated from
    #[inline]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// The coarse simulation mesh
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The refined output mesh
    #[inline]
    pub fn pack(&self) -> &Pack {
        &self.pack
    }

    /// Traced rivers, ordered by id
    #[inline]
    pub fn rivers(&self) -> &[River] {
        &self.rivers
    }

    /// Biome id per pack cell
    #[inline]
    pub fn biomes(&self) -> &[u8] {
        &self.biomes
    }

    /// Geographic extent of the map
    #[inline]
    pub fn coordinates(&self) -> &MapCoordinates {
        &self.coordinates
    }

    /// Map scale descriptor
    #[inline]
    pub fn ruler(&self) -> &Ruler {
        &self.ruler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfigBuilder;
    use crate::grid::{FeatureKind, SEA_LEVEL};

    fn scenario_config() -> MapConfig {
        MapConfigBuilder::new()
            .seed("12345")
            .dimensions(512.0, 512.0)
            .unwrap()
            .cells_desired(1_000)
            .unwrap()
            .template("continents")
            .water_level(40)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_scenario_regeneration_identical() {
        let a = WorldMap::generate(scenario_config()).unwrap();
        let b = WorldMap::generate(scenario_config()).unwrap();

        assert_eq!(a.grid().cells.height, b.grid().cells.height);
        assert_eq!(a.grid().cells.cell_type, b.grid().cells.cell_type);
        assert_eq!(a.grid().cells.temperature, b.grid().cells.temperature);
        assert_eq!(a.grid().cells.precipitation, b.grid().cells.precipitation);
        assert_eq!(a.pack().cells.area, b.pack().cells.area);
        assert_eq!(a.biomes(), b.biomes());
    }

    #[test]
    fn test_scenario_border_ocean_exists() {
        let map = WorldMap::generate(scenario_config()).unwrap();

        assert!(map
            .grid()
            .features
            .iter()
            .any(|f| f.kind == FeatureKind::Ocean && f.border));
    }

    #[test]
    fn test_scenario_water_share_in_range() {
        let map = WorldMap::generate(scenario_config()).unwrap();

        let water = map
            .grid()
            .cells
            .height
            .iter()
            .filter(|h| **h < SEA_LEVEL)
            .count();
        let share = water as f64 / map.grid().cell_count() as f64;
        assert!(
            (0.2..=0.8).contains(&share),
            "water share {} out of range",
            share
        );
    }

    #[test]
    fn test_feature_partition_holds_end_to_end() {
        let map = WorldMap::generate(scenario_config()).unwrap();
        let grid = map.grid();

        for i in 0..grid.cell_count() {
            let feature = grid
                .feature(grid.cells.feature_id[i])
                .expect("every cell must belong to a feature");
            assert_eq!(feature.land, grid.cells.height[i] >= SEA_LEVEL);
        }
    }

    #[test]
    fn test_default_config_generates() {
        let config = MapConfigBuilder::new().seed("default-map").build().unwrap();
        let map = WorldMap::generate(config).unwrap();

        assert!(map.grid().cell_count() > 0);
        assert!(map.pack().cell_count() > 0);
        assert_eq!(map.biomes().len(), map.pack().cell_count());
    }

    #[test]
    fn test_unknown_template_uses_default() {
        let config = MapConfigBuilder::new()
            .seed("fallback")
            .cells_desired(1_000)
            .unwrap()
            .template("not-a-template")
            .build()
            .unwrap();

        // Falls back to the default template instead of erroring
        let map = WorldMap::generate(config).unwrap();
        assert!(map.grid().cell_count() > 0);
    }

    #[test]
    fn test_different_seeds_different_maps() {
        let a = WorldMap::generate(
            MapConfigBuilder::new()
                .seed("seed-a")
                .cells_desired(1_000)
                .unwrap()
                .build()
                .unwrap(),
        )
        .unwrap();
        let b = WorldMap::generate(
            MapConfigBuilder::new()
                .seed("seed-b")
                .cells_desired(1_000)
                .unwrap()
                .build()
                .unwrap(),
        )
        .unwrap();

        assert_ne!(a.grid().cells.height, b.grid().cells.height);
    }

    #[test]
    fn test_lake_filling_disabled_by_limit() {
        let mut builder = MapConfigBuilder::new()
            .seed("no-lakes")
            .cells_desired(1_000)
            .unwrap();
        builder = builder.lakes(crate::config::LakeSettings {
            elevation_limit: 80,
            open_near_sea: false,
        });
        let map = WorldMap::generate(builder.build().unwrap()).unwrap();

        // Disabled passes still yield a valid, fully classified map
        assert!(map.grid().cells.feature_id.iter().all(|f| !f.is_none()));
    }
}
