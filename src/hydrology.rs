//! Rivers and biomes
//!
//! The pluggable tail of the pipeline: flow-accumulation river tracing and
//! biome classification over the pack mesh. Both consume the pack plus the
//! climate fields and can be replaced wholesale: rivers are plain data,
//! and biome assignment goes through the `BiomeClassifier` trait.

use crate::grid::{CellId, SEA_LEVEL};
use crate::pack::Pack;

/// Default minimum accumulated flux (precipitation units) for a river
pub const MIN_RIVER_FLUX: f64 = 30.0;

/// A traced river: an ordered path of pack cells from source to mouth
#[derive(Debug, Clone)]
pub struct River {
    /// River id (1-based, stable within a run)
    pub id: u16,
    /// Path cells, source first
    pub cells: Vec<CellId>,
    /// Accumulated flux at the mouth
    pub flux: f64,
    /// River this one merges into at its mouth, if any
    pub parent: Option<u16>,
}

/// Trace rivers by routing each land cell's flux to its lowest neighbor
///
/// Land cells are processed in descending height order, so all upstream
/// flux has arrived before a cell passes its own along. A cell whose
/// accumulated flux crosses `min_flux` becomes river course; reaching an
/// existing river merges into it (the downstream river keeps its id and
/// the tributary records it as `parent`). Flow ends at water cells or
/// where no lower neighbor exists (depressions were already filled or
/// turned into lakes upstream of this stage).
pub fn trace_rivers(pack: &Pack, min_flux: f64) -> Vec<River> {
    let n = pack.cell_count();
    let mut flux: Vec<f64> = pack
        .cells
        .precipitation
        .iter()
        .map(|p| f64::from(*p))
        .collect();

    let mut order: Vec<usize> = (0..n).filter(|i| pack.is_land(*i)).collect();
    order.sort_by(|a, b| {
        pack.cells.height[*b]
            .cmp(&pack.cells.height[*a])
            .then(a.cmp(b))
    });

    let mut river_of: Vec<u16> = vec![0; n];
    let mut rivers: Vec<River> = Vec::new();

    for &i in &order {
        let Some(&lowest) = pack.cells.neighbors[i]
            .iter()
            .min_by_key(|c| (pack.cells.height[**c as usize], **c))
        else {
            continue;
        };
        let lowest = lowest as usize;
        if pack.cells.height[lowest] >= pack.cells.height[i] {
            continue; // flat or pit; nothing downhill to route to
        }

        flux[lowest] += flux[i];
        if flux[i] < min_flux {
            continue;
        }

        // This cell carries enough water to be river course
        let id = if river_of[i] != 0 {
            river_of[i]
        } else {
            let id = (rivers.len() + 1) as u16;
            rivers.push(River {
                id,
                cells: vec![CellId(i as u32)],
                flux: flux[i],
                parent: None,
            });
            river_of[i] = id;
            id
        };
        let river = &mut rivers[id as usize - 1];
        river.flux = river.flux.max(flux[lowest]);

        if pack.is_land(lowest) {
            if river_of[lowest] == 0 {
                river_of[lowest] = id;
                river.cells.push(CellId(lowest as u32));
            } else if river_of[lowest] != id {
                // Confluence: the established river keeps the course
                river.parent = Some(river_of[lowest]);
            }
        }
        // Water mouth: the river simply ends here
    }

    rivers.retain(|r| r.cells.len() >= 2);
    log::debug!("traced {} rivers", rivers.len());
    rivers
}

/// Biome identifiers produced by the default classifier
pub mod biome {
    pub const MARINE: u8 = 0;
    pub const HOT_DESERT: u8 = 1;
    pub const COLD_DESERT: u8 = 2;
    pub const SAVANNA: u8 = 3;
    pub const GRASSLAND: u8 = 4;
    pub const TROPICAL_SEASONAL_FOREST: u8 = 5;
    pub const TEMPERATE_DECIDUOUS_FOREST: u8 = 6;
    pub const TROPICAL_RAINFOREST: u8 = 7;
    pub const TEMPERATE_RAINFOREST: u8 = 8;
    pub const TAIGA: u8 = 9;
    pub const TUNDRA: u8 = 10;
    pub const GLACIER: u8 = 11;
    pub const WETLAND: u8 = 12;

    /// Display names, indexed by biome id
    pub const NAMES: [&str; 13] = [
        "Marine",
        "Hot desert",
        "Cold desert",
        "Savanna",
        "Grassland",
        "Tropical seasonal forest",
        "Temperate deciduous forest",
        "Tropical rainforest",
        "Temperate rainforest",
        "Taiga",
        "Tundra",
        "Glacier",
        "Wetland",
    ];
}

/// Maps a pack cell's climate triple to a biome id
///
/// The seam for custom taxonomies: implement this to swap the biome system
/// without touching the pipeline.
pub trait BiomeClassifier {
    /// Classify one cell from its temperature, moisture and height
    fn classify(&self, temperature: i8, moisture: f64, height: u8) -> u8;
}

/// Moisture band × temperature band matrix classifier
///
/// Rows are moisture bands (dry to wet), columns temperature bands (hot to
/// cold); glacier, wetland and marine are handled as overrides.
pub struct DefaultBiomeClassifier {
    /// Moisture multiplier derived from the forest level slider
    moisture_factor: f64,
}

/// Biome matrix: 5 moisture bands × 26 temperature bands
const BIOME_MATRIX: [[u8; 26]; 5] = [
    [1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 10],
    [3, 3, 3, 3, 3, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 9, 9, 9, 9, 9, 10],
    [5, 5, 5, 5, 5, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 9, 9, 9, 9, 9, 10],
    [5, 5, 5, 5, 5, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 9, 9, 9, 9, 9, 10],
    [7, 7, 7, 7, 7, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 9, 9, 9, 9, 9, 10],
];

impl DefaultBiomeClassifier {
    /// Build a classifier from the forest level slider (50 = neutral)
    pub fn new(forest_level: u8) -> Self {
        Self {
            moisture_factor: 0.5 + f64::from(forest_level) / 100.0,
        }
    }

    fn is_wetland(moisture: f64, temperature: i8, height: u8) -> bool {
        if temperature <= -2 {
            return false;
        }
        if moisture > 40.0 && height < 25 {
            return true;
        }
        moisture > 24.0 && height > 24 && height < 60
    }
}

impl Default for DefaultBiomeClassifier {
    fn default() -> Self {
        Self::new(50)
    }
}

impl BiomeClassifier for DefaultBiomeClassifier {
    fn classify(&self, temperature: i8, moisture: f64, height: u8) -> u8 {
        if height < SEA_LEVEL {
            return biome::MARINE;
        }
        if temperature < -5 {
            return biome::GLACIER;
        }
        let moisture = moisture * self.moisture_factor;
        if Self::is_wetland(moisture, temperature, height) {
            return biome::WETLAND;
        }

        let moisture_band = ((moisture / 5.0) as usize).min(4);
        let temperature_band = (20 - i32::from(temperature)).clamp(0, 25) as usize;
        BIOME_MATRIX[moisture_band][temperature_band]
    }
}

/// Assign a biome to every pack cell
///
/// Moisture for a land cell is its own precipitation averaged with its land
/// neighbors', which softens single-cell rain spikes into coherent biome
/// regions.
pub fn assign_biomes(pack: &Pack, classifier: &impl BiomeClassifier) -> Vec<u8> {
    let n = pack.cell_count();
    let mut biomes = Vec::with_capacity(n);

    for i in 0..n {
        let moisture = if pack.is_land(i) {
            let own = f64::from(pack.cells.precipitation[i]);
            let mut sum = own;
            let mut count = 1.0;
            for &c in &pack.cells.neighbors[i] {
                let c = c as usize;
                if pack.is_land(c) {
                    sum += f64::from(pack.cells.precipitation[c]);
                    count += 1.0;
                }
            }
            4.0 + sum / count
        } else {
            f64::from(pack.cells.precipitation[i])
        };
        biomes.push(classifier.classify(
            pack.cells.temperature[i],
            moisture,
            pack.cells.height[i],
        ));
    }
    biomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate;
    use crate::config::MapConfigBuilder;
    use crate::features::markup_grid;
    use crate::geo::MapCoordinates;
    use crate::grid::Grid;
    use crate::heightmap::{self, templates};
    use crate::pack;
    use crate::rng::MapRng;

    fn simulated_pack(seed: &str) -> Pack {
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
        heightmap::generate(&mut grid, templates::by_name("continents").unwrap(), &mut rng)
            .unwrap();
        markup_grid(&mut grid).unwrap();
        let coordinates = MapCoordinates::from_size(config.width, config.height);
        climate::calculate_temperatures(&mut grid, &config.temperature, &coordinates).unwrap();
        climate::generate_precipitation(&mut grid, &config.precipitation, &coordinates, &mut rng)
            .unwrap();
        pack::regraph(&grid).unwrap()
    }

    #[test]
    fn test_rivers_flow_downhill() {
        let pack = simulated_pack("rivers");
        let rivers = trace_rivers(&pack, MIN_RIVER_FLUX);

        for river in &rivers {
            for pair in river.cells.windows(2) {
                let up = pair[0].index();
                let down = pair[1].index();
                assert!(
                    pack.cells.height[down] < pack.cells.height[up],
                    "river {} flows uphill between {} and {}",
                    river.id,
                    up,
                    down
                );
            }
        }
    }

    #[test]
    fn test_rivers_on_land_only() {
        let pack = simulated_pack("river-land");
        let rivers = trace_rivers(&pack, MIN_RIVER_FLUX);

        for river in &rivers {
            for cell in &river.cells {
                assert!(pack.is_land(cell.index()));
            }
        }
    }

    #[test]
    fn test_river_determinism() {
        let pack = simulated_pack("river-det");
        let a = trace_rivers(&pack, MIN_RIVER_FLUX);
        let b = trace_rivers(&pack, MIN_RIVER_FLUX);

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.cells, y.cells);
            assert_eq!(x.flux.to_bits(), y.flux.to_bits());
        }
    }

    #[test]
    fn test_lower_threshold_more_rivers() {
        let pack = simulated_pack("river-threshold");
        let strict = trace_rivers(&pack, 200.0);
        let loose = trace_rivers(&pack, 10.0);

        assert!(loose.len() >= strict.len());
    }

    #[test]
    fn test_classifier_overrides() {
        let classifier = DefaultBiomeClassifier::default();

        assert_eq!(classifier.classify(25, 10.0, 10), biome::MARINE);
        assert_eq!(classifier.classify(-10, 10.0, 40), biome::GLACIER);
        assert_eq!(classifier.classify(10, 60.0, 22), biome::WETLAND);
    }

    #[test]
    fn test_classifier_matrix_corners() {
        let classifier = DefaultBiomeClassifier::default();

        // Hot and dry: hot desert
        assert_eq!(classifier.classify(25, 1.0, 40), biome::HOT_DESERT);
        // Hot and wet: tropical rainforest
        assert_eq!(classifier.classify(25, 23.0, 40), biome::TROPICAL_RAINFOREST);
        // Cold end of the matrix: tundra
        assert_eq!(classifier.classify(-5, 1.0, 40), biome::TUNDRA);
    }

    #[test]
    fn test_forest_level_biases_moisture() {
        let dry = DefaultBiomeClassifier::new(0);
        let wet = DefaultBiomeClassifier::new(100);

        // Same climate reads drier or wetter depending on the slider
        let moisture = 12.0;
        let dry_biome = dry.classify(15, moisture, 40);
        let wet_biome = wet.classify(15, moisture, 40);
        assert_eq!(dry_biome, biome::GRASSLAND);
        assert_eq!(wet_biome, biome::TEMPERATE_DECIDUOUS_FOREST);
    }

    #[test]
    fn test_assign_biomes_full_coverage() {
        let pack = simulated_pack("biomes");
        let biomes = assign_biomes(&pack, &DefaultBiomeClassifier::default());

        assert_eq!(biomes.len(), pack.cell_count());
        for (i, b) in biomes.iter().enumerate() {
            assert!((*b as usize) < biome::NAMES.len());
            if !pack.is_land(i) {
                assert_eq!(*b, biome::MARINE, "water cell {} must be marine", i);
            } else {
                assert_ne!(*b, biome::MARINE, "land cell {} classified marine", i);
            }
        }

        // A continents map spans several biomes
        let distinct: std::collections::HashSet<u8> = biomes.iter().copied().collect();
        assert!(distinct.len() >= 3, "only {} distinct biomes", distinct.len());
    }
}
