//! Map configuration and builder
//!
//! This module provides configuration types for deterministic map generation.
//! A configuration fully determines the generated world: the same config will
//! always produce the identical map.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::rng::MapRng;

/// Minimum supported cell count
pub const MIN_CELLS: usize = 1_000;

/// Maximum supported cell count (hard cap, enforced rather than configurable)
pub const MAX_CELLS: usize = 100_000;

/// Temperature model settings
///
/// Hemispheres need not be symmetric, so both pole temperatures are
/// configured independently.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureSettings {
    /// Sea-level temperature at the equator, °C
    pub equator_c: i8,
    /// Sea-level temperature at the north pole, °C
    pub north_pole_c: i8,
    /// Sea-level temperature at the south pole, °C
    pub south_pole_c: i8,
    /// Exponent converting height units to metres-equivalent for the
    /// altitude temperature drop; higher values punish peaks harder
    pub altitude_exponent: f64,
}

impl Default for TemperatureSettings {
    fn default() -> Self {
        Self {
            equator_c: 27,
            north_pole_c: -30,
            south_pole_c: -15,
            altitude_exponent: 1.8,
        }
    }
}

/// Precipitation model settings
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecipitationSettings {
    /// Global precipitation multiplier (1.0 = normal)
    pub modifier: f64,
    /// Wind bearing in degrees for each 30° latitude tier, north to south
    pub wind_bearings: [u16; 6],
}

impl Default for PrecipitationSettings {
    fn default() -> Self {
        Self {
            modifier: 1.0,
            wind_bearings: [225, 270, 225, 315, 270, 315],
        }
    }
}

/// Lake post-processing settings
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LakeSettings {
    /// Elevation ceiling (relative to a depression's floor) the filling
    /// search may climb while looking for a pour point; 80+ disables the
    /// depression-filling pass entirely
    pub elevation_limit: u8,
    /// Whether lakes close to the shoreline are breached into the ocean
    pub open_near_sea: bool,
}

impl Default for LakeSettings {
    fn default() -> Self {
        Self {
            elevation_limit: 20,
            open_near_sea: true,
        }
    }
}

/// Configuration for deterministic map generation
///
/// Every field is concrete once built; fields not set on the builder are
/// filled deterministically from the seed, so partial settings still
/// reproduce the same map on every run.
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
/// assert_eq!(config.cells_desired, 1_000);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Seed string; drives every random decision in the pipeline
    pub seed: String,
    /// Map width in pixels
    pub width: f64,
    /// Map height in pixels
    pub height: f64,
    /// Approximate number of interior Voronoi cells to generate
    pub cells_desired: usize,
    /// Heightmap template name; unknown names fall back to the default
    /// template rather than failing
    pub template: String,
    /// Target share of water cells, 0-100
    pub water_level: u8,
    /// Above-sea relief scale, 0-100 (50 = neutral)
    pub mountain_level: u8,
    /// Moisture bias for biome assignment, 0-100 (50 = neutral)
    pub forest_level: u8,
    /// Temperature model
    pub temperature: TemperatureSettings,
    /// Precipitation model
    pub precipitation: PrecipitationSettings,
    /// Lake post-processing
    pub lakes: LakeSettings,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfigBuilder::new().build().unwrap()
    }
}

/// Builder for creating a `MapConfig` with validation
///
/// Sliders left unset are randomized from the seed at build time, never
/// from ambient randomness. Model constants (altitude exponent, wind
/// bearings, lake limits) take fixed defaults instead.
///
/// # Example
///
/// ```
/// use voronoi_mapgen::*;
///
/// // Seeded but otherwise default
/// let config = MapConfigBuilder::new().seed("atoll-7").build().unwrap();
///
/// // Same seed, same filled-in sliders
/// let again = MapConfigBuilder::new().seed("atoll-7").build().unwrap();
/// assert_eq!(config, again);
/// ```
#[derive(Debug, Clone)]
pub struct MapConfigBuilder {
    seed: Option<String>,
    width: f64,
    height: f64,
    cells_desired: usize,
    template: String,
    water_level: Option<u8>,
    mountain_level: Option<u8>,
    forest_level: Option<u8>,
    temperature: Option<TemperatureSettings>,
    precipitation: Option<PrecipitationSettings>,
    lakes: LakeSettings,
}

impl MapConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - seed: random (generated once at build time)
    /// - dimensions: 960 × 540
    /// - cells_desired: 10,000
    /// - template: "continents"
    /// - sliders and climate settings: filled from the seed at build time
    pub fn new() -> Self {
        Self {
            seed: None,
            width: 960.0,
            height: 540.0,
            cells_desired: 10_000,
            template: "continents".to_string(),
            water_level: None,
            mountain_level: None,
            forest_level: None,
            temperature: None,
            precipitation: None,
            lakes: LakeSettings::default(),
        }
    }

    /// Set the seed string
    pub fn seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// Set the map dimensions in pixels
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either dimension is not strictly positive.
    pub fn dimensions(mut self, width: f64, height: f64) -> Result<Self> {
        if width <= 0.0 || height <= 0.0 || !width.is_finite() || !height.is_finite() {
            return Err(MapError::InvalidConfig(format!(
                "map dimensions must be positive (got {}x{})",
                width, height
            )));
        }
        self.width = width;
        self.height = height;
        Ok(self)
    }

    /// Set the desired interior cell count
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` outside [1,000, 100,000].
    pub fn cells_desired(mut self, cells: usize) -> Result<Self> {
        if !(MIN_CELLS..=MAX_CELLS).contains(&cells) {
            return Err(MapError::InvalidConfig(format!(
                "cells_desired must be in {}..={} (got {})",
                MIN_CELLS, MAX_CELLS, cells
            )));
        }
        self.cells_desired = cells;
        Ok(self)
    }

    /// Set the heightmap template name
    pub fn template(mut self, name: impl Into<String>) -> Self {
        self.template = name.into();
        self
    }

    /// Set the target share of water cells (0-100)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the level exceeds 100.
    pub fn water_level(mut self, level: u8) -> Result<Self> {
        if level > 100 {
            return Err(MapError::InvalidConfig(format!(
                "water_level must be <= 100 (got {})",
                level
            )));
        }
        self.water_level = Some(level);
        Ok(self)
    }

    /// Set the above-sea relief scale (0-100, 50 = neutral)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the level exceeds 100.
    pub fn mountain_level(mut self, level: u8) -> Result<Self> {
        if level > 100 {
            return Err(MapError::InvalidConfig(format!(
                "mountain_level must be <= 100 (got {})",
                level
            )));
        }
        self.mountain_level = Some(level);
        Ok(self)
    }

    /// Set the biome moisture bias (0-100, 50 = neutral)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the level exceeds 100.
    pub fn forest_level(mut self, level: u8) -> Result<Self> {
        if level > 100 {
            return Err(MapError::InvalidConfig(format!(
                "forest_level must be <= 100 (got {})",
                level
            )));
        }
        self.forest_level = Some(level);
        Ok(self)
    }

    /// Set the temperature model
    pub fn temperature(mut self, settings: TemperatureSettings) -> Self {
        self.temperature = Some(settings);
        self
    }

    /// Set the precipitation model
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if any wind bearing is 360 or more.
    pub fn precipitation(mut self, settings: PrecipitationSettings) -> Result<Self> {
        if let Some(bearing) = settings.wind_bearings.iter().find(|b| **b >= 360) {
            return Err(MapError::InvalidConfig(format!(
                "wind bearing must be < 360 (got {})",
                bearing
            )));
        }
        self.precipitation = Some(settings);
        Ok(self)
    }

    /// Set the lake post-processing settings
    pub fn lakes(mut self, settings: LakeSettings) -> Self {
        self.lakes = settings;
        self
    }

    /// Build the configuration
    ///
    /// If no seed was provided, one is generated randomly; everything else
    /// left unset is derived from the seed so the result is reproducible.
    pub fn build(self) -> Result<MapConfig> {
        let seed = self
            .seed
            .unwrap_or_else(|| rand::random::<u32>().to_string());

        // Separate stream from the pipeline's, so filled-in settings do not
        // correlate with point jitter or template draws.
        let mut rng = MapRng::from_seed(&format!("{}:settings", seed));

        let water_level = self.water_level.unwrap_or_else(|| rng.range_i32(25, 60) as u8);
        let mountain_level = self.mountain_level.unwrap_or_else(|| rng.range_i32(30, 70) as u8);
        let forest_level = self.forest_level.unwrap_or_else(|| rng.range_i32(30, 70) as u8);
        let temperature = self.temperature.unwrap_or_else(|| TemperatureSettings {
            equator_c: rng.range_i32(24, 30) as i8,
            north_pole_c: rng.range_i32(-35, -25) as i8,
            south_pole_c: rng.range_i32(-20, -10) as i8,
            ..TemperatureSettings::default()
        });
        let precipitation = self.precipitation.unwrap_or_else(|| PrecipitationSettings {
            modifier: f64::from(rng.range_i32(50, 150)) / 100.0,
            ..PrecipitationSettings::default()
        });

        Ok(MapConfig {
            seed,
            width: self.width,
            height: self.height,
            cells_desired: self.cells_desired,
            template: self.template,
            water_level,
            mountain_level,
            forest_level,
            temperature,
            precipitation,
            lakes: self.lakes,
        })
    }
}

impl Default for MapConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = MapConfigBuilder::new().seed("defaults").build().unwrap();

        assert_eq!(config.width, 960.0);
        assert_eq!(config.height, 540.0);
        assert_eq!(config.cells_desired, 10_000);
        assert_eq!(config.template, "continents");
        assert!(config.water_level <= 100);
        assert_eq!(config.lakes, LakeSettings::default());
    }

    #[test]
    fn test_builder_custom() {
        let config = MapConfigBuilder::new()
            .seed("custom")
            .dimensions(512.0, 512.0)
            .unwrap()
            .cells_desired(1_000)
            .unwrap()
            .template("archipelago")
            .water_level(40)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.seed, "custom");
        assert_eq!(config.width, 512.0);
        assert_eq!(config.cells_desired, 1_000);
        assert_eq!(config.template, "archipelago");
        assert_eq!(config.water_level, 40);
    }

    #[test]
    fn test_omitted_fields_reproducible() {
        let a = MapConfigBuilder::new().seed("partial").build().unwrap();
        let b = MapConfigBuilder::new().seed("partial").build().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_omitted_fields_vary_by_seed() {
        let a = MapConfigBuilder::new().seed("one").build().unwrap();
        let b = MapConfigBuilder::new().seed("two").build().unwrap();
        // At least one filled-in setting should differ between seeds
        assert!(
            a.water_level != b.water_level
                || a.mountain_level != b.mountain_level
                || a.forest_level != b.forest_level
                || a.temperature != b.temperature
        );
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(MapConfigBuilder::new().dimensions(0.0, 100.0).is_err());
        assert!(MapConfigBuilder::new().dimensions(100.0, -5.0).is_err());
        assert!(MapConfigBuilder::new().dimensions(f64::NAN, 100.0).is_err());
    }

    #[test]
    fn test_invalid_cell_counts() {
        assert!(MapConfigBuilder::new().cells_desired(999).is_err());
        assert!(MapConfigBuilder::new().cells_desired(100_001).is_err());
        assert!(MapConfigBuilder::new().cells_desired(1_000).is_ok());
        assert!(MapConfigBuilder::new().cells_desired(100_000).is_ok());
    }

    #[test]
    fn test_invalid_levels() {
        assert!(MapConfigBuilder::new().water_level(101).is_err());
        assert!(MapConfigBuilder::new().mountain_level(200).is_err());
        assert!(MapConfigBuilder::new().forest_level(255).is_err());
    }

    #[test]
    fn test_invalid_wind_bearing() {
        let settings = PrecipitationSettings {
            modifier: 1.0,
            wind_bearings: [225, 270, 360, 315, 270, 315],
        };
        assert!(MapConfigBuilder::new().precipitation(settings).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serialization() {
        let config = MapConfigBuilder::new()
            .seed("roundtrip")
            .dimensions(512.0, 512.0)
            .unwrap()
            .build()
            .unwrap();

        let json = serde_json::to_string(&config).unwrap();
        let restored: MapConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, restored);
    }
}
