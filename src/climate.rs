//! Climate simulation
//!
//! Temperature is latitude-driven with an altitude penalty; precipitation
//! is wind-advected humidity swept across the grid row- or column-wise.
//! Both fields are deterministic per (grid, settings, seed) and clamp to
//! their 8-bit storage.

use crate::config::{PrecipitationSettings, TemperatureSettings};
use crate::error::{MapError, Result};
use crate::geo::MapCoordinates;
use crate::grid::{Grid, SEA_LEVEL};
use crate::rng::MapRng;

/// Northern edge of the tropical latitude band, degrees
const TROPICS_NORTH: f64 = 16.0;

/// Southern edge of the tropical latitude band, degrees
const TROPICS_SOUTH: f64 = -20.0;

/// Temperature drop per degree of latitude inside the tropics
const TROPICAL_GRADIENT: f64 = 0.15;

/// Temperature drop per 1000 m of altitude, °C (environmental lapse rate)
const LAPSE_RATE: f64 = 6.5;

/// Wind cannot carry moisture over cells above this elevation
const MAX_PASSABLE_ELEVATION: u8 = 85;

/// No moisture flux below this temperature, °C
const PERMAFROST_TEMP: i8 = -5;

/// Precipitation weight per 5° latitude band, equator-symmetric by |lat|
const LATITUDE_MODIFIER: [f64; 18] = [
    4.0, 2.0, 2.0, 2.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0, 3.0, 3.0, 2.0, 2.0, 1.0, 1.0, 1.0, 0.5,
];

/// Assign per-cell temperatures from latitude and altitude
///
/// Sea-level temperature interpolates linearly inside the tropical band and
/// along separate gradients towards each pole. Land cells lose
/// `6.5°C / 1000 m`, with height converted to metres-equivalent via
/// `(height - 18) ^ altitude_exponent`; water cells get no penalty.
///
/// # Errors
///
/// `MissingPrerequisite` if heights have not been generated.
pub fn calculate_temperatures(
    grid: &mut Grid,
    settings: &TemperatureSettings,
    coordinates: &MapCoordinates,
) -> Result<()> {
    if grid.cells.height.is_empty() {
        return Err(MapError::MissingPrerequisite("height"));
    }

    let n = grid.cell_count();
    let mut temperature = vec![0i8; n];

    for row in 0..grid.cells_y {
        let row_start = row * grid.cells_x;
        let y = grid.points[row_start].y;
        let latitude = coordinates.latitude_at(y / grid.height);
        let sea_level = sea_level_temperature(latitude, settings);

        for i in row_start..row_start + grid.cells_x {
            let drop = altitude_drop(grid.cells.height[i], settings.altitude_exponent);
            temperature[i] = (sea_level - drop).clamp(-128.0, 127.0) as i8;
        }
    }

    grid.cells.temperature = temperature;
    Ok(())
}

/// Sea-level temperature at a latitude
fn sea_level_temperature(latitude: f64, settings: &TemperatureSettings) -> f64 {
    let equator = f64::from(settings.equator_c);

    if (TROPICS_SOUTH..=TROPICS_NORTH).contains(&latitude) {
        return equator - latitude.abs() * TROPICAL_GRADIENT;
    }

    if latitude > 0.0 {
        let tropic_temp = equator - TROPICS_NORTH * TROPICAL_GRADIENT;
        let gradient =
            (tropic_temp - f64::from(settings.north_pole_c)) / (90.0 - TROPICS_NORTH);
        tropic_temp - (latitude - TROPICS_NORTH) * gradient
    } else {
        let tropic_temp = equator - TROPICS_SOUTH.abs() * TROPICAL_GRADIENT;
        let gradient =
            (tropic_temp - f64::from(settings.south_pole_c)) / (90.0 - TROPICS_SOUTH.abs());
        tropic_temp - (latitude.abs() - TROPICS_SOUTH.abs()) * gradient
    }
}

/// Altitude temperature penalty; zero for water cells
fn altitude_drop(height: u8, exponent: f64) -> f64 {
    if height < SEA_LEVEL {
        return 0.0;
    }
    let metres = f64::from(height - 18).powf(exponent);
    (metres / 1000.0) * LAPSE_RATE
}

/// Generate per-cell precipitation from wind-advected humidity
///
/// Each 30° latitude tier's wind bearing is classified into horizontal
/// (westerly/easterly) and vertical (northerly/southerly) sweeps. Humidity
/// starts latitude-weighted at the windward edge and is carried cell by
/// cell: water cells recharge it, land cells rain it out (more so uphill),
/// and peaks above the passable elevation dry the wind out completely.
///
/// # Errors
///
/// `MissingPrerequisite` if heights or temperatures are missing.
pub fn generate_precipitation(
    grid: &mut Grid,
    settings: &PrecipitationSettings,
    coordinates: &MapCoordinates,
    rng: &mut MapRng,
) -> Result<()> {
    if grid.cells.height.is_empty() {
        return Err(MapError::MissingPrerequisite("height"));
    }
    if grid.cells.temperature.is_empty() {
        return Err(MapError::MissingPrerequisite("temperature"));
    }

    let n = grid.cell_count();
    let (cells_x, cells_y) = (grid.cells_x, grid.cells_y);
    let modifier = settings.modifier;
    let mut precipitation = vec![0.0f64; n];

    // Classify each row's wind tier into sweep directions
    let mut westerly: Vec<(usize, f64)> = Vec::new();
    let mut easterly: Vec<(usize, f64)> = Vec::new();
    let mut northerly = 0usize;
    let mut southerly = 0usize;

    for row in 0..cells_y {
        let latitude = coordinates.latitude_at(row as f64 / cells_y as f64);
        let band = (((latitude.abs() - 1.0) / 5.0) as usize).min(LATITUDE_MODIFIER.len() - 1);
        let lat_mod = LATITUDE_MODIFIER[band];
        let tier = (((latitude - 89.0).abs() / 30.0) as usize).min(5);
        let wind = settings.wind_bearings[tier];

        if wind > 40 && wind < 140 {
            westerly.push((row * cells_x, lat_mod));
        } else if wind > 220 && wind < 320 {
            easterly.push((row * cells_x + cells_x - 1, lat_mod));
        }
        if wind > 100 && wind < 260 {
            northerly += 1;
        } else if wind > 280 || wind < 80 {
            southerly += 1;
        }
    }

    let sweep = SweepContext {
        heights: &grid.cells.height,
        temperatures: &grid.cells.temperature,
        modifier,
    };

    for &(first, lat_mod) in &westerly {
        let max_prec = (120.0 * modifier * lat_mod).min(255.0);
        sweep.pass(first, 1, cells_x, max_prec, &mut precipitation, rng);
    }
    for &(first, lat_mod) in &easterly {
        let max_prec = (120.0 * modifier * lat_mod).min(255.0);
        sweep.pass(first, -1, cells_x, max_prec, &mut precipitation, rng);
    }

    let vertical_total = northerly + southerly;
    if northerly > 0 {
        let band =
            (((coordinates.lat_n.abs() - 1.0) / 5.0) as usize).min(LATITUDE_MODIFIER.len() - 1);
        let lat_mod = if coordinates.lat_span() > 60.0 {
            LATITUDE_MODIFIER.iter().sum::<f64>() / LATITUDE_MODIFIER.len() as f64
        } else {
            LATITUDE_MODIFIER[band]
        };
        let max_prec = (northerly as f64 / vertical_total as f64) * 60.0 * modifier * lat_mod;
        for first in 0..cells_x {
            sweep.pass(first, cells_x as i64, cells_y, max_prec, &mut precipitation, rng);
        }
    }
    if southerly > 0 {
        let band =
            (((coordinates.lat_s.abs() - 1.0) / 5.0) as usize).min(LATITUDE_MODIFIER.len() - 1);
        let lat_mod = if coordinates.lat_span() > 60.0 {
            LATITUDE_MODIFIER.iter().sum::<f64>() / LATITUDE_MODIFIER.len() as f64
        } else {
            LATITUDE_MODIFIER[band]
        };
        let max_prec = (southerly as f64 / vertical_total as f64) * 60.0 * modifier * lat_mod;
        for first in n - cells_x..n {
            sweep.pass(first, -(cells_x as i64), cells_y, max_prec, &mut precipitation, rng);
        }
    }

    grid.cells.precipitation = precipitation
        .iter()
        .map(|p| p.round().clamp(0.0, 255.0) as u8)
        .collect();
    Ok(())
}

/// Shared read-only state for humidity sweeps
struct SweepContext<'a> {
    heights: &'a [u8],
    temperatures: &'a [i8],
    modifier: f64,
}

impl SweepContext<'_> {
    /// Carry humidity from `first` along `step`-strided cells
    fn pass(
        &self,
        first: usize,
        step: i64,
        steps: usize,
        max_prec: f64,
        precipitation: &mut [f64],
        rng: &mut MapRng,
    ) {
        let mut humidity = max_prec - f64::from(self.heights[first]);
        if humidity <= 0.0 {
            return; // too elevated at the windward edge, wind starts dry
        }

        for s in 0..steps.saturating_sub(1) {
            let current = (first as i64 + s as i64 * step) as usize;
            let next = (current as i64 + step) as usize;

            if self.temperatures[current] < PERMAFROST_TEMP {
                continue;
            }

            if self.heights[current] < SEA_LEVEL {
                if self.heights[next] >= SEA_LEVEL {
                    // Coastal precipitation on the first land cell
                    let coastal = (humidity / rng.range_f64(10.0, 20.0)).max(1.0);
                    precipitation[next] += coastal;
                } else {
                    // Wind picks up moisture over open water
                    humidity = (humidity + 5.0 * self.modifier).min(max_prec);
                    precipitation[current] += 5.0 * self.modifier;
                }
                continue;
            }

            // Land cell: rain out, more when forced uphill
            let passable = self.heights[next] <= MAX_PASSABLE_ELEVATION;
            let rained = if passable {
                self.rainfall(humidity, current, next)
            } else {
                humidity
            };
            precipitation[current] += rained;
            let evaporation = if rained > 1.5 { 1.0 } else { 0.0 };
            humidity = if passable {
                (humidity - rained + evaporation).clamp(0.0, max_prec)
            } else {
                0.0
            };
        }
    }

    /// Rainfall on a land cell given the elevation change to the next cell
    fn rainfall(&self, humidity: f64, current: usize, next: usize) -> f64 {
        let normal_loss = (humidity / (10.0 * self.modifier)).max(1.0);
        let diff = f64::from(self.heights[next].saturating_sub(self.heights[current]));
        let orographic = (f64::from(self.heights[next]) / 70.0).powi(2);
        (normal_loss + diff * orographic).min(humidity)
    }
}
