//! Geographic extent and map scale
//!
//! The map rectangle is projected onto a latitude/longitude window; the
//! climate simulator reads latitudes from it and the `Ruler` converts
//! between pixels and kilometres for the renderer.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kilometres per degree of latitude
const KM_PER_DEGREE: f64 = 111.0;

/// Geographic window the map rectangle is mapped onto
///
/// Default span is 140° of latitude centered on the equator; longitude span
/// follows the map's aspect ratio, capped at a full circle.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapCoordinates {
    /// Northern edge latitude, degrees (positive = north)
    pub lat_n: f64,
    /// Southern edge latitude, degrees
    pub lat_s: f64,
    /// Western edge longitude, degrees
    pub lon_w: f64,
    /// Eastern edge longitude, degrees
    pub lon_e: f64,
}

impl MapCoordinates {
    /// Derive the geographic window from the map size in pixels
    pub fn from_size(width: f64, height: f64) -> Self {
        let lat_total = 140.0;
        let lon_total = (lat_total * width / height).min(360.0);
        Self {
            lat_n: lat_total / 2.0,
            lat_s: -lat_total / 2.0,
            lon_w: -lon_total / 2.0,
            lon_e: lon_total / 2.0,
        }
    }

    /// Total latitude span, degrees
    #[inline]
    pub fn lat_span(&self) -> f64 {
        self.lat_n - self.lat_s
    }

    /// Latitude at a vertical position, where `y_fraction` is 0 at the top
    /// edge and 1 at the bottom edge
    #[inline]
    pub fn latitude_at(&self, y_fraction: f64) -> f64 {
        self.lat_n - y_fraction * self.lat_span()
    }
}

/// Map scale: pixels per kilometre
///
/// Read-only; recomputed whenever the geographic extent changes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ruler {
    /// Pixels per kilometre of mapped ground distance
    pub px_per_km: f64,
}

impl Ruler {
    /// Compute the scale from the map height and its geographic extent
    pub fn new(map_height_px: f64, coordinates: &MapCoordinates) -> Self {
        let km = coordinates.lat_span() * KM_PER_DEGREE;
        Self {
            px_per_km: map_height_px / km,
        }
    }

    /// Convert a pixel distance to kilometres
    #[inline]
    pub fn to_km(&self, px: f64) -> f64 {
        px / self.px_per_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_size_square() {
        let coords = MapCoordinates::from_size(512.0, 512.0);
        assert_eq!(coords.lat_n, 70.0);
        assert_eq!(coords.lat_s, -70.0);
        assert_eq!(coords.lat_span(), 140.0);
        assert_eq!(coords.lon_e - coords.lon_w, 140.0);
    }

    #[test]
    fn test_longitude_capped_for_wide_maps() {
        let coords = MapCoordinates::from_size(4000.0, 500.0);
        assert_eq!(coords.lon_e - coords.lon_w, 360.0);
    }

    #[test]
    fn test_latitude_at_edges() {
        let coords = MapCoordinates::from_size(960.0, 540.0);
        assert_eq!(coords.latitude_at(0.0), coords.lat_n);
        assert_eq!(coords.latitude_at(1.0), coords.lat_s);
        assert_eq!(coords.latitude_at(0.5), 0.0);
    }

    #[test]
    fn test_ruler_round_trip() {
        let coords = MapCoordinates::from_size(512.0, 512.0);
        let ruler = Ruler::new(512.0, &coords);

        assert!(ruler.px_per_km > 0.0);
        let km = ruler.to_km(512.0);
        assert!((km - 140.0 * 111.0).abs() < 1e-9);
    }
}
