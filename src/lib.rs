//! Seeded Voronoi world map generation
//!
//! A standalone library for generating deterministic fantasy world maps:
//! a seed string and a handful of sliders in, a geographically coherent
//! Voronoi world out: elevations, connected landmasses and lakes,
//! temperature and precipitation fields, a coastline-refined output mesh,
//! rivers and biomes. Rendering and persistence are left to the consumer.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use voronoi_mapgen::*;
//!
//! // Configure a map
//! let config = MapConfigBuilder::new()
//!     .seed("my-world")
//!     .dimensions(960.0, 540.0).unwrap()
//!     .cells_desired(10_000).unwrap()
//!     .template("continents")
//!     .build().unwrap();
//!
//! // Generate it (same config, same map, every time)
//! let map = WorldMap::generate(config).unwrap();
//! println!("{} cells, {} rivers", map.pack().cell_count(), map.rivers().len());
//! ```
//!
//! # Features
//!
//! - `serde`: serialization support for configuration types

// Modules
pub mod error;
pub mod config;
pub mod rng;
pub mod geo;
pub mod grid;
pub mod voronoi;
pub mod heightmap;
pub mod features;
pub mod lakes;
pub mod climate;
pub mod pack;
pub mod hydrology;
pub mod map;

// Re-export core types for convenience
pub use error::{MapError, Result};
pub use config::{
    LakeSettings, MapConfig, MapConfigBuilder, PrecipitationSettings, TemperatureSettings,
};
pub use rng::MapRng;
pub use geo::{MapCoordinates, Ruler};
pub use grid::{CellId, Feature, FeatureId, FeatureKind, Grid, SEA_LEVEL};
pub use voronoi::HalfEdgeMesh;
pub use heightmap::{templates, Operation, Span, Template};
pub use hydrology::{biome, BiomeClassifier, DefaultBiomeClassifier, River};
pub use pack::Pack;
pub use map::WorldMap;

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;
