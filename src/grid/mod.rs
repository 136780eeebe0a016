//! Grid: the coarse working mesh
//!
//! A `Grid` owns every per-cell buffer of the simulation: topology from the
//! Voronoi builder, then heights, features, coastal distance and climate as
//! the pipeline stages fill them in. Buffers start empty and are allocated
//! by their producing stage, so a stage that runs out of order finds an
//! empty buffer and fails fast instead of silently defaulting.

pub mod points;

use glam::DVec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::rng::MapRng;
use crate::voronoi::{self, VertexStore};

/// Heights at or above this value are land
pub const SEA_LEVEL: u8 = 20;

/// Distance-to-coast markers stored in the `cell_type` buffer
///
/// Negative values are water, positive values land; magnitude grows with
/// distance from the coastline, capped by the markup sweep.
pub mod cell_type {
    /// Water cell adjacent to land
    pub const WATER_COAST: i8 = -1;
    /// Water cell one or more steps from the coast
    pub const DEEP_WATER: i8 = -2;
    /// Not yet classified
    pub const UNMARKED: i8 = 0;
    /// Land cell adjacent to water
    pub const LAND_COAST: i8 = 1;
    /// Land cell one or more steps inland
    pub const INLAND: i8 = 2;
}

/// Stable identifier of a grid or pack cell
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u32);

impl CellId {
    /// Buffer index of this cell
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a connected land/water feature (1-based, 0 = unmarked)
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FeatureId(pub u16);

impl FeatureId {
    /// Sentinel for cells not yet assigned to a feature
    pub const NONE: FeatureId = FeatureId(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Classification of a connected feature
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Water feature touching the map border
    Ocean,
    /// Water feature enclosed by land
    Lake,
    /// Land feature
    Island,
}

/// A maximal connected region of same-type (land/water) cells
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    /// This feature's id (1-based)
    pub id: FeatureId,
    /// Whether the feature is land; authoritative for land/water queries
    pub land: bool,
    /// Whether the feature touches the map border
    pub border: bool,
    /// Ocean, lake or island
    pub kind: FeatureKind,
}

/// Parallel per-cell buffers
///
/// `neighbors`, `vertices` and `is_border` are filled by the Voronoi
/// builder; the rest by their pipeline stage. All are indexed by cell id.
#[derive(Debug, Clone, Default)]
pub struct CellStore {
    /// Adjacent cell ids, one list per cell
    pub neighbors: Vec<Vec<u32>>,
    /// Ordered Voronoi vertex ring per cell
    pub vertices: Vec<Vec<u32>>,
    /// Whether the cell's edge walk touched a boundary point
    pub is_border: Vec<bool>,
    /// Elevation 0-100; empty until the heightmap stage
    pub height: Vec<u8>,
    /// Owning feature per cell; empty until the feature stage
    pub feature_id: Vec<FeatureId>,
    /// Signed distance-to-coast field; empty until the feature stage
    pub cell_type: Vec<i8>,
    /// Temperature °C; empty until the climate stage
    pub temperature: Vec<i8>,
    /// Precipitation, arbitrary units; empty until the climate stage
    pub precipitation: Vec<u8>,
}

impl CellStore {
    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

/// The coarse Voronoi mesh used for large-scale simulation
#[derive(Debug, Clone)]
pub struct Grid {
    /// Map width in pixels
    pub width: f64,
    /// Map height in pixels
    pub height: f64,
    /// Lattice spacing the points were placed at
    pub spacing: f64,
    /// Lattice width in cells (used for row-wise climate sweeps)
    pub cells_x: usize,
    /// Lattice height in cells
    pub cells_y: usize,
    /// Interior points, row-major; index-stable for the run
    pub points: Vec<DVec2>,
    /// Boundary ring outside the map rectangle
    pub boundary: Vec<DVec2>,
    /// Per-cell buffers
    pub cells: CellStore,
    /// Voronoi vertex buffers
    pub vertices: VertexStore,
    /// Append-only feature list (ids are 1-based)
    pub features: Vec<Feature>,
}

impl Grid {
    /// Place points and compute the Voronoi topology for a configuration
    ///
    /// Produces a grid with geometry only; heights, features and climate
    /// are filled by the later pipeline stages.
    pub fn build(config: &MapConfig, rng: &mut MapRng) -> Result<Self> {
        let placed =
            points::place_points(config.width, config.height, config.cells_desired, rng);

        let graph = voronoi::compute(&placed.points, &placed.boundary)?;

        let mut cells = CellStore::default();
        cells.neighbors = graph.neighbors;
        cells.vertices = graph.cell_vertices;
        cells.is_border = graph.is_border;

        Ok(Self {
            width: config.width,
            height: config.height,
            spacing: placed.spacing,
            cells_x: placed.cells_x,
            cells_y: placed.cells_y,
            points: placed.points,
            boundary: placed.boundary,
            cells,
            vertices: graph.vertices,
            features: Vec::new(),
        })
    }

    /// Number of interior cells
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.points.len()
    }

    /// Look up a feature by id
    ///
    /// Returns `None` for `FeatureId::NONE` or an out-of-range id.
    #[inline]
    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        if id.is_none() {
            return None;
        }
        self.features.get(id.0 as usize - 1)
    }

    /// Whether a cell is land (`height >= SEA_LEVEL`)
    ///
    /// # Errors
    ///
    /// `MissingPrerequisite` if heights have not been generated yet.
    pub fn is_land(&self, cell: CellId) -> Result<bool> {
        let heights = &self.cells.height;
        if heights.is_empty() {
            return Err(MapError::MissingPrerequisite("height"));
        }
        heights
            .get(cell.index())
            .map(|h| *h >= SEA_LEVEL)
            .ok_or(MapError::CellNotFound(cell.index()))
    }

    /// Cell containing the given map coordinate
    ///
    /// O(1) via the row-major lattice layout.
    pub fn find_cell(&self, x: f64, y: f64) -> CellId {
        let col = ((x / self.spacing) as usize).min(self.cells_x - 1);
        let row = ((y / self.spacing) as usize).min(self.cells_y - 1);
        CellId((row * self.cells_x + col) as u32)
    }

    /// Drop all simulation buffers, keeping points and topology
    ///
    /// Allows re-running the pipeline with non-geometric parameters changed
    /// without recomputing the Voronoi diagram. Old and new arrays are never
    /// mixed: everything downstream of topology is cleared together.
    pub fn clear_simulation_data(&mut self) {
        self.cells.height.clear();
        self.cells.feature_id.clear();
        self.cells.cell_type.clear();
        self.cells.temperature.clear();
        self.cells.precipitation.clear();
        self.features.clear();
    }
}
