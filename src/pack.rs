//! Mesh refinement ("pack")
//!
//! Derives a denser, coastline-focused mesh from a simulated grid: coastal
//! cells and near-coast water keep their points, deep ocean is sampled
//! sparsely, deep lake interiors are dropped, and extra points are inserted
//! at the midpoints of long same-type coastline edges to sharpen the
//! shoreline. The Voronoi builder then runs again over this point set.
//!
//! A `Pack` is strictly downstream of its `Grid` and disposable on its own;
//! the `source_grid` indices are lookup references, not ownership.

use glam::DVec2;

use crate::error::{MapError, Result};
use crate::grid::{cell_type, FeatureId, FeatureKind, Grid, SEA_LEVEL};
use crate::voronoi::{self, VertexStore};

/// Per-cell buffers of the refined mesh
///
/// Same shape as the grid's cell buffers, plus the polygon `area` and the
/// weak back-reference into the source grid.
#[derive(Debug, Clone, Default)]
pub struct PackCellStore {
    /// Adjacent pack cell ids
    pub neighbors: Vec<Vec<u32>>,
    /// Ordered Voronoi vertex ring per cell
    pub vertices: Vec<Vec<u32>>,
    /// Whether the cell touches the boundary ring
    pub is_border: Vec<bool>,
    /// Elevation carried over from the source grid cell
    pub height: Vec<u8>,
    /// Owning feature, copied from the source grid cell
    pub feature_id: Vec<FeatureId>,
    /// Distance-to-coast marker, copied from the source grid cell
    pub cell_type: Vec<i8>,
    /// Temperature, copied from the source grid cell
    pub temperature: Vec<i8>,
    /// Precipitation, copied from the source grid cell
    pub precipitation: Vec<u8>,
    /// Grid cell each pack cell was derived from (lookup only)
    pub source_grid: Vec<u32>,
    /// Polygon area in square pixels, clamped to u16
    pub area: Vec<u16>,
}

impl PackCellStore {
    /// Number of pack cells
    #[inline]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

/// The coastline-refined mesh used for final geometry
#[derive(Debug, Clone)]
pub struct Pack {
    /// Pack cell center points
    pub points: Vec<DVec2>,
    /// Per-cell buffers
    pub cells: PackCellStore,
    /// Voronoi vertex buffers
    pub vertices: VertexStore,
}

impl Pack {
    /// Number of pack cells
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.points.len()
    }

    /// Whether a pack cell is land
    #[inline]
    pub fn is_land(&self, cell: usize) -> bool {
        self.cells.height[cell] >= SEA_LEVEL
    }
}

/// Refine a fully simulated grid into a pack
///
/// # Errors
///
/// `MissingPrerequisite` if heights, features or climate buffers are
/// missing (the pack copies all of them).
pub fn regraph(grid: &Grid) -> Result<Pack> {
    if grid.cells.height.is_empty() {
        return Err(MapError::MissingPrerequisite("height"));
    }
    if grid.cells.feature_id.is_empty() {
        return Err(MapError::MissingPrerequisite("feature_id"));
    }
    if grid.cells.temperature.is_empty() || grid.cells.precipitation.is_empty() {
        return Err(MapError::MissingPrerequisite("climate"));
    }

    let mut points: Vec<DVec2> = Vec::new();
    let mut source: Vec<u32> = Vec::new();
    let spacing_sq = grid.spacing * grid.spacing;
    // Rounded midpoints of nearby edges can coincide; duplicates would
    // leave the triangulator with pointless zero-area cells
    let mut occupied: std::collections::HashSet<(i64, i64)> = std::collections::HashSet::new();

    for i in 0..grid.cell_count() {
        let height = grid.cells.height[i];
        let kind = grid.cells.cell_type[i];

        // Water beyond one step from the coast is mostly uninteresting
        if height < SEA_LEVEL && kind != cell_type::WATER_COAST && kind != cell_type::DEEP_WATER
        {
            continue;
        }
        if kind == cell_type::DEEP_WATER {
            let in_lake = grid
                .feature(grid.cells.feature_id[i])
                .map(|f| f.kind == FeatureKind::Lake)
                .unwrap_or(false);
            // Deep lake interiors add nothing; deep ocean is kept sparsely
            if in_lake || i % 4 != 0 {
                continue;
            }
        }

        let p = grid.points[i];
        occupied.insert(((p.x * 10.0).round() as i64, (p.y * 10.0).round() as i64));
        points.push(p);
        source.push(i as u32);

        // Sharpen the coastline: split long same-type coastal edges
        if kind == cell_type::LAND_COAST || kind == cell_type::WATER_COAST {
            if grid.cells.is_border[i] {
                continue;
            }
            for &e in &grid.cells.neighbors[i] {
                let e = e as usize;
                if i > e || grid.cells.cell_type[e] != kind {
                    continue;
                }
                let q = grid.points[e];
                if p.distance_squared(q) < spacing_sq {
                    continue;
                }
                let mid = DVec2::new(
                    ((p.x + q.x) / 2.0 * 10.0).round() / 10.0,
                    ((p.y + q.y) / 2.0 * 10.0).round() / 10.0,
                );
                if !occupied.insert(((mid.x * 10.0).round() as i64, (mid.y * 10.0).round() as i64))
                {
                    continue;
                }
                points.push(mid);
                source.push(i as u32);
            }
        }
    }

    let graph = voronoi::compute(&points, &grid.boundary)?;

    let n = points.len();
    let mut cells = PackCellStore {
        neighbors: graph.neighbors,
        vertices: graph.cell_vertices,
        is_border: graph.is_border,
        height: Vec::with_capacity(n),
        feature_id: Vec::with_capacity(n),
        cell_type: Vec::with_capacity(n),
        temperature: Vec::with_capacity(n),
        precipitation: Vec::with_capacity(n),
        source_grid: source,
        area: Vec::with_capacity(n),
    };

    for &g in &cells.source_grid {
        let g = g as usize;
        cells.height.push(grid.cells.height[g]);
        cells.feature_id.push(grid.cells.feature_id[g]);
        cells.cell_type.push(grid.cells.cell_type[g]);
        cells.temperature.push(grid.cells.temperature[g]);
        cells.precipitation.push(grid.cells.precipitation[g]);
    }

    for ring in &cells.vertices {
        let area = polygon_area(ring, &graph.vertices);
        cells.area.push(area.round().min(f64::from(u16::MAX)) as u16);
    }

    log::debug!(
        "packed {} grid cells into {} pack cells",
        grid.cell_count(),
        n
    );

    Ok(Pack {
        points,
        cells,
        vertices: graph.vertices,
    })
}

/// Shoelace area of a cell's vertex ring
fn polygon_area(ring: &[u32], vertices: &VertexStore) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = vertices.positions[ring[i] as usize];
        let b = vertices.positions[ring[(i + 1) % ring.len()] as usize];
        sum += a.x * b.y - b.x * a.y;
    }
    sum.abs() / 2.0
}
