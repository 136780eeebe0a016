//! Heightmap synthesis
//!
//! Applies a named template, an ordered list of elevation operations, to
//! assign each grid cell a height in [0, 100]. Blob operations (hill, pit)
//! spread outward from seed cells with a decaying power exponent; line
//! operations (range, trough, strait) trace a path between two points and
//! decay outward from it. Decay exponents are bucketed by cell count so a
//! blob's footprint stays proportional on denser meshes.
//!
//! All randomness comes from the `MapRng` handle, so a (template, seed)
//! pair always produces the same heights.

pub mod templates;

use std::collections::VecDeque;

use crate::error::{MapError, Result};
use crate::grid::{Grid, SEA_LEVEL};
use crate::rng::MapRng;

pub use templates::Template;

/// Inclusive numeric parameter span, resolved through the RNG at run time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    /// Span covering a single value
    pub const fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Span covering [min, max]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn resolve(&self, rng: &mut MapRng) -> f64 {
        rng.range_f64(self.min, self.max)
    }
}

/// Height filter for the add/multiply operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightRange {
    /// Every cell
    All,
    /// Land cells only; edits pivot on sea level so land stays land
    Land,
    /// Cells whose height lies in [min, max]
    Between { min: u8, max: u8 },
}

impl HeightRange {
    fn contains(&self, h: f64) -> bool {
        match self {
            HeightRange::All => true,
            HeightRange::Land => h >= f64::from(SEA_LEVEL),
            HeightRange::Between { min, max } => {
                h >= f64::from(*min) && h <= f64::from(*max)
            }
        }
    }
}

/// Mirror axis for the invert operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Both,
}

/// A single heightmap template operation
///
/// Position spans (`range_x`, `range_y`) are percentages of the map size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    /// Blob raise from `count` seed cells
    Hill {
        count: Span,
        height: Span,
        range_x: Span,
        range_y: Span,
    },
    /// Blob lower from `count` seed cells
    Pit {
        count: Span,
        height: Span,
        range_x: Span,
        range_y: Span,
    },
    /// Ridge raised along a traced path
    Range {
        count: Span,
        height: Span,
        range_x: Span,
        range_y: Span,
    },
    /// Valley lowered along a traced path
    Trough {
        count: Span,
        height: Span,
        range_x: Span,
        range_y: Span,
    },
    /// Water channel carved across the map
    Strait { width: Span, vertical: bool },
    /// Add a value to cells in range (negative lowers)
    Add { value: f64, range: HeightRange },
    /// Multiply heights of cells in range
    Multiply { factor: f64, range: HeightRange },
    /// Blend each cell with its neighborhood mean; higher force blends less
    Smooth { force: f64 },
    /// Scale by distance from map center (negative power: from edge)
    Mask { power: f64 },
    /// Mirror the height field along an axis, with the given probability
    Invert { probability: f64, axis: Axis },
}

/// Blob spread decay exponent per cell-count bucket
fn blob_power(cells: usize) -> f64 {
    match cells {
        0..=1_499 => 0.93,
        1_500..=3_499 => 0.95,
        3_500..=7_499 => 0.97,
        7_500..=14_999 => 0.98,
        15_000..=24_999 => 0.99,
        25_000..=44_999 => 0.991,
        45_000..=74_999 => 0.994,
        _ => 0.9973,
    }
}

/// Line spread decay exponent per cell-count bucket
fn line_power(cells: usize) -> f64 {
    match cells {
        0..=1_499 => 0.75,
        1_500..=3_499 => 0.77,
        3_500..=7_499 => 0.79,
        7_500..=14_999 => 0.81,
        15_000..=24_999 => 0.82,
        25_000..=44_999 => 0.83,
        45_000..=74_999 => 0.86,
        _ => 0.93,
    }
}

#[inline]
fn lim(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Execute a template against a grid, producing the height buffer
///
/// # Errors
///
/// `MissingPrerequisite` if the grid has no Voronoi topology yet.
pub fn generate(grid: &mut Grid, template: &Template, rng: &mut MapRng) -> Result<()> {
    if grid.cells.is_empty() {
        return Err(MapError::MissingPrerequisite("cells"));
    }

    let n = grid.cell_count();
    let mut synth = Synth {
        heights: vec![0.0; n],
        grid,
        rng,
        blob_power: blob_power(n),
        line_power: line_power(n),
    };

    log::debug!("applying heightmap template '{}'", template.name);
    for op in template.operations {
        synth.apply(op);
    }

    let heights: Vec<u8> = synth.heights.iter().map(|h| lim(*h).round() as u8).collect();
    grid.cells.height = heights;
    Ok(())
}

/// Apply the water/mountain sliders to a generated height buffer
///
/// `water_level` shifts all heights so roughly that share of cells sits
/// below sea level; `mountain_level` then scales above-sea relief around
/// the sea-level pivot (50 = neutral).
///
/// # Errors
///
/// `MissingPrerequisite` if heights have not been generated.
pub fn apply_relief_levels(grid: &mut Grid, water_level: u8, mountain_level: u8) -> Result<()> {
    if grid.cells.height.is_empty() {
        return Err(MapError::MissingPrerequisite("height"));
    }

    let heights = &mut grid.cells.height;

    // Quantile shift towards the target water share
    let mut sorted = heights.clone();
    sorted.sort_unstable();
    let rank = (sorted.len() * usize::from(water_level) / 100).min(sorted.len() - 1);
    let shift = i32::from(SEA_LEVEL) - i32::from(sorted[rank]);
    if shift != 0 {
        for h in heights.iter_mut() {
            *h = (i32::from(*h) + shift).clamp(0, 100) as u8;
        }
    }

    // Relief scaling above the sea-level pivot
    if mountain_level != 50 {
        let factor = f64::from(mountain_level) / 50.0;
        for h in heights.iter_mut() {
            if *h >= SEA_LEVEL {
                let relief = f64::from(*h - SEA_LEVEL) * factor;
                *h = lim(f64::from(SEA_LEVEL) + relief).round() as u8;
            }
        }
    }

    Ok(())
}

/// Template execution state
struct Synth<'a> {
    heights: Vec<f64>,
    grid: &'a Grid,
    rng: &'a mut MapRng,
    blob_power: f64,
    line_power: f64,
}

impl Synth<'_> {
    fn apply(&mut self, op: &Operation) {
        match *op {
            Operation::Hill {
                count,
                height,
                range_x,
                range_y,
            } => {
                for _ in 0..self.resolve_count(count) {
                    self.add_hill(height, range_x, range_y);
                }
            }
            Operation::Pit {
                count,
                height,
                range_x,
                range_y,
            } => {
                for _ in 0..self.resolve_count(count) {
                    self.add_pit(height, range_x, range_y);
                }
            }
            Operation::Range {
                count,
                height,
                range_x,
                range_y,
            } => {
                for _ in 0..self.resolve_count(count) {
                    self.add_range(height, range_x, range_y);
                }
            }
            Operation::Trough {
                count,
                height,
                range_x,
                range_y,
            } => {
                for _ in 0..self.resolve_count(count) {
                    self.add_trough(height, range_x, range_y);
                }
            }
            Operation::Strait { width, vertical } => self.add_strait(width, vertical),
            Operation::Add { value, range } => self.modify(range, value, 1.0),
            Operation::Multiply { factor, range } => self.modify(range, 0.0, factor),
            Operation::Smooth { force } => self.smooth(force),
            Operation::Mask { power } => self.mask(power),
            Operation::Invert { probability, axis } => self.invert(probability, axis),
        }
    }

    /// Fractional counts resolve probabilistically: 1.5 gives 1 or 2
    fn resolve_count(&mut self, span: Span) -> u32 {
        let value = span.resolve(self.rng);
        let whole = value.floor();
        whole as u32 + u32::from(self.rng.chance(value - whole))
    }

    /// Random coordinate inside a percentage span of the given extent
    fn point_in(&mut self, span: Span, extent: f64) -> f64 {
        self.rng
            .range_f64(span.min * extent / 100.0, span.max * extent / 100.0)
    }

    fn add_hill(&mut self, height: Span, range_x: Span, range_y: Span) {
        let h = lim(height.resolve(self.rng));

        // Avoid stacking hills into walls: retry while the spot is high
        let mut start = 0;
        for attempt in 0..50 {
            let x = self.point_in(range_x, self.grid.width);
            let y = self.point_in(range_y, self.grid.height);
            start = self.grid.find_cell(x, y).index();
            if self.heights[start] + h <= 90.0 || attempt == 49 {
                break;
            }
        }

        let mut change = vec![0.0f64; self.heights.len()];
        change[start] = h;
        let mut queue = VecDeque::from([start]);
        while let Some(q) = queue.pop_front() {
            for i in 0..self.grid.cells.neighbors[q].len() {
                let c = self.grid.cells.neighbors[q][i] as usize;
                if change[c] != 0.0 {
                    continue;
                }
                change[c] =
                    change[q].powf(self.blob_power) * (self.rng.next_f64() * 0.2 + 0.9);
                if change[c] > 1.0 {
                    queue.push_back(c);
                }
            }
        }

        for (height, delta) in self.heights.iter_mut().zip(&change) {
            *height = lim(*height + delta);
        }
    }

    fn add_pit(&mut self, height: Span, range_x: Span, range_y: Span) {
        let mut h = lim(height.resolve(self.rng));

        // Pits prefer land; retry while the spot is already water
        let mut start = 0;
        for attempt in 0..50 {
            let x = self.point_in(range_x, self.grid.width);
            let y = self.point_in(range_y, self.grid.height);
            start = self.grid.find_cell(x, y).index();
            if self.heights[start] >= f64::from(SEA_LEVEL) || attempt == 49 {
                break;
            }
        }

        let mut used = vec![false; self.heights.len()];
        let mut queue = VecDeque::from([start]);
        while let Some(q) = queue.pop_front() {
            h = h.powf(self.blob_power) * (self.rng.next_f64() * 0.2 + 0.9);
            if h < 1.0 {
                return;
            }
            for i in 0..self.grid.cells.neighbors[q].len() {
                let c = self.grid.cells.neighbors[q][i] as usize;
                if used[c] {
                    continue;
                }
                used[c] = true;
                self.heights[c] = lim(self.heights[c] - h * (self.rng.next_f64() * 0.2 + 0.9));
                queue.push_back(c);
            }
        }
    }

    /// Walk from `from` towards `to`, favoring the neighbor closest to the
    /// target with occasional random detours
    fn trace_path(&mut self, from: usize, to: usize, used: &mut [bool]) -> Vec<usize> {
        let points = &self.grid.points;
        let mut path = vec![from];
        used[from] = true;
        let mut current = from;

        while current != to {
            let mut best = None;
            let mut min = f64::INFINITY;
            for &e in &self.grid.cells.neighbors[current] {
                let e = e as usize;
                if used[e] {
                    continue;
                }
                let mut diff = points[to].distance_squared(points[e]);
                if self.rng.next_f64() > 0.85 {
                    diff /= 2.0;
                }
                if diff < min {
                    min = diff;
                    best = Some(e);
                }
            }
            match best {
                Some(next) => {
                    path.push(next);
                    used[next] = true;
                    current = next;
                }
                None => break, // dead end; keep what we have
            }
        }
        path
    }

    /// Pick a path end point a reasonable distance from the start
    fn pick_far_point(&mut self, start_x: f64, start_y: f64) -> (f64, f64) {
        let (w, h) = (self.grid.width, self.grid.height);
        let mut end = (w / 2.0, h / 2.0);
        for _ in 0..50 {
            let x = self.rng.next_f64() * w * 0.8 + w * 0.1;
            let y = self.rng.next_f64() * h * 0.7 + h * 0.15;
            end = (x, y);
            let dist = (x - start_x).abs() + (y - start_y).abs();
            if dist >= w / 8.0 && dist <= w / 3.0 {
                break;
            }
        }
        end
    }

    fn add_range(&mut self, height: Span, range_x: Span, range_y: Span) {
        let mut h = lim(height.resolve(self.rng));

        let start_x = self.point_in(range_x, self.grid.width);
        let start_y = self.point_in(range_y, self.grid.height);
        let (end_x, end_y) = self.pick_far_point(start_x, start_y);

        let start = self.grid.find_cell(start_x, start_y).index();
        let end = self.grid.find_cell(end_x, end_y).index();

        let mut used = vec![false; self.heights.len()];
        let ridge = self.trace_path(start, end, &mut used);

        // Raise the ridge, then spread outward with line-power decay
        let mut queue = ridge.clone();
        let mut spread_steps = 0;
        while !queue.is_empty() {
            let frontier = std::mem::take(&mut queue);
            spread_steps += 1;
            for &i in &frontier {
                self.heights[i] = lim(self.heights[i] + h * (self.rng.next_f64() * 0.3 + 0.85));
            }
            h = h.powf(self.line_power) - 1.0;
            if h < 2.0 {
                break;
            }
            for &f in &frontier {
                for &c in &self.grid.cells.neighbors[f] {
                    let c = c as usize;
                    if !used[c] {
                        used[c] = true;
                        queue.push(c);
                    }
                }
            }
        }

        // Prominences: ridges shed spurs downhill every few cells
        for (d, &ridge_cell) in ridge.iter().enumerate() {
            if d % 6 != 0 {
                continue;
            }
            let mut cur = ridge_cell;
            for _ in 0..spread_steps {
                let Some(&min_neighbor) = self.grid.cells.neighbors[cur]
                    .iter()
                    .min_by(|a, b| {
                        self.heights[**a as usize]
                            .partial_cmp(&self.heights[**b as usize])
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                else {
                    break;
                };
                let min_neighbor = min_neighbor as usize;
                self.heights[min_neighbor] =
                    (self.heights[cur] * 2.0 + self.heights[min_neighbor]) / 3.0;
                cur = min_neighbor;
            }
        }
    }

    fn add_trough(&mut self, height: Span, range_x: Span, range_y: Span) {
        let mut h = lim(height.resolve(self.rng));

        // Troughs prefer to start on land
        let (mut start_x, mut start_y) = (0.0, 0.0);
        let mut start = 0;
        for attempt in 0..50 {
            start_x = self.point_in(range_x, self.grid.width);
            start_y = self.point_in(range_y, self.grid.height);
            start = self.grid.find_cell(start_x, start_y).index();
            if self.heights[start] >= f64::from(SEA_LEVEL) || attempt == 49 {
                break;
            }
        }
        let (end_x, end_y) = self.pick_far_point(start_x, start_y);
        let end = self.grid.find_cell(end_x, end_y).index();

        let mut used = vec![false; self.heights.len()];
        let valley = self.trace_path(start, end, &mut used);

        let mut queue = valley;
        while !queue.is_empty() {
            let frontier = std::mem::take(&mut queue);
            for &i in &frontier {
                self.heights[i] = lim(self.heights[i] - h * (self.rng.next_f64() * 0.3 + 0.85));
            }
            h = h.powf(self.line_power) - 1.0;
            if h < 2.0 {
                break;
            }
            for &f in &frontier {
                for &c in &self.grid.cells.neighbors[f] {
                    let c = c as usize;
                    if !used[c] {
                        used[c] = true;
                        queue.push(c);
                    }
                }
            }
        }
    }

    fn add_strait(&mut self, width: Span, vertical: bool) {
        let mut width = width.resolve(self.rng).min(self.grid.cells_x as f64 / 3.0);
        if width < 1.0 {
            if !self.rng.chance(width) {
                return;
            }
            width = 1.0;
        }

        let (w, h) = (self.grid.width, self.grid.height);
        let (start_x, start_y, end_x, end_y) = if vertical {
            let sx = (self.rng.next_f64() * w * 0.4 + w * 0.3).floor();
            let ex = (w - sx - w * 0.1 + self.rng.next_f64() * w * 0.2).floor();
            (sx, 5.0, ex, h - 5.0)
        } else {
            let sy = (self.rng.next_f64() * h * 0.4 + h * 0.3).floor();
            let ey = (h - sy - h * 0.1 + self.rng.next_f64() * h * 0.2).floor();
            (5.0, sy, w - 5.0, ey)
        };

        let start = self.grid.find_cell(start_x, start_y).index();
        let end = self.grid.find_cell(end_x, end_y).index();

        let mut path_used = vec![false; self.heights.len()];
        let mut range = self.trace_path(start, end, &mut path_used);

        let mut used = vec![false; self.heights.len()];
        let step = 0.1 / width;
        let mut remaining = width;
        while remaining > 0.0 {
            let exp = 0.9 - step * remaining;
            let mut query = Vec::new();
            for &r in &range {
                for &e in &self.grid.cells.neighbors[r] {
                    let e = e as usize;
                    if used[e] {
                        continue;
                    }
                    used[e] = true;
                    query.push(e);
                    self.heights[e] = self.heights[e].powf(exp);
                    if self.heights[e] > 100.0 {
                        self.heights[e] = 5.0;
                    }
                }
            }
            range = query;
            remaining -= 1.0;
        }
    }

    fn modify(&mut self, range: HeightRange, add: f64, mult: f64) {
        for h in &mut self.heights {
            if !range.contains(*h) {
                continue;
            }
            let mut v = *h;
            if add != 0.0 {
                v = if matches!(range, HeightRange::Land) {
                    (v + add).max(f64::from(SEA_LEVEL))
                } else {
                    v + add
                };
            }
            if mult != 1.0 {
                v = if matches!(range, HeightRange::Land) {
                    (v - f64::from(SEA_LEVEL)) * mult + f64::from(SEA_LEVEL)
                } else {
                    v * mult
                };
            }
            *h = lim(v);
        }
    }

    fn smooth(&mut self, force: f64) {
        let fr = if force > 0.0 { force } else { 2.0 };
        let source = self.heights.clone();
        for (i, h) in self.heights.iter_mut().enumerate() {
            let mut sum = source[i];
            let mut count = 1.0;
            for &c in &self.grid.cells.neighbors[i] {
                sum += source[c as usize];
                count += 1.0;
            }
            let mean = sum / count;
            *h = lim((source[i] * (fr - 1.0) + mean) / fr);
        }
    }

    fn mask(&mut self, power: f64) {
        let fr = if power == 0.0 { 1.0 } else { power.abs() };
        for (i, h) in self.heights.iter_mut().enumerate() {
            let p = self.grid.points[i];
            let nx = (2.0 * p.x) / self.grid.width - 1.0;
            let ny = (2.0 * p.y) / self.grid.height - 1.0;
            let mut distance = (1.0 - nx * nx) * (1.0 - ny * ny);
            if power < 0.0 {
                distance = 1.0 - distance;
            }
            let masked = *h * distance;
            *h = lim((*h * (fr - 1.0) + masked) / fr);
        }
    }

    fn invert(&mut self, probability: f64, axis: Axis) {
        if !self.rng.chance(probability) {
            return;
        }
        let (cells_x, cells_y) = (self.grid.cells_x, self.grid.cells_y);
        let invert_x = axis != Axis::Y;
        let invert_y = axis != Axis::X;

        let source = self.heights.clone();
        for (i, h) in self.heights.iter_mut().enumerate() {
            let x = i % cells_x;
            let y = i / cells_x;
            let nx = if invert_x { cells_x - x - 1 } else { x };
            let ny = if invert_y { cells_y - y - 1 } else { y };
            *h = source[ny * cells_x + nx];
        }
    }
}
