//! Point placement
//!
//! Lays a jittered square lattice of interior points sized to approximate
//! the desired cell count, plus a ring of boundary points outside the map
//! rectangle so that Voronoi cells near the edge stay bounded. Boundary
//! points never receive heights or features; they exist only to close the
//! diagram.

use glam::DVec2;

use crate::rng::MapRng;

/// Result of point placement
#[derive(Debug, Clone)]
pub struct PlacedPoints {
    /// Lattice spacing in pixels
    pub spacing: f64,
    /// Lattice width in cells
    pub cells_x: usize,
    /// Lattice height in cells
    pub cells_y: usize,
    /// Interior points, row-major
    pub points: Vec<DVec2>,
    /// Boundary ring outside the map rectangle
    pub boundary: Vec<DVec2>,
}

/// Round to 2 decimal places; keeps coordinates short and reproducible
#[inline]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Place interior and boundary points for the given map size and density
///
/// Spacing is `sqrt(width * height / cells_desired)` rounded to 2 decimals;
/// each lattice point is jittered by up to ±45% of the spacing for
/// natural-looking cells.
pub fn place_points(
    width: f64,
    height: f64,
    cells_desired: usize,
    rng: &mut MapRng,
) -> PlacedPoints {
    let spacing = round2((width * height / cells_desired as f64).sqrt());

    let boundary = boundary_points(width, height, spacing);
    let points = jittered_grid(width, height, spacing, rng);

    let cells_x = ((width + 0.5 * spacing - 1e-10) / spacing).floor() as usize;
    let cells_y = ((height + 0.5 * spacing - 1e-10) / spacing).floor() as usize;
    debug_assert_eq!(points.len(), cells_x * cells_y);

    PlacedPoints {
        spacing,
        cells_x,
        cells_y,
        points,
        boundary,
    }
}

/// Row-major lattice with per-point jitter
fn jittered_grid(width: f64, height: f64, spacing: f64, rng: &mut MapRng) -> Vec<DVec2> {
    let radius = spacing / 2.0;
    let jittering = radius * 0.9;

    let mut points = Vec::new();
    let mut y = radius;
    while y < height {
        let mut x = radius;
        while x < width {
            let jx = rng.range_f64(-jittering, jittering);
            let jy = rng.range_f64(-jittering, jittering);
            points.push(DVec2::new(
                round2(x + jx).min(width),
                round2(y + jy).min(height),
            ));
            x += spacing;
        }
        y += spacing;
    }
    points
}

/// Ring of points at `spacing` outside the rectangle, at double spacing
fn boundary_points(width: f64, height: f64, spacing: f64) -> Vec<DVec2> {
    let offset = (-spacing).round();
    let b_spacing = spacing * 2.0;
    let w = width - offset * 2.0;
    let h = height - offset * 2.0;
    let number_x = ((w / b_spacing).ceil() - 1.0).max(1.0) as usize;
    let number_y = ((h / b_spacing).ceil() - 1.0).max(1.0) as usize;

    let mut points = Vec::with_capacity((number_x + number_y) * 2);
    for i in 0..number_x {
        let x = (w * (i as f64 + 0.5) / number_x as f64 + offset).ceil();
        points.push(DVec2::new(x, offset));
        points.push(DVec2::new(x, h + offset));
    }
    for i in 0..number_y {
        let y = (h * (i as f64 + 0.5) / number_y as f64 + offset).ceil();
        points.push(DVec2::new(offset, y));
        points.push(DVec2::new(w + offset, y));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_count_approximates_desired() {
        let mut rng = MapRng::from_seed("points");
        let placed = place_points(512.0, 512.0, 1_000, &mut rng);

        assert_eq!(placed.points.len(), placed.cells_x * placed.cells_y);
        let count = placed.points.len() as f64;
        assert!(
            (count - 1_000.0).abs() / 1_000.0 < 0.15,
            "{} points for 1000 desired",
            count
        );
    }

    #[test]
    fn test_points_inside_rect() {
        let mut rng = MapRng::from_seed("inside");
        let placed = place_points(960.0, 540.0, 10_000, &mut rng);

        for p in &placed.points {
            assert!(p.x >= 0.0 && p.x <= 960.0, "x = {}", p.x);
            assert!(p.y >= 0.0 && p.y <= 540.0, "y = {}", p.y);
        }
    }

    #[test]
    fn test_boundary_outside_rect() {
        let mut rng = MapRng::from_seed("boundary");
        let placed = place_points(512.0, 512.0, 1_000, &mut rng);

        assert!(!placed.boundary.is_empty());
        for p in &placed.boundary {
            let outside =
                p.x <= 0.0 || p.y <= 0.0 || p.x >= 512.0 || p.y >= 512.0;
            assert!(outside, "boundary point {:?} inside map rect", p);
        }
    }

    #[test]
    fn test_determinism() {
        let mut rng1 = MapRng::from_seed("det");
        let mut rng2 = MapRng::from_seed("det");

        let a = place_points(512.0, 512.0, 1_000, &mut rng1);
        let b = place_points(512.0, 512.0, 1_000, &mut rng2);

        assert_eq!(a.points, b.points);
        assert_eq!(a.boundary, b.boundary);
    }

    #[test]
    fn test_spacing_formula() {
        let mut rng = MapRng::from_seed("spacing");
        let placed = place_points(512.0, 512.0, 1_000, &mut rng);
        // sqrt(512 * 512 / 1000) = 16.19...
        assert!((placed.spacing - 16.19).abs() < 0.01);
    }
}
