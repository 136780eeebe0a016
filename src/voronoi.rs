//! Voronoi diagram construction
//!
//! Builds a Delaunay triangulation over all points (interior + boundary
//! ring), then derives the dual Voronoi diagram by walking each interior
//! point's incident half-edges: the ordered triangle ids around a point are
//! its Voronoi vertex ring, the edge origins its neighbor list. Each
//! triangle's circumcenter is computed once and shared as a vertex.
//!
//! The half-edge arrangement is owned by `HalfEdgeMesh` and only reached
//! through its accessors; amortized cost is O(1) per edge, O(n) overall.

use delaunator::{triangulate, Point, Triangulation, EMPTY};
use glam::DVec2;

use crate::error::{MapError, Result};

/// Hard cap on the edge walk around a single point; guards termination on
/// corrupt topology
const MAX_CELL_EDGES: usize = 20;

/// Determinant threshold below which a triangle counts as degenerate
const DEGENERATE_EPSILON: f64 = 1e-9;

/// Sentinel for a missing adjacent vertex (triangle on the outer boundary)
pub const NO_VERTEX: u32 = u32::MAX;

/// Delaunay triangulation behind half-edge accessors
///
/// Each triangle contributes three directed half-edges; edge `e` runs from
/// `start(e)` to `end(e)`, its twin (if any) runs the opposite way in the
/// adjacent triangle.
pub struct HalfEdgeMesh {
    triangulation: Triangulation,
}

impl HalfEdgeMesh {
    /// Triangulate a point set
    ///
    /// # Errors
    ///
    /// `GenerationFailed` when the input is too small or fully collinear,
    /// leaving no triangles to build cells from.
    pub fn new(points: &[DVec2]) -> Result<Self> {
        let input: Vec<Point> = points.iter().map(|p| Point { x: p.x, y: p.y }).collect();
        let triangulation = triangulate(&input);
        if triangulation.triangles.is_empty() {
            return Err(MapError::GenerationFailed(format!(
                "triangulation of {} points produced no triangles",
                points.len()
            )));
        }
        Ok(Self { triangulation })
    }

    /// Number of directed half-edges (3 per triangle)
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.triangulation.triangles.len()
    }

    /// Number of triangles
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangulation.triangles.len() / 3
    }

    /// Next half-edge within the same triangle
    #[inline]
    pub fn next(edge: usize) -> usize {
        if edge % 3 == 2 {
            edge - 2
        } else {
            edge + 1
        }
    }

    /// Previous half-edge within the same triangle
    #[inline]
    pub fn prev(edge: usize) -> usize {
        if edge % 3 == 0 {
            edge + 2
        } else {
            edge - 1
        }
    }

    /// Opposite half-edge in the adjacent triangle, or `delaunator::EMPTY`
    /// on the outer boundary
    #[inline]
    pub fn twin(&self, edge: usize) -> usize {
        self.triangulation.halfedges[edge]
    }

    /// Triangle a half-edge belongs to
    #[inline]
    pub fn triangle_of_edge(edge: usize) -> usize {
        edge / 3
    }

    /// Point id a half-edge starts at
    #[inline]
    pub fn start(&self, edge: usize) -> usize {
        self.triangulation.triangles[edge]
    }

    /// Point id a half-edge ends at
    #[inline]
    pub fn end(&self, edge: usize) -> usize {
        self.triangulation.triangles[Self::next(edge)]
    }

    /// The three point ids of a triangle
    #[inline]
    pub fn points_of_triangle(&self, triangle: usize) -> [usize; 3] {
        let e = triangle * 3;
        [
            self.triangulation.triangles[e],
            self.triangulation.triangles[e + 1],
            self.triangulation.triangles[e + 2],
        ]
    }

    /// Ids of the up-to-three triangles sharing an edge with `triangle`
    ///
    /// Boundary slots hold `NO_VERTEX`.
    pub fn triangles_adjacent(&self, triangle: usize) -> [u32; 3] {
        let mut out = [NO_VERTEX; 3];
        for (slot, edge) in (triangle * 3..triangle * 3 + 3).enumerate() {
            let twin = self.twin(edge);
            if twin != EMPTY {
                out[slot] = Self::triangle_of_edge(twin) as u32;
            }
        }
        out
    }

    /// Collect the incoming half-edges around the point `start_edge` ends at
    ///
    /// Walks twin/next pivots until the ring closes, the hull is reached, or
    /// the length cap trips. Returns `true` if the ring closed (the point is
    /// fully enclosed by triangles).
    pub fn edges_around_point(&self, start_edge: usize, out: &mut Vec<usize>) -> bool {
        out.clear();
        let mut incoming = start_edge;
        loop {
            out.push(incoming);
            let outgoing = Self::next(incoming);
            incoming = self.twin(outgoing);
            if incoming == EMPTY {
                return false;
            }
            if incoming == start_edge || out.len() >= MAX_CELL_EDGES {
                return incoming == start_edge;
            }
        }
    }
}

/// Voronoi vertex buffers (one vertex per Delaunay triangle)
#[derive(Debug, Clone, Default)]
pub struct VertexStore {
    /// Vertex coordinates (triangle circumcenters, centroid on degeneracy)
    pub positions: Vec<DVec2>,
    /// The three cells meeting at each vertex
    pub cells: Vec<[u32; 3]>,
    /// Adjacent vertices (`NO_VERTEX` on the outer boundary)
    pub adjacent: Vec<[u32; 3]>,
}

impl VertexStore {
    /// Number of vertices
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Output of the Voronoi builder: per-cell topology plus shared vertices
#[derive(Debug, Clone)]
pub struct VoronoiGraph {
    /// Adjacent interior cell ids per cell
    pub neighbors: Vec<Vec<u32>>,
    /// Ordered Voronoi vertex ring per cell
    pub cell_vertices: Vec<Vec<u32>>,
    /// Whether the cell touches the boundary ring
    pub is_border: Vec<bool>,
    /// Shared vertex buffers
    pub vertices: VertexStore,
}

/// Compute the Voronoi diagram of `points`, bounded by the `boundary` ring
///
/// Only interior points (the first `points.len()` ids) receive cells;
/// boundary points merely close the diagram. Cells adjacent to a boundary
/// point are flagged as border cells.
pub fn compute(points: &[DVec2], boundary: &[DVec2]) -> Result<VoronoiGraph> {
    let interior = points.len();
    let all_points: Vec<DVec2> = points.iter().chain(boundary.iter()).copied().collect();
    let mesh = HalfEdgeMesh::new(&all_points)?;

    let triangle_count = mesh.triangle_count();
    let mut graph = VoronoiGraph {
        neighbors: vec![Vec::new(); interior],
        cell_vertices: vec![Vec::new(); interior],
        is_border: vec![false; interior],
        vertices: VertexStore {
            positions: vec![DVec2::ZERO; triangle_count],
            cells: vec![[0; 3]; triangle_count],
            adjacent: vec![[NO_VERTEX; 3]; triangle_count],
        },
    };

    let mut cell_done = vec![false; interior];
    let mut vertex_done = vec![false; triangle_count];
    let mut degenerate = 0usize;
    let mut walk = Vec::with_capacity(MAX_CELL_EDGES);

    for edge in 0..mesh.edge_count() {
        let point = mesh.end(edge);
        if point < interior && !cell_done[point] {
            cell_done[point] = true;
            let closed = mesh.edges_around_point(edge, &mut walk);

            let ring: Vec<u32> = walk
                .iter()
                .map(|&e| HalfEdgeMesh::triangle_of_edge(e) as u32)
                .collect();
            let neighbors: Vec<u32> = walk
                .iter()
                .map(|&e| mesh.start(e))
                .filter(|&c| c < interior)
                .map(|c| c as u32)
                .collect();

            // A shorter neighbor list means some edges came from boundary
            // points; an open ring means the walk hit the hull itself.
            graph.is_border[point] = !closed || neighbors.len() < walk.len();
            graph.cell_vertices[point] = ring;
            graph.neighbors[point] = neighbors;
        }

        let triangle = HalfEdgeMesh::triangle_of_edge(edge);
        if !vertex_done[triangle] {
            vertex_done[triangle] = true;
            let [a, b, c] = mesh.points_of_triangle(triangle);
            let (position, fell_back) =
                vertex_position(all_points[a], all_points[b], all_points[c]);
            if fell_back {
                degenerate += 1;
            }
            graph.vertices.positions[triangle] = position;
            graph.vertices.cells[triangle] = [a as u32, b as u32, c as u32];
            graph.vertices.adjacent[triangle] = mesh.triangles_adjacent(triangle);
        }
    }

    if degenerate > 0 {
        log::debug!(
            "{} of {} triangles degenerate, fell back to centroid",
            degenerate,
            triangle_count
        );
    }

    if let Some(unreached) = cell_done.iter().position(|done| !done) {
        return Err(MapError::GenerationFailed(format!(
            "point {} produced no Voronoi cell",
            unreached
        )));
    }

    Ok(graph)
}

/// Circumcenter of a triangle, or its centroid when near-degenerate
///
/// Returns the position and whether the centroid fallback was taken.
fn vertex_position(a: DVec2, b: DVec2, c: DVec2) -> (DVec2, bool) {
    let d = 2.0 * ((a.x - c.x) * (b.y - c.y) - (b.x - c.x) * (a.y - c.y));
    if d.abs() < DEGENERATE_EPSILON {
        return ((a + b + c) / 3.0, true);
    }

    let a2 = a.length_squared() - c.length_squared();
    let b2 = b.length_squared() - c.length_squared();
    let ux = (a2 * (b.y - c.y) - b2 * (a.y - c.y)) / d;
    let uy = (b2 * (a.x - c.x) - a2 * (b.x - c.x)) / d;
    (DVec2::new(ux, uy), false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::points::place_points;
    use crate::rng::MapRng;

    fn sample_graph() -> (VoronoiGraph, usize) {
        let mut rng = MapRng::from_seed("voronoi-tests");
        let placed = place_points(512.0, 512.0, 1_000, &mut rng);
        let graph = compute(&placed.points, &placed.boundary).unwrap();
        let n = placed.points.len();
        (graph, n)
    }

    #[test]
    fn test_every_cell_has_geometry() {
        let (graph, n) = sample_graph();

        assert_eq!(graph.neighbors.len(), n);
        for i in 0..n {
            assert!(
                graph.cell_vertices[i].len() >= 3,
                "cell {} has {} vertices",
                i,
                graph.cell_vertices[i].len()
            );
            assert!(!graph.neighbors[i].is_empty(), "cell {} has no neighbors", i);
        }
    }

    #[test]
    fn test_neighbor_symmetry() {
        let (graph, _) = sample_graph();

        for (i, neighbors) in graph.neighbors.iter().enumerate() {
            for &n in neighbors {
                assert!(
                    graph.neighbors[n as usize].contains(&(i as u32)),
                    "cell {} lists {} but not vice versa",
                    i,
                    n
                );
            }
        }
    }

    #[test]
    fn test_border_cells_on_edges_only() {
        let mut rng = MapRng::from_seed("border-test");
        let placed = place_points(512.0, 512.0, 1_000, &mut rng);
        let graph = compute(&placed.points, &placed.boundary).unwrap();

        let border_count = graph.is_border.iter().filter(|b| **b).count();
        assert!(border_count > 0, "map edge must produce border cells");

        // Border cells hug the map edge; nothing deep inside should be one
        let spacing = placed.spacing;
        for (i, is_border) in graph.is_border.iter().enumerate() {
            if *is_border {
                let p = placed.points[i];
                let near_edge = p.x < spacing * 3.0
                    || p.y < spacing * 3.0
                    || p.x > 512.0 - spacing * 3.0
                    || p.y > 512.0 - spacing * 3.0;
                assert!(near_edge, "border cell {} at {:?} far from edge", i, p);
            }
        }
    }

    #[test]
    fn test_vertex_cells_are_valid_triples() {
        let (graph, n) = sample_graph();
        let total = n + 1_000; // interior + some boundary; just bound-check

        for cells in &graph.vertices.cells {
            let [a, b, c] = *cells;
            assert!(a != b && b != c && a != c);
            assert!((a as usize) < total && (b as usize) < total && (c as usize) < total);
        }
    }

    #[test]
    fn test_determinism() {
        let (a, _) = sample_graph();
        let (b, _) = sample_graph();

        assert_eq!(a.neighbors, b.neighbors);
        assert_eq!(a.cell_vertices, b.cell_vertices);
        assert_eq!(a.vertices.positions, b.vertices.positions);
    }

    #[test]
    fn test_half_edge_accessors() {
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 10.0),
            DVec2::new(5.0, 5.0),
        ];
        let mesh = HalfEdgeMesh::new(&points).unwrap();

        for e in 0..mesh.edge_count() {
            assert_eq!(HalfEdgeMesh::prev(HalfEdgeMesh::next(e)), e);
            assert_eq!(
                HalfEdgeMesh::triangle_of_edge(e),
                HalfEdgeMesh::triangle_of_edge(HalfEdgeMesh::next(e))
            );
            let twin = mesh.twin(e);
            if twin != EMPTY {
                assert_eq!(mesh.twin(twin), e, "twin must be symmetric");
                assert_eq!(mesh.start(e), mesh.end(twin));
            }
        }
    }

    #[test]
    fn test_collinear_points_rejected() {
        let points: Vec<DVec2> = (0..10).map(|i| DVec2::new(i as f64, 0.0)).collect();
        assert!(HalfEdgeMesh::new(&points).is_err());
    }

    #[test]
    fn test_degenerate_triangle_falls_back_to_centroid() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(5.0, 0.0);
        let c = DVec2::new(10.0, 1e-12);

        let (position, fell_back) = vertex_position(a, b, c);
        assert!(fell_back);
        let centroid = (a + b + c) / 3.0;
        assert!((position - centroid).length() < 1e-9);
    }

    #[test]
    fn test_circumcenter_equidistant() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(4.0, 0.0);
        let c = DVec2::new(0.0, 4.0);

        let (center, fell_back) = vertex_position(a, b, c);
        assert!(!fell_back);
        let ra = (center - a).length();
        let rb = (center - b).length();
        let rc = (center - c).length();
        assert!((ra - rb).abs() < 1e-9 && (rb - rc).abs() < 1e-9);
    }
}
