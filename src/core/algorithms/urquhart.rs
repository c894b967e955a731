//! Urquhart graphs: Delaunay edges minus the longest edge of every cell.
//!
//! Optionally, cells that are glued together through removed edges can be
//! merged into *sites*, giving one representative point per merged region.
//!
//! # Examples
//!
//! ```rust
//! use hull_diagrams::core::algorithms::urquhart::Urquhart;
//! use hull_diagrams::core::delaunay_triangulation::Delaunay2;
//! use hull_diagrams::core::edge::EdgeKey;
//!
//! let dt = Delaunay2::process(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).unwrap();
//! let graph = Urquhart::from_delaunay(&dt);
//!
//! assert_eq!(graph.removed_edges(), &[EdgeKey::new(1, 2)]);
//! assert_eq!(graph.edges().len(), 4);
//! assert!(!graph.contains(EdgeKey::new(1, 2)));
//! ```

#![forbid(unsafe_code)]

use std::collections::VecDeque;

use crate::core::collections::FastHashSet;
use crate::core::delaunay_triangulation::{Delaunay, DelaunayCell, DelaunayError};
use crate::core::edge::EdgeKey;
use crate::geometry::traits::coordinate::CoordinateScalar;
use crate::geometry::util::{CircumsphereStrategy, Dimension, centroid, midpoint, squared_distance};

/// How cells joined by removed edges are represented as sites.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UrquhartSiteMerge {
    /// No merging; one site per cell at its centroid.
    #[default]
    None,
    /// One site per merged group, at the average of its cells' vertices.
    MergeSites,
    /// One site per merged group, at the average of the removed edges' midpoints.
    MergeEdges,
}

/// Options for [`Urquhart::from_delaunay_with_options`].
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::core::algorithms::urquhart::{UrquhartOptionsBuilder, UrquhartSiteMerge};
///
/// let options = UrquhartOptionsBuilder::default()
///     .site_merge(UrquhartSiteMerge::MergeEdges)
///     .build()
///     .unwrap();
/// assert_eq!(options.site_merge, UrquhartSiteMerge::MergeEdges);
/// ```
#[derive(Builder, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[builder(default)]
pub struct UrquhartOptions {
    /// Site representation.
    pub site_merge: UrquhartSiteMerge,
}

/// A representative point for one cell or one merged group of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct UrquhartSite<const D: usize> {
    /// Site position.
    pub position: [f64; D],
    /// Indices of the Delaunay cells represented by the site.
    pub cells: Vec<usize>,
    /// Whether any of those cells lies on the hull.
    pub is_on_hull: bool,
}

/// Urquhart graph of a Delaunay triangulation.
#[derive(Clone, Debug)]
pub struct Urquhart<const D: usize> {
    edges: Vec<EdgeKey>,
    removed: Vec<EdgeKey>,
    longest: Vec<EdgeKey>,
    sites: Vec<UrquhartSite<D>>,
}

/// First edge of maximal length within a cell.
fn longest_edge<const D: usize, const L: usize>(
    cell: &DelaunayCell<D, L>,
    positions: &[[f64; D]],
) -> EdgeKey {
    let mut best = EdgeKey::new(cell.vertices()[0], cell.vertices()[1]);
    let mut best_length = f64::NEG_INFINITY;
    for edge in cell.edges() {
        let length = squared_distance(&positions[edge.v0()], &positions[edge.v1()]);
        if length > best_length {
            best_length = length;
            best = edge;
        }
    }
    best
}

impl<const D: usize> Urquhart<D> {
    /// Builds the graph without site merging.
    #[must_use]
    pub fn from_delaunay<const L: usize>(dt: &Delaunay<D, L>) -> Self {
        Self::from_delaunay_with_options(dt, &UrquhartOptions::default())
    }

    /// Builds the graph and its sites.
    #[must_use]
    pub fn from_delaunay_with_options<const L: usize>(
        dt: &Delaunay<D, L>,
        options: &UrquhartOptions,
    ) -> Self {
        let positions = dt.positions();
        let longest: Vec<EdgeKey> = dt
            .cells()
            .iter()
            .map(|cell| longest_edge(cell, positions))
            .collect();

        let mut removed = longest.clone();
        removed.sort_unstable();
        removed.dedup();

        let edges: Vec<EdgeKey> = dt
            .edges()
            .iter()
            .copied()
            .filter(|e| removed.binary_search(e).is_err())
            .collect();

        let sites = match options.site_merge {
            UrquhartSiteMerge::None => dt
                .cells()
                .iter()
                .enumerate()
                .map(|(index, cell)| UrquhartSite {
                    position: *cell.centroid(),
                    cells: vec![index],
                    is_on_hull: cell.is_on_hull(),
                })
                .collect(),
            mode => merged_sites(dt, &removed, mode),
        };

        tracing::debug!(
            delaunay_edges = dt.edges().len(),
            edges = edges.len(),
            removed = removed.len(),
            sites = sites.len(),
            "Urquhart graph built"
        );

        Self {
            edges,
            removed,
            longest,
            sites,
        }
    }

    /// Remaining edges, ascending.
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    /// Edges removed as the longest edge of some cell, ascending.
    #[inline]
    #[must_use]
    pub fn removed_edges(&self) -> &[EdgeKey] {
        &self.removed
    }

    /// Longest edge of each Delaunay cell, by cell index.
    #[inline]
    #[must_use]
    pub fn longest_edges(&self) -> &[EdgeKey] {
        &self.longest
    }

    /// Whether `edge` survived the pruning.
    #[must_use]
    pub fn contains(&self, edge: EdgeKey) -> bool {
        self.edges.binary_search(&edge).is_ok()
    }

    /// Sites in cell order.
    #[inline]
    #[must_use]
    pub fn sites(&self) -> &[UrquhartSite<D>] {
        &self.sites
    }
}

impl<const D: usize> Urquhart<D>
where
    Dimension<D>: CircumsphereStrategy<D>,
{
    /// Triangulates `points` and builds the graph.
    ///
    /// # Errors
    ///
    /// Propagates the [`DelaunayError`] of the triangulation.
    pub fn process<T: CoordinateScalar, const L: usize>(
        points: &[[T; D]],
        options: &UrquhartOptions,
    ) -> Result<Self, DelaunayError> {
        let dt = Delaunay::<D, L>::process(points)?;
        Ok(Self::from_delaunay_with_options(&dt, options))
    }
}

/// Groups cells linked through shared facets that contain a removed edge.
fn merged_sites<const D: usize, const L: usize>(
    dt: &Delaunay<D, L>,
    removed: &[EdgeKey],
    mode: UrquhartSiteMerge,
) -> Vec<UrquhartSite<D>> {
    let removed: FastHashSet<EdgeKey> = removed.iter().copied().collect();
    let positions = dt.positions();
    let cells = dt.cells();
    let mut visited = vec![false; cells.len()];
    let mut queue = VecDeque::new();
    let mut sites = Vec::new();

    for start in 0..cells.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);

        let mut members = Vec::new();
        let mut glue = Vec::new();
        while let Some(index) = queue.pop_front() {
            members.push(index);
            let cell = &cells[index];
            for (slot, neighbor) in cell.neighbors().iter().enumerate() {
                let Some(neighbor) = *neighbor else { continue };
                if visited[neighbor] {
                    continue;
                }
                let facet: Vec<usize> = cell
                    .vertices()
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != slot)
                    .map(|(_, &v)| v)
                    .collect();
                let before = glue.len();
                for (i, &a) in facet.iter().enumerate() {
                    for &b in &facet[i + 1..] {
                        let edge = EdgeKey::new(a, b);
                        if removed.contains(&edge) {
                            glue.push(edge);
                        }
                    }
                }
                if glue.len() > before {
                    visited[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }

        if glue.is_empty() {
            continue;
        }

        let position = match mode {
            UrquhartSiteMerge::MergeEdges => {
                let midpoints: Vec<[f64; D]> = glue
                    .iter()
                    .map(|e| midpoint(&positions[e.v0()], &positions[e.v1()]))
                    .collect();
                centroid(&midpoints)
            }
            _ => centroid(
                members
                    .iter()
                    .flat_map(|&m| cells[m].vertices().iter().map(|&v| &positions[v])),
            ),
        };
        sites.push(UrquhartSite {
            position: position.unwrap_or([0.0; D]),
            is_on_hull: members.iter().any(|&m| cells[m].is_on_hull()),
            cells: members,
        });
    }
    sites
}
