//! Voronoi duals of Delaunay triangulations.
//!
//! Each input vertex owns one [`VoronoiRegion`] made of the Delaunay cells
//! incident to it. Two cells are linked by a Voronoi edge iff they are
//! adjacent Delaunay simplices, so edges are pairs of cell indices. Cell
//! centers (circumcenters by default) give the Voronoi vertex positions.
//!
//! A region is *bounded* when every one of its cells has its circumcenter
//! inside the clipping box: the input bounding box grown by
//! [`VoronoiOptions::bounds_expansion`], or explicit
//! [`VoronoiOptions::bounds`].
//!
//! Regions are assembled in parallel with `rayon` and returned sorted by
//! site.
//!
//! # Examples
//!
//! ```rust
//! use hull_diagrams::core::voronoi::{Voronoi, VoronoiOptions};
//!
//! let points = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [1.0, 1.0]];
//! let options = VoronoiOptions {
//!     bounds_expansion: 1.0,
//!     ..VoronoiOptions::default()
//! };
//! let voronoi = Voronoi::<2>::process::<f64, 3>(&points, &options).unwrap();
//!
//! assert_eq!(voronoi.regions().len(), 5);
//! let center = &voronoi.regions()[4];
//! assert_eq!(center.cells.len(), 4);
//! assert_eq!(center.edges.len(), 4);
//! assert!(center.is_bounded);
//! ```

#![forbid(unsafe_code)]

use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use thiserror::Error;

use crate::core::delaunay_triangulation::{Delaunay, DelaunayError};
use crate::core::edge::EdgeKey;
use crate::geometry::traits::coordinate::CoordinateScalar;
use crate::geometry::util::{Bounds, CircumsphereStrategy, Dimension};

/// Errors that can occur while building a Voronoi diagram.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VoronoiError {
    /// The underlying triangulation failed.
    #[error("Delaunay triangulation failed: {0}")]
    Delaunay(#[from] DelaunayError),
    /// The clipping box is empty, inverted or not finite.
    #[error("Invalid Voronoi bounds: min {min}, max {max}")]
    InvalidBounds {
        /// Lower corner, formatted.
        min: String,
        /// Upper corner, formatted.
        max: String,
    },
}

/// Which point stands for a Delaunay cell in the diagram.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellCenter {
    /// The circumcenter, the exact Voronoi vertex.
    #[default]
    Circumcenter,
    /// The average of the cell's vertices.
    Centroid,
    /// The circumcenter when it lies within bounds, the centroid otherwise.
    Balanced,
}

/// Options for building a [`Voronoi`] diagram.
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::core::voronoi::{CellCenter, VoronoiOptionsBuilder};
///
/// let options = VoronoiOptionsBuilder::<2>::default()
///     .bounds_expansion(5.0)
///     .cell_center(CellCenter::Balanced)
///     .build()
///     .unwrap();
/// assert!(options.bounds.is_none());
/// assert!(!options.prune_out_of_bounds);
/// ```
#[derive(Builder, Clone, Copy, Debug, PartialEq)]
#[builder(default)]
pub struct VoronoiOptions<const D: usize> {
    /// Margin added on every side of the input bounding box.
    pub bounds_expansion: f64,
    /// Explicit clipping box, overriding the expanded input box.
    #[builder(setter(strip_option))]
    pub bounds: Option<Bounds<D>>,
    /// Cell center mode.
    pub cell_center: CellCenter,
    /// Whether [`Voronoi::pruned_edges`] drops edges touching cells whose
    /// circumcenter lies out of bounds. Only applies in
    /// [`CellCenter::Circumcenter`] mode; the other modes place no Voronoi
    /// vertex at an out-of-bounds circumcenter.
    pub prune_out_of_bounds: bool,
}

impl<const D: usize> Default for VoronoiOptions<D> {
    fn default() -> Self {
        Self {
            bounds_expansion: 0.0,
            bounds: None,
            cell_center: CellCenter::Circumcenter,
            prune_out_of_bounds: false,
        }
    }
}

/// The Voronoi region of one input vertex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoronoiRegion {
    /// Input vertex id.
    pub site: usize,
    /// Indices of the Delaunay cells containing the site, ascending.
    pub cells: Vec<usize>,
    /// Adjacent cell pairs inside the region, ascending.
    pub edges: Vec<EdgeKey>,
    /// Whether every cell's circumcenter lies inside the bounds.
    pub is_bounded: bool,
    /// Whether the site lies on the convex hull of the input.
    pub is_on_hull: bool,
}

/// Voronoi diagram of a `D`-dimensional point set.
#[derive(Clone, Debug)]
pub struct Voronoi<const D: usize> {
    regions: Vec<VoronoiRegion>,
    edges: Vec<EdgeKey>,
    pruned_edges: Vec<EdgeKey>,
    circumcenters: Vec<[f64; D]>,
    cell_centers: Vec<[f64; D]>,
    within_bounds: Vec<bool>,
    bounds: Bounds<D>,
}

impl<const D: usize> Voronoi<D> {
    /// Builds the dual of an existing triangulation.
    ///
    /// # Errors
    ///
    /// Returns [`VoronoiError::InvalidBounds`] when the clipping box is not
    /// valid.
    pub fn from_delaunay<const L: usize>(
        dt: &Delaunay<D, L>,
        options: &VoronoiOptions<D>,
    ) -> Result<Self, VoronoiError> {
        let bounds = match options.bounds {
            Some(bounds) => bounds,
            None => Bounds::from_points(dt.positions())
                .map(|b| b.expanded_by(options.bounds_expansion))
                .ok_or_else(|| VoronoiError::InvalidBounds {
                    min: "none".into(),
                    max: "none".into(),
                })?,
        };
        if !bounds.is_valid() {
            return Err(VoronoiError::InvalidBounds {
                min: format!("{:?}", bounds.min),
                max: format!("{:?}", bounds.max),
            });
        }

        let cells = dt.cells();
        let circumcenters: Vec<[f64; D]> = cells.iter().map(|c| *c.circumcenter()).collect();
        let within_bounds: Vec<bool> = circumcenters.iter().map(|c| bounds.contains(c)).collect();
        let cell_centers = cells
            .iter()
            .zip(&within_bounds)
            .map(|(cell, &inside)| match options.cell_center {
                CellCenter::Circumcenter => *cell.circumcenter(),
                CellCenter::Centroid => *cell.centroid(),
                CellCenter::Balanced if inside => *cell.circumcenter(),
                CellCenter::Balanced => *cell.centroid(),
            })
            .collect();

        let incidence = dt.vertex_to_cells();
        let shared = Mutex::new(Vec::with_capacity(incidence.len()));
        (0..dt.positions().len()).into_par_iter().for_each(|site| {
            let Some(members) = incidence.get(&site) else {
                return;
            };
            let mut region_cells: Vec<usize> = members.to_vec();
            region_cells.sort_unstable();

            let mut edges = Vec::new();
            for &c in &region_cells {
                for &n in cells[c].neighbors().iter().flatten() {
                    if region_cells.binary_search(&n).is_ok() {
                        edges.push(EdgeKey::new(c, n));
                    }
                }
            }
            edges.sort_unstable();
            edges.dedup();

            let region = VoronoiRegion {
                site,
                is_bounded: region_cells.iter().all(|&c| within_bounds[c]),
                is_on_hull: dt.is_on_hull(site),
                cells: region_cells,
                edges,
            };
            shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(region);
        });
        let mut regions = shared.into_inner().unwrap_or_else(PoisonError::into_inner);
        regions.sort_unstable_by_key(|r| r.site);

        let mut edges: Vec<EdgeKey> = regions
            .iter()
            .flat_map(|r| r.edges.iter().copied())
            .collect();
        edges.sort_unstable();
        edges.dedup();

        let prune = options.prune_out_of_bounds && options.cell_center == CellCenter::Circumcenter;
        let pruned_edges = if prune {
            edges
                .iter()
                .copied()
                .filter(|e| within_bounds[e.v0()] && within_bounds[e.v1()])
                .collect()
        } else {
            edges.clone()
        };

        tracing::debug!(
            dimension = D,
            regions = regions.len(),
            edges = edges.len(),
            pruned_edges = pruned_edges.len(),
            bounded = regions.iter().filter(|r| r.is_bounded).count(),
            "Voronoi diagram built"
        );

        Ok(Self {
            regions,
            edges,
            pruned_edges,
            circumcenters,
            cell_centers,
            within_bounds,
            bounds,
        })
    }

    /// Regions sorted by site; vertices in no cell have none.
    #[inline]
    #[must_use]
    pub fn regions(&self) -> &[VoronoiRegion] {
        &self.regions
    }

    /// Region of input vertex `site`.
    #[must_use]
    pub fn region(&self, site: usize) -> Option<&VoronoiRegion> {
        self.regions
            .binary_search_by_key(&site, |r| r.site)
            .ok()
            .map(|i| &self.regions[i])
    }

    /// Unique Voronoi edges as pairs of cell indices, ascending.
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    /// Edges left after out-of-bounds pruning, when enabled.
    #[inline]
    #[must_use]
    pub fn pruned_edges(&self) -> &[EdgeKey] {
        &self.pruned_edges
    }

    /// Circumcenter of each Delaunay cell.
    #[inline]
    #[must_use]
    pub fn circumcenters(&self) -> &[[f64; D]] {
        &self.circumcenters
    }

    /// Position of each Voronoi vertex under the chosen [`CellCenter`].
    #[inline]
    #[must_use]
    pub fn cell_centers(&self) -> &[[f64; D]] {
        &self.cell_centers
    }

    /// Whether the circumcenter of `cell` lies inside the bounds.
    #[inline]
    #[must_use]
    pub fn within_bounds(&self, cell: usize) -> bool {
        self.within_bounds.get(cell).copied().unwrap_or(false)
    }

    /// The clipping box in effect.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> &Bounds<D> {
        &self.bounds
    }
}

impl<const D: usize> Voronoi<D>
where
    Dimension<D>: CircumsphereStrategy<D>,
{
    /// Triangulates `points` and builds the dual.
    ///
    /// # Errors
    ///
    /// Returns [`VoronoiError::Delaunay`] when triangulation fails, or
    /// [`VoronoiError::InvalidBounds`] as for [`Voronoi::from_delaunay`].
    pub fn process<T: CoordinateScalar, const L: usize>(
        points: &[[T; D]],
        options: &VoronoiOptions<D>,
    ) -> Result<Self, VoronoiError> {
        let dt = Delaunay::<D, L>::process(points)?;
        Self::from_delaunay(&dt, options)
    }
}
