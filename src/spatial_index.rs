// Uniform-grid spatial index over scattered scalar samples
//
// Buckets sample indices into a 3D grid of cubic cells so that neighborhood
// queries touch only the handful of cells around a point instead of the whole
// cloud. Rebuilt from scratch whenever the sample store is replaced; never
// patched incrementally.

use crate::geometry::{Aabb, Point3D};
use crate::samples::SampleStore;
use std::collections::HashMap;

/// Grid cell coordinates (can go negative for query points outside the cloud)
pub type CellKey = (i32, i32, i32);

/// Default number of cells along the longest bounding-box axis.
///
/// Larger values shrink buckets and candidate lists but increase empty-bucket
/// overhead; 50 keeps bucket occupancy low for clouds in the 10^3..10^6 range.
pub const DEFAULT_GRID_RESOLUTION: usize = 50;

pub struct SpatialIndex {
    origin: Point3D,
    cell_size: f64,
    grid_cells: u32,
    buckets: HashMap<CellKey, Vec<u32>>,
    sample_count: usize,
    /// True for stores too small (or too coincident) to bucket meaningfully;
    /// queries then return every index
    degenerate: bool,
}

impl SpatialIndex {
    /// Build the index over a sample store.
    ///
    /// `grid_resolution` is the cell count along the longest bounding-box
    /// axis; `cell_size = max_extent / grid_resolution`. Each sample lands in
    /// exactly one bucket, `floor((position - origin) / cell_size)` per axis.
    pub fn build(store: &SampleStore, grid_resolution: usize) -> Self {
        let sample_count = store.len();

        let bounds = Aabb::from_points(store.samples().iter().map(|s| &s.position));
        let max_extent = if bounds.is_empty() {
            0.0
        } else {
            bounds.max_extent()
        };

        if sample_count <= 1 || max_extent <= 0.0 {
            // Zero samples, one sample, or all samples coincident: every
            // query returns the trivial candidate set.
            return Self {
                origin: if bounds.is_empty() {
                    Point3D::origin()
                } else {
                    bounds.min
                },
                cell_size: 1.0,
                grid_cells: 1,
                buckets: HashMap::new(),
                sample_count,
                degenerate: true,
            };
        }

        let grid_cells = grid_resolution.max(1) as u32;
        let cell_size = max_extent / grid_cells as f64;
        let origin = bounds.min;

        let mut buckets: HashMap<CellKey, Vec<u32>> = HashMap::new();
        for (i, sample) in store.samples().iter().enumerate() {
            let key = cell_key(&sample.position, &origin, cell_size);
            buckets.entry(key).or_default().push(i as u32);
        }

        log::debug!(
            "SpatialIndex: {} samples in {} buckets, cell size {:.4} ({} cells on longest axis)",
            sample_count,
            buckets.len(),
            cell_size,
            grid_cells
        );

        Self {
            origin,
            cell_size,
            grid_cells,
            buckets,
            sample_count,
            degenerate: false,
        }
    }

    /// All sample indices found in the `(2r+1)^3` cube of buckets centered on
    /// the bucket containing `point`.
    ///
    /// Growing the radius never removes a candidate, so any radius large
    /// enough to reach a sample yields a superset of the true nearest
    /// neighbors within it.
    pub fn query_neighborhood(&self, point: &Point3D, search_radius_cells: u32) -> Vec<u32> {
        if self.degenerate {
            return (0..self.sample_count as u32).collect();
        }

        let (cx, cy, cz) = cell_key(point, &self.origin, self.cell_size);
        let r = search_radius_cells as i32;

        let mut candidates = Vec::new();
        for dz in -r..=r {
            for dy in -r..=r {
                for dx in -r..=r {
                    if let Some(bucket) = self.buckets.get(&(cx + dx, cy + dy, cz + dz)) {
                        candidates.extend_from_slice(bucket);
                    }
                }
            }
        }
        candidates
    }

    /// Cell count along the longest axis; a query radius this large covers
    /// the entire grid from any interior cell
    pub fn grid_cells(&self) -> u32 {
        self.grid_cells
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }
}

fn cell_key(point: &Point3D, origin: &Point3D, cell_size: f64) -> CellKey {
    (
        ((point.x - origin.x) / cell_size).floor() as i32,
        ((point.y - origin.y) / cell_size).floor() as i32,
        ((point.z - origin.z) / cell_size).floor() as i32,
    )
}
