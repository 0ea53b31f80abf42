// Inverse-distance-weighted interpolation over the spatial index
//
// The numerical heart of the engine: estimates the scalar field at an
// arbitrary point from its k nearest samples, weighted by 1/d². Pure and
// deterministic for identical inputs, which the cache layer relies on.

use crate::geometry::Point3D;
use crate::samples::SampleStore;
use crate::spatial_index::SpatialIndex;
use std::cmp::Ordering;

/// Guards the 1/d² weight against division by zero when the query point
/// coincides with a sample; also what makes a distance-0 sample dominate
/// the weighted average.
const DISTANCE_EPSILON: f64 = 1e-6;

pub struct Interpolator<'a> {
    store: &'a SampleStore,
    index: &'a SpatialIndex,
    /// Initial neighborhood radius in grid cells; doubled until candidates
    /// are found or the whole grid is covered
    search_radius_cells: u32,
}

impl<'a> Interpolator<'a> {
    pub fn new(store: &'a SampleStore, index: &'a SpatialIndex, search_radius_cells: u32) -> Self {
        Self {
            store,
            index,
            search_radius_cells: search_radius_cells.max(1),
        }
    }

    /// Inverse-distance-weighted estimate at `point` (sample frame) from its
    /// `k` nearest samples: `Σ(w_i · v_i) / Σ(w_i)` with `w_i = 1/(d_i² + ε)`.
    ///
    /// Ties in distance break toward the lowest sample index. Fewer than `k`
    /// candidates average over what exists; `k` is clamped to at least 1.
    /// Returns `None` when there is no data at all, so callers can mask the
    /// pixel instead of coloring a fake zero.
    pub fn estimate(&self, point: &Point3D, k: usize) -> Option<f64> {
        let candidates = self.gather_candidates(point);
        if candidates.is_empty() {
            return None;
        }

        let mut ranked: Vec<(f64, u32)> = candidates
            .into_iter()
            .map(|i| {
                let d2 = (self.store.get(i).position - point).norm_squared();
                (d2, i)
            })
            .collect();
        ranked.sort_unstable_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        let k = k.max(1).min(ranked.len());
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for &(d2, i) in &ranked[..k] {
            let w = 1.0 / (d2 + DISTANCE_EPSILON);
            weighted_sum += w * self.store.get(i).value;
            weight_total += w;
        }

        Some(weighted_sum / weight_total)
    }

    /// Candidate indices near `point`, expanding the search radius until
    /// something is found.
    ///
    /// A query point can sit outside the indexed region entirely (slice
    /// planes extend past the data cloud), so after the cube has grown to
    /// cover the whole grid the search falls back to every sample; distant
    /// data still contributes rather than leaving a hole.
    fn gather_candidates(&self, point: &Point3D) -> Vec<u32> {
        let max_radius = self.index.grid_cells();
        let mut radius = self.search_radius_cells;

        loop {
            let candidates = self.index.query_neighborhood(point, radius);
            if !candidates.is_empty() {
                return candidates;
            }
            if radius >= max_radius {
                break;
            }
            radius = (radius * 2).min(max_radius);
        }

        (0..self.index.sample_count() as u32).collect()
    }
}
