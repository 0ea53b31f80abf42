// Axis-aligned cross-section sampling
//
// Walks a resolution×resolution grid of points on the requested plane,
// estimating the scalar field and testing containment per pixel. This is the
// per-slice hot path; the pixel loop runs in parallel under rayon, with an
// order-preserving collect so identical inputs always produce identical
// rasters.

use crate::containment::ContainmentOracle;
use crate::geometry::{Axis, Point3D};
use crate::interpolate::Interpolator;
use crate::mesh::{DisplayTransform, Mesh};
use crate::samples::SampleStore;
use crate::spatial_index::SpatialIndex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One requested cross section: the plane `axis = value` in display-frame
/// units, rasterized at `resolution × resolution`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliceSpec {
    pub axis: Axis,
    pub value: f64,
    pub resolution: u32,
}

/// Interpolated, masked scalar raster before color mapping
#[derive(Debug, Clone, PartialEq)]
pub struct RawSlice {
    pub resolution: u32,
    /// Row-major scalar estimates, index `j * resolution + i`
    pub values: Vec<f64>,
    /// True where the pixel is inside the solid and backed by data
    pub mask: Vec<bool>,
    /// (min, max) over masked-in values only; `None` when nothing is inside
    pub value_range: Option<(f64, f64)>,
}

impl RawSlice {
    /// Raster with every pixel masked out (empty data set, or a plane that
    /// misses the mesh entirely)
    pub fn all_masked(resolution: u32) -> Self {
        let n = (resolution * resolution) as usize;
        Self {
            resolution,
            values: vec![0.0; n],
            mask: vec![false; n],
            value_range: None,
        }
    }
}

/// Samples cross sections of the interpolated field
#[derive(Debug, Clone, Copy)]
pub struct SliceSampler {
    /// Margin applied to the plane half-size derived from the mesh bounds
    pub plane_margin: f64,
    /// Neighbors per IDW estimate
    pub neighbor_count: usize,
    /// Initial spatial-index search radius in cells
    pub search_radius_cells: u32,
}

impl Default for SliceSampler {
    fn default() -> Self {
        Self {
            plane_margin: 1.1,
            neighbor_count: 6,
            search_radius_cells: 2,
        }
    }
}

impl SliceSampler {
    /// Rasterize the slice plane.
    ///
    /// The plane spans the mesh's display-frame bounding box on the two
    /// in-plane axes (times `plane_margin`). Query points are generated in
    /// the display frame and inverse-transformed to the mesh's original
    /// frame before interpolation and containment, since the samples live
    /// there. A plane that misses the display-frame bounding box entirely
    /// short-circuits to an all-masked raster.
    pub fn sample(
        &self,
        spec: &SliceSpec,
        store: &SampleStore,
        index: &SpatialIndex,
        oracle: &ContainmentOracle,
        mesh: &Mesh,
        transform: &DisplayTransform,
    ) -> RawSlice {
        let resolution = spec.resolution.max(1);
        let display_bounds = transform.bounds_to_display(&mesh.bounds);

        if !display_bounds.contains_on_axis(spec.axis, spec.value) {
            log::debug!(
                "Slice {}={:.2} misses the mesh bounds, skipping pixel queries",
                spec.axis.label(),
                spec.value
            );
            return RawSlice::all_masked(resolution);
        }

        // Half-size of the plane from the two in-plane extents
        let extent = display_bounds.extent();
        let (u_axis, v_axis) = in_plane_axes(spec.axis);
        let half = 0.5
            * extent[u_axis.index()].max(extent[v_axis.index()])
            * self.plane_margin;

        let interpolator = Interpolator::new(store, index, self.search_radius_cells);
        let n = (resolution * resolution) as usize;
        let res = resolution as f64;

        let pixels: Vec<(f64, bool)> = (0..n)
            .into_par_iter()
            .map(|idx| {
                let i = (idx as u32 % resolution) as f64;
                let j = (idx as u32 / resolution) as f64;

                // Pixel centers in plane-local coordinates
                let u = ((i + 0.5) / res - 0.5) * 2.0 * half;
                let v = ((j + 0.5) / res - 0.5) * 2.0 * half;

                let display_point = plane_point(spec.axis, spec.value, u, v);
                let world_point = transform.to_world(&display_point);

                if !oracle.is_inside(&world_point) {
                    return (0.0, false);
                }
                match interpolator.estimate(&world_point, self.neighbor_count) {
                    Some(value) => (value, true),
                    None => (0.0, false),
                }
            })
            .collect();

        let mut values = Vec::with_capacity(n);
        let mut mask = Vec::with_capacity(n);
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut any_inside = false;

        for (value, inside) in pixels {
            if inside {
                min = min.min(value);
                max = max.max(value);
                any_inside = true;
            }
            values.push(value);
            mask.push(inside);
        }

        RawSlice {
            resolution,
            values,
            mask,
            value_range: any_inside.then_some((min, max)),
        }
    }
}

/// The two world axes spanned by a plane orthogonal to `fixed`
fn in_plane_axes(fixed: Axis) -> (Axis, Axis) {
    match fixed {
        Axis::Z => (Axis::X, Axis::Y),
        Axis::X => (Axis::Y, Axis::Z),
        Axis::Y => (Axis::X, Axis::Z),
    }
}

/// Map plane-local (u, v) plus the fixed coordinate to a 3D display point
fn plane_point(axis: Axis, value: f64, u: f64, v: f64) -> Point3D {
    match axis {
        Axis::Z => Point3D::new(u, v, value),
        Axis::X => Point3D::new(value, u, v),
        Axis::Y => Point3D::new(u, value, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containment::ContainmentStrategy;
    use crate::geometry::Triangle;
    use crate::samples::ScalarSample;
    use crate::spatial_index::DEFAULT_GRID_RESOLUTION;

    /// Closed unit-ish cube spanning [-h, h]^3
    fn make_cube(half: f64) -> Mesh {
        let p = |sx: f64, sy: f64, sz: f64| Point3D::new(sx * half, sy * half, sz * half);
        let triangles = vec![
            Triangle::new(p(-1.0, -1.0, -1.0), p(-1.0, 1.0, -1.0), p(-1.0, 1.0, 1.0)),
            Triangle::new(p(-1.0, -1.0, -1.0), p(-1.0, 1.0, 1.0), p(-1.0, -1.0, 1.0)),
            Triangle::new(p(1.0, -1.0, -1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, -1.0)),
            Triangle::new(p(1.0, -1.0, -1.0), p(1.0, -1.0, 1.0), p(1.0, 1.0, 1.0)),
            Triangle::new(p(-1.0, -1.0, -1.0), p(1.0, -1.0, 1.0), p(1.0, -1.0, -1.0)),
            Triangle::new(p(-1.0, -1.0, -1.0), p(-1.0, -1.0, 1.0), p(1.0, -1.0, 1.0)),
            Triangle::new(p(-1.0, 1.0, -1.0), p(1.0, 1.0, -1.0), p(1.0, 1.0, 1.0)),
            Triangle::new(p(-1.0, 1.0, -1.0), p(1.0, 1.0, 1.0), p(-1.0, 1.0, 1.0)),
            Triangle::new(p(-1.0, -1.0, -1.0), p(1.0, -1.0, -1.0), p(1.0, 1.0, -1.0)),
            Triangle::new(p(-1.0, -1.0, -1.0), p(1.0, 1.0, -1.0), p(-1.0, 1.0, -1.0)),
            Triangle::new(p(-1.0, -1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, -1.0, 1.0)),
            Triangle::new(p(-1.0, -1.0, 1.0), p(-1.0, 1.0, 1.0), p(1.0, 1.0, 1.0)),
        ];
        Mesh::new(triangles).unwrap()
    }

    fn make_store(data: &[(f64, f64, f64, f64)]) -> SampleStore {
        SampleStore::from_samples(
            data.iter()
                .map(|&(x, y, z, value)| ScalarSample {
                    position: Point3D::new(x, y, z),
                    value,
                })
                .collect(),
        )
    }

    fn setup(
        data: &[(f64, f64, f64, f64)],
    ) -> (SampleStore, SpatialIndex, ContainmentOracle, Mesh, DisplayTransform) {
        let store = make_store(data);
        let index = SpatialIndex::build(&store, DEFAULT_GRID_RESOLUTION);
        let mesh = make_cube(5.0);
        let oracle = ContainmentOracle::build(&mesh, ContainmentStrategy::RayParity);
        let transform = mesh.display_transform(50.0);
        (store, index, oracle, mesh, transform)
    }

    #[test]
    fn test_slice_through_cube_has_inside_pixels() {
        let (store, index, oracle, mesh, transform) = setup(&[
            (0.0, 0.0, 0.0, 1.0),
            (2.0, 2.0, 2.0, 2.0),
            (-2.0, -2.0, -2.0, 3.0),
        ]);
        let sampler = SliceSampler::default();
        let spec = SliceSpec {
            axis: Axis::Z,
            value: 0.0,
            resolution: 16,
        };

        let raw = sampler.sample(&spec, &store, &index, &oracle, &mesh, &transform);

        let inside = raw.mask.iter().filter(|&&m| m).count();
        assert!(inside > 0, "plane through the cube center must hit inside pixels");
        assert!(
            inside < raw.mask.len(),
            "margin pixels beyond the cube must be masked out"
        );

        let (min, max) = raw.value_range.expect("inside pixels imply a value range");
        assert!(min >= 1.0 && max <= 3.0, "range {:?} within sample values", (min, max));

        // The raster center maps to the cube center, nearest sample value 1.0
        let mid = (8 * 16 + 8) as usize;
        assert!(raw.mask[mid]);
    }

    #[test]
    fn test_plane_missing_bounds_short_circuits() {
        let (store, index, oracle, mesh, transform) = setup(&[(0.0, 0.0, 0.0, 1.0)]);
        let sampler = SliceSampler::default();

        // Display bounds reach ~±28.9 (corner at radius 50); 40 is outside
        let spec = SliceSpec {
            axis: Axis::Z,
            value: 40.0,
            resolution: 8,
        };
        let raw = sampler.sample(&spec, &store, &index, &oracle, &mesh, &transform);

        assert!(raw.mask.iter().all(|&m| !m));
        assert_eq!(raw.value_range, None);
    }

    #[test]
    fn test_empty_store_masks_everything() {
        let (store, index, oracle, mesh, transform) = setup(&[]);
        let sampler = SliceSampler::default();
        let spec = SliceSpec {
            axis: Axis::Y,
            value: 0.0,
            resolution: 8,
        };

        let raw = sampler.sample(&spec, &store, &index, &oracle, &mesh, &transform);

        assert!(raw.mask.iter().all(|&m| !m), "no data: every pixel masked");
        assert_eq!(raw.value_range, None);
    }

    #[test]
    fn test_identical_inputs_produce_identical_rasters() {
        let (store, index, oracle, mesh, transform) = setup(&[
            (1.0, 0.5, -0.5, 4.0),
            (-1.0, -0.5, 0.5, 8.0),
        ]);
        let sampler = SliceSampler::default();
        let spec = SliceSpec {
            axis: Axis::X,
            value: 2.0,
            resolution: 12,
        };

        let a = sampler.sample(&spec, &store, &index, &oracle, &mesh, &transform);
        let b = sampler.sample(&spec, &store, &index, &oracle, &mesh, &transform);
        assert_eq!(a, b, "sampling must be deterministic");
    }
}
