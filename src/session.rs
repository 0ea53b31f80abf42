// Slice session: explicit context owning the loaded data and everything
// derived from it
//
// Replaces the ambient scene/mesh/transform references the interactive layer
// would otherwise share. All derived structures (spatial index, containment
// oracle, display transform) are rebuilt completely and swapped in before the
// generation counter advances, so a reader never observes a half-built index.

use crate::cache::SliceCache;
use crate::colormap::{Palette, PaletteId, SliceRaster};
use crate::containment::{ContainmentOracle, ContainmentStrategy};
use crate::mesh::{DisplayTransform, Mesh};
use crate::samples::{ParseError, SampleStore};
use crate::slice::{RawSlice, SliceSampler, SliceSpec};
use crate::spatial_index::{SpatialIndex, DEFAULT_GRID_RESOLUTION};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Engine tuning knobs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Spatial-index cells along the longest bounding-box axis
    pub grid_resolution: usize,

    /// Neighbors per IDW estimate
    pub neighbor_count: usize,

    /// Initial neighborhood search radius in grid cells
    pub search_radius_cells: u32,

    /// Margin applied to the slice plane half-size
    pub plane_margin: f64,

    /// Display-frame bounding-sphere radius the mesh is rescaled to
    pub reference_radius: f64,

    /// Inside/outside test used to mask slice pixels
    pub strategy: ContainmentStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            grid_resolution: DEFAULT_GRID_RESOLUTION,
            neighbor_count: 6,
            search_radius_cells: 2,
            plane_margin: 1.1,
            reference_radius: 50.0,
            strategy: ContainmentStrategy::default(),
        }
    }
}

/// Owns one loaded sample set and mesh plus the structures derived from
/// them, and renders cached cross sections on demand.
pub struct SliceSession {
    config: EngineConfig,
    store: Arc<SampleStore>,
    index: Arc<SpatialIndex>,
    mesh: Option<Arc<Mesh>>,
    oracle: Option<Arc<ContainmentOracle>>,
    transform: DisplayTransform,
    generation: u64,
    cache: SliceCache,
}

impl SliceSession {
    pub fn new(config: EngineConfig) -> Self {
        let store = Arc::new(SampleStore::default());
        let index = Arc::new(SpatialIndex::build(&store, config.grid_resolution));
        Self {
            config,
            store,
            index,
            mesh: None,
            oracle: None,
            transform: DisplayTransform::identity(),
            generation: 0,
            cache: SliceCache::new(),
        }
    }

    /// Parse and install a new sample set, rebuilding the spatial index.
    ///
    /// On a parse error the previous store stays active untouched.
    pub fn load_samples(&mut self, text: &str) -> Result<(), ParseError> {
        let store = Arc::new(SampleStore::parse(text)?);
        let index = Arc::new(SpatialIndex::build(&store, self.config.grid_resolution));

        self.store = store;
        self.index = index;
        self.generation += 1;
        log::info!(
            "Sample set replaced: {} samples, generation {}",
            self.store.len(),
            self.generation
        );
        Ok(())
    }

    /// Install a new mesh: display transform and containment oracle are
    /// rebuilt before the generation advances
    pub fn load_mesh(&mut self, mesh: Mesh) {
        let transform = mesh.display_transform(self.config.reference_radius);
        let oracle = Arc::new(ContainmentOracle::build(&mesh, self.config.strategy));

        log::info!(
            "Mesh replaced: {} triangles, display scale {:.4}",
            mesh.num_triangles(),
            transform.scale
        );

        self.mesh = Some(Arc::new(mesh));
        self.oracle = Some(oracle);
        self.transform = transform;
        self.generation += 1;
    }

    pub fn load_mesh_file<P: AsRef<Path>>(&mut self, path: P) -> crate::Result<()> {
        let mesh = Mesh::from_stl(path)?;
        self.load_mesh(mesh);
        Ok(())
    }

    /// Monotonic identity of the currently loaded data; bumped on every
    /// sample-set or mesh replacement
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn sample_count(&self) -> usize {
        self.store.len()
    }

    /// Global value range of the loaded samples (legend scale)
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.store.value_range()
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_deref()
    }

    pub fn transform(&self) -> &DisplayTransform {
        &self.transform
    }

    /// Render (or fetch from cache) the color-mapped raster for a slice
    pub fn render(&mut self, spec: &SliceSpec, palette: PaletteId) -> Arc<SliceRaster> {
        let generation = self.generation;
        let config = self.config;
        let store = &self.store;
        let index = &self.index;
        let mesh = self.mesh.as_ref();
        let oracle = self.oracle.as_ref();
        let transform = self.transform;

        self.cache.get_or_compute(spec, generation, palette, move || {
            let raw = match (mesh, oracle) {
                (Some(mesh), Some(oracle)) => {
                    let sampler = SliceSampler {
                        plane_margin: config.plane_margin,
                        neighbor_count: config.neighbor_count,
                        search_radius_cells: config.search_radius_cells,
                    };
                    sampler.sample(spec, store, index, oracle, mesh, &transform)
                }
                // No mesh yet: nothing encloses the plane
                _ => RawSlice::all_masked(spec.resolution.max(1)),
            };
            Palette::get(palette).render(&raw)
        })
    }
}

impl Default for SliceSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Axis, Point3D, Triangle};

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

    fn spec() -> SliceSpec {
        SliceSpec {
            axis: Axis::Z,
            value: 0.0,
            resolution: 16,
        }
    }

    #[test]
    fn test_render_without_any_data_is_transparent() {
        let mut session = SliceSession::default();
        let raster = session.render(&spec(), PaletteId::BlueYellowRed);
        assert!(raster.is_fully_transparent());
    }

    #[test]
    fn test_empty_samples_with_mesh_is_transparent() {
        let mut session = SliceSession::default();
        session.load_mesh(make_cube(5.0));

        let raster = session.render(&spec(), PaletteId::BlueYellowRed);
        assert!(
            raster.is_fully_transparent(),
            "no samples: every pixel has alpha 0"
        );
    }

    #[test]
    fn test_full_pipeline_produces_colored_pixels() {
        let mut session = SliceSession::default();
        session.load_mesh(make_cube(5.0));
        session
            .load_samples("0 0 0 1.0\n2 2 0 5.0\n-2 -2 0 9.0\n")
            .unwrap();

        let raster = session.render(&spec(), PaletteId::BlueYellowRed);

        assert!(!raster.is_fully_transparent(), "slice through data must color pixels");
        assert!(raster.value_range.is_some());
        assert_eq!(raster.width, 16);
        assert_eq!(raster.palette, PaletteId::BlueYellowRed);
    }

    #[test]
    fn test_repeated_render_is_cached() {
        let mut session = SliceSession::default();
        session.load_mesh(make_cube(5.0));
        session.load_samples("0 0 0 1.0\n1 1 1 2.0\n").unwrap();

        let a = session.render(&spec(), PaletteId::Viridis);
        let b = session.render(&spec(), PaletteId::Viridis);
        assert!(Arc::ptr_eq(&a, &b), "same spec and generation: cached raster");
    }

    #[test]
    fn test_reload_invalidates_cache() {
        let mut session = SliceSession::default();
        session.load_mesh(make_cube(5.0));
        session.load_samples("0 0 0 1.0\n").unwrap();

        let before = session.render(&spec(), PaletteId::Viridis);
        let gen_before = session.generation();

        session.load_samples("0 0 0 2.0\n").unwrap();
        assert_eq!(session.generation(), gen_before + 1);

        let after = session.render(&spec(), PaletteId::Viridis);
        assert!(!Arc::ptr_eq(&before, &after), "new generation: recomputed raster");
    }

    #[test]
    fn test_failed_load_keeps_previous_store() {
        let mut session = SliceSession::default();
        session.load_samples("0 0 0 1.0\n").unwrap();
        let gen = session.generation();

        let err = session.load_samples("0 0 0 1.0\nbroken line\n");
        assert!(err.is_err());
        assert_eq!(session.sample_count(), 1, "previous store stays active");
        assert_eq!(session.generation(), gen, "failed load must not bump the generation");
    }
}
