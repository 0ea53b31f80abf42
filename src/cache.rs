// Raster memoization keyed by slice parameters and data generation
//
// The key is a value type: the float slice coordinate goes in as its bit
// pattern, which sidesteps both float-equality pitfalls and the string-glued
// keys this replaces. Entries from an older generation are dropped wholesale
// the first time a newer generation is seen, so a stale raster can never be
// returned.

use crate::colormap::{PaletteId, SliceRaster};
use crate::slice::SliceSpec;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SliceKey {
    axis: crate::geometry::Axis,
    value_bits: u64,
    resolution: u32,
    generation: u64,
    palette: PaletteId,
}

impl SliceKey {
    fn new(spec: &SliceSpec, generation: u64, palette: PaletteId) -> Self {
        Self {
            axis: spec.axis,
            value_bits: spec.value.to_bits(),
            resolution: spec.resolution,
            generation,
            palette,
        }
    }
}

#[derive(Default)]
pub struct SliceCache {
    entries: HashMap<SliceKey, Arc<SliceRaster>>,
    generation: u64,
}

impl SliceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached raster for `(spec, generation, palette)`, or run
    /// `render` and remember the result. A repeated call with no generation
    /// change hands back the same `Arc`, bit-identical raster included.
    pub fn get_or_compute(
        &mut self,
        spec: &SliceSpec,
        generation: u64,
        palette: PaletteId,
        render: impl FnOnce() -> SliceRaster,
    ) -> Arc<SliceRaster> {
        if generation != self.generation {
            // Data was replaced: everything cached is stale
            self.entries.clear();
            self.generation = generation;
        }

        let key = SliceKey::new(spec, generation, palette);
        if let Some(raster) = self.entries.get(&key) {
            log::debug!(
                "Slice cache hit: {}={} res {} palette {}",
                spec.axis.label(),
                spec.value,
                spec.resolution,
                palette.name()
            );
            return Arc::clone(raster);
        }

        let raster = Arc::new(render());
        self.entries.insert(key, Arc::clone(&raster));
        raster
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
