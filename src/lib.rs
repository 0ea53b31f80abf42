// Core modules for cross-section scalar field rendering
pub mod cache;
pub mod colormap;
pub mod containment;
pub mod geometry;
pub mod interpolate;
pub mod mesh;
pub mod samples;
pub mod session;
pub mod slice;
pub mod spatial_index;
pub mod worker;

// Re-export commonly used types
pub use colormap::{Palette, PaletteId, SliceRaster};
pub use containment::{ContainmentOracle, ContainmentStrategy};
pub use geometry::{Aabb, Axis, Point3D, Triangle, Vector3D};
pub use interpolate::Interpolator;
pub use mesh::{DisplayTransform, Mesh, MeshError};
pub use samples::{ParseError, SampleStore, ScalarSample};
pub use session::{EngineConfig, SliceSession};
pub use slice::{RawSlice, SliceSampler, SliceSpec};
pub use spatial_index::SpatialIndex;
pub use worker::{SliceWorker, WorkerCommand, WorkerEvent};

/// Main result type for the engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Sample parse error: {0}")]
    Parse(#[from] samples::ParseError),

    #[error("Mesh error: {0}")]
    Mesh(#[from] mesh::MeshError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
