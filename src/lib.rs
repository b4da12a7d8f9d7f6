//! Affective terrain map library
//!
//! Blends Gaussian blobs for a selection of affective descriptors into a
//! normalized RGB map. Re-exports modules for use by the binary and tools.

pub mod blur;
pub mod catalog;
pub mod error;
pub mod export;
pub mod grid;
pub mod table;
pub mod terrain;
pub mod viewer;

pub use catalog::{Catalog, Descriptor};
pub use error::{TerrainError, TerrainResult};
pub use terrain::{generate, generate_with_rng, Canvas, TerrainImage, TerrainParams};
