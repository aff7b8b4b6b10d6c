//! sarpol: Sentinel-1 normalized polarization index processing
//!
//! Queries a Sentinel-1 GRD scene catalog for a project site and season,
//! masks pixels outside the useful incidence angle range, corrects sigma-0
//! to gamma-0, computes the normalized VH/VV polarization index, smooths it
//! with a circular kernel and composites it over time (mean and median).

pub mod types;
pub mod geometry;
pub mod config;
pub mod core;
pub mod io;
pub mod pipeline;

// Re-export main types and functions for easier access
pub use types::{
    AcquisitionMode, BoundingBox, GeoTransform, Polarization, SarError, SarMask, SarRealImage,
    SarResult, SceneMetadata,
};

pub use config::PipelineConfig;
pub use geometry::Region;
pub use io::{Catalog, InMemoryCatalog, LocalCatalog};
pub use pipeline::{Pipeline, PipelineOutput};
