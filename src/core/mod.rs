//! Core processing stages of the polarization workflow

pub mod image;
pub mod filter;
pub mod collection;
pub mod angle_mask;
pub mod calibrate;
pub mod index;
pub mod kernel;
pub mod convolve;
pub mod composite;
pub mod display;

// Re-export main types
pub use image::{Image, BAND_ANGLE, BAND_VH, BAND_VV};
pub use filter::{CollectionFilter, DateRange};
pub use collection::{CollectionSummary, ImageCollection};
pub use angle_mask::AngleMask;
pub use calibrate::RadiometricCorrector;
pub use index::{normalized_difference, PolarizationIndex, BAND_POL};
pub use kernel::{Kernel, KernelShape};
pub use convolve::{convolve_masked, SpatialSmoother};
pub use composite::{Composite, CompositeStats, Reducer, TemporalAggregator};
pub use display::{render_rgba, DisplaySink, Palette, PngSink, VisParams};
