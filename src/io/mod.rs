//! Scene catalogs and band raster readers

pub mod catalog;
pub mod raster;

pub use catalog::{Catalog, CatalogManifest, InMemoryCatalog, LocalCatalog, SceneEntry};
pub use raster::{default_band_reader, BandReader, RasterBand, TiffBandReader};

#[cfg(feature = "gdal")]
pub use raster::GdalBandReader;
