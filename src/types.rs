use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::geometry::Region;

/// Real-valued backscatter, angle or index raster (row x column)
pub type SarRealImage = Array2<f32>;

/// Per-pixel validity mask, `true` marks a usable pixel
pub type SarMask = Array2<bool>;

/// Polarization modes for Sentinel-1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarization {
    VV,
    VH,
    HV,
    HH,
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::VV => write!(f, "VV"),
            Polarization::VH => write!(f, "VH"),
            Polarization::HV => write!(f, "HV"),
            Polarization::HH => write!(f, "HH"),
        }
    }
}

impl std::str::FromStr for Polarization {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "VV" => Ok(Polarization::VV),
            "VH" => Ok(Polarization::VH),
            "HV" => Ok(Polarization::HV),
            "HH" => Ok(Polarization::HH),
            _ => Err(SarError::InvalidFormat(format!("Invalid polarization: {}", s))),
        }
    }
}

/// Sentinel-1 acquisition mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionMode {
    IW, // Interferometric Wide swath
    EW, // Extra Wide swath
    SM, // StripMap
    WV, // Wave
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub max_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// True when the two boxes share at least one point (touching edges count)
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
            && self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
    }
}

/// Coefficient tolerance under which two geotransforms describe one grid
pub const GRID_TOLERANCE: f64 = 1e-9;

/// Geospatial transformation parameters (GDAL coefficient order)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn from_gdal(coefficients: [f64; 6]) -> Self {
        Self {
            top_left_x: coefficients[0],
            pixel_width: coefficients[1],
            rotation_x: coefficients[2],
            top_left_y: coefficients[3],
            rotation_y: coefficients[4],
            pixel_height: coefficients[5],
        }
    }

    /// Same grid within `tolerance` on every coefficient
    pub fn approx_eq(&self, other: &GeoTransform, tolerance: f64) -> bool {
        let a = self.coefficients();
        let b = other.coefficients();
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tolerance)
    }

    pub fn coefficients(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// Geographic coordinates (lon, lat) of the centre of pixel `(row, col)`
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        let x = col as f64 + 0.5;
        let y = row as f64 + 0.5;
        (
            self.top_left_x + x * self.pixel_width + y * self.rotation_x,
            self.top_left_y + x * self.rotation_y + y * self.pixel_height,
        )
    }
}

/// Catalog metadata of one Sentinel-1 GRD scene
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub id: String,
    pub acquisition_time: DateTime<Utc>,
    /// Transmitter/receiver polarisation list in catalog order
    pub polarizations: Vec<Polarization>,
    pub resolution_meters: f64,
    pub instrument_mode: AcquisitionMode,
    pub footprint: Region,
}

/// Error types for SAR processing
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Band '{band}' not found in image {image}")]
    MissingBand { band: String, image: String },

    #[error("Unknown image collection: {0}")]
    UnknownCollection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),
}

/// Result type for SAR operations
pub type SarResult<T> = Result<T, SarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarization_parsing() {
        assert_eq!("vh".parse::<Polarization>().unwrap(), Polarization::VH);
        assert_eq!("VV".parse::<Polarization>().unwrap(), Polarization::VV);
        assert!("XX".parse::<Polarization>().is_err());
    }

    #[test]
    fn test_pixel_center() {
        let gt = GeoTransform::from_gdal([-99.01, 0.001, 0.0, 15.3, 0.0, -0.001]);
        let (lon, lat) = gt.pixel_center(0, 0);
        assert!((lon - -99.0095).abs() < 1e-9);
        assert!((lat - 15.2995).abs() < 1e-9);

        let (lon, lat) = gt.pixel_center(2, 3);
        assert!((lon - -99.0065).abs() < 1e-9);
        assert!((lat - 15.2975).abs() < 1e-9);
    }

    #[test]
    fn test_geo_transform_comparison() {
        let gt = GeoTransform::from_gdal([-99.01, 0.001, 0.0, 15.3, 0.0, -0.001]);
        assert_eq!(gt.coefficients(), [-99.01, 0.001, 0.0, 15.3, 0.0, -0.001]);
        assert!(gt.approx_eq(&gt, GRID_TOLERANCE));

        let nudged = GeoTransform { top_left_x: -99.01 + 1e-12, ..gt };
        assert!(gt.approx_eq(&nudged, GRID_TOLERANCE));

        let shifted = GeoTransform { top_left_y: 16.3, ..gt };
        assert!(!gt.approx_eq(&shifted, GRID_TOLERANCE));
    }

    #[test]
    fn test_bounding_box_intersection() {
        let a = BoundingBox { min_lon: 0.0, max_lon: 1.0, min_lat: 0.0, max_lat: 1.0 };
        let b = BoundingBox { min_lon: 1.0, max_lon: 2.0, min_lat: 0.5, max_lat: 3.0 };
        let c = BoundingBox { min_lon: 1.5, max_lon: 2.0, min_lat: 0.0, max_lat: 1.0 };
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
