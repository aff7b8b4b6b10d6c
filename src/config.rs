//! Pipeline configuration: every constant of the processing recipe, with
//! the project-site values as defaults, optionally overridden from JSON.

use crate::core::angle_mask::AngleMask;
use crate::core::display::VisParams;
use crate::core::filter::{CollectionFilter, DateRange};
use crate::core::kernel::{Kernel, KernelShape};
use crate::geometry::Region;
use crate::types::{Polarization, SarError, SarResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const DEFAULT_COLLECTION: &str = "COPERNICUS/S1_GRD";

/// Smoothing kernel settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub shape: KernelShape,
    pub radius: usize,
    pub normalize: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            shape: KernelShape::Circle,
            radius: 3,
            normalize: true,
        }
    }
}

impl KernelConfig {
    pub fn build(&self) -> SarResult<Kernel> {
        Kernel::new(self.shape, self.radius, self.normalize)
    }
}

/// One rendered map layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    #[serde(default)]
    pub vis: VisParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub collection_id: String,
    pub region: Region,
    pub date_range: DateRange,
    /// Exact transmitter/receiver polarisation list to select
    pub polarizations: Vec<Polarization>,
    pub resolution_meters: f64,
    pub angle_mask: AngleMask,
    pub kernel: KernelConfig,
    pub map_zoom: u8,
    pub mean_layer: LayerConfig,
    /// The median composite is always computed; it is drawn only when set
    pub median_layer: Option<LayerConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        // Project site polygon and the 2019 summer season
        let region = Region::new(vec![
            (-99.0071, 15.27205),
            (-99.0071, 15.07207),
            (-99.0016, 15.07207),
            (-99.0016, 15.27205),
        ])
        .expect("default region is valid");
        let date_range = DateRange::new(
            NaiveDate::from_ymd_opt(2019, 5, 15).expect("valid date"),
            NaiveDate::from_ymd_opt(2019, 8, 31).expect("valid date"),
        )
        .expect("default date range is ordered");

        Self {
            collection_id: DEFAULT_COLLECTION.to_string(),
            region,
            date_range,
            polarizations: vec![Polarization::VV, Polarization::VH],
            resolution_meters: 10.0,
            angle_mask: AngleMask::default(),
            kernel: KernelConfig::default(),
            map_zoom: 14,
            mean_layer: LayerConfig {
                name: "S-1 Filtered Polarized Boxcar Mean VH".to_string(),
                vis: VisParams::new(0.0, 0.5),
            },
            median_layer: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> SarResult<PipelineConfig> {
        log::info!("Loading pipeline configuration from {}", path.as_ref().display());
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: PipelineConfig = serde_json::from_reader(reader)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> SarResult<()> {
        if self.collection_id.trim().is_empty() {
            return Err(SarError::Config("collection_id cannot be empty".to_string()));
        }

        if self.polarizations.is_empty() {
            return Err(SarError::Config("polarizations cannot be empty".to_string()));
        }

        if !(self.resolution_meters > 0.0) {
            return Err(SarError::Config(format!(
                "resolution_meters must be positive, got {}",
                self.resolution_meters
            )));
        }

        let AngleMask { min_deg, max_deg } = self.angle_mask;
        if !(0.0..=90.0).contains(&min_deg) || !(0.0..=90.0).contains(&max_deg) || min_deg >= max_deg {
            return Err(SarError::Config(format!(
                "Angle bounds must satisfy 0 <= min < max <= 90, got ({}, {})",
                min_deg, max_deg
            )));
        }

        if self.kernel.radius == 0 {
            return Err(SarError::Config("kernel radius must be at least 1".to_string()));
        }

        self.mean_layer.vis.validate()?;
        if let Some(median_layer) = &self.median_layer {
            median_layer.vis.validate()?;
        }

        Ok(())
    }

    pub fn collection_filter(&self) -> CollectionFilter {
        CollectionFilter {
            region: self.region.clone(),
            date_range: self.date_range,
            polarizations: self.polarizations.clone(),
            resolution_meters: self.resolution_meters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::display::Palette;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.collection_id, "COPERNICUS/S1_GRD");
        assert_eq!(config.region.vertices().len(), 4);
        assert_eq!(config.date_range, DateRange::parse("2019-05-15", "2019-08-31").unwrap());
        assert_eq!(config.polarizations, vec![Polarization::VV, Polarization::VH]);
        assert_eq!(config.resolution_meters, 10.0);
        assert_eq!(config.angle_mask, AngleMask::new(30.0, 45.0));
        assert_eq!(config.kernel.shape, KernelShape::Circle);
        assert_eq!(config.kernel.radius, 3);
        assert_eq!(config.mean_layer.vis, VisParams::new(0.0, 0.5));
        assert!(config.median_layer.is_none());
    }

    #[test]
    fn test_from_file_overrides_and_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");
        let mut file = File::create(&file_path).unwrap();

        let config_data = r##"
    {
        "date_range": { "start": "2020-01-01", "end": "2020-03-01" },
        "angle_mask": { "max_deg": 42.5 },
        "kernel": { "shape": "square", "radius": 1 },
        "median_layer": {
            "name": "S-1 Filtered Polarized Boxcar Median VH",
            "vis": { "min": -30.0, "max": 1.0, "palette": { "stops": ["#0000ff", "#00ff00"] } }
        }
    }
    "##;
        file.write_all(config_data.as_bytes()).unwrap();

        let config = PipelineConfig::from_file(&file_path).unwrap();
        assert_eq!(config.date_range.start(), NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(config.angle_mask, AngleMask::new(30.0, 42.5));
        assert_eq!(config.kernel.shape, KernelShape::Square);
        assert!(config.kernel.normalize);
        assert_eq!(config.collection_id, DEFAULT_COLLECTION);

        let median = config.median_layer.unwrap();
        assert_eq!(median.vis.min, -30.0);
        assert_eq!(
            median.vis.palette,
            Palette::Stops(vec!["#0000ff".to_string(), "#00ff00".to_string()])
        );
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = PipelineConfig::default();
        config.angle_mask = AngleMask::new(45.0, 30.0);
        assert!(matches!(config.validate(), Err(SarError::Config(_))));

        let mut config = PipelineConfig::default();
        config.kernel.radius = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.mean_layer.vis = VisParams::new(1.0, 1.0);
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.polarizations.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_rejects_bad_json() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config.json");
        std::fs::write(&file_path, r#"{ "region": [[0.0, 0.0], [1.0, 1.0]] }"#).unwrap();
        assert!(PipelineConfig::from_file(&file_path).is_err());

        assert!(matches!(
            PipelineConfig::from_file(dir.path().join("missing.json")),
            Err(SarError::Io(_))
        ));
    }
}
