//! Map display of composites: clip, stretch, colour, write.

use crate::core::composite::Composite;
use crate::geometry::Region;
use crate::types::{SarError, SarResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Colour ramp applied after the linear stretch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    /// Black at `min` to white at `max`
    #[default]
    Grayscale,
    /// Evenly spaced `#rrggbb` stops, linearly interpolated
    Stops(Vec<String>),
}

impl Palette {
    fn stops(&self) -> SarResult<Vec<[u8; 3]>> {
        match self {
            Palette::Grayscale => Ok(vec![[0, 0, 0], [255, 255, 255]]),
            Palette::Stops(hex) if hex.len() >= 2 => hex.iter().map(|h| parse_hex(h)).collect(),
            Palette::Stops(hex) => Err(SarError::Render(format!(
                "A palette needs at least 2 colours, got {}",
                hex.len()
            ))),
        }
    }
}

fn parse_hex(color: &str) -> SarResult<[u8; 3]> {
    let digits = color.trim_start_matches('#');
    let invalid = || SarError::Render(format!("Invalid palette colour '{}'", color));
    if digits.len() != 6 {
        return Err(invalid());
    }
    let channel = |k: usize| u8::from_str_radix(&digits[k..k + 2], 16).map_err(|_| invalid());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// Display stretch: values map linearly from `[min, max]` onto the palette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisParams {
    pub min: f32,
    pub max: f32,
    pub palette: Palette,
}

impl Default for VisParams {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 0.5,
            palette: Palette::Grayscale,
        }
    }
}

impl VisParams {
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min,
            max,
            palette: Palette::Grayscale,
        }
    }

    pub fn validate(&self) -> SarResult<()> {
        if !(self.min < self.max) {
            return Err(SarError::Config(format!(
                "Display range min {} must be below max {}",
                self.min, self.max
            )));
        }
        self.palette.stops().map(|_| ())
    }
}

/// Row-major RGBA buffer of a composite. Masked pixels are fully transparent.
pub fn render_rgba(composite: &Composite, vis: &VisParams) -> SarResult<Vec<u8>> {
    vis.validate()?;
    let stops = vis.palette.stops()?;
    let segments = (stops.len() - 1) as f32;
    let range = vis.max - vis.min;

    let mut rgba = vec![0u8; composite.values.len() * 4];
    for (k, (&value, &valid)) in composite
        .values
        .iter()
        .zip(composite.mask.iter())
        .enumerate()
    {
        if !valid || !value.is_finite() {
            continue;
        }

        let t = ((value - vis.min) / range).clamp(0.0, 1.0);
        let position = t * segments;
        let lower = (position.floor() as usize).min(stops.len() - 2);
        let frac = position - lower as f32;
        let (a, b) = (stops[lower], stops[lower + 1]);

        for c in 0..3 {
            let channel = a[c] as f32 + (b[c] as f32 - a[c] as f32) * frac;
            rgba[k * 4 + c] = channel.round() as u8;
        }
        rgba[k * 4 + 3] = 255;
    }

    Ok(rgba)
}

/// Lowercase file stem for a layer name
pub fn layer_file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            stem.push(ch.to_ascii_lowercase());
        } else if !stem.ends_with('_') && !stem.is_empty() {
            stem.push('_');
        }
    }
    let trimmed = stem.trim_end_matches('_');
    if trimmed.is_empty() {
        "layer".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Terminal side effect of the pipeline: shows one composite
pub trait DisplaySink {
    /// Clip `composite` to `region` and display it as layer `name`
    fn add_layer(
        &mut self,
        composite: &Composite,
        region: &Region,
        vis: &VisParams,
        name: &str,
    ) -> SarResult<()>;

    /// Centre the view on `region`
    fn center_object(&mut self, region: &Region, zoom: u8) {
        let (lon, lat) = region.centroid();
        log::info!("Centering map on ({:.5}, {:.5}) at zoom {}", lon, lat, zoom);
    }
}

/// Writes each layer as an RGBA PNG into a directory
#[derive(Debug)]
pub struct PngSink {
    output_dir: PathBuf,
    written: Vec<PathBuf>,
}

impl PngSink {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> SarResult<Self> {
        std::fs::create_dir_all(output_dir.as_ref())?;
        Ok(Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            written: Vec::new(),
        })
    }

    /// Files written so far, in layer order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl DisplaySink for PngSink {
    fn add_layer(
        &mut self,
        composite: &Composite,
        region: &Region,
        vis: &VisParams,
        name: &str,
    ) -> SarResult<()> {
        let clipped = composite.clip(region);
        if clipped.is_fully_masked() {
            log::warn!("Layer '{}' has no valid pixels inside the region, nothing to draw", name);
            return Ok(());
        }

        let (rows, cols) = clipped.dim();
        let rgba = render_rgba(&clipped, vis)?;
        let image = image::RgbaImage::from_raw(cols as u32, rows as u32, rgba).ok_or_else(|| {
            SarError::Render(format!("Buffer does not fit a {}x{} image", cols, rows))
        })?;

        let path = self.output_dir.join(format!("{}.png", layer_file_stem(name)));
        image.save(&path)?;

        log::info!(
            "Layer '{}' written to {} ({} x {}, range [{}, {}])",
            name,
            path.display(),
            cols,
            rows,
            vis.min,
            vis.max
        );
        self.written.push(path);
        Ok(())
    }
}
