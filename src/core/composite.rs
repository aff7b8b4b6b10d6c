use crate::core::collection::ImageCollection;
use crate::core::image::clip_mask;
use crate::geometry::Region;
use crate::types::{GeoTransform, SarError, SarMask, SarRealImage, SarResult, GRID_TOLERANCE};
use ndarray::Array2;
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Per-pixel statistic used to collapse the time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    Mean,
    Median,
}

impl std::fmt::Display for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reducer::Mean => write!(f, "mean"),
            Reducer::Median => write!(f, "median"),
        }
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean<T: Float>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let sum = values.iter().fold(T::zero(), |acc, &v| acc + v);
    T::from(values.len()).map(|n| sum / n)
}

/// Median (mean of the two middle values for even counts), `None` for an empty slice.
/// Reorders `values`.
pub fn median<T: Float>(values: &mut [T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        let two = T::one() + T::one();
        Some((values[mid - 1] + values[mid]) / two)
    }
}

/// Single-band image produced by a temporal reduction
#[derive(Debug, Clone)]
pub struct Composite {
    pub band: String,
    pub reducer: Reducer,
    pub values: SarRealImage,
    pub mask: SarMask,
    pub geo_transform: Option<GeoTransform>,
    /// Number of images that went into the reduction
    pub image_count: usize,
}

/// Summary statistics over the valid pixels of a composite
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub valid_pixels: usize,
    pub total_pixels: usize,
}

impl Composite {
    /// Composite of an empty collection: no grid, nothing valid
    pub fn empty(band: &str, reducer: Reducer) -> Self {
        Self {
            band: band.to_string(),
            reducer,
            values: Array2::zeros((0, 0)),
            mask: Array2::from_elem((0, 0), false),
            geo_transform: None,
            image_count: 0,
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn is_fully_masked(&self) -> bool {
        self.valid_count() == 0
    }

    /// Value at a pixel, `None` when masked or out of the grid
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        match self.mask.get((row, col)) {
            Some(&true) => self.values.get((row, col)).copied(),
            _ => None,
        }
    }

    /// Mask pixels whose centre lies outside `region`
    pub fn clip(&self, region: &Region) -> Composite {
        let mut clipped = self.clone();
        if let Some(geo_transform) = &self.geo_transform {
            let inside = clip_mask(self.dim(), geo_transform, region);
            ndarray::Zip::from(&mut clipped.mask)
                .and(&inside)
                .for_each(|m, &v| *m = *m && v);
        }
        clipped
    }

    pub fn stats(&self) -> Option<CompositeStats> {
        let valid: Vec<f32> = self
            .values
            .iter()
            .zip(self.mask.iter())
            .filter(|(_, m)| **m)
            .map(|(&v, _)| v)
            .collect();

        let mean = mean(&valid)?;
        Some(CompositeStats {
            min: valid.iter().cloned().fold(f32::INFINITY, f32::min),
            max: valid.iter().cloned().fold(f32::NEG_INFINITY, f32::max),
            mean,
            valid_pixels: valid.len(),
            total_pixels: self.values.len(),
        })
    }
}

/// Reduces a single-band collection along time
#[derive(Debug, Clone)]
pub struct TemporalAggregator {
    band: String,
}

impl TemporalAggregator {
    pub fn new(band: &str) -> Self {
        Self {
            band: band.to_string(),
        }
    }

    /// Per pixel reduction over the images where that pixel is valid.
    /// Pixels masked in every image stay masked.
    pub fn reduce(&self, collection: &ImageCollection, reducer: Reducer) -> SarResult<Composite> {
        let first = match collection.first() {
            Some(image) => image,
            None => {
                log::warn!(
                    "No images to reduce, {} composite of {} is empty",
                    reducer,
                    self.band
                );
                return Ok(Composite::empty(&self.band, reducer));
            }
        };

        let dim = first.dim();
        let mut layers = Vec::with_capacity(collection.len());
        for image in collection.iter() {
            if image.dim() != dim {
                return Err(SarError::Processing(format!(
                    "Image {} is {:?}, expected {:?} for temporal reduction",
                    image.id(),
                    image.dim(),
                    dim
                )));
            }
            if !image.geo_transform().approx_eq(first.geo_transform(), GRID_TOLERANCE) {
                return Err(SarError::Processing(format!(
                    "Image {} is not on the grid of image {} ({:?} vs {:?})",
                    image.id(),
                    first.id(),
                    image.geo_transform().coefficients(),
                    first.geo_transform().coefficients()
                )));
            }
            layers.push((image.band(&self.band)?, image.mask()));
        }

        let mut values = Array2::from_elem(dim, f32::NAN);
        let mut mask = Array2::from_elem(dim, false);
        let mut samples = Vec::with_capacity(layers.len());

        for ((i, j), value) in values.indexed_iter_mut() {
            samples.clear();
            samples.extend(
                layers
                    .iter()
                    .filter(|(_, m)| m[[i, j]])
                    .map(|(data, _)| data[[i, j]]),
            );

            let reduced = match reducer {
                Reducer::Mean => mean(&samples),
                Reducer::Median => median(&mut samples),
            };
            if let Some(v) = reduced {
                *value = v;
                mask[[i, j]] = true;
            }
        }

        let composite = Composite {
            band: self.band.clone(),
            reducer,
            values,
            mask,
            geo_transform: Some(*first.geo_transform()),
            image_count: collection.len(),
        };

        if let Some(stats) = composite.stats() {
            log::info!(
                "{} composite of {} over {} images: min {:.4}, max {:.4}, mean {:.4}, {} / {} valid pixels",
                reducer,
                self.band,
                composite.image_count,
                stats.min,
                stats.max,
                stats.mean,
                stats.valid_pixels,
                stats.total_pixels
            );
        }

        Ok(composite)
    }
}
