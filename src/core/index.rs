use crate::core::collection::ImageCollection;
use crate::core::image::{Image, BAND_VH, BAND_VV};
use crate::types::{SarMask, SarRealImage, SarResult};
use ndarray::Zip;

/// Name of the derived normalized polarization band
pub const BAND_POL: &str = "VH_1";

/// Normalized difference `(a - b) / (a + b)`.
///
/// Pixels where the sum is zero, or the quotient is otherwise not finite,
/// come back as NaN with a `false` validity flag.
pub fn normalized_difference(a: &SarRealImage, b: &SarRealImage) -> (SarRealImage, SarMask) {
    let values = Zip::from(a).and(b).map_collect(|&a, &b| {
        let sum = a + b;
        if sum == 0.0 {
            f32::NAN
        } else {
            (a - b) / sum
        }
    });
    let valid = values.mapv(f32::is_finite);
    (values, valid)
}

/// Normalized polarization index `VH_1 = (VH - VV) / (VH + VV)`
#[derive(Debug, Clone, Default)]
pub struct PolarizationIndex;

impl PolarizationIndex {
    /// Append `VH_1` to the image, keeping the source bands
    pub fn add_index_band(&self, image: &Image) -> SarResult<Image> {
        let (index, valid) = normalized_difference(image.band(BAND_VH)?, image.band(BAND_VV)?);
        image.clone().with_band(BAND_POL, index)?.update_mask(&valid)
    }

    /// Compute `VH_1` for every image and project the collection onto it
    pub fn apply_to_collection(&self, collection: &ImageCollection) -> SarResult<ImageCollection> {
        log::info!("Computing normalized polarization band {}", BAND_POL);
        let with_index = collection.try_map(|image| self.add_index_band(image))?;
        with_index.select(&[BAND_POL])
    }
}
