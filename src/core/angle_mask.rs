use crate::core::collection::ImageCollection;
use crate::core::image::{Image, BAND_ANGLE};
use crate::types::SarResult;
use serde::{Deserialize, Serialize};

/// Incidence angle window outside of which pixels are discarded.
///
/// Both bounds are exclusive: a pixel survives only when
/// `min_deg < angle < max_deg`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleMask {
    pub min_deg: f32,
    pub max_deg: f32,
}

impl Default for AngleMask {
    fn default() -> Self {
        Self {
            min_deg: 30.0,
            max_deg: 45.0,
        }
    }
}

impl AngleMask {
    pub fn new(min_deg: f32, max_deg: f32) -> Self {
        Self { min_deg, max_deg }
    }

    /// First pass: keep pixels with `angle > min_deg`
    pub fn mask_above(&self, image: &Image) -> SarResult<Image> {
        let valid = image.band(BAND_ANGLE)?.mapv(|angle| angle > self.min_deg);
        image.clone().update_mask(&valid)
    }

    /// Second pass: keep pixels with `angle < max_deg`
    pub fn mask_below(&self, image: &Image) -> SarResult<Image> {
        let valid = image.band(BAND_ANGLE)?.mapv(|angle| angle < self.max_deg);
        image.clone().update_mask(&valid)
    }

    /// Run both passes over every image, each image on its own angle band
    pub fn apply_to_collection(&self, collection: &ImageCollection) -> SarResult<ImageCollection> {
        log::info!(
            "Masking incidence angles outside ({}, {}) degrees",
            self.min_deg,
            self.max_deg
        );

        let above = collection.try_map(|image| self.mask_above(image))?;
        let masked = above.try_map(|image| self.mask_below(image))?;

        for image in masked.iter() {
            log::debug!(
                "Image {}: {} of {} pixels inside the angle window",
                image.id(),
                image.valid_count(),
                image.dim().0 * image.dim().1
            );
        }

        Ok(masked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::tests::{test_geo_transform, test_metadata};
    use crate::core::image::{BAND_VH, BAND_VV};
    use crate::types::SarError;
    use ndarray::{array, Array2};

    fn angle_image(id: &str, angles: Array2<f32>) -> Image {
        let dim = angles.dim();
        Image::new(
            test_metadata(id),
            test_geo_transform(),
            vec![
                (BAND_VH.to_string(), Array2::from_elem(dim, -20.0)),
                (BAND_VV.to_string(), Array2::from_elem(dim, -12.0)),
                (BAND_ANGLE.to_string(), angles),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_bounds_are_exclusive() {
        let image = angle_image("s1", array![[29.9, 30.0, 30.1, 44.9, 45.0, 45.1]]);
        let mask = AngleMask::default();

        let above = mask.mask_above(&image).unwrap();
        assert_eq!(
            above.mask().as_slice().unwrap(),
            &[false, false, true, true, true, true]
        );

        let both = mask.mask_below(&above).unwrap();
        assert_eq!(
            both.mask().as_slice().unwrap(),
            &[false, false, true, true, false, false]
        );
    }

    #[test]
    fn test_passes_are_independent_per_image() {
        let a = angle_image("a", array![[25.0, 35.0]]);
        let b = angle_image("b", array![[35.0, 50.0]]);
        let collection = ImageCollection::new(vec![a, b]);

        let masked = AngleMask::default().apply_to_collection(&collection).unwrap();
        assert_eq!(masked.images()[0].mask().as_slice().unwrap(), &[false, true]);
        assert_eq!(masked.images()[1].mask().as_slice().unwrap(), &[true, false]);
    }

    #[test]
    fn test_nan_angle_is_masked() {
        let image = angle_image("s1", array![[f32::NAN, 40.0]]);
        let masked = AngleMask::default().mask_above(&image).unwrap();
        assert!(!masked.mask()[[0, 0]]);
        assert!(masked.mask()[[0, 1]]);
    }

    #[test]
    fn test_missing_angle_band() {
        let image = angle_image("s1", array![[40.0]]).select(&[BAND_VV]).unwrap();
        let result = AngleMask::default().mask_above(&image);
        assert!(matches!(result, Err(SarError::MissingBand { .. })));
    }

    #[test]
    fn test_empty_collection() {
        let masked = AngleMask::default()
            .apply_to_collection(&ImageCollection::default())
            .unwrap();
        assert!(masked.is_empty());
    }
}
