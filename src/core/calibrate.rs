use crate::core::collection::ImageCollection;
use crate::core::image::{Image, BAND_ANGLE, BAND_VH, BAND_VV};
use crate::types::{SarMask, SarRealImage, SarResult};
use ndarray::Zip;
use std::f32::consts::PI;

/// Sigma-0 to gamma-0 conversion for dB backscatter.
///
/// `gamma0 = sigma0 - 10 * log10(cos(angle))`, evaluated per pixel with the
/// scene's own incidence angle band.
#[derive(Debug, Clone)]
pub struct RadiometricCorrector {
    /// Bands to correct; each is replaced under its own name
    pub bands: Vec<String>,
}

impl Default for RadiometricCorrector {
    fn default() -> Self {
        Self {
            bands: vec![BAND_VH.to_string(), BAND_VV.to_string()],
        }
    }
}

impl RadiometricCorrector {
    pub fn new() -> Self {
        Self::default()
    }

    /// dB term subtracted from sigma-0 for an incidence angle in degrees
    pub fn correction_db(angle_deg: f32) -> f32 {
        10.0 * (angle_deg * PI / 180.0).cos().log10()
    }

    /// Correct one band against an angle raster of the same shape
    pub fn sigma0_to_gamma0(sigma0: &SarRealImage, angle: &SarRealImage) -> SarRealImage {
        Zip::from(sigma0)
            .and(angle)
            .map_collect(|&s, &a| s - Self::correction_db(a))
    }

    /// Convert every configured band of `image`. The angle band is kept;
    /// pixels whose correction is not finite (angle >= 90) are masked.
    pub fn to_gamma0(&self, image: &Image) -> SarResult<Image> {
        let angle = image.band(BAND_ANGLE)?.clone();
        let mut corrected = image.clone();

        for name in &self.bands {
            let gamma0 = Self::sigma0_to_gamma0(image.band(name)?, &angle);
            corrected = corrected.with_band(name, gamma0)?;
        }

        let finite: SarMask = angle.mapv(|a| Self::correction_db(a).is_finite());
        corrected.update_mask(&finite)
    }

    pub fn apply_to_collection(&self, collection: &ImageCollection) -> SarResult<ImageCollection> {
        log::info!("Converting sigma-0 to gamma-0 for bands {:?}", self.bands);
        collection.try_map(|image| self.to_gamma0(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::tests::uniform_image;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_correction_matches_formula() {
        let image = uniform_image("s1", (2, 2), 10.0, 5.0, 40.0);
        let corrected = RadiometricCorrector::new().to_gamma0(&image).unwrap();

        let term = 10.0 * (40.0f32.to_radians()).cos().log10();
        // cos(40 deg) < 1, so the correction raises the backscatter
        assert!(term < 0.0);
        assert_relative_eq!(corrected.band(BAND_VH).unwrap()[[0, 0]], 10.0 - term, epsilon = 1e-5);
        assert_relative_eq!(corrected.band(BAND_VV).unwrap()[[1, 1]], 5.0 - term, epsilon = 1e-5);
    }

    #[test]
    fn test_band_names_and_angle_retained() {
        let image = uniform_image("s1", (1, 1), -20.0, -12.0, 35.0);
        let corrected = RadiometricCorrector::new().to_gamma0(&image).unwrap();
        assert_eq!(corrected.band_names(), vec![BAND_VH, BAND_VV, BAND_ANGLE]);
        assert_eq!(corrected.band(BAND_ANGLE).unwrap()[[0, 0]], 35.0);
        assert_eq!(corrected.dim(), image.dim());
        assert_eq!(corrected.geo_transform(), image.geo_transform());
    }

    #[test]
    fn test_per_pixel_angle_is_used() {
        let sigma0 = array![[-10.0f32, -10.0]];
        let angle = array![[0.0f32, 60.0]];
        let gamma0 = RadiometricCorrector::sigma0_to_gamma0(&sigma0, &angle);

        assert_relative_eq!(gamma0[[0, 0]], -10.0, epsilon = 1e-6);
        // cos(60) = 0.5 -> 10 log10(0.5) = -3.0103
        assert_relative_eq!(gamma0[[0, 1]], -10.0 + 3.0103, epsilon = 1e-3);
    }

    #[test]
    fn test_grazing_angle_is_masked() {
        let image = uniform_image("s1", (1, 1), -20.0, -12.0, 95.0);
        let corrected = RadiometricCorrector::new().to_gamma0(&image).unwrap();
        assert_eq!(corrected.valid_count(), 0);
    }
}
