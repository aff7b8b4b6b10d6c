use crate::core::collection::ImageCollection;
use crate::core::image::Image;
use crate::core::kernel::Kernel;
use crate::types::{SarMask, SarRealImage, SarResult};
use ndarray::Array2;

/// Mask-aware convolution of one band.
///
/// Taps that fall outside the grid or on masked pixels are skipped and the
/// remaining weights renormalized, so a pixel whose whole neighbourhood is
/// valid gets the plain kernel average. Masked centres are not computed and
/// come back as NaN; the validity mask itself is unchanged.
pub fn convolve_masked(data: &SarRealImage, mask: &SarMask, kernel: &Kernel) -> SarRealImage {
    let (height, width) = data.dim();
    let taps = kernel.taps();
    let mut filtered = Array2::from_elem((height, width), f32::NAN);

    for i in 0..height {
        for j in 0..width {
            if !mask[[i, j]] {
                continue;
            }

            let mut weighted_sum = 0.0f32;
            let mut weight_total = 0.0f32;

            for &(dy, dx, w) in &taps {
                let ii = i as isize + dy;
                let jj = j as isize + dx;

                if ii >= 0 && ii < height as isize && jj >= 0 && jj < width as isize {
                    let (ii, jj) = (ii as usize, jj as usize);
                    if mask[[ii, jj]] {
                        weighted_sum += w * data[[ii, jj]];
                        weight_total += w;
                    }
                }
            }

            // The centre tap always contributes, so weight_total > 0 here
            filtered[[i, j]] = weighted_sum / weight_total;
        }
    }

    filtered
}

/// Applies one shared kernel to every band of every image
#[derive(Debug, Clone)]
pub struct SpatialSmoother {
    kernel: Kernel,
}

impl SpatialSmoother {
    pub fn new(kernel: Kernel) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn smooth(&self, image: &Image) -> SarResult<Image> {
        let mut smoothed = image.clone();
        for name in image.band_names() {
            let filtered = convolve_masked(image.band(name)?, image.mask(), &self.kernel);
            smoothed = smoothed.with_band(name, filtered)?;
        }
        Ok(smoothed)
    }

    pub fn apply_to_collection(&self, collection: &ImageCollection) -> SarResult<ImageCollection> {
        log::info!(
            "Smoothing with {:?} kernel of radius {} px",
            self.kernel.shape(),
            self.kernel.radius()
        );
        collection.try_map(|image| self.smooth(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::tests::{test_geo_transform, test_metadata};
    use crate::core::index::BAND_POL;
    use approx::assert_relative_eq;

    fn ramp(dim: (usize, usize)) -> SarRealImage {
        Array2::from_shape_fn(dim, |(i, j)| (i * dim.1 + j) as f32 * 0.01)
    }

    #[test]
    fn test_interior_equals_plain_mean() {
        let data = ramp((9, 9));
        let mask = Array2::from_elem((9, 9), true);
        let kernel = Kernel::circle(3).unwrap();
        let filtered = convolve_masked(&data, &mask, &kernel);

        let expected: f32 = kernel
            .taps()
            .iter()
            .map(|&(dy, dx, w)| w * data[[(4 + dy) as usize, (4 + dx) as usize]])
            .sum();
        assert_relative_eq!(filtered[[4, 4]], expected, epsilon = 1e-6);
        // A linear ramp is symmetric around the centre, so the average is the centre value
        assert_relative_eq!(filtered[[4, 4]], data[[4, 4]], epsilon = 1e-5);
    }

    #[test]
    fn test_constant_field_is_preserved_at_edges() {
        let data = Array2::from_elem((5, 6), 0.25f32);
        let mask = Array2::from_elem((5, 6), true);
        let filtered = convolve_masked(&data, &mask, &Kernel::circle(3).unwrap());
        for &v in filtered.iter() {
            assert_relative_eq!(v, 0.25, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_edge_pixel_renormalizes_over_in_grid_taps() {
        let data = ramp((3, 3));
        let mask = Array2::from_elem((3, 3), true);
        let filtered = convolve_masked(&data, &mask, &Kernel::square(1).unwrap());

        // Corner (0, 0): only the 2x2 block is inside the grid
        let expected = (data[[0, 0]] + data[[0, 1]] + data[[1, 0]] + data[[1, 1]]) / 4.0;
        assert_relative_eq!(filtered[[0, 0]], expected, epsilon = 1e-6);
    }

    #[test]
    fn test_masked_pixels_neither_contribute_nor_reappear() {
        let mut data = Array2::from_elem((3, 3), 0.2f32);
        data[[1, 2]] = 100.0;
        let mut mask = Array2::from_elem((3, 3), true);
        mask[[1, 2]] = false;

        let filtered = convolve_masked(&data, &mask, &Kernel::square(1).unwrap());
        assert_relative_eq!(filtered[[1, 1]], 0.2, epsilon = 1e-6);
        assert!(filtered[[1, 2]].is_nan());
    }

    #[test]
    fn test_smoother_keeps_mask_and_grid() {
        let mut mask_values = Array2::from_elem((4, 4), 0.3f32);
        mask_values[[0, 0]] = f32::NAN;
        let image = Image::new(
            test_metadata("s1"),
            test_geo_transform(),
            vec![(BAND_POL.to_string(), mask_values)],
        )
        .unwrap();

        let smoother = SpatialSmoother::new(Kernel::circle(3).unwrap());
        let smoothed = smoother.smooth(&image).unwrap();

        assert_eq!(smoothed.mask(), image.mask());
        assert_eq!(smoothed.dim(), image.dim());
        assert_relative_eq!(smoothed.band(BAND_POL).unwrap()[[3, 3]], 0.3, epsilon = 1e-6);
    }
}
