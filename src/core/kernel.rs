use crate::types::{SarError, SarResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Footprint of a smoothing kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelShape {
    /// Taps with `dx^2 + dy^2 <= r^2`
    Circle,
    /// Full `(2r + 1)^2` boxcar
    Square,
}

/// Square weight matrix of side `2 * radius + 1`, centre at `[radius, radius]`.
/// Zero weights lie outside the shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    radius: usize,
    shape: KernelShape,
    weights: Array2<f32>,
}

impl Kernel {
    pub fn new(shape: KernelShape, radius: usize, normalize: bool) -> SarResult<Self> {
        if radius == 0 {
            return Err(SarError::Processing(
                "Kernel radius must be at least 1 pixel".to_string(),
            ));
        }

        let size = 2 * radius + 1;
        let r = radius as isize;
        let mut weights = Array2::from_shape_fn((size, size), |(i, j)| {
            let dy = i as isize - r;
            let dx = j as isize - r;
            let inside = match shape {
                KernelShape::Circle => dx * dx + dy * dy <= r * r,
                KernelShape::Square => true,
            };
            if inside {
                1.0
            } else {
                0.0
            }
        });

        if normalize {
            let total = weights.sum();
            weights.mapv_inplace(|w| w / total);
        }

        log::debug!(
            "Built {:?} kernel, radius {} px, {} taps",
            shape,
            radius,
            weights.iter().filter(|&&w| w > 0.0).count()
        );

        Ok(Self {
            radius,
            shape,
            weights,
        })
    }

    /// Normalized circular moving-average kernel
    pub fn circle(radius: usize) -> SarResult<Self> {
        Self::new(KernelShape::Circle, radius, true)
    }

    /// Normalized boxcar kernel
    pub fn square(radius: usize) -> SarResult<Self> {
        Self::new(KernelShape::Square, radius, true)
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn shape(&self) -> KernelShape {
        self.shape
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    /// Non-zero taps as `(dy, dx, weight)` relative to the centre
    pub fn taps(&self) -> Vec<(isize, isize, f32)> {
        let r = self.radius as isize;
        self.weights
            .indexed_iter()
            .filter(|(_, w)| **w != 0.0)
            .map(|((i, j), &w)| (i as isize - r, j as isize - r, w))
            .collect()
    }
}
