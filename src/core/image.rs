use crate::geometry::Region;
use crate::types::{GeoTransform, SarError, SarMask, SarRealImage, SarResult, SceneMetadata};
use ndarray::{Array2, Zip};

/// Backscatter bands as delivered by the GRD catalog
pub const BAND_VV: &str = "VV";
pub const BAND_VH: &str = "VH";
/// Ellipsoid incidence angle in degrees
pub const BAND_ANGLE: &str = "angle";

/// One scene: named rasters on a shared grid plus a single active mask.
///
/// Every transform returns a new `Image`; the grid and geotransform never
/// change, and the mask can only lose valid pixels.
#[derive(Debug, Clone)]
pub struct Image {
    metadata: SceneMetadata,
    geo_transform: GeoTransform,
    bands: Vec<(String, SarRealImage)>,
    mask: SarMask,
}

impl Image {
    /// Build an image from bands that all share one shape. The mask starts
    /// out valid wherever every band holds a finite value.
    pub fn new(
        metadata: SceneMetadata,
        geo_transform: GeoTransform,
        bands: Vec<(String, SarRealImage)>,
    ) -> SarResult<Self> {
        let shape = match bands.first() {
            Some((_, data)) => data.dim(),
            None => {
                return Err(SarError::InvalidFormat(format!(
                    "Image {} has no bands",
                    metadata.id
                )))
            }
        };

        let mut mask = Array2::from_elem(shape, true);
        for (name, data) in &bands {
            if data.dim() != shape {
                return Err(SarError::InvalidFormat(format!(
                    "Band {} of image {} is {:?}, expected {:?}",
                    name,
                    metadata.id,
                    data.dim(),
                    shape
                )));
            }
            Zip::from(&mut mask)
                .and(data)
                .for_each(|m, &v| *m = *m && v.is_finite());
        }

        Ok(Self {
            metadata,
            geo_transform,
            bands,
            mask,
        })
    }

    pub fn metadata(&self) -> &SceneMetadata {
        &self.metadata
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn geo_transform(&self) -> &GeoTransform {
        &self.geo_transform
    }

    /// Grid shape as (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.mask.dim()
    }

    pub fn mask(&self) -> &SarMask {
        &self.mask
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|(n, _)| n == name)
    }

    pub fn band(&self, name: &str) -> SarResult<&SarRealImage> {
        self.bands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data)
            .ok_or_else(|| SarError::MissingBand {
                band: name.to_string(),
                image: self.metadata.id.clone(),
            })
    }

    /// Keep only the named bands, in the requested order
    pub fn select(&self, names: &[&str]) -> SarResult<Image> {
        let bands = names
            .iter()
            .map(|&name| Ok((name.to_string(), self.band(name)?.clone())))
            .collect::<SarResult<Vec<_>>>()?;

        Ok(Image {
            metadata: self.metadata.clone(),
            geo_transform: self.geo_transform,
            bands,
            mask: self.mask.clone(),
        })
    }

    /// Append a band, or replace the band with the same name in place
    pub fn with_band(mut self, name: &str, data: SarRealImage) -> SarResult<Image> {
        if data.dim() != self.dim() {
            return Err(SarError::InvalidFormat(format!(
                "Band {} is {:?}, image {} grid is {:?}",
                name,
                data.dim(),
                self.metadata.id,
                self.dim()
            )));
        }

        match self.bands.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = data,
            None => self.bands.push((name.to_string(), data)),
        }
        Ok(self)
    }

    /// Intersect the active mask with `valid`. Pixels already masked stay masked.
    pub fn update_mask(mut self, valid: &SarMask) -> SarResult<Image> {
        if valid.dim() != self.dim() {
            return Err(SarError::InvalidFormat(format!(
                "Mask is {:?}, image {} grid is {:?}",
                valid.dim(),
                self.metadata.id,
                self.dim()
            )));
        }

        Zip::from(&mut self.mask)
            .and(valid)
            .for_each(|m, &v| *m = *m && v);
        Ok(self)
    }

    /// Mask every pixel whose centre falls outside `region`
    pub fn clip(self, region: &Region) -> SarResult<Image> {
        let inside = clip_mask(self.dim(), &self.geo_transform, region);
        self.update_mask(&inside)
    }

    pub fn valid_count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

/// Per-pixel "centre inside region" mask for a grid
pub fn clip_mask(dim: (usize, usize), geo_transform: &GeoTransform, region: &Region) -> SarMask {
    Array2::from_shape_fn(dim, |(row, col)| {
        let (lon, lat) = geo_transform.pixel_center(row, col);
        region.contains(lon, lat)
    })
}
