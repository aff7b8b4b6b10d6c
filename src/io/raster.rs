use crate::types::{GeoTransform, SarError, SarRealImage, SarResult};
use ndarray::Array2;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

/// GeoTIFF tag numbers for pixel scale and tie point
const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;

/// Single raster band read from disk
#[derive(Debug, Clone)]
pub struct RasterBand {
    pub data: SarRealImage,
    pub geo_transform: Option<GeoTransform>,
}

/// Reads one band raster file into memory
pub trait BandReader: Send + Sync {
    fn read_band(&self, path: &Path) -> SarResult<RasterBand>;
}

/// Pure-Rust GeoTIFF reader for single-band rasters
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffBandReader;

impl BandReader for TiffBandReader {
    fn read_band(&self, path: &Path) -> SarResult<RasterBand> {
        log::debug!("Reading TIFF band from {}", path.display());

        let file = File::open(path)?;
        let mut decoder = Decoder::new(BufReader::new(file))?;
        let (width, height) = decoder.dimensions()?;

        let geo_transform = read_geo_transform(&mut decoder)?;

        let values: Vec<f32> = match decoder.read_image()? {
            DecodingResult::U8(data) => data.iter().map(|&x| x as f32).collect(),
            DecodingResult::U16(data) => data.iter().map(|&x| x as f32).collect(),
            DecodingResult::U32(data) => data.iter().map(|&x| x as f32).collect(),
            DecodingResult::I16(data) => data.iter().map(|&x| x as f32).collect(),
            DecodingResult::F32(data) => data,
            DecodingResult::F64(data) => data.iter().map(|&x| x as f32).collect(),
            _ => {
                return Err(SarError::InvalidFormat(format!(
                    "Unsupported pixel format in {}",
                    path.display()
                )))
            }
        };

        let data = Array2::from_shape_vec((height as usize, width as usize), values).map_err(|e| {
            SarError::InvalidFormat(format!(
                "Band {} is not a single-channel {}x{} raster: {}",
                path.display(),
                width,
                height,
                e
            ))
        })?;

        Ok(RasterBand {
            data,
            geo_transform,
        })
    }
}

/// North-up geotransform from the GeoTIFF pixel scale and first tie point
fn read_geo_transform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> SarResult<Option<GeoTransform>> {
    let scale = decoder.find_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE_TAG))?;
    let tiepoint = decoder.find_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT_TAG))?;

    let (scale, tiepoint) = match (scale, tiepoint) {
        (Some(scale), Some(tiepoint)) => (scale.into_f64_vec()?, tiepoint.into_f64_vec()?),
        _ => return Ok(None),
    };

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Ok(None);
    }

    let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
    Ok(Some(GeoTransform {
        top_left_x: x - i * scale[0],
        pixel_width: scale[0],
        rotation_x: 0.0,
        top_left_y: y + j * scale[1],
        rotation_y: 0.0,
        pixel_height: -scale[1],
    }))
}

/// GDAL-backed reader, for any format GDAL can open
#[cfg(feature = "gdal")]
#[derive(Debug, Clone, Copy, Default)]
pub struct GdalBandReader;

#[cfg(feature = "gdal")]
impl BandReader for GdalBandReader {
    fn read_band(&self, path: &Path) -> SarResult<RasterBand> {
        use gdal::Dataset;

        log::debug!("Reading band with GDAL from {}", path.display());

        let dataset = Dataset::open(path)?;
        let geo_transform = dataset.geo_transform().ok().map(GeoTransform::from_gdal);
        let (width, height) = dataset.raster_size();

        let rasterband = dataset.rasterband(1)?;
        let band_data = rasterband.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

        let data = Array2::from_shape_vec((height, width), band_data.data)
            .map_err(|e| SarError::Processing(format!("Failed to reshape band data: {}", e)))?;

        Ok(RasterBand {
            data,
            geo_transform,
        })
    }
}

/// Reader used by catalogs unless told otherwise
pub fn default_band_reader() -> Box<dyn BandReader> {
    #[cfg(feature = "gdal")]
    {
        Box::new(GdalBandReader)
    }
    #[cfg(not(feature = "gdal"))]
    {
        Box::new(TiffBandReader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::encoder::{colortype, TiffEncoder};

    #[test]
    fn test_read_f32_band() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vv.tif");
        let values: Vec<f32> = (0..6).map(|v| v as f32 * -1.5).collect();
        {
            let file = File::create(&path).unwrap();
            let mut encoder = TiffEncoder::new(file).unwrap();
            encoder
                .write_image::<colortype::Gray32Float>(3, 2, &values)
                .unwrap();
        }

        let band = TiffBandReader.read_band(&path).unwrap();
        assert_eq!(band.data.dim(), (2, 3));
        assert_eq!(band.data[[1, 2]], -7.5);
        assert!(band.geo_transform.is_none());
    }

    #[test]
    fn test_missing_file() {
        let result = TiffBandReader.read_band(Path::new("/nonexistent/band.tif"));
        assert!(matches!(result, Err(SarError::Io(_))));
    }
}
