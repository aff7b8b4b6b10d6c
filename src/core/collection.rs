use crate::core::filter::CollectionFilter;
use crate::core::image::Image;
use crate::types::SarResult;
use chrono::{DateTime, Utc};

/// Ordered set of scenes sharing one band schema.
///
/// Transforms never mutate a collection; each returns a new one.
#[derive(Debug, Clone, Default)]
pub struct ImageCollection {
    images: Vec<Image>,
}

/// Short description of a collection for logging
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSummary {
    pub count: usize,
    pub first_acquisition: Option<DateTime<Utc>>,
    pub last_acquisition: Option<DateTime<Utc>>,
    pub band_names: Vec<String>,
}

impl std::fmt::Display for CollectionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.first_acquisition, self.last_acquisition) {
            (Some(first), Some(last)) => write!(
                f,
                "{} images from {} to {}, bands {:?}",
                self.count,
                first.format("%Y-%m-%d"),
                last.format("%Y-%m-%d"),
                self.band_names
            ),
            _ => write!(f, "empty collection"),
        }
    }
}

impl ImageCollection {
    pub fn new(images: Vec<Image>) -> Self {
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn first(&self) -> Option<&Image> {
        self.images.first()
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Image> {
        self.images.iter()
    }

    /// Keep the images whose metadata passes `filter`, preserving order
    pub fn filter(&self, filter: &CollectionFilter) -> ImageCollection {
        let images: Vec<Image> = self
            .images
            .iter()
            .filter(|image| filter.matches(image.metadata()))
            .cloned()
            .collect();

        log::debug!("Filter kept {} of {} images", images.len(), self.images.len());
        ImageCollection { images }
    }

    /// Apply a fallible per-image transform. The first error aborts the map.
    #[cfg(feature = "parallel")]
    pub fn try_map<F>(&self, f: F) -> SarResult<ImageCollection>
    where
        F: Fn(&Image) -> SarResult<Image> + Sync + Send,
    {
        use rayon::prelude::*;

        let images = self
            .images
            .par_iter()
            .map(|image| f(image))
            .collect::<SarResult<Vec<_>>>()?;
        Ok(ImageCollection { images })
    }

    #[cfg(not(feature = "parallel"))]
    pub fn try_map<F>(&self, f: F) -> SarResult<ImageCollection>
    where
        F: Fn(&Image) -> SarResult<Image> + Sync + Send,
    {
        let images = self
            .images
            .iter()
            .map(|image| f(image))
            .collect::<SarResult<Vec<_>>>()?;
        Ok(ImageCollection { images })
    }

    /// Project every image onto the named bands
    pub fn select(&self, names: &[&str]) -> SarResult<ImageCollection> {
        self.try_map(|image| image.select(names))
    }

    pub fn summary(&self) -> CollectionSummary {
        let times = self.images.iter().map(|image| image.metadata().acquisition_time);
        CollectionSummary {
            count: self.images.len(),
            first_acquisition: times.clone().min(),
            last_acquisition: times.max(),
            band_names: self
                .images
                .first()
                .map(|image| image.band_names().into_iter().map(String::from).collect())
                .unwrap_or_default(),
        }
    }
}

impl FromIterator<Image> for ImageCollection {
    fn from_iter<I: IntoIterator<Item = Image>>(iter: I) -> Self {
        ImageCollection::new(iter.into_iter().collect())
    }
}

impl IntoIterator for ImageCollection {
    type Item = Image;
    type IntoIter = std::vec::IntoIter<Image>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.into_iter()
    }
}
