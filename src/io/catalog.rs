use crate::core::collection::ImageCollection;
use crate::core::filter::CollectionFilter;
use crate::core::image::Image;
use crate::io::raster::{default_band_reader, BandReader};
use crate::types::{GeoTransform, SarError, SarResult, SceneMetadata, GRID_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// File name of the manifest at the root of a local catalog
pub const MANIFEST_FILE: &str = "catalog.json";

/// Source of scenes, queried by collection id and metadata filter
pub trait Catalog {
    fn query(&self, collection_id: &str, filter: &CollectionFilter) -> SarResult<ImageCollection>;
}

/// Catalog over collections already held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    collections: HashMap<String, ImageCollection>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, collection_id: &str, collection: ImageCollection) {
        self.collections.insert(collection_id.to_string(), collection);
    }
}

impl Catalog for InMemoryCatalog {
    fn query(&self, collection_id: &str, filter: &CollectionFilter) -> SarResult<ImageCollection> {
        self.collections
            .get(collection_id)
            .map(|collection| collection.filter(filter))
            .ok_or_else(|| SarError::UnknownCollection(collection_id.to_string()))
    }
}

/// One band raster of a scene, path relative to the catalog root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneEntry {
    pub metadata: SceneMetadata,
    /// Overrides any georeferencing stored in the band files
    #[serde(default)]
    pub geo_transform: Option<[f64; 6]>,
    pub bands: Vec<BandEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogManifest {
    pub collections: HashMap<String, Vec<SceneEntry>>,
}

/// Directory-backed catalog: `catalog.json` plus band rasters.
///
/// Scene metadata is filtered before any raster is read.
pub struct LocalCatalog {
    root: PathBuf,
    manifest: CatalogManifest,
    reader: Box<dyn BandReader>,
}

impl std::fmt::Debug for LocalCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalCatalog")
            .field("root", &self.root)
            .field("collections", &self.manifest.collections.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl LocalCatalog {
    pub fn open<P: AsRef<Path>>(root: P) -> SarResult<Self> {
        Self::with_reader(root, default_band_reader())
    }

    pub fn with_reader<P: AsRef<Path>>(root: P, reader: Box<dyn BandReader>) -> SarResult<Self> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE);
        log::info!("Opening scene catalog {}", manifest_path.display());

        let file = File::open(&manifest_path)?;
        let manifest: CatalogManifest = serde_json::from_reader(BufReader::new(file))?;

        for (id, scenes) in &manifest.collections {
            log::debug!("Collection {}: {} scenes", id, scenes.len());
        }

        Ok(Self {
            root,
            manifest,
            reader,
        })
    }

    fn load_scene(&self, scene: &SceneEntry) -> SarResult<Image> {
        log::debug!("Loading scene {}", scene.metadata.id);

        let mut bands = Vec::with_capacity(scene.bands.len());
        let mut file_transform: Option<(GeoTransform, &str)> = None;
        for entry in &scene.bands {
            let band = self.reader.read_band(&self.root.join(&entry.path))?;
            if let Some(gt) = band.geo_transform {
                if let Some((reference, reference_band)) = &file_transform {
                    if !gt.approx_eq(reference, GRID_TOLERANCE) {
                        return Err(SarError::InvalidFormat(format!(
                            "Band {} of scene {} is not on the grid of band {} ({:?} vs {:?})",
                            entry.name,
                            scene.metadata.id,
                            reference_band,
                            gt.coefficients(),
                            reference.coefficients()
                        )));
                    }
                } else {
                    file_transform = Some((gt, entry.name.as_str()));
                }
            }
            bands.push((entry.name.clone(), band.data));
        }

        let geo_transform = scene
            .geo_transform
            .map(GeoTransform::from_gdal)
            .or(file_transform.map(|(gt, _)| gt))
            .ok_or_else(|| {
                SarError::InvalidFormat(format!(
                    "Scene {} has no georeferencing",
                    scene.metadata.id
                ))
            })?;

        Image::new(scene.metadata.clone(), geo_transform, bands)
    }
}

impl Catalog for LocalCatalog {
    fn query(&self, collection_id: &str, filter: &CollectionFilter) -> SarResult<ImageCollection> {
        let scenes = self
            .manifest
            .collections
            .get(collection_id)
            .ok_or_else(|| SarError::UnknownCollection(collection_id.to_string()))?;

        let images = scenes
            .iter()
            .filter(|scene| filter.matches(&scene.metadata))
            .map(|scene| self.load_scene(scene))
            .collect::<SarResult<Vec<_>>>()?;

        log::info!(
            "Catalog query on {} matched {} of {} scenes",
            collection_id,
            images.len(),
            scenes.len()
        );
        Ok(ImageCollection::new(images))
    }
}
