//! End-to-end normalized polarization workflow.
//!
//! Nothing is computed until [`Pipeline::evaluate`] (or [`Pipeline::run`],
//! which also displays the result) is called.

use crate::config::PipelineConfig;
use crate::core::calibrate::RadiometricCorrector;
use crate::core::composite::{Composite, Reducer, TemporalAggregator};
use crate::core::convolve::SpatialSmoother;
use crate::core::display::DisplaySink;
use crate::core::index::{PolarizationIndex, BAND_POL};
use crate::io::Catalog;
use crate::types::SarResult;

/// Composites produced by one evaluation
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Number of scenes that passed the collection filter
    pub scene_count: usize,
    pub mean: Composite,
    pub median: Composite,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> SarResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Query the catalog and run every stage up to the two composites
    pub fn evaluate(&self, catalog: &dyn Catalog) -> SarResult<PipelineOutput> {
        let config = &self.config;
        log::info!("Starting normalized polarization processing on {}", config.collection_id);

        let s1_collection = catalog.query(&config.collection_id, &config.collection_filter())?;
        log::info!("Filtered collection: {}", s1_collection.summary());

        let angle_masked = config.angle_mask.apply_to_collection(&s1_collection)?;

        let gamma0 = RadiometricCorrector::new().apply_to_collection(&angle_masked)?;

        let pol_vh = PolarizationIndex.apply_to_collection(&gamma0)?;

        let kernel = config.kernel.build()?;
        let smoothed = SpatialSmoother::new(kernel).apply_to_collection(&pol_vh)?;

        let aggregator = TemporalAggregator::new(BAND_POL);
        let mean = aggregator.reduce(&smoothed, Reducer::Mean)?;
        let median = aggregator.reduce(&smoothed, Reducer::Median)?;

        Ok(PipelineOutput {
            scene_count: s1_collection.len(),
            mean,
            median,
        })
    }

    /// Evaluate, then draw the mean layer (and the median layer when
    /// configured). Display failures are logged and do not fail the run.
    pub fn run(&self, catalog: &dyn Catalog, sink: &mut dyn DisplaySink) -> SarResult<PipelineOutput> {
        let output = self.evaluate(catalog)?;
        let config = &self.config;

        sink.center_object(&config.region, config.map_zoom);

        let mut layers = vec![(&output.mean, &config.mean_layer)];
        if let Some(median_layer) = &config.median_layer {
            layers.push((&output.median, median_layer));
        }

        for (composite, layer) in layers {
            if let Err(e) = sink.add_layer(composite, &config.region, &layer.vis, &layer.name) {
                log::warn!("Failed to display layer '{}': {}", layer.name, e);
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collection::ImageCollection;
    use crate::core::composite::Composite;
    use crate::core::display::VisParams;
    use crate::core::image::tests::uniform_image;
    use crate::geometry::Region;
    use crate::io::InMemoryCatalog;
    use crate::types::SarError;

    /// Records layer names; fails on demand
    #[derive(Default)]
    struct RecordingSink {
        layers: Vec<String>,
        fail: bool,
    }

    impl DisplaySink for RecordingSink {
        fn add_layer(
            &mut self,
            _composite: &Composite,
            _region: &Region,
            _vis: &VisParams,
            name: &str,
        ) -> SarResult<()> {
            if self.fail {
                return Err(SarError::Render("display unavailable".to_string()));
            }
            self.layers.push(name.to_string());
            Ok(())
        }
    }

    fn catalog(images: Vec<crate::core::image::Image>) -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert("COPERNICUS/S1_GRD", ImageCollection::new(images));
        catalog
    }

    #[test]
    fn test_empty_collection_is_not_an_error() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let mut sink = RecordingSink::default();
        let output = pipeline.run(&catalog(vec![]), &mut sink).unwrap();

        assert_eq!(output.scene_count, 0);
        assert!(output.mean.is_fully_masked());
        assert!(output.median.is_fully_masked());
    }

    #[test]
    fn test_display_failure_does_not_abort() {
        let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
        let mut sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let output = pipeline
            .run(&catalog(vec![uniform_image("s1", (4, 4), 10.0, 5.0, 40.0)]), &mut sink)
            .unwrap();
        assert_eq!(output.scene_count, 1);
        assert!(!output.mean.is_fully_masked());
    }

    #[test]
    fn test_median_layer_drawn_only_when_configured() {
        let images = vec![uniform_image("s1", (4, 4), 10.0, 5.0, 40.0)];

        let mut sink = RecordingSink::default();
        Pipeline::new(PipelineConfig::default())
            .unwrap()
            .run(&catalog(images.clone()), &mut sink)
            .unwrap();
        assert_eq!(sink.layers, vec!["S-1 Filtered Polarized Boxcar Mean VH"]);

        let mut config = PipelineConfig::default();
        config.median_layer = Some(crate::config::LayerConfig {
            name: "median".to_string(),
            vis: VisParams::new(-30.0, 1.0),
        });
        let mut sink = RecordingSink::default();
        Pipeline::new(config).unwrap().run(&catalog(images), &mut sink).unwrap();
        assert_eq!(sink.layers.len(), 2);
        assert_eq!(sink.layers[1], "median");
    }

    #[test]
    fn test_unknown_collection_is_fatal() {
        let mut config = PipelineConfig::default();
        config.collection_id = "COPERNICUS/S2".to_string();
        let result = Pipeline::new(config).unwrap().evaluate(&catalog(vec![]));
        assert!(matches!(result, Err(SarError::UnknownCollection(_))));
    }
}
