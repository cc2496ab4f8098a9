use image::Rgb;

use crate::{
    algorithms::{
        ColorSegmenter, FloodFillExtractor, GaussianBlurPreprocessor, SobelPreprocessor,
        ThresholdBinarizer,
    },
    config::PipelineConfig,
    parallel::default_workers,
    pipeline::{OutlinePipeline, SegmentationFilter},
    traits::{Binarizer, ImagePreprocessor, RegionExtractor, Segmenter},
    types::BandPolicy,
};

/// Builder for outline pipelines with a fluent API.
///
/// Without any call to [`add_preprocessor`](Self::add_preprocessor) the
/// pipeline runs a single Sobel stage; added preprocessors replace it. The
/// flood-fill settings (`with_workers`, `with_band_policy`, ...) configure the
/// default extractor and are ignored once [`set_extractor`](Self::set_extractor)
/// supplies another one.
pub struct PipelineBuilder {
    blur_sigma: Option<f32>,
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    binarizer: Option<Box<dyn Binarizer>>,
    segmentation: Option<SegmentationFilter>,
    extractor: Option<Box<dyn RegionExtractor>>,
    flood_fill: FloodFillExtractor,
    outline_color: Rgb<u8>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            blur_sigma: None,
            preprocessors: Vec::new(),
            binarizer: None,
            segmentation: None,
            extractor: None,
            flood_fill: FloodFillExtractor::default(),
            outline_color: Rgb([0, 0, 0]),
        }
    }

    /// Builder preloaded from a configuration document
    pub fn from_config(config: &PipelineConfig) -> Self {
        let mut builder = Self::new()
            .set_binarizer(ThresholdBinarizer {
                threshold: config.edge_threshold,
            })
            .with_band_policy(config.band_policy)
            .with_outline_thickness(config.outline_thickness)
            .with_outline_color(Rgb(config.outline_color))
            .with_min_size_fraction(config.min_size_fraction)
            .with_workers(config.workers.unwrap_or_else(default_workers));
        if let Some(sigma) = config.blur_sigma {
            builder = builder.with_blur(sigma);
        }
        if let Some(overlap) = config.segment_overlap {
            builder = builder.with_segmentation(ColorSegmenter::new(config.segment_thresholds), overlap);
        }
        builder
    }

    /// Add a grayscale stage; the first call replaces the default Sobel stage
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Blur the grayscale image before the edge stages
    pub fn with_blur(mut self, sigma: f32) -> Self {
        self.blur_sigma = Some(sigma);
        self
    }

    /// Set the binarizer (replaces any existing one)
    pub fn set_binarizer<B>(mut self, binarizer: B) -> Self
    where
        B: Binarizer + 'static,
    {
        self.binarizer = Some(Box::new(binarizer));
        self
    }

    /// Set the region extractor (replaces the default flood fill)
    pub fn set_extractor<E>(mut self, extractor: E) -> Self
    where
        E: RegionExtractor + 'static,
    {
        self.extractor = Some(Box::new(extractor));
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.flood_fill.workers = workers;
        self
    }

    pub fn with_band_policy(mut self, policy: BandPolicy) -> Self {
        self.flood_fill.policy = policy;
        self
    }

    pub fn with_outline_thickness(mut self, thickness: u32) -> Self {
        self.flood_fill.outline_thickness = thickness;
        self
    }

    pub fn with_min_size_fraction(mut self, fraction: f64) -> Self {
        self.flood_fill.min_size_fraction = fraction;
        self
    }

    pub fn with_outline_color(mut self, color: Rgb<u8>) -> Self {
        self.outline_color = color;
        self
    }

    /// Keep only regions whose outline overlaps the segmenter's mask by at least `min_overlap`
    pub fn with_segmentation<S>(mut self, segmenter: S, min_overlap: f64) -> Self
    where
        S: Segmenter + 'static,
    {
        self.segmentation = Some(SegmentationFilter {
            segmenter: Box::new(segmenter),
            min_overlap,
        });
        self
    }

    /// Build the pipeline with default components where none were set
    pub fn build(self) -> OutlinePipeline {
        let mut preprocessors: Vec<Box<dyn ImagePreprocessor>> = Vec::new();
        if let Some(sigma) = self.blur_sigma {
            preprocessors.push(Box::new(GaussianBlurPreprocessor { sigma }));
        }
        if self.preprocessors.is_empty() {
            preprocessors.push(Box::new(SobelPreprocessor));
        } else {
            preprocessors.extend(self.preprocessors);
        }

        let binarizer = self
            .binarizer
            .unwrap_or_else(|| Box::new(ThresholdBinarizer::default()));
        let extractor = self.extractor.unwrap_or_else(|| Box::new(self.flood_fill));

        OutlinePipeline::new(
            preprocessors,
            binarizer,
            self.segmentation,
            extractor,
            self.outline_color,
        )
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::OutlineError, types::Mask, Region};
    use image::RgbImage;

    struct NoRegions;

    impl RegionExtractor for NoRegions {
        fn extract(&self, _mask: &Mask) -> crate::Result<Vec<Region>> {
            Ok(Vec::new())
        }
    }

    fn framed_image() -> RgbImage {
        let mut img = RgbImage::from_pixel(60, 60, Rgb([250, 250, 250]));
        for y in 10..50 {
            for x in 10..50 {
                img.put_pixel(x, y, Rgb([10, 10, 10]));
            }
        }
        img
    }

    #[test]
    fn test_default_build_runs_sobel() {
        let pipeline = PipelineBuilder::new().build();
        assert!(pipeline.info().contains("[sobel]"));
    }

    #[test]
    fn test_custom_extractor_replaces_flood_fill() {
        let image = framed_image();
        let pipeline = PipelineBuilder::new().set_extractor(NoRegions).build();
        assert_eq!(pipeline.detect_objects(&image).unwrap(), image);
    }

    #[test]
    fn test_from_config_carries_settings() {
        let config = PipelineConfig {
            edge_threshold: 300,
            ..PipelineConfig::default()
        };
        let pipeline = PipelineBuilder::from_config(&config).build();
        assert!(matches!(
            pipeline.detect_objects(&framed_image()),
            Err(OutlineError::InvalidParameter { name: "threshold", .. })
        ));

        let config = PipelineConfig {
            segment_overlap: Some(0.25),
            blur_sigma: Some(1.0),
            workers: Some(2),
            ..PipelineConfig::default()
        };
        let info = PipelineBuilder::from_config(&config).build().info();
        assert!(info.contains("gaussian_blur"));
        assert!(info.contains("segmentation overlap >= 0.25"));
    }

    #[test]
    fn test_thicker_outline_paints_more() {
        let image = framed_image();
        let thin = PipelineBuilder::new().with_workers(2).build();
        let thick = PipelineBuilder::new()
            .with_workers(2)
            .with_outline_thickness(3)
            .build();
        let black = |img: &RgbImage| img.pixels().filter(|p| p.0 == [0, 0, 0]).count();
        assert!(black(&thick.detect_objects(&image).unwrap()) > black(&thin.detect_objects(&image).unwrap()));
    }
}
