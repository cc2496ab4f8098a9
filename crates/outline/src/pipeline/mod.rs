pub mod builder;

use image::{Rgb, RgbImage};
use tracing::{debug, info, warn};

use crate::{
    algorithms::edges::grayscale,
    error::{OutlineError, Result},
    render::draw_regions,
    traits::{Binarizer, ImagePreprocessor, RegionExtractor, Segmenter},
    types::{Mask, Region},
};

/// Colour segmentation used as an extra acceptance criterion for regions
pub struct SegmentationFilter {
    pub segmenter: Box<dyn Segmenter>,
    /// Minimum fraction of a region's outline that must lie on segmented colour
    pub min_overlap: f64,
}

/// Outlined copy of the source together with the regions that were drawn
#[derive(Debug, Clone)]
pub struct OutlineResult {
    pub image: RgbImage,
    pub regions: Vec<Region>,
}

/// Edge detection, binarization, region extraction and rendering, in that order
pub struct OutlinePipeline {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    binarizer: Box<dyn Binarizer>,
    segmentation: Option<SegmentationFilter>,
    extractor: Box<dyn RegionExtractor>,
    outline_color: Rgb<u8>,
}

impl OutlinePipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(
        preprocessors: Vec<Box<dyn ImagePreprocessor>>,
        binarizer: Box<dyn Binarizer>,
        segmentation: Option<SegmentationFilter>,
        extractor: Box<dyn RegionExtractor>,
        outline_color: Rgb<u8>,
    ) -> Self {
        Self {
            preprocessors,
            binarizer,
            segmentation,
            extractor,
            outline_color,
        }
    }

    /// Outline the detected objects of `source` on a copy of it
    pub fn detect_objects(&self, source: &RgbImage) -> Result<RgbImage> {
        Ok(self.process(source)?.image)
    }

    /// Run every stage and keep the extracted regions alongside the outlined image
    pub fn process(&self, source: &RgbImage) -> Result<OutlineResult> {
        let (width, height) = source.dimensions();
        if let Some(filter) = &self.segmentation {
            OutlineError::check_range("segment_overlap", filter.min_overlap, 0.0, 1.0)?;
        }

        let mut gray = grayscale(source)?;
        for preprocessor in &self.preprocessors {
            gray = preprocessor.preprocess(&gray)?;
            debug!(stage = preprocessor.name(), width, height, "preprocessed");
        }

        let mask = self.binarizer.binarize(&gray)?;
        debug!(foreground = mask.count(), "binarized");

        let mut regions = self.extractor.extract(&mask)?;

        if let Some(filter) = &self.segmentation {
            let segmented = filter.segmenter.segment(source)?;
            check_dimensions(&mask, &segmented)?;
            let before = regions.len();
            regions.retain(|region| region.overlap_with(&segmented) >= filter.min_overlap);
            if before > 0 && regions.is_empty() {
                warn!(before, min_overlap = filter.min_overlap, "segmentation filter rejected every region");
            }
            debug!(
                before,
                after = regions.len(),
                min_overlap = filter.min_overlap,
                "applied segmentation filter"
            );
        }

        let mut image = source.clone();
        draw_regions(&mut image, &regions, self.outline_color);
        info!(width, height, regions = regions.len(), "outlined image");

        Ok(OutlineResult { image, regions })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let stages: Vec<&str> = self.preprocessors.iter().map(|p| p.name()).collect();
        format!(
            "Pipeline: grayscale -> [{}] -> binarize -> extract{}",
            stages.join(", "),
            match &self.segmentation {
                Some(filter) => format!(" -> segmentation overlap >= {}", filter.min_overlap),
                None => String::new(),
            }
        )
    }
}

fn check_dimensions(mask: &Mask, segmented: &Mask) -> Result<()> {
    if mask.dimensions() != segmented.dimensions() {
        let (width, height) = segmented.dimensions();
        return Err(OutlineError::invalid_image(
            width,
            height,
            format!(
                "segmentation mask does not match the {}x{} edge mask",
                mask.width(),
                mask.height()
            ),
        ));
    }
    Ok(())
}
