use image::{GrayImage, RgbImage};
use crate::{error::Result, types::{Mask, Region}};

/// Trait for grayscale image stages run before binarization
pub trait ImagePreprocessor: Send + Sync {
    /// Transform a grayscale image (e.g. blur, gradient magnitude)
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;

    /// Short human-readable stage name
    fn name(&self) -> &'static str;
}

/// Trait for turning a grayscale image into a foreground mask
pub trait Binarizer: Send + Sync {
    fn binarize(&self, image: &GrayImage) -> Result<Mask>;
}

/// Trait for colour-based segmentation of the original image
pub trait Segmenter: Send + Sync {
    fn segment(&self, image: &RgbImage) -> Result<Mask>;
}

/// Trait for connected-component extraction from a mask
pub trait RegionExtractor: Send + Sync {
    /// Extract the retained regions of `mask`
    fn extract(&self, mask: &Mask) -> Result<Vec<Region>>;
}
