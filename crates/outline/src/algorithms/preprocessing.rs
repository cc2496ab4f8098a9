use image::{GrayImage, RgbImage};
use crate::{
    error::{OutlineError, Result},
    traits::{Binarizer, Segmenter},
    types::{ensure_not_empty, Mask},
};

/// Foreground iff the sample is strictly greater than `threshold`
pub fn binarize(gray: &GrayImage, threshold: i32) -> Result<Mask> {
    ensure_not_empty(gray.width(), gray.height())?;
    OutlineError::check_range("threshold", threshold, 0, 255)?;
    let binary = imageproc::contrast::threshold(gray, threshold as u8);
    Ok(Mask::from_gray(&binary))
}

/// Simple thresholding binarizer
#[derive(Debug, Clone)]
pub struct ThresholdBinarizer {
    pub threshold: i32,
}

impl Default for ThresholdBinarizer {
    fn default() -> Self {
        Self { threshold: 128 }
    }
}

impl Binarizer for ThresholdBinarizer {
    fn binarize(&self, image: &GrayImage) -> Result<Mask> {
        binarize(image, self.threshold)
    }
}

/// Marks pixels whose red, green and blue channels all exceed their thresholds
#[derive(Debug, Clone)]
pub struct ColorSegmenter {
    pub thresholds: [u8; 3],
}

impl Default for ColorSegmenter {
    fn default() -> Self {
        Self {
            thresholds: [100, 100, 100],
        }
    }
}

impl ColorSegmenter {
    pub fn new(thresholds: [u8; 3]) -> Self {
        Self { thresholds }
    }
}

impl Segmenter for ColorSegmenter {
    fn segment(&self, image: &RgbImage) -> Result<Mask> {
        ensure_not_empty(image.width(), image.height())?;
        let [tr, tg, tb] = self.thresholds;
        Ok(Mask::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b] = image.get_pixel(x, y).0;
            r > tr && g > tg && b > tb
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_threshold_value_is_background() {
        let gray = GrayImage::from_fn(3, 1, |x, _| Luma([127 + x as u8]));
        let mask = binarize(&gray, 128).expect("valid threshold");
        assert!(!mask.get(0, 0));
        assert!(!mask.get(1, 0));
        assert!(mask.get(2, 0));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let gray = GrayImage::new(2, 2);
        assert!(matches!(
            binarize(&gray, 256),
            Err(OutlineError::InvalidParameter { name: "threshold", .. })
        ));
        assert!(binarize(&gray, -1).is_err());
    }

    #[test]
    fn test_threshold_255_is_always_background() {
        let gray = GrayImage::from_pixel(4, 4, Luma([255]));
        assert!(binarize(&gray, 255).expect("valid").is_empty());
    }

    #[test]
    fn test_segmenter_requires_every_channel() {
        let mut image = RgbImage::from_pixel(3, 1, Rgb([200, 200, 200]));
        image.put_pixel(1, 0, Rgb([200, 100, 200]));
        image.put_pixel(2, 0, Rgb([101, 101, 101]));

        let mask = ColorSegmenter::default().segment(&image).expect("non-empty");
        assert!(mask.get(0, 0));
        assert!(!mask.get(1, 0));
        assert!(mask.get(2, 0));
        assert_eq!(mask.dimensions(), (3, 1));
    }
}
