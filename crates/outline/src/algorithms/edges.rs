use image::{GrayImage, Luma, RgbImage};
use crate::{
    error::{OutlineError, Result},
    traits::ImagePreprocessor,
    types::ensure_not_empty,
};

const SOBEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const SOBEL_Y: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// Luma reduction of every RGB sample
pub fn grayscale(source: &RgbImage) -> Result<GrayImage> {
    ensure_not_empty(source.width(), source.height())?;
    Ok(image::imageops::grayscale(source))
}

/// Sobel gradient magnitude of a grayscale image.
///
/// Only interior pixels are computed; the one-pixel frame has no complete 3x3
/// neighbourhood and stays at 0. Magnitudes above 255 saturate to white.
pub fn sobel(gray: &GrayImage) -> Result<GrayImage> {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return Err(OutlineError::invalid_image(
            width,
            height,
            "sobel needs at least a 3x3 image",
        ));
    }

    let mut output = GrayImage::new(width, height);
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut gx = 0i32;
            let mut gy = 0i32;
            for (ky, (row_x, row_y)) in SOBEL_X.iter().zip(SOBEL_Y.iter()).enumerate() {
                for kx in 0..3 {
                    let sample = i32::from(gray.get_pixel(x + kx as u32 - 1, y + ky as u32 - 1).0[0]);
                    gx += row_x[kx] * sample;
                    gy += row_y[kx] * sample;
                }
            }
            let magnitude = f64::from(gx * gx + gy * gy).sqrt().round();
            let value = if magnitude > 255.0 { 255 } else { magnitude as u8 };
            output.put_pixel(x, y, Luma([value]));
        }
    }
    Ok(output)
}

/// Sobel edge magnitude as a pipeline stage
#[derive(Debug, Clone, Default)]
pub struct SobelPreprocessor;

impl ImagePreprocessor for SobelPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        sobel(image)
    }

    fn name(&self) -> &'static str {
        "sobel"
    }
}

/// Gaussian blur preprocessor for noise reduction ahead of edge detection
#[derive(Debug, Clone)]
pub struct GaussianBlurPreprocessor {
    pub sigma: f32,
}

impl Default for GaussianBlurPreprocessor {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

impl ImagePreprocessor for GaussianBlurPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        if !(self.sigma > 0.0) {
            return Err(OutlineError::InvalidParameter {
                name: "blur_sigma",
                value: f64::from(self.sigma),
                min: f64::MIN_POSITIVE,
                max: f64::from(f32::MAX),
            });
        }
        Ok(imageproc::filter::gaussian_blur_f32(image, self.sigma))
    }

    fn name(&self) -> &'static str {
        "gaussian_blur"
    }
}
