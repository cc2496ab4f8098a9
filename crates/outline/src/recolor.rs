use image::{Rgb, RgbImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    algorithms::color::Hsb,
    error::{OutlineError, Result},
    parallel::{default_workers, fork_join, partition_rows},
    types::ensure_not_empty,
};

/// Slider-style HSB adjustment: hue in degrees, saturation and brightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HsbAdjustment {
    /// Hue rotation in degrees; 360 is a full turn and equivalent to 0
    #[schemars(range(min = 0, max = 360))]
    pub hue: i32,
    /// Saturation scale in percent
    #[schemars(range(min = 0, max = 200))]
    pub saturation: i32,
    /// Brightness scale in percent
    #[schemars(range(min = 0, max = 200))]
    pub brightness: i32,
}

impl Default for HsbAdjustment {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl HsbAdjustment {
    /// Leaves every pixel as it is
    pub const NEUTRAL: Self = Self {
        hue: 0,
        saturation: 100,
        brightness: 100,
    };

    pub fn new(hue: i32, saturation: i32, brightness: i32) -> Self {
        Self {
            hue,
            saturation,
            brightness,
        }
    }

    pub fn validate(&self) -> Result<()> {
        OutlineError::check_range("hue", self.hue, 0, 360)?;
        OutlineError::check_range("saturation", self.saturation, 0, 200)?;
        OutlineError::check_range("brightness", self.brightness, 0, 200)
    }

    /// Apply the adjustment to one sample
    pub fn apply(&self, rgb: Rgb<u8>) -> Rgb<u8> {
        let hsb = Hsb::from_rgb(rgb);
        let hue = (hsb.hue + self.hue as f32 / 360.0) % 1.0;
        let saturation = (hsb.saturation * (self.saturation as f32 / 100.0)).min(1.0);
        let brightness = (hsb.brightness * (self.brightness as f32 / 100.0)).min(1.0);
        Hsb::new(hue, saturation, brightness).to_rgb()
    }
}

/// Recolours images band by band on scoped worker threads.
#[derive(Debug, Clone)]
pub struct HsbRecolorEngine {
    workers: usize,
}

impl Default for HsbRecolorEngine {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

impl HsbRecolorEngine {
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Return a recoloured copy of `source`.
    ///
    /// Rows are split into one band per worker; every worker writes only its
    /// own slice of the output, so no locking is involved. The call returns
    /// after every worker has been joined.
    pub fn adjust(&self, source: &RgbImage, adjustment: HsbAdjustment) -> Result<RgbImage> {
        let (width, height) = source.dimensions();
        ensure_not_empty(width, height)?;
        adjustment.validate()?;
        OutlineError::check_range("workers", self.workers as f64, 1.0, f64::from(u32::MAX))?;

        let row_len = width as usize * 3;
        let mut output = vec![0u8; row_len * height as usize];
        let input: &[u8] = source.as_raw();

        let mut jobs = Vec::with_capacity(self.workers);
        let mut remaining: &mut [u8] = &mut output;
        for partition in partition_rows(height, self.workers) {
            if partition.is_empty() {
                continue;
            }
            let (band, rest) = remaining.split_at_mut(partition.rows() as usize * row_len);
            remaining = rest;
            jobs.push((partition, band));
        }

        debug!(width, height, workers = jobs.len(), ?adjustment, "recolouring image");
        fork_join("recolor", jobs, |partition, band: &mut [u8]| {
            let offset = partition.start as usize * row_len;
            let source_band = &input[offset..offset + band.len()];
            for (dst, src) in band.chunks_exact_mut(3).zip(source_band.chunks_exact(3)) {
                let Rgb(adjusted) = adjustment.apply(Rgb([src[0], src[1], src[2]]));
                dst.copy_from_slice(&adjusted);
            }
            Ok(())
        })?;

        RgbImage::from_raw(width, height, output).ok_or_else(|| {
            OutlineError::invalid_image(width, height, "recoloured buffer has the wrong length")
        })
    }
}
