use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{OutlineError, Result},
    types::BandPolicy,
};

/// Tunables of the outline pipeline; every field has a default so partial
/// TOML/JSON documents are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineConfig {
    /// Edge magnitudes strictly above this value become foreground
    #[schemars(range(min = 0, max = 255))]
    pub edge_threshold: i32,
    /// Per-channel lower bounds (exclusive) of the colour segmentation
    pub segment_thresholds: [u8; 3],
    /// Minimum share of a region's outline lying on segmented colour; unset skips segmentation
    #[schemars(range(min = 0.0, max = 1.0))]
    pub segment_overlap: Option<f64>,
    /// Minimum region side as a fraction of the image's smaller dimension
    #[schemars(range(min = 0.0, max = 1.0))]
    pub min_size_fraction: f64,
    /// Side of the square drawn for each border cell
    #[schemars(range(min = 1))]
    pub outline_thickness: u32,
    pub outline_color: [u8; 3],
    /// Worker threads per parallel stage; unset uses every available core
    pub workers: Option<usize>,
    pub band_policy: BandPolicy,
    /// Optional Gaussian pre-blur applied before edge detection
    pub blur_sigma: Option<f32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 128,
            segment_thresholds: [100, 100, 100],
            segment_overlap: None,
            min_size_fraction: 0.1,
            outline_thickness: 1,
            outline_color: [0, 0, 0],
            workers: None,
            band_policy: BandPolicy::default(),
            blur_sigma: None,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        OutlineError::check_range("edge_threshold", self.edge_threshold, 0, 255)?;
        OutlineError::check_range("min_size_fraction", self.min_size_fraction, 0.0, 1.0)?;
        OutlineError::check_range("outline_thickness", self.outline_thickness, 1, u32::MAX)?;
        if let Some(overlap) = self.segment_overlap {
            OutlineError::check_range("segment_overlap", overlap, 0.0, 1.0)?;
        }
        if let Some(workers) = self.workers {
            OutlineError::check_range("workers", workers as f64, 1.0, f64::from(u32::MAX))?;
        }
        if let Some(sigma) = self.blur_sigma {
            OutlineError::check_range("blur_sigma", sigma, f32::MIN_POSITIVE, f32::MAX)?;
        }
        Ok(())
    }

    /// JSON schema of the configuration document
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(PipelineConfig)
    }
}
