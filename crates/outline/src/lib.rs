//! # Image Recolouring and Object Outlining
//!
//! Parallel hue/saturation/brightness adjustment of raster images, and an
//! edge-based pipeline that finds connected objects and draws their outlines.
//!
//! ## Core Features
//!
//! - **HSB recolouring**: rotate hue and scale saturation/brightness on scoped worker threads
//! - **Pipeline System**: grayscale, Sobel, threshold, flood fill and rendering as swappable stages
//! - **Band policies**: choose how flood fill treats the row bands handed to workers
//! - **Editing session**: serialisable commands over a pristine original image
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use outline::{open_image, save_image, HsbAdjustment, HsbRecolorEngine, OutlinePipeline};
//!
//! let image = open_image("photo.png")?;
//!
//! let cyan = HsbRecolorEngine::default().adjust(&image, HsbAdjustment::new(180, 100, 100))?;
//! save_image(&cyan, "photo_cyan.png")?;
//!
//! let outlined = OutlinePipeline::builder().build().detect_objects(&image)?;
//! save_image(&outlined, "photo_outlined.png")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use outline::{BandPolicy, ColorSegmenter, OutlinePipeline, ThresholdBinarizer};
//! use image::Rgb;
//!
//! let pipeline = OutlinePipeline::builder()
//!     .with_blur(1.2)
//!     .set_binarizer(ThresholdBinarizer { threshold: 90 })
//!     .with_band_policy(BandPolicy::Clipped)
//!     .with_outline_thickness(3)
//!     .with_outline_color(Rgb([255, 0, 255]))
//!     .with_segmentation(ColorSegmenter::default(), 0.3)
//!     .build();
//! # let _ = pipeline;
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod parallel;
pub mod algorithms;
pub mod recolor;
pub mod render;
pub mod config;
pub mod pipeline;
pub mod io;
pub mod session;

pub use error::{OutlineError, Result};
pub use types::{BandPolicy, BoundingBox, Mask, OutlineRect, Region};
pub use traits::*;
pub use algorithms::*;
pub use recolor::{HsbAdjustment, HsbRecolorEngine};
pub use render::draw_regions;
pub use config::PipelineConfig;
pub use pipeline::{builder::PipelineBuilder, OutlinePipeline, OutlineResult};
pub use io::*;
pub use session::{ImageSession, SessionCommand};
