use image::{GrayImage, Luma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::error::{OutlineError, Result};

/// Rejects zero-sized buffers before any stage touches them.
pub(crate) fn ensure_not_empty(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(OutlineError::invalid_image(width, height, "image has no pixels"));
    }
    Ok(())
}

/// Foreground/background grid with the same dimensions as the image it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl Mask {
    /// Create an all-background mask
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    /// Build a mask from a grayscale image; any non-zero sample is foreground
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            cells: image.pixels().map(|p| p.0[0] != 0).collect(),
        }
    }

    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> bool,
    {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self { width, height, cells }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.cells[self.index(x, y)]
    }

    /// Number of foreground cells
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }

    /// Render as a 0/255 grayscale image, e.g. for debugging dumps
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Filled rectangle contributed to a region's outline by one border cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutlineRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl OutlineRect {
    /// Rectangle of side `thickness` centred on the border cell, clipped to the image
    pub fn around(x: u32, y: u32, thickness: u32, image_width: u32, image_height: u32) -> Self {
        let offset = thickness / 2;
        let left = x.saturating_sub(offset);
        let top = y.saturating_sub(offset);
        Self {
            x: left,
            y: top,
            width: thickness.min(image_width - left),
            height: thickness.min(image_height - top),
        }
    }
}

/// Inclusive pixel extents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl BoundingBox {
    pub fn of_rect(rect: &OutlineRect) -> Self {
        Self {
            min_x: rect.x,
            max_x: rect.x + rect.width - 1,
            min_y: rect.y,
            max_y: rect.y + rect.height - 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// One connected foreground component, described by the rectangles of its border cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Outline geometry, one rectangle per border cell
    pub outline: Vec<OutlineRect>,
    /// Border cell coordinates, parallel to `outline`
    pub border: Vec<(u32, u32)>,
    /// Extents of the outline geometry
    pub bounds: BoundingBox,
    /// Number of mask cells in the component
    pub area: usize,
}

impl Region {
    /// Build a region from its outline; `None` when the component has no border cells
    pub fn from_outline(outline: Vec<OutlineRect>, border: Vec<(u32, u32)>, area: usize) -> Option<Self> {
        let bounds = outline
            .iter()
            .map(BoundingBox::of_rect)
            .reduce(|acc, b| acc.union(&b))?;
        Some(Self {
            outline,
            border,
            bounds,
            area,
        })
    }

    /// Both bounding-box sides must reach `fraction` of the image's smaller dimension
    pub fn is_large_enough(&self, image_width: u32, image_height: u32, fraction: f64) -> bool {
        let min_size = f64::from(image_width.min(image_height)) * fraction;
        f64::from(self.bounds.width()) >= min_size && f64::from(self.bounds.height()) >= min_size
    }

    /// Fraction of border cells that are foreground in `mask`
    pub fn overlap_with(&self, mask: &Mask) -> f64 {
        if self.border.is_empty() {
            return 0.0;
        }
        let hits = self.border.iter().filter(|&&(x, y)| mask.get(x, y)).count();
        hits as f64 / self.border.len() as f64
    }
}

/// How the flood fill treats the row bands handed to extraction workers.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BandPolicy {
    /// Fill freely across bands with a per-worker visited set over the whole mask.
    /// Components straddling a band seam may be reported more than once.
    Unbounded,
    /// Confine each fill to its band; straddling components are split at the seams.
    Clipped,
    /// Confine each fill to its band, then merge fragments that touch across seams.
    #[default]
    Stitched,
}
