use std::path::Path;

use image::RgbImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr, VariantNames};
use tracing::info;

use crate::{
    error::Result,
    io::{load_image, open_image, save_image},
    pipeline::OutlinePipeline,
    recolor::{HsbAdjustment, HsbRecolorEngine},
};

#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(tag = "type", content = "params")]
#[strum(serialize_all = "snake_case")]
pub enum SessionCommand {
    /// Recolour the original image with slider-style HSB values
    #[serde(rename = "adjust_hsb")]
    AdjustHsb {
        #[schemars(range(min = 0, max = 360))]
        hue: i32,
        #[schemars(range(min = 0, max = 200))]
        saturation: i32,
        #[schemars(range(min = 0, max = 200))]
        brightness: i32,
    },

    /// Outline the objects found in the original image
    #[serde(rename = "detect_objects")]
    DetectObjects,

    /// Drop every derived image and return to the original
    #[serde(rename = "reset")]
    Reset,
}

impl SessionCommand {
    /// Get the JSON schema for all commands
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(SessionCommand)
    }

    /// Get a list of all available command names
    pub fn command_names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::AdjustHsb { .. } => "Recolour the original image by rotating hue and scaling saturation and brightness",
            Self::DetectObjects => "Draw the outlines of detected objects over a copy of the original image",
            Self::Reset => "Discard adjustments and outlines, restoring the original image",
        }
    }
}

/// Editing state for one loaded image.
///
/// Every derived image is recomputed from the untouched original, so
/// adjustments never accumulate.
pub struct ImageSession {
    original: RgbImage,
    adjusted: RgbImage,
    outlined: Option<RgbImage>,
    recolor: HsbRecolorEngine,
    pipeline: OutlinePipeline,
}

impl ImageSession {
    pub fn new(original: RgbImage) -> Self {
        Self::with_pipeline(original, OutlinePipeline::builder().build())
    }

    /// Create a session that outlines with a custom pipeline
    pub fn with_pipeline(original: RgbImage, pipeline: OutlinePipeline) -> Self {
        Self {
            adjusted: original.clone(),
            original,
            outlined: None,
            recolor: HsbRecolorEngine::default(),
            pipeline,
        }
    }

    pub fn with_recolor_engine(mut self, recolor: HsbRecolorEngine) -> Self {
        self.recolor = recolor;
        self
    }

    /// Load the original image from encoded bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(load_image(bytes)?))
    }

    /// Load the original image from a file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(open_image(path)?))
    }

    pub fn original(&self) -> &RgbImage {
        &self.original
    }

    pub fn adjusted(&self) -> &RgbImage {
        &self.adjusted
    }

    pub fn outlined(&self) -> Option<&RgbImage> {
        self.outlined.as_ref()
    }

    /// Run a command and return the image it produced
    pub fn execute(&mut self, command: SessionCommand) -> Result<&RgbImage> {
        info!(%command, "executing session command");
        match command {
            SessionCommand::AdjustHsb {
                hue,
                saturation,
                brightness,
            } => {
                let adjustment = HsbAdjustment::new(hue, saturation, brightness);
                self.adjusted = self.recolor.adjust(&self.original, adjustment)?;
                Ok(&self.adjusted)
            }
            SessionCommand::DetectObjects => {
                let outlined = self.pipeline.detect_objects(&self.original)?;
                Ok(&*self.outlined.insert(outlined))
            }
            SessionCommand::Reset => {
                self.adjusted = self.original.clone();
                self.outlined = None;
                Ok(&self.original)
            }
        }
    }

    /// The image a save would write: the outlined image when there is one, else the adjusted one
    pub fn export_target(&self) -> &RgbImage {
        self.outlined.as_ref().unwrap_or(&self.adjusted)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_image(self.export_target(), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn red_square() -> RgbImage {
        let mut img = RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]));
        for y in 15..35 {
            for x in 15..35 {
                img.put_pixel(x, y, Rgb([255, 0, 0]));
            }
        }
        img
    }

    #[test]
    fn test_adjustments_do_not_accumulate() {
        let mut session = ImageSession::new(red_square())
            .with_recolor_engine(HsbRecolorEngine::new(2));
        let adjust = SessionCommand::AdjustHsb { hue: 120, saturation: 100, brightness: 100 };
        let once = session.execute(adjust).unwrap().clone();
        let twice = session.execute(adjust).unwrap().clone();
        assert_eq!(once, twice);
        assert_eq!(*once.get_pixel(20, 20), Rgb([0, 255, 0]));
        assert_eq!(session.original(), &red_square());
    }

    #[test]
    fn test_export_target_prefers_outline() {
        let mut session = ImageSession::new(red_square());
        assert_eq!(session.export_target(), session.adjusted());

        session.execute(SessionCommand::DetectObjects).unwrap();
        assert!(session.outlined().is_some());
        assert_eq!(Some(session.export_target()), session.outlined());

        session.execute(SessionCommand::Reset).unwrap();
        assert!(session.outlined().is_none());
        assert_eq!(session.export_target(), session.original());
    }

    #[test]
    fn test_outline_ignores_adjustment() {
        let mut session = ImageSession::new(red_square());
        session
            .execute(SessionCommand::AdjustHsb { hue: 200, saturation: 50, brightness: 80 })
            .unwrap();
        let outlined = session.execute(SessionCommand::DetectObjects).unwrap();
        assert_eq!(*outlined.get_pixel(25, 25), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_invalid_adjustment_keeps_state() {
        let mut session = ImageSession::new(red_square());
        let result = session.execute(SessionCommand::AdjustHsb { hue: 400, saturation: 100, brightness: 100 });
        assert!(result.is_err());
        assert_eq!(session.adjusted(), session.original());
    }

    #[test]
    fn test_command_metadata() {
        assert_eq!(SessionCommand::command_names(), &["adjust_hsb", "detect_objects", "reset"]);
        assert_eq!("reset".parse::<SessionCommand>().unwrap(), SessionCommand::Reset);

        let json = serde_json::to_string(&SessionCommand::AdjustHsb { hue: 10, saturation: 20, brightness: 30 }).unwrap();
        assert_eq!(json, r#"{"type":"adjust_hsb","params":{"hue":10,"saturation":20,"brightness":30}}"#);
        let schema = serde_json::to_value(SessionCommand::schema()).unwrap();
        assert!(schema.to_string().contains("detect_objects"));
    }
}
