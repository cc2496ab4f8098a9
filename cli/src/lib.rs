use image::RgbImage;
use outline::{HsbAdjustment, HsbRecolorEngine, OutlinePipeline, PipelineConfig};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// One output image of a job
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Rendition {
    pub name: String,
    pub description: Option<String>,
    /// Recolour the input first
    pub adjust: Option<HsbAdjustment>,
    /// Draw object outlines (on the recoloured image when `adjust` is set)
    #[serde(default)]
    pub outline: bool,
    /// File extension of the written image, `png` when unset
    pub format: Option<String>,
}

impl Rendition {
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        let extension = self.format.as_deref().unwrap_or("png");
        output_dir.join(format!("{}.{}", self.name, extension))
    }

    /// Whether the rendition changes anything at all
    pub fn is_noop(&self) -> bool {
        self.adjust.is_none() && !self.outline
    }

    pub fn render(
        &self,
        source: &RgbImage,
        recolor: &HsbRecolorEngine,
        pipeline: &OutlinePipeline,
    ) -> outline::Result<RgbImage> {
        let adjusted = match self.adjust {
            Some(adjustment) => recolor.adjust(source, adjustment)?,
            None => source.clone(),
        };
        if self.outline {
            pipeline.detect_objects(&adjusted)
        } else {
            Ok(adjusted)
        }
    }
}

/// Batch job: one input image, several named renditions
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Job {
    pub input: String,
    pub output_dir: String,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub renditions: Vec<Rendition>,
}

impl Job {
    /// Load Job configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load Job configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        load_document(path)
    }

    /// Save the job to a TOML or JSON file, chosen by extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let content = match Format::of(path.as_ref())? {
            Format::Toml => self.to_toml()?,
            Format::Json => self.to_json()?,
        };
        fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// JSON schema of the job file
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Job)
    }
}

enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Result<Self, CliError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }
}

/// Read a TOML or JSON document, picking the parser from the file extension
pub fn load_document<T, P>(path: P) -> Result<T, CliError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let format = Format::of(path.as_ref())?;
    let content = fs::read_to_string(path)?;
    Ok(match format {
        Format::Toml => toml::from_str(&content)?,
        Format::Json => serde_json::from_str(&content)?,
    })
}

/// Load a pipeline configuration file
pub fn load_pipeline_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, CliError> {
    load_document(path)
}
