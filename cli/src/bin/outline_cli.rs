use clap::{Parser, Subcommand};
use cli::{Job, load_pipeline_config};
use color_eyre::eyre::{Result, eyre};
use outline::{
    BandPolicy, HsbAdjustment, HsbRecolorEngine, OutlinePipeline, PipelineBuilder, PipelineConfig,
    SessionCommand, open_image, save_image,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recolour an image by rotating hue and scaling saturation/brightness
    Adjust {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Hue rotation in degrees (0-360)
        #[arg(long, default_value_t = 0)]
        hue: i32,
        /// Saturation in percent (0-200)
        #[arg(long, default_value_t = 100)]
        saturation: i32,
        /// Brightness in percent (0-200)
        #[arg(long, default_value_t = 100)]
        brightness: i32,
        /// Worker threads (defaults to the number of cores)
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Detect objects and draw their outlines
    Outline {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Pipeline configuration file (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Edge threshold (0-255), overrides the configuration file
        #[arg(long)]
        threshold: Option<i32>,
        #[arg(long)]
        workers: Option<usize>,
        /// unbounded, clipped or stitched
        #[arg(long)]
        band_policy: Option<BandPolicy>,
        /// Minimum share of an outline on segmented colour (0-1)
        #[arg(long)]
        segment_overlap: Option<f64>,
    },
    /// Run a job file describing several renditions of one image
    Process {
        /// Path to the TOML or JSON job file
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the JSON schemas of session commands and job files
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Adjust {
            input,
            output,
            hue,
            saturation,
            brightness,
            workers,
        } => {
            let engine = workers.map(HsbRecolorEngine::new).unwrap_or_default();
            adjust_image(&input, &output, &engine, HsbAdjustment::new(hue, saturation, brightness))?;
        }
        Commands::Outline {
            input,
            output,
            config,
            threshold,
            workers,
            band_policy,
            segment_overlap,
        } => {
            let mut config = match config {
                Some(path) => load_pipeline_config(path)?,
                None => PipelineConfig::default(),
            };
            if let Some(threshold) = threshold {
                config.edge_threshold = threshold;
            }
            if workers.is_some() {
                config.workers = workers;
            }
            if let Some(policy) = band_policy {
                config.band_policy = policy;
            }
            if segment_overlap.is_some() {
                config.segment_overlap = segment_overlap;
            }
            outline_image(&input, &output, &config)?;
        }
        Commands::Process { config } => {
            process_job(&config)?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&SessionCommand::schema())?);
            println!("{}", serde_json::to_string_pretty(&Job::schema())?);
        }
    }

    Ok(())
}

fn adjust_image(
    input: &Path,
    output: &Path,
    engine: &HsbRecolorEngine,
    adjustment: HsbAdjustment,
) -> Result<()> {
    let image = open_image(input)?;
    info!(?adjustment, workers = engine.workers(), "Adjusting {:?}", input);
    let adjusted = engine.adjust(&image, adjustment)?;
    save_image(&adjusted, output)?;
    info!("Saved {:?}", output);
    Ok(())
}

fn build_pipeline(config: &PipelineConfig) -> Result<OutlinePipeline> {
    config.validate()?;
    Ok(PipelineBuilder::from_config(config).build())
}

fn outline_image(input: &Path, output: &Path, config: &PipelineConfig) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    info!("{}", pipeline.info());

    let image = open_image(input)?;
    let result = pipeline.process(&image)?;
    info!("Outlined {} regions in {:?}", result.regions.len(), input);

    save_image(&result.image, output)?;
    info!("Saved {:?}", output);
    Ok(())
}

fn process_job(config_path: &Path) -> Result<()> {
    let job = Job::from_file(config_path)?;
    info!("Job: {} renditions of {}", job.renditions.len(), job.input);
    if job.renditions.is_empty() {
        return Err(eyre!("Job {:?} has no renditions", config_path));
    }

    let source = open_image(&job.input)?;
    let output_dir = Path::new(&job.output_dir);
    std::fs::create_dir_all(output_dir)?;

    let recolor = job
        .pipeline
        .workers
        .map(HsbRecolorEngine::new)
        .unwrap_or_default();
    let pipeline = build_pipeline(&job.pipeline)?;

    for rendition in &job.renditions {
        if rendition.is_noop() {
            warn!(
                "Rendition '{}' neither adjusts nor outlines, copying the input: {}",
                rendition.name,
                rendition.description.clone().unwrap_or_default()
            );
        }
        let output = rendition.output_path(output_dir);
        info!("Rendering '{}' -> {:?}", rendition.name, output);
        let image = rendition.render(&source, &recolor, &pipeline)?;
        save_image(&image, &output)?;
    }

    info!("✅ Job completed!");
    Ok(())
}
