use clap::{Parser, Subcommand};
use serde::Serialize;
use shared::{ClassificationFailure, ClassificationResponse, ModelInfo, RankingMode};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::inference::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, MODEL_PATH_ENV};
use crate::inference::{Classifier, ClassifierConfig, ClassifyError, ConfigError, NUM_CLASSES};
use crate::upload::UploadedImage;

#[derive(Parser)]
#[command(name = "signscan")]
#[command(version)]
#[command(about = "Classify traffic-sign images with a pre-trained CNN", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    /// Model artifact path (overrides config and SIGNSCAN_MODEL_PATH)
    #[arg(short, long)]
    pub model: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify one or more .jpg/.jpeg/.png files
    Classify {
        /// Images to classify
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Number of predictions to report (top1 or top5)
        #[arg(long)]
        mode: Option<RankingMode>,
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
        /// Include the full score vector in JSON output
        #[arg(long)]
        all: bool,
    },
    /// Show model and label information
    Info,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Outcome {
    Classified(ClassificationResponse),
    Failed(ClassificationFailure),
}

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub mode: RankingMode,
    pub json: bool,
    pub all_scores: bool,
}

pub fn resolve_config(cli: &Cli) -> Result<ClassifierConfig, ConfigError> {
    resolve_config_from(
        cli,
        Path::new(DEFAULT_CONFIG_PATH),
        std::env::var(MODEL_PATH_ENV).ok(),
    )
}

/// Config file, then the model path from the environment, then `--model`.
pub fn resolve_config_from(
    cli: &Cli,
    default_path: &Path,
    env_model_path: Option<String>,
) -> Result<ClassifierConfig, ConfigError> {
    let mut config = ClassifierConfig::load_or_fallback(cli.config.as_deref(), default_path)?;
    config.override_model_path(env_model_path);
    if let Some(model) = &cli.model {
        config.model.path = model.clone();
    }
    Ok(config)
}

pub fn model_info(config: &ClassifierConfig) -> ModelInfo {
    ModelInfo {
        architecture: "CNN".to_string(),
        dataset: "GTSRB".to_string(),
        num_classes: NUM_CLASSES,
        input: "32x32 RGB".to_string(),
        model_path: config.model.path.display().to_string(),
        mode: config.ranking.mode,
    }
}

pub fn write_info(config: &ClassifierConfig, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "{}", model_info(config))?;
    writeln!(out)?;
    match config.label_table() {
        Ok(labels) => {
            for (index, label) in labels.iter() {
                writeln!(out, "{:>2}  {}", index, label)?;
            }
        }
        Err(e) => writeln!(out, "Labels unavailable: {}", e)?,
    }
    Ok(())
}

fn classify_file(
    classifier: &Classifier,
    path: &Path,
    options: OutputOptions,
) -> Result<ClassificationResponse, ClassifyError> {
    let upload = UploadedImage::from_path(path)?;
    let image_digest = upload.digest();
    log::debug!("Classifying {} ({})", upload.file_name, image_digest);

    let (result, scores) = classifier.classify_with_scores(&upload.bytes, options.mode)?;
    Ok(ClassificationResponse {
        file_name: upload.file_name,
        image_digest,
        mode: options.mode,
        result,
        scores: options.all_scores.then_some(scores),
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Classifies every file in order; a failing file does not stop the rest.
/// Returns the number of files that failed.
pub fn classify_files(
    classifier: &Classifier,
    files: &[PathBuf],
    options: OutputOptions,
    out: &mut impl Write,
) -> std::io::Result<usize> {
    let mut outcomes = Vec::with_capacity(files.len());
    let mut failures = 0;

    for path in files {
        match classify_file(classifier, path, options) {
            Ok(response) => {
                if let Some(top) = response.result.top() {
                    log::info!("{}: {}", response.file_name, top);
                }
                outcomes.push(Outcome::Classified(response));
            }
            Err(e) => {
                log::error!("{}: {}", path.display(), e);
                failures += 1;
                outcomes.push(Outcome::Failed(ClassificationFailure {
                    file_name: display_name(path),
                    error: e.to_string(),
                }));
            }
        }
    }

    if options.json {
        serde_json::to_writer_pretty(&mut *out, &outcomes)?;
        writeln!(out)?;
    } else {
        for outcome in &outcomes {
            write_text(outcome, out)?;
        }
    }
    Ok(failures)
}

fn write_text(outcome: &Outcome, out: &mut impl Write) -> std::io::Result<()> {
    match outcome {
        Outcome::Classified(response) => match response.result.predictions.as_slice() {
            [only] => writeln!(out, "{}: {}", response.file_name, only),
            predictions => {
                writeln!(out, "{}:", response.file_name)?;
                for (rank, prediction) in predictions.iter().enumerate() {
                    writeln!(out, "  {}. {}", rank + 1, prediction)?;
                }
                Ok(())
            }
        },
        Outcome::Failed(failure) => {
            writeln!(out, "{}: error: {}", failure.file_name, failure.error)
        }
    }
}
