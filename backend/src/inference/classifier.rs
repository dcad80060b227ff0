use image::imageops::FilterType;
use shared::{RankedResult, RankingMode};
use std::sync::Arc;

use super::config::{ClassifierConfig, ConfigError, OutputKind};
use super::labels::LabelTable;
use super::model::{InferenceError, SignModel};
use super::preprocess::preprocess;
use super::ranking;

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Could not decode image: {0}")]
    Decode(String),
    #[error("Unsupported file type: {0} (expected .jpg, .jpeg or .png)")]
    UnsupportedExtension(String),
    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Handle over the loaded model and label table. Cloning shares both.
#[derive(Clone)]
pub struct Classifier {
    model: Arc<dyn SignModel>,
    labels: Arc<LabelTable>,
    filter: FilterType,
    output: OutputKind,
    mode: RankingMode,
}

impl Classifier {
    pub fn new(model: Arc<dyn SignModel>, labels: Arc<LabelTable>) -> Self {
        Self {
            model,
            labels,
            filter: FilterType::Triangle,
            output: OutputKind::Probabilities,
            mode: RankingMode::default(),
        }
    }

    pub fn from_config(
        config: &ClassifierConfig,
        model: Arc<dyn SignModel>,
    ) -> Result<Self, ConfigError> {
        let labels = config.label_table()?.shared();
        Ok(Self::new(model, labels)
            .with_filter(config.resize_filter()?)
            .with_output(config.model.output)
            .with_mode(config.ranking.mode))
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_output(mut self, output: OutputKind) -> Self {
        self.output = output;
        self
    }

    pub fn with_mode(mut self, mode: RankingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> RankingMode {
        self.mode
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn classify(&self, image: &[u8]) -> Result<RankedResult, ClassifyError> {
        self.classify_with_mode(image, self.mode)
    }

    pub fn classify_with_mode(
        &self,
        image: &[u8],
        mode: RankingMode,
    ) -> Result<RankedResult, ClassifyError> {
        let (result, _) = self.classify_with_scores(image, mode)?;
        Ok(result)
    }

    /// Ranked result together with the full score vector it was ranked from.
    pub fn classify_with_scores(
        &self,
        image: &[u8],
        mode: RankingMode,
    ) -> Result<(RankedResult, Vec<f32>), ClassifyError> {
        let scores = self.scores(image)?;
        let result = ranking::rank(&scores, &self.labels, mode)?;
        if let Some(top) = result.top() {
            log::debug!("Top prediction: {} ({:.4})", top.label, top.score);
        }
        Ok((result, scores))
    }

    /// Full per-class score vector for one image.
    pub fn scores(&self, image: &[u8]) -> Result<Vec<f32>, ClassifyError> {
        let tensor = preprocess(image, self.filter)?;
        let raw = self.model.forward(&tensor)?;
        let scores = match self.output {
            OutputKind::Probabilities => raw,
            OutputKind::Logits => ranking::softmax(&raw)?,
        };

        if !ranking::is_distribution(&scores) {
            log::warn!(
                "Model scores sum to {:.4}, not a probability distribution",
                ranking::probability_mass(&scores)
            );
        }
        Ok(scores)
    }
}
