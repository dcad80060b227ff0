use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

/// How many ranked predictions a classification returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RankingMode {
    Top1,
    #[default]
    Top5,
}

impl RankingMode {
    pub fn k(&self) -> usize {
        match self {
            RankingMode::Top1 => 1,
            RankingMode::Top5 => 5,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Prediction {
    pub class_index: usize,
    pub label: String,
    pub score: f32,
}

impl Prediction {
    pub fn confidence_percent(&self) -> f32 {
        self.score * 100.0
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}% confidence)", self.label, self.confidence_percent())
    }
}

/// Predictions ordered from highest to lowest score.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct RankedResult {
    pub predictions: Vec<Prediction>,
}

impl RankedResult {
    pub fn top(&self) -> Option<&Prediction> {
        self.predictions.first()
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClassificationResponse {
    pub file_name: String,
    pub image_digest: String,
    pub mode: RankingMode,
    pub result: RankedResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<f32>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClassificationFailure {
    pub file_name: String,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelInfo {
    pub architecture: String,
    pub dataset: String,
    pub num_classes: usize,
    pub input: String,
    pub model_path: String,
    pub mode: RankingMode,
}

impl fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model:    {}", self.architecture)?;
        writeln!(f, "Classes:  {}", self.num_classes)?;
        writeln!(f, "Dataset:  {}", self.dataset)?;
        writeln!(f, "Input:    {}", self.input)?;
        writeln!(f, "Artifact: {}", self.model_path)?;
        write!(f, "Ranking:  {}", self.mode)
    }
}
