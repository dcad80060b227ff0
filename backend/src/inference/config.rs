use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use shared::RankingMode;
use std::path::{Path, PathBuf};

use super::labels::LabelTable;

pub const DEFAULT_CONFIG_PATH: &str = "config/classifier.yaml";
pub const DEFAULT_MODEL_PATH: &str = "model.pt";
pub const CONFIG_PATH_ENV: &str = "SIGNSCAN_CONFIG";
pub const MODEL_PATH_ENV: &str = "SIGNSCAN_MODEL_PATH";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Unknown resize method: {0}")]
    ResizeMethod(String),
    #[error("Label table needs {expected} entries, got {actual}")]
    LabelCount { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub version: f32,
    pub model: ModelConfig,
    pub image: ImageConfig,
    pub ranking: RankingConfig,
    /// Replaces the built-in GTSRB wording when present.
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub device: DeviceKind,
    pub layout: TensorLayout,
    pub output: OutputKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    #[default]
    Cpu,
    CudaIfAvailable,
}

/// Axis order the exported network expects for its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    #[default]
    Nhwc,
    Nchw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Probabilities,
    Logits,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ImageConfig {
    pub preprocessing: PreprocessingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    pub resize_method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RankingConfig {
    pub mode: RankingMode,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            version: 1.0,
            model: ModelConfig::default(),
            image: ImageConfig::default(),
            ranking: RankingConfig::default(),
            labels: None,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
            device: DeviceKind::default(),
            layout: TensorLayout::default(),
            output: OutputKind::default(),
        }
    }
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            resize_method: "bilinear".to_string(),
        }
    }
}

impl ClassifierConfig {
    pub fn from_yaml_str(config_str: &str) -> Result<Self, ConfigError> {
        let config: ClassifierConfig = serde_yaml::from_str(config_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&config_str)
    }

    /// An explicitly named file must exist; the default location may be absent.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_or_fallback(path, Path::new(DEFAULT_CONFIG_PATH))
    }

    pub fn load_or_fallback(path: Option<&Path>, default_path: &Path) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if default_path.exists() => Self::load(default_path),
            None => {
                log::info!("No config at {}, using defaults", default_path.display());
                Ok(Self::default())
            }
        }
    }

    /// Replaces the model path unless the override is absent or empty.
    pub fn override_model_path(&mut self, model_path: Option<String>) {
        if let Some(model_path) = model_path.filter(|p| !p.is_empty()) {
            self.model.path = PathBuf::from(model_path);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resize_filter()?;
        self.label_table()?;
        Ok(())
    }

    pub fn resize_filter(&self) -> Result<FilterType, ConfigError> {
        let method = self.image.preprocessing.resize_method.to_ascii_lowercase();
        match method.as_str() {
            "nearest" => Ok(FilterType::Nearest),
            "bilinear" | "triangle" => Ok(FilterType::Triangle),
            "bicubic" | "catmullrom" => Ok(FilterType::CatmullRom),
            "gaussian" => Ok(FilterType::Gaussian),
            "lanczos" | "lanczos3" => Ok(FilterType::Lanczos3),
            _ => Err(ConfigError::ResizeMethod(
                self.image.preprocessing.resize_method.clone(),
            )),
        }
    }

    pub fn label_table(&self) -> Result<LabelTable, ConfigError> {
        match &self.labels {
            Some(labels) => LabelTable::from_labels(labels.clone()),
            None => Ok(LabelTable::gtsrb()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClassifierConfig::default();
        assert_eq!(config.model.path, PathBuf::from("model.pt"));
        assert_eq!(config.model.layout, TensorLayout::Nhwc);
        assert_eq!(config.model.output, OutputKind::Probabilities);
        assert_eq!(config.ranking.mode, RankingMode::Top5);
        assert_eq!(config.resize_filter().unwrap(), FilterType::Triangle);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
model:
  path: models/gtsrb.pt
  layout: nchw
  output: logits
ranking:
  mode: top1
"#;
        let config = ClassifierConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.model.path, PathBuf::from("models/gtsrb.pt"));
        assert_eq!(config.model.layout, TensorLayout::Nchw);
        assert_eq!(config.model.output, OutputKind::Logits);
        assert_eq!(config.model.device, DeviceKind::Cpu);
        assert_eq!(config.ranking.mode, RankingMode::Top1);
        assert_eq!(config.image.preprocessing.resize_method, "bilinear");
    }

    #[test]
    fn test_unknown_resize_method_rejected() {
        let yaml = "image:\n  preprocessing:\n    resize_method: sinc\n";
        assert!(matches!(
            ClassifierConfig::from_yaml_str(yaml),
            Err(ConfigError::ResizeMethod(m)) if m == "sinc"
        ));
    }

    #[test]
    fn test_label_override_length_checked() {
        let yaml = "labels:\n  - Stop\n  - Yield\n";
        assert!(matches!(
            ClassifierConfig::from_yaml_str(yaml),
            Err(ConfigError::LabelCount { actual: 2, .. })
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            ClassifierConfig::from_yaml_str("ranking: [unclosed"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_model_path_override_ignores_empty() {
        let mut config = ClassifierConfig::default();
        config.override_model_path(Some(String::new()));
        assert_eq!(config.model.path, PathBuf::from("model.pt"));
        config.override_model_path(None);
        assert_eq!(config.model.path, PathBuf::from("model.pt"));
        config.override_model_path(Some("models/gtsrb.pt".into()));
        assert_eq!(config.model.path, PathBuf::from("models/gtsrb.pt"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = ClassifierConfig::load_or_default(Some(Path::new("does/not/exist.yaml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
