pub mod classifier;
pub mod config;
pub mod labels;
pub mod model;
pub mod preprocess;
pub mod ranking;

pub use classifier::{Classifier, ClassifyError};
pub use config::{ClassifierConfig, ConfigError};
pub use labels::{LabelTable, NUM_CLASSES};
pub use model::{InferenceError, ModelUnavailable, SignModel, load_model};
pub use preprocess::InputTensor;
