pub mod cli;
pub mod inference;
pub mod upload;

pub use inference::{Classifier, ClassifierConfig, ClassifyError, ModelUnavailable};
