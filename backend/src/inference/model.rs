use std::path::PathBuf;
use std::sync::Arc;

use super::config::ModelConfig;
use super::preprocess::InputTensor;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Model produced {actual} scores, expected {expected}")]
    OutputLength { expected: usize, actual: usize },
    #[error("Model backend error: {0}")]
    Backend(String),
}

/// Raised once at startup when no model can be served.
#[derive(Debug, thiserror::Error)]
pub enum ModelUnavailable {
    #[error("Model artifact not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load model {path}: {reason}")]
    Load { path: PathBuf, reason: String },
    #[error("Built without a model backend; rebuild with --features torch")]
    BackendDisabled,
}

/// A loaded, read-only network mapping one input batch to per-class scores.
#[cfg_attr(test, mockall::automock)]
pub trait SignModel: Send + Sync {
    fn forward(&self, input: &InputTensor) -> Result<Vec<f32>, InferenceError>;
}

pub fn load_model(config: &ModelConfig) -> Result<Arc<dyn SignModel>, ModelUnavailable> {
    if !config.path.exists() {
        return Err(ModelUnavailable::NotFound(config.path.clone()));
    }
    load_backend(config)
}

#[cfg(feature = "torch")]
fn load_backend(config: &ModelConfig) -> Result<Arc<dyn SignModel>, ModelUnavailable> {
    let model = torch::TorchModel::load(config)?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "torch"))]
fn load_backend(_config: &ModelConfig) -> Result<Arc<dyn SignModel>, ModelUnavailable> {
    Err(ModelUnavailable::BackendDisabled)
}

#[cfg(feature = "torch")]
pub mod torch {
    use std::sync::Mutex;
    use tch::{CModule, Device, Kind, Tensor};

    use super::{InferenceError, ModelUnavailable, SignModel};
    use crate::inference::config::{DeviceKind, ModelConfig, TensorLayout};
    use crate::inference::preprocess::{INPUT_SHAPE, InputTensor};

    /// TorchScript export of the sign classifier.
    pub struct TorchModel {
        module: Mutex<CModule>,
        device: Device,
        layout: TensorLayout,
    }

    impl TorchModel {
        pub fn load(config: &ModelConfig) -> Result<Self, ModelUnavailable> {
            let device = match config.device {
                DeviceKind::Cpu => Device::Cpu,
                DeviceKind::CudaIfAvailable => Device::cuda_if_available(),
            };
            let module = CModule::load_on_device(&config.path, device).map_err(|e| {
                ModelUnavailable::Load {
                    path: config.path.clone(),
                    reason: e.to_string(),
                }
            })?;
            log::info!("Loaded TorchScript model {} on {:?}", config.path.display(), device);
            Ok(Self {
                module: Mutex::new(module),
                device,
                layout: config.layout,
            })
        }

        fn to_tensor(&self, input: &InputTensor) -> Tensor {
            let dims: Vec<i64> = INPUT_SHAPE.iter().map(|&d| d as i64).collect();
            let tensor = Tensor::from_slice(input.as_slice()).view(dims.as_slice());
            let tensor = match self.layout {
                TensorLayout::Nhwc => tensor,
                TensorLayout::Nchw => tensor.permute([0, 3, 1, 2]).contiguous(),
            };
            tensor.to_device(self.device)
        }
    }

    impl SignModel for TorchModel {
        fn forward(&self, input: &InputTensor) -> Result<Vec<f32>, InferenceError> {
            let tensor = self.to_tensor(input);
            let output = {
                let module = self
                    .module
                    .lock()
                    .map_err(|_| InferenceError::Backend("model lock poisoned".into()))?;
                tch::no_grad(|| module.forward_ts(&[tensor]))
                    .map_err(|e| InferenceError::Backend(e.to_string()))?
            };
            let output_flat = output
                .to_device(Device::Cpu)
                .to_kind(Kind::Float)
                .view([-1]);
            let num_elements = output_flat.size()[0] as usize;
            let mut output_vec = vec![0.0f32; num_elements];
            output_flat.copy_data(&mut output_vec, num_elements);
            Ok(output_vec)
        }
    }
}
