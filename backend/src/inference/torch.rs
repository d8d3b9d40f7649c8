use std::path::Path;

use tch::{CModule, Device, Kind, Tensor, nn::ModuleT};

use super::preprocess::ImageTensor;
use super::{InferenceEngine, InferenceError, LoadError};

/// TorchScript classifier. The exported module must accept the same NHWC
/// `[1, 224, 224, 3]` float input as the TFLite artifact.
pub struct TorchEngine {
    module: CModule,
    device: Device,
}

impl TorchEngine {
    pub fn load(model_path: &Path) -> Result<Self, LoadError> {
        if !model_path.exists() {
            return Err(LoadError::ModelMissing(model_path.display().to_string()));
        }
        let device = Device::cuda_if_available();
        let module = CModule::load_on_device(model_path, device)
            .map_err(|e| LoadError::Model(e.to_string()))?;
        Ok(Self { module, device })
    }
}

impl InferenceEngine for TorchEngine {
    fn run(&mut self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        let shape: Vec<i64> = input.shape().iter().map(|&d| d as i64).collect();
        let tensor = Tensor::from_slice(&input.to_vec())
            .view(shape.as_slice())
            .to_device(self.device);

        let output = tch::no_grad(|| self.module.forward_t(&tensor, false));
        let output_flat = output.to_kind(Kind::Float).to_device(Device::Cpu).view([-1]);
        Vec::<f32>::try_from(&output_flat).map_err(|e| InferenceError::Engine(e.to_string()))
    }
}
