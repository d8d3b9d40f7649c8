use std::path::Path;

use tract_core::prelude::*;
use tract_tflite::Tflite;

use super::preprocess::ImageTensor;
use super::{InferenceEngine, InferenceError, LoadError};

type Plan = TypedRunnableModel<TypedModel>;

/// TensorFlow Lite classifier executed by tract.
pub struct TfliteEngine {
    plan: Plan,
}

impl TfliteEngine {
    pub fn load(model_path: &Path) -> Result<Self, LoadError> {
        if !model_path.exists() {
            return Err(LoadError::ModelMissing(model_path.display().to_string()));
        }

        let model = Tflite::default()
            .model_for_path(model_path)
            .map_err(|e| LoadError::Model(format!("{:#}", e)))?;
        Self::from_model(model)
    }

    /// Optimizes a decoded graph and checks it has one input and one output.
    pub fn from_model(model: TypedModel) -> Result<Self, LoadError> {
        let plan = model
            .into_optimized()
            .and_then(|model| model.into_runnable())
            .map_err(|e| LoadError::Model(format!("{:#}", e)))?;

        let inputs = plan.model().inputs.len();
        let outputs = plan.model().outputs.len();
        if inputs != 1 || outputs != 1 {
            return Err(LoadError::Model(format!(
                "expected a single input and output tensor, found {} inputs and {} outputs",
                inputs, outputs
            )));
        }

        Ok(Self { plan })
    }
}

impl InferenceEngine for TfliteEngine {
    fn run(&mut self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        let values = input.to_vec();
        let tensor = Tensor::from_shape::<f32>(input.shape(), &values)
            .map_err(|e| InferenceError::Engine(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into()))
            .map_err(|e| InferenceError::Engine(format!("{:#}", e)))?;
        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::Engine("model produced no output".into()))?;

        // Quantized heads come back as integers with a scale.
        let output = output
            .cast_to::<f32>()
            .map_err(|e| InferenceError::Engine(e.to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::Engine(e.to_string()))?;
        Ok(view.iter().copied().collect())
    }
}
