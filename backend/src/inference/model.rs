use std::path::Path;
use std::sync::{Arc, Mutex};

use super::labels::LabelSet;
use super::preprocess::ImageTensor;
use super::tflite::TfliteEngine;
use super::{InferenceEngine, InferenceError, LoadError};

/// Loaded classifier plus its label set.
///
/// The engine's bound buffers are shared between requests, so every
/// bind-run-read cycle happens under the mutex. Labels are immutable and
/// handed out without locking.
pub struct ClassifierRuntime {
    engine: Mutex<Box<dyn InferenceEngine>>,
    labels: Arc<LabelSet>,
}

impl ClassifierRuntime {
    pub fn new(engine: Box<dyn InferenceEngine>, labels: LabelSet) -> Self {
        Self {
            engine: Mutex::new(engine),
            labels: Arc::new(labels),
        }
    }

    /// Loads the model artifact and label file. The engine is picked from the
    /// model file extension: `.pt` goes to TorchScript when built with the
    /// `torch` feature, anything else is read as TensorFlow Lite.
    pub fn initialize(model_path: &Path, labels_path: &Path) -> Result<Self, LoadError> {
        let engine = load_engine(model_path)?;
        let labels = LabelSet::load(labels_path)?;
        log::info!(
            "Loaded classifier from {} with {} labels",
            model_path.display(),
            labels.len()
        );
        Ok(Self::new(engine, labels))
    }

    pub fn labels(&self) -> Arc<LabelSet> {
        self.labels.clone()
    }

    pub fn infer(&self, tensor: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        let mut engine = self.engine.lock().map_err(|_| InferenceError::Poisoned)?;
        engine.run(tensor)
    }
}

#[cfg(feature = "torch")]
fn load_engine(model_path: &Path) -> Result<Box<dyn InferenceEngine>, LoadError> {
    if model_path.extension().is_some_and(|ext| ext == "pt") {
        return Ok(Box::new(super::torch::TorchEngine::load(model_path)?));
    }
    Ok(Box::new(TfliteEngine::load(model_path)?))
}

#[cfg(not(feature = "torch"))]
fn load_engine(model_path: &Path) -> Result<Box<dyn InferenceEngine>, LoadError> {
    Ok(Box::new(TfliteEngine::load(model_path)?))
}
