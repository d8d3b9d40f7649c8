pub mod decision;
pub mod labels;
pub mod model;
pub mod preprocess;
pub mod tflite;
#[cfg(feature = "torch")]
pub mod torch;

use preprocess::ImageTensor;

pub use decision::{CONFIDENCE_THRESHOLD, Diagnosis, InvariantViolation, decide};
pub use labels::LabelSet;
pub use model::ClassifierRuntime;
pub use preprocess::{DecodeError, normalize};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Model file not found: {0}")]
    ModelMissing(String),
    #[error("Model could not be prepared: {0}")]
    Model(String),
    #[error("Label file {path} could not be read: {source}")]
    Labels {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Label file contains no labels")]
    EmptyLabels,
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Inference engine error: {0}")]
    Engine(String),
    #[error("Model lock poisoned")]
    Poisoned,
}

/// A loaded model with exactly one input and one output slot.
pub trait InferenceEngine: Send {
    fn run(&mut self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError>;
}
