use std::path::Path;
use std::sync::Arc;

use crate::advisory::{self, AdvisoryAnswer, FarmerContext, MissingInputError, TextGenerator};
use crate::inference::{
    CONFIDENCE_THRESHOLD, ClassifierRuntime, Diagnosis, InferenceError, InvariantViolation, decide,
    normalize,
};

pub const NOT_READY_MESSAGE: &str = "Error: Server is not ready.";
pub const UNREADABLE_IMAGE_MESSAGE: &str =
    "Could not process the image. Please upload a valid photo of a leaf.";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("Invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosisOutcome {
    Decided(Diagnosis),
    NotReady,
    UnreadableImage,
}

impl DiagnosisOutcome {
    pub fn message(&self) -> String {
        match self {
            DiagnosisOutcome::Decided(diagnosis) => diagnosis.to_string(),
            DiagnosisOutcome::NotReady => NOT_READY_MESSAGE.to_string(),
            DiagnosisOutcome::UnreadableImage => UNREADABLE_IMAGE_MESSAGE.to_string(),
        }
    }
}

/// Diagnosis and advisory pipeline, built once at startup and shared by all
/// request handlers.
#[derive(Clone)]
pub struct KrishiService {
    classifier: Option<Arc<ClassifierRuntime>>,
    advisor: Arc<dyn TextGenerator>,
}

impl KrishiService {
    pub fn new(classifier: Option<ClassifierRuntime>, advisor: Arc<dyn TextGenerator>) -> Self {
        Self {
            classifier: classifier.map(Arc::new),
            advisor,
        }
    }

    /// A classifier that fails to load leaves the service up but not ready.
    pub fn load(model_path: &Path, labels_path: &Path, advisor: Arc<dyn TextGenerator>) -> Self {
        let classifier = match ClassifierRuntime::initialize(model_path, labels_path) {
            Ok(runtime) => Some(runtime),
            Err(e) => {
                log::error!("Error loading model or labels, diagnosis disabled: {}", e);
                None
            }
        };
        Self::new(classifier, advisor)
    }

    pub fn is_ready(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn label_count(&self) -> usize {
        self.classifier
            .as_ref()
            .map(|runtime| runtime.labels().len())
            .unwrap_or(0)
    }

    /// Blocking: decodes and runs the classifier on the calling thread.
    pub fn diagnose(&self, image_bytes: &[u8]) -> Result<DiagnosisOutcome, PipelineError> {
        let Some(runtime) = &self.classifier else {
            return Ok(DiagnosisOutcome::NotReady);
        };

        let tensor = match normalize(image_bytes) {
            Ok(tensor) => tensor,
            Err(e) => {
                log::warn!("Rejected upload: {}", e);
                return Ok(DiagnosisOutcome::UnreadableImage);
            }
        };

        let probabilities = runtime.infer(&tensor)?;
        let diagnosis = decide(&probabilities, &runtime.labels(), CONFIDENCE_THRESHOLD)?;
        log::debug!("Diagnosis: {:?}", diagnosis);
        Ok(DiagnosisOutcome::Decided(diagnosis))
    }

    pub async fn advise(
        &self,
        question: &str,
        context: &FarmerContext,
    ) -> Result<AdvisoryAnswer, MissingInputError> {
        let prompt = advisory::build(question, context)?;
        Ok(advisory::ask(self.advisor.as_ref(), &prompt).await)
    }
}
