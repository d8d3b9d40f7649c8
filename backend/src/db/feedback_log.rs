use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use krishi_shared::FeedbackRequest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("Feedback log write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid feedback: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub id: Uuid,
    pub farmer_id: Uuid,
    pub image_filename: String,
    pub predicted_label: String,
    pub is_correct: bool,
    pub actual_label: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackEntry {
    pub fn from_request(farmer_id: Uuid, request: FeedbackRequest) -> Result<Self, FeedbackError> {
        if request.image_filename.trim().is_empty() || request.predicted_label.trim().is_empty() {
            return Err(FeedbackError::Invalid(
                "image_filename and predicted_label are required".into(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            farmer_id,
            image_filename: request.image_filename,
            predicted_label: request.predicted_label,
            is_correct: request.is_correct,
            actual_label: request.actual_label.filter(|label| !label.trim().is_empty()),
            created_at: Utc::now(),
        })
    }
}

/// Append-only JSON-lines record of farmer corrections. Nothing reads it back.
#[derive(Clone)]
pub struct FeedbackLog {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FeedbackLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Blocking write; handlers call it from `web::block`.
    pub fn append(&self, entry: &FeedbackEntry) -> Result<(), FeedbackError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}
