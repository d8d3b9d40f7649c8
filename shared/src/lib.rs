use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiagnosisStatus {
    Diagnosed,
    Unknown,
    NotReady,
    NoImage,
    UnreadableImage,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DiagnosisResponse {
    pub status: DiagnosisStatus,
    pub message: String,
    pub label: Option<String>,
    pub confidence: Option<f32>,
    pub image_filename: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AdvisoryRequest {
    pub question: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AdvisoryResponse {
    pub answer: String,
    pub fallback: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RegisterRequest {
    pub name: String,
    pub phone: String,
    pub location: String,
    pub crop: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LoginRequest {
    pub phone: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FarmerProfile {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub location: String,
    pub crop: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AuthResponse {
    pub token: String,
    pub farmer: FarmerProfile,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FeedbackRequest {
    pub image_filename: String,
    pub predicted_label: String,
    pub is_correct: bool,
    pub actual_label: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub ready: bool,
    pub labels: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_matches_the_wire_name() {
        for status in [
            DiagnosisStatus::Diagnosed,
            DiagnosisStatus::Unknown,
            DiagnosisStatus::NotReady,
            DiagnosisStatus::NoImage,
            DiagnosisStatus::UnreadableImage,
        ] {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, serde_json::Value::String(status.to_string()));
        }
        assert_eq!(DiagnosisStatus::UnreadableImage.to_string(), "unreadable_image");
    }
}
