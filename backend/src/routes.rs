use actix_multipart::Multipart;
use actix_web::{Error, HttpResponse, web};
use futures::{StreamExt, TryStreamExt};
use krishi_shared::{
    AdvisoryRequest, AdvisoryResponse, DiagnosisResponse, DiagnosisStatus, FeedbackRequest,
    HealthResponse,
};
use log::{error, info};
use serde::Serialize;

use crate::auth::middleware::AuthenticatedFarmer;
use crate::db::feedback_log::{FeedbackEntry, FeedbackLog};
use crate::inference::Diagnosis;
use crate::service::{DiagnosisOutcome, KrishiService};
use crate::storage::upload_store::UploadStore;

const IMAGE_FIELD: &str = "image";
const NO_IMAGE_MESSAGE: &str = "No image selected.";
const NO_QUESTION_MESSAGE: &str = "Please ask a question.";

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health)))
        .service(web::resource("/api/diagnose").route(web::post().to(handle_diagnosis)))
        .service(web::resource("/api/ask").route(web::post().to(handle_ask)))
        .service(web::resource("/api/feedback").route(web::post().to(handle_feedback)))
        .configure(crate::auth::routes::configure_auth_routes);
}

async fn health(service: web::Data<KrishiService>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        ready: service.is_ready(),
        labels: service.label_count(),
    })
}

/// Collects the `image` field. Other fields are read and discarded.
async fn read_image(mut payload: Multipart) -> Result<Option<Vec<u8>>, Error> {
    let mut image = None;
    while let Some(mut field) = payload.try_next().await? {
        let is_image_field = field.name() == Some(IMAGE_FIELD);
        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            data.extend_from_slice(&chunk?);
        }
        if is_image_field && !data.is_empty() && image.is_none() {
            image = Some(data);
        }
    }
    Ok(image)
}

fn diagnosis_response(outcome: &DiagnosisOutcome, image_filename: Option<String>) -> DiagnosisResponse {
    let (status, label, confidence) = match outcome {
        DiagnosisOutcome::Decided(Diagnosis::Diagnosed { label, confidence }) => {
            (DiagnosisStatus::Diagnosed, Some(label.clone()), Some(*confidence))
        }
        DiagnosisOutcome::Decided(Diagnosis::Unknown) => (DiagnosisStatus::Unknown, None, None),
        DiagnosisOutcome::NotReady => (DiagnosisStatus::NotReady, None, None),
        DiagnosisOutcome::UnreadableImage => (DiagnosisStatus::UnreadableImage, None, None),
    };
    DiagnosisResponse {
        status,
        message: outcome.message(),
        label,
        confidence,
        image_filename,
    }
}

async fn handle_diagnosis(
    service: web::Data<KrishiService>,
    uploads: web::Data<UploadStore>,
    farmer: AuthenticatedFarmer,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let Some(image_data) = read_image(payload).await? else {
        return Ok(HttpResponse::BadRequest().json(DiagnosisResponse {
            status: DiagnosisStatus::NoImage,
            message: NO_IMAGE_MESSAGE.to_string(),
            label: None,
            confidence: None,
            image_filename: None,
        }));
    };
    if UploadStore::validate_image_size(&image_data).is_err() {
        return Ok(HttpResponse::PayloadTooLarge().json(ErrorResponse::new("File too large")));
    }

    let service = service.into_inner();
    let uploads = uploads.into_inner();
    let result = web::block(move || {
        let outcome = service.diagnose(&image_data)?;
        let image_filename = match &outcome {
            DiagnosisOutcome::Decided(_) => uploads
                .save(&image_data)
                .map_err(|e| error!("Failed to keep uploaded image: {}", e))
                .ok(),
            _ => None,
        };
        Ok::<_, crate::service::PipelineError>((outcome, image_filename))
    })
    .await?;

    match result {
        Ok((outcome, image_filename)) => {
            let body = diagnosis_response(&outcome, image_filename);
            info!(
                "Diagnosis for farmer {} [{}]: {}",
                farmer.0.profile.id, body.status, body.message
            );
            Ok(match outcome {
                DiagnosisOutcome::Decided(_) => HttpResponse::Ok().json(body),
                DiagnosisOutcome::NotReady => HttpResponse::ServiceUnavailable().json(body),
                DiagnosisOutcome::UnreadableImage => HttpResponse::UnprocessableEntity().json(body),
            })
        }
        Err(e) => {
            error!("Diagnosis pipeline failure: {}", e);
            Ok(HttpResponse::InternalServerError().json(ErrorResponse::new("Diagnosis failed")))
        }
    }
}

async fn handle_ask(
    service: web::Data<KrishiService>,
    farmer: AuthenticatedFarmer,
    request: web::Json<AdvisoryRequest>,
) -> HttpResponse {
    let question = request.into_inner().question.unwrap_or_default();
    match service.advise(&question, &farmer.0.context()).await {
        Ok(answer) => HttpResponse::Ok().json(AdvisoryResponse {
            answer: answer.text().to_string(),
            fallback: answer.is_fallback(),
        }),
        Err(_) => HttpResponse::BadRequest().json(ErrorResponse::new(NO_QUESTION_MESSAGE)),
    }
}

async fn handle_feedback(
    feedback_log: web::Data<FeedbackLog>,
    farmer: AuthenticatedFarmer,
    request: web::Json<FeedbackRequest>,
) -> HttpResponse {
    let entry = match FeedbackEntry::from_request(farmer.0.profile.id, request.into_inner()) {
        Ok(entry) => entry,
        Err(e) => return HttpResponse::BadRequest().json(ErrorResponse::new(e.to_string())),
    };
    let id = entry.id;
    let feedback_log = feedback_log.into_inner();
    match web::block(move || feedback_log.append(&entry)).await {
        Ok(Ok(())) => HttpResponse::Created().json(serde_json::json!({ "id": id })),
        Ok(Err(e)) => {
            error!("Failed to record feedback: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to record feedback"))
        }
        Err(e) => {
            error!("Feedback writer did not finish: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new("Failed to record feedback"))
        }
    }
}
