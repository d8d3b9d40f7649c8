use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test};
use httpmock::Method::POST;
use httpmock::MockServer;
use krishi_backend::advisory::{FALLBACK_ANSWER, GeminiClient, GeminiConfig};
use krishi_backend::app::AppState;
use krishi_backend::auth::jwt::JwtService;
use krishi_backend::auth::middleware::AuthMiddleware;
use krishi_backend::db::farmer_repository::FarmerRepository;
use krishi_backend::db::feedback_log::FeedbackLog;
use krishi_backend::inference::preprocess::ImageTensor;
use krishi_backend::inference::{ClassifierRuntime, InferenceEngine, InferenceError, LabelSet};
use krishi_backend::service::KrishiService;
use krishi_backend::storage::upload_store::UploadStore;
use krishi_shared::{
    AdvisoryResponse, AuthResponse, DiagnosisResponse, DiagnosisStatus, FarmerProfile,
    HealthResponse,
};
use serde_json::json;

const JWT_SECRET: &str = "test-secret";
const GEMINI_MODEL: &str = "gemini-test";

struct FixedScores(Vec<f32>);

impl InferenceEngine for FixedScores {
    fn run(&mut self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        assert_eq!(input.shape(), &[1, 224, 224, 3]);
        Ok(self.0.clone())
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("krishi-{}-{}", name, uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn state(scores: Option<Vec<f32>>, gemini_base_url: String) -> (AppState, PathBuf) {
    let classifier = scores.map(|scores| {
        let labels: LabelSet = ["Healthy", "Leaf_Blight", "Rust"].into_iter().collect();
        ClassifierRuntime::new(Box::new(FixedScores(scores)), labels)
    });
    let advisor = GeminiClient::new(GeminiConfig {
        api_key: "test-key".into(),
        model: GEMINI_MODEL.into(),
        base_url: gemini_base_url,
        timeout: Duration::from_secs(2),
    })
    .unwrap();

    let dir = scratch_dir("api");
    let state = AppState {
        service: KrishiService::new(classifier, Arc::new(advisor)),
        farmers: FarmerRepository::new(),
        jwt_service: JwtService::new(JWT_SECRET),
        uploads: UploadStore::new(dir.join("uploads")).unwrap(),
        feedback_log: FeedbackLog::new(dir.join("feedback.jsonl")),
    };
    (state, dir)
}

macro_rules! init_app {
    ($state:expr) => {{
        let state = $state.clone();
        test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(JwtService::new(JWT_SECRET)))
                .configure(move |cfg| state.configure(cfg)),
        )
        .await
    }};
}

macro_rules! login {
    ($app:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "name": "Anil",
                "phone": "9847000000",
                "location": "Kerala",
                "crop": "Rice"
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "phone": "9847000000" }))
            .to_request();
        let auth: AuthResponse = test::call_and_read_body_json(&$app, req).await;
        auth.token
    }};
}

fn leaf_png() -> Vec<u8> {
    let img = image::RgbImage::from_fn(120, 90, |x, y| image::Rgb([(x * 2) as u8, 150, (y * 2) as u8]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn multipart(field: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "krishi-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"leaf.png\"\r\nContent-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

fn diagnose_request(token: &str, field: &str, bytes: &[u8]) -> test::TestRequest {
    let (content_type, body) = multipart(field, bytes);
    test::TestRequest::post()
        .uri("/api/diagnose")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
}

#[actix_web::test]
async fn health_reports_readiness_without_auth() {
    let (state, _dir) = state(Some(vec![0.1, 0.8, 0.1]), "http://127.0.0.1:9".into());
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let health: HealthResponse = test::call_and_read_body_json(&app, req).await;
    assert!(health.ready);
    assert_eq!(health.labels, 3);
}

#[actix_web::test]
async fn protected_routes_need_a_token() {
    let (state, _dir) = state(Some(vec![0.1, 0.8, 0.1]), "http://127.0.0.1:9".into());
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/ask")
        .set_json(json!({ "question": "Hello?" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, "Bearer not.a.token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn registration_and_login() {
    let (state, _dir) = state(None, "http://127.0.0.1:9".into());
    let app = init_app!(state);
    let token = login!(app);

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    let profile: FarmerProfile = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile.location, "Kerala");
    assert_eq!(profile.crop, "Rice");

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": "Someone Else",
            "phone": "9847000000",
            "location": "Idukki",
            "crop": "Cardamom"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "phone": "0000000000" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn confident_leaf_is_diagnosed_and_kept() {
    let (state, dir) = state(Some(vec![0.05, 0.92, 0.03]), "http://127.0.0.1:9".into());
    let app = init_app!(state);
    let token = login!(app);

    let png = leaf_png();
    let body: DiagnosisResponse =
        test::call_and_read_body_json(&app, diagnose_request(&token, "image", &png).to_request()).await;
    assert_eq!(body.status, DiagnosisStatus::Diagnosed);
    assert_eq!(body.message, "Diagnosis: Leaf Blight (92.00%)");
    assert_eq!(body.label.as_deref(), Some("Leaf Blight"));

    let filename = body.image_filename.unwrap();
    assert_eq!(filename, format!("{}.png", UploadStore::calculate_image_hash(&png)));
    assert!(dir.join("uploads").join(&filename).exists());
    std::fs::remove_dir_all(dir).ok();
}

#[actix_web::test]
async fn uncertain_leaf_is_unknown() {
    let (state, _dir) = state(Some(vec![0.3, 0.3, 0.4]), "http://127.0.0.1:9".into());
    let app = init_app!(state);
    let token = login!(app);

    let body: DiagnosisResponse =
        test::call_and_read_body_json(&app, diagnose_request(&token, "image", &leaf_png()).to_request()).await;
    assert_eq!(body.status, DiagnosisStatus::Unknown);
    assert_eq!(body.message, "Unknown or Not a Plant Leaf");
    assert_eq!(body.label, None);
}

#[actix_web::test]
async fn unreadable_upload_is_a_soft_error() {
    let (state, _dir) = state(Some(vec![0.1, 0.8, 0.1]), "http://127.0.0.1:9".into());
    let app = init_app!(state);
    let token = login!(app);

    let resp = test::call_service(&app, diagnose_request(&token, "image", b"not an image").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: DiagnosisResponse = test::read_body_json(resp).await;
    assert_eq!(body.status, DiagnosisStatus::UnreadableImage);
    assert_eq!(body.image_filename, None);
}

#[actix_web::test]
async fn empty_upload_asks_for_an_image() {
    let (state, _dir) = state(Some(vec![0.1, 0.8, 0.1]), "http://127.0.0.1:9".into());
    let app = init_app!(state);
    let token = login!(app);

    let resp = test::call_service(&app, diagnose_request(&token, "image", b"").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: DiagnosisResponse = test::read_body_json(resp).await;
    assert_eq!(body.status, DiagnosisStatus::NoImage);
    assert_eq!(body.message, "No image selected.");
}

#[actix_web::test]
async fn image_under_another_field_name_is_not_accepted() {
    let (state, _dir) = state(Some(vec![0.1, 0.8, 0.1]), "http://127.0.0.1:9".into());
    let app = init_app!(state);
    let token = login!(app);

    let resp = test::call_service(&app, diagnose_request(&token, "photo", &leaf_png()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: DiagnosisResponse = test::read_body_json(resp).await;
    assert_eq!(body.status, DiagnosisStatus::NoImage);
    assert_eq!(body.message, "No image selected.");
}

#[actix_web::test]
async fn degraded_service_stays_reachable() {
    let (state, _dir) = state(None, "http://127.0.0.1:9".into());
    let app = init_app!(state);
    let token = login!(app);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let health: HealthResponse = test::call_and_read_body_json(&app, req).await;
    assert!(!health.ready);

    let resp = test::call_service(&app, diagnose_request(&token, "image", &leaf_png()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: DiagnosisResponse = test::read_body_json(resp).await;
    assert_eq!(body.status, DiagnosisStatus::NotReady);
    assert_eq!(body.message, "Error: Server is not ready.");
}

#[actix_web::test]
async fn advice_uses_the_session_context() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("/v1beta/models/{}:generateContent", GEMINI_MODEL))
                .header("x-goog-api-key", "test-key")
                .body_contains("Kerala")
                .body_contains("Rice")
                .body_contains("What fertilizer should I use?");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "Apply 40 kg of urea per acre." }] }
                }]
            }));
        })
        .await;

    let (state, _dir) = state(Some(vec![0.1, 0.8, 0.1]), server.base_url());
    let app = init_app!(state);
    let token = login!(app);

    let req = test::TestRequest::post()
        .uri("/api/ask")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .set_json(json!({ "question": "What fertilizer should I use?" }))
        .to_request();
    let body: AdvisoryResponse = test::call_and_read_body_json(&app, req).await;
    mock.assert_async().await;
    assert_eq!(body.answer, "Apply 40 kg of urea per acre.");
    assert!(!body.fallback);
}

#[actix_web::test]
async fn provider_failure_returns_the_fallback() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(429).body("RESOURCE_EXHAUSTED");
        })
        .await;

    let (state, _dir) = state(Some(vec![0.1, 0.8, 0.1]), server.base_url());
    let app = init_app!(state);
    let token = login!(app);

    let req = test::TestRequest::post()
        .uri("/api/ask")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .set_json(json!({ "question": "Why are my leaves yellow?" }))
        .to_request();
    let body: AdvisoryResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.answer, FALLBACK_ANSWER);
    assert!(body.fallback);
}

#[actix_web::test]
async fn unreachable_provider_returns_the_fallback() {
    let (state, _dir) = state(Some(vec![0.1, 0.8, 0.1]), "http://127.0.0.1:9".into());
    let app = init_app!(state);
    let token = login!(app);

    let req = test::TestRequest::post()
        .uri("/api/ask")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .set_json(json!({ "question": "Is it too late to sow?" }))
        .to_request();
    let body: AdvisoryResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.answer, FALLBACK_ANSWER);
}

#[actix_web::test]
async fn blank_question_is_refused() {
    let (state, _dir) = state(Some(vec![0.1, 0.8, 0.1]), "http://127.0.0.1:9".into());
    let app = init_app!(state);
    let token = login!(app);

    let req = test::TestRequest::post()
        .uri("/api/ask")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .set_json(json!({ "question": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn feedback_is_appended_to_the_log() {
    let (state, dir) = state(Some(vec![0.1, 0.8, 0.1]), "http://127.0.0.1:9".into());
    let app = init_app!(state);
    let token = login!(app);

    let req = test::TestRequest::post()
        .uri("/api/feedback")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .set_json(json!({
            "image_filename": "abc.png",
            "predicted_label": "Leaf Blight",
            "is_correct": false,
            "actual_label": "Rust"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let log = std::fs::read_to_string(dir.join("feedback.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.contains("\"actual_label\":\"Rust\""));
    std::fs::remove_dir_all(dir).ok();
}
