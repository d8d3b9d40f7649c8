use actix_cors::Cors;
use actix_web::{App, HttpServer};
use krishi_backend::advisory::GeminiClient;
use krishi_backend::app::AppState;
use krishi_backend::auth::jwt::JwtService;
use krishi_backend::auth::middleware::AuthMiddleware;
use krishi_backend::config::AppConfig;
use krishi_backend::db::farmer_repository::FarmerRepository;
use krishi_backend::db::feedback_log::FeedbackLog;
use krishi_backend::service::KrishiService;
use krishi_backend::storage::upload_store::UploadStore;
use std::env;
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = AppConfig::load().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let advisor = GeminiClient::new(config.gemini.clone())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    let service = KrishiService::load(&config.model_path, &config.labels_path, Arc::new(advisor));
    if service.is_ready() {
        log::info!("Successfully loaded {} labels.", service.label_count());
    } else {
        log::warn!("Starting without a classifier; diagnosis requests will report not ready");
    }

    let uploads = UploadStore::new(config.upload_dir.clone())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    log::info!("Keeping uploads in {}", uploads.dir().display());

    let jwt_service = JwtService::new(&config.jwt_secret);
    let state = AppState {
        service,
        farmers: FarmerRepository::new(),
        jwt_service: jwt_service.clone(),
        uploads,
        feedback_log: FeedbackLog::new(config.feedback_log.clone()),
    };
    let auth_middleware = AuthMiddleware::new(jwt_service);

    let bind_address = format!("0.0.0.0:{}", config.port);
    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(auth_middleware.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::AUTHORIZATION,
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .configure(|cfg| state.configure(cfg))
    })
    .bind(&bind_address)?
    .run()
    .await
}
