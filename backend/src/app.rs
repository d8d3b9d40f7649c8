use actix_web::web;

use crate::auth::jwt::JwtService;
use crate::db::farmer_repository::FarmerRepository;
use crate::db::feedback_log::FeedbackLog;
use crate::routes::configure_routes;
use crate::service::KrishiService;
use crate::storage::upload_store::UploadStore;

/// Everything the handlers need, cloned into each actix worker.
#[derive(Clone)]
pub struct AppState {
    pub service: KrishiService,
    pub farmers: FarmerRepository,
    pub jwt_service: JwtService,
    pub uploads: UploadStore,
    pub feedback_log: FeedbackLog,
}

impl AppState {
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.service.clone()))
            .app_data(web::Data::new(self.farmers.clone()))
            .app_data(web::Data::new(self.jwt_service.clone()))
            .app_data(web::Data::new(self.uploads.clone()))
            .app_data(web::Data::new(self.feedback_log.clone()))
            .configure(configure_routes);
    }
}
