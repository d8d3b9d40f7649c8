use actix_web::{HttpResponse, web};
use krishi_shared::{AuthResponse, LoginRequest, RegisterRequest};
use log::error;

use crate::db::farmer_repository::{FarmerRepository, RepositoryError};

use super::jwt::JwtService;
use super::middleware::AuthenticatedFarmer;

const UNKNOWN_PHONE_MESSAGE: &str = "Phone number not found. Please register.";

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn configure_auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/auth/register").route(web::post().to(register)))
        .service(web::resource("/api/auth/login").route(web::post().to(login)))
        .service(web::resource("/api/auth/me").route(web::get().to(me)));
}

pub async fn register(
    repo: web::Data<FarmerRepository>,
    request: web::Json<RegisterRequest>,
) -> HttpResponse {
    match repo.register(request.into_inner()).await {
        Ok(profile) => HttpResponse::Created().json(profile),
        Err(e @ RepositoryError::AlreadyRegistered) => {
            HttpResponse::Conflict().json(ErrorResponse { error: e.to_string() })
        }
        Err(e) => HttpResponse::BadRequest().json(ErrorResponse { error: e.to_string() }),
    }
}

pub async fn login(
    repo: web::Data<FarmerRepository>,
    jwt_service: web::Data<JwtService>,
    request: web::Json<LoginRequest>,
) -> HttpResponse {
    let Some(farmer) = repo.find_by_phone(&request.phone).await else {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: UNKNOWN_PHONE_MESSAGE.to_string(),
        });
    };

    match jwt_service.generate_token(&farmer) {
        Ok(token) => {
            log::info!("Farmer {} logged in", farmer.id);
            HttpResponse::Ok().json(AuthResponse { token, farmer })
        }
        Err(e) => {
            error!("Failed to issue token for farmer {}: {:?}", farmer.id, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Login failed".to_string(),
            })
        }
    }
}

pub async fn me(farmer: AuthenticatedFarmer) -> HttpResponse {
    HttpResponse::Ok().json(farmer.0.profile)
}
