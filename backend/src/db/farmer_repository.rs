use std::collections::HashMap;
use std::sync::Arc;

use krishi_shared::{FarmerProfile, RegisterRequest};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RepositoryError {
    #[error("This phone number is already registered.")]
    AlreadyRegistered,
    #[error("Invalid data format: {0}")]
    InvalidData(String),
}

/// Registered farmers keyed by phone number.
#[derive(Clone, Default)]
pub struct FarmerRepository {
    farmers: Arc<RwLock<HashMap<String, FarmerProfile>>>,
}

fn required(field: &'static str, value: &str) -> Result<String, RepositoryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RepositoryError::InvalidData(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

impl FarmerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<FarmerProfile, RepositoryError> {
        let profile = FarmerProfile {
            id: Uuid::new_v4(),
            name: required("name", &request.name)?,
            phone: required("phone", &request.phone)?,
            location: required("location", &request.location)?,
            crop: required("crop", &request.crop)?,
        };

        let mut farmers = self.farmers.write().await;
        if farmers.contains_key(&profile.phone) {
            return Err(RepositoryError::AlreadyRegistered);
        }
        farmers.insert(profile.phone.clone(), profile.clone());
        log::info!("Registered farmer {} from {}", profile.id, profile.location);
        Ok(profile)
    }

    pub async fn find_by_phone(&self, phone: &str) -> Option<FarmerProfile> {
        self.farmers.read().await.get(phone.trim()).cloned()
    }
}
