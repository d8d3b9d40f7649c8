use krishi_shared::FarmerProfile;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::advisory::FarmerContext;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Farmer ID
    pub name: String,
    pub phone: String,
    pub location: String,
    pub crop: String,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn farmer_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn to_profile(&self, id: Uuid) -> FarmerProfile {
        FarmerProfile {
            id,
            name: self.name.clone(),
            phone: self.phone.clone(),
            location: self.location.clone(),
            crop: self.crop.clone(),
        }
    }
}

/// Farmer resolved from a verified session token.
#[derive(Debug, Clone)]
pub struct FarmerSession {
    pub profile: FarmerProfile,
}

impl FarmerSession {
    pub fn context(&self) -> FarmerContext {
        FarmerContext {
            location: Some(self.profile.location.clone()),
            crop: Some(self.profile.crop.clone()),
        }
    }
}
