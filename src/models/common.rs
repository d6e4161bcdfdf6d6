use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::booking::Role;

// Query parameters for slot lookups
#[derive(Debug, Deserialize)]
pub struct SlotQueryParams {
    pub date: NaiveDate,
}

// Query parameters for per-user booking listings
#[derive(Debug, Deserialize)]
pub struct RoleQueryParams {
    #[serde(default = "default_role")]
    pub role: Role,
}

pub fn default_role() -> Role {
    Role::Client
}

// Response body returned when an entity is created
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub id: String,
}
