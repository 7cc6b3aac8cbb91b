use serde::{Deserialize, Serialize};

use crate::models::user::UserSummary;

// Login request
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserSummary,
}
