use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims del JWT
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // user_id
    pub username: String,
    pub role: String,
    pub exp: usize, // expiration timestamp
    pub iat: usize, // issued at timestamp
}

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
}
