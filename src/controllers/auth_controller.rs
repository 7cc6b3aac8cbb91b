use std::sync::Arc;

use crate::dto::auth_dto::{LoginRequest, LoginResponse};
use crate::models::user::UserSummary;
use crate::repositories::UserStore;
use crate::services::AuthService;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppError};
use crate::utils::validation::non_blank;

pub struct AuthController {
    users: Arc<dyn UserStore>,
    auth: Arc<AuthService>,
}

impl AuthController {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            auth: state.auth.clone(),
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        let (username, password) = match (non_blank(request.username), request.password) {
            (Some(username), Some(password)) if !password.is_empty() => (username, password),
            _ => return Err(bad_request_error("Username and password are required")),
        };

        let user = self.auth.authenticate(self.users.as_ref(), &username, &password).await?;
        let token = self.auth.issue_token(&user)?;

        Ok(LoginResponse {
            message: "Login successful".to_string(),
            token,
            user: UserSummary::from(&user),
        })
    }
}
