use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};

use crate::controllers::AuthController;
use crate::dto::auth_dto::{LoginRequest, LoginResponse};
use crate::middleware::require_auth;
use crate::models::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::ApiJson;

/// Configura las rutas de autenticación
pub fn auth_routes(state: AppState) -> Router<AppState> {
    let auth = middleware::from_fn_with_state(state, require_auth);

    Router::new()
        .route("/login", post(login))
        .route("/me", get(me).route_layer(auth))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let controller = AuthController::new(&state);
    let response = controller.login(request).await?;
    Ok(Json(response))
}

/// Usuario del token actual
async fn me(Extension(user): Extension<AuthenticatedUser>) -> Json<AuthenticatedUser> {
    Json(user)
}
