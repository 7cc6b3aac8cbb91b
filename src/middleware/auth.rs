//! Middleware de autenticación JWT
//!
//! Este módulo maneja la extracción del bearer token y la verificación del
//! usuario autenticado. Se aplica solo a las rutas de escritura.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::state::AppState;
use crate::utils::errors::AppError;

/// Extraer el token de un header `Authorization: Bearer <token>`
pub fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Middleware de autenticación JWT
///
/// Inyecta `AuthenticatedUser` en las extensions de la request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| AppError::Unauthorized("Access token required".to_string()))?;

    let user = state.auth.verify_token(token).map_err(|e| {
        log::debug!("🔒 Token rechazado: {}", e);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
