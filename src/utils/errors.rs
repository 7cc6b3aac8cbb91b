//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    extract::multipart::MultipartRejection,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid image index: {0}")]
    InvalidIndex(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, message: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            details: None,
            code: Some(code.to_string()),
        }
    }
}

impl AppError {
    /// Código HTTP asociado a cada variante
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) | AppError::Hash(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::InvalidIndex(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = match self {
            AppError::Database(e) => {
                log::error!("💥 Database error: {}", e);
                ErrorResponse::new("Database Error", "Internal server error", "DB_ERROR")
            }

            AppError::Validation(e) => {
                log::warn!("Validation error: {}", e);
                let mut response = ErrorResponse::new(
                    "Validation Error",
                    "The provided data is invalid",
                    "VALIDATION_ERROR",
                );
                response.details = Some(json!(e));
                response
            }

            AppError::BadRequest(msg) => {
                log::warn!("Bad request: {}", msg);
                ErrorResponse::new("Bad Request", msg, "BAD_REQUEST")
            }

            AppError::InvalidIndex(raw) => {
                log::warn!("Invalid image index: {}", raw);
                ErrorResponse::new("Bad Request", "Invalid image index", "INVALID_INDEX")
            }

            AppError::Unauthorized(msg) => {
                log::warn!("Unauthorized access: {}", msg);
                ErrorResponse::new("Unauthorized", msg, "UNAUTHORIZED")
            }

            AppError::NotFound(msg) => ErrorResponse::new("Not Found", msg, "NOT_FOUND"),

            AppError::Internal(msg) => {
                log::error!("💥 Internal error: {}", msg);
                ErrorResponse::new("Internal Server Error", "Internal server error", "INTERNAL_ERROR")
            }

            AppError::ExternalApi(msg) => {
                log::error!("External API error: {}", msg);
                ErrorResponse::new(
                    "External API Error",
                    "An error occurred while communicating with external service",
                    "EXTERNAL_API_ERROR",
                )
            }

            AppError::Jwt(msg) => {
                log::warn!("JWT error: {}", msg);
                ErrorResponse::new("Unauthorized", "Invalid or expired token", "JWT_ERROR")
            }

            AppError::Hash(msg) => {
                log::error!("Hash error: {}", msg);
                ErrorResponse::new(
                    "Hash Error",
                    "An error occurred while processing credentials",
                    "HASH_ERROR",
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(format!("Invalid multipart request: {}", rejection.body_text()))
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.add_param("field".into(), &field);
    error.add_param("message".into(), &message);

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str) -> AppError {
    AppError::NotFound(format!("{} not found", resource))
}

/// Función helper para crear errores de solicitud incorrecta
pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404_with_message() {
        let (status, body) = body_json(not_found_error("Vehicle")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Vehicle not found");
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_invalid_index_is_a_bad_request() {
        let (status, body) = body_json(AppError::InvalidIndex("7".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid image index");
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak_details() {
        let (status, body) =
            body_json(AppError::Internal("connection refused at 10.0.0.3".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("details").is_none());
        assert!(!body.to_string().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_database_errors_do_not_leak_details() {
        let (status, body) = body_json(AppError::Database(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_validation_error_lists_field() {
        let (status, body) = body_json(validation_error("sortBy", "unknown sort field")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].get("sortBy").is_some());
    }
}
