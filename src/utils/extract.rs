//! Extractores de Axum con rechazo propio
//!
//! Los errores de deserialización se devuelven con el mismo formato JSON
//! que el resto de errores de la API.

use axum::extract::{FromRequest, FromRequestParts};

use crate::utils::errors::AppError;

/// `Json<T>` cuyo rechazo se convierte en `AppError::BadRequest`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query<T>` con el mismo tratamiento de errores
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
