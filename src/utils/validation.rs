//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos recibidos por query string o JSON.

use serde::Serialize;
use std::str::FromStr;
use validator::ValidationError;

use crate::utils::errors::{validation_error, AppError};

/// Devuelve `None` si el valor está ausente o solo contiene espacios
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Variante de `non_blank` para valores prestados del query string
pub fn non_blank_str(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parsear un parámetro opcional; vacío equivale a ausente
pub fn parse_optional<T: FromStr>(
    field: &'static str,
    raw: Option<&str>,
    message: &'static str,
) -> Result<Option<T>, AppError> {
    match non_blank_str(raw) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| validation_error(field, message)),
    }
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: &T,
) -> Result<(), ValidationError> {
    if *value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), value);
        return Err(error);
    }
    Ok(())
}
