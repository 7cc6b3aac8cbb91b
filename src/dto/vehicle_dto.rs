use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::vehicle::Vehicle;

/// Campo de un PATCH que distingue "ausente" de `null` y de un valor
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Solo se invoca si el campo está presente; la ausencia usa Default
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

// Request para crear un vehículo
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    pub vehicle_type: Option<String>,

    #[validate(length(max = 255))]
    pub brand: Option<String>,

    #[validate(length(max = 255))]
    pub model_name: Option<String>,

    #[validate(length(max = 255))]
    pub color: Option<String>,

    #[validate(length(max = 255))]
    pub engine_size: Option<String>,

    pub year: Option<i32>,
    pub price: Option<Decimal>,
    pub images: Option<Vec<String>>,
    pub description: Option<String>,
}

// Request para actualizar un vehículo
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    pub vehicle_type: Option<String>,

    #[validate(length(max = 255))]
    pub brand: Option<String>,

    #[validate(length(max = 255))]
    pub model_name: Option<String>,

    #[validate(length(max = 255))]
    pub color: Option<String>,

    #[validate(length(max = 255))]
    pub engine_size: Option<String>,

    pub year: Option<i32>,
    pub price: Option<Decimal>,

    #[serde(default)]
    pub images: Patch<Vec<String>>,

    pub description: Option<String>,
    pub regenerate_description: Option<bool>,
}

// Request para generar una descripción sin guardar nada
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDescriptionRequest {
    pub vehicle_type: Option<String>,
    pub brand: Option<String>,
    pub model_name: Option<String>,
    pub color: Option<String>,
    pub engine_size: Option<String>,
    pub year: Option<i32>,
    pub price: Option<Decimal>,
}

/// Parámetros del listado tal como llegan en el query string
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleQueryParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub vehicle_type: Option<String>,
    pub brand: Option<String>,
    pub model_name: Option<String>,
    pub color: Option<String>,
    pub engine_size: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_year: Option<String>,
    pub max_year: Option<String>,
}

// Resumen de paginación
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationSummary {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

// Response del listado
#[derive(Debug, Serialize)]
pub struct VehicleListResponse {
    pub vehicles: Vec<Vehicle>,
    pub pagination: PaginationSummary,
}

// Response de create/update
#[derive(Debug, Serialize)]
pub struct VehicleMessageResponse {
    pub message: String,
    pub vehicle: Vehicle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadResponse {
    pub message: String,
    pub images: Vec<String>,
    pub total_images: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageDeleteResponse {
    pub message: String,
    pub images: Vec<String>,
    pub total_images: usize,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
