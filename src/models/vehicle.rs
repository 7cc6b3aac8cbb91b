//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle y sus variantes para CRUD operations.
//! Mapea a la tabla `vehicles`; la columna `images` es JSONB.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::services::image_list;

/// Tipo de vehículo - mapea al ENUM vehicle_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[sqlx(type_name = "vehicle_type")]
pub enum VehicleType {
    Car,
    Bike,
    #[serde(rename = "SUV")]
    #[sqlx(rename = "SUV")]
    Suv,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "Car",
            VehicleType::Bike => "Bike",
            VehicleType::Suv => "SUV",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(VehicleType::Car),
            "bike" => Ok(VehicleType::Bike),
            "suv" => Ok(VehicleType::Suv),
            other => Err(format!("unknown vehicle type '{}'", other)),
        }
    }
}

/// Vehicle tal como lo ve la API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub vehicle_type: VehicleType,
    pub brand: String,
    pub model_name: String,
    pub color: String,
    pub engine_size: String,
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub images: Vec<String>,
    pub description: Option<String>,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fila cruda de la tabla vehicles
///
/// `images` se lee como JSON arbitrario: filas antiguas pueden contener el
/// array serializado dentro de un string.
#[derive(Debug, Clone, FromRow)]
pub struct VehicleRow {
    pub id: Uuid,
    pub vehicle_type: VehicleType,
    pub brand: String,
    pub model_name: String,
    pub color: String,
    pub engine_size: String,
    pub year: i32,
    pub price: Decimal,
    pub images: serde_json::Value,
    pub description: Option<String>,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        let images = image_list::normalize(&row.images);
        Self {
            id: row.id,
            vehicle_type: row.vehicle_type,
            brand: row.brand,
            model_name: row.model_name,
            color: row.color,
            engine_size: row.engine_size,
            year: row.year,
            price: row.price,
            images,
            description: row.description,
            creator_id: row.creator_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Campos escribibles de un vehículo, ya resueltos por el controlador
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleFields {
    pub vehicle_type: VehicleType,
    pub brand: String,
    pub model_name: String,
    pub color: String,
    pub engine_size: String,
    pub year: i32,
    pub price: Decimal,
    pub images: Vec<String>,
    pub description: Option<String>,
}

impl From<&Vehicle> for VehicleFields {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            vehicle_type: vehicle.vehicle_type,
            brand: vehicle.brand.clone(),
            model_name: vehicle.model_name.clone(),
            color: vehicle.color.clone(),
            engine_size: vehicle.engine_size.clone(),
            year: vehicle.year,
            price: vehicle.price,
            images: vehicle.images.clone(),
            description: vehicle.description.clone(),
        }
    }
}
