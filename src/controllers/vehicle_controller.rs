//! Controlador de vehículos
//!
//! Orquesta DTOs, almacén y servicio de descripciones. Las mutaciones de un
//! vehículo existente se hacen bajo su lock.

use rust_decimal::{Decimal, RoundingStrategy};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{
    CreateVehicleRequest, DescriptionResponse, GenerateDescriptionRequest, MessageResponse, Patch,
    UpdateVehicleRequest, VehicleListResponse, VehicleMessageResponse, VehicleQueryParams,
};
use crate::models::auth::AuthenticatedUser;
use crate::models::vehicle::{Vehicle, VehicleFields, VehicleType};
use crate::repositories::VehicleStore;
use crate::services::description_service::VehicleAttributes;
use crate::services::vehicle_query::VehicleQuery;
use crate::services::{DescriptionService, ImageStorage, VehicleLocks};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, not_found_error, validation_error, AppError};
use crate::utils::validation::{non_blank, validate_non_negative};

const REQUIRED_FIELDS: &str = "All required fields must be provided";
const DESCRIPTION_FIELDS: &str = "All vehicle details are required for description generation";
const REGENERATION_WARNING: &str =
    "Description could not be regenerated; the previous description was kept";

/// Ids inválidos se tratan como inexistentes
pub fn parse_vehicle_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| not_found_error("Vehicle"))
}

pub struct VehicleController {
    vehicles: Arc<dyn VehicleStore>,
    descriptions: DescriptionService,
    images: ImageStorage,
    locks: VehicleLocks,
}

impl VehicleController {
    pub fn new(state: &AppState) -> Self {
        Self {
            vehicles: state.vehicles.clone(),
            descriptions: state.descriptions.clone(),
            images: state.images.clone(),
            locks: state.vehicle_locks.clone(),
        }
    }

    pub async fn list(&self, params: &VehicleQueryParams) -> Result<VehicleListResponse, AppError> {
        let query = VehicleQuery::from_params(params)?;
        let (vehicles, total) = self.vehicles.search(&query).await?;

        Ok(VehicleListResponse {
            vehicles,
            pagination: query.summary(total),
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Vehicle, AppError> {
        self.vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle"))
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        request: CreateVehicleRequest,
    ) -> Result<VehicleMessageResponse, AppError> {
        request.validate()?;

        let (vehicle_type, brand, model_name, color, engine_size, year, price) = match (
            non_blank(request.vehicle_type),
            non_blank(request.brand),
            non_blank(request.model_name),
            non_blank(request.color),
            non_blank(request.engine_size),
            request.year,
            request.price,
        ) {
            (Some(t), Some(b), Some(m), Some(c), Some(e), Some(y), Some(p)) => (t, b, m, c, e, y, p),
            _ => return Err(bad_request_error(REQUIRED_FIELDS)),
        };

        let mut fields = VehicleFields {
            vehicle_type: parse_vehicle_type(&vehicle_type)?,
            brand,
            model_name,
            color,
            engine_size,
            year,
            price: checked_price(price)?,
            images: request.images.unwrap_or_default(),
            description: non_blank(request.description),
        };

        if fields.description.is_none() {
            let attributes = VehicleAttributes::from(&fields);
            fields.description = Some(self.descriptions.generate_or_fallback(&attributes).await);
        }

        let vehicle = self.vehicles.create(fields, Some(user.user_id)).await?;
        log::info!("🚗 {} creó el vehículo {}", user.username, vehicle.id);

        Ok(VehicleMessageResponse {
            message: "Vehicle created successfully".to_string(),
            vehicle,
            warning: None,
        })
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<VehicleMessageResponse, AppError> {
        request.validate()?;

        let _guard = self.locks.lock(id).await;
        let existing = self.get_by_id(id).await?;

        let vehicle_type = match non_blank(request.vehicle_type) {
            Some(raw) => parse_vehicle_type(&raw)?,
            None => existing.vehicle_type,
        };
        let price = match request.price.filter(|p| !p.is_zero()) {
            Some(price) => checked_price(price)?,
            None => existing.price,
        };

        let mut fields = VehicleFields {
            vehicle_type,
            brand: non_blank(request.brand).unwrap_or_else(|| existing.brand.clone()),
            model_name: non_blank(request.model_name).unwrap_or_else(|| existing.model_name.clone()),
            color: non_blank(request.color).unwrap_or_else(|| existing.color.clone()),
            engine_size: non_blank(request.engine_size).unwrap_or_else(|| existing.engine_size.clone()),
            year: request.year.filter(|y| *y != 0).unwrap_or(existing.year),
            price,
            images: match request.images {
                Patch::Absent => existing.images.clone(),
                Patch::Null => Vec::new(),
                Patch::Value(images) => images,
            },
            description: None,
        };

        let supplied = non_blank(request.description);
        let regenerate = request.regenerate_description == Some(true)
            || (supplied.is_none() && request.regenerate_description != Some(false));

        let mut warning = None;
        fields.description = if regenerate {
            match self.descriptions.generate(&VehicleAttributes::from(&fields)).await {
                Ok(text) => Some(text),
                Err(e) => {
                    log::warn!("⚠️ No se pudo regenerar la descripción de {}: {}", id, e);
                    warning = Some(REGENERATION_WARNING.to_string());
                    supplied.or(existing.description)
                }
            }
        } else {
            supplied.or(existing.description)
        };

        let vehicle = self
            .vehicles
            .update(id, fields)
            .await?
            .ok_or_else(|| not_found_error("Vehicle"))?;

        Ok(VehicleMessageResponse {
            message: "Vehicle updated successfully".to_string(),
            vehicle,
            warning,
        })
    }

    pub async fn delete(&self, id: Uuid) -> Result<MessageResponse, AppError> {
        let _guard = self.locks.lock(id).await;
        let existing = self.get_by_id(id).await?;

        if !self.vehicles.delete(id).await? {
            return Err(not_found_error("Vehicle"));
        }
        self.images.release_all(id, &existing.images).await;

        log::info!("🗑️ Vehículo borrado: {}", id);
        Ok(MessageResponse::new("Vehicle deleted successfully"))
    }

    pub async fn generate_description(
        &self,
        request: GenerateDescriptionRequest,
    ) -> Result<DescriptionResponse, AppError> {
        let attributes = match (
            non_blank(request.vehicle_type),
            non_blank(request.brand),
            non_blank(request.model_name),
            non_blank(request.color),
            non_blank(request.engine_size),
            request.year,
            request.price,
        ) {
            (Some(t), Some(b), Some(m), Some(c), Some(e), Some(y), Some(p)) => VehicleAttributes {
                vehicle_type: parse_vehicle_type(&t)?,
                brand: b,
                model_name: m,
                color: c,
                engine_size: e,
                year: y,
                price: p,
            },
            _ => return Err(bad_request_error(DESCRIPTION_FIELDS)),
        };

        let description = self
            .descriptions
            .generate(&attributes)
            .await
            .map_err(|e| AppError::ExternalApi(e.to_string()))?;

        Ok(DescriptionResponse { description })
    }
}

fn parse_vehicle_type(raw: &str) -> Result<VehicleType, AppError> {
    raw.parse()
        .map_err(|_| validation_error("vehicleType", "vehicleType must be one of Car, Bike, SUV"))
}

/// Máximo representable en la columna NUMERIC(10, 2)
fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Precio no negativo, redondeado a céntimos y dentro del rango de la columna
fn checked_price(price: Decimal) -> Result<Decimal, AppError> {
    validate_non_negative(&price)
        .map_err(|_| validation_error("price", "price must not be negative"))?;
    // Mismo redondeo que NUMERIC
    let price = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if price > max_price() {
        return Err(validation_error("price", "price must not exceed 99999999.99"));
    }
    Ok(price)
}
