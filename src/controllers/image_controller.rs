//! Controlador de imágenes de vehículos
//!
//! Subida (append) y borrado por índice. Ambas operaciones leen la lista,
//! la modifican y la persisten bajo el lock del vehículo.

use std::sync::Arc;
use uuid::Uuid;

use crate::dto::vehicle_dto::{ImageDeleteResponse, ImageUploadResponse};
use crate::repositories::VehicleStore;
use crate::services::image_list;
use crate::services::image_storage::IncomingImage;
use crate::services::{ImageStorage, VehicleLocks};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, not_found_error, AppError};

pub struct ImageController {
    vehicles: Arc<dyn VehicleStore>,
    storage: ImageStorage,
    locks: VehicleLocks,
    max_files: usize,
}

impl ImageController {
    pub fn new(state: &AppState) -> Self {
        Self {
            vehicles: state.vehicles.clone(),
            storage: state.images.clone(),
            locks: state.vehicle_locks.clone(),
            max_files: state.config.max_upload_files,
        }
    }

    pub async fn upload(
        &self,
        id: Uuid,
        files: Vec<IncomingImage>,
    ) -> Result<ImageUploadResponse, AppError> {
        if files.is_empty() {
            return Err(bad_request_error("No images provided"));
        }
        if files.len() > self.max_files {
            return Err(AppError::BadRequest(format!(
                "Too many files (max {})",
                self.max_files
            )));
        }
        for file in &files {
            self.storage.check(file)?;
        }

        let _guard = self.locks.lock(id).await;
        let vehicle = self
            .vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle"))?;

        let mut saved = Vec::with_capacity(files.len());
        for file in &files {
            match self.storage.save(id, file).await {
                Ok(url) => saved.push(url),
                Err(e) => {
                    self.discard(id, &saved).await;
                    return Err(e);
                }
            }
        }

        let images = image_list::append(vehicle.images, &saved);
        let updated = match self.vehicles.set_images(id, &images).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                self.discard(id, &saved).await;
                return Err(not_found_error("Vehicle"));
            }
            Err(e) => {
                self.discard(id, &saved).await;
                return Err(e);
            }
        };

        log::info!("📸 {} imágenes añadidas al vehículo {}", saved.len(), id);
        Ok(ImageUploadResponse {
            message: "Images uploaded successfully".to_string(),
            total_images: updated.images.len(),
            images: saved,
        })
    }

    pub async fn remove(&self, id: Uuid, raw_index: &str) -> Result<ImageDeleteResponse, AppError> {
        let index = image_list::parse_index(raw_index)?;

        let _guard = self.locks.lock(id).await;
        let vehicle = self
            .vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle"))?;

        let mut images = vehicle.images;
        let removed = image_list::remove_at(&mut images, index)?;

        let updated = self
            .vehicles
            .set_images(id, &images)
            .await?
            .ok_or_else(|| not_found_error("Vehicle"))?;

        self.storage.release(id, &removed).await;

        Ok(ImageDeleteResponse {
            message: "Image deleted successfully".to_string(),
            total_images: updated.images.len(),
            images: updated.images,
        })
    }

    async fn discard(&self, id: Uuid, saved: &[String]) {
        for url in saved {
            self.storage.release(id, url).await;
        }
    }
}
