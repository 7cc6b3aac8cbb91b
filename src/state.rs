//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Los almacenes son trait objects para poder
//! arrancar con PostgreSQL o en memoria.

use std::sync::Arc;
use std::time::Duration;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{UserStore, VehicleStore};
use crate::services::{
    AuthService, DescriptionGenerator, DescriptionService, ImageStorage, VehicleLocks,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub vehicles: Arc<dyn VehicleStore>,
    pub users: Arc<dyn UserStore>,
    pub auth: Arc<AuthService>,
    pub descriptions: DescriptionService,
    pub images: ImageStorage,
    pub vehicle_locks: VehicleLocks,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        vehicles: Arc<dyn VehicleStore>,
        users: Arc<dyn UserStore>,
        generator: Arc<dyn DescriptionGenerator>,
    ) -> Self {
        let auth = AuthService::new(&config.jwt_secret, config.jwt_expiration, config.bcrypt_cost);
        let descriptions = DescriptionService::new(
            generator,
            Duration::from_secs(config.description_timeout_secs),
        );
        let images = ImageStorage::new(
            config.upload_dir.clone(),
            &config.base_url,
            config.max_upload_bytes,
        );

        Self {
            config: Arc::new(config),
            vehicles,
            users,
            auth: Arc::new(auth),
            descriptions,
            images,
            vehicle_locks: VehicleLocks::new(),
        }
    }
}
