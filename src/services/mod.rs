//! Services module
//!
//! Este módulo contiene la lógica de negocio y servicios de la aplicación.
//! Los servicios encapsulan reglas de dominio e integraciones externas
//! que los controladores orquestan.

pub mod auth_service;
pub mod description_service;
pub mod image_list;
pub mod image_storage;
pub mod vehicle_locks;
pub mod vehicle_query;

pub use auth_service::AuthService;
pub use description_service::{DescriptionGenerator, DescriptionService, OpenAiDescriptionGenerator};
pub use image_storage::ImageStorage;
pub use vehicle_locks::VehicleLocks;
