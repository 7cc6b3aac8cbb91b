pub mod auth_controller;
pub mod image_controller;
pub mod vehicle_controller;

pub use auth_controller::AuthController;
pub use image_controller::ImageController;
pub use vehicle_controller::VehicleController;
