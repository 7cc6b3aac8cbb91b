pub mod memory_vehicle_repository;
pub mod user_repository;
pub mod vehicle_repository;

pub use memory_vehicle_repository::MemoryVehicleRepository;
pub use user_repository::{MemoryUserRepository, PgUserRepository, UserStore};
pub use vehicle_repository::{PgVehicleRepository, VehicleStore};
