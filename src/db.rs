pub mod error;
pub mod measurement_repository;
pub mod models;
pub mod parameter_repository;
pub mod pool;
pub mod seed;
pub mod station_repository;

pub use error::DbError;
pub use measurement_repository::MeasurementRepository;
pub use models::*;
pub use parameter_repository::ParameterRepository;
pub use station_repository::StationRepository;
