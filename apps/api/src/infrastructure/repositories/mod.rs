// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod postgres_vehicle_repository;

pub use postgres_vehicle_repository::PostgresVehicleRepository;
