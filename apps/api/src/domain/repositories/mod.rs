// Repository interfaces (ports)
// Implemented by adapters in the infrastructure layer

pub mod vehicle_repository;

pub use vehicle_repository::{
    NewVehicle, RepositoryError, VehicleInfo, VehicleRepository, VehicleSnapshot,
};
