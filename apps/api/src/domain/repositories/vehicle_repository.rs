use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::vehicle::{Battery, Coordinates, LocationPoint, VehicleError};

/// A vehicle joined with its most recent check-in
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct VehicleSnapshot {
    pub id: Uuid,
    pub vehicle_type: String,
    pub battery: i32,
    pub in_use: bool,
    pub last_longitude: f64,
    pub last_latitude: f64,
    pub last_checkin: DateTime<Utc>,
}

/// Vehicle columns without location data
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct VehicleInfo {
    pub id: Uuid,
    pub vehicle_type: String,
    pub battery: i32,
    pub in_use: bool,
}

/// Identifiers generated when a vehicle is added
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NewVehicle {
    pub vehicle_id: Uuid,
    pub location_history_id: Uuid,
}

/// Errors surfaced by repository implementations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("Vehicle {0} has no location history")]
    MissingLocation(Uuid),

    #[error("Invalid vehicle data in database: {0}")]
    InvalidData(#[from] VehicleError),
}

impl RepositoryError {
    /// SQLSTATE reported by the database, if the failure came from a query
    pub fn sqlstate(&self) -> Option<String> {
        match self {
            RepositoryError::Database(sqlx::Error::Database(e)) => {
                e.code().map(|code| code.into_owned())
            }
            _ => None,
        }
    }

    /// True for serialization conflicts the client is expected to retry
    pub fn is_retryable(&self) -> bool {
        self.sqlstate().as_deref() == Some("40001")
    }
}

/// Repository for the vehicle fleet and its location history
///
/// Every method runs as a single database transaction. Methods that
/// return `bool` report whether the vehicle was in the state the operation
/// requires; `false` means the vehicle is missing or in the wrong state.
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Marks an idle vehicle as in use and checks it in at its last known position
    async fn start_ride(&self, vehicle_id: Uuid) -> Result<bool, RepositoryError>;

    /// Checks a busy vehicle in at its drop-off position and frees it
    async fn end_ride(
        &self,
        vehicle_id: Uuid,
        position: Coordinates,
        battery: Battery,
    ) -> Result<bool, RepositoryError>;

    /// Inserts a vehicle together with its first location-history row
    async fn add_vehicle(
        &self,
        vehicle_type: String,
        position: Coordinates,
        battery: Battery,
    ) -> Result<NewVehicle, RepositoryError>;

    /// Deletes an idle vehicle; its location history cascades
    async fn remove_vehicle(&self, vehicle_id: Uuid) -> Result<bool, RepositoryError>;

    /// Lists vehicles with their current location, ordered by id
    async fn get_vehicles(&self, max_records: i64) -> Result<Vec<VehicleSnapshot>, RepositoryError>;

    /// Finds a single vehicle with its current location
    async fn get_vehicle(&self, vehicle_id: Uuid) -> Result<Option<VehicleSnapshot>, RepositoryError>;

    /// Finds a vehicle and its most recent check-ins, newest first
    async fn get_vehicle_and_location_history(
        &self,
        vehicle_id: Uuid,
        max_locations: i64,
    ) -> Result<Option<(VehicleInfo, Vec<LocationPoint>)>, RepositoryError>;

    /// Tables visible in the connected schema
    async fn show_tables(&self) -> Result<Vec<String>, RepositoryError>;
}
