use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::value_objects::Coordinates;

/// One row of a vehicle's location history
///
/// The most recent row per vehicle is its current location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationHistory {
    id: Uuid,
    vehicle_id: Uuid,
    position: Coordinates,
}

impl LocationHistory {
    /// Records a new check-in for a vehicle
    ///
    /// The timestamp is assigned by the database when the row is inserted.
    pub fn new(vehicle_id: Uuid, position: Coordinates) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            position,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn vehicle_id(&self) -> Uuid {
        self.vehicle_id
    }

    pub fn position(&self) -> Coordinates {
        self.position
    }
}

/// A timestamped position, as read back from the location history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, sqlx::FromRow)]
pub struct LocationPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub ts: DateTime<Utc>,
}
