use super::events::VehicleEvent;
use super::value_objects::{Battery, VehicleError};
use uuid::Uuid;

/// Vehicle aggregate root
///
/// A single rentable vehicle of the fleet. Its location is not stored on the
/// vehicle itself; see [`super::LocationHistory`].
///
/// # Invariants
/// - Vehicle type cannot be empty
/// - `in_use` is true exactly while a ride is open
/// - A ride can only start on an idle vehicle and end on a busy one
/// - Only idle vehicles can be removed
///
/// # Example
/// ```
/// use movr_api::domain::vehicle::{Battery, Vehicle};
///
/// let (mut vehicle, _events) =
///     Vehicle::new("scooter".to_string(), Battery::new(90).unwrap()).expect("valid vehicle");
///
/// assert!(!vehicle.in_use());
/// vehicle.start_ride().expect("idle vehicle can be ridden");
/// assert!(vehicle.in_use());
/// assert!(vehicle.start_ride().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    id: Uuid,
    vehicle_type: String,
    battery: Battery,
    in_use: bool,
}

impl Vehicle {
    /// Creates a new, idle Vehicle
    ///
    /// # Returns
    /// * `Ok((Vehicle, Vec<VehicleEvent>))` - New vehicle and the `Added` event
    /// * `Err(VehicleError)` - If the vehicle type is blank
    pub fn new(
        vehicle_type: String,
        battery: Battery,
    ) -> Result<(Self, Vec<VehicleEvent>), VehicleError> {
        let vehicle_type = vehicle_type.trim().to_string();
        if vehicle_type.is_empty() {
            return Err(VehicleError::EmptyVehicleType);
        }

        let vehicle = Self {
            id: Uuid::new_v4(),
            vehicle_type,
            battery,
            in_use: false,
        };

        let events = vec![VehicleEvent::Added {
            vehicle_id: vehicle.id,
            vehicle_type: vehicle.vehicle_type.clone(),
            battery,
        }];

        Ok((vehicle, events))
    }

    /// Marks the vehicle as taken by a rider
    pub fn start_ride(&mut self) -> Result<VehicleEvent, VehicleError> {
        if self.in_use {
            return Err(VehicleError::AlreadyInUse(self.id));
        }

        self.in_use = true;

        Ok(VehicleEvent::RideStarted {
            vehicle_id: self.id,
        })
    }

    /// Returns the vehicle to the fleet with its battery reading at drop-off
    pub fn end_ride(&mut self, battery: Battery) -> Result<VehicleEvent, VehicleError> {
        if !self.in_use {
            return Err(VehicleError::NotInUse(self.id));
        }

        self.in_use = false;
        self.battery = battery;

        Ok(VehicleEvent::RideEnded {
            vehicle_id: self.id,
            battery,
        })
    }

    /// Checks that the vehicle may be deleted and produces the `Removed` event
    pub fn ensure_removable(&self) -> Result<VehicleEvent, VehicleError> {
        if self.in_use {
            return Err(VehicleError::AlreadyInUse(self.id));
        }

        Ok(VehicleEvent::Removed {
            vehicle_id: self.id,
        })
    }

    // ===== Getters =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn vehicle_type(&self) -> &str {
        &self.vehicle_type
    }

    pub fn battery(&self) -> Battery {
        self.battery
    }

    pub fn in_use(&self) -> bool {
        self.in_use
    }

    /// Reconstructs a Vehicle from persistence layer data
    ///
    /// Bypasses validation; only repository implementations should call this.
    pub fn from_persistence(id: Uuid, vehicle_type: String, battery: Battery, in_use: bool) -> Self {
        Self {
            id,
            vehicle_type,
            battery,
            in_use,
        }
    }
}
