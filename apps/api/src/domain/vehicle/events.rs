use uuid::Uuid;

use super::value_objects::Battery;

/// Domain events that occur within the Vehicle aggregate
///
/// Repositories log these once the surrounding transaction commits.
///
/// # Example
/// ```
/// use movr_api::domain::vehicle::VehicleEvent;
/// use uuid::Uuid;
///
/// let vehicle_id = Uuid::new_v4();
/// let event = VehicleEvent::RideStarted { vehicle_id };
/// assert_eq!(event.vehicle_id(), vehicle_id);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleEvent {
    /// Fired when a vehicle joins the fleet
    Added {
        vehicle_id: Uuid,
        vehicle_type: String,
        battery: Battery,
    },
    /// Fired when a rider takes the vehicle
    RideStarted { vehicle_id: Uuid },
    /// Fired when the rider returns the vehicle
    RideEnded { vehicle_id: Uuid, battery: Battery },
    /// Fired when a vehicle leaves the fleet
    Removed { vehicle_id: Uuid },
}

impl VehicleEvent {
    /// Returns the vehicle_id for this event
    pub fn vehicle_id(&self) -> Uuid {
        match self {
            VehicleEvent::Added { vehicle_id, .. } => *vehicle_id,
            VehicleEvent::RideStarted { vehicle_id } => *vehicle_id,
            VehicleEvent::RideEnded { vehicle_id, .. } => *vehicle_id,
            VehicleEvent::Removed { vehicle_id } => *vehicle_id,
        }
    }

    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            VehicleEvent::Added { .. } => "vehicle_added",
            VehicleEvent::RideStarted { .. } => "ride_started",
            VehicleEvent::RideEnded { .. } => "ride_ended",
            VehicleEvent::Removed { .. } => "vehicle_removed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_event_reports_its_vehicle() {
        let vehicle_id = Uuid::new_v4();
        let battery = Battery::new(50).unwrap();

        let events = [
            VehicleEvent::Added {
                vehicle_id,
                vehicle_type: "scooter".to_string(),
                battery,
            },
            VehicleEvent::RideStarted { vehicle_id },
            VehicleEvent::RideEnded {
                vehicle_id,
                battery,
            },
            VehicleEvent::Removed { vehicle_id },
        ];

        for event in &events {
            assert_eq!(event.vehicle_id(), vehicle_id);
        }
    }

    #[test]
    fn event_names() {
        let vehicle_id = Uuid::new_v4();
        assert_eq!(VehicleEvent::RideStarted { vehicle_id }.name(), "ride_started");
        assert_eq!(VehicleEvent::Removed { vehicle_id }.name(), "vehicle_removed");
    }
}
