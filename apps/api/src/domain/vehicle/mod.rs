// Vehicle domain module
// Contains the vehicle aggregate root, its location history, value objects and events

#![allow(clippy::module_inception)]

pub mod events;
pub mod location;
pub mod value_objects;
pub mod vehicle;

// Re-export main types for convenience
pub use events::VehicleEvent;
pub use location::{LocationHistory, LocationPoint};
pub use value_objects::{Battery, Coordinates, VehicleError};
pub use vehicle::Vehicle;
