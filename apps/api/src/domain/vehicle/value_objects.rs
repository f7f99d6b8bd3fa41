use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when a vehicle invariant would be violated
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VehicleError {
    #[error("Battery (percent) must be between 0 and 100.")]
    InvalidBattery(i64),

    #[error("Longitude must be between -180 and 180.")]
    InvalidLongitude(f64),

    #[error("Latitude must be between -90 and 90.")]
    InvalidLatitude(f64),

    #[error("Vehicle type cannot be empty")]
    EmptyVehicleType,

    #[error("Vehicle {0} is already in use")]
    AlreadyInUse(uuid::Uuid),

    #[error("Vehicle {0} is not in use")]
    NotInUse(uuid::Uuid),
}

/// Battery charge value object
///
/// # Invariants
/// - Percentage is within 0..=100
/// - Is immutable after construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Battery(u8);

impl Battery {
    /// Creates a new Battery value object
    ///
    /// # Example
    /// ```
    /// use movr_api::domain::vehicle::Battery;
    ///
    /// let battery = Battery::new(87).expect("valid battery");
    /// assert_eq!(battery.percent(), 87);
    /// assert!(Battery::new(101).is_err());
    /// ```
    pub fn new(percent: i64) -> Result<Self, VehicleError> {
        if (0..=100).contains(&percent) {
            Ok(Battery(percent as u8))
        } else {
            Err(VehicleError::InvalidBattery(percent))
        }
    }

    /// Returns the charge as a percentage
    pub fn percent(&self) -> i32 {
        i32::from(self.0)
    }
}

impl TryFrom<i64> for Battery {
    type Error = VehicleError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Battery::new(value)
    }
}

impl From<Battery> for i32 {
    fn from(battery: Battery) -> Self {
        battery.percent()
    }
}

impl fmt::Display for Battery {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A point on the globe
///
/// # Invariants
/// - Longitude is within -180..=180
/// - Latitude is within -90..=90
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    longitude: f64,
    latitude: f64,
}

impl Coordinates {
    /// Creates validated coordinates
    ///
    /// # Example
    /// ```
    /// use movr_api::domain::vehicle::Coordinates;
    ///
    /// let point = Coordinates::new(-74.0, 40.7).expect("valid point");
    /// assert_eq!(point.longitude(), -74.0);
    /// assert!(Coordinates::new(0.0, 91.0).is_err());
    /// ```
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, VehicleError> {
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(VehicleError::InvalidLongitude(longitude));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(VehicleError::InvalidLatitude(latitude));
        }

        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }
}
