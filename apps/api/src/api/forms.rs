//! Request bodies accepted by the vehicle and ride endpoints

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::api::errors::ApiError;
use crate::domain::vehicle::{Battery, Coordinates};

/// Vehicle types a user may register: (value, label)
pub const VEHICLE_TYPES: &[(&str, &str)] = &[("scooter", "Scooter")];

/// One selectable vehicle type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

/// Vehicle types as selectable choices
pub fn vehicle_type_choices() -> Vec<Choice> {
    VEHICLE_TYPES
        .iter()
        .map(|&(value, label)| Choice { value, label })
        .collect()
}

fn choice_error(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("choice");
    error.message = Some(message.into());
    error
}

fn range_error(message: &'static str) -> ValidationError {
    let mut error = ValidationError::new("range");
    error.message = Some(message.into());
    error
}

fn check_longitude(errors: &mut ValidationErrors, longitude: f64) {
    if !(-180.0..=180.0).contains(&longitude) {
        errors.add("longitude", range_error("Longitude must be between -180 and 180."));
    }
}

fn check_latitude(errors: &mut ValidationErrors, latitude: f64) {
    if !(-90.0..=90.0).contains(&latitude) {
        errors.add("latitude", range_error("Latitude must be between -90 and 90."));
    }
}

fn check_battery(errors: &mut ValidationErrors, battery: i32) {
    if !(0..=100).contains(&battery) {
        errors.add("battery", range_error("Battery (percent) must be between 0 and 100."));
    }
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Register a new vehicle
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleForm {
    pub vehicle_type: String,
    pub longitude: f64,
    pub latitude: f64,
    pub battery: i32,
}

impl Validate for VehicleForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !VEHICLE_TYPES
            .iter()
            .any(|(value, _)| *value == self.vehicle_type)
        {
            errors.add("vehicle_type", choice_error("Not a valid choice"));
        }
        check_longitude(&mut errors, self.longitude);
        check_latitude(&mut errors, self.latitude);
        check_battery(&mut errors, self.battery);
        into_result(errors)
    }
}

/// Where and with how much charge a ride ended
#[derive(Debug, Clone, Deserialize)]
pub struct EndRideForm {
    pub longitude: f64,
    pub latitude: f64,
    pub battery: i32,
}

impl Validate for EndRideForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_longitude(&mut errors, self.longitude);
        check_latitude(&mut errors, self.latitude);
        check_battery(&mut errors, self.battery);
        into_result(errors)
    }
}

/// Converts already validated position and battery fields into domain values
fn checked(
    longitude: f64,
    latitude: f64,
    battery: i32,
) -> Result<(Coordinates, Battery), ApiError> {
    let position = Coordinates::new(longitude, latitude)
        .map_err(|e| ApiError::unprocessable_entity(e.to_string()))?;
    let battery = Battery::new(i64::from(battery))
        .map_err(|e| ApiError::unprocessable_entity(e.to_string()))?;
    Ok((position, battery))
}

impl VehicleForm {
    pub fn into_domain(self) -> Result<(String, Coordinates, Battery), ApiError> {
        self.validate()?;
        let (position, battery) = checked(self.longitude, self.latitude, self.battery)?;
        Ok((self.vehicle_type, position, battery))
    }
}

impl EndRideForm {
    pub fn into_domain(self) -> Result<(Coordinates, Battery), ApiError> {
        self.validate()?;
        checked(self.longitude, self.latitude, self.battery)
    }
}
