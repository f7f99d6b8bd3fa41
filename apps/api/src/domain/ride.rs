//! Ride summary math
//!
//! Distance, duration and average velocity of a ride, computed from the
//! vehicle's check-in at ride start and at ride end.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::repositories::VehicleSnapshot;

/// Mean Earth radius in kilometers (IUGG)
const EARTH_RADIUS_KM: f64 = 6371.0088;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RideError {
    #[error("Cannot calculate an average velocity when the time interval is 0.")]
    ZeroDuration,
}

/// Rounds to two decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Formats a measurement, keeping a `.0` on whole numbers
fn display_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Great-circle distance in km between two points, at a precision of 10 meters
///
/// # Example
/// ```
/// use movr_api::domain::ride::calculate_distance;
///
/// assert_eq!(calculate_distance(10.0, 20.0, 10.0, 20.0), 0.0);
/// ```
pub fn calculate_distance(longitude_1: f64, latitude_1: f64, longitude_2: f64, latitude_2: f64) -> f64 {
    let phi_1 = latitude_1.to_radians();
    let phi_2 = latitude_2.to_radians();
    let delta_phi = (latitude_2 - latitude_1).to_radians();
    let delta_lambda = (longitude_2 - longitude_1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi_1.cos() * phi_2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let central_angle = 2.0 * a.sqrt().min(1.0).asin();

    round2(EARTH_RADIUS_KM * central_angle)
}

/// Minutes elapsed between two instants
pub fn calculate_duration_minutes(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> f64 {
    (end_time - start_time).num_milliseconds() as f64 / 60_000.0
}

/// Hours elapsed between two instants
pub fn calculate_duration_hours(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> f64 {
    (end_time - start_time).num_milliseconds() as f64 / 3_600_000.0
}

/// Magnitude of the average velocity in km/h
pub fn calculate_velocity(
    start_longitude: f64,
    start_latitude: f64,
    start_time: DateTime<Utc>,
    end_longitude: f64,
    end_latitude: f64,
    end_time: DateTime<Utc>,
) -> Result<f64, RideError> {
    let distance = calculate_distance(start_longitude, start_latitude, end_longitude, end_latitude);
    let duration = calculate_duration_hours(start_time, end_time);
    if duration == 0.0 {
        return Err(RideError::ZeroDuration);
    }

    Ok(distance / duration)
}

/// Summary shown to the rider once a ride ends
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideSummary {
    pub vehicle_id: Uuid,
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub average_velocity_kmh: f64,
}

impl RideSummary {
    /// Builds the summary from the vehicle as it was before and after the ride
    pub fn between(
        vehicle_at_start: &VehicleSnapshot,
        vehicle_at_end: &VehicleSnapshot,
    ) -> Result<Self, RideError> {
        let distance_km = calculate_distance(
            vehicle_at_start.last_longitude,
            vehicle_at_start.last_latitude,
            vehicle_at_end.last_longitude,
            vehicle_at_end.last_latitude,
        );
        let duration_minutes = round2(calculate_duration_minutes(
            vehicle_at_start.last_checkin,
            vehicle_at_end.last_checkin,
        ));
        let average_velocity_kmh = round2(calculate_velocity(
            vehicle_at_start.last_longitude,
            vehicle_at_start.last_latitude,
            vehicle_at_start.last_checkin,
            vehicle_at_end.last_longitude,
            vehicle_at_end.last_latitude,
            vehicle_at_end.last_checkin,
        )?);

        Ok(Self {
            vehicle_id: vehicle_at_start.id,
            distance_km,
            duration_minutes,
            average_velocity_kmh,
        })
    }

    /// Messages reported to the rider
    pub fn messages(&self) -> Vec<String> {
        vec![
            format!("You have completed your ride on vehicle {}.", self.vehicle_id),
            format!(
                "You traveled {} km in {} minutes, for an average velocity of {} km/h.",
                display_number(self.distance_km),
                display_number(self.duration_minutes),
                display_number(self.average_velocity_kmh)
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn snapshot(id: Uuid, longitude: f64, latitude: f64, ts: DateTime<Utc>) -> VehicleSnapshot {
        VehicleSnapshot {
            id,
            vehicle_type: "scooter".to_string(),
            battery: 50,
            in_use: true,
            last_longitude: longitude,
            last_latitude: latitude,
            last_checkin: ts,
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn distance_of_one_degree_along_equator() {
        let distance = calculate_distance(0.0, 0.0, 1.0, 0.0);
        assert!((distance - 111.2).abs() < 0.01, "got {}", distance);
    }

    #[test]
    fn distance_is_symmetric() {
        let there = calculate_distance(-74.0060, 40.7128, -73.9352, 40.7306);
        let back = calculate_distance(-73.9352, 40.7306, -74.0060, 40.7128);
        assert_eq!(there, back);
    }

    #[test]
    fn distance_is_rounded_to_ten_meters() {
        let distance = calculate_distance(-74.0060, 40.7128, -73.9352, 40.7306);
        assert_eq!(distance, round2(distance));
        assert!(distance > 6.2 && distance < 6.4, "got {}", distance);
    }

    #[test]
    fn antipodal_points() {
        let distance = calculate_distance(0.0, 0.0, 180.0, 0.0);
        let half_circumference = round2(std::f64::consts::PI * EARTH_RADIUS_KM);
        assert!((distance - half_circumference).abs() < 0.01);
    }

    #[test]
    fn durations() {
        let start = noon();
        let end = start + Duration::minutes(90);

        assert_eq!(calculate_duration_minutes(start, end), 90.0);
        assert_eq!(calculate_duration_hours(start, end), 1.5);
    }

    #[test]
    fn velocity_over_zero_interval_fails() {
        let result = calculate_velocity(0.0, 0.0, noon(), 1.0, 0.0, noon());
        assert_eq!(result, Err(RideError::ZeroDuration));
    }

    #[test]
    fn velocity_of_one_degree_in_one_hour() {
        let start = noon();
        let velocity =
            calculate_velocity(0.0, 0.0, start, 1.0, 0.0, start + Duration::hours(1)).unwrap();
        assert!((velocity - 111.2).abs() < 0.01);
    }

    #[test]
    fn summary_messages() {
        let id = Uuid::new_v4();
        let start = snapshot(id, 0.0, 0.0, noon());
        let end = snapshot(id, 0.0, 0.0, noon() + Duration::minutes(30));

        let summary = RideSummary::between(&start, &end).unwrap();
        assert_eq!(summary.distance_km, 0.0);
        assert_eq!(summary.duration_minutes, 30.0);
        assert_eq!(summary.average_velocity_kmh, 0.0);

        let messages = summary.messages();
        assert_eq!(messages[0], format!("You have completed your ride on vehicle {}.", id));
        assert_eq!(
            messages[1],
            "You traveled 0.0 km in 30.0 minutes, for an average velocity of 0.0 km/h."
        );
    }

    #[test]
    fn fractional_measurements_print_as_is() {
        assert_eq!(display_number(6.29), "6.29");
        assert_eq!(display_number(12.5), "12.5");
        assert_eq!(display_number(111.0), "111.0");
    }

    #[test]
    fn summary_rejects_instant_ride() {
        let id = Uuid::new_v4();
        let start = snapshot(id, 0.0, 0.0, noon());
        let end = snapshot(id, 1.0, 1.0, noon());

        assert_eq!(RideSummary::between(&start, &end), Err(RideError::ZeroDuration));
    }
}
