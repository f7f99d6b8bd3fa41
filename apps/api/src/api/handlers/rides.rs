use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::diagnostics::{render_error_page, render_runtime_error};
use crate::api::errors::ApiError;
use crate::api::forms::EndRideForm;
use crate::api::handlers::vehicles::MessagesResponse;
use crate::api::state::AppState;
use crate::domain::repositories::{VehicleRepository, VehicleSnapshot};
use crate::domain::ride::RideSummary;

/// An open ride
#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub title: String,
    pub vehicle: VehicleSnapshot,
}

/// A finished ride
#[derive(Debug, Serialize)]
pub struct EndRideResponse {
    pub summary: RideSummary,
    pub messages: Vec<String>,
}

/// Loads the vehicle of an open ride, refusing vehicles that are missing or idle
async fn open_ride(state: &AppState, vehicle_id: Uuid) -> Result<VehicleSnapshot, ApiError> {
    let vehicle = match state.repository().get_vehicle(vehicle_id).await {
        Ok(vehicle) => vehicle,
        Err(e) => return Err(render_error_page(state, &e).await),
    };

    let vehicle = vehicle
        .ok_or_else(|| ApiError::not_found(format!("Vehicle `{}` not found.", vehicle_id)))?;

    if !vehicle.in_use {
        return Err(ApiError::conflict(
            "Cannot view the ride for this vehicle. It is not currently in use.",
        ));
    }

    Ok(vehicle)
}

/// Start a ride
///
/// POST /ride/start/:vehicle_id
pub async fn start_ride(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let started = match state.repository().start_ride(vehicle_id).await {
        Ok(started) => started,
        Err(e) => return Err(render_error_page(&state, &e).await),
    };

    if !started {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            format!("Could not start ride on vehicle {}.", vehicle_id),
        )
        .with_messages(vec![
            format!("Could not start ride on vehicle {}.", vehicle_id),
            "Either the vehicle is actively being ridden, or it has been deleted from the \
             database."
                .to_string(),
        ]));
    }

    Ok(Json(MessagesResponse {
        messages: vec![format!("Ride started with vehicle {}.", vehicle_id)],
    }))
}

/// View an open ride
///
/// GET /ride/:vehicle_id
pub async fn get_ride(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<RideResponse>, ApiError> {
    let vehicle = open_ride(&state, vehicle_id).await?;

    Ok(Json(RideResponse {
        title: format!("Riding a {}", vehicle.vehicle_type),
        vehicle,
    }))
}

/// End a ride
///
/// POST /ride/:vehicle_id
pub async fn end_ride(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
    Json(form): Json<EndRideForm>,
) -> Result<Json<EndRideResponse>, ApiError> {
    let vehicle_at_start = open_ride(&state, vehicle_id).await?;

    let (position, battery) = form.into_domain()?;

    let repo = state.repository();
    let ended = match repo.end_ride(vehicle_id, position, battery).await {
        Ok(ended) => ended,
        Err(e) => return Err(render_error_page(&state, &e).await),
    };

    if !ended {
        return Err(ApiError::conflict(format!(
            "Unable to end ride for vehicle `{}`.",
            vehicle_id
        )));
    }

    let vehicle_at_end = match repo.get_vehicle(vehicle_id).await {
        Ok(Some(vehicle)) => vehicle,
        Ok(None) => {
            return Err(ApiError::not_found(format!(
                "Vehicle `{}` not found.",
                vehicle_id
            )))
        }
        Err(e) => return Err(render_error_page(&state, &e).await),
    };

    let summary = match RideSummary::between(&vehicle_at_start, &vehicle_at_end) {
        Ok(summary) => summary,
        Err(e) => return Err(render_runtime_error(&state, e.to_string()).await),
    };

    Ok(Json(EndRideResponse {
        messages: summary.messages(),
        summary,
    }))
}
