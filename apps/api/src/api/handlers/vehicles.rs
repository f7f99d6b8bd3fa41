use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::diagnostics::{render_error_page, render_runtime_error};
use crate::api::errors::ApiError;
use crate::api::forms::{vehicle_type_choices, Choice, VehicleForm};
use crate::api::state::AppState;
use crate::domain::repositories::{VehicleInfo, VehicleRepository, VehicleSnapshot};
use crate::domain::vehicle::LocationPoint;

/// Query string accepted by the vehicle list
#[derive(Debug, Deserialize)]
pub struct ListVehiclesQuery {
    pub max_vehicles: Option<i64>,
}

/// The fleet, each vehicle at its current location
#[derive(Debug, Serialize)]
pub struct VehicleListResponse {
    pub title: String,
    pub vehicles: Vec<VehicleSnapshot>,
}

/// A single vehicle and its recent check-ins, newest first
#[derive(Debug, Serialize)]
pub struct VehicleDetailResponse {
    pub title: String,
    pub vehicle: VehicleInfo,
    pub locations: Vec<LocationPoint>,
}

/// Description of the add-vehicle form
#[derive(Debug, Serialize)]
pub struct AddVehicleFormResponse {
    pub title: String,
    pub vehicle_types: Vec<Choice>,
}

/// Response from vehicle creation
#[derive(Debug, Serialize)]
pub struct AddVehicleResponse {
    pub vehicle_id: Uuid,
    pub location_history_id: Uuid,
    pub messages: Vec<String>,
}

/// Notices produced by an action
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<String>,
}

/// Redirects to the default page
///
/// GET / and GET /home
pub async fn home_page() -> Redirect {
    Redirect::to("/vehicles")
}

/// List vehicles
///
/// GET /vehicles
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<ListVehiclesQuery>,
) -> Result<Json<VehicleListResponse>, ApiError> {
    let max_vehicles = query.max_vehicles.unwrap_or(state.max_records);
    if max_vehicles < 1 {
        return Err(ApiError::bad_request("max_vehicles must be at least 1"));
    }

    let vehicles = match state.repository().get_vehicles(max_vehicles).await {
        Ok(vehicles) => vehicles,
        Err(e) => return Err(render_error_page(&state, &e).await),
    };

    Ok(Json(VehicleListResponse {
        title: "Vehicles".to_string(),
        vehicles,
    }))
}

/// View a single vehicle with its location history
///
/// GET /vehicle/:vehicle_id
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<VehicleDetailResponse>, ApiError> {
    let found = match state
        .repository()
        .get_vehicle_and_location_history(vehicle_id, state.max_records)
        .await
    {
        Ok(found) => found,
        Err(e) => return Err(render_error_page(&state, &e).await),
    };

    let (vehicle, locations) = found
        .ok_or_else(|| ApiError::not_found(format!("Vehicle `{}` not found.", vehicle_id)))?;

    Ok(Json(VehicleDetailResponse {
        title: format!("Vehicle {}", vehicle_id),
        vehicle,
        locations,
    }))
}

/// Describe the add-vehicle form
///
/// GET /vehicles/add
pub async fn add_vehicle_form() -> Json<AddVehicleFormResponse> {
    Json(AddVehicleFormResponse {
        title: "Add a vehicle".to_string(),
        vehicle_types: vehicle_type_choices(),
    })
}

/// Add a new vehicle to the fleet
///
/// POST /vehicles/add
pub async fn add_vehicle(
    State(state): State<AppState>,
    Json(form): Json<VehicleForm>,
) -> Result<(StatusCode, Json<AddVehicleResponse>), ApiError> {
    let (vehicle_type, position, battery) = form.into_domain()?;

    let repo = state.repository();
    let new_vehicle = match repo.add_vehicle(vehicle_type, position, battery).await {
        Ok(new_vehicle) => new_vehicle,
        Err(e) => return Err(render_error_page(&state, &e).await),
    };

    // read it back to confirm both rows were committed
    match repo.get_vehicle(new_vehicle.vehicle_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err(ApiError::internal_server_error(format!(
                "Vehicle with id `{}` NOT successfully added.",
                new_vehicle.vehicle_id
            )))
        }
        Err(e) => return Err(render_error_page(&state, &e).await),
    }

    Ok((
        StatusCode::CREATED,
        Json(AddVehicleResponse {
            vehicle_id: new_vehicle.vehicle_id,
            location_history_id: new_vehicle.location_history_id,
            messages: vec![format!("Vehicle added! \nid: {}", new_vehicle.vehicle_id)],
        }),
    ))
}

/// Delete a vehicle from the fleet
///
/// POST /vehicle/remove/:vehicle_id
pub async fn remove_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let repo = state.repository();
    let removed = match repo.remove_vehicle(vehicle_id).await {
        Ok(removed) => removed,
        Err(e) => return Err(render_error_page(&state, &e).await),
    };

    if !removed {
        return Err(ApiError::conflict(format!(
            "Vehicle `{}` not found in database, or is currently in use. Cannot delete it.",
            vehicle_id
        )));
    }

    match repo.get_vehicle(vehicle_id).await {
        Ok(None) => Ok(Json(MessagesResponse {
            messages: vec![format!(
                "Deleted vehicle with id `{}` from database.",
                vehicle_id
            )],
        })),
        Ok(Some(row)) => Err(render_runtime_error(
            &state,
            format!(
                "Attempt to remove vehicle hit unexpected state. Attempted to remove vehicle \
                 `{}`. Current row state is `{:?}`.",
                vehicle_id, row
            ),
        )
        .await),
        Err(e) => Err(render_error_page(&state, &e).await),
    }
}
