// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod diagnostics;
pub mod errors;
pub mod forms;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};

use handlers::{health, rides, vehicles};
pub use state::AppState;

/// Builds the application router
///
/// Middleware (tracing, CORS) is layered on by the binary.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Landing pages
        .route("/", get(vehicles::home_page))
        .route("/home", get(vehicles::home_page))
        // Vehicle routes
        .route("/vehicles", get(vehicles::list_vehicles))
        .route(
            "/vehicles/add",
            get(vehicles::add_vehicle_form).post(vehicles::add_vehicle),
        )
        .route("/vehicle/:vehicle_id", get(vehicles::get_vehicle))
        .route("/vehicle/remove/:vehicle_id", post(vehicles::remove_vehicle))
        // Ride routes
        .route("/ride/start/:vehicle_id", post(rides::start_ride))
        .route("/ride/:vehicle_id", get(rides::get_ride).post(rides::end_ride))
        // Shared state
        .with_state(state)
}
