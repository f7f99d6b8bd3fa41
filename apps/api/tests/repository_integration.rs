//! Integration tests for repository layer
//!
//! These tests verify that the vehicle repository correctly interacts with
//! the database, including ride state transitions, location history and
//! cascading deletes. They run against `DATABASE_URL` and are skipped when
//! it is not set.

use std::time::Duration;

use futures::future::join_all;
use movr_api::domain::repositories::{RepositoryError, VehicleRepository};
use movr_api::domain::vehicle::{Battery, Coordinates};
use movr_api::infrastructure::database;
use movr_api::infrastructure::repositories::PostgresVehicleRepository;
use sqlx::PgPool;
use uuid::Uuid;

/// Set up test database connection pool with the schema applied
async fn setup_test_db() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping repository integration test");
        return None;
    };

    let pool = PgPool::connect(&database::normalize_connection_string(&database_url))
        .await
        .expect("Failed to connect to test database");
    database::init_schema(&pool)
        .await
        .expect("Failed to apply migrations");

    Some(pool)
}

/// Add a test vehicle in New York
async fn create_test_vehicle(repo: &PostgresVehicleRepository, battery: i64) -> Uuid {
    repo.add_vehicle(
        "scooter".to_string(),
        Coordinates::new(-74.0060, 40.7128).unwrap(),
        Battery::new(battery).unwrap(),
    )
    .await
    .expect("Failed to add test vehicle")
    .vehicle_id
}

/// Clean up test data after each test
async fn cleanup_test_vehicle(pool: &PgPool, vehicle_id: Uuid) {
    // CASCADE DELETE removes the location history too
    sqlx::query("DELETE FROM vehicles WHERE id = $1")
        .bind(vehicle_id)
        .execute(pool)
        .await
        .expect("Failed to cleanup test vehicle");
}

async fn location_count(pool: &PgPool, vehicle_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM location_history WHERE vehicle_id = $1")
        .bind(vehicle_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count location history")
}

#[tokio::test]
async fn test_add_vehicle_and_get_vehicle() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let repo = PostgresVehicleRepository::new(pool.clone());

    let new_vehicle = repo
        .add_vehicle(
            "  scooter ".to_string(),
            Coordinates::new(-74.0060, 40.7128).unwrap(),
            Battery::new(80).unwrap(),
        )
        .await
        .expect("Failed to add vehicle");

    let vehicle = repo
        .get_vehicle(new_vehicle.vehicle_id)
        .await
        .expect("Failed to get vehicle")
        .expect("Vehicle not found");

    assert_eq!(vehicle.id, new_vehicle.vehicle_id);
    assert_eq!(vehicle.vehicle_type, "scooter");
    assert_eq!(vehicle.battery, 80);
    assert!(!vehicle.in_use);
    assert_eq!(vehicle.last_longitude, -74.0060);
    assert_eq!(vehicle.last_latitude, 40.7128);
    assert_eq!(location_count(&pool, new_vehicle.vehicle_id).await, 1);

    cleanup_test_vehicle(&pool, new_vehicle.vehicle_id).await;
}

#[tokio::test]
async fn test_get_vehicle_not_found() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let repo = PostgresVehicleRepository::new(pool);

    let vehicle = repo
        .get_vehicle(Uuid::new_v4())
        .await
        .expect("Failed to query vehicle");

    assert!(vehicle.is_none());
}

#[tokio::test]
async fn test_get_vehicles_includes_new_vehicle() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let repo = PostgresVehicleRepository::new(pool.clone());
    let vehicle_id = create_test_vehicle(&repo, 55).await;

    let vehicles = repo
        .get_vehicles(1_000_000)
        .await
        .expect("Failed to list vehicles");
    assert!(vehicles.iter().any(|v| v.id == vehicle_id));

    let limited = repo.get_vehicles(1).await.expect("Failed to list vehicles");
    assert_eq!(limited.len(), 1);

    cleanup_test_vehicle(&pool, vehicle_id).await;
}

#[tokio::test]
async fn test_ride_lifecycle() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let repo = PostgresVehicleRepository::new(pool.clone());
    let vehicle_id = create_test_vehicle(&repo, 90).await;

    // Cannot end a ride that never started
    let ended = repo
        .end_ride(
            vehicle_id,
            Coordinates::new(-73.9851, 40.7589).unwrap(),
            Battery::new(70).unwrap(),
        )
        .await
        .expect("Failed to end ride");
    assert!(!ended);

    assert!(repo.start_ride(vehicle_id).await.expect("Failed to start ride"));
    assert_eq!(location_count(&pool, vehicle_id).await, 2);

    // A busy vehicle cannot be taken again
    assert!(!repo.start_ride(vehicle_id).await.expect("Failed to start ride"));

    let riding = repo.get_vehicle(vehicle_id).await.unwrap().unwrap();
    assert!(riding.in_use);
    assert_eq!(riding.last_longitude, -74.0060);

    tokio::time::sleep(Duration::from_millis(20)).await;

    let ended = repo
        .end_ride(
            vehicle_id,
            Coordinates::new(-73.9851, 40.7589).unwrap(),
            Battery::new(70).unwrap(),
        )
        .await
        .expect("Failed to end ride");
    assert!(ended);

    let parked = repo.get_vehicle(vehicle_id).await.unwrap().unwrap();
    assert!(!parked.in_use);
    assert_eq!(parked.battery, 70);
    assert_eq!(parked.last_longitude, -73.9851);
    assert_eq!(parked.last_latitude, 40.7589);
    assert!(parked.last_checkin > riding.last_checkin);
    assert_eq!(location_count(&pool, vehicle_id).await, 3);

    cleanup_test_vehicle(&pool, vehicle_id).await;
}

#[tokio::test]
async fn test_start_ride_unknown_vehicle() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let repo = PostgresVehicleRepository::new(pool);

    let started = repo
        .start_ride(Uuid::new_v4())
        .await
        .expect("Failed to start ride");

    assert!(!started);
}

#[tokio::test]
async fn test_location_history_newest_first() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let repo = PostgresVehicleRepository::new(pool.clone());
    let vehicle_id = create_test_vehicle(&repo, 90).await;

    assert!(repo.start_ride(vehicle_id).await.unwrap());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(repo
        .end_ride(
            vehicle_id,
            Coordinates::new(2.3522, 48.8566).unwrap(),
            Battery::new(10).unwrap(),
        )
        .await
        .unwrap());

    let (vehicle, locations) = repo
        .get_vehicle_and_location_history(vehicle_id, 20)
        .await
        .expect("Failed to load history")
        .expect("Vehicle not found");

    assert_eq!(vehicle.id, vehicle_id);
    assert_eq!(vehicle.battery, 10);
    assert_eq!(locations.len(), 3);
    assert_eq!(locations[0].longitude, 2.3522);
    assert!(locations.windows(2).all(|pair| pair[0].ts >= pair[1].ts));

    let (_, limited) = repo
        .get_vehicle_and_location_history(vehicle_id, 1)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(limited.len(), 1);

    cleanup_test_vehicle(&pool, vehicle_id).await;
}

#[tokio::test]
async fn test_remove_vehicle() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let repo = PostgresVehicleRepository::new(pool.clone());
    let vehicle_id = create_test_vehicle(&repo, 40).await;

    // In-use vehicles are kept
    assert!(repo.start_ride(vehicle_id).await.unwrap());
    assert!(!repo.remove_vehicle(vehicle_id).await.unwrap());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(repo
        .end_ride(
            vehicle_id,
            Coordinates::new(-74.0, 40.7).unwrap(),
            Battery::new(35).unwrap(),
        )
        .await
        .unwrap());

    assert!(repo.remove_vehicle(vehicle_id).await.unwrap());
    assert!(repo.get_vehicle(vehicle_id).await.unwrap().is_none());
    assert_eq!(location_count(&pool, vehicle_id).await, 0);

    // Second removal finds nothing
    assert!(!repo.remove_vehicle(vehicle_id).await.unwrap());
}

#[tokio::test]
async fn test_show_tables() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let repo = PostgresVehicleRepository::new(pool);

    let tables = repo.show_tables().await.expect("Failed to list tables");

    assert!(tables.iter().any(|t| t == "vehicles"));
    assert!(tables.iter().any(|t| t == "location_history"));
}

#[tokio::test]
async fn test_connection_probe_succeeds() {
    let Some(pool) = setup_test_db().await else {
        return;
    };

    database::test_connection(&pool)
        .await
        .expect("Connection probe failed");
}

#[tokio::test]
async fn test_serialization_failure_is_retryable() {
    let Some(pool) = setup_test_db().await else {
        return;
    };

    let err = sqlx::query("DO $$ BEGIN RAISE EXCEPTION USING ERRCODE = '40001'; END $$")
        .execute(&pool)
        .await
        .expect_err("Statement should fail");
    let err = RepositoryError::from(err);

    assert_eq!(err.sqlstate().as_deref(), Some("40001"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_concurrent_start_ride_single_winner() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let repo = PostgresVehicleRepository::new(pool.clone());
    let vehicle_id = create_test_vehicle(&repo, 90).await;

    let riders = (0..8).map(|_| {
        let repo = repo.clone();
        tokio::spawn(async move { repo.start_ride(vehicle_id).await })
    });
    let outcomes = join_all(riders).await;

    let started = outcomes
        .into_iter()
        .map(|outcome| outcome.expect("Task failed").expect("Failed to start ride"))
        .filter(|started| *started)
        .count();

    assert_eq!(started, 1);
    assert_eq!(location_count(&pool, vehicle_id).await, 2);

    let vehicle = repo.get_vehicle(vehicle_id).await.unwrap().unwrap();
    assert!(vehicle.in_use);

    sqlx::query("UPDATE vehicles SET in_use = false WHERE id = $1")
        .bind(vehicle_id)
        .execute(&pool)
        .await
        .expect("Failed to release vehicle");
    cleanup_test_vehicle(&pool, vehicle_id).await;
}
