use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::repositories::{
    NewVehicle, RepositoryError, VehicleInfo, VehicleRepository, VehicleSnapshot,
};
use crate::domain::vehicle::{
    Battery, Coordinates, LocationHistory, LocationPoint, Vehicle, VehicleEvent,
};

/// Attempts made before a serialization conflict is handed back to the caller
const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

/// PostgreSQL / CockroachDB implementation of VehicleRepository
///
/// Each operation runs inside its own transaction. Read-modify-write
/// operations lock the vehicle row with `SELECT ... FOR UPDATE` so two
/// concurrent rides on the same vehicle cannot both succeed.
#[derive(Clone)]
pub struct PostgresVehicleRepository {
    pool: PgPool,
}

impl PostgresVehicleRepository {
    /// Creates a new PostgresVehicleRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs `op` in a transaction, retrying it from the start on serialization conflicts
    async fn run_transaction<T, F>(&self, op: F) -> Result<T, RepositoryError>
    where
        T: Send,
        F: for<'c> Fn(&'c mut PgConnection) -> BoxFuture<'c, Result<T, RepositoryError>>
            + Send
            + Sync,
    {
        let mut attempt = 1;
        loop {
            let mut tx = self.pool.begin().await?;
            let outcome = op(&mut *tx).await;
            let result = match outcome {
                Ok(value) => tx
                    .commit()
                    .await
                    .map(|_| value)
                    .map_err(RepositoryError::from),
                // dropping the transaction rolls it back
                Err(e) => Err(e),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < MAX_TRANSACTION_ATTEMPTS => {
                    tracing::warn!(attempt, error = %e, "Retrying transaction after serialization conflict");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

fn log_event(event: &VehicleEvent) {
    tracing::info!(
        vehicle_id = %event.vehicle_id(),
        event = event.name(),
        "Vehicle event committed"
    );
}

/// Logs the committed event, if any, and reports whether the operation applied
fn committed(event: Option<VehicleEvent>) -> bool {
    match event {
        Some(event) => {
            log_event(&event);
            true
        }
        None => false,
    }
}

async fn lock_vehicle(
    conn: &mut PgConnection,
    vehicle_id: Uuid,
) -> Result<Option<Vehicle>, RepositoryError> {
    let row = sqlx::query_as::<_, VehicleInfo>(
        r#"
        SELECT id, vehicle_type, battery, in_use
        FROM vehicles
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(vehicle_id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(r) => {
            let battery = Battery::new(i64::from(r.battery))?;
            Ok(Some(Vehicle::from_persistence(
                r.id,
                r.vehicle_type,
                battery,
                r.in_use,
            )))
        }
        None => Ok(None),
    }
}

async fn insert_location(
    conn: &mut PgConnection,
    location: &LocationHistory,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO location_history (id, vehicle_id, ts, longitude, latitude)
        VALUES ($1, $2, now(), $3, $4)
        "#,
    )
    .bind(location.id())
    .bind(location.vehicle_id())
    .bind(location.position().longitude())
    .bind(location.position().latitude())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn start_ride_txn(
    conn: &mut PgConnection,
    vehicle_id: Uuid,
) -> Result<Option<VehicleEvent>, RepositoryError> {
    let Some(mut vehicle) = lock_vehicle(conn, vehicle_id).await? else {
        return Ok(None);
    };
    let Ok(event) = vehicle.start_ride() else {
        return Ok(None);
    };

    let last_checkin = sqlx::query_as::<_, LocationPoint>(
        r#"
        SELECT longitude, latitude, ts
        FROM location_history
        WHERE vehicle_id = $1
        ORDER BY ts DESC
        LIMIT 1
        "#,
    )
    .bind(vehicle_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::MissingLocation(vehicle_id))?;

    // the ride starts where the vehicle was last seen
    let position = Coordinates::new(last_checkin.longitude, last_checkin.latitude)?;
    insert_location(conn, &LocationHistory::new(vehicle_id, position)).await?;

    sqlx::query("UPDATE vehicles SET in_use = $2 WHERE id = $1")
        .bind(vehicle_id)
        .bind(vehicle.in_use())
        .execute(&mut *conn)
        .await?;

    Ok(Some(event))
}

async fn end_ride_txn(
    conn: &mut PgConnection,
    vehicle_id: Uuid,
    position: Coordinates,
    battery: Battery,
) -> Result<Option<VehicleEvent>, RepositoryError> {
    let Some(mut vehicle) = lock_vehicle(conn, vehicle_id).await? else {
        return Ok(None);
    };
    let Ok(event) = vehicle.end_ride(battery) else {
        return Ok(None);
    };

    insert_location(conn, &LocationHistory::new(vehicle_id, position)).await?;

    sqlx::query("UPDATE vehicles SET in_use = $2, battery = $3 WHERE id = $1")
        .bind(vehicle_id)
        .bind(vehicle.in_use())
        .bind(vehicle.battery().percent())
        .execute(&mut *conn)
        .await?;

    Ok(Some(event))
}

async fn add_vehicle_txn(
    conn: &mut PgConnection,
    vehicle: Vehicle,
    first_location: LocationHistory,
) -> Result<NewVehicle, RepositoryError> {
    sqlx::query(
        r#"
        INSERT INTO vehicles (id, vehicle_type, battery, in_use)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(vehicle.id())
    .bind(vehicle.vehicle_type())
    .bind(vehicle.battery().percent())
    .bind(vehicle.in_use())
    .execute(&mut *conn)
    .await?;

    // the vehicle row must exist before its history row references it
    insert_location(conn, &first_location).await?;

    Ok(NewVehicle {
        vehicle_id: vehicle.id(),
        location_history_id: first_location.id(),
    })
}

async fn remove_vehicle_txn(
    conn: &mut PgConnection,
    vehicle_id: Uuid,
) -> Result<Option<VehicleEvent>, RepositoryError> {
    let Some(vehicle) = lock_vehicle(conn, vehicle_id).await? else {
        return Ok(None);
    };
    let Ok(event) = vehicle.ensure_removable() else {
        return Ok(None);
    };

    // location_history rows cascade
    sqlx::query("DELETE FROM vehicles WHERE id = $1")
        .bind(vehicle_id)
        .execute(&mut *conn)
        .await?;

    Ok(Some(event))
}

async fn get_vehicles_txn(
    conn: &mut PgConnection,
    max_records: i64,
) -> Result<Vec<VehicleSnapshot>, RepositoryError> {
    let vehicles = sqlx::query_as::<_, VehicleSnapshot>(
        r#"
        SELECT
            v.id, v.vehicle_type, v.battery, v.in_use,
            l.longitude AS last_longitude,
            l.latitude AS last_latitude,
            l.ts AS last_checkin
        FROM vehicles AS v
        INNER JOIN location_history AS l ON v.id = l.vehicle_id
        INNER JOIN (
            SELECT vehicle_id, MAX(ts) AS max_ts
            FROM location_history
            GROUP BY vehicle_id
        ) AS g ON g.vehicle_id = l.vehicle_id AND g.max_ts = l.ts
        ORDER BY v.id
        LIMIT $1
        "#,
    )
    .bind(max_records)
    .fetch_all(&mut *conn)
    .await?;

    Ok(vehicles)
}

async fn get_vehicle_txn(
    conn: &mut PgConnection,
    vehicle_id: Uuid,
) -> Result<Option<VehicleSnapshot>, RepositoryError> {
    let vehicle = sqlx::query_as::<_, VehicleSnapshot>(
        r#"
        SELECT
            v.id, v.vehicle_type, v.battery, v.in_use,
            l.longitude AS last_longitude,
            l.latitude AS last_latitude,
            l.ts AS last_checkin
        FROM vehicles AS v
        INNER JOIN location_history AS l ON v.id = l.vehicle_id
        INNER JOIN (
            SELECT vehicle_id, MAX(ts) AS max_ts
            FROM location_history
            WHERE vehicle_id = $1
            GROUP BY vehicle_id
        ) AS g ON g.vehicle_id = l.vehicle_id AND g.max_ts = l.ts
        WHERE v.id = $1
        LIMIT 1
        "#,
    )
    .bind(vehicle_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(vehicle)
}

async fn get_vehicle_and_location_history_txn(
    conn: &mut PgConnection,
    vehicle_id: Uuid,
    max_locations: i64,
) -> Result<Option<(VehicleInfo, Vec<LocationPoint>)>, RepositoryError> {
    let vehicle = sqlx::query_as::<_, VehicleInfo>(
        r#"
        SELECT id, vehicle_type, battery, in_use
        FROM vehicles
        WHERE id = $1
        "#,
    )
    .bind(vehicle_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(vehicle) = vehicle else {
        return Ok(None);
    };

    let locations = sqlx::query_as::<_, LocationPoint>(
        r#"
        SELECT longitude, latitude, ts
        FROM location_history
        WHERE vehicle_id = $1
        ORDER BY ts DESC
        LIMIT $2
        "#,
    )
    .bind(vehicle_id)
    .bind(max_locations)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some((vehicle, locations)))
}

#[async_trait]
impl VehicleRepository for PostgresVehicleRepository {
    async fn start_ride(&self, vehicle_id: Uuid) -> Result<bool, RepositoryError> {
        let event = self
            .run_transaction(|conn| Box::pin(start_ride_txn(conn, vehicle_id)))
            .await?;

        Ok(committed(event))
    }

    async fn end_ride(
        &self,
        vehicle_id: Uuid,
        position: Coordinates,
        battery: Battery,
    ) -> Result<bool, RepositoryError> {
        let event = self
            .run_transaction(|conn| Box::pin(end_ride_txn(conn, vehicle_id, position, battery)))
            .await?;

        Ok(committed(event))
    }

    async fn add_vehicle(
        &self,
        vehicle_type: String,
        position: Coordinates,
        battery: Battery,
    ) -> Result<NewVehicle, RepositoryError> {
        let (vehicle, events) = Vehicle::new(vehicle_type, battery)?;
        let first_location = LocationHistory::new(vehicle.id(), position);

        let ids = self
            .run_transaction(|conn| {
                Box::pin(add_vehicle_txn(conn, vehicle.clone(), first_location.clone()))
            })
            .await?;

        events.iter().for_each(log_event);
        Ok(ids)
    }

    async fn remove_vehicle(&self, vehicle_id: Uuid) -> Result<bool, RepositoryError> {
        let event = self
            .run_transaction(|conn| Box::pin(remove_vehicle_txn(conn, vehicle_id)))
            .await?;

        Ok(committed(event))
    }

    async fn get_vehicles(&self, max_records: i64) -> Result<Vec<VehicleSnapshot>, RepositoryError> {
        self.run_transaction(|conn| Box::pin(get_vehicles_txn(conn, max_records)))
            .await
    }

    async fn get_vehicle(&self, vehicle_id: Uuid) -> Result<Option<VehicleSnapshot>, RepositoryError> {
        self.run_transaction(|conn| Box::pin(get_vehicle_txn(conn, vehicle_id)))
            .await
    }

    async fn get_vehicle_and_location_history(
        &self,
        vehicle_id: Uuid,
        max_locations: i64,
    ) -> Result<Option<(VehicleInfo, Vec<LocationPoint>)>, RepositoryError> {
        self.run_transaction(|conn| {
            Box::pin(get_vehicle_and_location_history_txn(conn, vehicle_id, max_locations))
        })
        .await
    }

    async fn show_tables(&self) -> Result<Vec<String>, RepositoryError> {
        let tables = sqlx::query_scalar::<_, String>(
            r#"
            SELECT table_name::TEXT
            FROM information_schema.tables
            WHERE table_schema = current_schema()
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }
}
