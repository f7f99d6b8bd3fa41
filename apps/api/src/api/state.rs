use sqlx::PgPool;

use crate::infrastructure::repositories::PostgresVehicleRepository;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Default number of rows returned by list queries
    pub max_records: i64,
    /// Connection string the pool was opened with, for diagnostics
    pub connection_string: String,
}

impl AppState {
    pub fn new(pool: PgPool, max_records: i64, connection_string: impl Into<String>) -> Self {
        Self {
            pool,
            max_records,
            connection_string: connection_string.into(),
        }
    }

    /// Repository bound to the shared pool
    pub fn repository(&self) -> PostgresVehicleRepository {
        PostgresVehicleRepository::new(self.pool.clone())
    }
}
