//! Database connection helpers

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use url::Url;

/// Rewrites `cockroachdb://` and `postgresql://` URLs to the `postgres://` scheme
///
/// # Example
/// ```
/// use movr_api::infrastructure::database::normalize_connection_string;
///
/// assert_eq!(
///     normalize_connection_string("cockroachdb://root@localhost:26257/movr"),
///     "postgres://root@localhost:26257/movr"
/// );
/// ```
pub fn normalize_connection_string(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    for scheme in ["cockroachdb://", "postgresql://"] {
        if let Some(rest) = trimmed.strip_prefix(scheme) {
            return format!("postgres://{}", rest);
        }
    }
    trimmed.to_string()
}

/// Connection string with the password replaced, safe to show to users
pub fn redact_connection_string(connection_string: &str) -> String {
    match Url::parse(connection_string) {
        Ok(mut url) => {
            if url.password().is_some() {
                // only fails for URLs that cannot carry credentials
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable connection string>".to_string(),
    }
}

/// Name of the database a connection string points at
pub fn database_name(connection_string: &str) -> Option<String> {
    let url = Url::parse(connection_string).ok()?;
    let name = url.path().trim_start_matches('/');
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Opens a connection pool
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Verifies the database answers queries, logging a hint when it does not
///
/// CockroachDB types integer literals as INT8, so the probe asks for one explicitly.
pub async fn test_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    match sqlx::query_scalar::<_, i64>("SELECT 1::INT8").fetch_one(pool).await {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::error!(error = %e, hint = connection_hint(&e), "Database connection test failed");
            Err(e)
        }
    }
}

/// Suggests a fix for common connection failures
fn connection_hint(error: &sqlx::Error) -> &'static str {
    match error {
        sqlx::Error::Io(_) => {
            "Is the cluster running, and are the host and port in the connection string correct?"
        }
        sqlx::Error::Tls(_) => "Check the sslmode and certificate parameters of the connection string.",
        sqlx::Error::Database(e) if e.code().as_deref() == Some("3D000") => {
            "The database does not exist. Create it from the SQL shell first."
        }
        sqlx::Error::Database(e) if e.code().as_deref() == Some("28P01") => {
            "Authentication failed. Check the user name and password."
        }
        sqlx::Error::PoolTimedOut => "Timed out waiting for a connection. Is the cluster reachable?",
        _ => "Check the connection string passed with --url or DB_URI.",
    }
}

/// Applies the bundled schema migrations
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
