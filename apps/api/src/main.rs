use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use movr_api::api::{self, AppState};
use movr_api::config::Config;
use movr_api::infrastructure::database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = Config::parse();
    let database_url = database::normalize_connection_string(&config.database_url);

    // Connect to database
    tracing::info!(
        url = %database::redact_connection_string(&database_url),
        "Connecting to database..."
    );
    let pool = database::connect(&database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    database::test_connection(&pool)
        .await
        .context("Database did not answer a test query")?;

    tracing::info!("Database connected successfully");

    if config.init_schema {
        tracing::info!("Applying schema migrations");
        database::init_schema(&pool)
            .await
            .context("Failed to apply schema migrations")?;
    }

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState::new(pool, config.max_records, database_url);
    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
