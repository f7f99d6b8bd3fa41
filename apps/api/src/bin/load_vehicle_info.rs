//! Fills `vehicles.vehicle_info` from the public MovR data set

use std::time::Instant;

use anyhow::Context;
use clap::Parser;

use movr_api::infrastructure::database;
use movr_api::infrastructure::vehicle_info_loader::{self, DEFAULT_SOURCE_URL};

/// Bulk-loads vehicle info JSON into the vehicles table
#[derive(Debug, Parser)]
#[command(name = "load-vehicle-info", version, about)]
struct Args {
    /// CockroachDB / PostgreSQL connection string
    #[arg(long = "url", env = "DB_URI")]
    database_url: String,

    /// Number of partitions updated concurrently
    #[arg(short = 'n', long, default_value_t = 30)]
    partitions: usize,

    /// Location of the pipe-delimited source file
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    source: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let args = Args::parse();
    let database_url = database::normalize_connection_string(&args.database_url);

    let started = Instant::now();
    tracing::info!(source = %args.source, partitions = args.partitions, "Starting load");

    let body = vehicle_info_loader::download(&args.source)
        .await
        .context("Failed to download source file")?;
    let rows = vehicle_info_loader::parse_rows(&body);

    let connections = u32::try_from(args.partitions.max(1)).unwrap_or(u32::MAX);
    let pool = database::connect(&database_url, connections)
        .await
        .context("Failed to connect to database")?;

    let report = vehicle_info_loader::load(&pool, rows, args.partitions).await?;

    tracing::info!(
        rows = report.rows,
        updated = report.updated,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "Load finished"
    );

    Ok(())
}
