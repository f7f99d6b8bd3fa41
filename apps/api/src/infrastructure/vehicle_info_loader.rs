//! Bulk loader for the `vehicles.vehicle_info` JSON column
//!
//! Reads a pipe-delimited file of `<vehicle id>|<json>` lines, splits the
//! rows into partitions and updates each partition concurrently.

use futures::future::join_all;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Public data set distributed with the MovR course material
pub const DEFAULT_SOURCE_URL: &str =
    "https://cockroach-university-public.s3.amazonaws.com/10000row_json_column.csv";

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Failed to download vehicle data: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Failed to update vehicle: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Update task panicked or was cancelled: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One parsed line of the source file
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleInfoRow {
    pub vehicle_id: Uuid,
    pub info: Value,
}

/// Outcome of a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub rows: usize,
    pub updated: u64,
}

/// Parses `<uuid>|<json>` lines, skipping blank and malformed ones
pub fn parse_rows(body: &str) -> Vec<VehicleInfoRow> {
    body.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| {
            let Some((id, json)) = line.split_once('|') else {
                tracing::warn!(line = index + 1, "Skipping line without a '|' delimiter");
                return None;
            };
            let vehicle_id = match Uuid::parse_str(id.trim()) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(line = index + 1, error = %e, "Skipping line with invalid vehicle id");
                    return None;
                }
            };
            match serde_json::from_str(json.trim()) {
                Ok(info) => Some(VehicleInfoRow { vehicle_id, info }),
                Err(e) => {
                    tracing::warn!(line = index + 1, error = %e, "Skipping line with invalid JSON");
                    None
                }
            }
        })
        .collect()
}

/// Distributes items round-robin over `partitions` buckets
///
/// # Example
/// ```
/// use movr_api::infrastructure::vehicle_info_loader::subdivide;
///
/// assert_eq!(subdivide(vec![1, 2, 3, 4, 5], 2), vec![vec![1, 3, 5], vec![2, 4]]);
/// ```
pub fn subdivide<T>(items: Vec<T>, partitions: usize) -> Vec<Vec<T>> {
    let partitions = partitions.max(1);
    let mut buckets: Vec<Vec<T>> = (0..partitions).map(|_| Vec::new()).collect();
    for (index, item) in items.into_iter().enumerate() {
        buckets[index % partitions].push(item);
    }
    buckets
}

/// Downloads the source file
pub async fn download(url: &str) -> Result<String, LoaderError> {
    let body = reqwest::get(url).await?.error_for_status()?.text().await?;
    Ok(body)
}

/// Writes one partition, returning the number of vehicles updated
async fn update_partition(pool: PgPool, rows: Vec<VehicleInfoRow>) -> Result<u64, sqlx::Error> {
    let mut updated = 0;
    for row in rows {
        let result = sqlx::query("UPDATE vehicles SET vehicle_info = $1 WHERE id = $2")
            .bind(Json(&row.info))
            .bind(row.vehicle_id)
            .execute(&pool)
            .await?;
        updated += result.rows_affected();
    }
    Ok(updated)
}

/// Updates all rows using one concurrent task per partition
pub async fn load(
    pool: &PgPool,
    rows: Vec<VehicleInfoRow>,
    partitions: usize,
) -> Result<LoadReport, LoaderError> {
    let total = rows.len();
    let tasks = subdivide(rows, partitions)
        .into_iter()
        .filter(|partition| !partition.is_empty())
        .map(|partition| tokio::spawn(update_partition(pool.clone(), partition)));

    let mut report = LoadReport {
        rows: total,
        updated: 0,
    };
    for outcome in join_all(tasks).await {
        report.updated += outcome??;
    }

    Ok(report)
}
