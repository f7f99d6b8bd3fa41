//! Diagnostic reports for failures a learner can fix on their own
//!
//! When a query fails because the database is not in the expected state
//! (no `vehicles` table, an outdated schema), the API answers with a report
//! explaining the likely cause instead of a bare 500.

use serde::Serialize;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::repositories::{RepositoryError, VehicleRepository};
use crate::infrastructure::database::{database_name, redact_connection_string};

/// Kind of failure, decided from the error reported by the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MissingVehiclesTable,
    WrongSchema,
    Unexpected,
}

/// Classifies a repository failure
pub fn classify(error: &RepositoryError) -> FailureKind {
    let text = error.to_string();
    let sqlstate = error.sqlstate();

    if text.contains("\"vehicles\" does not exist")
        || (sqlstate.as_deref() == Some("42P01") && text.contains("vehicles"))
    {
        FailureKind::MissingVehiclesTable
    } else if sqlstate.as_deref() == Some("42703")
        || text.contains("UndefinedColumn")
        || text.contains("\"location_history\" does not exist")
    {
        // a single-table vehicles schema has no location_history
        FailureKind::WrongSchema
    } else {
        FailureKind::Unexpected
    }
}

/// State of the connected database, attached to every report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseContext {
    pub database_connected: Option<String>,
    pub tables_in_database: Vec<String>,
    pub connection_string: String,
}

/// Body of a diagnostic report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPage {
    pub title: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub possible_sources: Vec<String>,
    pub possible_solutions: Vec<String>,
    pub additional_information: DatabaseContext,
    pub exception_text: String,
}

impl ErrorPage {
    pub fn missing_vehicles_table(exception_text: String, database: DatabaseContext) -> Self {
        Self {
            title: "Cannot load page".to_string(),
            reason: "Caught database error: undefined table".to_string(),
            context: Some("This occurred because there is no `vehicles` table.".to_string()),
            possible_sources: vec![
                "You may be connected to the wrong database, hence the missing table. \
                 Your database may not have the `vehicles` table for some reason."
                    .to_string(),
            ],
            possible_solutions: vec![
                "Suggestion: connect with the SQL shell and find out if your database is in \
                 the correct state."
                    .to_string(),
            ],
            additional_information: database,
            exception_text,
        }
    }

    pub fn wrong_schema(exception_text: String, database: DatabaseContext) -> Self {
        Self {
            title: "Cannot load page".to_string(),
            reason: "Caught database error: undefined column".to_string(),
            context: Some("This occurred because you queried a nonexistent column.".to_string()),
            possible_sources: vec![
                "Your database may have a schema that is incompatible with the version of MovR \
                 you are trying to run."
                    .to_string(),
            ],
            possible_solutions: vec![
                "Suggestion: restart the server with --init-schema, or run the scripts in \
                 `migrations/` from the SQL shell."
                    .to_string(),
            ],
            additional_information: database,
            exception_text,
        }
    }

    pub fn runtime_error(exception_text: String, database: DatabaseContext) -> Self {
        Self {
            title: "Unknown runtime error".to_string(),
            reason: "Runtime error thrown by unexpected application logic.".to_string(),
            context: None,
            possible_sources: Vec::new(),
            possible_solutions: Vec::new(),
            additional_information: database,
            exception_text,
        }
    }
}

/// Collects the database context; table listing is best effort
async fn database_context(state: &AppState) -> DatabaseContext {
    let tables_in_database = match state.repository().show_tables().await {
        Ok(tables) => tables,
        Err(e) => {
            tracing::warn!(error = %e, "Could not list tables for error report");
            Vec::new()
        }
    };

    DatabaseContext {
        database_connected: database_name(&state.connection_string),
        tables_in_database,
        connection_string: redact_connection_string(&state.connection_string),
    }
}

/// Turns a repository failure into an API error, with a report when one applies
pub async fn render_error_page(state: &AppState, error: &RepositoryError) -> ApiError {
    tracing::error!(error = %error, "Database operation failed");

    match classify(error) {
        FailureKind::MissingVehiclesTable => ApiError::from_page(ErrorPage::missing_vehicles_table(
            error.to_string(),
            database_context(state).await,
        )),
        FailureKind::WrongSchema => ApiError::from_page(ErrorPage::wrong_schema(
            error.to_string(),
            database_context(state).await,
        )),
        FailureKind::Unexpected => {
            ApiError::internal_server_error(format!("Database error: {}", error))
        }
    }
}

/// Reports application logic that reached a state it should never be in
pub async fn render_runtime_error(state: &AppState, exception_text: String) -> ApiError {
    tracing::error!(error = %exception_text, "Unexpected application state");

    ApiError::from_page(ErrorPage::runtime_error(
        exception_text,
        database_context(state).await,
    ))
}
