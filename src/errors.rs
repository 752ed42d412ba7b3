//! Crate-wide error taxonomy.
//!
//! Every pipeline stage raises one of these variants; the driver
//! (`sicoss::service::SicossService`) never recovers from them locally — it
//! rolls back an open persister transaction if any and surfaces the error.
//! Retrying an entire run is a caller concern.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::legajo::EmployeeId;

#[derive(Debug, thiserror::Error)]
pub enum SicossError {
    /// Caps negative, or an unknown differential-category class referenced.
    /// Fatal pre-flight; raised before any employee is processed.
    #[error("invalid cap/config: {0}")]
    InvalidConfig(String),

    /// HR-store extraction failed after retries.
    #[error("extraction failed for period {period}: {source}")]
    ExtractionFailed {
        period: String,
        #[source]
        source: anyhow::Error,
    },

    /// Post-aggregation, a required consolidated column is missing.
    #[error("consolidation incomplete for legajo {nro_legaj}: missing {column}")]
    ConsolidationIncomplete { nro_legaj: EmployeeId, column: &'static str },

    /// One of `SicossRecord`'s business invariants failed to hold on an
    /// output row.
    #[error("invariant {invariant} violated for legajo {nro_legaj}")]
    InvariantViolation { nro_legaj: EmployeeId, invariant: String },

    /// Bulk insert rolled back on a constraint violation.
    #[error("persistence failed at row {row_index} (column {column}): {message}")]
    PersistenceFailed { row_index: usize, column: &'static str, message: String },

    /// Cooperative cancellation. Not treated as an error by the HTTP facade.
    #[error("run cancelled")]
    Cancelled,

    /// A second run was requested for a period already in progress.
    #[error("period {0} is already being processed")]
    PeriodBusy(String),

    /// Malformed HTTP request body / query.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Underlying database error not otherwise classified above.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SicossError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SicossError::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
            SicossError::ExtractionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            SicossError::ConsolidationIncomplete { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SicossError::InvariantViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SicossError::PersistenceFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            SicossError::Cancelled => StatusCode::OK,
            SicossError::PeriodBusy(_) => StatusCode::CONFLICT,
            SicossError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SicossError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps every error variant onto the `{success, message, data}` response
/// envelope the ApiFacade returns.
impl IntoResponse for SicossError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if matches!(self, SicossError::Cancelled) {
            return (
                status,
                Json(json!({
                    "success": false,
                    "message": "run cancelled",
                    "data": null,
                })),
            )
                .into_response();
        }
        (
            status,
            Json(json!({
                "success": false,
                "message": self.to_string(),
                "data": null,
            })),
        )
            .into_response()
    }
}
