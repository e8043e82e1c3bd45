//! Keuangan is a personal finance tracker for recording income and expenses.
//!
//! The library keeps the list of transactions in a single durable slot,
//! derives totals and date-filtered views from it, converts it to and from a
//! portable JSON format and serves all of this over a small, cookie-protected
//! HTTP API. Receipts and warranty cards can be rendered for printing.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod api;
mod app_state;
mod auth;
mod backup;
mod codec;
mod config;
mod endpoints;
mod html;
mod logging;
mod print;
mod routing;
#[cfg(test)]
mod test_utils;
mod timezone;
mod transaction;

pub use app_state::AppState;
pub use backup::{BackupWriter, backup_path, export_file_name};
pub use codec::{
    CoercionNote, DecodedRecord, ImportOutcome, RecordNote, decode_lenient, export_transactions,
    import_transactions,
};
pub use config::{Args, Credentials};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{
    AmountInput, DashboardSummary, DurableSlot, EditTransaction, NewTransaction, STORAGE_KEY,
    SqliteSlot, Totals, Transaction, TransactionStore, TransactionType, aggregate,
    dashboard_summary, filter_by_date_range, parse_instant, recent, sanitize, sort_by_date,
    validate_record,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No durable storage backend is reachable.
    ///
    /// The store degrades to a no-op in this case, so this error is only
    /// raised by callers that need to report the condition.
    #[error("no durable storage backend is available")]
    StorageUnavailable,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(#[from] rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Could not acquire the lock that serializes backup writes.
    #[error("could not acquire the backup lock")]
    BackupLockError,

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// The import text is not valid JSON, or its top-level value is not an array.
    #[error("could not parse the import: {0}")]
    ImportParse(String),

    /// The user submitted a transaction that could not be built.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// The request body could not be understood.
    #[error("invalid request")]
    InvalidRequest,

    /// The requested resource was not found.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A date-time could not be formatted.
    #[error("could not format date-time: {0}")]
    DateFormatError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The log-in credentials have not been set on the server.
    #[error("authentication not configured")]
    AuthNotConfigured,

    /// The username or password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Writing the transaction list to the durable slot failed.
    #[error("failed to save transactions")]
    SaveFailed,
}

impl From<time::error::Format> for Error {
    fn from(value: time::error::Format) -> Self {
        Error::DateFormatError(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Error::ImportParse(reason) => {
                tracing::warn!("Rejected import: {reason}");
                (
                    StatusCode::BAD_REQUEST,
                    "Invalid JSON or not an array of transactions. \
                    Check the syntax before overwriting."
                        .to_owned(),
                )
            }
            Error::InvalidTransaction(reason) => (StatusCode::BAD_REQUEST, reason),
            Error::InvalidRequest => (StatusCode::BAD_REQUEST, "Invalid request".to_owned()),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "The transaction could not be found. \
                Try refreshing to see if it has already been deleted."
                    .to_owned(),
            ),
            Error::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_owned())
            }
            Error::AuthNotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication not configured".to_owned(),
            ),
            Error::SaveFailed | Error::StorageUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save transactions".to_owned(),
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Check the server logs for more details.".to_owned(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
