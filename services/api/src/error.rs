//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service and the mapping of port
//! errors onto HTTP responses.

use crate::config::ConfigError;
use axum::http::StatusCode;
use reviewiz_core::i18n::{self, keys, Locale};
use reviewiz_core::ports::PortError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure while applying the embedded migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Maps a port error to the status and user-facing message a handler returns.
pub fn port_error_response(e: &PortError, locale: Locale) -> (StatusCode, String) {
    match e {
        PortError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            i18n::text(locale, keys::NOT_FOUND).to_string(),
        ),
        PortError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Configuration(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            i18n::text(locale, keys::CONFIG_ERROR).to_string(),
        ),
        PortError::Generation(_) => (
            StatusCode::BAD_GATEWAY,
            i18n::text(locale, keys::GENERATION_ERROR).to_string(),
        ),
        PortError::Unexpected(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}
