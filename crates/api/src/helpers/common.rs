//! Shared helpers for route handlers.

use api_types::ErrorResponse;

/// Log a failed warehouse call and map it to the generic 500 body.
pub fn database_error(context: &str, err: eyre::Report) -> ErrorResponse {
    tracing::error!(error = %err, "Failed to {context}");
    ErrorResponse::database_error()
}
