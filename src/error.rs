//! Pipeline error types with HTTP status code mapping

use axum::http::StatusCode;
use thiserror::Error;

use crate::polyline::DecodeError;

/// Stable code returned when a decoded path has too many coordinates.
pub const E_EXCESSIVE_COORDINATES: &str = "E_EXCESSIVE_COORDINATES";

/// Everything that can stop a polyline request short of a 200.
///
/// The display string is the response body, so client errors carry their
/// message through verbatim.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The spatial index is being rebuilt
    #[error("indexing records")]
    Indexing,

    #[error("Missing 'polyline' parameter")]
    MissingPolyline,

    /// GeoJSON output requested but disabled by configuration
    #[error("Invalid format")]
    InvalidFormat,

    #[error("{0}")]
    InvalidPolyline(#[from] DecodeError),

    #[error("{}", E_EXCESSIVE_COORDINATES)]
    ExcessiveCoordinates { count: usize, max: usize },

    #[error("{0}")]
    InvalidFilter(String),

    /// Path intersection failed inside the index
    #[error("{0}")]
    Query(String),

    /// GeoJSON conversion failed
    #[error("{0}")]
    Conversion(String),

    #[error("{0}")]
    Serialize(#[from] serde_json::Error),
}

impl PipelineError {
    /// Map error to a stable, machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            PipelineError::Indexing => "E_INDEXING",
            PipelineError::MissingPolyline => "E_MISSING_POLYLINE",
            PipelineError::InvalidFormat => "E_INVALID_FORMAT",
            PipelineError::InvalidPolyline(_) => "E_INVALID_POLYLINE",
            PipelineError::ExcessiveCoordinates { .. } => E_EXCESSIVE_COORDINATES,
            PipelineError::InvalidFilter(_) => "E_INVALID_FILTER",
            PipelineError::Query(_) => "E_QUERY",
            PipelineError::Conversion(_) => "E_CONVERSION",
            PipelineError::Serialize(_) => "E_SERIALIZE",
        }
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 503 - index mid-rebuild, client retries
            PipelineError::Indexing => StatusCode::SERVICE_UNAVAILABLE,

            // 400 - client input
            PipelineError::MissingPolyline => StatusCode::BAD_REQUEST,
            PipelineError::InvalidFormat => StatusCode::BAD_REQUEST,
            PipelineError::InvalidPolyline(_) => StatusCode::BAD_REQUEST,
            PipelineError::ExcessiveCoordinates { .. } => StatusCode::BAD_REQUEST,
            PipelineError::InvalidFilter(_) => StatusCode::BAD_REQUEST,

            // 500 - downstream failures
            PipelineError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::Conversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    pub fn invalid_filter(msg: impl ToString) -> Self {
        PipelineError::InvalidFilter(msg.to_string())
    }

    pub fn query(msg: impl ToString) -> Self {
        PipelineError::Query(msg.to_string())
    }

    pub fn conversion(msg: impl ToString) -> Self {
        PipelineError::Conversion(msg.to_string())
    }
}
