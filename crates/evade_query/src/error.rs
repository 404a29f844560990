//! Error types for obstacle queries

use thiserror::Error;

/// Obstacle query errors
#[derive(Debug, Error)]
pub enum QueryError {
    /// Ray origin or direction is not usable (zero length or non-finite)
    #[error("Invalid ray: origin {origin:?}, direction {direction:?}")]
    InvalidRay {
        origin: [f32; 3],
        direction: [f32; 3],
    },

    /// Maximum distance is negative or NaN
    #[error("Invalid max distance: {0}")]
    InvalidDistance(f32),

    /// The backend could not answer the query
    #[error("Query backend failure: {0}")]
    Backend(String),
}

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;
