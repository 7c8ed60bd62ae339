//! Error types for marketplace API calls and the state built on top of them.

use crate::models::ListingId;
use thiserror::Error;

/// Result type for marketplace operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Marketplace client errors.
///
/// None of these are fatal: every variant maps to a message shown to the
/// viewer with a chance to retry.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection failed, timed out, or the body could not be read
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Operation needs a signed-in viewer; raised before any request is sent
    #[error("Please log in to continue")]
    AuthenticationRequired,

    /// Input rejected locally, the request was never sent
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Listing or other resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-2xx response carrying the server's message
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Parse(#[from] serde_json::Error),

    /// A favorite update for this listing is still outstanding
    #[error("Still saving favorite for listing {0}")]
    InFlight(ListingId),

    /// Local session storage could not be read or written
    #[error("Session storage error: {0}")]
    Storage(#[from] std::io::Error),
}

impl ApiError {
    /// Short text for a transient notification
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
