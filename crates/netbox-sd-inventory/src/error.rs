//! Error types for netbox-sd-inventory

use thiserror::Error;

/// Errors that can occur while reading from the inventory
#[derive(Error, Debug)]
pub enum InventoryError {
    /// HTTP request could not be completed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Base URL or token missing when building the client
    #[error("missing client setting: {0}")]
    MissingSetting(&'static str),

    /// Inventory answered with a non-success status
    #[error("unexpected status code {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// Token was rejected or lacks permissions
    #[error("provided token invalid or missing permissions")]
    InvalidToken,

    /// The GraphQL endpoint reported errors for the query
    #[error("GraphQL query failed: {0}")]
    GraphQl(String),

    /// Response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Inventory version is outside the supported range
    #[error("incompatible inventory version: {0}")]
    IncompatibleVersion(String),
}

impl InventoryError {
    /// Check if error is likely to go away on the next attempt
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            InventoryError::Http(e) => e.is_timeout() || e.is_connect(),
            InventoryError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type for inventory operations
pub type Result<T> = std::result::Result<T, InventoryError>;
