use serde::Serialize;

/// Error type shared by every store and service in the crate.
///
/// Variants fall into the three classes the storefront distinguishes:
/// validation errors (bad input, operation aborted before any state change),
/// availability errors (out of stock, insufficient quantity, delivery not
/// covered), and transport/server errors (the remote API failed or answered
/// with `success: false`). None of them are fatal; callers surface the
/// message and leave the UI interactive.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum StorefrontError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Out of stock: {0}")]
    OutOfStock(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Delivery unavailable: {0}")]
    DeliveryUnavailable(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(
        #[from]
        #[serde(skip)]
        reqwest::Error,
    ),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(
        #[from]
        #[serde(skip)]
        serde_json::Error,
    ),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl StorefrontError {
    /// Message suitable for direct display to the shopper.
    ///
    /// Transport and internal errors collapse to a generic line so server
    /// details never leak into the UI; everything else is already phrased
    /// for humans.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_)
            | Self::Api { .. }
            | Self::InternalError(_)
            | Self::StorageError(_)
            | Self::SerializationError(_) => "Something went wrong. Please try again.".to_string(),
            other => other.to_string(),
        }
    }

    /// True for failures that mean "try a different quantity or product",
    /// not "the system is broken".
    pub fn is_availability(&self) -> bool {
        matches!(
            self,
            Self::OutOfStock(_) | Self::InsufficientStock(_) | Self::DeliveryUnavailable(_)
        )
    }
}
