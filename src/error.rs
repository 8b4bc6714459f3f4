//! Failure taxonomy for talking to the remote catalog.
//!
//! Errors are `Clone` so a single hydrate outcome can be handed to every
//! caller that coalesced onto the same fetch.

/// Message shown to users whenever the product list could not be loaded.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load products. Please try again later.";

/// Message shown when a single product could not be found or fetched.
pub const PRODUCT_NOT_FOUND_MESSAGE: &str = "Product not found!";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to build http client: {0}")]
    Client(String),
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("remote catalog answered {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("remote catalog response could not be decoded: {0}")]
    Decode(String),
}

impl CatalogError {
    /// Message for a failed list load.
    pub fn user_message(&self) -> &'static str {
        LOAD_FAILED_MESSAGE
    }

    /// Message for a failed single-product fetch; the detail view treats it as missing.
    pub fn lookup_message(&self) -> &'static str {
        PRODUCT_NOT_FOUND_MESSAGE
    }

    /// Stable machine-readable code for API bodies and log fields.
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Client(_) => "CLIENT",
            CatalogError::Transport { .. } => "TRANSPORT",
            CatalogError::Status { .. } => "STATUS",
            CatalogError::Decode(_) => "DECODE",
        }
    }
}
