//! Store client errors

use thiserror::Error;

/// Errors that can occur when talking to the resource store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Raw object could not be converted to the domain type
    #[error("Conversion failed: {0}")]
    Conversion(String),

    /// Subscription could not be created or started
    #[error("Subscription error: {0}")]
    Subscription(String),
}
