//! Runtime and source errors

use thiserror::Error;

/// Errors reported by a [`Source`](crate::Source).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The underlying subscription could not be created or started
    #[error("Subscription failed to start: {0}")]
    SubscriptionStart(String),

    /// `start` was called while the source is running
    #[error("Source is already running")]
    AlreadyRunning,

    /// The key is not of the form `<namespace>/<name>`
    #[error("Malformed resource key: {0}")]
    MalformedKey(String),

    /// The resource does not exist in the store
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The stored object could not be converted to the domain type
    #[error("Conversion failed: {0}")]
    ConversionFailed(String),

    /// Any other store failure
    #[error("Store error: {0}")]
    Store(String),
}

/// Errors that can occur while running the processor.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The source failed
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// `start` was called on a running processor
    #[error("Processor is already started")]
    AlreadyStarted,
}
