//! Controller-specific error types.
//!
//! This module defines error types specific to the Galley controller
//! that are not covered by upstream library errors.

use kube::Error as KubeError;
use runtime::RuntimeError;
use thiserror::Error;

/// Errors that can occur in the Galley controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Processing pipeline error
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The server stopped on its own
    #[error("Server failed: {0}")]
    Server(String),
}
