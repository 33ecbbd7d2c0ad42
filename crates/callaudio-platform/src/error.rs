//! Error types for the platform boundary

use thiserror::Error;

use crate::route::RouteKind;

/// Errors reported by platform collaborators
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The addressed device is not known to the platform
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The platform refused or failed to execute a command
    #[error("command rejected: {0}")]
    CommandRejected(String),

    /// No hardware descriptor exists for the route kind
    #[error("no device descriptor for {0}")]
    NoDescriptor(RouteKind),

    /// I/O error talking to the platform service
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
