//! Error types for the route controller

use thiserror::Error;

use callaudio_platform::{PlatformError, Route};

/// Errors that can occur while handling a route event
///
/// None of these escape the event loop: they are caught at the dispatch
/// site, logged, and surfaced as observer events. Local state is optimistic
/// by design, so a failed collaborator command never rolls it back.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The requested destination is not currently materialized
    #[error("route not available: {0}")]
    RouteNotAvailable(Route),

    /// No Bluetooth route exists for the address
    #[error("unknown bluetooth device: {0}")]
    UnknownDevice(String),

    /// The fallback selector found nothing reachable
    #[error("no route available")]
    NoRouteAvailable,

    /// A platform collaborator command failed
    #[error("platform command failed: {0}")]
    Platform(#[from] PlatformError),
}
