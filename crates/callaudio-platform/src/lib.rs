//! Call Audio Platform Boundary
//!
//! This crate provides the shared vocabulary for call audio routing and the
//! trait boundary to the platform services that actually move audio:
//!
//! - **Routes**: typed endpoints (earpiece, wired headset, speaker, dock,
//!   the Bluetooth transport classes, streaming) with optional device identity
//! - **Focus**: which call-lifecycle phase currently owns routing decisions
//! - **Adapters**: capability traits for the platform audio service and the
//!   Bluetooth stack, implemented by real backends or by virtual doubles
//!
//! # Architecture
//!
//! The route controller in `callaudio-router` depends only on the traits
//! defined here. Real platform integrations and the simulated collaborators
//! in `callaudio-sim` both implement the same boundary, keeping one code path
//! for production and tests.
//!
//! # Example
//!
//! ```rust
//! use callaudio_platform::{Route, RouteClass, RouteKind};
//!
//! let headset = Route::bluetooth(RouteKind::BluetoothSco, "AA:BB:CC:DD:EE:FF").unwrap();
//! assert_eq!(headset.class(), Some(RouteClass::Bluetooth));
//! assert_eq!(headset.address(), Some("AA:BB:CC:DD:EE:FF"));
//! ```

pub mod adapters;
pub mod device;
pub mod error;
pub mod route;

pub use adapters::{AudioPlatform, BluetoothRoutes, PlatformCapabilities};
pub use device::{BluetoothDevice, PreferredDevice};
pub use error::PlatformError;
pub use route::{Route, RouteClass, RouteKind, RouteMask};

/// Which call-lifecycle phase currently owns audio routing decisions
///
/// Exactly one focus holds at a time; it changes only through explicit
/// focus-change events from the call stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FocusType {
    /// No call owns audio
    #[default]
    None,
    /// An ongoing call owns audio
    Active,
    /// An incoming call is ringing
    Ringing,
}

impl FocusType {
    /// Returns a human-readable name for the focus
    pub fn name(&self) -> &'static str {
        match self {
            FocusType::None => "No Focus",
            FocusType::Active => "Active Call",
            FocusType::Ringing => "Ringing",
        }
    }
}
