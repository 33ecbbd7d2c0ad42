//! Collaborator trait boundary
//!
//! The route controller depends on these traits only. Real backends wrap the
//! platform audio service and the Bluetooth stack; `callaudio-sim` provides
//! virtual implementations for tests. All methods are synchronous: a call
//! issues the command and returns, and any asynchronous outcome (a Bluetooth
//! audio channel coming up) arrives later as an inbound event.

use crate::device::PreferredDevice;
use crate::error::PlatformError;
use crate::route::{Route, RouteKind};

/// Hardware capabilities detected at startup
///
/// Speaker and Bluetooth are assumed present on every device; these flags
/// cover the endpoints that may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlatformCapabilities {
    /// A built-in earpiece exists
    pub earpiece: bool,
    /// A wired headset is plugged in at startup
    pub wired_headset: bool,
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self {
            earpiece: true,
            wired_headset: false,
        }
    }
}

/// Boundary to the platform audio service
pub trait AudioPlatform: Send + Sync {
    /// Hardware capabilities, queried once at controller construction
    fn capabilities(&self) -> PlatformCapabilities;

    /// Whether a hardware descriptor currently exists for the kind
    ///
    /// A plug/connect event for a kind with no descriptor is a no-op for the
    /// controller (the platform raced us and the device is already gone).
    fn has_device(&self, kind: RouteKind) -> bool;

    /// The platform's preferred device for the voice-communication strategy
    fn preferred_voice_device(&self) -> Option<PreferredDevice>;

    /// Bind the route's device as the communication endpoint
    fn activate(&self, route: &Route) -> Result<(), PlatformError>;

    /// Release the communication endpoint binding for the route
    fn release(&self, route: &Route) -> Result<(), PlatformError>;

    /// Set the microphone mute state
    fn set_mute(&self, muted: bool) -> Result<(), PlatformError>;
}

/// Boundary to the Bluetooth stack for route audio
pub trait BluetoothRoutes: Send + Sync {
    /// Ask the stack to bring up the audio channel to the device
    ///
    /// Completion is signalled later by a Bluetooth-audio-connected event
    /// carrying the same address, or not at all.
    fn connect_audio(&self, address: &str) -> Result<(), PlatformError>;

    /// Ask the stack to tear down the audio channel to the device
    fn disconnect_audio(&self, address: &str) -> Result<(), PlatformError>;

    /// Whether the device can ring in-band over its audio channel
    fn supports_inband_ringing(&self, address: &str) -> bool;
}
