//! Published audio state
//!
//! The [`StateSnapshot`] is the immutable record the rest of the call stack
//! observes. It is replaced wholesale on every committed change and never
//! mutated in place; identical replacements are suppressed at the engine so
//! listeners see each distinct state exactly once.

use callaudio_platform::{BluetoothDevice, RouteClass, RouteMask};
use serde::{Deserialize, Serialize};

/// The externally visible audio state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Microphone mute state
    pub muted: bool,
    /// Class of the current route
    pub route_class: RouteClass,
    /// Route classes the hardware supports, fixed at construction
    pub supported: RouteMask,
    /// The Bluetooth device audio currently routes through, if any
    pub active_bluetooth: Option<BluetoothDevice>,
    /// Every connected Bluetooth device, in registration order
    pub available_bluetooth: Vec<BluetoothDevice>,
}

impl StateSnapshot {
    /// Whether the current route is a Bluetooth transport
    pub fn is_bluetooth(&self) -> bool {
        self.route_class == RouteClass::Bluetooth
    }

    /// Whether the snapshot's class is in the supported mask
    ///
    /// Streaming is the one class that can be current without appearing in
    /// the fixed hardware mask.
    pub fn class_supported(&self) -> bool {
        self.route_class == RouteClass::Streaming || self.supported.contains(self.route_class.mask())
    }
}
