//! Event vocabulary for the route controller
//!
//! Inbound [`RouteEvent`]s are the closed set of stimuli the controller
//! reacts to: hardware membership changes, Bluetooth stack notifications,
//! user and programmatic switch requests, mute and focus changes, and the
//! control events for the pending-transition protocol. Whatever owns the
//! platform subscriptions translates its notifications into these and
//! submits them on the controller's command channel; the core subscribes to
//! nothing itself.
//!
//! Outbound [`AudioRouteEvent`]s form a single ordered stream carrying
//! everything observers need: committed route changes, snapshot
//! replacements, pending-transition lifecycle, and collaborator errors.

use callaudio_platform::{BluetoothDevice, FocusType, Route, RouteKind};

use crate::snapshot::StateSnapshot;

/// Where a switch request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOrigin {
    /// Direct user action (UI, hardware button)
    User,
    /// Programmatic request from the call stack
    Program,
}

/// Destination of a switch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchTarget {
    /// The earpiece (or whatever occupies the handset slot)
    Earpiece,
    /// The wired headset
    WiredHeadset,
    /// The speaker (or dock)
    Speaker,
    /// A Bluetooth device by address, or the most recent one if `None`
    Bluetooth {
        /// Device address; `None` selects the most recently added device
        address: Option<String>,
    },
    /// Whatever the fallback selector chooses
    Baseline,
}

/// Inbound events consumed by the route controller
#[derive(Debug, Clone)]
pub enum RouteEvent {
    /// A wired headset was plugged in
    WiredHeadsetConnected,
    /// The wired headset was unplugged
    WiredHeadsetDisconnected,
    /// The device was placed on a dock
    DockConnected,
    /// The device left the dock
    DockDisconnected,

    /// A Bluetooth device connected a route-capable profile
    BluetoothDeviceAdded {
        /// Transport class of the new route
        kind: RouteKind,
        /// The remote device
        device: BluetoothDevice,
    },
    /// A Bluetooth device disconnected its profile
    BluetoothDeviceRemoved {
        /// Transport class of the departing route
        kind: RouteKind,
        /// Address of the departing device
        address: String,
    },
    /// The platform selected an active Bluetooth device
    BluetoothActiveDevicePresent {
        /// Transport class of the active device
        kind: RouteKind,
        /// Address, when the stack reports one
        address: Option<String>,
    },
    /// The platform's active Bluetooth device is going away
    BluetoothActiveDeviceGone {
        /// Transport class of the departing active device
        kind: RouteKind,
    },
    /// The Bluetooth audio channel to a device is up
    BluetoothAudioConnected {
        /// Address of the confirming device
        address: String,
    },
    /// The Bluetooth audio channel to a device went down
    BluetoothAudioDisconnected {
        /// Address of the device that lost audio
        address: String,
    },

    /// A route switch was requested
    SwitchRequested {
        /// Destination of the switch
        target: SwitchTarget,
        /// User or programmatic
        origin: SwitchOrigin,
    },

    /// Mute the call microphone
    MuteOn,
    /// Unmute the call microphone
    MuteOff,
    /// Toggle the mute state
    MuteToggle,
    /// The platform changed mute underneath us
    MuteExternallyChanged {
        /// The externally applied state
        muted: bool,
    },

    /// The call-lifecycle focus changed
    FocusChanged {
        /// The newly holding focus
        focus: FocusType,
    },

    /// Forced streaming mode was enabled
    StreamingEnabled,
    /// Forced streaming mode was disabled
    StreamingDisabled,

    /// The pending-transition deadline elapsed
    PendingTimeout,
    /// Unconditionally close any open pending transition (recovery)
    ExitPending,
}

/// Unified event stream emitted by the route controller
#[derive(Debug, Clone)]
pub enum AudioRouteEvent {
    /// A route became available
    RouteAdded {
        /// The newly materialized route
        route: Route,
    },
    /// A route is no longer available
    RouteRemoved {
        /// The departed route
        route: Route,
    },

    /// A pending transition opened
    PendingStarted {
        /// Route/activation captured as origin
        origin: Route,
        /// Requested destination
        dest: Route,
        /// Requested activation
        dest_active: bool,
    },
    /// An open pending transition was retargeted
    PendingRetargeted {
        /// The abandoned destination, now the anchor origin
        origin: Route,
        /// The new destination
        dest: Route,
        /// The new activation
        dest_active: bool,
    },
    /// A pending transition outlived its deadline and was committed anyway
    PendingTimedOut {
        /// The destination committed optimistically
        dest: Route,
    },

    /// The current route and activation were committed
    RouteChanged {
        /// Previous route (possibly the invalid sentinel)
        from: Route,
        /// Newly current route
        to: Route,
        /// Whether call audio is flowing through it
        active: bool,
    },
    /// A new immutable audio state was published
    SnapshotReplaced {
        /// The replacement snapshot
        snapshot: StateSnapshot,
    },

    /// A switch request targeted an unavailable route and was dropped
    SwitchIgnored {
        /// The unreachable destination
        requested: Route,
    },
    /// A collaborator command failed; local state stands
    Error {
        /// Source of the error
        source: String,
        /// Error message
        message: String,
    },
}

impl AudioRouteEvent {
    /// Check if this is a pending-transition lifecycle event
    pub fn is_pending_lifecycle(&self) -> bool {
        matches!(
            self,
            AudioRouteEvent::PendingStarted { .. }
                | AudioRouteEvent::PendingRetargeted { .. }
                | AudioRouteEvent::PendingTimedOut { .. }
        )
    }

    /// Check if this is a route membership event
    pub fn is_membership(&self) -> bool {
        matches!(
            self,
            AudioRouteEvent::RouteAdded { .. } | AudioRouteEvent::RouteRemoved { .. }
        )
    }

    /// The snapshot carried by this event, if any
    pub fn snapshot(&self) -> Option<&StateSnapshot> {
        match self {
            AudioRouteEvent::SnapshotReplaced { snapshot } => Some(snapshot),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_lifecycle_classification() {
        let started = AudioRouteEvent::PendingStarted {
            origin: Route::earpiece(),
            dest: Route::speaker(),
            dest_active: true,
        };
        assert!(started.is_pending_lifecycle());
        assert!(!started.is_membership());

        let added = AudioRouteEvent::RouteAdded {
            route: Route::speaker(),
        };
        assert!(added.is_membership());
        assert!(!added.is_pending_lifecycle());
    }
}
