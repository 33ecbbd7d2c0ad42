//! Route entities
//!
//! A [`Route`] is one addressable audio endpoint: a device type plus, for
//! Bluetooth transports, the identity of the remote device. Routes are
//! immutable value objects compared by (kind, address).

use std::fmt;

/// The device type of an audio route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RouteKind {
    /// Built-in earpiece
    Earpiece,
    /// Wired headset / headphones
    WiredHeadset,
    /// Built-in loudspeaker
    Speaker,
    /// Dock connector
    Dock,
    /// Bluetooth SCO (classic headset profile)
    BluetoothSco,
    /// Bluetooth hearing aid
    BluetoothHearingAid,
    /// Bluetooth LE audio
    BluetoothLe,
    /// Remote streaming endpoint
    Streaming,
    /// Sentinel for "no route"
    Invalid,
}

impl RouteKind {
    /// Whether this kind is one of the Bluetooth transport classes
    pub fn is_bluetooth(&self) -> bool {
        matches!(
            self,
            RouteKind::BluetoothSco | RouteKind::BluetoothHearingAid | RouteKind::BluetoothLe
        )
    }

    /// The externally visible route class, total over every kind except
    /// [`RouteKind::Invalid`]
    pub fn class(&self) -> Option<RouteClass> {
        match self {
            RouteKind::Earpiece => Some(RouteClass::Earpiece),
            RouteKind::WiredHeadset => Some(RouteClass::WiredHeadset),
            RouteKind::Speaker | RouteKind::Dock => Some(RouteClass::Speaker),
            RouteKind::BluetoothSco | RouteKind::BluetoothHearingAid | RouteKind::BluetoothLe => {
                Some(RouteClass::Bluetooth)
            }
            RouteKind::Streaming => Some(RouteClass::Streaming),
            RouteKind::Invalid => None,
        }
    }

    /// Returns a human-readable name for the kind
    pub fn name(&self) -> &'static str {
        match self {
            RouteKind::Earpiece => "Earpiece",
            RouteKind::WiredHeadset => "Wired Headset",
            RouteKind::Speaker => "Speaker",
            RouteKind::Dock => "Dock",
            RouteKind::BluetoothSco => "Bluetooth SCO",
            RouteKind::BluetoothHearingAid => "Bluetooth Hearing Aid",
            RouteKind::BluetoothLe => "Bluetooth LE",
            RouteKind::Streaming => "Streaming",
            RouteKind::Invalid => "Invalid",
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The route class published in state snapshots
///
/// Collapses the concrete device types into the classes the call stack
/// distinguishes: all Bluetooth transports are one class, speaker and dock
/// are one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RouteClass {
    /// Built-in earpiece
    Earpiece,
    /// Wired headset
    WiredHeadset,
    /// Loudspeaker or dock
    Speaker,
    /// Any Bluetooth transport
    Bluetooth,
    /// Remote streaming endpoint
    Streaming,
}

impl RouteClass {
    /// The bit this class occupies in a [`RouteMask`]
    pub const fn mask(&self) -> RouteMask {
        match self {
            RouteClass::Earpiece => RouteMask::EARPIECE,
            RouteClass::WiredHeadset => RouteMask::WIRED_HEADSET,
            RouteClass::Speaker => RouteMask::SPEAKER,
            RouteClass::Bluetooth => RouteMask::BLUETOOTH,
            RouteClass::Streaming => RouteMask::STREAMING,
        }
    }
}

/// Bitmask of supported route classes
///
/// Computed once from detected hardware when a controller is constructed and
/// carried unchanged in every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteMask(u8);

impl RouteMask {
    /// Earpiece supported
    pub const EARPIECE: RouteMask = RouteMask(1 << 0);
    /// Bluetooth supported
    pub const BLUETOOTH: RouteMask = RouteMask(1 << 1);
    /// Wired headset supported
    pub const WIRED_HEADSET: RouteMask = RouteMask(1 << 2);
    /// Speaker or dock supported
    pub const SPEAKER: RouteMask = RouteMask(1 << 3);
    /// Streaming supported
    pub const STREAMING: RouteMask = RouteMask(1 << 4);

    /// The empty mask
    pub const fn empty() -> RouteMask {
        RouteMask(0)
    }

    /// Whether every bit of `other` is set in this mask
    pub const fn contains(&self, other: RouteMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// The raw bit value
    pub const fn bits(&self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for RouteMask {
    type Output = RouteMask;

    fn bitor(self, rhs: RouteMask) -> RouteMask {
        RouteMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for RouteMask {
    fn bitor_assign(&mut self, rhs: RouteMask) {
        self.0 |= rhs.0;
    }
}

/// One addressable audio endpoint
///
/// Immutable once constructed; equality is by (kind, address). The
/// [`Route::invalid`] sentinel stands for "no route" while a previously
/// current device has vanished mid-transition and is never published.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    kind: RouteKind,
    address: Option<String>,
}

impl Route {
    /// The built-in earpiece route
    pub fn earpiece() -> Route {
        Route {
            kind: RouteKind::Earpiece,
            address: None,
        }
    }

    /// The wired headset route
    pub fn wired_headset() -> Route {
        Route {
            kind: RouteKind::WiredHeadset,
            address: None,
        }
    }

    /// The loudspeaker route
    pub fn speaker() -> Route {
        Route {
            kind: RouteKind::Speaker,
            address: None,
        }
    }

    /// The dock route
    pub fn dock() -> Route {
        Route {
            kind: RouteKind::Dock,
            address: None,
        }
    }

    /// The streaming route
    pub fn streaming() -> Route {
        Route {
            kind: RouteKind::Streaming,
            address: None,
        }
    }

    /// The "no route" sentinel
    pub fn invalid() -> Route {
        Route {
            kind: RouteKind::Invalid,
            address: None,
        }
    }

    /// A Bluetooth route for the given transport class and device address
    ///
    /// Returns `None` if `kind` is not a Bluetooth transport.
    pub fn bluetooth(kind: RouteKind, address: impl Into<String>) -> Option<Route> {
        if !kind.is_bluetooth() {
            return None;
        }
        Some(Route {
            kind,
            address: Some(address.into()),
        })
    }

    /// The device type of this route
    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    /// The device address, for Bluetooth routes
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// Whether this is a Bluetooth route
    pub fn is_bluetooth(&self) -> bool {
        self.kind.is_bluetooth()
    }

    /// Whether this is the "no route" sentinel
    pub fn is_invalid(&self) -> bool {
        self.kind == RouteKind::Invalid
    }

    /// The externally visible class, `None` only for the sentinel
    pub fn class(&self) -> Option<RouteClass> {
        self.kind.class()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.address {
            Some(addr) => write!(f, "{} ({})", self.kind, addr),
            None => write!(f, "{}", self.kind),
        }
    }
}
