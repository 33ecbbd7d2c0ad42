//! External device handles
//!
//! Identity-bearing metadata for devices that back routes. Bluetooth devices
//! are keyed by address everywhere; the display name is carried for
//! diagnostics and UI only.

use crate::route::RouteKind;

/// Handle to a remote Bluetooth device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BluetoothDevice {
    /// Device address (the identity used for matching)
    pub address: String,
    /// Human-readable device name, if known
    pub name: Option<String>,
}

impl BluetoothDevice {
    /// Create a handle with address only
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
        }
    }

    /// Create a handle with address and display name
    pub fn named(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: Some(name.into()),
        }
    }

    /// Display name, falling back to the address
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}

/// The platform's preferred device for the voice-communication strategy
///
/// Returned by [`crate::AudioPlatform::preferred_voice_device`]; the fallback
/// selector maps it onto a currently materialized route, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PreferredDevice {
    /// Device type of the preferred endpoint
    pub kind: RouteKind,
    /// Device address, for Bluetooth endpoints
    pub address: Option<String>,
}

impl PreferredDevice {
    /// A preferred local (non-Bluetooth) endpoint
    pub fn local(kind: RouteKind) -> Self {
        Self {
            kind,
            address: None,
        }
    }

    /// A preferred Bluetooth endpoint
    pub fn bluetooth(kind: RouteKind, address: impl Into<String>) -> Self {
        Self {
            kind,
            address: Some(address.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_falls_back_to_address() {
        let anon = BluetoothDevice::new("AA:BB");
        assert_eq!(anon.display_name(), "AA:BB");

        let named = BluetoothDevice::named("AA:BB", "Car Kit");
        assert_eq!(named.display_name(), "Car Kit");
    }
}
