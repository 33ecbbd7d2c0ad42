//! Live route registry
//!
//! Tracks which routes are currently materialized: the two mutually
//! exclusive local slots (earpiece XOR wired headset, speaker XOR dock), the
//! insertion-ordered Bluetooth routes with their backing device handles, and
//! the general availability set. While forced-streaming mode holds, a
//! disjoint streaming set overrides availability without disturbing the
//! normal sets.

use callaudio_platform::{
    BluetoothDevice, PlatformCapabilities, PreferredDevice, Route, RouteKind,
};
use tracing::debug;

/// The collections of currently available routes
#[derive(Debug, Default)]
pub struct RouteRegistry {
    /// Earpiece or wired headset; the two never coexist
    handset: Option<Route>,
    /// Speaker or dock; the two never coexist
    loudspeaker: Option<Route>,
    /// Bluetooth routes in insertion order (last added = most recent)
    bluetooth: Vec<(Route, BluetoothDevice)>,
    /// General availability set, insertion ordered
    available: Vec<Route>,
    /// Streaming override set, only consulted while `streaming_mode`
    streaming: Vec<Route>,
    /// Whether forced-streaming mode currently overrides availability
    streaming_mode: bool,
}

impl RouteRegistry {
    /// Build the initial registry from detected hardware
    pub fn new(caps: PlatformCapabilities) -> Self {
        let mut registry = RouteRegistry::default();

        let handset = if caps.wired_headset {
            Some(Route::wired_headset())
        } else if caps.earpiece {
            Some(Route::earpiece())
        } else {
            None
        };
        registry.replace_handset(handset);
        registry.replace_loudspeaker(Some(Route::speaker()));

        registry
    }

    /// Whether the route can be switched to right now
    pub fn is_available(&self, route: &Route) -> bool {
        if self.streaming_mode {
            self.streaming.contains(route)
        } else {
            self.available.contains(route)
        }
    }

    /// The route in the handset slot (earpiece or wired headset)
    pub fn handset(&self) -> Option<&Route> {
        self.handset.as_ref()
    }

    /// The route in the loudspeaker slot (speaker or dock)
    pub fn loudspeaker(&self) -> Option<&Route> {
        self.loudspeaker.as_ref()
    }

    /// Replace the handset slot, returning the displaced route
    pub fn replace_handset(&mut self, route: Option<Route>) -> Option<Route> {
        let old = self.handset.take();
        if let Some(old) = &old {
            self.available.retain(|r| r != old);
        }
        if let Some(route) = route {
            self.available.push(route.clone());
            self.handset = Some(route);
        }
        old
    }

    /// Replace the loudspeaker slot, returning the displaced route
    pub fn replace_loudspeaker(&mut self, route: Option<Route>) -> Option<Route> {
        let old = self.loudspeaker.take();
        if let Some(old) = &old {
            self.available.retain(|r| r != old);
        }
        if let Some(route) = route {
            self.available.push(route.clone());
            self.loudspeaker = Some(route);
        }
        old
    }

    /// Register a Bluetooth route with its backing device
    ///
    /// Returns false (and changes nothing) if the route is already present.
    pub fn add_bluetooth(&mut self, route: Route, device: BluetoothDevice) -> bool {
        if self.bluetooth.iter().any(|(r, _)| *r == route) {
            debug!("Bluetooth route already registered: {}", route);
            return false;
        }
        self.available.push(route.clone());
        self.bluetooth.push((route, device));
        true
    }

    /// Remove the Bluetooth route for a device address
    pub fn remove_bluetooth(&mut self, address: &str) -> Option<(Route, BluetoothDevice)> {
        let idx = self
            .bluetooth
            .iter()
            .position(|(r, _)| r.address() == Some(address))?;
        let (route, device) = self.bluetooth.remove(idx);
        self.available.retain(|r| *r != route);
        Some((route, device))
    }

    /// The Bluetooth route for a device address
    pub fn bluetooth_route(&self, address: &str) -> Option<&Route> {
        self.bluetooth
            .iter()
            .find(|(r, _)| r.address() == Some(address))
            .map(|(r, _)| r)
    }

    /// The device handle backing a Bluetooth route
    pub fn device_for(&self, route: &Route) -> Option<&BluetoothDevice> {
        self.bluetooth
            .iter()
            .find(|(r, _)| r == route)
            .map(|(_, d)| d)
    }

    /// The most recently added Bluetooth route, optionally skipping one address
    pub fn most_recent_bluetooth(&self, exclude_address: Option<&str>) -> Option<&Route> {
        self.bluetooth
            .iter()
            .rev()
            .find(|(r, _)| exclude_address.map_or(true, |ex| r.address() != Some(ex)))
            .map(|(r, _)| r)
    }

    /// The most recently added Bluetooth route of one transport class
    pub fn most_recent_bluetooth_of_kind(&self, kind: RouteKind) -> Option<&Route> {
        self.bluetooth
            .iter()
            .rev()
            .find(|(r, _)| r.kind() == kind)
            .map(|(r, _)| r)
    }

    /// All registered Bluetooth device handles, in insertion order
    pub fn bluetooth_devices(&self) -> Vec<BluetoothDevice> {
        self.bluetooth.iter().map(|(_, d)| d.clone()).collect()
    }

    /// Number of registered Bluetooth routes
    pub fn bluetooth_count(&self) -> usize {
        self.bluetooth.len()
    }

    /// The general availability set (ignores the streaming override)
    pub fn available_routes(&self) -> &[Route] {
        &self.available
    }

    /// Enter forced-streaming mode: only `route` is reachable
    pub fn enter_streaming(&mut self, route: Route) {
        self.streaming = vec![route];
        self.streaming_mode = true;
    }

    /// Leave forced-streaming mode, restoring normal availability
    pub fn exit_streaming(&mut self) {
        self.streaming.clear();
        self.streaming_mode = false;
    }

    /// Whether forced-streaming mode currently holds
    pub fn streaming_mode(&self) -> bool {
        self.streaming_mode
    }

    /// Map the platform's preferred device onto a materialized route
    pub fn resolve_preferred(&self, pref: &PreferredDevice) -> Option<Route> {
        if pref.kind.is_bluetooth() {
            let address = pref.address.as_deref()?;
            return self.bluetooth_route(address).cloned();
        }
        for slot in [self.handset.as_ref(), self.loudspeaker.as_ref()] {
            if let Some(route) = slot {
                if route.kind() == pref.kind {
                    return Some(route.clone());
                }
            }
        }
        None
    }
}
