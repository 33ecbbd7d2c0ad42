//! Route engine
//!
//! The synchronous core of the controller: applies one inbound event at a
//! time to the registry, the pending-transition protocol, and the published
//! snapshot. The engine owns no thread and performs no waiting; the actor in
//! [`crate::actor`] drives it and forwards the events it buffers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use callaudio_platform::{
    AudioPlatform, BluetoothDevice, BluetoothRoutes, FocusType, PlatformError, Route, RouteClass,
    RouteKind, RouteMask,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::RouterError;
use crate::events::{AudioRouteEvent, RouteEvent, SwitchOrigin, SwitchTarget};
use crate::pending::PendingTransition;
use crate::registry::RouteRegistry;
use crate::snapshot::StateSnapshot;

/// Route controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Deadline for a pending transition before optimistic commit (ms)
    pub pending_timeout_ms: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            pending_timeout_ms: 2000,
        }
    }
}

/// Summary of an open pending transition, for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct PendingSummary {
    /// Anchor origin route
    pub origin: Route,
    /// Anchor origin activation
    pub origin_active: bool,
    /// Pending destination route
    pub dest: Route,
    /// Pending destination activation
    pub dest_active: bool,
}

/// Structured view of the controller's internal state
#[derive(Debug, Clone, Serialize)]
pub struct RouteDiagnostics {
    /// The committed current route
    pub current: Route,
    /// Whether call audio is flowing
    pub active: bool,
    /// Microphone mute state
    pub muted: bool,
    /// The holding focus
    pub focus: FocusType,
    /// Whether forced-streaming mode overrides availability
    pub streaming_mode: bool,
    /// The open pending transition, if any
    pub pending: Option<PendingSummary>,
    /// The general availability set
    pub available: Vec<Route>,
}

/// The audio route state machine
pub struct RouteEngine {
    config: RouterConfig,
    platform: Arc<dyn AudioPlatform>,
    bluetooth: Arc<dyn BluetoothRoutes>,
    registry: RouteRegistry,
    /// The single committed current route
    current: Route,
    /// Whether call audio is flowing through the current route
    active: bool,
    muted: bool,
    focus: FocusType,
    supported: RouteMask,
    pending: Option<PendingTransition>,
    snapshot: StateSnapshot,
    event_buffer: Vec<AudioRouteEvent>,
}

impl RouteEngine {
    /// Construct an engine over the given collaborators
    ///
    /// Queries hardware capabilities once; the resulting supported-route
    /// mask is carried unchanged in every snapshot.
    pub fn new(
        platform: Arc<dyn AudioPlatform>,
        bluetooth: Arc<dyn BluetoothRoutes>,
        config: RouterConfig,
    ) -> Self {
        let caps = platform.capabilities();

        let mut supported = RouteMask::SPEAKER | RouteMask::BLUETOOTH;
        if caps.earpiece {
            supported |= RouteMask::EARPIECE;
        }
        if caps.wired_headset {
            supported |= RouteMask::WIRED_HEADSET;
        }

        let registry = RouteRegistry::new(caps);
        let current = registry
            .handset()
            .cloned()
            .unwrap_or_else(Route::speaker);

        let snapshot = StateSnapshot {
            muted: false,
            route_class: current.class().unwrap_or(RouteClass::Speaker),
            supported,
            active_bluetooth: None,
            available_bluetooth: Vec::new(),
        };

        info!("route controller initialized on {}", current);

        Self {
            config,
            platform,
            bluetooth,
            registry,
            current,
            active: false,
            muted: false,
            focus: FocusType::None,
            supported,
            pending: None,
            snapshot,
            event_buffer: Vec::new(),
        }
    }

    /// Apply one inbound event
    ///
    /// Every state transition of the controller goes through here, one event
    /// at a time; the actor guarantees no two applications overlap.
    pub fn apply(&mut self, event: RouteEvent) {
        debug!("applying {:?}", event);
        match event {
            RouteEvent::WiredHeadsetConnected => {
                self.handle_local_connected(RouteKind::WiredHeadset)
            }
            RouteEvent::WiredHeadsetDisconnected => {
                self.handle_local_disconnected(RouteKind::WiredHeadset)
            }
            RouteEvent::DockConnected => self.handle_local_connected(RouteKind::Dock),
            RouteEvent::DockDisconnected => self.handle_local_disconnected(RouteKind::Dock),
            RouteEvent::BluetoothDeviceAdded { kind, device } => {
                self.handle_bt_device_added(kind, device)
            }
            RouteEvent::BluetoothDeviceRemoved { kind, address } => {
                self.handle_bt_device_removed(kind, &address)
            }
            RouteEvent::BluetoothActiveDevicePresent { kind, address } => {
                self.handle_bt_active_present(kind, address.as_deref())
            }
            RouteEvent::BluetoothActiveDeviceGone { kind } => self.handle_bt_active_gone(kind),
            RouteEvent::BluetoothAudioConnected { address } => {
                self.handle_bt_audio_connected(&address)
            }
            RouteEvent::BluetoothAudioDisconnected { address } => {
                self.handle_bt_audio_disconnected(&address)
            }
            RouteEvent::SwitchRequested { target, origin } => {
                self.handle_switch_requested(target, origin)
            }
            RouteEvent::MuteOn => self.handle_mute(true, false),
            RouteEvent::MuteOff => self.handle_mute(false, false),
            RouteEvent::MuteToggle => self.handle_mute(!self.muted, false),
            RouteEvent::MuteExternallyChanged { muted } => self.handle_mute(muted, true),
            RouteEvent::FocusChanged { focus } => self.handle_focus_changed(focus),
            RouteEvent::StreamingEnabled => self.handle_streaming_enabled(),
            RouteEvent::StreamingDisabled => self.handle_streaming_disabled(),
            RouteEvent::PendingTimeout => self.handle_pending_timeout(),
            RouteEvent::ExitPending => self.handle_exit_pending(),
        }
    }

    // -------------------------------------------------------------------------
    // Hardware membership
    // -------------------------------------------------------------------------

    fn handle_local_connected(&mut self, kind: RouteKind) {
        if !self.platform.has_device(kind) {
            warn!("{} reported connected but platform has no descriptor", kind);
            return;
        }

        let route = match kind {
            RouteKind::WiredHeadset => Route::wired_headset(),
            RouteKind::Dock => Route::dock(),
            _ => return,
        };

        let displaced = match kind {
            RouteKind::WiredHeadset => {
                if self.registry.handset() == Some(&route) {
                    debug!("wired headset already materialized");
                    return;
                }
                self.registry.replace_handset(Some(route.clone()))
            }
            _ => {
                if self.registry.loudspeaker() == Some(&route) {
                    debug!("dock already materialized");
                    return;
                }
                self.registry.replace_loudspeaker(Some(route.clone()))
            }
        };

        info!("route available: {}", route);
        if let Some(displaced) = displaced {
            self.event_buffer
                .push(AudioRouteEvent::RouteRemoved { route: displaced });
        }
        self.event_buffer.push(AudioRouteEvent::RouteAdded {
            route: route.clone(),
        });
        self.publish_snapshot();

        self.request_route(self.active, route);
    }

    fn handle_local_disconnected(&mut self, kind: RouteKind) {
        let (departing, replacement) = match kind {
            RouteKind::WiredHeadset => {
                let replacement = self
                    .supported
                    .contains(RouteMask::EARPIECE)
                    .then(Route::earpiece);
                (Route::wired_headset(), replacement)
            }
            RouteKind::Dock => (Route::dock(), Some(Route::speaker())),
            _ => return,
        };

        let slot_holds_departing = match kind {
            RouteKind::WiredHeadset => self.registry.handset() == Some(&departing),
            _ => self.registry.loudspeaker() == Some(&departing),
        };
        if !slot_holds_departing {
            debug!("{} reported disconnected but was not materialized", kind);
            return;
        }

        match kind {
            RouteKind::WiredHeadset => self.registry.replace_handset(replacement.clone()),
            _ => self.registry.replace_loudspeaker(replacement.clone()),
        };

        info!("route removed: {}", departing);
        self.event_buffer.push(AudioRouteEvent::RouteRemoved {
            route: departing.clone(),
        });
        if let Some(replacement) = replacement {
            self.event_buffer
                .push(AudioRouteEvent::RouteAdded { route: replacement });
        }
        self.publish_snapshot();

        if self.route_in_use(&departing) {
            self.fall_back(None);
        }
    }

    fn handle_bt_device_added(&mut self, kind: RouteKind, device: BluetoothDevice) {
        let Some(route) = Route::bluetooth(kind, &device.address) else {
            warn!("bluetooth device added with non-bluetooth kind {}", kind);
            return;
        };

        if !self.registry.add_bluetooth(route.clone(), device) {
            return;
        }

        info!("route available: {}", route);
        self.event_buffer.push(AudioRouteEvent::RouteAdded { route });
        self.publish_snapshot();
    }

    fn handle_bt_device_removed(&mut self, kind: RouteKind, address: &str) {
        let Some((route, _device)) = self.registry.remove_bluetooth(address) else {
            debug!("bluetooth device removed but not registered: {}", address);
            return;
        };
        if route.kind() != kind {
            debug!(
                "bluetooth removal kind mismatch: registered {}, reported {}",
                route.kind(),
                kind
            );
        }

        info!("route removed: {}", route);
        self.event_buffer.push(AudioRouteEvent::RouteRemoved {
            route: route.clone(),
        });
        self.publish_snapshot();

        if self.route_in_use(&route) {
            self.fall_back(Some(address));
        }
    }

    fn handle_bt_active_present(&mut self, kind: RouteKind, address: Option<&str>) {
        let route = match address {
            Some(addr) => self.registry.bluetooth_route(addr).cloned(),
            None => self.registry.most_recent_bluetooth_of_kind(kind).cloned(),
        };
        let Some(route) = route else {
            warn!(
                "active device present for unregistered {} route ({:?})",
                kind, address
            );
            return;
        };

        let activate = self.activation_for(&route);
        self.request_route(activate, route);
    }

    fn handle_bt_active_gone(&mut self, kind: RouteKind) {
        let vacated = if let Some(pending) = &self.pending {
            (pending.dest.is_bluetooth() && pending.dest.kind() == kind)
                .then(|| pending.dest.clone())
        } else {
            (self.current.is_bluetooth() && self.current.kind() == kind)
                .then(|| self.current.clone())
        };

        let Some(vacated) = vacated else {
            debug!("active {} device gone; not in use", kind);
            return;
        };

        self.fall_back(vacated.address());
    }

    // -------------------------------------------------------------------------
    // Bluetooth audio confirmations
    // -------------------------------------------------------------------------

    fn handle_bt_audio_connected(&mut self, address: &str) {
        match &self.pending {
            Some(pending) if pending.matches_confirmation(address) => {
                debug!("bluetooth audio confirmed for {}", address);
                self.exit_pending();
            }
            Some(pending) => {
                // Late confirmation for an abandoned destination; the new
                // target is still awaited.
                debug!(
                    "bluetooth audio up for {} while pending on {}",
                    address, pending.dest
                );
            }
            None => {
                debug!("bluetooth audio up for {} with no pending transition", address);
            }
        }
    }

    fn handle_bt_audio_disconnected(&mut self, address: &str) {
        let lost_pending = self
            .pending
            .as_ref()
            .is_some_and(|p| p.matches_confirmation(address));
        let lost_current = self.pending.is_none()
            && self.active
            && self.current.is_bluetooth()
            && self.current.address() == Some(address);

        if !(lost_pending || lost_current) {
            debug!("bluetooth audio down for {}; not in use", address);
            return;
        }

        warn!("bluetooth audio lost on {}", address);
        self.fall_back(Some(address));
    }

    // -------------------------------------------------------------------------
    // Switch requests, mute, focus, streaming
    // -------------------------------------------------------------------------

    fn handle_switch_requested(&mut self, target: SwitchTarget, origin: SwitchOrigin) {
        match self.resolve_switch_target(&target) {
            Ok(route) => {
                match origin {
                    SwitchOrigin::User => info!("user requested switch to {}", route),
                    SwitchOrigin::Program => debug!("programmatic switch to {}", route),
                }
                let activate = self.activation_for(&route);
                self.request_route(activate, route);
            }
            Err(e) => {
                warn!("switch request dropped: {}", e);
                self.event_buffer.push(AudioRouteEvent::Error {
                    source: "Switch".to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    fn resolve_switch_target(&self, target: &SwitchTarget) -> Result<Route, RouterError> {
        match target {
            SwitchTarget::Earpiece | SwitchTarget::WiredHeadset => self
                .registry
                .handset()
                .cloned()
                .ok_or(RouterError::NoRouteAvailable),
            SwitchTarget::Speaker => self
                .registry
                .loudspeaker()
                .cloned()
                .ok_or(RouterError::NoRouteAvailable),
            SwitchTarget::Bluetooth {
                address: Some(address),
            } => self
                .registry
                .bluetooth_route(address)
                .cloned()
                .ok_or_else(|| RouterError::UnknownDevice(address.clone())),
            SwitchTarget::Bluetooth { address: None } => self
                .registry
                .most_recent_bluetooth(None)
                .cloned()
                .ok_or(RouterError::NoRouteAvailable),
            SwitchTarget::Baseline => self
                .select_base_route(true, None)
                .ok_or(RouterError::NoRouteAvailable),
        }
    }

    fn handle_mute(&mut self, muted: bool, external: bool) {
        if self.muted == muted {
            return;
        }
        self.muted = muted;
        info!("microphone {}", if muted { "muted" } else { "unmuted" });

        // An externally observed change is already applied platform-side.
        if !external {
            if let Err(e) = self.platform.set_mute(muted) {
                self.report_collaborator_error("AudioPlatform", e);
            }
        }
        self.publish_snapshot();
    }

    fn handle_focus_changed(&mut self, focus: FocusType) {
        let previous = std::mem::replace(&mut self.focus, focus);
        if previous == focus {
            return;
        }
        info!("audio focus: {} -> {}", previous.name(), focus.name());

        match focus {
            FocusType::None => {
                // Release route ownership without switching device.
                if self.active {
                    let current = self.current.clone();
                    self.request_route(false, current);
                }
            }
            FocusType::Active => {
                if !self.active {
                    match self.select_base_route(true, None) {
                        Some(base) => self.request_route(true, base),
                        None => warn!("active focus granted but no route available"),
                    }
                }
            }
            FocusType::Ringing => {
                if self.active {
                    // Keep the device, but a non-in-band headset must not
                    // hold the audio channel through the ring.
                    if self.ring_is_silent(&self.current.clone()) {
                        let current = self.current.clone();
                        self.request_route(false, current);
                    }
                } else {
                    match self.select_base_route(true, None) {
                        Some(base) => {
                            let silent = self.ring_is_silent(&base);
                            self.request_route(!silent, base);
                        }
                        None => warn!("ringing focus granted but no route available"),
                    }
                }
            }
        }
    }

    /// Whether ringing through `route` must stay local (no activation)
    fn ring_is_silent(&self, route: &Route) -> bool {
        match route.address() {
            Some(addr) if route.is_bluetooth() => !self.bluetooth.supports_inband_ringing(addr),
            _ => false,
        }
    }

    fn handle_streaming_enabled(&mut self) {
        if self.registry.streaming_mode() {
            debug!("streaming already forced");
            return;
        }
        let route = Route::streaming();
        self.registry.enter_streaming(route.clone());
        info!("forced streaming enabled");
        self.request_route(true, route);
    }

    fn handle_streaming_disabled(&mut self) {
        if !self.registry.streaming_mode() {
            debug!("streaming not forced");
            return;
        }
        self.registry.exit_streaming();
        info!("forced streaming disabled");
        self.fall_back(None);
    }

    // -------------------------------------------------------------------------
    // Pending transition protocol
    // -------------------------------------------------------------------------

    /// Request a switch to `dest` with the given activation
    ///
    /// Implements the pending-transition protocol: unreachable destinations
    /// are dropped, a matching request is idempotent, a request while a
    /// transition is open retargets it (re-anchoring origin to the previous
    /// destination), and a destination needing no external confirmation
    /// commits immediately.
    pub fn request_route(&mut self, active: bool, dest: Route) {
        if !self.registry.is_available(&dest) && dest.kind() != RouteKind::Streaming {
            debug!("ignoring request for unavailable route {}", dest);
            self.event_buffer
                .push(AudioRouteEvent::SwitchIgnored { requested: dest });
            return;
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.pending_timeout_ms);

        match &mut self.pending {
            None => {
                if dest == self.current && active == self.active {
                    debug!("no-op switch to {}", dest);
                    return;
                }
                // A current route that just vanished will never confirm
                // anything; anchor on the sentinel instead.
                let origin = if self.registry.is_available(&self.current) {
                    self.current.clone()
                } else {
                    Route::invalid()
                };
                let origin_active = self.active;
                self.pending = Some(PendingTransition::open(
                    origin.clone(),
                    origin_active,
                    dest.clone(),
                    active,
                    deadline,
                ));
                self.active = active;
                debug!("pending transition opened: {} -> {}", origin, dest);
                self.event_buffer.push(AudioRouteEvent::PendingStarted {
                    origin,
                    dest,
                    dest_active: active,
                });
            }
            Some(pending) => {
                if pending.matches_request(&dest, active) {
                    debug!("request already pending for {}", dest);
                    return;
                }
                pending.rebase(dest.clone(), active, deadline);
                let origin = pending.origin.clone();
                self.active = active;
                debug!("pending transition retargeted: {} -> {}", origin, dest);
                self.event_buffer.push(AudioRouteEvent::PendingRetargeted {
                    origin,
                    dest,
                    dest_active: active,
                });
            }
        }

        self.issue_device_commands();

        if self
            .pending
            .as_ref()
            .is_some_and(|p| !p.needs_confirmation())
        {
            self.exit_pending();
        }
    }

    /// Issue the platform/Bluetooth commands for the just-(re)opened pending
    /// transition; failures are logged and reported, never propagated
    fn issue_device_commands(&mut self) {
        let Some(pending) = &self.pending else { return };
        let origin = pending.origin.clone();
        let origin_active = pending.origin_active;
        let dest = pending.dest.clone();
        let dest_active = pending.dest_active;

        if origin.is_bluetooth() && origin_active && (origin != dest || !dest_active) {
            if let Some(addr) = origin.address() {
                if let Err(e) = self.bluetooth.disconnect_audio(addr) {
                    self.report_collaborator_error("Bluetooth", e);
                }
            }
        }

        let (source, result) = if dest_active {
            match dest.address() {
                Some(addr) if dest.is_bluetooth() => {
                    ("Bluetooth", self.bluetooth.connect_audio(addr))
                }
                _ => ("AudioPlatform", self.platform.activate(&dest)),
            }
        } else {
            ("AudioPlatform", self.platform.release(&dest))
        };
        if let Err(e) = result {
            self.report_collaborator_error(source, e);
        }
    }

    fn handle_pending_timeout(&mut self) {
        let Some(pending) = &self.pending else {
            debug!("stale pending timeout");
            return;
        };
        warn!(
            "pending transition to {} timed out; committing optimistically",
            pending.dest
        );
        self.event_buffer.push(AudioRouteEvent::PendingTimedOut {
            dest: pending.dest.clone(),
        });
        self.exit_pending();
    }

    fn handle_exit_pending(&mut self) {
        if self.pending.is_some() {
            info!("pending transition force-closed");
            self.exit_pending();
        } else {
            debug!("exit-pending with no open transition");
        }
    }

    /// Commit the pending destination as the current route
    fn exit_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let from = std::mem::replace(&mut self.current, pending.dest);
        self.active = pending.dest_active;
        info!(
            "route committed: {} -> {} (active={})",
            from, self.current, self.active
        );
        self.event_buffer.push(AudioRouteEvent::RouteChanged {
            from,
            to: self.current.clone(),
            active: self.active,
        });
        self.publish_snapshot();
    }

    // -------------------------------------------------------------------------
    // Fallback selection
    // -------------------------------------------------------------------------

    /// Choose a concrete route when a class of route must be materialized
    ///
    /// Preference order: the platform's preferred voice-communication
    /// device, the most recently added Bluetooth route (when included), the
    /// handset slot, the loudspeaker slot. Returns `None` only transiently
    /// during device churn.
    pub fn select_base_route(
        &self,
        include_bluetooth: bool,
        exclude_address: Option<&str>,
    ) -> Option<Route> {
        if let Some(pref) = self.platform.preferred_voice_device() {
            if let Some(route) = self.registry.resolve_preferred(&pref) {
                let excluded =
                    exclude_address.is_some() && route.address() == exclude_address;
                if !excluded && self.registry.is_available(&route) {
                    return Some(route);
                }
            }
        }

        if include_bluetooth {
            if let Some(route) = self.registry.most_recent_bluetooth(exclude_address) {
                if self.registry.is_available(route) {
                    return Some(route.clone());
                }
            }
        }

        let candidate = self
            .registry
            .handset()
            .or_else(|| self.registry.loudspeaker())?
            .clone();
        if self.registry.is_available(&candidate) {
            Some(candidate)
        } else {
            None
        }
    }

    /// Route to the fallback, excluding one Bluetooth address if the fall
    /// is away from a dying device
    fn fall_back(&mut self, exclude_address: Option<&str>) {
        match self.select_base_route(true, exclude_address) {
            Some(base) => self.request_route(self.active, base),
            None => warn!("no fallback route available"),
        }
    }

    /// The activation to request when switching to `route` under the
    /// current focus
    fn activation_for(&self, route: &Route) -> bool {
        if self.focus == FocusType::Ringing && self.ring_is_silent(route) {
            return false;
        }
        self.active
    }

    // -------------------------------------------------------------------------
    // Snapshot & observation
    // -------------------------------------------------------------------------

    /// Rebuild and, when distinct, publish the snapshot
    fn publish_snapshot(&mut self) {
        // The class never derives from the invalid sentinel; the previous
        // class stands until a real route commits.
        let route_class = self.current.class().unwrap_or(self.snapshot.route_class);
        let active_bluetooth = if self.current.is_bluetooth() {
            self.registry.device_for(&self.current).cloned()
        } else {
            None
        };

        let snapshot = StateSnapshot {
            muted: self.muted,
            route_class,
            supported: self.supported,
            active_bluetooth,
            available_bluetooth: self.registry.bluetooth_devices(),
        };

        if snapshot != self.snapshot {
            self.snapshot = snapshot.clone();
            self.event_buffer
                .push(AudioRouteEvent::SnapshotReplaced { snapshot });
        }
    }

    fn report_collaborator_error(&mut self, source: &str, err: PlatformError) {
        warn!("{} command failed: {}", source, err);
        self.event_buffer.push(AudioRouteEvent::Error {
            source: source.to_string(),
            message: err.to_string(),
        });
    }

    /// Whether `route` is the committed route or the pending destination
    fn route_in_use(&self, route: &Route) -> bool {
        match &self.pending {
            Some(pending) => pending.dest == *route,
            None => self.current == *route,
        }
    }

    /// Drain buffered observer events
    pub fn drain_events(&mut self) -> Vec<AudioRouteEvent> {
        std::mem::take(&mut self.event_buffer)
    }

    /// The last published snapshot
    pub fn snapshot(&self) -> &StateSnapshot {
        &self.snapshot
    }

    /// The committed current route
    pub fn current_route(&self) -> &Route {
        &self.current
    }

    /// Whether call audio is flowing
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a pending transition is open
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The open pending transition's deadline, if any
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.deadline())
    }

    /// The current configuration
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Structured state for diagnostics
    pub fn diagnostics(&self) -> RouteDiagnostics {
        RouteDiagnostics {
            current: self.current.clone(),
            active: self.active,
            muted: self.muted,
            focus: self.focus,
            streaming_mode: self.registry.streaming_mode(),
            pending: self.pending.as_ref().map(|p| PendingSummary {
                origin: p.origin.clone(),
                origin_active: p.origin_active,
                dest: p.dest.clone(),
                dest_active: p.dest_active,
            }),
            available: self.registry.available_routes().to_vec(),
        }
    }
}
