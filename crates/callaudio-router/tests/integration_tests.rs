//! Integration tests for the call audio route controller
//!
//! These tests verify end-to-end behavior of the route engine including:
//! - Registry maintenance under device churn
//! - The pending-transition protocol (idempotence, override, timeout)
//! - Fallback selection determinism and preference order
//! - Focus-driven activation and in-band ringing rules
//! - Mute, streaming mode, and collaborator failure degradation

use std::sync::Arc;

use callaudio_platform::{
    BluetoothDevice, FocusType, PreferredDevice, Route, RouteClass, RouteKind,
};
use callaudio_router::{
    AudioRouteEvent, RouteEngine, RouteEvent, RouterConfig, SwitchOrigin, SwitchTarget,
};
use callaudio_sim::{PlatformCommand, VirtualAudioPlatform, VirtualBluetoothStack};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub const DEVICE_A: &str = "AA:BB:CC:DD:EE:01";
    pub const DEVICE_B: &str = "AA:BB:CC:DD:EE:02";
    pub const DEVICE_C: &str = "AA:BB:CC:DD:EE:03";

    /// Create an engine over fresh virtual collaborators
    pub fn engine() -> (
        RouteEngine,
        Arc<VirtualAudioPlatform>,
        Arc<VirtualBluetoothStack>,
    ) {
        let platform = Arc::new(VirtualAudioPlatform::new());
        let bluetooth = Arc::new(VirtualBluetoothStack::new());
        let engine = RouteEngine::new(
            platform.clone(),
            bluetooth.clone(),
            RouterConfig::default(),
        );
        (engine, platform, bluetooth)
    }

    /// The SCO route for an address
    pub fn sco(address: &str) -> Route {
        Route::bluetooth(RouteKind::BluetoothSco, address).unwrap()
    }

    /// Register an SCO device
    pub fn add_device(engine: &mut RouteEngine, address: &str) {
        engine.apply(RouteEvent::BluetoothDeviceAdded {
            kind: RouteKind::BluetoothSco,
            device: BluetoothDevice::new(address),
        });
    }

    /// Apply an active-call focus and confirm any Bluetooth destination
    pub fn go_active_on(engine: &mut RouteEngine, address: &str) {
        engine.apply(RouteEvent::FocusChanged {
            focus: FocusType::Active,
        });
        engine.apply(RouteEvent::BluetoothAudioConnected {
            address: address.to_string(),
        });
    }

    /// Count committed route changes in an event batch
    pub fn count_commits(events: &[AudioRouteEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, AudioRouteEvent::RouteChanged { .. }))
            .count()
    }

    /// Count opened pending transitions in an event batch
    pub fn count_pending_started(events: &[AudioRouteEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, AudioRouteEvent::PendingStarted { .. }))
            .count()
    }

    /// Count snapshot replacements in an event batch
    pub fn count_snapshots(events: &[AudioRouteEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, AudioRouteEvent::SnapshotReplaced { .. }))
            .count()
    }

    /// The last snapshot published in an event batch
    pub fn last_snapshot(events: &[AudioRouteEvent]) -> Option<&callaudio_router::StateSnapshot> {
        events.iter().rev().find_map(|e| e.snapshot())
    }

    /// Check if events contain a commit onto a specific route
    pub fn has_commit_to(events: &[AudioRouteEvent], route: &Route) -> bool {
        events.iter().any(|e| {
            matches!(
                e,
                AudioRouteEvent::RouteChanged { to, .. } if to == route
            )
        })
    }
}

// ============================================================================
// Registry Tests
// ============================================================================

mod registry_tests {
    use super::helpers::*;
    use super::*;

    #[test]
    fn wired_connect_disconnect_leaves_no_residue() {
        let (mut engine, _, _) = engine();

        engine.apply(RouteEvent::WiredHeadsetConnected);
        engine.apply(RouteEvent::WiredHeadsetDisconnected);

        let available = engine.diagnostics().available;
        assert!(!available.contains(&Route::wired_headset()));
        assert!(available.contains(&Route::earpiece()));
        assert_eq!(
            available.iter().filter(|r| **r == Route::earpiece()).count(),
            1
        );
    }

    #[test]
    fn wired_replaces_earpiece_in_handset_slot() {
        let (mut engine, _, _) = engine();

        engine.apply(RouteEvent::WiredHeadsetConnected);

        let available = engine.diagnostics().available;
        assert!(available.contains(&Route::wired_headset()));
        assert!(!available.contains(&Route::earpiece()));
    }

    #[test]
    fn dock_replaces_speaker_and_restores_it() {
        let (mut engine, _, _) = engine();

        engine.apply(RouteEvent::DockConnected);
        assert!(engine.diagnostics().available.contains(&Route::dock()));
        assert!(!engine.diagnostics().available.contains(&Route::speaker()));

        engine.apply(RouteEvent::DockDisconnected);
        assert!(!engine.diagnostics().available.contains(&Route::dock()));
        assert!(engine.diagnostics().available.contains(&Route::speaker()));
    }

    #[test]
    fn duplicate_bluetooth_add_is_idempotent() {
        let (mut engine, _, _) = engine();

        add_device(&mut engine, DEVICE_A);
        let first = engine.drain_events();
        assert_eq!(count_snapshots(&first), 1);

        add_device(&mut engine, DEVICE_A);
        let second = engine.drain_events();
        assert!(second.is_empty());
    }

    #[test]
    fn removing_unregistered_device_is_noop() {
        let (mut engine, _, _) = engine();

        engine.apply(RouteEvent::BluetoothDeviceRemoved {
            kind: RouteKind::BluetoothSco,
            address: DEVICE_A.to_string(),
        });

        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn snapshot_lists_bluetooth_devices_in_registration_order() {
        let (mut engine, _, _) = engine();

        add_device(&mut engine, DEVICE_A);
        add_device(&mut engine, DEVICE_B);

        let addresses: Vec<_> = engine
            .snapshot()
            .available_bluetooth
            .iter()
            .map(|d| d.address.clone())
            .collect();
        assert_eq!(addresses, vec![DEVICE_A.to_string(), DEVICE_B.to_string()]);
    }
}

// ============================================================================
// Pending Transition Tests
// ============================================================================

mod pending_tests {
    use super::helpers::*;
    use super::*;

    #[test]
    fn repeated_request_opens_one_transition() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);
        engine.drain_events();

        engine.request_route(true, sco(DEVICE_A));
        engine.request_route(true, sco(DEVICE_A));

        let events = engine.drain_events();
        assert_eq!(count_pending_started(&events), 1);
        assert_eq!(count_snapshots(&events), 0);
        assert!(engine.has_pending());
    }

    #[test]
    fn override_commits_exactly_once() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);
        add_device(&mut engine, DEVICE_B);
        engine.drain_events();

        engine.request_route(true, sco(DEVICE_A));
        engine.request_route(true, sco(DEVICE_B));

        // A late confirmation for the abandoned destination must not close
        // the transition.
        engine.apply(RouteEvent::BluetoothAudioConnected {
            address: DEVICE_A.to_string(),
        });
        assert!(engine.has_pending());

        engine.apply(RouteEvent::BluetoothAudioConnected {
            address: DEVICE_B.to_string(),
        });

        let events = engine.drain_events();
        assert_eq!(count_commits(&events), 1);
        assert!(has_commit_to(&events, &sco(DEVICE_B)));
        assert_eq!(engine.current_route(), &sco(DEVICE_B));
    }

    #[test]
    fn override_reanchors_origin_to_previous_destination() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);
        add_device(&mut engine, DEVICE_B);
        engine.drain_events();

        engine.request_route(true, sco(DEVICE_A));
        engine.request_route(true, sco(DEVICE_B));

        let diag = engine.diagnostics();
        let pending = diag.pending.expect("transition should be open");
        assert_eq!(pending.origin, sco(DEVICE_A));
        assert_eq!(pending.dest, sco(DEVICE_B));
    }

    #[test]
    fn timeout_commits_pending_destination_exactly_once() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);
        engine.drain_events();

        engine.request_route(true, sco(DEVICE_A));
        assert!(engine.pending_deadline().is_some());

        engine.apply(RouteEvent::PendingTimeout);

        let events = engine.drain_events();
        assert_eq!(count_commits(&events), 1);
        assert_eq!(engine.current_route(), &sco(DEVICE_A));
        assert!(engine.pending_deadline().is_none());

        // A stale timer firing after commit changes nothing.
        engine.apply(RouteEvent::PendingTimeout);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn confirmation_after_commit_is_ignored() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);
        engine.drain_events();

        engine.request_route(true, sco(DEVICE_A));
        engine.apply(RouteEvent::PendingTimeout);
        engine.drain_events();

        engine.apply(RouteEvent::BluetoothAudioConnected {
            address: DEVICE_A.to_string(),
        });

        assert!(engine.drain_events().is_empty());
        assert_eq!(engine.current_route(), &sco(DEVICE_A));
    }

    #[test]
    fn exit_pending_force_closes() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);
        engine.drain_events();

        engine.request_route(true, sco(DEVICE_A));
        engine.apply(RouteEvent::ExitPending);

        assert!(!engine.has_pending());
        assert_eq!(engine.current_route(), &sco(DEVICE_A));
    }

    #[test]
    fn vanished_current_route_anchors_on_invalid_origin() {
        let (mut engine, _, _) = engine();
        engine.apply(RouteEvent::WiredHeadsetConnected);
        engine.drain_events();
        assert_eq!(engine.current_route(), &Route::wired_headset());

        engine.apply(RouteEvent::WiredHeadsetDisconnected);

        let events = engine.drain_events();
        let commit = events.iter().find_map(|e| match e {
            AudioRouteEvent::RouteChanged { from, to, .. } => Some((from.clone(), to.clone())),
            _ => None,
        });
        let (from, to) = commit.expect("fallback should commit");
        assert!(from.is_invalid());
        assert_eq!(to, Route::earpiece());
    }
}

// ============================================================================
// Fallback Selector Tests
// ============================================================================

mod fallback_tests {
    use super::helpers::*;
    use super::*;

    #[test]
    fn selection_is_deterministic() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);
        add_device(&mut engine, DEVICE_B);

        let first = engine.select_base_route(true, None);
        let second = engine.select_base_route(true, None);

        assert_eq!(first, second);
    }

    #[test]
    fn preferred_device_wins() {
        let (mut engine, platform, _) = engine();
        add_device(&mut engine, DEVICE_A);
        add_device(&mut engine, DEVICE_B);
        platform.set_preferred(Some(PreferredDevice::bluetooth(
            RouteKind::BluetoothSco,
            DEVICE_A,
        )));

        assert_eq!(engine.select_base_route(true, None), Some(sco(DEVICE_A)));
    }

    #[test]
    fn unresolvable_preference_falls_through() {
        let (mut engine, platform, _) = engine();
        add_device(&mut engine, DEVICE_A);
        platform.set_preferred(Some(PreferredDevice::bluetooth(
            RouteKind::BluetoothSco,
            DEVICE_C,
        )));

        assert_eq!(engine.select_base_route(true, None), Some(sco(DEVICE_A)));
    }

    #[test]
    fn last_registered_bluetooth_wins() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);
        add_device(&mut engine, DEVICE_B);

        assert_eq!(engine.select_base_route(true, None), Some(sco(DEVICE_B)));
        assert_eq!(
            engine.select_base_route(true, Some(DEVICE_B)),
            Some(sco(DEVICE_A))
        );
    }

    #[test]
    fn bluetooth_excluded_when_not_included() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);

        assert_eq!(
            engine.select_base_route(false, None),
            Some(Route::earpiece())
        );
    }

    #[test]
    fn handset_preferred_over_loudspeaker() {
        let (engine, _, _) = engine();
        assert_eq!(engine.select_base_route(true, None), Some(Route::earpiece()));
    }

    #[test]
    fn streaming_mode_yields_no_base_route() {
        let (mut engine, _, _) = engine();
        engine.apply(RouteEvent::StreamingEnabled);

        assert_eq!(engine.select_base_route(true, None), None);
    }
}

// ============================================================================
// Focus Tests
// ============================================================================

mod focus_tests {
    use super::helpers::*;
    use super::*;

    #[test]
    fn active_focus_activates_base_route() {
        let (mut engine, platform, _) = engine();

        engine.apply(RouteEvent::FocusChanged {
            focus: FocusType::Active,
        });

        assert!(engine.is_active());
        assert_eq!(engine.current_route(), &Route::earpiece());
        assert!(platform
            .take_commands()
            .contains(&PlatformCommand::Activate(Route::earpiece())));
    }

    #[test]
    fn losing_focus_releases_without_switching() {
        let (mut engine, platform, _) = engine();
        engine.apply(RouteEvent::FocusChanged {
            focus: FocusType::Active,
        });
        platform.take_commands();

        engine.apply(RouteEvent::FocusChanged {
            focus: FocusType::None,
        });

        assert!(!engine.is_active());
        assert_eq!(engine.current_route(), &Route::earpiece());
        assert!(platform
            .take_commands()
            .contains(&PlatformCommand::Release(Route::earpiece())));
    }

    #[test]
    fn ringing_on_non_inband_bluetooth_stays_silent() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);

        engine.apply(RouteEvent::FocusChanged {
            focus: FocusType::Ringing,
        });

        // No audio channel is requested, so the switch commits immediately.
        assert!(!engine.is_active());
        assert_eq!(engine.current_route(), &sco(DEVICE_A));
    }

    #[test]
    fn ringing_on_inband_bluetooth_activates() {
        let (mut engine, _, bluetooth) = engine();
        add_device(&mut engine, DEVICE_A);
        bluetooth.set_inband_ringing(DEVICE_A, true);

        engine.apply(RouteEvent::FocusChanged {
            focus: FocusType::Ringing,
        });

        assert!(engine.has_pending());
        engine.apply(RouteEvent::BluetoothAudioConnected {
            address: DEVICE_A.to_string(),
        });
        assert!(engine.is_active());
        assert_eq!(engine.current_route(), &sco(DEVICE_A));
    }

    #[test]
    fn ringing_while_active_on_non_inband_bluetooth_drops_activation() {
        let (mut engine, _, bluetooth) = engine();
        add_device(&mut engine, DEVICE_A);
        go_active_on(&mut engine, DEVICE_A);
        assert!(engine.is_active());
        bluetooth.take_commands();

        engine.apply(RouteEvent::FocusChanged {
            focus: FocusType::Ringing,
        });

        assert!(!engine.is_active());
        assert_eq!(engine.current_route(), &sco(DEVICE_A));
    }
}

// ============================================================================
// Scenario Tests
// ============================================================================

mod scenario_tests {
    use super::helpers::*;
    use super::*;

    #[test]
    fn wired_headset_connects_while_speaker_active() {
        let (mut engine, _, _) = engine();
        engine.apply(RouteEvent::FocusChanged {
            focus: FocusType::Active,
        });
        engine.apply(RouteEvent::SwitchRequested {
            target: SwitchTarget::Speaker,
            origin: SwitchOrigin::User,
        });
        engine.apply(RouteEvent::MuteOn);
        let before = engine.snapshot().supported;
        engine.drain_events();

        engine.apply(RouteEvent::WiredHeadsetConnected);

        let events = engine.drain_events();
        assert!(has_commit_to(&events, &Route::wired_headset()));
        assert!(engine.is_active());

        let snapshot = last_snapshot(&events).expect("snapshot should replace");
        assert_eq!(snapshot.route_class, RouteClass::WiredHeadset);
        assert!(snapshot.muted);
        assert_eq!(snapshot.supported, before);
    }

    #[test]
    fn non_inband_device_becomes_active_while_ringing() {
        let (mut engine, _, bluetooth) = engine();
        add_device(&mut engine, DEVICE_A);
        bluetooth.set_inband_ringing(DEVICE_A, true);

        engine.apply(RouteEvent::FocusChanged {
            focus: FocusType::Ringing,
        });
        engine.apply(RouteEvent::BluetoothAudioConnected {
            address: DEVICE_A.to_string(),
        });
        assert!(engine.is_active());

        // Device B appears and the platform selects it; it cannot ring
        // in-band, so the ring continues locally.
        add_device(&mut engine, DEVICE_B);
        engine.apply(RouteEvent::BluetoothActiveDevicePresent {
            kind: RouteKind::BluetoothSco,
            address: Some(DEVICE_B.to_string()),
        });

        assert_eq!(engine.current_route(), &sco(DEVICE_B));
        assert!(!engine.is_active());
    }

    #[test]
    fn bluetooth_switch_times_out_and_commits_anyway() {
        let (mut engine, _, bluetooth) = engine();
        add_device(&mut engine, DEVICE_A);
        engine.apply(RouteEvent::FocusChanged {
            focus: FocusType::Active,
        });
        assert!(engine.has_pending());
        assert_eq!(bluetooth.last_connect(), Some(DEVICE_A.to_string()));
        engine.drain_events();

        engine.apply(RouteEvent::PendingTimeout);

        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, AudioRouteEvent::PendingTimedOut { .. })));
        assert_eq!(engine.current_route(), &sco(DEVICE_A));
        assert!(!engine.has_pending());
    }
}

// ============================================================================
// Hardware / Membership Tests
// ============================================================================

mod hardware_tests {
    use super::helpers::*;
    use super::*;

    #[test]
    fn removing_in_use_device_falls_back() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);
        go_active_on(&mut engine, DEVICE_A);
        engine.drain_events();

        engine.apply(RouteEvent::BluetoothDeviceRemoved {
            kind: RouteKind::BluetoothSco,
            address: DEVICE_A.to_string(),
        });

        assert_eq!(engine.current_route(), &Route::earpiece());
        assert!(engine.is_active());
    }

    #[test]
    fn removing_idle_device_does_not_switch() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);
        add_device(&mut engine, DEVICE_B);
        go_active_on(&mut engine, DEVICE_B);
        engine.drain_events();

        engine.apply(RouteEvent::BluetoothDeviceRemoved {
            kind: RouteKind::BluetoothSco,
            address: DEVICE_A.to_string(),
        });

        assert_eq!(engine.current_route(), &sco(DEVICE_B));
    }

    #[test]
    fn active_device_gone_falls_back_excluding_it() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);
        go_active_on(&mut engine, DEVICE_A);
        engine.drain_events();

        engine.apply(RouteEvent::BluetoothActiveDeviceGone {
            kind: RouteKind::BluetoothSco,
        });

        assert_eq!(engine.current_route(), &Route::earpiece());
        assert!(engine.is_active());
    }

    #[test]
    fn audio_loss_on_current_route_falls_back() {
        let (mut engine, _, _) = engine();
        add_device(&mut engine, DEVICE_A);
        go_active_on(&mut engine, DEVICE_A);
        engine.drain_events();

        engine.apply(RouteEvent::BluetoothAudioDisconnected {
            address: DEVICE_A.to_string(),
        });

        assert_eq!(engine.current_route(), &Route::earpiece());
    }

    #[test]
    fn missing_descriptor_makes_connect_a_noop() {
        let (mut engine, platform, _) = engine();
        platform.set_device_missing(RouteKind::WiredHeadset, true);

        engine.apply(RouteEvent::WiredHeadsetConnected);

        assert!(engine.drain_events().is_empty());
        assert!(!engine
            .diagnostics()
            .available
            .contains(&Route::wired_headset()));
    }

    #[test]
    fn switch_to_unknown_bluetooth_device_reports_error() {
        let (mut engine, _, _) = engine();

        engine.apply(RouteEvent::SwitchRequested {
            target: SwitchTarget::Bluetooth {
                address: Some(DEVICE_C.to_string()),
            },
            origin: SwitchOrigin::User,
        });

        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, AudioRouteEvent::Error { .. })));
        assert_eq!(engine.current_route(), &Route::earpiece());
    }
}

// ============================================================================
// Mute Tests
// ============================================================================

mod mute_tests {
    use super::helpers::*;
    use super::*;

    #[test]
    fn toggle_cycles_and_publishes_each_change() {
        let (mut engine, platform, _) = engine();

        engine.apply(RouteEvent::MuteToggle);
        engine.apply(RouteEvent::MuteToggle);

        let events = engine.drain_events();
        assert_eq!(count_snapshots(&events), 2);
        assert!(!engine.snapshot().muted);
        assert_eq!(
            platform.take_commands(),
            vec![
                PlatformCommand::SetMute(true),
                PlatformCommand::SetMute(false)
            ]
        );
    }

    #[test]
    fn duplicate_mute_is_noop() {
        let (mut engine, _, _) = engine();

        engine.apply(RouteEvent::MuteOn);
        engine.drain_events();
        engine.apply(RouteEvent::MuteOn);

        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn external_change_skips_the_platform_command() {
        let (mut engine, platform, _) = engine();

        engine.apply(RouteEvent::MuteExternallyChanged { muted: true });

        assert!(engine.snapshot().muted);
        assert!(platform.take_commands().is_empty());
    }

    #[test]
    fn failed_mute_command_keeps_local_state() {
        let (mut engine, platform, _) = engine();
        platform.fail_next_command("audio service busy");

        engine.apply(RouteEvent::MuteOn);

        // Local state is optimistic; the failure surfaces as an event.
        assert!(engine.snapshot().muted);
        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, AudioRouteEvent::Error { .. })));
    }
}

// ============================================================================
// Streaming Tests
// ============================================================================

mod streaming_tests {
    use super::helpers::*;
    use super::*;

    #[test]
    fn enabling_streaming_takes_over_routing() {
        let (mut engine, _, _) = engine();

        engine.apply(RouteEvent::StreamingEnabled);

        assert_eq!(engine.current_route(), &Route::streaming());
        assert!(engine.is_active());
        assert_eq!(engine.snapshot().route_class, RouteClass::Streaming);
    }

    #[test]
    fn switches_are_dropped_while_streaming() {
        let (mut engine, _, _) = engine();
        engine.apply(RouteEvent::StreamingEnabled);
        engine.drain_events();

        engine.apply(RouteEvent::SwitchRequested {
            target: SwitchTarget::Speaker,
            origin: SwitchOrigin::User,
        });

        let events = engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, AudioRouteEvent::SwitchIgnored { .. })));
        assert_eq!(engine.current_route(), &Route::streaming());
    }

    #[test]
    fn disabling_streaming_restores_base_route() {
        let (mut engine, _, _) = engine();
        engine.apply(RouteEvent::StreamingEnabled);
        engine.drain_events();

        engine.apply(RouteEvent::StreamingDisabled);

        assert_eq!(engine.current_route(), &Route::earpiece());
        assert!(!engine.diagnostics().streaming_mode);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::helpers::*;
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn address() -> impl Strategy<Value = &'static str> {
        prop_oneof![Just(DEVICE_A), Just(DEVICE_B), Just(DEVICE_C)]
    }

    proptest! {
        #[test]
        fn wired_availability_matches_net_effect(plugged in prop::collection::vec(any::<bool>(), 1..12)) {
            let (mut engine, _, _) = engine();

            for &connect in &plugged {
                if connect {
                    engine.apply(RouteEvent::WiredHeadsetConnected);
                } else {
                    engine.apply(RouteEvent::WiredHeadsetDisconnected);
                }
            }

            let available = engine.diagnostics().available;
            let wired_present = *plugged.last().unwrap();
            prop_assert_eq!(available.contains(&Route::wired_headset()), wired_present);
            prop_assert_eq!(available.contains(&Route::earpiece()), !wired_present);

            // No duplicates ever accumulate.
            let unique: HashSet<_> = available.iter().collect();
            prop_assert_eq!(unique.len(), available.len());
        }

        #[test]
        fn bluetooth_membership_matches_net_effect(
            ops in prop::collection::vec((any::<bool>(), address()), 1..16)
        ) {
            let (mut engine, _, _) = engine();
            let mut model: HashSet<&str> = HashSet::new();

            for (add, addr) in &ops {
                if *add {
                    add_device(&mut engine, addr);
                    model.insert(addr);
                } else {
                    engine.apply(RouteEvent::BluetoothDeviceRemoved {
                        kind: RouteKind::BluetoothSco,
                        address: addr.to_string(),
                    });
                    model.remove(addr);
                }
            }

            let snapshot_addrs: HashSet<String> = engine
                .snapshot()
                .available_bluetooth
                .iter()
                .map(|d| d.address.clone())
                .collect();
            let model_addrs: HashSet<String> =
                model.iter().map(|a| a.to_string()).collect();
            prop_assert_eq!(snapshot_addrs, model_addrs);
        }

        #[test]
        fn repeated_requests_never_stack_transitions(repeats in 1usize..6) {
            let (mut engine, _, _) = engine();
            add_device(&mut engine, DEVICE_A);
            engine.drain_events();

            for _ in 0..repeats {
                engine.request_route(true, sco(DEVICE_A));
            }

            let events = engine.drain_events();
            prop_assert_eq!(count_pending_started(&events), 1);
        }

        #[test]
        fn fallback_is_stable_for_fixed_availability(
            devices in prop::collection::hash_set(address(), 0..3),
            include_bluetooth: bool
        ) {
            let (mut engine, _, _) = engine();
            for addr in &devices {
                add_device(&mut engine, addr);
            }

            let first = engine.select_base_route(include_bluetooth, None);
            let second = engine.select_base_route(include_bluetooth, None);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.is_some());
        }
    }
}
