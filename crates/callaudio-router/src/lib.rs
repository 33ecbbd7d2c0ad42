//! Call Audio Route Controller
//!
//! This crate provides the core state machine for selecting and switching
//! the active audio endpoint of a phone call — earpiece, wired headset,
//! speaker/dock, the Bluetooth transport classes, or a streaming endpoint —
//! in response to asynchronous hardware and policy events.
//!
//! # Architecture
//!
//! The controller keeps exactly one "current" route and tolerates the real
//! world's timing hazards with a pending-transition protocol:
//!
//! - **Registry**: the routes currently materialized, with the mutually
//!   exclusive local slots and insertion-ordered Bluetooth devices
//! - **Pending transition**: the window between requesting a switch and the
//!   destination confirming, with override-while-pending and optimistic
//!   commit on timeout
//! - **Fallback selector**: materializes "any available route" from the
//!   platform preference, the most recent Bluetooth device, or the local
//!   slots
//! - **Snapshot**: the immutable audio state replaced wholesale on every
//!   committed change
//!
//! # Channel-Based Architecture
//!
//! All inbound events are serialized through one command channel into the
//! actor ([`run_route_actor`]); observers consume a single ordered
//! [`AudioRouteEvent`] stream. The synchronous [`RouteEngine`] underneath is
//! directly testable without a runtime.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use callaudio_router::{RouteEngine, RouterConfig, RouteEvent};
//! use callaudio_platform::{FocusType, RouteClass};
//! use callaudio_sim::{VirtualAudioPlatform, VirtualBluetoothStack};
//!
//! let mut engine = RouteEngine::new(
//!     Arc::new(VirtualAudioPlatform::new()),
//!     Arc::new(VirtualBluetoothStack::new()),
//!     RouterConfig::default(),
//! );
//!
//! engine.apply(RouteEvent::FocusChanged { focus: FocusType::Active });
//! assert_eq!(engine.snapshot().route_class, RouteClass::Earpiece);
//! ```

pub mod actor;
pub mod engine;
pub mod error;
pub mod events;
pub mod pending;
pub mod registry;
pub mod snapshot;

// Re-export actor types
pub use actor::{run_route_actor, RouteActorCommand};

// Re-export engine types
pub use engine::{PendingSummary, RouteDiagnostics, RouteEngine, RouterConfig};
pub use error::RouterError;
pub use events::{AudioRouteEvent, RouteEvent, SwitchOrigin, SwitchTarget};
pub use pending::PendingTransition;
pub use registry::RouteRegistry;
pub use snapshot::StateSnapshot;
