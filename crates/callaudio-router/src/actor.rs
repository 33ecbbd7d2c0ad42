//! Route controller actor
//!
//! This module provides the async actor that owns a [`RouteEngine`]. All
//! inbound events are serialized through a single command channel and
//! applied one at a time, which is the correctness backbone of the
//! pending-transition protocol: overrides are well-defined because no two
//! events are ever handled concurrently.
//!
//! # Architecture
//!
//! The actor receives commands through a channel and emits events through
//! another. Whatever owns the platform subscriptions (Bluetooth receiver,
//! wired-headset detector, focus owner, UI) submits [`RouteEvent`]s; the
//! call-tracking collaborator and any direct observer consume the unified
//! [`AudioRouteEvent`] stream. The pending-transition deadline is an arm of
//! the actor's own select loop, so a timer firing observes consistent state
//! and can never race an override.
//!
//! # Example
//!
//! ```rust,ignore
//! use callaudio_router::actor::{run_route_actor, RouteActorCommand};
//! use tokio::sync::mpsc;
//!
//! let (cmd_tx, cmd_rx) = mpsc::channel(256);
//! let (event_tx, mut event_rx) = mpsc::channel(256);
//!
//! // Spawn the actor over a constructed engine
//! tokio::spawn(run_route_actor(engine, cmd_rx, event_tx));
//!
//! // Submit events and consume the unified stream
//! ```

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::engine::{RouteDiagnostics, RouteEngine};
use crate::events::{AudioRouteEvent, RouteEvent};
use crate::snapshot::StateSnapshot;

/// Commands sent to the route actor
#[derive(Debug)]
pub enum RouteActorCommand {
    /// Apply an inbound route event
    Event(RouteEvent),

    /// Query the current published snapshot
    QueryState {
        /// Channel to send back the snapshot
        response: oneshot::Sender<StateSnapshot>,
    },

    /// Query the structured diagnostics view
    QueryDiagnostics {
        /// Channel to send back the diagnostics
        response: oneshot::Sender<RouteDiagnostics>,
    },

    /// Shutdown the actor
    Shutdown,
}

/// Run the route controller actor
///
/// Consumes commands until the channel closes or [`RouteActorCommand::Shutdown`]
/// arrives. The engine's buffered observer events are forwarded on
/// `event_tx` after each application, preserving order.
pub async fn run_route_actor(
    mut engine: RouteEngine,
    mut cmd_rx: mpsc::Receiver<RouteActorCommand>,
    event_tx: mpsc::Sender<AudioRouteEvent>,
) {
    info!("route actor started");

    loop {
        let timeout = engine
            .pending_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()));

        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break; };
                match cmd {
                    RouteActorCommand::Event(event) => {
                        engine.apply(event);
                        forward_events(&mut engine, &event_tx).await;
                    }

                    RouteActorCommand::QueryState { response } => {
                        let _ = response.send(engine.snapshot().clone());
                    }

                    RouteActorCommand::QueryDiagnostics { response } => {
                        let _ = response.send(engine.diagnostics());
                    }

                    RouteActorCommand::Shutdown => {
                        info!("route actor shutting down");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(timeout.unwrap_or(Duration::from_secs(3600))), if timeout.is_some() => {
                engine.apply(RouteEvent::PendingTimeout);
                forward_events(&mut engine, &event_tx).await;
            }
        }
    }

    info!("route actor stopped");
}

/// Forward the engine's drained events, preserving order
async fn forward_events(engine: &mut RouteEngine, event_tx: &mpsc::Sender<AudioRouteEvent>) {
    for event in engine.drain_events() {
        let _ = event_tx.send(event).await;
    }
}
