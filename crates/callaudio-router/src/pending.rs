//! Pending route transitions
//!
//! A [`PendingTransition`] covers the window between "a route switch was
//! requested" and "the new route is confirmed active". The engine holds at
//! most one, as an `Option`; opening a second while one is open is impossible
//! by construction because a new request retargets the open one instead.

use std::time::Instant;

use callaudio_platform::Route;

/// The in-flight window of a route switch
#[derive(Debug, Clone)]
pub struct PendingTransition {
    /// Route captured when the transition opened (or the invalid sentinel if
    /// that route had just vanished)
    pub origin: Route,
    /// Activation captured when the transition opened
    pub origin_active: bool,
    /// Requested destination route
    pub dest: Route,
    /// Requested destination activation
    pub dest_active: bool,
    /// When the transition times out and commits optimistically
    deadline: Instant,
}

impl PendingTransition {
    /// Open a transition from the captured origin to the requested destination
    pub fn open(
        origin: Route,
        origin_active: bool,
        dest: Route,
        dest_active: bool,
        deadline: Instant,
    ) -> Self {
        Self {
            origin,
            origin_active,
            dest,
            dest_active,
            deadline,
        }
    }

    /// Retarget an open transition to a new destination
    ///
    /// The origin is re-anchored to the previous destination so that a
    /// confirmation still in flight for the abandoned destination is matched
    /// against the anchor rather than mistaken for the new target. The
    /// deadline restarts.
    pub fn rebase(&mut self, dest: Route, dest_active: bool, deadline: Instant) {
        self.origin = std::mem::replace(&mut self.dest, dest);
        self.origin_active = self.dest_active;
        self.dest_active = dest_active;
        self.deadline = deadline;
    }

    /// Whether the requested (destination, activation) equals the pending one
    pub fn matches_request(&self, dest: &Route, dest_active: bool) -> bool {
        self.dest == *dest && self.dest_active == dest_active
    }

    /// Whether a Bluetooth audio confirmation for `address` closes this
    /// transition
    ///
    /// Confirmation is matched by device identity, not by request order: a
    /// late confirmation for an abandoned destination never matches.
    pub fn matches_confirmation(&self, address: &str) -> bool {
        self.dest.is_bluetooth() && self.dest.address() == Some(address)
    }

    /// Whether the destination needs an external confirmation before commit
    ///
    /// Exactly an activating Bluetooth destination waits (for its audio
    /// channel); every local route, and a Bluetooth selection without
    /// activation, has no asynchronous step and closes immediately.
    pub fn needs_confirmation(&self) -> bool {
        self.dest.is_bluetooth() && self.dest_active
    }

    /// The optimistic-commit deadline
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}
