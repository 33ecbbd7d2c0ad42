//! Virtual platform audio service
//!
//! Stands in for the platform audio collaborator. Commands are recorded for
//! inspection; queries are answered from a configurable script. The double
//! is freely shareable behind an `Arc` and interiorly locked, matching how
//! the controller holds its collaborators.

use std::collections::HashSet;
use std::sync::Mutex;

use callaudio_platform::{
    AudioPlatform, PlatformCapabilities, PlatformError, PreferredDevice, Route, RouteKind,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A recorded platform command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCommand {
    /// The route's device was bound as the communication endpoint
    Activate(Route),
    /// The binding for the route was released
    Release(Route),
    /// The microphone mute state was set
    SetMute(bool),
}

/// Configuration for creating a virtual platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualPlatformConfig {
    /// Capabilities reported at controller construction
    pub capabilities: PlatformCapabilities,
    /// Preferred device answer for the voice-communication strategy
    pub preferred: Option<PreferredDevice>,
}

impl Default for VirtualPlatformConfig {
    fn default() -> Self {
        Self {
            capabilities: PlatformCapabilities::default(),
            preferred: None,
        }
    }
}

#[derive(Debug, Default)]
struct PlatformState {
    capabilities: PlatformCapabilities,
    preferred: Option<PreferredDevice>,
    /// Kinds reported as having no hardware descriptor
    missing: HashSet<RouteKind>,
    /// The currently bound communication route, if any
    communication_route: Option<Route>,
    muted: bool,
    commands: Vec<PlatformCommand>,
    /// Message the next command fails with, if set
    fail_next: Option<String>,
}

/// A simulated platform audio service
#[derive(Debug)]
pub struct VirtualAudioPlatform {
    state: Mutex<PlatformState>,
}

impl VirtualAudioPlatform {
    /// Create a virtual platform with default capabilities
    pub fn new() -> Self {
        Self::with_config(VirtualPlatformConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(config: VirtualPlatformConfig) -> Self {
        Self {
            state: Mutex::new(PlatformState {
                capabilities: config.capabilities,
                preferred: config.preferred,
                ..PlatformState::default()
            }),
        }
    }

    /// Script the preferred-device answer
    pub fn set_preferred(&self, preferred: Option<PreferredDevice>) {
        self.state.lock().unwrap().preferred = preferred;
    }

    /// Mark a route kind as having no hardware descriptor
    pub fn set_device_missing(&self, kind: RouteKind, missing: bool) {
        let mut state = self.state.lock().unwrap();
        if missing {
            state.missing.insert(kind);
        } else {
            state.missing.remove(&kind);
        }
    }

    /// Make the next command fail with the given message
    pub fn fail_next_command(&self, message: impl Into<String>) {
        self.state.lock().unwrap().fail_next = Some(message.into());
    }

    /// Drain the recorded command log
    pub fn take_commands(&self) -> Vec<PlatformCommand> {
        std::mem::take(&mut self.state.lock().unwrap().commands)
    }

    /// The currently bound communication route
    pub fn communication_route(&self) -> Option<Route> {
        self.state.lock().unwrap().communication_route.clone()
    }

    /// The last applied mute state
    pub fn is_muted(&self) -> bool {
        self.state.lock().unwrap().muted
    }

    fn check_failure(state: &mut PlatformState) -> Result<(), PlatformError> {
        match state.fail_next.take() {
            Some(message) => Err(PlatformError::CommandRejected(message)),
            None => Ok(()),
        }
    }
}

impl Default for VirtualAudioPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioPlatform for VirtualAudioPlatform {
    fn capabilities(&self) -> PlatformCapabilities {
        self.state.lock().unwrap().capabilities
    }

    fn has_device(&self, kind: RouteKind) -> bool {
        !self.state.lock().unwrap().missing.contains(&kind)
    }

    fn preferred_voice_device(&self) -> Option<PreferredDevice> {
        self.state.lock().unwrap().preferred.clone()
    }

    fn activate(&self, route: &Route) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state)?;
        debug!("virtual platform activate {}", route);
        state.communication_route = Some(route.clone());
        state.commands.push(PlatformCommand::Activate(route.clone()));
        Ok(())
    }

    fn release(&self, route: &Route) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state)?;
        debug!("virtual platform release {}", route);
        if state.communication_route.as_ref() == Some(route) {
            state.communication_route = None;
        }
        state.commands.push(PlatformCommand::Release(route.clone()));
        Ok(())
    }

    fn set_mute(&self, muted: bool) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state)?;
        state.muted = muted;
        state.commands.push(PlatformCommand::SetMute(muted));
        Ok(())
    }
}
