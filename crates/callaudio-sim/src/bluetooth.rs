//! Virtual Bluetooth stack
//!
//! Stands in for the Bluetooth route collaborator. Audio channel commands
//! are recorded for inspection and never acknowledged from here: the tests
//! that drive the controller choose when (or whether) the corresponding
//! confirmation events arrive, which is exactly the timing hazard the
//! pending-transition protocol exists for.

use std::collections::HashMap;
use std::sync::Mutex;

use callaudio_platform::{BluetoothRoutes, PlatformError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A recorded Bluetooth stack command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BluetoothCommand {
    /// Audio channel bring-up was requested for the address
    ConnectAudio(String),
    /// Audio channel tear-down was requested for the address
    DisconnectAudio(String),
}

/// Configuration for creating a virtual Bluetooth stack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VirtualBluetoothConfig {
    /// Per-address in-band-ringing support
    pub inband_ringing: HashMap<String, bool>,
}

#[derive(Debug, Default)]
struct BluetoothState {
    inband_ringing: HashMap<String, bool>,
    commands: Vec<BluetoothCommand>,
    fail_next: Option<String>,
}

/// A simulated Bluetooth stack
#[derive(Debug, Default)]
pub struct VirtualBluetoothStack {
    state: Mutex<BluetoothState>,
}

impl VirtualBluetoothStack {
    /// Create a virtual stack with no devices scripted
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom configuration
    pub fn with_config(config: VirtualBluetoothConfig) -> Self {
        Self {
            state: Mutex::new(BluetoothState {
                inband_ringing: config.inband_ringing,
                ..BluetoothState::default()
            }),
        }
    }

    /// Script whether a device can ring in-band
    ///
    /// Unscripted devices report no in-band support.
    pub fn set_inband_ringing(&self, address: impl Into<String>, supported: bool) {
        self.state
            .lock()
            .unwrap()
            .inband_ringing
            .insert(address.into(), supported);
    }

    /// Make the next command fail with the given message
    pub fn fail_next_command(&self, message: impl Into<String>) {
        self.state.lock().unwrap().fail_next = Some(message.into());
    }

    /// Drain the recorded command log
    pub fn take_commands(&self) -> Vec<BluetoothCommand> {
        std::mem::take(&mut self.state.lock().unwrap().commands)
    }

    /// The address of the last audio bring-up request, if any
    pub fn last_connect(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .commands
            .iter()
            .rev()
            .find_map(|cmd| match cmd {
                BluetoothCommand::ConnectAudio(addr) => Some(addr.clone()),
                BluetoothCommand::DisconnectAudio(_) => None,
            })
    }

    fn check_failure(state: &mut BluetoothState) -> Result<(), PlatformError> {
        match state.fail_next.take() {
            Some(message) => Err(PlatformError::CommandRejected(message)),
            None => Ok(()),
        }
    }
}

impl BluetoothRoutes for VirtualBluetoothStack {
    fn connect_audio(&self, address: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state)?;
        debug!("virtual bluetooth connect audio {}", address);
        state
            .commands
            .push(BluetoothCommand::ConnectAudio(address.to_string()));
        Ok(())
    }

    fn disconnect_audio(&self, address: &str) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        Self::check_failure(&mut state)?;
        debug!("virtual bluetooth disconnect audio {}", address);
        state
            .commands
            .push(BluetoothCommand::DisconnectAudio(address.to_string()));
        Ok(())
    }

    fn supports_inband_ringing(&self, address: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .inband_ringing
            .get(address)
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inband_defaults_to_unsupported() {
        let stack = VirtualBluetoothStack::new();
        assert!(!stack.supports_inband_ringing("AA:BB"));

        stack.set_inband_ringing("AA:BB", true);
        assert!(stack.supports_inband_ringing("AA:BB"));
    }

    #[test]
    fn test_last_connect_skips_disconnects() {
        let stack = VirtualBluetoothStack::new();
        stack.connect_audio("AA:BB").unwrap();
        stack.disconnect_audio("AA:BB").unwrap();
        stack.connect_audio("CC:DD").unwrap();
        stack.disconnect_audio("CC:DD").unwrap();

        assert_eq!(stack.last_connect(), Some("CC:DD".to_string()));
    }

    #[test]
    fn test_failure_injection_hits_once() {
        let stack = VirtualBluetoothStack::new();
        stack.fail_next_command("stack busy");

        assert!(stack.connect_audio("AA:BB").is_err());
        assert!(stack.connect_audio("AA:BB").is_ok());
    }
}
