//! Call Audio Simulation Library
//!
//! This crate provides virtual platform collaborators for testing the route
//! controller without real hardware:
//!
//! - **VirtualAudioPlatform**: stands in for the platform audio service,
//!   recording every activate/release/mute command and answering capability
//!   and preferred-device queries from a configurable script
//! - **VirtualBluetoothStack**: stands in for the Bluetooth stack, recording
//!   audio connect/disconnect commands with a per-device in-band-ringing
//!   table and failure injection
//!
//! Confirmations are deliberately NOT generated here: the controller's
//! asynchronous confirmations arrive as inbound events, so tests decide
//! whether an acknowledgement comes promptly, late, or never.
//!
//! # Example
//!
//! ```rust
//! use callaudio_sim::{BluetoothCommand, VirtualBluetoothStack};
//! use callaudio_platform::BluetoothRoutes;
//!
//! let stack = VirtualBluetoothStack::new();
//! stack.set_inband_ringing("AA:BB", true);
//!
//! stack.connect_audio("AA:BB").unwrap();
//! assert_eq!(
//!     stack.take_commands(),
//!     vec![BluetoothCommand::ConnectAudio("AA:BB".to_string())]
//! );
//! ```

pub mod bluetooth;
pub mod platform;

pub use bluetooth::{BluetoothCommand, VirtualBluetoothConfig, VirtualBluetoothStack};
pub use platform::{PlatformCommand, VirtualAudioPlatform, VirtualPlatformConfig};
