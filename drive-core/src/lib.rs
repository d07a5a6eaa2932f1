//! Platform-agnostic control core for the dual-mode RC drive controller.
//!
//! The vehicle is driven either by a human through an RC transmitter
//! (Manual) or by an autonomous driver over a serial line (Auto). A third
//! transmitter channel picks the mode. This crate holds everything between
//! the pins and the peripherals, so it runs unchanged on the target and on
//! the host for testing.
//!
//! # Overview
//!
//! - [`pulse`]: interrupt-safe capture records ([`PulseChannel`])
//! - [`mode`]: mode-channel classification ([`ModeArbiter`])
//! - [`actuator`]: steering and drive pulse mapping with reversal protection ([`ActuatorMapper`])
//! - [`indicator`]: turn indicator blinking ([`IndicatorDriver`])
//! - [`output`]: hardware traits ([`PulseOutput`], [`IndicatorOutput`], [`StatusSink`])
//! - [`controller`]: the main cycle ([`VehicleController`])
//! - [`config`]: all tunables ([`ControllerConfig`])
//!
//! # Example
//!
//! ```rust
//! use drive_core::{
//!     ActuatorMapper, ControllerConfig, IndicatorDriver, IndicatorOutput, NullStatusSink,
//!     PulseChannel, PulseOutput, RcChannels, VehicleController,
//! };
//! use drive_proto::VehicleMode;
//!
//! struct Pwm(u16);
//! impl PulseOutput for Pwm {
//!     fn write_us(&mut self, width_us: u16) {
//!         self.0 = width_us;
//!     }
//! }
//!
//! struct Led;
//! impl IndicatorOutput for Led {
//!     fn set(&mut self, _on: bool) {}
//! }
//!
//! static STEERING: PulseChannel = PulseChannel::new();
//! static THROTTLE: PulseChannel = PulseChannel::new();
//! static MODE: PulseChannel = PulseChannel::new();
//!
//! let config = ControllerConfig::DEFAULT;
//! let rc = RcChannels { steering: &STEERING, throttle: &THROTTLE, mode: &MODE };
//! let mapper = ActuatorMapper::new(Pwm(0), Pwm(0), config);
//! let indicators = IndicatorDriver::new(Led, Led, &config);
//! let mut controller = VehicleController::new(rc, mapper, indicators, NullStatusSink);
//!
//! // Mode switch low selects Auto
//! MODE.on_edge(true, 0);
//! MODE.on_edge(false, 1_100);
//! controller.step(0);
//! assert_eq!(controller.mode(), VehicleMode::Auto);
//!
//! for &byte in b"E:180 D:F\n" {
//!     controller.feed_byte(byte);
//! }
//! controller.step(1);
//! assert_eq!(controller.output_state().steering_us, 1100);
//! assert_eq!(controller.output_state().drive_us, 1560);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Derive `defmt::Format` and log mode changes, failsafe trips
//!   and reversal dwells

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod actuator;
pub mod config;
pub mod controller;
pub mod indicator;
pub mod mode;
pub mod output;
pub mod pulse;

pub use actuator::{
    drive_pulse, manual_drive_pulse, manual_steering_pulse, steering_pulse, ActuatorMapper,
    AppliedPulses, OutputState, PendingDrive,
};
pub use config::{
    ConfigError, ControllerConfig, MODE_THRESHOLD_US, RC_PULSE_MAX_US, RC_PULSE_MIN_US,
};
pub use controller::{RcChannels, VehicleController};
pub use indicator::{turn_for, IndicatorDriver, Turn};
pub use mode::{classify, ModeArbiter, ModeTransition};
pub use output::{IndicatorOutput, NullStatusSink, PulseOutput, StatusSink};
pub use pulse::PulseChannel;
