//! Serial line protocol for the dual-mode RC drive controller.
//!
//! This crate covers both directions of the text link between the vehicle
//! controller and the autonomous driver:
//!
//! - **Types**: [`AngleDomain`], [`Direction`], [`AutoCommand`], [`VehicleMode`]
//! - **Decoding**: [`LineDecoder`] assembles bytes into lines, [`decode_line`]
//!   turns a completed line into an [`AutoCommand`]
//! - **Serialization**: [`StatusLine`] and the [`Serialize`] trait for the
//!   outbound diagnostic lines
//!
//! # Inbound Format
//!
//! ```text
//! E:<angle> D:<dir>\n
//! ```
//!
//! - `angle` - signed decimal steering angle, clamped into the configured [`AngleDomain`]
//! - `dir` - `F` (forward), `B` (backward) or `S` (stop); anything else means stop
//! - An optional `\r` before the `\n` is ignored
//!
//! Lines missing either marker decode to the neutral fallback (domain
//! midpoint, stop). Lines longer than [`MAX_LINE_LENGTH`] bytes are dropped.
//!
//! # Outbound Format
//!
//! The only line a collaborating controller needs to parse is the mode
//! announcement, `MODE:AUTO` or `MODE:MANUAL`, sent once per mode change.
//! Everything else is advisory.
//!
//! # Examples
//!
//! ```
//! use drive_proto::{AngleDomain, Direction, LineDecoder, LineEvent};
//!
//! let mut decoder = LineDecoder::new(AngleDomain::FULL);
//! let mut commands = 0;
//! for &byte in b"E:75 D:F\r\n" {
//!     if let Some(LineEvent::Command(decoded)) = decoder.push_byte(byte) {
//!         assert!(decoded.is_valid());
//!         assert_eq!(decoded.command().steering_angle, 75);
//!         assert_eq!(decoded.command().direction, Direction::Forward);
//!         commands += 1;
//!     }
//! }
//! assert_eq!(commands, 1);
//! ```
//!
//! ```
//! use drive_proto::{Serialize, StatusLine, VehicleMode};
//!
//! let mut buf = [0u8; drive_proto::MAX_STATUS_LINE_SIZE];
//! let len = StatusLine::Mode(VehicleMode::Manual).serialize(&mut buf).unwrap();
//! assert_eq!(&buf[..len], b"MODE:MANUAL\n");
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod decoder;
mod format;
pub mod serialize;
pub mod types;

pub use decoder::{
    decode_line, DecodeError, Decoded, LineDecoder, LineEvent, LINE_CAPACITY, MAX_LINE_LENGTH,
};
pub use serialize::{Serialize, SerializeError, StatusLine, MAX_STATUS_LINE_SIZE};
pub use types::{AngleDomain, AutoCommand, Direction, VehicleMode, NEUTRAL_US};
