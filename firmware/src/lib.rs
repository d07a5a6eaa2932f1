//! Dual-mode RC drive controller for RP2040.
//!
//! The vehicle is steered by a servo and driven through an ESC. A third
//! transmitter channel picks who is driving: the human operator (Manual) or
//! an autonomous computer on the serial link (Auto).
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Measures the three receiver channels on GPIO edge interrupts
//! 2. Reads `E:<angle> D:<dir>` lines from UART (115200 baud, 8N1)
//! 3. Writes steering and drive pulses at 50 Hz on two PWM slices
//! 4. Reports `MODE:AUTO` / `MODE:MANUAL` and advisory status lines on UART
//!
//! # Hardware Configuration
//!
//! | Function        | GPIO | Description |
//! |-----------------|------|-------------|
//! | RC steering in  | 2    | Receiver channel 1 |
//! | RC throttle in  | 3    | Receiver channel 2 |
//! | RC mode in      | 4    | Receiver channel 5 (low = Auto) |
//! | Left indicator  | 6    | LED, active high |
//! | Right indicator | 7    | LED, active high |
//! | UART1 TX        | 8    | Status lines out |
//! | UART1 RX        | 9    | Commands in |
//! | Steering servo  | 10   | PWM slice 5 A |
//! | ESC             | 12   | PWM slice 6 A |
//!
//! # Architecture
//!
//! - **Edge tasks** (interrupt executor, high priority): one per receiver
//!   channel, each the only writer of its [`PulseChannel`]
//! - **Control task** (thread executor): 1 kHz cycle that drains received
//!   bytes into the controller and calls `step`
//! - **UART tasks**: the reader pushes bytes into a queue; the writer
//!   serializes queued [`StatusLine`]s
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`narrow-steering`**: 50-130 steering domain
//! - **`manual-reversal-dwell`**: Apply the reversal dwell to manual throttle

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("`dev-panic` and `prod-panic` install conflicting panic handlers");

pub use drive_core::{ControllerConfig, PulseChannel, RcChannels, VehicleController};
pub use drive_proto::StatusLine;

pub mod capture;
pub mod indicator;
pub mod pwm_output;
pub mod serial;

pub use capture::capture_pulses;
pub use indicator::LedIndicator;
pub use pwm_output::{servo_pwm_config, ServoPwm, PWM_PERIOD_US};
pub use serial::{read_bytes, write_status_lines, ByteQueue, QueueStatusSink, StatusQueue};

/// How long outputs sit at neutral after power-up so the ESC can arm.
pub const ESC_ARMING_MS: u64 = 2_000;

/// Control cycle period.
pub const CONTROL_PERIOD_MS: u64 = 1;

/// Controller configuration selected by Cargo features.
pub const CONFIG: ControllerConfig = {
    #[cfg(feature = "narrow-steering")]
    let base = ControllerConfig::NARROW;
    #[cfg(not(feature = "narrow-steering"))]
    let base = ControllerConfig::DEFAULT;

    ControllerConfig {
        manual_reversal_dwell: cfg!(feature = "manual-reversal-dwell"),
        ..base
    }
};

const _: () = assert!(CONFIG.validate().is_ok(), "invalid controller configuration");
