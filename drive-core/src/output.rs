//! Hardware-facing output traits.
//!
//! The core never touches peripherals directly. Firmware implements these
//! traits for its PWM slices, GPIO pins and serial transmitter; tests
//! implement them with recorders.

use drive_proto::StatusLine;

/// A PWM output whose high time is set in microseconds.
///
/// Writes are idempotent and take effect on the next PWM period. They must
/// not block.
pub trait PulseOutput {
    fn write_us(&mut self, width_us: u16);
}

/// A binary indicator such as a turn LED.
pub trait IndicatorOutput {
    fn set(&mut self, on: bool);
}

/// Destination for outbound status lines.
///
/// Implementations queue or drop lines; they must not block the control
/// cycle waiting for the serial link.
pub trait StatusSink {
    fn emit(&mut self, line: &StatusLine);
}

/// Status sink that discards all lines.
pub struct NullStatusSink;

impl StatusSink for NullStatusSink {
    fn emit(&mut self, _line: &StatusLine) {}
}
