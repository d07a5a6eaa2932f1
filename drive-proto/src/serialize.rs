//! Serialization of outbound status lines.
//!
//! Every [`StatusLine`] becomes one `\n`-terminated ASCII line. Only the mode
//! announcement is meant to be machine-read:
//!
//! ```text
//! MODE:AUTO\n
//! MODE:MANUAL\n
//! ```
//!
//! The remaining lines are human-oriented diagnostics:
//!
//! ```text
//! [OK] controller ready
//! [AUTO] Angle: <angle> | Dir: <F|B|S> -> Servo PWM: <us> | ESC PWM: <us>
//! [MANUAL] Servo PWM: <us> | Motor PWM: <us> -> ESC Out: <us>
//! [WARN] invalid command, stopping
//! [WARN] RC signal lost, stopping
//! ```
//!
//! # Example
//!
//! ```
//! use drive_proto::{Direction, Serialize, StatusLine};
//!
//! let line = StatusLine::Auto {
//!     angle: 75,
//!     direction: Direction::Forward,
//!     steering_us: 1567,
//!     drive_us: 1560,
//! };
//! let mut buf = [0u8; 96];
//! let len = line.serialize(&mut buf).unwrap();
//! assert_eq!(
//!     &buf[..len],
//!     b"[AUTO] Angle: 75 | Dir: F -> Servo PWM: 1567 | ESC PWM: 1560\n"
//! );
//! ```

use crate::format::{write_i16, write_u32, MAX_I16_DIGITS, MAX_U32_DIGITS};
use crate::types::{Direction, VehicleMode};

/// Buffer size that fits any serialized [`StatusLine`].
///
/// Longest case is the manual line with two 10-digit raw widths (73 bytes);
/// rounded up.
pub const MAX_STATUS_LINE_SIZE: usize = 80;

/// One outbound line on the serial link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusLine {
    /// Boot banner, sent once outputs are armed.
    Ready,
    /// Confirmed mode change.
    Mode(VehicleMode),
    /// An autonomous command was applied.
    Auto {
        angle: i16,
        direction: Direction,
        steering_us: u16,
        drive_us: u16,
    },
    /// Manual outputs were refreshed from the transmitter.
    Manual {
        steering_raw_us: u32,
        throttle_raw_us: u32,
        drive_us: u16,
    },
    /// A command line was rejected and the neutral fallback applied.
    Rejected,
    /// The transmitter stopped refreshing and outputs were stopped.
    Failsafe,
}

/// Error type for serialization operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializeError {
    /// The output buffer is too small to hold the serialized line.
    BufferTooSmall,
    /// A write operation failed (for writer adapters).
    WriteError,
}

impl core::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::WriteError => write!(f, "write error"),
        }
    }
}

/// Cursor over an output buffer that is known to be large enough.
struct LineBuf<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> LineBuf<'a> {
    #[inline]
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    fn write_slice(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    #[inline]
    fn write_byte(&mut self, byte: u8) {
        self.buf[self.pos] = byte;
        self.pos += 1;
    }

    #[inline]
    fn write_u32(&mut self, value: u32) {
        let mut tmp = [0u8; MAX_U32_DIGITS];
        let len = write_u32(&mut tmp, value);
        self.write_slice(&tmp[..len]);
    }

    #[inline]
    fn write_i16(&mut self, value: i16) {
        let mut tmp = [0u8; MAX_I16_DIGITS];
        let len = write_i16(&mut tmp, value);
        self.write_slice(&tmp[..len]);
    }

    /// Terminate the line and return its length.
    #[inline]
    fn finalize(mut self) -> usize {
        self.write_byte(b'\n');
        self.pos
    }
}

/// Extension trait for serializing outbound lines.
pub trait Serialize {
    /// Serialize to the provided buffer.
    ///
    /// Returns the number of bytes written on success.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if the buffer is not large enough.
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError>;

    /// Serialize to a `heapless::Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if `N` is not large enough.
    fn serialize_to_vec<const N: usize>(&self) -> Result<heapless::Vec<u8, N>, SerializeError> {
        let mut vec = heapless::Vec::new();
        // Resize to full capacity to allow serialize() to write
        vec.resize(N, 0)
            .map_err(|_| SerializeError::BufferTooSmall)?;
        let len = self.serialize(&mut vec)?;
        vec.truncate(len);
        Ok(vec)
    }

    /// Serialize to a `core::fmt::Write` implementation, e.g. `heapless::String`.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::WriteError`] if the write fails.
    fn serialize_fmt<W: core::fmt::Write>(&self, writer: &mut W) -> Result<(), SerializeError>;
}

impl Serialize for StatusLine {
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError> {
        if buf.len() < MAX_STATUS_LINE_SIZE {
            return Err(SerializeError::BufferTooSmall);
        }

        let mut lb = LineBuf::new(buf);
        match *self {
            Self::Ready => lb.write_slice(b"[OK] controller ready"),
            Self::Mode(mode) => {
                lb.write_slice(b"MODE:");
                lb.write_slice(mode.as_str().as_bytes());
            }
            Self::Auto {
                angle,
                direction,
                steering_us,
                drive_us,
            } => {
                lb.write_slice(b"[AUTO] Angle: ");
                lb.write_i16(angle);
                lb.write_slice(b" | Dir: ");
                lb.write_byte(direction.as_byte());
                lb.write_slice(b" -> Servo PWM: ");
                lb.write_u32(steering_us as u32);
                lb.write_slice(b" | ESC PWM: ");
                lb.write_u32(drive_us as u32);
            }
            Self::Manual {
                steering_raw_us,
                throttle_raw_us,
                drive_us,
            } => {
                lb.write_slice(b"[MANUAL] Servo PWM: ");
                lb.write_u32(steering_raw_us);
                lb.write_slice(b" | Motor PWM: ");
                lb.write_u32(throttle_raw_us);
                lb.write_slice(b" -> ESC Out: ");
                lb.write_u32(drive_us as u32);
            }
            Self::Rejected => lb.write_slice(b"[WARN] invalid command, stopping"),
            Self::Failsafe => lb.write_slice(b"[WARN] RC signal lost, stopping"),
        }
        Ok(lb.finalize())
    }

    fn serialize_fmt<W: core::fmt::Write>(&self, writer: &mut W) -> Result<(), SerializeError> {
        let mut buf = [0u8; MAX_STATUS_LINE_SIZE];
        let len = self.serialize(&mut buf)?;

        let s = core::str::from_utf8(&buf[..len]).map_err(|_| SerializeError::WriteError)?;
        writer.write_str(s).map_err(|_| SerializeError::WriteError)
    }
}
