//! Incremental decoder for `E:<angle> D:<dir>` command lines.
//!
//! [`LineDecoder`] is fed one byte at a time from an unbounded serial stream
//! and yields a [`LineEvent`] whenever a line completes or overflows.
//! [`decode_line`] does the field extraction and can be used on its own.

use crate::types::{AngleDomain, AutoCommand, Direction};
use heapless::Vec;

/// Size of the receive buffer, including room for a terminator.
pub const LINE_CAPACITY: usize = 32;

/// Longest line body that can be decoded. One more byte resets the buffer.
pub const MAX_LINE_LENGTH: usize = LINE_CAPACITY - 1;

const ANGLE_MARKER: &[u8] = b"E:";
const DIRECTION_MARKER: &[u8] = b"D:";

/// Reason a completed line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError {
    /// No `E:` marker in the line.
    MissingAngle,
    /// No `D:` marker in the line.
    MissingDirection,
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingAngle => write!(f, "missing E: marker"),
            Self::MissingDirection => write!(f, "missing D: marker"),
        }
    }
}

/// Result of decoding one line. Always carries a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub enum Decoded {
    /// Both markers were present.
    Valid(AutoCommand),
    /// The line was rejected; the command is the neutral fallback.
    Fallback(AutoCommand, DecodeError),
}

impl Decoded {
    /// The command to act on, valid or fallback.
    #[inline]
    pub const fn command(&self) -> AutoCommand {
        match self {
            Self::Valid(cmd) | Self::Fallback(cmd, _) => *cmd,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Why the line was rejected, if it was.
    #[inline]
    #[must_use]
    pub const fn error(&self) -> Option<DecodeError> {
        match self {
            Self::Valid(_) => None,
            Self::Fallback(_, e) => Some(*e),
        }
    }
}

/// Event produced by [`LineDecoder::push_byte`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineEvent {
    /// A non-empty line was terminated and decoded.
    Command(Decoded),
    /// The buffer filled before a terminator; accumulated bytes were dropped.
    Overflow,
}

/// Decode a single line (without its terminator) into a command.
///
/// Both `E:` and `D:` must appear somewhere in the line. The angle is the
/// signed integer directly after `E:`, read up to the first non-digit and
/// clamped into `domain`. The direction is the byte directly after `D:`;
/// anything other than `F`, `B` or `S` (including end of line) means stop.
///
/// A line missing either marker decodes to [`AutoCommand::neutral`].
///
/// # Example
///
/// ```
/// use drive_proto::{decode_line, AngleDomain, Direction};
///
/// let decoded = decode_line(b"E:999 D:Z", AngleDomain::FULL);
/// assert!(decoded.is_valid());
/// assert_eq!(decoded.command().steering_angle, 180);
/// assert_eq!(decoded.command().direction, Direction::Stop);
/// ```
pub fn decode_line(line: &[u8], domain: AngleDomain) -> Decoded {
    let angle_pos = match find(line, ANGLE_MARKER) {
        Some(pos) => pos + ANGLE_MARKER.len(),
        None => {
            return Decoded::Fallback(AutoCommand::neutral(domain), DecodeError::MissingAngle)
        }
    };
    let direction_pos = match find(line, DIRECTION_MARKER) {
        Some(pos) => pos + DIRECTION_MARKER.len(),
        None => {
            return Decoded::Fallback(AutoCommand::neutral(domain), DecodeError::MissingDirection)
        }
    };

    let angle = domain.clamp(parse_leading_int(&line[angle_pos..]));
    let direction = line
        .get(direction_pos)
        .and_then(|&b| Direction::from_byte(b))
        .unwrap_or(Direction::Stop);

    Decoded::Valid(AutoCommand::new(angle, direction))
}

/// Byte-at-a-time line assembler for the command protocol.
///
/// - `\r` is ignored
/// - `\n` completes the current line if anything was buffered
/// - any other byte is appended; if the buffer is already full it is reset
///   (the overflowing byte is dropped too) and accumulation starts over
pub struct LineDecoder {
    buffer: Vec<u8, MAX_LINE_LENGTH>,
    domain: AngleDomain,
}

impl LineDecoder {
    /// Create a decoder that clamps angles into `domain`.
    #[must_use]
    pub const fn new(domain: AngleDomain) -> Self {
        Self {
            buffer: Vec::new(),
            domain,
        }
    }

    /// Feed one byte from the serial stream.
    ///
    /// Returns `Some` when a line completes or the buffer overflows.
    pub fn push_byte(&mut self, byte: u8) -> Option<LineEvent> {
        match byte {
            b'\r' => None,
            b'\n' => {
                if self.buffer.is_empty() {
                    return None;
                }
                let decoded = decode_line(&self.buffer, self.domain);
                self.buffer.clear();
                Some(LineEvent::Command(decoded))
            }
            _ => {
                if self.buffer.push(byte).is_err() {
                    self.buffer.clear();
                    return Some(LineEvent::Overflow);
                }
                None
            }
        }
    }

    /// Discard any partially received line.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Bytes buffered for the line in progress.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    #[inline]
    #[must_use]
    pub const fn domain(&self) -> AngleDomain {
        self.domain
    }
}

/// Position of the first occurrence of `needle` in `haystack`.
#[inline]
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse a leading decimal integer the way C `atoi` does.
///
/// Leading spaces and tabs are skipped, one sign is accepted, and parsing
/// stops at the first non-digit. No digits yields 0. Out-of-range values
/// saturate instead of wrapping.
fn parse_leading_int(s: &[u8]) -> i32 {
    let start = s
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .unwrap_or(s.len());
    let s = &s[start..];

    let (negative, digits) = match s.first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i32 = 0;
    for &b in digits.iter().take_while(|b| b.is_ascii_digit()) {
        let digit = (b - b'0') as i32;
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    fn feed(decoder: &mut LineDecoder, bytes: &[u8]) -> Vec<LineEvent> {
        bytes.iter().filter_map(|&b| decoder.push_byte(b)).collect()
    }

    #[test]
    fn test_decode_forward() {
        let decoded = decode_line(b"E:75 D:F", AngleDomain::FULL);
        assert_eq!(
            decoded,
            Decoded::Valid(AutoCommand::new(75, Direction::Forward))
        );
    }

    #[test]
    fn test_decode_clamps_and_defaults_direction() {
        let decoded = decode_line(b"E:999 D:Z", AngleDomain::FULL);
        assert_eq!(decoded, Decoded::Valid(AutoCommand::new(180, Direction::Stop)));

        let decoded = decode_line(b"E:999 D:Z", AngleDomain::NARROW);
        assert_eq!(decoded.command().steering_angle, 130);
    }

    #[test]
    fn test_decode_negative_angle_clamps_to_min() {
        let decoded = decode_line(b"E:-40 D:B", AngleDomain::FULL);
        assert_eq!(
            decoded,
            Decoded::Valid(AutoCommand::new(0, Direction::Backward))
        );
        let decoded = decode_line(b"E:-40 D:B", AngleDomain::NARROW);
        assert_eq!(decoded.command().steering_angle, 50);
    }

    #[test]
    fn test_decode_garbage_falls_back() {
        let decoded = decode_line(b"garbage", AngleDomain::FULL);
        assert_eq!(
            decoded,
            Decoded::Fallback(AutoCommand::new(90, Direction::Stop), DecodeError::MissingAngle)
        );
        assert!(!decoded.is_valid());
    }

    #[test]
    fn test_decode_missing_direction_falls_back() {
        let decoded = decode_line(b"E:120", AngleDomain::FULL);
        assert_eq!(decoded.error(), Some(DecodeError::MissingDirection));
        assert_eq!(decoded.command(), AutoCommand::neutral(AngleDomain::FULL));
    }

    #[test]
    fn test_decode_markers_are_case_sensitive() {
        let decoded = decode_line(b"e:75 d:F", AngleDomain::FULL);
        assert_eq!(decoded.error(), Some(DecodeError::MissingAngle));
        let decoded = decode_line(b"E:75 D:f", AngleDomain::FULL);
        assert_eq!(decoded.command().direction, Direction::Stop);
    }

    #[test]
    fn test_decode_without_space_and_reordered() {
        let decoded = decode_line(b"E:45D:B", AngleDomain::FULL);
        assert_eq!(decoded.command(), AutoCommand::new(45, Direction::Backward));

        let decoded = decode_line(b"D:F E:100", AngleDomain::FULL);
        assert_eq!(decoded.command(), AutoCommand::new(100, Direction::Forward));
    }

    #[test]
    fn test_decode_direction_at_end_of_line() {
        let decoded = decode_line(b"E:60 D:", AngleDomain::FULL);
        assert_eq!(decoded, Decoded::Valid(AutoCommand::new(60, Direction::Stop)));
    }

    #[test]
    fn test_decode_unparseable_angle_is_zero() {
        let decoded = decode_line(b"E:abc D:F", AngleDomain::FULL);
        assert_eq!(decoded.command(), AutoCommand::new(0, Direction::Forward));
        let decoded = decode_line(b"E:abc D:F", AngleDomain::NARROW);
        assert_eq!(decoded.command().steering_angle, 50);
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int(b"75 D:F"), 75);
        assert_eq!(parse_leading_int(b"  -12x"), -12);
        assert_eq!(parse_leading_int(b"+7"), 7);
        assert_eq!(parse_leading_int(b"-"), 0);
        assert_eq!(parse_leading_int(b""), 0);
        assert_eq!(parse_leading_int(b"99999999999999"), i32::MAX);
        assert_eq!(parse_leading_int(b"-99999999999999"), i32::MIN);
    }

    #[test]
    fn test_decoder_crlf_line() {
        let mut decoder = LineDecoder::new(AngleDomain::FULL);
        let events = feed(&mut decoder, b"E:75 D:F\r\n");
        assert_eq!(
            events,
            [LineEvent::Command(Decoded::Valid(AutoCommand::new(
                75,
                Direction::Forward
            )))]
        );
        assert!(decoder.pending().is_empty());
    }

    #[test]
    fn test_decoder_empty_lines_produce_nothing() {
        let mut decoder = LineDecoder::new(AngleDomain::FULL);
        assert!(feed(&mut decoder, b"\n").is_empty());
        assert!(feed(&mut decoder, b"\r\n\r\n").is_empty());
    }

    #[test]
    fn test_decoder_garbage_line_yields_fallback() {
        let mut decoder = LineDecoder::new(AngleDomain::FULL);
        let events = feed(&mut decoder, b"garbage\n");
        assert_eq!(events.len(), 1);
        match events[0] {
            LineEvent::Command(decoded) => {
                assert!(!decoded.is_valid());
                assert_eq!(decoded.command(), AutoCommand::new(90, Direction::Stop));
            }
            LineEvent::Overflow => panic!("unexpected overflow"),
        }
    }

    #[test]
    fn test_decoder_overflow_then_valid_line() {
        let mut decoder = LineDecoder::new(AngleDomain::FULL);
        let events = feed(&mut decoder, &[b'x'; 40]);
        assert_eq!(events, [LineEvent::Overflow]);

        let events = feed(&mut decoder, b"E:75 D:F\n");
        assert_eq!(
            events,
            [LineEvent::Command(Decoded::Valid(AutoCommand::new(
                75,
                Direction::Forward
            )))]
        );
    }

    #[test]
    fn test_decoder_max_length_line_is_kept() {
        let mut decoder = LineDecoder::new(AngleDomain::FULL);
        let mut line = [b' '; MAX_LINE_LENGTH];
        line[..8].copy_from_slice(b"E:30 D:B");
        assert!(feed(&mut decoder, &line).is_empty());
        assert_eq!(decoder.pending().len(), MAX_LINE_LENGTH);

        let events = feed(&mut decoder, b"\n");
        assert_eq!(
            events,
            [LineEvent::Command(Decoded::Valid(AutoCommand::new(
                30,
                Direction::Backward
            )))]
        );
    }

    #[test]
    fn test_decoder_one_past_max_length_is_dropped() {
        let mut decoder = LineDecoder::new(AngleDomain::FULL);
        let mut line = [b' '; MAX_LINE_LENGTH + 1];
        line[..8].copy_from_slice(b"E:30 D:B");
        let events = feed(&mut decoder, &line);
        assert_eq!(events, [LineEvent::Overflow]);
        assert!(feed(&mut decoder, b"\n").is_empty());
    }

    #[test]
    fn test_decoder_reset_discards_partial_line() {
        let mut decoder = LineDecoder::new(AngleDomain::FULL);
        assert!(feed(&mut decoder, b"E:10").is_empty());
        decoder.reset();
        let events = feed(&mut decoder, b" D:F\n");
        match events[0] {
            LineEvent::Command(decoded) => {
                assert_eq!(decoded.error(), Some(DecodeError::MissingAngle))
            }
            LineEvent::Overflow => panic!("unexpected overflow"),
        }
    }
}
