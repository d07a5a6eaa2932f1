//! Pulse width capture for externally driven PWM inputs.
//!
//! One [`PulseChannel`] exists per monitored RC channel. The edge handler for
//! that input is its only writer; the control cycle is its only reader. Both
//! sides share the record by reference, so it is typically placed in a
//! `static`:
//!
//! ```
//! use drive_core::PulseChannel;
//!
//! static STEERING: PulseChannel = PulseChannel::new();
//!
//! // Edge handler context
//! STEERING.on_edge(true, 10_000);
//! STEERING.on_edge(false, 11_620);
//!
//! // Control cycle
//! assert_eq!(STEERING.take_fresh(), Some(1620));
//! assert_eq!(STEERING.take_fresh(), None);
//! ```
//!
//! The handler never blocks, allocates, or takes a lock. Each field is a
//! separate atomic, so the width itself can't tear, but width and `fresh`
//! are not updated as one unit: a reader racing a falling edge may pair the
//! new flag with the previous width. That is harmless at PWM resolution and
//! the next cycle sees the new value.

use drive_proto::NEUTRAL_US;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

/// Latest measured pulse width of one RC input.
pub struct PulseChannel {
    width_us: AtomicU32,
    rise_us: AtomicU32,
    armed: AtomicBool,
    fresh: AtomicBool,
}

impl PulseChannel {
    /// Create a channel holding the neutral width and no fresh value.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            width_us: AtomicU32::new(NEUTRAL_US as u32),
            rise_us: AtomicU32::new(0),
            armed: AtomicBool::new(false),
            fresh: AtomicBool::new(false),
        }
    }

    /// Record an edge. `level_high` is the input level after the transition;
    /// `now_us` is a free-running microsecond timestamp (wrap-around is fine).
    #[inline]
    pub fn on_edge(&self, level_high: bool, now_us: u32) {
        if level_high {
            self.on_rising(now_us);
        } else {
            self.on_falling(now_us);
        }
    }

    /// Start of a pulse.
    #[inline]
    pub fn on_rising(&self, now_us: u32) {
        self.rise_us.store(now_us, Ordering::Relaxed);
        self.armed.store(true, Ordering::Release);
    }

    /// End of a pulse: store the raw width and raise `fresh`.
    ///
    /// No range check happens here. A falling edge with no rising edge
    /// before it (power-up mid-pulse) is ignored.
    #[inline]
    pub fn on_falling(&self, now_us: u32) {
        if !self.armed.load(Ordering::Acquire) {
            return;
        }
        let width = now_us.wrapping_sub(self.rise_us.load(Ordering::Relaxed));
        self.width_us.store(width, Ordering::Relaxed);
        self.fresh.store(true, Ordering::Release);
    }

    /// Most recent width, fresh or not.
    #[inline]
    #[must_use]
    pub fn latest(&self) -> u32 {
        self.width_us.load(Ordering::Acquire)
    }

    /// Check for a width not yet consumed by [`take_fresh`](Self::take_fresh).
    #[inline]
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.fresh.load(Ordering::Acquire)
    }

    /// Clear `fresh` and return the width if it was set.
    #[inline]
    pub fn take_fresh(&self) -> Option<u32> {
        if self.fresh.swap(false, Ordering::AcqRel) {
            Some(self.width_us.load(Ordering::Acquire))
        } else {
            None
        }
    }
}

impl Default for PulseChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_neutral() {
        let ch = PulseChannel::new();
        assert_eq!(ch.latest(), 1500);
        assert!(!ch.is_fresh());
        assert_eq!(ch.take_fresh(), None);
    }

    #[test]
    fn test_rise_then_fall_measures_width() {
        let ch = PulseChannel::new();
        ch.on_edge(true, 1_000);
        assert!(!ch.is_fresh());
        ch.on_edge(false, 2_200);
        assert!(ch.is_fresh());
        assert_eq!(ch.take_fresh(), Some(1200));
        assert!(!ch.is_fresh());
        assert_eq!(ch.latest(), 1200);
    }

    #[test]
    fn test_fall_before_any_rise_is_ignored() {
        let ch = PulseChannel::new();
        ch.on_edge(false, 987_654);
        assert!(!ch.is_fresh());
        assert_eq!(ch.latest(), 1500);
    }

    #[test]
    fn test_timestamp_wraparound() {
        let ch = PulseChannel::new();
        ch.on_rising(u32::MAX - 499);
        ch.on_falling(1_000);
        assert_eq!(ch.take_fresh(), Some(1500));
    }

    #[test]
    fn test_implausible_width_is_stored_raw() {
        let ch = PulseChannel::new();
        ch.on_rising(0);
        ch.on_falling(25_000);
        assert_eq!(ch.take_fresh(), Some(25_000));
    }

    #[test]
    fn test_latest_width_wins_until_taken() {
        let ch = PulseChannel::new();
        ch.on_rising(0);
        ch.on_falling(1_100);
        ch.on_rising(20_000);
        ch.on_falling(21_900);
        assert_eq!(ch.take_fresh(), Some(1900));
        assert_eq!(ch.take_fresh(), None);
    }
}
