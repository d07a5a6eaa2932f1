//! Mode arbitration from the mode-select channel.

use crate::config::MODE_THRESHOLD_US;
use drive_proto::VehicleMode;

/// Mode implied by a mode-channel pulse width.
///
/// Widths at or below 1500 us select Auto, anything above selects Manual.
/// No range check: a glitch width is classified like any other.
#[inline]
#[must_use]
pub const fn classify(width_us: u32) -> VehicleMode {
    if width_us <= MODE_THRESHOLD_US {
        VehicleMode::Auto
    } else {
        VehicleMode::Manual
    }
}

/// A confirmed change of driving source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeTransition {
    pub from: VehicleMode,
    pub to: VehicleMode,
}

/// Tracks the active [`VehicleMode`].
///
/// Starts in [`VehicleMode::Undetermined`] and leaves it on the first mode
/// pulse; it never returns there.
#[derive(Debug, Default)]
pub struct ModeArbiter {
    mode: VehicleMode,
}

impl ModeArbiter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: VehicleMode::Undetermined,
        }
    }

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> VehicleMode {
        self.mode
    }

    /// Feed a freshly captured mode-channel width.
    ///
    /// Returns the transition when the classified mode differs from the
    /// current one. The caller must stop all actuators before routing any
    /// input to the new mode.
    pub fn observe(&mut self, width_us: u32) -> Option<ModeTransition> {
        let next = classify(width_us);
        if next == self.mode {
            return None;
        }
        let transition = ModeTransition {
            from: self.mode,
            to: next,
        };
        self.mode = next;
        Some(transition)
    }
}
