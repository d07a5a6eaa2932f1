//! Controller configuration.
//!
//! All tunables live in one [`ControllerConfig`] that is handed to each
//! component at construction. Presets are `const` so firmware can pick one
//! at compile time.

use drive_proto::{AngleDomain, NEUTRAL_US};

/// Lowest plausible RC receiver pulse width in microseconds.
pub const RC_PULSE_MIN_US: u16 = 1000;

/// Highest plausible RC receiver pulse width in microseconds.
pub const RC_PULSE_MAX_US: u16 = 2000;

/// Mode channel widths at or below this select Auto; above selects Manual.
pub const MODE_THRESHOLD_US: u32 = 1500;

/// Complete controller configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Accepted logical steering angles.
    pub domain: AngleDomain,
    /// Steering pulse for `domain.max`.
    pub output_min: u16,
    /// Steering pulse for `domain.min`.
    pub output_max: u16,
    /// Added to every logical angle before clamping and mapping.
    pub calibration_offset: i16,
    /// Drive pulse for [`Direction::Stop`](drive_proto::Direction::Stop).
    pub stop_pulse: u16,
    /// Drive pulse for [`Direction::Forward`](drive_proto::Direction::Forward).
    pub forward_pulse: u16,
    /// Drive pulse for [`Direction::Backward`](drive_proto::Direction::Backward).
    pub reverse_pulse: u16,
    /// How long the stop pulse is held when drive direction flips.
    pub reversal_dwell_ms: u32,
    /// Manual throttle deviation from neutral is divided by this.
    pub manual_sensitivity_divisor: u16,
    /// Apply the reversal dwell to manual throttle as well.
    pub manual_reversal_dwell: bool,
    /// Stop manual outputs if steering and throttle both go quiet this long.
    /// `None` keeps the last pulse in effect indefinitely.
    pub rc_timeout_ms: Option<u32>,
    /// Steering deflection from neutral below which indicators stay off.
    pub indicator_deadband_us: u16,
    /// Indicator blink half-period.
    pub indicator_interval_ms: u32,
    /// Minimum spacing between manual status lines.
    pub manual_status_interval_ms: u32,
}

impl ControllerConfig {
    /// Full 0-180 steering domain.
    pub const DEFAULT: Self = Self {
        domain: AngleDomain::FULL,
        output_min: 1100,
        output_max: 1900,
        calibration_offset: 0,
        stop_pulse: NEUTRAL_US,
        forward_pulse: 1560,
        reverse_pulse: 1437,
        reversal_dwell_ms: 100,
        manual_sensitivity_divisor: 5,
        manual_reversal_dwell: false,
        rc_timeout_ms: Some(500),
        indicator_deadband_us: 100,
        indicator_interval_ms: 200,
        manual_status_interval_ms: 200,
    };

    /// Narrow 50-130 steering domain, otherwise identical to [`Self::DEFAULT`].
    pub const NARROW: Self = Self {
        domain: AngleDomain::NARROW,
        ..Self::DEFAULT
    };

    /// Check the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.min >= self.domain.max {
            return Err(ConfigError::EmptyDomain);
        }
        if self.output_min >= self.output_max {
            return Err(ConfigError::InvertedOutputRange);
        }
        if self.manual_sensitivity_divisor == 0 {
            return Err(ConfigError::ZeroDivisor);
        }
        let lo = RC_PULSE_MIN_US;
        let hi = RC_PULSE_MAX_US;
        if self.stop_pulse < lo
            || self.stop_pulse > hi
            || self.forward_pulse < lo
            || self.forward_pulse > hi
            || self.reverse_pulse < lo
            || self.reverse_pulse > hi
        {
            return Err(ConfigError::DrivePulseOutOfRange);
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Problems reported by [`ControllerConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `domain.min` is not below `domain.max`.
    EmptyDomain,
    /// `output_min` is not below `output_max`.
    InvertedOutputRange,
    /// `manual_sensitivity_divisor` is zero.
    ZeroDivisor,
    /// A drive pulse lies outside the plausible RC range.
    DrivePulseOutOfRange,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::EmptyDomain => write!(f, "steering domain is empty"),
            Self::InvertedOutputRange => write!(f, "steering output range is inverted"),
            Self::ZeroDivisor => write!(f, "manual sensitivity divisor is zero"),
            Self::DrivePulseOutOfRange => write!(f, "drive pulse outside 1000-2000 us"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert_eq!(ControllerConfig::DEFAULT.validate(), Ok(()));
        assert_eq!(ControllerConfig::NARROW.validate(), Ok(()));
        assert_eq!(ControllerConfig::NARROW.domain, AngleDomain::NARROW);
        assert_eq!(ControllerConfig::NARROW.forward_pulse, 1560);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = ControllerConfig::DEFAULT;
        cfg.domain = AngleDomain::new(90, 90);
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyDomain));

        let mut cfg = ControllerConfig::DEFAULT;
        cfg.output_min = 1900;
        cfg.output_max = 1100;
        assert_eq!(cfg.validate(), Err(ConfigError::InvertedOutputRange));

        let mut cfg = ControllerConfig::DEFAULT;
        cfg.manual_sensitivity_divisor = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDivisor));

        let mut cfg = ControllerConfig::DEFAULT;
        cfg.forward_pulse = 2500;
        assert_eq!(cfg.validate(), Err(ConfigError::DrivePulseOutOfRange));
    }
}
