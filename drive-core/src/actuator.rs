//! Actuator output mapping: logical commands to steering and drive pulses.
//!
//! Two pipelines share one reversal rule:
//!
//! - **Steering**: angle + calibration offset, clamped into the domain, then
//!   mapped linearly and *reversed* onto `output_min..=output_max` (domain
//!   minimum gives the maximum pulse). The reversal matches the linkage.
//! - **Drive**: direction selects one of three configured pulses.
//!
//! When the drive flips between forward and backward, the stop pulse is
//! written at once and the new pulse is deferred until the dwell expires.
//! The deferral is timestamp-gated: [`ActuatorMapper::poll`] releases it on
//! a later cycle, so nothing sleeps.

use crate::config::{ControllerConfig, RC_PULSE_MAX_US, RC_PULSE_MIN_US};
use crate::output::PulseOutput;
use drive_proto::{AutoCommand, Direction, NEUTRAL_US};

/// Steering pulse for a logical angle.
///
/// Total over `i16`: out-of-domain angles are clamped. Monotonically
/// non-increasing in `angle`. A configuration that fails
/// [`ControllerConfig::validate`] still yields a pulse between the two
/// output bounds.
#[must_use]
pub fn steering_pulse(config: &ControllerConfig, angle: i16) -> u16 {
    let domain = config.domain;
    let adjusted = domain.clamp(angle as i32 + config.calibration_offset as i32) as i32;
    let out_min = config.output_min as i32;
    let out_max = config.output_max as i32;
    // Reversed linear map: domain.min -> out_max, domain.max -> out_min
    let offset = (adjusted - domain.min as i32).max(0);
    let pulse = out_max + offset * (out_min - out_max) / domain.span().max(1);
    pulse.max(out_min.min(out_max)).min(out_min.max(out_max)) as u16
}

/// Drive pulse for a direction.
#[inline]
#[must_use]
pub const fn drive_pulse(config: &ControllerConfig, direction: Direction) -> u16 {
    match direction {
        Direction::Forward => config.forward_pulse,
        Direction::Backward => config.reverse_pulse,
        Direction::Stop => config.stop_pulse,
    }
}

/// Manual steering: the raw receiver width, clamped to 1000-2000 us.
#[inline]
#[must_use]
pub fn manual_steering_pulse(raw_us: u32) -> u16 {
    raw_us.clamp(RC_PULSE_MIN_US as u32, RC_PULSE_MAX_US as u32) as u16
}

/// Manual drive: throttle deviation from neutral divided by the sensitivity
/// divisor, re-centered and clamped to 1000-2000 us.
#[must_use]
pub fn manual_drive_pulse(config: &ControllerConfig, raw_us: u32) -> u16 {
    let raw = raw_us.min(i32::MAX as u32) as i32;
    let deviation = raw - NEUTRAL_US as i32;
    let divisor = config.manual_sensitivity_divisor.max(1) as i32;
    let limited = NEUTRAL_US as i32 + deviation / divisor;
    limited.clamp(RC_PULSE_MIN_US as i32, RC_PULSE_MAX_US as i32) as u16
}

/// What the mapper last commanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputState {
    /// Last logical steering angle (before offset) applied in Auto.
    ///
    /// Manual steering bypasses the angle pipeline and leaves this
    /// untouched; [`ActuatorMapper::stop_all`] resets it to the domain
    /// midpoint.
    pub steering_angle: i16,
    /// Requested drive direction, possibly still waiting out a dwell.
    pub direction: Direction,
    /// Direction of the last directional pulse physically written.
    pub previous_direction: Direction,
    /// Last steering pulse written.
    pub steering_us: u16,
    /// Last drive pulse written.
    pub drive_us: u16,
}

/// Drive write held back by a reversal dwell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingDrive {
    pub direction: Direction,
    pub pulse: u16,
    pub release_at_ms: u64,
}

/// Pulses produced for one applied command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppliedPulses {
    pub steering_us: u16,
    /// Target drive pulse; may still be deferred by a dwell.
    pub drive_us: u16,
}

/// Owns the steering and drive outputs.
pub struct ActuatorMapper<S, D> {
    steering: S,
    drive: D,
    config: ControllerConfig,
    state: OutputState,
    pending: Option<PendingDrive>,
}

impl<S: PulseOutput, D: PulseOutput> ActuatorMapper<S, D> {
    /// Take ownership of the outputs. Nothing is written until the first
    /// command or [`stop_all`](Self::stop_all).
    pub fn new(steering: S, drive: D, config: ControllerConfig) -> Self {
        Self {
            steering,
            drive,
            config,
            state: OutputState {
                steering_angle: config.domain.midpoint(),
                direction: Direction::Stop,
                previous_direction: Direction::Stop,
                steering_us: NEUTRAL_US,
                drive_us: config.stop_pulse,
            },
            pending: None,
        }
    }

    /// Apply an autonomous command.
    pub fn apply_auto(&mut self, command: AutoCommand, now_ms: u64) -> AppliedPulses {
        let steering_us = steering_pulse(&self.config, command.steering_angle);
        self.write_steering(steering_us);
        self.state.steering_angle = command.steering_angle;

        let drive_us = drive_pulse(&self.config, command.direction);
        self.command_drive(command.direction, drive_us, now_ms, true);

        AppliedPulses {
            steering_us,
            drive_us,
        }
    }

    /// Apply raw transmitter widths in manual mode.
    ///
    /// The reversal dwell applies only if `manual_reversal_dwell` is set.
    pub fn apply_manual(
        &mut self,
        steering_raw_us: u32,
        throttle_raw_us: u32,
        now_ms: u64,
    ) -> AppliedPulses {
        let steering_us = manual_steering_pulse(steering_raw_us);
        self.write_steering(steering_us);

        let drive_us = manual_drive_pulse(&self.config, throttle_raw_us);
        let direction = if drive_us > self.config.stop_pulse {
            Direction::Forward
        } else if drive_us < self.config.stop_pulse {
            Direction::Backward
        } else {
            Direction::Stop
        };
        self.command_drive(direction, drive_us, now_ms, self.config.manual_reversal_dwell);

        AppliedPulses {
            steering_us,
            drive_us,
        }
    }

    /// Release a deferred drive write once its dwell has elapsed.
    ///
    /// Call every cycle. Returns the write that was released, if any.
    pub fn poll(&mut self, now_ms: u64) -> Option<PendingDrive> {
        let pending = self.pending?;
        if now_ms < pending.release_at_ms {
            return None;
        }
        self.pending = None;
        self.write_drive(pending.direction, pending.pulse);
        Some(pending)
    }

    /// Steering to neutral, drive to stop, any pending dwell dropped.
    pub fn stop_all(&mut self) {
        self.pending = None;
        self.write_steering(NEUTRAL_US);
        self.state.steering_angle = self.config.domain.midpoint();
        self.write_drive(Direction::Stop, self.config.stop_pulse);
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> &OutputState {
        &self.state
    }

    /// The deferred drive write, if a dwell is running.
    #[inline]
    #[must_use]
    pub const fn pending(&self) -> Option<&PendingDrive> {
        self.pending.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ControllerConfig {
        &self.config
    }

    fn command_drive(&mut self, direction: Direction, pulse: u16, now_ms: u64, protect: bool) {
        self.state.direction = direction;

        // A running dwell always completes; only its target changes
        if let Some(pending) = self.pending.as_mut() {
            pending.direction = direction;
            pending.pulse = pulse;
            return;
        }

        if protect && direction.reverses(self.state.previous_direction) {
            let stop = self.config.stop_pulse;
            self.drive.write_us(stop);
            self.state.drive_us = stop;
            self.pending = Some(PendingDrive {
                direction,
                pulse,
                release_at_ms: now_ms + self.config.reversal_dwell_ms as u64,
            });
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "reversal dwell until {} ms",
                now_ms + self.config.reversal_dwell_ms as u64
            );
            return;
        }

        self.write_drive(direction, pulse);
    }

    fn write_steering(&mut self, width_us: u16) {
        self.steering.write_us(width_us);
        self.state.steering_us = width_us;
    }

    fn write_drive(&mut self, direction: Direction, width_us: u16) {
        self.drive.write_us(width_us);
        self.state.drive_us = width_us;
        self.state.previous_direction = direction;
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec;
    use std::vec::Vec;

    use super::*;
    use drive_proto::AngleDomain;

    #[derive(Clone, Default)]
    struct Recorder {
        writes: Rc<RefCell<Vec<u16>>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<u16> {
            self.writes.borrow_mut().drain(..).collect()
        }
    }

    impl PulseOutput for Recorder {
        fn write_us(&mut self, width_us: u16) {
            self.writes.borrow_mut().push(width_us);
        }
    }

    type Mapper = ActuatorMapper<Recorder, Recorder>;

    fn mapper(config: ControllerConfig) -> (Mapper, Recorder, Recorder) {
        let steering = Recorder::default();
        let drive = Recorder::default();
        let m = ActuatorMapper::new(steering.clone(), drive.clone(), config);
        (m, steering, drive)
    }

    const FWD: u16 = 1560;
    const REV: u16 = 1437;
    const STOP: u16 = 1500;

    #[test]
    fn test_steering_endpoints_are_reversed() {
        let cfg = ControllerConfig::DEFAULT;
        assert_eq!(steering_pulse(&cfg, 0), 1900);
        assert_eq!(steering_pulse(&cfg, 90), 1500);
        assert_eq!(steering_pulse(&cfg, 180), 1100);

        let cfg = ControllerConfig::NARROW;
        assert_eq!(steering_pulse(&cfg, 50), 1900);
        assert_eq!(steering_pulse(&cfg, 90), 1500);
        assert_eq!(steering_pulse(&cfg, 130), 1100);
    }

    #[test]
    fn test_steering_truncates_like_integer_map() {
        let cfg = ControllerConfig::DEFAULT;
        // 1900 + 75 * -800 / 180 = 1900 - 333
        assert_eq!(steering_pulse(&cfg, 75), 1567);
        assert_eq!(steering_pulse(&cfg, 1), 1896);
    }

    #[test]
    fn test_steering_bounded_and_monotonic_everywhere() {
        for cfg in [ControllerConfig::DEFAULT, ControllerConfig::NARROW] {
            let mut last = u16::MAX;
            for angle in -400i16..=400 {
                let us = steering_pulse(&cfg, angle);
                assert!((1100..=1900).contains(&us), "angle {angle} -> {us}");
                assert!(us <= last, "not decreasing at {angle}");
                last = us;
            }
        }
        assert_eq!(steering_pulse(&ControllerConfig::DEFAULT, i16::MIN), 1900);
        assert_eq!(steering_pulse(&ControllerConfig::DEFAULT, i16::MAX), 1100);
    }

    #[test]
    fn test_calibration_offset_applied_before_clamp() {
        let mut cfg = ControllerConfig::DEFAULT;
        cfg.calibration_offset = 5;
        assert_eq!(steering_pulse(&cfg, 85), 1500);
        assert_eq!(steering_pulse(&cfg, 180), 1100);
        cfg.calibration_offset = -5;
        assert_eq!(steering_pulse(&cfg, 2), 1900);
    }

    #[test]
    fn test_manual_pulses() {
        let cfg = ControllerConfig::DEFAULT;
        assert_eq!(manual_steering_pulse(900), 1000);
        assert_eq!(manual_steering_pulse(1733), 1733);
        assert_eq!(manual_steering_pulse(60_000), 2000);

        assert_eq!(manual_drive_pulse(&cfg, 1500), 1500);
        assert_eq!(manual_drive_pulse(&cfg, 2000), 1600);
        assert_eq!(manual_drive_pulse(&cfg, 1000), 1400);
        // Truncation toward zero, as integer division does
        assert_eq!(manual_drive_pulse(&cfg, 1496), 1500);
        assert_eq!(manual_drive_pulse(&cfg, u32::MAX), 2000);
        assert_eq!(manual_drive_pulse(&cfg, 0), 1200);

        let mut cfg = cfg;
        cfg.manual_sensitivity_divisor = 2;
        assert_eq!(manual_drive_pulse(&cfg, 2000), 1750);
        cfg.manual_sensitivity_divisor = 1;
        assert_eq!(manual_drive_pulse(&cfg, 300), 1000);
    }

    #[test]
    fn test_forward_to_backward_inserts_one_stop() {
        let (mut m, _, drive) = mapper(ControllerConfig::DEFAULT);
        m.apply_auto(AutoCommand::new(90, Direction::Forward), 0);
        m.apply_auto(AutoCommand::new(90, Direction::Backward), 10);
        assert_eq!(drive.take(), vec![FWD, STOP]);
        assert!(m.pending().is_some());
        assert_eq!(m.state().previous_direction, Direction::Forward);

        assert_eq!(m.poll(109), None);
        assert!(drive.take().is_empty());

        let released = m.poll(110).unwrap();
        assert_eq!(released.direction, Direction::Backward);
        assert_eq!(drive.take(), vec![REV]);
        assert_eq!(m.state().previous_direction, Direction::Backward);
        assert_eq!(m.poll(500), None);
    }

    #[test]
    fn test_backward_to_forward_inserts_one_stop() {
        let (mut m, _, drive) = mapper(ControllerConfig::DEFAULT);
        m.apply_auto(AutoCommand::new(90, Direction::Backward), 0);
        m.apply_auto(AutoCommand::new(90, Direction::Forward), 0);
        m.poll(100);
        assert_eq!(drive.take(), vec![REV, STOP, FWD]);
    }

    #[test]
    fn test_non_reversing_sequences_add_no_pulse() {
        use Direction::*;
        let cases: [(&[Direction], &[u16]); 5] = [
            (&[Forward, Forward], &[FWD, FWD]),
            (&[Backward, Backward], &[REV, REV]),
            (&[Forward, Stop], &[FWD, STOP]),
            (&[Stop, Backward], &[STOP, REV]),
            (&[Backward, Stop, Forward], &[REV, STOP, FWD]),
        ];
        for (dirs, expected) in cases {
            let (mut m, _, drive) = mapper(ControllerConfig::DEFAULT);
            for &d in dirs {
                m.apply_auto(AutoCommand::new(90, d), 0);
                assert!(m.pending().is_none());
            }
            assert_eq!(drive.take(), expected.to_vec(), "{dirs:?}");
        }
    }

    #[test]
    fn test_steering_not_blocked_during_dwell() {
        let (mut m, steering, drive) = mapper(ControllerConfig::DEFAULT);
        m.apply_auto(AutoCommand::new(90, Direction::Forward), 0);
        m.apply_auto(AutoCommand::new(0, Direction::Backward), 0);
        m.apply_auto(AutoCommand::new(180, Direction::Backward), 50);
        assert_eq!(steering.take(), vec![1500, 1900, 1100]);
        assert_eq!(drive.take(), vec![FWD, STOP]);

        m.poll(100);
        assert_eq!(drive.take(), vec![REV]);
    }

    #[test]
    fn test_dwell_target_follows_latest_command() {
        let (mut m, _, drive) = mapper(ControllerConfig::DEFAULT);
        m.apply_auto(AutoCommand::new(90, Direction::Forward), 0);
        m.apply_auto(AutoCommand::new(90, Direction::Backward), 0);
        m.apply_auto(AutoCommand::new(90, Direction::Stop), 40);
        // The dwell still runs to completion
        assert_eq!(m.poll(99), None);
        assert_eq!(m.poll(100).map(|p| p.pulse), Some(STOP));
        assert_eq!(drive.take(), vec![FWD, STOP, STOP]);
        assert_eq!(m.state().previous_direction, Direction::Stop);
    }

    #[test]
    fn test_repeated_command_is_idempotent() {
        let (mut m, steering, drive) = mapper(ControllerConfig::DEFAULT);
        let cmd = AutoCommand::new(75, Direction::Backward);
        let first = m.apply_auto(cmd, 0);
        let second = m.apply_auto(cmd, 5);
        assert_eq!(first, second);
        assert_eq!(steering.take(), vec![1567, 1567]);
        assert_eq!(drive.take(), vec![REV, REV]);
        assert!(m.pending().is_none());
    }

    #[test]
    fn test_stop_all_cancels_pending_dwell() {
        let (mut m, steering, drive) = mapper(ControllerConfig::DEFAULT);
        m.apply_auto(AutoCommand::new(30, Direction::Forward), 0);
        m.apply_auto(AutoCommand::new(30, Direction::Backward), 0);
        m.stop_all();
        assert!(m.pending().is_none());
        assert_eq!(m.poll(1_000), None);
        assert_eq!(drive.take(), vec![FWD, STOP, STOP]);
        assert_eq!(steering.take().last(), Some(&1500));
        assert_eq!(m.state().previous_direction, Direction::Stop);
        assert_eq!(m.state().steering_angle, 90);
    }

    #[test]
    fn test_manual_has_no_dwell_by_default() {
        let (mut m, _, drive) = mapper(ControllerConfig::DEFAULT);
        m.apply_manual(1500, 2000, 0);
        m.apply_manual(1500, 1000, 1);
        assert_eq!(drive.take(), vec![1600, 1400]);
        assert!(m.pending().is_none());
    }

    #[test]
    fn test_manual_dwell_when_enabled() {
        let mut cfg = ControllerConfig::DEFAULT;
        cfg.manual_reversal_dwell = true;
        cfg.reversal_dwell_ms = 250;
        let (mut m, _, drive) = mapper(cfg);
        m.apply_manual(1500, 2000, 0);
        m.apply_manual(1500, 1000, 10);
        assert_eq!(drive.take(), vec![1600, 1500]);
        assert_eq!(m.poll(259), None);
        m.poll(260);
        assert_eq!(drive.take(), vec![1400]);
    }

    #[test]
    fn test_initial_angle_is_domain_midpoint() {
        let (m, _, _) = mapper(ControllerConfig::NARROW);
        assert_eq!(m.state().steering_angle, AngleDomain::NARROW.midpoint());
    }

    #[test]
    fn test_manual_leaves_logical_angle_alone() {
        let (mut m, _, _) = mapper(ControllerConfig::DEFAULT);
        m.apply_auto(AutoCommand::new(30, Direction::Stop), 0);
        m.apply_manual(1900, 1500, 1);
        assert_eq!(m.state().steering_us, 1900);
        assert_eq!(m.state().steering_angle, 30);
        m.stop_all();
        assert_eq!(m.state().steering_angle, 90);
    }

    #[test]
    fn test_steering_survives_unvalidated_domain() {
        for domain in [AngleDomain::new(90, 90), AngleDomain::new(130, 50)] {
            let mut cfg = ControllerConfig::DEFAULT;
            cfg.domain = domain;
            assert!(cfg.validate().is_err());
            for angle in [i16::MIN, 0, 50, 90, 130, i16::MAX] {
                let us = steering_pulse(&cfg, angle);
                assert!((1100..=1900).contains(&us), "{domain:?} {angle} -> {us}");
            }
        }
    }
}
