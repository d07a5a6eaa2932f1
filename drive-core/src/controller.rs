//! VehicleController: the cooperative main cycle.
//!
//! Ties the pulse records, line decoder, mode arbiter, actuator mapper and
//! indicator driver together. Firmware calls [`VehicleController::feed_byte`]
//! for every received serial byte and [`VehicleController::step`] once per
//! control tick; neither call blocks.

use crate::actuator::{ActuatorMapper, OutputState};
use crate::config::ControllerConfig;
use crate::indicator::IndicatorDriver;
use crate::mode::{ModeArbiter, ModeTransition};
use crate::output::{IndicatorOutput, PulseOutput, StatusSink};
use crate::pulse::PulseChannel;
use drive_proto::{Decoded, LineDecoder, LineEvent, StatusLine, VehicleMode};

/// The three monitored receiver channels.
#[derive(Clone, Copy)]
pub struct RcChannels<'a> {
    pub steering: &'a PulseChannel,
    pub throttle: &'a PulseChannel,
    pub mode: &'a PulseChannel,
}

/// Dual-mode drive controller.
///
/// # Mode Changes
///
/// A fresh mode pulse that changes the mode stops every actuator, announces
/// the new mode and ends the cycle. Inputs are routed to the new mode from
/// the next cycle on. Commands buffered under the old mode are dropped.
///
/// # Failsafe
///
/// In Manual mode, if either steering or throttle goes without a fresh
/// pulse for `rc_timeout_ms`, outputs are stopped once and held there until
/// both channels are refreshing again.
pub struct VehicleController<'a, S, D, L, R, T> {
    rc: RcChannels<'a>,
    decoder: LineDecoder,
    arbiter: ModeArbiter,
    mapper: ActuatorMapper<S, D>,
    indicators: IndicatorDriver<L, R>,
    status: T,
    config: ControllerConfig,
    pending_command: Option<Decoded>,
    last_steering_ms: u64,
    last_throttle_ms: u64,
    failsafe: bool,
    last_manual_status_ms: Option<u64>,
}

impl<'a, S, D, L, R, T> VehicleController<'a, S, D, L, R, T>
where
    S: PulseOutput,
    D: PulseOutput,
    L: IndicatorOutput,
    R: IndicatorOutput,
    T: StatusSink,
{
    /// Assemble a controller. The decoder clamps to the mapper's domain.
    pub fn new(
        rc: RcChannels<'a>,
        mapper: ActuatorMapper<S, D>,
        indicators: IndicatorDriver<L, R>,
        status: T,
    ) -> Self {
        let config = *mapper.config();
        debug_assert!(config.validate().is_ok());
        Self {
            rc,
            decoder: LineDecoder::new(config.domain),
            arbiter: ModeArbiter::new(),
            mapper,
            indicators,
            status,
            config,
            pending_command: None,
            last_steering_ms: 0,
            last_throttle_ms: 0,
            failsafe: false,
            last_manual_status_ms: None,
        }
    }

    /// Feed one byte from the autonomous driver's serial link.
    ///
    /// A completed line is kept for the next [`step`](Self::step) only while
    /// in Auto mode; a newer line replaces an unapplied one.
    pub fn feed_byte(&mut self, byte: u8) -> Option<LineEvent> {
        let event = self.decoder.push_byte(byte)?;
        match event {
            LineEvent::Command(decoded) => {
                if self.arbiter.mode() == VehicleMode::Auto {
                    self.pending_command = Some(decoded);
                } else {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("command discarded outside auto mode");
                }
            }
            LineEvent::Overflow => {
                #[cfg(feature = "defmt")]
                defmt::warn!("command line too long, dropped");
            }
        }
        Some(event)
    }

    /// Run one control cycle at `now_ms`.
    ///
    /// Returns the mode transition if one happened this cycle.
    pub fn step(&mut self, now_ms: u64) -> Option<ModeTransition> {
        if let Some(width) = self.rc.mode.take_fresh() {
            if let Some(transition) = self.arbiter.observe(width) {
                self.enter_mode(transition, now_ms);
                return Some(transition);
            }
        }

        self.mapper.poll(now_ms);

        match self.arbiter.mode() {
            VehicleMode::Undetermined => self.stop_all(),
            VehicleMode::Manual => self.run_manual(now_ms),
            VehicleMode::Auto => self.run_auto(now_ms),
        }
        None
    }

    /// Steering to neutral, drive to stop, indicators off.
    pub fn stop_all(&mut self) {
        self.mapper.stop_all();
        self.indicators.all_off();
    }

    /// Emit a line on the status sink outside the control cycle.
    pub fn announce(&mut self, line: &StatusLine) {
        self.status.emit(line);
    }

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> VehicleMode {
        self.arbiter.mode()
    }

    #[inline]
    #[must_use]
    pub const fn output_state(&self) -> &OutputState {
        self.mapper.state()
    }

    /// True while the manual-mode watchdog holds outputs stopped.
    #[inline]
    #[must_use]
    pub const fn is_failsafe(&self) -> bool {
        self.failsafe
    }

    fn enter_mode(&mut self, transition: ModeTransition, now_ms: u64) {
        self.stop_all();
        #[cfg(feature = "defmt")]
        defmt::info!("mode {} -> {}", transition.from, transition.to);
        self.status.emit(&StatusLine::Mode(transition.to));

        // A line started under the old mode must not complete under the new one
        self.decoder.reset();
        self.pending_command = None;
        self.failsafe = false;
        self.last_steering_ms = now_ms;
        self.last_throttle_ms = now_ms;
        self.last_manual_status_ms = None;
    }

    fn run_manual(&mut self, now_ms: u64) {
        let steering = self.rc.steering.take_fresh();
        let throttle = self.rc.throttle.take_fresh();
        if steering.is_some() {
            self.last_steering_ms = now_ms;
        }
        if throttle.is_some() {
            self.last_throttle_ms = now_ms;
        }

        if let Some(timeout_ms) = self.config.rc_timeout_ms {
            let timeout_ms = timeout_ms as u64;
            let stale = now_ms.saturating_sub(self.last_steering_ms) >= timeout_ms
                || now_ms.saturating_sub(self.last_throttle_ms) >= timeout_ms;
            if stale {
                if !self.failsafe {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("rc channel silent for {} ms, stopping", timeout_ms);
                    self.failsafe = true;
                    self.stop_all();
                    self.status.emit(&StatusLine::Failsafe);
                }
                return;
            }
        }

        if steering.is_some() || throttle.is_some() {
            if self.failsafe {
                #[cfg(feature = "defmt")]
                defmt::info!("rc signal restored");
                self.failsafe = false;
            }

            let steering_raw_us = steering.unwrap_or_else(|| self.rc.steering.latest());
            let throttle_raw_us = throttle.unwrap_or_else(|| self.rc.throttle.latest());
            let applied = self
                .mapper
                .apply_manual(steering_raw_us, throttle_raw_us, now_ms);

            let interval_ms = self.config.manual_status_interval_ms as u64;
            let due = self
                .last_manual_status_ms
                .is_none_or(|last| now_ms.saturating_sub(last) >= interval_ms);
            if due {
                self.status.emit(&StatusLine::Manual {
                    steering_raw_us,
                    throttle_raw_us,
                    drive_us: applied.drive_us,
                });
                self.last_manual_status_ms = Some(now_ms);
            }
        }

        if !self.failsafe {
            self.indicators.update(self.rc.steering.latest(), now_ms);
        }
    }

    fn run_auto(&mut self, now_ms: u64) {
        let Some(decoded) = self.pending_command.take() else {
            return;
        };

        if let Some(_reason) = decoded.error() {
            #[cfg(feature = "defmt")]
            defmt::warn!("invalid command ({}), stopping", _reason);
            self.status.emit(&StatusLine::Rejected);
        }

        let command = decoded.command();
        let applied = self.mapper.apply_auto(command, now_ms);
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "auto angle={} dir={} -> steering={} drive={}",
            command.steering_angle,
            command.direction,
            applied.steering_us,
            applied.drive_us
        );
        self.status.emit(&StatusLine::Auto {
            angle: command.steering_angle,
            direction: command.direction,
            steering_us: applied.steering_us,
            drive_us: applied.drive_us,
        });
    }
}
