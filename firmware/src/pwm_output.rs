//! Servo-style PWM outputs.
//!
//! Both the steering servo and the ESC take a 50 Hz pulse train. The slice
//! is clocked at 1 MHz so one counter tick is one microsecond, which makes
//! the duty cycle equal to the pulse width.

use drive_core::PulseOutput;
use embassy_rp::pwm::Config as PwmConfig;
use embedded_hal::pwm::SetDutyCycle;
use fixed_macro::fixed;

/// One PWM period at 50 Hz.
pub const PWM_PERIOD_US: u16 = 20_000;

/// Slice configuration for a 1 us tick and 20 ms period, starting at `initial_us`.
///
/// 125 MHz system clock / 125 = 1 MHz.
#[must_use]
pub fn servo_pwm_config(initial_us: u16) -> PwmConfig {
    let mut config = PwmConfig::default();
    config.divider = fixed!(125: U12F4);
    config.top = PWM_PERIOD_US - 1;
    config.compare_a = initial_us;
    config
}

/// A PWM channel driving a servo or ESC.
pub struct ServoPwm<P> {
    pwm: P,
}

impl<P: SetDutyCycle> ServoPwm<P> {
    /// Wrap a channel already configured with [`servo_pwm_config`].
    pub fn new(pwm: P) -> Self {
        Self { pwm }
    }
}

impl<P: SetDutyCycle> PulseOutput for ServoPwm<P> {
    fn write_us(&mut self, width_us: u16) {
        let width_us = width_us.min(PWM_PERIOD_US);
        if self.pwm.set_duty_cycle(width_us).is_err() {
            defmt::error!("pwm write of {} us failed", width_us);
        }
    }
}
