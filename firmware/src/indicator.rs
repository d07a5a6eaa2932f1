//! LED turn indicators.

use drive_core::IndicatorOutput;
use embedded_hal::digital::OutputPin;

/// An active-high LED on a GPIO output.
pub struct LedIndicator<P> {
    pin: P,
}

impl<P: OutputPin> LedIndicator<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: OutputPin> IndicatorOutput for LedIndicator<P> {
    fn set(&mut self, on: bool) {
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        if result.is_err() {
            defmt::trace!("indicator write failed");
        }
    }
}
