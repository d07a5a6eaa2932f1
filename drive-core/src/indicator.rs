//! Turn indicators driven from the manual steering channel.

use crate::config::ControllerConfig;
use crate::output::IndicatorOutput;
use drive_proto::NEUTRAL_US;

/// Which side, if any, the steering input is deflected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Turn {
    Left,
    Right,
    Straight,
}

/// Classify a raw steering width against the deadband.
///
/// Short pulses turn left. A deflection of exactly the deadband counts as
/// straight.
#[must_use]
pub fn turn_for(steering_raw_us: u32, deadband_us: u16) -> Turn {
    let neutral = NEUTRAL_US as u32;
    let deadband = deadband_us as u32;
    if steering_raw_us < neutral.saturating_sub(deadband) {
        Turn::Left
    } else if steering_raw_us > neutral + deadband {
        Turn::Right
    } else {
        Turn::Straight
    }
}

/// Blinks the left or right indicator while steering is deflected.
///
/// Blinking is paced by timestamps, not by call count. Only the active side
/// toggles; the other is forced off. Both sides are off inside the deadband.
pub struct IndicatorDriver<L, R> {
    left: L,
    right: R,
    deadband_us: u16,
    interval_ms: u32,
    left_on: bool,
    right_on: bool,
    last_toggle_ms: u64,
}

impl<L: IndicatorOutput, R: IndicatorOutput> IndicatorDriver<L, R> {
    pub fn new(left: L, right: R, config: &ControllerConfig) -> Self {
        Self {
            left,
            right,
            deadband_us: config.indicator_deadband_us,
            interval_ms: config.indicator_interval_ms,
            left_on: false,
            right_on: false,
            last_toggle_ms: 0,
        }
    }

    /// Update both indicators for the current steering width.
    pub fn update(&mut self, steering_raw_us: u32, now_ms: u64) -> Turn {
        let turn = turn_for(steering_raw_us, self.deadband_us);
        let due = now_ms.saturating_sub(self.last_toggle_ms) >= self.interval_ms as u64;

        match turn {
            Turn::Left => {
                if due {
                    self.left_on = !self.left_on;
                    self.last_toggle_ms = now_ms;
                }
                self.right_on = false;
            }
            Turn::Right => {
                if due {
                    self.right_on = !self.right_on;
                    self.last_toggle_ms = now_ms;
                }
                self.left_on = false;
            }
            Turn::Straight => {
                self.left_on = false;
                self.right_on = false;
            }
        }

        self.left.set(self.left_on);
        self.right.set(self.right_on);
        turn
    }

    /// Switch both indicators off.
    pub fn all_off(&mut self) {
        self.left_on = false;
        self.right_on = false;
        self.left.set(false);
        self.right.set(false);
    }

    #[inline]
    #[must_use]
    pub const fn lit(&self) -> (bool, bool) {
        (self.left_on, self.right_on)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::vec::Vec;

    use super::*;

    #[derive(Clone, Default)]
    struct Led(Rc<Cell<bool>>);

    impl IndicatorOutput for Led {
        fn set(&mut self, on: bool) {
            self.0.set(on);
        }
    }

    fn driver() -> (IndicatorDriver<Led, Led>, Led, Led) {
        let left = Led::default();
        let right = Led::default();
        let d = IndicatorDriver::new(left.clone(), right.clone(), &ControllerConfig::DEFAULT);
        (d, left, right)
    }

    #[test]
    fn test_turn_classification() {
        assert_eq!(turn_for(1300, 100), Turn::Left);
        assert_eq!(turn_for(1399, 100), Turn::Left);
        assert_eq!(turn_for(1400, 100), Turn::Straight);
        assert_eq!(turn_for(1600, 100), Turn::Straight);
        assert_eq!(turn_for(1601, 100), Turn::Right);
        assert_eq!(turn_for(0, 2000), Turn::Straight);
    }

    #[test]
    fn test_left_blinks_at_interval() {
        let (mut d, left, right) = driver();
        let mut trace = Vec::new();
        for now in (200..=1000).step_by(50) {
            d.update(1300, now);
            trace.push((now, left.0.get()));
            assert!(!right.0.get());
        }
        let toggles: Vec<u64> = trace
            .windows(2)
            .filter(|w| w[0].1 != w[1].1)
            .map(|w| w[1].0)
            .collect();
        assert_eq!(toggles, [400, 600, 800, 1000]);
        assert!(trace[0].1);
    }

    #[test]
    fn test_switching_side_forces_other_off() {
        let (mut d, left, right) = driver();
        d.update(1300, 200);
        assert!(left.0.get());
        d.update(1700, 250);
        assert!(!left.0.get());
        // Toggle clock is shared, so the right side waits for the interval
        assert!(!right.0.get());
        d.update(1700, 400);
        assert!(right.0.get());
    }

    #[test]
    fn test_deadband_turns_both_off() {
        let (mut d, left, right) = driver();
        d.update(1800, 200);
        assert!(right.0.get());
        assert_eq!(d.update(1550, 210), Turn::Straight);
        assert_eq!(d.lit(), (false, false));
        assert!(!left.0.get() && !right.0.get());
    }

    #[test]
    fn test_blink_phase_kept_across_deadband() {
        let (mut d, left, _) = driver();
        d.update(1300, 200);
        assert!(left.0.get());

        d.update(1500, 250);
        assert!(!left.0.get());

        // Back before the interval has run out: no fresh toggle
        d.update(1300, 300);
        assert!(!left.0.get());
        d.update(1300, 399);
        assert!(!left.0.get());

        // Next toggle lands on the original 200 ms grid
        d.update(1300, 400);
        assert!(left.0.get());
        d.update(1300, 599);
        assert!(left.0.get());
        d.update(1300, 600);
        assert!(!left.0.get());
    }

    #[test]
    fn test_long_deadband_excursion_toggles_on_return() {
        let (mut d, left, _) = driver();
        d.update(1300, 200);
        d.update(1500, 250);
        d.update(1500, 900);
        assert!(!left.0.get());
        d.update(1300, 901);
        assert!(left.0.get());
    }

    #[test]
    fn test_clock_going_backwards_does_not_toggle() {
        let (mut d, left, _) = driver();
        d.update(1300, 1000);
        assert!(left.0.get());
        d.update(1300, 10);
        assert!(left.0.get());
    }

    #[test]
    fn test_all_off() {
        let (mut d, left, _) = driver();
        d.update(1000, 500);
        d.all_off();
        assert!(!left.0.get());
        assert_eq!(d.lit(), (false, false));
    }
}
