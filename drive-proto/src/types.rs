//! Protocol value types: AngleDomain, Direction, AutoCommand, VehicleMode.

/// Neutral pulse width in microseconds (centered steering, stopped drive).
pub const NEUTRAL_US: u16 = 1500;

/// Inclusive range of logical steering angles accepted from the autonomous driver.
///
/// Deployments calibrate either the full servo sweep ([`AngleDomain::FULL`])
/// or a narrower band around center ([`AngleDomain::NARROW`]).
///
/// # Example
///
/// ```
/// use drive_proto::AngleDomain;
///
/// let domain = AngleDomain::NARROW;
/// assert_eq!(domain.clamp(10), 50);
/// assert_eq!(domain.clamp(999), 130);
/// assert_eq!(domain.midpoint(), 90);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AngleDomain {
    pub min: i16,
    pub max: i16,
}

impl AngleDomain {
    /// 0-180 degrees.
    pub const FULL: Self = Self { min: 0, max: 180 };

    /// 50-130 degrees.
    pub const NARROW: Self = Self { min: 50, max: 130 };

    #[must_use]
    pub const fn new(min: i16, max: i16) -> Self {
        Self { min, max }
    }

    /// Center of the domain, used as the fallback angle.
    #[inline]
    #[must_use]
    pub const fn midpoint(self) -> i16 {
        ((self.min as i32 + self.max as i32) / 2) as i16
    }

    /// Width of the domain (`max - min`).
    #[inline]
    #[must_use]
    pub const fn span(self) -> i32 {
        self.max as i32 - self.min as i32
    }

    /// Clamp an arbitrary angle into the domain.
    ///
    /// Never panics; an inverted domain pins every angle to `max`.
    #[inline]
    #[must_use]
    pub const fn clamp(self, angle: i32) -> i16 {
        let lower = if angle < self.min as i32 { self.min as i32 } else { angle };
        let upper = if lower > self.max as i32 { self.max as i32 } else { lower };
        upper as i16
    }

    /// Check if the angle lies inside the domain.
    #[inline]
    #[must_use]
    pub const fn contains(self, angle: i16) -> bool {
        angle >= self.min && angle <= self.max
    }
}

/// Drive direction requested by a command.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward,
    Backward,
    #[default]
    Stop,
}

impl Direction {
    /// Map a protocol direction character (`F`, `B`, `S`) to a direction.
    ///
    /// Case-sensitive; returns `None` for any other byte.
    #[inline]
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'F' => Some(Self::Forward),
            b'B' => Some(Self::Backward),
            b'S' => Some(Self::Stop),
            _ => None,
        }
    }

    /// Protocol character for this direction.
    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Forward => b'F',
            Self::Backward => b'B',
            Self::Stop => b'S',
        }
    }

    /// True when going from `previous` to `self` flips the motor between
    /// forward and backward.
    #[inline]
    #[must_use]
    pub const fn reverses(self, previous: Direction) -> bool {
        matches!(
            (previous, self),
            (Self::Forward, Self::Backward) | (Self::Backward, Self::Forward)
        )
    }
}

/// A single command from the autonomous driver.
///
/// Commands are not accumulated: each decoded line replaces the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub struct AutoCommand {
    pub steering_angle: i16,
    pub direction: Direction,
}

impl AutoCommand {
    #[inline]
    pub const fn new(steering_angle: i16, direction: Direction) -> Self {
        Self {
            steering_angle,
            direction,
        }
    }

    /// Centered steering and stopped drive for the given domain.
    #[inline]
    pub const fn neutral(domain: AngleDomain) -> Self {
        Self::new(domain.midpoint(), Direction::Stop)
    }
}

/// Which source is currently driving the vehicle.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VehicleMode {
    /// No mode pulse seen yet since power-on. Outputs are held neutral.
    #[default]
    Undetermined,
    /// The operator's transmitter drives the actuators.
    Manual,
    /// Commands arrive over the serial line.
    Auto,
}

impl VehicleMode {
    /// Name used in the `MODE:` announcement line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undetermined => "UNDETERMINED",
            Self::Manual => "MANUAL",
            Self::Auto => "AUTO",
        }
    }
}
