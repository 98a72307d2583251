//! Actuator lines and the on/off pattern applied to them.
//!
//! The primary signal head faces vehicles (red, yellow, green); the
//! secondary head faces pedestrians (red, green).

/// Stable logical identifier of one binary output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ActuatorLine {
    PrimaryRed = 0,
    PrimaryYellow = 1,
    PrimaryGreen = 2,
    SecondaryRed = 3,
    SecondaryGreen = 4,
}

impl ActuatorLine {
    pub const COUNT: usize = 5;

    /// Every line, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::PrimaryRed,
        Self::PrimaryYellow,
        Self::PrimaryGreen,
        Self::SecondaryRed,
        Self::SecondaryGreen,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::PrimaryRed => "primary-red",
            Self::PrimaryYellow => "primary-yellow",
            Self::PrimaryGreen => "primary-green",
            Self::SecondaryRed => "secondary-red",
            Self::SecondaryGreen => "secondary-green",
        }
    }
}

/// Desired level of all five lines at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorPattern {
    pub primary_red: bool,
    pub primary_yellow: bool,
    pub primary_green: bool,
    pub secondary_red: bool,
    pub secondary_green: bool,
}

impl ActuatorPattern {
    /// Every line de-energised. The only pattern `apply` may show transiently.
    pub const ALL_OFF: Self = Self {
        primary_red: false,
        primary_yellow: false,
        primary_green: false,
        secondary_red: false,
        secondary_green: false,
    };

    /// Level of a single line.
    pub const fn level(&self, line: ActuatorLine) -> bool {
        match line {
            ActuatorLine::PrimaryRed => self.primary_red,
            ActuatorLine::PrimaryYellow => self.primary_yellow,
            ActuatorLine::PrimaryGreen => self.primary_green,
            ActuatorLine::SecondaryRed => self.secondary_red,
            ActuatorLine::SecondaryGreen => self.secondary_green,
        }
    }

    /// Return a copy with one line changed.
    pub const fn with(mut self, line: ActuatorLine, on: bool) -> Self {
        match line {
            ActuatorLine::PrimaryRed => self.primary_red = on,
            ActuatorLine::PrimaryYellow => self.primary_yellow = on,
            ActuatorLine::PrimaryGreen => self.primary_green = on,
            ActuatorLine::SecondaryRed => self.secondary_red = on,
            ActuatorLine::SecondaryGreen => self.secondary_green = on,
        }
        self
    }

    /// `true` when vehicles and pedestrians would both be shown go.
    pub const fn has_conflicting_go(&self) -> bool {
        self.primary_green && self.secondary_green
    }

    pub fn is_all_off(&self) -> bool {
        *self == Self::ALL_OFF
    }
}
