//! GPIO pin assignments for the signal heads.
//!
//! Single source of truth: the composition root builds the output pins
//! from this module rather than hard-coding pin numbers.

use crate::fsm::pattern::ActuatorLine;

// ---------------------------------------------------------------------------
// Primary head (vehicles)
// ---------------------------------------------------------------------------

/// Digital output: vehicle red lamp (active HIGH).
pub const PRIMARY_RED_GPIO: i32 = 13;
/// Digital output: vehicle yellow lamp (active HIGH).
pub const PRIMARY_YELLOW_GPIO: i32 = 12;
/// Digital output: vehicle green lamp (active HIGH).
pub const PRIMARY_GREEN_GPIO: i32 = 11;

// ---------------------------------------------------------------------------
// Secondary head (pedestrians)
// ---------------------------------------------------------------------------

/// Digital output: pedestrian red lamp (active HIGH).
pub const SECONDARY_RED_GPIO: i32 = 9;
/// Digital output: pedestrian green lamp (active HIGH).
pub const SECONDARY_GREEN_GPIO: i32 = 10;

/// GPIO number driving `line`.
pub const fn gpio_for(line: ActuatorLine) -> i32 {
    match line {
        ActuatorLine::PrimaryRed => PRIMARY_RED_GPIO,
        ActuatorLine::PrimaryYellow => PRIMARY_YELLOW_GPIO,
        ActuatorLine::PrimaryGreen => PRIMARY_GREEN_GPIO,
        ActuatorLine::SecondaryRed => SECONDARY_RED_GPIO,
        ActuatorLine::SecondaryGreen => SECONDARY_GREEN_GPIO,
    }
}
