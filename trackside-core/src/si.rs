//! Import uom si system and add unit constants
//! Zero values should be created using standard uom syntax ($Quantity::ZERO) after adding "use crate::imports::*"
//! Non-zero values should be created using standard uom syntax ($Quantity::new::<$unit>($value)) or multiplication syntax ($value * $UNIT_CONSTANT)

use uom::si;

pub use si::angle::{degree, radian};
pub use si::angular_velocity::radian_per_second;
pub use si::f64::{Angle, AngularVelocity, Length, Ratio, Time, Velocity};
pub use si::length::{kilometer, meter};
pub use si::ratio::ratio;
pub use si::time::second;
pub use si::velocity::{kilometer_per_hour, meter_per_second};
