//! Static scene objects and the camera-driven visibility sweep over them.

use crate::imports::*;

pub mod static_object;
pub mod visibility;

pub use static_object::{StaticObject, ViewingDistances};
pub use visibility::{ObjectRenderer, VisibilitySweep, VisibleSet, REFRESH_NUDGE};
