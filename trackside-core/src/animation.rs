//! Spring damping of animated rotations.

use crate::imports::*;

pub mod damping;

pub use damping::{Damping, DampingMode};

/// Optional dampers for the three rotation axes of one animated object
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationDamping {
    #[serde(default)]
    pub x: Option<Damping>,
    #[serde(default)]
    pub y: Option<Damping>,
    #[serde(default)]
    pub z: Option<Damping>,
}

impl RotationDamping {
    /// Damps each axis that has a damper and passes the others through
    pub fn update(&mut self, dt: si::Time, targets: [si::Angle; 3]) -> [si::Angle; 3] {
        let [x, y, z] = targets;
        let mut damp = |damping: &mut Option<Damping>, target: si::Angle| match damping {
            Some(d) => d.update(dt, target),
            None => target,
        };
        [damp(&mut self.x, x), damp(&mut self.y, y), damp(&mut self.z, z)]
    }
}

impl SerdeAPI for RotationDamping {
    fn init(&mut self) -> Result<(), Error> {
        for d in [&mut self.x, &mut self.y, &mut self.z].into_iter().flatten() {
            d.init()?;
        }
        Ok(())
    }
}
