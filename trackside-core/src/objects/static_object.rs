use crate::imports::*;

/// Scene object visible while the camera window overlaps its track interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticObject {
    pub starting_distance: si::Length,
    pub ending_distance: si::Length,
    /// Dynamic objects are shown and hidden by their owner, never by the sweep
    #[serde(default)]
    pub dynamic: bool,
}

impl StaticObject {
    pub fn new(starting_distance: si::Length, ending_distance: si::Length) -> Self {
        Self {
            starting_distance,
            ending_distance,
            dynamic: false,
        }
    }

    /// True if the object overlaps `[position - backward, position + forward]`
    pub fn in_window(&self, position: si::Length, viewing: &ViewingDistances) -> bool {
        self.starting_distance <= position + viewing.forward
            && self.ending_distance >= position - viewing.backward
    }
}

impl SerdeAPI for StaticObject {
    fn init(&mut self) -> Result<(), Error> {
        if !(self.starting_distance.value.is_finite() && self.ending_distance.value.is_finite()) {
            return Err(Error::Init(format!(
                "object interval must be finite, got {:?}",
                (self.starting_distance, self.ending_distance)
            )));
        }
        if self.ending_distance < self.starting_distance {
            return Err(Error::Init(format!(
                "object ends at {:?} before it starts at {:?}",
                self.ending_distance, self.starting_distance
            )));
        }
        Ok(())
    }
}

/// How far ahead of and behind the camera objects are kept visible
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewingDistances {
    pub forward: si::Length,
    pub backward: si::Length,
}

impl Default for ViewingDistances {
    fn default() -> Self {
        Self {
            forward: 600.0 * uc::M,
            backward: 20.0 * uc::M,
        }
    }
}

impl SerdeAPI for ViewingDistances {
    fn init(&mut self) -> Result<(), Error> {
        if !(self.forward >= si::Length::ZERO && self.backward >= si::Length::ZERO) {
            return Err(Error::Init(format!(
                "viewing distances must be non-negative, got {self:?}"
            )));
        }
        Ok(())
    }
}
