//! Track model: an ordered sequence of [TrackElement]s with attached
//! [TrackEvent]s, and the [TrackFollower] cursors that walk it.

use crate::imports::*;

pub mod track_element;
pub mod track_event;
pub mod track_follower;

pub use track_element::{CantInterpolation, Frame, TrackElement};
pub use track_event::{EventKind, TrackEvent, Trigger, TriggerType};
pub use track_follower::{FollowerPose, FollowerPoseHistoryVec, TrackFollower, EVENT_WINDOW_SLACK};

#[cfg(test)]
mod tests;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Elements in strictly increasing order of starting position
    pub elements: Vec<TrackElement>,
}

impl Track {
    pub fn new(elements: Vec<TrackElement>) -> anyhow::Result<Self> {
        let mut track = Self { elements };
        track.init()?;
        Ok(track)
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl SerdeAPI for Track {
    /// Validates element ordering and values and sorts each element's events by position
    fn init(&mut self) -> Result<(), Error> {
        for (i, element) in self.elements.iter_mut().enumerate() {
            let finite = element.starting_track_position.value.is_finite()
                && element.curve_radius.value.is_finite()
                && element.curve_cant.value.is_finite()
                && element.inaccuracy.is_finite()
                && element.adhesion_multiplier.is_finite()
                && element.frame.position.is_finite()
                && element.frame.direction.is_finite();
            if !finite {
                return Err(Error::Init(format!("element {i} has non-finite values")));
            }
            if let Some(j) = element
                .events
                .iter()
                .position(|e| !e.track_position_delta.value.is_finite())
            {
                return Err(Error::Init(format!(
                    "event {j} of element {i} has a non-finite position"
                )));
            }
            element
                .events
                .sort_by(|a, b| a.track_position_delta.value.total_cmp(&b.track_position_delta.value));
        }
        if !self
            .elements
            .windows(2)
            .all(|w| w[0].starting_track_position < w[1].starting_track_position)
        {
            return Err(Error::Init(
                "element starting positions must be strictly increasing".into(),
            ));
        }
        Ok(())
    }
}
