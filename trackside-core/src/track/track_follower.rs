use super::track_element::TrackElement;
use super::track_event::{Trigger, TriggerType};
use super::Track;
use crate::imports::*;
use crate::world::{Crossing, World};

/// Extra reach, in meters, past an element boundary when collecting the events
/// crossed while walking over that element
pub const EVENT_WINDOW_SLACK: f64 = 0.01;

/// Snapshot of a follower's place on the track and in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, HistoryVec)]
pub struct FollowerPose {
    pub track_position: si::Length,
    pub element: usize,
    pub position: DVec3,
    pub direction: DVec3,
    pub up: DVec3,
    pub side: DVec3,
}

/// Cursor for one moving point on the track: an axle of a train or the camera
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFollower {
    pub last_track_element: usize,
    pub track_position: si::Length,
    pub world_position: DVec3,
    pub world_direction: DVec3,
    pub world_up: DVec3,
    pub world_side: DVec3,
    pub curve_radius: si::Length,
    pub curve_cant: si::Length,
    pub adhesion_multiplier: f64,
    pub trigger_type: TriggerType,
    /// Owning train, `None` for the camera
    pub train: Option<usize>,
    pub car: usize,
}

impl TrackFollower {
    pub fn new(trigger_type: TriggerType, train: Option<usize>, car: usize) -> Self {
        Self {
            last_track_element: 0,
            track_position: si::Length::ZERO,
            world_position: DVec3::ZERO,
            world_direction: DVec3::Z,
            world_up: DVec3::Y,
            world_side: DVec3::X,
            curve_radius: si::Length::ZERO,
            curve_cant: si::Length::ZERO,
            adhesion_multiplier: 1.0,
            trigger_type,
            train,
            car,
        }
    }

    pub fn camera() -> Self {
        Self::new(TriggerType::Camera, None, 0)
    }

    pub fn pose(&self) -> FollowerPose {
        FollowerPose {
            track_position: self.track_position,
            element: self.last_track_element,
            position: self.world_position,
            direction: self.world_direction,
            up: self.world_up,
            side: self.world_side,
        }
    }

    /// Puts the follower at `position` without firing any event
    pub fn place_at(
        &mut self,
        track: &Track,
        position: si::Length,
        add_inaccuracy: bool,
    ) -> anyhow::Result<()> {
        let elements = track.elements.as_slice();
        let hint = self.last_track_element.min(elements.len().saturating_sub(1));
        let i = elements
            .calc_idx(position, hint, &Dir::Unk)
            .with_context(|| format_dbg!(position))?;
        self.update_pose(elements, i, position, add_inaccuracy);
        self.adhesion_multiplier = elements[i].adhesion_multiplier;
        self.track_position = position;
        self.last_track_element = i;
        Ok(())
    }

    /// Moves the follower to `new_position`, firing every event crossed on the way in
    /// travel order.  Does nothing on an empty track.
    pub fn move_to(
        &mut self,
        track: &mut Track,
        world: &mut World,
        new_position: si::Length,
        update_world_coordinates: bool,
        add_inaccuracy: bool,
    ) {
        let n = track.elements.len();
        if n == 0 {
            return;
        }
        let slack = EVENT_WINDOW_SLACK * uc::M;
        let start_element = self.last_track_element;
        let mut i = self.last_track_element.min(n - 1);

        let mut ran_off_front = false;
        while new_position < track.elements[i].starting_track_position {
            let element = &mut track.elements[i];
            let old_delta = self.track_position - element.starting_track_position;
            self.check_events(i, element, Dir::Bwd, old_delta, -slack, world);
            if i == 0 {
                ran_off_front = true;
                break;
            }
            i -= 1;
        }
        if !ran_off_front {
            while i + 1 < n && new_position >= track.elements[i + 1].starting_track_position {
                let span = track.elements[i + 1].starting_track_position
                    - track.elements[i].starting_track_position;
                let element = &mut track.elements[i];
                let old_delta = self.track_position - element.starting_track_position;
                self.check_events(i, element, Dir::Fwd, old_delta, span + slack, world);
                i += 1;
            }
        }
        if i != start_element {
            debug!(
                "{:?} follower crossed from element {} to {}",
                self.trigger_type, start_element, i
            );
        }

        let start = track.elements[i].starting_track_position;
        // the walk already covered element 0 down to the slack when running off the front
        let old_delta = if ran_off_front {
            -slack
        } else {
            self.track_position - start
        };
        let new_delta = new_position - start;
        if update_world_coordinates {
            self.update_pose(&track.elements, i, new_position, add_inaccuracy);
        }
        self.adhesion_multiplier = track.elements[i].adhesion_multiplier;

        let dir = Dir::from_delta(new_delta - old_delta);
        self.check_events(i, &mut track.elements[i], dir, old_delta, new_delta, world);
        self.track_position = new_position;
        self.last_track_element = i;
    }

    /// Recomputes the cached world pose, radius and cant for `position` on element `i`
    fn update_pose(
        &mut self,
        elements: &[TrackElement],
        i: usize,
        position: si::Length,
        add_inaccuracy: bool,
    ) {
        let element = &elements[i];
        let delta = position - element.starting_track_position;
        let frame = element.frame_at(delta);
        self.world_position = frame.position;
        self.world_direction = frame.direction;
        self.world_up = frame.up;
        self.world_side = frame.side;
        self.curve_radius = element.curve_radius;
        self.curve_cant = element.cant_at(delta, elements.get(i + 1));
        if add_inaccuracy {
            let (f, g) = element.irregularity_at(position);
            self.world_position += f * self.world_side + g * self.world_up;
        }
    }

    /// Fires the events of `element` lying in the window from `old_delta` to `new_delta`,
    /// in travel order.  Backward, an event at `d` fires iff `old_delta > d >= new_delta`;
    /// forward iff `old_delta < d <= new_delta`.
    fn check_events(
        &self,
        element_idx: usize,
        element: &mut TrackElement,
        dir: Dir,
        old_delta: si::Length,
        new_delta: si::Length,
        world: &mut World,
    ) {
        if dir == Dir::Unk {
            return;
        }
        let start = element.starting_track_position;
        let n_events = element.events.len();
        for k in 0..n_events {
            let event_idx = if dir == Dir::Bwd { n_events - 1 - k } else { k };
            let event = &mut element.events[event_idx];
            let d = event.track_position_delta;
            let crossed = match dir {
                Dir::Bwd => old_delta > d && new_delta <= d,
                _ => old_delta < d && new_delta >= d,
            };
            if !crossed {
                continue;
            }
            let trigger = Trigger {
                dir,
                trigger_type: self.trigger_type,
                train: self.train,
                car: self.car,
                track_position: start + d,
            };
            if event.try_trigger(&trigger, world) {
                if let Some(journal) = world.crossings.as_mut() {
                    journal.push(Crossing {
                        element: element_idx,
                        event: event_idx,
                        dir,
                        trigger_type: self.trigger_type,
                        train: self.train,
                        car: self.car,
                    });
                }
            }
        }
    }
}
