use super::{StaticObject, ViewingDistances};
use crate::imports::*;
use nohash_hasher::IntSet;

/// Offset used to run the sweep once in each direction when refreshing after a
/// viewing distance change
pub const REFRESH_NUDGE: f64 = 0.001;

/// Receiver of show and hide calls, keyed by object index
pub trait ObjectRenderer {
    fn show_object(&mut self, idx: usize);
    fn hide_object(&mut self, idx: usize);
}

/// Renderer registry that only tracks which objects are shown
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleSet {
    shown: IntSet<usize>,
}

impl VisibleSet {
    pub fn contains(&self, idx: usize) -> bool {
        self.shown.contains(&idx)
    }

    pub fn len(&self) -> usize {
        self.shown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }

    /// Shown indices in ascending order
    pub fn sorted(&self) -> Vec<usize> {
        let mut shown: Vec<usize> = self.shown.iter().copied().collect();
        shown.sort_unstable();
        shown
    }
}

impl ObjectRenderer for VisibleSet {
    fn show_object(&mut self, idx: usize) {
        self.shown.insert(idx);
    }

    fn hide_object(&mut self, idx: usize) {
        self.shown.remove(&idx);
    }
}

/// Incremental visibility over a pool of [StaticObject]s.
///
/// `start_cursor` counts the objects, in order of starting distance, whose start
/// is within the forward reach; `end_cursor` counts the objects, in order of
/// ending distance, whose end has fallen out of the backward reach.  Objects
/// counted by the first cursor and not by the second are exactly the shown ones.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilitySweep {
    /// Non-dynamic object indices sorted by starting distance
    sorted_by_start: Vec<usize>,
    /// Non-dynamic object indices sorted by ending distance
    sorted_by_end: Vec<usize>,
    start_cursor: usize,
    end_cursor: usize,
    last_position: si::Length,
    pub viewing: ViewingDistances,
}

impl VisibilitySweep {
    pub fn new(viewing: ViewingDistances) -> Self {
        Self {
            viewing,
            ..Default::default()
        }
    }

    pub fn cursors(&self) -> (usize, usize) {
        (self.start_cursor, self.end_cursor)
    }

    pub fn last_position(&self) -> si::Length {
        self.last_position
    }

    /// Sorts the pool once and shows every object in the window around `position`
    pub fn initialize<R: ObjectRenderer>(
        &mut self,
        objects: &[StaticObject],
        position: si::Length,
        renderer: &mut R,
    ) {
        let candidates = || (0..objects.len()).filter(|i| !objects[*i].dynamic);
        self.sorted_by_start = candidates().collect();
        self.sorted_by_end = candidates().collect();
        // stable sorts keep ties in pool order
        self.sorted_by_start.sort_by(|a, b| {
            objects[*a]
                .starting_distance
                .value
                .total_cmp(&objects[*b].starting_distance.value)
        });
        self.sorted_by_end.sort_by(|a, b| {
            objects[*a]
                .ending_distance
                .value
                .total_cmp(&objects[*b].ending_distance.value)
        });

        let ahead = position + self.viewing.forward;
        let behind = position - self.viewing.backward;
        self.start_cursor = self
            .sorted_by_start
            .partition_point(|o| objects[*o].starting_distance <= ahead);
        self.end_cursor = self
            .sorted_by_end
            .partition_point(|o| objects[*o].ending_distance < behind);
        self.last_position = position;
        for &o in &self.sorted_by_start[..self.start_cursor] {
            if objects[o].ending_distance >= behind {
                renderer.show_object(o);
            }
        }
        debug!(
            "visibility initialized at {:?} for {} objects, cursors {:?}",
            position,
            self.sorted_by_start.len(),
            self.cursors()
        );
    }

    /// Moves the window to `position`, showing objects that enter it and hiding
    /// objects that leave it
    pub fn update<R: ObjectRenderer>(
        &mut self,
        objects: &[StaticObject],
        position: si::Length,
        renderer: &mut R,
    ) {
        let n = self.sorted_by_start.len();
        let ahead = position + self.viewing.forward;
        let behind = position - self.viewing.backward;
        let before = self.cursors();
        if position < self.last_position {
            while self.end_cursor > 0 {
                let o = self.sorted_by_end[self.end_cursor - 1];
                if objects[o].ending_distance < behind {
                    break;
                }
                renderer.show_object(o);
                self.end_cursor -= 1;
            }
            while self.start_cursor > 0 {
                let o = self.sorted_by_start[self.start_cursor - 1];
                if objects[o].starting_distance <= ahead {
                    break;
                }
                renderer.hide_object(o);
                self.start_cursor -= 1;
            }
        } else if position > self.last_position {
            while self.start_cursor < n {
                let o = self.sorted_by_start[self.start_cursor];
                if objects[o].starting_distance > ahead {
                    break;
                }
                renderer.show_object(o);
                self.start_cursor += 1;
            }
            while self.end_cursor < n {
                let o = self.sorted_by_end[self.end_cursor];
                if objects[o].ending_distance >= behind {
                    break;
                }
                renderer.hide_object(o);
                self.end_cursor += 1;
            }
        }
        if self.cursors() != before {
            debug!(
                "visibility cursors {:?} -> {:?} at {:?}",
                before,
                self.cursors(),
                position
            );
        }
        self.last_position = position;
    }

    /// Re-evaluates the window at `position` after the viewing distances changed,
    /// sweeping once in each direction
    pub fn refresh<R: ObjectRenderer>(
        &mut self,
        objects: &[StaticObject],
        position: si::Length,
        renderer: &mut R,
    ) {
        debug!("refreshing visibility at {:?}", position);
        let nudge = REFRESH_NUDGE * uc::M;
        self.update(objects, position, renderer);
        self.update(objects, position - nudge, renderer);
        self.update(objects, position + nudge, renderer);
        self.update(objects, position, renderer);
    }

    /// Moves to `position`, refreshing if `viewing_distance_changed`
    pub fn update_visibility<R: ObjectRenderer>(
        &mut self,
        objects: &[StaticObject],
        position: si::Length,
        viewing_distance_changed: bool,
        renderer: &mut R,
    ) {
        if viewing_distance_changed {
            self.refresh(objects, position, renderer);
        } else {
            self.update(objects, position, renderer);
        }
    }
}
