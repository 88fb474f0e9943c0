//! Mutable state of the subsystems that track events write into: scenery,
//! stations, signaling, trains, driver notices and the audio queue.

use crate::imports::*;
use crate::track::TriggerType;

pub mod notice;
pub mod scenery;
pub mod signaling;
pub mod station;
pub mod train;

pub use notice::{Notice, NoticeColor, SoundRequest};
pub use scenery::{Fog, Scenery};
pub use signaling::{update_all_sections, update_section, Section, SectionAspect, SectionKind};
pub use station::{SafetySystem, Station, TimetableTextures};
pub use train::{
    Brightness, Car, CarSound, PassAlarm, PendingTransponder, RailSounds, StopState, Train,
    TransponderKind,
};

/// One invocation of an event's trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crossing {
    pub element: usize,
    pub event: usize,
    pub dir: Dir,
    pub trigger_type: TriggerType,
    pub train: Option<usize>,
    pub car: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    #[serde(default)]
    pub scenery: Scenery,
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub trains: Vec<Train>,
    /// Driver notices, oldest first, drained by the HUD
    #[serde(default)]
    pub notices: Vec<Notice>,
    /// Audio requests, oldest first, drained by the audio subsystem
    #[serde(default)]
    pub sound_requests: Vec<SoundRequest>,
    /// While set, sound events neither play nor latch
    #[serde(default)]
    pub suppress_sound_events: bool,
    /// Timetable the player should currently see
    #[serde(default)]
    pub custom_timetable: Option<TimetableTextures>,
    /// Ordered record of trigger invocations, kept only when enabled
    #[serde(default)]
    pub crossings: Option<Vec<Crossing>>,
}

impl SerdeAPI for World {
    fn init(&mut self) -> Result<(), Error> {
        let n_sections = self.sections.len();
        for (i, section) in self.sections.iter().enumerate() {
            for link in [section.previous, section.next].into_iter().flatten() {
                if link >= n_sections {
                    return Err(Error::Init(format!(
                        "section {i} links to missing section {link}"
                    )));
                }
            }
            if let Some(a) = section.current_aspect {
                if a >= section.aspects.len() {
                    return Err(Error::Init(format!(
                        "section {i} aspect {a} out of range"
                    )));
                }
            }
        }
        for (i, train) in self.trains.iter().enumerate() {
            if train.cars.is_empty() {
                return Err(Error::Init(format!("train {i} has no cars")));
            }
        }
        Ok(())
    }
}

impl World {
    /// Starts keeping the crossing journal, clearing any previous record
    pub fn record_crossings(&mut self) {
        self.crossings = Some(Vec::new());
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn drain_sound_requests(&mut self) -> Vec<SoundRequest> {
        std::mem::take(&mut self.sound_requests)
    }

    pub fn train(&self, idx: usize) -> anyhow::Result<&Train> {
        self.trains
            .get(idx)
            .with_context(|| format!("{}\ntrain {idx} not found", format_dbg!()))
    }

    pub fn train_mut(&mut self, idx: usize) -> anyhow::Result<&mut Train> {
        self.trains
            .get_mut(idx)
            .with_context(|| format!("{}\ntrain {idx} not found", format_dbg!()))
    }

    pub fn player_train(&self) -> Option<usize> {
        self.trains.iter().position(|t| t.is_player)
    }

    pub fn update_all_sections(&mut self) {
        update_all_sections(&mut self.sections);
    }

    /// Removes a train from service and frees every block it occupied
    pub fn dispose_train(&mut self, idx: usize) {
        let Some(train) = self.trains.get_mut(idx) else {
            warn!("{}\ntrain {} out of range", format_dbg!(), idx);
            return;
        };
        train.disposed = true;
        train.current_section = None;
        info!("disposing train {}", idx);
        let occupied: Vec<usize> = self
            .sections
            .iter()
            .enumerate()
            .filter(|(_, s)| s.contains(idx))
            .map(|(i, _)| i)
            .collect();
        for s in occupied {
            self.sections[s].leave(idx);
            update_section(&mut self.sections, s);
        }
    }

    pub(crate) fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_init_rejects_dangling_section() {
        let mut world = World {
            sections: vec![Section {
                next: Some(4),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(world.init().is_err());
        world.sections[0].next = None;
        assert!(world.init().is_ok());
    }

    #[test]
    fn test_world_yaml_round_trip() {
        let mut world = World::default();
        world.trains.push(Train::player(3));
        world.stations.push(Station::new("Alpha", true));
        let yaml = world.to_yaml().unwrap();
        let loaded = World::from_yaml(yaml, false).unwrap();
        assert_eq!(loaded, world);
    }
}
