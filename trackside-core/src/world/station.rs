use crate::imports::*;

/// Train protection system, used both to describe what a station requires and
/// which system a train is running under
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetySystem {
    #[default]
    Any,
    Ats,
    Atc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableTextures {
    pub daytime: Option<usize>,
    pub nighttime: Option<usize>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    /// Whether trains are scheduled to stop here
    #[serde(default)]
    pub stop_at_station: bool,
    #[serde(default)]
    pub safety_system: SafetySystem,
    /// Timetable shown to the driver after departing this station
    #[serde(default)]
    pub timetable: Option<TimetableTextures>,
}

impl Station {
    pub fn new<S: Into<String>>(name: S, stop_at_station: bool) -> Self {
        Self {
            name: name.into(),
            stop_at_station,
            ..Default::default()
        }
    }
}
