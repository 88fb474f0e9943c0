use crate::imports::*;

/// Message shown to the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notice {
    /// Passed a signal showing stop
    SignalStop,
    /// Entered a section faster than its aspect allows
    SignalOverspeed,
    /// Exceeded a newly imposed route limit
    RouteOverspeed,
    /// Left a station without stopping
    StationPassed { station: String },
    /// Left a station before boarding completed
    StationPassedBoarding { station: String },
}

impl Notice {
    pub fn color(&self) -> NoticeColor {
        match self {
            Self::SignalStop | Self::StationPassedBoarding { .. } => NoticeColor::Red,
            Self::SignalOverspeed | Self::RouteOverspeed | Self::StationPassed { .. } => {
                NoticeColor::Orange
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeColor {
    Red,
    Orange,
}

/// Request queued for the audio subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SoundRequest {
    Play {
        buffer: usize,
        /// Emitting train, `None` for world-fixed sounds
        train: Option<usize>,
        car: usize,
        position: DVec3,
        pitch: f64,
        gain: f64,
        looped: bool,
    },
    /// Stop the station halt chime of `train`
    StopHalt { train: usize },
}
