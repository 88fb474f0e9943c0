use crate::imports::*;

/// Seconds over which the renderer blends into a newly targeted background
pub const BACKGROUND_BLEND_SECONDS: f64 = 0.8;

/// Fog parameters in effect from `track_position` onward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub start: si::Length,
    pub end: si::Length,
    pub color: [u8; 3],
    pub track_position: si::Length,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            start: si::Length::ZERO,
            end: si::Length::ZERO,
            color: [128, 128, 128],
            track_position: si::Length::ZERO,
        }
    }
}

/// Camera-driven scenery state consumed by the renderer
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenery {
    /// Index of the background the renderer should blend toward
    pub target_background: Option<usize>,
    /// Time remaining in the background blend
    pub background_countdown: si::Time,
    pub previous_fog: Fog,
    pub next_fog: Fog,
    /// Texture indices of markers currently displayed, in display order
    pub markers: Vec<usize>,
}

impl Scenery {
    pub fn set_target_background(&mut self, background: Option<usize>) {
        self.target_background = background;
        self.background_countdown = BACKGROUND_BLEND_SECONDS * uc::S;
    }

    /// Counts the background blend down by `dt`, saturating at zero
    pub fn advance(&mut self, dt: si::Time) {
        self.background_countdown = (self.background_countdown - dt).max(si::Time::ZERO);
    }

    pub fn add_marker(&mut self, texture: usize) {
        if !self.markers.contains(&texture) {
            self.markers.push(texture);
        }
    }

    pub fn remove_marker(&mut self, texture: usize) {
        self.markers.retain(|m| *m != texture);
    }
}
