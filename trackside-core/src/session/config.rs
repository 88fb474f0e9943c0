use crate::imports::*;
use crate::objects::ViewingDistances;

/// Session settings, loadable from YAML or JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub viewing: ViewingDistances,
    /// Save the camera pose every `save_interval` steps; `None` keeps no history
    #[serde(default)]
    pub save_interval: Option<usize>,
    /// Perturb follower poses by the elements' track irregularity
    #[serde(default)]
    pub add_inaccuracy: bool,
    /// Keep a journal of every event invocation in the world
    #[serde(default)]
    pub record_crossings: bool,
    /// Longest distance a train moves between event checks within one step
    #[serde(default = "default_max_substep")]
    pub max_substep: si::Length,
    /// Step length used when replaying a jump
    #[serde(default = "default_jump_step")]
    pub jump_step: si::Length,
}

fn default_max_substep() -> si::Length {
    5.0 * uc::M
}

fn default_jump_step() -> si::Length {
    1.0 * uc::M
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewing: ViewingDistances::default(),
            save_interval: None,
            add_inaccuracy: false,
            record_crossings: false,
            max_substep: default_max_substep(),
            jump_step: default_jump_step(),
        }
    }
}

impl SerdeAPI for SessionConfig {
    fn init(&mut self) -> Result<(), Error> {
        self.viewing.init()?;
        if self.save_interval == Some(0) {
            return Err(Error::Init("`save_interval` must be positive".into()));
        }
        if !(self.max_substep > si::Length::ZERO && self.max_substep.value.is_finite()) {
            return Err(Error::Init(format!(
                "`max_substep` must be positive and finite, got {:?}",
                self.max_substep
            )));
        }
        if !(self.jump_step > si::Length::ZERO && self.jump_step.value.is_finite()) {
            return Err(Error::Init(format!(
                "`jump_step` must be positive and finite, got {:?}",
                self.jump_step
            )));
        }
        Ok(())
    }
}

/// Movement of one train during a step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainMove {
    pub train: usize,
    /// Signed distance the whole train moves
    pub displacement: si::Length,
    /// Speed at the end of the step
    pub speed: si::Velocity,
}

/// Everything the outside world supplies for one step
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    pub dt: si::Time,
    #[serde(default)]
    pub moves: Vec<TrainMove>,
    /// Camera track position; `None` rides the player train's leading axle
    #[serde(default)]
    pub camera_position: Option<si::Length>,
    /// Target rotations, one per animated object
    #[serde(default)]
    pub rotation_targets: Vec<[si::Angle; 3]>,
}
