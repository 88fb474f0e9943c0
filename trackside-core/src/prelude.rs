pub use crate::animation::{Damping, DampingMode, RotationDamping};
pub use crate::error::Error;
pub use crate::objects::{ObjectRenderer, StaticObject, ViewingDistances, VisibilitySweep, VisibleSet};
pub use crate::session::{Session, SessionConfig, TickInput, TrainMove};
pub use crate::track::{
    CantInterpolation, EventKind, FollowerPose, FollowerPoseHistoryVec, Track, TrackElement,
    TrackEvent, TrackFollower, TriggerType,
};
pub use crate::traits::SerdeAPI;
pub use crate::world::{Notice, SoundRequest, Train, World};
