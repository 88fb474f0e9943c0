//! Position-indexed event and visibility engine for train simulation.
//!
//! A [track::Track] is an ordered sequence of [track::TrackElement]s, each with
//! a local frame and a list of [track::TrackEvent]s. [track::TrackFollower]s
//! (train axles and the camera) walk the track and fire every event they cross,
//! tagged with the direction of travel, into the [world::World] state. The
//! camera position also drives the [objects::VisibilitySweep], and animated
//! rotations are smoothed by [animation::Damping]. [session::Session] ties these
//! together into a deterministic, single-threaded tick.

#[macro_use]
pub mod macros;

pub mod animation;
pub mod error;
pub(crate) mod imports;
pub mod lin_search_hint;
pub mod objects;
pub mod prelude;
pub mod session;
pub mod si;
pub mod track;
pub mod traits;
pub mod uc;
pub mod utils;
pub mod world;
