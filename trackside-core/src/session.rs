//! Single-threaded owner of all simulation state, advanced one tick at a time.

use crate::animation::RotationDamping;
use crate::imports::*;
use crate::objects::{StaticObject, ViewingDistances, VisibilitySweep, VisibleSet};
use crate::track::{FollowerPoseHistoryVec, Track, TrackFollower};
use crate::world::{Train, World};

pub mod config;
pub mod train_axles;

pub use config::{SessionConfig, TickInput, TrainMove};
pub use train_axles::TrainAxles;


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub config: SessionConfig,
    pub track: Track,
    pub objects: Vec<StaticObject>,
    pub world: World,
    /// Axle followers, one entry per train in `world.trains`
    pub train_axles: Vec<TrainAxles>,
    pub camera: TrackFollower,
    pub sweep: VisibilitySweep,
    /// Objects currently shown by the sweep
    pub visible: VisibleSet,
    /// Dampers for animated object rotations
    #[serde(default)]
    pub animated: Vec<RotationDamping>,
    /// Damped rotations from the last step, parallel to `animated`
    #[serde(default)]
    pub animated_angles: Vec<[si::Angle; 3]>,
    /// Step counter
    pub i: usize,
    pub time: si::Time,
    /// Camera pose history, saved every `config.save_interval` steps
    #[serde(default)]
    pub history: FollowerPoseHistoryVec,
}

impl Session {
    /// Builds a session with the camera at `camera_position` and its initial visible set
    pub fn new(
        mut config: SessionConfig,
        mut track: Track,
        mut objects: Vec<StaticObject>,
        mut world: World,
        camera_position: si::Length,
    ) -> anyhow::Result<Self> {
        config.init().with_context(|| format_dbg!())?;
        track.init().with_context(|| format_dbg!())?;
        objects.init().with_context(|| format_dbg!())?;
        world.init().with_context(|| format_dbg!())?;
        if config.record_crossings {
            world.record_crossings();
        }

        let mut camera = TrackFollower::camera();
        if !track.is_empty() {
            camera
                .place_at(&track, camera_position, config.add_inaccuracy)
                .with_context(|| format_dbg!())?;
        } else {
            camera.track_position = camera_position;
        }
        let mut sweep = VisibilitySweep::new(config.viewing);
        let mut visible = VisibleSet::default();
        sweep.initialize(&objects, camera_position, &mut visible);

        Ok(Self {
            config,
            track,
            objects,
            world,
            train_axles: Vec::new(),
            camera,
            sweep,
            visible,
            animated: Vec::new(),
            animated_angles: Vec::new(),
            i: 0,
            time: si::Time::ZERO,
            history: Default::default(),
        })
    }

    /// Adds `train` with its leading axle at `front_position` and returns its index.
    /// No events fire while the train is placed.
    pub fn add_train(
        &mut self,
        train: Train,
        front_position: si::Length,
        car_length: si::Length,
        axle_inset: si::Length,
    ) -> anyhow::Result<usize> {
        let idx = self.world.trains.len();
        let axles = TrainAxles::new(
            &self.track,
            idx,
            train.cars.len(),
            front_position,
            car_length,
            axle_inset,
        )
        .with_context(|| format_dbg!())?;
        self.world.trains.push(train);
        self.train_axles.push(axles);
        Ok(idx)
    }

    /// Adds an animated object and returns its index
    pub fn add_animated(&mut self, mut rotation: RotationDamping) -> anyhow::Result<usize> {
        rotation.init().with_context(|| format_dbg!())?;
        self.animated.push(rotation);
        self.animated_angles.push([si::Angle::ZERO; 3]);
        Ok(self.animated.len() - 1)
    }

    /// Advances the session by one tick: train moves, rotation damping, camera,
    /// visibility, then history
    pub fn step(&mut self, input: &TickInput) -> anyhow::Result<()> {
        if !(input.dt >= si::Time::ZERO && input.dt.value.is_finite()) {
            bail!(Error::Simulation(format!(
                "{}\ntime step must be non-negative and finite, got {:?}",
                format_dbg!(),
                input.dt
            )));
        }
        if !input.rotation_targets.is_empty() && input.rotation_targets.len() != self.animated.len()
        {
            bail!(Error::Simulation(format!(
                "{}\n{} rotation targets for {} animated objects",
                format_dbg!(),
                input.rotation_targets.len(),
                self.animated.len()
            )));
        }
        if let Some(p) = input.camera_position {
            ensure!(
                p.value.is_finite(),
                "{}\nnon-finite camera position {:?}",
                format_dbg!(),
                p
            );
        }
        // nothing moves unless every move is valid
        for mv in &input.moves {
            self.world.train(mv.train).with_context(|| format_dbg!())?;
            ensure!(
                self.train_axles.iter().any(|a| a.train == mv.train),
                "{}\nno axles for train {}",
                format_dbg!(),
                mv.train
            );
            if !(mv.displacement.value.is_finite() && mv.speed.value.is_finite()) {
                bail!(Error::Simulation(format!(
                    "{}\nnon-finite move for train {}: {:?}",
                    format_dbg!(),
                    mv.train,
                    mv
                )));
            }
        }

        let Self {
            config,
            track,
            world,
            train_axles,
            ..
        } = self;
        for mv in &input.moves {
            world
                .train_mut(mv.train)
                .with_context(|| format_dbg!())?
                .current_speed = mv.speed;
            find_axles(train_axles, mv.train)?.move_by(
                track,
                world,
                mv.displacement,
                config.max_substep,
                config.add_inaccuracy,
            );
        }

        for (k, targets) in input.rotation_targets.iter().enumerate() {
            self.animated_angles[k] = self.animated[k].update(input.dt, *targets);
        }

        let camera_position = input
            .camera_position
            .or_else(|| {
                let player = self.world.player_train()?;
                self.train_axles
                    .iter()
                    .find(|a| a.train == player)?
                    .leading_position()
            })
            .unwrap_or(self.camera.track_position);
        self.camera.move_to(
            &mut self.track,
            &mut self.world,
            camera_position,
            true,
            self.config.add_inaccuracy,
        );
        self.sweep
            .update(&self.objects, camera_position, &mut self.visible);
        self.world.scenery.advance(input.dt);

        self.time += input.dt;
        self.i += 1;
        self.save_state(|| format_dbg!())?;
        Ok(())
    }

    /// Moves `train` so its leading axle is at `front_position`, replaying the
    /// displacement in `config.jump_step` increments with sound events suppressed,
    /// then re-evaluates every signaling section
    pub fn jump_train(&mut self, train: usize, front_position: si::Length) -> anyhow::Result<()> {
        let Self {
            config,
            track,
            world,
            train_axles,
            ..
        } = self;
        world.train(train).with_context(|| format_dbg!())?;
        ensure!(
            front_position.value.is_finite(),
            "{}\nnon-finite jump target {:?}",
            format_dbg!(),
            front_position
        );
        let axles = find_axles(train_axles, train)?;
        let start = axles
            .leading_position()
            .with_context(|| format!("{}\ntrain {train} has no axles", format_dbg!()))?;
        info!(
            "jumping train {} from {:?} to {:?}",
            train, start, front_position
        );

        let suppressed = world.suppress_sound_events;
        world.suppress_sound_events = true;
        let jump_step = config.jump_step;
        let mut remaining = front_position - start;
        while remaining.abs() > jump_step {
            let step = if remaining > si::Length::ZERO {
                jump_step
            } else {
                -jump_step
            };
            axles.move_by(track, world, step, jump_step, config.add_inaccuracy);
            remaining -= step;
        }
        axles.move_by(track, world, remaining, jump_step, config.add_inaccuracy);
        world.suppress_sound_events = suppressed;
        world.update_all_sections();
        Ok(())
    }

    /// Applies new viewing distances and refreshes the visible set around the camera
    pub fn set_viewing_distances(&mut self, mut viewing: ViewingDistances) -> anyhow::Result<()> {
        viewing.init().with_context(|| format_dbg!())?;
        self.config.viewing = viewing;
        self.sweep.viewing = viewing;
        self.sweep.update_visibility(
            &self.objects,
            self.camera.track_position,
            true,
            &mut self.visible,
        );
        Ok(())
    }

    pub fn set_save_interval(&mut self, save_interval: Option<usize>) -> anyhow::Result<()> {
        if save_interval == Some(0) {
            bail!(Error::Other("`save_interval` must be positive".into()));
        }
        self.config.save_interval = save_interval;
        Ok(())
    }

    pub fn get_save_interval(&self) -> Option<usize> {
        self.config.save_interval
    }
}

fn find_axles(train_axles: &mut [TrainAxles], train: usize) -> anyhow::Result<&mut TrainAxles> {
    train_axles
        .iter_mut()
        .find(|a| a.train == train)
        .with_context(|| format!("{}\nno axles for train {train}", format_dbg!()))
}

impl SaveState for Session {
    fn save_state<F: Fn() -> String>(&mut self, _loc: F) -> anyhow::Result<()> {
        if let Some(interval) = self.config.save_interval {
            if self.i % interval == 0 {
                self.history.push(self.camera.pose());
            }
        }
        Ok(())
    }
}

impl SerdeAPI for Session {
    fn init(&mut self) -> Result<(), Error> {
        self.config.init()?;
        self.track.init()?;
        self.objects.init()?;
        self.world.init()?;
        self.animated.init()?;
        if self.train_axles.len() != self.world.trains.len() {
            return Err(Error::Init(format!(
                "{} axle sets for {} trains",
                self.train_axles.len(),
                self.world.trains.len()
            )));
        }
        Ok(())
    }
}
