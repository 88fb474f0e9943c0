use crate::imports::*;
use crate::track::{Track, TrackFollower, TriggerType};
use crate::world::World;

/// Followers for every axle of one train, ordered front to rear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainAxles {
    pub train: usize,
    pub axles: Vec<TrackFollower>,
}

impl TrainAxles {
    /// Lays out `n_cars` cars of `car_length` behind `front_position`, each with a front
    /// and a rear axle `axle_inset` in from the car ends
    pub fn new(
        track: &Track,
        train: usize,
        n_cars: usize,
        front_position: si::Length,
        car_length: si::Length,
        axle_inset: si::Length,
    ) -> anyhow::Result<Self> {
        ensure!(n_cars > 0, "{}\ntrain {} has no cars", format_dbg!(), train);
        ensure!(
            car_length > 2.0 * axle_inset && axle_inset >= si::Length::ZERO,
            "{}\naxle inset {:?} does not fit car length {:?}",
            format_dbg!(),
            axle_inset,
            car_length
        );
        let mut axles = Vec::with_capacity(2 * n_cars);
        for car in 0..n_cars {
            let car_front = front_position - car_length * car as f64;
            let front_type = if car == 0 {
                TriggerType::FrontCarFrontAxle
            } else {
                TriggerType::OtherCarFrontAxle
            };
            let rear_type = if car + 1 == n_cars {
                TriggerType::RearCarRearAxle
            } else {
                TriggerType::OtherCarRearAxle
            };
            let mut front = TrackFollower::new(front_type, Some(train), car);
            front
                .place_at(track, car_front - axle_inset, false)
                .with_context(|| format_dbg!(car))?;
            let mut rear = TrackFollower::new(rear_type, Some(train), car);
            rear.place_at(track, car_front - car_length + axle_inset, false)
                .with_context(|| format_dbg!(car))?;
            axles.push(front);
            axles.push(rear);
        }
        Ok(Self { train, axles })
    }

    pub fn leading_position(&self) -> Option<si::Length> {
        self.axles.first().map(|a| a.track_position)
    }

    /// Moves every axle by `displacement` in steps no longer than `max_substep`,
    /// the axle leading in the direction of travel first.  Stops early if the
    /// train is disposed on the way.
    pub fn move_by(
        &mut self,
        track: &mut Track,
        world: &mut World,
        displacement: si::Length,
        max_substep: si::Length,
        add_inaccuracy: bool,
    ) {
        if displacement == si::Length::ZERO {
            return;
        }
        let n_sub = (displacement.abs() / max_substep)
            .get::<si::ratio>()
            .ceil()
            .max(1.0) as usize;
        let sub = displacement / n_sub as f64;
        for _ in 0..n_sub {
            if world.trains.get(self.train).map_or(true, |t| t.disposed) {
                break;
            }
            let mut move_axle = |axle: &mut TrackFollower| {
                let target = axle.track_position + sub;
                axle.move_to(track, world, target, true, add_inaccuracy);
            };
            if displacement > si::Length::ZERO {
                self.axles.iter_mut().for_each(&mut move_axle);
            } else {
                self.axles.iter_mut().rev().for_each(&mut move_axle);
            }
        }
    }
}
