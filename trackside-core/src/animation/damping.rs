use crate::imports::*;

/// Angle change, in radians, beyond which a new target arms the spring at once
const IMMEDIATE_THRESHOLD: f64 = 0.1;
/// Ticks a target must hold before the spring arms, or before a moving target re-arms it
const SETTLE_TICKS: u32 = 3;
/// Angular rate, in radians per second, below which a settled spring returns to direct mode
const SETTLED_RATE: f64 = 0.01;
/// Shortest time step, in seconds, used for the finite-difference derivative
const MIN_DERIVATIVE_STEP: f64 = 0.001;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DampingMode {
    /// Output follows the target directly
    #[default]
    Direct,
    /// Output follows a damped oscillator from the original angle toward the target
    Spring,
}

/// Second order spring smoothing a target angle into a continuously moving angle.
///
/// In spring mode the output is `target * (1 - b) + original * b` where `b`
/// decays from 1 toward 0 along the closed form solution selected by the
/// damping ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Damping {
    pub natural_frequency: si::AngularVelocity,
    pub damping_ratio: si::Ratio,
    #[serde(skip)]
    natural_damping_frequency: si::AngularVelocity,
    /// Time after which a spring following a moving target is re-armed
    #[serde(skip)]
    natural_time: si::Time,
    #[serde(default)]
    pub mode: DampingMode,
    #[serde(default)]
    original_angle: si::Angle,
    /// Derivative of `b` at arming, per second
    #[serde(default)]
    original_derivative: f64,
    #[serde(default)]
    target_angle: si::Angle,
    #[serde(default)]
    current_angle: si::Angle,
    /// Derivative of `b`, per second
    #[serde(default)]
    current_derivative: f64,
    /// Current `b`
    #[serde(default = "one")]
    current_value: f64,
    /// Time since the spring was last armed
    #[serde(default)]
    elapsed: si::Time,
    #[serde(default)]
    ticks: u32,
    #[serde(default)]
    counter: u32,
}

fn one() -> f64 {
    1.0
}

/// Damped frequency for natural frequency `nf` and damping ratio `dr`
fn natural_damping_frequency(nf: f64, dr: f64) -> f64 {
    match dr.partial_cmp(&1.0) {
        Some(Ordering::Less) => nf * (1.0 - dr * dr).sqrt(),
        Some(Ordering::Greater) => nf * (dr * dr - 1.0).sqrt(),
        _ => nf,
    }
}

impl Damping {
    pub fn new(natural_frequency: si::AngularVelocity, damping_ratio: si::Ratio) -> Self {
        let mut damping = Self {
            natural_frequency,
            damping_ratio,
            natural_damping_frequency: si::AngularVelocity::ZERO,
            natural_time: si::Time::ZERO,
            mode: DampingMode::Direct,
            original_angle: si::Angle::ZERO,
            original_derivative: 0.0,
            target_angle: si::Angle::ZERO,
            current_angle: si::Angle::ZERO,
            current_derivative: 0.0,
            current_value: 1.0,
            elapsed: si::Time::ZERO,
            ticks: 0,
            counter: 0,
        };
        damping.update_derived();
        damping
    }

    fn update_derived(&mut self) {
        let nf = self.natural_frequency.get::<si::radian_per_second>();
        let dr = self.damping_ratio.get::<si::ratio>();
        self.natural_damping_frequency =
            natural_damping_frequency(nf, dr) * uc::RADPS;
        self.natural_time = (1.0 / nf) * uc::S;
    }

    pub fn natural_damping_frequency(&self) -> si::AngularVelocity {
        self.natural_damping_frequency
    }

    pub fn current_angle(&self) -> si::Angle {
        self.current_angle
    }

    pub fn target_angle(&self) -> si::Angle {
        self.target_angle
    }

    /// Advances the damper by `dt` toward `target` and returns the angle to display
    pub fn update(&mut self, dt: si::Time, target: si::Angle) -> si::Angle {
        match self.mode {
            DampingMode::Direct => self.update_direct(target),
            DampingMode::Spring => self.update_spring(dt, target),
        }
    }

    fn update_direct(&mut self, target: si::Angle) -> si::Angle {
        let immediate =
            (target - self.current_angle).abs().get::<si::radian>() > IMMEDIATE_THRESHOLD;
        if !immediate && target != self.current_angle {
            self.current_angle = target;
            self.ticks = 0;
            return target;
        }
        self.ticks += 1;
        if immediate || self.ticks >= SETTLE_TICKS {
            debug!(
                "damping armed from {:?} toward {:?}",
                self.current_angle, target
            );
            self.mode = DampingMode::Spring;
            self.original_angle = self.current_angle;
            self.target_angle = target;
            // `b` starts at rest at 1, so the output continues from the current angle
            self.current_value = 1.0;
            self.original_derivative = 0.0;
            self.current_derivative = 0.0;
            self.elapsed = si::Time::ZERO;
            self.ticks = 0;
            self.counter = 0;
        }
        self.current_angle
    }

    fn update_spring(&mut self, dt: si::Time, target: si::Angle) -> si::Angle {
        if target != self.target_angle {
            self.counter += 1;
        } else {
            self.counter >>= 1;
        }
        let near = (target - self.current_angle).abs().get::<si::radian>() < IMMEDIATE_THRESHOLD;
        let span = (self.target_angle - self.original_angle).get::<si::radian>();
        let rate = (span * self.current_derivative).abs();
        if self.counter >= SETTLE_TICKS && near && rate < SETTLED_RATE {
            debug!("damping settled at {:?}, back to direct mode", target);
            self.mode = DampingMode::Direct;
            self.current_angle = target;
            self.ticks = 0;
            return target;
        }

        let moved = (target - self.target_angle).abs().get::<si::radian>() > IMMEDIATE_THRESHOLD;
        if self.ticks >= SETTLE_TICKS && (self.elapsed > self.natural_time || moved) {
            // re-arm from the current state, rescaling the derivative to the new span
            let old_span = (self.target_angle - self.original_angle).get::<si::radian>();
            self.original_angle = self.current_angle;
            self.target_angle = target;
            let new_span = (self.target_angle - self.original_angle).get::<si::radian>();
            let r = if new_span == 0.0 { 1.0 } else { old_span / new_span };
            self.original_derivative = self.current_derivative * r;
            self.current_value = 1.0;
            self.elapsed = si::Time::ZERO;
            self.ticks = 0;
        }

        let b = self.value_at(self.elapsed.get::<si::second>());
        let dt_s = dt.get::<si::second>();
        if dt_s >= MIN_DERIVATIVE_STEP {
            self.current_derivative = (b - self.current_value) / dt_s;
        }
        self.current_value = b;
        self.current_angle = self.target_angle * (1.0 - b) + self.original_angle * b;
        self.elapsed += dt;
        self.ticks += 1;
        self.current_angle
    }

    /// `b` at time `t` seconds after arming
    fn value_at(&self, t: f64) -> f64 {
        let nf = self.natural_frequency.get::<si::radian_per_second>();
        let dr = self.damping_ratio.get::<si::ratio>();
        let ndf = self.natural_damping_frequency.get::<si::radian_per_second>();
        let d0 = self.original_derivative;
        if nf == 0.0 {
            1.0
        } else if dr == 0.0 {
            (nf * t).cos() + d0 * (nf * t).sin() / nf
        } else if dr < 1.0 {
            let n = (d0 + nf * dr) / ndf;
            (-dr * nf * t).exp() * ((ndf * t).cos() + n * (ndf * t).sin())
        } else if dr == 1.0 {
            (1.0 + (nf + d0) * t) * (-nf * t).exp()
        } else {
            let n = (d0 + nf * dr) / ndf;
            (-dr * nf * t).exp() * ((ndf * t).cosh() + n * (ndf * t).sinh())
        }
    }
}

impl SerdeAPI for Damping {
    fn init(&mut self) -> Result<(), Error> {
        let nf = self.natural_frequency.get::<si::radian_per_second>();
        let dr = self.damping_ratio.get::<si::ratio>();
        if !(nf.is_finite() && nf >= 0.0) {
            return Err(Error::Init(format!(
                "natural frequency must be finite and non-negative, got {nf}"
            )));
        }
        if !(dr.is_finite() && dr >= 0.0) {
            return Err(Error::Init(format!(
                "damping ratio must be finite and non-negative, got {dr}"
            )));
        }
        self.update_derived();
        Ok(())
    }
}
