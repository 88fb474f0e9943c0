use super::station::SafetySystem;
use crate::imports::*;

/// Progress of a train's stop at its current station
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopState {
    #[default]
    Pending,
    Boarding,
    Completed,
}

/// Chime played when approaching a station the train is scheduled to stop at
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassAlarm {
    #[default]
    None,
    Single,
    Loop,
}

/// Lighting of a car, interpolated by the renderer between two track positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brightness {
    pub previous: f32,
    pub previous_track_position: si::Length,
    pub next: f32,
    pub next_track_position: si::Length,
}

impl Default for Brightness {
    fn default() -> Self {
        Self {
            previous: 1.0,
            previous_track_position: si::Length::ZERO,
            next: 1.0,
            next_track_position: si::Length::ZERO,
        }
    }
}

/// Rail sound buffer indices of one axle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RailSounds {
    pub run: Option<usize>,
    pub flange: Option<usize>,
}

/// Sound buffer attached to a car at a position relative to the car center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarSound {
    pub buffer: usize,
    pub position: DVec3,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub brightness: Brightness,
    pub front_axle: RailSounds,
    pub rear_axle: RailSounds,
    /// Played when the front axle runs over points
    pub front_point_sound: Option<CarSound>,
    pub rear_point_sound: Option<CarSound>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransponderKind {
    S,
    Sn,
    AccidentalDeparture,
    AtsPPatternOrigin,
    AtsPImmediateStop,
    AtsPTemporarySpeedRestriction,
    AtsPPermanentSpeedRestriction,
    Other(i32),
}

/// Beacon data waiting to be consumed by the onboard safety system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingTransponder {
    pub kind: TransponderKind,
    pub switch_subsystem: bool,
    pub optional_integer: i32,
    pub optional_float: f64,
    /// Section the beacon reports on, resolved at crossing time
    pub section: Option<usize>,
}

impl PendingTransponder {
    /// Whether `other` came from a beacon with the same payload, ignoring the
    /// section resolved at crossing time
    pub fn same_beacon(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.switch_subsystem == other.switch_subsystem
            && self.optional_integer == other.optional_integer
            && self.optional_float == other.optional_float
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    /// Whether this is the train the player drives
    #[serde(default)]
    pub is_player: bool,
    pub cars: Vec<Car>,
    #[serde(default)]
    pub driver_car: usize,
    pub current_speed: si::Velocity,

    /// Station whose platform the train is currently within
    #[serde(default)]
    pub station: Option<usize>,
    #[serde(default)]
    pub station_front_car: bool,
    #[serde(default)]
    pub station_rear_car: bool,
    #[serde(default)]
    pub station_state: StopState,
    /// Distance left to the stop point, negative once overrun
    #[serde(default)]
    pub station_distance_to_stop_point: si::Length,

    /// Limits of every route-limit zone the train currently spans, rear first
    #[serde(default)]
    pub route_limits: Vec<si::Velocity>,
    pub current_route_limit: si::Velocity,
    #[serde(default)]
    pub current_section: Option<usize>,
    pub current_section_limit: si::Velocity,

    #[serde(default)]
    pub pending_transponders: Vec<PendingTransponder>,
    #[serde(default)]
    pub safety_system: SafetySystem,
    #[serde(default)]
    pub atc_transmitting: bool,
    #[serde(default)]
    pub pass_alarm: PassAlarm,
    /// Station chime on the driver car
    #[serde(default)]
    pub halt_sound: Option<CarSound>,
    #[serde(default)]
    pub halt_sound_playing: bool,
    #[serde(default)]
    pub disposed: bool,
}

impl Train {
    pub fn new(n_cars: usize) -> Self {
        Self {
            is_player: false,
            cars: vec![Car::default(); n_cars.max(1)],
            driver_car: 0,
            current_speed: si::Velocity::ZERO,
            station: None,
            station_front_car: false,
            station_rear_car: false,
            station_state: StopState::default(),
            station_distance_to_stop_point: si::Length::ZERO,
            route_limits: Vec::new(),
            current_route_limit: f64::INFINITY * uc::MPS,
            current_section: None,
            current_section_limit: f64::INFINITY * uc::MPS,
            pending_transponders: Vec::new(),
            safety_system: SafetySystem::Ats,
            atc_transmitting: false,
            pass_alarm: PassAlarm::default(),
            halt_sound: None,
            halt_sound_playing: false,
            disposed: false,
        }
    }

    pub fn player(n_cars: usize) -> Self {
        Self {
            is_player: true,
            ..Self::new(n_cars)
        }
    }

    /// `current_route_limit` is the tightest limit on the stack.  An empty stack
    /// keeps whatever limit the last crossing left behind.
    fn recompute_route_limit(&mut self) {
        if let Some(first) = self.route_limits.first() {
            self.current_route_limit = self
                .route_limits
                .iter()
                .fold(*first, |acc, l| acc.min(*l));
        }
    }

    /// Front of the train enters a zone limited to `next`
    pub fn push_route_limit(&mut self, next: si::Velocity) {
        self.route_limits.push(next);
        self.recompute_route_limit();
    }

    /// Front of the train backs out of its newest zone into one limited to `previous`
    pub fn pop_route_limit(&mut self, previous: si::Velocity) {
        self.route_limits.pop();
        if self.route_limits.is_empty() {
            self.current_route_limit = previous;
        }
        self.recompute_route_limit();
    }

    /// Rear of the train leaves its oldest zone and is now in one limited to `next`.
    /// The front is in that zone too, so it stays on the stack.
    pub fn drop_oldest_route_limit(&mut self, next: si::Velocity) {
        if !self.route_limits.is_empty() {
            self.route_limits.remove(0);
        }
        if self.route_limits.is_empty() {
            self.route_limits.push(next);
        }
        self.recompute_route_limit();
    }

    /// Rear of the train backs into a zone limited to `previous`
    pub fn restore_oldest_route_limit(&mut self, previous: si::Velocity) {
        self.route_limits.insert(0, previous);
        self.recompute_route_limit();
    }

    pub fn car(&self, car: usize) -> Option<&Car> {
        self.cars.get(car)
    }

    pub fn car_mut(&mut self, car: usize) -> Option<&mut Car> {
        self.cars.get_mut(car)
    }

    /// Whether the onboard system suppresses driver notices
    pub fn notices_suppressed(&self) -> bool {
        self.safety_system == SafetySystem::Atc
    }
}
