use crate::imports::*;
use crate::world::{
    update_section, CarSound, Fog, Notice, PassAlarm, PendingTransponder, SafetySystem,
    SoundRequest, StopState, Train, TransponderKind, World,
};

/// Which kind of follower crossed an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerType {
    Camera,
    FrontCarFrontAxle,
    RearCarRearAxle,
    OtherCarFrontAxle,
    OtherCarRearAxle,
}

impl TriggerType {
    pub fn is_front_axle(&self) -> bool {
        matches!(self, Self::FrontCarFrontAxle | Self::OtherCarFrontAxle)
    }

    pub fn is_rear_axle(&self) -> bool {
        matches!(self, Self::RearCarRearAxle | Self::OtherCarRearAxle)
    }

    pub fn is_axle(&self) -> bool {
        !matches!(self, Self::Camera)
    }
}

/// Context of one directional crossing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trigger {
    pub dir: Dir,
    pub trigger_type: TriggerType,
    pub train: Option<usize>,
    pub car: usize,
    /// Absolute track position of the crossed event
    pub track_position: si::Length,
}

/// Behavior attached to a point on the track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    BackgroundChange {
        previous: Option<usize>,
        next: Option<usize>,
    },
    FogChange {
        previous: Fog,
        current: Fog,
        next: Fog,
    },
    BrightnessChange {
        previous: f32,
        /// Distance back to where `previous` applies
        previous_distance: si::Length,
        current: f32,
        next: f32,
        /// Distance ahead to where `next` applies
        next_distance: si::Length,
    },
    MarkerStart {
        texture: usize,
    },
    MarkerEnd {
        texture: usize,
    },
    StationPassAlarm,
    StationStart {
        station: usize,
    },
    StationEnd {
        station: usize,
    },
    SectionChange {
        previous: Option<usize>,
        next: Option<usize>,
    },
    Transponder {
        kind: TransponderKind,
        switch_subsystem: bool,
        optional_integer: i32,
        optional_float: f64,
        section: Option<usize>,
    },
    LimitChange {
        previous: si::Velocity,
        next: si::Velocity,
    },
    Sound {
        /// `None` plays the crossing axle's own point sound
        buffer: Option<usize>,
        player_train_only: bool,
        once: bool,
        /// Pitch and gain follow train speed relative to `speed`
        dynamic: bool,
        position: DVec3,
        speed: si::Velocity,
    },
    RailSoundsChange {
        previous_run: Option<usize>,
        previous_flange: Option<usize>,
        next_run: Option<usize>,
        next_flange: Option<usize>,
    },
    TrackEnd,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BackgroundChange { .. } => "BackgroundChange",
            Self::FogChange { .. } => "FogChange",
            Self::BrightnessChange { .. } => "BrightnessChange",
            Self::MarkerStart { .. } => "MarkerStart",
            Self::MarkerEnd { .. } => "MarkerEnd",
            Self::StationPassAlarm => "StationPassAlarm",
            Self::StationStart { .. } => "StationStart",
            Self::StationEnd { .. } => "StationEnd",
            Self::SectionChange { .. } => "SectionChange",
            Self::Transponder { .. } => "Transponder",
            Self::LimitChange { .. } => "LimitChange",
            Self::Sound { .. } => "Sound",
            Self::RailSoundsChange { .. } => "RailSoundsChange",
            Self::TrackEnd => "TrackEnd",
        }
    }
}

/// Event placed at `track_position_delta` past the start of its element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackEvent {
    pub track_position_delta: si::Length,
    /// Once set the event never fires again
    #[serde(default)]
    pub dont_trigger_anymore: bool,
    pub kind: EventKind,
}

impl TrackEvent {
    pub fn new(track_position_delta: si::Length, kind: EventKind) -> Self {
        Self {
            track_position_delta,
            dont_trigger_anymore: false,
            kind,
        }
    }

    /// Fires the event unless it is latched.  Returns whether it fired.
    pub fn try_trigger(&mut self, trigger: &Trigger, world: &mut World) -> bool {
        if self.dont_trigger_anymore {
            return false;
        }
        trace!(
            "{} {:?} by {:?} at {:?}",
            self.kind.name(),
            trigger.dir,
            trigger.trigger_type,
            trigger.track_position
        );
        if self.kind.trigger(trigger, world) {
            self.dont_trigger_anymore = true;
        }
        true
    }
}

impl EventKind {
    /// Applies the event to `world`.  Returns true if the event should latch.
    fn trigger(&self, trigger: &Trigger, world: &mut World) -> bool {
        let dir = trigger.dir;
        if dir == Dir::Unk {
            return false;
        }
        let fwd = dir == Dir::Fwd;
        match self {
            Self::BackgroundChange { previous, next } => {
                if trigger.trigger_type == TriggerType::Camera {
                    world
                        .scenery
                        .set_target_background(if fwd { *next } else { *previous });
                }
                false
            }
            Self::FogChange {
                previous,
                current,
                next,
            } => {
                if trigger.trigger_type == TriggerType::Camera {
                    let scenery = &mut world.scenery;
                    if fwd {
                        scenery.previous_fog = *current;
                        scenery.next_fog = *next;
                    } else {
                        scenery.previous_fog = *previous;
                        scenery.next_fog = *current;
                    }
                }
                false
            }
            Self::BrightnessChange {
                previous,
                previous_distance,
                current,
                next,
                next_distance,
            } => {
                if trigger.trigger_type.is_front_axle() {
                    if let Some(car) = car_mut(world, trigger) {
                        let b = &mut car.brightness;
                        if fwd {
                            b.previous = *current;
                            b.previous_track_position = trigger.track_position;
                            b.next = *next;
                            b.next_track_position = trigger.track_position + *next_distance;
                        } else {
                            b.next = *current;
                            b.next_track_position = trigger.track_position;
                            b.previous = *previous;
                            b.previous_track_position =
                                trigger.track_position - *previous_distance;
                        }
                    }
                }
                false
            }
            Self::MarkerStart { texture } | Self::MarkerEnd { texture } => {
                if trigger.trigger_type == TriggerType::FrontCarFrontAxle
                    && is_player(world, trigger)
                {
                    let adds = matches!(self, Self::MarkerStart { .. }) == fwd;
                    if adds {
                        world.scenery.add_marker(*texture);
                    } else {
                        world.scenery.remove_marker(*texture);
                    }
                }
                false
            }
            Self::StationPassAlarm => {
                if trigger.trigger_type != TriggerType::FrontCarFrontAxle || !fwd {
                    return false;
                }
                let Some(train_idx) = trigger.train else {
                    return false;
                };
                let Some(train) = train_mut(world, train_idx) else {
                    return false;
                };
                let looped = match train.pass_alarm {
                    PassAlarm::None => None,
                    PassAlarm::Single => Some(false),
                    PassAlarm::Loop => Some(true),
                };
                if let (Some(CarSound { buffer, position }), Some(looped)) =
                    (train.halt_sound, looped)
                {
                    train.halt_sound_playing |= looped;
                    let car = train.driver_car;
                    world.sound_requests.push(SoundRequest::Play {
                        buffer,
                        train: Some(train_idx),
                        car,
                        position,
                        pitch: 1.0,
                        gain: 1.0,
                        looped,
                    });
                }
                true
            }
            Self::StationStart { station } => {
                station_start(*station, trigger, world);
                false
            }
            Self::StationEnd { station } => {
                station_end(*station, trigger, world);
                false
            }
            Self::SectionChange { previous, next } => {
                section_change(*previous, *next, trigger, world);
                false
            }
            Self::Transponder {
                kind,
                switch_subsystem,
                optional_integer,
                optional_float,
                section,
            } => {
                if trigger.trigger_type != TriggerType::FrontCarFrontAxle {
                    return false;
                }
                let Some(train_idx) = trigger.train else {
                    return false;
                };
                let section = resolve_transponder_section(world, *section, train_idx);
                let Some(train) = train_mut(world, train_idx) else {
                    return false;
                };
                if *kind == TransponderKind::AccidentalDeparture
                    && (train.station.is_none()
                        || train.station_distance_to_stop_point >= si::Length::ZERO)
                {
                    return false;
                }
                let data = PendingTransponder {
                    kind: *kind,
                    switch_subsystem: *switch_subsystem,
                    optional_integer: *optional_integer,
                    optional_float: *optional_float,
                    section,
                };
                if fwd {
                    train.pending_transponders.push(data);
                } else if let Some(i) = train
                    .pending_transponders
                    .iter()
                    .rposition(|p| p.same_beacon(&data))
                {
                    train.pending_transponders.remove(i);
                }
                false
            }
            Self::LimitChange { previous, next } => {
                let Some(train_idx) = trigger.train else {
                    return false;
                };
                let Some(train) = train_mut(world, train_idx) else {
                    return false;
                };
                let mut overspeed = false;
                match (trigger.trigger_type, fwd) {
                    (TriggerType::FrontCarFrontAxle, true) => {
                        train.push_route_limit(*next);
                        overspeed = train.is_player
                            && !train.notices_suppressed()
                            && train.current_speed > *next;
                    }
                    (TriggerType::FrontCarFrontAxle, false) => train.pop_route_limit(*previous),
                    (TriggerType::RearCarRearAxle, true) => train.drop_oldest_route_limit(*next),
                    (TriggerType::RearCarRearAxle, false) => {
                        train.restore_oldest_route_limit(*previous)
                    }
                    _ => {}
                }
                if overspeed {
                    world.push_notice(Notice::RouteOverspeed);
                }
                false
            }
            Self::Sound {
                buffer,
                player_train_only,
                once,
                dynamic,
                position,
                speed,
            } => {
                if world.suppress_sound_events || !trigger.trigger_type.is_axle() {
                    return false;
                }
                let Some(train_idx) = trigger.train else {
                    return false;
                };
                if *player_train_only && !is_player(world, trigger) {
                    return false;
                }
                let Some(train) = train_mut(world, train_idx) else {
                    return false;
                };
                let source = match buffer {
                    Some(buffer) => Some(CarSound {
                        buffer: *buffer,
                        position: *position,
                    }),
                    None => train.car(trigger.car).and_then(|car| {
                        if trigger.trigger_type.is_front_axle() {
                            car.front_point_sound
                        } else {
                            car.rear_point_sound
                        }
                    }),
                };
                let (mut pitch, mut gain) = (1.0, 1.0);
                let mut audible = true;
                if *dynamic {
                    pitch = (train.current_speed.abs() / *speed).get::<si::ratio>();
                    gain = if pitch < 0.5 { 2.0 * pitch } else { 1.0 };
                    audible = pitch >= 0.2 && gain >= 0.2;
                }
                if let (Some(CarSound { buffer, position }), true) = (source, audible) {
                    world.sound_requests.push(SoundRequest::Play {
                        buffer,
                        train: Some(train_idx),
                        car: trigger.car,
                        position,
                        pitch,
                        gain,
                        looped: false,
                    });
                }
                *once
            }
            Self::RailSoundsChange {
                previous_run,
                previous_flange,
                next_run,
                next_flange,
            } => {
                let (run, flange) = if fwd {
                    (*next_run, *next_flange)
                } else {
                    (*previous_run, *previous_flange)
                };
                let front = trigger.trigger_type.is_front_axle();
                if let Some(car) = car_mut(world, trigger) {
                    let axle = if front {
                        &mut car.front_axle
                    } else {
                        &mut car.rear_axle
                    };
                    axle.run = run;
                    axle.flange = flange;
                }
                false
            }
            Self::TrackEnd => {
                if trigger.trigger_type != TriggerType::RearCarRearAxle {
                    return false;
                }
                match trigger.train {
                    Some(train_idx) if !is_player(world, trigger) => {
                        world.dispose_train(train_idx);
                        true
                    }
                    _ => false,
                }
            }
        }
    }
}

fn train_mut(world: &mut World, idx: usize) -> Option<&mut Train> {
    let n = world.trains.len();
    let train = world.trains.get_mut(idx);
    if train.is_none() {
        warn!("{}\ntrain {} out of range for {} trains", format_dbg!(), idx, n);
    }
    train
}

fn car_mut<'a>(world: &'a mut World, trigger: &Trigger) -> Option<&'a mut crate::world::Car> {
    let train = train_mut(world, trigger.train?)?;
    let car = train.car_mut(trigger.car);
    if car.is_none() {
        warn!("{}\ncar {} out of range", format_dbg!(), trigger.car);
    }
    car
}

fn is_player(world: &World, trigger: &Trigger) -> bool {
    trigger
        .train
        .and_then(|t| world.trains.get(t))
        .map(|t| t.is_player)
        .unwrap_or(false)
}

fn station_start(station: usize, trigger: &Trigger, world: &mut World) {
    let Some(train_idx) = trigger.train else {
        return;
    };
    let Some(atc) = world
        .stations
        .get(station)
        .map(|s| s.safety_system == SafetySystem::Atc)
    else {
        warn!("{}\nstation {} out of range", format_dbg!(), station);
        return;
    };
    let Some(train) = train_mut(world, train_idx) else {
        return;
    };
    match (trigger.trigger_type, trigger.dir) {
        (TriggerType::FrontCarFrontAxle, Dir::Bwd) => {
            train.station = None;
            train.station_front_car = false;
            if !atc {
                train.atc_transmitting = false;
            }
        }
        (TriggerType::FrontCarFrontAxle, Dir::Fwd) => {
            train.station = Some(station);
            train.station_front_car = true;
            train.station_state = StopState::Pending;
            if atc {
                train.atc_transmitting = true;
            }
        }
        (TriggerType::RearCarRearAxle, dir) => train.station_rear_car = dir == Dir::Fwd,
        _ => {}
    }
}

fn station_end(station: usize, trigger: &Trigger, world: &mut World) {
    let Some(train_idx) = trigger.train else {
        return;
    };
    let Some(stn) = world.stations.get(station).cloned() else {
        warn!("{}\nstation {} out of range", format_dbg!(), station);
        return;
    };
    let atc = stn.safety_system == SafetySystem::Atc;
    let Some(train) = train_mut(world, train_idx) else {
        return;
    };
    match (trigger.trigger_type, trigger.dir) {
        (TriggerType::FrontCarFrontAxle, Dir::Bwd) => {
            train.station_front_car = true;
            if atc {
                train.atc_transmitting = true;
            }
        }
        (TriggerType::FrontCarFrontAxle, Dir::Fwd) => {
            train.station_front_car = false;
            if !atc {
                train.atc_transmitting = false;
            }
            if train.is_player {
                world.custom_timetable = stn.timetable;
            }
        }
        (TriggerType::RearCarRearAxle, Dir::Bwd) => {
            train.station = Some(station);
            train.station_rear_car = true;
        }
        (TriggerType::RearCarRearAxle, Dir::Fwd) => {
            if train.station != Some(station) {
                return;
            }
            let notice = match (train.is_player && stn.stop_at_station, train.station_state) {
                (true, StopState::Pending) => Some(Notice::StationPassed {
                    station: stn.name.clone(),
                }),
                (true, StopState::Boarding) => Some(Notice::StationPassedBoarding {
                    station: stn.name.clone(),
                }),
                _ => None,
            };
            train.station = None;
            train.station_rear_car = false;
            train.station_state = StopState::Pending;
            let stop_halt = train.halt_sound.is_some() && train.halt_sound_playing;
            train.halt_sound_playing = false;
            if stop_halt {
                world
                    .sound_requests
                    .push(SoundRequest::StopHalt { train: train_idx });
            }
            if let Some(notice) = notice {
                info!("train {} passed station {}", train_idx, stn.name);
                world.push_notice(notice);
            }
        }
        _ => {}
    }
}

fn enter_section(world: &mut World, section: usize, train: usize) {
    match world.sections.get_mut(section) {
        Some(s) => {
            s.enter(train);
            update_section(&mut world.sections, section);
        }
        None => warn!("{}\nsection {} out of range", format_dbg!(), section),
    }
}

fn leave_section(world: &mut World, section: usize, train: usize) {
    match world.sections.get_mut(section) {
        Some(s) => {
            s.leave(train);
            update_section(&mut world.sections, section);
        }
        None => warn!("{}\nsection {} out of range", format_dbg!(), section),
    }
}

fn clear_stop_point(world: &mut World, section: Option<usize>) {
    if let Some(s) = section.and_then(|s| world.sections.get_mut(s)) {
        s.train_reached_stop_point = false;
    }
}

/// Points `train` at `section` for its section limit, unless the section is invisible
fn adopt_section(world: &mut World, section: Option<usize>, train_idx: usize) -> bool {
    let target = match section {
        Some(s) => match world.sections.get(s) {
            Some(sec) if sec.invisible => return false,
            Some(sec) => Some((s, sec.speed_limit())),
            None => {
                warn!("{}\nsection {} out of range", format_dbg!(), s);
                return false;
            }
        },
        None => None,
    };
    let Some(train) = train_mut(world, train_idx) else {
        return false;
    };
    match target {
        Some((s, limit)) => {
            train.current_section = Some(s);
            train.current_section_limit = limit;
        }
        None => {
            train.current_section = None;
            train.current_section_limit = f64::INFINITY * uc::MPS;
        }
    }
    true
}

fn section_change(
    previous: Option<usize>,
    next: Option<usize>,
    trigger: &Trigger,
    world: &mut World,
) {
    let Some(train_idx) = trigger.train else {
        return;
    };
    match (trigger.trigger_type, trigger.dir) {
        (TriggerType::FrontCarFrontAxle, Dir::Bwd) => {
            clear_stop_point(world, next);
            if let Some(p) = previous {
                enter_section(world, p, train_idx);
            }
            if let Some(n) = next {
                leave_section(world, n, train_idx);
            }
        }
        (TriggerType::FrontCarFrontAxle, Dir::Fwd) => {
            if adopt_section(world, next, train_idx) {
                let notice = world.trains.get(train_idx).and_then(|train| {
                    if !train.is_player || train.notices_suppressed() {
                        None
                    } else if train.current_section_limit == si::Velocity::ZERO {
                        Some(Notice::SignalStop)
                    } else if train.current_speed > train.current_section_limit {
                        Some(Notice::SignalOverspeed)
                    } else {
                        None
                    }
                });
                if let Some(notice) = notice {
                    world.push_notice(notice);
                }
            }
            if let Some(n) = next {
                enter_section(world, n, train_idx);
            }
        }
        (TriggerType::RearCarRearAxle, Dir::Bwd) => {
            if let Some(p) = previous {
                enter_section(world, p, train_idx);
            }
            adopt_section(world, previous, train_idx);
        }
        (TriggerType::RearCarRearAxle, Dir::Fwd) => {
            clear_stop_point(world, previous);
            if let Some(p) = previous {
                leave_section(world, p, train_idx);
            }
            if let Some(n) = next {
                enter_section(world, n, train_idx);
            }
        }
        _ => {}
    }
}

/// Walks back from `section` to the nearest block showing stop, unless the
/// train is already inside one of the blocks passed on the way
fn resolve_transponder_section(
    world: &World,
    section: Option<usize>,
    train: usize,
) -> Option<usize> {
    let start = section?;
    let mut cursor = start;
    for _ in 0..world.sections.len() {
        let Some(sec) = world.sections.get(cursor) else {
            break;
        };
        if sec.contains(train) {
            return Some(start);
        }
        if sec.is_stop() {
            return Some(cursor);
        }
        match sec.previous {
            Some(p) => cursor = p,
            None => break,
        }
    }
    Some(start)
}
