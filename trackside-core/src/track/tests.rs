use super::*;
use crate::world::{
    Brightness, CarSound, Crossing, Fog, PassAlarm, RailSounds, Section, SectionAspect,
    Station, TransponderKind, Train, World,
};

fn limit_track() -> Track {
    Track::new(vec![
        TrackElement::new(0.0 * uc::M).with_event(TrackEvent::new(
            50.0 * uc::M,
            EventKind::LimitChange {
                previous: 10.0 * uc::KPH,
                next: 25.0 * uc::KPH,
            },
        )),
        TrackElement::new(100.0 * uc::M),
        TrackElement::new(250.0 * uc::M),
    ])
    .unwrap()
}

fn world_with_player() -> World {
    let mut world = World::default();
    world.trains.push(Train::player(2));
    world.record_crossings();
    world
}

fn front_axle() -> TrackFollower {
    TrackFollower::new(TriggerType::FrontCarFrontAxle, Some(0), 0)
}

/// Curved, canted track with events on several elements, some exactly on
/// element boundaries
fn scenic_track() -> Track {
    let background = |delta: f64, previous, next| {
        TrackEvent::new(
            delta * uc::M,
            EventKind::BackgroundChange { previous, next },
        )
    };
    let mut curve = TrackElement::new(100.0 * uc::M).with_curve(-400.0 * uc::M, 0.08 * uc::M);
    curve.curve_cant_interpolation = CantInterpolation::BiasForward;
    curve.inaccuracy = 1.5;
    let mut elements = vec![
        TrackElement::new(0.0 * uc::M)
            .with_event(background(20.0, Some(0), Some(1)))
            .with_event(background(75.5, Some(1), Some(2))),
        curve
            .with_event(background(0.0, Some(2), Some(3)))
            .with_event(background(60.0, Some(3), Some(4))),
        TrackElement::new(250.0 * uc::M).with_event(background(150.0, Some(4), Some(5))),
        TrackElement::new(500.0 * uc::M),
    ];
    // anchor each element's frame where the previous element ends
    for i in 1..elements.len() {
        let span = elements[i].starting_track_position - elements[i - 1].starting_track_position;
        let frame = elements[i - 1].frame_at(span);
        elements[i].frame = frame;
    }
    Track::new(elements).unwrap()
}

fn journal(world: &World) -> Vec<Crossing> {
    world.crossings.clone().unwrap_or_default()
}

#[test]
fn test_limit_change_forward_and_back() {
    let mut track = limit_track();
    let mut world = world_with_player();
    let mut follower = front_axle();

    follower.move_to(&mut track, &mut world, 75.0 * uc::M, true, false);
    assert!(almost_eq_uom(
        &world.trains[0].current_route_limit,
        &(25.0 * uc::KPH),
        None
    ));
    follower.move_to(&mut track, &mut world, 0.0 * uc::M, true, false);
    assert!(almost_eq_uom(
        &world.trains[0].current_route_limit,
        &(10.0 * uc::KPH),
        None
    ));
    assert_eq!(journal(&world).len(), 2);
    assert_eq!(journal(&world)[0].dir, Dir::Fwd);
    assert_eq!(journal(&world)[1].dir, Dir::Bwd);
}

#[test]
fn test_limit_change_repeated_oscillation() {
    let mut track = limit_track();
    let mut world = world_with_player();
    let mut follower = front_axle();

    for _ in 0..3 {
        follower.move_to(&mut track, &mut world, 75.0 * uc::M, true, false);
        assert!(almost_eq_uom(
            &world.trains[0].current_route_limit,
            &(25.0 * uc::KPH),
            None
        ));
        assert_eq!(world.trains[0].route_limits.len(), 1);
        follower.move_to(&mut track, &mut world, 0.0 * uc::M, true, false);
        assert!(almost_eq_uom(
            &world.trains[0].current_route_limit,
            &(10.0 * uc::KPH),
            None
        ));
        assert!(world.trains[0].route_limits.is_empty());
    }
    assert_eq!(journal(&world).len(), 6);
}

#[test]
fn test_round_trip_is_reversible() {
    let mut track = scenic_track();
    let mut world = World::default();
    world.record_crossings();
    let mut camera = TrackFollower::camera();
    camera.place_at(&track, 30.0 * uc::M, true).unwrap();
    let start_pose = camera.pose();
    let start_cant = camera.curve_cant;

    camera.move_to(&mut track, &mut world, 420.0 * uc::M, true, true);
    assert_eq!(camera.last_track_element, 2);
    assert_eq!(world.scenery.target_background, Some(5));
    let n_forward = journal(&world).len();
    assert_eq!(n_forward, 4);

    camera.move_to(&mut track, &mut world, 30.0 * uc::M, true, true);
    let end_pose = camera.pose();
    assert_eq!(end_pose.element, start_pose.element);
    assert_eq!(end_pose.track_position, start_pose.track_position);
    assert!(utils::almost_eq_vec(end_pose.position, start_pose.position, Some(1e-9)));
    assert!(utils::almost_eq_vec(end_pose.direction, start_pose.direction, Some(1e-9)));
    assert!(almost_eq_uom(&camera.curve_cant, &start_cant, None));
    assert_eq!(world.scenery.target_background, Some(1));

    // the backward trip fires the same events in reverse order
    let crossings = journal(&world);
    let (fwd, bwd) = crossings.split_at(n_forward);
    assert_eq!(bwd.len(), fwd.len());
    for (f, b) in fwd.iter().zip(bwd.iter().rev()) {
        assert_eq!((f.element, f.event), (b.element, b.event));
        assert_eq!(f.dir, Dir::Fwd);
        assert_eq!(b.dir, Dir::Bwd);
    }
}

#[test]
fn test_crossings_independent_of_step_size() {
    let run = |step: f64| {
        let mut track = scenic_track();
        let mut world = World::default();
        world.record_crossings();
        let mut camera = TrackFollower::camera();
        let mut position = 0.0;
        while position < 480.0 {
            position = (position + step).min(480.0);
            camera.move_to(&mut track, &mut world, position * uc::M, false, false);
        }
        while position > 0.0 {
            position = (position - step).max(0.0);
            camera.move_to(&mut track, &mut world, position * uc::M, false, false);
        }
        journal(&world)
    };
    let single = run(480.0);
    assert_eq!(single.len(), 10);
    assert_eq!(run(0.5), single);
    assert_eq!(run(0.37), single);
    assert_eq!(run(25.0), single);
}

#[test]
fn test_pass_alarm_fires_once() {
    let mut track = Track::new(vec![
        TrackElement::new(0.0 * uc::M)
            .with_event(TrackEvent::new(40.0 * uc::M, EventKind::StationPassAlarm)),
    ])
    .unwrap();
    let mut world = world_with_player();
    world.trains[0].pass_alarm = PassAlarm::Single;
    world.trains[0].halt_sound = Some(CarSound {
        buffer: 7,
        position: DVec3::ZERO,
    });
    let mut follower = front_axle();

    // crossing backward first does not latch
    follower.place_at(&track, 60.0 * uc::M, false).unwrap();
    follower.move_to(&mut track, &mut world, 10.0 * uc::M, false, false);
    assert!(!track.elements[0].events[0].dont_trigger_anymore);
    assert!(world.sound_requests.is_empty());

    for _ in 0..3 {
        follower.move_to(&mut track, &mut world, 60.0 * uc::M, false, false);
        follower.move_to(&mut track, &mut world, 10.0 * uc::M, false, false);
    }
    assert!(track.elements[0].events[0].dont_trigger_anymore);
    assert_eq!(world.sound_requests.len(), 1);
    // one backward invocation before latching plus one forward
    assert_eq!(journal(&world).len(), 2);
}

#[test]
fn test_suppressed_sound_does_not_latch() {
    let mut track = Track::new(vec![TrackElement::new(0.0 * uc::M).with_event(
        TrackEvent::new(
            40.0 * uc::M,
            EventKind::Sound {
                buffer: Some(3),
                player_train_only: false,
                once: true,
                dynamic: false,
                position: DVec3::ZERO,
                speed: si::Velocity::ZERO,
            },
        ),
    )])
    .unwrap();
    let mut world = world_with_player();
    let mut follower = front_axle();

    world.suppress_sound_events = true;
    follower.move_to(&mut track, &mut world, 50.0 * uc::M, false, false);
    follower.move_to(&mut track, &mut world, 30.0 * uc::M, false, false);
    assert!(world.sound_requests.is_empty());
    assert!(!track.elements[0].events[0].dont_trigger_anymore);

    world.suppress_sound_events = false;
    follower.move_to(&mut track, &mut world, 50.0 * uc::M, false, false);
    assert_eq!(world.sound_requests.len(), 1);
    assert!(track.elements[0].events[0].dont_trigger_anymore);
    follower.move_to(&mut track, &mut world, 30.0 * uc::M, false, false);
    assert_eq!(world.sound_requests.len(), 1);
}

#[test]
fn test_dynamic_sound_pitch() {
    let mut track = Track::new(vec![TrackElement::new(0.0 * uc::M).with_event(
        TrackEvent::new(
            5.0 * uc::M,
            EventKind::Sound {
                buffer: Some(1),
                player_train_only: true,
                once: false,
                dynamic: true,
                position: DVec3::ZERO,
                speed: 20.0 * uc::MPS,
            },
        ),
    )])
    .unwrap();
    let mut world = world_with_player();
    let mut follower = front_axle();

    world.trains[0].current_speed = 5.0 * uc::MPS;
    follower.move_to(&mut track, &mut world, 10.0 * uc::M, false, false);
    match world.sound_requests.as_slice() {
        [crate::world::SoundRequest::Play { pitch, gain, .. }] => {
            assert!(almost_eq(*pitch, 0.25, None));
            assert!(almost_eq(*gain, 0.5, None));
        }
        other => panic!("unexpected requests {other:?}"),
    }

    // too slow to be audible
    world.trains[0].current_speed = 2.0 * uc::MPS;
    follower.move_to(&mut track, &mut world, 0.0 * uc::M, false, false);
    assert_eq!(world.sound_requests.len(), 1);
}

#[test]
fn test_camera_events_ignore_axles() {
    let mut track = scenic_track();
    let mut world = world_with_player();
    let mut follower = front_axle();
    follower.move_to(&mut track, &mut world, 300.0 * uc::M, false, false);
    assert_eq!(world.scenery.target_background, None);
    // axles still invoke, the events just ignore them
    assert_eq!(journal(&world).len(), 4);
}

#[test]
fn test_running_off_front_clamps() {
    let mut track = limit_track();
    let mut world = world_with_player();
    let mut follower = front_axle();
    follower.place_at(&track, 120.0 * uc::M, false).unwrap();
    assert_eq!(follower.last_track_element, 1);
    follower.move_to(&mut track, &mut world, -30.0 * uc::M, true, false);
    assert_eq!(follower.last_track_element, 0);
    assert_eq!(follower.track_position, -30.0 * uc::M);
    assert_eq!(journal(&world).len(), 1);
    assert!(utils::almost_eq_vec(
        follower.world_position,
        DVec3::new(0.0, 0.0, -30.0),
        None
    ));
}

#[test]
fn test_empty_track_is_noop() {
    let mut track = Track::default();
    let mut world = World::default();
    let mut follower = front_axle();
    follower.move_to(&mut track, &mut world, 100.0 * uc::M, true, true);
    assert_eq!(follower.track_position, si::Length::ZERO);
    assert!(follower.place_at(&track, 5.0 * uc::M, false).is_err());
}

#[test]
fn test_section_change_sets_limit() {
    let aspects = vec![
        SectionAspect::new(0, 0.0 * uc::KPH),
        SectionAspect::new(5, 80.0 * uc::KPH),
    ];
    let mut world = world_with_player();
    world.sections = vec![
        Section {
            next: Some(1),
            aspects: aspects.clone(),
            trains: vec![0],
            ..Default::default()
        },
        Section {
            previous: Some(0),
            aspects,
            ..Default::default()
        },
    ];
    world.update_all_sections();
    let mut track = Track::new(vec![TrackElement::new(0.0 * uc::M).with_event(
        TrackEvent::new(
            100.0 * uc::M,
            EventKind::SectionChange {
                previous: Some(0),
                next: Some(1),
            },
        ),
    )])
    .unwrap();
    let mut front = front_axle();
    let mut rear = TrackFollower::new(TriggerType::RearCarRearAxle, Some(0), 1);
    rear.place_at(&track, 60.0 * uc::M, false).unwrap();
    front.place_at(&track, 90.0 * uc::M, false).unwrap();

    front.move_to(&mut track, &mut world, 110.0 * uc::M, false, false);
    assert_eq!(world.trains[0].current_section, Some(1));
    assert!(almost_eq_uom(
        &world.trains[0].current_section_limit,
        &(80.0 * uc::KPH),
        None
    ));
    assert!(world.sections[1].contains(0));
    assert!(world.sections[1].is_stop());

    rear.move_to(&mut track, &mut world, 130.0 * uc::M, false, false);
    assert!(!world.sections[0].contains(0));
    assert!(!world.sections[0].is_stop());
    assert!(world.notices.is_empty());
}

#[test]
fn test_station_passed_notice() {
    let mut world = world_with_player();
    world.stations.push(Station::new("Kita", true));
    let mut track = Track::new(vec![
        TrackElement::new(0.0 * uc::M)
            .with_event(TrackEvent::new(
                10.0 * uc::M,
                EventKind::StationStart { station: 0 },
            ))
            .with_event(TrackEvent::new(
                50.0 * uc::M,
                EventKind::StationEnd { station: 0 },
            )),
    ])
    .unwrap();
    let mut front = front_axle();
    let mut rear = TrackFollower::new(TriggerType::RearCarRearAxle, Some(0), 1);
    front.place_at(&track, 5.0 * uc::M, false).unwrap();
    rear.place_at(&track, -15.0 * uc::M, false).unwrap();

    front.move_to(&mut track, &mut world, 30.0 * uc::M, false, false);
    assert_eq!(world.trains[0].station, Some(0));
    rear.move_to(&mut track, &mut world, 10.0 * uc::M, false, false);
    assert!(world.trains[0].station_rear_car);
    front.move_to(&mut track, &mut world, 80.0 * uc::M, false, false);
    rear.move_to(&mut track, &mut world, 60.0 * uc::M, false, false);
    assert_eq!(world.trains[0].station, None);
    assert_eq!(
        world.drain_notices(),
        vec![crate::world::Notice::StationPassed {
            station: "Kita".into()
        }]
    );
}

#[test]
fn test_track_end_disposes_other_trains() {
    let mut world = world_with_player();
    world.trains.push(Train::new(1));
    world.sections.push(Section {
        trains: vec![1],
        aspects: vec![SectionAspect::new(0, 0.0 * uc::KPH)],
        ..Default::default()
    });
    let mut track = Track::new(vec![
        TrackElement::new(0.0 * uc::M).with_event(TrackEvent::new(90.0 * uc::M, EventKind::TrackEnd)),
    ])
    .unwrap();

    let mut player_rear = TrackFollower::new(TriggerType::RearCarRearAxle, Some(0), 1);
    player_rear.move_to(&mut track, &mut world, 95.0 * uc::M, false, false);
    assert!(!world.trains[0].disposed);
    assert!(!track.elements[0].events[0].dont_trigger_anymore);

    let mut other_rear = TrackFollower::new(TriggerType::RearCarRearAxle, Some(1), 0);
    other_rear.move_to(&mut track, &mut world, 95.0 * uc::M, false, false);
    assert!(world.trains[1].disposed);
    assert!(world.sections[0].trains.is_empty());
    assert!(track.elements[0].events[0].dont_trigger_anymore);
}

#[test]
fn test_track_init_rejects_unordered_elements() {
    assert!(Track::new(vec![
        TrackElement::new(0.0 * uc::M),
        TrackElement::new(0.0 * uc::M)
    ])
    .is_err());
    let yaml = Track::new(vec![TrackElement::new(0.0 * uc::M), TrackElement::new(5.0 * uc::M)])
        .unwrap()
        .to_yaml()
        .unwrap();
    assert_eq!(Track::from_yaml(yaml, false).unwrap().elements.len(), 2);
}

fn event_track(events: Vec<TrackEvent>) -> Track {
    let mut first = TrackElement::new(0.0 * uc::M);
    for event in events {
        first = first.with_event(event);
    }
    Track::new(vec![first, TrackElement::new(1000.0 * uc::M)]).unwrap()
}

fn fog(start: f64) -> Fog {
    Fog {
        start: start * uc::M,
        end: (start + 100.0) * uc::M,
        ..Default::default()
    }
}

#[test]
fn test_fog_change_toggles() {
    let mut track = event_track(vec![TrackEvent::new(
        50.0 * uc::M,
        EventKind::FogChange {
            previous: fog(1.0),
            current: fog(2.0),
            next: fog(3.0),
        },
    )]);
    let mut world = world_with_player();
    let mut camera = TrackFollower::camera();
    let mut axle = front_axle();

    for _ in 0..2 {
        camera.move_to(&mut track, &mut world, 80.0 * uc::M, true, false);
        assert_eq!(world.scenery.previous_fog, fog(2.0));
        assert_eq!(world.scenery.next_fog, fog(3.0));
        camera.move_to(&mut track, &mut world, 20.0 * uc::M, true, false);
        assert_eq!(world.scenery.previous_fog, fog(1.0));
        assert_eq!(world.scenery.next_fog, fog(2.0));
    }
    // axles leave the fog alone
    axle.move_to(&mut track, &mut world, 80.0 * uc::M, true, false);
    assert_eq!(world.scenery.next_fog, fog(2.0));
}

#[test]
fn test_brightness_change_toggles() {
    let mut track = event_track(vec![TrackEvent::new(
        50.0 * uc::M,
        EventKind::BrightnessChange {
            previous: 0.2,
            previous_distance: 30.0 * uc::M,
            current: 0.5,
            next: 0.9,
            next_distance: 40.0 * uc::M,
        },
    )]);
    let mut world = world_with_player();
    let mut front = front_axle();
    let mut rear = TrackFollower::new(TriggerType::RearCarRearAxle, Some(0), 1);

    let forward = Brightness {
        previous: 0.5,
        previous_track_position: 50.0 * uc::M,
        next: 0.9,
        next_track_position: 90.0 * uc::M,
    };
    let backward = Brightness {
        previous: 0.2,
        previous_track_position: 20.0 * uc::M,
        next: 0.5,
        next_track_position: 50.0 * uc::M,
    };
    front.move_to(&mut track, &mut world, 60.0 * uc::M, true, false);
    assert_eq!(world.trains[0].cars[0].brightness, forward);
    front.move_to(&mut track, &mut world, 40.0 * uc::M, true, false);
    assert_eq!(world.trains[0].cars[0].brightness, backward);
    front.move_to(&mut track, &mut world, 60.0 * uc::M, true, false);
    assert_eq!(world.trains[0].cars[0].brightness, forward);

    rear.move_to(&mut track, &mut world, 60.0 * uc::M, true, false);
    assert_eq!(world.trains[0].cars[1].brightness, Brightness::default());
}

#[test]
fn test_rail_sounds_change_per_axle() {
    let mut track = event_track(vec![TrackEvent::new(
        50.0 * uc::M,
        EventKind::RailSoundsChange {
            previous_run: Some(1),
            previous_flange: Some(2),
            next_run: Some(3),
            next_flange: None,
        },
    )]);
    let mut world = world_with_player();
    let mut front = front_axle();
    let mut rear = TrackFollower::new(TriggerType::OtherCarRearAxle, Some(0), 0);

    let previous = RailSounds {
        run: Some(1),
        flange: Some(2),
    };
    let next = RailSounds {
        run: Some(3),
        flange: None,
    };
    front.move_to(&mut track, &mut world, 70.0 * uc::M, true, false);
    assert_eq!(world.trains[0].cars[0].rear_axle, RailSounds::default());
    front.move_to(&mut track, &mut world, 30.0 * uc::M, true, false);
    for _ in 0..2 {
        front.move_to(&mut track, &mut world, 70.0 * uc::M, true, false);
        assert_eq!(world.trains[0].cars[0].front_axle, next);
        rear.move_to(&mut track, &mut world, 55.0 * uc::M, true, false);
        assert_eq!(world.trains[0].cars[0].rear_axle, next);

        rear.move_to(&mut track, &mut world, 10.0 * uc::M, true, false);
        assert_eq!(world.trains[0].cars[0].rear_axle, previous);
        front.move_to(&mut track, &mut world, 30.0 * uc::M, true, false);
        assert_eq!(world.trains[0].cars[0].front_axle, previous);
    }
}

#[test]
fn test_markers_follow_player_front() {
    let mut track = event_track(vec![
        TrackEvent::new(50.0 * uc::M, EventKind::MarkerStart { texture: 3 }),
        TrackEvent::new(150.0 * uc::M, EventKind::MarkerEnd { texture: 3 }),
    ]);
    let mut world = world_with_player();
    world.trains.push(Train::new(1));
    let mut front = front_axle();
    let mut other_front = TrackFollower::new(TriggerType::FrontCarFrontAxle, Some(1), 0);

    for _ in 0..2 {
        front.move_to(&mut track, &mut world, 100.0 * uc::M, true, false);
        assert_eq!(world.scenery.markers, vec![3]);
        front.move_to(&mut track, &mut world, 200.0 * uc::M, true, false);
        assert!(world.scenery.markers.is_empty());
        front.move_to(&mut track, &mut world, 100.0 * uc::M, true, false);
        assert_eq!(world.scenery.markers, vec![3]);
        front.move_to(&mut track, &mut world, 0.0 * uc::M, true, false);
        assert!(world.scenery.markers.is_empty());
    }
    other_front.move_to(&mut track, &mut world, 100.0 * uc::M, true, false);
    assert!(world.scenery.markers.is_empty());
}

#[test]
fn test_transponder_queue_push_and_retract() {
    let beacon = |delta: f64, kind, section| {
        TrackEvent::new(
            delta * uc::M,
            EventKind::Transponder {
                kind,
                switch_subsystem: false,
                optional_integer: 7,
                optional_float: 0.0,
                section,
            },
        )
    };
    let mut track = event_track(vec![
        beacon(50.0, TransponderKind::S, Some(1)),
        beacon(60.0, TransponderKind::Sn, None),
        beacon(70.0, TransponderKind::AccidentalDeparture, None),
    ]);
    let aspects = vec![
        SectionAspect::new(0, 0.0 * uc::KPH),
        SectionAspect::new(5, 110.0 * uc::KPH),
    ];
    let mut world = world_with_player();
    world.sections = vec![
        Section {
            next: Some(1),
            aspects: aspects.clone(),
            // held by another train
            trains: vec![1],
            ..Default::default()
        },
        Section {
            previous: Some(0),
            aspects,
            ..Default::default()
        },
    ];
    world.update_all_sections();
    let mut front = front_axle();
    let mut rear = TrackFollower::new(TriggerType::RearCarRearAxle, Some(0), 1);
    let kinds = |world: &World| -> Vec<TransponderKind> {
        world.trains[0]
            .pending_transponders
            .iter()
            .map(|p| p.kind)
            .collect()
    };

    for _ in 0..3 {
        front.move_to(&mut track, &mut world, 80.0 * uc::M, true, false);
        // no accidental departure beacon outside a station
        assert_eq!(kinds(&world), vec![TransponderKind::S, TransponderKind::Sn]);
        // reported section walks back to the block showing stop
        assert_eq!(world.trains[0].pending_transponders[0].section, Some(0));
        front.move_to(&mut track, &mut world, 55.0 * uc::M, true, false);
        assert_eq!(kinds(&world), vec![TransponderKind::S]);
        front.move_to(&mut track, &mut world, 0.0 * uc::M, true, false);
        assert!(kinds(&world).is_empty());
    }
    rear.move_to(&mut track, &mut world, 80.0 * uc::M, true, false);
    assert!(kinds(&world).is_empty());
}

#[test]
fn test_equal_delta_events_fire_in_travel_order() {
    let background = |next| {
        TrackEvent::new(
            50.0 * uc::M,
            EventKind::BackgroundChange {
                previous: None,
                next: Some(next),
            },
        )
    };
    let mut track = event_track(vec![background(1), background(2)]);
    let mut world = world_with_player();
    let mut camera = TrackFollower::camera();

    camera.move_to(&mut track, &mut world, 80.0 * uc::M, true, false);
    camera.move_to(&mut track, &mut world, 20.0 * uc::M, true, false);
    let order: Vec<(usize, Dir)> = journal(&world).iter().map(|c| (c.event, c.dir)).collect();
    assert_eq!(
        order,
        vec![(0, Dir::Fwd), (1, Dir::Fwd), (1, Dir::Bwd), (0, Dir::Bwd)]
    );
    assert_eq!(world.scenery.target_background, None);
}
