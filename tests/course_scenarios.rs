//! End-to-end course scenarios: straight pass, turn-away miss, crash, lane
//! balancing, and the pool/credit invariants over long runs.

use std::collections::HashSet;

use gate_rush::consts::{MAX_SAME_LANE_STREAK, SIM_DT};
use gate_rush::sim::{GateCourseEngine, GateEvent, LaneBalancer, ScoreEngine, TickInput};
use gate_rush::{FixedStep, Settings};
use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

const DT: f32 = 1.0 / 60.0;
const GATE_HEIGHT_Y: f32 = 2.6;

/// One gate exactly 120 units ahead on lane 0, no jitter
fn single_gate_course() -> GateCourseEngine {
    single_gate_course_with(|_| {})
}

fn single_gate_course_with(tweak: impl Fn(&mut Settings)) -> GateCourseEngine {
    for seed in 0..64 {
        let mut settings = Settings::with_seed(seed);
        settings.course.gate_count = 1;
        settings.course.spawn_min = 120.0;
        settings.course.spawn_max = 200.0;
        settings.course.lane_jitter = 0.0;
        settings.course.vertical_jitter = 0.0;
        tweak(&mut settings);
        let course = GateCourseEngine::new(settings, Vec3::ZERO, Vec3::NEG_Z).unwrap();
        if course.gates()[0].lane == 0 {
            return course;
        }
    }
    panic!("no seed produced a lane 0 placeholder");
}

#[test]
fn scenario_a_dead_center_pass_at_full_speed() {
    let mut course = single_gate_course();
    let gate_pos = course.gates()[0].transform.position;
    assert_eq!(gate_pos, Vec3::new(0.0, GATE_HEIGHT_Y, -120.0));

    let velocity = Vec3::new(0.0, 0.0, -18.0);
    let mut position = Vec3::new(0.0, GATE_HEIGHT_Y, 0.0);
    let mut cleared = Vec::new();
    for _ in 0..500 {
        position += velocity * DT;
        for event in course.tick(&TickInput::moving(position, velocity), DT) {
            cleared.push(event);
        }
        if !cleared.is_empty() {
            break;
        }
    }

    assert_eq!(
        cleared,
        vec![GateEvent::Cleared {
            gate: 0,
            lane: 0,
            centering: 80.0,
            speed: 50.0,
            points: 230,
        }]
    );
    assert_eq!(course.score_snapshot().score, 230);
    assert!(course.gates()[0].passed);
    assert!(!course.gates()[0].was_ahead);
    assert_eq!(course.hud_snapshot().gates_passed, 1);
}

#[test]
fn scenario_a_scaled_by_combo() {
    // Long decay delay so the combo from the first pass survives the trip to the second
    let mut course = single_gate_course_with(|s| s.score.combo_decay_delay = 100.0);
    let velocity = Vec3::new(0.0, 0.0, -18.0);
    let mut position = Vec3::new(0.0, GATE_HEIGHT_Y, 0.0);
    let mut points = Vec::new();
    for _ in 0..3000 {
        position += velocity * DT;
        // Line up with whichever slot position the gate currently has
        position.x = course.gates()[0].transform.position.x;
        for event in course.tick(&TickInput::moving(position, velocity), DT) {
            if let GateEvent::Cleared { points: p, .. } = event {
                points.push(p);
            }
        }
        if points.len() == 2 {
            break;
        }
    }
    // 100 + 80 + 50 at x1.0, then each part truncated at x1.12
    assert_eq!(points, vec![230, 112 + 89 + 56]);
    assert!((course.score().combo() - 1.24).abs() < 1e-5);
}

#[test]
fn scenario_b_turning_away_is_one_miss() {
    let mut course = single_gate_course();
    let toward = Vec3::new(0.0, 0.0, -18.0);
    let mut position = Vec3::new(0.0, GATE_HEIGHT_Y, 0.0);

    // Approach for a second; the gate is seen ahead
    for _ in 0..60 {
        position += toward * DT;
        assert!(course.tick(&TickInput::moving(position, toward), DT).is_empty());
    }
    assert!(course.gates()[0].was_ahead);
    let generation = course.gates()[0].generation;

    // Turn around: the gate is now ~100 units behind
    let away = -toward;
    let mut events = Vec::new();
    for _ in 0..30 {
        position += away * DT;
        events.extend(course.tick(&TickInput::moving(position, away), DT));
    }

    assert_eq!(events, vec![GateEvent::Missed { gate: 0, penalty: -140 }]);
    let gate = &course.gates()[0];
    assert_eq!(gate.generation, generation + 1);
    assert!(!gate.passed);
    // Respawned ahead along the new heading
    assert!((gate.transform.position - position).dot(away) > 0.0);
    assert!(gate.transform.depth_axis().dot(Vec3::Z).abs() > 0.9999);

    let score = course.score_snapshot();
    assert_eq!(score.score, 0);
    assert_eq!(score.combo, 1.0);
    assert_eq!(score.streak, 0);
    assert_eq!(course.stats().gates_missed, 1);
}

#[test]
fn gate_never_seen_ahead_is_not_a_miss() {
    let mut course = single_gate_course();
    let away = Vec3::new(0.0, 0.0, 18.0);
    let events = course.tick(&TickInput::moving(Vec3::ZERO, away), DT);
    assert!(events.is_empty());
    assert_eq!(course.gates()[0].generation, 1);
    assert_eq!(course.stats().gates_missed, 0);
    assert_eq!(course.score_snapshot().penalty_flash, 0.0);
}

#[test]
fn gate_seen_ahead_then_out_of_range_is_one_miss() {
    let mut course = single_gate_course();
    let velocity = Vec3::new(0.0, 0.0, -18.0);
    assert!(course.tick(&TickInput::moving(Vec3::new(0.0, GATE_HEIGHT_Y, 0.0), velocity), DT).is_empty());
    assert!(course.gates()[0].was_ahead);

    // Sidestep far enough that the gate, still ahead, leaves the recycle range
    let position = Vec3::new(400.0, GATE_HEIGHT_Y, 0.0);
    let to_gate = course.gates()[0].transform.position - position;
    assert!(to_gate.dot(Vec3::NEG_Z) > 0.0);
    assert!(to_gate.length() > 320.0);

    let events = course.tick(&TickInput::moving(position, velocity), DT);
    assert_eq!(events, vec![GateEvent::Missed { gate: 0, penalty: -140 }]);
    let gate = &course.gates()[0];
    assert_eq!(gate.generation, 1);
    assert!(!gate.passed);
    assert!((gate.transform.position - position).length() < 320.0);

    // The replacement is in range, so staying put costs nothing more
    assert!(course.tick(&TickInput::moving(position, velocity), DT).is_empty());
    assert_eq!(course.stats().gates_missed, 1);
    assert_eq!(course.gates()[0].generation, 1);
}

#[test]
fn gate_out_of_range_never_seen_ahead_is_silent() {
    let mut course = single_gate_course();
    // Gate sits 5 units behind and 400 to the side: too near to count as behind, too far to keep
    let position = Vec3::new(400.0, GATE_HEIGHT_Y, -125.0);
    let events = course.tick(&TickInput::moving(position, Vec3::new(0.0, 0.0, -18.0)), DT);
    assert!(events.is_empty());
    assert_eq!(course.gates()[0].generation, 1);
    assert_eq!(course.stats().gates_missed, 0);
    assert_eq!(course.score_snapshot().penalty_flash, 0.0);
}

#[test]
fn high_altitude_flight_keeps_the_course_in_range() {
    let mut course = GateCourseEngine::new(Settings::with_seed(3), Vec3::ZERO, Vec3::NEG_Z).unwrap();
    let velocity = Vec3::new(0.0, 0.0, -18.0);
    let mut position = Vec3::new(0.0, 330.0, 0.0);
    for _ in 0..60 {
        position += velocity * DT;
        assert!(course.tick(&TickInput::moving(position, velocity), DT).is_empty());
    }
    assert_eq!(course.stats().gates_missed, 0);
    assert!(course.gates().iter().all(|g| g.generation == 0));
}

#[test]
fn scenario_c_crash_penalty_and_lock() {
    let mut engine = ScoreEngine::default();
    engine.add(1000.0, false);
    engine.on_gate_cleared(100.0, 0.0, 0.0);
    let delta = engine.on_crash(10.0);
    assert_eq!(delta, -340);
    assert_eq!(engine.combo(), 1.0);
    assert_eq!(engine.combo_lock_remaining(), 0.55);
}

#[test]
fn scenario_d_third_repeat_forces_change() {
    let mut rng = Pcg32::seed_from_u64(99);
    let mut balancer = LaneBalancer::new(0.0, MAX_SAME_LANE_STREAK);
    let mut forced = 0;
    for _ in 0..2000 {
        let streak = balancer.same_lane_streak();
        let last = balancer.last_lane();
        let lane = balancer.next_lane(&mut rng);
        if streak >= 2 {
            assert_ne!(lane, last);
            forced += 1;
        }
    }
    assert!(forced > 0);
}

/// Straight flight along -Z with a slow weave so some gates are hit and some missed
fn weave_input(t: f32) -> TickInput {
    let velocity = Vec3::new((t * 0.7).sin() * 6.0, 0.0, -18.0);
    let position = Vec3::new(-(t * 0.7).cos() * 6.0 / 0.7, GATE_HEIGHT_Y + (t * 1.3).sin(), -18.0 * t);
    TickInput::moving(position, velocity)
}

#[test]
fn pool_size_constant_and_no_double_credit() {
    let mut course = GateCourseEngine::new(Settings::with_seed(7), Vec3::ZERO, Vec3::NEG_Z).unwrap();
    let mut credited: HashSet<(usize, u32)> = HashSet::new();
    let mut misses = 0;

    let mut t = 0.0;
    for _ in 0..(120 * 90) {
        t += SIM_DT;
        for event in course.tick(&weave_input(t), SIM_DT) {
            match event {
                GateEvent::Cleared { gate, .. } => {
                    let generation = course.gates()[gate].generation;
                    assert!(credited.insert((gate, generation)), "gate {gate} credited twice");
                }
                GateEvent::Missed { .. } => misses += 1,
                GateEvent::Crashed { .. } => unreachable!(),
            }
        }
        assert_eq!(course.gate_count(), 22);
        assert_eq!(course.gate_transforms().len(), 22);
        let score = course.score_snapshot();
        assert!(score.score >= 0);
        assert!((1.0..=3.0).contains(&score.combo));
    }

    let stats = course.stats();
    assert_eq!(stats.gates_passed as usize, credited.len());
    assert_eq!(stats.gates_missed, misses);
    assert!(stats.gates_resolved() > 0);
}

#[test]
fn same_seed_same_course() {
    let mut a = GateCourseEngine::new(Settings::with_seed(11), Vec3::ZERO, Vec3::NEG_Z).unwrap();
    let mut b = GateCourseEngine::new(Settings::with_seed(11), Vec3::ZERO, Vec3::NEG_Z).unwrap();
    let mut t = 0.0;
    for _ in 0..2000 {
        t += SIM_DT;
        let input = weave_input(t);
        assert_eq!(a.tick(&input, SIM_DT), b.tick(&input, SIM_DT));
    }
    assert_eq!(a.gate_transforms(), b.gate_transforms());
    assert_eq!(a.hud_snapshot(), b.hud_snapshot());
}

#[test]
fn reset_starts_a_clean_run() {
    let mut course = GateCourseEngine::new(Settings::with_seed(5), Vec3::ZERO, Vec3::NEG_Z).unwrap();
    let mut t = 0.0;
    for _ in 0..3000 {
        t += SIM_DT;
        course.tick(&weave_input(t), SIM_DT);
    }
    course.reset(Vec3::new(100.0, 0.0, 100.0), Vec3::X);
    assert_eq!(course.stats().ticks, 0);
    assert_eq!(course.hud_snapshot().score, 0);
    assert_eq!(course.gate_count(), 22);
    assert!(course.gates().iter().all(|g| !g.passed && !g.was_ahead && g.generation == 0));
    assert!((course.forward() - Vec3::X).length() < 1e-6);
    let nearest = course.gates()[0].transform.position;
    assert!((nearest.x - 170.0).abs() < 1e-3);
}

#[test]
fn fixed_step_drives_the_course() {
    let mut course = GateCourseEngine::new(Settings::default(), Vec3::ZERO, Vec3::NEG_Z).unwrap();
    let mut fixed = FixedStep::default();
    let mut t = 0.0;
    for _ in 0..60 {
        for _ in 0..fixed.advance(1.0 / 60.0) {
            t += fixed.step();
            course.tick(&weave_input(t), fixed.step());
        }
    }
    let ticks = course.stats().ticks;
    assert!((119..=120).contains(&ticks));
}

#[test]
fn gate_instances_match_transforms() {
    let course = GateCourseEngine::new(Settings::default(), Vec3::ZERO, Vec3::NEG_Z).unwrap();
    for (instance, transform) in course.gate_instances().iter().zip(course.gate_transforms()) {
        let translation = instance.model[3];
        assert_eq!(translation[..3], transform.position.to_array());
    }
}
