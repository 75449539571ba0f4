//! Per-tick course update
//!
//! Strict order each tick:
//! 1. sanitize input and derive forward
//! 2. apply any reported crash
//! 3. recycle/miss pass over every gate
//! 4. pass-detection pass over gates not respawned this tick
//! 5. advance flash and score timers

use glam::{Quat, Vec3};

use super::gate::{FlashKind, centering_score, speed_score, trigger_contains};
use super::state::{GateCourseEngine, GateEvent, finite_or, finite_or_zero};
use crate::{flatten, yaw_forward};

/// Agent sample for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub position: Vec3,
    /// Scalar speed used for the speed bonus and crash penalty
    pub speed: f32,
    /// World velocity; only the XZ part is used for forward
    pub velocity: Option<Vec3>,
    /// Attitude; only its yaw is used
    pub orientation: Option<Quat>,
    /// Impact speed if the physics step reported a crash
    pub crash_speed: Option<f32>,
}

impl TickInput {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Input for an agent moving with `velocity` (speed taken from its length)
    pub fn moving(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            speed: velocity.length(),
            velocity: Some(velocity),
            ..Default::default()
        }
    }
}

/// Copy of the input with every non-finite value replaced
fn sanitize(input: &TickInput, dt: f32) -> (TickInput, f32, u32) {
    let mut bad = 0u32;
    let mut count = |ok: bool| {
        if !ok {
            bad += 1;
        }
    };

    count(input.position.is_finite());
    let position = finite_or_zero(input.position);

    count(input.speed.is_finite());
    let speed = finite_or(input.speed, 0.0).max(0.0);

    let velocity = input.velocity.map(|v| {
        count(v.is_finite());
        finite_or_zero(v)
    });

    let orientation = input.orientation.and_then(|q| {
        let ok = q.is_finite();
        count(ok);
        ok.then(|| q.normalize())
    });

    let crash_speed = input.crash_speed.map(|s| {
        count(s.is_finite());
        finite_or(s, 0.0).max(0.0)
    });

    count(dt.is_finite());
    let dt = finite_or(dt, 0.0).max(0.0);

    (
        TickInput {
            position,
            speed,
            velocity,
            orientation,
            crash_speed,
        },
        dt,
        bad,
    )
}

impl GateCourseEngine {
    /// Advance the course one step and return the events it produced
    ///
    /// `dt` should already be clamped by the caller. Every event has been
    /// applied to the score before this returns.
    pub fn tick(&mut self, input: &TickInput, dt: f32) -> Vec<GateEvent> {
        let (input, dt, bad) = sanitize(input, dt);
        if bad > 0 {
            if self.stats.non_finite_inputs == 0 {
                log::warn!("Non-finite tick input replaced with zero ({bad} values)");
            } else {
                log::debug!("Non-finite tick input replaced with zero ({bad} values)");
            }
            self.stats.non_finite_inputs = self.stats.non_finite_inputs.saturating_add(bad);
        }

        self.stats.ticks += 1;
        let tick = self.stats.ticks;
        self.forward = self.derive_forward(&input);

        let mut events = Vec::new();

        if let Some(impact) = input.crash_speed {
            let penalty = self.score.on_crash(impact);
            self.stats.crashes += 1;
            log::debug!("Crash at speed {impact:.1}: {penalty}");
            events.push(GateEvent::Crashed { penalty });
        }

        self.recycle_pass(&input, tick, &mut events);
        self.pass_detection(&input, tick, &mut events);

        self.pool.advance_flashes(dt);
        self.score.tick(dt);

        events
    }

    /// Velocity if it is meaningful, else orientation yaw, else last forward
    fn derive_forward(&self, input: &TickInput) -> Vec3 {
        if let Some(velocity) = input.velocity {
            let flat = flatten(velocity);
            if flat.length_squared() > self.settings.course.velocity_forward_min_sq {
                return flat.normalize();
            }
        }
        if let Some(forward) = input.orientation.and_then(yaw_forward) {
            return forward;
        }
        self.forward
    }

    fn recycle_pass(&mut self, input: &TickInput, tick: u64, events: &mut Vec<GateEvent>) {
        let forward = self.forward;
        let behind_recycle = self.settings.course.behind_recycle;
        let far_recycle = self.settings.course.far_recycle;
        let miss_penalty = self.settings.course.miss_penalty;
        let miss_flash = self.settings.course.miss_flash;

        for index in 0..self.pool.len() {
            let gate = self.pool.gate_mut(index);
            let to_gate = gate.transform.position - input.position;
            let ahead = to_gate.dot(forward);
            // Gate heights are absolute, so altitude must not push the course out of range
            let distance = flatten(to_gate).length();

            if ahead > 0.0 {
                gate.was_ahead = true;
            }

            if ahead < -behind_recycle || distance > far_recycle {
                if !gate.passed && gate.was_ahead {
                    gate.was_ahead = false;
                    gate.start_flash(FlashKind::Missed, miss_flash);
                    let lane = gate.lane;
                    let penalty = self.score.on_penalty(miss_penalty);
                    self.stats.gates_missed += 1;
                    log::debug!("Gate {index} (lane {lane}) missed: {penalty}");
                    events.push(GateEvent::Missed { gate: index, penalty });
                }
                self.pool.respawn(index, input.position, forward, tick);
            }
        }
    }

    fn pass_detection(&mut self, input: &TickInput, tick: u64, events: &mut Vec<GateEvent>) {
        for index in 0..self.pool.len() {
            let gate = self.pool.gate_mut(index);
            if gate.passed || gate.spawned_tick == tick {
                continue;
            }
            let Some(hit) = trigger_contains(&gate.transform, input.position, &self.settings.course) else {
                continue;
            };

            // Mark before scoring so nothing can credit this gate twice
            gate.passed = true;
            gate.was_ahead = false;
            gate.start_flash(FlashKind::Cleared, self.settings.course.clear_flash);
            let lane = gate.lane;

            let centering = centering_score(hit.local, &self.settings.course);
            let speed = speed_score(input.speed, &self.settings.course);
            let points = self
                .score
                .on_gate_cleared(self.settings.course.base_points, centering, speed);
            self.stats.gates_passed += 1;
            log::debug!("Gate {index} cleared: center={centering} speed={speed} points={points}");

            events.push(GateEvent::Cleared {
                gate: index,
                lane,
                centering,
                speed,
                points,
            });
        }
    }
}
