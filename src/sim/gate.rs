//! Gate records and the fixed-size gate pool
//!
//! Gates are never created or destroyed after construction. A gate that falls
//! behind or out of range is respawned in place, and `respawn` is the only
//! place that resets a gate's pass state.
//!
//! Local frame convention: +X is the gate's width (agent's right), +Y its
//! height, and Z its depth. A spawned gate's local -Z points along the
//! agent's forward, so flying straight ahead crosses the thin depth axis.

use glam::{Mat4, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::lanes::LaneBalancer;
use crate::settings::CourseTuning;
use crate::{right_of, yaw_of};

/// Position and orientation of a gate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateTransform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl GateTransform {
    /// Level transform facing `forward` (pitch and roll are always zero)
    pub fn facing(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw_of(forward)),
        }
    }

    /// World point into the gate's local frame
    #[inline]
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }

    /// Unit depth axis in world space
    pub fn depth_axis(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

/// What the last flash pulse on a gate was for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlashKind {
    #[default]
    None,
    Cleared,
    Missed,
}

/// One slot of the gate pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gate {
    pub transform: GateTransform,
    /// Credited since last spawn
    pub passed: bool,
    /// Seen ahead of the agent since last spawn (sticky)
    pub was_ahead: bool,
    pub lane: i8,
    /// Seconds left on the cosmetic pulse
    pub flash_timer: f32,
    pub flash_duration: f32,
    pub flash_kind: FlashKind,
    /// Number of times this slot has been (re)spawned
    pub generation: u32,
    /// Course tick on which the slot was last spawned
    pub spawned_tick: u64,
}

impl Gate {
    /// Pulse strength for renderers (1.0 at start, 0.0 when done)
    pub fn flash_level(&self) -> f32 {
        if self.flash_duration <= 0.0 {
            return 0.0;
        }
        (self.flash_timer / self.flash_duration).clamp(0.0, 1.0)
    }

    pub fn start_flash(&mut self, kind: FlashKind, duration: f32) {
        self.flash_kind = kind;
        self.flash_timer = duration;
        self.flash_duration = duration;
    }

    fn advance_flash(&mut self, dt: f32) {
        self.flash_timer = (self.flash_timer - dt).max(0.0);
        if self.flash_timer == 0.0 {
            self.flash_kind = FlashKind::None;
        }
    }
}

/// Point-in-trigger test result, in the gate's local frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerHit {
    pub local: Vec3,
}

/// Does the agent sit inside the gate's trigger volume?
pub fn trigger_contains(gate: &GateTransform, point: Vec3, tuning: &CourseTuning) -> Option<TriggerHit> {
    let local = gate.to_local(point);
    let inside = local.z.abs() <= tuning.trigger_depth * 0.5
        && local.x.abs() <= tuning.gate_width * 0.5
        && local.y.abs() <= tuning.gate_height * 0.5;
    inside.then_some(TriggerHit { local })
}

/// Reward for passing close to the gate center
pub fn centering_score(local: Vec3, tuning: &CourseTuning) -> f32 {
    let nx = local.x.abs() / (tuning.gate_width * 0.5);
    let ny = local.y.abs() / (tuning.gate_height * 0.5);
    let center_distance = (nx * nx + ny * ny).sqrt();
    (tuning.center_max * (1.0 - center_distance).clamp(0.0, 1.0)).floor()
}

/// Reward for passing fast
pub fn speed_score(speed: f32, tuning: &CourseTuning) -> f32 {
    (tuning.speed_max * (speed / tuning.speed_for_max).clamp(0.0, 1.0)).floor()
}

/// Fixed arena of gates plus the placement state shared between them
#[derive(Debug, Clone)]
pub struct GatePool {
    tuning: CourseTuning,
    gates: Vec<Gate>,
    lanes: LaneBalancer,
    rng: Pcg32,
}

impl GatePool {
    /// Build the pool with placeholder gates staggered ahead of the agent
    ///
    /// `tuning` must already be validated.
    pub fn new(tuning: CourseTuning, seed: u64, agent_position: Vec3, forward: Vec3) -> Self {
        let mut pool = Self {
            lanes: LaneBalancer::new(tuning.lane_change_chance, tuning.max_same_lane_streak),
            rng: Pcg32::seed_from_u64(seed),
            gates: Vec::with_capacity(tuning.gate_count),
            tuning,
        };
        for i in 0..pool.tuning.gate_count {
            let distance = pool.placeholder_distance(i);
            let (transform, lane) = pool.place(agent_position, forward, distance);
            pool.gates.push(Gate {
                transform,
                passed: false,
                was_ahead: false,
                lane,
                flash_timer: 0.0,
                flash_duration: 0.0,
                flash_kind: FlashKind::None,
                generation: 0,
                spawned_tick: 0,
            });
        }
        pool
    }

    /// Lay the placeholders out again (new run); slot count is unchanged
    pub fn reset(&mut self, agent_position: Vec3, forward: Vec3) {
        self.lanes.reset();
        for i in 0..self.gates.len() {
            let distance = self.placeholder_distance(i);
            let (transform, lane) = self.place(agent_position, forward, distance);
            let gate = &mut self.gates[i];
            gate.transform = transform;
            gate.lane = lane;
            gate.passed = false;
            gate.was_ahead = false;
            gate.flash_timer = 0.0;
            gate.flash_duration = 0.0;
            gate.flash_kind = FlashKind::None;
            gate.generation = 0;
            gate.spawned_tick = 0;
        }
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub(crate) fn gate_mut(&mut self, index: usize) -> &mut Gate {
        &mut self.gates[index]
    }

    pub fn tuning(&self) -> &CourseTuning {
        &self.tuning
    }

    pub fn lanes(&self) -> &LaneBalancer {
        &self.lanes
    }

    /// Move a gate to a fresh spot ahead of the agent and clear its pass state
    pub fn respawn(&mut self, index: usize, agent_position: Vec3, forward: Vec3, tick: u64) {
        let distance = self
            .rng
            .random_range(self.tuning.spawn_min..=self.tuning.spawn_max);
        let (transform, lane) = self.place(agent_position, forward, distance);
        let gate = &mut self.gates[index];
        gate.transform = transform;
        gate.lane = lane;
        gate.passed = false;
        gate.was_ahead = false;
        gate.generation = gate.generation.wrapping_add(1);
        gate.spawned_tick = tick;
    }

    pub fn advance_flashes(&mut self, dt: f32) {
        for gate in &mut self.gates {
            gate.advance_flash(dt);
        }
    }

    fn placeholder_distance(&self, index: usize) -> f32 {
        self.tuning.spawn_min + index as f32 * self.tuning.placeholder_spacing
    }

    /// Pick a lane and build the transform `distance` ahead along `forward`
    fn place(&mut self, agent_position: Vec3, forward: Vec3, distance: f32) -> (GateTransform, i8) {
        let lane = self.lanes.next_lane(&mut self.rng);

        let lane_jitter = self.tuning.lane_width * self.tuning.lane_jitter;
        let lateral = lane as f32 * self.tuning.lane_width
            + self.rng.random_range(-lane_jitter..=lane_jitter);
        let height = self.tuning.vertical_center
            + self
                .rng
                .random_range(-self.tuning.vertical_jitter..=self.tuning.vertical_jitter);

        let mut position = agent_position + forward * distance + right_of(forward) * lateral;
        position.y = height;

        (GateTransform::facing(position, forward), lane)
    }
}
