//! Gate Rush - procedural gate course and combo scoring
//!
//! Core modules:
//! - `sim`: Deterministic simulation (gate pool, lane balancing, scoring)
//! - `settings`: Start-up tuning with validation
//! - `hud`: Read-only snapshots and GPU instance data for presentation
//! - `timestep`: Fixed-step accumulator for callers with variable frame times

pub mod hud;
pub mod settings;
pub mod sim;
pub mod timestep;

pub use hud::{GateInstance, HudSnapshot};
pub use settings::{CourseTuning, ScoreTuning, Settings, SettingsError};
pub use sim::{GateCourseEngine, GateEvent, ScoreEngine, TickInput};
pub use timestep::FixedStep;

use glam::{Quat, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta accepted by the fixed-step driver (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Gate pool
    pub const GATE_COUNT: usize = 22;
    pub const GATE_WIDTH: f32 = 9.0;
    pub const GATE_HEIGHT: f32 = 5.0;
    /// Depth of the pass trigger volume
    pub const GATE_TRIGGER_DEPTH: f32 = 2.0;

    /// Spawn placement (world units ahead of the agent)
    pub const SPAWN_MIN: f32 = 70.0;
    pub const SPAWN_MAX: f32 = 220.0;
    /// Distance between placeholder gates at construction
    pub const PLACEHOLDER_SPACING: f32 = 10.0;
    pub const LANE_WIDTH: f32 = 11.0;
    /// Lateral jitter as a fraction of lane width
    pub const LANE_JITTER: f32 = 0.18;
    pub const VERTICAL_CENTER: f32 = 2.6;
    pub const VERTICAL_JITTER: f32 = 1.0;
    /// Chance to force a lane change even when not on a streak
    pub const LANE_CHANGE_CHANCE: f64 = 0.35;
    /// Same-lane repeats allowed before a change is forced
    pub const MAX_SAME_LANE_STREAK: u32 = 2;

    /// Recycle thresholds
    pub const BEHIND_RECYCLE: f32 = 18.0;
    pub const FAR_RECYCLE: f32 = 320.0;
    /// Squared XZ speed above which velocity defines forward
    pub const VELOCITY_FORWARD_MIN_SQ: f32 = 0.6;

    /// Gate cosmetic flash durations (seconds)
    pub const CLEAR_FLASH: f32 = 0.45;
    pub const MISS_FLASH: f32 = 0.3;

    /// Scoring
    pub const GATE_BASE_POINTS: f32 = 100.0;
    pub const CENTER_MAX: f32 = 80.0;
    pub const SPEED_MAX: f32 = 50.0;
    pub const SPEED_FOR_MAX: f32 = 18.0;
    pub const MISS_PENALTY: f32 = 140.0;

    /// Combo
    pub const COMBO_MIN: f32 = 1.0;
    pub const COMBO_MAX: f32 = 3.0;
    pub const COMBO_STEP: f32 = 0.12;
    pub const COMBO_DECAY_DELAY: f32 = 1.25;
    pub const COMBO_DECAY_RATE: f32 = 0.18;
    pub const COMBO_TIER_WIDTH: f32 = 0.4;
    pub const COMBO_LOCK_AFTER_CRASH: f32 = 0.55;

    /// Crash penalty = max(CRASH_BASE, CRASH_BASE + speed * CRASH_PER_SPEED)
    pub const CRASH_BASE: f32 = 120.0;
    pub const CRASH_PER_SPEED: f32 = 22.0;

    /// Penalty flash decay per second
    pub const PENALTY_FLASH_DECAY: f32 = 2.2;
    /// Display score exponential smoothing rate
    pub const DISPLAY_SMOOTHING: f32 = 10.0;
    /// Idle time written by a combo break (keeps decay dormant at combo 1.0)
    pub const IDLE_SENTINEL: f32 = 1.0e6;
}

/// Canonical forward for an unrotated agent or gate (right-handed, -Z forward)
pub const CANONICAL_FORWARD: Vec3 = Vec3::NEG_Z;

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Project a vector onto the horizontal (XZ) plane
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Yaw angle (radians about +Y) that turns `CANONICAL_FORWARD` onto `dir`
#[inline]
pub fn yaw_of(dir: Vec3) -> f32 {
    (-dir.x).atan2(-dir.z)
}

/// Horizontal unit forward from an orientation, ignoring pitch and roll
///
/// Returns `None` when the orientation looks straight up or down, where yaw
/// is undefined.
pub fn yaw_forward(orientation: Quat) -> Option<Vec3> {
    let projected = flatten(orientation * CANONICAL_FORWARD);
    if projected.length_squared() < 1.0e-6 {
        return None;
    }
    let yaw = yaw_of(projected);
    Some(Quat::from_rotation_y(yaw) * CANONICAL_FORWARD)
}

/// Right-hand vector in the horizontal plane for a horizontal forward
#[inline]
pub fn right_of(forward: Vec3) -> Vec3 {
    forward.cross(Vec3::Y).normalize_or_zero()
}
