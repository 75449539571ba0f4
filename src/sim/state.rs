//! Course state owned by the engine
//!
//! The gate pool and the score engine never see each other; the course is
//! the only thing that reads one and feeds the other.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::gate::{Gate, GatePool, GateTransform};
use super::score::{ScoreEngine, ScoreSnapshot};
use crate::hud::{GateInstance, HudSnapshot};
use crate::settings::{Settings, SettingsError};
use crate::{CANONICAL_FORWARD, flatten};

/// Scoring event produced during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GateEvent {
    /// Agent flew through a gate
    Cleared {
        gate: usize,
        lane: i8,
        centering: f32,
        speed: f32,
        /// Points after combo scaling
        points: i64,
    },
    /// A gate that had been ahead fell out of range unpassed
    Missed { gate: usize, penalty: i64 },
    /// Physics reported an impact
    Crashed { penalty: i64 },
}

/// Running counters for the current run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseStats {
    pub ticks: u64,
    pub gates_passed: u32,
    pub gates_missed: u32,
    pub crashes: u32,
    /// Input values replaced because they were NaN or infinite
    pub non_finite_inputs: u32,
}

impl CourseStats {
    /// Gates that were either passed or missed
    pub fn gates_resolved(&self) -> u32 {
        self.gates_passed + self.gates_missed
    }
}

/// Gate course orchestrator (see `tick.rs` for the per-tick passes)
#[derive(Debug, Clone)]
pub struct GateCourseEngine {
    pub(crate) settings: Settings,
    pub(crate) pool: GatePool,
    pub(crate) score: ScoreEngine,
    /// Last known horizontal forward; never reset to a default once set
    pub(crate) forward: Vec3,
    pub(crate) stats: CourseStats,
}

impl GateCourseEngine {
    /// Validate settings and lay out the starting course ahead of the agent
    pub fn new(settings: Settings, agent_position: Vec3, forward: Vec3) -> Result<Self, SettingsError> {
        settings.validate()?;
        let agent_position = finite_or_zero(agent_position);
        let forward = horizontal_or_default(forward);

        log::info!(
            "Gate course: seed={}, gates={}, spawn={}..{}",
            settings.seed,
            settings.course.gate_count,
            settings.course.spawn_min,
            settings.course.spawn_max
        );

        let pool = GatePool::new(settings.course.clone(), settings.seed, agent_position, forward);
        let score = ScoreEngine::new(settings.score.clone());

        Ok(Self {
            settings,
            pool,
            score,
            forward,
            stats: CourseStats::default(),
        })
    }

    /// Start a new run: zero the score, re-lay placeholders, keep the RNG stream
    pub fn reset(&mut self, agent_position: Vec3, forward: Vec3) {
        let agent_position = finite_or_zero(agent_position);
        self.forward = horizontal_or_default(forward);
        self.pool.reset(agent_position, self.forward);
        self.score.reset();
        log::info!(
            "Course reset after {} ticks ({} passed, {} missed)",
            self.stats.ticks,
            self.stats.gates_passed,
            self.stats.gates_missed
        );
        self.stats = CourseStats::default();
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn gates(&self) -> &[Gate] {
        self.pool.gates()
    }

    pub fn gate_count(&self) -> usize {
        self.pool.len()
    }

    pub fn gate_transforms(&self) -> Vec<GateTransform> {
        self.pool.gates().iter().map(|g| g.transform).collect()
    }

    pub fn gate_instances(&self) -> Vec<GateInstance> {
        self.pool.gates().iter().map(GateInstance::from_gate).collect()
    }

    pub fn pool(&self) -> &GatePool {
        &self.pool
    }

    pub fn score(&self) -> &ScoreEngine {
        &self.score
    }

    pub fn score_snapshot(&self) -> ScoreSnapshot {
        self.score.snapshot()
    }

    pub fn hud_snapshot(&self) -> HudSnapshot {
        HudSnapshot::new(&self.score.snapshot(), &self.stats)
    }

    pub fn stats(&self) -> CourseStats {
        self.stats
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }
}

pub(crate) fn finite_or_zero(v: Vec3) -> Vec3 {
    Vec3::new(finite_or(v.x, 0.0), finite_or(v.y, 0.0), finite_or(v.z, 0.0))
}

#[inline]
pub(crate) fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

fn horizontal_or_default(forward: Vec3) -> Vec3 {
    let flat = flatten(finite_or_zero(forward));
    if flat.length_squared() > 1.0e-6 {
        flat.normalize()
    } else {
        CANONICAL_FORWARD
    }
}
