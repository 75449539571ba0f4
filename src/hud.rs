//! Presentation-facing data
//!
//! Everything here is a copy: renderers and HUDs never hold references into
//! the simulation.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::sim::gate::{FlashKind, Gate};
use crate::sim::score::ScoreSnapshot;
use crate::sim::state::CourseStats;

/// Pull-based HUD snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub score: i64,
    pub display_score: f32,
    pub combo: f32,
    pub combo_tier: u32,
    pub streak: u32,
    pub gates_passed: u32,
    /// Gates passed or missed so far
    pub gates_total: u32,
    pub last_delta: i64,
    pub penalty_flash: f32,
}

impl HudSnapshot {
    pub fn new(score: &ScoreSnapshot, stats: &CourseStats) -> Self {
        Self {
            score: score.score,
            display_score: score.display_score,
            combo: score.combo,
            combo_tier: score.combo_tier,
            streak: score.streak,
            gates_passed: stats.gates_passed,
            gates_total: stats.gates_resolved(),
            last_delta: score.last_delta,
            penalty_flash: score.penalty_flash,
        }
    }

    /// Rounded score for text display
    pub fn display_score_text(&self) -> String {
        format!("{}", self.display_score.round() as i64)
    }

    /// Multiplier label, e.g. "x1.4"
    pub fn combo_text(&self) -> String {
        format!("x{:.1}", self.combo)
    }
}

/// Per-gate GPU instance data
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GateInstance {
    /// Column-major model matrix
    pub model: [[f32; 4]; 4],
    /// lane, flash level, flash kind (0 none, 1 cleared, 2 missed), passed
    pub params: [f32; 4],
}

impl GateInstance {
    pub fn from_gate(gate: &Gate) -> Self {
        let kind = match gate.flash_kind {
            FlashKind::None => 0.0,
            FlashKind::Cleared => 1.0,
            FlashKind::Missed => 2.0,
        };
        Self {
            model: gate.transform.to_matrix().to_cols_array_2d(),
            params: [
                gate.lane as f32,
                gate.flash_level(),
                kind,
                if gate.passed { 1.0 } else { 0.0 },
            ],
        }
    }

    /// Raw bytes for an instance buffer upload
    pub fn as_bytes(instances: &[GateInstance]) -> &[u8] {
        bytemuck::cast_slice(instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::gate::GateTransform;
    use glam::Vec3;

    fn gate() -> Gate {
        Gate {
            transform: GateTransform::facing(Vec3::new(1.0, 2.0, -3.0), Vec3::NEG_Z),
            passed: true,
            was_ahead: false,
            lane: -1,
            flash_timer: 0.2,
            flash_duration: 0.4,
            flash_kind: FlashKind::Cleared,
            generation: 0,
            spawned_tick: 0,
        }
    }

    #[test]
    fn test_instance_layout() {
        let instance = GateInstance::from_gate(&gate());
        assert_eq!(instance.model[3][..3], [1.0, 2.0, -3.0]);
        assert_eq!(instance.params, [-1.0, 0.5, 1.0, 1.0]);
        assert_eq!(GateInstance::as_bytes(&[instance, instance]).len(), 2 * 80);
    }

    #[test]
    fn test_hud_labels() {
        let stats = CourseStats {
            gates_passed: 4,
            gates_missed: 1,
            ..Default::default()
        };
        let score = ScoreSnapshot {
            score: 900,
            display_score: 899.6,
            combo: 1.36,
            combo_tier: 0,
            streak: 3,
            combo_lock_remaining: 0.0,
            time_since_score: 0.2,
            penalty_flash: 0.0,
            last_delta: 300,
        };
        let hud = HudSnapshot::new(&score, &stats);
        assert_eq!(hud.gates_total, 5);
        assert_eq!(hud.display_score_text(), "900");
        assert_eq!(hud.combo_text(), "x1.4");
    }
}
