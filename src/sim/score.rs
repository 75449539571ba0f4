//! Score, combo and penalty timers
//!
//! A pure numeric state machine. It knows nothing about gates or agents:
//! the course feeds it discrete events and one `tick` per simulation step.
//!
//! Combo moves between three derived modes each tick:
//! - growing: clears raise it by `combo_step`, capped at `combo_max`
//! - decaying: no score for longer than `combo_decay_delay`
//! - locked: after a crash, clears still score but cannot raise it

use serde::{Deserialize, Serialize};

use crate::consts::IDLE_SENTINEL;
use crate::settings::ScoreTuning;

/// Copy of the score state for presentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub score: i64,
    pub display_score: f32,
    pub combo: f32,
    pub combo_tier: u32,
    pub streak: u32,
    pub combo_lock_remaining: f32,
    pub time_since_score: f32,
    pub penalty_flash: f32,
    pub last_delta: i64,
}

/// Which way combo is heading this tick (derived from timers, informational)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComboMode {
    Growing,
    Decaying,
    Locked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEngine {
    tuning: ScoreTuning,
    score: i64,
    display_score: f32,
    combo: f32,
    streak: u32,
    combo_lock_remaining: f32,
    time_since_score: f32,
    penalty_flash: f32,
    last_delta: i64,
}

impl ScoreEngine {
    pub fn new(tuning: ScoreTuning) -> Self {
        let combo = tuning.combo_min;
        Self {
            tuning,
            score: 0,
            display_score: 0.0,
            combo,
            streak: 0,
            combo_lock_remaining: 0.0,
            time_since_score: IDLE_SENTINEL,
            penalty_flash: 0.0,
            last_delta: 0,
        }
    }

    /// Back to a fresh run with the same tuning
    pub fn reset(&mut self) {
        *self = Self::new(self.tuning.clone());
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn combo(&self) -> f32 {
        self.combo
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn combo_lock_remaining(&self) -> f32 {
        self.combo_lock_remaining
    }

    pub fn tuning(&self) -> &ScoreTuning {
        &self.tuning
    }

    /// Bucket for UI: 0 at base combo, +1 every `combo_tier_width`
    pub fn combo_tier(&self) -> u32 {
        let tier = ((self.combo - self.tuning.combo_min) / self.tuning.combo_tier_width).floor();
        tier.max(0.0) as u32
    }

    pub fn combo_mode(&self) -> ComboMode {
        if self.combo_lock_remaining > 0.0 {
            ComboMode::Locked
        } else if self.time_since_score > self.tuning.combo_decay_delay {
            ComboMode::Decaying
        } else {
            ComboMode::Growing
        }
    }

    /// Add points, optionally scaled by combo. Returns the signed delta.
    ///
    /// Points truncate toward zero before and after the multiplier. Score
    /// never drops below zero; `last_delta` keeps the requested change.
    pub fn add(&mut self, points: f32, apply_combo: bool) -> i64 {
        let points = if points.is_finite() { points.trunc() } else { 0.0 };
        let scaled = if apply_combo {
            (points * self.combo).trunc()
        } else {
            points
        };
        let delta = scaled as i64;
        self.score = self.score.saturating_add(delta).max(0);
        self.last_delta = delta;
        if delta != 0 {
            self.time_since_score = 0.0;
        }
        delta
    }

    /// Credit a cleared gate. Returns the total points added.
    pub fn on_gate_cleared(&mut self, base: f32, centering_bonus: f32, speed_bonus: f32) -> i64 {
        self.streak = self.streak.saturating_add(1);
        let total = self.add(base, true) + self.add(centering_bonus, true) + self.add(speed_bonus, true);
        self.last_delta = total;
        if self.combo_lock_remaining <= 0.0 {
            self.combo = (self.combo + self.tuning.combo_step).min(self.tuning.combo_max);
        }
        total
    }

    /// Flat penalty, never scaled by combo. Always breaks the combo.
    pub fn on_penalty(&mut self, points: f32) -> i64 {
        let delta = self.add(-points.abs(), false);
        self.break_combo(true);
        delta
    }

    /// Impact penalty scaled by speed; also locks combo growth for a moment
    pub fn on_crash(&mut self, speed: f32) -> i64 {
        let speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
        let penalty = self
            .tuning
            .crash_base
            .max((self.tuning.crash_base + speed * self.tuning.crash_per_speed).floor());
        let delta = self.add(-penalty, false);
        self.break_combo(true);
        self.combo_lock_remaining = self.tuning.combo_lock_after_crash;
        self.penalty_flash = 1.0;
        delta
    }

    pub fn break_combo(&mut self, flash: bool) {
        self.combo = self.tuning.combo_min;
        self.streak = 0;
        self.time_since_score = IDLE_SENTINEL;
        if flash {
            self.penalty_flash = 1.0;
        }
    }

    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.time_since_score = (self.time_since_score + dt).min(IDLE_SENTINEL);
        self.combo_lock_remaining = (self.combo_lock_remaining - dt).max(0.0);
        self.penalty_flash = (self.penalty_flash - self.tuning.penalty_flash_decay * dt).max(0.0);

        if self.time_since_score > self.tuning.combo_decay_delay {
            self.combo = (self.combo - self.tuning.combo_decay_rate * dt).max(self.tuning.combo_min);
            if self.combo == self.tuning.combo_min {
                self.streak = 0;
            }
        }

        let blend = 1.0 - (-self.tuning.display_smoothing * dt).exp();
        self.display_score += (self.score as f32 - self.display_score) * blend;
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            score: self.score,
            display_score: self.display_score,
            combo: self.combo,
            combo_tier: self.combo_tier(),
            streak: self.streak,
            combo_lock_remaining: self.combo_lock_remaining,
            time_since_score: self.time_since_score,
            penalty_flash: self.penalty_flash,
            last_delta: self.last_delta,
        }
    }
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new(ScoreTuning::default())
    }
}
