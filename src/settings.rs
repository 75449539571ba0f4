//! Course and scoring tuning
//!
//! Start-up parameters only: the engine validates them once at construction
//! and never reconfigures at runtime.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Errors raised while loading or validating settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// A field is outside its allowed range.
    #[error("invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    /// Settings JSON could not be parsed.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// Settings file could not be read.
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> SettingsError {
    SettingsError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, format!("must be finite and > 0, got {value}")));
    }
    Ok(())
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), SettingsError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, format!("must be finite and >= 0, got {value}")));
    }
    Ok(())
}

/// Gate pool geometry and placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseTuning {
    pub gate_count: usize,
    pub gate_width: f32,
    pub gate_height: f32,
    pub trigger_depth: f32,

    pub spawn_min: f32,
    pub spawn_max: f32,
    pub placeholder_spacing: f32,
    pub lane_width: f32,
    /// Fraction of lane width
    pub lane_jitter: f32,
    pub vertical_center: f32,
    pub vertical_jitter: f32,
    pub lane_change_chance: f64,
    /// Same-lane repeats allowed before a change is forced
    pub max_same_lane_streak: u32,

    pub behind_recycle: f32,
    pub far_recycle: f32,
    pub velocity_forward_min_sq: f32,

    pub clear_flash: f32,
    pub miss_flash: f32,

    pub base_points: f32,
    pub center_max: f32,
    pub speed_max: f32,
    pub speed_for_max: f32,
    pub miss_penalty: f32,
}

impl Default for CourseTuning {
    fn default() -> Self {
        Self {
            gate_count: GATE_COUNT,
            gate_width: GATE_WIDTH,
            gate_height: GATE_HEIGHT,
            trigger_depth: GATE_TRIGGER_DEPTH,

            spawn_min: SPAWN_MIN,
            spawn_max: SPAWN_MAX,
            placeholder_spacing: PLACEHOLDER_SPACING,
            lane_width: LANE_WIDTH,
            lane_jitter: LANE_JITTER,
            vertical_center: VERTICAL_CENTER,
            vertical_jitter: VERTICAL_JITTER,
            lane_change_chance: LANE_CHANGE_CHANCE,
            max_same_lane_streak: MAX_SAME_LANE_STREAK,

            behind_recycle: BEHIND_RECYCLE,
            far_recycle: FAR_RECYCLE,
            velocity_forward_min_sq: VELOCITY_FORWARD_MIN_SQ,

            clear_flash: CLEAR_FLASH,
            miss_flash: MISS_FLASH,

            base_points: GATE_BASE_POINTS,
            center_max: CENTER_MAX,
            speed_max: SPEED_MAX,
            speed_for_max: SPEED_FOR_MAX,
            miss_penalty: MISS_PENALTY,
        }
    }
}

impl CourseTuning {
    /// Distance of the furthest placeholder gate at construction
    pub fn furthest_placeholder(&self) -> f32 {
        self.spawn_min + self.gate_count.saturating_sub(1) as f32 * self.placeholder_spacing
    }

    /// Largest horizontal distance a freshly placed gate can have from the agent
    pub fn spawn_reach(&self) -> f32 {
        let lateral = self.lane_width * (1.0 + self.lane_jitter);
        (self.spawn_max.max(self.furthest_placeholder()).powi(2) + lateral * lateral).sqrt()
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.gate_count == 0 {
            return Err(invalid("gate_count", "pool needs at least one gate"));
        }
        require_positive("gate_width", self.gate_width)?;
        require_positive("gate_height", self.gate_height)?;
        require_positive("trigger_depth", self.trigger_depth)?;
        require_positive("spawn_min", self.spawn_min)?;
        require_positive("spawn_max", self.spawn_max)?;
        if self.spawn_min > self.spawn_max {
            return Err(invalid(
                "spawn_min",
                format!("{} exceeds spawn_max {}", self.spawn_min, self.spawn_max),
            ));
        }
        require_non_negative("placeholder_spacing", self.placeholder_spacing)?;
        require_non_negative("lane_width", self.lane_width)?;
        require_non_negative("lane_jitter", self.lane_jitter)?;
        if !self.vertical_center.is_finite() {
            return Err(invalid("vertical_center", "must be finite"));
        }
        require_non_negative("vertical_jitter", self.vertical_jitter)?;
        if !(0.0..=1.0).contains(&self.lane_change_chance) {
            return Err(invalid("lane_change_chance", "must be a probability in [0, 1]"));
        }
        require_positive("behind_recycle", self.behind_recycle)?;
        require_positive("far_recycle", self.far_recycle)?;
        // Anything placed beyond far_recycle would be recycled as a miss on its first tick
        if self.spawn_max >= self.far_recycle {
            return Err(invalid(
                "far_recycle",
                format!("must exceed spawn_max {}", self.spawn_max),
            ));
        }
        if self.furthest_placeholder() >= self.far_recycle {
            return Err(invalid(
                "placeholder_spacing",
                format!(
                    "last placeholder at {} lies beyond far_recycle {}",
                    self.furthest_placeholder(),
                    self.far_recycle
                ),
            ));
        }
        if self.spawn_reach() >= self.far_recycle {
            return Err(invalid(
                "lane_width",
                format!(
                    "outer lanes reach {} which lies beyond far_recycle {}",
                    self.spawn_reach(),
                    self.far_recycle
                ),
            ));
        }
        require_non_negative("velocity_forward_min_sq", self.velocity_forward_min_sq)?;
        require_non_negative("clear_flash", self.clear_flash)?;
        require_non_negative("miss_flash", self.miss_flash)?;
        require_non_negative("base_points", self.base_points)?;
        require_non_negative("center_max", self.center_max)?;
        require_non_negative("speed_max", self.speed_max)?;
        require_positive("speed_for_max", self.speed_for_max)?;
        require_non_negative("miss_penalty", self.miss_penalty)?;
        Ok(())
    }
}

/// Combo, penalty and smoothing rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTuning {
    pub combo_min: f32,
    pub combo_max: f32,
    pub combo_step: f32,
    pub combo_decay_delay: f32,
    pub combo_decay_rate: f32,
    pub combo_tier_width: f32,
    pub combo_lock_after_crash: f32,
    pub crash_base: f32,
    pub crash_per_speed: f32,
    pub penalty_flash_decay: f32,
    pub display_smoothing: f32,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            combo_min: COMBO_MIN,
            combo_max: COMBO_MAX,
            combo_step: COMBO_STEP,
            combo_decay_delay: COMBO_DECAY_DELAY,
            combo_decay_rate: COMBO_DECAY_RATE,
            combo_tier_width: COMBO_TIER_WIDTH,
            combo_lock_after_crash: COMBO_LOCK_AFTER_CRASH,
            crash_base: CRASH_BASE,
            crash_per_speed: CRASH_PER_SPEED,
            penalty_flash_decay: PENALTY_FLASH_DECAY,
            display_smoothing: DISPLAY_SMOOTHING,
        }
    }
}

impl ScoreTuning {
    pub fn validate(&self) -> Result<(), SettingsError> {
        require_positive("combo_min", self.combo_min)?;
        if !self.combo_max.is_finite() || self.combo_max < self.combo_min {
            return Err(invalid("combo_max", "must be finite and >= combo_min"));
        }
        require_non_negative("combo_step", self.combo_step)?;
        require_non_negative("combo_decay_delay", self.combo_decay_delay)?;
        require_non_negative("combo_decay_rate", self.combo_decay_rate)?;
        require_positive("combo_tier_width", self.combo_tier_width)?;
        require_non_negative("combo_lock_after_crash", self.combo_lock_after_crash)?;
        require_non_negative("crash_base", self.crash_base)?;
        require_non_negative("crash_per_speed", self.crash_per_speed)?;
        require_non_negative("penalty_flash_decay", self.penalty_flash_decay)?;
        require_non_negative("display_smoothing", self.display_smoothing)?;
        Ok(())
    }
}

/// Complete engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Course RNG seed (same seed + same inputs = same course)
    pub seed: u64,
    pub course: CourseTuning,
    pub score: ScoreTuning,
}

impl Settings {
    /// Default tuning with a specific seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.course.validate()?;
        self.score.validate()
    }

    /// Parse and validate settings from JSON (missing fields use defaults)
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }
}
