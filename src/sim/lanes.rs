//! Lane selection for gate spawns
//!
//! Keeps the course from collapsing into a straight corridor: a lane may be
//! picked at most `max_streak + 1` times in a row, and even off a streak
//! there is a fixed chance to force a change.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{LANE_CHANGE_CHANCE, MAX_SAME_LANE_STREAK};

/// Lateral spawn slots (left, center, right)
pub const LANES: [i8; 3] = [-1, 0, 1];

/// Course-wide lane history (shared by every gate in the pool)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneBalancer {
    last_lane: i8,
    same_lane_streak: u32,
    change_chance: f64,
    max_streak: u32,
}

impl LaneBalancer {
    pub fn new(change_chance: f64, max_streak: u32) -> Self {
        Self {
            last_lane: 0,
            same_lane_streak: 0,
            change_chance: change_chance.clamp(0.0, 1.0),
            max_streak,
        }
    }

    pub fn last_lane(&self) -> i8 {
        self.last_lane
    }

    pub fn same_lane_streak(&self) -> u32 {
        self.same_lane_streak
    }

    /// Forget history (new run)
    pub fn reset(&mut self) {
        self.last_lane = 0;
        self.same_lane_streak = 0;
    }

    /// Pick the lane for the next spawn and record it
    pub fn next_lane<R: Rng>(&mut self, rng: &mut R) -> i8 {
        let lane = if self.same_lane_streak >= self.max_streak {
            self.other_lane(rng)
        } else {
            let pick = LANES[rng.random_range(0..LANES.len())];
            if rng.random_bool(self.change_chance) {
                self.other_lane(rng)
            } else {
                pick
            }
        };

        if lane == self.last_lane {
            self.same_lane_streak += 1;
        } else {
            self.same_lane_streak = 0;
        }
        self.last_lane = lane;
        lane
    }

    /// Uniform choice among the two lanes that differ from the last one
    fn other_lane<R: Rng>(&self, rng: &mut R) -> i8 {
        let mut others = LANES.iter().copied().filter(|&lane| lane != self.last_lane);
        let skip = rng.random_range(0..2);
        others.nth(skip).unwrap_or(self.last_lane)
    }
}

impl Default for LaneBalancer {
    fn default() -> Self {
        Self::new(LANE_CHANGE_CHANCE, MAX_SAME_LANE_STREAK)
    }
}
