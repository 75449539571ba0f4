//! Fixed-step accumulator
//!
//! The course trusts its caller to clamp dt. Hosts with variable frame times
//! can feed frame deltas here and run `advance` ticks of `step` seconds.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStep {
    step: f32,
    max_substeps: u32,
    accumulator: f32,
}

impl FixedStep {
    pub fn new(step: f32, max_substeps: u32) -> Self {
        Self {
            step: if step.is_finite() && step > 0.0 { step } else { SIM_DT },
            max_substeps: max_substeps.max(1),
            accumulator: 0.0,
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Add a frame delta; returns how many fixed ticks to run now
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let frame_dt = if frame_dt.is_finite() { frame_dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator >= self.step && substeps < self.max_substeps {
            self.accumulator -= self.step;
            substeps += 1;
        }
        // Spiral of death: drop time we could not catch up on
        if self.accumulator >= self.step {
            self.accumulator = 0.0;
        }
        substeps
    }

    /// Fraction of a step left over (for render interpolation)
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.step).clamp(0.0, 1.0)
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(SIM_DT, MAX_SUBSTEPS)
    }
}
