//! Deterministic simulation module
//!
//! All course and scoring logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (by pool index)
//! - No rendering or platform dependencies

pub mod gate;
pub mod lanes;
pub mod score;
pub mod state;
pub mod tick;

pub use gate::{FlashKind, Gate, GatePool, GateTransform, centering_score, speed_score, trigger_contains};
pub use lanes::{LANES, LaneBalancer};
pub use score::{ComboMode, ScoreEngine, ScoreSnapshot};
pub use state::{CourseStats, GateCourseEngine, GateEvent};
pub use tick::TickInput;
