//! Gate Rush headless runner
//!
//! Flies a simple autopilot through the course and logs what happens.
//!
//! Run with `--help` for the available flags.

use std::path::PathBuf;

#[cfg(not(target_arch = "wasm32"))]
use clap::Parser;
use glam::{Quat, Vec3};

use gate_rush::consts::VERTICAL_CENTER;
use gate_rush::sim::{Gate, GateCourseEngine, GateEvent, TickInput};
use gate_rush::{FixedStep, Settings, normalize_angle, yaw_of};

/// Cruise speed of the autopilot (world units / second)
const CRUISE_SPEED: f32 = 20.0;
/// Autopilot yaw rate limit (radians / second)
const MAX_TURN_RATE: f32 = 1.4;
/// Autopilot climb rate limit (world units / second)
const MAX_CLIMB: f32 = 4.0;

/// Fly the autopilot through a gate course and report the final score
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Simulated flight time in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 60.0)]
    seconds: f32,
    /// Course seed; overrides the seed from a settings file.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// JSON settings file (missing fields use defaults).
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,
    /// Print the final HUD snapshot as JSON.
    #[arg(long)]
    json: bool,
}

/// Minimal flying agent steered toward the nearest unpassed gate ahead
struct Autopilot {
    position: Vec3,
    yaw: f32,
}

impl Autopilot {
    fn new() -> Self {
        Self {
            position: Vec3::new(0.0, VERTICAL_CENTER, 0.0),
            yaw: 0.0,
        }
    }

    fn forward(&self) -> Vec3 {
        Quat::from_rotation_y(self.yaw) * gate_rush::CANONICAL_FORWARD
    }

    fn target<'a>(&self, gates: &'a [Gate]) -> Option<&'a Gate> {
        let forward = self.forward();
        gates
            .iter()
            .filter(|g| !g.passed)
            .filter(|g| (g.transform.position - self.position).dot(forward) > 2.0)
            .min_by(|a, b| {
                let da = a.transform.position.distance_squared(self.position);
                let db = b.transform.position.distance_squared(self.position);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    fn step(&mut self, gates: &[Gate], dt: f32) -> TickInput {
        if let Some(gate) = self.target(gates) {
            let to_gate = gate.transform.position - self.position;
            let desired = yaw_of(Vec3::new(to_gate.x, 0.0, to_gate.z));
            let delta = normalize_angle(desired - self.yaw);
            let max_delta = MAX_TURN_RATE * dt;
            self.yaw += delta.clamp(-max_delta, max_delta);

            let climb = (to_gate.y).clamp(-MAX_CLIMB * dt, MAX_CLIMB * dt);
            self.position.y += climb;
        }

        let velocity = self.forward() * CRUISE_SPEED;
        self.position += velocity * dt;
        TickInput {
            position: self.position,
            speed: CRUISE_SPEED,
            velocity: Some(velocity),
            orientation: Some(Quat::from_rotation_y(self.yaw)),
            crash_speed: None,
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let args = CliArgs::parse();

    let mut settings = match &args.settings {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        },
        None => Settings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }

    let mut pilot = Autopilot::new();
    let mut course = match GateCourseEngine::new(settings, pilot.position, pilot.forward()) {
        Ok(course) => course,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    log::info!("Gate Rush (headless) flying for {:.0}s", args.seconds);

    // Pretend the host renders at 60 fps and drive the sim at a fixed 120 Hz
    let frame_dt = 1.0 / 60.0;
    let frames = (args.seconds / frame_dt).max(0.0) as u64;
    let mut fixed = FixedStep::default();
    for _ in 0..frames {
        for _ in 0..fixed.advance(frame_dt) {
            let input = pilot.step(course.gates(), fixed.step());
            for event in course.tick(&input, fixed.step()) {
                match event {
                    GateEvent::Cleared { gate, points, .. } => log::info!("+{points} (gate {gate})"),
                    GateEvent::Missed { gate, penalty } => log::info!("{penalty} missed gate {gate}"),
                    GateEvent::Crashed { penalty } => log::info!("{penalty} crash"),
                }
            }
        }
    }

    let hud = course.hud_snapshot();
    if args.json {
        match serde_json::to_string_pretty(&hud) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("{e}"),
        }
    } else {
        println!(
            "score {} | combo {} | streak {} | gates {}/{}",
            hud.score,
            hud.combo_text(),
            hud.streak,
            hud.gates_passed,
            hud.gates_total
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library is embedded by a host; nothing to run here
}
