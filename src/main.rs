//! Slide Blocks headless runner
//!
//! Loads a level (or generates one from a seed), then plays it with a seeded
//! autoplay driver on a fixed timestep, logging events and the outcome.
//!
//! Usage: `slide-blocks [--level PATH | --seed N] [--tuning PATH] [--settings PATH] [--frames N]`

use std::path::PathBuf;
use std::process::ExitCode;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use slide_blocks::consts::*;
use slide_blocks::sim::{Outcome, SimEvent, Simulation, TickInput, tick};
use slide_blocks::{LevelDef, Settings, Tuning, generate_level};

/// Frames to run before giving up on an outcome
const DEFAULT_MAX_FRAMES: u32 = 60 * 120;

#[derive(Debug, Default)]
struct Args {
    level: Option<PathBuf>,
    seed: Option<u64>,
    tuning: Option<PathBuf>,
    settings: Option<PathBuf>,
    frames: Option<u32>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        let mut value = || iter.next().ok_or_else(|| format!("missing value for {flag}"));
        match flag.as_str() {
            "--level" => args.level = Some(PathBuf::from(value()?)),
            "--seed" => {
                let v = value()?;
                args.seed = Some(v.parse().map_err(|_| format!("bad seed '{v}'"))?);
            }
            "--tuning" => args.tuning = Some(PathBuf::from(value()?)),
            "--settings" => args.settings = Some(PathBuf::from(value()?)),
            "--frames" => {
                let v = value()?;
                args.frames = Some(v.parse().map_err(|_| format!("bad frame count '{v}'"))?);
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(args)
}

/// Runner holding the simulation and the autoplay state
struct Runner {
    sim: Simulation,
    accumulator: f32,
    input: TickInput,
    rng: Pcg32,
    /// Ticks to wait before the next autoplay move
    cooldown: u32,
    moves: u32,
}

impl Runner {
    fn new(sim: Simulation, seed: u64) -> Self {
        Self {
            sim,
            accumulator: 0.0,
            input: TickInput::default(),
            rng: Pcg32::seed_from_u64(seed),
            cooldown: 0,
            moves: 0,
        }
    }

    /// Pick the next move once the board has quietened down
    fn autoplay(&mut self) {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return;
        }
        if self.sim.controller().is_some_and(|c| !c.allows_input()) {
            return;
        }

        let idle: Vec<_> = self
            .sim
            .blocks()
            .iter()
            .filter(|b| !b.is_moving() && b.input_enabled())
            .map(|b| b.id)
            .collect();
        let resting: Vec<_> = self
            .sim
            .rotators()
            .iter()
            .filter(|r| !r.is_busy())
            .map(|r| r.id)
            .collect();

        if !resting.is_empty() && self.rng.random_bool(0.15) {
            let id = resting[self.rng.random_range(0..resting.len())];
            self.input.rotations.push(id);
        } else if !idle.is_empty() {
            let id = idle[self.rng.random_range(0..idle.len())];
            self.input.slides.push(id);
        } else {
            return;
        }
        self.moves += 1;
        self.cooldown = self.rng.random_range(10..40);
    }

    /// Run simulation ticks for one frame
    fn update(&mut self, dt: f32) -> Option<Outcome> {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut outcome = None;
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.autoplay();
            let input = std::mem::take(&mut self.input);
            for event in tick(&mut self.sim, &input, SIM_DT) {
                log_event(&event);
                if let SimEvent::OutcomeDecided(o) = event {
                    outcome = Some(o);
                }
            }
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        outcome
    }
}

fn log_event(event: &SimEvent) {
    match event {
        SimEvent::SlideStarted {
            block,
            target,
            contact,
        } => log::info!("Block {block} slides to ({:.2}, {:.2}){}", target.x, target.y, if *contact { " [hit]" } else { "" }),
        SimEvent::Settled { block, position } => {
            log::info!("Block {block} settled at ({:.2}, {:.2})", position.x, position.y)
        }
        SimEvent::BlockConsumed { block, .. } => log::info!("Block {block} reached a goal"),
        SimEvent::KeyCollected { key, by } => log::info!("Key {key} collected by {by}"),
        SimEvent::IdleLockout => log::info!("Out of moves, idle blocks locked"),
        other => log::debug!("{other:?}"),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Slide Blocks (headless) starting...");

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            log::error!("{e}");
            eprintln!(
                "usage: slide-blocks [--level PATH | --seed N] [--tuning PATH] [--settings PATH] [--frames N]"
            );
            return ExitCode::from(2);
        }
    };

    let tuning = args.tuning.as_deref().map(Tuning::load).unwrap_or_default();
    let settings = args.settings.as_deref().map(Settings::load).unwrap_or_default();
    let seed = args.seed.unwrap_or(1);

    let level = match &args.level {
        Some(path) => match LevelDef::from_path(path) {
            Ok(level) => level,
            Err(e) => {
                log::error!("Failed to load level: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => generate_level(seed),
    };

    let mut sim = match Simulation::from_level(&level, tuning) {
        Ok(sim) => sim,
        Err(e) => {
            log::error!("Invalid level: {e}");
            return ExitCode::FAILURE;
        }
    };
    sim.settings = settings;

    let mut runner = Runner::new(sim, seed);
    let mut frame_rng = Pcg32::seed_from_u64(seed ^ 0x5eed);
    let max_frames = args.frames.unwrap_or(DEFAULT_MAX_FRAMES);

    for frame in 0..max_frames {
        // Uneven frame times, as a real display loop would produce
        let dt = SIM_DT * frame_rng.random_range(0.5..2.0);
        if let Some(outcome) = runner.update(dt) {
            log::info!(
                "{} '{}' after {} frames and {} moves",
                match outcome {
                    Outcome::Won => "Won",
                    Outcome::Lost => "Lost",
                },
                level.name,
                frame + 1,
                runner.moves
            );
            return ExitCode::SUCCESS;
        }
    }

    log::warn!(
        "No outcome after {max_frames} frames ({} blocks left, {} moving)",
        runner.sim.blocks().len(),
        runner.sim.moving_count()
    );
    ExitCode::SUCCESS
}
