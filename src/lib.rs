//! Slide Blocks - A grid-free sliding block puzzle engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (slides, ray casts, chain reactions, move budget)
//! - `level`: Level definitions and seeded level generation
//! - `tuning`: Data-driven gameplay parameters
//! - `settings`: Presentation preferences (which effects fire)

pub mod error;
pub mod level;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{ConfigError, LevelError};
pub use level::{LevelDef, generate_level};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// A slide is complete once the remaining distance drops below this
    pub const SETTLE_EPSILON: f32 = 0.01;

    /// Hard cap on chain-reaction hops, regardless of tuning
    pub const CHAIN_HOP_CAP: usize = 10;

    /// Block defaults
    pub const TILES_TO_MOVE: f32 = 80.0;
    pub const MOVE_SPEED: f32 = 50.0;
    pub const SAFE_DISTANCE: f32 = 1.5;
    pub const BLOCK_HALF_EXTENT: f32 = 1.0;

    /// Move budget defaults
    pub const TOTAL_MOVES: u32 = 10;
    pub const RESULT_DELAY: f32 = 1.0;
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting
#[inline]
pub fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let to_target = target - current;
    let dist = to_target.length();
    if dist <= max_delta || dist == 0.0 {
        target
    } else {
        current + to_target / dist * max_delta
    }
}

/// Scalar version of [`move_towards`]
#[inline]
pub fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}
