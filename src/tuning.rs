//! Data-driven gameplay parameters
//!
//! Everything here can be overridden from a JSON file. Missing fields fall back
//! to the defaults, so a tuning file only needs to list what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, read_file};

/// Defaults applied to blocks that don't override them in the level file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockTuning {
    /// Maximum slide distance when nothing is in the way
    pub tiles_to_move: f32,
    /// Linear slide speed (units/s)
    pub move_speed: f32,
    /// Clearance kept in front of a stopping obstruction
    pub safe_distance: f32,
    /// Half size of a block's footprint
    pub half_extent: f32,
}

impl Default for BlockTuning {
    fn default() -> Self {
        Self {
            tiles_to_move: TILES_TO_MOVE,
            move_speed: MOVE_SPEED,
            safe_distance: SAFE_DISTANCE,
            half_extent: BLOCK_HALF_EXTENT,
        }
    }
}

/// Chain-reaction propagation and push animation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainTuning {
    /// Maximum probe hops (clamped to `CHAIN_HOP_CAP`)
    pub max_hops: usize,
    /// Length of each probe ray
    pub probe_length: f32,
    /// Gap left after the previous object's far face before probing again
    pub probe_offset: f32,
    /// Peak forward displacement of a pushed object
    pub push_offset: f32,
    /// Push out/back speed (units/s)
    pub push_speed: f32,
    /// Delay between successive chain members (seconds)
    pub stagger: f32,
}

impl Default for ChainTuning {
    fn default() -> Self {
        Self {
            max_hops: CHAIN_HOP_CAP,
            probe_length: 2.0,
            probe_offset: 0.01,
            push_offset: 0.25,
            push_speed: 4.0,
            stagger: 0.05,
        }
    }
}

impl ChainTuning {
    /// Hop limit actually used by the propagator
    pub fn hop_limit(&self) -> usize {
        self.max_hops.min(CHAIN_HOP_CAP)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectTuning {
    /// How long a hit obstruction flashes (seconds)
    pub flash_duration: f32,
    /// Lifetime of the spawned hit effect, forwarded to the hook (seconds)
    pub hit_effect_lifetime: f32,
}

impl Default for EffectTuning {
    fn default() -> Self {
        Self {
            flash_duration: 0.3,
            hit_effect_lifetime: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetTuning {
    /// Moves allowed when the level doesn't specify a budget
    pub total_moves: u32,
    /// Delay between deciding an outcome and publishing it (seconds)
    pub result_delay: f32,
}

impl Default for BudgetTuning {
    fn default() -> Self {
        Self {
            total_moves: TOTAL_MOVES,
            result_delay: RESULT_DELAY,
        }
    }
}

/// Rotator raise/turn/lower motion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotatorTuning {
    pub raise_height: f32,
    pub raise_speed: f32,
    pub lower_speed: f32,
    /// Seconds spent turning
    pub rotate_duration: f32,
    /// Degrees turned per activation
    pub rotation_angle: f32,
}

impl Default for RotatorTuning {
    fn default() -> Self {
        Self {
            raise_height: 1.0,
            raise_speed: 5.0,
            lower_speed: 5.0,
            rotate_duration: 0.5,
            rotation_angle: 90.0,
        }
    }
}

/// All gameplay tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub block: BlockTuning,
    pub chain: ChainTuning,
    pub effects: EffectTuning,
    pub budget: BudgetTuning,
    pub rotator: RotatorTuning,
}

impl Tuning {
    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values that would keep a slide, push or rotation from finishing
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = &self.block;
        non_negative("block.tiles_to_move", b.tiles_to_move)?;
        positive("block.move_speed", b.move_speed)?;
        non_negative("block.safe_distance", b.safe_distance)?;
        non_negative("block.half_extent", b.half_extent)?;

        let c = &self.chain;
        positive("chain.probe_length", c.probe_length)?;
        non_negative("chain.probe_offset", c.probe_offset)?;
        non_negative("chain.push_offset", c.push_offset)?;
        positive("chain.push_speed", c.push_speed)?;
        non_negative("chain.stagger", c.stagger)?;

        non_negative("effects.flash_duration", self.effects.flash_duration)?;
        non_negative("effects.hit_effect_lifetime", self.effects.hit_effect_lifetime)?;
        non_negative("budget.result_delay", self.budget.result_delay)?;

        let r = &self.rotator;
        non_negative("rotator.raise_height", r.raise_height)?;
        positive("rotator.raise_speed", r.raise_speed)?;
        positive("rotator.lower_speed", r.lower_speed)?;
        non_negative("rotator.rotate_duration", r.rotate_duration)?;
        if !r.rotation_angle.is_finite() {
            return Err(ConfigError::Invalid {
                field: "rotator.rotation_angle",
                reason: "must be finite",
            });
        }
        Ok(())
    }

    /// Read tuning from a file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json(&read_file(path)?)
    }

    /// Load tuning, falling back to defaults if the file is missing or broken
    pub fn load(path: &Path) -> Self {
        match Self::from_path(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({e})");
                Self::default()
            }
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: "must be positive",
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: "must be non-negative",
        })
    }
}
