//! Level definitions
//!
//! A level is plain data: where the blocks, obstacles, goals, keys and
//! rotators are, and how many moves the player gets. Levels are read from
//! JSON or generated from a seed.

use std::collections::BTreeSet;
use std::path::Path;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::{LevelError, read_file};
use crate::sim::{BlockParams, Direction};
use crate::tuning::BlockTuning;

/// A block placement; unset parameters come from tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDef {
    pub position: Vec2,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles_to_move: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_distance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub half_extents: Option<Vec2>,
}

impl BlockDef {
    pub fn new(position: Vec2, direction: Direction) -> Self {
        Self {
            position,
            direction,
            tiles_to_move: None,
            move_speed: None,
            safe_distance: None,
            half_extents: None,
        }
    }

    /// Resolve parameters against tuning defaults
    pub fn params(&self, defaults: &BlockTuning) -> BlockParams {
        let base = BlockParams::from(defaults);
        BlockParams {
            tiles_to_move: self.tiles_to_move.unwrap_or(base.tiles_to_move),
            move_speed: self.move_speed.unwrap_or(base.move_speed),
            safe_distance: self.safe_distance.unwrap_or(base.safe_distance),
            half_extents: self.half_extents.unwrap_or(base.half_extents),
        }
    }
}

/// A static body placement (obstacle, goal, key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDef {
    pub position: Vec2,
    #[serde(default)]
    pub half_extents: Vec2,
}

impl BodyDef {
    pub fn new(position: Vec2, half_extents: Vec2) -> Self {
        Self {
            position,
            half_extents,
        }
    }
}

/// A rotator and the bodies it carries around its pivot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotatorDef {
    pub pivot: Vec2,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<BlockDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub obstacles: Vec<BodyDef>,
}

impl RotatorDef {
    pub fn new(pivot: Vec2) -> Self {
        Self {
            pivot,
            blocks: Vec::new(),
            obstacles: Vec::new(),
        }
    }
}

/// Complete level description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDef {
    pub name: String,
    /// Moves allowed; tuning default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_budget: Option<u32>,
    pub blocks: Vec<BlockDef>,
    pub obstacles: Vec<BodyDef>,
    pub goals: Vec<BodyDef>,
    pub keys: Vec<BodyDef>,
    pub rotators: Vec<RotatorDef>,
}

fn invalid(kind: &'static str, index: usize, reason: impl Into<String>) -> LevelError {
    LevelError::Invalid {
        kind,
        index,
        reason: reason.into(),
    }
}

fn check_body(kind: &'static str, index: usize, body: &BodyDef) -> Result<(), LevelError> {
    if !body.position.is_finite() {
        return Err(invalid(kind, index, "position is not finite"));
    }
    if !body.half_extents.is_finite() || body.half_extents.min_element() < 0.0 {
        return Err(invalid(kind, index, "half extents must be finite and non-negative"));
    }
    Ok(())
}

fn check_block(kind: &'static str, index: usize, block: &BlockDef) -> Result<(), LevelError> {
    if !block.position.is_finite() {
        return Err(invalid(kind, index, "position is not finite"));
    }
    if let Some(d) = block.tiles_to_move {
        if !d.is_finite() || d < 0.0 {
            return Err(invalid(kind, index, "tiles_to_move must be non-negative"));
        }
    }
    if let Some(speed) = block.move_speed {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(invalid(kind, index, "move_speed must be positive"));
        }
    }
    if let Some(safe) = block.safe_distance {
        if !safe.is_finite() || safe < 0.0 {
            return Err(invalid(kind, index, "safe_distance must be non-negative"));
        }
    }
    if let Some(h) = block.half_extents {
        if !h.is_finite() || h.min_element() < 0.0 {
            return Err(invalid(kind, index, "half extents must be finite and non-negative"));
        }
    }
    Ok(())
}

impl LevelDef {
    /// Parse and validate a level from JSON
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Read, parse and validate a level file
    pub fn from_path(path: &Path) -> Result<Self, LevelError> {
        let level = Self::from_json(&read_file(path)?)?;
        log::info!(
            "Loaded level '{}' from {} ({} blocks)",
            level.name,
            path.display(),
            level.blocks.len()
        );
        Ok(level)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the engine can't simulate sensibly
    pub fn validate(&self) -> Result<(), LevelError> {
        for (i, block) in self.blocks.iter().enumerate() {
            check_block("block", i, block)?;
        }
        for (i, body) in self.obstacles.iter().enumerate() {
            check_body("obstacle", i, body)?;
        }
        for (i, body) in self.goals.iter().enumerate() {
            check_body("goal", i, body)?;
        }
        for (i, body) in self.keys.iter().enumerate() {
            check_body("key", i, body)?;
        }
        for (i, rotator) in self.rotators.iter().enumerate() {
            if !rotator.pivot.is_finite() {
                return Err(invalid("rotator", i, "pivot is not finite"));
            }
            for block in &rotator.blocks {
                check_block("rotator", i, block)?;
            }
            for body in &rotator.obstacles {
                check_body("rotator", i, body)?;
            }
        }
        Ok(())
    }
}

/// Cells per side of a generated board
const BOARD_CELLS: i32 = 8;
/// Distance between cell centers
const CELL_SIZE: f32 = 4.0;

fn cell_center(x: i32, y: i32) -> Vec2 {
    Vec2::new(x as f32, y as f32) * CELL_SIZE
}

/// Generate a level deterministically from a seed.
///
/// Blocks and obstacles sit on the interior cells of a square board; every
/// block gets a goal on the board edge straight ahead of it, so each block
/// can reach a goal if its lane is clear.
pub fn generate_level(seed: u64) -> LevelDef {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut level = LevelDef {
        name: format!("generated-{seed}"),
        ..Default::default()
    };

    let half = Vec2::splat(CELL_SIZE * 0.25);
    let block_count = rng.random_range(2..=5);
    let mut used: BTreeSet<(i32, i32)> = BTreeSet::new();
    let mut goal_cells: BTreeSet<(i32, i32)> = BTreeSet::new();

    while level.blocks.len() < block_count {
        let cell = (
            rng.random_range(1..BOARD_CELLS),
            rng.random_range(1..BOARD_CELLS),
        );
        if !used.insert(cell) {
            continue;
        }
        let direction = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
        level
            .blocks
            .push(BlockDef::new(cell_center(cell.0, cell.1), direction));

        let goal = match direction {
            Direction::Up => (cell.0, BOARD_CELLS),
            Direction::Down => (cell.0, 0),
            Direction::Left => (0, cell.1),
            Direction::Right => (BOARD_CELLS, cell.1),
        };
        if goal_cells.insert(goal) {
            level
                .goals
                .push(BodyDef::new(cell_center(goal.0, goal.1), Vec2::splat(CELL_SIZE * 0.5)));
        }
    }

    for x in 1..BOARD_CELLS {
        for y in 1..BOARD_CELLS {
            if !used.contains(&(x, y)) && rng.random_bool(0.12) {
                used.insert((x, y));
                level.obstacles.push(BodyDef::new(cell_center(x, y), half));
            }
        }
    }

    if rng.random_bool(0.5) {
        let x = rng.random_range(1..BOARD_CELLS);
        let y = rng.random_range(1..BOARD_CELLS);
        if !used.contains(&(x, y)) {
            level.keys.push(BodyDef::new(cell_center(x, y), half));
        }
    }

    level.move_budget = Some(block_count as u32 + 2);
    log::info!(
        "Generated level {}: {} blocks, {} obstacles, {} goals",
        level.name,
        level.blocks.len(),
        level.obstacles.len(),
        level.goals.len()
    );
    level
}
