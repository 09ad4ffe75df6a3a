//! Move budget and win/lose outcome
//!
//! The engine only talks to the outer controller through
//! [`OutcomeController`]. [`MoveBudget`] is the stock implementation: a fixed
//! number of moves, win when every block is cleared, lose when the moves run
//! out and the board has come to rest with blocks left.

use serde::{Deserialize, Serialize};

/// Final result of a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
}

/// The outer controller as seen by the engine
pub trait OutcomeController {
    /// Whether slide/rotate requests are accepted right now
    fn allows_input(&self) -> bool;
    /// Spend one move; returns the moves left
    fn consume_move(&mut self) -> u32;
    fn remaining_moves(&self) -> u32;
    /// A block reached a goal and was removed
    fn block_cleared(&mut self);
    fn key_collected(&mut self) {}
    /// Called when no block is moving and the budget is exhausted
    fn all_settled(&mut self);
    /// Advance timers; returns an outcome the tick it becomes final
    fn tick(&mut self, _dt: f32) -> Option<Outcome> {
        None
    }
    fn outcome(&self) -> Option<Outcome> {
        None
    }
}

/// Phase of a level from the controller's point of view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BudgetPhase {
    Playing,
    /// Outcome decided, waiting out the result delay
    Pending { outcome: Outcome, remaining: f32 },
    Finished(Outcome),
}

/// Stock move-budget controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveBudget {
    pub total_moves: u32,
    remaining_moves: u32,
    pub total_blocks: u32,
    cleared_blocks: u32,
    keys: u32,
    result_delay: f32,
    phase: BudgetPhase,
}

impl MoveBudget {
    pub fn new(total_moves: u32, total_blocks: u32, result_delay: f32) -> Self {
        Self {
            total_moves,
            remaining_moves: total_moves,
            total_blocks,
            cleared_blocks: 0,
            keys: 0,
            result_delay,
            phase: BudgetPhase::Playing,
        }
    }

    pub fn phase(&self) -> BudgetPhase {
        self.phase
    }

    pub fn cleared_blocks(&self) -> u32 {
        self.cleared_blocks
    }

    pub fn blocks_left(&self) -> u32 {
        self.total_blocks.saturating_sub(self.cleared_blocks)
    }

    pub fn keys(&self) -> u32 {
        self.keys
    }

    /// Start over with the same budget
    pub fn reset(&mut self) {
        *self = Self::new(self.total_moves, self.total_blocks, self.result_delay);
    }

    fn decide(&mut self, outcome: Outcome) {
        if self.phase != BudgetPhase::Playing {
            return;
        }
        log::info!(
            "Outcome {outcome:?}: {}/{} blocks cleared, {} moves left",
            self.cleared_blocks,
            self.total_blocks,
            self.remaining_moves
        );
        self.phase = BudgetPhase::Pending {
            outcome,
            remaining: self.result_delay,
        };
    }
}

impl OutcomeController for MoveBudget {
    fn allows_input(&self) -> bool {
        self.phase == BudgetPhase::Playing && self.remaining_moves > 0
    }

    fn consume_move(&mut self) -> u32 {
        if self.remaining_moves > 0 {
            self.remaining_moves -= 1;
        }
        self.remaining_moves
    }

    fn remaining_moves(&self) -> u32 {
        self.remaining_moves
    }

    fn block_cleared(&mut self) {
        self.cleared_blocks += 1;
        if self.cleared_blocks >= self.total_blocks {
            self.decide(Outcome::Won);
        }
    }

    fn key_collected(&mut self) {
        self.keys += 1;
    }

    fn all_settled(&mut self) {
        if self.remaining_moves == 0 && self.cleared_blocks < self.total_blocks {
            self.decide(Outcome::Lost);
        }
    }

    fn tick(&mut self, dt: f32) -> Option<Outcome> {
        if let BudgetPhase::Pending { outcome, remaining } = &mut self.phase {
            *remaining -= dt;
            if *remaining <= 0.0 {
                let outcome = *outcome;
                self.phase = BudgetPhase::Finished(outcome);
                return Some(outcome);
            }
        }
        None
    }

    fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            BudgetPhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }
}
