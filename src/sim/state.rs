//! Simulation entities and the events they produce
//!
//! Blocks are the only bodies that move. Obstacles, goals and keys are static.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::coordinator::MovementCoordinator;
use super::geom::{Direction, Footprint};
use super::outcome::Outcome;
use super::slide::SlidePlan;
use crate::consts::SETTLE_EPSILON;
use crate::move_towards;

/// Identifier shared by every body in a simulation (one id space)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ray-cast classification of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyTag {
    Block,
    Obstacle,
    Goal,
}

/// Per-block slide parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockParams {
    /// Slide distance cap
    pub tiles_to_move: f32,
    /// Linear speed (units/s)
    pub move_speed: f32,
    /// Clearance kept from a stopping obstruction
    pub safe_distance: f32,
    pub half_extents: Vec2,
}

impl From<&crate::tuning::BlockTuning> for BlockParams {
    fn from(t: &crate::tuning::BlockTuning) -> Self {
        Self {
            tiles_to_move: t.tiles_to_move,
            move_speed: t.move_speed,
            safe_distance: t.safe_distance,
            half_extents: Vec2::splat(t.half_extent),
        }
    }
}

impl Default for BlockParams {
    fn default() -> Self {
        Self::from(&crate::tuning::BlockTuning::default())
    }
}

/// Motion state of a block: exactly one of Idle or Sliding
#[derive(Debug, Clone, PartialEq)]
pub enum Motion {
    Idle,
    Sliding(SlidePlan),
}

/// Result of advancing a sliding block by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionStep {
    pub from: Vec2,
    pub to: Vec2,
    /// Close enough to the target to settle
    pub arrived: bool,
}

/// A sliding block
#[derive(Debug, Clone)]
pub struct Block {
    pub id: BodyId,
    pub position: Vec2,
    pub params: BlockParams,
    direction: Direction,
    motion: Motion,
    input_enabled: bool,
}

impl Block {
    pub fn new(id: BodyId, position: Vec2, direction: Direction, params: BlockParams) -> Self {
        Self {
            id,
            position,
            params,
            direction,
            motion: Motion::Idle,
            input_enabled: true,
        }
    }

    /// Slide direction, fixed at creation
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn is_moving(&self) -> bool {
        matches!(self.motion, Motion::Sliding(_))
    }

    #[inline]
    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    /// Active slide plan, if sliding
    pub fn plan(&self) -> Option<&SlidePlan> {
        match &self.motion {
            Motion::Sliding(plan) => Some(plan),
            Motion::Idle => None,
        }
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.position, self.params.half_extents)
    }

    /// Stop accepting slide requests (idle lockout)
    pub fn disable_input(&mut self) {
        self.input_enabled = false;
    }

    /// Enter the Sliding state with a stationary placeholder plan.
    ///
    /// The real plan is installed with [`Block::retarget`] once every block
    /// starting this tick is marked as sliding.
    pub fn begin_slide(&mut self, coordinator: &mut MovementCoordinator) -> bool {
        if self.is_moving() {
            return false;
        }
        self.motion = Motion::Sliding(SlidePlan::stationary(self.position, self.direction.vector()));
        coordinator.slide_started(self.id);
        true
    }

    /// Replace the plan of a sliding block
    pub fn retarget(&mut self, plan: SlidePlan) {
        if let Motion::Sliding(current) = &mut self.motion {
            *current = plan;
        }
    }

    /// Move toward the target by at most `move_speed * dt`
    pub fn advance(&mut self, dt: f32) -> Option<MotionStep> {
        let Motion::Sliding(plan) = &self.motion else {
            return None;
        };
        let from = self.position;
        let to = move_towards(from, plan.target, self.params.move_speed * dt);
        self.position = to;
        Some(MotionStep {
            from,
            to,
            arrived: to.distance(plan.target) < SETTLE_EPSILON,
        })
    }

    /// Snap to the target and return to Idle. Returns the finished plan.
    pub fn settle(&mut self, coordinator: &mut MovementCoordinator) -> Option<SlidePlan> {
        match std::mem::replace(&mut self.motion, Motion::Idle) {
            Motion::Sliding(plan) => {
                self.position = plan.target;
                coordinator.slide_ended(self.id);
                Some(plan)
            }
            Motion::Idle => None,
        }
    }

    /// Halt immediately where the block is. Idempotent: returns false (and
    /// leaves the counter alone) if the block was already idle.
    pub fn stop(&mut self, coordinator: &mut MovementCoordinator) -> bool {
        if !self.is_moving() {
            return false;
        }
        self.motion = Motion::Idle;
        coordinator.slide_ended(self.id);
        true
    }
}

/// A static obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: BodyId,
    pub footprint: Footprint,
}

/// A goal region; consumes blocks that slide into it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: BodyId,
    pub footprint: Footprint,
}

/// A collectible key lying on the plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Key {
    pub id: BodyId,
    pub footprint: Footprint,
    pub collected: bool,
}

/// Why a slide or rotate request was ignored (not an error)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// No block (or rotator) with that id
    UnknownBody,
    /// The outcome controller isn't accepting input
    InputLocked,
    /// The block was disabled by the idle lockout
    Disabled,
    AlreadySliding,
    /// The rotator (or the rotator carrying the block) is mid-rotation
    Busy,
}

/// Things that happened during a tick, for the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    SlideStarted {
        block: BodyId,
        target: Vec2,
        contact: bool,
    },
    SlideIgnored {
        block: BodyId,
        reason: Ignored,
    },
    RotationStarted {
        rotator: BodyId,
    },
    Settled {
        block: BodyId,
        position: Vec2,
    },
    Stopped {
        block: BodyId,
        position: Vec2,
    },
    BlockConsumed {
        block: BodyId,
        goal: Option<BodyId>,
    },
    KeyCollected {
        key: BodyId,
        by: BodyId,
    },
    /// An effect lost its target mid-animation
    EffectAborted {
        target: BodyId,
    },
    RotationFinished {
        rotator: BodyId,
    },
    IdleLockout,
    OutcomeDecided(Outcome),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> Block {
        Block::new(BodyId(1), Vec2::ZERO, Direction::Right, BlockParams::default())
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut coord = MovementCoordinator::new();
        let mut b = block();
        coord.register_block(b.id);

        assert!(b.begin_slide(&mut coord));
        assert_eq!(coord.moving_count(), 1);
        assert!(b.stop(&mut coord));
        assert!(!b.stop(&mut coord));
        assert_eq!(coord.moving_count(), 0);
        assert!(!b.is_moving());
    }

    #[test]
    fn test_advance_and_settle() {
        let mut coord = MovementCoordinator::new();
        let mut b = block();
        coord.register_block(b.id);
        b.begin_slide(&mut coord);
        b.retarget(SlidePlan::open(Vec2::ZERO, Vec2::X, 10.0));

        // 50 units/s for 0.1 s = 5 units
        let step = b.advance(0.1).unwrap();
        assert!((step.to.x - 5.0).abs() < 1e-4);
        assert!(!step.arrived);

        let step = b.advance(0.1).unwrap();
        assert!(step.arrived);

        let plan = b.settle(&mut coord).unwrap();
        assert_eq!(b.position, plan.target);
        assert!(coord.is_idle());
        assert!(b.settle(&mut coord).is_none());
    }

    #[test]
    fn test_begin_twice_counts_once() {
        let mut coord = MovementCoordinator::new();
        let mut b = block();
        coord.register_block(b.id);
        assert!(b.begin_slide(&mut coord));
        assert!(!b.begin_slide(&mut coord));
        assert_eq!(coord.moving_count(), 1);
    }

    #[test]
    fn test_idle_block_does_not_advance() {
        let mut b = block();
        assert!(b.advance(1.0).is_none());
        assert_eq!(b.position, Vec2::ZERO);
    }
}
