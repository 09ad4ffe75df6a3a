//! Deterministic simulation module
//!
//! All block movement and collision logic lives here. This module must be pure
//! and deterministic:
//! - Fixed timestep only
//! - Stable iteration order (by body ID)
//! - No rendering, audio or platform dependencies (those sit behind hooks)

pub mod chain;
pub mod coordinator;
pub mod effects;
pub mod geom;
pub mod outcome;
pub mod raycast;
pub mod rotator;
pub mod slide;
pub mod state;
pub mod tick;
pub mod world;

pub use chain::propagate_chain;
pub use coordinator::MovementCoordinator;
pub use effects::{EffectHooks, EffectKind, EffectStatus, EffectTask, NoHooks};
pub use geom::{Direction, Footprint};
pub use outcome::{BudgetPhase, MoveBudget, Outcome, OutcomeController};
pub use raycast::{Collider, RayHit, cast_ray, first_hit};
pub use rotator::{Rotator, RotatorPhase};
pub use slide::{SlidePlan, Termination, plan_from_hits, resolve_slide};
pub use state::{
    Block, BlockParams, BodyId, BodyTag, Goal, Ignored, Key, Motion, MotionStep, Obstacle,
    SimEvent,
};
pub use tick::{TickInput, tick};
pub use world::Simulation;
