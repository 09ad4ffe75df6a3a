//! Simulation context
//!
//! Owns every body, the movement coordinator, pending effect tasks and the
//! optional collaborators (effect hooks, outcome controller). Several
//! simulations can live side by side; nothing here is global.

use glam::Vec2;

use super::coordinator::MovementCoordinator;
use super::effects::{EffectHooks, EffectTask};
use super::geom::{Direction, Footprint};
use super::outcome::{MoveBudget, Outcome, OutcomeController};
use super::raycast::Collider;
use super::rotator::Rotator;
use super::state::{Block, BlockParams, BodyId, BodyTag, Goal, Key, Obstacle, SimEvent};
use crate::error::LevelError;
use crate::level::LevelDef;
use crate::settings::Settings;
use crate::tuning::Tuning;

pub struct Simulation {
    pub tuning: Tuning,
    pub settings: Settings,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Blocks (sorted by id for determinism)
    pub(crate) blocks: Vec<Block>,
    pub(crate) obstacles: Vec<Obstacle>,
    pub(crate) goals: Vec<Goal>,
    pub(crate) keys: Vec<Key>,
    pub(crate) rotators: Vec<Rotator>,
    pub(crate) effects: Vec<EffectTask>,
    pub(crate) coordinator: MovementCoordinator,
    pub(crate) hooks: Option<Box<dyn EffectHooks>>,
    pub(crate) controller: Option<Box<dyn OutcomeController>>,
    /// Events since the last tick
    pub(crate) events: Vec<SimEvent>,
    next_id: u32,
}

impl Simulation {
    /// Empty simulation with no collaborators
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            settings: Settings::default(),
            time_ticks: 0,
            blocks: Vec::new(),
            obstacles: Vec::new(),
            goals: Vec::new(),
            keys: Vec::new(),
            rotators: Vec::new(),
            effects: Vec::new(),
            coordinator: MovementCoordinator::new(),
            hooks: None,
            controller: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Build a simulation for a level, with a [`MoveBudget`] controller
    pub fn from_level(level: &LevelDef, tuning: Tuning) -> Result<Self, LevelError> {
        tuning.validate()?;
        let mut sim = Self::new(tuning);
        sim.load_level(level)?;
        Ok(sim)
    }

    /// Replace the current level. All bodies, effects and counters are reset;
    /// hooks and settings are kept.
    pub fn load_level(&mut self, level: &LevelDef) -> Result<(), LevelError> {
        level.validate()?;
        self.clear();

        for block in &level.blocks {
            let params = block.params(&self.tuning.block);
            self.spawn_block(block.position, block.direction, params);
        }
        for body in &level.obstacles {
            self.spawn_obstacle(Footprint::new(body.position, body.half_extents));
        }
        for body in &level.goals {
            self.spawn_goal(Footprint::new(body.position, body.half_extents));
        }
        for body in &level.keys {
            self.spawn_key(Footprint::new(body.position, body.half_extents));
        }
        for def in &level.rotators {
            let rotator = self.spawn_rotator(def.pivot);
            for block in &def.blocks {
                let params = block.params(&self.tuning.block);
                let id = self.spawn_block(block.position, block.direction, params);
                self.attach(rotator, id);
            }
            for body in &def.obstacles {
                let id = self.spawn_obstacle(Footprint::new(body.position, body.half_extents));
                self.attach(rotator, id);
            }
        }

        let moves = level.move_budget.unwrap_or(self.tuning.budget.total_moves);
        self.controller = Some(Box::new(MoveBudget::new(
            moves,
            self.blocks.len() as u32,
            self.tuning.budget.result_delay,
        )));
        log::info!(
            "Level '{}' loaded: {} blocks, {} obstacles, {} goals, {} moves",
            level.name,
            self.blocks.len(),
            self.obstacles.len(),
            self.goals.len(),
            moves
        );
        Ok(())
    }

    /// Drop every body and pending task
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.obstacles.clear();
        self.goals.clear();
        self.keys.clear();
        self.rotators.clear();
        self.effects.clear();
        self.events.clear();
        self.coordinator.clear();
        self.time_ticks = 0;
        self.next_id = 1;
    }

    /// Install effect hooks
    pub fn set_hooks(&mut self, hooks: Box<dyn EffectHooks>) {
        self.hooks = Some(hooks);
    }

    /// Install (or remove) the outcome controller
    pub fn set_controller(&mut self, controller: Option<Box<dyn OutcomeController>>) {
        self.controller = controller;
    }

    pub fn controller(&self) -> Option<&dyn OutcomeController> {
        self.controller.as_deref()
    }

    /// Allocate a new body ID
    pub fn next_entity_id(&mut self) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a block and register it
    pub fn spawn_block(&mut self, position: Vec2, direction: Direction, params: BlockParams) -> BodyId {
        let id = self.next_entity_id();
        self.blocks.push(Block::new(id, position, direction, params));
        self.coordinator.register_block(id);
        id
    }

    pub fn spawn_obstacle(&mut self, footprint: Footprint) -> BodyId {
        let id = self.next_entity_id();
        self.obstacles.push(Obstacle { id, footprint });
        id
    }

    pub fn spawn_goal(&mut self, footprint: Footprint) -> BodyId {
        let id = self.next_entity_id();
        self.goals.push(Goal { id, footprint });
        id
    }

    pub fn spawn_key(&mut self, footprint: Footprint) -> BodyId {
        let id = self.next_entity_id();
        self.keys.push(Key {
            id,
            footprint,
            collected: false,
        });
        id
    }

    pub fn spawn_rotator(&mut self, pivot: Vec2) -> BodyId {
        let id = self.next_entity_id();
        self.rotators.push(Rotator::new(id, pivot));
        id
    }

    /// Let a rotator carry a block or obstacle. Returns false for unknown
    /// ids, other kinds of body, or a body some rotator already carries.
    pub fn attach(&mut self, rotator: BodyId, body: BodyId) -> bool {
        let carriable = self.blocks.iter().any(|b| b.id == body)
            || self.obstacles.iter().any(|o| o.id == body);
        if !carriable || self.rotators.iter().any(|r| r.carries(body)) {
            return false;
        }
        let Some(rotator) = self.rotators.iter_mut().find(|r| r.id == rotator) else {
            return false;
        };
        rotator.attached.push(body);
        true
    }

    /// Position of a block or obstacle
    pub(crate) fn body_position(&self, id: BodyId) -> Option<Vec2> {
        self.block(id)
            .map(|b| b.position)
            .or_else(|| self.obstacles.iter().find(|o| o.id == id).map(|o| o.footprint.center))
    }

    /// Move a carried body; bodies that have left the world are skipped
    pub(crate) fn place_body(&mut self, id: BodyId, position: Vec2) {
        if let Some(block) = self.block_mut(id) {
            block.position = position;
        } else if let Some(obstacle) = self.obstacles.iter_mut().find(|o| o.id == id) {
            obstacle.footprint.center = position;
        }
    }

    /// Remove a block from the world and the registry
    pub(crate) fn remove_block(&mut self, id: BodyId) -> Option<Block> {
        let idx = self.blocks.iter().position(|b| b.id == id)?;
        self.coordinator.unregister_block(id);
        Some(self.blocks.remove(idx))
    }

    // --- Queries ---

    pub fn block(&self, id: BodyId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub(crate) fn block_mut(&mut self, id: BodyId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn rotators(&self) -> &[Rotator] {
        &self.rotators
    }

    pub fn effects(&self) -> &[EffectTask] {
        &self.effects
    }

    pub fn coordinator(&self) -> &MovementCoordinator {
        &self.coordinator
    }

    /// Number of blocks currently mid-slide
    pub fn moving_count(&self) -> u32 {
        self.coordinator.moving_count()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.controller.as_ref().and_then(|c| c.outcome())
    }

    /// Whether a body of any kind exists
    pub fn contains(&self, id: BodyId) -> bool {
        self.blocks.iter().any(|b| b.id == id)
            || self.obstacles.iter().any(|o| o.id == id)
            || self.goals.iter().any(|g| g.id == id)
    }

    /// Display offset of a body from active push effects
    pub fn visual_offset(&self, id: BodyId) -> Vec2 {
        self.effects
            .iter()
            .filter(|e| e.target == id)
            .map(EffectTask::offset)
            .sum()
    }

    /// Every ray-castable body
    pub fn colliders(&self) -> Vec<Collider> {
        let blocks = self.blocks.iter().map(|b| Collider {
            id: b.id,
            tag: BodyTag::Block,
            footprint: b.footprint(),
            in_motion: b.is_moving(),
        });
        let obstacles = self.obstacles.iter().map(|o| Collider {
            id: o.id,
            tag: BodyTag::Obstacle,
            footprint: o.footprint,
            in_motion: false,
        });
        let goals = self.goals.iter().map(|g| Collider {
            id: g.id,
            tag: BodyTag::Goal,
            footprint: g.footprint,
            in_motion: false,
        });
        blocks.chain(obstacles).chain(goals).collect()
    }

    /// Take the events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Idle blocks stop accepting input; sliding blocks are untouched
    pub fn disable_all_idle(&mut self) {
        let idle: Vec<BodyId> = self.coordinator.idle_blocks().collect();
        for id in &idle {
            if let Some(block) = self.block_mut(*id) {
                block.disable_input();
            }
        }
        log::debug!("Idle lockout: {} blocks disabled", idle.len());
        self.events.push(SimEvent::IdleLockout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::level::{BlockDef, BodyDef, LevelDef, RotatorDef};

    #[test]
    fn test_load_level_registers_blocks() {
        let level = LevelDef {
            blocks: vec![
                BlockDef::new(Vec2::ZERO, Direction::Right),
                BlockDef::new(Vec2::new(0.0, 10.0), Direction::Up),
            ],
            obstacles: vec![BodyDef::new(Vec2::new(20.0, 0.0), Vec2::ZERO)],
            ..Default::default()
        };
        let sim = Simulation::from_level(&level, Tuning::default()).unwrap();
        assert_eq!(sim.blocks().len(), 2);
        assert_eq!(sim.coordinator().registered().count(), 2);
        assert_eq!(sim.colliders().len(), 3);
        assert_eq!(sim.controller().map(|c| c.remaining_moves()), Some(10));
    }

    #[test]
    fn test_reload_resets_everything() {
        let level = LevelDef {
            blocks: vec![BlockDef::new(Vec2::ZERO, Direction::Right)],
            move_budget: Some(4),
            ..Default::default()
        };
        let mut sim = Simulation::from_level(&level, Tuning::default()).unwrap();
        let id = sim.blocks()[0].id;
        sim.request_slide(id).unwrap();
        assert_eq!(sim.moving_count(), 1);

        sim.load_level(&level).unwrap();
        assert_eq!(sim.moving_count(), 0);
        assert!(sim.effects().is_empty());
        assert!(!sim.blocks()[0].is_moving());
        assert_eq!(sim.controller().map(|c| c.remaining_moves()), Some(4));
    }

    #[test]
    fn test_rejects_tuning_that_never_settles() {
        let level = LevelDef {
            blocks: vec![BlockDef::new(Vec2::ZERO, Direction::Right)],
            ..Default::default()
        };
        let mut tuning = Tuning::default();
        tuning.block.move_speed = -5.0;
        assert!(matches!(
            Simulation::from_level(&level, tuning),
            Err(LevelError::Config(ConfigError::Invalid {
                field: "block.move_speed",
                ..
            }))
        ));
    }

    #[test]
    fn test_rotator_bodies_are_attached() {
        let mut rotator = RotatorDef::new(Vec2::ZERO);
        rotator.blocks.push(BlockDef::new(Vec2::new(2.0, 0.0), Direction::Up));
        rotator.obstacles.push(BodyDef::new(Vec2::new(0.0, -2.0), Vec2::ZERO));
        let level = LevelDef {
            blocks: vec![BlockDef::new(Vec2::new(10.0, 0.0), Direction::Right)],
            rotators: vec![rotator],
            ..Default::default()
        };
        let mut sim = Simulation::from_level(&level, Tuning::default()).unwrap();
        assert_eq!(sim.blocks().len(), 2);
        assert_eq!(sim.coordinator().registered().count(), 2);

        let rotator = sim.rotators()[0].id;
        let free = sim.blocks()[0].id;
        let carried = sim.blocks()[1].id;
        let obstacle = sim.obstacles()[0].id;
        assert_eq!(sim.rotators()[0].attached, vec![carried, obstacle]);

        // Already carried, a rotator, or missing
        assert!(!sim.attach(rotator, carried));
        assert!(!sim.attach(rotator, rotator));
        assert!(!sim.attach(BodyId(99), free));
        assert!(sim.attach(rotator, free));
    }

    #[test]
    fn test_disable_all_idle_skips_sliding() {
        let mut sim = Simulation::new(Tuning::default());
        let a = sim.spawn_block(Vec2::ZERO, Direction::Right, BlockParams::default());
        let b = sim.spawn_block(Vec2::new(0.0, 10.0), Direction::Right, BlockParams::default());
        sim.request_slide(a).unwrap();
        sim.disable_all_idle();
        assert!(sim.block(a).unwrap().input_enabled());
        assert!(!sim.block(b).unwrap().input_enabled());
    }
}
