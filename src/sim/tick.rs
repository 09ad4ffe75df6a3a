//! Fixed timestep simulation tick
//!
//! Input requests (slide, stop, rotate, goal contact) and the per-tick advance
//! of every in-flight task: block slides, rotators and effect animations.

use glam::Vec2;

use super::chain::propagate_chain;
use super::effects::{EffectHooks, EffectStatus, EffectTask, NoHooks};
use super::geom::Footprint;
use super::outcome::Outcome;
use super::raycast::Collider;
use super::slide::{SlidePlan, Termination, resolve_slide};
use super::state::{BodyId, Ignored, SimEvent};
use super::world::Simulation;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Blocks to stop, applied first
    pub stops: Vec<BodyId>,
    /// Blocks the player tapped this tick, in order
    pub slides: Vec<BodyId>,
    /// Rotators the player tapped this tick
    pub rotations: Vec<BodyId>,
}

impl TickInput {
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty() && self.slides.is_empty() && self.rotations.is_empty()
    }
}

impl Simulation {
    /// Run `f` against the installed hooks, if any
    fn with_hooks(&mut self, f: impl FnOnce(&mut dyn EffectHooks)) {
        if let Some(hooks) = self.hooks.as_deref_mut() {
            f(hooks);
        }
    }

    fn input_allowed(&self) -> bool {
        self.controller.as_ref().is_none_or(|c| c.allows_input())
    }

    /// Request a slide for one block
    pub fn request_slide(&mut self, id: BodyId) -> Result<SlidePlan, Ignored> {
        self.request_slides(&[id])
            .pop()
            .unwrap_or(Err(Ignored::UnknownBody))
    }

    /// Request slides for several blocks in the same tick.
    ///
    /// Every accepted block is marked as sliding before any ray is cast, so
    /// blocks starting together are transparent to each other whatever the
    /// request order. Results are returned in request order.
    pub fn request_slides(&mut self, ids: &[BodyId]) -> Vec<Result<SlidePlan, Ignored>> {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        let mut lockout = false;

        for (i, &id) in ids.iter().enumerate() {
            match self.accept_slide(id) {
                Ok(remaining) => {
                    accepted.push(i);
                    lockout |= remaining == Some(0);
                }
                Err(reason) => {
                    log::debug!("Slide request for {id} ignored: {reason:?}");
                    self.events.push(SimEvent::SlideIgnored { block: id, reason });
                    rejected.push((i, reason));
                }
            }
        }

        let colliders = self.colliders();
        let mut results: Vec<Result<SlidePlan, Ignored>> = vec![Err(Ignored::UnknownBody); ids.len()];
        for (i, reason) in rejected {
            results[i] = Err(reason);
        }
        for i in accepted {
            let id = ids[i];
            let Some(block) = self.block(id) else {
                continue;
            };
            let plan = resolve_slide(
                &colliders,
                id,
                block.position,
                block.direction().vector(),
                &block.params,
            );
            if let Some(block) = self.block_mut(id) {
                block.retarget(plan);
            }
            self.dispatch_slide_effects(id, &plan, &colliders);
            self.events.push(SimEvent::SlideStarted {
                block: id,
                target: plan.target,
                contact: plan.ended_in_contact(),
            });
            results[i] = Ok(plan);
        }

        if lockout {
            self.disable_all_idle();
        }
        self.check_settled();
        results
    }

    /// Gate a request and put the block into the Sliding state. Returns the
    /// moves left after charging this slide (None without a controller).
    fn accept_slide(&mut self, id: BodyId) -> Result<Option<u32>, Ignored> {
        let Some(block) = self.block(id) else {
            return Err(Ignored::UnknownBody);
        };
        if block.is_moving() {
            return Err(Ignored::AlreadySliding);
        }
        if !self.input_allowed() {
            return Err(Ignored::InputLocked);
        }
        if !block.input_enabled() {
            return Err(Ignored::Disabled);
        }
        if self.rotators.iter().any(|r| r.is_busy() && r.carries(id)) {
            return Err(Ignored::Busy);
        }

        let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) else {
            return Err(Ignored::UnknownBody);
        };
        block.begin_slide(&mut self.coordinator);
        Ok(self.controller.as_mut().map(|c| c.consume_move()))
    }

    /// Fire hooks and schedule flash/push tasks for a freshly resolved slide
    fn dispatch_slide_effects(&mut self, id: BodyId, plan: &SlidePlan, colliders: &[Collider]) {
        let settings = self.settings.clone();
        let Termination::Blocked { hit } = plan.termination else {
            if settings.sound {
                self.with_hooks(|h| h.play_move_effect());
            }
            return;
        };

        let lifetime = self.tuning.effects.hit_effect_lifetime;
        let sound = settings.sound;
        let particles = settings.hit_particles;
        self.with_hooks(|h| {
            if particles {
                h.spawn_hit_effect(hit.point, lifetime);
            }
            if sound {
                h.play_hit_effect();
            }
        });

        let chain = &self.tuning.chain;
        let direction = plan.direction;
        if settings.effective_flash() {
            self.effects
                .push(EffectTask::flash(hit.id, self.tuning.effects.flash_duration));
        }
        if settings.effective_push() {
            self.effects.push(EffectTask::push(
                hit.id,
                direction,
                chain.push_offset,
                chain.push_speed,
                0.0,
            ));
        }
        if settings.effective_chain() {
            let members = propagate_chain(colliders, id, plan.start, &hit, direction, chain);
            if !members.is_empty() {
                log::debug!("Chain from {}: {} members", hit.id, members.len());
            }
            for (i, member) in members.into_iter().enumerate() {
                self.effects.push(EffectTask::push(
                    member,
                    direction,
                    chain.push_offset,
                    chain.push_speed,
                    (i + 1) as f32 * chain.stagger,
                ));
            }
        }
    }

    /// Halt a block where it is. A no-op on an idle or unknown block.
    pub fn stop_movement(&mut self, id: BodyId) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        if !block.stop(&mut self.coordinator) {
            return false;
        }
        let position = block.position;
        if self.settings.sound {
            self.with_hooks(|h| h.stop_effect());
        }
        self.events.push(SimEvent::Stopped { block: id, position });
        self.check_settled();
        true
    }

    /// A goal touched the block: settle it if sliding, remove it and tell the
    /// controller one block was cleared.
    pub fn on_goal_contact(&mut self, id: BodyId) -> bool {
        let Some(block) = self.blocks.iter_mut().find(|b| b.id == id) else {
            return false;
        };
        let plan = block.settle(&mut self.coordinator);
        self.consume_block(id, plan.and_then(|p| p.goal()), plan.is_some());
        self.check_settled();
        true
    }

    fn consume_block(&mut self, id: BodyId, goal: Option<BodyId>, was_moving: bool) {
        if self.remove_block(id).is_none() {
            return;
        }
        if was_moving && self.settings.sound {
            self.with_hooks(|h| h.stop_effect());
        }
        if let Some(controller) = self.controller.as_mut() {
            controller.block_cleared();
        }
        log::debug!("Block {id} consumed");
        self.events.push(SimEvent::BlockConsumed { block: id, goal });
    }

    /// Start rotating a rotator and everything it carries. The move is
    /// charged when it lands.
    pub fn request_rotate(&mut self, id: BodyId) -> Result<(), Ignored> {
        let Some(index) = self.rotators.iter().position(|r| r.id == id) else {
            return Err(Ignored::UnknownBody);
        };
        if !self.input_allowed() {
            return Err(Ignored::InputLocked);
        }
        if self.rotators[index].is_busy() {
            return Err(Ignored::Busy);
        }
        let attached = &self.rotators[index].attached;
        if attached.iter().any(|&b| self.block(b).is_some_and(|b| b.is_moving())) {
            return Err(Ignored::AlreadySliding);
        }
        let positions: Vec<_> = attached
            .iter()
            .filter_map(|&b| self.body_position(b).map(|p| (b, p)))
            .collect();
        if !self.rotators[index].activate(positions) {
            return Err(Ignored::Busy);
        }
        self.events.push(SimEvent::RotationStarted { rotator: id });
        Ok(())
    }

    /// Notify the controller once nothing is in flight and the budget is spent
    fn check_settled(&mut self) {
        if !self.coordinator.is_idle() || self.rotators.iter().any(|r| r.is_busy()) {
            return;
        }
        if let Some(controller) = self.controller.as_mut() {
            if controller.remaining_moves() == 0 {
                controller.all_settled();
            }
        }
    }

    fn charge_rotation(&mut self) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        if controller.consume_move() == 0 {
            self.disable_all_idle();
        }
    }
}

/// A block moving from `from` to `to` passes over the key
fn sweeps_over(key: &Footprint, block_half: Vec2, from: Vec2, to: Vec2) -> bool {
    let grown = Footprint::new(key.center, key.half_extents + block_half);
    let travel = from.distance(to);
    if travel <= f32::EPSILON {
        return grown.contains(to);
    }
    let dir = (to - from) / travel;
    match grown.ray_span(from, dir) {
        Some((enter, exit)) => enter <= travel && exit >= 0.0,
        None => false,
    }
}

/// Advance the simulation by one fixed timestep. Returns the events produced
/// since the previous tick.
pub fn tick(sim: &mut Simulation, input: &TickInput, dt: f32) -> Vec<SimEvent> {
    sim.time_ticks += 1;

    // Input
    if !input.is_empty() {
        for &id in &input.stops {
            sim.stop_movement(id);
        }
        if !input.slides.is_empty() {
            sim.request_slides(&input.slides);
        }
        for &id in &input.rotations {
            if let Err(reason) = sim.request_rotate(id) {
                log::debug!("Rotate request for {id} ignored: {reason:?}");
            }
        }
    }

    // Slides, in id order
    let mut arrived = Vec::new();
    for block in sim.blocks.iter_mut() {
        let Some(step) = block.advance(dt) else {
            continue;
        };
        for key in sim.keys.iter_mut().filter(|k| !k.collected) {
            if sweeps_over(&key.footprint, block.params.half_extents, step.from, step.to) {
                key.collected = true;
                if let Some(controller) = sim.controller.as_mut() {
                    controller.key_collected();
                }
                log::debug!("Key {} collected by {}", key.id, block.id);
                sim.events.push(SimEvent::KeyCollected {
                    key: key.id,
                    by: block.id,
                });
            }
        }
        if step.arrived {
            arrived.push(block.id);
        }
    }

    for id in arrived {
        let Some(block) = sim.blocks.iter_mut().find(|b| b.id == id) else {
            continue;
        };
        let Some(plan) = block.settle(&mut sim.coordinator) else {
            continue;
        };
        let position = block.position;
        match plan.goal() {
            Some(goal) => sim.consume_block(id, Some(goal), true),
            None => {
                if sim.settings.sound {
                    sim.with_hooks(|h| h.stop_effect());
                }
                sim.events.push(SimEvent::Settled { block: id, position });
            }
        }
    }

    // Rotators carry their bodies around the pivot
    let mut landed = Vec::new();
    let mut placed = Vec::new();
    for rotator in sim.rotators.iter_mut().filter(|r| r.is_busy()) {
        let done = rotator.tick(dt, &sim.tuning.rotator);
        placed.extend(rotator.placements());
        if done {
            rotator.release();
            landed.push(rotator.id);
        }
    }
    for (id, position) in placed {
        sim.place_body(id, position);
    }
    for id in landed {
        sim.charge_rotation();
        sim.events.push(SimEvent::RotationFinished { rotator: id });
    }

    // Effects run independently of block motion; a vanished target only
    // ends its own task.
    let mut effects = std::mem::take(&mut sim.effects);
    let mut hooks = sim.hooks.take();
    let mut aborted = Vec::new();
    effects.retain_mut(|task| {
        let alive = sim.contains(task.target);
        let status = match hooks.as_deref_mut() {
            Some(h) => task.tick(dt, alive, h),
            None => task.tick(dt, alive, &mut NoHooks),
        };
        if status == EffectStatus::Aborted {
            aborted.push(task.target);
        }
        status == EffectStatus::Running
    });
    sim.hooks = hooks;
    sim.effects = effects;
    for target in aborted {
        log::debug!("Effect on {target} aborted: target gone");
        sim.events.push(SimEvent::EffectAborted { target });
    }

    sim.check_settled();

    if let Some(outcome) = sim.controller.as_mut().and_then(|c| c.tick(dt)) {
        match outcome {
            Outcome::Won => log::info!("Level won after {} ticks", sim.time_ticks),
            Outcome::Lost => log::info!("Level lost after {} ticks", sim.time_ticks),
        }
        sim.events.push(SimEvent::OutcomeDecided(outcome));
    }

    sim.drain_events()
}
