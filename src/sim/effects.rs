//! Cosmetic effect tasks and the hooks they drive
//!
//! Effects are fire-and-forget: the simulation calls hooks and advances effect
//! tasks, but nothing in the movement logic waits on them.

use glam::Vec2;

use super::state::BodyId;

/// Presentation/audio callbacks. Every method defaults to a no-op so a
/// simulation with partial (or no) hooks still runs correctly.
pub trait EffectHooks {
    /// A slide stopped against something
    fn play_hit_effect(&mut self) {}
    /// A slide started with nothing in the way
    fn play_move_effect(&mut self) {}
    /// A slide settled or was stopped
    fn stop_effect(&mut self) {}
    /// Spawn a hit effect at the contact point, shown for `lifetime` seconds
    fn spawn_hit_effect(&mut self, _point: Vec2, _lifetime: f32) {}
    /// Start (`true`) or end (`false`) flashing a body
    fn flash(&mut self, _body: BodyId, _on: bool) {}
    /// Current push displacement of a body (zero when the push is over)
    fn nudge(&mut self, _body: BodyId, _offset: Vec2) {}
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl EffectHooks for NoHooks {}

/// What an effect task does to its target
#[derive(Debug, Clone, PartialEq)]
pub enum EffectKind {
    /// Colour flash for a fixed time
    Flash { remaining: f32, lit: bool },
    /// Push forward to `peak`, then back to rest
    Push {
        direction: Vec2,
        offset: f32,
        peak: f32,
        speed: f32,
        returning: bool,
    },
}

/// Result of advancing an effect by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectStatus {
    Running,
    Finished,
    /// The target disappeared mid-animation
    Aborted,
}

/// One scheduled effect on one body
#[derive(Debug, Clone, PartialEq)]
pub struct EffectTask {
    pub target: BodyId,
    /// Seconds to wait before starting
    pub delay: f32,
    pub kind: EffectKind,
}

impl EffectTask {
    pub fn flash(target: BodyId, duration: f32) -> Self {
        Self {
            target,
            delay: 0.0,
            kind: EffectKind::Flash {
                remaining: duration,
                lit: false,
            },
        }
    }

    pub fn push(target: BodyId, direction: Vec2, peak: f32, speed: f32, delay: f32) -> Self {
        Self {
            target,
            delay,
            kind: EffectKind::Push {
                direction,
                offset: 0.0,
                peak,
                speed,
                returning: false,
            },
        }
    }

    /// Current display offset of the target caused by this task
    pub fn offset(&self) -> Vec2 {
        match self.kind {
            EffectKind::Push {
                direction, offset, ..
            } => direction * offset,
            EffectKind::Flash { .. } => Vec2::ZERO,
        }
    }

    /// Advance by `dt`. `target_alive` tells whether the target still exists.
    pub fn tick(&mut self, dt: f32, target_alive: bool, hooks: &mut dyn EffectHooks) -> EffectStatus {
        if !target_alive {
            return EffectStatus::Aborted;
        }

        let mut dt = dt;
        if self.delay > 0.0 {
            if dt < self.delay {
                self.delay -= dt;
                return EffectStatus::Running;
            }
            dt -= self.delay;
            self.delay = 0.0;
        }

        match &mut self.kind {
            EffectKind::Flash { remaining, lit } => {
                if !*lit {
                    *lit = true;
                    hooks.flash(self.target, true);
                }
                *remaining -= dt;
                if *remaining <= 0.0 {
                    hooks.flash(self.target, false);
                    return EffectStatus::Finished;
                }
                EffectStatus::Running
            }
            EffectKind::Push {
                direction,
                offset,
                peak,
                speed,
                returning,
            } => {
                let step = *speed * dt;
                if !*returning {
                    *offset += step;
                    if *offset >= *peak {
                        // Spend the overshoot on the way back
                        *offset = (*peak - (*offset - *peak)).max(0.0);
                        *returning = true;
                    }
                } else {
                    *offset = (*offset - step).max(0.0);
                }
                hooks.nudge(self.target, *direction * *offset);
                if *returning && *offset <= 0.0 {
                    EffectStatus::Finished
                } else {
                    EffectStatus::Running
                }
            }
        }
    }
}
