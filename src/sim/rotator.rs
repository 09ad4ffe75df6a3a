//! Rotators: tappable pieces that lift, turn and settle back down
//!
//! Bodies attached to a rotator orbit its pivot while it turns. They keep
//! their own orientation, so a block's slide direction and footprint don't
//! change, only its position. A rotation costs one move, charged when the
//! piece is back on the ground.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::BodyId;
use crate::approach;
use crate::tuning::RotatorTuning;

/// Where a rotator is in its animation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RotatorPhase {
    Resting,
    Raising,
    Turning { elapsed: f32, from: f32 },
    Lowering,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rotator {
    pub id: BodyId,
    pub pivot: Vec2,
    /// Heading in degrees, normalized to [0, 360)
    pub heading: f32,
    /// Height above the plane
    pub lift: f32,
    pub phase: RotatorPhase,
    /// Blocks and obstacles carried around the pivot
    pub attached: Vec<BodyId>,
    /// Offsets from the pivot captured when the current rotation started
    #[serde(skip)]
    anchors: Vec<(BodyId, Vec2)>,
    /// Degrees turned so far in the current rotation (counter-clockwise)
    #[serde(skip)]
    turned: f32,
}

impl Rotator {
    pub fn new(id: BodyId, pivot: Vec2) -> Self {
        Self {
            id,
            pivot,
            heading: 0.0,
            lift: 0.0,
            phase: RotatorPhase::Resting,
            attached: Vec::new(),
            anchors: Vec::new(),
            turned: 0.0,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase != RotatorPhase::Resting
    }

    /// Whether `body` is carried by this rotator
    pub fn carries(&self, body: BodyId) -> bool {
        self.attached.contains(&body)
    }

    /// Begin a rotation from the given positions of the attached bodies.
    /// Ignored while one is already running.
    pub fn activate(&mut self, positions: impl IntoIterator<Item = (BodyId, Vec2)>) -> bool {
        if self.is_busy() {
            return false;
        }
        self.anchors = positions
            .into_iter()
            .map(|(id, pos)| (id, pos - self.pivot))
            .collect();
        self.turned = 0.0;
        self.phase = RotatorPhase::Raising;
        true
    }

    /// Current positions of the attached bodies
    pub fn placements(&self) -> impl Iterator<Item = (BodyId, Vec2)> + '_ {
        let rotation = Vec2::from_angle(self.turned.to_radians());
        self.anchors
            .iter()
            .map(move |&(id, offset)| (id, self.pivot + snap(rotation.rotate(offset))))
    }

    /// Advance the animation. Returns true on the tick the rotator lands.
    pub fn tick(&mut self, dt: f32, tuning: &RotatorTuning) -> bool {
        match self.phase {
            RotatorPhase::Resting => false,
            RotatorPhase::Raising => {
                self.lift = approach(self.lift, tuning.raise_height, tuning.raise_speed * dt);
                if (self.lift - tuning.raise_height).abs() <= 0.01 {
                    self.lift = tuning.raise_height;
                    self.phase = RotatorPhase::Turning {
                        elapsed: 0.0,
                        from: self.heading,
                    };
                }
                false
            }
            RotatorPhase::Turning { elapsed, from } => {
                let elapsed = elapsed + dt;
                let duration = tuning.rotate_duration.max(f32::EPSILON);
                let t = (elapsed / duration).min(1.0);
                self.turned = tuning.rotation_angle * t;
                self.heading = (from + self.turned).rem_euclid(360.0);
                self.phase = if t >= 1.0 {
                    RotatorPhase::Lowering
                } else {
                    RotatorPhase::Turning { elapsed, from }
                };
                false
            }
            RotatorPhase::Lowering => {
                self.lift = approach(self.lift, 0.0, tuning.lower_speed * dt);
                if self.lift <= 0.01 {
                    self.lift = 0.0;
                    self.phase = RotatorPhase::Resting;
                    return true;
                }
                false
            }
        }
    }

    /// Forget the anchors of a finished rotation
    pub(crate) fn release(&mut self) {
        self.anchors.clear();
        self.turned = 0.0;
    }
}

/// Remove float noise from quarter-turn results (cos 90° isn't exactly 0)
fn snap(v: Vec2) -> Vec2 {
    let r = (v * 1024.0).round() / 1024.0;
    if v.abs_diff_eq(r, 1e-4) { r } else { v }
}
