//! Directional slide resolution
//!
//! Given an idle block, work out where its slide ends:
//! - nothing ahead within `tiles_to_move`: slide the full distance
//! - a goal first: slide to the goal's contact point, the goal consumes it
//! - a sliding block: transparent, look past it
//! - anything else solid: stop `safe_distance` short of the contact point
//!
//! Only the first non-transparent hit matters for the stop position.

use glam::Vec2;

use super::raycast::{Collider, RayHit, cast_ray};
use super::state::{BlockParams, BodyId, BodyTag};

/// How a slide ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Termination {
    /// Nothing in the way, full distance
    Open,
    /// Stopped in front of a solid body
    Blocked { hit: RayHit },
    /// Reached a goal region
    Goal { hit: RayHit },
}

/// Resolved slide for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlidePlan {
    pub start: Vec2,
    pub target: Vec2,
    pub direction: Vec2,
    pub termination: Termination,
}

impl SlidePlan {
    /// A plan that goes nowhere (placeholder while a batch starts)
    pub fn stationary(position: Vec2, direction: Vec2) -> Self {
        Self {
            start: position,
            target: position,
            direction,
            termination: Termination::Open,
        }
    }

    /// An unobstructed slide of `distance`
    pub fn open(start: Vec2, direction: Vec2, distance: f32) -> Self {
        Self {
            start,
            target: start + direction * distance,
            direction,
            termination: Termination::Open,
        }
    }

    /// Did the slide terminate in contact with something?
    pub fn ended_in_contact(&self) -> bool {
        !matches!(self.termination, Termination::Open)
    }

    /// The body that stopped the slide, if any
    pub fn blocker(&self) -> Option<&RayHit> {
        match &self.termination {
            Termination::Blocked { hit } => Some(hit),
            _ => None,
        }
    }

    /// The goal the slide ends in, if any
    pub fn goal(&self) -> Option<BodyId> {
        match &self.termination {
            Termination::Goal { hit } => Some(hit.id),
            _ => None,
        }
    }

    /// Travel distance
    pub fn distance(&self) -> f32 {
        self.start.distance(self.target)
    }
}

/// Decide the slide from hits already sorted nearest-first
pub fn plan_from_hits(start: Vec2, direction: Vec2, params: &BlockParams, hits: &[RayHit]) -> SlidePlan {
    let first = hits
        .iter()
        .find(|h| !(h.tag == BodyTag::Block && h.in_motion));

    match first {
        None => SlidePlan::open(start, direction, params.tiles_to_move),
        Some(hit) if hit.tag == BodyTag::Goal => SlidePlan {
            start,
            target: hit.point,
            direction,
            termination: Termination::Goal { hit: *hit },
        },
        Some(hit) => {
            let travel = (hit.distance - params.safe_distance).max(0.0);
            SlidePlan {
                start,
                target: start + direction * travel,
                direction,
                termination: Termination::Blocked { hit: *hit },
            }
        }
    }
}

/// Cast from `start` along `direction` and resolve the slide
pub fn resolve_slide<'a, I>(
    colliders: I,
    block: BodyId,
    start: Vec2,
    direction: Vec2,
    params: &BlockParams,
) -> SlidePlan
where
    I: IntoIterator<Item = &'a Collider>,
{
    let hits = cast_ray(colliders, start, direction, params.tiles_to_move, &[block]);
    let plan = plan_from_hits(start, direction, params, &hits);
    log::debug!(
        "Slide {block}: {:?} -> {:?} ({:?})",
        plan.start,
        plan.target,
        plan.termination
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geom::Footprint;
    use proptest::prelude::*;

    const ME: BodyId = BodyId(100);

    fn params() -> BlockParams {
        BlockParams {
            tiles_to_move: 80.0,
            move_speed: 50.0,
            safe_distance: 1.5,
            half_extents: Vec2::ONE,
        }
    }

    fn point(id: u32, tag: BodyTag, x: f32, in_motion: bool) -> Collider {
        Collider {
            id: BodyId(id),
            tag,
            footprint: Footprint::point(Vec2::new(x, 0.0)),
            in_motion,
        }
    }

    #[test]
    fn test_no_obstruction_slides_full_distance() {
        let colliders: [Collider; 0] = [];
        let plan = resolve_slide(&colliders, ME, Vec2::ZERO, Vec2::X, &params());
        assert_eq!(plan.target, Vec2::new(80.0, 0.0));
        assert!(!plan.ended_in_contact());
    }

    #[test]
    fn test_stops_short_of_obstacle() {
        let colliders = [point(1, BodyTag::Obstacle, 20.0, false)];
        let plan = resolve_slide(&colliders, ME, Vec2::ZERO, Vec2::X, &params());
        assert!((plan.target.x - 18.5).abs() < 1e-5);
        assert_eq!(plan.blocker().map(|h| h.id), Some(BodyId(1)));
    }

    #[test]
    fn test_obstacle_inside_safe_distance_means_no_travel() {
        let colliders = [point(1, BodyTag::Obstacle, 1.0, false)];
        let plan = resolve_slide(&colliders, ME, Vec2::ZERO, Vec2::X, &params());
        assert_eq!(plan.target, Vec2::ZERO);
        assert!(plan.ended_in_contact());
    }

    #[test]
    fn test_obstacle_beyond_cap_is_ignored() {
        let colliders = [point(1, BodyTag::Obstacle, 90.0, false)];
        let plan = resolve_slide(&colliders, ME, Vec2::ZERO, Vec2::X, &params());
        assert_eq!(plan.target, Vec2::new(80.0, 0.0));
    }

    #[test]
    fn test_sliding_block_is_transparent() {
        let colliders = [
            point(1, BodyTag::Block, 10.0, true),
            point(2, BodyTag::Obstacle, 40.0, false),
        ];
        let plan = resolve_slide(&colliders, ME, Vec2::ZERO, Vec2::X, &params());
        assert!((plan.target.x - 38.5).abs() < 1e-5);

        // With nothing behind it the slide runs to the cap
        let colliders = [point(1, BodyTag::Block, 10.0, true)];
        let plan = resolve_slide(&colliders, ME, Vec2::ZERO, Vec2::X, &params());
        assert_eq!(plan.target, Vec2::new(80.0, 0.0));
    }

    #[test]
    fn test_idle_block_stops_slide() {
        let colliders = [point(1, BodyTag::Block, 10.0, false)];
        let plan = resolve_slide(&colliders, ME, Vec2::ZERO, Vec2::X, &params());
        assert!((plan.target.x - 8.5).abs() < 1e-5);
    }

    #[test]
    fn test_goal_slides_to_contact() {
        let goal = Collider {
            id: BodyId(5),
            tag: BodyTag::Goal,
            footprint: Footprint::new(Vec2::new(30.0, 0.0), Vec2::splat(2.0)),
            in_motion: false,
        };
        let behind = point(6, BodyTag::Obstacle, 35.0, false);
        let plan = resolve_slide(&[goal, behind], ME, Vec2::ZERO, Vec2::X, &params());
        assert_eq!(plan.goal(), Some(BodyId(5)));
        assert!((plan.target.x - 28.0).abs() < 1e-5);
    }

    #[test]
    fn test_only_first_hit_decides() {
        let colliders = [
            point(1, BodyTag::Obstacle, 30.0, false),
            point(2, BodyTag::Obstacle, 12.0, false),
        ];
        let plan = resolve_slide(&colliders, ME, Vec2::ZERO, Vec2::X, &params());
        assert!((plan.target.x - 10.5).abs() < 1e-5);
        assert_eq!(plan.blocker().map(|h| h.id), Some(BodyId(2)));
    }

    #[test]
    fn test_vertical_slide() {
        let colliders = [Collider {
            id: BodyId(1),
            tag: BodyTag::Obstacle,
            footprint: Footprint::point(Vec2::new(0.0, -15.0)),
            in_motion: false,
        }];
        let plan = resolve_slide(&colliders, ME, Vec2::ZERO, Vec2::NEG_Y, &params());
        assert!((plan.target.y + 13.5).abs() < 1e-5);
        assert_eq!(plan.target.x, 0.0);
    }

    proptest! {
        #[test]
        fn prop_stop_distance_law(d in 0.0f32..80.0, safe in 0.0f32..5.0) {
            let p = BlockParams { safe_distance: safe, ..params() };
            let colliders = [point(1, BodyTag::Obstacle, d, false)];
            let plan = resolve_slide(&colliders, ME, Vec2::ZERO, Vec2::X, &p);
            let expected = if d > safe { d - safe } else { 0.0 };
            prop_assert!((plan.target.x - expected).abs() < 1e-4);
            prop_assert!(plan.target.x >= 0.0);
        }
    }
}
