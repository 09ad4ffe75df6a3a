//! Directional ray casts against body footprints
//!
//! The slide resolver and the chain propagator both ask the same question:
//! what lies ahead of this point along this direction, and in what order?

use glam::Vec2;

use super::geom::Footprint;
use super::state::{BodyId, BodyTag};

/// A body as seen by a ray cast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub id: BodyId,
    pub tag: BodyTag,
    pub footprint: Footprint,
    /// Block currently sliding (transparent to other blocks' rays)
    pub in_motion: bool,
}

/// One intersection along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub id: BodyId,
    pub tag: BodyTag,
    pub in_motion: bool,
    /// Distance from the origin to the contact point
    pub distance: f32,
    /// Where the ray enters the footprint
    pub point: Vec2,
    /// Distance from the origin to where the ray leaves the footprint
    pub exit_distance: f32,
}

impl RayHit {
    /// Whether this hit can stop a slide (or continue a chain)
    #[inline]
    pub fn is_solid(&self) -> bool {
        matches!(self.tag, BodyTag::Block | BodyTag::Obstacle)
    }
}

/// Cast a ray and return every hit within `max_distance`, nearest first.
///
/// Equal distances are ordered by body id so results don't depend on
/// collider order. Colliders that contain the origin, and ids in `exclude`,
/// are skipped.
pub fn cast_ray<'a, I>(
    colliders: I,
    origin: Vec2,
    dir: Vec2,
    max_distance: f32,
    exclude: &[BodyId],
) -> Vec<RayHit>
where
    I: IntoIterator<Item = &'a Collider>,
{
    if max_distance < 0.0 {
        return Vec::new();
    }

    let mut hits: Vec<RayHit> = colliders
        .into_iter()
        .filter(|c| !exclude.contains(&c.id))
        .filter_map(|c| {
            let (enter, exit) = c.footprint.ray_span(origin, dir)?;
            // Starting inside a footprint doesn't count as hitting it
            if enter < 0.0 || enter > max_distance {
                return None;
            }
            Some(RayHit {
                id: c.id,
                tag: c.tag,
                in_motion: c.in_motion,
                distance: enter,
                point: origin + dir * enter,
                exit_distance: exit,
            })
        })
        .collect();

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
    hits
}

/// Nearest hit only
pub fn first_hit<'a, I>(
    colliders: I,
    origin: Vec2,
    dir: Vec2,
    max_distance: f32,
    exclude: &[BodyId],
) -> Option<RayHit>
where
    I: IntoIterator<Item = &'a Collider>,
{
    cast_ray(colliders, origin, dir, max_distance, exclude)
        .into_iter()
        .next()
}
