//! Chain-reaction propagation
//!
//! When a slide stops against something, the objects lined up behind it along
//! the same direction get a staggered nudge. This is purely cosmetic: it never
//! changes where the sliding block stops and never touches the moving count.

use glam::Vec2;

use super::raycast::{Collider, RayHit, first_hit};
use super::state::BodyId;
use crate::tuning::ChainTuning;

/// Collect the chain of objects behind `first`, nearest first.
///
/// Starts probing just past the far face of `first` and hops from object to
/// object. `first` and `origin` are never part of the chain. The walk ends at
/// the first non-solid body (a goal), at an empty probe, or after
/// `hop_limit()` probes. Sliding blocks are skipped without being collected.
pub fn propagate_chain<'a, I>(
    colliders: I,
    origin: BodyId,
    ray_origin: Vec2,
    first: &RayHit,
    direction: Vec2,
    tuning: &ChainTuning,
) -> Vec<BodyId>
where
    I: IntoIterator<Item = &'a Collider>,
    I::IntoIter: Clone,
{
    let colliders = colliders.into_iter();
    let mut members = Vec::new();
    let mut exclude = vec![origin, first.id];
    let mut cursor = ray_origin + direction * (first.exit_distance + tuning.probe_offset);

    for _ in 0..tuning.hop_limit() {
        let Some(hit) = first_hit(colliders.clone(), cursor, direction, tuning.probe_length, &exclude)
        else {
            break;
        };
        if !hit.is_solid() {
            break;
        }

        exclude.push(hit.id);
        if !hit.in_motion {
            members.push(hit.id);
        }
        cursor += direction * (hit.exit_distance + tuning.probe_offset);
    }

    members
}
