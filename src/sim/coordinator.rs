//! Movement bookkeeping shared by every block in a simulation
//!
//! Owned by the simulation and handed to blocks by `&mut`, never global, so
//! independent simulations (and tests) don't interfere.

use std::collections::BTreeSet;

use super::state::BodyId;

/// Registry of live blocks plus the in-flight slide counter
#[derive(Debug, Clone, Default)]
pub struct MovementCoordinator {
    /// Every live block
    registry: BTreeSet<BodyId>,
    /// Blocks currently sliding
    animating: BTreeSet<BodyId>,
    /// Number of in-flight slides (always `animating.len()`)
    moving_count: u32,
}

impl MovementCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_block(&mut self, id: BodyId) {
        if !self.registry.insert(id) {
            log::warn!("Block {id} registered twice");
        }
    }

    /// Remove a block from the registry. A block that is still animating is
    /// settled first so the counter can't leak.
    pub fn unregister_block(&mut self, id: BodyId) {
        if self.animating.contains(&id) {
            self.slide_ended(id);
        }
        self.registry.remove(&id);
    }

    /// Record the start of a slide. Returns false if the block was already
    /// animating (the counter is left alone).
    pub fn slide_started(&mut self, id: BodyId) -> bool {
        debug_assert!(self.registry.contains(&id), "slide started on unregistered block {id}");
        if !self.animating.insert(id) {
            return false;
        }
        self.moving_count += 1;
        true
    }

    /// Record the end of a slide (settle, stop or consumption).
    ///
    /// Ending a slide that was never started is a bookkeeping defect: it trips a
    /// debug assertion and is otherwise ignored, so the counter can't underflow.
    pub fn slide_ended(&mut self, id: BodyId) -> bool {
        if !self.animating.remove(&id) {
            log::error!("Slide ended for {id}, which was not moving (count {})", self.moving_count);
            debug_assert!(false, "slide ended for non-moving block {id}");
            return false;
        }
        debug_assert!(self.moving_count > 0, "moving count underflow");
        self.moving_count -= 1;
        true
    }

    /// Number of blocks currently mid-slide
    #[inline]
    pub fn moving_count(&self) -> u32 {
        self.moving_count
    }

    /// True when no block is mid-slide
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.moving_count == 0
    }

    pub fn is_animating(&self, id: BodyId) -> bool {
        self.animating.contains(&id)
    }

    pub fn is_registered(&self, id: BodyId) -> bool {
        self.registry.contains(&id)
    }

    pub fn registered(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.registry.iter().copied()
    }

    /// Registered blocks that are not sliding (targets of the idle lockout)
    pub fn idle_blocks(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.registry
            .iter()
            .copied()
            .filter(|id| !self.animating.contains(id))
    }

    /// Forget everything (level reset)
    pub fn clear(&mut self) {
        self.registry.clear();
        self.animating.clear();
        self.moving_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_start_and_end() {
        let mut coord = MovementCoordinator::new();
        coord.register_block(BodyId(1));
        coord.register_block(BodyId(2));

        assert!(coord.slide_started(BodyId(1)));
        assert!(coord.slide_started(BodyId(2)));
        assert_eq!(coord.moving_count(), 2);

        // Starting again doesn't double count
        assert!(!coord.slide_started(BodyId(1)));
        assert_eq!(coord.moving_count(), 2);

        assert!(coord.slide_ended(BodyId(1)));
        assert!(coord.slide_ended(BodyId(2)));
        assert!(coord.is_idle());
    }

    #[test]
    #[should_panic(expected = "non-moving block")]
    fn test_double_end_is_a_defect() {
        let mut coord = MovementCoordinator::new();
        coord.register_block(BodyId(1));
        coord.slide_started(BodyId(1));
        coord.slide_ended(BodyId(1));
        coord.slide_ended(BodyId(1));
    }

    #[test]
    fn test_idle_blocks_excludes_animating() {
        let mut coord = MovementCoordinator::new();
        for i in 1..=3 {
            coord.register_block(BodyId(i));
        }
        coord.slide_started(BodyId(2));
        let idle: Vec<_> = coord.idle_blocks().collect();
        assert_eq!(idle, vec![BodyId(1), BodyId(3)]);
    }

    #[test]
    fn test_unregister_while_animating_settles() {
        let mut coord = MovementCoordinator::new();
        coord.register_block(BodyId(7));
        coord.slide_started(BodyId(7));
        coord.unregister_block(BodyId(7));
        assert!(coord.is_idle());
        assert!(!coord.is_registered(BodyId(7)));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Start(u32),
        End(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0u32..4).prop_map(Op::Start), (0u32..4).prop_map(Op::End)]
    }

    proptest! {
        /// Guarded the way blocks guard it (only end what was started), the
        /// counter always equals the number of animating blocks.
        #[test]
        fn prop_counter_matches_animating(ops in prop::collection::vec(op(), 0..64)) {
            let mut coord = MovementCoordinator::new();
            for i in 0..4 {
                coord.register_block(BodyId(i));
            }
            for op in ops {
                match op {
                    Op::Start(i) => {
                        coord.slide_started(BodyId(i));
                    }
                    Op::End(i) => {
                        if coord.is_animating(BodyId(i)) {
                            coord.slide_ended(BodyId(i));
                        }
                    }
                }
                let animating = (0..4).filter(|&i| coord.is_animating(BodyId(i))).count();
                prop_assert_eq!(coord.moving_count() as usize, animating);
            }
            for i in 0..4 {
                if coord.is_animating(BodyId(i)) {
                    coord.slide_ended(BodyId(i));
                }
            }
            prop_assert_eq!(coord.moving_count(), 0);
        }
    }
}
