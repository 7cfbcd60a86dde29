// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use super::id::{INVALID, ActorId};
use super::store::{STAGE, Scene};
use crate::dirty;

/// An iterator over the direct children of an actor, back to front.
///
/// Created by [`Scene::children`].
#[derive(Debug)]
pub struct Children<'a> {
    scene: &'a Scene,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(scene: &'a Scene, first: u32) -> Self {
        Self {
            scene,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = ActorId;

    fn next(&mut self) -> Option<ActorId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.scene.next_sibling[idx as usize];
        Some(ActorId {
            idx,
            generation: self.scene.generation[idx as usize],
        })
    }
}

impl Scene {
    /// Returns the paint order of the stage tree: the stage first, then each
    /// container's children back to front, depth-first pre-order.
    ///
    /// Detached actors are not included. Refreshed by
    /// [`update_traversal`](Self::update_traversal).
    #[must_use]
    pub fn traversal_order(&self) -> &[u32] {
        &self.traversal_order
    }

    /// Rebuilds the paint order if the topology changed since the last call.
    ///
    /// Returns `true` if the order was rebuilt.
    pub fn update_traversal(&mut self) -> bool {
        let changed: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        if changed.is_empty() && !self.traversal_order.is_empty() {
            return false;
        }
        self.traversal_order.clear();
        let mut stack = Vec::new();
        stack.push(STAGE);
        while let Some(idx) = stack.pop() {
            self.traversal_order.push(idx);
            // Push children front to back so the back-most pops first.
            let mut child = self.first_child[idx as usize];
            let start = stack.len();
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
            stack[start..].reverse();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use crate::clock::ManualClock;
    use crate::scene::{Scene, SceneConfig};
    use crate::scheduler::NullTimer;

    #[test]
    fn traversal_order_is_depth_first_back_to_front() {
        let mut s = Scene::new(
            SceneConfig::default(),
            Box::new(ManualClock::default()),
            Box::new(NullTimer),
        );
        let stage = s.stage();
        let a = s.create_container();
        let b = s.create_texture_pixmap();
        let c = s.create_texture_pixmap();
        let d = s.create_texture_pixmap();
        s.add_child(stage, a).unwrap();
        s.add_child(stage, c).unwrap();
        s.add_child(a, b).unwrap();
        s.add_child(a, d).unwrap();

        assert!(s.update_traversal());
        assert_eq!(
            s.traversal_order(),
            &[stage.idx, a.idx, b.idx, d.idx, c.idx]
        );
        assert!(!s.update_traversal());
    }

    #[test]
    fn detached_actors_are_not_traversed() {
        let mut s = Scene::new(
            SceneConfig::default(),
            Box::new(ManualClock::default()),
            Box::new(NullTimer),
        );
        let stage = s.stage();
        let loose = s.create_texture_pixmap();
        s.update_traversal();
        assert_eq!(s.traversal_order(), &[stage.idx]);
        assert!(!s.traversal_order().contains(&loose.idx));

        s.add_child(stage, loose).unwrap();
        assert!(s.update_traversal());
        assert_eq!(s.traversal_order(), &[stage.idx, loose.idx]);

        s.remove_from_parent(loose).unwrap();
        assert!(s.update_traversal());
        assert_eq!(s.traversal_order(), &[stage.idx]);
    }
}
