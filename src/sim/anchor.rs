//! Anchor points ropes can pin their head to
//!
//! Anchors are owned by the application (a zombie's spine bone, a weapon tip).
//! Ropes only hold an [`AnchorId`] and poll the position every step, so a
//! removed anchor simply stops resolving.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable identifier for an anchor in an [`Anchors`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorId(pub u32);

/// Anything that can report the current world position of an anchor
pub trait AnchorSource {
    /// Current position, or `None` if the anchor no longer exists
    fn anchor_position(&self, id: AnchorId) -> Option<Vec2>;
}

/// Arena of anchor positions (sorted by id for deterministic iteration)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Anchors {
    entries: Vec<(AnchorId, Vec2)>,
    next_id: u32,
}

impl Anchors {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Add an anchor at `pos`
    pub fn insert(&mut self, pos: Vec2) -> AnchorId {
        // Default-constructed arenas start at 0; skip it so ids stay non-zero
        self.next_id = self.next_id.max(1);
        let id = AnchorId(self.next_id);
        self.next_id += 1;
        // Ids are monotonic, so pushing keeps the list sorted
        self.entries.push((id, pos));
        id
    }

    /// Move an existing anchor. Returns false if it was removed.
    pub fn set_position(&mut self, id: AnchorId, pos: Vec2) -> bool {
        match self.index_of(id) {
            Some(i) => {
                self.entries[i].1 = pos;
                true
            }
            None => false,
        }
    }

    /// Destroy an anchor; attached ropes detach on their next step
    pub fn remove(&mut self, id: AnchorId) -> Option<Vec2> {
        self.index_of(id).map(|i| self.entries.remove(i).1)
    }

    pub fn get(&self, id: AnchorId) -> Option<Vec2> {
        self.index_of(id).map(|i| self.entries[i].1)
    }

    pub fn contains(&self, id: AnchorId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnchorId, Vec2)> + '_ {
        self.entries.iter().copied()
    }

    fn index_of(&self, id: AnchorId) -> Option<usize> {
        self.entries.binary_search_by_key(&id, |(k, _)| *k).ok()
    }
}

impl AnchorSource for Anchors {
    fn anchor_position(&self, id: AnchorId) -> Option<Vec2> {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_move_remove() {
        let mut anchors = Anchors::new();
        let a = anchors.insert(Vec2::new(1.0, 2.0));
        let b = anchors.insert(Vec2::ZERO);
        assert_ne!(a, b);
        assert_eq!(anchors.len(), 2);

        assert!(anchors.set_position(a, Vec2::new(3.0, 4.0)));
        assert_eq!(anchors.anchor_position(a), Some(Vec2::new(3.0, 4.0)));

        assert_eq!(anchors.remove(a), Some(Vec2::new(3.0, 4.0)));
        assert_eq!(anchors.anchor_position(a), None);
        assert!(!anchors.set_position(a, Vec2::ONE));
        assert!(anchors.contains(b));
    }

    #[test]
    fn test_default_arena_ids_are_nonzero() {
        let mut anchors = Anchors::default();
        let id = anchors.insert(Vec2::ZERO);
        assert_eq!(id, AnchorId(1));
    }

    #[test]
    fn test_removed_ids_are_not_reused() {
        let mut anchors = Anchors::new();
        let a = anchors.insert(Vec2::ZERO);
        anchors.remove(a);
        let b = anchors.insert(Vec2::ONE);
        assert_ne!(a, b);
        assert_eq!(anchors.anchor_position(a), None);
    }
}
