//! Rope instance pool
//!
//! Ropes are allocated once and recycled. Handles carry a generation so a
//! handle kept past its release can never reach the next user's rope.

use serde::{Deserialize, Serialize};

use super::rope::RopeSolver;

/// What kind of pooled object to acquire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PoolKey {
    #[default]
    Rope,
}

/// Generational reference to a pooled rope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RopeHandle {
    index: u32,
    generation: u32,
}

impl RopeHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }
}

/// Source of reusable rope instances
pub trait Pool {
    /// Hand out a reset rope, or `None` if exhausted or the key is unknown
    fn acquire(&mut self, key: PoolKey) -> Option<RopeHandle>;
    /// Return a rope. Stale handles are ignored.
    fn release(&mut self, handle: RopeHandle);
    fn get(&self, handle: RopeHandle) -> Option<&RopeSolver>;
    fn get_mut(&mut self, handle: RopeHandle) -> Option<&mut RopeSolver>;
}

#[derive(Debug, Clone)]
struct Slot {
    rope: RopeSolver,
    generation: u32,
    in_use: bool,
}

/// Fixed-capacity arena of ropes for a single [`PoolKey`]
#[derive(Debug, Clone)]
pub struct RopePool {
    key: PoolKey,
    slots: Vec<Slot>,
    /// Free slot indices (popped from the back)
    free: Vec<u32>,
    rope_capacity: usize,
    max_instances: usize,
}

impl RopePool {
    /// `rope_capacity` particles per rope, at most `max_instances` ropes live
    pub fn new(key: PoolKey, rope_capacity: usize, max_instances: usize) -> Self {
        Self {
            key,
            slots: Vec::with_capacity(max_instances),
            free: Vec::with_capacity(max_instances),
            rope_capacity,
            max_instances,
        }
    }

    pub fn key(&self) -> PoolKey {
        self.key
    }

    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    /// Allocate ropes ahead of time so spawning never allocates
    pub fn prewarm(&mut self, count: usize) {
        let target = count.min(self.max_instances);
        while self.slots.len() < target {
            self.push_slot();
        }
        log::debug!("Prewarmed rope pool to {} instances", self.slots.len());
    }

    /// Ropes that can still be acquired (allocated or not)
    pub fn available_count(&self) -> usize {
        self.free.len() + (self.max_instances - self.slots.len())
    }

    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Handles of every rope currently checked out, in slot order
    pub fn live_handles(&self) -> impl Iterator<Item = RopeHandle> + '_ {
        self.slots.iter().enumerate().filter(|(_, s)| s.in_use).map(|(i, s)| RopeHandle {
            index: i as u32,
            generation: s.generation,
        })
    }

    pub fn live(&self) -> impl Iterator<Item = &RopeSolver> + '_ {
        self.slots.iter().filter(|s| s.in_use).map(|s| &s.rope)
    }

    pub fn live_mut(&mut self) -> impl Iterator<Item = &mut RopeSolver> + '_ {
        self.slots.iter_mut().filter(|s| s.in_use).map(|s| &mut s.rope)
    }

    fn push_slot(&mut self) -> u32 {
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            rope: RopeSolver::new(self.rope_capacity),
            generation: 0,
            in_use: false,
        });
        self.free.push(index);
        index
    }

    fn slot(&self, handle: RopeHandle) -> Option<&Slot> {
        self.slots
            .get(handle.index())
            .filter(|s| s.in_use && s.generation == handle.generation)
    }

    fn slot_mut(&mut self, handle: RopeHandle) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.in_use && s.generation == handle.generation)
    }
}

impl Pool for RopePool {
    fn acquire(&mut self, key: PoolKey) -> Option<RopeHandle> {
        if key != self.key {
            log::debug!("Pool for {:?} cannot serve {:?}", self.key, key);
            return None;
        }
        if self.free.is_empty() {
            if self.slots.len() >= self.max_instances {
                log::debug!("Rope pool exhausted ({} live)", self.live_count());
                return None;
            }
            self.push_slot();
        }

        let index = self.free.pop()?;
        let slot = &mut self.slots[index as usize];
        slot.in_use = true;
        Some(RopeHandle {
            index,
            generation: slot.generation,
        })
    }

    fn release(&mut self, handle: RopeHandle) {
        let Some(slot) = self.slot_mut(handle) else {
            log::warn!("Ignoring release of stale rope handle {:?}", handle);
            return;
        };
        slot.rope.reset();
        slot.in_use = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
    }

    fn get(&self, handle: RopeHandle) -> Option<&RopeSolver> {
        self.slot(handle).map(|s| &s.rope)
    }

    fn get_mut(&mut self, handle: RopeHandle) -> Option<&mut RopeSolver> {
        self.slot_mut(handle).map(|s| &mut s.rope)
    }
}
