//==================================================
// File: plugin/arena.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Generational handle storage
// Objective: Hand out index/generation handles that go stale once released
//==================================================

//! Generational arena backing the plugin handle table.

use std::fmt;
use std::marker::PhantomData;

/// Handle returned by the arena allocator. A released slot bumps its generation,
/// so stale handles never alias a newer entry.
pub struct ArenaHandle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ArenaHandle<T> {
    fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u32,
            generation,
            _marker: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T> Clone for ArenaHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaHandle<T> {}

impl<T> PartialEq for ArenaHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for ArenaHandle<T> {}

impl<T> std::hash::Hash for ArenaHandle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for ArenaHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaHandle({}v{})", self.index, self.generation)
    }
}

impl<T> fmt::Display for ArenaHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug)]
pub struct Arena<T> {
    entries: Vec<Slot<T>>,
    free: Vec<usize>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn allocate(&mut self, value: T) -> ArenaHandle<T> {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.entries[index];
            slot.value = Some(value);
            return ArenaHandle::new(index, slot.generation);
        }
        let handle = ArenaHandle::new(self.entries.len(), 0);
        self.entries.push(Slot {
            generation: 0,
            value: Some(value),
        });
        handle
    }

    pub fn get(&self, handle: ArenaHandle<T>) -> Option<&T> {
        self.entries
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn remove(&mut self, handle: ArenaHandle<T>) -> Option<T> {
        let slot = self.entries.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        self.live -= 1;
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
