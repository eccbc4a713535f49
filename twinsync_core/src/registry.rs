//! Generation-checked object registry
//!
//! Nodes of the comparison tree refer to each other (parent links, move links,
//! UI selections) through [`ObjectId`]s handed out by a [`Registry`]. A slot's
//! generation is bumped whenever its node is removed, so an id that outlived its
//! node simply fails to resolve instead of pointing at whatever reuses the slot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_REGISTRY_TAG: AtomicU32 = AtomicU32::new(1);

/// Non-owning, identity-safe reference to a registered node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    registry: u32,
    index: u32,
    generation: u32,
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}v{}", self.registry, self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Arena of live objects addressed by [`ObjectId`]
///
/// Not internally synchronized: shared access for readers, exclusive access for
/// the single writer, as enforced by the borrow checker.
#[derive(Debug)]
pub struct Registry<T> {
    tag: u32,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            tag: NEXT_REGISTRY_TAG.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Id the next call to [`insert`](Self::insert) will return
    pub fn next_id(&self) -> ObjectId {
        match self.free.last() {
            Some(&index) => ObjectId {
                registry: self.tag,
                index,
                generation: self.slots[index as usize].generation,
            },
            None => ObjectId {
                registry: self.tag,
                index: self.slots.len() as u32,
                generation: 0,
            },
        }
    }

    pub fn insert(&mut self, value: T) -> ObjectId {
        let id = self.next_id();
        match self.free.pop() {
            Some(index) => self.slots[index as usize].value = Some(value),
            None => self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            }),
        }
        self.len += 1;
        id
    }

    /// Deregisters the object; every copy of `id` stops resolving
    pub fn remove(&mut self, id: ObjectId) -> Option<T> {
        let slot = self.slot_mut(id)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, id: ObjectId) -> Option<&T> {
        if id.registry != self.tag {
            return None;
        }
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut T> {
        self.slot_mut(id)?.value.as_mut()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slot_mut(&mut self, id: ObjectId) -> Option<&mut Slot<T>> {
        if id.registry != self.tag {
            return None;
        }
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        Some(slot)
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
