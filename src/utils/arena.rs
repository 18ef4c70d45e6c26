//! Generational storage for collider façades.
//!
//! Handles stay cheap and `Copy`; the generation counter makes ids from a
//! destroyed collider resolve to `None` instead of aliasing a reused slot.

use serde::{Deserialize, Serialize};

/// Stable handle to a collider owned by a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColliderId {
    index: u32,
    generation: u32,
}

impl ColliderId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Packs the id into 64 bits for engine user-data tagging.
    pub(crate) fn to_bits(self) -> u64 {
        (self.index as u64) << 32 | self.generation as u64
    }

    pub(crate) fn from_bits(bits: u64) -> Self {
        Self {
            index: (bits >> 32) as u32,
            generation: bits as u32,
        }
    }
}

struct Slot<T> {
    item: Option<T>,
    generation: u32,
}

/// Generational arena handing out [`ColliderId`]s.
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn insert(&mut self, item: T) -> ColliderId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.item = Some(item);
            return ColliderId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            item: Some(item),
            generation: 0,
        });
        ColliderId::new(index, 0)
    }

    pub fn get(&self, id: ColliderId) -> Option<&T> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.item.as_ref()
    }

    pub fn get_mut(&mut self, id: ColliderId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.item.as_mut()
    }

    pub fn remove(&mut self, id: ColliderId) -> Option<T> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() || slot.item.is_none() {
            return None;
        }
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index() as u32);
        slot.item.take()
    }

    pub fn contains(&self, id: ColliderId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = ColliderId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.item
                .as_ref()
                .map(|_| ColliderId::new(index as u32, slot.generation))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.item.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(|slot| slot.item.as_mut())
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.item.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_id_resolves_to_none() {
        let mut arena = Arena::new();
        let id = arena.insert("a");
        assert_eq!(arena.get(id), Some(&"a"));

        arena.remove(id);
        assert!(arena.get(id).is_none());

        let reused = arena.insert("b");
        assert_eq!(reused.index(), id.index());
        assert_ne!(reused.generation(), id.generation());
        assert!(arena.get(id).is_none());
        assert_eq!(arena.get(reused), Some(&"b"));
    }

    #[test]
    fn id_round_trips_through_bits() {
        let id = ColliderId::new(7, 3);
        assert_eq!(ColliderId::from_bits(id.to_bits()), id);
    }
}
