//! Slot-indexed character storage
//!
//! Characters live in a fixed arena keyed by player slot. Anything that needs
//! to find a character later holds a [`CharacterHandle`]; the generation in the
//! handle makes it go stale as soon as the slot is reused.

use glam::Vec2;

use super::character::Character;
use super::core::{CoreWorld, PeerCore, PHYS_SIZE};
use super::math::closest_point_on_line;
use super::MAX_CLIENTS;

/// Weak reference to a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharacterHandle {
    pub slot: usize,
    pub generation: u32,
}

#[derive(Debug, Default)]
struct Entry {
    generation: u32,
    character: Option<Box<Character>>,
}

#[derive(Debug)]
pub struct CharacterArena {
    entries: Vec<Entry>,
}

impl Default for CharacterArena {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterArena {
    pub fn new() -> Self {
        Self {
            entries: (0..MAX_CLIENTS).map(|_| Entry::default()).collect(),
        }
    }

    /// Store a new character, invalidating handles to whatever was there
    pub fn insert(&mut self, slot: usize, character: Character) -> Option<CharacterHandle> {
        let entry = self.entries.get_mut(slot)?;
        entry.generation = entry.generation.wrapping_add(1);
        entry.character = Some(Box::new(character));
        Some(CharacterHandle {
            slot,
            generation: entry.generation,
        })
    }

    pub fn remove(&mut self, slot: usize) -> Option<Box<Character>> {
        self.entries.get_mut(slot)?.character.take()
    }

    pub fn get(&self, slot: usize) -> Option<&Character> {
        self.entries.get(slot)?.character.as_deref()
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Character> {
        self.entries.get_mut(slot)?.character.as_deref_mut()
    }

    /// Follow a handle; `None` if the character is gone or was replaced
    pub fn resolve(&self, handle: CharacterHandle) -> Option<&Character> {
        let entry = self.entries.get(handle.slot)?;
        if entry.generation != handle.generation {
            return None;
        }
        entry.character.as_deref()
    }

    /// Lift a character out so it can mutate the rest of the world. The slot
    /// keeps its generation; put it back with [`CharacterArena::restore`].
    pub fn take(&mut self, slot: usize) -> Option<Box<Character>> {
        self.remove(slot)
    }

    pub fn restore(&mut self, slot: usize, character: Box<Character>) {
        if let Some(entry) = self.entries.get_mut(slot) {
            entry.character = Some(character);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.entries.iter().filter_map(|e| e.character.as_deref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Character> {
        self.entries.iter_mut().filter_map(|e| e.character.as_deref_mut())
    }

    /// Slots currently holding a character
    pub fn occupied(&self) -> Vec<usize> {
        self.iter().map(Character::slot).collect()
    }

    /// Characters whose body overlaps a circle
    pub fn find_in_radius(&self, pos: Vec2, radius: f32) -> Vec<usize> {
        self.iter()
            .filter(|c| c.is_alive() && c.pos().distance(pos) < radius + PHYS_SIZE)
            .map(Character::slot)
            .collect()
    }

    /// First character touched by the segment `from..to`, widened by
    /// `radius`, with the point of contact
    pub fn intersect_character(
        &self,
        from: Vec2,
        to: Vec2,
        radius: f32,
        exclude: Option<usize>,
    ) -> Option<(usize, Vec2)> {
        let mut closest_len = from.distance(to) * 100.0;
        let mut found = None;

        for c in self.iter() {
            if !c.is_alive() || Some(c.slot()) == exclude {
                continue;
            }
            let point = closest_point_on_line(from, to, c.pos());
            if c.pos().distance(point) < PHYS_SIZE + radius {
                let len = from.distance(point);
                if len < closest_len {
                    closest_len = len;
                    found = Some((c.slot(), point));
                }
            }
        }

        found
    }
}

/// Slot table of weak handles to every live core
#[derive(Debug, Clone, Default)]
pub struct CoreTable {
    handles: [Option<CharacterHandle>; MAX_CLIENTS],
}

impl CoreTable {
    pub fn bind(&mut self, handle: CharacterHandle) {
        if let Some(entry) = self.handles.get_mut(handle.slot) {
            *entry = Some(handle);
        }
    }

    pub fn clear(&mut self, slot: usize) {
        if let Some(entry) = self.handles.get_mut(slot) {
            *entry = None;
        }
    }

    pub fn get(&self, slot: usize) -> Option<CharacterHandle> {
        self.handles.get(slot).copied().flatten()
    }

    pub fn is_bound(&self, slot: usize) -> bool {
        self.get(slot).is_some()
    }

    /// Snapshot the bound cores into a read-only peer view. Stale handles and
    /// characters currently lifted out of the arena are skipped.
    pub fn world(&self, arena: &CharacterArena) -> CoreWorld {
        let mut world = CoreWorld::default();
        for handle in self.handles.iter().flatten() {
            if let Some(c) = arena.resolve(*handle) {
                world.set(
                    handle.slot,
                    PeerCore {
                        pos: c.core().pos,
                        vel: c.core().vel,
                    },
                );
            }
        }
        world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_go_stale_when_slot_is_reused() {
        let mut arena = CharacterArena::new();
        let first = arena.insert(2, Character::new(2, Vec2::ZERO)).unwrap();
        assert!(arena.resolve(first).is_some());

        arena.remove(2);
        assert!(arena.resolve(first).is_none());

        let second = arena.insert(2, Character::new(2, Vec2::ZERO)).unwrap();
        assert!(arena.resolve(first).is_none());
        assert!(arena.resolve(second).is_some());
        assert!(arena.insert(MAX_CLIENTS, Character::new(0, Vec2::ZERO)).is_none());
    }

    #[test]
    fn taken_character_keeps_its_handle() {
        let mut arena = CharacterArena::new();
        let h = arena.insert(1, Character::new(1, Vec2::ZERO)).unwrap();
        let c = arena.take(1).unwrap();
        assert!(arena.resolve(h).is_none());
        arena.restore(1, c);
        assert!(arena.resolve(h).is_some());
    }

    #[test]
    fn core_world_skips_cleared_and_stale_slots() {
        let mut arena = CharacterArena::new();
        let mut table = CoreTable::default();
        let a = arena.insert(0, Character::new(0, Vec2::new(10.0, 0.0))).unwrap();
        let b = arena.insert(1, Character::new(1, Vec2::new(20.0, 0.0))).unwrap();
        table.bind(a);
        table.bind(b);
        table.clear(1);

        let world = table.world(&arena);
        assert_eq!(world.get(0).map(|p| p.pos), Some(Vec2::new(10.0, 0.0)));
        assert!(world.get(1).is_none());

        arena.insert(0, Character::new(0, Vec2::ZERO));
        assert!(table.world(&arena).get(0).is_none());
    }

    #[test]
    fn segment_finds_nearest_character() {
        let mut arena = CharacterArena::new();
        arena.insert(0, Character::new(0, Vec2::new(100.0, 0.0)));
        arena.insert(1, Character::new(1, Vec2::new(50.0, 10.0)));
        arena.insert(2, Character::new(2, Vec2::new(300.0, 300.0)));

        let hit = arena.intersect_character(Vec2::ZERO, Vec2::new(200.0, 0.0), 0.0, None);
        assert_eq!(hit.map(|(s, _)| s), Some(1));
        let hit = arena.intersect_character(Vec2::ZERO, Vec2::new(200.0, 0.0), 0.0, Some(1));
        assert_eq!(hit.map(|(s, _)| s), Some(0));

        let mut near = arena.find_in_radius(Vec2::new(60.0, 0.0), 14.0);
        near.sort_unstable();
        assert_eq!(near, vec![0, 1]);
    }
}
