//! Per-observer snapshot buffers

use serde::{Deserialize, Serialize};

use crate::net::NetCharacter;

/// Items one snapshot can hold before allocation starts failing
pub const DEFAULT_SNAPSHOT_CAPACITY: usize = 64;

/// Who a snapshot is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observer {
    /// A connected client
    Client(usize),
    /// Demo recorder or server-side view; sees everything
    Global,
}

impl Observer {
    pub fn slot(self) -> Option<usize> {
        match self {
            Observer::Client(slot) => Some(slot),
            Observer::Global => None,
        }
    }
}

/// One snapshot item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum SnapItem {
    Character { id: usize, data: NetCharacter },
}

/// Fixed-capacity item buffer filled during a snap pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotBuffer {
    pub tick: i32,
    pub observer: Observer,
    capacity: usize,
    items: Vec<SnapItem>,
}

impl SnapshotBuffer {
    pub fn new(tick: i32, observer: Observer) -> Self {
        Self::with_capacity(tick, observer, DEFAULT_SNAPSHOT_CAPACITY)
    }

    pub fn with_capacity(tick: i32, observer: Observer, capacity: usize) -> Self {
        Self {
            tick,
            observer,
            capacity,
            items: Vec::with_capacity(capacity),
        }
    }

    /// Allocate a zeroed character record, or `None` when the buffer is full
    pub fn new_character(&mut self, id: usize) -> Option<&mut NetCharacter> {
        if self.items.len() >= self.capacity {
            return None;
        }
        self.items.push(SnapItem::Character {
            id,
            data: NetCharacter::default(),
        });
        match self.items.last_mut() {
            Some(SnapItem::Character { data, .. }) => Some(data),
            None => None,
        }
    }

    pub fn items(&self) -> &[SnapItem] {
        &self.items
    }

    pub fn character(&self, id: usize) -> Option<&NetCharacter> {
        self.items.iter().find_map(|item| match item {
            SnapItem::Character { id: i, data } if *i == id => Some(data),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_fails_when_full() {
        let mut buf = SnapshotBuffer::with_capacity(10, Observer::Global, 1);
        buf.new_character(0).expect("room").health = 7;
        assert!(buf.new_character(1).is_none());
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.character(0).map(|c| c.health), Some(7));
        assert!(buf.character(1).is_none());
    }

    #[test]
    fn observer_slots() {
        assert_eq!(Observer::Client(4).slot(), Some(4));
        assert_eq!(Observer::Global.slot(), None);
    }
}
