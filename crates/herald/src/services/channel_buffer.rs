//! Bounded per-channel ring buffer with in-place upsert.

use std::collections::VecDeque;

use crate::domain::entities::{ChatMessageRecord, EmbedRecord};

/// Records addressable by a stable id
pub trait Keyed {
    fn key(&self) -> &str;
}

impl Keyed for EmbedRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Keyed for ChatMessageRecord {
    fn key(&self) -> &str {
        &self.id
    }
}

/// What an upsert did to the buffer
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert<T> {
    /// Existing record replaced, position unchanged
    Replaced,
    /// Appended; carries the record evicted to make room, if any
    Inserted { evicted: Option<T> },
}

#[derive(Debug, Clone)]
pub struct ChannelBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T: Keyed + Clone> ChannelBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.key() == id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.key() == id)
    }

    /// Replace in place if the id is present, else append and evict the oldest.
    pub fn upsert(&mut self, record: T) -> Upsert<T> {
        if let Some(slot) = self.items.iter_mut().find(|item| item.key() == record.key()) {
            *slot = record;
            return Upsert::Replaced;
        }

        self.items.push_back(record);
        let evicted = if self.items.len() > self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        Upsert::Inserted { evicted }
    }

    /// Append only if the id is not yet present.
    pub fn insert_new(&mut self, record: T) -> bool {
        if self.contains(record.key()) {
            return false;
        }
        let _ = self.upsert(record);
        true
    }

    /// Ordered copy, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embed(id: usize) -> EmbedRecord {
        EmbedRecord::new(id.to_string(), "chan")
    }

    fn ids(buffer: &ChannelBuffer<EmbedRecord>) -> Vec<String> {
        buffer.snapshot().into_iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_evicts_oldest_past_capacity() {
        let mut buffer = ChannelBuffer::new(50);
        for i in 0..50 {
            assert!(matches!(
                buffer.upsert(embed(i)),
                Upsert::Inserted { evicted: None }
            ));
        }
        match buffer.upsert(embed(50)) {
            Upsert::Inserted { evicted: Some(e) } => assert_eq!(e.id, "0"),
            other => panic!("unexpected {other:?}"),
        }

        let expected: Vec<String> = (1..=50).map(|i| i.to_string()).collect();
        assert_eq!(ids(&buffer), expected);
    }

    #[test]
    fn test_upsert_keeps_position() {
        let mut buffer = ChannelBuffer::new(5);
        for i in 0..3 {
            let _ = buffer.upsert(embed(i));
        }
        let updated = embed(1).with_title("edited");
        assert_eq!(buffer.upsert(updated), Upsert::Replaced);

        assert_eq!(ids(&buffer), vec!["0", "1", "2"]);
        assert_eq!(buffer.get("1").unwrap().title.as_deref(), Some("edited"));
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_insert_new_ignores_known_ids() {
        let mut buffer = ChannelBuffer::new(5);
        assert!(buffer.insert_new(embed(1)));
        assert!(!buffer.insert_new(embed(1).with_title("dup")));
        assert_eq!(buffer.get("1").unwrap().title, None);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut buffer = ChannelBuffer::new(0);
        let _ = buffer.upsert(embed(1));
        let _ = buffer.upsert(embed(2));
        assert_eq!(ids(&buffer), vec!["2"]);
    }
}
