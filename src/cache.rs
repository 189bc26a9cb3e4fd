//! Memoization of rendered diffs.
//!
//! Keys only sample the inputs: their lengths plus their first and last [`SAMPLE_CHARS`] chars.
//! Each entry also keeps the texts it was computed from, and a lookup whose texts differ from the
//! stored ones is a miss, so two inputs that agree on the samples never share a result.

use std::{
    collections::{HashMap, VecDeque},
    hash::Hash,
};

use parking_lot::Mutex;

use crate::render::RenderMode;

pub const SAMPLE_CHARS: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContentKey {
    original_len: usize,
    modified_len: usize,
    samples: [String; 4],
    mode: RenderMode,
}

fn head(text: &str) -> String {
    text.chars().take(SAMPLE_CHARS).collect()
}

fn tail(text: &str) -> String {
    let mut tail: Vec<char> = text.chars().rev().take(SAMPLE_CHARS).collect();
    tail.reverse();
    tail.into_iter().collect()
}

impl ContentKey {
    pub fn new(original: &str, modified: &str, mode: RenderMode) -> ContentKey {
        ContentKey {
            original_len: original.len(),
            modified_len: modified.len(),
            samples: [head(original), tail(original), head(modified), tail(modified)],
            mode,
        }
    }
}

/// A bounded map that forgets its oldest entry first.
pub struct DiffCache<V> {
    capacity: usize,
    inner: Mutex<CacheInner<V>>,
}

struct Entry<V> {
    original: String,
    modified: String,
    value: V,
}

struct CacheInner<V> {
    entries: HashMap<ContentKey, Entry<V>>,
    order: VecDeque<ContentKey>,
}

impl<V: Clone> DiffCache<V> {
    pub fn new(capacity: usize) -> DiffCache<V> {
        DiffCache {
            capacity,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, original: &str, modified: &str, mode: RenderMode) -> Option<V> {
        let key = ContentKey::new(original, modified, mode);
        let inner = self.inner.lock();
        let entry = inner.entries.get(&key)?;
        (entry.original == original && entry.modified == modified).then(|| entry.value.clone())
    }

    /// Stores `value` for the two texts. An entry with the same key but other texts is replaced.
    pub fn insert(&self, original: &str, modified: &str, mode: RenderMode, value: V) {
        if self.capacity == 0 {
            return;
        }
        let key = ContentKey::new(original, modified, mode);
        let entry = Entry {
            original: original.to_owned(),
            modified: modified.to_owned(),
            value,
        };
        let mut inner = self.inner.lock();
        if inner.entries.insert(key.clone(), entry).is_some() {
            return;
        }
        inner.order.push_back(key);
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn evicts_oldest() {
        let cache = DiffCache::new(2);
        for text in ["a", "b", "c"] {
            cache.insert(text, text, RenderMode::Line, text.to_owned());
        }
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a", "a", RenderMode::Line), None);
        assert_eq!(cache.get("c", "c", RenderMode::Line).as_deref(), Some("c"));
    }

    #[test]
    fn reinserting_keeps_position() {
        let cache = DiffCache::new(2);
        cache.insert("a", "", RenderMode::Line, 1);
        cache.insert("b", "", RenderMode::Line, 2);
        cache.insert("a", "", RenderMode::Line, 3);
        cache.insert("c", "", RenderMode::Line, 4);
        assert_eq!(cache.get("a", "", RenderMode::Line), None);
        assert_eq!(cache.get("b", "", RenderMode::Line), Some(2));
    }

    #[test]
    fn mode_is_part_of_the_key() {
        assert_ne!(
            ContentKey::new("x", "y", RenderMode::Line),
            ContentKey::new("x", "y", RenderMode::Inline)
        );
        let cache = DiffCache::new(2);
        cache.insert("x", "y", RenderMode::Line, 1);
        assert_eq!(cache.get("x", "y", RenderMode::Inline), None);
    }

    #[test]
    fn keys_only_sample_the_middle() {
        let middle = |c: char| format!("{}{}{}", "h".repeat(150), c, "t".repeat(150));
        assert_eq!(
            ContentKey::new(&middle('1'), "", RenderMode::Line),
            ContentKey::new(&middle('2'), "", RenderMode::Line)
        );
        assert_ne!(
            ContentKey::new(&middle('1'), "", RenderMode::Line),
            ContentKey::new(&middle('가'), "", RenderMode::Line)
        );
    }

    #[test]
    fn same_samples_with_other_middle_miss() {
        let middle = |c: char| format!("{}{}{}", "h".repeat(150), c, "t".repeat(150));
        let (first, second) = (middle('1'), middle('2'));
        let cache = DiffCache::new(4);
        cache.insert(&first, &first, RenderMode::Line, "first");
        assert_eq!(cache.get(&first, &first, RenderMode::Line), Some("first"));
        assert_eq!(cache.get(&first, &second, RenderMode::Line), None);

        cache.insert(&first, &second, RenderMode::Line, "second");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&first, &second, RenderMode::Line), Some("second"));
        assert_eq!(cache.get(&first, &first, RenderMode::Line), None);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let cache = DiffCache::new(0);
        cache.insert("a", "b", RenderMode::Line, ());
        assert!(cache.is_empty());
    }
}
