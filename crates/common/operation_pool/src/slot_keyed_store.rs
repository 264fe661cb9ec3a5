use std::collections::{BTreeSet, HashMap};

use itertools::Itertools;
use parking_lot::RwLock;

use crate::errors::PoolError;

/// Fingerprint of a cacheable unit of work: a slot plus the committee or subcommittee index
/// within that slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CacheKey {
    pub slot: u64,
    pub sub_index: u64,
}

impl CacheKey {
    pub fn new(slot: u64, sub_index: u64) -> Self {
        Self { slot, sub_index }
    }
}

pub trait SlotKeyed {
    fn cache_key(&self) -> CacheKey;

    /// Whether the item carries no payload and must be rejected by [SlotKeyedStore::save].
    fn is_nil(&self) -> bool;
}

/// Thread-safe buckets of items keyed by [CacheKey].
///
/// Items saved under the same key accumulate. When `max_slots` is set, only the buckets of the
/// `max_slots` highest distinct slots are retained.
#[derive(Debug)]
pub struct SlotKeyedStore<V> {
    buckets: RwLock<HashMap<CacheKey, Vec<V>>>,
    max_slots: Option<usize>,
}

impl<V> Default for SlotKeyedStore<V> {
    fn default() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            max_slots: None,
        }
    }
}

impl<V: SlotKeyed + Clone> SlotKeyedStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_slots(max_slots: usize) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            max_slots: Some(max_slots),
        }
    }

    /// Appends `item` to the bucket for its key. Duplicates are kept.
    pub fn save(&self, item: V) -> Result<(), PoolError> {
        if item.is_nil() {
            return Err(PoolError::NilItem);
        }

        let mut buckets = self.buckets.write();
        buckets.entry(item.cache_key()).or_default().push(item);
        self.enforce_retention(&mut buckets);
        Ok(())
    }

    /// Replaces the whole bucket for the item's key with `item`.
    pub fn replace(&self, item: V) -> Result<(), PoolError> {
        if item.is_nil() {
            return Err(PoolError::NilItem);
        }

        let mut buckets = self.buckets.write();
        buckets.insert(item.cache_key(), vec![item]);
        self.enforce_retention(&mut buckets);
        Ok(())
    }

    /// Returns a copy of every item saved for `slot`, ordered by sub-index and then by insertion.
    pub fn get(&self, slot: u64) -> Vec<V> {
        self.buckets
            .read()
            .iter()
            .filter(|(key, _)| key.slot == slot)
            .sorted_by_key(|(key, _)| key.sub_index)
            .flat_map(|(_, items)| items.iter().cloned())
            .collect()
    }

    pub fn get_by_key(&self, key: CacheKey) -> Vec<V> {
        self.buckets.read().get(&key).cloned().unwrap_or_default()
    }

    /// Drops every bucket whose slot is strictly lower than `slot`, returning the number of
    /// items removed.
    pub fn prune_below(&self, slot: u64) -> usize {
        self.prune_below_except(slot, |_| false)
    }

    /// Like [Self::prune_below], but keeps any bucket whose key satisfies `keep_key`.
    pub fn prune_below_except(&self, slot: u64, keep_key: impl Fn(&CacheKey) -> bool) -> usize {
        let mut removed = 0;
        self.buckets.write().retain(|key, items| {
            let keep = key.slot >= slot || keep_key(key);
            if !keep {
                removed += items.len();
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.buckets.read().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn slots(&self) -> Vec<u64> {
        self.buckets
            .read()
            .keys()
            .map(|key| key.slot)
            .unique()
            .sorted()
            .collect()
    }

    fn enforce_retention(&self, buckets: &mut HashMap<CacheKey, Vec<V>>) {
        let Some(max_slots) = self.max_slots else {
            return;
        };

        let slots: BTreeSet<u64> = buckets.keys().map(|key| key.slot).collect();
        let excess = slots.len().saturating_sub(max_slots);
        if excess == 0 {
            return;
        }

        // The lowest slots go first, even when that is the slot just saved.
        let evicted: BTreeSet<u64> = slots.into_iter().take(excess).collect();
        buckets.retain(|key, _| !evicted.contains(&key.slot));
    }
}
