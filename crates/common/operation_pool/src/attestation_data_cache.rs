use std::collections::HashMap;

use parking_lot::Mutex;
use ream_consensus_misc::attestation_data::AttestationData;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    errors::CacheError,
    slot_keyed_store::{CacheKey, SlotKeyed, SlotKeyedStore},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationDataEntry {
    pub key: CacheKey,
    pub data: AttestationData,
}

impl SlotKeyed for AttestationDataEntry {
    fn cache_key(&self) -> CacheKey {
        self.key
    }

    fn is_nil(&self) -> bool {
        false
    }
}

/// Memoizes attestation data per `(slot, committee_index)` and tracks which keys are being
/// computed, so that only one caller computes a given key at a time.
///
/// Entries older than the slot preceding the highest slot seen by [Self::put] are pruned.
#[derive(Debug, Default)]
pub struct AttestationDataCache {
    entries: SlotKeyedStore<AttestationDataEntry>,
    in_progress: Mutex<HashMap<CacheKey, watch::Sender<()>>>,
    highest_slot: Mutex<u64>,
}

impl AttestationDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: CacheKey) -> Option<AttestationData> {
        self.entries.get_by_key(key).pop().map(|entry| entry.data)
    }

    pub fn put(&self, key: CacheKey, data: AttestationData) -> Result<(), CacheError> {
        if data.slot != key.slot {
            return Err(CacheError::SlotMismatch {
                key_slot: key.slot,
                data_slot: data.slot,
            });
        }

        let highest_slot = {
            let mut highest_slot = self.highest_slot.lock();
            *highest_slot = (*highest_slot).max(key.slot);
            *highest_slot
        };

        self.entries.replace(AttestationDataEntry { key, data })?;

        // A late put for an older slot must stay readable by the callers waiting on it, and so
        // must any entry whose key has not been released yet.
        let retain_from = highest_slot.saturating_sub(1).min(key.slot);
        let pruned = {
            let in_progress = self.in_progress.lock();
            self.entries.prune_below_except(retain_from, |pending| {
                in_progress.contains_key(pending)
            })
        };
        if pruned > 0 {
            debug!(retain_from, pruned, "Pruned stale attestation data");
        }

        Ok(())
    }

    /// Claims `key` for computation. Fails with [CacheError::AlreadyInProgress] without
    /// blocking if another caller holds it.
    pub fn mark_in_progress(&self, key: CacheKey) -> Result<(), CacheError> {
        let mut in_progress = self.in_progress.lock();
        if in_progress.contains_key(&key) {
            return Err(CacheError::AlreadyInProgress(key));
        }

        let (sender, _) = watch::channel(());
        in_progress.insert(key, sender);
        Ok(())
    }

    /// Releases `key`, waking every caller waiting on it. Releasing a key that is not held is a
    /// no-op.
    pub fn mark_not_in_progress(&self, key: CacheKey) -> Result<(), CacheError> {
        if self.in_progress.lock().remove(&key).is_none() {
            warn!(
                slot = key.slot,
                committee_index = key.sub_index,
                "Attestation data request was not marked in progress"
            );
        }
        Ok(())
    }

    pub fn is_in_progress(&self, key: CacheKey) -> bool {
        self.in_progress.lock().contains_key(&key)
    }

    /// Returns a receiver whose `changed()` completes with an error once `key` is released, or
    /// `None` if `key` is not in progress.
    pub fn in_progress_waiter(&self, key: CacheKey) -> Option<watch::Receiver<()>> {
        self.in_progress
            .lock()
            .get(&key)
            .map(|sender| sender.subscribe())
    }

    /// Claims `key` and returns a guard that releases it when dropped.
    pub fn begin_compute(&self, key: CacheKey) -> Result<InProgressGuard<'_>, CacheError> {
        self.mark_in_progress(key)?;
        Ok(InProgressGuard { cache: self, key })
    }
}

/// Releases its key on drop, including when the computing future is cancelled or panics.
#[derive(Debug)]
pub struct InProgressGuard<'a> {
    cache: &'a AttestationDataCache,
    key: CacheKey,
}

impl InProgressGuard<'_> {
    pub fn key(&self) -> CacheKey {
        self.key
    }
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.cache.mark_not_in_progress(self.key) {
            warn!("Failed to release attestation data request: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Barrier},
        thread,
    };

    use alloy_primitives::B256;
    use ream_consensus_misc::checkpoint::Checkpoint;
    use tracing_test::traced_test;

    use super::*;

    fn attestation_data(slot: u64, index: u64) -> AttestationData {
        AttestationData {
            slot,
            index,
            beacon_block_root: B256::repeat_byte(slot as u8),
            source: Checkpoint {
                epoch: 1,
                root: B256::repeat_byte(1),
            },
            target: Checkpoint {
                epoch: 2,
                root: B256::repeat_byte(2),
            },
        }
    }

    #[test]
    fn test_get_miss_then_hit() -> Result<(), CacheError> {
        let cache = AttestationDataCache::new();
        let key = CacheKey::new(10, 3);
        assert_eq!(cache.get(key), None);

        cache.put(key, attestation_data(10, 3))?;
        assert_eq!(cache.get(key), Some(attestation_data(10, 3)));
        assert_eq!(cache.get(CacheKey::new(10, 4)), None);
        Ok(())
    }

    #[test]
    fn test_put_replaces_entry() -> Result<(), CacheError> {
        let cache = AttestationDataCache::new();
        let key = CacheKey::new(10, 0);
        let mut data = attestation_data(10, 0);
        cache.put(key, data.clone())?;

        data.beacon_block_root = B256::repeat_byte(0xff);
        cache.put(key, data.clone())?;

        assert_eq!(cache.get(key), Some(data));
        Ok(())
    }

    #[test]
    fn test_put_rejects_slot_mismatch() {
        let cache = AttestationDataCache::new();
        assert_eq!(
            cache.put(CacheKey::new(10, 0), attestation_data(11, 0)),
            Err(CacheError::SlotMismatch {
                key_slot: 10,
                data_slot: 11
            })
        );
    }

    #[test]
    fn test_put_retains_current_and_previous_slot() -> Result<(), CacheError> {
        let cache = AttestationDataCache::new();
        for slot in 1..=4 {
            cache.put(CacheKey::new(slot, 0), attestation_data(slot, 0))?;
        }

        assert_eq!(cache.get(CacheKey::new(1, 0)), None);
        assert_eq!(cache.get(CacheKey::new(2, 0)), None);
        assert!(cache.get(CacheKey::new(3, 0)).is_some());
        assert!(cache.get(CacheKey::new(4, 0)).is_some());
        Ok(())
    }

    #[test]
    fn test_late_put_keeps_newer_and_own_entry() -> Result<(), CacheError> {
        let cache = AttestationDataCache::new();
        cache.put(CacheKey::new(8, 0), attestation_data(8, 0))?;
        cache.put(CacheKey::new(5, 0), attestation_data(5, 0))?;

        assert!(cache.get(CacheKey::new(8, 0)).is_some());
        assert!(cache.get(CacheKey::new(5, 0)).is_some());

        cache.put(CacheKey::new(9, 0), attestation_data(9, 0))?;
        assert_eq!(cache.get(CacheKey::new(5, 0)), None);
        assert!(cache.get(CacheKey::new(8, 0)).is_some());
        Ok(())
    }

    #[test]
    fn test_put_keeps_entry_of_key_still_in_progress() -> Result<(), CacheError> {
        let cache = AttestationDataCache::new();
        cache.put(CacheKey::new(10, 0), attestation_data(10, 0))?;

        let held = CacheKey::new(5, 0);
        let guard = cache.begin_compute(held)?;
        cache.put(held, attestation_data(5, 0))?;

        // another caller finishes a newer slot before the guard is dropped
        cache.put(CacheKey::new(10, 1), attestation_data(10, 1))?;
        assert!(cache.is_in_progress(held));
        assert_eq!(cache.get(held), Some(attestation_data(5, 0)));

        drop(guard);
        assert_eq!(cache.get(held), Some(attestation_data(5, 0)));

        // once released, the next put prunes it
        cache.put(CacheKey::new(11, 0), attestation_data(11, 0))?;
        assert_eq!(cache.get(held), None);
        Ok(())
    }

    #[test]
    fn test_mark_in_progress_is_exclusive() -> Result<(), CacheError> {
        let cache = AttestationDataCache::new();
        let key = CacheKey::new(1, 1);

        cache.mark_in_progress(key)?;
        assert_eq!(
            cache.mark_in_progress(key),
            Err(CacheError::AlreadyInProgress(key))
        );
        // other keys are unaffected
        cache.mark_in_progress(CacheKey::new(1, 2))?;

        cache.mark_not_in_progress(key)?;
        cache.mark_in_progress(key)?;
        Ok(())
    }

    #[test]
    #[traced_test]
    fn test_mark_not_in_progress_is_idempotent() -> Result<(), CacheError> {
        let cache = AttestationDataCache::new();
        let key = CacheKey::new(1, 1);

        cache.mark_in_progress(key)?;
        cache.mark_not_in_progress(key)?;
        cache.mark_not_in_progress(key)?;

        assert!(!cache.is_in_progress(key));
        assert!(logs_contain("was not marked in progress"));
        Ok(())
    }

    #[test]
    fn test_guard_releases_on_drop() -> Result<(), CacheError> {
        let cache = AttestationDataCache::new();
        let key = CacheKey::new(2, 0);
        {
            let guard = cache.begin_compute(key)?;
            assert_eq!(guard.key(), key);
            assert!(cache.is_in_progress(key));
            assert!(matches!(
                cache.begin_compute(key),
                Err(CacheError::AlreadyInProgress(_))
            ));
        }
        assert!(!cache.is_in_progress(key));
        Ok(())
    }

    #[test]
    fn test_guard_releases_on_panic() {
        let cache = Arc::new(AttestationDataCache::new());
        let key = CacheKey::new(2, 0);

        let panicking_cache = cache.clone();
        let result = thread::spawn(move || {
            let _guard = panicking_cache
                .begin_compute(key)
                .expect("key is not in progress");
            panic!("computation failed");
        })
        .join();

        assert!(result.is_err());
        assert!(!cache.is_in_progress(key));
    }

    #[test]
    fn test_exactly_one_concurrent_caller_wins() {
        const CALLERS: usize = 16;
        let cache = Arc::new(AttestationDataCache::new());
        let barrier = Arc::new(Barrier::new(CALLERS));
        let key = CacheKey::new(7, 0);

        let handles = (0..CALLERS)
            .map(|_| {
                let cache = cache.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    cache.mark_in_progress(key)
                })
            })
            .collect::<Vec<_>>();

        let results = handles
            .into_iter()
            .map(|handle| handle.join().expect("caller thread panicked"))
            .collect::<Vec<_>>();

        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter(|result| result.is_err())
                .all(|result| *result == Err(CacheError::AlreadyInProgress(key)))
        );
    }

    #[tokio::test]
    async fn test_waiter_resolves_after_release() -> Result<(), CacheError> {
        let cache = Arc::new(AttestationDataCache::new());
        let key = CacheKey::new(3, 0);
        assert!(cache.in_progress_waiter(key).is_none());

        cache.mark_in_progress(key)?;
        let mut waiter = cache.in_progress_waiter(key).expect("key is in progress");

        let leader = cache.clone();
        tokio::spawn(async move {
            leader
                .put(key, attestation_data(3, 0))
                .expect("slot matches");
            leader.mark_not_in_progress(key).expect("release succeeds");
        });

        assert!(waiter.changed().await.is_err());
        assert_eq!(cache.get(key), Some(attestation_data(3, 0)));
        Ok(())
    }
}
