use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use ream_consensus_misc::validator_registration::ValidatorRegistration;

use crate::registration::RegistrationError;

pub const REGISTRATION_CACHE_SIZE: usize = 1_024;

/// In-memory LRU of validator registrations, consulted before the database.
#[derive(Debug)]
pub struct RegistrationCache {
    registrations: Mutex<LruCache<u64, ValidatorRegistration>>,
}

impl RegistrationCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            registrations: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn registration_by_index(
        &self,
        validator_index: u64,
    ) -> Result<ValidatorRegistration, RegistrationError> {
        self.registrations
            .lock()
            .get(&validator_index)
            .cloned()
            .ok_or(RegistrationError::NotFound(validator_index))
    }

    pub fn update_registrations(
        &self,
        registrations: impl IntoIterator<Item = (u64, ValidatorRegistration)>,
    ) {
        let mut cache = self.registrations.lock();
        for (validator_index, registration) in registrations {
            cache.put(validator_index, registration);
        }
    }

    pub fn len(&self) -> usize {
        self.registrations.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RegistrationCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(REGISTRATION_CACHE_SIZE).expect("Invalid cache size"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_cache_evicts_least_recently_used() {
        let cache = RegistrationCache::new(NonZeroUsize::new(2).expect("Invalid cache size"));
        cache.update_registrations([
            (1, ValidatorRegistration::default()),
            (2, ValidatorRegistration::default()),
        ]);

        // touch 1 so that 2 is evicted next
        assert!(cache.registration_by_index(1).is_ok());
        cache.update_registrations([(3, ValidatorRegistration::default())]);

        assert_eq!(cache.len(), 2);
        assert!(cache.registration_by_index(1).is_ok());
        assert!(matches!(
            cache.registration_by_index(2),
            Err(RegistrationError::NotFound(2))
        ));
    }
}
