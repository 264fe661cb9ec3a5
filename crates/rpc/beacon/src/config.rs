use std::{fs::File, num::NonZeroUsize, path::Path, time::Duration};

use ream_storage::cache::{REGISTRATION_CACHE_SIZE, RegistrationCache};
use serde::{Deserialize, Serialize};

use crate::events::EventNotifier;

pub const IN_PROGRESS_TIMEOUT_MS: u64 = 4_000;
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorApiConfig {
    /// How long a caller waits on another caller's attestation data computation before giving
    /// up.
    pub in_progress_timeout_ms: u64,
    pub registration_cache_size: NonZeroUsize,
    pub event_channel_capacity: usize,
}

impl ValidatorApiConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    pub fn in_progress_timeout(&self) -> Duration {
        Duration::from_millis(self.in_progress_timeout_ms)
    }

    pub fn registration_cache(&self) -> RegistrationCache {
        RegistrationCache::new(self.registration_cache_size)
    }

    pub fn event_notifier(&self) -> EventNotifier {
        EventNotifier::new(self.event_channel_capacity)
    }
}

impl Default for ValidatorApiConfig {
    fn default() -> Self {
        Self {
            in_progress_timeout_ms: IN_PROGRESS_TIMEOUT_MS,
            registration_cache_size: NonZeroUsize::new(REGISTRATION_CACHE_SIZE)
                .expect("Invalid cache size"),
            event_channel_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}
