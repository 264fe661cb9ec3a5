use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ream_consensus_misc::attestation_data::AttestationData;
use ream_metrics::{ATTESTATION_DATA_CACHE_REQUESTS, HIT, MISS, WAIT, inc_int_counter_vec};
use ream_operation_pool::{
    attestation_data_cache::{AttestationDataCache, InProgressGuard},
    errors::CacheError,
    slot_keyed_store::CacheKey,
};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error};

use crate::config::ValidatorApiConfig;

#[async_trait]
pub trait AttestationDataProvider: Send + Sync {
    /// Computes attestation data for `slot` and `committee_index` from the head state. This may
    /// run a state transition.
    async fn compute_attestation_data(
        &self,
        slot: u64,
        committee_index: u64,
    ) -> anyhow::Result<AttestationData>;
}

#[derive(Error, Debug)]
pub enum AttestationDataError {
    #[error("Failed to compute attestation data: {0}")]
    Compute(anyhow::Error),

    /// The caller computing this key released it without storing a result.
    #[error("A request was in progress and resolved to nil")]
    ResolvedToNil,

    #[error("Timed out after {0:?} waiting for an in progress attestation data request")]
    InProgressTimeout(Duration),

    #[error("Attestation data cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Serves attestation data so that concurrent requests for the same `(slot, committee_index)`
/// share a single computation.
pub struct AttestationDataService {
    cache: Arc<AttestationDataCache>,
    provider: Arc<dyn AttestationDataProvider>,
    in_progress_timeout: Duration,
}

impl AttestationDataService {
    pub fn new(
        cache: Arc<AttestationDataCache>,
        provider: Arc<dyn AttestationDataProvider>,
        config: &ValidatorApiConfig,
    ) -> Self {
        Self {
            cache,
            provider,
            in_progress_timeout: config.in_progress_timeout(),
        }
    }

    pub async fn get_attestation_data(
        &self,
        slot: u64,
        committee_index: u64,
    ) -> Result<AttestationData, AttestationDataError> {
        let key = CacheKey::new(slot, committee_index);
        if let Some(attestation_data) = self.cache.get(key) {
            debug!(slot, committee_index, "Attestation data cache hit");
            inc_int_counter_vec(&ATTESTATION_DATA_CACHE_REQUESTS, &[HIT]);
            return Ok(attestation_data);
        }

        match self.cache.begin_compute(key) {
            Ok(guard) => {
                inc_int_counter_vec(&ATTESTATION_DATA_CACHE_REQUESTS, &[MISS]);
                self.compute_and_store(guard).await
            }
            Err(CacheError::AlreadyInProgress(_)) => {
                inc_int_counter_vec(&ATTESTATION_DATA_CACHE_REQUESTS, &[WAIT]);
                self.wait_for_in_progress(key).await
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn compute_and_store(
        &self,
        guard: InProgressGuard<'_>,
    ) -> Result<AttestationData, AttestationDataError> {
        let key = guard.key();
        debug!(
            slot = key.slot,
            committee_index = key.sub_index,
            "Computing attestation data"
        );

        let attestation_data = self
            .provider
            .compute_attestation_data(key.slot, key.sub_index)
            .await
            .map_err(AttestationDataError::Compute)?;
        self.cache.put(key, attestation_data.clone())?;

        // The result must be visible before waiting callers are released.
        drop(guard);
        Ok(attestation_data)
    }

    async fn wait_for_in_progress(
        &self,
        key: CacheKey,
    ) -> Result<AttestationData, AttestationDataError> {
        // No waiter means the computing caller already finished.
        if let Some(mut waiter) = self.cache.in_progress_waiter(key) {
            // `changed` fails once the computing caller releases the key.
            if timeout(self.in_progress_timeout, waiter.changed())
                .await
                .is_err()
            {
                return Err(AttestationDataError::InProgressTimeout(
                    self.in_progress_timeout,
                ));
            }
        }

        self.cache.get(key).ok_or_else(|| {
            error!(
                slot = key.slot,
                committee_index = key.sub_index,
                "A request was in progress and resolved to nil"
            );
            AttestationDataError::ResolvedToNil
        })
    }
}
