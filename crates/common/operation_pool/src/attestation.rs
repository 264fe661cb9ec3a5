use ream_consensus_misc::{attestation::Attestation, constants::beacon::SLOTS_PER_EPOCH};
use ream_metrics::{OPERATION_POOL_ITEMS, set_int_gauge_vec};

use crate::{
    errors::PoolError,
    slot_keyed_store::{CacheKey, SlotKeyed, SlotKeyedStore},
};

const AGGREGATE_POOL: &str = "aggregate_attestations";

impl SlotKeyed for Attestation {
    fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.data.slot, self.data.index)
    }

    fn is_nil(&self) -> bool {
        self.is_empty()
    }
}

/// Aggregated attestations received from aggregators, bucketed by `(slot, committee_index)`.
#[derive(Debug, Default)]
pub struct AggregateAttestationPool {
    aggregates: SlotKeyedStore<Attestation>,
}

impl AggregateAttestationPool {
    pub fn save_aggregate(&self, aggregate: Attestation) -> Result<(), PoolError> {
        self.aggregates.save(aggregate).map_err(|err| match err {
            PoolError::NilItem => PoolError::NilAttestation,
            err => err,
        })?;
        set_int_gauge_vec(
            &OPERATION_POOL_ITEMS,
            self.aggregates.len() as i64,
            &[AGGREGATE_POOL],
        );
        Ok(())
    }

    pub fn aggregates_for_slot(&self, slot: u64) -> Vec<Attestation> {
        self.aggregates.get(slot)
    }

    pub fn aggregates_for_committee(&self, slot: u64, committee_index: u64) -> Vec<Attestation> {
        self.aggregates.get_by_key(CacheKey::new(slot, committee_index))
    }

    /// Aggregates stay includable for an epoch after their slot.
    pub fn on_slot(&self, slot: u64) {
        self.aggregates.prune_below(slot.saturating_sub(SLOTS_PER_EPOCH));
        set_int_gauge_vec(
            &OPERATION_POOL_ITEMS,
            self.aggregates.len() as i64,
            &[AGGREGATE_POOL],
        );
    }
}
