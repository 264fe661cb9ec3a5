pub mod attestation;
pub mod attestation_data_cache;
pub mod errors;
pub mod slot_keyed_store;
pub mod sync_committee;

use attestation::AggregateAttestationPool;
use sync_committee::{SyncCommitteeContributionPool, SyncCommitteeMessagePool};

/// The pools fed by validator submissions.
#[derive(Debug, Default)]
pub struct OperationPool {
    pub sync_committee_contributions: SyncCommitteeContributionPool,
    pub sync_committee_messages: SyncCommitteeMessagePool,
    pub aggregate_attestations: AggregateAttestationPool,
}

impl OperationPool {
    // Messages and contributions are pruned together so an aggregate never pairs fresh
    // contributions with stale messages.
    pub fn on_slot(&self, slot: u64) {
        self.sync_committee_contributions.on_slot(slot);
        self.sync_committee_messages.on_slot(slot);
        self.aggregate_attestations.on_slot(slot);
    }
}
