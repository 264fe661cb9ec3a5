use std::{
    cmp::Reverse,
    collections::{BTreeMap, btree_map::Entry},
};

use alloy_primitives::B256;
use anyhow::anyhow;
use ream_consensus_misc::{
    constants::beacon::{SYNC_COMMITTEE_SUBNET_COUNT, SYNC_SUBCOMMITTEE_SIZE},
    sync_committee::{SyncAggregate, SyncCommitteeContribution, SyncCommitteeMessage},
};
use ream_metrics::{OPERATION_POOL_ITEMS, set_int_gauge_vec};
use ream_post_quantum_crypto::PQSignature;
use ssz_types::{BitVector, VariableList};
use tracing::warn;

use crate::{
    errors::PoolError,
    slot_keyed_store::{CacheKey, SlotKeyed, SlotKeyedStore},
};

/// Number of distinct slots the sync committee pools hold on to.
pub const SYNC_COMMITTEE_MAX_SLOTS: usize = 4;

const CONTRIBUTION_POOL: &str = "sync_committee_contributions";
const MESSAGE_POOL: &str = "sync_committee_messages";

impl SlotKeyed for SyncCommitteeContribution {
    fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.slot, self.subcommittee_index)
    }

    fn is_nil(&self) -> bool {
        self.is_empty()
    }
}

impl SlotKeyed for SyncCommitteeMessage {
    /// Subcommittee membership is derived elsewhere, so messages are keyed by slot alone.
    fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.slot, 0)
    }

    fn is_nil(&self) -> bool {
        self.is_empty()
    }
}

#[derive(Debug)]
pub struct SyncCommitteeContributionPool {
    contributions: SlotKeyedStore<SyncCommitteeContribution>,
}

impl Default for SyncCommitteeContributionPool {
    fn default() -> Self {
        Self {
            contributions: SlotKeyedStore::with_max_slots(SYNC_COMMITTEE_MAX_SLOTS),
        }
    }
}

impl SyncCommitteeContributionPool {
    pub fn save_contribution(
        &self,
        contribution: SyncCommitteeContribution,
    ) -> Result<(), PoolError> {
        self.contributions.save(contribution).map_err(|err| match err {
            PoolError::NilItem => PoolError::NilContribution,
            err => err,
        })?;
        set_int_gauge_vec(
            &OPERATION_POOL_ITEMS,
            self.contributions.len() as i64,
            &[CONTRIBUTION_POOL],
        );
        Ok(())
    }

    pub fn contributions_for_slot(&self, slot: u64) -> Vec<SyncCommitteeContribution> {
        self.contributions.get(slot)
    }

    pub fn on_slot(&self, slot: u64) {
        self.contributions.prune_below(slot.saturating_sub(1));
        set_int_gauge_vec(
            &OPERATION_POOL_ITEMS,
            self.contributions.len() as i64,
            &[CONTRIBUTION_POOL],
        );
    }

    /// Assembles the sync aggregate for a block at `slot` building on `beacon_block_root`.
    ///
    /// Each participant's signature is taken from the first contribution that covers it, with
    /// contributions visited by subcommittee and then by descending participation. Contributions
    /// whose signature count does not match their participation bits are skipped.
    pub fn produce_sync_aggregate(
        &self,
        slot: u64,
        beacon_block_root: B256,
    ) -> anyhow::Result<SyncAggregate> {
        let mut contributions = self
            .contributions_for_slot(slot)
            .into_iter()
            .filter(|contribution| contribution.beacon_block_root == beacon_block_root)
            .collect::<Vec<_>>();
        contributions.sort_by_key(|contribution| {
            (
                contribution.subcommittee_index,
                Reverse(contribution.aggregation_bits.num_set_bits()),
            )
        });

        let mut participants: BTreeMap<usize, PQSignature> = BTreeMap::new();
        for contribution in contributions {
            if contribution.subcommittee_index >= SYNC_COMMITTEE_SUBNET_COUNT {
                warn!(
                    slot,
                    subcommittee_index = contribution.subcommittee_index,
                    "Skipping contribution with out of range subcommittee index"
                );
                continue;
            }

            let set_bits = contribution
                .aggregation_bits
                .iter()
                .enumerate()
                .filter_map(|(index, bit)| bit.then_some(index))
                .collect::<Vec<_>>();
            if set_bits.len() != contribution.signatures.len() {
                warn!(
                    slot,
                    subcommittee_index = contribution.subcommittee_index,
                    bits = set_bits.len(),
                    signatures = contribution.signatures.len(),
                    "Skipping contribution with mismatched signatures"
                );
                continue;
            }

            let offset = (contribution.subcommittee_index * SYNC_SUBCOMMITTEE_SIZE) as usize;
            for (bit, signature) in set_bits.into_iter().zip(contribution.signatures.iter()) {
                if let Entry::Vacant(entry) = participants.entry(offset + bit) {
                    entry.insert(signature.clone());
                }
            }
        }

        let mut sync_committee_bits = BitVector::new();
        for position in participants.keys() {
            sync_committee_bits
                .set(*position, true)
                .map_err(|err| anyhow!("Failed to set sync committee bit {position}: {err:?}"))?;
        }

        Ok(SyncAggregate {
            sync_committee_bits,
            sync_committee_signatures: VariableList::new(participants.into_values().collect())
                .map_err(|err| anyhow!("Too many sync committee signatures: {err:?}"))?,
        })
    }
}

#[derive(Debug)]
pub struct SyncCommitteeMessagePool {
    messages: SlotKeyedStore<SyncCommitteeMessage>,
}

impl Default for SyncCommitteeMessagePool {
    fn default() -> Self {
        Self {
            messages: SlotKeyedStore::with_max_slots(SYNC_COMMITTEE_MAX_SLOTS),
        }
    }
}

impl SyncCommitteeMessagePool {
    pub fn save_message(&self, message: SyncCommitteeMessage) -> Result<(), PoolError> {
        self.messages.save(message).map_err(|err| match err {
            PoolError::NilItem => PoolError::NilMessage,
            err => err,
        })?;
        set_int_gauge_vec(
            &OPERATION_POOL_ITEMS,
            self.messages.len() as i64,
            &[MESSAGE_POOL],
        );
        Ok(())
    }

    pub fn messages_for_slot(&self, slot: u64) -> Vec<SyncCommitteeMessage> {
        self.messages.get(slot)
    }

    pub fn on_slot(&self, slot: u64) {
        self.messages.prune_below(slot.saturating_sub(1));
        set_int_gauge_vec(
            &OPERATION_POOL_ITEMS,
            self.messages.len() as i64,
            &[MESSAGE_POOL],
        );
    }
}
