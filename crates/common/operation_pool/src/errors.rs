use thiserror::Error;

use crate::slot_keyed_store::CacheKey;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Nil item provided to the store")]
    NilItem,

    #[error("Nil sync committee contribution")]
    NilContribution,

    #[error("Nil sync committee message")]
    NilMessage,

    #[error("Nil aggregate attestation")]
    NilAttestation,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Another caller is computing the value for this key. Callers retry instead of failing.
    #[error("Attestation data request for slot {} committee {} is already in progress", .0.slot, .0.sub_index)]
    AlreadyInProgress(CacheKey),

    #[error("Attestation data for slot {data_slot} cannot be cached under slot {key_slot}")]
    SlotMismatch { key_slot: u64, data_slot: u64 },

    #[error("Failed to store attestation data: {0}")]
    Store(#[from] PoolError),
}
