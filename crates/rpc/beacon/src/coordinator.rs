use std::sync::Arc;

use ream_consensus_misc::{
    attestation::SignedAggregateAndProof,
    constants::beacon::SYNC_COMMITTEE_SUBNET_COUNT,
    sync_committee::{SignedContributionAndProof, SyncCommitteeMessage},
};
use ream_metrics::{AGGREGATION_SUBMISSIONS, FAILURE, SUCCESS, inc_int_counter_vec};
use ream_operation_pool::{OperationPool, errors::PoolError};
use ssz::Encode;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    broadcast::{Broadcaster, GossipMessage, GossipTopicKind},
    events::{Notifier, OperationEvent},
};

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Failed to save to operation pool: {0}")]
    Pool(#[from] PoolError),

    #[error("Invalid sync committee subnet id: {0}")]
    InvalidSubnet(u64),

    #[error("Failed to broadcast: {0}")]
    Broadcast(anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Publishes validator submissions to the network and records them in the local pools.
///
/// The broadcast and the pool save are independent. Neither is rolled back when the other
/// fails.
pub struct AggregationCoordinator {
    operation_pool: Arc<OperationPool>,
    broadcaster: Arc<dyn Broadcaster>,
    notifier: Arc<dyn Notifier>,
}

impl AggregationCoordinator {
    pub fn new(
        operation_pool: Arc<OperationPool>,
        broadcaster: Arc<dyn Broadcaster>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            operation_pool,
            broadcaster,
            notifier,
        }
    }

    pub async fn submit_contribution_and_proof(
        &self,
        signed_contribution: SignedContributionAndProof,
    ) -> Result<(), SubmissionError> {
        let message = GossipMessage {
            topic: GossipTopicKind::SyncCommitteeContributionAndProof,
            data: signed_contribution.as_ssz_bytes(),
        };
        let contribution = signed_contribution.message.contribution.clone();
        self.submit_and_broadcast(
            message,
            || {
                self.operation_pool
                    .sync_committee_contributions
                    .save_contribution(contribution)
            },
            OperationEvent::ContributionAndProof(Box::new(signed_contribution)),
        )
        .await
    }

    pub async fn submit_sync_committee_message(
        &self,
        subnet_id: u64,
        message: SyncCommitteeMessage,
    ) -> Result<(), SubmissionError> {
        if subnet_id >= SYNC_COMMITTEE_SUBNET_COUNT {
            return Err(SubmissionError::InvalidSubnet(subnet_id));
        }

        let gossip_message = GossipMessage {
            topic: GossipTopicKind::SyncCommittee(subnet_id),
            data: message.as_ssz_bytes(),
        };
        let pooled = message.clone();
        self.submit_and_broadcast(
            gossip_message,
            || {
                self.operation_pool
                    .sync_committee_messages
                    .save_message(pooled)
            },
            OperationEvent::SyncCommitteeMessage(Box::new(message)),
        )
        .await
    }

    pub async fn submit_aggregate_and_proof(
        &self,
        signed_aggregate: SignedAggregateAndProof,
    ) -> Result<(), SubmissionError> {
        let message = GossipMessage {
            topic: GossipTopicKind::BeaconAggregateAndProof,
            data: signed_aggregate.as_ssz_bytes(),
        };
        let aggregate = signed_aggregate.message.aggregate.clone();
        self.submit_and_broadcast(
            message,
            || {
                self.operation_pool
                    .aggregate_attestations
                    .save_aggregate(aggregate)
            },
            OperationEvent::AggregateAndProof(Box::new(signed_aggregate)),
        )
        .await
    }

    /// Starts the broadcast, saves to the pool, then waits for the broadcast.
    ///
    /// A save error is returned without waiting on the broadcast, which keeps running. The
    /// notifier fires only when both succeed.
    async fn submit_and_broadcast<F>(
        &self,
        message: GossipMessage,
        save: F,
        event: OperationEvent,
    ) -> Result<(), SubmissionError>
    where
        F: FnOnce() -> Result<(), PoolError>,
    {
        let kind = event.name();
        let topic = message.topic;
        let broadcaster = self.broadcaster.clone();
        let broadcast_handle = tokio::spawn(async move { broadcaster.broadcast(message).await });

        if let Err(err) = save() {
            warn!(kind, ?err, "Failed to save submission to operation pool");
            inc_int_counter_vec(&AGGREGATION_SUBMISSIONS, &[kind, FAILURE]);
            return Err(err.into());
        }

        let broadcast_result = match broadcast_handle.await {
            Ok(result) => result.map_err(SubmissionError::Broadcast),
            Err(err) => Err(SubmissionError::Internal(format!(
                "Broadcast task failed: {err}"
            ))),
        };
        if let Err(err) = broadcast_result {
            warn!(kind, %topic, ?err, "Failed to broadcast submission");
            inc_int_counter_vec(&AGGREGATION_SUBMISSIONS, &[kind, FAILURE]);
            return Err(err);
        }

        debug!(kind, %topic, "Submission saved and broadcast");
        inc_int_counter_vec(&AGGREGATION_SUBMISSIONS, &[kind, SUCCESS]);
        self.notifier.emit(event);
        Ok(())
    }
}
