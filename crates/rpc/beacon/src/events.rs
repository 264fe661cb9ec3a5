use ream_consensus_misc::{
    attestation::SignedAggregateAndProof,
    sync_committee::{SignedContributionAndProof, SyncCommitteeMessage},
};
use tokio::sync::broadcast;
use tracing::trace;

/// Operations accepted into the pool and published to the network.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationEvent {
    ContributionAndProof(Box<SignedContributionAndProof>),
    SyncCommitteeMessage(Box<SyncCommitteeMessage>),
    AggregateAndProof(Box<SignedAggregateAndProof>),
}

impl OperationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OperationEvent::ContributionAndProof(_) => "contribution_and_proof",
            OperationEvent::SyncCommitteeMessage(_) => "sync_committee_message",
            OperationEvent::AggregateAndProof(_) => "aggregate_and_proof",
        }
    }
}

pub trait Notifier: Send + Sync + 'static {
    fn emit(&self, event: OperationEvent);
}

pub struct EventNotifier {
    sender: broadcast::Sender<OperationEvent>,
}

impl EventNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OperationEvent> {
        self.sender.subscribe()
    }
}

impl Notifier for EventNotifier {
    fn emit(&self, event: OperationEvent) {
        let name = event.name();
        if self.sender.send(event).is_err() {
            trace!(event = name, "No subscribers for operation event");
        }
    }
}
