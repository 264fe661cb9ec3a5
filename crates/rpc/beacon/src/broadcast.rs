use std::fmt;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GossipTopicKind {
    BeaconAggregateAndProof,
    SyncCommitteeContributionAndProof,
    SyncCommittee(u64),
}

impl fmt::Display for GossipTopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GossipTopicKind::BeaconAggregateAndProof => write!(f, "beacon_aggregate_and_proof"),
            GossipTopicKind::SyncCommitteeContributionAndProof => {
                write!(f, "sync_committee_contribution_and_proof")
            }
            GossipTopicKind::SyncCommittee(subnet_id) => write!(f, "sync_committee_{subnet_id}"),
        }
    }
}

/// An SSZ encoded operation addressed to a gossip topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GossipMessage {
    pub topic: GossipTopicKind,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait Broadcaster: Send + Sync + 'static {
    async fn broadcast(&self, message: GossipMessage) -> anyhow::Result<()>;
}

/// Hands messages to the network service through an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster(pub mpsc::UnboundedSender<GossipMessage>);

#[async_trait]
impl Broadcaster for ChannelBroadcaster {
    async fn broadcast(&self, message: GossipMessage) -> anyhow::Result<()> {
        trace!(topic = %message.topic, "Sending gossip message to network");
        self.0
            .send(message)
            .map_err(|err| anyhow!("Network channel closed, dropped message on {}", err.0.topic))
    }
}
