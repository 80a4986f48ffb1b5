//! Notifications for external observers
//!
//! Events are published after the corresponding state change is committed,
//! exactly once per successful mutation.

use ballot_common::{Identity, Phase};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Ballot events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum VotingEvent {
    VoterRegistered { voter: Identity },
    PhaseChanged { phase: Phase },
    VoteCasted { voter: Identity, candidate_index: u64 },
}

/// Broadcast fan-out of [`VotingEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<VotingEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VotingEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of subscribers reached; zero is fine
    pub fn publish(&self, event: VotingEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                trace!(?event, "No event subscribers");
                0
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::EVENT_CHANNEL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = VotingEvent::PhaseChanged {
            phase: Phase::Voting,
        };
        assert_eq!(bus.publish(event.clone()), 1);
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(
            bus.publish(VotingEvent::PhaseChanged {
                phase: Phase::Ended
            }),
            0
        );
    }

    #[test]
    fn test_event_json() {
        let json = serde_json::to_value(VotingEvent::VoteCasted {
            voter: Identity::from_bytes([3u8; 32]),
            candidate_index: 1,
        })
        .unwrap();
        assert_eq!(json["event"], "VoteCasted");
        assert_eq!(json["candidate_index"], 1);
    }
}
