//! # Sync Bus
//!
//! Ordered, reliable in-process transport between participants and the
//! authority.
//!
//! ```text
//!  ParticipantLink ──┐  intent frames        ┌──► AuthorityEndpoint
//!  ParticipantLink ──┼──────────────────────►│     (single consumer)
//!  ParticipantLink ──┘                       │
//!        ▲   ▲   ▲      confirmation frames  │
//!        └───┴───┴───────────────────────────┘  (fan-out, same order to all)
//! ```
//!
//! Every link gets its own FIFO downlink channel, and the authority is the only
//! writer to those channels. All participants therefore observe one identical
//! confirmation order. Frames are sequenced so duplicates or reordering are
//! discarded on receipt.

mod endpoint;
mod link;

pub use endpoint::{AuthorityEndpoint, BusEvent};
pub use link::{Downlink, ParticipantLink};

use std::sync::Arc;

use concord_shared::ParticipantId;
use crossbeam_channel::{unbounded, Sender};
use parking_lot::RwLock;
use thiserror::Error;

use crate::protocol::MAX_BUFFER_SIZE;

/// Errors raised when sending over the bus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The authority endpoint was dropped.
    #[error("authority endpoint is gone")]
    Disconnected,

    /// Frame did not fit into one packet buffer.
    #[error("frame exceeds {MAX_BUFFER_SIZE} bytes")]
    Oversized,
}

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Participant → authority traffic.
#[derive(Debug)]
pub(crate) enum Uplink {
    Joined(ParticipantId),
    Frame {
        from: ParticipantId,
        bytes: Vec<u8>,
    },
    Left(ParticipantId),
}

/// One connected participant's downlink.
#[derive(Debug)]
pub(crate) struct Subscriber {
    pub(crate) participant: ParticipantId,
    pub(crate) tx: Sender<Arc<[u8]>>,
}

/// Subscriber table shared between the authority and connecting threads.
pub(crate) type SubscriberTable = Arc<RwLock<Vec<Subscriber>>>;

/// Connector for participants. Cheap to clone and safe to share across threads.
#[derive(Clone, Debug)]
pub struct SyncBus {
    uplink_tx: Sender<Uplink>,
    subscribers: SubscriberTable,
}

impl SyncBus {
    /// Opens a bus, returning the connector and the authority's endpoint.
    #[must_use]
    pub fn open() -> (Self, AuthorityEndpoint) {
        let (uplink_tx, uplink_rx) = unbounded();
        let subscribers: SubscriberTable = Arc::new(RwLock::new(Vec::new()));

        let endpoint = AuthorityEndpoint::new(uplink_rx, Arc::clone(&subscribers));
        (
            Self {
                uplink_tx,
                subscribers,
            },
            endpoint,
        )
    }

    /// Connects `participant`, returning its link.
    ///
    /// The authority sees a [`BusEvent::Joined`] and answers with a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Disconnected`] if the authority endpoint is gone.
    pub fn connect(&self, participant: ParticipantId) -> BusResult<ParticipantLink> {
        let (tx, rx) = unbounded();
        self.subscribers.write().push(Subscriber { participant, tx });

        if self.uplink_tx.send(Uplink::Joined(participant)).is_err() {
            self.subscribers
                .write()
                .retain(|s| s.participant != participant);
            return Err(BusError::Disconnected);
        }

        Ok(ParticipantLink::new(
            participant,
            self.uplink_tx.clone(),
            rx,
            Arc::clone(&self.subscribers),
        ))
    }

    /// Number of currently connected participants.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_shared::{Confirmation, Handedness, Intent, ObjectSnapshot};

    #[test]
    fn test_connect_announces_join() {
        let (bus, mut endpoint) = SyncBus::open();
        let _link = bus.connect(ParticipantId(1)).unwrap();

        assert_eq!(bus.participant_count(), 1);
        assert_eq!(endpoint.try_recv(), Some(BusEvent::Joined(ParticipantId(1))));
        assert_eq!(endpoint.try_recv(), None);
    }

    #[test]
    fn test_intent_reaches_authority() {
        let (bus, mut endpoint) = SyncBus::open();
        let mut link = bus.connect(ParticipantId(3)).unwrap();
        let intent = Intent::Pickup {
            participant: ParticipantId(3),
            handedness: Handedness::Right,
        };
        link.send_intent(&intent).unwrap();

        assert_eq!(endpoint.try_recv(), Some(BusEvent::Joined(ParticipantId(3))));
        assert_eq!(
            endpoint.try_recv(),
            Some(BusEvent::Intent {
                from: ParticipantId(3),
                intent,
            })
        );
    }

    #[test]
    fn test_broadcast_same_order_to_all() {
        let (bus, mut endpoint) = SyncBus::open();
        let mut a = bus.connect(ParticipantId(1)).unwrap();
        let mut b = bus.connect(ParticipantId(2)).unwrap();
        for (id, link) in [(1, &mut a), (2, &mut b)] {
            assert!(endpoint.send_snapshot(ParticipantId(id), &ObjectSnapshot::default()));
            assert!(matches!(link.try_recv(), Some(Downlink::Snapshot(_))));
        }

        let first = Confirmation::Pickup {
            participant: ParticipantId(2),
            handedness: Handedness::Left,
        };
        let second = Confirmation::Drop {
            participant: ParticipantId(2),
        };
        assert_eq!(endpoint.broadcast(&first), 2);
        assert_eq!(endpoint.broadcast(&second), 2);

        for link in [&mut a, &mut b] {
            assert_eq!(link.try_recv(), Some(Downlink::Confirmation(first)));
            assert_eq!(link.try_recv(), Some(Downlink::Confirmation(second)));
            assert_eq!(link.try_recv(), None);
        }
    }

    #[test]
    fn test_snapshot_goes_to_one_participant() {
        let (bus, mut endpoint) = SyncBus::open();
        let mut a = bus.connect(ParticipantId(1)).unwrap();
        let mut b = bus.connect(ParticipantId(2)).unwrap();

        let snapshot = ObjectSnapshot {
            held_by: Some(ParticipantId(1)),
            ..Default::default()
        };
        assert!(endpoint.send_snapshot(ParticipantId(2), &snapshot));

        assert_eq!(a.try_recv(), None);
        assert_eq!(b.try_recv(), Some(Downlink::Snapshot(snapshot)));
    }

    #[test]
    fn test_confirmations_before_snapshot_are_discarded() {
        let (bus, mut endpoint) = SyncBus::open();
        let mut link = bus.connect(ParticipantId(2)).unwrap();

        // Broadcast lands between subscribing and the authority seeing the join
        let covered = Confirmation::TogglePin {
            participant: ParticipantId(1),
        };
        assert_eq!(endpoint.broadcast(&covered), 1);
        assert!(!link.is_synced());

        let snapshot = ObjectSnapshot::default();
        assert!(endpoint.send_snapshot(ParticipantId(2), &snapshot));
        let after = Confirmation::Drop {
            participant: ParticipantId(1),
        };
        endpoint.broadcast(&after);

        assert_eq!(
            link.drain(),
            vec![Downlink::Snapshot(snapshot), Downlink::Confirmation(after)]
        );
        assert!(link.is_synced());
    }

    #[test]
    fn test_dropping_link_announces_leave() {
        let (bus, mut endpoint) = SyncBus::open();
        let link = bus.connect(ParticipantId(5)).unwrap();
        drop(link);

        assert_eq!(bus.participant_count(), 0);
        assert_eq!(endpoint.try_recv(), Some(BusEvent::Joined(ParticipantId(5))));
        assert_eq!(endpoint.try_recv(), Some(BusEvent::Left(ParticipantId(5))));
    }

    #[test]
    fn test_connect_after_authority_gone() {
        let (bus, endpoint) = SyncBus::open();
        drop(endpoint);
        assert_eq!(bus.connect(ParticipantId(1)).err(), Some(BusError::Disconnected));
        assert_eq!(bus.participant_count(), 0);
    }
}
