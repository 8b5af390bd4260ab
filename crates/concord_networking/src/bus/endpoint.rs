//! Authority side of the bus.

use std::collections::HashMap;
use std::sync::Arc;

use concord_shared::{Confirmation, Intent, ObjectSnapshot, ParticipantId};
use crossbeam_channel::Receiver;

use super::{SubscriberTable, Uplink};
use crate::protocol::{
    Packet, PacketDeserializer, PacketHeader, PacketSerializer, SequenceCheck, SequenceCounter,
    SequenceNumber, SequenceTracker,
};

/// Event delivered to the authority.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusEvent {
    /// A participant connected.
    Joined(ParticipantId),
    /// A decoded, in-sequence intent.
    Intent {
        /// Link the frame arrived on.
        from: ParticipantId,
        /// The request.
        intent: Intent,
    },
    /// A participant's link closed.
    Left(ParticipantId),
}

/// The single consumer of intents and the single producer of confirmations.
pub struct AuthorityEndpoint {
    uplink_rx: Receiver<Uplink>,
    subscribers: SubscriberTable,
    serializer: PacketSerializer,
    broadcast_sequence: SequenceCounter,
    last_broadcast: SequenceNumber,
    inbound: HashMap<ParticipantId, SequenceTracker>,
}

impl AuthorityEndpoint {
    pub(super) fn new(uplink_rx: Receiver<Uplink>, subscribers: SubscriberTable) -> Self {
        Self {
            uplink_rx,
            subscribers,
            serializer: PacketSerializer::new(),
            broadcast_sequence: SequenceCounter::new(),
            last_broadcast: 0,
            inbound: HashMap::new(),
        }
    }

    /// Next pending event, or `None` when the uplink is empty.
    ///
    /// Undecodable, spoofed and stale frames are logged and skipped.
    pub fn try_recv(&mut self) -> Option<BusEvent> {
        loop {
            match self.uplink_rx.try_recv().ok()? {
                Uplink::Joined(participant) => {
                    self.inbound.insert(participant, SequenceTracker::new());
                    return Some(BusEvent::Joined(participant));
                }
                Uplink::Left(participant) => {
                    self.inbound.remove(&participant);
                    return Some(BusEvent::Left(participant));
                }
                Uplink::Frame { from, bytes } => {
                    if let Some(intent) = self.decode_intent(from, &bytes) {
                        return Some(BusEvent::Intent { from, intent });
                    }
                }
            }
        }
    }

    /// Drains every pending event.
    pub fn drain(&mut self) -> Vec<BusEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    fn decode_intent(&mut self, from: ParticipantId, bytes: &[u8]) -> Option<Intent> {
        let Some(Packet::Intent(header, intent)) = PacketDeserializer::new(bytes).deserialize()
        else {
            tracing::warn!(%from, len = bytes.len(), "dropping undecodable intent frame");
            return None;
        };

        if header.sender != from.0 {
            tracing::warn!(%from, claimed = header.sender, "dropping intent with mismatched sender");
            return None;
        }

        let tracker = self.inbound.entry(from).or_default();
        match tracker.accept(header.sequence) {
            SequenceCheck::InOrder => Some(intent),
            SequenceCheck::Gap { missing } => {
                tracing::warn!(%from, missing, sequence = header.sequence, "intent sequence gap");
                Some(intent)
            }
            SequenceCheck::Stale => {
                tracing::debug!(%from, sequence = header.sequence, "discarding stale intent");
                None
            }
        }
    }

    /// Sends `confirmation` to every connected participant.
    ///
    /// Returns the number of participants it was delivered to. Closed downlinks
    /// are pruned.
    pub fn broadcast(&mut self, confirmation: &Confirmation) -> usize {
        let sequence = self.broadcast_sequence.next_sequence();
        self.last_broadcast = sequence;
        let header = PacketHeader::new(sequence, PacketHeader::AUTHORITY);
        if !self.serializer.serialize_confirmation(&header, confirmation) {
            tracing::warn!(?confirmation, "confirmation does not fit in one frame");
            return 0;
        }

        // One shared frame for every downlink
        let frame: Arc<[u8]> = Arc::from(self.serializer.as_slice());
        let mut delivered = 0;
        let mut closed = Vec::new();
        for subscriber in self.subscribers.read().iter() {
            if subscriber.tx.send(Arc::clone(&frame)).is_ok() {
                delivered += 1;
            } else {
                closed.push(subscriber.participant);
            }
        }

        if !closed.is_empty() {
            self.subscribers
                .write()
                .retain(|s| !closed.contains(&s.participant));
        }
        delivered
    }

    /// Sends the full state to `participant` only.
    ///
    /// The frame carries the sequence of the latest broadcast, so the receiver
    /// resumes the confirmation stream right after it.
    pub fn send_snapshot(&mut self, participant: ParticipantId, snapshot: &ObjectSnapshot) -> bool {
        let header = PacketHeader::new(self.last_broadcast, PacketHeader::AUTHORITY);
        if !self.serializer.serialize_snapshot(&header, snapshot) {
            return false;
        }

        let table = self.subscribers.read();
        table
            .iter()
            .find(|s| s.participant == participant)
            .is_some_and(|s| s.tx.send(Arc::from(self.serializer.as_slice())).is_ok())
    }

    /// Number of currently connected participants.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
