//! Participant side of the bus.

use std::sync::Arc;

use concord_shared::{Confirmation, Intent, ObjectSnapshot, ParticipantId};
use crossbeam_channel::{Receiver, Sender};

use super::{BusError, BusResult, SubscriberTable, Uplink};
use crate::protocol::{
    Packet, PacketDeserializer, PacketHeader, PacketSerializer, SequenceCheck, SequenceCounter,
    SequenceTracker,
};

/// Authority frame delivered to a participant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Downlink {
    /// An applied change, in global order.
    Confirmation(Confirmation),
    /// Full state, sent once right after connecting.
    Snapshot(ObjectSnapshot),
}

/// One participant's connection. Dropping it disconnects.
pub struct ParticipantLink {
    participant: ParticipantId,
    uplink_tx: Sender<Uplink>,
    downlink_rx: Receiver<Arc<[u8]>>,
    subscribers: SubscriberTable,
    serializer: PacketSerializer,
    sequence: SequenceCounter,
    /// `None` until the join snapshot arrives.
    inbound: Option<SequenceTracker>,
}

impl ParticipantLink {
    pub(super) fn new(
        participant: ParticipantId,
        uplink_tx: Sender<Uplink>,
        downlink_rx: Receiver<Arc<[u8]>>,
        subscribers: SubscriberTable,
    ) -> Self {
        Self {
            participant,
            uplink_tx,
            downlink_rx,
            subscribers,
            serializer: PacketSerializer::new(),
            sequence: SequenceCounter::new(),
            inbound: None,
        }
    }

    /// Who this link belongs to.
    #[inline]
    #[must_use]
    pub const fn participant(&self) -> ParticipantId {
        self.participant
    }

    /// Sends an intent to the authority. Fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Disconnected`] if the authority endpoint is gone, or
    /// [`BusError::Oversized`] if the frame cannot be encoded.
    pub fn send_intent(&mut self, intent: &Intent) -> BusResult<()> {
        let header = PacketHeader::new(self.sequence.next_sequence(), self.participant.0);
        if !self.serializer.serialize_intent(&header, intent) {
            return Err(BusError::Oversized);
        }
        tracing::debug!(participant = %self.participant, kind = ?intent.kind(), "intent sent");

        self.uplink_tx
            .send(Uplink::Frame {
                from: self.participant,
                bytes: self.serializer.as_slice().to_vec(),
            })
            .map_err(|_| BusError::Disconnected)
    }

    /// Next authority frame, or `None` when nothing is pending.
    ///
    /// Confirmations that arrive before the join snapshot are discarded: the
    /// snapshot already includes them.
    pub fn try_recv(&mut self) -> Option<Downlink> {
        loop {
            let bytes = self.downlink_rx.try_recv().ok()?;
            match PacketDeserializer::new(&bytes).deserialize() {
                Some(Packet::Confirmation(header, confirmation)) => {
                    let Some(inbound) = self.inbound.as_mut() else {
                        tracing::debug!(
                            participant = %self.participant,
                            sequence = header.sequence,
                            "confirmation before snapshot, discarded"
                        );
                        continue;
                    };
                    match inbound.accept(header.sequence) {
                        SequenceCheck::InOrder => return Some(Downlink::Confirmation(confirmation)),
                        SequenceCheck::Gap { missing } => {
                            tracing::warn!(
                                participant = %self.participant,
                                missing,
                                "confirmation sequence gap"
                            );
                            return Some(Downlink::Confirmation(confirmation));
                        }
                        SequenceCheck::Stale => {
                            tracing::debug!(
                                participant = %self.participant,
                                sequence = header.sequence,
                                "discarding stale confirmation"
                            );
                        }
                    }
                }
                Some(Packet::Snapshot(header, snapshot)) => {
                    self.inbound = Some(SequenceTracker::resume_after(header.sequence));
                    return Some(Downlink::Snapshot(snapshot));
                }
                Some(Packet::Intent(..)) | None => {
                    tracing::warn!(
                        participant = %self.participant,
                        len = bytes.len(),
                        "dropping unexpected downlink frame"
                    );
                }
            }
        }
    }

    /// True once the join snapshot has been received.
    #[inline]
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.inbound.is_some()
    }

    /// Drains every pending authority frame.
    pub fn drain(&mut self) -> Vec<Downlink> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

impl Drop for ParticipantLink {
    fn drop(&mut self) {
        let participant = self.participant;
        self.subscribers
            .write()
            .retain(|s| s.participant != participant);
        let _ = self.uplink_tx.send(Uplink::Left(participant));
    }
}
