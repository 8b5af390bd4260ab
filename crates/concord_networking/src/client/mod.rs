//! # Replica Client
//!
//! Participant-side connection plus a local replica of the object state.
//!
//! The replica never changes on its own: it adopts the join snapshot, then
//! replays confirmations in the order the authority broadcast them.

use concord_shared::{Confirmation, Intent, ParticipantId};

use crate::authority::ReplicatedObjectState;
use crate::bus::{BusResult, Downlink, ParticipantLink};

/// A participant's link and replica.
pub struct ReplicaClient {
    link: ParticipantLink,
    replica: ReplicatedObjectState,
    confirmations_applied: u64,
}

impl ReplicaClient {
    /// Wraps a connected link with an empty replica.
    #[must_use]
    pub fn new(link: ParticipantLink) -> Self {
        Self {
            link,
            replica: ReplicatedObjectState::new(),
            confirmations_applied: 0,
        }
    }

    /// Who this client is.
    #[inline]
    #[must_use]
    pub const fn participant(&self) -> ParticipantId {
        self.link.participant()
    }

    /// Local replica of the shared state.
    #[inline]
    #[must_use]
    pub const fn replica(&self) -> &ReplicatedObjectState {
        &self.replica
    }

    /// True once the join snapshot arrived.
    #[inline]
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.link.is_synced()
    }

    /// Confirmations replayed so far.
    #[inline]
    #[must_use]
    pub const fn confirmations_applied(&self) -> u64 {
        self.confirmations_applied
    }

    /// Sends an intent to the authority.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::bus::BusError`] from the link.
    pub fn send(&mut self, intent: &Intent) -> BusResult<()> {
        self.link.send_intent(intent)
    }

    /// Applies every pending authority frame to the replica.
    ///
    /// Returns the confirmations in order so the caller can update its view.
    pub fn poll(&mut self) -> Vec<Confirmation> {
        self.poll_with_state()
            .into_iter()
            .map(|(confirmation, _)| confirmation)
            .collect()
    }

    /// Like [`Self::poll`], but pairs each confirmation with the replica as it
    /// was right after that confirmation was applied.
    pub fn poll_with_state(&mut self) -> Vec<(Confirmation, ReplicatedObjectState)> {
        let mut applied = Vec::new();
        while let Some(downlink) = self.link.try_recv() {
            match downlink {
                Downlink::Snapshot(snapshot) => {
                    self.replica.restore(&snapshot);
                    tracing::debug!(participant = %self.participant(), "replica synced from snapshot");
                }
                Downlink::Confirmation(confirmation) => {
                    self.replica.apply_confirmation(&confirmation);
                    self.confirmations_applied += 1;
                    applied.push((confirmation, self.replica));
                }
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::{AuthorityConfig, AuthorityServer};
    use crate::bus::SyncBus;
    use concord_shared::{Handedness, Quaternion, Vec3};

    #[test]
    fn test_late_joiner_converges_from_snapshot() {
        let (bus, endpoint) = SyncBus::open();
        let mut server = AuthorityServer::new(endpoint, AuthorityConfig::default());

        let mut early = ReplicaClient::new(bus.connect(ParticipantId(1)).unwrap());
        server.pump();
        early
            .send(&Intent::Move {
                position: Vec3::new(0.0, 1.0, -2.0),
                quaternion: Quaternion::IDENTITY,
            })
            .unwrap();
        early
            .send(&Intent::Pickup {
                participant: ParticipantId(1),
                handedness: Handedness::Left,
            })
            .unwrap();
        server.pump();
        early.poll();

        let mut late = ReplicaClient::new(bus.connect(ParticipantId(2)).unwrap());
        assert!(!late.is_synced());
        server.pump();
        assert!(late.poll().is_empty());

        assert!(late.is_synced());
        assert_eq!(late.replica(), server.state());
        assert_eq!(early.replica(), server.state());
        assert_eq!(early.confirmations_applied(), 2);
    }

    #[test]
    fn test_joiner_skips_confirmations_its_snapshot_covers() {
        let (bus, endpoint) = SyncBus::open();
        let mut server = AuthorityServer::new(endpoint, AuthorityConfig::default());
        let a = ParticipantId(1);
        let mut early = ReplicaClient::new(bus.connect(a).unwrap());
        early.send(&Intent::TogglePin { participant: a }).unwrap();
        server.pump();
        assert!(server.state().is_pinned());

        // Unpin is queued ahead of the join, so it is broadcast to the new link too
        early.send(&Intent::TogglePin { participant: a }).unwrap();
        let mut late = ReplicaClient::new(bus.connect(ParticipantId(2)).unwrap());
        server.pump();

        assert!(late.poll_with_state().is_empty());
        assert!(late.is_synced());
        assert!(!late.replica().is_pinned());
        assert_eq!(late.replica(), server.state());
    }

    #[test]
    fn test_poll_with_state_steps_through_batch() {
        let (bus, endpoint) = SyncBus::open();
        let mut server = AuthorityServer::new(endpoint, AuthorityConfig::default());
        let mut client = ReplicaClient::new(bus.connect(ParticipantId(1)).unwrap());
        server.pump();

        let me = ParticipantId(1);
        client
            .send(&Intent::Pickup {
                participant: me,
                handedness: Handedness::Right,
            })
            .unwrap();
        client
            .send(&Intent::Move {
                position: Vec3::new(0.0, 1.0, -1.0),
                quaternion: Quaternion::IDENTITY,
            })
            .unwrap();
        client.send(&Intent::Drop { participant: me }).unwrap();
        server.pump();

        let steps = client.poll_with_state();
        assert_eq!(steps.len(), 3);
        assert!(matches!(steps[1].0, Confirmation::Move { .. }));
        assert_eq!(steps[1].1.held_by(), Some(me));
        assert_eq!(steps[2].1.held_by(), None);
        assert_eq!(client.replica().held_by(), None);
    }
}
