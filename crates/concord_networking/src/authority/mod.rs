//! # Authority Server
//!
//! Single source of truth for the shared object.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     AUTHORITY SERVER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐       │
//! │  │ Uplink       │  │ Apply        │  │ Broadcast    │       │
//! │  │ (intents)    │──│ (in order)   │──│ (fan-out)    │       │
//! │  └──────────────┘  └──────┬───────┘  └──────────────┘       │
//! │                           │                                 │
//! │              ┌────────────▼────────────┐                    │
//! │              │ ReplicatedObjectState   │                    │
//! │              │ - holder                │                    │
//! │              │ - pin flags             │                    │
//! │              │ - transform             │                    │
//! │              └─────────────────────────┘                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Intents are applied one at a time in arrival order. That single total
//! order is what makes every participant converge.

mod state;

pub use state::ReplicatedObjectState;

use concord_shared::{Confirmation, Intent, ParticipantId};
use serde::{Deserialize, Serialize};

use crate::bus::{AuthorityEndpoint, BusEvent};

/// Authority configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Drop the object on behalf of a holder whose link closes.
    ///
    /// Off by default: a held object stays held until an explicit Drop.
    pub release_held_on_disconnect: bool,
}

/// Counters for what the authority has done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuthorityStats {
    /// Intents that produced a confirmation.
    pub intents_applied: u64,
    /// Intents that were silent no-ops.
    pub intents_ignored: u64,
    /// Participants that connected.
    pub joins: u64,
    /// Participants that disconnected.
    pub leaves: u64,
    /// Drops synthesized by the disconnect policy.
    pub released_on_disconnect: u64,
}

/// Owns the authoritative state and its bus endpoint.
pub struct AuthorityServer {
    config: AuthorityConfig,
    state: ReplicatedObjectState,
    endpoint: AuthorityEndpoint,
    stats: AuthorityStats,
}

impl AuthorityServer {
    /// Creates an authority with fresh object state.
    #[must_use]
    pub fn new(endpoint: AuthorityEndpoint, config: AuthorityConfig) -> Self {
        Self {
            config,
            state: ReplicatedObjectState::new(),
            endpoint,
            stats: AuthorityStats::default(),
        }
    }

    /// Authoritative state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> &ReplicatedObjectState {
        &self.state
    }

    /// Configuration in effect.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &AuthorityConfig {
        &self.config
    }

    /// Counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &AuthorityStats {
        &self.stats
    }

    /// Number of connected participants.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.endpoint.participant_count()
    }

    /// Processes every pending bus event. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.endpoint.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    fn handle_event(&mut self, event: BusEvent) {
        match event {
            BusEvent::Joined(participant) => {
                self.stats.joins += 1;
                let snapshot = self.state.snapshot();
                if !self.endpoint.send_snapshot(participant, &snapshot) {
                    tracing::debug!(%participant, "joined but left before snapshot");
                }
                tracing::info!(%participant, "participant joined");
            }
            BusEvent::Intent { from, intent } => {
                self.apply_intent(from, &intent);
            }
            BusEvent::Left(participant) => {
                self.stats.leaves += 1;
                tracing::info!(
                    %participant,
                    holding = self.state.held_by() == Some(participant),
                    "participant left"
                );
                if self.config.release_held_on_disconnect
                    && self.state.held_by() == Some(participant)
                {
                    self.stats.released_on_disconnect += 1;
                    self.apply_intent(participant, &Intent::Drop { participant });
                }
            }
        }
    }

    /// Applies one intent and broadcasts the confirmation, if any.
    pub fn apply_intent(&mut self, from: ParticipantId, intent: &Intent) -> Option<Confirmation> {
        let Some(confirmation) = self.state.apply(intent) else {
            self.stats.intents_ignored += 1;
            tracing::debug!(%from, kind = ?intent.kind(), "intent ignored");
            return None;
        };

        self.stats.intents_applied += 1;
        let delivered = self.endpoint.broadcast(&confirmation);
        tracing::debug!(%from, kind = ?confirmation.kind(), delivered, "intent applied");
        Some(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Downlink, SyncBus};
    use concord_shared::Handedness;

    fn pickup(id: u32) -> Intent {
        Intent::Pickup {
            participant: ParticipantId(id),
            handedness: Handedness::Right,
        }
    }

    #[test]
    fn test_join_gets_snapshot() {
        let (bus, endpoint) = SyncBus::open();
        let mut server = AuthorityServer::new(endpoint, AuthorityConfig::default());
        let mut link = bus.connect(ParticipantId(1)).unwrap();

        assert_eq!(server.pump(), 1);
        assert!(matches!(link.try_recv(), Some(Downlink::Snapshot(_))));
        assert_eq!(server.stats().joins, 1);
    }

    #[test]
    fn test_ignored_intents_not_broadcast() {
        let (bus, endpoint) = SyncBus::open();
        let mut server = AuthorityServer::new(endpoint, AuthorityConfig::default());
        let mut a = bus.connect(ParticipantId(1)).unwrap();
        let mut b = bus.connect(ParticipantId(2)).unwrap();

        a.send_intent(&pickup(1)).unwrap();
        b.send_intent(&pickup(2)).unwrap();
        server.pump();

        assert_eq!(server.state().held_by(), Some(ParticipantId(1)));
        assert_eq!(server.stats().intents_applied, 1);
        assert_eq!(server.stats().intents_ignored, 1);

        let confirmations: Vec<_> = b
            .drain()
            .into_iter()
            .filter(|d| matches!(d, Downlink::Confirmation(_)))
            .collect();
        assert_eq!(confirmations.len(), 1);
    }

    #[test]
    fn test_holder_stays_after_disconnect_by_default() {
        let (bus, endpoint) = SyncBus::open();
        let mut server = AuthorityServer::new(endpoint, AuthorityConfig::default());
        let mut a = bus.connect(ParticipantId(1)).unwrap();
        a.send_intent(&pickup(1)).unwrap();
        server.pump();

        drop(a);
        server.pump();
        assert_eq!(server.state().held_by(), Some(ParticipantId(1)));
        assert_eq!(server.stats().leaves, 1);
    }

    #[test]
    fn test_release_on_disconnect_policy() {
        let (bus, endpoint) = SyncBus::open();
        let config = AuthorityConfig {
            release_held_on_disconnect: true,
        };
        let mut server = AuthorityServer::new(endpoint, config);
        let mut a = bus.connect(ParticipantId(1)).unwrap();
        let mut b = bus.connect(ParticipantId(2)).unwrap();
        a.send_intent(&pickup(1)).unwrap();
        server.pump();
        b.drain();

        drop(a);
        server.pump();
        assert_eq!(server.state().held_by(), None);
        assert_eq!(server.stats().released_on_disconnect, 1);
        assert_eq!(
            b.drain(),
            vec![Downlink::Confirmation(Confirmation::Drop {
                participant: ParticipantId(1)
            })]
        );
    }
}
