//! # Concord Networking
//!
//! Authority, transport and replicas for one shared object.
//!
//! ## Architecture
//!
//! - **Protocol**: binary frames for intents, confirmations and snapshots
//!   (< 1200 bytes MTU), sequenced per stream
//! - **Bus**: ordered, reliable in-process fan-out between participants and
//!   the authority
//! - **Authority**: the only writer of the replicated state; applies intents in
//!   one total order
//! - **Client**: participant-side replica that replays confirmations
//!
//! ## Trust Model
//!
//! ```text
//! PARTICIPANT                      AUTHORITY
//!   |                                 |
//!   |--- Intent: "Pickup, please" --->|
//!   |                                 | <- decides (compare-and-set on holder)
//!   |<-- Confirmation: "A holds it" --|  (same stream to every participant)
//!   |                                 |
//! ```
//!
//! Participants only ever hint. The authority's confirmation stream is what
//! every replica converges on.
//!
//! ## Example
//!
//! ```rust,ignore
//! use concord_networking::{AuthorityConfig, AuthorityServer, ReplicaClient, SyncBus};
//!
//! let (bus, endpoint) = SyncBus::open();
//! let mut authority = AuthorityServer::new(endpoint, AuthorityConfig::default());
//! let mut client = ReplicaClient::new(bus.connect(ParticipantId(1))?);
//! client.send(&Intent::Pickup { participant: ParticipantId(1), handedness: Handedness::Right })?;
//! authority.pump();
//! client.poll();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod authority;
pub mod bus;
pub mod client;
pub mod protocol;

pub use authority::{AuthorityConfig, AuthorityServer, AuthorityStats, ReplicatedObjectState};
pub use bus::{AuthorityEndpoint, BusError, BusEvent, BusResult, Downlink, ParticipantLink, SyncBus};
pub use client::ReplicaClient;
pub use protocol::{Packet, PacketHeader, PacketType, SequenceNumber};

/// Maximum Transmission Unit - frames must be smaller than this.
pub const MAX_PACKET_SIZE: usize = protocol::MAX_BUFFER_SIZE;
