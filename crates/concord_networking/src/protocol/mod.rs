//! # Wire Protocol
//!
//! Binary frames for intents, confirmations and late-join snapshots.
//!
//! ## Frame Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Type (1) │ Header (8): Sequence (4) │ Sender (4)              │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Payload (variable, max 1191 bytes)                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod packets;
mod sequence;
mod serialization;

pub use packets::{Packet, PacketHeader, PacketType};
pub use sequence::{SequenceCheck, SequenceCounter, SequenceNumber, SequenceTracker};
pub use serialization::{PacketDeserializer, PacketSerializer, MAX_BUFFER_SIZE};
