//! # Packet Definitions
//!
//! Three frame kinds cross the bus:
//! - `Intent`: participant → authority
//! - `Confirmation`: authority → every participant
//! - `Snapshot`: authority → one late-joining participant

use bytemuck::{Pod, Zeroable};
use concord_shared::{Confirmation, Intent, ObjectSnapshot};

/// Envelope header, present in every frame.
///
/// Total size: 8 bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct PacketHeader {
    /// Per-stream sequence number, starting at 1.
    pub sequence: u32,
    /// Raw participant id of the sender, [`PacketHeader::AUTHORITY`] for the authority.
    pub sender: u32,
}

impl PacketHeader {
    /// Sender id used by the authority.
    pub const AUTHORITY: u32 = u32::MAX;

    /// Size of the header in bytes.
    pub const SIZE: usize = 8;

    /// Creates a new packet header.
    #[inline]
    #[must_use]
    pub const fn new(sequence: u32, sender: u32) -> Self {
        Self { sequence, sender }
    }
}

/// Frame kind byte, written before the header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Participant → authority request.
    Intent = 0,
    /// Authority → participants applied change.
    Confirmation = 1,
    /// Authority → one participant, full state.
    Snapshot = 2,
}

/// Decoded frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Packet {
    /// Participant intent.
    Intent(PacketHeader, Intent),
    /// Authority confirmation.
    Confirmation(PacketHeader, Confirmation),
    /// Full state for a late joiner.
    Snapshot(PacketHeader, ObjectSnapshot),
}

impl Packet {
    /// Envelope header of this frame.
    #[must_use]
    pub const fn header(&self) -> &PacketHeader {
        match self {
            Self::Intent(header, _) | Self::Confirmation(header, _) | Self::Snapshot(header, _) => {
                header
            }
        }
    }
}

/// Presence bits for the optional fields of a snapshot.
pub(crate) mod snapshot_flags {
    pub const POSITION: u8 = 1 << 0;
    pub const QUATERNION: u8 = 1 << 1;
    pub const SCALE: u8 = 1 << 2;
    pub const HELD: u8 = 1 << 3;
    pub const PINNED: u8 = 1 << 4;
    pub const EVER_PINNED: u8 = 1 << 5;
    pub const PINNED_BY: u8 = 1 << 6;
}
