//! # Packet Serialization
//!
//! Little-endian frame codec over a fixed, MTU-sized buffer.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────┬──────────────────────┬───────────────────────────────┐
//! │ type (1) │ header (8)           │ payload                       │
//! ├──────────┼──────────────────────┼───────────────────────────────┤
//! │ Intent   │ sequence | sender    │ kind (1) + event fields       │
//! │ Confirm  │ sequence | AUTHORITY │ kind (1) + event fields       │
//! │ Snapshot │ sequence | AUTHORITY │ flags (1) + present fields    │
//! └──────────┴──────────────────────┴───────────────────────────────┘
//! ```
//!
//! Intents and confirmations share one payload encoding per event kind.

use bytemuck::{bytes_of, Pod};
use concord_shared::{
    Confirmation, EventKind, Handedness, Intent, ObjectSnapshot, ObjectTransform, ParticipantId,
    Quaternion, Vec3,
};

use super::packets::{snapshot_flags, Packet, PacketHeader, PacketType};

/// Maximum packet buffer size.
pub const MAX_BUFFER_SIZE: usize = 1200;

/// Writes frames into a reusable buffer.
pub struct PacketSerializer {
    buffer: [u8; MAX_BUFFER_SIZE],
    position: usize,
}

impl PacketSerializer {
    /// Creates a new serializer with a fresh buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: [0u8; MAX_BUFFER_SIZE],
            position: 0,
        }
    }

    /// Resets the serializer for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Returns the number of bytes written.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.position
    }

    /// Returns true if no bytes have been written.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.position == 0
    }

    /// Returns a slice of the written data.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.position]
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) -> bool {
        if self.position >= MAX_BUFFER_SIZE {
            return false;
        }
        self.buffer[self.position] = value;
        self.position += 1;
        true
    }

    /// Writes a u32 in little-endian format.
    #[inline]
    pub fn write_u32(&mut self, value: u32) -> bool {
        if self.position + 4 > MAX_BUFFER_SIZE {
            return false;
        }
        self.buffer[self.position..self.position + 4].copy_from_slice(&value.to_le_bytes());
        self.position += 4;
        true
    }

    /// Writes a Pod type directly.
    #[inline]
    pub fn write_pod<T: Pod>(&mut self, value: &T) -> bool {
        let bytes = bytes_of(value);
        if self.position + bytes.len() > MAX_BUFFER_SIZE {
            return false;
        }
        self.buffer[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
        true
    }

    /// Writes a packet header.
    #[inline]
    pub fn write_header(&mut self, header: &PacketHeader) -> bool {
        self.write_pod(header)
    }

    fn write_event(&mut self, event: &Confirmation) -> bool {
        if !self.write_u8(event.kind() as u8) {
            return false;
        }
        match event {
            Confirmation::Pickup {
                participant,
                handedness,
            } => self.write_u32(participant.0) && self.write_u8(*handedness as u8),
            Confirmation::Move {
                position,
                quaternion,
            } => self.write_pod(position) && self.write_pod(quaternion),
            Confirmation::Drop { participant } | Confirmation::TogglePin { participant } => {
                self.write_u32(participant.0)
            }
            Confirmation::Scale { participant, scale } => {
                self.write_u32(participant.0) && self.write_pod(scale)
            }
        }
    }

    /// Serializes an intent frame.
    pub fn serialize_intent(&mut self, header: &PacketHeader, intent: &Intent) -> bool {
        self.reset();
        self.write_u8(PacketType::Intent as u8)
            && self.write_header(header)
            && self.write_event(&Confirmation::from(*intent))
    }

    /// Serializes a confirmation frame.
    pub fn serialize_confirmation(
        &mut self,
        header: &PacketHeader,
        confirmation: &Confirmation,
    ) -> bool {
        self.reset();
        self.write_u8(PacketType::Confirmation as u8)
            && self.write_header(header)
            && self.write_event(confirmation)
    }

    /// Serializes a full-state snapshot frame.
    pub fn serialize_snapshot(&mut self, header: &PacketHeader, snapshot: &ObjectSnapshot) -> bool {
        self.reset();

        let transform = &snapshot.transform;
        let mut flags = 0u8;
        if transform.position.is_some() {
            flags |= snapshot_flags::POSITION;
        }
        if transform.quaternion.is_some() {
            flags |= snapshot_flags::QUATERNION;
        }
        if transform.scale.is_some() {
            flags |= snapshot_flags::SCALE;
        }
        if snapshot.held_by.is_some() {
            flags |= snapshot_flags::HELD;
        }
        if snapshot.pinned {
            flags |= snapshot_flags::PINNED;
        }
        if snapshot.has_ever_been_pinned {
            flags |= snapshot_flags::EVER_PINNED;
        }
        if snapshot.pinned_by.is_some() {
            flags |= snapshot_flags::PINNED_BY;
        }

        if !(self.write_u8(PacketType::Snapshot as u8)
            && self.write_header(header)
            && self.write_u8(flags))
        {
            return false;
        }
        if let Some(position) = &transform.position {
            if !self.write_pod(position) {
                return false;
            }
        }
        if let Some(quaternion) = &transform.quaternion {
            if !self.write_pod(quaternion) {
                return false;
            }
        }
        if let Some(scale) = &transform.scale {
            if !self.write_pod(scale) {
                return false;
            }
        }
        if let Some(holder) = snapshot.held_by {
            if !self.write_u32(holder.0) {
                return false;
            }
        }
        if let Some(pinner) = snapshot.pinned_by {
            if !self.write_u32(pinner.0) {
                return false;
            }
        }
        true
    }
}

impl Default for PacketSerializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads frames from a byte slice.
pub struct PacketDeserializer<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> PacketDeserializer<'a> {
    /// Creates a new deserializer from a buffer.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Returns the number of bytes remaining.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        let value = *self.buffer.get(self.position)?;
        self.position += 1;
        Some(value)
    }

    /// Reads a u32 in little-endian format.
    #[inline]
    pub fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.buffer.get(self.position..self.position + 4)?;
        let value = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        self.position += 4;
        Some(value)
    }

    /// Reads a Pod type directly.
    #[inline]
    pub fn read_pod<T: Pod + Copy>(&mut self) -> Option<T> {
        let size = std::mem::size_of::<T>();
        let slice = self.buffer.get(self.position..self.position + size)?;
        self.position += size;
        bytemuck::try_pod_read_unaligned(slice).ok()
    }

    /// Reads a packet header.
    #[inline]
    pub fn read_header(&mut self) -> Option<PacketHeader> {
        self.read_pod()
    }

    fn read_participant(&mut self) -> Option<ParticipantId> {
        self.read_u32().map(ParticipantId)
    }

    fn read_event(&mut self) -> Option<Confirmation> {
        let kind = EventKind::from_u8(self.read_u8()?)?;
        let event = match kind {
            EventKind::Pickup => Confirmation::Pickup {
                participant: self.read_participant()?,
                handedness: Handedness::from_u8(self.read_u8()?)?,
            },
            EventKind::Move => Confirmation::Move {
                position: self.read_pod::<Vec3>()?,
                quaternion: self.read_pod::<Quaternion>()?,
            },
            EventKind::Drop => Confirmation::Drop {
                participant: self.read_participant()?,
            },
            EventKind::Scale => Confirmation::Scale {
                participant: self.read_participant()?,
                scale: self.read_pod::<Vec3>()?,
            },
            EventKind::TogglePin => Confirmation::TogglePin {
                participant: self.read_participant()?,
            },
        };
        Some(event)
    }

    fn read_snapshot(&mut self) -> Option<ObjectSnapshot> {
        let flags = self.read_u8()?;
        let has = |bit: u8| flags & bit != 0;

        let position = if has(snapshot_flags::POSITION) {
            Some(self.read_pod::<Vec3>()?)
        } else {
            None
        };
        let quaternion = if has(snapshot_flags::QUATERNION) {
            Some(self.read_pod::<Quaternion>()?)
        } else {
            None
        };
        let scale = if has(snapshot_flags::SCALE) {
            Some(self.read_pod::<Vec3>()?)
        } else {
            None
        };
        let held_by = if has(snapshot_flags::HELD) {
            Some(self.read_participant()?)
        } else {
            None
        };
        let pinned_by = if has(snapshot_flags::PINNED_BY) {
            Some(self.read_participant()?)
        } else {
            None
        };

        Some(ObjectSnapshot {
            transform: ObjectTransform {
                position,
                quaternion,
                scale,
            },
            held_by,
            pinned: has(snapshot_flags::PINNED),
            has_ever_been_pinned: has(snapshot_flags::EVER_PINNED),
            pinned_by,
        })
    }

    /// Deserializes a packet from the buffer.
    pub fn deserialize(&mut self) -> Option<Packet> {
        let packet_type_byte = self.read_u8()?;
        let header = self.read_header()?;

        match packet_type_byte {
            x if x == PacketType::Intent as u8 => {
                let event = self.read_event()?;
                Some(Packet::Intent(header, Intent::from(event)))
            }
            x if x == PacketType::Confirmation as u8 => {
                let event = self.read_event()?;
                Some(Packet::Confirmation(header, event))
            }
            x if x == PacketType::Snapshot as u8 => {
                let snapshot = self.read_snapshot()?;
                Some(Packet::Snapshot(header, snapshot))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_intent_layout() {
        let header = PacketHeader::new(3, 1);
        let intent = Intent::Move {
            position: Vec3::new(0.0, 1.5, -2.0),
            quaternion: Quaternion::new(0.0, 0.3826834, 0.0, 0.9238795),
        };

        let mut serializer = PacketSerializer::new();
        assert!(serializer.serialize_intent(&header, &intent));
        // type + header + kind + vec3 + quat
        assert_eq!(serializer.len(), 1 + PacketHeader::SIZE + 1 + 12 + 16);

        let mut deserializer = PacketDeserializer::new(serializer.as_slice());
        match deserializer.deserialize() {
            Some(Packet::Intent(h, decoded)) => {
                assert_eq!(h, header);
                assert_eq!(decoded, intent);
            }
            other => panic!("expected Intent packet, got {other:?}"),
        }
        assert_eq!(deserializer.remaining(), 0);
    }

    #[test]
    fn test_pickup_confirmation_carries_handedness() {
        let header = PacketHeader::new(9, PacketHeader::AUTHORITY);
        let confirmation = Confirmation::Pickup {
            participant: ParticipantId(4),
            handedness: Handedness::Left,
        };

        let mut serializer = PacketSerializer::new();
        assert!(serializer.serialize_confirmation(&header, &confirmation));

        let packet = PacketDeserializer::new(serializer.as_slice()).deserialize();
        assert_eq!(packet, Some(Packet::Confirmation(header, confirmation)));
    }

    #[test]
    fn test_snapshot_with_partial_transform() {
        let header = PacketHeader::new(1, PacketHeader::AUTHORITY);
        let snapshot = ObjectSnapshot {
            transform: ObjectTransform {
                position: Some(Vec3::new(1.0, 2.0, 3.0)),
                quaternion: None,
                scale: None,
            },
            held_by: Some(ParticipantId(2)),
            pinned: false,
            has_ever_been_pinned: true,
            pinned_by: None,
        };

        let mut serializer = PacketSerializer::new();
        assert!(serializer.serialize_snapshot(&header, &snapshot));

        let packet = PacketDeserializer::new(serializer.as_slice()).deserialize();
        assert_eq!(packet, Some(Packet::Snapshot(header, snapshot)));
    }

    #[test]
    fn test_truncated_and_unknown_frames_rejected() {
        let mut serializer = PacketSerializer::new();
        assert!(serializer.serialize_intent(
            &PacketHeader::new(1, 1),
            &Intent::Drop {
                participant: ParticipantId(1)
            }
        ));
        let bytes = serializer.as_slice();

        let truncated = &bytes[..bytes.len() - 1];
        assert_eq!(PacketDeserializer::new(truncated).deserialize(), None);

        let mut unknown = bytes.to_vec();
        unknown[0] = 0xFF;
        assert_eq!(PacketDeserializer::new(&unknown).deserialize(), None);

        let mut bad_kind = bytes.to_vec();
        bad_kind[1 + PacketHeader::SIZE] = 0x7F;
        assert_eq!(PacketDeserializer::new(&bad_kind).deserialize(), None);
    }
}
