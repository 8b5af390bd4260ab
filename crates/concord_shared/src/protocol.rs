//! Event vocabulary shared between participants and the authority.
//!
//! Intents travel participant → authority, confirmations travel
//! authority → every participant. Both sides must agree on these definitions.
//!
//! | Event     | Payload                                |
//! |-----------|----------------------------------------|
//! | Pickup    | participant, handedness                |
//! | Move      | position{x,y,z}, quaternion{x,y,z,w}   |
//! | Drop      | participant                            |
//! | Scale     | participant, scale{x,y,z}              |
//! | TogglePin | participant                            |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{Quaternion, Vec3};

/// Identifies one participant for the lifetime of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "participant-{}", self.0)
    }
}

/// Which hand an input source belongs to.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handedness {
    /// Left hand
    Left = 0,
    /// Right hand
    Right = 1,
}

impl Handedness {
    /// The other hand.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Decodes the wire byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            _ => None,
        }
    }
}

/// Event type discriminator, shared by intents and confirmations.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Take exclusive hold of the object
    Pickup = 0,
    /// Overwrite position + rotation
    Move = 1,
    /// Release the hold
    Drop = 2,
    /// Overwrite scale
    Scale = 3,
    /// Flip the pinned flag
    TogglePin = 4,
}

impl EventKind {
    /// Decodes the wire byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Pickup),
            1 => Some(Self::Move),
            2 => Some(Self::Drop),
            3 => Some(Self::Scale),
            4 => Some(Self::TogglePin),
            _ => None,
        }
    }
}

/// A participant's request to change replicated state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    /// Request to become the holder.
    Pickup {
        /// Who wants it.
        participant: ParticipantId,
        /// Which hand grabbed it.
        handedness: Handedness,
    },
    /// New world pose for the object.
    Move {
        /// World position.
        position: Vec3,
        /// World rotation.
        quaternion: Quaternion,
    },
    /// Request to release the hold.
    Drop {
        /// Who is letting go.
        participant: ParticipantId,
    },
    /// New scale for the object.
    Scale {
        /// Who resized it.
        participant: ParticipantId,
        /// Requested scale.
        scale: Vec3,
    },
    /// Request to flip the pinned flag.
    TogglePin {
        /// Who toggled.
        participant: ParticipantId,
    },
}

impl Intent {
    /// Wire discriminator for this intent.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Pickup { .. } => EventKind::Pickup,
            Self::Move { .. } => EventKind::Move,
            Self::Drop { .. } => EventKind::Drop,
            Self::Scale { .. } => EventKind::Scale,
            Self::TogglePin { .. } => EventKind::TogglePin,
        }
    }
}

/// Authority notification of an applied state change.
///
/// Carries the same payloads as the intent that produced it, so every replica
/// can replay the identical transition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Confirmation {
    /// `participant` is now the holder.
    Pickup {
        /// New holder.
        participant: ParticipantId,
        /// Hand the holder grabbed with.
        handedness: Handedness,
    },
    /// Object pose was overwritten.
    Move {
        /// World position.
        position: Vec3,
        /// World rotation.
        quaternion: Quaternion,
    },
    /// The holder was cleared.
    Drop {
        /// Who requested the drop.
        participant: ParticipantId,
    },
    /// Object scale was overwritten.
    Scale {
        /// Who resized it.
        participant: ParticipantId,
        /// New scale.
        scale: Vec3,
    },
    /// Pinned flag was flipped.
    TogglePin {
        /// Who toggled.
        participant: ParticipantId,
    },
}

impl Confirmation {
    /// Wire discriminator for this confirmation.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Pickup { .. } => EventKind::Pickup,
            Self::Move { .. } => EventKind::Move,
            Self::Drop { .. } => EventKind::Drop,
            Self::Scale { .. } => EventKind::Scale,
            Self::TogglePin { .. } => EventKind::TogglePin,
        }
    }
}

impl From<Intent> for Confirmation {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Pickup {
                participant,
                handedness,
            } => Self::Pickup {
                participant,
                handedness,
            },
            Intent::Move {
                position,
                quaternion,
            } => Self::Move {
                position,
                quaternion,
            },
            Intent::Drop { participant } => Self::Drop { participant },
            Intent::Scale { participant, scale } => Self::Scale { participant, scale },
            Intent::TogglePin { participant } => Self::TogglePin { participant },
        }
    }
}

impl From<Confirmation> for Intent {
    fn from(confirmation: Confirmation) -> Self {
        match confirmation {
            Confirmation::Pickup {
                participant,
                handedness,
            } => Self::Pickup {
                participant,
                handedness,
            },
            Confirmation::Move {
                position,
                quaternion,
            } => Self::Move {
                position,
                quaternion,
            },
            Confirmation::Drop { participant } => Self::Drop { participant },
            Confirmation::Scale { participant, scale } => Self::Scale { participant, scale },
            Confirmation::TogglePin { participant } => Self::TogglePin { participant },
        }
    }
}

/// Object transform where every component may still be undefined.
///
/// This is also the answer to the host's pull-based transform query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectTransform {
    /// World position, if set.
    pub position: Option<Vec3>,
    /// World rotation, if set.
    pub quaternion: Option<Quaternion>,
    /// Scale, if set.
    pub scale: Option<Vec3>,
}

impl ObjectTransform {
    /// True once position, rotation and scale are all defined.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.position.is_some() && self.quaternion.is_some() && self.scale.is_some()
    }
}

/// Full replicated state, sent once to a participant when it connects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    /// Current transform.
    pub transform: ObjectTransform,
    /// Current holder.
    pub held_by: Option<ParticipantId>,
    /// Pinned flag.
    pub pinned: bool,
    /// Latched once the object was pinned at least once.
    pub has_ever_been_pinned: bool,
    /// Who pinned it.
    pub pinned_by: Option<ParticipantId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handedness_opposite() {
        assert_eq!(Handedness::Left.opposite(), Handedness::Right);
        assert_eq!(Handedness::Right.opposite(), Handedness::Left);
    }

    #[test]
    fn test_event_kind_wire_bytes() {
        for kind in [
            EventKind::Pickup,
            EventKind::Move,
            EventKind::Drop,
            EventKind::Scale,
            EventKind::TogglePin,
        ] {
            assert_eq!(EventKind::from_u8(kind as u8), Some(kind));
        }
        assert_eq!(EventKind::from_u8(42), None);
    }

    #[test]
    fn test_confirmation_mirrors_intent() {
        let intent = Intent::Scale {
            participant: ParticipantId(7),
            scale: Vec3::splat(2.0),
        };
        let confirmation = Confirmation::from(intent);
        assert_eq!(confirmation.kind(), EventKind::Scale);
        assert_eq!(Intent::from(confirmation), intent);
    }

    #[test]
    fn test_transform_completeness() {
        let mut transform = ObjectTransform {
            position: Some(Vec3::ZERO),
            ..Default::default()
        };
        assert!(!transform.is_complete());

        transform.quaternion = Some(Quaternion::IDENTITY);
        transform.scale = Some(Vec3::ONE);
        assert!(transform.is_complete());
    }
}
