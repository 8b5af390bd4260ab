//! # Replicated Object State
//!
//! The authoritative state machine for one shared object.
//!
//! ## Transition Rules
//!
//! | Intent    | Applies when                  | Effect                          |
//! |-----------|-------------------------------|---------------------------------|
//! | Pickup    | nobody holds the object       | `held_by = participant`         |
//! | Move      | always                        | overwrite position + rotation   |
//! | Drop      | sender is the holder          | `held_by = None`                |
//! | Scale     | scale differs from current    | overwrite scale                 |
//! | TogglePin | always                        | flip `pinned`, track `pinned_by`|
//!
//! Rejected intents are silent no-ops. Move and Scale are not checked against
//! the holder; participants are trusted peers.

use concord_shared::{
    Confirmation, Handedness, Intent, ObjectSnapshot, ObjectTransform, ParticipantId, Quaternion,
    Vec3,
};

/// Holder, pin flags and transform of one shared object.
///
/// The authority mutates it through the `apply_*` methods. Participants keep a
/// replica that only changes through [`Self::apply_confirmation`] and
/// [`Self::restore`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReplicatedObjectState {
    position: Option<Vec3>,
    quaternion: Option<Quaternion>,
    scale: Option<Vec3>,
    held_by: Option<ParticipantId>,
    pinned: bool,
    has_ever_been_pinned: bool,
    pinned_by: Option<ParticipantId>,
}

impl ReplicatedObjectState {
    /// Fresh state: undefined transform, unheld, unpinned.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds state from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &ObjectSnapshot) -> Self {
        let mut state = Self::new();
        state.restore(snapshot);
        state
    }

    // =========================================================================
    // Authority transitions
    // =========================================================================

    /// Takes the hold if nobody has it.
    pub fn apply_pickup(
        &mut self,
        participant: ParticipantId,
        handedness: Handedness,
    ) -> Option<Confirmation> {
        if let Some(holder) = self.held_by {
            tracing::debug!(%participant, %holder, "pickup ignored, already held");
            return None;
        }
        self.held_by = Some(participant);
        Some(Confirmation::Pickup {
            participant,
            handedness,
        })
    }

    /// Overwrites position and rotation. Always confirmed.
    pub fn apply_move(&mut self, position: Vec3, quaternion: Quaternion) -> Option<Confirmation> {
        self.position = Some(position);
        self.quaternion = Some(quaternion);
        Some(Confirmation::Move {
            position,
            quaternion,
        })
    }

    /// Clears the hold if `participant` is the holder.
    pub fn apply_drop(&mut self, participant: ParticipantId) -> Option<Confirmation> {
        if self.held_by != Some(participant) {
            tracing::debug!(%participant, holder = ?self.held_by, "drop ignored, not the holder");
            return None;
        }
        self.held_by = None;
        Some(Confirmation::Drop { participant })
    }

    /// Overwrites the scale unless it is unchanged.
    pub fn apply_scale(&mut self, participant: ParticipantId, scale: Vec3) -> Option<Confirmation> {
        if self.scale == Some(scale) {
            return None;
        }
        self.scale = Some(scale);
        Some(Confirmation::Scale { participant, scale })
    }

    /// Flips the pinned flag. Always confirmed.
    pub fn apply_toggle_pin(&mut self, participant: ParticipantId) -> Option<Confirmation> {
        self.toggle_pin(participant);
        Some(Confirmation::TogglePin { participant })
    }

    /// Dispatches an intent to its transition.
    pub fn apply(&mut self, intent: &Intent) -> Option<Confirmation> {
        match *intent {
            Intent::Pickup {
                participant,
                handedness,
            } => self.apply_pickup(participant, handedness),
            Intent::Move {
                position,
                quaternion,
            } => self.apply_move(position, quaternion),
            Intent::Drop { participant } => self.apply_drop(participant),
            Intent::Scale { participant, scale } => self.apply_scale(participant, scale),
            Intent::TogglePin { participant } => self.apply_toggle_pin(participant),
        }
    }

    fn toggle_pin(&mut self, participant: ParticipantId) {
        self.pinned = !self.pinned;
        if self.pinned {
            self.has_ever_been_pinned = true;
            self.pinned_by = Some(participant);
        } else {
            self.pinned_by = None;
        }
    }

    // =========================================================================
    // Replica updates
    // =========================================================================

    /// Replays a confirmation on a participant-side replica.
    pub fn apply_confirmation(&mut self, confirmation: &Confirmation) {
        match *confirmation {
            Confirmation::Pickup { participant, .. } => self.held_by = Some(participant),
            Confirmation::Move {
                position,
                quaternion,
            } => {
                self.position = Some(position);
                self.quaternion = Some(quaternion);
            }
            Confirmation::Drop { .. } => self.held_by = None,
            Confirmation::Scale { scale, .. } => self.scale = Some(scale),
            Confirmation::TogglePin { participant } => self.toggle_pin(participant),
        }
    }

    /// Overwrites everything with `snapshot`.
    pub fn restore(&mut self, snapshot: &ObjectSnapshot) {
        self.position = snapshot.transform.position;
        self.quaternion = snapshot.transform.quaternion;
        self.scale = snapshot.transform.scale;
        self.held_by = snapshot.held_by;
        self.pinned = snapshot.pinned;
        self.has_ever_been_pinned = snapshot.has_ever_been_pinned;
        self.pinned_by = snapshot.pinned_by;
    }

    /// Full-state snapshot for a late joiner.
    #[must_use]
    pub fn snapshot(&self) -> ObjectSnapshot {
        ObjectSnapshot {
            transform: self.transform(),
            held_by: self.held_by,
            pinned: self.pinned,
            has_ever_been_pinned: self.has_ever_been_pinned,
            pinned_by: self.pinned_by,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current holder.
    #[inline]
    #[must_use]
    pub const fn held_by(&self) -> Option<ParticipantId> {
        self.held_by
    }

    /// True while somebody holds the object.
    #[inline]
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.held_by.is_some()
    }

    /// Pinned flag.
    #[inline]
    #[must_use]
    pub const fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Latched once the object was first pinned.
    #[inline]
    #[must_use]
    pub const fn has_ever_been_pinned(&self) -> bool {
        self.has_ever_been_pinned
    }

    /// Who pinned the object, while pinned.
    #[inline]
    #[must_use]
    pub const fn pinned_by(&self) -> Option<ParticipantId> {
        self.pinned_by
    }

    /// Transform with possibly undefined components.
    #[must_use]
    pub const fn transform(&self) -> ObjectTransform {
        ObjectTransform {
            position: self.position,
            quaternion: self.quaternion,
            scale: self.scale,
        }
    }

    /// True once position, rotation and scale are all defined.
    #[must_use]
    pub const fn has_transform(&self) -> bool {
        self.transform().is_complete()
    }
}
