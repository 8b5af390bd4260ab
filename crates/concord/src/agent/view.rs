//! Placement and confirmation-driven view updates.

use concord_core::Pose;
use concord_networking::ReplicatedObjectState;
use concord_shared::{Confirmation, Handedness, Intent};
use glam::{Quat, Vec3};

use super::{LocalAgent, SharedObject};
use crate::acquisition::TargetAcquisition;
use crate::assets::LoadedAsset;
use crate::error::ConcordResult;
use crate::host::HostBoundary;

impl<H: HostBoundary> LocalAgent<H> {
    /// Updates the view for one confirmation. `state` is the replica right
    /// after it was applied.
    pub(super) fn apply_confirmation(
        &mut self,
        confirmation: &Confirmation,
        state: &ReplicatedObjectState,
    ) -> ConcordResult<()> {
        let me = self.participant();
        match *confirmation {
            Confirmation::Pickup {
                participant,
                handedness,
            } => {
                if participant == me {
                    self.gestures.holding_hand = Some(handedness);
                    self.settle_own_pickup(handedness)?;
                } else if let Some(object) = self.object.filter(|_| self.is_attached()) {
                    // Lost the race: give the object back to the world
                    self.scene.attach(object.node, self.scene.root())?;
                    tracing::info!(participant = %me, winner = %participant, "pickup lost, attachment rolled back");
                }
            }
            Confirmation::Drop { participant } => {
                if participant == me {
                    self.gestures.holding_hand = None;
                }
            }
            Confirmation::Move {
                position,
                quaternion,
            } => {
                let Some(object) = self.object else {
                    return Ok(());
                };
                if state.is_pinned() || !state.is_held() || state.held_by() == Some(me) {
                    return Ok(());
                }
                let scale = self.scene.world_pose(object.node)?.scale;
                self.scene.set_world_pose(
                    object.node,
                    Pose {
                        translation: position.into(),
                        rotation: quaternion.into(),
                        scale,
                    },
                )?;
            }
            Confirmation::Scale { participant, scale } => {
                let Some(object) = self.object else {
                    return Ok(());
                };
                if participant == me {
                    return Ok(());
                }
                let mut local = self.scene.local(object.node)?;
                local.scale = scale.into();
                self.scene.set_local(object.node, local)?;
            }
            Confirmation::TogglePin { .. } => {
                self.host.set_pin_state(state.is_pinned());
            }
        }
        Ok(())
    }

    /// Our pickup was confirmed. Released in the meantime: drop it. Rolled
    /// back by an earlier holder's confirmation: attach it again.
    fn settle_own_pickup(&mut self, hand: Handedness) -> ConcordResult<()> {
        let Some(object) = self.object else {
            return Ok(());
        };
        if !self.gestures.trigger(hand) {
            return self.detach_and_drop();
        }
        if !self.is_attached_to(object.node, hand)? {
            self.scene.attach(object.node, self.controllers.get(hand))?;
        }
        Ok(())
    }

    /// Places a freshly loaded asset, publishes its transform and settles the
    /// pin state with the host.
    pub(super) fn place(&mut self, asset: &LoadedAsset) -> ConcordResult<()> {
        let pose = self.initial_pose();
        let node = self.scene.spawn(self.scene.root(), pose)?;
        let acquisition = (!asset.is_static).then(|| TargetAcquisition::new(asset.local_bounds));
        self.object = Some(SharedObject { node, acquisition });

        tracing::info!(
            participant = %self.participant(),
            url = %asset.url,
            is_static = asset.is_static,
            "object placed"
        );

        self.send(Intent::Move {
            position: pose.translation.into(),
            quaternion: pose.rotation.into(),
        })?;
        self.send(Intent::Scale {
            participant: self.participant(),
            scale: pose.scale.into(),
        })?;

        let wants_pin = self
            .descriptor
            .as_ref()
            .and_then(|d| d.asset.as_ref())
            .is_some_and(|a| a.is_pinned);
        let replica = *self.client.replica();
        if !replica.has_ever_been_pinned() && wants_pin {
            self.pin()
        } else {
            self.host.set_pin_state(replica.is_pinned());
            Ok(())
        }
    }

    /// First available of: the replica's complete transform, the host's
    /// initial transform, the host's initial position, the origin.
    fn initial_pose(&self) -> Pose {
        let replicated = self.client.replica().transform();
        if let (Some(position), Some(quaternion), Some(scale)) =
            (replicated.position, replicated.quaternion, replicated.scale)
        {
            return Pose {
                translation: position.into(),
                rotation: quaternion.into(),
                scale: scale.into(),
            };
        }

        let Some(descriptor) = self.descriptor.as_ref() else {
            return Pose::IDENTITY;
        };
        if let Some(initial) = descriptor.initial_transform {
            return Pose {
                translation: initial.position.map_or(Vec3::ZERO, Into::into),
                rotation: initial.quaternion.map_or(Quat::IDENTITY, Into::into),
                scale: initial.scale.map_or(Vec3::ONE, Into::into),
            };
        }
        descriptor
            .initial_position
            .map_or(Pose::IDENTITY, |p| Pose::from_translation(p.into()))
    }
}
