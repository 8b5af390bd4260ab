//! Trigger presses and host pin requests.

use concord_shared::{Handedness, Intent, ObjectTransform};

use super::LocalAgent;
use crate::error::ConcordResult;
use crate::host::{HostBoundary, HostRequest};

impl<H: HostBoundary> LocalAgent<H> {
    /// Trigger pressed on the controller the host labels `label`.
    ///
    /// Picks the object up when it is free, unpinned and this hand is
    /// pointing at or touching it.
    ///
    /// # Errors
    ///
    /// Bus or scene errors.
    pub fn on_select_start(&mut self, label: Handedness) -> ConcordResult<()> {
        let Some(object) = self.object.filter(|o| o.acquisition.is_some()) else {
            return Ok(());
        };
        let hand = self.correct(label);
        self.gestures.set_trigger(hand, true);

        let replica = self.client.replica();
        if replica.is_held() || replica.is_pinned() || self.is_attached() {
            return Ok(());
        }
        let acquiring = self.signals.raycast.get(label) || self.signals.collide.get(hand);
        if !acquiring {
            return Ok(());
        }

        self.scene.attach(object.node, self.controllers.get(hand))?;
        tracing::debug!(participant = %self.participant(), ?hand, "object attached, requesting pickup");
        self.send(Intent::Pickup {
            participant: self.participant(),
            handedness: hand,
        })
    }

    /// Trigger released on the controller the host labels `label`.
    ///
    /// Ends pinch scaling. Drops the object if this hand holds it.
    ///
    /// # Errors
    ///
    /// Bus or scene errors.
    pub fn on_select_end(&mut self, label: Handedness) -> ConcordResult<()> {
        let Some(object) = self.object.filter(|o| o.acquisition.is_some()) else {
            return Ok(());
        };
        self.gestures.reset_scaling();
        if self.client.replica().is_pinned() {
            return Ok(());
        }
        let hand = self.correct(label);
        self.gestures.set_trigger(hand, false);

        let confirmed = self.client.replica().held_by() == Some(self.participant())
            && self.gestures.holding_hand == Some(hand);
        // An unconfirmed pickup is released too; the authority orders our
        // Drop after our Pickup.
        if confirmed || self.is_attached_to(object.node, hand)? {
            self.detach_and_drop()?;
        }
        Ok(())
    }

    /// Handles a pin or unpin request from the host.
    ///
    /// # Errors
    ///
    /// Bus or scene errors.
    pub fn on_host_request(&mut self, request: HostRequest) -> ConcordResult<()> {
        if self.object.is_none() {
            tracing::debug!(participant = %self.participant(), ?request, "host request before load, ignored");
            return Ok(());
        }
        match request {
            HostRequest::Pin => self.pin(),
            HostRequest::Unpin => self.unpin(),
        }
    }

    pub(super) fn pin(&mut self) -> ConcordResult<()> {
        if self.client.replica().is_held() {
            tracing::info!(app_id = self.app_id(), "object is held, cannot pin");
            return Ok(());
        }
        self.detach_and_drop()?;
        self.send(Intent::TogglePin {
            participant: self.participant(),
        })?;
        let transform = self.view_transform()?;
        self.host.did_pin(&transform);
        Ok(())
    }

    fn unpin(&mut self) -> ConcordResult<()> {
        self.send(Intent::TogglePin {
            participant: self.participant(),
        })?;
        self.host.did_unpin();
        Ok(())
    }

    pub(super) fn detach_and_drop(&mut self) -> ConcordResult<()> {
        if let Some(object) = self.object {
            self.scene.attach(object.node, self.scene.root())?;
        }
        self.send(Intent::Drop {
            participant: self.participant(),
        })
    }

    fn view_transform(&self) -> ConcordResult<ObjectTransform> {
        let Some(object) = self.object else {
            return Ok(self.client.replica().transform());
        };
        let world = self.scene.world_pose(object.node)?;
        Ok(ObjectTransform {
            position: Some(world.translation.into()),
            quaternion: Some(world.rotation.into()),
            scale: Some(world.scale.into()),
        })
    }
}
