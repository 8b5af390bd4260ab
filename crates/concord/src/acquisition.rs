//! # Target Acquisition
//!
//! Answers "is this hand touching or pointing at the object?".
//!
//! The world-space box is rebuilt from the local bounds every frame. It
//! changes continuously while the object is held or scaled, so there is
//! nothing worth caching.

use concord_core::{Aabb, NodeId, Ray, SceneGraph, SceneResult};
use glam::Vec3;

use crate::input::PerHand;

/// Acquisition results for one frame.
///
/// Raycast hits are keyed by the host-reported label, collisions by the
/// corrected label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AcquisitionSignals {
    /// Controller position inside the box.
    pub collide: PerHand<bool>,
    /// Controller ray hits the box.
    pub raycast: PerHand<bool>,
}

/// Proximity and pointing tests against one object.
#[derive(Clone, Copy, Debug)]
pub struct TargetAcquisition {
    local_bounds: Aabb,
    world_bounds: Aabb,
}

impl TargetAcquisition {
    /// Tracks an object with `local_bounds`.
    #[must_use]
    pub const fn new(local_bounds: Aabb) -> Self {
        Self {
            local_bounds,
            world_bounds: local_bounds,
        }
    }

    /// Recomputes the world box from `node`'s current world transform.
    ///
    /// # Errors
    ///
    /// Propagates [`concord_core::SceneError`] for a stale node.
    pub fn refresh(&mut self, scene: &SceneGraph, node: NodeId) -> SceneResult<()> {
        let world = scene.world_matrix(node)?;
        self.world_bounds = self.local_bounds.to_world(&world);
        Ok(())
    }

    /// Point-in-box test.
    #[must_use]
    pub fn collides(&self, point: Vec3) -> bool {
        self.world_bounds.contains_point(point)
    }

    /// Ray-vs-box test.
    #[must_use]
    pub fn raycast_hits(&self, origin: Vec3, direction: Vec3) -> bool {
        if direction.length_squared() <= f32::EPSILON {
            return false;
        }
        Ray::new(origin, direction)
            .intersects_aabb(&self.world_bounds)
            .is_some()
    }

    /// Box from the last refresh.
    #[must_use]
    pub const fn world_bounds(&self) -> Aabb {
        self.world_bounds
    }

    /// Bounds in the object's own space.
    #[must_use]
    pub const fn local_bounds(&self) -> Aabb {
        self.local_bounds
    }
}
