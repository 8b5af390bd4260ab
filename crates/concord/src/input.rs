//! Per-frame controller input as reported by the XR runtime.

use concord_shared::Handedness;
use glam::{Quat, Vec3};

/// One value per hand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PerHand<T> {
    /// Left hand.
    pub left: T,
    /// Right hand.
    pub right: T,
}

impl<T: Copy> PerHand<T> {
    /// Same value for both hands.
    pub const fn splat(value: T) -> Self {
        Self {
            left: value,
            right: value,
        }
    }

    /// Value for `hand`.
    #[inline]
    pub const fn get(&self, hand: Handedness) -> T {
        match hand {
            Handedness::Left => self.left,
            Handedness::Right => self.right,
        }
    }
}

impl<T> PerHand<T> {
    /// Mutable slot for `hand`.
    #[inline]
    pub fn get_mut(&mut self, hand: Handedness) -> &mut T {
        match hand {
            Handedness::Left => &mut self.left,
            Handedness::Right => &mut self.right,
        }
    }
}

/// One tracked controller.
#[derive(Clone, Debug, PartialEq)]
pub struct InputSource {
    /// Label as reported by the host, before any correction.
    pub handedness: Handedness,
    /// Grip position in world space.
    pub position: Vec3,
    /// Grip orientation in world space. The pointing ray is its -Z.
    pub rotation: Quat,
    /// Gamepad axes; odd indices are the forward/back thumbstick axes.
    pub axes: Vec<f32>,
}

impl InputSource {
    /// Controller with no thumbstick input.
    #[must_use]
    pub fn new(handedness: Handedness, position: Vec3, rotation: Quat) -> Self {
        Self {
            handedness,
            position,
            rotation,
            axes: Vec::new(),
        }
    }

    /// Same controller with `axes`.
    #[must_use]
    pub fn with_axes(mut self, axes: Vec<f32>) -> Self {
        self.axes = axes;
        self
    }

    /// World-space pointing direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }
}

/// Labels of the first two sources, in host order.
pub type SourceOrder = [Option<Handedness>; 2];

/// Everything the runtime reported for one frame, sources in host order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputFrame {
    /// Tracked controllers.
    pub sources: Vec<InputSource>,
}

impl InputFrame {
    /// Frame with the given sources.
    #[must_use]
    pub fn new(sources: Vec<InputSource>) -> Self {
        Self { sources }
    }

    /// Host-reported labels of the first two sources.
    #[must_use]
    pub fn source_order(&self) -> SourceOrder {
        let label = |i: usize| self.sources.get(i).map(|s| s.handedness);
        [label(0), label(1)]
    }
}
