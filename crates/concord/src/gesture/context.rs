//! Per-participant gesture state.

use concord_shared::Handedness;

use crate::input::PerHand;

/// Pinch-scaling state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ScalingState {
    /// Not scaling.
    #[default]
    Idle,
    /// Scaling relative to the two-hand distance captured on entry.
    Scaling {
        /// Distance between the hands when scaling started.
        initial_distance: f32,
    },
}

/// Trigger flags, scaling state and holding hand of one participant.
///
/// Passed explicitly into the gesture functions; nothing here is global.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GestureContext {
    /// Trigger held, by corrected hand.
    pub triggers: PerHand<bool>,
    /// Pinch-scaling state.
    pub scaling: ScalingState,
    /// Hand holding the object, once the authority confirmed our pickup.
    pub holding_hand: Option<Handedness>,
}

impl GestureContext {
    /// Fresh context: no triggers, idle, not holding.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a trigger press or release.
    pub fn set_trigger(&mut self, hand: Handedness, pressed: bool) {
        *self.triggers.get_mut(hand) = pressed;
    }

    /// True while `hand`'s trigger is down.
    #[must_use]
    pub const fn trigger(&self, hand: Handedness) -> bool {
        self.triggers.get(hand)
    }

    /// True while both triggers are down.
    #[must_use]
    pub const fn both_triggers(&self) -> bool {
        self.triggers.left && self.triggers.right
    }

    /// True while pinch scaling.
    #[must_use]
    pub const fn is_scaling(&self) -> bool {
        matches!(self.scaling, ScalingState::Scaling { .. })
    }

    /// Leaves scaling and forgets the captured distance.
    pub fn reset_scaling(&mut self) {
        self.scaling = ScalingState::Idle;
    }
}
