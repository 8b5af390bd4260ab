//! # Pinch Scaling
//!
//! ```text
//!            both hands raycast the object
//!            + both triggers down
//!   ┌──────┐ ──────────────────────────────► ┌─────────┐
//!   │ Idle │   capture initial distance      │ Scaling │
//!   └──────┘ ◄────────────────────────────── └─────────┘
//!              either trigger released
//! ```
//!
//! While scaling, the change in two-hand distance outside the deadband is
//! divided by the rate divisor and added to (or taken from) the uniform scale.

use glam::Vec3;

use crate::config::GestureConfig;
use crate::gesture::context::{GestureContext, ScalingState};

/// What the scaling gesture needs to know about this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchInput {
    /// The holding hand's ray hits the object.
    pub holding_raycast: bool,
    /// The other hand's ray hits the object.
    pub other_raycast: bool,
    /// Left controller world position.
    pub left_position: Vec3,
    /// Right controller world position.
    pub right_position: Vec3,
}

impl PinchInput {
    fn hand_distance(&self) -> f32 {
        self.left_position.distance(self.right_position)
    }
}

/// Grows a scale scalar.
#[must_use]
pub fn scale_up(scale: f32, amount: f32) -> f32 {
    scale + amount
}

/// Shrinks a scale scalar, never below `min_size`.
#[must_use]
pub fn scale_down(scale: f32, amount: f32, min_size: f32) -> f32 {
    (scale - amount).max(min_size)
}

/// Advances the scaling gesture by one frame.
///
/// Does nothing unless `context` has a holding hand. Returns the new uniform
/// scale when it changed.
pub fn update_pinch_scale(
    context: &mut GestureContext,
    input: &PinchInput,
    current_scale: f32,
    config: &GestureConfig,
) -> Option<f32> {
    context.holding_hand?;

    if let ScalingState::Idle = context.scaling {
        if !(input.holding_raycast && input.other_raycast && context.both_triggers()) {
            return None;
        }
        let initial_distance = input.hand_distance();
        context.scaling = ScalingState::Scaling { initial_distance };
        tracing::debug!(initial_distance, "pinch scaling started");
    }

    let ScalingState::Scaling { initial_distance } = context.scaling else {
        return None;
    };
    let delta = input.hand_distance() - initial_distance;
    if delta > config.scale_deadband {
        Some(scale_up(current_scale, delta / config.scale_rate_divisor))
    } else if delta < -config.scale_deadband {
        Some(scale_down(
            current_scale,
            delta.abs() / config.scale_rate_divisor,
            config.min_size,
        ))
    } else {
        None
    }
}
