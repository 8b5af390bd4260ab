//! # Push / Pull
//!
//! While held, the holding controller's thumbstick moves the object along the
//! controller's forward axis. Distant objects travel faster:
//!
//! ```text
//! velocity = multiplier * axis * gain * |depth|^exponent
//! ```
//!
//! The velocity is added to the depth once per frame; there is no wall-clock
//! scaling.

use crate::config::GestureConfig;

/// Per-frame depth change for `axis` at `depth`.
#[must_use]
pub fn push_pull_velocity(axis: f32, depth: f32, config: &GestureConfig) -> f32 {
    config.push_pull_velocity_multiplier
        * axis
        * config.push_pull_axis_gain
        * depth.abs().powf(config.push_pull_depth_exponent)
}

/// Applies one frame of thumbstick input to `depth` (controller-local z,
/// negative in front of the controller).
///
/// Every odd-indexed axis outside the deadzone contributes. Pulling stops
/// above `min_pull_depth` and pushing stops below `max_push_depth`. Returns
/// the new depth, or `None` if nothing moved.
#[must_use]
pub fn step_push_pull(depth: f32, axes: &[f32], config: &GestureConfig) -> Option<f32> {
    let mut z = depth;
    let mut moved = false;
    for axis in axes.iter().skip(1).step_by(2).copied() {
        if axis.abs() <= config.push_pull_deadzone {
            continue;
        }
        let too_close = z > config.min_pull_depth && axis > 0.0;
        let too_far = z < config.max_push_depth && axis < 0.0;
        if too_close || too_far {
            continue;
        }
        z += push_pull_velocity(axis, z, config);
        moved = true;
    }
    moved.then_some(z)
}
