//! # Input Gestures
//!
//! Pure functions over an explicit [`GestureContext`]:
//! - [`correct_handedness`]: host label fix-up
//! - [`update_pinch_scale`]: two-hand uniform scaling
//! - [`step_push_pull`]: thumbstick depth control while holding

mod context;
mod handedness;
mod push_pull;
mod scaling;

pub use context::{GestureContext, ScalingState};
pub use handedness::correct_handedness;
pub use push_pull::{push_pull_velocity, step_push_pull};
pub use scaling::{scale_down, scale_up, update_pinch_scale, PinchInput};
