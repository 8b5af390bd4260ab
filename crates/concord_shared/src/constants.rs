//! # Gesture & Session Constants
//!
//! Default tuning shared by every participant.
//!
//! **NOTE:** These are only defaults. `concord::EngineConfig` can override
//! each of them from TOML, but all participants in one session should agree.

// =============================================================================
// PINCH SCALING
// =============================================================================

/// Smallest uniform scale an object can be shrunk to, per axis.
pub const MIN_SIZE: f32 = 0.1;

/// Two-hand distance change (meters) ignored around the captured initial distance.
pub const SCALE_DEADBAND: f32 = 0.05;

/// Distance delta is divided by this before being applied to the scale scalar.
pub const SCALE_RATE_DIVISOR: f32 = 10.0;

// =============================================================================
// PUSH / PULL
// =============================================================================

/// Joystick magnitude below which push/pull input is ignored.
pub const PUSH_PULL_DEADZONE: f32 = 0.1;

/// Base push/pull velocity per frame.
pub const PUSH_PULL_VELOCITY_MULTIPLIER: f32 = 0.001;

/// Gain applied to the raw joystick axis.
pub const PUSH_PULL_AXIS_GAIN: f32 = 10.0;

/// Exponent on |depth| so distant objects travel faster than near ones.
pub const PUSH_PULL_DEPTH_EXPONENT: f32 = 1.25;

/// Pulling stops once the object is closer than this (controller-local z).
pub const MIN_PULL_DEPTH: f32 = -0.4;

/// Pushing stops once the object is farther than this (controller-local z).
pub const MAX_PUSH_DEPTH: f32 = -25.0;

// =============================================================================
// ASSETS
// =============================================================================

/// Longest edge of the plane an image asset is mapped onto.
pub const IMAGE_PLANE_EXTENT: f32 = 3.0;

/// Model loaded when the host does not name one.
pub const DEFAULT_MODEL_URL: &str = "../assets/models/defaultmodel.glb";

// =============================================================================
// FRAME LOOP
// =============================================================================

/// Default frame rate for session drivers (typical XR headset refresh).
pub const DEFAULT_FRAME_RATE: u32 = 72;
