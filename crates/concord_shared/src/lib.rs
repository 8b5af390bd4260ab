//! # Concord Shared
//!
//! Common types used by both participants and the authority.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on the scene graph or the transport.
//! Anything here can end up on the wire, so it stays plain data.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;
pub mod protocol;

pub use constants::{
    MIN_SIZE, PUSH_PULL_DEADZONE, PUSH_PULL_VELOCITY_MULTIPLIER, SCALE_DEADBAND,
};
pub use math::{Quaternion, Vec3};
pub use protocol::{
    Confirmation, EventKind, Handedness, Intent, ObjectSnapshot, ObjectTransform, ParticipantId,
};
