//! # Concord Core
//!
//! Scene graph and geometry used by every participant:
//! - A generational node arena where the shared object, the controllers and
//!   the scene root live
//! - World-preserving reparenting, so grabbing an object never makes it jump
//! - Axis-aligned boxes and rays for proximity and pointing tests
//!
//! ## Node Hierarchy
//!
//! ```text
//!          root
//!         /    \
//!   controller  object        (object not held)
//!
//!          root
//!           |
//!       controller
//!           |
//!         object              (object held by this controller)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use concord_core::{Pose, SceneGraph};
//!
//! let mut scene = SceneGraph::new();
//! let hand = scene.spawn(scene.root(), Pose::IDENTITY)?;
//! let object = scene.spawn(scene.root(), Pose::IDENTITY)?;
//! scene.attach(object, hand)?; // world transform unchanged
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod geometry;
pub mod scene;

pub use error::{SceneError, SceneResult};
pub use geometry::{Aabb, Ray};
pub use scene::{NodeId, Pose, SceneGraph};
