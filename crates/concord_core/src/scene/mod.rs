//! # Scene
//!
//! Node handles, poses and the graph that owns them.

mod graph;
mod node;

pub use graph::SceneGraph;
pub use node::{NodeId, Pose};
