//! Scene graph error types.

use thiserror::Error;

use crate::scene::NodeId;

/// Errors raised by scene graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// Node was despawned, or belongs to another generation.
    #[error("stale node handle {0:?}")]
    StaleNode(NodeId),

    /// Reparenting would make a node its own ancestor.
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// Node being moved.
        child: NodeId,
        /// Requested parent.
        parent: NodeId,
    },

    /// The root has no parent and is never despawned.
    #[error("scene root cannot be reparented or despawned")]
    RootImmutable,

    /// Parent world matrix cannot be inverted (zero scale).
    #[error("world transform of {0:?} is not invertible")]
    Degenerate(NodeId),

    /// Arena has no free index left.
    #[error("scene node arena is full")]
    CapacityExceeded,
}

/// Result type for scene graph operations.
pub type SceneResult<T> = Result<T, SceneError>;
