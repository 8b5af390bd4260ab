//! # Scene Graph
//!
//! Arena of nodes with a free list. Despawned slots are recycled with a bumped
//! generation so old handles are rejected instead of aliasing new nodes.

use glam::Mat4;

use super::node::{NodeId, Pose};
use crate::error::{SceneError, SceneResult};

#[derive(Debug)]
struct NodeData {
    local: Pose,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

/// Hierarchy of posed nodes under a single root.
#[derive(Debug)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    root: NodeId,
}

impl SceneGraph {
    /// Creates a scene holding only the root.
    #[must_use]
    pub fn new() -> Self {
        let root = NodeId::new(0, 0);
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(NodeData {
                    local: Pose::IDENTITY,
                    parent: None,
                    children: Vec::new(),
                }),
            }],
            free_list: Vec::new(),
            root,
        }
    }

    /// The scene root.
    #[inline]
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Always false; the root is never removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True if `node` refers to a live node.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.data(node).is_ok()
    }

    fn data(&self, node: NodeId) -> SceneResult<&NodeData> {
        self.slots
            .get(node.index() as usize)
            .filter(|slot| slot.generation == node.generation())
            .and_then(|slot| slot.node.as_ref())
            .ok_or(SceneError::StaleNode(node))
    }

    fn data_mut(&mut self, node: NodeId) -> SceneResult<&mut NodeData> {
        self.slots
            .get_mut(node.index() as usize)
            .filter(|slot| slot.generation == node.generation())
            .and_then(|slot| slot.node.as_mut())
            .ok_or(SceneError::StaleNode(node))
    }

    /// Spawns a node under `parent` with the given local pose.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `parent` is not live, or
    /// [`SceneError::CapacityExceeded`] when the arena index space is used up.
    pub fn spawn(&mut self, parent: NodeId, local: Pose) -> SceneResult<NodeId> {
        self.data(parent)?;

        let data = NodeData {
            local,
            parent: Some(parent),
            children: Vec::new(),
        };

        let id = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(data);
            NodeId::new(index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len()).map_err(|_| SceneError::CapacityExceeded)?;
            self.slots.push(Slot {
                generation: 0,
                node: Some(data),
            });
            NodeId::new(index, 0)
        };

        self.data_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Removes `node` and its whole subtree.
    ///
    /// # Errors
    ///
    /// Fails for the root or a stale handle.
    pub fn despawn(&mut self, node: NodeId) -> SceneResult<()> {
        if node == self.root {
            return Err(SceneError::RootImmutable);
        }
        let parent = self.data(node)?.parent;
        if let Some(parent) = parent {
            self.data_mut(parent)?.children.retain(|c| *c != node);
        }

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index() as usize];
            if let Some(data) = slot.node.take() {
                stack.extend(data.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(current.index());
            }
        }
        Ok(())
    }

    /// Parent of `node` (`None` only for the root).
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not live.
    pub fn parent(&self, node: NodeId) -> SceneResult<Option<NodeId>> {
        Ok(self.data(node)?.parent)
    }

    /// Direct children of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not live.
    pub fn children(&self, node: NodeId) -> SceneResult<&[NodeId]> {
        Ok(&self.data(node)?.children)
    }

    /// Pose relative to the parent.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not live.
    pub fn local(&self, node: NodeId) -> SceneResult<Pose> {
        Ok(self.data(node)?.local)
    }

    /// Overwrites the pose relative to the parent.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not live.
    pub fn set_local(&mut self, node: NodeId, local: Pose) -> SceneResult<()> {
        self.data_mut(node)?.local = local;
        Ok(())
    }

    /// Accumulated world matrix of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` or an ancestor is not live.
    pub fn world_matrix(&self, node: NodeId) -> SceneResult<Mat4> {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(node);
        while let Some(id) = current {
            let data = self.data(id)?;
            matrix = data.local.to_matrix() * matrix;
            current = data.parent;
        }
        Ok(matrix)
    }

    /// Decomposed world pose of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` or an ancestor is not live.
    pub fn world_pose(&self, node: NodeId) -> SceneResult<Pose> {
        Ok(Pose::from_matrix(&self.world_matrix(node)?))
    }

    /// Sets the local pose so that `node` ends up at `world` in world space.
    ///
    /// # Errors
    ///
    /// Fails on stale handles or a non-invertible parent transform.
    pub fn set_world_pose(&mut self, node: NodeId, world: Pose) -> SceneResult<()> {
        let parent = self.data(node)?.parent;
        let local = match parent {
            Some(parent) => {
                let inverse = self.inverse_world(parent)?;
                Pose::from_matrix(&(inverse * world.to_matrix()))
            }
            None => world,
        };
        self.set_local(node, local)
    }

    /// True if `ancestor` is `node` or one of its ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleNode`] if `node` is not live.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> SceneResult<bool> {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self.data(id)?.parent;
        }
        Ok(false)
    }

    /// Moves `child` under `new_parent` keeping its world transform.
    ///
    /// # Errors
    ///
    /// - [`SceneError::RootImmutable`] when `child` is the root
    /// - [`SceneError::Cycle`] when `new_parent` is inside `child`'s subtree
    /// - [`SceneError::Degenerate`] when `new_parent` has zero scale
    pub fn attach(&mut self, child: NodeId, new_parent: NodeId) -> SceneResult<()> {
        if child == self.root {
            return Err(SceneError::RootImmutable);
        }
        self.data(new_parent)?;
        if self.is_ancestor(child, new_parent)? {
            return Err(SceneError::Cycle {
                child,
                parent: new_parent,
            });
        }

        let world = self.world_matrix(child)?;
        let inverse = self.inverse_world(new_parent)?;
        let local = Pose::from_matrix(&(inverse * world));

        let old_parent = self.data(child)?.parent;
        if old_parent == Some(new_parent) {
            return self.set_local(child, local);
        }
        if let Some(old) = old_parent {
            self.data_mut(old)?.children.retain(|c| *c != child);
        }
        self.data_mut(new_parent)?.children.push(child);

        let data = self.data_mut(child)?;
        data.parent = Some(new_parent);
        data.local = local;
        Ok(())
    }

    fn inverse_world(&self, node: NodeId) -> SceneResult<Mat4> {
        let world = self.world_matrix(node)?;
        if world.determinant().abs() <= f32::EPSILON {
            return Err(SceneError::Degenerate(node));
        }
        Ok(world.inverse())
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
