//! # Host Boundary
//!
//! The application host embeds the engine. It describes what to load and
//! where, receives pin notifications, and can be asked to pin or unpin.
//!
//! ```text
//!   HOST                                  ENGINE (LocalAgent)
//!    | app_descriptor() ----------------->|  url, static, pinned, transform
//!    |<------------------- set_pin_state  |  mirror of replica.pinned
//!    |<---------------------- did_pin     |  after a local pin
//!    |<---------------------- did_unpin   |
//!    | HostRequest::{Pin, Unpin} -------->|  on_host_request
//!    | provide_transform() -------------->|  pull-based query
//! ```

use concord_shared::{ObjectTransform, Vec3};

/// What the host wants rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    /// A 3D model; the decoder reports its bounds.
    Model,
    /// An image mapped onto a plane.
    Image,
}

/// The asset the host asks for.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetDescriptor {
    /// Where to fetch it.
    pub url: String,
    /// Model or image.
    pub kind: AssetKind,
    /// Static assets are placed and replicated but never interactive.
    pub is_static: bool,
    /// The host wants the object pinned on first load.
    pub is_pinned: bool,
}

/// Everything the host knows about this app instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppDescriptor {
    /// Host-assigned app id, used in logs.
    pub app_id: String,
    /// Asset to load; the configured default model when absent.
    pub asset: Option<AssetDescriptor>,
    /// Full starting transform.
    pub initial_transform: Option<ObjectTransform>,
    /// Starting position only.
    pub initial_position: Option<Vec3>,
    /// Running inside an embedding host (enables the handedness fix).
    pub embedded: bool,
}

/// Requests the host sends to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostRequest {
    /// Pin the object where it is.
    Pin,
    /// Release a pin.
    Unpin,
}

/// Callbacks into the embedding host.
pub trait HostBoundary {
    /// Current app descriptor, if the host has one.
    fn app_descriptor(&self) -> Option<AppDescriptor>;

    /// Mirrors the replicated pin flag.
    fn set_pin_state(&mut self, pinned: bool);

    /// This participant pinned the object at `transform`.
    fn did_pin(&mut self, transform: &ObjectTransform);

    /// This participant unpinned the object.
    fn did_unpin(&mut self);
}

/// A call the engine made into [`MockHost`].
#[derive(Clone, Debug, PartialEq)]
pub enum HostCall {
    /// `set_pin_state(pinned)`
    SetPinState(bool),
    /// `did_pin(transform)`
    DidPin(ObjectTransform),
    /// `did_unpin()`
    DidUnpin,
}

/// In-memory host that records every callback.
#[derive(Clone, Debug, Default)]
pub struct MockHost {
    descriptor: Option<AppDescriptor>,
    calls: Vec<HostCall>,
}

impl MockHost {
    /// Host that answers with `descriptor`.
    #[must_use]
    pub fn new(descriptor: AppDescriptor) -> Self {
        Self {
            descriptor: Some(descriptor),
            calls: Vec::new(),
        }
    }

    /// Host with no descriptor at all.
    #[must_use]
    pub fn without_descriptor() -> Self {
        Self::default()
    }

    /// Calls received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Last pin state the engine mirrored.
    #[must_use]
    pub fn pin_state(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::SetPinState(pinned) => Some(*pinned),
            _ => None,
        })
    }
}

impl HostBoundary for MockHost {
    fn app_descriptor(&self) -> Option<AppDescriptor> {
        self.descriptor.clone()
    }

    fn set_pin_state(&mut self, pinned: bool) {
        self.calls.push(HostCall::SetPinState(pinned));
    }

    fn did_pin(&mut self, transform: &ObjectTransform) {
        self.calls.push(HostCall::DidPin(*transform));
    }

    fn did_unpin(&mut self) {
        self.calls.push(HostCall::DidUnpin);
    }
}
