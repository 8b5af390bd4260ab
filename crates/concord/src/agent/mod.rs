//! # Local Agent
//!
//! One per participant. Reacts to controller input and to the authority's
//! confirmations, and turns both into intents and view updates.
//!
//! ## Frame Order
//!
//! ```text
//! on_frame(input)
//!   1. controllers     ← input sources (corrected labels)
//!   2. replica + view  ← pending confirmations
//!   3. placement       ← finished asset load (once)
//!   4. world box       ← object world transform
//!   5. Move intent     ← while we hold the object
//!   6. ray / box tests ← per hand
//!   7. pinch scaling, push/pull
//! ```
//!
//! Trigger presses arrive between frames through [`LocalAgent::on_select_start`]
//! and [`LocalAgent::on_select_end`].
//!
//! ## Optimism
//!
//! A pickup attaches the object to the controller right away and only then
//! asks the authority. If another participant's Pickup is confirmed first,
//! the attachment is rolled back when that confirmation arrives.

mod interaction;
mod view;

use std::sync::Arc;

use concord_core::{NodeId, Pose, SceneGraph};
use concord_networking::{ReplicaClient, ReplicatedObjectState};
use concord_shared::{Handedness, Intent, ObjectTransform, ParticipantId};
use tokio::runtime::Handle;

use crate::acquisition::{AcquisitionSignals, TargetAcquisition};
use crate::assets::{self, AssetFetcher, AssetPoll, AssetRequest, PendingAsset};
use crate::config::EngineConfig;
use crate::error::ConcordResult;
use crate::gesture::{self, GestureContext, PinchInput};
use crate::host::{AppDescriptor, HostBoundary};
use crate::input::{InputFrame, PerHand, SourceOrder};

/// Where the asset load stands.
#[derive(Debug)]
enum LoadState {
    Idle,
    Loading(PendingAsset),
    Loaded,
    Failed,
}

/// The placed object.
#[derive(Clone, Copy, Debug)]
struct SharedObject {
    node: NodeId,
    /// `None` for static assets.
    acquisition: Option<TargetAcquisition>,
}

/// Per-participant orchestrator.
pub struct LocalAgent<H: HostBoundary> {
    config: EngineConfig,
    host: H,
    descriptor: Option<AppDescriptor>,
    client: ReplicaClient,
    scene: SceneGraph,
    controllers: PerHand<NodeId>,
    object: Option<SharedObject>,
    load: LoadState,
    gestures: GestureContext,
    signals: AcquisitionSignals,
    source_order: SourceOrder,
}

impl<H: HostBoundary> LocalAgent<H> {
    /// Creates an agent with an empty scene and both controllers at the origin.
    ///
    /// # Errors
    ///
    /// Only if the scene arena cannot hold the controller nodes.
    pub fn new(client: ReplicaClient, host: H, config: EngineConfig) -> ConcordResult<Self> {
        let mut scene = SceneGraph::new();
        let root = scene.root();
        let controllers = PerHand {
            left: scene.spawn(root, Pose::IDENTITY)?,
            right: scene.spawn(root, Pose::IDENTITY)?,
        };

        let descriptor = host.app_descriptor();
        if descriptor.is_none() {
            tracing::debug!(participant = %client.participant(), "no app descriptor, using defaults");
        }

        Ok(Self {
            config,
            host,
            descriptor,
            client,
            scene,
            controllers,
            object: None,
            load: LoadState::Idle,
            gestures: GestureContext::new(),
            signals: AcquisitionSignals::default(),
            source_order: [None, None],
        })
    }

    // =========================================================================
    // Asset loading
    // =========================================================================

    /// Starts loading the host's asset on `handle`'s blocking pool.
    pub fn begin_load(&mut self, handle: &Handle, fetcher: Arc<dyn AssetFetcher>) {
        let request = self.asset_request();
        self.load = LoadState::Loading(assets::spawn_load(handle, fetcher, request));
    }

    /// Tracks a load started elsewhere.
    pub fn attach_pending(&mut self, pending: PendingAsset) {
        self.load = LoadState::Loading(pending);
    }

    /// The asset this agent loads.
    #[must_use]
    pub fn asset_request(&self) -> AssetRequest {
        AssetRequest::resolve(self.descriptor.as_ref(), &self.config)
    }

    /// Places the object once the asset is ready and the join snapshot has
    /// arrived, so placement starts from the replicated transform.
    fn poll_load(&mut self) -> ConcordResult<()> {
        if !self.client.is_synced() {
            return Ok(());
        }
        let LoadState::Loading(pending) = &mut self.load else {
            return Ok(());
        };
        match pending.poll() {
            AssetPoll::Pending => Ok(()),
            AssetPoll::Ready(asset) => {
                self.load = LoadState::Loaded;
                self.place(&asset)
            }
            AssetPoll::Failed(error) => {
                assets::log_load_failure(&error, self.config.debug_mode);
                self.load = LoadState::Failed;
                Ok(())
            }
        }
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// Runs one frame.
    ///
    /// # Errors
    ///
    /// Bus errors when the authority is gone, or scene errors on broken
    /// invariants.
    pub fn on_frame(&mut self, input: &InputFrame) -> ConcordResult<()> {
        self.source_order = input.source_order();
        self.update_controllers(input)?;

        for (confirmation, state) in self.client.poll_with_state() {
            self.apply_confirmation(&confirmation, &state)?;
        }

        self.poll_load()?;

        let Some(object) = self.object.as_mut() else {
            return Ok(());
        };
        let node = object.node;
        let Some(acquisition) = object.acquisition.as_mut() else {
            return Ok(());
        };
        acquisition.refresh(&self.scene, node)?;
        let acquisition = *acquisition;

        self.publish_holder_move(node)?;

        self.signals = AcquisitionSignals::default();
        if input.sources.is_empty() {
            return Ok(());
        }
        self.update_signals(input, &acquisition)?;
        self.update_scaling(node)?;
        self.update_push_pull(input, node)
    }

    fn update_controllers(&mut self, input: &InputFrame) -> ConcordResult<()> {
        for source in &input.sources {
            let hand = self.correct(source.handedness);
            self.scene.set_local(
                self.controllers.get(hand),
                Pose::from_translation_rotation(source.position, source.rotation),
            )?;
        }
        Ok(())
    }

    fn publish_holder_move(&mut self, node: NodeId) -> ConcordResult<()> {
        if self.client.replica().held_by() != Some(self.participant())
            || self.gestures.holding_hand.is_none()
        {
            return Ok(());
        }
        let world = self.scene.world_pose(node)?;
        self.send(Intent::Move {
            position: world.translation.into(),
            quaternion: world.rotation.into(),
        })
    }

    fn update_signals(
        &mut self,
        input: &InputFrame,
        acquisition: &TargetAcquisition,
    ) -> ConcordResult<()> {
        for source in &input.sources {
            // Raycasts stay on host labels
            *self.signals.raycast.get_mut(source.handedness) =
                acquisition.raycast_hits(source.position, source.forward());

            let hand = self.correct(source.handedness);
            let position = self.scene.world_pose(self.controllers.get(hand))?.translation;
            *self.signals.collide.get_mut(hand) = acquisition.collides(position);
        }
        Ok(())
    }

    fn update_scaling(&mut self, node: NodeId) -> ConcordResult<()> {
        let Some(holding) = self.gestures.holding_hand else {
            return Ok(());
        };
        let pinch = PinchInput {
            holding_raycast: self.raycast_by_hand(holding),
            other_raycast: self.raycast_by_hand(holding.opposite()),
            left_position: self.scene.world_pose(self.controllers.left)?.translation,
            right_position: self.scene.world_pose(self.controllers.right)?.translation,
        };
        let mut local = self.scene.local(node)?;
        let Some(scale) =
            gesture::update_pinch_scale(&mut self.gestures, &pinch, local.scale.x, &self.config.gesture)
        else {
            return Ok(());
        };

        local.scale = glam::Vec3::splat(scale);
        self.scene.set_local(node, local)?;
        self.send(Intent::Scale {
            participant: self.participant(),
            scale: local.scale.into(),
        })
    }

    fn update_push_pull(&mut self, input: &InputFrame, node: NodeId) -> ConcordResult<()> {
        let Some(holding) = self.gestures.holding_hand else {
            return Ok(());
        };
        if self.scene.parent(node)? != Some(self.controllers.get(holding)) {
            return Ok(());
        }
        let Some(source) = input
            .sources
            .iter()
            .find(|s| self.correct(s.handedness) == holding)
        else {
            return Ok(());
        };

        let mut local = self.scene.local(node)?;
        if let Some(depth) =
            gesture::step_push_pull(local.translation.z, &source.axes, &self.config.gesture)
        {
            local.translation.z = depth;
            self.scene.set_local(node, local)?;
        }
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn correct(&self, label: Handedness) -> Handedness {
        let embedded = self.descriptor.as_ref().is_some_and(|d| d.embedded);
        gesture::correct_handedness(label, embedded, self.source_order)
    }

    /// Raycast result for a corrected hand. Correction is its own inverse, so
    /// applying it again yields the host label the ray is stored under.
    fn raycast_by_hand(&self, hand: Handedness) -> bool {
        self.signals.raycast.get(self.correct(hand))
    }

    fn send(&mut self, intent: Intent) -> ConcordResult<()> {
        tracing::trace!(participant = %self.participant(), kind = ?intent.kind(), "intent");
        self.client.send(&intent)?;
        Ok(())
    }

    fn is_attached_to(&self, node: NodeId, hand: Handedness) -> ConcordResult<bool> {
        Ok(self.scene.parent(node)? == Some(self.controllers.get(hand)))
    }

    fn app_id(&self) -> &str {
        self.descriptor.as_ref().map_or("", |d| d.app_id.as_str())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Who this agent is.
    #[inline]
    #[must_use]
    pub const fn participant(&self) -> ParticipantId {
        self.client.participant()
    }

    /// Local replica of the shared state.
    #[must_use]
    pub const fn replica(&self) -> &ReplicatedObjectState {
        self.client.replica()
    }

    /// The participant's scene.
    #[must_use]
    pub const fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Controller node for a corrected hand.
    #[must_use]
    pub const fn controller(&self, hand: Handedness) -> NodeId {
        self.controllers.get(hand)
    }

    /// Object node, once placed.
    #[must_use]
    pub fn object_node(&self) -> Option<NodeId> {
        self.object.map(|o| o.node)
    }

    /// Object's world pose as this participant sees it.
    #[must_use]
    pub fn object_world_pose(&self) -> Option<Pose> {
        self.object
            .and_then(|o| self.scene.world_pose(o.node).ok())
    }

    /// True while the object is attached to one of our controllers.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.object.is_some_and(|o| {
            self.is_attached_to(o.node, Handedness::Left).unwrap_or(false)
                || self.is_attached_to(o.node, Handedness::Right).unwrap_or(false)
        })
    }

    /// Gesture state.
    #[must_use]
    pub const fn gestures(&self) -> &GestureContext {
        &self.gestures
    }

    /// Last frame's acquisition results.
    #[must_use]
    pub const fn signals(&self) -> &AcquisitionSignals {
        &self.signals
    }

    /// The embedding host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// True once the asset is placed.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self.load, LoadState::Loaded)
    }

    /// True if the load failed; the object will never appear.
    #[must_use]
    pub const fn load_failed(&self) -> bool {
        matches!(self.load, LoadState::Failed)
    }

    /// True once placed and not static.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.object.is_some_and(|o| o.acquisition.is_some())
    }

    /// Answers the host's transform query with the replicated transform.
    ///
    /// `None` until the object is placed.
    #[must_use]
    pub fn provide_transform(&self) -> Option<ObjectTransform> {
        self.object.map(|_| self.client.replica().transform())
    }
}
