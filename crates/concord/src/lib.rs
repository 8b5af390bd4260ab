//! # Concord
//!
//! Participant engine for one shared, grabbable 3D object.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        LOCAL AGENT                            │
//! │                                                               │
//! │  InputFrame ──► TargetAcquisition ──► gate ──► Intent ──┐     │
//! │      │              (ray + box)                         │     │
//! │      └────────► gestures (pinch, push/pull) ──► Intent ─┤     │
//! │                                                         ▼     │
//! │  SceneGraph ◄── view updates ◄── ReplicaClient ◄─── SyncBus   │
//! │  (attach/detach)                 (confirmations)        ▲     │
//! └─────────────────────────────────────────────────────────┼─────┘
//!                                                           │
//!                                               AuthorityServer
//! ```
//!
//! - **Acquisition**: per-frame ray and box tests against the object
//! - **Gestures**: pinch scaling and push/pull over an explicit context
//! - **Agent**: gates pickup/drop, attaches the object, mirrors the replica
//! - **Host**: app descriptor in, pin notifications out
//! - **Assets**: async environment and asset fetch, the only await point
//!
//! ## Example
//!
//! ```rust,ignore
//! use concord::{EngineConfig, LocalSession, MockHost};
//!
//! let mut session = LocalSession::new(EngineConfig::default());
//! let a = session.join(MockHost::without_descriptor())?;
//! session.step(&[])?;
//! assert!(session.is_converged());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod acquisition;
pub mod agent;
pub mod assets;
pub mod config;
pub mod error;
pub mod gesture;
pub mod host;
pub mod input;
pub mod session;

pub use acquisition::{AcquisitionSignals, TargetAcquisition};
pub use agent::LocalAgent;
pub use assets::{AssetFetcher, AssetPoll, AssetRequest, InMemoryFetcher, LoadedAsset, PendingAsset};
pub use config::{EngineConfig, GestureConfig};
pub use error::{ConcordError, ConcordResult};
pub use gesture::{GestureContext, ScalingState};
pub use host::{AppDescriptor, AssetDescriptor, AssetKind, HostBoundary, HostCall, HostRequest, MockHost};
pub use input::{InputFrame, InputSource, PerHand, SourceOrder};
pub use session::LocalSession;
