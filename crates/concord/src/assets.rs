//! # Asset Pipeline
//!
//! Fetching the environment and the object's model or image is the only
//! suspension point in a participant. Loads run on the tokio blocking pool
//! and report back over a oneshot channel that the frame loop polls.
//!
//! ```text
//!  frame loop                   tokio blocking pool
//!     | spawn_load ─────────────► fetch_environment()
//!     |                              fetch(request)
//!     | poll() → Pending              │
//!     | poll() → Pending              │
//!     | poll() → Ready(asset) ◄──────┘ (oneshot)
//! ```
//!
//! Until a load completes the object is inert. A failed load is logged and
//! never retried.

use std::sync::Arc;
use std::time::Duration;

use concord_core::Aabb;
use concord_shared::constants::IMAGE_PLANE_EXTENT;
use glam::Vec3;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::config::EngineConfig;
use crate::error::{ConcordError, ConcordResult};
use crate::host::{AppDescriptor, AssetKind};

/// What to fetch, resolved from the host descriptor and config.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetRequest {
    /// Asset location.
    pub url: String,
    /// Model or image.
    pub kind: AssetKind,
    /// Non-interactive once placed.
    pub is_static: bool,
}

impl AssetRequest {
    /// Resolves the request for `descriptor`, falling back to the default model.
    #[must_use]
    pub fn resolve(descriptor: Option<&AppDescriptor>, config: &EngineConfig) -> Self {
        match descriptor.and_then(|d| d.asset.as_ref()) {
            Some(asset) => Self {
                url: asset.url.clone(),
                kind: asset.kind,
                is_static: asset.is_static,
            },
            None => Self {
                url: config.default_model_url.clone(),
                kind: AssetKind::Model,
                is_static: false,
            },
        }
    }
}

/// Raw decoder output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DecodedAsset {
    /// Model with its local-space bounds.
    Model {
        /// Bounds in the model's own space.
        local_bounds: Aabb,
    },
    /// Image with its pixel dimensions.
    Image {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
}

/// A loaded asset, ready to be placed.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedAsset {
    /// Where it came from.
    pub url: String,
    /// Non-interactive once placed.
    pub is_static: bool,
    /// Local-space bounds used for acquisition.
    pub local_bounds: Aabb,
}

/// Fetches and decodes assets. Implementations may block.
pub trait AssetFetcher: Send + Sync + 'static {
    /// Prepares the lighting environment. Runs before the asset fetch.
    ///
    /// # Errors
    ///
    /// [`ConcordError::AssetLoad`] if the environment cannot be fetched.
    fn fetch_environment(&self) -> ConcordResult<()>;

    /// Fetches and decodes one asset.
    ///
    /// # Errors
    ///
    /// [`ConcordError::AssetLoad`] on fetch or decode failure.
    fn fetch(&self, request: &AssetRequest) -> ConcordResult<DecodedAsset>;
}

/// Bounds of the plane an image is mapped onto.
///
/// The longer edge gets [`IMAGE_PLANE_EXTENT`] scaled by the aspect ratio,
/// the shorter one stays at the extent. The plane has no depth.
///
/// # Errors
///
/// [`ConcordError::AssetLoad`] for zero-sized images.
pub fn image_plane_bounds(url: &str, width: u32, height: u32) -> ConcordResult<Aabb> {
    if width == 0 || height == 0 {
        return Err(ConcordError::AssetLoad {
            url: url.to_owned(),
            reason: format!("image has no area ({width}x{height})"),
        });
    }
    #[allow(clippy::cast_precision_loss)]
    let (w, h) = (width as f32, height as f32);
    let (plane_w, plane_h) = if width == height {
        (IMAGE_PLANE_EXTENT, IMAGE_PLANE_EXTENT)
    } else if width > height {
        (IMAGE_PLANE_EXTENT * w / h, IMAGE_PLANE_EXTENT)
    } else {
        (IMAGE_PLANE_EXTENT, IMAGE_PLANE_EXTENT * h / w)
    };
    Ok(Aabb::from_center_half_extents(
        Vec3::ZERO,
        Vec3::new(plane_w * 0.5, plane_h * 0.5, 0.0),
    ))
}

/// Runs the whole load on the current thread.
///
/// # Errors
///
/// Whatever the fetcher reports, or a zero-sized image.
pub fn load_blocking(fetcher: &dyn AssetFetcher, request: &AssetRequest) -> ConcordResult<LoadedAsset> {
    fetcher.fetch_environment()?;
    let local_bounds = match fetcher.fetch(request)? {
        DecodedAsset::Model { local_bounds } => local_bounds,
        DecodedAsset::Image { width, height } => image_plane_bounds(&request.url, width, height)?,
    };
    Ok(LoadedAsset {
        url: request.url.clone(),
        is_static: request.is_static,
        local_bounds,
    })
}

/// Starts a load on `handle`'s blocking pool.
pub fn spawn_load(
    handle: &Handle,
    fetcher: Arc<dyn AssetFetcher>,
    request: AssetRequest,
) -> PendingAsset {
    let (completer, pending) = PendingAsset::channel(request.url.clone());
    tracing::debug!(url = %request.url, "asset load started");
    drop(handle.spawn_blocking(move || {
        completer.complete(load_blocking(fetcher.as_ref(), &request));
    }));
    pending
}

/// Logs a load failure on the debug-gated channel.
pub fn log_load_failure(error: &ConcordError, debug_mode: bool) {
    if debug_mode {
        tracing::warn!(%error, "asset load failed");
    } else {
        tracing::debug!(%error, "asset load failed");
    }
}

/// State of an in-flight load.
#[derive(Debug)]
pub enum AssetPoll {
    /// Still running.
    Pending,
    /// Finished.
    Ready(LoadedAsset),
    /// Finished with an error, or the loader went away.
    Failed(ConcordError),
}

/// Sending half of a load.
#[derive(Debug)]
pub struct AssetCompleter {
    tx: oneshot::Sender<ConcordResult<LoadedAsset>>,
}

impl AssetCompleter {
    /// Delivers the result. A receiver that is already gone is ignored.
    pub fn complete(self, result: ConcordResult<LoadedAsset>) {
        if self.tx.send(result).is_err() {
            tracing::debug!("asset load finished after its receiver was dropped");
        }
    }
}

/// Receiving half of a load, polled once per frame.
#[derive(Debug)]
pub struct PendingAsset {
    url: String,
    rx: Option<oneshot::Receiver<ConcordResult<LoadedAsset>>>,
}

impl PendingAsset {
    /// Creates a connected completer/pending pair.
    #[must_use]
    pub fn channel(url: String) -> (AssetCompleter, Self) {
        let (tx, rx) = oneshot::channel();
        (AssetCompleter { tx }, Self { url, rx: Some(rx) })
    }

    /// A load that has already finished with `result`.
    #[must_use]
    pub fn ready(url: String, result: ConcordResult<LoadedAsset>) -> Self {
        let (completer, pending) = Self::channel(url);
        completer.complete(result);
        pending
    }

    /// Asset location.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Non-blocking check. Returns `Ready`/`Failed` at most once; afterwards
    /// it keeps answering `Pending`.
    pub fn poll(&mut self) -> AssetPoll {
        let Some(rx) = self.rx.as_mut() else {
            return AssetPoll::Pending;
        };
        match rx.try_recv() {
            Ok(result) => {
                self.rx = None;
                match result {
                    Ok(asset) => AssetPoll::Ready(asset),
                    Err(error) => AssetPoll::Failed(error),
                }
            }
            Err(oneshot::error::TryRecvError::Empty) => AssetPoll::Pending,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.rx = None;
                AssetPoll::Failed(self.dropped())
            }
        }
    }

    /// Blocks until the load finishes. Must not be called from async code.
    ///
    /// # Errors
    ///
    /// The load's error, or [`ConcordError::AssetLoad`] if the loader vanished.
    pub fn blocking_wait(mut self) -> ConcordResult<LoadedAsset> {
        let Some(rx) = self.rx.take() else {
            return Err(self.dropped());
        };
        rx.blocking_recv().unwrap_or_else(|_| Err(self.dropped()))
    }

    fn dropped(&self) -> ConcordError {
        ConcordError::AssetLoad {
            url: self.url.clone(),
            reason: "loader dropped before completing".to_owned(),
        }
    }
}

/// Fetcher serving one fixed asset from memory.
#[derive(Clone, Debug)]
pub struct InMemoryFetcher {
    decoded: DecodedAsset,
    delay: Duration,
    fail_environment: bool,
    fail_asset: bool,
}

impl InMemoryFetcher {
    /// Serves a model with `local_bounds`.
    #[must_use]
    pub fn model(local_bounds: Aabb) -> Self {
        Self::new(DecodedAsset::Model { local_bounds })
    }

    /// Serves a `width`×`height` image.
    #[must_use]
    pub fn image(width: u32, height: u32) -> Self {
        Self::new(DecodedAsset::Image { width, height })
    }

    fn new(decoded: DecodedAsset) -> Self {
        Self {
            decoded,
            delay: Duration::ZERO,
            fail_environment: false,
            fail_asset: false,
        }
    }

    /// Sleeps this long inside each fetch.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes the environment fetch fail.
    #[must_use]
    pub fn failing_environment(mut self) -> Self {
        self.fail_environment = true;
        self
    }

    /// Makes the asset fetch fail.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail_asset = true;
        self
    }
}

impl AssetFetcher for InMemoryFetcher {
    fn fetch_environment(&self) -> ConcordResult<()> {
        if self.fail_environment {
            return Err(ConcordError::AssetLoad {
                url: "environment".to_owned(),
                reason: "environment unavailable".to_owned(),
            });
        }
        Ok(())
    }

    fn fetch(&self, request: &AssetRequest) -> ConcordResult<DecodedAsset> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail_asset {
            return Err(ConcordError::AssetLoad {
                url: request.url.clone(),
                reason: "not found".to_owned(),
            });
        }
        Ok(self.decoded)
    }
}
