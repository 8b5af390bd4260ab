//! # Concord Session Simulator
//!
//! Runs one authority and two participants in-process and plays a scripted
//! scene against them:
//!
//! 1. Both participants load the asset asynchronously
//! 2. Both grab for the object in the same frame; the authority picks one
//! 3. The winner carries it sideways and pushes it away, then lets go
//! 4. The other participant picks it up and drops it again
//! 5. The first participant pins it; a further grab is refused
//!
//! ```bash
//! RUST_LOG=concord=debug,concord_networking=debug session_sim [config.toml]
//! ```

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use concord::{
    AppDescriptor, AssetDescriptor, AssetFetcher, AssetKind, EngineConfig, HostRequest,
    InMemoryFetcher, InputFrame, InputSource, LocalAgent, LocalSession, MockHost,
};
use concord_core::Aabb;
use concord_shared::{Handedness, ObjectTransform, Quaternion, Vec3};
use glam::Quat;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const PARTICIPANT_A: usize = 0;
const PARTICIPANT_B: usize = 1;

/// Frames allowed for both asset loads.
const LOAD_FRAME_LIMIT: u32 = 240;

type SimResult<T> = Result<T, Box<dyn Error>>;

fn main() -> SimResult<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;

    let mut sim = Simulation::new(config)?;
    sim.load(runtime.handle())?;
    sim.contested_pickup()?;
    sim.carry_and_release()?;
    sim.handoff()?;
    sim.pin_and_refuse()?;
    sim.report();
    Ok(())
}

fn descriptor(app_id: &str) -> AppDescriptor {
    AppDescriptor {
        app_id: app_id.to_owned(),
        asset: Some(AssetDescriptor {
            url: "models/teapot.glb".to_owned(),
            kind: AssetKind::Model,
            is_static: false,
            is_pinned: false,
        }),
        initial_transform: Some(ObjectTransform {
            position: Some(Vec3::new(0.0, 1.5, -2.0)),
            quaternion: Some(Quaternion::IDENTITY),
            scale: Some(Vec3::ONE),
        }),
        initial_position: None,
        embedded: false,
    }
}

/// A controller at `position` pointing down -Z.
fn pointing(hand: Handedness, position: glam::Vec3) -> InputSource {
    InputSource::new(hand, position, Quat::IDENTITY)
}

/// Sleeps each frame up to the next fixed-rate deadline.
struct FramePacer {
    frame: Duration,
    deadline: Instant,
    frames: u64,
    late: u64,
}

impl FramePacer {
    fn new(rate: u32) -> Self {
        Self {
            frame: Duration::from_secs(1) / rate.max(1),
            deadline: Instant::now(),
            frames: 0,
            late: 0,
        }
    }

    fn wait(&mut self) {
        let now = Instant::now();
        match self.deadline.checked_duration_since(now) {
            Some(remaining) => std::thread::sleep(remaining),
            None => self.late += 1,
        }
        // A late frame resets the schedule
        self.deadline = self.deadline.max(now) + self.frame;
        self.frames += 1;
    }
}

struct Simulation {
    session: LocalSession<MockHost>,
    pacer: FramePacer,
}

impl Simulation {
    fn new(config: EngineConfig) -> SimResult<Self> {
        let pacer = FramePacer::new(config.frame_rate);
        let mut session = LocalSession::new(config);
        session.join(MockHost::new(descriptor("sim-a")))?;
        session.join(MockHost::new(descriptor("sim-b")))?;
        Ok(Self { session, pacer })
    }

    /// Runs `count` paced frames with inputs from `inputs(frame)`.
    fn run(&mut self, count: u32, mut inputs: impl FnMut(u32) -> Vec<InputFrame>) -> SimResult<()> {
        for frame in 0..count {
            self.pacer.wait();
            self.session.step(&inputs(frame))?;
        }
        Ok(())
    }

    fn agent(&mut self, index: usize) -> SimResult<&mut LocalAgent<MockHost>> {
        self.session
            .agent_mut(index)
            .ok_or_else(|| format!("no participant at index {index}").into())
    }

    fn load(&mut self, handle: &tokio::runtime::Handle) -> SimResult<()> {
        let fetcher: Arc<dyn AssetFetcher> = Arc::new(
            InMemoryFetcher::model(Aabb::new(glam::Vec3::splat(-0.5), glam::Vec3::splat(0.5)))
                .with_delay(Duration::from_millis(40)),
        );
        for index in [PARTICIPANT_A, PARTICIPANT_B] {
            self.agent(index)?.begin_load(handle, Arc::clone(&fetcher));
        }

        for _ in 0..LOAD_FRAME_LIMIT {
            self.run(1, |_| Vec::new())?;
            let loaded = [PARTICIPANT_A, PARTICIPANT_B]
                .iter()
                .all(|i| self.session.agent(*i).is_some_and(|a| a.is_loaded() || a.load_failed()));
            if loaded {
                break;
            }
        }
        tracing::info!(frames = self.pacer.frames, "assets loaded");
        Ok(())
    }

    fn contested_pickup(&mut self) -> SimResult<()> {
        let aim = |_: u32| {
            vec![
                InputFrame::new(vec![pointing(Handedness::Right, glam::Vec3::new(0.0, 1.5, 0.0))]),
                InputFrame::new(vec![pointing(Handedness::Left, glam::Vec3::new(0.2, 1.5, 0.0))]),
            ]
        };
        self.run(2, aim)?;

        // Same frame: both gates pass locally, the authority decides
        self.agent(PARTICIPANT_A)?.on_select_start(Handedness::Right)?;
        self.agent(PARTICIPANT_B)?.on_select_start(Handedness::Left)?;
        self.run(2, aim)?;

        tracing::info!(
            holder = ?self.session.authority().state().held_by(),
            "contested pickup resolved"
        );
        Ok(())
    }

    fn carry_and_release(&mut self) -> SimResult<()> {
        self.run(36, |frame| {
            #[allow(clippy::cast_precision_loss)]
            let x = frame as f32 / 72.0;
            vec![
                InputFrame::new(vec![pointing(Handedness::Right, glam::Vec3::new(x, 1.5, 0.0))
                    .with_axes(vec![0.0, -0.6])]),
                InputFrame::default(),
            ]
        })?;
        self.agent(PARTICIPANT_A)?.on_select_end(Handedness::Right)?;
        self.agent(PARTICIPANT_B)?.on_select_end(Handedness::Left)?;
        self.run(2, |_| Vec::new())?;

        tracing::info!(
            position = ?self.session.authority().state().transform().position,
            "object released"
        );
        Ok(())
    }

    fn handoff(&mut self) -> SimResult<()> {
        let target = self
            .session
            .authority()
            .state()
            .transform()
            .position
            .map_or(glam::Vec3::ZERO, Into::into);
        let aim = move |_: u32| {
            vec![
                InputFrame::default(),
                InputFrame::new(vec![pointing(
                    Handedness::Left,
                    glam::Vec3::new(target.x, target.y, 0.0),
                )]),
            ]
        };
        self.run(2, aim)?;
        self.agent(PARTICIPANT_B)?.on_select_start(Handedness::Left)?;
        self.run(12, aim)?;
        tracing::info!(holder = ?self.session.authority().state().held_by(), "handoff");

        self.agent(PARTICIPANT_B)?.on_select_end(Handedness::Left)?;
        self.run(2, aim)
    }

    fn pin_and_refuse(&mut self) -> SimResult<()> {
        self.agent(PARTICIPANT_A)?.on_host_request(HostRequest::Pin)?;
        self.run(2, |_| Vec::new())?;

        let target = self
            .session
            .authority()
            .state()
            .transform()
            .position
            .map_or(glam::Vec3::ZERO, Into::into);
        let aim = move |_: u32| {
            vec![
                InputFrame::default(),
                InputFrame::new(vec![pointing(
                    Handedness::Left,
                    glam::Vec3::new(target.x, target.y, 0.0),
                )]),
            ]
        };
        self.run(2, aim)?;
        self.agent(PARTICIPANT_B)?.on_select_start(Handedness::Left)?;
        self.run(2, aim)?;

        let state = self.session.authority().state();
        tracing::info!(
            pinned = state.is_pinned(),
            holder = ?state.held_by(),
            "grab on pinned object"
        );
        Ok(())
    }

    fn report(&self) {
        let state = self.session.authority().state();
        let stats = self.session.authority().stats();
        tracing::info!(
            converged = self.session.is_converged(),
            holder = ?state.held_by(),
            pinned = state.is_pinned(),
            has_ever_been_pinned = state.has_ever_been_pinned(),
            transform = ?state.transform(),
            "final state"
        );
        tracing::info!(
            applied = stats.intents_applied,
            ignored = stats.intents_ignored,
            frames = self.pacer.frames,
            late_frames = self.pacer.late,
            "session stats"
        );
    }
}
