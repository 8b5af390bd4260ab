//! # Local Session
//!
//! One authority and any number of agents wired through an in-process
//! [`SyncBus`]. Used by the demo binary and the end-to-end tests.
//!
//! Each [`LocalSession::step`] pumps the authority, runs every agent's frame,
//! and pumps the authority again so intents from this frame are confirmed
//! before the next one.

use concord_networking::{AuthorityServer, ReplicaClient, SyncBus};
use concord_shared::ParticipantId;

use crate::agent::LocalAgent;
use crate::config::EngineConfig;
use crate::error::ConcordResult;
use crate::host::HostBoundary;
use crate::input::InputFrame;

/// Authority plus agents on one bus.
pub struct LocalSession<H: HostBoundary> {
    config: EngineConfig,
    bus: SyncBus,
    authority: AuthorityServer,
    agents: Vec<LocalAgent<H>>,
    next_participant: u32,
}

impl<H: HostBoundary> LocalSession<H> {
    /// Opens a bus and starts the authority.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let (bus, endpoint) = SyncBus::open();
        let authority = AuthorityServer::new(endpoint, config.authority);
        Self {
            config,
            bus,
            authority,
            agents: Vec::new(),
            next_participant: 1,
        }
    }

    /// Connects a new participant and returns its index.
    ///
    /// The authority is pumped so the join snapshot is waiting for the
    /// agent's first frame.
    ///
    /// # Errors
    ///
    /// Bus or scene errors while wiring the agent.
    pub fn join(&mut self, host: H) -> ConcordResult<usize> {
        let participant = ParticipantId(self.next_participant);
        self.next_participant += 1;

        let client = ReplicaClient::new(self.bus.connect(participant)?);
        let agent = LocalAgent::new(client, host, self.config.clone())?;
        self.agents.push(agent);
        self.authority.pump();
        tracing::info!(%participant, "participant joined session");
        Ok(self.agents.len() - 1)
    }

    /// Disconnects the participant at `index`. Later agents shift down by one.
    ///
    /// Returns `false` for an unknown index.
    pub fn leave(&mut self, index: usize) -> bool {
        if index >= self.agents.len() {
            return false;
        }
        let agent = self.agents.remove(index);
        tracing::info!(participant = %agent.participant(), "participant left session");
        drop(agent);
        self.authority.pump();
        true
    }

    /// Runs one frame for every agent. `inputs[i]` goes to agent `i`; agents
    /// without an entry get an empty frame.
    ///
    /// # Errors
    ///
    /// The first agent error; later agents still run this frame.
    pub fn step(&mut self, inputs: &[InputFrame]) -> ConcordResult<()> {
        self.authority.pump();
        let empty = InputFrame::default();
        let mut first_error = None;
        for (index, agent) in self.agents.iter_mut().enumerate() {
            let input = inputs.get(index).unwrap_or(&empty);
            if let Err(error) = agent.on_frame(input) {
                tracing::warn!(participant = %agent.participant(), %error, "frame failed");
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
        self.authority.pump();
        first_error.map_or(Ok(()), Err)
    }

    /// Pumps the authority without running any agent.
    pub fn pump(&mut self) -> usize {
        self.authority.pump()
    }

    /// True when every agent's replica equals the authority's state.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.agents
            .iter()
            .all(|agent| agent.replica() == self.authority.state())
    }

    /// The authority.
    #[must_use]
    pub const fn authority(&self) -> &AuthorityServer {
        &self.authority
    }

    /// Agent at `index`.
    #[must_use]
    pub fn agent(&self, index: usize) -> Option<&LocalAgent<H>> {
        self.agents.get(index)
    }

    /// Mutable agent at `index`.
    pub fn agent_mut(&mut self, index: usize) -> Option<&mut LocalAgent<H>> {
        self.agents.get_mut(index)
    }

    /// Connected agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// True with no agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }
}
