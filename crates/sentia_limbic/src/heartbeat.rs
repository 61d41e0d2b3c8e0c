//! Real-time driver for an [`Agent`].
//!
//! The agent itself is synchronous. The heartbeat moves it onto a tokio task
//! that ticks it on a fixed interval, applies stimuli as they arrive and
//! publishes the state after every change through a watch channel. Stopping
//! the heartbeat hands the agent back.

use crate::system::{Agent, Event};
use sentia_core::AgentState;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Configuration for the heartbeat
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// How often to tick (default: 100ms)
    pub interval: Duration,
    /// Pending stimuli before `send` waits.
    pub queue: usize,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            queue: 64,
        }
    }
}

impl HeartbeatConfig {
    pub fn fast() -> Self {
        Self {
            interval: Duration::from_millis(50),
            ..Self::default()
        }
    }

    pub fn slow() -> Self {
        Self {
            interval: Duration::from_millis(500),
            ..Self::default()
        }
    }

    /// Very fast heartbeat for tests
    pub fn testing() -> Self {
        Self {
            interval: Duration::from_millis(10),
            ..Self::default()
        }
    }
}

/// Input accepted by a running heartbeat.
#[derive(Debug, Clone)]
pub enum Stimulus {
    Event(Event),
    Perception {
        modality: String,
        content: String,
        source: String,
    },
}

pub struct Heartbeat {
    stimulus_tx: mpsc::Sender<Stimulus>,
    state_rx: watch::Receiver<AgentState>,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<Agent>,
}

impl Heartbeat {
    /// Move `agent` onto a background task. Must be called inside a tokio
    /// runtime.
    pub fn spawn(mut agent: Agent, config: HeartbeatConfig) -> Self {
        let (stimulus_tx, mut stimulus_rx) = mpsc::channel(config.queue.max(1));
        let (state_tx, state_rx) = watch::channel(agent.get_state());
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.interval);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,

                    _ = interval.tick() => {
                        if let Some(decision) = agent.tick() {
                            tracing::trace!(step = decision.step, action = %decision.action, "heartbeat decision");
                        }
                    }

                    Some(stimulus) = stimulus_rx.recv() => {
                        match stimulus {
                            Stimulus::Event(event) => {
                                agent.inject_event(event);
                            }
                            Stimulus::Perception { modality, content, source } => {
                                agent.observe_perception(&modality, &content, &source);
                            }
                        }
                    }
                }
                let _ = state_tx.send(agent.get_state());
            }
            tracing::debug!(step = agent.step(), "heartbeat stopped");
            agent
        });

        Self {
            stimulus_tx,
            state_rx,
            shutdown_tx,
            task,
        }
    }

    pub async fn send(&self, stimulus: Stimulus) -> anyhow::Result<()> {
        self.stimulus_tx
            .send(stimulus)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send stimulus: {}", e))
    }

    pub async fn inject_event(&self, event: Event) -> anyhow::Result<()> {
        self.send(Stimulus::Event(event)).await
    }

    /// Latest published state.
    pub fn state(&self) -> AgentState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AgentState> {
        self.state_rx.clone()
    }

    /// Stop ticking and return the agent.
    pub async fn stop(self) -> anyhow::Result<Agent> {
        let _ = self.shutdown_tx.send(());
        self.task
            .await
            .map_err(|e| anyhow::anyhow!("Heartbeat task failed: {}", e))
    }
}
