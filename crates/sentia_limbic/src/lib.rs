//! # Sentia Limbic
//!
//! The agent loop. An [`Agent`] owns the chemistry, identity, development,
//! learned memories and decision machinery of one synthetic agent and
//! advances them one tick at a time:
//!
//! - **Chemistry**: interactions, homeostasis and noise every tick
//! - **Decision**: lookahead planning against an [`sentia_reasoning::Environment`]
//! - **Learning**: appraisal and similarity memories from every event
//! - **Growth**: experience, intelligence, wisdom and maturity
//!
//! [`Heartbeat`] runs an agent on a tokio task for real-time use, and
//! [`AgentSnapshot`] saves and restores the full state.

mod cognition;
mod heartbeat;
pub mod perception;
mod snapshot;
mod system;

pub use cognition::{Cognition, GrowthStep, BURNOUT_THRESHOLD, FATIGUE_IDENTITY_LOCK, STRESS_THRESHOLD};
pub use heartbeat::{Heartbeat, HeartbeatConfig, Stimulus};
pub use perception::{ConceptSummary, Interpretation, Perception, PerceptionMemory};
pub use snapshot::{AgentSnapshot, SnapshotError, SNAPSHOT_VERSION};
pub use system::{Agent, Decision, Event, UNLABELED_EVENT};
