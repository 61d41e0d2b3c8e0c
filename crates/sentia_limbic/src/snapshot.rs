//! Whole-agent snapshots.
//!
//! A snapshot carries every piece of mutable agent state, including the
//! noise stream position, so that restoring and replaying the same inputs in
//! deterministic mode reproduces the same trajectory. The environment is not
//! part of a snapshot; reattach it with [`crate::Agent::with_environment`].

use crate::cognition::Cognition;
use crate::perception::PerceptionMemory;
use chrono::{DateTime, Utc};
use sentia_core::{AgentConfig, ChemicalState, DevelopmentTracker, IdentityModel, InteractionMatrix, NoiseSnapshot};
use sentia_memory::{AppraisalEngine, AutobiographicalMemory, NarrativeEngine};
use sentia_reasoning::ReflectionModule;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub step: u64,
    pub config: AgentConfig,
    pub chemicals: ChemicalState,
    pub interactions: InteractionMatrix,
    pub identity: IdentityModel,
    pub development: DevelopmentTracker,
    pub cognition: Cognition,
    pub appraisal: AppraisalEngine,
    pub reflection: ReflectionModule,
    pub narrative: NarrativeEngine,
    pub autobiography: AutobiographicalMemory,
    pub perception: PerceptionMemory,
    pub noise: NoiseSnapshot,
}

impl AgentSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), step = self.step, "snapshot saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let snapshot = Self::from_json(&std::fs::read_to_string(path)?)?;
        tracing::info!(path = %path.display(), step = snapshot.step, "snapshot loaded");
        Ok(snapshot)
    }

    fn check_version(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }
}
