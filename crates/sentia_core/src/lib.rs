//! # Sentia Core
//!
//! The data model of a synthetic affective agent:
//!
//! - **Chemicals**: bounded scalar signals that relax toward a baseline,
//!   jitter with noise and absorb event deltas
//! - **Interactions**: a sparse directed graph of cross-chemical influence
//! - **Identity**: bounded traits updated from accumulated evidence
//! - **Development**: maturity and experience accumulators and the stage
//!   derived from them
//!
//! Everything here is synchronous and single-threaded. The two-phase
//! patterns (compute all deltas, then apply; accumulate evidence, then apply)
//! keep batched updates independent of iteration order.

pub mod chemistry;
pub mod config;
pub mod development;
pub mod error;
pub mod identity;
pub mod interactions;
pub mod noise;
pub mod state;

pub use chemistry::{Chemical, ChemicalState, SignalMap};
pub use config::{
    AgentConfig, AgentSettings, AppraisalConfig, ChemicalConfig, ChemicalParams, DecisionConfig,
    IdentityConfig, PlannerConfig, ReflectionConfig, Repair, SimilarityConfig, ValidationReport,
};
pub use development::{DevelopmentSnapshot, DevelopmentStage, DevelopmentTracker};
pub use error::ConfigError;
pub use identity::{IdentityModel, Trait, DEFAULT_TRAITS};
pub use interactions::InteractionMatrix;
pub use noise::{NoiseSnapshot, NoiseSource};
pub use state::AgentState;

/// Reward proxy shared by reflection and outcome learning:
/// dopamine + serotonin - cortisol.
pub fn reward_proxy(signals: &SignalMap) -> f64 {
    let get = |name: &str| signals.get(name).copied().unwrap_or(0.0);
    get("dopamine") + get("serotonin") - get("cortisol")
}
