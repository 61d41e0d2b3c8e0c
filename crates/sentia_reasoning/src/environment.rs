//! The decision/environment collaborator.
//!
//! The agent never knows what its actions do. It asks an [`Environment`] for
//! a base distribution over actions and for the feedback an action produces.
//! Both calls must behave as pure functions of their inputs for the duration
//! of a planning pass, because the planner calls them on hypothetical states.

use crate::distribution::ActionDistribution;
use sentia_core::{AgentState, DecisionConfig, SignalMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Environment trait
// ============================================================================

/// Result of executing one action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: String,
    /// Per-signal delta the action produced.
    pub feedback: SignalMap,
}

pub trait Environment: Send + Sync {
    /// Base action distribution for the given state.
    fn compute(&self, state: &AgentState) -> ActionDistribution;

    /// Feedback produced by taking `action` in `state`.
    fn execute(&self, action: &str, state: &AgentState) -> ActionOutcome;

    /// Name for logging.
    fn name(&self) -> &str {
        "environment"
    }
}

// ============================================================================
// Probability model
// ============================================================================

/// Base probabilities shifted by chemical influence, clamped and optionally
/// normalised.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityModel {
    actions: Vec<String>,
    base_probabilities: BTreeMap<String, f64>,
    chemical_influence: BTreeMap<String, BTreeMap<String, f64>>,
    normalize: bool,
    min_probability: f64,
    max_probability: f64,
}

impl ProbabilityModel {
    pub fn from_config(config: &DecisionConfig) -> Self {
        Self {
            actions: config.actions.clone(),
            base_probabilities: config.base_probabilities.clone(),
            chemical_influence: config.chemical_influence.clone(),
            normalize: config.normalization,
            min_probability: config.min_probability,
            max_probability: config.max_probability,
        }
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Probabilities in configured action order. Influence keys may name
    /// any entry of the flattened state view; unknown keys read as 0.
    pub fn compute(&self, state: &AgentState) -> ActionDistribution {
        let mut probabilities: ActionDistribution = self
            .actions
            .iter()
            .map(|a| (a.clone(), self.base_probabilities.get(a).copied().unwrap_or(0.0)))
            .collect();

        for (signal, action_weights) in &self.chemical_influence {
            let value = state.lookup(signal).unwrap_or(0.0);
            for (action, weight) in action_weights {
                if let Some(p) = probabilities.get(action) {
                    probabilities.set(action.as_str(), p + value * weight);
                }
            }
        }

        let (lo, hi) = (self.min_probability, self.max_probability);
        probabilities.map_values(|_, p| p.max(lo).min(hi));

        if self.normalize {
            probabilities.normalize();
        }
        probabilities
    }
}

// ============================================================================
// Configured environment
// ============================================================================

/// Environment driven entirely by configuration: the probability model plus
/// a fixed feedback table per action.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfiguredEnvironment {
    model: ProbabilityModel,
    action_feedback: BTreeMap<String, SignalMap>,
}

impl ConfiguredEnvironment {
    pub fn from_config(config: &DecisionConfig) -> Self {
        Self {
            model: ProbabilityModel::from_config(config),
            action_feedback: config.action_feedback.clone(),
        }
    }

    pub fn model(&self) -> &ProbabilityModel {
        &self.model
    }
}

impl Environment for ConfiguredEnvironment {
    fn compute(&self, state: &AgentState) -> ActionDistribution {
        self.model.compute(state)
    }

    fn execute(&self, action: &str, _state: &AgentState) -> ActionOutcome {
        ActionOutcome {
            action: action.to_string(),
            feedback: self.action_feedback.get(action).cloned().unwrap_or_default(),
        }
    }

    fn name(&self) -> &str {
        "configured"
    }
}
