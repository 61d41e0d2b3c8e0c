//! Post-decision reflection.
//!
//! Once an action has really been executed, every available action is valued
//! through the appraisal engine's prediction (reward proxy over the predicted
//! deltas). Regret is the best alternative's value minus the chosen one's;
//! it is negative when the choice beat every alternative.

use sentia_core::{reward_proxy, AgentState, IdentityModel, ReflectionConfig};
use sentia_memory::AppraisalEngine;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// What one reflection concluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    pub chosen: String,
    pub actual_value: f64,
    /// Best-valued action other than `chosen`, if any was available.
    pub best_alternative: Option<(String, f64)>,
    pub regret: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionModule {
    config: ReflectionConfig,
    wisdom: f64,
    regret_memory: VecDeque<f64>,
    confidence_shift: f64,
}

impl Default for ReflectionModule {
    fn default() -> Self {
        Self::new(ReflectionConfig::default())
    }
}

impl ReflectionModule {
    pub fn new(config: ReflectionConfig) -> Self {
        Self {
            config,
            wisdom: 0.0,
            regret_memory: VecDeque::new(),
            confidence_shift: 0.0,
        }
    }

    pub fn config(&self) -> &ReflectionConfig {
        &self.config
    }

    /// Value `chosen` against `available` and fold the regret into the
    /// history, the competence evidence of `identity` and wisdom.
    ///
    /// `chosen` is skipped if it also appears in `available`. With no
    /// alternatives the regret is 0.
    pub fn reflect_on_decision<'a>(
        &mut self,
        chosen: &str,
        available: impl IntoIterator<Item = &'a str>,
        appraisal: &AppraisalEngine,
        state: &AgentState,
        identity: &mut IdentityModel,
    ) -> Reflection {
        let value_of = |action: &str| reward_proxy(&appraisal.predict_emotion(action, Some(state)));

        let actual_value = value_of(chosen);
        let mut best_alternative: Option<(String, f64)> = None;
        for action in available {
            if action == chosen {
                continue;
            }
            let value = value_of(action);
            if best_alternative.as_ref().map_or(true, |(_, best)| value > *best) {
                best_alternative = Some((action.to_string(), value));
            }
        }

        let regret = match &best_alternative {
            Some((_, best)) => best - actual_value,
            None => 0.0,
        };
        // Predictions are finite, but a non-finite regret must not poison
        // wisdom or the history.
        let regret = if regret.is_finite() { regret } else { 0.0 };

        self.remember(regret);
        self.adjust_confidence(regret, identity);
        self.grow_wisdom(regret);

        tracing::debug!(chosen, regret, wisdom = self.wisdom, "reflected on decision");
        Reflection {
            chosen: chosen.to_string(),
            actual_value,
            best_alternative,
            regret,
        }
    }

    fn remember(&mut self, regret: f64) {
        self.regret_memory.push_back(regret);
        while self.regret_memory.len() > self.config.max_regret_memory {
            self.regret_memory.pop_front();
        }
    }

    fn adjust_confidence(&mut self, regret: f64, identity: &mut IdentityModel) {
        if regret > 0.0 {
            identity.add_evidence("competence", -regret * self.config.regret_penalty);
            self.confidence_shift -= regret * self.config.confidence_step;
        } else {
            identity.add_evidence("competence", self.config.confidence_step);
            self.confidence_shift += self.config.confidence_step * 0.5;
        }
    }

    fn grow_wisdom(&mut self, regret: f64) {
        if regret > 0.0 {
            self.wisdom += regret * self.config.wisdom_growth_rate;
        }
        self.wisdom = self.wisdom.clamp(0.0, 1.0);
    }

    pub fn wisdom(&self) -> f64 {
        self.wisdom
    }

    pub fn confidence_shift(&self) -> f64 {
        self.confidence_shift
    }

    /// Oldest first.
    pub fn regret_memory(&self) -> &VecDeque<f64> {
        &self.regret_memory
    }

    pub fn mean_regret(&self) -> Option<f64> {
        if self.regret_memory.is_empty() {
            return None;
        }
        Some(self.regret_memory.iter().sum::<f64>() / self.regret_memory.len() as f64)
    }
}
