//! Self-narrative - a slow summary of recent autobiography.
//!
//! Every few cycles the recent history is classified by how often competence
//! ran high or low and how often cortisol was elevated. The resulting story
//! replaces the current one only past a stability filter, while a smoothed
//! identity bias drifts toward the story's target and is fed back into the
//! identity model as evidence.

use crate::autobiography::AutobiographicalEvent;
use sentia_core::{NoiseSource, SignalMap};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeTheme {
    Forming,
    Capable,
    Struggling,
    Adapting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfNarrative {
    pub theme: NarrativeTheme,
    /// More than half of the window was spent stressed.
    pub stressed: bool,
}

impl Default for SelfNarrative {
    fn default() -> Self {
        Self {
            theme: NarrativeTheme::Forming,
            stressed: false,
        }
    }
}

impl fmt::Display for SelfNarrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.theme {
            NarrativeTheme::Forming => "I am forming.",
            NarrativeTheme::Capable => "I am capable and improving.",
            NarrativeTheme::Struggling => "I struggle but I endure.",
            NarrativeTheme::Adapting => "I am adapting.",
        };
        f.write_str(base)?;
        if self.stressed {
            f.write_str(" The world feels stressful.")?;
        }
        Ok(())
    }
}

const SUCCESS_COMPETENCE: f64 = 0.6;
const FAILURE_COMPETENCE: f64 = 0.4;
const STRESS_CORTISOL: f64 = 55.0;
const GROWTH_BAND: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeEngine {
    current: SelfNarrative,
    identity_bias: SignalMap,
    /// Probability of keeping the current story when a new one is proposed.
    stability: f64,
    bias_decay: f64,
}

impl Default for NarrativeEngine {
    fn default() -> Self {
        Self {
            current: SelfNarrative::default(),
            identity_bias: SignalMap::new(),
            stability: 0.9,
            bias_decay: 0.98,
        }
    }
}

impl NarrativeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> SelfNarrative {
        self.current
    }

    pub fn identity_bias(&self) -> &SignalMap {
        &self.identity_bias
    }

    /// Summarise `recent` and update the story and the identity bias.
    /// An empty window changes nothing and draws nothing.
    pub fn update_narrative<'a>(
        &mut self,
        recent: impl IntoIterator<Item = &'a AutobiographicalEvent>,
        noise: &mut NoiseSource,
    ) {
        let mut total = 0usize;
        let mut successes = 0usize;
        let mut failures = 0usize;
        let mut stress_events = 0usize;
        for event in recent {
            total += 1;
            let competence = event.identity.get("competence").copied().unwrap_or(0.0);
            let cortisol = event.chemicals.get("cortisol").copied().unwrap_or(0.0);
            if competence > SUCCESS_COMPETENCE {
                successes += 1;
            }
            if competence < FAILURE_COMPETENCE {
                failures += 1;
            }
            if cortisol > STRESS_CORTISOL {
                stress_events += 1;
            }
        }
        if total == 0 {
            return;
        }

        let n = total as f64;
        let growth_score = (successes as f64 - failures as f64) / n;
        let stressed = stress_events as f64 / n > 0.5;

        let (theme, mut target) = if growth_score > GROWTH_BAND {
            (NarrativeTheme::Capable, vec![("competence", 0.04), ("resilience", 0.02)])
        } else if growth_score < -GROWTH_BAND {
            (NarrativeTheme::Struggling, vec![("resilience", 0.05), ("competence", -0.02)])
        } else {
            (NarrativeTheme::Adapting, vec![("resilience", 0.02)])
        };
        if stressed {
            if let Some(entry) = target.iter_mut().find(|(k, _)| *k == "resilience") {
                entry.1 += 0.02;
            }
        }

        let proposed = SelfNarrative { theme, stressed };
        if proposed != self.current && noise.roll() > self.stability {
            tracing::debug!(from = %self.current, to = %proposed, "self-narrative changed");
            self.current = proposed;
        }

        for (name, value) in target {
            let old = self.identity_bias.get(name).copied().unwrap_or(0.0);
            self.identity_bias.insert(name.to_string(), old * 0.7 + value * 0.3);
        }
        for v in self.identity_bias.values_mut() {
            *v *= self.bias_decay;
        }
    }
}
