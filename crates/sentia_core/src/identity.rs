//! Bounded personality traits with a two-phase update.
//!
//! Collaborators call [`IdentityModel::add_evidence`] at any point during a
//! cycle; [`IdentityModel::update`] later applies
//! `value += evidence * learning_rate`, clamps to [0, 1] and resets the
//! evidence. The order in which evidence arrives never matters.

use crate::chemistry::SignalMap;
use crate::config::IdentityConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_TRAITS: [&str; 4] = ["competence", "social_value", "resilience", "intelligence"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trait {
    /// Always in [0, 1].
    pub value: f64,
    /// Unbounded, reset on every update.
    pub evidence: f64,
}

impl Trait {
    pub fn new(value: f64) -> Self {
        Self {
            value: clamp_unit(value),
            evidence: 0.0,
        }
    }
}

#[inline]
fn clamp_unit(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityModel {
    traits: BTreeMap<String, Trait>,
    learning_rate: f64,
}

impl Default for IdentityModel {
    fn default() -> Self {
        Self::from_config(&IdentityConfig::default())
    }
}

impl IdentityModel {
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self {
            traits: config
                .traits
                .iter()
                .map(|(name, v)| (name.clone(), Trait::new(*v)))
                .collect(),
            learning_rate: config.learning_rate,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Accumulate evidence. Unknown traits and non-finite amounts are ignored.
    pub fn add_evidence(&mut self, name: &str, amount: f64) {
        if !amount.is_finite() {
            return;
        }
        if let Some(t) = self.traits.get_mut(name) {
            t.evidence += amount;
        }
    }

    /// Apply and reset all pending evidence.
    pub fn update(&mut self) {
        for t in self.traits.values_mut() {
            t.value = clamp_unit(t.value + t.evidence * self.learning_rate);
            t.evidence = 0.0;
        }
    }

    /// Current value, 0 for an unknown trait.
    pub fn get(&self, name: &str) -> f64 {
        self.traits.get(name).map_or(0.0, |t| t.value)
    }

    pub fn evidence(&self, name: &str) -> f64 {
        self.traits.get(name).map_or(0.0, |t| t.evidence)
    }

    /// The value the trait would take if `update` ran now.
    pub fn projected(&self, name: &str) -> f64 {
        self.traits
            .get(name)
            .map_or(0.0, |t| clamp_unit(t.value + t.evidence * self.learning_rate))
    }

    /// Sum of projected values across all traits.
    pub fn projected_total(&self) -> f64 {
        self.traits.keys().map(|k| self.projected(k)).sum()
    }

    /// Overwrite a trait value, clamped. Returns false for an unknown trait.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.traits.get_mut(name) {
            Some(t) => {
                t.value = clamp_unit(value);
                true
            }
            None => false,
        }
    }

    /// Trait values only.
    pub fn snapshot(&self) -> SignalMap {
        self.traits
            .iter()
            .map(|(k, t)| (k.clone(), t.value))
            .collect()
    }

    pub fn traits(&self) -> impl Iterator<Item = (&str, &Trait)> {
        self.traits.iter().map(|(k, t)| (k.as_str(), t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_traits_are_neutral() {
        let id = IdentityModel::default();
        for name in DEFAULT_TRAITS {
            assert_eq!(id.get(name), 0.5, "{} should start neutral", name);
        }
        assert_eq!(id.get("charisma"), 0.0);
    }

    #[test]
    fn test_evidence_is_applied_once_then_reset() {
        let mut id = IdentityModel::default();
        id.add_evidence("competence", 5.0);
        assert_eq!(id.get("competence"), 0.5, "evidence must not apply before update");
        id.update();
        assert!((id.get("competence") - 0.6).abs() < 1e-12);
        assert_eq!(id.evidence("competence"), 0.0);
        id.update();
        assert!((id.get("competence") - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_evidence_order_does_not_matter() {
        let mut a = IdentityModel::default();
        let mut b = IdentityModel::default();
        a.add_evidence("resilience", 3.0);
        a.add_evidence("resilience", -7.0);
        b.add_evidence("resilience", -7.0);
        b.add_evidence("resilience", 3.0);
        a.update();
        b.update();
        assert_eq!(a.get("resilience"), b.get("resilience"));
    }

    #[test]
    fn test_values_clamped_to_unit_interval() {
        let mut id = IdentityModel::default();
        id.add_evidence("competence", 1e6);
        id.add_evidence("social_value", -1e6);
        id.update();
        assert_eq!(id.get("competence"), 1.0);
        assert_eq!(id.get("social_value"), 0.0);
    }

    #[test]
    fn test_unknown_and_non_finite_evidence_ignored() {
        let mut id = IdentityModel::default();
        id.add_evidence("charisma", 1.0);
        id.add_evidence("competence", f64::NAN);
        id.update();
        assert_eq!(id.get("competence"), 0.5);
        assert!(id.snapshot().get("charisma").is_none());
    }

    #[test]
    fn test_projected_matches_update() {
        let mut id = IdentityModel::default();
        id.add_evidence("intelligence", 2.0);
        let projected = id.projected("intelligence");
        id.update();
        assert_eq!(projected, id.get("intelligence"));
    }
}
