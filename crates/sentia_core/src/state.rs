use crate::chemistry::SignalMap;
use crate::development::{DevelopmentSnapshot, DevelopmentStage, DevelopmentTracker};
use serde::{Deserialize, Serialize};

/// Read-only view of an agent at one instant.
///
/// The development stage is recomputed every time a view is built, so it can
/// never lag behind the accumulators it is derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub signals: SignalMap,
    pub traits: SignalMap,
    pub development: DevelopmentSnapshot,
    pub development_stage: DevelopmentStage,
    pub fatigue: f64,
    /// Grown by counterfactual reflection.
    pub wisdom: f64,
    /// Grown by cognitive development.
    pub cognitive_wisdom: f64,
    pub intelligence: f64,
    pub experience: f64,
    pub risk_tolerance: f64,
    pub self_narrative: String,
}

impl AgentState {
    /// A view with only signals and traits populated; every derived scalar
    /// takes its newborn value.
    pub fn from_parts(signals: SignalMap, traits: SignalMap) -> Self {
        let development = DevelopmentTracker::default().snapshot();
        Self {
            signals,
            traits,
            development_stage: DevelopmentStage::from_accumulators(development.maturity, 0.0),
            development,
            fatigue: 0.0,
            wisdom: 0.0,
            cognitive_wisdom: 0.0,
            intelligence: 0.5,
            experience: 0.0,
            risk_tolerance: 0.5,
            self_narrative: String::new(),
        }
    }

    /// Signal value, 0 if unknown.
    pub fn signal(&self, name: &str) -> f64 {
        self.signals.get(name).copied().unwrap_or(0.0)
    }

    /// Trait value, 0 if unknown.
    pub fn trait_value(&self, name: &str) -> f64 {
        self.traits.get(name).copied().unwrap_or(0.0)
    }

    /// Flat key lookup over the namespaced view: bare signal names,
    /// `identity_<trait>`, `development_<field>` and the derived scalars.
    pub fn lookup(&self, key: &str) -> Option<f64> {
        if let Some(v) = self.signals.get(key) {
            return Some(*v);
        }
        if let Some(name) = key.strip_prefix("identity_") {
            return self.traits.get(name).copied();
        }
        match key {
            "development_maturity" => Some(self.development.maturity),
            "development_experience_points" => Some(self.development.experience_points as f64),
            "development_reflection_depth" => Some(self.development.reflection_depth),
            "fatigue" => Some(self.fatigue),
            "wisdom" => Some(self.wisdom),
            "cognitive_wisdom" => Some(self.cognitive_wisdom),
            "intelligence" => Some(self.intelligence),
            "experience" => Some(self.experience),
            "risk_tolerance" => Some(self.risk_tolerance),
            _ => None,
        }
    }

    /// Every numeric entry under its namespaced key.
    pub fn flatten(&self) -> SignalMap {
        let mut out = self.signals.clone();
        for (k, v) in &self.traits {
            out.insert(format!("identity_{}", k), *v);
        }
        out.insert("development_maturity".into(), self.development.maturity);
        out.insert(
            "development_experience_points".into(),
            self.development.experience_points as f64,
        );
        out.insert("development_reflection_depth".into(), self.development.reflection_depth);
        out.insert("fatigue".into(), self.fatigue);
        out.insert("wisdom".into(), self.wisdom);
        out.insert("cognitive_wisdom".into(), self.cognitive_wisdom);
        out.insert("intelligence".into(), self.intelligence);
        out.insert("experience".into(), self.experience);
        out.insert("risk_tolerance".into(), self.risk_tolerance);
        out
    }
}
