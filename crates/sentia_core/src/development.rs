//! Developmental accumulators and the stage derived from them.

use crate::chemistry::SignalMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Four-stage developmental label. Never stored on its own: always derived
/// from the current maturity and experience through
/// [`DevelopmentStage::from_accumulators`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentStage {
    Baby,
    Child,
    Teen,
    Adult,
}

impl DevelopmentStage {
    pub fn from_accumulators(maturity: f64, experience: f64) -> Self {
        if maturity < 0.25 && experience < 0.8 {
            Self::Baby
        } else if maturity < 0.5 && experience < 2.5 {
            Self::Child
        } else if maturity < 0.75 && experience < 5.0 {
            Self::Teen
        } else {
            Self::Adult
        }
    }

    /// Scale applied to cognitive growth.
    pub fn learning_multiplier(self) -> f64 {
        match self {
            Self::Baby => 0.7,
            Self::Child => 1.0,
            Self::Teen => 1.25,
            Self::Adult => 1.5,
        }
    }

    /// Strength gained per sighting of a perceived concept.
    pub fn concept_learning_rate(self) -> f64 {
        match self {
            Self::Baby => 0.05,
            Self::Child => 0.07,
            Self::Teen => 0.09,
            Self::Adult => 0.11,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Baby => "baby",
            Self::Child => "child",
            Self::Teen => "teen",
            Self::Adult => "adult",
        }
    }
}

impl fmt::Display for DevelopmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentSnapshot {
    pub maturity: f64,
    pub experience_points: u64,
    pub reflection_depth: f64,
}

/// Growth from lived experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentTracker {
    pub experience_points: u64,
    pub emotional_weight: f64,
    pub stress_exposure: u64,
    pub success_exposure: u64,
    pub reflection_depth: f64,
    /// In [0, 1].
    pub maturity: f64,
}

impl Default for DevelopmentTracker {
    fn default() -> Self {
        Self {
            experience_points: 0,
            emotional_weight: 0.0,
            stress_exposure: 0,
            success_exposure: 0,
            reflection_depth: 0.0,
            maturity: 0.1,
        }
    }
}

const STRESS_EXPOSURE_LEVEL: f64 = 60.0;
const SUCCESS_EXPOSURE_LEVEL: f64 = 65.0;

impl DevelopmentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one lived event against the signal values at the time.
    pub fn observe_event(&mut self, signals: &SignalMap) {
        let cortisol = signals.get("cortisol").copied().unwrap_or(0.0);
        let dopamine = signals.get("dopamine").copied().unwrap_or(0.0);

        self.experience_points += 1;
        self.emotional_weight += (dopamine - cortisol).abs() * 0.01;

        if cortisol > STRESS_EXPOSURE_LEVEL {
            self.stress_exposure += 1;
        }
        if dopamine > SUCCESS_EXPOSURE_LEVEL {
            self.success_exposure += 1;
        }
    }

    pub fn reflect(&mut self, intelligence: f64) {
        let growth = self.emotional_weight * intelligence * 0.001;
        if growth.is_finite() {
            self.reflection_depth += growth;
        }
    }

    /// Recompute maturity from experience, reflection depth and the balance
    /// between stress and success exposure.
    pub fn update(&mut self) {
        let experience_factor = (self.experience_points as f64 / 500.0).min(1.0);
        let emotional_factor = (self.reflection_depth / 50.0).min(1.0);
        let stress_balance = (self.stress_exposure as f64 / 100.0).min(1.0);
        let success_balance = (self.success_exposure as f64 / 100.0).min(1.0);
        let balance_factor = (success_balance - stress_balance).abs();

        self.maturity = (experience_factor * 0.4 + emotional_factor * 0.4 + (1.0 - balance_factor) * 0.2)
            .clamp(0.0, 1.0);
    }

    pub fn snapshot(&self) -> DevelopmentSnapshot {
        DevelopmentSnapshot {
            maturity: self.maturity,
            experience_points: self.experience_points,
            reflection_depth: self.reflection_depth,
        }
    }
}
