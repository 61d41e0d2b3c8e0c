//! Slow cognitive accumulators updated once per tick.
//!
//! Besides the chemistry, the agent carries a handful of scalars that grow
//! with lived experience: experience, intelligence and (cognitive) wisdom,
//! plus the fatigue, stress and risk regulators that gate how it acts. All
//! of the per-tick rules live here so the tick loop in [`crate::Agent`]
//! reads as a list of phases.

use sentia_core::{DevelopmentStage, DevelopmentTracker, IdentityModel, SignalMap};
use serde::{Deserialize, Serialize};

/// Cortisol above which a tick counts as stressful.
pub const STRESS_THRESHOLD: f64 = 50.0;
/// Cortisol above which resilience is damaged.
pub const BURNOUT_THRESHOLD: f64 = 75.0;
/// Identity updates are withheld at or above this fatigue.
pub const FATIGUE_IDENTITY_LOCK: f64 = 0.6;

const RISK_ADAPT_RATE: f64 = 0.01;
const FATIGUE_RECOVERY_RATE: f64 = 0.98;
const REFLECTION_DECAY_RATE: f64 = 0.995;
const REFLECTION_FATIGUE_DEPTH: f64 = 50.0;
const RESILIENCE_GROWTH: f64 = 0.01;
const RESILIENCE_DAMAGE: f64 = 0.02;
const MATURITY_SMOOTHING: f64 = 0.05;

/// What one growth step added, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GrowthStep {
    pub experience: f64,
    pub intelligence: f64,
    pub wisdom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cognition {
    pub experience: f64,
    /// In [0.3, 1].
    pub intelligence: f64,
    /// In [0, 1], never decreases.
    pub wisdom: f64,
    pub last_prediction_error: f64,
    /// In [0.1, 0.9].
    pub risk_tolerance: f64,
    /// In [0, 1].
    pub fatigue: f64,
    pub stress_accumulator: u32,
    pub recovery_counter: u32,
    previous_signals: SignalMap,
}

impl Default for Cognition {
    fn default() -> Self {
        Self {
            experience: 0.0,
            intelligence: 0.5,
            wisdom: 0.0,
            last_prediction_error: 1.0,
            risk_tolerance: 0.5,
            fatigue: 0.0,
            stress_accumulator: 0,
            recovery_counter: 0,
            previous_signals: SignalMap::new(),
        }
    }
}

impl Cognition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self, development: &DevelopmentTracker) -> DevelopmentStage {
        DevelopmentStage::from_accumulators(development.maturity, self.experience)
    }

    /// A short stress episode has been followed by a calm streak.
    pub fn stress_recovered(&self) -> bool {
        self.stress_accumulator > 0 && self.recovery_counter > 3
    }

    pub fn identity_locked(&self) -> bool {
        self.fatigue >= FATIGUE_IDENTITY_LOCK
    }

    /// Regret lowers risk tolerance, a good choice raises it; wisdom pushes
    /// it up a little every time.
    pub fn adapt_risk(&mut self, regret: f64) {
        if regret > 0.0 {
            self.risk_tolerance -= RISK_ADAPT_RATE;
        } else {
            self.risk_tolerance += RISK_ADAPT_RATE * 0.5;
        }
        self.risk_tolerance += self.wisdom * 0.003;
        self.risk_tolerance = self.risk_tolerance.clamp(0.1, 0.9);
    }

    /// Count stressful and calm ticks; turn survived stress into resilience
    /// and burnout into its loss.
    pub fn update_resilience(&mut self, cortisol: f64, identity: &mut IdentityModel) {
        if cortisol > STRESS_THRESHOLD {
            self.stress_accumulator = self.stress_accumulator.saturating_add(1);
            self.recovery_counter = 0;
        } else {
            self.recovery_counter = self.recovery_counter.saturating_add(1);
        }

        if (1..=4).contains(&self.stress_accumulator) && self.recovery_counter > 3 {
            identity.add_evidence("resilience", RESILIENCE_GROWTH);
            self.stress_accumulator = 0;
        }

        if cortisol > BURNOUT_THRESHOLD {
            identity.add_evidence("resilience", -RESILIENCE_DAMAGE);
        }
    }

    /// Decay reflection depth; deep rumination tires, calm restores.
    pub fn balance_reflection(&mut self, development: &mut DevelopmentTracker, cortisol: f64) {
        development.reflection_depth *= REFLECTION_DECAY_RATE;
        if development.reflection_depth > REFLECTION_FATIGUE_DEPTH {
            self.fatigue += 0.01;
        }
        if cortisol < STRESS_THRESHOLD {
            self.fatigue *= FATIGUE_RECOVERY_RATE;
        }
        self.fatigue = self.fatigue.clamp(0.0, 1.0);
    }

    /// One growth step from this tick's regret and signal volatility.
    ///
    /// `signals` is the chemistry at the end of the tick. Maturity in
    /// `development` is pulled toward a target made of experience,
    /// intelligence, wisdom and reflection depth.
    pub fn grow(
        &mut self,
        regret: f64,
        signals: &SignalMap,
        resilience: f64,
        development: &mut DevelopmentTracker,
    ) -> GrowthStep {
        let multiplier = self.stage(development).learning_multiplier();
        let regret = if regret.is_finite() { regret } else { 0.0 };

        let volatility: f64 = signals
            .iter()
            .map(|(k, v)| (v - self.previous_signals.get(k).copied().unwrap_or(0.0)).abs())
            .sum();
        let novelty = 1.0 / (1.0 + self.experience * 0.1);
        let recovered = self.stress_recovered();

        let experience_gain = (volatility * 0.0008 + regret.abs() * 0.008 + if recovered { 0.02 } else { 0.0 })
            * novelty
            * multiplier;
        self.experience += experience_gain;

        let prediction_error = regret.abs();
        let stability = (self.last_prediction_error - prediction_error).max(0.0);
        let intelligence_gain = (stability * 0.01 + development.reflection_depth * 0.0003) * multiplier;
        self.intelligence = (self.intelligence + intelligence_gain).clamp(0.3, 1.0);
        self.last_prediction_error = prediction_error;

        let mut wisdom_gain = 0.0;
        if regret > 0.0 && stability > 0.0 {
            wisdom_gain += regret * 0.003 * multiplier;
        }
        if recovered {
            wisdom_gain += 0.01 * multiplier;
        }
        if resilience > 0.6 && regret > 0.0 {
            wisdom_gain += 0.002 * multiplier;
        }
        self.wisdom = (self.wisdom + wisdom_gain).min(1.0);

        let target = self.experience * 0.15
            + self.intelligence * 0.35
            + self.wisdom * 0.35
            + development.reflection_depth * 0.0004;
        development.maturity += (target - development.maturity) * MATURITY_SMOOTHING;
        development.maturity = development.maturity.clamp(0.0, 1.0);

        self.previous_signals = signals.clone();

        GrowthStep {
            experience: experience_gain,
            intelligence: intelligence_gain,
            wisdom: wisdom_gain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(pairs: &[(&str, f64)]) -> SignalMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_risk_adaptation_bounds() {
        let mut c = Cognition::new();
        for _ in 0..200 {
            c.adapt_risk(1.0);
        }
        assert_eq!(c.risk_tolerance, 0.1);
        for _ in 0..500 {
            c.adapt_risk(-1.0);
        }
        assert_eq!(c.risk_tolerance, 0.9);
    }

    #[test]
    fn test_short_stress_then_calm_builds_resilience() {
        let mut c = Cognition::new();
        let mut identity = IdentityModel::default();
        for _ in 0..2 {
            c.update_resilience(60.0, &mut identity);
        }
        for _ in 0..4 {
            c.update_resilience(30.0, &mut identity);
        }
        assert!((identity.evidence("resilience") - RESILIENCE_GROWTH).abs() < 1e-12);
        assert_eq!(c.stress_accumulator, 0);
    }

    #[test]
    fn test_stress_counters_saturate() {
        let mut c = Cognition::new();
        let mut identity = IdentityModel::default();
        c.stress_accumulator = u32::MAX;
        c.update_resilience(60.0, &mut identity);
        assert_eq!(c.stress_accumulator, u32::MAX);

        c.recovery_counter = u32::MAX;
        c.update_resilience(30.0, &mut identity);
        assert_eq!(c.recovery_counter, u32::MAX);
    }

    #[test]
    fn test_burnout_damages_resilience() {
        let mut c = Cognition::new();
        let mut identity = IdentityModel::default();
        c.update_resilience(90.0, &mut identity);
        assert!(identity.evidence("resilience") < 0.0);
        assert_eq!(c.recovery_counter, 0);
    }

    #[test]
    fn test_fatigue_from_deep_reflection_and_recovery() {
        let mut c = Cognition::new();
        let mut dev = DevelopmentTracker::default();
        dev.reflection_depth = 100.0;
        c.balance_reflection(&mut dev, 80.0);
        assert!((c.fatigue - 0.01).abs() < 1e-12);
        assert!((dev.reflection_depth - 99.5).abs() < 1e-9);

        dev.reflection_depth = 0.0;
        c.balance_reflection(&mut dev, 20.0);
        assert!((c.fatigue - 0.0098).abs() < 1e-12);
    }

    #[test]
    fn test_growth_bounds_and_maturity_drift() {
        let mut c = Cognition::new();
        let mut dev = DevelopmentTracker::default();
        let s = signals(&[("dopamine", 50.0), ("cortisol", 30.0)]);
        let before = dev.maturity;
        let step = c.grow(0.5, &s, 0.5, &mut dev);

        assert!(step.experience > 0.0);
        assert!(step.wisdom > 0.0, "positive regret with stability grows wisdom");
        assert!((0.3..=1.0).contains(&c.intelligence));
        assert!((0.0..=1.0).contains(&dev.maturity));
        assert_ne!(dev.maturity, before);
        assert_eq!(c.last_prediction_error, 0.5);
    }

    #[test]
    fn test_volatility_measured_against_previous_tick() {
        let mut c = Cognition::new();
        let mut dev = DevelopmentTracker::default();
        let s = signals(&[("dopamine", 50.0)]);
        let first = c.grow(0.0, &s, 0.5, &mut dev);
        let second = c.grow(0.0, &s, 0.5, &mut dev);
        assert!(first.experience > 0.0);
        assert_eq!(second.experience, 0.0, "unchanged signals carry no volatility");
    }

    #[test]
    fn test_wisdom_never_decreases() {
        let mut c = Cognition::new();
        let mut dev = DevelopmentTracker::default();
        let mut last = c.wisdom;
        for regret in [1.0, -3.0, 0.0, 2.0, -0.5, 5.0] {
            c.grow(regret, &SignalMap::new(), 0.9, &mut dev);
            assert!(c.wisdom >= last);
            last = c.wisdom;
        }
    }
}
