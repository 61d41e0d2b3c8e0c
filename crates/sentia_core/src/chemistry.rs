//! Chemical signals: the fast, continuously regulated layer of the agent.
//!
//! Every signal is a bounded scalar with its own baseline, decay rate and
//! noise amplitude. A cycle mutates the whole state in a fixed phase order:
//!
//! 1. interactions (see [`crate::InteractionMatrix`]), computed from the
//!    acted-upon values before any relaxation
//! 2. homeostasis: `value += decay * (baseline - value)`
//! 3. noise: uniform in `[-noise, noise]`, skipped in deterministic mode
//! 4. clamp into `[min, max]`
//!
//! Event and feedback injection happen later in the cycle and are followed
//! by another clamp, so `min <= value <= max` holds at the end of every cycle.

use crate::config::ChemicalParams;
use crate::noise::NoiseSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-signal values or deltas keyed by chemical name.
pub type SignalMap = BTreeMap<String, f64>;

/// Guard against NaN and Infinity in signal values.
#[inline]
fn sanitize_f64(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in chemical state, resetting to baseline {}", fallback);
        fallback
    }
}

/// One named signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chemical {
    pub value: f64,
    pub baseline: f64,
    pub min: f64,
    pub max: f64,
    /// Fraction of the distance to baseline recovered per cycle, in [0, 1).
    pub decay: f64,
    /// Half-width of the uniform noise band, >= 0.
    pub noise: f64,
}

impl Chemical {
    /// A fresh chemical sitting at its baseline.
    pub fn from_params(params: &ChemicalParams) -> Self {
        Self {
            value: params.baseline,
            baseline: params.baseline,
            min: params.min,
            max: params.max,
            decay: params.decay,
            noise: params.noise,
        }
    }

    pub fn apply_homeostasis(&mut self) {
        self.value += (self.baseline - self.value) * self.decay;
    }

    pub fn apply_noise(&mut self, noise: &mut NoiseSource) {
        self.value += noise.uniform(self.noise);
    }

    pub fn inject(&mut self, delta: f64) {
        if delta.is_finite() {
            self.value += delta;
        }
    }

    /// Clamp into `[min, max]`. Written with `max`/`min` rather than
    /// `f64::clamp` so inverted bounds that slipped past validation drift
    /// instead of panicking.
    pub fn clamp(&mut self) {
        self.value = sanitize_f64(self.value, self.baseline)
            .max(self.min)
            .min(self.max);
    }

    pub fn in_range(&self) -> bool {
        self.value >= self.min && self.value <= self.max
    }
}

/// The full set of signals, keyed by name.
///
/// Unknown names are silently skipped by every operation that takes a
/// mapping: interaction graphs, feedback and event effects are sparse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChemicalState {
    chemicals: BTreeMap<String, Chemical>,
}

impl ChemicalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from validated parameters. Each chemical starts at its baseline.
    pub fn from_params(params: &BTreeMap<String, ChemicalParams>) -> Self {
        Self {
            chemicals: params
                .iter()
                .map(|(name, p)| (name.clone(), Chemical::from_params(p)))
                .collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, chemical: Chemical) {
        self.chemicals.insert(name.into(), chemical);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.chemicals.get(name).map(|c| c.value)
    }

    /// Current value, or 0 for an unknown name.
    pub fn value_or_zero(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(0.0)
    }

    pub fn chemical(&self, name: &str) -> Option<&Chemical> {
        self.chemicals.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.chemicals.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.chemicals.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Chemical)> {
        self.chemicals.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.chemicals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chemicals.is_empty()
    }

    /// Current values of every signal.
    pub fn values(&self) -> SignalMap {
        self.chemicals
            .iter()
            .map(|(k, c)| (k.clone(), c.value))
            .collect()
    }

    pub fn apply_homeostasis(&mut self) {
        for chem in self.chemicals.values_mut() {
            chem.apply_homeostasis();
        }
    }

    pub fn apply_noise(&mut self, noise: &mut NoiseSource) {
        if noise.is_deterministic() {
            return;
        }
        for chem in self.chemicals.values_mut() {
            chem.apply_noise(noise);
        }
    }

    /// Add arbitrary deltas. Unknown names are skipped.
    pub fn inject(&mut self, deltas: &SignalMap) {
        self.inject_scaled(deltas, 1.0);
    }

    /// Add `delta * scale` for every known name.
    pub fn inject_scaled(&mut self, deltas: &SignalMap, scale: f64) {
        for (name, delta) in deltas {
            if let Some(chem) = self.chemicals.get_mut(name) {
                chem.inject(delta * scale);
            }
        }
    }

    /// Add one delta. Returns false if the name is unknown.
    pub fn inject_one(&mut self, name: &str, delta: f64) -> bool {
        match self.chemicals.get_mut(name) {
            Some(chem) => {
                chem.inject(delta);
                true
            }
            None => false,
        }
    }

    pub fn clamp(&mut self) {
        for chem in self.chemicals.values_mut() {
            chem.clamp();
        }
        debug_assert!(self.all_in_range(), "chemical left its bounds after clamp");
    }

    pub fn all_in_range(&self) -> bool {
        self.chemicals.values().all(Chemical::in_range)
    }

    /// `current - previous` per signal; names absent from `previous` count
    /// as 0.
    pub fn delta_since(&self, previous: &SignalMap) -> SignalMap {
        self.chemicals
            .iter()
            .map(|(k, c)| (k.clone(), c.value - previous.get(k).copied().unwrap_or(0.0)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dopamine_only(decay: f64, noise: f64) -> ChemicalState {
        let mut params = BTreeMap::new();
        params.insert(
            "dopamine".to_string(),
            ChemicalParams::new(50.0, 0.0, 100.0, decay, noise),
        );
        ChemicalState::from_params(&params)
    }

    #[test]
    fn test_starts_at_baseline() {
        let state = dopamine_only(0.1, 0.0);
        assert_eq!(state.get("dopamine"), Some(50.0));
        assert_eq!(state.get("serotonin"), None);
        assert_eq!(state.value_or_zero("serotonin"), 0.0);
    }

    #[test]
    fn test_homeostasis_approaches_baseline_monotonically() {
        let mut state = dopamine_only(0.1, 0.0);
        state.inject_one("dopamine", 30.0);
        state.clamp();

        let mut previous_gap = (state.value_or_zero("dopamine") - 50.0).abs();
        for _ in 0..10 {
            state.apply_homeostasis();
            state.clamp();
            let gap = (state.value_or_zero("dopamine") - 50.0).abs();
            assert!(gap < previous_gap, "gap should shrink: {} -> {}", previous_gap, gap);
            assert!(state.all_in_range());
            previous_gap = gap;
        }
    }

    #[test]
    fn test_inject_clamps_to_exact_max() {
        let mut state = dopamine_only(0.1, 0.0);
        let mut effects = SignalMap::new();
        effects.insert("dopamine".to_string(), 1000.0);
        state.inject(&effects);
        state.clamp();
        assert_eq!(state.get("dopamine"), Some(100.0));
    }

    #[test]
    fn test_inject_skips_unknown_names() {
        let mut state = dopamine_only(0.1, 0.0);
        let mut effects = SignalMap::new();
        effects.insert("adrenaline".to_string(), 10.0);
        state.inject(&effects);
        assert_eq!(state.len(), 1);
        assert!(!state.inject_one("adrenaline", 1.0));
    }

    #[test]
    fn test_deterministic_noise_leaves_values_untouched() {
        let mut state = dopamine_only(0.0, 5.0);
        let mut noise = NoiseSource::deterministic(3);
        for _ in 0..20 {
            state.apply_noise(&mut noise);
        }
        assert_eq!(state.get("dopamine"), Some(50.0));
    }

    #[test]
    fn test_noise_stays_in_band() {
        let mut state = dopamine_only(0.0, 2.0);
        let mut noise = NoiseSource::seeded(11);
        state.apply_noise(&mut noise);
        let v = state.value_or_zero("dopamine");
        assert!((48.0..=52.0).contains(&v), "noise out of band: {}", v);
    }

    #[test]
    fn test_clamp_recovers_from_nan() {
        let mut state = dopamine_only(0.1, 0.0);
        state.chemicals.get_mut("dopamine").unwrap().value = f64::NAN;
        state.clamp();
        assert_eq!(state.get("dopamine"), Some(50.0));
    }

    #[test]
    fn test_non_finite_delta_is_ignored() {
        let mut state = dopamine_only(0.1, 0.0);
        state.inject_one("dopamine", f64::INFINITY);
        assert_eq!(state.get("dopamine"), Some(50.0));
    }

    #[test]
    fn test_delta_since() {
        let mut state = dopamine_only(0.1, 0.0);
        let before = state.values();
        state.inject_one("dopamine", 4.0);
        let delta = state.delta_since(&before);
        assert_eq!(delta.get("dopamine"), Some(&4.0));
    }
}
