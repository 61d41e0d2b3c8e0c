//! Appraisal: learned mapping from event type to emotional consequence.
//!
//! Each event type gets an [`EmotionalProfile`] the first time an outcome is
//! reported for it. Predictions scale the stored magnitudes by confidence and
//! add a soft neighbour average from the owned [`SimilarityEngine`]. Updates
//! follow a prediction-error rule with asymmetric learning: negative outcomes
//! learn `negative_amplifier` times faster than positive ones.
//!
//! Confidence is a trailing indicator of prediction stability. Surprise feeds
//! a geometrically decaying volatility, and every update raises confidence by
//! `confidence_step * (1 - min(1, volatility))`.

use crate::similarity::SimilarityEngine;
use sentia_core::{AgentState, AppraisalConfig, SignalMap, SimilarityConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether an outcome was good or bad for the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeSign {
    Positive,
    Negative,
}

impl OutcomeSign {
    /// `value >= 0` counts as positive.
    pub fn from_value(value: f64) -> Self {
        if value >= 0.0 {
            OutcomeSign::Positive
        } else {
            OutcomeSign::Negative
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            OutcomeSign::Positive => 1.0,
            OutcomeSign::Negative => -1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionalProfile {
    /// Learned delta per tracked signal, bounded by `±max_intensity`.
    pub magnitudes: SignalMap,
    /// In [0, 1].
    pub confidence: f64,
    /// >= 0.
    pub volatility: f64,
    pub updates: u64,
}

impl EmotionalProfile {
    pub fn magnitude(&self, signal: &str) -> f64 {
        self.magnitudes.get(signal).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppraisalEngine {
    config: AppraisalConfig,
    memory: BTreeMap<String, EmotionalProfile>,
    last_updated: BTreeMap<String, u64>,
    clock: u64,
    similarity: SimilarityEngine,
}

impl Default for AppraisalEngine {
    fn default() -> Self {
        Self::new(AppraisalConfig::default(), SimilarityConfig::default())
    }
}

impl AppraisalEngine {
    pub fn new(config: AppraisalConfig, similarity: SimilarityConfig) -> Self {
        Self {
            config,
            memory: BTreeMap::new(),
            last_updated: BTreeMap::new(),
            clock: 0,
            similarity: SimilarityEngine::new(similarity),
        }
    }

    pub fn config(&self) -> &AppraisalConfig {
        &self.config
    }

    pub fn similarity(&self) -> &SimilarityEngine {
        &self.similarity
    }

    pub fn similarity_mut(&mut self) -> &mut SimilarityEngine {
        &mut self.similarity
    }

    pub fn profile(&self, event_type: &str) -> Option<&EmotionalProfile> {
        self.memory.get(event_type)
    }

    pub fn emotional_memory(&self) -> &BTreeMap<String, EmotionalProfile> {
        &self.memory
    }

    pub fn event_type_count(&self) -> usize {
        self.memory.len()
    }

    /// Anticipated per-signal delta for `event_type`.
    ///
    /// Unknown event types predict zeros. With a live state, the mean of the
    /// nearest neighbours' deltas is added at `similarity_blend` weight; the
    /// stored profile itself is never changed by a prediction.
    pub fn predict_emotion(&self, event_type: &str, state: Option<&AgentState>) -> SignalMap {
        let profile = self.memory.get(event_type);
        let scale = profile.map_or(0.0, |p| p.confidence.min(1.0));

        let mut predicted: SignalMap = self
            .config
            .tracked_signals
            .iter()
            .map(|chem| (chem.clone(), profile.map_or(0.0, |p| p.magnitude(chem)) * scale))
            .collect();

        let Some(state) = state else {
            return predicted;
        };
        let neighbours = self.similarity.find_similar_profiles(event_type, state);
        if neighbours.is_empty() {
            return predicted;
        }
        for (chem, value) in predicted.iter_mut() {
            let contributions: Vec<f64> = neighbours.iter().filter_map(|n| n.contribution(chem)).collect();
            if contributions.is_empty() {
                continue;
            }
            let avg = contributions.iter().sum::<f64>() / contributions.len() as f64;
            *value += avg * self.config.similarity_blend;
        }
        predicted
    }

    /// Learn from one realized outcome.
    ///
    /// Per tracked signal: `error = realized - stored`, then
    /// `stored += error * sign * learning_rate * amplifier`, clamped to
    /// `±max_intensity`. Missing or non-finite realized values read as 0.
    pub fn update_emotional_learning(&mut self, event_type: &str, realized: &SignalMap, outcome: OutcomeSign) {
        let cfg = &self.config;
        let profile = self.memory.entry(event_type.to_string()).or_default();

        let modifier = match outcome {
            OutcomeSign::Negative => cfg.negative_amplifier,
            OutcomeSign::Positive => 1.0,
        };
        let sign = outcome.as_f64();
        let max = cfg.max_intensity.abs();

        let mut total_surprise = 0.0;
        for chem in &cfg.tracked_signals {
            let delta = realized.get(chem).copied().filter(|d| d.is_finite()).unwrap_or(0.0);
            let stored = profile.magnitude(chem);
            let error = delta - stored;
            total_surprise += error.abs();

            let adjusted = (stored + error * sign * cfg.learning_rate * modifier).clamp(-max, max);
            // Plasticity decay keeps the value inside the bound.
            profile.magnitudes.insert(chem.clone(), adjusted * cfg.decay_rate);
        }

        profile.volatility = ((profile.volatility + total_surprise * cfg.surprise_sensitivity)
            * cfg.volatility_decay)
            .max(0.0);

        let stability = 1.0 - profile.volatility.min(1.0);
        profile.confidence = (profile.confidence + cfg.confidence_step * stability).clamp(0.0, 1.0);
        profile.updates += 1;

        tracing::trace!(
            event_type,
            confidence = profile.confidence,
            volatility = profile.volatility,
            "appraisal updated"
        );

        self.clock += 1;
        self.last_updated.insert(event_type.to_string(), self.clock);
        self.evict_stale_types();
    }

    fn evict_stale_types(&mut self) {
        let Some(cap) = self.config.max_event_types else {
            return;
        };
        while self.memory.len() > cap.max(1) {
            let oldest = self
                .last_updated
                .iter()
                .min_by_key(|(_, t)| **t)
                .map(|(k, _)| k.clone());
            let Some(oldest) = oldest else { break };
            tracing::debug!(event_type = %oldest, "evicting least recently updated appraisal");
            self.memory.remove(&oldest);
            self.last_updated.remove(&oldest);
        }
    }
}
