//! Episodic similarity store.
//!
//! Keeps, per event type, a bounded FIFO of past experiences (the realized
//! chemical delta plus the identity snapshot at the time) and retrieves the
//! ones most similar to the live state. Rarely seen event types use this to
//! borrow statistics without touching their own learned profile.
//!
//! Similarity is a weighted sum of two inverse-distance scores:
//!
//! ```text
//! sim = chemical_weight / (1 + |signals - stored delta|)
//!     + identity_weight / (1 + |traits - stored identity|)
//! ```
//!
//! Each distance is Euclidean over the keys the stored experience carries.

use sentia_core::{AgentState, SignalMap, SimilarityConfig};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// A stored experience, resolved to one shape when it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Experience {
    /// A bare per-signal delta with no identity context.
    Flat { chemicals: SignalMap },
    /// A delta together with the trait values at the time.
    Record(ExperienceProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceProfile {
    pub chemical_delta: SignalMap,
    pub identity: SignalMap,
}

impl Experience {
    pub fn chemicals(&self) -> &SignalMap {
        match self {
            Experience::Flat { chemicals } => chemicals,
            Experience::Record(p) => &p.chemical_delta,
        }
    }

    pub fn identity(&self) -> Option<&SignalMap> {
        match self {
            Experience::Flat { .. } => None,
            Experience::Record(p) => Some(&p.identity),
        }
    }

    /// Value this experience contributes for `signal` when averaging
    /// neighbours. Flat deltas only speak for the signals they carry; full
    /// records read a missing signal as 0.
    pub fn contribution(&self, signal: &str) -> Option<f64> {
        match self {
            Experience::Flat { chemicals } => chemicals.get(signal).copied(),
            Experience::Record(p) => Some(p.chemical_delta.get(signal).copied().unwrap_or(0.0)),
        }
    }
}

/// One retrieval hit.
#[derive(Debug, Clone, Copy)]
pub struct SimilarMatch<'a> {
    pub similarity: f64,
    pub experience: &'a Experience,
}

fn euclidean<'a>(keys: impl Iterator<Item = &'a String>, stored: &SignalMap, live: impl Fn(&str) -> f64) -> f64 {
    keys.map(|k| {
        let d = live(k.as_str()) - stored.get(k).copied().unwrap_or(0.0);
        d * d
    })
    .sum::<f64>()
    .sqrt()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEngine {
    config: SimilarityConfig,
    profiles: BTreeMap<String, VecDeque<Experience>>,
    /// Logical time of the last write per event type, for LRU eviction.
    last_recorded: BTreeMap<String, u64>,
    clock: u64,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new(SimilarityConfig::default())
    }
}

impl SimilarityEngine {
    pub fn new(config: SimilarityConfig) -> Self {
        Self {
            config,
            profiles: BTreeMap::new(),
            last_recorded: BTreeMap::new(),
            clock: 0,
        }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Store a full record for `event_type`.
    pub fn record_event_profile(&mut self, event_type: &str, chemical_delta: &SignalMap, identity: &SignalMap) {
        self.record(
            event_type,
            Experience::Record(ExperienceProfile {
                chemical_delta: chemical_delta.clone(),
                identity: identity.clone(),
            }),
        );
    }

    /// Append an experience, evicting the oldest past capacity and, when a
    /// cap on distinct event types is set, the least recently recorded type.
    pub fn record(&mut self, event_type: &str, experience: Experience) {
        let capacity = self.config.max_profiles_per_event;
        if capacity == 0 {
            return;
        }
        let queue = self.profiles.entry(event_type.to_string()).or_default();
        queue.push_back(experience);
        while queue.len() > capacity {
            queue.pop_front();
        }

        self.clock += 1;
        self.last_recorded.insert(event_type.to_string(), self.clock);
        self.evict_stale_types();
    }

    fn evict_stale_types(&mut self) {
        let Some(cap) = self.config.max_event_types else {
            return;
        };
        while self.profiles.len() > cap.max(1) {
            let oldest = self
                .last_recorded
                .iter()
                .min_by_key(|(_, t)| **t)
                .map(|(k, _)| k.clone());
            let Some(oldest) = oldest else { break };
            tracing::debug!(event_type = %oldest, "evicting least recently recorded event type");
            self.profiles.remove(&oldest);
            self.last_recorded.remove(&oldest);
        }
    }

    /// Similarity of one stored experience to the live state.
    pub fn compute_similarity(&self, experience: &Experience, state: &AgentState) -> f64 {
        let chemicals = experience.chemicals();
        let chem_dist = euclidean(chemicals.keys(), chemicals, |k| state.signal(k));
        let id_dist = match experience.identity() {
            Some(identity) => euclidean(identity.keys(), identity, |k| state.trait_value(k)),
            None => 0.0,
        };
        self.config.chemical_weight / (1.0 + chem_dist) + self.config.identity_weight / (1.0 + id_dist)
    }

    /// Up to `top_k` experiences at or above the threshold, most similar
    /// first. Equal scores keep insertion order.
    pub fn find_similar_scored(&self, event_type: &str, state: &AgentState) -> Vec<SimilarMatch<'_>> {
        let Some(profiles) = self.profiles.get(event_type) else {
            return Vec::new();
        };
        let mut scored: Vec<SimilarMatch<'_>> = profiles
            .iter()
            .map(|experience| SimilarMatch {
                similarity: self.compute_similarity(experience, state),
                experience,
            })
            .filter(|m| m.similarity >= self.config.similarity_threshold)
            .collect();
        // sort_by is stable
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(self.config.top_k);
        scored
    }

    pub fn find_similar_profiles(&self, event_type: &str, state: &AgentState) -> Vec<&Experience> {
        self.find_similar_scored(event_type, state)
            .into_iter()
            .map(|m| m.experience)
            .collect()
    }

    /// Similarity-weighted mean delta over the retrieved neighbours.
    /// Empty when nothing qualifies.
    pub fn blended_emotional_prediction(&self, event_type: &str, state: &AgentState) -> SignalMap {
        let similar = self.find_similar_scored(event_type, state);
        let total_weight: f64 = similar.iter().map(|m| m.similarity).sum();
        if similar.is_empty() || total_weight <= 0.0 {
            return SignalMap::new();
        }
        let mut blended = SignalMap::new();
        for m in &similar {
            for (chem, value) in m.experience.chemicals() {
                *blended.entry(chem.clone()).or_insert(0.0) += value * m.similarity;
            }
        }
        for v in blended.values_mut() {
            *v /= total_weight;
        }
        blended
    }

    /// How much history backs an event type: count / 50, capped at 1.
    pub fn event_confidence(&self, event_type: &str) -> f64 {
        (self.profile_count(event_type) as f64 / 50.0).min(1.0)
    }

    pub fn profile_count(&self, event_type: &str) -> usize {
        self.profiles.get(event_type).map_or(0, VecDeque::len)
    }

    pub fn event_type_count(&self) -> usize {
        self.profiles.len()
    }

    /// Stored experience count per event type.
    pub fn memory_snapshot(&self) -> BTreeMap<String, usize> {
        self.profiles
            .iter()
            .map(|(k, v)| (k.clone(), v.len()))
            .collect()
    }
}
