//! Raw perception intake.
//!
//! Perceptions arrive as `(modality, content, source)` strings. Each one is
//! interpreted into an event with small chemical effects, remembered in a
//! bounded recent list, and scanned for a fixed vocabulary of concepts whose
//! strength grows at a stage-dependent rate.

use sentia_core::SignalMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// One raw perception as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perception {
    pub modality: String,
    pub content: String,
    pub source: String,
}

/// Event derived from a perception.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub event_type: &'static str,
    pub effects: SignalMap,
}

/// Map a normalised modality and content to an event.
pub fn interpret(modality: &str, content: &str) -> Interpretation {
    let (mut event_type, pairs) = match modality {
        "hearing" => ("social_contact", vec![("oxytocin", 0.4), ("dopamine", 0.2)]),
        "speaking" => ("expression", vec![("oxytocin", 0.3), ("cortisol", -0.2)]),
        "vision" => ("novel_stimulus", vec![("dopamine", 0.25)]),
        _ => ("observation", vec![("dopamine", 0.1)]),
    };
    let mut effects: SignalMap = pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect();

    if content.to_lowercase().contains("thank") {
        *effects.entry("oxytocin".to_string()).or_insert(0.0) += 0.5;
        event_type = "social_reward";
    }
    Interpretation { event_type, effects }
}

/// Textual summary of a camera frame's mean brightness (0-255).
pub fn describe_visual_scene(brightness: f64) -> &'static str {
    if brightness < 45.0 {
        "camera observation: dark scene"
    } else if brightness > 170.0 {
        "camera observation: bright scene"
    } else {
        "camera observation: normal lighting"
    }
}

// ============================================================================
// Concepts
// ============================================================================

const CONCEPT_ALIASES: &[(&str, &str)] = &[
    ("finger", "fingers"),
    ("fingers", "fingers"),
    ("hand", "hand"),
    ("cat", "cat"),
    ("cats", "cat"),
    ("dog", "dog"),
    ("dogs", "dog"),
    ("face", "face"),
    ("eyes", "eyes"),
    ("eye", "eyes"),
    ("camera", "camera"),
    ("light", "light"),
    ("dark", "darkness"),
    ("bright", "brightness"),
    ("person", "person"),
    ("people", "person"),
];

/// Known concepts mentioned in `text`, in order, repeats included.
pub fn extract_concepts(text: &str) -> Vec<&'static str> {
    text.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|tok| tok.len() >= 3)
        .filter_map(|tok| {
            let tok = tok.to_ascii_lowercase();
            CONCEPT_ALIASES
                .iter()
                .find(|(alias, _)| *alias == tok)
                .map(|(_, concept)| *concept)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub count: u64,
    /// In [0, 1].
    pub strength: f64,
    pub first_seen_step: u64,
    pub last_seen_step: u64,
    pub modalities: BTreeMap<String, u64>,
}

/// Ranked concept entry returned by [`PerceptionMemory::top_concepts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptSummary {
    pub concept: String,
    pub count: u64,
    /// Rounded to three decimals.
    pub strength: f64,
    pub modalities: BTreeMap<String, u64>,
}

// ============================================================================
// Perception memory
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionMemory {
    capacity: usize,
    recent: VecDeque<Perception>,
    concepts: BTreeMap<String, Concept>,
}

impl Default for PerceptionMemory {
    fn default() -> Self {
        Self::new(50)
    }
}

impl PerceptionMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            recent: VecDeque::new(),
            concepts: BTreeMap::new(),
        }
    }

    pub fn remember(&mut self, perception: Perception) {
        if self.capacity == 0 {
            return;
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(perception);
    }

    /// The last `n` perceptions, oldest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Perception> {
        self.recent.iter().skip(self.recent.len().saturating_sub(n))
    }

    pub fn len(&self) -> usize {
        self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }

    /// Strengthen every concept mentioned in `content` by `rate`.
    /// Returns the number of concept mentions found.
    pub fn learn_concepts(&mut self, modality: &str, content: &str, step: u64, rate: f64) -> usize {
        let found = extract_concepts(content);
        for name in &found {
            let entry = self.concepts.entry(name.to_string()).or_insert_with(|| Concept {
                count: 0,
                strength: 0.0,
                first_seen_step: step,
                last_seen_step: step,
                modalities: BTreeMap::new(),
            });
            entry.count += 1;
            entry.strength = (entry.strength + rate).min(1.0);
            entry.last_seen_step = step;
            *entry.modalities.entry(modality.to_string()).or_insert(0) += 1;
        }
        found.len()
    }

    pub fn concept(&self, name: &str) -> Option<&Concept> {
        self.concepts.get(name)
    }

    /// Strongest concepts first, then most frequent; name order breaks ties.
    pub fn top_concepts(&self, n: usize) -> Vec<ConceptSummary> {
        let mut ranked: Vec<(&String, &Concept)> = self.concepts.iter().collect();
        ranked.sort_by(|(_, a), (_, b)| {
            b.strength
                .total_cmp(&a.strength)
                .then_with(|| b.count.cmp(&a.count))
        });
        ranked
            .into_iter()
            .take(n)
            .map(|(name, c)| ConceptSummary {
                concept: name.clone(),
                count: c.count,
                strength: (c.strength * 1000.0).round() / 1000.0,
                modalities: c.modalities.clone(),
            })
            .collect()
    }
}
