//! Property-based tests for sentia_memory.

use proptest::prelude::*;
use sentia_core::{AgentState, AppraisalConfig, SignalMap, SimilarityConfig};
use sentia_memory::{AppraisalEngine, OutcomeSign, SimilarityEngine};

const SIGNALS: [&str; 4] = ["dopamine", "cortisol", "oxytocin", "serotonin"];
const TRAITS: [&str; 4] = ["competence", "social_value", "resilience", "intelligence"];

fn arb_delta() -> impl Strategy<Value = SignalMap> {
    prop::collection::vec((0usize..4, -50.0f64..50.0), 0..4)
        .prop_map(|pairs| pairs.into_iter().map(|(i, v)| (SIGNALS[i].to_string(), v)).collect())
}

fn arb_identity() -> impl Strategy<Value = SignalMap> {
    prop::collection::vec(0.0f64..=1.0, 4)
        .prop_map(|vals| TRAITS.iter().map(|t| t.to_string()).zip(vals).collect())
}

fn arb_state() -> impl Strategy<Value = AgentState> {
    (prop::collection::vec(0.0f64..100.0, 4), arb_identity()).prop_map(|(vals, traits)| {
        let signals = SIGNALS.iter().map(|s| s.to_string()).zip(vals).collect();
        AgentState::from_parts(signals, traits)
    })
}

fn arb_outcome() -> impl Strategy<Value = OutcomeSign> {
    any::<bool>().prop_map(|b| if b { OutcomeSign::Positive } else { OutcomeSign::Negative })
}

proptest! {
    /// Magnitudes never leave `±max_intensity`, confidence stays in [0, 1]
    /// and never drops while volatility does not rise.
    #[test]
    fn appraisal_learning_stays_bounded(
        updates in prop::collection::vec((arb_delta(), arb_outcome()), 1..100),
        max_intensity in 0.5f64..20.0,
    ) {
        let mut engine = AppraisalEngine::new(
            AppraisalConfig { max_intensity, ..AppraisalConfig::default() },
            SimilarityConfig::default(),
        );
        let mut prev_confidence = 0.0;
        let mut prev_volatility = f64::INFINITY;
        for (delta, outcome) in updates {
            engine.update_emotional_learning("event", &delta, outcome);
            let p = engine.profile("event").unwrap();
            for v in p.magnitudes.values() {
                prop_assert!(v.abs() <= max_intensity, "magnitude {} escaped {}", v, max_intensity);
            }
            prop_assert!((0.0..=1.0).contains(&p.confidence));
            prop_assert!(p.volatility >= 0.0);
            if p.volatility <= prev_volatility {
                prop_assert!(p.confidence >= prev_confidence,
                    "confidence fell from {} to {} with volatility {} <= {}",
                    prev_confidence, p.confidence, p.volatility, prev_volatility);
            }
            prev_confidence = p.confidence;
            prev_volatility = p.volatility;
        }
    }

    /// Retrieval respects top_k and the threshold, and is sorted descending.
    #[test]
    fn similarity_retrieval_respects_limits(
        records in prop::collection::vec((arb_delta(), arb_identity()), 0..60),
        state in arb_state(),
        top_k in 0usize..10,
        threshold in 0.0f64..1.0,
    ) {
        let mut engine = SimilarityEngine::new(SimilarityConfig {
            top_k,
            similarity_threshold: threshold,
            ..SimilarityConfig::default()
        });
        for (delta, identity) in &records {
            engine.record_event_profile("event", delta, identity);
        }
        let hits = engine.find_similar_scored("event", &state);
        prop_assert!(hits.len() <= top_k);
        for m in &hits {
            prop_assert!(m.similarity >= threshold);
        }
        for pair in hits.windows(2) {
            prop_assert!(pair[0].similarity >= pair[1].similarity);
        }
        prop_assert!(engine.find_similar_profiles("other", &state).is_empty());
    }

    /// The per-event store never exceeds its capacity.
    #[test]
    fn similarity_store_is_bounded(
        count in 0usize..200,
        capacity in 1usize..50,
    ) {
        let mut engine = SimilarityEngine::new(SimilarityConfig {
            max_profiles_per_event: capacity,
            ..SimilarityConfig::default()
        });
        for _ in 0..count {
            engine.record_event_profile("event", &SignalMap::new(), &SignalMap::new());
        }
        prop_assert_eq!(engine.profile_count("event"), count.min(capacity));
    }
}
