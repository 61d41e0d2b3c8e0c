use crate::chemistry::{ChemicalState, SignalMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sparse directed graph of cross-chemical influence: `source -> {target: weight}`.
///
/// One application adds `value(source) * weight` to every target. All deltas
/// are computed from the values as they stand before the pass, then applied
/// together, so a chain A -> B -> C never sees B's post-update value within
/// the same cycle and the result does not depend on iteration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionMatrix {
    edges: BTreeMap<String, BTreeMap<String, f64>>,
}

impl InteractionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: BTreeMap<String, BTreeMap<String, f64>>) -> Self {
        Self { edges }
    }

    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>, weight: f64) {
        self.edges
            .entry(source.into())
            .or_default()
            .insert(target.into(), weight);
    }

    pub fn weight(&self, source: &str, target: &str) -> Option<f64> {
        self.edges.get(source).and_then(|t| t.get(target)).copied()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count() == 0
    }

    /// Drop edges whose source or target is not a known chemical.
    /// Returns the removed `(source, target)` pairs.
    pub fn retain_known(&mut self, state: &ChemicalState) -> Vec<(String, String)> {
        let mut dropped = Vec::new();
        self.edges.retain(|source, targets| {
            if !state.contains(source) {
                dropped.extend(targets.keys().map(|t| (source.clone(), t.clone())));
                return false;
            }
            targets.retain(|target, _| {
                let keep = state.contains(target);
                if !keep {
                    dropped.push((source.clone(), target.clone()));
                }
                keep
            });
            true
        });
        dropped
    }

    /// Phase one: per-target deltas from the current source values.
    /// Unknown sources and targets contribute nothing.
    pub fn compute_deltas(&self, state: &ChemicalState) -> SignalMap {
        let mut deltas = SignalMap::new();
        for (source, targets) in &self.edges {
            let Some(source_value) = state.get(source) else {
                continue;
            };
            for (target, weight) in targets {
                if !state.contains(target) {
                    continue;
                }
                *deltas.entry(target.clone()).or_insert(0.0) += source_value * weight;
            }
        }
        deltas
    }

    /// Compute then apply in one call.
    pub fn apply(&self, state: &mut ChemicalState) -> SignalMap {
        let deltas = self.compute_deltas(state);
        if !deltas.is_empty() {
            tracing::trace!(?deltas, "interaction deltas");
        }
        state.inject(&deltas);
        deltas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChemicalParams;

    fn state(values: &[(&str, f64)]) -> ChemicalState {
        let params = values
            .iter()
            .map(|(n, v)| (n.to_string(), ChemicalParams::new(*v, -1000.0, 1000.0, 0.0, 0.0)))
            .collect();
        ChemicalState::from_params(&params)
    }

    #[test]
    fn test_chain_uses_pre_pass_values() {
        let mut s = state(&[("a", 10.0), ("b", 0.0), ("c", 0.0)]);
        let mut m = InteractionMatrix::new();
        m.add_edge("a", "b", 1.0);
        m.add_edge("b", "c", 1.0);
        m.apply(&mut s);

        assert_eq!(s.get("b"), Some(10.0));
        // C saw B's pre-pass value (0), not 10
        assert_eq!(s.get("c"), Some(0.0));
    }

    #[test]
    fn test_multiple_sources_sum_into_target() {
        let mut s = state(&[("a", 10.0), ("b", 20.0), ("t", 0.0)]);
        let mut m = InteractionMatrix::new();
        m.add_edge("a", "t", 0.5);
        m.add_edge("b", "t", -0.25);
        let deltas = m.apply(&mut s);
        assert_eq!(deltas.get("t"), Some(&0.0));
        assert_eq!(s.get("t"), Some(0.0));
    }

    #[test]
    fn test_mutual_edges_are_symmetric() {
        let mut s = state(&[("a", 10.0), ("b", 4.0)]);
        let mut m = InteractionMatrix::new();
        m.add_edge("a", "b", 0.1);
        m.add_edge("b", "a", 0.1);
        m.apply(&mut s);
        assert!((s.value_or_zero("a") - 10.4).abs() < 1e-12);
        assert!((s.value_or_zero("b") - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_names_are_skipped() {
        let mut s = state(&[("a", 10.0)]);
        let mut m = InteractionMatrix::new();
        m.add_edge("ghost", "a", 1.0);
        m.add_edge("a", "ghost", 1.0);
        let deltas = m.apply(&mut s);
        assert!(deltas.is_empty());
        assert_eq!(s.get("a"), Some(10.0));
    }

    #[test]
    fn test_retain_known_reports_dropped_edges() {
        let s = state(&[("a", 1.0), ("b", 1.0)]);
        let mut m = InteractionMatrix::new();
        m.add_edge("a", "b", 1.0);
        m.add_edge("a", "x", 1.0);
        m.add_edge("y", "a", 1.0);
        let dropped = m.retain_known(&s);
        assert_eq!(dropped.len(), 2);
        assert_eq!(m.edge_count(), 1);
        assert_eq!(m.weight("a", "b"), Some(1.0));
    }
}
