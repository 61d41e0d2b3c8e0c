use serde::{Deserialize, Serialize};

/// Ordered action -> probability map.
///
/// Iteration order is insertion order and is what every tie-break in the
/// planner follows. Values are not required to sum to one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionDistribution(Vec<(String, f64)>);

impl ActionDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pairs. A repeated action keeps its first position and its
    /// last value.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut d = Self::new();
        for (a, p) in pairs {
            d.set(a, p);
        }
        d
    }

    /// Overwrite the value of an action, appending it if new.
    pub fn set(&mut self, action: impl Into<String>, probability: f64) {
        let action = action.into();
        match self.0.iter_mut().find(|(a, _)| *a == action) {
            Some(entry) => entry.1 = probability,
            None => self.0.push((action, probability)),
        }
    }

    pub fn get(&self, action: &str) -> Option<f64> {
        self.0.iter().find(|(a, _)| a == action).map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(a, p)| (a.as_str(), *p))
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(a, _)| a.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.0.iter().map(|(_, p)| p).sum()
    }

    /// Rescale to sum to one. A non-positive total is left untouched.
    pub fn normalize(&mut self) {
        let total = self.total();
        if total > 0.0 && total.is_finite() {
            for (_, p) in self.0.iter_mut() {
                *p /= total;
            }
        }
    }

    pub fn map_values(&mut self, mut f: impl FnMut(&str, f64) -> f64) {
        for (a, p) in self.0.iter_mut() {
            *p = f(a, *p);
        }
    }

    /// The `k` most probable entries. Equal probabilities keep their
    /// original order; the result is in descending probability.
    pub fn top_k(&self, k: usize) -> ActionDistribution {
        let mut entries = self.0.clone();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        entries.truncate(k);
        ActionDistribution(entries)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ActionDistribution {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_insertion_order() {
        let d = ActionDistribution::from_pairs([("rest", 0.2), ("explore", 0.5), ("socialize", 0.3)]);
        let actions: Vec<&str> = d.actions().collect();
        assert_eq!(actions, vec!["rest", "explore", "socialize"]);
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let mut d = ActionDistribution::from_pairs([("a", 0.1), ("b", 0.2)]);
        d.set("a", 0.9);
        assert_eq!(d.get("a"), Some(0.9));
        assert_eq!(d.actions().next(), Some("a"));
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn test_normalize() {
        let mut d = ActionDistribution::from_pairs([("a", 1.0), ("b", 3.0)]);
        d.normalize();
        assert_eq!(d.get("a"), Some(0.25));
        assert_eq!(d.get("b"), Some(0.75));
    }

    #[test]
    fn test_zero_sum_left_unnormalized() {
        let mut d = ActionDistribution::from_pairs([("a", 0.0), ("b", 0.0)]);
        d.normalize();
        assert_eq!(d.get("a"), Some(0.0));
        assert!(d.iter().all(|(_, p)| p.is_finite()));
    }

    #[test]
    fn test_top_k_is_stable() {
        let d = ActionDistribution::from_pairs([("a", 0.2), ("b", 0.4), ("c", 0.2), ("d", 0.2)]);
        let top3 = d.top_k(3);
        let top: Vec<&str> = top3.actions().collect();
        assert_eq!(top, vec!["b", "a", "c"]);
    }
}
