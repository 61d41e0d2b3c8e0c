use crate::chemistry::SignalMap;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub agent: AgentSettings,
    pub chemicals: BTreeMap<String, ChemicalConfig>,
    pub interactions: BTreeMap<String, BTreeMap<String, f64>>,
    pub decision: DecisionConfig,
    pub appraisal: AppraisalConfig,
    pub similarity: SimilarityConfig,
    pub planner: PlannerConfig,
    pub reflection: ReflectionConfig,
    pub identity: IdentityConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent: AgentSettings::default(),
            chemicals: default_chemicals(),
            interactions: default_interactions(),
            decision: DecisionConfig::default(),
            appraisal: AppraisalConfig::default(),
            similarity: SimilarityConfig::default(),
            planner: PlannerConfig::default(),
            reflection: ReflectionConfig::default(),
            identity: IdentityConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Parse TOML. Missing sections fall back to the built-in defaults.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from a TOML file, then apply env var overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config =
            Self::from_toml_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; on any failure, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SENTIA_SEED") {
            if let Ok(n) = v.parse() {
                self.agent.seed = Some(n);
            }
        }
        if let Ok(v) = std::env::var("SENTIA_DETERMINISTIC") {
            match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.agent.deterministic = true,
                "0" | "false" | "no" | "off" => self.agent.deterministic = false,
                _ => tracing::warn!("Ignoring unrecognised SENTIA_DETERMINISTIC={}", v),
            }
        }
        if let Ok(v) = std::env::var("SENTIA_LOOKAHEAD_DEPTH") {
            if let Ok(n) = v.parse() {
                self.planner.max_depth = n;
            }
        }
        if let Ok(v) = std::env::var("SENTIA_RISK_AVERSION") {
            if let Ok(n) = v.parse::<f64>() {
                if n.is_finite() {
                    self.planner.risk_aversion = n;
                }
            }
        }
    }

    /// Repair recoverable problems in place and reject non-finite numbers.
    ///
    /// Repairs: missing chemical keys default to 0, inverted bounds are
    /// swapped, baselines are clamped into range, decay is clamped into
    /// [0, 1), negative noise is made absolute, interactions naming unknown
    /// chemicals are dropped, missing base probabilities become uniform and
    /// a non-positive probability sum is reset to uniform.
    pub fn validate(&mut self) -> std::result::Result<ValidationReport, ConfigError> {
        let mut report = ValidationReport::default();

        for (name, chem) in self.chemicals.iter_mut() {
            chem.repair(name, &mut report)?;
        }

        for (source, targets) in &self.interactions {
            for (target, weight) in targets {
                if !weight.is_finite() {
                    return Err(ConfigError::NonFiniteWeight {
                        from: source.clone(),
                        to: target.clone(),
                    });
                }
            }
        }
        let known = &self.chemicals;
        let mut cleaned = BTreeMap::new();
        for (source, targets) in std::mem::take(&mut self.interactions) {
            if !known.contains_key(&source) {
                for target in targets.keys() {
                    report.push(Repair::DroppedInteraction {
                        from: source.clone(),
                        to: target.clone(),
                    });
                }
                continue;
            }
            let mut kept = BTreeMap::new();
            for (target, weight) in targets {
                if known.contains_key(&target) {
                    kept.insert(target, weight);
                } else {
                    report.push(Repair::DroppedInteraction {
                        from: source.clone(),
                        to: target,
                    });
                }
            }
            cleaned.insert(source, kept);
        }
        self.interactions = cleaned;

        self.decision.repair(&mut report)?;

        for repair in &report.repairs {
            tracing::warn!("[config] {}", repair);
        }
        Ok(report)
    }

    /// Validated chemical parameters. Missing keys read as 0.
    pub fn chemical_params(&self) -> BTreeMap<String, ChemicalParams> {
        self.chemicals
            .iter()
            .map(|(name, c)| (name.clone(), c.params()))
            .collect()
    }
}

// ============================================================================
// Validation report
// ============================================================================

/// One repair performed by [`AgentConfig::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Repair {
    MissingKey { chemical: String, field: &'static str },
    SwappedBounds { chemical: String },
    ClampedBaseline { chemical: String, from: f64, to: f64 },
    ClampedDecay { chemical: String, from: f64, to: f64 },
    NegativeNoise { chemical: String },
    DroppedInteraction { from: String, to: String },
    UniformProbabilities,
    ResetProbabilities,
    AddedMissingAction { action: String },
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repair::MissingKey { chemical, field } => {
                write!(f, "'{}' missing '{}', defaulting to 0", chemical, field)
            }
            Repair::SwappedBounds { chemical } => write!(f, "'{}' min > max, swapped", chemical),
            Repair::ClampedBaseline { chemical, from, to } => {
                write!(f, "'{}' baseline {} outside range, clamped to {}", chemical, from, to)
            }
            Repair::ClampedDecay { chemical, from, to } => {
                write!(f, "'{}' decay {} outside [0, 1), clamped to {}", chemical, from, to)
            }
            Repair::NegativeNoise { chemical } => {
                write!(f, "'{}' has negative noise, using its magnitude", chemical)
            }
            Repair::DroppedInteraction { from, to } => {
                write!(f, "interaction {} -> {} names an unknown chemical, dropped", from, to)
            }
            Repair::UniformProbabilities => {
                write!(f, "missing base probabilities, initialised uniform")
            }
            Repair::ResetProbabilities => {
                write!(f, "base probabilities sum to <= 0, reset to uniform")
            }
            Repair::AddedMissingAction { action } => {
                write!(f, "action '{}' had a base probability but was not listed, appended", action)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub repairs: Vec<Repair>,
}

impl ValidationReport {
    fn push(&mut self, repair: Repair) {
        self.repairs.push(repair);
    }

    pub fn is_clean(&self) -> bool {
        self.repairs.is_empty()
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Disable chemical noise. Other draws still use the seeded stream.
    pub deterministic: bool,
    /// Fixed seed. `None` means 0 in deterministic mode, OS entropy otherwise.
    pub seed: Option<u64>,
    pub feedback_multiplier: f64,
    /// Ticks between narrative updates.
    pub narrative_interval: u64,
    /// Autobiography entries summarised per narrative update.
    pub narrative_window: usize,
    /// Scale applied to narrative identity bias before it becomes evidence.
    pub narrative_bias_scale: f64,
    pub autobiography_capacity: usize,
    pub perception_history: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            deterministic: false,
            seed: None,
            feedback_multiplier: 1.0,
            narrative_interval: 25,
            narrative_window: 100,
            narrative_bias_scale: 0.1,
            autobiography_capacity: 500,
            perception_history: 50,
        }
    }
}

/// Raw chemical entry as written in the config file. Missing keys are
/// repaired to 0 by validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChemicalConfig {
    pub baseline: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub decay: Option<f64>,
    pub noise: Option<f64>,
}

impl ChemicalConfig {
    pub fn complete(baseline: f64, min: f64, max: f64, decay: f64, noise: f64) -> Self {
        Self {
            baseline: Some(baseline),
            min: Some(min),
            max: Some(max),
            decay: Some(decay),
            noise: Some(noise),
        }
    }

    fn params(&self) -> ChemicalParams {
        ChemicalParams {
            baseline: self.baseline.unwrap_or(0.0),
            min: self.min.unwrap_or(0.0),
            max: self.max.unwrap_or(0.0),
            decay: self.decay.unwrap_or(0.0),
            noise: self.noise.unwrap_or(0.0),
        }
    }

    fn repair(&mut self, name: &str, report: &mut ValidationReport) -> std::result::Result<(), ConfigError> {
        for (field, slot) in [
            ("baseline", &mut self.baseline),
            ("min", &mut self.min),
            ("max", &mut self.max),
            ("decay", &mut self.decay),
            ("noise", &mut self.noise),
        ] {
            match *slot {
                None => {
                    report.push(Repair::MissingKey {
                        chemical: name.to_string(),
                        field,
                    });
                    *slot = Some(0.0);
                }
                Some(v) if !v.is_finite() => {
                    return Err(ConfigError::NonFinite {
                        chemical: name.to_string(),
                        field,
                    });
                }
                Some(_) => {}
            }
        }

        let mut p = self.params();
        if p.min > p.max {
            std::mem::swap(&mut p.min, &mut p.max);
            report.push(Repair::SwappedBounds {
                chemical: name.to_string(),
            });
        }
        let baseline = p.baseline.max(p.min).min(p.max);
        if baseline != p.baseline {
            report.push(Repair::ClampedBaseline {
                chemical: name.to_string(),
                from: p.baseline,
                to: baseline,
            });
            p.baseline = baseline;
        }
        if !(0.0..1.0).contains(&p.decay) {
            let to = p.decay.clamp(0.0, MAX_DECAY);
            report.push(Repair::ClampedDecay {
                chemical: name.to_string(),
                from: p.decay,
                to,
            });
            p.decay = to;
        }
        if p.noise < 0.0 {
            report.push(Repair::NegativeNoise {
                chemical: name.to_string(),
            });
            p.noise = p.noise.abs();
        }

        *self = Self::complete(p.baseline, p.min, p.max, p.decay, p.noise);
        Ok(())
    }
}

/// Largest decay accepted after repair; decay must stay strictly below 1.
const MAX_DECAY: f64 = 0.999;

/// Validated parameters of one chemical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChemicalParams {
    pub baseline: f64,
    pub min: f64,
    pub max: f64,
    pub decay: f64,
    pub noise: f64,
}

impl ChemicalParams {
    pub fn new(baseline: f64, min: f64, max: f64, decay: f64, noise: f64) -> Self {
        Self {
            baseline,
            min,
            max,
            decay,
            noise,
        }
    }
}

fn default_chemicals() -> BTreeMap<String, ChemicalConfig> {
    [
        ("dopamine", ChemicalConfig::complete(50.0, 0.0, 100.0, 0.05, 0.5)),
        ("serotonin", ChemicalConfig::complete(50.0, 0.0, 100.0, 0.03, 0.3)),
        ("cortisol", ChemicalConfig::complete(30.0, 0.0, 100.0, 0.05, 0.5)),
        ("oxytocin", ChemicalConfig::complete(40.0, 0.0, 100.0, 0.04, 0.3)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_interactions() -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut m: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    let mut edge = |s: &str, t: &str, w: f64| {
        m.entry(s.to_string()).or_default().insert(t.to_string(), w);
    };
    edge("cortisol", "serotonin", -0.01);
    edge("cortisol", "dopamine", -0.005);
    edge("dopamine", "serotonin", 0.005);
    edge("oxytocin", "cortisol", -0.01);
    m
}

/// Base decision model and per-action environment feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Ordered: iteration and tie-breaking follow this list.
    pub actions: Vec<String>,
    pub base_probabilities: BTreeMap<String, f64>,
    /// `signal -> {action: weight}`; adds `signal value * weight`.
    pub chemical_influence: BTreeMap<String, BTreeMap<String, f64>>,
    pub normalization: bool,
    pub min_probability: f64,
    pub max_probability: f64,
    pub action_feedback: BTreeMap<String, SignalMap>,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        let actions: Vec<String> = ["explore", "socialize", "rest"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let base_probabilities = [("explore", 0.4), ("socialize", 0.3), ("rest", 0.3)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let mut chemical_influence: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        chemical_influence
            .entry("dopamine".into())
            .or_default()
            .insert("explore".into(), 0.002);
        chemical_influence
            .entry("oxytocin".into())
            .or_default()
            .insert("socialize".into(), 0.002);
        chemical_influence
            .entry("cortisol".into())
            .or_default()
            .insert("rest".into(), 0.003);

        let feedback = |pairs: &[(&str, f64)]| -> SignalMap {
            pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        };
        let mut action_feedback = BTreeMap::new();
        action_feedback.insert("explore".into(), feedback(&[("dopamine", 3.0), ("cortisol", 1.0)]));
        action_feedback.insert("socialize".into(), feedback(&[("oxytocin", 3.0), ("serotonin", 1.0)]));
        action_feedback.insert("rest".into(), feedback(&[("cortisol", -2.0), ("serotonin", 1.0)]));

        Self {
            actions,
            base_probabilities,
            chemical_influence,
            normalization: true,
            min_probability: 0.0,
            max_probability: 1.0,
            action_feedback,
        }
    }
}

impl DecisionConfig {
    fn repair(&mut self, report: &mut ValidationReport) -> std::result::Result<(), ConfigError> {
        for (action, p) in &self.base_probabilities {
            if !p.is_finite() {
                return Err(ConfigError::NonFiniteProbability {
                    action: action.clone(),
                });
            }
        }

        for action in self.base_probabilities.keys() {
            if !self.actions.contains(action) {
                report.push(Repair::AddedMissingAction {
                    action: action.clone(),
                });
                self.actions.push(action.clone());
            }
        }

        if self.base_probabilities.is_empty() && !self.actions.is_empty() {
            report.push(Repair::UniformProbabilities);
            self.base_probabilities = self.actions.iter().map(|a| (a.clone(), 1.0)).collect();
        }

        let total: f64 = self.base_probabilities.values().sum();
        if total <= 0.0 && !self.actions.is_empty() {
            report.push(Repair::ResetProbabilities);
            let uniform = 1.0 / self.actions.len() as f64;
            self.base_probabilities = self.actions.iter().map(|a| (a.clone(), uniform)).collect();
        }

        if self.min_probability > self.max_probability {
            std::mem::swap(&mut self.min_probability, &mut self.max_probability);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppraisalConfig {
    pub learning_rate: f64,
    /// Extra learning rate applied to negative outcomes.
    pub negative_amplifier: f64,
    /// Plasticity decay applied to magnitudes after each update.
    pub decay_rate: f64,
    pub max_intensity: f64,
    pub surprise_sensitivity: f64,
    pub volatility_decay: f64,
    pub confidence_step: f64,
    /// Weight of the neighbour average added to a prediction.
    pub similarity_blend: f64,
    pub tracked_signals: Vec<String>,
    /// LRU cap on distinct event types. `None` keeps every type.
    pub max_event_types: Option<usize>,
}

impl Default for AppraisalConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.06,
            negative_amplifier: 1.3,
            decay_rate: 0.995,
            max_intensity: 8.0,
            surprise_sensitivity: 0.08,
            volatility_decay: 0.99,
            confidence_step: 0.02,
            similarity_blend: 0.2,
            tracked_signals: ["dopamine", "cortisol", "oxytocin", "serotonin"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_event_types: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub max_profiles_per_event: usize,
    pub similarity_threshold: f64,
    pub chemical_weight: f64,
    pub identity_weight: f64,
    pub top_k: usize,
    pub max_event_types: Option<usize>,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            max_profiles_per_event: 300,
            similarity_threshold: 0.4,
            chemical_weight: 0.4,
            identity_weight: 0.6,
            top_k: 5,
            max_event_types: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub max_depth: usize,
    pub discount: f64,
    pub risk_aversion: f64,
    pub competence_weight: f64,
    pub resilience_weight: f64,
    /// Expand only the k most probable next actions per recursive level.
    pub max_branching: Option<usize>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            discount: 0.5,
            risk_aversion: 0.2,
            competence_weight: 0.3,
            resilience_weight: 0.2,
            max_branching: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionConfig {
    pub max_regret_memory: usize,
    pub wisdom_growth_rate: f64,
    /// Competence evidence for a choice no alternative beat.
    pub confidence_step: f64,
    /// Competence evidence removed per unit of positive regret.
    pub regret_penalty: f64,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            max_regret_memory: 200,
            wisdom_growth_rate: 0.002,
            confidence_step: 0.01,
            regret_penalty: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub learning_rate: f64,
    /// Initial trait values.
    pub traits: BTreeMap<String, f64>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.02,
            traits: crate::identity::DEFAULT_TRAITS
                .iter()
                .map(|t| (t.to_string(), 0.5))
                .collect(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = AgentConfig::default();
        assert_eq!(cfg.chemicals.len(), 4);
        assert_eq!(cfg.decision.actions, vec!["explore", "socialize", "rest"]);
        assert_eq!(cfg.planner.max_depth, 2);
        assert_eq!(cfg.similarity.top_k, 5);
        assert_eq!(cfg.reflection.max_regret_memory, 200);
        assert!(!cfg.agent.deterministic);
    }

    #[test]
    fn test_defaults_validate_clean() {
        let mut cfg = AgentConfig::default();
        let report = cfg.validate().unwrap();
        assert!(report.is_clean(), "built-in defaults needed repairs: {:?}", report);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[agent]
deterministic = true
seed = 7

[planner]
max_depth = 3
"#;
        let cfg = AgentConfig::from_toml_str(toml_str).unwrap();
        assert!(cfg.agent.deterministic);
        assert_eq!(cfg.agent.seed, Some(7));
        assert_eq!(cfg.planner.max_depth, 3);
        // Defaults for unspecified fields
        assert_eq!(cfg.planner.discount, 0.5);
        assert_eq!(cfg.chemicals.len(), 4);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let cfg = AgentConfig::from_toml_str(include_str!("../../../config/agent.toml")).unwrap();
        assert_eq!(cfg, AgentConfig::default());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[chemicals.dopamine]
baseline = 50
min = 0
max = 100
decay = 0.1
noise = 0

[interactions.dopamine]
dopamine = 0.0

[decision]
actions = ["work", "play"]
action_feedback = { work = { dopamine = 2.0 }, play = { dopamine = 1.0 } }

[decision.base_probabilities]
work = 0.5
play = 0.5

[appraisal]
max_event_types = 64
"#;
        let cfg = AgentConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(cfg.chemicals.len(), 1);
        let dopamine = cfg.chemical_params()["dopamine"];
        assert_eq!(dopamine, ChemicalParams::new(50.0, 0.0, 100.0, 0.1, 0.0));
        assert_eq!(cfg.decision.actions, vec!["work", "play"]);
        assert_eq!(cfg.decision.action_feedback["work"]["dopamine"], 2.0);
        assert_eq!(cfg.appraisal.max_event_types, Some(64));
    }

    #[test]
    fn test_parse_error_is_typed() {
        let err = AgentConfig::from_toml_str("[agent\nseed = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_repairs_chemicals() {
        let mut cfg = AgentConfig::default();
        cfg.chemicals.clear();
        cfg.interactions.clear();
        cfg.chemicals.insert(
            "inverted".into(),
            ChemicalConfig::complete(500.0, 100.0, 0.0, 1.5, -2.0),
        );
        cfg.chemicals.insert(
            "sparse".into(),
            ChemicalConfig {
                baseline: Some(3.0),
                max: Some(10.0),
                ..ChemicalConfig::default()
            },
        );

        let report = cfg.validate().unwrap();
        let params = cfg.chemical_params();

        let inverted = params["inverted"];
        assert_eq!(inverted.min, 0.0);
        assert_eq!(inverted.max, 100.0);
        assert_eq!(inverted.baseline, 100.0);
        assert!(inverted.decay < 1.0);
        assert_eq!(inverted.noise, 2.0);

        let sparse = params["sparse"];
        assert_eq!(sparse, ChemicalParams::new(3.0, 0.0, 10.0, 0.0, 0.0));

        assert!(report.repairs.contains(&Repair::SwappedBounds {
            chemical: "inverted".into()
        }));
        assert!(report.repairs.contains(&Repair::MissingKey {
            chemical: "sparse".into(),
            field: "decay"
        }));
    }

    #[test]
    fn test_validate_is_idempotent() {
        let mut cfg = AgentConfig::default();
        cfg.chemicals.insert(
            "odd".into(),
            ChemicalConfig::complete(-5.0, 10.0, -10.0, 0.5, 0.0),
        );
        cfg.validate().unwrap();
        let second = cfg.validate().unwrap();
        assert!(second.is_clean(), "second pass should find nothing: {:?}", second);
    }

    #[test]
    fn test_validate_drops_unknown_interactions() {
        let mut cfg = AgentConfig::default();
        cfg.interactions
            .entry("ghost".into())
            .or_default()
            .insert("dopamine".into(), 1.0);
        cfg.interactions
            .entry("dopamine".into())
            .or_default()
            .insert("ghost".into(), 1.0);

        let report = cfg.validate().unwrap();
        assert!(!cfg.interactions.contains_key("ghost"));
        assert!(!cfg.interactions["dopamine"].contains_key("ghost"));
        assert_eq!(
            report
                .repairs
                .iter()
                .filter(|r| matches!(r, Repair::DroppedInteraction { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let mut cfg = AgentConfig::default();
        cfg.chemicals.insert(
            "bad".into(),
            ChemicalConfig::complete(f64::NAN, 0.0, 1.0, 0.1, 0.0),
        );
        assert!(matches!(cfg.validate(), Err(ConfigError::NonFinite { field: "baseline", .. })));

        let mut cfg = AgentConfig::default();
        cfg.decision.base_probabilities.insert("explore".into(), f64::INFINITY);
        assert!(matches!(cfg.validate(), Err(ConfigError::NonFiniteProbability { .. })));
    }

    #[test]
    fn test_validate_probability_repairs() {
        let mut cfg = AgentConfig::default();
        cfg.decision.base_probabilities.clear();
        let report = cfg.validate().unwrap();
        assert!(report.repairs.contains(&Repair::UniformProbabilities));
        assert_eq!(cfg.decision.base_probabilities["rest"], 1.0);

        let mut cfg = AgentConfig::default();
        for p in cfg.decision.base_probabilities.values_mut() {
            *p = 0.0;
        }
        let report = cfg.validate().unwrap();
        assert!(report.repairs.contains(&Repair::ResetProbabilities));
        let total: f64 = cfg.decision.base_probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("SENTIA_SEED", "1234");
        std::env::set_var("SENTIA_DETERMINISTIC", "true");
        std::env::set_var("SENTIA_LOOKAHEAD_DEPTH", "4");
        std::env::set_var("SENTIA_RISK_AVERSION", "0.35");

        let mut cfg = AgentConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.agent.seed, Some(1234));
        assert!(cfg.agent.deterministic);
        assert_eq!(cfg.planner.max_depth, 4);
        assert_eq!(cfg.planner.risk_aversion, 0.35);

        // Clean up env vars before testing defaults
        std::env::remove_var("SENTIA_SEED");
        std::env::remove_var("SENTIA_DETERMINISTIC");
        std::env::remove_var("SENTIA_LOOKAHEAD_DEPTH");
        std::env::remove_var("SENTIA_RISK_AVERSION");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = AgentConfig::load_or_default("/nonexistent/path.toml");
        assert_eq!(cfg.planner.max_depth, 2);
        assert_eq!(cfg.agent.seed, None);
    }
}
