//! The agent loop.
//!
//! [`Agent`] owns every piece of mutable state and is driven one step at a
//! time by an external caller. A tick runs, in order:
//!
//! 1. chemistry: interactions, homeostasis, noise, clamp
//! 2. decision (only with an environment): shape the base distribution,
//!    plan on a cloned [`SimulationContext`], execute, absorb feedback,
//!    reflect, adapt risk, then learn from the realized outcome
//! 3. regulation: resilience, reflection balance, development, identity
//!    (skipped while fatigued), cognitive growth
//! 4. autobiography and, every few ticks, the self-narrative

use crate::cognition::Cognition;
use crate::perception::{self, Interpretation, Perception, PerceptionMemory};
use crate::snapshot::{AgentSnapshot, SnapshotError, SNAPSHOT_VERSION};
use sentia_core::{
    reward_proxy, AgentConfig, AgentState, ChemicalState, ConfigError, DevelopmentStage, DevelopmentTracker,
    IdentityModel, InteractionMatrix, NoiseSource, SignalMap,
};
use sentia_memory::{AppraisalEngine, AutobiographicalEvent, AutobiographicalMemory, NarrativeEngine, OutcomeSign};
use sentia_reasoning::{
    ActionDistribution, ConfiguredEnvironment, DecisionPlanner, Environment, PlanOutcome, Reflection, ReflectionModule,
    SimulationContext,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Event type used when an event carries none.
pub const UNLABELED_EVENT: &str = "unlabeled";

const MAX_REFLECTION_INFLUENCE: f64 = 0.05;
const PERCEPTION_CONTENT_LIMIT: usize = 220;

// ============================================================================
// Events and decisions
// ============================================================================

/// An external event to inject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub effects: SignalMap,
    pub event_type: Option<String>,
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, effects: SignalMap) -> Self {
        Self {
            effects,
            event_type: Some(event_type.into()),
            source: None,
            tags: Vec::new(),
        }
    }

    /// Build from `(signal, delta)` pairs.
    pub fn with_effects<'a>(event_type: impl Into<String>, effects: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self::new(
            event_type,
            effects.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        )
    }

    pub fn from_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn tagged<'a>(mut self, tags: impl IntoIterator<Item = &'a str>) -> Self {
        self.tags.extend(tags.into_iter().map(str::to_string));
        self
    }

    /// Key under which the event is learned.
    pub fn key(&self) -> &str {
        self.event_type.as_deref().unwrap_or(UNLABELED_EVENT)
    }
}

/// Everything one decision produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub step: u64,
    pub action: String,
    /// Shaped distribution the planner chose from.
    pub probabilities: ActionDistribution,
    pub plan: PlanOutcome,
    /// Feedback as reported by the environment.
    pub feedback: SignalMap,
    /// Change actually applied to the chemistry, after scaling and clamping.
    pub realized: SignalMap,
    pub reflection: Reflection,
}

// ============================================================================
// Agent
// ============================================================================

pub struct Agent {
    config: AgentConfig,
    chemicals: ChemicalState,
    interactions: InteractionMatrix,
    identity: IdentityModel,
    development: DevelopmentTracker,
    cognition: Cognition,
    appraisal: AppraisalEngine,
    planner: DecisionPlanner,
    reflection: ReflectionModule,
    narrative: NarrativeEngine,
    autobiography: AutobiographicalMemory,
    perception: PerceptionMemory,
    noise: NoiseSource,
    environment: Option<Arc<dyn Environment>>,
    step: u64,
    /// Only used to log stage transitions once.
    logged_stage: DevelopmentStage,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("step", &self.step)
            .field("chemicals", &self.chemicals.values())
            .field("stage", &self.stage())
            .field("environment", &self.environment.as_ref().map(|e| e.name().to_string()))
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Build an agent from config. The config is validated (and repaired)
    /// first; only non-finite numbers are rejected.
    pub fn new(mut config: AgentConfig) -> Result<Self, ConfigError> {
        let report = config.validate()?;
        let noise = match (config.agent.deterministic, config.agent.seed) {
            (true, seed) => NoiseSource::deterministic(seed.unwrap_or(0)),
            (false, Some(seed)) => NoiseSource::seeded(seed),
            (false, None) => NoiseSource::from_entropy(),
        };

        let chemicals = ChemicalState::from_params(&config.chemical_params());
        let mut interactions = InteractionMatrix::from_edges(config.interactions.clone());
        interactions.retain_known(&chemicals);

        let mut agent = Self {
            identity: IdentityModel::from_config(&config.identity),
            appraisal: AppraisalEngine::new(config.appraisal.clone(), config.similarity.clone()),
            planner: DecisionPlanner::new(config.planner.clone()),
            reflection: ReflectionModule::new(config.reflection.clone()),
            autobiography: AutobiographicalMemory::new(config.agent.autobiography_capacity),
            perception: PerceptionMemory::new(config.agent.perception_history),
            narrative: NarrativeEngine::new(),
            development: DevelopmentTracker::new(),
            cognition: Cognition::new(),
            chemicals,
            interactions,
            noise,
            environment: None,
            step: 0,
            logged_stage: DevelopmentStage::Baby,
            config,
        };
        agent.logged_stage = agent.stage();

        tracing::info!(
            chemicals = agent.chemicals.len(),
            interactions = agent.interactions.edge_count(),
            repairs = report.repairs.len(),
            deterministic = agent.noise.is_deterministic(),
            seed = agent.noise.seed(),
            "agent constructed"
        );
        Ok(agent)
    }

    /// Attach the decision environment.
    pub fn with_environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Attach a [`ConfiguredEnvironment`] built from the agent's own
    /// `[decision]` config.
    pub fn with_configured_environment(self) -> Self {
        let env = ConfiguredEnvironment::from_config(&self.config.decision);
        self.with_environment(Arc::new(env))
    }

    pub fn set_environment(&mut self, environment: Option<Arc<dyn Environment>>) {
        self.environment = environment;
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advance one cycle. Returns the decision taken, if an environment is
    /// attached and offered at least one action.
    pub fn tick(&mut self) -> Option<Decision> {
        let step = self.step;

        self.interactions.apply(&mut self.chemicals);
        self.chemicals.apply_homeostasis();
        self.chemicals.apply_noise(&mut self.noise);
        self.chemicals.clamp();

        let decision = match self.environment.clone() {
            Some(env) => self.decide(env.as_ref(), step),
            None => None,
        };
        let regret = decision.as_ref().map_or(0.0, |d| d.reflection.regret);

        let cortisol = self.chemicals.value_or_zero("cortisol");
        self.cognition.update_resilience(cortisol, &mut self.identity);
        self.cognition.balance_reflection(&mut self.development, cortisol);

        self.development.reflect(self.identity.get("intelligence"));
        self.development.update();
        if !self.cognition.identity_locked() {
            self.identity.update();
        }

        let growth = self.cognition.grow(
            regret,
            &self.chemicals.values(),
            self.identity.get("resilience"),
            &mut self.development,
        );
        tracing::trace!(
            step,
            experience = growth.experience,
            intelligence = growth.intelligence,
            wisdom = growth.wisdom,
            "cognitive growth"
        );

        self.encode_autobiography(step);
        self.step += 1;
        self.log_stage_transition();
        decision
    }

    fn decide(&mut self, env: &dyn Environment, step: u64) -> Option<Decision> {
        let probabilities = self.shaped_distribution(env);
        let plan = self.planner.choose_action(&self.simulation_context(), &probabilities, env);
        let action = plan.chosen.clone()?;

        let outcome = env.execute(&action, &self.get_state());
        let before = self.chemicals.values();
        self.chemicals
            .inject_scaled(&outcome.feedback, self.config.agent.feedback_multiplier);
        self.chemicals.clamp();
        let realized = self.chemicals.delta_since(&before);

        // Reflection values every action with the appraisal learned so far;
        // this outcome is folded in only afterwards.
        let state = self.get_state();
        let reflection = self.reflection.reflect_on_decision(
            &action,
            probabilities.actions(),
            &self.appraisal,
            &state,
            &mut self.identity,
        );
        self.cognition.adapt_risk(reflection.regret);

        let sign = OutcomeSign::from_value(reward_proxy(&realized));
        self.appraisal.update_emotional_learning(&action, &realized, sign);
        self.appraisal
            .similarity_mut()
            .record_event_profile(&action, &realized, &self.identity.snapshot());

        tracing::debug!(
            step,
            env = env.name(),
            action = %action,
            regret = reflection.regret,
            simulations = plan.simulations,
            "decision"
        );

        Some(Decision {
            step,
            action,
            probabilities,
            plan,
            feedback: outcome.feedback,
            realized,
            reflection,
        })
    }

    /// Base distribution from the environment, nudged by identity and
    /// maturity, scaled by risk tolerance and fatigue, then normalised.
    fn shaped_distribution(&self, env: &dyn Environment) -> ActionDistribution {
        let mut probabilities = env.compute(&self.get_state());

        let boost = self.identity.get("competence") * 0.02
            + self.identity.get("social_value") * 0.01
            + self.identity.get("resilience") * 0.01
            + (self.development.maturity * 0.02).min(MAX_REFLECTION_INFLUENCE);
        let risk = 0.8 + self.cognition.risk_tolerance * 0.4;
        let rested = 1.0 - self.cognition.fatigue * 0.25;

        probabilities.map_values(|_, p| (p + boost) * risk * rested);
        probabilities.normalize();
        probabilities
    }

    /// What the agent would choose right now, without acting.
    pub fn plan(&self) -> Option<PlanOutcome> {
        let env = self.environment.as_ref()?;
        let probabilities = self.shaped_distribution(env.as_ref());
        Some(
            self.planner
                .choose_action(&self.simulation_context(), &probabilities, env.as_ref()),
        )
    }

    fn encode_autobiography(&mut self, step: u64) {
        self.autobiography.record_event(AutobiographicalEvent {
            step,
            description: "cycle_step".into(),
            chemicals: self.chemicals.values(),
            identity: self.identity.snapshot(),
            metadata: BTreeMap::new(),
        });

        let interval = self.config.agent.narrative_interval;
        if interval == 0 || step % interval != 0 {
            return;
        }
        let window = self.config.agent.narrative_window;
        self.narrative
            .update_narrative(self.autobiography.recent(window), &mut self.noise);

        let scale = self.config.agent.narrative_bias_scale;
        for (name, bias) in self.narrative.identity_bias() {
            self.identity.add_evidence(name, bias * scale);
        }
    }

    fn log_stage_transition(&mut self) {
        let stage = self.stage();
        if stage != self.logged_stage {
            tracing::info!(from = %self.logged_stage, to = %stage, step = self.step, "development stage changed");
            self.logged_stage = stage;
        }
    }

    // ========================================================================
    // Events and perception
    // ========================================================================

    /// Apply an external event and learn from it.
    ///
    /// The anticipated response is applied first, scaled by maturity. Then
    /// the event's identity evidence and its effects (negative dopamine and
    /// serotonin dampened by resilience, cortisol too) are applied. The
    /// change measured from after anticipation is what gets learned, with a
    /// positive outcome when the projected identity did not shrink.
    /// Returns that realized change.
    pub fn inject_event(&mut self, event: Event) -> SignalMap {
        let key = event.key().to_string();

        let anticipated = self.appraisal.predict_emotion(&key, Some(&self.get_state()));
        let anticipation = 0.5 + 0.5 * self.development.maturity;
        self.chemicals.inject_scaled(&anticipated, anticipation);
        self.chemicals.clamp();

        let previous = self.chemicals.values();
        let identity_before = self.identity.projected_total();

        match key.as_str() {
            "praise" => {
                self.identity.add_evidence("competence", 1.0);
                self.identity.add_evidence("social_value", 1.0);
            }
            "criticism" => {
                self.identity.add_evidence("competence", -1.0);
                self.identity.add_evidence("social_value", -1.0);
            }
            "failure" => self.identity.add_evidence("competence", -1.0),
            "success" => {
                self.identity.add_evidence("competence", 1.0);
                self.identity.add_evidence("intelligence", 1.0);
            }
            _ => {}
        }

        let resilience = self.identity.get("resilience");
        for (name, delta) in &event.effects {
            let mut delta = *delta;
            if (name == "dopamine" || name == "serotonin") && delta < 0.0 {
                delta *= 1.0 - resilience * 0.5;
            }
            if name == "cortisol" && resilience > 0.0 {
                delta *= 1.0 - resilience * 0.4;
            }
            if !self.chemicals.inject_one(name, delta) {
                tracing::debug!(signal = %name, event_type = %key, "ignoring effect on unknown signal");
            }
        }
        self.chemicals.clamp();

        let realized = self.chemicals.delta_since(&previous);
        self.development.observe_event(&self.chemicals.values());

        let outcome = OutcomeSign::from_value(self.identity.projected_total() - identity_before);
        self.appraisal.update_emotional_learning(&key, &realized, outcome);

        self.appraisal
            .similarity_mut()
            .record_event_profile(&key, &realized, &self.identity.snapshot());

        tracing::debug!(
            event_type = %key,
            source = event.source.as_deref().unwrap_or("-"),
            outcome = ?outcome,
            "event injected"
        );
        realized
    }

    /// Interpret a raw perception as an event and remember it.
    ///
    /// Empty modality or content is ignored and returns `None`.
    pub fn observe_perception(&mut self, modality: &str, content: &str, source: &str) -> Option<Interpretation> {
        let modality = modality.trim().to_lowercase();
        let content = content.trim();
        if modality.is_empty() || content.is_empty() {
            return None;
        }

        let interpretation = perception::interpret(&modality, content);
        self.perception.remember(Perception {
            modality: modality.clone(),
            content: content.to_string(),
            source: source.to_string(),
        });
        let rate = self.stage().concept_learning_rate();
        self.perception.learn_concepts(&modality, content, self.step, rate);

        self.inject_event(Event {
            effects: interpretation.effects.clone(),
            event_type: Some(interpretation.event_type.to_string()),
            source: Some(source.to_string()),
            tags: vec![modality.clone(), "perception".to_string()],
        });

        let effects: serde_json::Map<String, serde_json::Value> = interpretation
            .effects
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::from(*v)))
            .collect();
        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), serde_json::Value::from(source));
        metadata.insert(
            "content".to_string(),
            serde_json::Value::from(content.chars().take(PERCEPTION_CONTENT_LIMIT).collect::<String>()),
        );
        metadata.insert("effects".to_string(), serde_json::Value::Object(effects));

        self.autobiography.record_event(AutobiographicalEvent {
            step: self.step,
            description: format!("perception:{}:{}", modality, interpretation.event_type),
            chemicals: self.chemicals.values(),
            identity: self.identity.snapshot(),
            metadata,
        });
        Some(interpretation)
    }

    pub fn top_concepts(&self, n: usize) -> Vec<perception::ConceptSummary> {
        self.perception.top_concepts(n)
    }

    /// The last `n` perceptions, oldest first.
    pub fn recent_perceptions(&self, n: usize) -> Vec<Perception> {
        self.perception.recent(n).cloned().collect()
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Read-only view of the agent with a freshly derived development stage.
    pub fn get_state(&self) -> AgentState {
        AgentState {
            signals: self.chemicals.values(),
            traits: self.identity.snapshot(),
            development: self.development.snapshot(),
            development_stage: self.stage(),
            fatigue: self.cognition.fatigue,
            wisdom: self.reflection.wisdom(),
            cognitive_wisdom: self.cognition.wisdom,
            intelligence: self.cognition.intelligence,
            experience: self.cognition.experience,
            risk_tolerance: self.cognition.risk_tolerance,
            self_narrative: self.narrative.current().to_string(),
        }
    }

    /// Owned copy of every field a planning step may touch.
    pub fn simulation_context(&self) -> SimulationContext {
        SimulationContext {
            chemicals: self.chemicals.clone(),
            identity: self.identity.clone(),
            development: self.development.clone(),
            fatigue: self.cognition.fatigue,
            wisdom: self.reflection.wisdom(),
            cognitive_wisdom: self.cognition.wisdom,
            intelligence: self.cognition.intelligence,
            experience: self.cognition.experience,
            risk_tolerance: self.cognition.risk_tolerance,
            self_narrative: self.narrative.current().to_string(),
            feedback_multiplier: self.config.agent.feedback_multiplier,
        }
    }

    pub fn stage(&self) -> DevelopmentStage {
        self.cognition.stage(&self.development)
    }

    /// Seconds the agent would take to respond, in [0.15, 2.2].
    pub fn response_latency(&self) -> f64 {
        let cortisol = self.chemicals.value_or_zero("cortisol");
        let dopamine = self.chemicals.value_or_zero("dopamine");
        let emotional_weight = cortisol * 0.0025 - dopamine * 0.0008;
        let cognitive_load = self.cognition.fatigue * 0.5 + emotional_weight;
        let maturity_effect = (1.0 - self.development.maturity) * 0.15;
        let latency = 0.25 + cognitive_load * 1.2 + maturity_effect;
        if latency.is_finite() {
            latency.clamp(0.15, 2.2)
        } else {
            2.2
        }
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn chemicals(&self) -> &ChemicalState {
        &self.chemicals
    }

    pub fn identity(&self) -> &IdentityModel {
        &self.identity
    }

    pub fn development(&self) -> &DevelopmentTracker {
        &self.development
    }

    pub fn cognition(&self) -> &Cognition {
        &self.cognition
    }

    pub fn appraisal(&self) -> &AppraisalEngine {
        &self.appraisal
    }

    pub fn reflection(&self) -> &ReflectionModule {
        &self.reflection
    }

    pub fn narrative(&self) -> &NarrativeEngine {
        &self.narrative
    }

    pub fn autobiography(&self) -> &AutobiographicalMemory {
        &self.autobiography
    }

    pub fn environment(&self) -> Option<&Arc<dyn Environment>> {
        self.environment.as_ref()
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: chrono::Utc::now(),
            step: self.step,
            config: self.config.clone(),
            chemicals: self.chemicals.clone(),
            interactions: self.interactions.clone(),
            identity: self.identity.clone(),
            development: self.development.clone(),
            cognition: self.cognition.clone(),
            appraisal: self.appraisal.clone(),
            reflection: self.reflection.clone(),
            narrative: self.narrative.clone(),
            autobiography: self.autobiography.clone(),
            perception: self.perception.clone(),
            noise: self.noise.snapshot(),
        }
    }

    /// Rebuild an agent from a snapshot. No environment is attached.
    pub fn restore(snapshot: AgentSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        let mut agent = Self {
            planner: DecisionPlanner::new(snapshot.config.planner.clone()),
            config: snapshot.config,
            chemicals: snapshot.chemicals,
            interactions: snapshot.interactions,
            identity: snapshot.identity,
            development: snapshot.development,
            cognition: snapshot.cognition,
            appraisal: snapshot.appraisal,
            reflection: snapshot.reflection,
            narrative: snapshot.narrative,
            autobiography: snapshot.autobiography,
            perception: snapshot.perception,
            noise: NoiseSource::restore(snapshot.noise),
            environment: None,
            step: snapshot.step,
            logged_stage: DevelopmentStage::Baby,
        };
        agent.logged_stage = agent.stage();
        tracing::info!(step = agent.step, "agent restored");
        Ok(agent)
    }

    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        self.snapshot().save(path)
    }

    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        Self::restore(AgentSnapshot::load(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentia_reasoning::ActionOutcome;

    fn quiet_config() -> AgentConfig {
        let mut cfg = AgentConfig::default();
        cfg.agent.deterministic = true;
        cfg
    }

    fn agent() -> Agent {
        Agent::new(quiet_config()).unwrap()
    }

    #[test]
    fn test_new_agent_starts_at_baselines() {
        let a = agent();
        let s = a.get_state();
        assert_eq!(s.signal("dopamine"), 50.0);
        assert_eq!(s.signal("cortisol"), 30.0);
        assert_eq!(s.development_stage, DevelopmentStage::Baby);
        assert_eq!(a.step(), 0);
    }

    #[test]
    fn test_non_finite_config_rejected() {
        let mut cfg = quiet_config();
        cfg.interactions
            .entry("dopamine".into())
            .or_default()
            .insert("cortisol".into(), f64::NAN);
        assert!(Agent::new(cfg).is_err());
    }

    #[test]
    fn test_tick_without_environment_has_no_decision() {
        let mut a = agent();
        assert!(a.tick().is_none());
        assert_eq!(a.step(), 1);
        assert_eq!(a.autobiography().len(), 1);
    }

    #[test]
    fn test_tick_with_environment_decides() {
        let mut a = agent().with_configured_environment();
        let d = a.tick().unwrap();
        assert!(["explore", "socialize", "rest"].contains(&d.action.as_str()));
        assert!((d.probabilities.total() - 1.0).abs() < 1e-9);
        assert!(a.chemicals().all_in_range());
        assert!(a.appraisal().profile(&d.action).is_some(), "executed action is learned");
    }

    #[test]
    fn test_first_reflection_uses_only_prior_learning() {
        let mut a = agent().with_configured_environment();
        let d = a.tick().unwrap();
        // Nothing was learned before this decision, so every action is
        // valued at zero even though the chosen one has now been learned.
        assert_eq!(d.reflection.actual_value, 0.0);
        assert_eq!(d.reflection.regret, 0.0);
        assert_eq!(d.reflection.best_alternative.as_ref().map(|(_, v)| *v), Some(0.0));

        let learned = a.appraisal().predict_emotion(&d.action, None);
        assert_ne!(reward_proxy(&learned), 0.0);
    }

    #[test]
    fn test_executed_actions_feed_similarity_memory() {
        let mut a = agent().with_configured_environment();
        let mut chosen: BTreeMap<String, usize> = BTreeMap::new();
        for _ in 0..50 {
            let d = a.tick().unwrap();
            *chosen.entry(d.action).or_insert(0) += 1;
        }
        let similarity = a.appraisal().similarity();
        for (action, count) in &chosen {
            assert_eq!(similarity.profile_count(action), *count, "{} experiences", action);
        }
        assert_eq!(chosen.values().sum::<usize>(), 50);
    }

    #[test]
    fn test_event_profile_stores_live_identity() {
        let mut cfg = quiet_config();
        cfg.similarity.chemical_weight = 0.0;
        cfg.similarity.identity_weight = 1.0;
        let mut a = Agent::new(cfg).unwrap();

        // Praise leaves competence evidence pending until the next tick.
        a.inject_event(Event::with_effects("praise", [("dopamine", 8.0)]));
        assert!(a.identity().projected("competence") > a.identity().get("competence"));

        let state = a.get_state();
        let hits = a.appraisal().similarity().find_similar_scored("praise", &state);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].experience.identity(), Some(&a.identity().snapshot()));
        assert_eq!(hits[0].similarity, 1.0);
    }

    #[test]
    fn test_simulation_context_matches_state() {
        let mut a = agent().with_configured_environment();
        for _ in 0..5 {
            a.tick();
        }
        assert_eq!(a.simulation_context().view(), a.get_state());
    }

    #[test]
    fn test_plan_does_not_mutate() {
        let mut a = agent().with_configured_environment();
        a.tick();
        let before = a.get_state();
        let plan = a.plan().unwrap();
        assert!(plan.chosen.is_some());
        assert_eq!(a.get_state(), before);
    }

    #[test]
    fn test_praise_raises_dopamine_and_learns() {
        let mut a = agent();
        let before = a.get_state().signal("dopamine");
        let realized = a.inject_event(Event::with_effects("praise", [("dopamine", 8.0), ("oxytocin", 5.0)]));
        assert!(realized["dopamine"] > 0.0);
        assert!(a.get_state().signal("dopamine") > before);
        let profile = a.appraisal().profile("praise").unwrap();
        assert!(profile.magnitude("dopamine") > 0.0);
        assert!(a.identity().evidence("competence") > 0.0);
        assert_eq!(a.appraisal().similarity().profile_count("praise"), 1);
        assert_eq!(a.development().experience_points, 1);
    }

    #[test]
    fn test_resilience_dampens_negative_effects() {
        let mut tough = quiet_config();
        tough.identity.traits.insert("resilience".into(), 1.0);
        let mut fragile = quiet_config();
        fragile.identity.traits.insert("resilience".into(), 0.0);

        let hit = || Event::with_effects("shock", [("dopamine", -10.0), ("cortisol", 10.0)]);
        let mut a = Agent::new(tough).unwrap();
        let mut b = Agent::new(fragile).unwrap();
        let ra = a.inject_event(hit());
        let rb = b.inject_event(hit());
        assert!((ra["dopamine"] + 5.0).abs() < 1e-9);
        assert!((rb["dopamine"] + 10.0).abs() < 1e-9);
        assert!((ra["cortisol"] - 6.0).abs() < 1e-9);
        assert!((rb["cortisol"] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unlabeled_and_unknown_signals() {
        let mut a = agent();
        let mut effects = SignalMap::new();
        effects.insert("adrenaline".into(), 5.0);
        let realized = a.inject_event(Event {
            effects,
            ..Event::default()
        });
        assert!(realized.values().all(|v| *v == 0.0));
        assert!(a.appraisal().profile(UNLABELED_EVENT).is_some());
    }

    #[test]
    fn test_observe_perception() {
        let mut a = agent();
        assert!(a.observe_perception("", "hello", "mic").is_none());
        assert!(a.observe_perception("hearing", "   ", "mic").is_none());

        let i = a.observe_perception(" Hearing ", "Thank you, the cat is here", "mic").unwrap();
        assert_eq!(i.event_type, "social_reward");
        assert_eq!(a.recent_perceptions(5).len(), 1);
        assert_eq!(a.recent_perceptions(5)[0].modality, "hearing");
        assert_eq!(a.top_concepts(3)[0].concept, "cat");

        let last = a.autobiography().recent(1).next().unwrap();
        assert_eq!(last.description, "perception:hearing:social_reward");
        assert_eq!(last.metadata["source"], serde_json::Value::from("mic"));
    }

    #[test]
    fn test_response_latency_bounds() {
        let mut a = agent();
        let l = a.response_latency();
        assert!((0.15..=2.2).contains(&l));
        for _ in 0..20 {
            a.inject_event(Event::with_effects("threat", [("cortisol", 50.0)]));
        }
        assert!(a.response_latency() > l);
        assert!(a.response_latency() <= 2.2);
    }

    #[test]
    fn test_deterministic_runs_match() {
        let run = || {
            let mut a = agent().with_configured_environment();
            for i in 0..60 {
                if i % 10 == 0 {
                    a.inject_event(Event::with_effects("praise", [("dopamine", 8.0)]));
                }
                a.tick();
            }
            a.get_state()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_snapshot_restore_continues_identically() {
        let mut a = agent().with_configured_environment();
        for _ in 0..30 {
            a.tick();
        }
        let json = a.snapshot().to_json().unwrap();
        let mut b = Agent::restore(AgentSnapshot::from_json(&json).unwrap())
            .unwrap()
            .with_configured_environment();
        assert_eq!(a.get_state(), b.get_state());
        for _ in 0..30 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.get_state(), b.get_state());
    }

    #[test]
    fn test_restore_rejects_other_versions() {
        let mut snap = agent().snapshot();
        snap.version = 99;
        assert!(matches!(Agent::restore(snap), Err(SnapshotError::Version { found: 99, .. })));
    }

    #[test]
    fn test_custom_environment_feedback_is_scaled() {
        struct Boost;
        impl Environment for Boost {
            fn compute(&self, _state: &AgentState) -> ActionDistribution {
                ActionDistribution::from_pairs([("boost", 1.0)])
            }
            fn execute(&self, action: &str, _state: &AgentState) -> ActionOutcome {
                ActionOutcome {
                    action: action.into(),
                    feedback: [("dopamine".to_string(), 2.0)].into_iter().collect(),
                }
            }
        }

        let mut cfg = quiet_config();
        cfg.agent.feedback_multiplier = 3.0;
        cfg.chemicals.clear();
        cfg.chemicals.insert(
            "dopamine".into(),
            sentia_core::ChemicalConfig::complete(10.0, 0.0, 100.0, 0.0, 0.0),
        );
        cfg.interactions.clear();
        let mut a = Agent::new(cfg).unwrap().with_environment(Arc::new(Boost));
        let d = a.tick().unwrap();
        assert_eq!(d.action, "boost");
        assert!((d.realized["dopamine"] - 6.0).abs() < 1e-9);
        assert!((a.get_state().signal("dopamine") - 16.0).abs() < 1e-9);
    }
}
