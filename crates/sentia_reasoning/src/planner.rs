//! Counterfactual lookahead planning.
//!
//! The planner never sees the live agent. It receives a [`SimulationContext`]:
//! an owned value holding every field a hypothetical step can change. Each
//! branch clones the context, applies the candidate action's feedback to the
//! clone and recurses, so sibling branches always start from the same
//! baseline and nothing leaks back into the caller.
//!
//! ```text
//! simulate(ctx, a, 0) = 0
//! simulate(ctx, a, d) = sum(feedback(a))
//!                     + discount * sum_b P(b | ctx') * simulate(ctx', b, d - 1)
//! score(a) = simulate(ctx, a, max_depth)
//!          + competence * w_c + resilience * w_r
//!          - risk_aversion * (1 - P_base(a))
//! ```
//!
//! At the last level no next distribution is needed, so the leaf executes on
//! the parent view without cloning. With the default depth of 2 a full pass
//! therefore clones at most once per candidate action.

use crate::distribution::ActionDistribution;
use crate::environment::Environment;
use sentia_core::{
    AgentState, ChemicalState, DevelopmentStage, DevelopmentTracker, IdentityModel, PlannerConfig,
    SignalMap,
};
use serde::{Deserialize, Serialize};

// ============================================================================
// Simulation context
// ============================================================================

/// Every mutable field of the agent that a planning step may read or change.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationContext {
    pub chemicals: ChemicalState,
    pub identity: IdentityModel,
    pub development: DevelopmentTracker,
    pub fatigue: f64,
    pub wisdom: f64,
    pub cognitive_wisdom: f64,
    pub intelligence: f64,
    pub experience: f64,
    pub risk_tolerance: f64,
    pub self_narrative: String,
    pub feedback_multiplier: f64,
}

impl SimulationContext {
    /// Read-only view with a freshly derived development stage.
    pub fn view(&self) -> AgentState {
        AgentState {
            signals: self.chemicals.values(),
            traits: self.identity.snapshot(),
            development: self.development.snapshot(),
            development_stage: DevelopmentStage::from_accumulators(self.development.maturity, self.experience),
            fatigue: self.fatigue,
            wisdom: self.wisdom,
            cognitive_wisdom: self.cognitive_wisdom,
            intelligence: self.intelligence,
            experience: self.experience,
            risk_tolerance: self.risk_tolerance,
            self_narrative: self.self_narrative.clone(),
        }
    }

    /// Absorb action feedback the same way the live cycle does.
    pub fn apply_feedback(&mut self, feedback: &SignalMap) {
        self.chemicals.inject_scaled(feedback, self.feedback_multiplier);
        self.chemicals.clamp();
    }
}

// ============================================================================
// Plan outcome
// ============================================================================

/// Score breakdown for one candidate action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionScore {
    pub action: String,
    pub base_probability: f64,
    pub simulated: f64,
    pub personality: f64,
    pub risk_penalty: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    /// `None` only when there was nothing to choose from.
    pub chosen: Option<String>,
    pub scores: Vec<ActionScore>,
    /// Context clones performed.
    pub simulations: usize,
    /// Environment `execute` calls performed.
    pub evaluations: usize,
}

impl PlanOutcome {
    pub fn score(&self, action: &str) -> Option<&ActionScore> {
        self.scores.iter().find(|s| s.action == action)
    }
}

#[derive(Default)]
struct Cost {
    simulations: usize,
    evaluations: usize,
}

// ============================================================================
// Planner
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecisionPlanner {
    config: PlannerConfig,
}

impl DecisionPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Pick one action from `probabilities`.
    ///
    /// The highest total wins; on an exact tie the action that comes first
    /// in `probabilities` wins. A non-finite total ranks below every finite
    /// one.
    pub fn choose_action(
        &self,
        ctx: &SimulationContext,
        probabilities: &ActionDistribution,
        env: &dyn Environment,
    ) -> PlanOutcome {
        let mut cost = Cost::default();
        let competence = ctx.identity.get("competence");
        let resilience = ctx.identity.get("resilience");
        let personality = competence * self.config.competence_weight + resilience * self.config.resilience_weight;

        let mut scores = Vec::with_capacity(probabilities.len());
        let mut best: Option<(usize, f64)> = None;

        for (i, (action, base_probability)) in probabilities.iter().enumerate() {
            let simulated = self.simulate(ctx, action, self.config.max_depth, env, &mut cost);
            let risk_penalty = self.config.risk_aversion * (1.0 - base_probability);
            let mut total = simulated + personality - risk_penalty;
            if !total.is_finite() {
                total = f64::NEG_INFINITY;
            }
            tracing::trace!(action, simulated, total, "lookahead score");

            if best.map_or(true, |(_, b)| total > b) {
                best = Some((i, total));
            }
            scores.push(ActionScore {
                action: action.to_string(),
                base_probability,
                simulated,
                personality,
                risk_penalty,
                total,
            });
        }

        let chosen = best.map(|(i, _)| scores[i].action.clone());
        PlanOutcome {
            chosen,
            scores,
            simulations: cost.simulations,
            evaluations: cost.evaluations,
        }
    }

    fn simulate(
        &self,
        ctx: &SimulationContext,
        action: &str,
        depth: usize,
        env: &dyn Environment,
        cost: &mut Cost,
    ) -> f64 {
        if depth == 0 {
            return 0.0;
        }

        if depth == 1 {
            cost.evaluations += 1;
            return env.execute(action, &ctx.view()).feedback.values().sum();
        }

        let mut branch = ctx.clone();
        cost.simulations += 1;

        let outcome = env.execute(action, &branch.view());
        cost.evaluations += 1;
        let reward: f64 = outcome.feedback.values().sum();
        branch.apply_feedback(&outcome.feedback);

        let mut next = env.compute(&branch.view());
        if let Some(k) = self.config.max_branching {
            next = next.top_k(k);
        }

        let future: f64 = next
            .iter()
            .map(|(next_action, p)| p * self.simulate(&branch, next_action, depth - 1, env, cost))
            .sum();

        reward + self.config.discount * future
    }

    /// Upper bound on context clones for one `choose_action` call over
    /// `actions` candidates.
    pub fn worst_case_simulations(&self, actions: usize) -> usize {
        // Clones happen at every level except the last.
        self.tree_size(actions, self.config.max_depth.saturating_sub(1))
    }

    /// Upper bound on environment `execute` calls for one `choose_action`.
    pub fn worst_case_evaluations(&self, actions: usize) -> usize {
        self.tree_size(actions, self.config.max_depth)
    }

    /// `actions * (1 + b + b^2 + ... + b^(levels-1))`, saturating.
    fn tree_size(&self, actions: usize, levels: usize) -> usize {
        let branching = self.config.max_branching.map_or(actions, |k| k.min(actions));
        let mut per_root = 0usize;
        let mut level_width = 1usize;
        for _ in 0..levels {
            per_root = per_root.saturating_add(level_width);
            level_width = level_width.saturating_mul(branching);
        }
        actions.saturating_mul(per_root)
    }
}
