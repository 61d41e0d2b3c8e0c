//! Runs an agent through a scenario, one event and one tick per step.

use crate::scenarios::Scenario;
use sentia_limbic::{Agent, Decision};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationReport {
    pub steps: u64,
    pub events: usize,
    pub decisions: usize,
    /// How often each action was chosen.
    pub action_counts: BTreeMap<String, usize>,
    pub mean_regret: f64,
}

pub struct Simulator {
    agent: Agent,
    tick_delay: Duration,
    verbose: bool,
}

impl Simulator {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent,
            tick_delay: Duration::ZERO,
            verbose: false,
        }
    }

    pub fn with_tick_delay(mut self, delay: Duration) -> Self {
        self.tick_delay = delay;
        self
    }

    /// Print the full state as JSON after every step.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn into_agent(self) -> Agent {
        self.agent
    }

    pub async fn run(&mut self, scenario: &Scenario, steps: u64) -> anyhow::Result<SimulationReport> {
        tracing::info!(scenario = scenario.name, steps, "simulation start");
        let mut report = SimulationReport::default();
        let mut regret_sum = 0.0;

        for step in 0..steps {
            if let Some(event) = scenario.event_at(step) {
                self.agent.inject_event(event.clone());
                report.events += 1;
            }

            let decision = self.agent.tick();
            self.print_step(step, decision.as_ref())?;

            if let Some(d) = decision {
                report.decisions += 1;
                regret_sum += d.reflection.regret;
                *report.action_counts.entry(d.action).or_insert(0) += 1;
            }

            if !self.tick_delay.is_zero() {
                tokio::time::sleep(self.tick_delay).await;
            }
        }

        report.steps = steps;
        if report.decisions > 0 {
            report.mean_regret = regret_sum / report.decisions as f64;
        }
        tracing::info!(
            events = report.events,
            decisions = report.decisions,
            mean_regret = report.mean_regret,
            "simulation end"
        );
        Ok(report)
    }

    fn print_step(&self, step: u64, decision: Option<&Decision>) -> anyhow::Result<()> {
        let state = self.agent.get_state();
        let signals = state
            .signals
            .iter()
            .map(|(k, v)| format!("{}={:.1}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        let action = decision.map_or("-", |d| d.action.as_str());
        println!(
            "step {:>4} | {:<9} | {} | stage={} fatigue={:.2}",
            step, action, signals, state.development_stage, state.fatigue
        );
        if self.verbose {
            println!("{}", serde_json::to_string(&state)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::{structured_learning, ScenarioKind};
    use sentia_core::AgentConfig;

    fn agent() -> Agent {
        let mut cfg = AgentConfig::default();
        cfg.agent.deterministic = true;
        Agent::new(cfg).unwrap().with_configured_environment()
    }

    #[tokio::test]
    async fn test_run_counts_events_and_decisions() {
        let mut sim = Simulator::new(agent());
        let report = sim.run(&structured_learning(30), 30).await.unwrap();
        assert_eq!(report.steps, 30);
        assert_eq!(report.events, 4);
        assert_eq!(report.decisions, 30);
        assert_eq!(report.action_counts.values().sum::<usize>(), 30);
        assert_eq!(sim.agent().step(), 30);
    }

    #[tokio::test]
    async fn test_scenario_shorter_than_run() {
        let mut sim = Simulator::new(agent());
        let scenario = Scenario::build(ScenarioKind::ExtremeReward, 0);
        let report = sim.run(&scenario, 25).await.unwrap();
        assert_eq!(report.events, 10);
        assert!(sim.into_agent().appraisal().profile("extreme_reward").is_some());
    }
}
