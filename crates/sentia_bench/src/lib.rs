//! sentia_bench: trajectory tests for long-run agent dynamics.
//!
//! Validates qualitative behavior over many cycles:
//! - silent recovery toward homeostasis after a disturbance
//! - threat imprinting (cortisol spike, learned anticipation, slow recovery)
//! - praise and criticism pulling identity apart
//! - faster decay rates recovering faster
//! - maturity growing under a structured upbringing

use sentia_limbic::{Agent, Event};

/// Run `cycles` ticks, injecting `event` first on every cycle where
/// `every` divides the cycle index.
pub fn simulate(agent: &mut Agent, cycles: u64, event: Option<&Event>, every: u64) {
    for cycle in 0..cycles {
        if let Some(event) = event {
            if every > 0 && cycle % every == 0 {
                agent.inject_event(event.clone());
            }
        }
        agent.tick();
    }
}

/// Sum of distances from each chemical to its baseline.
pub fn distance_from_baseline(agent: &Agent) -> f64 {
    let state = agent.get_state();
    agent
        .config()
        .chemicals
        .iter()
        .map(|(name, chem)| (state.signal(name) - chem.baseline.unwrap_or(0.0)).abs())
        .sum()
}
