//! Scripted event schedules for simulate mode.
//!
//! A scenario is one optional event per step. Steps past the end of the
//! schedule run without input.

use clap::ValueEnum;
use sentia_limbic::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioKind {
    /// Praise every 10 steps, criticism every 25.
    Structured,
    /// Ten consecutive dopamine surges.
    ExtremeReward,
    /// Ten consecutive cortisol surges.
    ExtremeThreat,
    /// Twenty events alternating reward and stress.
    Oscillation,
    /// No events; pure homeostasis.
    Idle,
}

#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub events: Vec<Option<Event>>,
}

impl Scenario {
    pub fn build(kind: ScenarioKind, steps: u64) -> Self {
        match kind {
            ScenarioKind::Structured => structured_learning(steps),
            ScenarioKind::ExtremeReward => extreme_reward(),
            ScenarioKind::ExtremeThreat => extreme_threat(),
            ScenarioKind::Oscillation => oscillation(),
            ScenarioKind::Idle => Self {
                name: "idle",
                events: Vec::new(),
            },
        }
    }

    pub fn event_at(&self, step: u64) -> Option<&Event> {
        usize::try_from(step)
            .ok()
            .and_then(|i| self.events.get(i))
            .and_then(Option::as_ref)
    }

    /// Number of steps that carry an event.
    pub fn event_count(&self) -> usize {
        self.events.iter().flatten().count()
    }
}

fn praise() -> Event {
    Event::with_effects("praise", [("dopamine", 8.0), ("oxytocin", 5.0), ("serotonin", 3.0)])
        .from_source("caregiver")
        .tagged(["social", "positive"])
}

fn criticism() -> Event {
    Event::with_effects("criticism", [("cortisol", 10.0), ("dopamine", -4.0), ("serotonin", -2.0)])
        .from_source("caregiver")
        .tagged(["social", "negative"])
}

/// Criticism wins when both schedules land on the same step, except at 0.
pub fn structured_learning(steps: u64) -> Scenario {
    let events = (0..steps)
        .map(|step| {
            if step != 0 && step % 25 == 0 {
                Some(criticism())
            } else if step % 10 == 0 {
                Some(praise())
            } else {
                None
            }
        })
        .collect();
    Scenario {
        name: "structured",
        events,
    }
}

pub fn extreme_reward() -> Scenario {
    let event = Event::with_effects("extreme_reward", [("dopamine", 10.0)])
        .from_source("system")
        .tagged(["overstim"]);
    Scenario {
        name: "extreme_reward",
        events: vec![Some(event); 10],
    }
}

pub fn extreme_threat() -> Scenario {
    let event = Event::with_effects("extreme_threat", [("cortisol", 10.0)])
        .from_source("system")
        .tagged(["threat"]);
    Scenario {
        name: "extreme_threat",
        events: vec![Some(event); 10],
    }
}

pub fn oscillation() -> Scenario {
    let events = (0..20)
        .map(|i| {
            let event = if i % 2 == 0 {
                Event::with_effects("reward", [("dopamine", 5.0)]).tagged(["reward"])
            } else {
                Event::with_effects("stress", [("cortisol", 5.0)]).tagged(["stress"])
            };
            Some(event.from_source("system"))
        })
        .collect();
    Scenario {
        name: "oscillation",
        events,
    }
}
