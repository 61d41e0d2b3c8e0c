pub mod distribution;
pub mod environment;
pub mod planner;
pub mod reflection;

pub use distribution::ActionDistribution;
pub use environment::{ActionOutcome, ConfiguredEnvironment, Environment, ProbabilityModel};
pub use planner::{ActionScore, DecisionPlanner, PlanOutcome, SimulationContext};
pub use reflection::{Reflection, ReflectionModule};
