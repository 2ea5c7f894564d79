//! Deterministic rules layer for the daily-run life simulation.
//!
//! Everything here is a pure transform over values: callers load state, pass it
//! in, and persist what comes back. The only mutable collaborator is the
//! optional [`trace::ResourceTrace`], which callers own and inject.

pub mod allocation;
pub mod arc;
pub mod cause;
pub mod config;
pub mod day;
pub mod diff;
pub mod end_of_day;
pub mod error;
pub mod experiment;
pub mod fixed;
pub mod hash;
pub mod io;
pub mod reduce;
pub mod requirement;
pub mod skills;
pub mod state;
pub mod storylet;
#[cfg(any(test, feature = "proptest-support"))]
pub mod strategies;
pub mod tension;
pub mod trace;
pub mod vectors;

pub use allocation::{apply_allocation_to_day_state, Allocation, Posture};
pub use day::{advance_day, DayPlan, DayTransition};
pub use diff::Diff;
pub use end_of_day::{resolve_end_of_day, EndOfDay};
pub use error::ContentError;
pub use experiment::{choose_variant, pct_in_rollout};
pub use reduce::apply_outcome;
pub use requirement::Requirement;
pub use skills::{can_level_skill, skill_cost_for_level};
pub use state::{DailyState, Outcome, ResourceKey, VectorKey};
