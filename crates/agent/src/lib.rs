//! The Verdant orchestration engine.
//!
//! One inbound message flows through: **Plan → Reason/Act → Reflect →
//! Write-back**:
//!
//! 1. The planner classifies intent (keyword rules first, one model call
//!    when ambiguous) and suggests tools.
//! 2. The reason/act loop iterates think → act → observe, bounded by a
//!    step count and a wall-clock budget, dispatching tools through the
//!    registry and collecting observations on a scratchpad.
//! 3. The reflection pass reviews the draft against the query and the
//!    observations — exactly once, text-only edits.
//! 4. Memory write-back happens only after the loop terminates, so a
//!    failed turn never persists half-finished state.
//!
//! Turns for the same user serialize on a per-session lock; different
//! users proceed concurrently.

pub mod action;
pub mod advisor;
pub mod planner;
pub mod prompt;
pub mod react;
pub mod reflection;
pub mod scratchpad;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use action::{ActionDecision, ActionParseError, parse_decision};
pub use advisor::{AdvisorConfig, GardenAdvisor};
pub use planner::Planner;
pub use react::{LoopConfig, LoopRun, ReactLoop, Termination, TurnContext};
pub use reflection::Reflector;
pub use scratchpad::{Scratchpad, ScratchpadEntry, StepAction};
pub use session::SessionRegistry;
