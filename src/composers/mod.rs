//! Generic agent-composition primitives: [`SequentialAgent`], [`ParallelAgent`],
//! and [`LoopAgent`].

pub mod loop_agent;
pub mod parallel;
pub mod sequential;

pub use loop_agent::{ExitCondition, LoopAgent};
pub use parallel::{AggregationStrategy, ParallelAgent};
pub use sequential::SequentialAgent;
