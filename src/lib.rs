//! Multi-agent workflow runtime and API-key rotation manager for hosted
//! generative AI backends.
//!
//! - [`key_manager`] distributes load across a pool of API keys, tracking
//!   per-key quotas and disabling keys that fail repeatedly.
//! - [`agent`] defines the `Agent` trait and its input/output vocabulary.
//! - [`composers`] combine agents sequentially, in parallel, or in a loop.
//! - [`llm_agent`] wraps a single external generation call as an `Agent`.
//! - [`tools`] lets an agent call out to a typed, schema-validated function,
//!   including a structured-output tool that coerces a generator's reply
//!   into JSON matching a caller-supplied schema.
//! - [`workflow`] and [`coordinator`] describe and run a graph of steps
//!   across registered agents, with retries, timeouts, and an event stream.
//! - [`specialized_agents`] are the Boundary/Context/Review/Self-Argue
//!   agents the coordinator knows how to attach to a run.
//!
//! See `README.md` for a runnable end-to-end example.

pub mod agent;
pub mod composers;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod generator;
pub mod key_manager;
pub mod llm_agent;
pub mod retry;
pub mod specialized_agents;
#[cfg(test)]
mod test_support;
pub mod tools;
pub mod value;
pub mod workflow;

// --- Agent Vocabulary ---

pub use agent::{Agent, AgentInput, AgentOutput, Capability};

// --- Composition ---

pub use composers::{AggregationStrategy, ExitCondition, LoopAgent, ParallelAgent, SequentialAgent};

// --- Provider Configuration ---

pub use config::{Provider, api_keys_from_env, get_base_url, get_model};

// --- Workflow Coordination ---

pub use coordinator::WorkflowCoordinator;

// --- Error Handling ---

pub use error::{Error, Result};

// --- External Generation ---

pub use generator::{GenerationConfig, Generator, GeneratedResponse, HttpGenerator};

// --- Key Rotation ---

pub use key_manager::{KeyManager, KeyUsage, QuotaInfo, SelectionPolicy};

// --- LLM-Backed Agents ---

pub use llm_agent::LlmAgent;

// --- Retry ---

pub use retry::{BackoffStrategy, RetryPolicy};

// --- Specialized Agents ---

pub use specialized_agents::{boundary_agent, context_agent, review_agent, self_argue};

// --- Tool System ---

pub use tools::{SchemaBuilder, StructuredOutputTool, Tool, ToolBuilder, tool};

// --- Dynamic Values ---

pub use value::DynamicValue;

// --- Workflow Definition ---

pub use workflow::{
    Condition, ExecutionContext, ExecutionState, Metrics, Workflow, WorkflowEvent, WorkflowOptions,
    WorkflowResult, WorkflowStep,
};

// ============================================================================
// CONVENIENCE PRELUDE
// ============================================================================

/// Convenience module containing the most commonly used types and functions.
/// Import with `use genflow_core::prelude::*;` to get everything needed for
/// typical usage: building a key pool, wiring an `HttpGenerator`, assembling
/// agents and a workflow, and running it through a `WorkflowCoordinator`.
pub mod prelude {
    pub use crate::{
        Agent, AgentInput, AgentOutput, Capability, Condition, Error, Generator, HttpGenerator,
        KeyManager, LlmAgent, QuotaInfo, Result, RetryPolicy, SelectionPolicy, Tool,
        WorkflowCoordinator, Workflow, WorkflowOptions, WorkflowResult, WorkflowStep, tool,
    };
}
