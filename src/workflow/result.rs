//! Live and terminal workflow execution records: [`ExecutionContext`],
//! [`ExecutionState`], [`Metrics`], and [`WorkflowResult`].

use crate::agent::{mean_confidence, AgentOutput};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Lifecycle state of a running or finished workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

/// Aggregate counters tracked across a workflow run.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    pub total_steps: usize,
    pub completed_steps: usize,
    pub failed_steps: usize,
    pub skipped_steps: usize,
    pub total_processing_time_secs: f64,
    pub per_step_times_secs: BTreeMap<String, f64>,
    pub retry_count: u32,
}

/// Live record of a running workflow. Owned by the
/// coordinator for the duration of one `execute` call.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub workflow_id: String,
    pub started_at: DateTime<Utc>,
    pub state: ExecutionState,
    pub current_step_index: usize,
    pub outputs: Vec<AgentOutput>,
    pub metrics: Metrics,
}

impl ExecutionContext {
    pub fn new(workflow_id: impl Into<String>, total_steps: usize) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            started_at: Utc::now(),
            state: ExecutionState::Pending,
            current_step_index: 0,
            outputs: Vec::new(),
            metrics: Metrics {
                total_steps,
                ..Metrics::default()
            },
        }
    }
}

/// Terminal summary returned by `execute(workflow)`.
#[derive(Debug, Clone)]
pub struct WorkflowResult {
    pub workflow_id: String,
    pub state: ExecutionState,
    pub outputs: Vec<AgentOutput>,
    pub final_output: String,
    pub confidence: f64,
    pub total_processing_time_secs: f64,
    pub metrics: Metrics,
}

impl WorkflowResult {
    pub fn from_context(context: ExecutionContext) -> Self {
        let final_output = context
            .outputs
            .iter()
            .rev()
            .find(|o| !o.content.trim().is_empty())
            .map(|o| o.content.clone())
            .unwrap_or_default();
        let confidence = mean_confidence(&context.outputs);
        Self {
            workflow_id: context.workflow_id,
            state: context.state,
            outputs: context.outputs,
            final_output,
            confidence,
            total_processing_time_secs: context.metrics.total_processing_time_secs,
            metrics: context.metrics,
        }
    }
}
