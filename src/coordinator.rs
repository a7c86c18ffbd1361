//! [`WorkflowCoordinator`] — runs a [`Workflow`] to completion, exposing
//! pause/resume/cancel control and a broadcast event stream.

use crate::agent::{Agent, AgentInput};
use crate::error::{Error, Result};
use crate::retry::retry_with_policy;
use crate::value::DynamicValue;
use crate::workflow::events::{channel, WorkflowEvent};
use crate::workflow::result::{ExecutionContext, ExecutionState, WorkflowResult};
use crate::workflow::{Condition, Workflow, WorkflowStep};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Control flag shared between `execute` and the pause/resume/cancel API.
/// `Paused` blocks the step loop between steps (never mid-step);
/// `Cancelled` is a terminal request checked the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlState {
    Running,
    Paused,
    Cancelled,
}

struct ControlFlag {
    paused: AtomicBool,
    cancelled: AtomicBool,
}

impl ControlFlag {
    fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
        }
    }

    fn state(&self) -> ControlState {
        if self.cancelled.load(Ordering::SeqCst) {
            ControlState::Cancelled
        } else if self.paused.load(Ordering::SeqCst) {
            ControlState::Paused
        } else {
            ControlState::Running
        }
    }
}

/// Schedules agent steps, propagates outputs as inputs to successors,
/// enforces boundary validation, and emits a stream of observable events.
pub struct WorkflowCoordinator {
    agents: RwLock<HashMap<String, Arc<dyn Agent>>>,
    boundary_agent: RwLock<Option<Arc<dyn Agent>>>,
    context_agent: RwLock<Option<Arc<dyn Agent>>>,
    review_agent: RwLock<Option<Arc<dyn Agent>>>,
    events: broadcast::Sender<WorkflowEvent>,
    controls: RwLock<HashMap<String, Arc<ControlFlag>>>,
}

impl WorkflowCoordinator {
    pub fn new() -> Self {
        let (tx, _rx) = channel();
        Self {
            agents: RwLock::new(HashMap::new()),
            boundary_agent: RwLock::new(None),
            context_agent: RwLock::new(None),
            review_agent: RwLock::new(None),
            events: tx,
            controls: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to the coordinator's lifecycle event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    /// Register an agent by id. Duplicate ids overwrite.
    pub fn register_agent(&self, agent: Arc<dyn Agent>) {
        self.agents.write().insert(agent.id().to_string(), agent);
    }

    pub fn set_boundary_agent(&self, agent: Arc<dyn Agent>) {
        *self.boundary_agent.write() = Some(agent);
    }

    pub fn set_context_agent(&self, agent: Arc<dyn Agent>) {
        *self.context_agent.write() = Some(agent);
    }

    pub fn set_review_agent(&self, agent: Arc<dyn Agent>) {
        *self.review_agent.write() = Some(agent);
    }

    fn emit(&self, event: WorkflowEvent) {
        let _ = self.events.send(event);
    }

    /// Fetch the control flag for `workflow_id`, creating it if this is the
    /// first call to touch that id. This lets `cancel`/`pause` be called
    /// before `execute` has registered its own flag (e.g. cancelling a
    /// workflow the instant it's submitted) without losing the request.
    fn control_flag_for(&self, workflow_id: &str) -> Arc<ControlFlag> {
        if let Some(flag) = self.controls.read().get(workflow_id) {
            return flag.clone();
        }
        self.controls.write().entry(workflow_id.to_string()).or_insert_with(|| Arc::new(ControlFlag::new())).clone()
    }

    /// Pause a workflow's step loop between steps. Safe to call before the
    /// workflow has started `execute`; the pause request is retained.
    pub fn pause(&self, workflow_id: &str) {
        self.control_flag_for(workflow_id).paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self, workflow_id: &str) {
        self.control_flag_for(workflow_id).paused.store(false, Ordering::SeqCst);
    }

    pub fn cancel(&self, workflow_id: &str) {
        self.control_flag_for(workflow_id).cancelled.store(true, Ordering::SeqCst);
    }

    fn evaluate_condition(condition: &Condition, last_output: Option<&crate::agent::AgentOutput>, any_output_produced: bool) -> bool {
        match condition {
            Condition::Always => true,
            Condition::ConfidenceAbove(t) => last_output.map(|o| o.confidence >= *t).unwrap_or(true),
            Condition::OutputContains(needle) => last_output.map(|o| o.content.contains(needle.as_str())).unwrap_or(true),
            Condition::PreviousSuccess => any_output_produced,
            Condition::Custom => true,
        }
    }

    fn merged_context_for_next_step(output: &crate::agent::AgentOutput) -> std::collections::BTreeMap<String, DynamicValue> {
        let mut merged = std::collections::BTreeMap::new();
        merged.insert("last_agent_id".to_string(), DynamicValue::from(output.agent_id.clone()));
        merged.insert("last_confidence".to_string(), DynamicValue::from(output.confidence));
        for (key, value) in &output.structured_data {
            merged.insert(format!("output_{key}"), value.clone());
        }
        merged
    }

    async fn execute_step_with_retry_and_timeout(&self, agent: &Arc<dyn Agent>, input: &AgentInput, step: &WorkflowStep, default_timeout: std::time::Duration, default_retry: &crate::retry::RetryPolicy) -> Result<crate::agent::AgentOutput> {
        let timeout_duration = step.timeout.unwrap_or(default_timeout);
        let policy = step.retry_policy.clone().unwrap_or_else(|| default_retry.clone());

        retry_with_policy(&policy, |_attempt| {
            let agent = agent.clone();
            let input = input.clone();
            async move {
                match tokio::time::timeout(timeout_duration, agent.process(&input)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::timeout(timeout_duration.as_secs_f64())),
                }
            }
        })
        .await
    }

    /// Run `workflow` to completion, step by step, in order: resolve each
    /// step's agent, honor pause/cancel signals, retry or fail per the
    /// step's policy, and fold outputs into a single [`WorkflowResult`].
    pub async fn execute(&self, workflow: &Workflow) -> Result<WorkflowResult> {
        let run_start = Instant::now();
        let control = self.control_flag_for(&workflow.id);

        let mut context = ExecutionContext::new(workflow.id.clone(), workflow.steps.len());
        self.emit(WorkflowEvent::WorkflowStarted { workflow_id: workflow.id.clone() });

        let mut working_input = workflow.initial_input.clone().unwrap_or_else(|| AgentInput::new(""));

        if workflow.options.enable_boundary_check {
            if let Some(boundary) = self.boundary_agent.read().clone() {
                match boundary.process(&working_input).await {
                    Ok(output) => info!(confidence = output.confidence, "boundary check advisory result"),
                    Err(err) => {
                        self.controls.write().remove(&workflow.id);
                        context.state = ExecutionState::Failed;
                        self.emit(WorkflowEvent::WorkflowFailed { workflow_id: workflow.id.clone(), error: err.to_string() });
                        return Err(err);
                    }
                }
            }
        }

        if let Some(context_agent) = self.context_agent.read().clone() {
            if let Ok(output) = context_agent.process(&working_input).await {
                info!(content = %output.content, "context agent advisory result");
            }
        }

        context.state = ExecutionState::Running;

        for (index, step) in workflow.steps.iter().enumerate() {
            // Block between steps while paused; never mid-step. The paused
            // step is still `step` once this loop exits, so it runs next
            // rather than being skipped.
            while control.state() == ControlState::Paused {
                tokio::task::yield_now().await;
            }
            if control.state() == ControlState::Cancelled {
                context.state = ExecutionState::Cancelled;
                self.emit(WorkflowEvent::WorkflowCancelled { workflow_id: workflow.id.clone() });
                self.controls.write().remove(&workflow.id);
                return Ok(WorkflowResult::from_context(context));
            }

            context.current_step_index = index;

            let last_output = context.outputs.last();
            let proceed = Self::evaluate_condition(&step.condition, last_output, !context.outputs.is_empty());
            if !proceed {
                context.metrics.skipped_steps += 1;
                continue;
            }

            self.emit(WorkflowEvent::StepStarted { workflow_id: workflow.id.clone(), step_id: step.id.clone(), step_index: index });

            let agent = match self.agents.read().get(&step.agent_id).cloned() {
                Some(agent) => agent,
                None => {
                    self.controls.write().remove(&workflow.id);
                    return Err(Error::agent_not_found(step.agent_id.clone()));
                }
            };

            let mut step_input = working_input.clone();
            if !step.input_overrides.is_empty() {
                step_input = step_input.with_merged_context(step.input_overrides.clone());
            }

            if !agent.can_handle(&step_input).await {
                let err = Error::invalid_input(format!("agent '{}' cannot handle step '{}' input", step.agent_id, step.id));
                if step.is_required {
                    context.metrics.failed_steps += 1;
                    context.state = ExecutionState::Failed;
                    self.emit(WorkflowEvent::StepFailed { workflow_id: workflow.id.clone(), step_id: step.id.clone(), error: err.to_string() });
                    self.controls.write().remove(&workflow.id);
                    return Err(Error::step_failed(step.id.clone(), err.to_string()));
                }
                warn!(step_id = %step.id, "non-required step could not handle input, skipping");
                context.metrics.skipped_steps += 1;
                continue;
            }

            let step_start = Instant::now();
            let result = self
                .execute_step_with_retry_and_timeout(&agent, &step_input, step, workflow.options.default_timeout, &workflow.options.default_retry_policy)
                .await;
            let step_elapsed = step_start.elapsed().as_secs_f64();
            context.metrics.per_step_times_secs.insert(step.id.clone(), step_elapsed);
            context.metrics.total_processing_time_secs += step_elapsed;

            match result {
                Ok(output) => {
                    working_input = working_input.with_appended_outputs(vec![output.clone()]).with_merged_context(Self::merged_context_for_next_step(&output));
                    context.metrics.completed_steps += 1;
                    self.emit(WorkflowEvent::StepCompleted { workflow_id: workflow.id.clone(), step_id: step.id.clone(), output: output.clone() });
                    context.outputs.push(output);
                }
                Err(err) => {
                    context.metrics.failed_steps += 1;
                    self.emit(WorkflowEvent::StepFailed { workflow_id: workflow.id.clone(), step_id: step.id.clone(), error: err.to_string() });
                    if step.is_required {
                        context.state = ExecutionState::Failed;
                        self.emit(WorkflowEvent::WorkflowFailed { workflow_id: workflow.id.clone(), error: err.to_string() });
                        self.controls.write().remove(&workflow.id);
                        return Err(Error::step_failed(step.id.clone(), err.to_string()));
                    }
                    warn!(step_id = %step.id, error = %err, "non-required step failed, continuing");
                }
            }
        }

        if workflow.options.enable_review && !context.outputs.is_empty() {
            if let Some(review_agent) = self.review_agent.read().clone() {
                let synthetic = AgentInput::new("review the completed workflow").with_previous_outputs(context.outputs.clone());
                if let Ok(output) = review_agent.process(&synthetic).await {
                    info!(confidence = output.confidence, "review agent result");
                }
            }
        }

        context.state = ExecutionState::Completed;
        context.metrics.total_processing_time_secs = context.metrics.total_processing_time_secs.max(run_start.elapsed().as_secs_f64());
        self.emit(WorkflowEvent::WorkflowCompleted { workflow_id: workflow.id.clone() });
        self.controls.write().remove(&workflow.id);
        Ok(WorkflowResult::from_context(context))
    }
}

impl Default for WorkflowCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
