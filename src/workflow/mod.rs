//! Workflow definition types: [`Workflow`], [`WorkflowStep`], [`Condition`],
//! and [`WorkflowOptions`].

pub mod events;
pub mod result;

pub use events::WorkflowEvent;
pub use result::{ExecutionContext, ExecutionState, Metrics, WorkflowResult};

use crate::agent::AgentInput;
use crate::retry::RetryPolicy;
use crate::value::DynamicValue;
use std::collections::BTreeMap;
use std::time::Duration;

/// A step's gate, evaluated against the outputs accumulated so far
///.
#[derive(Debug, Clone)]
pub enum Condition {
    Always,
    ConfidenceAbove(f64),
    OutputContains(String),
    PreviousSuccess,
    /// Opaque/unevaluable; treated as true.
    Custom,
}

/// One binding of a registered agent to a position in a [`Workflow`].
#[derive(Debug, Clone)]
pub struct WorkflowStep {
    pub id: String,
    pub name: Option<String>,
    pub agent_id: String,
    pub input_overrides: BTreeMap<String, DynamicValue>,
    pub depends_on: Vec<String>,
    pub condition: Condition,
    pub is_required: bool,
    pub timeout: Option<Duration>,
    pub retry_policy: Option<RetryPolicy>,
}

impl WorkflowStep {
    pub fn new(id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            agent_id: agent_id.into(),
            input_overrides: BTreeMap::new(),
            depends_on: Vec::new(),
            condition: Condition::Always,
            is_required: true,
            timeout: None,
            retry_policy: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_required(mut self, is_required: bool) -> Self {
        self.is_required = is_required;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = Some(retry_policy);
        self
    }

    pub fn with_input_overrides(mut self, overrides: BTreeMap<String, DynamicValue>) -> Self {
        self.input_overrides = overrides;
        self
    }

    pub fn with_depends_on(mut self, depends_on: Vec<String>) -> Self {
        self.depends_on = depends_on;
        self
    }
}

/// Global options for a [`Workflow`] run.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub self_argumentation_cycles: u32,
    pub enable_boundary_check: bool,
    pub enable_review: bool,
    pub max_parallel_fan_out: usize,
    pub default_timeout: Duration,
    pub default_retry_policy: RetryPolicy,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            self_argumentation_cycles: 5,
            enable_boundary_check: false,
            enable_review: false,
            max_parallel_fan_out: 4,
            default_timeout: Duration::from_secs(30),
            default_retry_policy: RetryPolicy::default(),
        }
    }
}

/// An id, name, description, ordered list of steps, initial input, and
/// global options.
#[derive(Clone)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<WorkflowStep>,
    pub initial_input: Option<AgentInput>,
    pub options: WorkflowOptions,
}

impl Workflow {
    pub fn new(id: impl Into<String>, name: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            steps,
            initial_input: None,
            options: WorkflowOptions::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_initial_input(mut self, input: AgentInput) -> Self {
        self.initial_input = Some(input);
        self
    }

    pub fn with_options(mut self, options: WorkflowOptions) -> Self {
        self.options = options;
        self
    }
}
