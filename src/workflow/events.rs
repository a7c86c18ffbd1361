//! Workflow lifecycle events, delivered over a `tokio::sync::broadcast`
//! channel so every subscriber (logging, UI, metrics) gets its own receiver
//! without the coordinator tracking a `Vec<Box<dyn Fn(..)>>`.

use crate::agent::AgentOutput;
use tokio::sync::broadcast;

/// One lifecycle event emitted by the [`crate::coordinator::WorkflowCoordinator`]
/// while executing a workflow.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    WorkflowStarted { workflow_id: String },
    StepStarted { workflow_id: String, step_id: String, step_index: usize },
    StepCompleted { workflow_id: String, step_id: String, output: AgentOutput },
    StepFailed { workflow_id: String, step_id: String, error: String },
    WorkflowCompleted { workflow_id: String },
    WorkflowFailed { workflow_id: String, error: String },
    WorkflowCancelled { workflow_id: String },
}

/// Capacity of the broadcast channel backing a coordinator's event stream.
/// Lagging subscribers miss the oldest events rather than blocking senders.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

pub fn channel() -> (broadcast::Sender<WorkflowEvent>, broadcast::Receiver<WorkflowEvent>) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}
