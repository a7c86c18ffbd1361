//! Error types for the workflow runtime and key-rotation manager.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by agents, composers, the coordinator, and tools.
#[derive(Error, Debug)]
pub enum Error {
    /// The generator returned no text, or an agent could not form a result.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// A boundary/pre-condition check failed.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// `canHandle` returned false, or the input shape was wrong for an agent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Downstream could not make sense of an agent's output.
    #[error("invalid output: {0}")]
    InvalidOutput(String),

    /// An operation exceeded its time budget.
    #[error("operation timed out after {0:.3}s")]
    Timeout(f64),

    /// The workflow was cancelled mid-flight.
    #[error("workflow was cancelled")]
    Cancelled,

    /// All retry attempts were exhausted.
    #[error("max retries exceeded, last error: {0}")]
    MaxRetriesExceeded(String),

    /// A composer's child raised an error under a strict error policy.
    #[error("child agent '{agent_id}' failed: {cause}")]
    ChildAgentFailed { agent_id: String, cause: String },

    /// A composer or agent was constructed with an invalid configuration.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// A tool call was missing a required parameter.
    #[error("tool '{tool}' missing parameter '{parameter}'")]
    MissingParameter { tool: String, parameter: String },

    /// A tool call supplied a parameter that failed validation.
    #[error("tool '{tool}' invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        tool: String,
        parameter: String,
        reason: String,
    },

    /// A tool's handler returned an error.
    #[error("tool '{tool}' execution failed: {reason}")]
    ToolExecutionFailed { tool: String, reason: String },

    /// A tool call exceeded its time budget.
    #[error("tool '{0}' timed out")]
    ToolTimeout(String),

    /// A required step failed and aborted the workflow.
    #[error("step '{step_id}' failed: {cause}")]
    StepFailed { step_id: String, cause: String },

    /// The workflow itself is structurally invalid.
    #[error("invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// A step referenced an agent id that was never registered.
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// No API key was available to satisfy a generation request.
    #[error("no API key available")]
    NoKeyAvailable,

    /// Transport-level failure talking to the external generator.
    #[error("generator request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration supplied to the crate (e.g. empty key list).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Catch-all for errors that don't fit another variant.
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Error::ProcessingFailed(msg.into())
    }

    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Error::ValidationFailed(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn invalid_output(msg: impl Into<String>) -> Self {
        Error::InvalidOutput(msg.into())
    }

    pub fn timeout(seconds: f64) -> Self {
        Error::Timeout(seconds)
    }

    pub fn child_agent_failed(agent_id: impl Into<String>, cause: impl Into<String>) -> Self {
        Error::ChildAgentFailed {
            agent_id: agent_id.into(),
            cause: cause.into(),
        }
    }

    pub fn configuration_error(msg: impl Into<String>) -> Self {
        Error::ConfigurationError(msg.into())
    }

    pub fn missing_parameter(tool: impl Into<String>, parameter: impl Into<String>) -> Self {
        Error::MissingParameter {
            tool: tool.into(),
            parameter: parameter.into(),
        }
    }

    pub fn invalid_parameter(
        tool: impl Into<String>,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidParameter {
            tool: tool.into(),
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub fn tool_execution_failed(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ToolExecutionFailed {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    pub fn step_failed(step_id: impl Into<String>, cause: impl Into<String>) -> Self {
        Error::StepFailed {
            step_id: step_id.into(),
            cause: cause.into(),
        }
    }

    pub fn invalid_workflow(msg: impl Into<String>) -> Self {
        Error::InvalidWorkflow(msg.into())
    }

    pub fn agent_not_found(id: impl Into<String>) -> Self {
        Error::AgentNotFound(id.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Errors the retry loop should keep retrying on, vs. give up immediately.
    ///
    /// Configuration and shape-mismatch errors are never transient; everything
    /// else (timeouts, processing failures, transport errors) might resolve on
    /// a later attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::ConfigurationError(_)
                | Error::InvalidWorkflow(_)
                | Error::AgentNotFound(_)
                | Error::InvalidInput(_)
                | Error::Config(_)
                | Error::MissingParameter { .. }
                | Error::InvalidParameter { .. }
        )
    }
}
