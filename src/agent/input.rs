//! [`AgentInput`] — one immutable processing request threaded through a
//! workflow, plus its metadata and priority.

use crate::agent::output::AgentOutput;
use crate::value::DynamicValue;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Scheduling priority carried on an input's metadata. Purely advisory at the
/// core-runtime level; callers may use it to prioritize external queuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Metadata carried alongside an [`AgentInput`] / [`AgentOutput`].
#[derive(Debug, Clone)]
pub struct InputMetadata {
    pub timestamp: DateTime<Utc>,
    pub tags: BTreeSet<String>,
    pub priority: Priority,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl Default for InputMetadata {
    fn default() -> Self {
        Self {
            timestamp: Utc::now(),
            tags: BTreeSet::new(),
            priority: Priority::default(),
            retry_count: 0,
            max_retries: 0,
        }
    }
}

/// One processing request flowing through a workflow.
///
/// Inputs are immutable once constructed; a successor step receives a new
/// input derived from the current one plus appended outputs — see [`AgentInput::with_appended_outputs`].
#[derive(Debug, Clone)]
pub struct AgentInput {
    pub id: String,
    pub content: String,
    pub context: BTreeMap<String, DynamicValue>,
    pub metadata: InputMetadata,
    pub previous_outputs: Vec<AgentOutput>,
}

impl AgentInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            context: BTreeMap::new(),
            metadata: InputMetadata::default(),
            previous_outputs: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: BTreeMap<String, DynamicValue>) -> Self {
        self.context = context;
        self
    }

    pub fn with_metadata(mut self, metadata: InputMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_previous_outputs(mut self, outputs: Vec<AgentOutput>) -> Self {
        self.previous_outputs = outputs;
        self
    }

    /// Derive a new input carrying the same `content` and `metadata`, with
    /// `outputs` appended to `previous_outputs`. This is the mechanism by
    /// which composers and the coordinator thread accumulated outputs
    /// forward as the next step's input.
    pub fn with_appended_outputs(&self, outputs: impl IntoIterator<Item = AgentOutput>) -> Self {
        let mut previous_outputs = self.previous_outputs.clone();
        previous_outputs.extend(outputs);
        Self {
            id: Uuid::new_v4().to_string(),
            content: self.content.clone(),
            context: self.context.clone(),
            metadata: self.metadata.clone(),
            previous_outputs,
        }
    }

    /// Derive a new input with merged context entries, preserving content,
    /// metadata and previous outputs. Used by the coordinator to thread
    /// `last_agent_id` / `last_confidence` / `output_<key>` forward between
    /// workflow steps.
    pub fn with_merged_context(&self, merged: BTreeMap<String, DynamicValue>) -> Self {
        let mut context = self.context.clone();
        context.extend(merged);
        Self {
            id: Uuid::new_v4().to_string(),
            content: self.content.clone(),
            context,
            metadata: self.metadata.clone(),
            previous_outputs: self.previous_outputs.clone(),
        }
    }
}
