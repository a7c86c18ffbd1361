//! [`AgentOutput`] — one immutable processing result produced by an agent.

use crate::agent::input::InputMetadata;
use crate::value::DynamicValue;
use std::collections::BTreeMap;
use uuid::Uuid;

/// The result of one agent's `process` call.
///
/// Outputs are immutable: composers *synthesize* new outputs from child
/// outputs rather than mutating an existing one.
#[derive(Debug, Clone)]
pub struct AgentOutput {
    pub id: String,
    pub agent_id: String,
    pub content: String,
    pub structured_data: BTreeMap<String, DynamicValue>,
    pub confidence: f64,
    pub processing_time_secs: f64,
    pub metadata: InputMetadata,
}

impl AgentOutput {
    /// Construct an output with a freshly generated id and no structured data.
    pub fn new(agent_id: impl Into<String>, content: impl Into<String>, confidence: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            content: content.into(),
            structured_data: BTreeMap::new(),
            confidence: confidence.clamp(0.0, 1.0),
            processing_time_secs: 0.0,
            metadata: InputMetadata::default(),
        }
    }

    pub fn with_structured_data(mut self, data: BTreeMap<String, DynamicValue>) -> Self {
        self.structured_data = data;
        self
    }

    pub fn with_processing_time(mut self, secs: f64) -> Self {
        self.processing_time_secs = secs;
        self
    }

    pub fn with_metadata(mut self, metadata: InputMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn insert_structured(&mut self, key: impl Into<String>, value: impl Into<DynamicValue>) {
        self.structured_data.insert(key.into(), value.into());
    }
}

/// Mean confidence over a slice of outputs; 0 for an empty slice.
pub fn mean_confidence(outputs: &[AgentOutput]) -> f64 {
    if outputs.is_empty() {
        return 0.0;
    }
    outputs.iter().map(|o| o.confidence).sum::<f64>() / outputs.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_clamped_into_unit_interval() {
        assert_eq!(AgentOutput::new("a", "x", 1.5).confidence, 1.0);
        assert_eq!(AgentOutput::new("a", "x", -1.0).confidence, 0.0);
    }

    #[test]
    fn mean_confidence_of_empty_is_zero() {
        assert_eq!(mean_confidence(&[]), 0.0);
    }

    #[test]
    fn mean_confidence_averages() {
        let outputs = vec![
            AgentOutput::new("a", "x", 0.6),
            AgentOutput::new("b", "y", 0.9),
        ];
        assert!((mean_confidence(&outputs) - 0.75).abs() < 1e-9);
    }
}
