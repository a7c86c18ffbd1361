//! [`SequentialAgent`] — runs children one after another, threading each
//! child's output into the next child's `previousOutputs`.

use crate::agent::{mean_confidence, Agent, AgentInput, AgentOutput, Capability};
use crate::error::{Error, Result};
use crate::value::DynamicValue;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Sequential composition of child agents.
pub struct SequentialAgent {
    id: String,
    name: String,
    children: Vec<Arc<dyn Agent>>,
    pass_outputs: bool,
    stop_on_error: bool,
}

impl SequentialAgent {
    pub fn new(id: impl Into<String>, children: Vec<Arc<dyn Agent>>) -> Self {
        Self {
            id: id.into(),
            name: "sequential".to_string(),
            children,
            pass_outputs: true,
            stop_on_error: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_pass_outputs(mut self, pass_outputs: bool) -> Self {
        self.pass_outputs = pass_outputs;
        self
    }

    pub fn with_stop_on_error(mut self, stop_on_error: bool) -> Self {
        self.stop_on_error = stop_on_error;
        self
    }
}

#[async_trait]
impl Agent for SequentialAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "runs child agents one after another, threading outputs forward"
    }

    fn capabilities(&self) -> &[Capability] {
        &[]
    }

    async fn can_handle(&self, _input: &AgentInput) -> bool {
        !self.children.is_empty()
    }

    async fn process(&self, input: &AgentInput) -> Result<AgentOutput> {
        if self.children.is_empty() {
            return Err(Error::configuration_error("SequentialAgent has no children"));
        }

        let start = Instant::now();
        let mut collected: Vec<AgentOutput> = Vec::new();
        let mut current_input = input.clone();

        for child in &self.children {
            if !child.can_handle(&current_input).await {
                warn!(agent_id = child.id(), "sequential: child cannot handle input, skipping");
                continue;
            }

            match child.process(&current_input).await {
                Ok(output) => {
                    if self.pass_outputs {
                        current_input = current_input.with_appended_outputs(vec![output.clone()]);
                    }
                    collected.push(output);
                }
                Err(err) => {
                    if self.stop_on_error {
                        return Err(Error::child_agent_failed(child.id(), err.to_string()));
                    }
                    warn!(agent_id = child.id(), error = %err, "sequential: child failed, continuing");
                }
            }
        }

        let content = collected
            .iter()
            .map(|o| o.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let confidence = mean_confidence(&collected);
        let total_time: f64 = collected.iter().map(|o| o.processing_time_secs).sum();

        let mut output = AgentOutput::new(&self.id, content, confidence)
            .with_processing_time(total_time.max(start.elapsed().as_secs_f64()));
        output.insert_structured("agent_count", DynamicValue::Integer(collected.len() as i64));
        output.insert_structured(
            "child_agent_ids",
            DynamicValue::Array(collected.iter().map(|o| DynamicValue::from(o.agent_id.clone())).collect()),
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingAgent, RefusingAgent};
    use std::sync::atomic::AtomicUsize;

    fn echo(agent_id: &str, reply: &str, confidence: f64) -> Arc<dyn Agent> {
        Arc::new(crate::test_support::EchoAgent {
            agent_id: agent_id.to_string(),
            reply: reply.to_string(),
            confidence,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }

    #[tokio::test]
    async fn two_children_join_content_and_average_confidence() {
        let seq = SequentialAgent::new("seq-1", vec![echo("a", "ALPHA", 0.7), echo("b", "BETA", 0.85)]);
        let output = seq.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(output.content, "ALPHA\n\nBETA");
        assert!((output.confidence - 0.775).abs() < 1e-9);
        assert_eq!(output.structured_data.get("agent_count").unwrap().as_f64(), Some(2.0));
    }

    #[tokio::test]
    async fn stop_on_error_fails_fast_naming_the_child() {
        let seq = SequentialAgent::new(
            "seq-2",
            vec![echo("a", "ALPHA", 0.7), Arc::new(FailingAgent { agent_id: "b".into() })],
        );
        let result = seq.process(&AgentInput::new("go")).await;
        assert!(matches!(result, Err(Error::ChildAgentFailed { agent_id, .. }) if agent_id == "b"));
    }

    #[tokio::test]
    async fn stop_on_error_false_drops_the_failing_child() {
        let seq = SequentialAgent::new(
            "seq-3",
            vec![echo("a", "ALPHA", 0.7), Arc::new(FailingAgent { agent_id: "b".into() }), echo("c", "GAMMA", 0.9)],
        )
        .with_stop_on_error(false);
        let output = seq.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(output.content, "ALPHA\n\nGAMMA");
    }

    #[tokio::test]
    async fn refusing_child_is_skipped_without_failing_the_run() {
        let seq = SequentialAgent::new("seq-4", vec![Arc::new(RefusingAgent { agent_id: "r".into() }), echo("b", "BETA", 0.8)]);
        let output = seq.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(output.content, "BETA");
    }

    #[tokio::test]
    async fn empty_children_list_reports_cannot_handle_and_errors_on_process() {
        let seq = SequentialAgent::new("seq-5", vec![]);
        assert!(!seq.can_handle(&AgentInput::new("go")).await);
        let result = seq.process(&AgentInput::new("go")).await;
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn pass_outputs_threads_previous_outputs_into_the_next_child() {
        struct Recorder {
            seen_previous_len: Arc<std::sync::Mutex<Vec<usize>>>,
        }
        #[async_trait]
        impl Agent for Recorder {
            fn id(&self) -> &str {
                "recorder"
            }
            fn name(&self) -> &str {
                "recorder"
            }
            fn description(&self) -> &str {
                "records previous_outputs length"
            }
            fn capabilities(&self) -> &[Capability] {
                &[]
            }
            async fn can_handle(&self, _input: &AgentInput) -> bool {
                true
            }
            async fn process(&self, input: &AgentInput) -> Result<AgentOutput> {
                self.seen_previous_len.lock().unwrap().push(input.previous_outputs.len());
                Ok(AgentOutput::new("recorder", "ok", 1.0))
            }
        }

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seq = SequentialAgent::new(
            "seq-6",
            vec![echo("a", "ALPHA", 0.7), Arc::new(Recorder { seen_previous_len: seen.clone() })],
        );
        seq.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }
}
