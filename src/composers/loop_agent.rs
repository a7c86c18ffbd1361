//! [`LoopAgent`] — runs all children in sequence for up to N iterations,
//! stopping early on a configurable exit condition.

use crate::agent::{mean_confidence, Agent, AgentInput, AgentOutput, Capability};
use crate::error::{Error, Result};
use crate::value::DynamicValue;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// When a [`LoopAgent`] stops iterating, once `min_iterations` have run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitCondition {
    /// Stop once the iteration count reaches `k`.
    Iterations(u32),
    /// Stop once the last iteration's aggregated confidence reaches `t`.
    ConfidenceThreshold(f64),
    /// Stop once the absolute difference between the last two iterations'
    /// confidences drops below `epsilon`.
    Convergence(f64),
    /// Reserved: unevaluable without an external expression engine.
    /// Implementations treat this as never satisfied, relying on
    /// `max_iterations` alone.
    Custom,
}

/// Loop composition of child agents.
pub struct LoopAgent {
    id: String,
    name: String,
    children: Vec<Arc<dyn Agent>>,
    min_iterations: u32,
    max_iterations: u32,
    exit_condition: ExitCondition,
}

impl LoopAgent {
    pub fn new(id: impl Into<String>, children: Vec<Arc<dyn Agent>>) -> Self {
        Self {
            id: id.into(),
            name: "loop".to_string(),
            children,
            min_iterations: 1,
            max_iterations: 10,
            exit_condition: ExitCondition::Iterations(1),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_min_iterations(mut self, min_iterations: u32) -> Self {
        self.min_iterations = min_iterations;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_exit_condition(mut self, exit_condition: ExitCondition) -> Self {
        self.exit_condition = exit_condition;
        self
    }

    /// "Self-argumentation": a Loop wrapping one child, exiting at confidence
    /// ≥ 0.95 within `cycles` (default 5) to `cycles + 2` iterations
    ///.
    pub fn self_argumentation(id: impl Into<String>, child: Arc<dyn Agent>, cycles: u32) -> Self {
        let cycles = if cycles == 0 { 5 } else { cycles };
        Self::new(id, vec![child])
            .with_name("self-argumentation")
            .with_min_iterations(cycles)
            .with_max_iterations(cycles + 2)
            .with_exit_condition(ExitCondition::ConfidenceThreshold(0.95))
    }

    fn should_stop(&self, iteration: u32, confidences: &[f64]) -> bool {
        if iteration < self.min_iterations {
            return false;
        }
        match self.exit_condition {
            ExitCondition::Iterations(k) => iteration >= k,
            ExitCondition::ConfidenceThreshold(t) => confidences.last().is_some_and(|c| *c >= t),
            ExitCondition::Convergence(epsilon) => {
                if confidences.len() < 2 {
                    false
                } else {
                    let last = confidences[confidences.len() - 1];
                    let prev = confidences[confidences.len() - 2];
                    (last - prev).abs() < epsilon
                }
            }
            ExitCondition::Custom => false,
        }
    }
}

#[async_trait]
impl Agent for LoopAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "runs child agents for up to N iterations until an exit condition is met"
    }

    fn capabilities(&self) -> &[Capability] {
        &[]
    }

    async fn can_handle(&self, _input: &AgentInput) -> bool {
        !self.children.is_empty()
    }

    async fn process(&self, input: &AgentInput) -> Result<AgentOutput> {
        if self.children.is_empty() {
            return Err(Error::configuration_error("LoopAgent has no children"));
        }

        let start = Instant::now();
        let mut iteration_contents: Vec<String> = Vec::new();
        let mut iteration_confidences: Vec<f64> = Vec::new();
        let mut last_iteration_output: Option<AgentOutput> = None;

        if self.max_iterations == 0 {
            let mut output = AgentOutput::new(&self.id, "", 0.0).with_processing_time(start.elapsed().as_secs_f64());
            output.insert_structured("total_iterations", DynamicValue::Integer(0));
            return Ok(output);
        }

        for iteration in 1..=self.max_iterations {
            let mut iter_input = input.clone().with_merged_context(
                [
                    ("iteration".to_string(), DynamicValue::Integer(iteration as i64)),
                    (
                        "prior_iteration_contents".to_string(),
                        DynamicValue::Array(iteration_contents.iter().cloned().map(DynamicValue::from).collect()),
                    ),
                    (
                        "confidence_trend".to_string(),
                        DynamicValue::Array(iteration_confidences.iter().map(|c| DynamicValue::from(*c)).collect()),
                    ),
                ]
                .into_iter()
                .collect(),
            );

            let mut iteration_outputs: Vec<AgentOutput> = Vec::new();
            for child in &self.children {
                if !child.can_handle(&iter_input).await {
                    warn!(agent_id = child.id(), iteration, "loop: child cannot handle input, skipping");
                    continue;
                }
                let output = child
                    .process(&iter_input)
                    .await
                    .map_err(|err| Error::child_agent_failed(child.id(), err.to_string()))?;
                iter_input = iter_input.with_appended_outputs(vec![output.clone()]);
                iteration_outputs.push(output);
            }

            let content = iteration_outputs
                .iter()
                .map(|o| o.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            let confidence = mean_confidence(&iteration_outputs);

            iteration_contents.push(content.clone());
            iteration_confidences.push(confidence);
            last_iteration_output = Some(AgentOutput::new(&self.id, content, confidence));

            if self.should_stop(iteration, &iteration_confidences) {
                break;
            }
        }

        let total_iterations = iteration_contents.len() as i64;
        let mut output = last_iteration_output.unwrap_or_else(|| AgentOutput::new(&self.id, "", 0.0));
        output = output.with_processing_time(start.elapsed().as_secs_f64());
        output.insert_structured("total_iterations", DynamicValue::Integer(total_iterations));
        output.insert_structured(
            "confidence_trend",
            DynamicValue::Array(iteration_confidences.iter().map(|c| DynamicValue::from(*c)).collect()),
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedConfidenceAgent;

    #[tokio::test]
    async fn stops_at_iteration_matching_confidence_threshold() {
        let child = Arc::new(ScriptedConfidenceAgent::new("child", vec![0.60, 0.72, 0.80, 0.88, 0.96, 0.96]));
        let loop_agent = LoopAgent::new("loop-1", vec![child])
            .with_min_iterations(1)
            .with_max_iterations(10)
            .with_exit_condition(ExitCondition::ConfidenceThreshold(0.95));

        let output = loop_agent.process(&AgentInput::new("go")).await.unwrap();
        assert!((output.confidence - 0.96).abs() < 1e-9);
        assert_eq!(output.structured_data.get("total_iterations").unwrap().as_f64(), Some(5.0));
    }

    #[tokio::test]
    async fn iterations_k_stops_exactly_at_k() {
        let child = Arc::new(ScriptedConfidenceAgent::new("child", vec![0.5; 20]));
        let loop_agent = LoopAgent::new("loop-2", vec![child])
            .with_min_iterations(0)
            .with_max_iterations(10)
            .with_exit_condition(ExitCondition::Iterations(3));
        let output = loop_agent.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(output.structured_data.get("total_iterations").unwrap().as_f64(), Some(3.0));
    }

    #[tokio::test]
    async fn zero_max_iterations_yields_zero_confidence_and_empty_summary() {
        let child = Arc::new(ScriptedConfidenceAgent::new("child", vec![0.5]));
        let loop_agent = LoopAgent::new("loop-3", vec![child])
            .with_min_iterations(0)
            .with_max_iterations(0)
            .with_exit_condition(ExitCondition::Iterations(0));
        let output = loop_agent.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(output.confidence, 0.0);
        assert_eq!(output.content, "");
        assert_eq!(output.structured_data.get("total_iterations").unwrap().as_f64(), Some(0.0));
    }

    #[tokio::test]
    async fn self_argumentation_defaults_to_five_to_seven_cycles() {
        let child = Arc::new(ScriptedConfidenceAgent::new("child", vec![0.5, 0.6, 0.7, 0.8, 0.9, 0.97, 0.98]));
        let loop_agent = LoopAgent::self_argumentation("self-arg", child, 5);
        let output = loop_agent.process(&AgentInput::new("go")).await.unwrap();
        let total_iterations = output.structured_data.get("total_iterations").unwrap().as_f64().unwrap();
        assert!(total_iterations >= 5.0 && total_iterations <= 7.0);
    }

    #[tokio::test]
    async fn convergence_stops_when_successive_confidences_are_close() {
        let child = Arc::new(ScriptedConfidenceAgent::new("child", vec![0.5, 0.7, 0.701, 0.9]));
        let loop_agent = LoopAgent::new("loop-4", vec![child])
            .with_min_iterations(1)
            .with_max_iterations(10)
            .with_exit_condition(ExitCondition::Convergence(0.01));
        let output = loop_agent.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(output.structured_data.get("total_iterations").unwrap().as_f64(), Some(3.0));
    }

    #[tokio::test]
    async fn custom_exit_condition_never_fires_and_relies_on_max_iterations() {
        let child = Arc::new(ScriptedConfidenceAgent::new("child", vec![0.99; 10]));
        let loop_agent = LoopAgent::new("loop-5", vec![child])
            .with_min_iterations(1)
            .with_max_iterations(4)
            .with_exit_condition(ExitCondition::Custom);
        let output = loop_agent.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(output.structured_data.get("total_iterations").unwrap().as_f64(), Some(4.0));
    }

    #[tokio::test]
    async fn empty_children_list_reports_cannot_handle_and_errors_on_process() {
        let loop_agent = LoopAgent::new("loop-6", vec![]);
        assert!(!loop_agent.can_handle(&AgentInput::new("go")).await);
        let result = loop_agent.process(&AgentInput::new("go")).await;
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }
}
