//! [`ParallelAgent`] — runs children concurrently under a max in-flight cap
//! and aggregates their outputs under a configurable strategy.

use crate::agent::{Agent, AgentInput, AgentOutput, Capability};
use crate::error::{Error, Result};
use crate::value::DynamicValue;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// How a [`ParallelAgent`] combines its children's outputs into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationStrategy {
    /// Each child's content labelled with its agent id, joined with a
    /// separator; confidence is the mean. Default.
    Concatenate,
    /// The output with the highest confidence wins; ties go to the earlier
    /// original index.
    BestConfidence,
    /// Contents joined with newline; structured data merged, namespaced by
    /// agent id.
    Merge,
}

/// Parallel composition of child agents. Children run
/// concurrently under `max_concurrent`; `fail_fast` is this composer's single
/// knob for stop-on-error behavior.
pub struct ParallelAgent {
    id: String,
    name: String,
    children: Vec<Arc<dyn Agent>>,
    max_concurrent: usize,
    strategy: AggregationStrategy,
    fail_fast: bool,
}

impl ParallelAgent {
    pub fn new(id: impl Into<String>, children: Vec<Arc<dyn Agent>>) -> Self {
        Self {
            id: id.into(),
            name: "parallel".to_string(),
            children,
            max_concurrent: 4,
            strategy: AggregationStrategy::Concatenate,
            fail_fast: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_strategy(mut self, strategy: AggregationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    fn aggregate(&self, mut results: Vec<(usize, AgentOutput)>) -> AgentOutput {
        results.sort_by_key(|(idx, _)| *idx);
        let outputs: Vec<AgentOutput> = results.into_iter().map(|(_, o)| o).collect();

        if outputs.is_empty() {
            let mut output = AgentOutput::new(&self.id, "no child produced output", 0.0);
            output.insert_structured("agent_count", DynamicValue::Integer(0));
            return output;
        }

        let mut output = match self.strategy {
            AggregationStrategy::Concatenate => {
                let content = outputs
                    .iter()
                    .map(|o| format!("[{}] {}", o.agent_id, o.content))
                    .collect::<Vec<_>>()
                    .join("\n");
                let confidence = crate::agent::mean_confidence(&outputs);
                AgentOutput::new(&self.id, content, confidence)
            }
            AggregationStrategy::BestConfidence => {
                let best = outputs
                    .iter()
                    .enumerate()
                    .max_by(|(ia, a), (ib, b)| {
                        a.confidence
                            .partial_cmp(&b.confidence)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then(ib.cmp(ia))
                    })
                    .map(|(_, o)| o)
                    .expect("outputs is non-empty");
                AgentOutput::new(&self.id, best.content.clone(), best.confidence)
            }
            AggregationStrategy::Merge => {
                let content = outputs.iter().map(|o| o.content.as_str()).collect::<Vec<_>>().join("\n");
                let confidence = crate::agent::mean_confidence(&outputs);
                let mut merged = AgentOutput::new(&self.id, content, confidence);
                let mut namespaced = BTreeMap::new();
                for child_output in &outputs {
                    for (k, v) in &child_output.structured_data {
                        namespaced.insert(format!("{}.{}", child_output.agent_id, k), v.clone());
                    }
                }
                merged = merged.with_structured_data(namespaced);
                merged
            }
        };

        output.insert_structured("agent_count", DynamicValue::Integer(outputs.len() as i64));
        output.insert_structured(
            "child_agent_ids",
            DynamicValue::Array(outputs.iter().map(|o| DynamicValue::from(o.agent_id.clone())).collect()),
        );
        output
    }
}

#[async_trait]
impl Agent for ParallelAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "runs child agents concurrently and aggregates their outputs"
    }

    fn capabilities(&self) -> &[Capability] {
        &[]
    }

    async fn can_handle(&self, _input: &AgentInput) -> bool {
        !self.children.is_empty()
    }

    async fn process(&self, input: &AgentInput) -> Result<AgentOutput> {
        if self.children.is_empty() {
            return Err(Error::configuration_error("ParallelAgent has no children"));
        }

        let start = Instant::now();
        let mut in_flight = FuturesUnordered::new();
        let mut queue = self.children.iter().cloned().enumerate();
        let mut results: Vec<(usize, AgentOutput)> = Vec::new();

        for (idx, child) in queue.by_ref().take(self.max_concurrent) {
            let input = input.clone();
            in_flight.push(async move { (idx, child.clone(), child.process(&input).await) });
        }

        while let Some((idx, child, result)) = in_flight.next().await {
            match result {
                Ok(output) => results.push((idx, output)),
                Err(err) => {
                    if self.fail_fast {
                        return Err(Error::child_agent_failed(child.id(), err.to_string()));
                    }
                    warn!(agent_id = child.id(), error = %err, "parallel: child failed, omitting from result");
                }
            }

            if let Some((idx, child)) = queue.next() {
                let input = input.clone();
                in_flight.push(async move { (idx, child.clone(), child.process(&input).await) });
            }
        }

        let mut output = self.aggregate(results);
        output = output.with_processing_time(start.elapsed().as_secs_f64());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{EchoAgent, FailingAgent};
    use std::sync::atomic::AtomicUsize;

    fn echo(agent_id: &str, reply: &str, confidence: f64) -> Arc<dyn Agent> {
        Arc::new(EchoAgent {
            agent_id: agent_id.to_string(),
            reply: reply.to_string(),
            confidence,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }

    #[tokio::test]
    async fn best_confidence_picks_the_highest_scoring_child() {
        let parallel = ParallelAgent::new("p-1", vec![echo("a", "a", 0.6), echo("b", "b", 0.9), echo("c", "c", 0.8)])
            .with_max_concurrent(2)
            .with_strategy(AggregationStrategy::BestConfidence);
        let output = parallel.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(output.content, "b");
        assert!((output.confidence - 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn concatenate_labels_each_child_and_averages_confidence() {
        let parallel = ParallelAgent::new("p-2", vec![echo("a", "x", 0.5), echo("b", "y", 1.0)])
            .with_strategy(AggregationStrategy::Concatenate);
        let output = parallel.process(&AgentInput::new("go")).await.unwrap();
        assert!(output.content.contains("[a] x"));
        assert!(output.content.contains("[b] y"));
        assert!((output.confidence - 0.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn merge_namespaces_structured_data_by_agent_id() {
        let parallel = ParallelAgent::new("p-3", vec![echo("a", "x", 0.5), echo("b", "y", 0.5)])
            .with_strategy(AggregationStrategy::Merge);
        let output = parallel.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(output.content, "x\ny");
    }

    #[tokio::test]
    async fn fail_fast_aborts_on_first_child_error() {
        let parallel = ParallelAgent::new("p-4", vec![echo("a", "x", 0.5), Arc::new(FailingAgent { agent_id: "b".into() })])
            .with_fail_fast(true);
        let result = parallel.process(&AgentInput::new("go")).await;
        assert!(matches!(result, Err(Error::ChildAgentFailed { .. })));
    }

    #[tokio::test]
    async fn non_fail_fast_omits_failing_children() {
        let parallel = ParallelAgent::new("p-5", vec![echo("a", "x", 0.5), Arc::new(FailingAgent { agent_id: "b".into() })]);
        let output = parallel.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(output.content, "[a] x");
    }

    #[tokio::test]
    async fn all_children_failing_yields_zero_confidence_placeholder() {
        let parallel = ParallelAgent::new(
            "p-6",
            vec![Arc::new(FailingAgent { agent_id: "a".into() }), Arc::new(FailingAgent { agent_id: "b".into() })],
        );
        let output = parallel.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(output.confidence, 0.0);
    }

    #[tokio::test]
    async fn max_concurrent_one_matches_sequential_style_aggregation() {
        let parallel = ParallelAgent::new("p-7", vec![echo("a", "ALPHA", 0.7), echo("b", "BETA", 0.85)])
            .with_max_concurrent(1)
            .with_strategy(AggregationStrategy::Merge);
        let output = parallel.process(&AgentInput::new("go")).await.unwrap();
        assert_eq!(output.content, "ALPHA\nBETA");
        assert!((output.confidence - 0.775).abs() < 1e-9);
    }
}
