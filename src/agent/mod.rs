//! Shared vocabulary for every agent: [`AgentInput`], [`AgentOutput`], the
//! [`Agent`] trait, and the closed [`Capability`] enumeration.

pub mod input;
pub mod output;

pub use input::{AgentInput, InputMetadata, Priority};
pub use output::{AgentOutput, mean_confidence};

use crate::error::Result;
use async_trait::async_trait;

/// A capability an [`Agent`] may declare. Closed enumeration so matching
/// on a capability can be exhaustive — new capabilities are added here,
/// never passed around as a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    TextGeneration,
    ImageGeneration,
    DocumentExtraction,
    DataAnalysis,
    CodeGeneration,
    Search,
    Reasoning,
    Review,
    SelfArgumentation,
    BoundaryValidation,
}

/// An addressable processor that maps one [`AgentInput`] to one
/// [`AgentOutput`].
///
/// Invariants: an agent never mutates its input; a
/// declared capability must be honored by `process`; `process` must be safe
/// to call from multiple concurrent callers as long as inputs are distinct.
/// Agent operations are asynchronous in contract because
/// most are I/O-bound (they call an external generator).
#[async_trait]
pub trait Agent: Send + Sync {
    /// Stable, unique identifier for this agent instance.
    fn id(&self) -> &str;

    /// Human-readable display name.
    fn name(&self) -> &str;

    /// Human-readable description of what this agent does.
    fn description(&self) -> &str;

    /// The subset of [`Capability`] this agent declares.
    fn capabilities(&self) -> &[Capability];

    /// Whether this agent can process the given input. Composers skip
    /// (Sequential) or fail (coordinator) when this returns `false`.
    async fn can_handle(&self, input: &AgentInput) -> bool;

    /// Process one input into one output. Must not mutate `input`.
    async fn process(&self, input: &AgentInput) -> Result<AgentOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EchoAgent;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[tokio::test]
    async fn echo_agent_reports_capabilities_and_handles_everything() {
        let agent = EchoAgent {
            agent_id: "echo".into(),
            reply: "hi".into(),
            confidence: 0.5,
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let input = AgentInput::new("ping");
        assert!(agent.can_handle(&input).await);
        assert_eq!(agent.capabilities(), &[Capability::TextGeneration]);
        let output = agent.process(&input).await.unwrap();
        assert_eq!(output.content, "hi");
    }
}
