//! Shared test-only agents used across the composer, coordinator, and
//! retry test suites. Not part of the public API.

#![cfg(test)]

use crate::agent::{Agent, AgentInput, AgentOutput, Capability};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Always succeeds with a fixed reply and confidence.
pub struct EchoAgent {
    pub agent_id: String,
    pub reply: String,
    pub confidence: f64,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Agent for EchoAgent {
    fn id(&self) -> &str {
        &self.agent_id
    }
    fn name(&self) -> &str {
        &self.agent_id
    }
    fn description(&self) -> &str {
        "echoes a fixed reply"
    }
    fn capabilities(&self) -> &[Capability] {
        &[Capability::TextGeneration]
    }
    async fn can_handle(&self, _input: &AgentInput) -> bool {
        true
    }
    async fn process(&self, _input: &AgentInput) -> Result<AgentOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AgentOutput::new(&self.agent_id, &self.reply, self.confidence))
    }
}

/// Never handles anything; used to test `canHandle == false` paths.
pub struct RefusingAgent {
    pub agent_id: String,
}

#[async_trait]
impl Agent for RefusingAgent {
    fn id(&self) -> &str {
        &self.agent_id
    }
    fn name(&self) -> &str {
        &self.agent_id
    }
    fn description(&self) -> &str {
        "refuses all input"
    }
    fn capabilities(&self) -> &[Capability] {
        &[]
    }
    async fn can_handle(&self, _input: &AgentInput) -> bool {
        false
    }
    async fn process(&self, _input: &AgentInput) -> Result<AgentOutput> {
        Err(Error::invalid_input("RefusingAgent never handles input"))
    }
}

/// Fails on its first `fail_until` calls, then succeeds. Used to exercise
/// retry policies and composer error handling.
pub struct FlakyAgent {
    pub agent_id: String,
    pub fail_until: usize,
    pub attempts: Arc<AtomicUsize>,
    pub reply: String,
}

#[async_trait]
impl Agent for FlakyAgent {
    fn id(&self) -> &str {
        &self.agent_id
    }
    fn name(&self) -> &str {
        &self.agent_id
    }
    fn description(&self) -> &str {
        "fails a fixed number of times before succeeding"
    }
    fn capabilities(&self) -> &[Capability] {
        &[Capability::TextGeneration]
    }
    async fn can_handle(&self, _input: &AgentInput) -> bool {
        true
    }
    async fn process(&self, _input: &AgentInput) -> Result<AgentOutput> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.fail_until {
            return Err(Error::processing_failed(format!("attempt {attempt} failed")));
        }
        Ok(AgentOutput::new(&self.agent_id, &self.reply, 0.9))
    }
}

/// Returns a scripted sequence of confidences on successive calls, cycling
/// the content `"iter-N"`. Used to exercise `LoopAgent` exit conditions.
pub struct ScriptedConfidenceAgent {
    pub agent_id: String,
    pub confidences: Arc<Mutex<Vec<f64>>>,
    pub call_index: Arc<AtomicUsize>,
}

impl ScriptedConfidenceAgent {
    pub fn new(agent_id: impl Into<String>, confidences: Vec<f64>) -> Self {
        Self {
            agent_id: agent_id.into(),
            confidences: Arc::new(Mutex::new(confidences)),
            call_index: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Agent for ScriptedConfidenceAgent {
    fn id(&self) -> &str {
        &self.agent_id
    }
    fn name(&self) -> &str {
        &self.agent_id
    }
    fn description(&self) -> &str {
        "returns scripted confidences in order"
    }
    fn capabilities(&self) -> &[Capability] {
        &[Capability::Reasoning]
    }
    async fn can_handle(&self, _input: &AgentInput) -> bool {
        true
    }
    async fn process(&self, _input: &AgentInput) -> Result<AgentOutput> {
        let idx = self.call_index.fetch_add(1, Ordering::SeqCst);
        let confidences = self.confidences.lock().await;
        let confidence = confidences.get(idx).copied().unwrap_or_else(|| {
            *confidences.last().unwrap_or(&0.0)
        });
        Ok(AgentOutput::new(&self.agent_id, format!("iter-{idx}"), confidence))
    }
}

/// Always fails with a fixed error message.
pub struct FailingAgent {
    pub agent_id: String,
}

#[async_trait]
impl Agent for FailingAgent {
    fn id(&self) -> &str {
        &self.agent_id
    }
    fn name(&self) -> &str {
        &self.agent_id
    }
    fn description(&self) -> &str {
        "always fails"
    }
    fn capabilities(&self) -> &[Capability] {
        &[]
    }
    async fn can_handle(&self, _input: &AgentInput) -> bool {
        true
    }
    async fn process(&self, _input: &AgentInput) -> Result<AgentOutput> {
        Err(Error::processing_failed("always fails"))
    }
}
