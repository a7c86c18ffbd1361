//! [`LlmAgent`] — a single external generation call wrapped in the [`Agent`]
//! trait, plus its Analysis/Extraction/Review specializations built by
//! composition.

use crate::agent::{Agent, AgentInput, AgentOutput, Capability};
use crate::error::{Error, Result};
use crate::generator::{GenerationConfig, Generator};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// Assembles the layered prompt: Previous Context (if any prior outputs),
/// Context Variables (if any context entries), then the Task block verbatim.
fn assemble_prompt(input: &AgentInput) -> String {
    let mut sections = Vec::new();

    if !input.previous_outputs.is_empty() {
        let lines: Vec<String> = input
            .previous_outputs
            .iter()
            .map(|o| format!("[{}]: {}", o.agent_id, o.content))
            .collect();
        sections.push(format!("Previous Context:\n{}", lines.join("\n")));
    }

    if !input.context.is_empty() {
        let lines: Vec<String> = input
            .context
            .iter()
            .map(|(k, v)| format!("- {k}: {}", v.stringify()))
            .collect();
        sections.push(format!("Context Variables:\n{}", lines.join("\n")));
    }

    sections.push(format!("Task:\n{}", input.content));
    sections.join("\n\n")
}

/// Heuristic confidence from response word count.
fn confidence_from_word_count(text: &str) -> f64 {
    let words = text.split_whitespace().count();
    if words < 10 {
        0.5
    } else if words < 50 {
        0.7
    } else if words < 200 {
        0.85
    } else {
        0.9
    }
}

/// A single external generation call wrapped in the [`Agent`] trait.
pub struct LlmAgent {
    id: String,
    name: String,
    description: String,
    capabilities: Vec<Capability>,
    generator: Arc<dyn Generator>,
    system_instruction: Option<String>,
    generation_config: GenerationConfig,
}

impl LlmAgent {
    pub fn new(id: impl Into<String>, name: impl Into<String>, generator: Arc<dyn Generator>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: "generates text via an external language model".to_string(),
            capabilities: vec![Capability::TextGeneration],
            generator,
            system_instruction: None,
            generation_config: GenerationConfig::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_capabilities(mut self, capabilities: Vec<Capability>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_system_instruction(mut self, system_instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(system_instruction.into());
        self
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = config;
        self
    }

    /// *Analysis* specialization: temperature 0.3, demands structured
    /// sections.
    pub fn analysis(id: impl Into<String>, generator: Arc<dyn Generator>) -> Self {
        let mut config = GenerationConfig::default();
        config.temperature = 0.3;
        Self::new(id, "analysis", generator)
            .with_description("analyzes input and reports structured findings")
            .with_capabilities(vec![Capability::DataAnalysis, Capability::Reasoning])
            .with_system_instruction(
                "You are an analysis agent. Structure your response into exactly these sections: \
                 Key Findings, Data Patterns, Recommendations, Confidence Level.",
            )
            .with_generation_config(config)
    }

    /// *Extraction* specialization: temperature 0.1, demands JSON output when
    /// a schema is supplied by the caller via `generation_config`.
    pub fn extraction(id: impl Into<String>, generator: Arc<dyn Generator>) -> Self {
        let mut config = GenerationConfig::default();
        config.temperature = 0.1;
        Self::new(id, "extraction", generator)
            .with_description("extracts structured data from input")
            .with_capabilities(vec![Capability::DocumentExtraction])
            .with_system_instruction(
                "You are a data extraction agent. When a schema is provided, respond with JSON \
                 matching that schema exactly and nothing else.",
            )
            .with_generation_config(config)
    }

    /// *Review* specialization: temperature 0.5, demands error/inconsistency
    /// identification and quality scoring.
    pub fn review(id: impl Into<String>, generator: Arc<dyn Generator>) -> Self {
        let mut config = GenerationConfig::default();
        config.temperature = 0.5;
        Self::new(id, "review", generator)
            .with_description("reviews input for errors, inconsistencies, and quality")
            .with_capabilities(vec![Capability::Review])
            .with_system_instruction(
                "You are a review agent. Identify errors and inconsistencies, then provide a \
                 quality score from 0 to 1.",
            )
            .with_generation_config(config)
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    async fn can_handle(&self, _input: &AgentInput) -> bool {
        true
    }

    async fn process(&self, input: &AgentInput) -> Result<AgentOutput> {
        let start = Instant::now();
        let prompt = assemble_prompt(input);
        let response = self
            .generator
            .generate(&prompt, self.system_instruction.as_deref(), &self.generation_config)
            .await?;

        if response.text.trim().is_empty() {
            return Err(Error::processing_failed("generator returned no text"));
        }

        let confidence = confidence_from_word_count(&response.text);
        Ok(AgentOutput::new(&self.id, response.text, confidence)
            .with_processing_time(start.elapsed().as_secs_f64()))
    }
}
