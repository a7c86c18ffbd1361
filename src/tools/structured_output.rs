//! The Structured-Output Tool: given a prompt and a
//! JSON-Schema, asks the generator for JSON matching that schema and parses
//! the result.

use crate::error::{Error, Result};
use crate::generator::{GenerationConfig, Generator};
use serde_json::Value;
use std::sync::Arc;

/// Invokes a [`Generator`] with `responseMimeType = application/json` and a
/// caller-supplied schema, then parses the returned text as JSON.
pub struct StructuredOutputTool {
    generator: Arc<dyn Generator>,
}

impl StructuredOutputTool {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Run the tool: generate against `schema`, parse the result as JSON.
    /// Parsing failure surfaces as [`Error::tool_execution_failed`] rather
    /// than [`Error::Json`], so callers can distinguish a malformed model
    /// response from a transport-level decoding bug.
    pub async fn execute(&self, prompt: &str, schema: Value) -> Result<Value> {
        let config = GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
            ..GenerationConfig::default()
        };

        let response = self.generator.generate(prompt, None, &config).await?;

        serde_json::from_str(&response.text)
            .map_err(|err| Error::tool_execution_failed("structured_output", format!("invalid JSON from generator: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratedResponse;
    use async_trait::async_trait;
    use serde_json::json;

    struct ScriptedGenerator {
        text: String,
    }

    #[async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str, _system: Option<&str>, config: &GenerationConfig) -> Result<GeneratedResponse> {
            assert_eq!(config.response_mime_type.as_deref(), Some("application/json"));
            Ok(GeneratedResponse {
                text: self.text.clone(),
                processing_time_secs: 0.0,
            })
        }
    }

    #[tokio::test]
    async fn parses_valid_json_into_a_value() {
        let tool = StructuredOutputTool::new(Arc::new(ScriptedGenerator {
            text: r#"{"name": "Ada", "age": 36}"#.to_string(),
        }));
        let value = tool.execute("extract the person", json!({ "type": "object" })).await.unwrap();
        assert_eq!(value["name"], "Ada");
        assert_eq!(value["age"], 36);
    }

    #[tokio::test]
    async fn invalid_json_surfaces_as_execution_failed() {
        let tool = StructuredOutputTool::new(Arc::new(ScriptedGenerator {
            text: "not json at all".to_string(),
        }));
        let result = tool.execute("extract the person", json!({ "type": "object" })).await;
        assert!(matches!(result, Err(Error::ToolExecutionFailed { .. })));
    }
}
