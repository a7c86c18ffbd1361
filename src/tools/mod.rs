//! Tool interface: a stable id, a display name, a
//! JSON-Schema input shape, and an async handler. Schemas are built with
//! the [`schema`] builder rather than any simple-type-notation conversion.

pub mod schema;
pub mod structured_output;

pub use schema::SchemaBuilder;
pub use structured_output::StructuredOutputTool;

use crate::error::{Error, Result};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::{timeout, Duration};

/// A tool's async handler: takes validated parameters, returns a JSON value.
/// Boxed and pinned for type erasure, `Arc`-wrapped so a `Tool` clones
/// cheaply and can be shared across concurrent callers.
pub type ToolHandler = Arc<dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<Value>> + Send>> + Send + Sync>;

/// An addressable tool with a stable id, display name, JSON-Schema input
/// shape, and an async handler.
#[derive(Clone)]
pub struct Tool {
    id: String,
    name: String,
    description: String,
    input_schema: Value,
    required: Vec<String>,
    timeout: Duration,
    handler: ToolHandler,
}

impl Tool {
    pub fn new<F, Fut>(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>, input_schema: Value, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let required = input_schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            input_schema,
            required,
            timeout: Duration::from_secs(30),
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    fn validate(&self, arguments: &Value) -> Result<()> {
        for name in &self.required {
            if arguments.get(name).is_none() {
                return Err(Error::missing_parameter(self.name.clone(), name.clone()));
            }
        }
        Ok(())
    }

    /// Validate `arguments` against `required`, then run the handler under
    /// this tool's timeout. Missing required parameters never reach the
    /// handler.
    pub async fn execute(&self, arguments: Value) -> Result<Value> {
        self.validate(&arguments)?;

        match timeout(self.timeout, (self.handler)(arguments)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(Error::ToolTimeout(self.name.clone())),
        }
    }
}

/// Fluent entry point for building a [`Tool`], routed through [`ToolBuilder`].
pub fn tool(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> ToolBuilder {
    ToolBuilder::new(id, name, description)
}

/// Accumulates a [`SchemaBuilder`] and metadata before a handler is supplied.
pub struct ToolBuilder {
    id: String,
    name: String,
    description: String,
    schema: SchemaBuilder,
    timeout: Duration,
}

impl ToolBuilder {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            schema: SchemaBuilder::object(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn schema(mut self, schema: SchemaBuilder) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> Tool
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Tool::new(self.id, self.name, self.description, self.schema.build(), handler).with_timeout(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_required_parameter_fails_before_the_handler_runs() {
        let t = tool("t1", "add", "adds two numbers")
            .schema(SchemaBuilder::object().number("a", true).number("b", true))
            .build(|args| async move { Ok(json!({ "sum": args["a"].as_f64().unwrap() + args["b"].as_f64().unwrap() })) });

        let result = t.execute(json!({ "a": 1.0 })).await;
        assert!(matches!(result, Err(Error::MissingParameter { .. })));
    }

    #[tokio::test]
    async fn handler_runs_once_required_parameters_are_present() {
        let t = tool("t2", "add", "adds two numbers")
            .schema(SchemaBuilder::object().number("a", true).number("b", true))
            .build(|args| async move { Ok(json!({ "sum": args["a"].as_f64().unwrap() + args["b"].as_f64().unwrap() })) });

        let result = t.execute(json!({ "a": 1.0, "b": 2.0 })).await.unwrap();
        assert_eq!(result["sum"], 3.0);
    }

    #[tokio::test]
    async fn handler_error_surfaces_as_tool_execution_failed() {
        let t = tool("t3", "boom", "always fails").build(|_args| async move { Err(Error::tool_execution_failed("boom", "kaboom")) });
        let result = t.execute(json!({})).await;
        assert!(matches!(result, Err(Error::ToolExecutionFailed { .. })));
    }

    #[tokio::test]
    async fn slow_handler_times_out() {
        let t = tool("t4", "slow", "sleeps forever")
            .with_timeout(Duration::from_millis(10))
            .build(|_args| async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(json!({}))
            });
        let result = t.execute(json!({})).await;
        assert!(matches!(result, Err(Error::ToolTimeout(_))));
    }
}
