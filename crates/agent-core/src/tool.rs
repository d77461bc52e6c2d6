//! Tool System
//!
//! Static tool catalogue offered to the model, and the dispatcher seam that
//! turns a model-issued tool call into a string payload.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{AgentError, Result};

/// Tool call request issued by the LLM
///
/// Only ever produced by a provider; the orchestrator forwards it untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Call identifier, unique within one assistant message
    pub id: String,

    /// Requested tool name
    pub name: String,

    /// Raw argument text exactly as the model emitted it
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,

    /// Nested fields for `object` parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<ParameterSchema>,
}

impl ParameterSchema {
    fn new(name: &str, param_type: &str, description: &str, required: bool) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required,
            enum_values: None,
            properties: Vec::new(),
        }
    }

    /// Required string parameter
    pub fn required_string(name: &str, description: &str) -> Self {
        Self::new(name, "string", description, true)
    }

    /// Optional string parameter
    pub fn optional_string(name: &str, description: &str) -> Self {
        Self::new(name, "string", description, false)
    }

    /// Object parameter with nested fields
    pub fn object(
        name: &str,
        description: &str,
        required: bool,
        properties: Vec<Self>,
    ) -> Self {
        let mut param = Self::new(name, "object", description, required);
        param.properties = properties;
        param
    }

    /// JSON Schema fragment for this parameter
    pub fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(self.param_type));
        if !self.description.is_empty() {
            schema.insert("description".into(), json!(self.description));
        }
        if let Some(values) = &self.enum_values {
            schema.insert("enum".into(), json!(values));
        }
        if self.param_type == "object" {
            let (properties, required) = object_schema(&self.properties);
            schema.insert("properties".into(), properties);
            schema.insert("required".into(), required);
        }
        Value::Object(schema)
    }
}

fn object_schema(params: &[ParameterSchema]) -> (Value, Value) {
    let properties: Map<String, Value> = params
        .iter()
        .map(|p| (p.name.clone(), p.to_json_schema()))
        .collect();
    let required: Vec<&str> = params
        .iter()
        .filter(|p| p.required)
        .map(|p| p.name.as_str())
        .collect();
    (Value::Object(properties), json!(required))
}

/// Tool definition (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,

    /// Whether the tool writes to the backend
    #[serde(default)]
    pub has_side_effects: bool,
}

impl ToolDefinition {
    /// JSON Schema object describing the tool's arguments
    pub fn input_schema(&self) -> Value {
        let (properties, required) = object_schema(&self.parameters);
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Ordered, immutable-after-startup catalogue of tool definitions
#[derive(Clone, Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition; names must be unique
    pub fn register(&mut self, definition: ToolDefinition) -> Result<()> {
        if self.get(&definition.name).is_some() {
            return Err(AgentError::Config(format!(
                "Duplicate tool name: {}",
                definition.name
            )));
        }
        self.tools.push(definition);
        Ok(())
    }

    /// Build a registry from an ordered list of definitions
    pub fn from_definitions(definitions: impl IntoIterator<Item = ToolDefinition>) -> Result<Self> {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// All definitions, in registration order
    pub fn list(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Get a definition by name
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Tool names, in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Executes model-requested tool calls
///
/// Infallible at the interface: implementations encode failures with
/// [`error_payload`] so the orchestrator can always answer the call.
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    /// Execute `name` with the raw argument text and return the result payload
    async fn execute(&self, name: &str, raw_arguments: &str) -> String;
}

/// JSON error payload handed back to the model in a `tool` message
pub fn error_payload(reason: impl std::fmt::Display) -> String {
    json!({ "error": format!("Tool execution failed: {reason}") }).to_string()
}
