//! Wire and configuration types shared by discovery, caching, and invocation.

use std::collections::BTreeMap;

use lprovider::ToolDefinition;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// How to launch one tool server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerParameters {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Overrides applied on top of the inherited process environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl ServerParameters {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// `command arg1 arg2`, for log lines.
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A tool as advertised by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "inputSchema", default = "empty_object_schema")]
    pub input_schema: Value,
    /// Fields such as `title`, `annotations` or `outputSchema`, kept so a
    /// cached listing round-trips unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            extra: Map::new(),
        }
    }

    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.to_string(),
        }
    }
}

fn empty_object_schema() -> Value {
    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    Value::Object(schema)
}

fn null_as_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result payload of `tools/call`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<Value>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl CallToolResult {
    /// Text items joined by newlines; non-text items are kept as compact JSON.
    pub fn render_text(&self) -> String {
        self.content
            .iter()
            .map(|item| match (item.get("type").and_then(Value::as_str), item.get("text")) {
                (Some("text"), Some(Value::String(text))) => text.clone(),
                _ => item.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
