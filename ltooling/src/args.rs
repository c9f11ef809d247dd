//! Parsing of model-produced tool arguments.
//!
//! ```rust
//! use ltooling::parse_json_value;
//!
//! let args = parse_json_value(r#"{"url":"https://example.com"}"#).expect("object should parse");
//! assert_eq!(args["url"], "https://example.com");
//! assert!(parse_json_value("").expect("blank should parse").is_object());
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

/// Parses model-produced arguments. Models sometimes send an empty string for
/// a tool without parameters; that is read as `{}`.
pub fn parse_json_value(args_json: &str) -> Result<Value, ToolError> {
    if args_json.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_str(args_json)
        .map_err(|err| ToolError::invalid_arguments(format!("invalid JSON arguments: {err}")))
}
