//! Argument validation against a tool's advertised JSON Schema.
//!
//! ```rust
//! use ltooling::validate_arguments;
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {"url": {"type": "string"}},
//!     "required": ["url"]
//! });
//!
//! assert!(validate_arguments(&schema, &json!({"url": "https://example.com"})).is_ok());
//! assert!(validate_arguments(&schema, &json!({})).is_err());
//! ```

use jsonschema::JSONSchema;
use serde_json::Value;

use crate::ToolError;

/// Checks `arguments` against `schema`, reporting every violation as
/// `"<path>: <reason>"` with paths rooted at `$`.
///
/// A schema that does not compile is not enforced; the server stays the
/// authority on its own input.
pub fn validate_arguments(schema: &Value, arguments: &Value) -> Result<(), ToolError> {
    let Ok(compiled) = JSONSchema::compile(schema) else {
        return Ok(());
    };

    let Err(errors) = compiled.validate(arguments) else {
        return Ok(());
    };

    let violations: Vec<String> = errors
        .map(|error| format!("{}: {error}", display_path(&error.instance_path.to_string())))
        .collect();

    Err(ToolError::invalid_arguments(violations.join("; ")))
}

fn display_path(pointer: &str) -> String {
    let mut path = String::from("$");
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit()) {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            path.push('.');
            path.push_str(&segment);
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ToolErrorKind;

    fn fetch_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {"type": "string"},
                "max_length": {"type": "integer"},
                "raw": {"type": "boolean"},
                "format": {"type": "string", "enum": ["markdown", "html"]},
                "level": {"enum": [1, 2, 3]},
                "headers": {
                    "type": "object",
                    "properties": {"accept": {"type": "string"}},
                    "additionalProperties": false
                },
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["url"],
            "additionalProperties": false
        })
    }

    fn message_for(arguments: Value) -> String {
        let error = validate_arguments(&fetch_schema(), &arguments).expect_err("should fail");
        assert_eq!(error.kind, ToolErrorKind::InvalidArguments);
        error.message
    }

    #[test]
    fn accepts_arguments_matching_the_schema() {
        let arguments = json!({
            "url": "https://example.com",
            "max_length": 5000,
            "raw": false,
            "format": "markdown",
            "headers": {"accept": "text/html"},
            "tags": ["a", "b"]
        });

        assert!(validate_arguments(&fetch_schema(), &arguments).is_ok());
    }

    #[test]
    fn integer_valued_floats_satisfy_integer_and_enum() {
        let arguments = json!({"url": "https://example.com", "max_length": 5000.0, "level": 2.0});

        assert!(validate_arguments(&fetch_schema(), &arguments).is_ok());
    }

    #[test]
    fn rejects_non_object_arguments() {
        assert!(message_for(json!("https://example.com")).starts_with("$: "));
    }

    #[test]
    fn rejects_missing_required_property() {
        let message = message_for(json!({"raw": true}));
        assert!(message.starts_with("$: "), "{message}");
        assert!(message.contains("\"url\""), "{message}");
    }

    #[test]
    fn rejects_wrong_primitive_types() {
        assert!(message_for(json!({"url": "u", "max_length": 1.5})).starts_with("$.max_length: "));
        assert!(message_for(json!({"url": "u", "raw": "yes"})).starts_with("$.raw: "));
    }

    #[test]
    fn rejects_values_outside_enum() {
        assert!(message_for(json!({"url": "u", "format": "pdf"})).starts_with("$.format: "));
    }

    #[test]
    fn rejects_unknown_properties_when_closed() {
        assert!(message_for(json!({"url": "u", "proxy": "x"})).contains("proxy"));

        let nested = message_for(json!({"url": "u", "headers": {"cookie": "x"}}));
        assert!(nested.starts_with("$.headers: "), "{nested}");
        assert!(nested.contains("cookie"), "{nested}");
    }

    #[test]
    fn reports_array_items_by_index() {
        assert!(message_for(json!({"url": "u", "tags": ["ok", 3]})).starts_with("$.tags[1]: "));
    }

    #[test]
    fn reports_every_violation() {
        let message = message_for(json!({"url": 1, "raw": "yes"}));
        assert!(message.contains("$.url: "), "{message}");
        assert!(message.contains("$.raw: "), "{message}");
    }

    #[test]
    fn open_schema_and_union_types_are_respected() {
        let schema = json!({
            "type": "object",
            "properties": {"limit": {"type": ["integer", "null"]}}
        });

        assert!(validate_arguments(&schema, &json!({"limit": null, "extra": 1})).is_ok());
        assert!(validate_arguments(&schema, &json!({"limit": "ten"})).is_err());
        assert!(validate_arguments(&json!({}), &json!(42)).is_ok());
    }

    #[test]
    fn schema_that_does_not_compile_is_not_enforced() {
        let schema = json!({"type": "object", "properties": {"url": {"type": 5}}});

        assert!(validate_arguments(&schema, &json!({"url": "https://example.com"})).is_ok());
    }

    #[test]
    fn pointer_segments_render_as_dotted_path() {
        assert_eq!(display_path(""), "$");
        assert_eq!(display_path("/headers/accept"), "$.headers.accept");
        assert_eq!(display_path("/tags/0"), "$.tags[0]");
        assert_eq!(display_path("/a~1b"), "$.a/b");
    }
}
