//! Turns agent events into terminal output.
//!
//! ```rust
//! use lchat::AgentEvent;
//! use llmcli::render::ResponseRenderer;
//! use lprovider::DeltaContent;
//!
//! let mut renderer = ResponseRenderer::new(Vec::new());
//! renderer
//!     .handle(&AgentEvent::TokenDelta(DeltaContent::Text("Hi".into())))
//!     .expect("write");
//! renderer.finish().expect("write");
//! assert_eq!(renderer.into_inner(), b"Hi\n");
//! ```

use std::io::{self, Write};

use lchat::{AgentEvent, ToolArgs, ToolCallNotice};
use lprovider::DeltaContent;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Streaming,
    AwaitingToolSummary,
    Done,
}

/// Writes streamed tokens as they arrive, a blank line after each completed
/// assistant message, and a summary of requested tool calls.
pub struct ResponseRenderer<W: Write> {
    out: W,
    state: RenderState,
}

impl<W: Write> ResponseRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            state: RenderState::Idle,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn handle(&mut self, event: &AgentEvent) -> io::Result<()> {
        if self.state == RenderState::Done {
            return Ok(());
        }

        match event {
            AgentEvent::TokenDelta(delta) => {
                if let Some(text) = delta_text(delta) {
                    self.out.write_all(text.as_bytes())?;
                    self.out.flush()?;
                }
                self.state = RenderState::Streaming;
            }
            AgentEvent::FinalValue { .. } => {
                self.out.write_all(b"\n\n")?;
                self.out.flush()?;
                self.state = RenderState::AwaitingToolSummary;
            }
            AgentEvent::ToolCalls(notices) => {
                self.out.write_all(tool_summary(notices).as_bytes())?;
                self.out.flush()?;
                self.state = RenderState::AwaitingToolSummary;
            }
        }

        Ok(())
    }

    pub fn finish(&mut self) -> io::Result<()> {
        if self.state != RenderState::Done {
            self.out.write_all(b"\n")?;
            self.out.flush()?;
            self.state = RenderState::Done;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Plain text, or the text of the first part when it carries any.
fn delta_text(delta: &DeltaContent) -> Option<&str> {
    match delta {
        DeltaContent::Text(text) => Some(text.as_str()),
        DeltaContent::Parts(parts) => parts.first().and_then(|part| part.text.as_deref()),
    }
}

fn tool_summary(notices: &[ToolCallNotice]) -> String {
    let mut summary = String::from("\n\nTool Calls:\n");
    for notice in notices {
        summary.push_str(&format!("  {}\n", notice.name));
        if let Some(error) = &notice.error {
            summary.push_str(&format!("  Error: {error}\n"));
        }
        summary.push_str("  Args:\n");
        match &notice.args {
            ToolArgs::Structured(args) => {
                for (key, value) in args {
                    summary.push_str(&format!("    {key}: {}\n", render_arg_value(value)));
                }
            }
            ToolArgs::Raw(raw) => summary.push_str(&format!("    {raw}\n")),
        }
    }
    summary
}

/// Strings print bare; everything else prints as compact JSON.
pub fn render_arg_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use lprovider::{ContentPart, Message, ToolCall};
    use serde_json::json;

    use super::*;

    /// Records each write separately so flush ordering is visible.
    #[derive(Default)]
    struct Chunks {
        writes: Vec<String>,
    }

    impl Write for Chunks {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes.push(String::from_utf8_lossy(buf).into_owned());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn text(value: &str) -> AgentEvent {
        AgentEvent::TokenDelta(DeltaContent::Text(value.to_string()))
    }

    fn final_value() -> AgentEvent {
        AgentEvent::FinalValue {
            messages: vec![Message::user("hi"), Message::assistant("Hello world")],
        }
    }

    fn render(events: &[AgentEvent]) -> String {
        let mut renderer = ResponseRenderer::new(Vec::new());
        for event in events {
            renderer.handle(event).expect("write");
        }
        renderer.finish().expect("write");
        String::from_utf8(renderer.into_inner()).expect("utf8")
    }

    #[test]
    fn tokens_are_written_in_order_then_a_blank_line() {
        let mut renderer = ResponseRenderer::new(Chunks::default());
        renderer.handle(&text("Hello")).expect("write");
        renderer.handle(&text(" world")).expect("write");
        renderer.handle(&final_value()).expect("write");
        assert_eq!(renderer.state(), RenderState::AwaitingToolSummary);
        renderer.finish().expect("write");

        assert_eq!(renderer.state(), RenderState::Done);
        assert_eq!(renderer.into_inner().writes, vec!["Hello", " world", "\n\n", "\n"]);
    }

    #[test]
    fn structured_deltas_print_the_first_part_text() {
        let parts = AgentEvent::TokenDelta(DeltaContent::Parts(vec![
            ContentPart::text("first"),
            ContentPart::text("second"),
        ]));
        let no_text = AgentEvent::TokenDelta(DeltaContent::Parts(vec![ContentPart {
            kind: "image".to_string(),
            text: None,
        }]));

        assert_eq!(render(&[parts, no_text]), "first\n");
    }

    #[test]
    fn tool_summary_lists_args_in_order() {
        let call = ToolCall::new(
            "c1",
            "git_commit",
            r#"{"repo_path":"/src/app","message":"fix: typo","amend":false,"files":["a.rs"]}"#,
        );
        let output = render(&[
            final_value(),
            AgentEvent::ToolCalls(vec![ToolCallNotice::from_call(&call)]),
        ]);

        assert_eq!(
            output,
            "\n\n\n\nTool Calls:\n  git_commit\n  Args:\n    repo_path: /src/app\n    message: fix: typo\n    amend: false\n    files: [\"a.rs\"]\n\n"
        );
        assert!(!output.contains("Error:"));
    }

    #[test]
    fn tool_summary_shows_errors_and_raw_args() {
        let call = ToolCall::new("c1", "fetch", r#"{"url": "#);
        let output = render(&[AgentEvent::ToolCalls(vec![ToolCallNotice::from_call(&call)])]);

        assert!(output.starts_with("\n\nTool Calls:\n  fetch\n  Error: Function fetch arguments"));
        assert!(output.ends_with("  Args:\n    {\"url\": \n\n"));
    }

    #[test]
    fn events_after_finish_are_ignored() {
        let mut renderer = ResponseRenderer::new(Vec::new());
        renderer.finish().expect("write");
        renderer.handle(&text("late")).expect("write");
        renderer.finish().expect("write");
        assert_eq!(renderer.into_inner(), b"\n");
    }

    #[test]
    fn arg_values_render_strings_bare() {
        assert_eq!(render_arg_value(&json!("plain")), "plain");
        assert_eq!(render_arg_value(&json!(3)), "3");
        assert_eq!(render_arg_value(&json!({"a": 1})), "{\"a\":1}");
        assert_eq!(render_arg_value(&Value::Null), "null");
    }
}
