//! Command-line arguments and how they become a query.

use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_QUERY: &str = "Summarize https://www.youtube.com/watch?v=NExtKbS1Ljc";
pub const COMMIT_QUERY: &str =
    "check git status and diff. Then commit it with descriptive and concise commit msg";
const CONTINUATION_PREFIX: &str = "c ";

/// Run an LLM agent with tools served by MCP servers.
#[derive(Debug, Parser)]
#[command(name = "llm", version, about)]
pub struct Cli {
    /// Config file to use instead of the default search locations.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// The query to process. Prefix with `c` to continue the last
    /// conversation, or pass `commit` to commit the working tree.
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,
}

/// A query ready to hand to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    /// Continue the last saved thread instead of starting a new one.
    pub continuation: bool,
}

/// Piped input wins over positional words, which win over the default
/// query. A leading `commit` word always selects the commit query.
pub fn resolve_query(positional: &[String], piped: Option<String>) -> Query {
    let mut text = match piped {
        Some(input) => input.trim().to_string(),
        None if positional.is_empty() => DEFAULT_QUERY.to_string(),
        None => positional.join(" "),
    };

    if positional.first().is_some_and(|word| word == "commit") {
        text = COMMIT_QUERY.to_string();
    }

    match text.strip_prefix(CONTINUATION_PREFIX) {
        Some(rest) => Query {
            text: rest.to_string(),
            continuation: true,
        },
        None => Query {
            text,
            continuation: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn positional_words_are_joined() {
        let query = resolve_query(&words("what is the weather"), None);
        assert_eq!(query.text, "what is the weather");
        assert!(!query.continuation);
    }

    #[test]
    fn no_input_uses_the_default_query() {
        assert_eq!(resolve_query(&[], None).text, DEFAULT_QUERY);
    }

    #[test]
    fn piped_input_is_trimmed_and_preferred() {
        let query = resolve_query(&words("ignored"), Some("  summarize this\n".to_string()));
        assert_eq!(query.text, "summarize this");
    }

    #[test]
    fn commit_word_rewrites_the_query() {
        assert_eq!(resolve_query(&words("commit now"), None).text, COMMIT_QUERY);
    }

    #[test]
    fn continuation_prefix_is_stripped() {
        let query = resolve_query(&words("c and then what?"), None);
        assert_eq!(query.text, "and then what?");
        assert!(query.continuation);

        let piped = resolve_query(&[], Some("c tell me more".to_string()));
        assert!(piped.continuation);
        assert_eq!(piped.text, "tell me more");
    }

    #[test]
    fn words_starting_with_c_are_not_continuations() {
        let query = resolve_query(&words("count the files"), None);
        assert!(!query.continuation);
        assert_eq!(query.text, "count the files");
    }

    #[test]
    fn cli_parses_config_flag_and_query() {
        let cli = Cli::parse_from(["llm", "--config", "/tmp/llm.json", "c", "go", "on"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/llm.json")));
        assert_eq!(cli.query, words("c go on"));
    }
}
