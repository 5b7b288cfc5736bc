//! Typed slash-command arguments.
//!
//! [`CommandArgs<T>`] parses the `text` of a slash command into any
//! [`clap::Parser`] type, using the command token as the program name.
//!
//! ```rust,ignore
//! use clap::Parser;
//! use bolt_framework::CommandArgs;
//!
//! #[derive(Parser, Clone, Debug)]
//! struct Deploy {
//!     environment: String,
//!     #[arg(long)]
//!     force: bool,
//! }
//!
//! async fn deploy(args: CommandArgs<Deploy>) -> String {
//!     format!("deploying to {}", args.environment)
//! }
//! ```

use std::sync::Arc;

use clap::Parser;
use serde_json::Value;

use bolt_core::payload::str_field;

use crate::error::{ExtractError, ExtractResult};
use crate::extractor::{ArgKind, FromArgs, ResolvedArgs};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Splits `input` into shell-like words.
///
/// Whitespace separates words outside quotes. Single quotes are literal;
/// inside double quotes a backslash escapes the next character.
pub fn shell_split(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut quote = Quote::None;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Quote::None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            (Quote::None, '\'') => {
                quote = Quote::Single;
                in_word = true;
            }
            (Quote::None, '"') => {
                quote = Quote::Double;
                in_word = true;
            }
            (Quote::Single, '\'') | (Quote::Double, '"') => quote = Quote::None,
            (Quote::Double, '\\') => {
                if let Some(escaped) = chars.next() {
                    word.push(escaped);
                }
            }
            (_, c) => {
                word.push(c);
                in_word = true;
            }
        }
    }

    if in_word {
        words.push(word);
    }
    words
}

/// A slash command's `text` parsed into `T`.
#[derive(Debug, Clone)]
pub struct CommandArgs<T: Parser>(pub T);

impl<T: Parser> CommandArgs<T> {
    /// Parses the command text of `body`.
    pub fn parse(body: &Value) -> ExtractResult<Self> {
        let program = str_field(body, "command").unwrap_or("command");
        let text = str_field(body, "text").unwrap_or_default();
        let argv = std::iter::once(program.to_string()).chain(shell_split(text));
        T::try_parse_from(argv)
            .map(CommandArgs)
            .map_err(|e| ExtractError::InvalidCommandArgs(e.to_string()))
    }

    /// Unwraps the parsed value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Parser> std::ops::Deref for CommandArgs<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Parser> FromArgs for CommandArgs<T> {
    fn declare(out: &mut Vec<ArgKind>) {
        out.push(ArgKind::Body);
    }

    fn from_args(args: &ResolvedArgs) -> ExtractResult<Self> {
        let body = Arc::<Value>::from_args(args)?;
        Self::parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BoltRequest;
    use crate::handler::into_handler;
    use serde_json::json;

    #[derive(Parser, Clone, Debug, PartialEq)]
    struct Deploy {
        environment: String,
        #[arg(long)]
        force: bool,
    }

    #[test]
    fn test_shell_split() {
        assert_eq!(shell_split("a  b\tc"), ["a", "b", "c"]);
        assert_eq!(shell_split(r#"say "hello world" 'x y'"#), ["say", "hello world", "x y"]);
        assert_eq!(shell_split(r#""a \"quoted\" word""#), [r#"a "quoted" word"#]);
        assert_eq!(shell_split(r#"'' """#), ["", ""]);
        assert!(shell_split("   ").is_empty());
    }

    #[test]
    fn test_parse_command_text() {
        let body = json!({"command": "/deploy", "text": "staging --force"});
        let args = CommandArgs::<Deploy>::parse(&body).unwrap();
        assert_eq!(args.environment, "staging");
        assert!(args.force);
    }

    #[test]
    fn test_parse_failure_is_extract_error() {
        let body = json!({"command": "/deploy", "text": ""});
        let err = CommandArgs::<Deploy>::parse(&body).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidCommandArgs(_)));
    }

    #[tokio::test]
    async fn test_command_args_as_handler_parameter() {
        let handler = into_handler(|args: CommandArgs<Deploy>| async move {
            format!("deploying to {}", args.environment)
        });
        assert_eq!(handler.declared_args(), [ArgKind::Body]);

        let request = BoltRequest::new(json!({"command": "/deploy", "text": "prod"}));
        let response = handler.call(&request, None, "deploy").await.unwrap();
        assert_eq!(response.body, "deploying to prod");
    }
}
