//! Example-file parsing.
//!
//! An example file is plain text. Numbered lines carry a derivation:
//!
//! ```text
//! # transitive
//! 1 John saw Mary ['v*', 'n', 'v', 'n']
//! Japanese
//! 2 John-ga Mary-o mita ['C', 'v*', 'n', 'v', 'n']
//! 3 ... ['C', ['v*', 'n', 'v', 'n'], 'n']
//! ```
//!
//! A line mentioning `Japanese` or `English` switches the language for the
//! lines that follow (a numbered line switches itself too). Everything else is
//! ignored.

use crate::{Language, Target};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("line {line}: list is never closed")]
    Unterminated { line: usize },
    #[error("line {line}: unexpected `{token}` in list")]
    UnexpectedToken { line: usize, token: String },
    /// `line` is 0 when the targets did not come from a file.
    #[error("line {line}: sub-streams nest at most one level")]
    NestedStream { line: usize },
    #[error("line {line}: quoted key is never closed")]
    UnclosedQuote { line: usize },
    #[error("line {line}: derivation list is empty")]
    EmptyTarget { line: usize },
}

/// One numbered derivation line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub number: u32,
    pub sentence: String,
    pub language: Language,
    pub targets: Vec<Target>,
    /// 1-based line in the source text.
    pub line: usize,
}

/// Parse every numbered derivation in `text`, starting in `language`.
pub fn parse_examples(text: &str, language: Language) -> Result<Vec<Example>, InputError> {
    let line_re = regex!(r"^(\d+)(?:\s+([^\[]*?))?\s*(\[.*)$");
    let mut language = language;
    let mut examples = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed.contains("Japanese") {
            language = Language::HeadFinal;
        } else if trimmed.contains("English") {
            language = Language::HeadInitial;
        }

        let Some(caps) = line_re.captures(trimmed) else {
            continue;
        };
        let Ok(number) = caps[1].parse::<u32>() else {
            continue;
        };
        let sentence = caps.get(2).map_or("", |m| m.as_str()).to_string();
        let targets = parse_target_list(&caps[3], line)?;
        if targets.is_empty() {
            return Err(InputError::EmptyTarget { line });
        }
        examples.push(Example { number, sentence, language, targets, line });
    }
    Ok(examples)
}

/// Parse one list literal such as `['C', ['v*', 'n'], "n",]`. Commas are
/// optional separators; text after the closing bracket is an error.
pub fn parse_target_list(text: &str, line: usize) -> Result<Vec<Target>, InputError> {
    let token_re = regex!(r#"\s*(?:(\[)|(\])|(,)|'([^']*)'|"([^"]*)"|(\S))"#);
    let mut open: Vec<Vec<Target>> = Vec::new();
    let mut done: Option<Vec<Target>> = None;

    for caps in token_re.captures_iter(text) {
        let token = caps[0].trim();
        if done.is_some() {
            return Err(InputError::UnexpectedToken { line, token: token.to_string() });
        }

        if caps.get(1).is_some() {
            if open.len() >= 2 {
                return Err(InputError::NestedStream { line });
            }
            open.push(Vec::new());
        } else if caps.get(2).is_some() {
            let Some(list) = open.pop() else {
                return Err(InputError::UnexpectedToken { line, token: token.to_string() });
            };
            match open.last_mut() {
                Some(parent) => parent.push(Target::Stream(list)),
                None => done = Some(list),
            }
        } else if caps.get(3).is_some() {
            if open.is_empty() {
                return Err(InputError::UnexpectedToken { line, token: token.to_string() });
            }
        } else if let Some(key) = caps.get(4).or_else(|| caps.get(5)) {
            let Some(list) = open.last_mut() else {
                return Err(InputError::UnexpectedToken { line, token: token.to_string() });
            };
            list.push(Target::Item(key.as_str().to_string()));
        } else if matches!(token, "'" | "\"") {
            return Err(InputError::UnclosedQuote { line });
        } else {
            return Err(InputError::UnexpectedToken { line, token: token.to_string() });
        }
    }

    done.ok_or(InputError::Unterminated { line })
}
