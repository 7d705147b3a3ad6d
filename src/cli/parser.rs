//! Console line parsing
//!
//! A line holds one or more sub-commands joined by [`CHAIN_SEPARATOR`]; each
//! sub-command is tokenized with shell-style quoting into a command name and
//! positional arguments.

use thiserror::Error;

/// Separator between chained sub-commands
pub const CHAIN_SEPARATOR: &str = "&&";

/// One tokenized sub-command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated quote in \"{0}\"")]
    UnterminatedQuote(String),
}

/// Split a console line into invocations. Empty sub-commands (stray
/// separators, blank lines) are skipped rather than reported.
pub fn parse_line(line: &str) -> Result<Vec<Invocation>, ParseError> {
    let mut invocations = Vec::new();

    for clause in line.split(CHAIN_SEPARATOR) {
        let mut tokens = tokenize(clause)?;
        if tokens.is_empty() {
            continue;
        }
        let name = tokens.remove(0);
        invocations.push(Invocation { name, args: tokens });
    }

    Ok(invocations)
}

/// Shell-style tokenizer: whitespace-separated words, single quotes taken
/// literally, double quotes with backslash escapes.
pub fn tokenize(input: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(ParseError::UnterminatedQuote(input.to_string())),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(e) => current.push(e),
                            None => return Err(ParseError::UnterminatedQuote(input.to_string())),
                        },
                        Some(c) => current.push(c),
                        None => return Err(ParseError::UnterminatedQuote(input.to_string())),
                    }
                }
            }
            '\\' => {
                in_token = true;
                if let Some(e) = chars.next() {
                    current.push(e);
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }

    Ok(tokens)
}
