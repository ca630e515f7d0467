//! Error kinds shared by the regex parser, the lexer compiler and the scanner.
//!
//! Mirrors the reference crate's hand-written `RegexError` (`custom_regex.rs`): a plain enum with
//! manual `Display`/`std::error::Error` impls rather than a derive macro.

use std::fmt;

/// Everything that can go wrong while compiling a pattern or scanning text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// The regex surface syntax could not be parsed: unbalanced parentheses or an operator
    /// missing its operand.
    MalformedPattern {
        pattern: String,
        reason: String,
    },
    /// A scanned character does not belong to the union of the lexer's rule alphabets.
    UnknownSymbol { line: usize, column: usize },
    /// The scanner reached a dead (sink) state, or end of input, without ever recording an
    /// accepting match since the last committed lexeme.
    NoViableAlternative { line: usize, column: usize },
    /// A structural invariant that should always hold was violated. Reaching this from a valid
    /// input is a bug in this crate, never a consequence of user input.
    InvariantViolation { detail: String },
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::MalformedPattern { pattern, reason } => {
                write!(f, "malformed pattern {pattern:?}: {reason}")
            }
            LexError::UnknownSymbol { line, column } => {
                write!(f, "unknown symbol at character {column}, line {line}")
            }
            LexError::NoViableAlternative { line, column } => {
                write!(
                    f,
                    "No viable alternative at character {column}, line {line}"
                )
            }
            LexError::InvariantViolation { detail } => {
                write!(f, "internal invariant violated: {detail}")
            }
        }
    }
}

impl std::error::Error for LexError {}

impl LexError {
    /// Render the diagnostic the way the scanner's public `lex` boundary reports it: a single
    /// lexeme with an empty token name, per the lexeme-stream contract.
    pub fn into_diagnostic_message(self) -> String {
        match self {
            LexError::UnknownSymbol { line, column } | LexError::NoViableAlternative { line, column } => {
                format!("No viable alternative at character {column}, line {line}")
            }
            other => other.to_string(),
        }
    }
}
