//! A lexical-analysis engine: regex parser, Thompson construction, subset construction and a
//! longest-match scanner (SPEC_FULL.md §2).

pub mod automaton;
pub mod error;
pub mod lexer;
pub mod regex;

pub use automaton::{Dfa, Nfa};
pub use error::LexError;
pub use lexer::{Lexeme, Lexer, Rule};
pub use regex::{parse_regex, Regex};
