//! Regex surface syntax parser: a shunting-yard over operand queue + operator stack
//! (SPEC_FULL.md §4.3).
//!
//! The reference crate's `custom_regex.rs` parses with hand-rolled recursive descent over a tiny
//! `a|b`, `ab`, `a*` grammar. That shape cannot express this spec's implicit-concatenation and
//! escape/char-class rules directly, so this module follows `original_source/src/Regex.py`'s
//! shunting-yard instead: an explicit operator stack and an operand queue of already-built AST
//! nodes.

use super::ast::Regex;
use crate::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Concat,
    Union,
    LParen,
}

impl Op {
    fn priority(self) -> u8 {
        match self {
            Op::LParen => 0,
            Op::Union => 3,
            Op::Concat => 4,
        }
    }
}

fn is_valid_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '@' | ':')
}

/// Characters `\<x>` may escape to a literal, per SPEC_FULL.md §4.3.
fn is_escapable(c: char) -> bool {
    matches!(c, ' ' | '*' | '+' | ')' | '(' | '|' | '?' | '/' | '\n')
}

/// Tokens after which an atom-start character triggers implicit concatenation. `\` stands for
/// "the previous position completed an escaped-literal or literal-newline atom" (see the escape
/// handling above), regardless of which character was actually escaped.
fn ends_atom(c: char) -> bool {
    is_valid_char(c) || matches!(c, ')' | '*' | '+' | '?' | ']' | '\\')
}

/// Parse `pattern` into a `Regex` AST using a shunting-yard: an operator stack and an operand
/// queue holding already-built nodes. Fails with `LexError::MalformedPattern` on unbalanced
/// parentheses or an operator with no operand to apply to.
pub fn parse_regex(pattern: &str) -> Result<Regex, LexError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut operators: Vec<Op> = Vec::new();
    let mut operands: Vec<Regex> = Vec::new();
    let mut last_char: Option<char> = None;

    let malformed = |reason: &str| LexError::MalformedPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let apply_top = |operators: &mut Vec<Op>, operands: &mut Vec<Regex>| -> Result<(), LexError> {
        let op = operators.pop().expect("caller checked operators is non-empty");
        let rhs = operands.pop().ok_or_else(|| malformed("operator missing right operand"))?;
        let lhs = operands.pop().ok_or_else(|| malformed("operator missing left operand"))?;
        operands.push(match op {
            Op::Concat => Regex::Concat(Box::new(lhs), Box::new(rhs)),
            Op::Union => Regex::Union(Box::new(lhs), Box::new(rhs)),
            Op::LParen => return Err(malformed("unmatched '('")),
        });
        Ok(())
    };

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        // A literal, unescaped newline: concatenation against it is decided here, same as any
        // other atom-start character. `last_char` becomes the `\` sentinel (not `c` itself) so
        // `ends_atom` sees "an atom was just completed" regardless of which character it was —
        // the same sentinel the escape branch below uses, for the same reason.
        if c == '\n' && !(i > 0 && chars[i - 1] == '\\') {
            maybe_concat(&mut operators, &mut operands, last_char, c, pattern)?;
            operands.push(Regex::Char(c));
            last_char = Some('\\');
            i += 1;
            continue;
        }

        // The target of a `\<x>` escape. The concatenation decision for this atom was already
        // made when the backslash itself was dispatched (it matches the `\\` arm of the gating
        // check below, one iteration ago) — doing it again here would apply an operator that has
        // no operand yet.
        if is_escapable(c) && i > 0 && chars[i - 1] == '\\' {
            operands.push(Regex::Char(c));
            last_char = Some('\\');
            i += 1;
            continue;
        }

        if c == ' ' {
            i += 1;
            continue;
        }

        if is_valid_char(c) || matches!(c, '(' | '[' | '\\') {
            maybe_concat(&mut operators, &mut operands, last_char, c, pattern)?;
        }

        if is_valid_char(c) {
            operands.push(Regex::Char(c));
        } else if c == '|' {
            while matches!(operators.last(), Some(op) if op.priority() >= Op::Union.priority()) {
                apply_top(&mut operators, &mut operands)?;
            }
            operators.push(Op::Union);
        } else if c == '*' {
            let e = operands.pop().ok_or_else(|| malformed("'*' with no operand"))?;
            operands.push(Regex::Star(Box::new(e)));
        } else if c == '+' {
            let e = operands.pop().ok_or_else(|| malformed("'+' with no operand"))?;
            operands.push(Regex::Plus(Box::new(e)));
        } else if c == '?' {
            let e = operands.pop().ok_or_else(|| malformed("'?' with no operand"))?;
            operands.push(Regex::Question(Box::new(e)));
        } else if c == '(' {
            operators.push(Op::LParen);
        } else if c == ')' {
            loop {
                match operators.pop() {
                    Some(Op::LParen) => break,
                    Some(op) => {
                        let rhs = operands.pop().ok_or_else(|| malformed("operator missing right operand"))?;
                        let lhs = operands.pop().ok_or_else(|| malformed("operator missing left operand"))?;
                        operands.push(match op {
                            Op::Concat => Regex::Concat(Box::new(lhs), Box::new(rhs)),
                            Op::Union => Regex::Union(Box::new(lhs), Box::new(rhs)),
                            Op::LParen => unreachable!(),
                        });
                    }
                    None => return Err(malformed("unmatched ')'")),
                }
            }
        } else if c == '[' {
            // Exactly three characters between brackets: offset +1 is lo, +3 is hi, per
            // SPEC_FULL.md §4.3 and §9 (the reference's exact shape, documented rather than
            // generalized to scan until ']').
            let lo = *chars.get(i + 1).ok_or_else(|| malformed("unterminated '['"))?;
            let hi = *chars.get(i + 3).ok_or_else(|| malformed("unterminated '['"))?;
            operands.push(Regex::CharClass(lo, hi));
            i += 4;
        }
        // Any other character — notably a bare `\` that only exists to mark the next character
        // as an escaped literal — falls through with no action, matching the reference parser's
        // behavior of silently passing over it (SPEC_FULL.md §9: malformed/unrecognized input
        // beyond unbalanced parens or operator arity is left undefined rather than hard-erroring).

        last_char = chars.get(i).copied();
        i += 1;
    }

    let mut result = operands.pop().ok_or_else(|| malformed("empty pattern"))?;
    while let Some(op) = operators.pop() {
        let lhs = operands.pop().ok_or_else(|| malformed("operator missing left operand"))?;
        result = match op {
            Op::Concat => Regex::Concat(Box::new(lhs), Box::new(result)),
            Op::Union => Regex::Union(Box::new(lhs), Box::new(result)),
            Op::LParen => return Err(malformed("unmatched '('")),
        };
    }
    if !operands.is_empty() {
        return Err(malformed("leftover operands: missing operator"));
    }

    Ok(result)
}

fn maybe_concat(
    operators: &mut Vec<Op>,
    operands: &mut Vec<Regex>,
    last_char: Option<char>,
    _current: char,
    pattern: &str,
) -> Result<(), LexError> {
    if last_char.is_some_and(ends_atom) {
        while matches!(operators.last(), Some(op) if op.priority() >= Op::Concat.priority()) {
            let op = operators.pop().expect("checked non-empty above");
            let rhs = operands.pop().ok_or_else(|| LexError::MalformedPattern {
                pattern: pattern.to_string(),
                reason: "operator missing right operand".to_string(),
            })?;
            let lhs = operands.pop().ok_or_else(|| LexError::MalformedPattern {
                pattern: pattern.to_string(),
                reason: "operator missing left operand".to_string(),
            })?;
            operands.push(match op {
                Op::Concat => Regex::Concat(Box::new(lhs), Box::new(rhs)),
                Op::Union => Regex::Union(Box::new(lhs), Box::new(rhs)),
                Op::LParen => unreachable!("LParen never satisfies priority >= Concat"),
            });
        }
        operators.push(Op::Concat);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepts(pattern: &str, word: &str) -> bool {
        parse_regex(pattern)
            .unwrap_or_else(|e| panic!("failed to parse {pattern:?}: {e}"))
            .thompson()
            .subset_construction()
            .accept(word)
    }

    #[test]
    fn literal_concatenation() {
        assert!(accepts("xxyz", "xxyz"));
        assert!(!accepts("xxyz", "xyz"));
    }

    #[test]
    fn plus_and_grouping() {
        assert!(accepts("abc+de+(fgh)+", "abccccdefghfghfgh"));
        assert!(!accepts("abc+de+(fgh)+", "abcde"));
    }

    #[test]
    fn char_class_and_question_and_plus() {
        assert!(accepts("[a-g]*_?[0-9]+", "aba_110"));
        assert!(!accepts("[a-g]*_?[0-9]+", "axe_12"));
    }

    #[test]
    fn union_binds_loosest() {
        assert!(accepts("ab|cd", "ab"));
        assert!(accepts("ab|cd", "cd"));
        assert!(!accepts("ab|cd", "ac"));
    }

    #[test]
    fn escaped_operator_is_literal() {
        assert!(accepts(r"a\*b", "a*b"));
        assert!(!accepts(r"a\*b", "ab"));
    }

    #[test]
    fn escaped_atom_concatenates_with_a_following_group() {
        // Exercises an escaped literal directly followed by a new group, the shape the
        // lambda-calculus `open`/`close`/`sum` lexical rules all use: `(\ )*\((\ )*`.
        let pattern = r"(\ )*\((\ )*";
        assert!(accepts(pattern, "("));
        assert!(accepts(pattern, "  (  "));
        assert!(!accepts(pattern, "()"));
    }

    #[test]
    fn unbalanced_parens_are_malformed() {
        assert!(matches!(
            parse_regex("(ab"),
            Err(LexError::MalformedPattern { .. })
        ));
        assert!(matches!(
            parse_regex("ab)"),
            Err(LexError::MalformedPattern { .. })
        ));
    }

    #[test]
    fn dangling_operator_is_malformed() {
        assert!(matches!(parse_regex("*"), Err(LexError::MalformedPattern { .. })));
        assert!(matches!(parse_regex("|a"), Err(LexError::MalformedPattern { .. })));
    }
}
