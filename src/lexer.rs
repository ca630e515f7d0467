//! The lexer compiler and scanner (SPEC_FULL.md §4.4, §4.5).
//!
//! Grounded on `original_source/src/Lexer.py`, restructured to fix the open questions SPEC_FULL.md
//! §9 calls out: each rule's NFA states are shifted into their own disjoint `u32` sub-range with a
//! side list recording which ones are rule accepts, rather than a formatted string; sink detection
//! is structural; and a DFA accept state with no rule-tagged member is an `InvariantViolation`
//! rather than silently attributed to the lexically-last rule.

use log::{debug, trace, warn};
use std::collections::BTreeSet;

use crate::automaton::{Dfa, Nfa, NfaState};
use crate::error::LexError;
use crate::regex::parse_regex;

/// One (token-name, matched-substring) pair, or — when `name` is empty — a diagnostic carried in
/// `text` per the lexeme-stream contract (SPEC_FULL.md §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub name: String,
    pub text: String,
}

impl Lexeme {
    pub fn token(name: &str, text: &str) -> Self {
        Lexeme {
            name: name.to_string(),
            text: text.to_string(),
        }
    }

    fn diagnostic(message: String) -> Self {
        Lexeme {
            name: String::new(),
            text: message,
        }
    }
}

/// A single lexical rule: a token name paired with the regex pattern that recognizes it. Rule
/// index (its position in the `Lexer`'s rule list) determines priority — lower index wins ties on
/// longest match.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub pattern: String,
}

impl Rule {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Rule {
            name: name.into(),
            pattern: pattern.into(),
        }
    }
}

/// A compiled lexical analyzer: a single DFA built by unioning every rule's Thompson NFA under a
/// shared start state, then applying subset construction (SPEC_FULL.md §4.4).
#[derive(Debug, Clone)]
pub struct Lexer {
    rule_names: Vec<String>,
    dfa: Dfa,
    /// For each reachable DFA state, the minimum rule index among its rule-tagged NFA-state
    /// members, if the state is an accept state at all. Computed once at compile time instead of
    /// being re-derived on every scan step.
    accept_rule: Vec<Option<usize>>,
}

impl Lexer {
    /// Compile `rules` into a scanner DFA. Only `LexError::MalformedPattern` (from a bad pattern)
    /// or `LexError::InvariantViolation` (a crate bug) can occur here.
    pub fn new(rules: &[Rule]) -> Result<Lexer, LexError> {
        let mut combined = Nfa::single_state(false);
        combined.delta.clear();
        combined.states = BTreeSet::from([0]);
        let reserved_start: NfaState = 0;

        // Structured (rule_index, local_state) identity instead of the reference's
        // "<rule>_<state>"/"<rule>_<state>_f" strings (SPEC_FULL.md §3, §4.4). Each rule's states
        // are packed into a disjoint integer range above the reserved start state.
        let mut next_state: NfaState = 1;
        let mut rule_names = Vec::with_capacity(rules.len());
        // Tracks which flattened NFA states are final, tagged with their originating rule index,
        // so the DFA accept-state pass below can recover rule priority without string parsing.
        let mut final_rule_of: Vec<(NfaState, usize)> = Vec::new();

        for (rule_index, rule) in rules.iter().enumerate() {
            rule_names.push(rule.name.clone());
            let ast = parse_regex(&rule.pattern)?;
            let nfa = ast.thompson();
            let base = next_state;
            let shifted = nfa.relabel(|s| s + base);
            next_state += nfa.states.len() as NfaState;

            for &accept_state in &shifted.accept {
                final_rule_of.push((accept_state, rule_index));
            }

            combined.merge_from(&shifted);
            combined
                .delta
                .entry((reserved_start, None))
                .or_default()
                .insert(shifted.start);
        }
        combined.start = reserved_start;

        let dfa = combined.subset_construction();
        debug!(
            "Lexer::new: compiled {} rules into a DFA with {} states",
            rules.len(),
            dfa.states.len()
        );

        let mut accept_rule = vec![None; dfa.states.len()];
        for &state in &dfa.states {
            if !dfa.accept.contains(&state) {
                continue;
            }
            let nfa_states = dfa.subsets.set_for(state);
            let min_rule = final_rule_of
                .iter()
                .filter(|(s, _)| nfa_states.contains(s))
                .map(|&(_, r)| r)
                .min();
            match min_rule {
                Some(r) => accept_rule[state as usize] = Some(r),
                None => {
                    debug_assert!(
                        false,
                        "every DFA accept subset must contain at least one rule-tagged member"
                    );
                    return Err(LexError::InvariantViolation {
                        detail: format!("DFA accept state {state} has no rule-tagged member"),
                    });
                }
            }
        }

        Ok(Lexer {
            rule_names,
            dfa,
            accept_rule,
        })
    }

    fn rule_for_accept(&self, state: crate::automaton::DfaState) -> Option<usize> {
        self.accept_rule.get(state as usize).copied().flatten()
    }

    /// Scan `text` into a lexeme stream using longest-match-earliest-rule-wins, tracking
    /// line/column for diagnostics. Always returns a `Vec`: on a scan failure, it is the
    /// single-element diagnostic described by the lexeme-stream contract (SPEC_FULL.md §6).
    pub fn lex(&self, text: &str) -> Vec<Lexeme> {
        match self.try_lex(text) {
            Ok(lexemes) => lexemes,
            Err(e) => vec![Lexeme::diagnostic(e.into_diagnostic_message())],
        }
    }

    fn try_lex(&self, text: &str) -> Result<Vec<Lexeme>, LexError> {
        let chars: Vec<char> = text.chars().collect();
        let mut result = Vec::new();

        let mut state = self.dfa.start;
        let mut lexeme_start = 0usize;
        let mut last_accept_index: Option<usize> = None;
        let mut last_accept_rule: Option<usize> = None;

        let mut index = 0usize;
        let mut line = 0usize;
        let mut last_newline_index: Option<usize> = None;

        while index < chars.len() {
            let c = chars[index];

            if c == '\n' && last_newline_index != Some(index) {
                line += 1;
                last_newline_index = Some(index);
            }
            let column = index as isize - last_newline_index.map_or(-1, |i| i as isize) - 1;
            let column = column.max(0) as usize;

            if !self.dfa.alphabet.contains(&c) {
                warn!("lex: unknown symbol {c:?} at line {line}, column {column}");
                return Err(LexError::UnknownSymbol { line, column });
            }

            state = match self.dfa.delta.get(&(state, c)) {
                Some(&next) => next,
                None => {
                    debug_assert!(false, "DFA transition missing for state {state} on {c:?}");
                    return Err(LexError::InvariantViolation {
                        detail: format!("DFA transition missing for state {state} on {c:?}"),
                    });
                }
            };
            trace!("lex: consumed {c:?} -> state {state}");

            if self.dfa.is_sink(state) {
                let Some(accept_index) = last_accept_index else {
                    warn!("lex: dead state with no prior accept at line {line}, column {column}");
                    return Err(LexError::NoViableAlternative { line, column });
                };
                let rule = last_accept_rule.expect("last_accept_index implies last_accept_rule");
                let matched: String = chars[lexeme_start..=accept_index].iter().collect();
                result.push(Lexeme::token(&self.rule_names[rule], &matched));

                lexeme_start = accept_index + 1;
                index = lexeme_start;
                state = self.dfa.start;
                last_accept_index = None;
                last_accept_rule = None;
                continue;
            }

            if let Some(rule) = self.rule_for_accept(state) {
                last_accept_index = Some(index);
                last_accept_rule = Some(rule);
            }

            index += 1;
        }

        match last_accept_index {
            None => {
                let column = chars.len() as isize - last_newline_index.map_or(-1, |i| i as isize) - 1;
                Err(LexError::NoViableAlternative {
                    line,
                    column: column.max(0) as usize,
                })
            }
            Some(accept_index) => {
                let rule = last_accept_rule.expect("last_accept_index implies last_accept_rule");
                let matched: String = chars[lexeme_start..=accept_index].iter().collect();
                result.push(Lexeme::token(&self.rule_names[rule], &matched));
                Ok(result)
            }
        }
    }
}

/// The fixed 8-rule lambda-calculus lexical spec the `lex` CLI subcommand tokenizes with
/// (SPEC_FULL.md §4.8, §6). Tree-walking evaluation of the resulting lexeme stream is out of
/// scope; this only describes how the stream is produced.
pub fn lambda_calculus_rules() -> Vec<Rule> {
    vec![
        Rule::new("number", r"(\ )*(0|([1-9][0-9]*)+)(\ )*"),
        Rule::new("open", r"(\ )*\((\ )*"),
        Rule::new("close", r"(\ )*\)(\ )*"),
        Rule::new("sum", r"(\ )*\+(\ )*"),
        Rule::new("concat", r"(\ )*\+\+(\ )*"),
        Rule::new("lambda", r"(\ )*lambda(\ )*"),
        Rule::new("id", r"(\ )*([a-z]|[A-Z])+(\ )*:(\ )*"),
        Rule::new("var", r"(\ )*([a-z]|[A-Z])+(\ )*"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lambda_rules() -> Vec<Rule> {
        lambda_calculus_rules()
    }

    #[test]
    fn lexes_lambda_expression_sample() {
        let lexer = Lexer::new(&lambda_rules()).unwrap();
        let lexemes = lexer.lex("(++ (+ 1 2) 5)");
        let expected = vec![
            ("open", "("),
            ("concat", "++ "),
            ("open", "("),
            ("sum", "+ "),
            ("number", "1 "),
            ("number", "2"),
            ("close", ") "),
            ("number", "5"),
            ("close", ")"),
        ];
        assert_eq!(lexemes.len(), expected.len());
        for (got, (name, text)) in lexemes.iter().zip(expected) {
            assert_eq!(got.name, name);
            assert_eq!(got.text, text);
        }
    }

    #[test]
    fn longest_match_disambiguates_overlapping_rules() {
        let rules = vec![
            Rule::new("space", r"\ "),
            Rule::new("newline", "\n"),
            Rule::new("token1", r"(a|b)*q+cb[0-9]*"),
            Rule::new("token2", r"x"),
            Rule::new("token3", r"[a-b]*[x-z]*abc[0-9]*"),
            Rule::new("token4", r"y"),
            Rule::new("token5", r"z"),
        ];
        let lexer = Lexer::new(&rules).unwrap();
        let lexemes = lexer.lex("bbaqcbbyabc67895");
        assert_eq!(
            lexemes,
            vec![
                Lexeme::token("token1", "bbaqcb"),
                Lexeme::token("token3", "byabc67895"),
            ]
        );
    }

    #[test]
    fn unknown_symbol_produces_single_diagnostic() {
        let rules = vec![Rule::new("digit", "[0-9]")];
        let lexer = Lexer::new(&rules).unwrap();
        let lexemes = lexer.lex("1a");
        assert_eq!(lexemes.len(), 1);
        assert_eq!(lexemes[0].name, "");
        assert!(lexemes[0].text.starts_with("No viable alternative at character"));
    }

    #[test]
    fn rule_priority_breaks_ties_by_lower_index() {
        // "a" and "a|b" both match "a"; the earlier rule (index 0) must win.
        let rules = vec![Rule::new("first", "a"), Rule::new("second", "a|b")];
        let lexer = Lexer::new(&rules).unwrap();
        let lexemes = lexer.lex("a");
        assert_eq!(lexemes, vec![Lexeme::token("first", "a")]);
    }

    #[test]
    fn eof_without_accept_is_a_diagnostic() {
        let rules = vec![Rule::new("ab", "ab")];
        let lexer = Lexer::new(&rules).unwrap();
        let lexemes = lexer.lex("a");
        assert_eq!(lexemes.len(), 1);
        assert_eq!(lexemes[0].name, "");
    }

    #[test]
    fn malformed_pattern_rejected_at_compile_time() {
        let rules = vec![Rule::new("broken", "(a")];
        assert!(matches!(Lexer::new(&rules), Err(LexError::MalformedPattern { .. })));
    }
}
