//! Concrete scenario tests and oracle comparisons against the `regex` crate, generalizing the
//! reference crate's `apply_pattern`-against-`EngineChoice` comparison style (`code/src/tests.rs`)
//! to compare this crate's `Dfa::accept` against an independent regex implementation.

use regexer::{parse_regex, Lexeme, Lexer, Rule};

fn accepts(pattern: &str, word: &str) -> bool {
    parse_regex(pattern)
        .unwrap_or_else(|e| panic!("failed to parse {pattern:?}: {e}"))
        .thompson()
        .subset_construction()
        .accept(word)
}

#[test]
fn scenario_literal_concatenation() {
    assert!(accepts("xxyz", "xxyz"));
    assert!(!accepts("xxyz", "xyz"));
}

#[test]
fn scenario_plus_and_grouping() {
    assert!(accepts("abc+de+(fgh)+", "abccccdefghfghfgh"));
    assert!(!accepts("abc+de+(fgh)+", "abcde"));
}

#[test]
fn scenario_char_class_question_plus() {
    assert!(accepts("[a-g]*_?[0-9]+", "aba_110"));
    assert!(!accepts("[a-g]*_?[0-9]+", "axe_12"));
}

#[test]
fn scenario_lambda_expression_lex() {
    let rules = vec![
        Rule::new("number", r"(\ )*(0|([1-9][0-9]*)+)(\ )*"),
        Rule::new("open", r"(\ )*\((\ )*"),
        Rule::new("close", r"(\ )*\)(\ )*"),
        Rule::new("sum", r"(\ )*\+(\ )*"),
        Rule::new("concat", r"(\ )*\+\+(\ )*"),
        Rule::new("lambda", r"(\ )*lambda(\ )*"),
        Rule::new("id", r"(\ )*([a-z]|[A-Z])+(\ )*:(\ )*"),
        Rule::new("var", r"(\ )*([a-z]|[A-Z])+(\ )*"),
    ];
    let lexer = Lexer::new(&rules).expect("fixed rule set must compile");
    let lexemes = lexer.lex("(++ (+ 1 2) 5)");
    assert_eq!(
        lexemes,
        vec![
            Lexeme::token("open", "("),
            Lexeme::token("concat", "++ "),
            Lexeme::token("open", "("),
            Lexeme::token("sum", "+ "),
            Lexeme::token("number", "1 "),
            Lexeme::token("number", "2"),
            Lexeme::token("close", ") "),
            Lexeme::token("number", "5"),
            Lexeme::token("close", ")"),
        ]
    );
}

#[test]
fn scenario_longest_match_disambiguates_overlapping_rules() {
    let rules = vec![
        Rule::new("space", r"\ "),
        Rule::new("newline", "\n"),
        Rule::new("token1", r"(a|b)*q+cb[0-9]*"),
        Rule::new("token2", r"x"),
        Rule::new("token3", r"[a-b]*[x-z]*abc[0-9]*"),
        Rule::new("token4", r"y"),
        Rule::new("token5", r"z"),
    ];
    let lexer = Lexer::new(&rules).expect("fixed rule set must compile");
    let lexemes = lexer.lex("bbaqcbbyabc67895");
    assert_eq!(
        lexemes,
        vec![Lexeme::token("token1", "bbaqcb"), Lexeme::token("token3", "byabc67895")]
    );
}

#[test]
fn scenario_unknown_symbol_is_a_single_diagnostic() {
    let rules = vec![Rule::new("word", "[a-z]+")];
    let lexer = Lexer::new(&rules).expect("fixed rule set must compile");
    let lexemes = lexer.lex("abc9");
    assert_eq!(lexemes.len(), 1);
    assert_eq!(lexemes[0].name, "");
    assert!(lexemes[0].text.starts_with("No viable alternative at character"));
}

/// Patterns restricted to the subset the `regex` crate and this engine both understand:
/// literals, `|`, `*`, `+`, `?`, grouping, and `[x-y]` classes (translated to `regex`'s
/// `[x-y]` syntax, which happens to coincide for a single inclusive range).
fn oracle_cases() -> Vec<(&'static str, &'static [&'static str])> {
    vec![
        ("a|b", &["a", "b", "ab", "", "c"]),
        ("(a|b)*", &["", "a", "b", "ab", "ba", "aabb", "c"]),
        ("a+b?c*", &["ac", "a", "abc", "aabccc", "b", ""]),
        ("[a-c]+d", &["ad", "bd", "ccad", "d", "ed"]),
        ("xy|yz|zx", &["xy", "yz", "zx", "xz", ""]),
    ]
}

#[test]
fn oracle_comparison_against_regex_crate() {
    for (pattern, words) in oracle_cases() {
        let anchored = format!("^(?:{pattern})$");
        let oracle = regex::Regex::new(&anchored).unwrap_or_else(|e| panic!("bad oracle pattern {anchored:?}: {e}"));
        for word in words {
            let expected = oracle.is_match(word);
            let actual = accepts(pattern, word);
            assert_eq!(
                actual, expected,
                "pattern {pattern:?} on {word:?}: engine said {actual}, regex crate said {expected}"
            );
        }
    }
}
