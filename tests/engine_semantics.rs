//! Engine behaviour on small hand-written languages
//!
//! Each test builds the smallest definition that exercises one rule of the engine: rule
//! precedence, anchoring, lookahead, the pattern library, transitions and fallbacks.

use asmlex::lexing::{include, rule, ConfigError, LanguageDefinition};
use asmlex::testing::assert_tokens;
use asmlex::{Document, Tokenizer};
use rstest::rstest;

fn tokenizer(definition: LanguageDefinition) -> Tokenizer {
    Tokenizer::from_definition(&definition).unwrap()
}

fn check(tokenizer: &Tokenizer, lines: &[&str], line: usize, expected: &[(&str, &str)]) {
    let document = Document::from_lines(lines.iter().copied());
    let tokens = tokenizer.tokenize_document(&document);
    assert_tokens(&tokens, &document)
        .covers_every_line()
        .line(line, |l| {
            l.sequence(expected);
        });
}

#[test]
fn test_first_matching_rule_wins_over_longer_match() {
    let t = tokenizer(
        LanguageDefinition::new("p", "root")
            .mode("root", vec![rule("a", "short"), rule("ab", "long")]),
    );
    check(&t, &["ab"], 0, &[("short", "a"), ("unclassified", "b")]);
}

#[test]
fn test_caret_only_matches_at_line_start() {
    let t = tokenizer(
        LanguageDefinition::new("p", "root")
            .mode("root", vec![rule("^x", "start"), rule("x", "middle")]),
    );
    check(&t, &["xx"], 0, &[("start", "x"), ("middle", "x")]);
}

#[rstest]
#[case("abc:", &[("label", "abc"), ("unclassified", ":")])]
#[case("abc", &[("word", "abc")])]
fn test_trailing_lookahead_is_not_consumed(
    #[case] line: &str,
    #[case] expected: &[(&str, &str)],
) {
    let t = tokenizer(LanguageDefinition::new("p", "root").mode(
        "root",
        vec![rule("[a-z]+(?=:)", "label"), rule("[a-z]+", "word")],
    ));
    check(&t, &[line], 0, expected);
}

#[test]
fn test_lookahead_on_one_alternation_branch_fails_to_build() {
    let definition = LanguageDefinition::new("p", "root")
        .mode("root", vec![rule("foo|bar(?=:)", "word")]);
    assert!(matches!(
        Tokenizer::from_definition(&definition).unwrap_err(),
        ConfigError::InvalidPattern { .. }
    ));
}

#[test]
fn test_unterminated_string_is_one_invalid_token() {
    let t = tokenizer(
        LanguageDefinition::new("p", "root")
            .mode(
                "root",
                vec![
                    rule(r#""[^"]*$"#, "string.invalid"),
                    rule(r#"""#, "string.quote").push("string"),
                    rule("[a-z]+", "word"),
                ],
            )
            .mode(
                "string",
                vec![rule(r#"[^"]+"#, "string"), rule(r#"""#, "string.quote").pop()],
            ),
    );
    let document = Document::from_lines(["\"abc", "next"]);
    let tokens = t.tokenize_document(&document);

    assert_tokens(&tokens, &document)
        .covers_every_line()
        .line(0, |l| {
            l.sequence(&[("string.invalid", "\"abc")]);
        })
        .depth_after(0, 1)
        .line(1, |l| {
            l.sequence(&[("word", "next")]);
        });
}

#[test]
fn test_ignore_case() {
    let t = tokenizer(
        LanguageDefinition::new("p", "root")
            .ignore_case(true)
            .mode("root", vec![rule("mov", "keyword"), rule(r"\s+", "white")]),
    );
    check(&t, &["MOV mov"], 0, &[
        ("keyword", "MOV"),
        ("white", " "),
        ("keyword", "mov"),
    ]);
}

#[test]
fn test_pattern_library_references_nest() {
    let t = tokenizer(
        LanguageDefinition::new("p", "root")
            .pattern("digit", "[0-9]")
            .pattern("number", "@digit+")
            .mode("root", vec![rule("@number", "number"), rule(r"\@x", "at")]),
    );
    check(&t, &["12@x3"], 0, &[
        ("number", "12"),
        ("at", "@x"),
        ("number", "3"),
    ]);
}

#[test]
fn test_pattern_library_errors() {
    let cyclic = LanguageDefinition::new("p", "root")
        .pattern("a", "@b")
        .pattern("b", "x@a")
        .mode("root", vec![rule("@a", "a")]);
    assert!(matches!(
        Tokenizer::from_definition(&cyclic).unwrap_err(),
        ConfigError::PatternCycle(_)
    ));

    let unknown = LanguageDefinition::new("p", "root").mode("root", vec![rule("@nope", "a")]);
    assert!(matches!(
        Tokenizer::from_definition(&unknown).unwrap_err(),
        ConfigError::UnknownPattern { ref name, .. } if name == "nope"
    ));
}

#[test]
fn test_group_labels_fill_gaps_with_default_token() {
    let t = tokenizer(
        LanguageDefinition::new("p", "root")
            .default_token("source")
            .mode("root", vec![rule(r"(\w+)=(\w+);", ["key", "value"])]),
    );
    check(&t, &["a=1;"], 0, &[
        ("key", "a"),
        ("source", "="),
        ("value", "1"),
        ("source", ";"),
    ]);
}

#[test]
fn test_includes_keep_their_position() {
    let t = tokenizer(
        LanguageDefinition::new("p", "root")
            .mode(
                "root",
                vec![rule("ab", "before"), include("shared"), rule("a", "after")],
            )
            .mode("shared", vec![rule("a", "shared"), rule(r"\s+", "white")]),
    );
    check(&t, &["ab a"], 0, &[
        ("before", "ab"),
        ("white", " "),
        ("shared", "a"),
    ]);
}

#[test]
fn test_switch_to_carries_across_lines() {
    let t = tokenizer(
        LanguageDefinition::new("p", "root")
            .mode("root", vec![rule("<", "open").push("head")])
            .mode(
                "head",
                vec![rule("-", "dash").switch_to("body"), rule("[^-]", "head")],
            )
            .mode("body", vec![rule(">", "close").pop(), rule("[^>]", "body")]),
    );
    let lines = ["<a-", "b>"];
    check(&t, &lines, 0, &[("open", "<"), ("head", "a"), ("dash", "-")]);
    check(&t, &lines, 1, &[("body", "b"), ("close", ">")]);
}

#[test]
fn test_rematch_rescans_line_under_previous_mode() {
    let t = tokenizer(
        LanguageDefinition::new("p", "root")
            .mode(
                "root",
                vec![
                    rule("^[a-z]+:", "label"),
                    rule("[a-z]+", "opcode").push("operands"),
                    rule(r"\s+", "white"),
                ],
            )
            .mode(
                "operands",
                vec![
                    rule("^.*$", "").rematch(),
                    rule("[0-9]+", "number"),
                    rule(r"\s+", "white"),
                ],
            ),
    );
    let lines = [" add 1", "loop:", " add 1"];
    check(&t, &lines, 1, &[("label", "loop:")]);
    check(&t, &lines, 2, &[
        ("white", " "),
        ("opcode", "add"),
        ("white", " "),
        ("number", "1"),
    ]);
}

#[test]
fn test_base_mode_cannot_unwind() {
    for unwinding in [rule("x", "x").pop(), rule("x", "x").rematch()] {
        let definition = LanguageDefinition::new("p", "root").mode("root", vec![unwinding]);
        assert!(matches!(
            Tokenizer::from_definition(&definition).unwrap_err(),
            ConfigError::BaseModeUnwinds { .. }
        ));
    }
}

#[test]
fn test_session_feeds_lines_incrementally() {
    let t = tokenizer(
        LanguageDefinition::new("p", "root")
            .mode("root", vec![rule(r"\(", "open").push("inner"), rule(".", "text")])
            .mode("inner", vec![rule(r"\)", "close").pop(), rule(".", "inner")]),
    );
    let mut session = t.session();
    session.feed("a(");
    assert_eq!(session.state().describe(t.table()), vec!["root", "inner"]);

    let tokens = session.feed("b)c");
    let classes: Vec<&str> = tokens.iter().map(|t| t.class.as_str()).collect();
    assert_eq!(classes, vec!["inner", "close", "text"]);
    assert_eq!(session.into_state().depth(), 1);
}
