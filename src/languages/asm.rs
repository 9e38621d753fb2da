//! Assembly listings as produced by compilers
//!
//!     One definition covers the dialects compilers print: GNU as (AT&T and Intel syntax),
//!     ARM (`|label|`, `#imm`), and MSVC listings (`PROC`/`ENDP`, backtick-quoted strings).
//!
//! Modes
//!
//!     root                 Start of a line: labels, constants, the opcode or directive.
//!     rest                 Operands after the opcode. Its first rule rematches the next
//!                          line back into root, so `rest` never outlives its line.
//!     comment              `/* ... */`, nesting.
//!     string               "double quoted"
//!     sstring              'single quoted'
//!     msvcstring           `backtick quoted', as MSVC prints them
//!     seg_dir_msvcstring   A backtick string opened in root, before any opcode; its close
//!                          hands the rest of the line to seg_dir_msvc_rest.
//!     whitespace           Shared whitespace and comment rules, included by the above.
//!
//!     Each string flavour checks for a missing close before it opens its mode, so a string
//!     running off the end of its line is one `string.invalid` token and never swallows the
//!     next line.
//!
//! Labels
//!
//!     MSVC does not end labels with a colon (`_main PROC`, `$SG123 DB 'x', 00H`). Such a
//!     line is recognised by a line-start rule that requires a non-blank first character and
//!     looks ahead for one of the data / procedure directives.

use crate::lexing::{include, rule, LanguageDefinition};

pub const NAME: &str = "asm";

const REGISTERS: &str = r"%?\b(?:r[0-9]+[dbw]?|[er]?(?:[abcd][xhl]|cs|fs|ds|ss|sp|bp|ip|sil?|dil?)|[xyz]mm[0-9]+|sp|fp|lr)\b";

const INTEL_OPERATORS: &str = r"\b(?:PTR|(?:D|Q|[XYZ]MM)?WORD|BYTE|OFFSET|FLAT)\b";

const ESCAPES: &str =
    r#"\\(?:[abfnrtv\\"'`]|x[0-9A-Fa-f]{1,4}|u[0-9A-Fa-f]{4}|U[0-9A-Fa-f]{8}|[0-7]{1,3})"#;

const CL_DIRECTIVES: &str =
    r"PROC|ENDP|SEGMENT|ENDS|DB|DW|DD|DQ|DF|DT|LABEL|COMM|EQU|TEXTEQU|STRUCT|RECORD|TYPEDEF";

pub fn definition() -> LanguageDefinition {
    LanguageDefinition::new(NAME, "root")
        .default_token("invalid")
        .pattern("registers", REGISTERS)
        .pattern("intel_operators", INTEL_OPERATORS)
        .pattern("escapes", ESCAPES)
        .pattern("cl_directives", CL_DIRECTIVES)
        .mode(
            "root",
            vec![
                // Error documents: <Compilation failed>
                rule(r"^<.*>$", "annotation"),
                // Label definitions
                rule(r"^[.a-zA-Z0-9_$?@].*:", "type.identifier"),
                rule(r#"^"(?:[^"\\]|\\.)*":"#, "type.identifier"),
                rule(r"^\s*\|[^|]*\|", "type.identifier"),
                rule(
                    r"^[^\s;][^\s]*(?=\s+(?:@cl_directives)(?:\s|$))",
                    "type.identifier",
                ),
                // Constant definitions
                rule(r"^[.a-zA-Z0-9_$?@][^=]*=", "type.identifier"),
                // Strings opening a line
                rule(r#""(?:[^"\\]|\\.)*\\?$"#, "string.invalid"),
                rule(r#"""#, "string.quote").push("string"),
                rule(r"'(?:[^'\\]|\\.)*\\?$", "string.invalid"),
                rule(r"'", "string.singlequote").push("sstring"),
                // Opcodes and directives
                rule(r"[.a-zA-Z_][.a-zA-Z_0-9]*", "keyword").push("rest"),
                // Braces at the start of a line, e.g. nvcc output
                rule(r"[(){}]", "operator").push("rest"),
                rule(r"`(?:[^'\\]|''|\\.)*\\?$", "string.invalid"),
                rule(r"`", "string.backtick").push("seg_dir_msvcstring"),
                include("whitespace"),
            ],
        )
        .mode(
            "rest",
            vec![
                rule(r"^.*$", "").rematch(),
                rule(r"@registers", "variable.predefined"),
                rule(r"@intel_operators", "annotation"),
                rule(r"/\*", "comment").push("comment"),
                rule(r"[{}<>()\[\]]", "delimiter.bracket"),
                // ARM-style label references
                rule(r"\|[^|]*\|?", "type.identifier"),
                rule(r"\d*\.\d+(?:[eE][-+]?\d+)?", "number.float"),
                rule(r"(?:\$|0[xX])[0-9a-fA-F]+", "number.hex"),
                rule(r"[0-9][0-9a-fA-F]*[hH]\b", "number.hex"),
                rule(r"\d+", "number"),
                // ARM immediates, which would otherwise read as comments
                rule(r"#-?\d+", "number"),
                rule(r"//.*$", "comment"),
                rule(r"[-+,*/!:&=^~]", "operator"),
                rule(r#""(?:[^"\\]|\\.)*\\?$"#, "string.invalid"),
                rule(r#"""#, "string.quote").push("string"),
                rule(r"`(?:[^'\\]|''|\\.)*\\?$", "string.invalid"),
                rule(r"`", "string.backtick").push("msvcstring"),
                rule(r"'[^\\']'", "string"),
                rule(r"(')(@escapes)(')", ["string", "string.escape", "string"]),
                rule(r"'(?:[^'\\]|\\.)*\\?$", "string.invalid"),
                rule(r"'", "string.singlequote").push("sstring"),
                // Anything else is a label reference. .NET puts backticks in identifiers.
                rule(r"%?[.?_$a-zA-Z@][.?_$a-zA-Z0-9@`]*", "type.identifier"),
                include("whitespace"),
            ],
        )
        .mode(
            "comment",
            vec![
                rule(r"[^/*]+", "comment"),
                rule(r"/\*", "comment").push_self(),
                rule(r"\*/", "comment").pop(),
                rule(r"[/*]", "comment"),
            ],
        )
        .mode(
            "string",
            vec![
                rule(r#"[^\\"]+"#, "string"),
                rule(r"@escapes", "string.escape"),
                rule(r"\\.", "string.escape.invalid"),
                rule(r#"""#, "string.quote").pop(),
            ],
        )
        .mode(
            "sstring",
            vec![
                rule(r"[^\\']+", "string"),
                rule(r"@escapes", "string.escape"),
                rule(r"\\.", "string.escape.invalid"),
                rule(r"'", "string.singlequote").pop(),
            ],
        )
        .mode(
            "msvcstring_common",
            vec![
                rule(r"[^\\']+", "string"),
                rule(r"@escapes", "string.escape"),
                rule(r"''", "string.escape"),
                rule(r"\\.", "string.escape.invalid"),
            ],
        )
        .mode(
            "msvcstring",
            vec![
                include("msvcstring_common"),
                rule(r"'", "string.backtick").pop(),
            ],
        )
        .mode(
            "seg_dir_msvcstring",
            vec![
                include("msvcstring_common"),
                rule(r"'", "string.backtick").switch_to("seg_dir_msvc_rest"),
            ],
        )
        .mode(
            "seg_dir_msvc_rest",
            vec![
                rule(r"^.*$", "").rematch(),
                rule(r";.*$", "comment"),
                rule(r"\s+", "white"),
                rule(r"[^;\s]+", "keyword"),
            ],
        )
        .mode(
            "whitespace",
            vec![
                rule(r"[ \t\r\n]+", "white"),
                rule(r"/\*", "comment").push("comment"),
                rule(r"//.*$", "comment"),
                rule(r"[#;\\@].*$", "comment"),
            ],
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexing::{RuleTable, Tokenizer};

    fn classify(line: &str) -> Vec<(String, String)> {
        let tokenizer = Tokenizer::from_definition(&definition()).unwrap();
        tokenizer
            .tokenize(&[line])
            .tokens()
            .iter()
            .filter(|t| t.class != "white")
            .map(|t| (t.class.to_string(), t.text(line).to_string()))
            .collect()
    }

    fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
        expected
            .iter()
            .map(|(c, t)| (c.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn test_definition_builds() {
        let table = RuleTable::build(&definition()).unwrap();
        assert_eq!(table.language(), NAME);
        assert_eq!(table.mode_name(table.base_mode()), "root");
        assert_eq!(table.default_token(), &"invalid");
    }

    #[test]
    fn test_intel_instruction() {
        assert_eq!(
            classify("        mov     eax, DWORD PTR [rbp-4]"),
            pairs(&[
                ("keyword", "mov"),
                ("variable.predefined", "eax"),
                ("operator", ","),
                ("annotation", "DWORD"),
                ("annotation", "PTR"),
                ("delimiter.bracket", "["),
                ("variable.predefined", "rbp"),
                ("operator", "-"),
                ("number", "4"),
                ("delimiter.bracket", "]"),
            ])
        );
    }

    #[test]
    fn test_label_and_comment() {
        assert_eq!(classify("main:"), pairs(&[("type.identifier", "main:")]));
        assert_eq!(
            classify("        ret  # done"),
            pairs(&[("keyword", "ret"), ("comment", "# done")])
        );
    }

    #[test]
    fn test_msvc_label_without_colon() {
        assert_eq!(
            classify("_main   PROC"),
            pairs(&[("type.identifier", "_main"), ("keyword", "PROC")])
        );
        assert_eq!(
            classify("$SG123 DB 'hi', 00H"),
            pairs(&[
                ("type.identifier", "$SG123"),
                ("keyword", "DB"),
                ("string.singlequote", "'"),
                ("string", "hi"),
                ("string.singlequote", "'"),
                ("operator", ","),
                ("number.hex", "00H"),
            ])
        );
    }

    #[test]
    fn test_cl_label_needs_non_blank_start() {
        assert_eq!(
            classify("  foo PROC"),
            pairs(&[("keyword", "foo"), ("type.identifier", "PROC")])
        );
    }
}
