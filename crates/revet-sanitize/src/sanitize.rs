use regex::Regex;
use std::sync::OnceLock;

// Line-anchored on purpose: only top-level, single-line statements are
// rewritten. The replacement has exactly the byte length of the match, so
// every line and column position in the file survives sanitization.
fn dsl_import_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // import { fail, warn } from "revet";  /  export ... from 'revet'
            Regex::new(r#"(?m)^.*\bfrom[ \t]+['"]revet['"];?[ \t]*$"#).expect("static pattern"),
            // import "revet";
            Regex::new(r#"(?m)^[ \t]*import[ \t]+['"]revet['"];?[ \t]*$"#).expect("static pattern"),
            // const { fail } = require("revet");
            Regex::new(r#"(?m)^.*\brequire[ \t]*\([ \t]*['"]revet['"][ \t]*\);?[ \t]*$"#)
                .expect("static pattern"),
        ]
    })
}

/// Replace every top-level import of the `revet` DSL module with a
/// same-length comment.
///
/// Covers static-import and dynamic-require forms, single or double
/// quoting, with or without trailing semicolon. Absence of such statements
/// is a no-op. Idempotent: the rewritten lines match none of the patterns.
pub fn sanitize_dsl_imports(source: &str) -> String {
    let mut out = source.to_string();
    for pattern in dsl_import_patterns() {
        out = pattern
            .replace_all(&out, |caps: &regex::Captures<'_>| {
                let matched = caps.get(0).map_or("", |m| m.as_str());
                neutral_comment(matched.len())
            })
            .into_owned();
    }
    out
}

fn neutral_comment(len: usize) -> String {
    if len < 2 {
        return "-".repeat(len);
    }
    let mut comment = String::with_capacity(len);
    comment.push_str("//");
    comment.push_str(&"-".repeat(len - 2));
    comment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_import_forms_become_comments() {
        let cases = [
            r#"import { fail, warn } from "revet";"#,
            r#"import { fail } from 'revet'"#,
            r#"import revet from "revet";"#,
            r#"import "revet";"#,
            r#"const { message } = require("revet");"#,
            r#"var api = require('revet')"#,
        ];
        for case in cases {
            let out = sanitize_dsl_imports(case);
            assert!(out.starts_with("//"), "not commented: {case} -> {out}");
            assert_eq!(out.len(), case.len(), "length changed for: {case}");
        }
    }

    #[test]
    fn unrelated_imports_are_untouched() {
        let source = "import lodash from \"lodash\";\nconst fs = require('fs');\n";
        assert_eq!(sanitize_dsl_imports(source), source);
    }

    #[test]
    fn only_the_dsl_lines_change_and_lines_are_preserved() {
        let source = "import { fail } from 'revet';\nfail(\"too short\")\n";
        let out = sanitize_dsl_imports(source);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("//"));
        assert_eq!(lines[1], "fail(\"too short\")");
    }

    #[test]
    fn no_dsl_import_is_a_noop() {
        let source = "message('hello')\n";
        assert_eq!(sanitize_dsl_imports(source), source);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn arb_body_line() -> impl Strategy<Value = String> {
            prop_oneof![
                Just("fail(\"too short\")".to_string()),
                Just("warn('big diff', { sticky: true })".to_string()),
                Just("const x = 1;".to_string()),
                Just(String::new()),
                "[ -~]{0,40}".prop_map(|s| s.replace("revet", "rivet")),
            ]
        }

        fn arb_dsl_import() -> impl Strategy<Value = String> {
            prop_oneof![
                Just("import { fail } from 'revet';".to_string()),
                Just(r#"import { fail, warn } from "revet""#.to_string()),
                Just("const { fail } = require('revet');".to_string()),
                Just("import \"revet\";".to_string()),
            ]
        }

        proptest! {
            #[test]
            fn sanitization_preserves_length_and_line_count(
                before in proptest::collection::vec(arb_body_line(), 0..5),
                import in arb_dsl_import(),
                after in proptest::collection::vec(arb_body_line(), 0..5),
            ) {
                let mut lines = before;
                lines.push(import);
                lines.extend(after);
                let source = lines.join("\n");

                let once = sanitize_dsl_imports(&source);
                prop_assert_eq!(once.len(), source.len());
                prop_assert_eq!(once.lines().count(), source.lines().count());
            }

            #[test]
            fn sanitization_is_idempotent(
                lines in proptest::collection::vec(
                    prop_oneof![arb_body_line(), arb_dsl_import()], 0..8),
            ) {
                let source = lines.join("\n");
                let once = sanitize_dsl_imports(&source);
                let twice = sanitize_dsl_imports(&once);
                prop_assert_eq!(once, twice);
            }
        }
    }
}
