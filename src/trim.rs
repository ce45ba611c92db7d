//! Conditional-compilation trimming of rendered text
//!
//! A line-oriented preprocessor that runs over already-rendered text,
//! independent of the lexer and parser. Directive lines select which
//! plain lines survive, against a set of enabled feature names:
//!
//! ```text
//! #IF draft
//! \usepackage{showkeys}
//! #ELIF review
//! \usepackage{lineno}
//! #ELSE
//! % final layout
//! #ENDIF
//! ```
//!
//! Directives nest; a directive line never survives into the output.

use crate::diagnostics::{Diagnostic, ParseResult};
use crate::span::{Loc, Span};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*#(IF|ELIF|ELSE|ENDIF)\b[ \t]*([A-Za-z0-9_.-]*)[ \t]*$")
        .expect("directive pattern is valid")
});

/// One open `#IF` block while scanning.
struct Frame {
    /// Line the block was opened on, for unterminated-block blame.
    opened_at: Span,
    /// Whether the surrounding context keeps lines at all.
    parent_live: bool,
    /// Whether any branch so far was taken.
    taken: bool,
    /// Whether the current branch keeps lines.
    live: bool,
    /// Whether `#ELSE` was already seen.
    else_seen: bool,
}

fn line_span(lineno: usize, line: &str) -> Span {
    let width = line.chars().count();
    Span::new(
        Loc::new(lineno, 0),
        Loc::new(lineno, width.saturating_sub(1)),
    )
}

/// Trim `text` down to the lines selected by `features`.
///
/// Text without directives passes through unchanged.
pub fn trim(text: &str, features: &HashSet<String>) -> ParseResult<String> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut kept: Vec<&str> = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let span = line_span(lineno, line);
        let captures = match DIRECTIVE.captures(line) {
            Some(captures) => captures,
            None => {
                if stack.last().map_or(true, |f| f.live) {
                    kept.push(line);
                }
                continue;
            }
        };
        let word = &captures[1];
        let feature = captures.get(2).map_or("", |m| m.as_str());
        match word {
            "IF" => {
                let enabled = feature_enabled(feature, features, span)?;
                let parent_live = stack.last().map_or(true, |f| f.live);
                stack.push(Frame {
                    opened_at: span,
                    parent_live,
                    taken: enabled,
                    live: parent_live && enabled,
                    else_seen: false,
                });
            }
            "ELIF" => {
                let enabled = feature_enabled(feature, features, span)?;
                let frame = stack.last_mut().ok_or_else(|| {
                    Diagnostic::new("Unmatched Directive", "#ELIF outside of any #IF block")
                        .with_span(span)
                })?;
                if frame.else_seen {
                    return Err(Diagnostic::new(
                        "Misordered Directive",
                        "#ELIF cannot follow #ELSE in the same block",
                    )
                    .with_span(span));
                }
                frame.live = frame.parent_live && !frame.taken && enabled;
                frame.taken = frame.taken || enabled;
            }
            "ELSE" => {
                let frame = stack.last_mut().ok_or_else(|| {
                    Diagnostic::new("Unmatched Directive", "#ELSE outside of any #IF block")
                        .with_span(span)
                })?;
                if frame.else_seen {
                    return Err(Diagnostic::new(
                        "Misordered Directive",
                        "#ELSE appears twice in the same block",
                    )
                    .with_span(span));
                }
                frame.else_seen = true;
                frame.live = frame.parent_live && !frame.taken;
                frame.taken = true;
            }
            "ENDIF" => {
                stack.pop().ok_or_else(|| {
                    Diagnostic::new("Unmatched Directive", "#ENDIF outside of any #IF block")
                        .with_span(span)
                })?;
            }
            _ => unreachable!("the directive pattern admits no other word"),
        }
    }
    if let Some(frame) = stack.last() {
        return Err(Diagnostic::new(
            "Unterminated Block",
            "this #IF block is never closed by #ENDIF",
        )
        .with_span(frame.opened_at));
    }
    let mut out = kept.join("\n");
    if text.ends_with('\n') && !out.is_empty() {
        out.push('\n');
    }
    Ok(out)
}

fn feature_enabled(
    feature: &str,
    features: &HashSet<String>,
    span: Span,
) -> ParseResult<bool> {
    if feature.is_empty() {
        return Err(Diagnostic::new(
            "Missing Feature Name",
            "#IF and #ELIF must name the feature they test",
        )
        .with_span(span));
    }
    Ok(features.contains(feature))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn trimmed(text: &str, names: &[&str]) -> String {
        trim(text, &features(names)).unwrap()
    }

    #[test]
    fn test_plain_text_passes_through() {
        let text = "alpha\nbeta\n";
        assert_eq!(trimmed(text, &[]), text);
    }

    #[test]
    fn test_if_keeps_enabled_branch() {
        let text = "#IF draft\nkeep\n#ENDIF\n";
        assert_eq!(trimmed(text, &["draft"]), "keep\n");
        assert_eq!(trimmed(text, &[]), "");
    }

    #[test]
    fn test_elif_else_chain() {
        let text = "#IF a\none\n#ELIF b\ntwo\n#ELSE\nthree\n#ENDIF\n";
        assert_eq!(trimmed(text, &["a"]), "one\n");
        assert_eq!(trimmed(text, &["b"]), "two\n");
        assert_eq!(trimmed(text, &["a", "b"]), "one\n");
        assert_eq!(trimmed(text, &[]), "three\n");
    }

    #[test]
    fn test_nesting() {
        let text = "#IF outer\na\n#IF inner\nb\n#ENDIF\nc\n#ENDIF\n";
        assert_eq!(trimmed(text, &["outer", "inner"]), "a\nb\nc\n");
        assert_eq!(trimmed(text, &["outer"]), "a\nc\n");
        assert_eq!(trimmed(text, &["inner"]), "");
    }

    #[test]
    fn test_digit_feature_names() {
        let text = "#IF v2\nkeep\n#ENDIF\n";
        assert_eq!(trimmed(text, &["v2"]), "keep\n");
        assert_eq!(trimmed(text, &["v1"]), "");
    }

    #[test]
    fn test_unmatched_endif() {
        let err = trim("#ENDIF\n", &features(&[])).unwrap_err();
        assert_eq!(err.kind, "Unmatched Directive");
    }

    #[test]
    fn test_unterminated_if_blames_the_opening() {
        let err = trim("text\n#IF a\nmore\n", &features(&[])).unwrap_err();
        assert_eq!(err.kind, "Unterminated Block");
        assert_eq!(err.span.unwrap().start, Loc::new(1, 0));
    }

    #[test]
    fn test_else_twice() {
        let err = trim("#IF a\n#ELSE\n#ELSE\n#ENDIF\n", &features(&[])).unwrap_err();
        assert_eq!(err.kind, "Misordered Directive");
    }

    #[test]
    fn test_elif_after_else() {
        let err = trim("#IF a\n#ELSE\n#ELIF b\n#ENDIF\n", &features(&[])).unwrap_err();
        assert_eq!(err.kind, "Misordered Directive");
    }

    #[test]
    fn test_if_without_feature_name() {
        let err = trim("#IF\n#ENDIF\n", &features(&[])).unwrap_err();
        assert_eq!(err.kind, "Missing Feature Name");
    }

    #[test]
    fn test_non_directive_hash_lines_survive() {
        // Only the four directive words are special; ordinary comments
        // and LaTeX-style lines starting with '#' pass through.
        let text = "# just a comment\n#IFDEFINED is not a directive\n";
        assert_eq!(trimmed(text, &[]), text);
    }

    #[test]
    fn test_nested_block_in_dead_branch_stays_dead() {
        let text = "#IF off\n#IF on\nx\n#ENDIF\n#ENDIF\n";
        assert_eq!(trimmed(text, &["on"]), "");
    }
}
