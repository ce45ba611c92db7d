//! Structured, causally chained diagnostics
//!
//! Every failure in the front end is a value of `Diagnostic`: a kind, a
//! message, an optional span, and an optional causing child diagnostic.
//! Failures propagate as plain return values; there is no global error
//! state and no unwinding. Rendering against the original text happens
//! here, innermost cause first, so the user sees both the specific inner
//! rule that failed and the outer expectation it violated.

use crate::span::Span;
use serde::Serialize;
use std::fmt;

/// A structured error with an optional causal chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: String,
    pub message: String,
    pub span: Option<Span>,
    pub cause: Option<Box<Diagnostic>>,
}

/// Result alias used by every lexer/parser/analysis function.
pub type ParseResult<T> = Result<T, Diagnostic>;

impl Diagnostic {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            span: None,
            cause: None,
        }
    }

    /// Attach the source range this diagnostic points at.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach the deeper diagnostic that explains this one.
    pub fn with_cause(mut self, cause: Diagnostic) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// The causal chain, outermost first.
    pub fn chain(&self) -> Vec<&Diagnostic> {
        let mut chain = vec![self];
        let mut cur = self;
        while let Some(cause) = cur.cause.as_deref() {
            chain.push(cause);
            cur = cause;
        }
        chain
    }

    /// Render the whole chain against the original text, innermost cause
    /// first: one header per link, plus a line excerpt with a caret
    /// underline when the span locates a line of the source.
    pub fn render(&self, source: &str) -> String {
        let mut out = String::new();
        for (i, diag) in self.chain().into_iter().rev().enumerate() {
            if i > 0 {
                out.push_str("caused the failure of:\n");
            }
            out.push_str(&format!("error[{}]: {}\n", diag.kind, diag.message));
            if let Some(span) = diag.span.filter(|s| !s.is_empty()) {
                out.push_str(&format!("  --> {}\n", span));
                if let Some(excerpt) = line_excerpt(source, span) {
                    out.push_str(&excerpt);
                }
            }
        }
        out
    }
}

/// The excerpt of the line where `span` starts, with a caret underline.
fn line_excerpt(source: &str, span: Span) -> Option<String> {
    let line = source.lines().nth(span.start.line)?;
    let width = line.chars().count();
    // Spans one past the end of the line (e.g. end-of-input) still get a
    // single caret after the last character.
    let from = span.start.col.min(width);
    let to = if span.end.line == span.start.line {
        span.end.col.min(width.max(from))
    } else {
        width.saturating_sub(1)
    };
    let carets = to.saturating_sub(from) + 1;
    let number = format!("{}", span.start.line);
    let mut out = String::new();
    out.push_str(&format!("{} | {}\n", number, line));
    out.push_str(&format!(
        "{} | {}{}\n",
        " ".repeat(number.len()),
        " ".repeat(from),
        "^".repeat(carets)
    ));
    Some(out)
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(span) = self.span.filter(|s| !s.is_empty()) {
            write!(f, " (at {})", span)?;
        }
        if let Some(cause) = &self.cause {
            write!(f, "\n  caused by {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Loc;

    fn span(line: usize, from: usize, to: usize) -> Span {
        Span::new(Loc::new(line, from), Loc::new(line, to))
    }

    #[test]
    fn test_chain_order() {
        let inner = Diagnostic::new("Inner", "deep failure");
        let outer = Diagnostic::new("Outer", "shallow failure").with_cause(inner);
        let kinds: Vec<&str> = outer.chain().iter().map(|d| d.kind.as_str()).collect();
        assert_eq!(kinds, ["Outer", "Inner"]);
    }

    #[test]
    fn test_render_innermost_first() {
        let inner = Diagnostic::new("Inner", "deep failure").with_span(span(0, 2, 3));
        let outer = Diagnostic::new("Outer", "shallow failure").with_cause(inner);
        let rendered = outer.render("abcdef");
        let inner_at = rendered.find("Inner").unwrap();
        let outer_at = rendered.find("Outer").unwrap();
        assert!(inner_at < outer_at);
        assert!(rendered.contains("caused the failure of:"));
    }

    #[test]
    fn test_caret_underline() {
        let diag = Diagnostic::new("Oops", "bad token").with_span(span(1, 4, 6));
        let rendered = diag.render("first\nsecond line\nthird");
        assert!(rendered.contains("1 | second line"));
        assert!(rendered.contains("  |     ^^^"));
    }

    #[test]
    fn test_caret_past_end_of_line() {
        // End-of-input spans point one column past the last character.
        let diag = Diagnostic::new("Oops", "ended early").with_span(span(0, 6, 6));
        let rendered = diag.render("abcdef");
        assert!(rendered.contains("0 | abcdef"));
        assert!(rendered.contains("  |       ^"));
    }

    #[test]
    fn test_display_mentions_cause() {
        let diag = Diagnostic::new("Outer", "outer message")
            .with_cause(Diagnostic::new("Inner", "inner message"));
        let text = diag.to_string();
        assert!(text.contains("Outer: outer message"));
        assert!(text.contains("caused by Inner: inner message"));
    }
}
