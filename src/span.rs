//! Source locations, spans, and spanned values
//!
//! Every character and token carries a `Span` telling where in the original
//! text it came from. Spans form a lattice under `until`: the empty span is
//! the identity element, so the span of a composite construct can be built
//! by folding the spans of its parts in any order.

use serde::Serialize;
use std::fmt;

/// A position in source text, zero-based line and column.
///
/// Ordering is lexicographic, line major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Loc {
    pub line: usize,
    pub col: usize,
}

impl Loc {
    /// Smallest representable position, identity for `max`.
    pub const MIN: Loc = Loc { line: 0, col: 0 };
    /// Largest representable position, identity for `min`.
    pub const MAX: Loc = Loc {
        line: usize::MAX,
        col: usize::MAX,
    };

    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// Position after consuming one non-newline character.
    pub fn newcol(self) -> Loc {
        Loc::new(self.line, self.col + 1)
    }

    /// Position after consuming a newline.
    pub fn newline(self) -> Loc {
        Loc::new(self.line + 1, 0)
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A source range `[start, end]`, inclusive on both ends.
///
/// The empty span has `start = Loc::MAX` and `end = Loc::MIN`, which makes
/// it the identity of `until`: unioning it with any real span yields that
/// span unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: Loc,
    pub end: Loc,
}

impl Span {
    pub fn new(start: Loc, end: Loc) -> Self {
        Self { start, end }
    }

    /// The identity span: covers nothing, unions to the other operand.
    pub fn empty() -> Self {
        Self {
            start: Loc::MAX,
            end: Loc::MIN,
        }
    }

    /// A span covering a single position.
    pub fn unit(loc: Loc) -> Self {
        Self {
            start: loc,
            end: loc,
        }
    }

    /// True for spans that cover no position at all.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Extend this span to also cover `other` (componentwise min/max).
    ///
    /// Total on all inputs: unrelated ranges just produce the covering
    /// range, and the empty span is a true identity.
    pub fn until(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Union of an arbitrary collection of spans.
    pub fn union_of(spans: impl IntoIterator<Item = Span>) -> Span {
        spans.into_iter().fold(Span::empty(), Span::until)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "(empty)")
        } else {
            write!(f, "{}--{}", self.start, self.end)
        }
    }
}

/// A datum together with the span it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Spanned<T> {
    pub data: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(data: T, span: Span) -> Self {
        Self { data, span }
    }

    /// Transform the datum, keeping the provenance.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            data: f(self.data),
            span: self.span,
        }
    }
}

/// The span covering a whole list of spanned values, independent of `T`.
pub fn covering_span<T>(items: &[Spanned<T>]) -> Span {
    Span::union_of(items.iter().map(|i| i.span))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loc_ordering_is_line_major() {
        assert!(Loc::new(0, 9) < Loc::new(1, 0));
        assert!(Loc::new(2, 3) < Loc::new(2, 4));
        assert!(Loc::new(5, 0) == Loc::new(5, 0));
    }

    #[test]
    fn test_loc_advance() {
        let loc = Loc::new(3, 7);
        assert_eq!(loc.newcol(), Loc::new(3, 8));
        assert_eq!(loc.newline(), Loc::new(4, 0));
    }

    #[test]
    fn test_empty_span_is_identity() {
        let real = Span::new(Loc::new(1, 2), Loc::new(1, 8));
        assert_eq!(Span::empty().until(real), real);
        assert_eq!(real.until(Span::empty()), real);
        assert!(Span::empty().is_empty());
        assert!(!real.is_empty());
    }

    #[test]
    fn test_union_is_commutative() {
        let a = Span::new(Loc::new(0, 4), Loc::new(0, 9));
        let b = Span::new(Loc::new(2, 0), Loc::new(2, 1));
        assert_eq!(a.until(b), b.until(a));
        assert_eq!(a.until(b), Span::new(Loc::new(0, 4), Loc::new(2, 1)));
    }

    #[test]
    fn test_union_of_list() {
        assert_eq!(Span::union_of([]), Span::empty());
        let s = Span::new(Loc::new(1, 1), Loc::new(1, 5));
        assert_eq!(Span::union_of([s]), s);
    }

    #[test]
    fn test_covering_span_ignores_data() {
        let items = vec![
            Spanned::new('a', Span::unit(Loc::new(0, 0))),
            Spanned::new('b', Span::unit(Loc::new(0, 4))),
        ];
        assert_eq!(
            covering_span(&items),
            Span::new(Loc::new(0, 0), Loc::new(0, 4))
        );
    }

    #[test]
    fn test_display() {
        let s = Span::new(Loc::new(1, 2), Loc::new(3, 4));
        assert_eq!(s.to_string(), "1:2--3:4");
        assert_eq!(Span::empty().to_string(), "(empty)");
    }
}
