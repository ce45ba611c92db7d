//! Immutable spanned streams and the backtracking cursor
//!
//! A `Stream` is an append-once, index-addressable sequence of spanned
//! elements: first characters, then tokens. A `Head` is a cheap cursor over
//! a stream; it is a borrowed stream reference plus an integer index, so
//! cloning one is a plain copy and never aliases mutable state.
//!
//! `Head::sub` is the single primitive every grammar production uses for
//! backtracking: it runs a sub-parse against a cloned cursor and commits
//! the advance only on success, so any failure inside a production rolls
//! back exactly that production's consumption.

use crate::span::{covering_span, Span, Spanned};

/// An immutable ordered sequence of spanned elements.
#[derive(Debug, Clone)]
pub struct Stream<T> {
    elems: Vec<Spanned<T>>,
}

impl<T> Stream<T> {
    pub fn new(elems: Vec<Spanned<T>>) -> Self {
        Self { elems }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Spanned<T>> {
        self.elems.get(idx)
    }

    pub fn last(&self) -> Option<&Spanned<T>> {
        self.elems.last()
    }

    /// The elements between two cursor positions, used to compute the span
    /// actually consumed by a sub-parse.
    pub fn slice(&self, from: usize, to: usize) -> &[Spanned<T>] {
        &self.elems[from.min(self.elems.len())..to.min(self.elems.len())]
    }

    /// A fresh cursor at the start of the stream.
    pub fn head(&self) -> Head<'_, T> {
        Head {
            stream: self,
            pos: 0,
        }
    }
}

impl<T> FromIterator<Spanned<T>> for Stream<T> {
    fn from_iter<I: IntoIterator<Item = Spanned<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A cursor over a `Stream`: a shared stream reference plus an index.
///
/// Copying a `Head` duplicates the index only; advancing the copy never
/// affects the original. Two heads may only be committed to one another
/// when they were forked from the same stream.
#[derive(Debug)]
pub struct Head<'a, T> {
    stream: &'a Stream<T>,
    pos: usize,
}

impl<'a, T> Clone for Head<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Head<'a, T> {}

impl<'a, T> Head<'a, T> {
    /// Current index into the stream.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Look `n` positions ahead without moving. Never fails: past the end
    /// of the stream this returns `None`.
    pub fn peek(&self, n: usize) -> Option<&'a Spanned<T>> {
        self.stream.get(self.pos + n)
    }

    /// Consume one position.
    pub fn bump(&mut self) {
        if self.pos < self.stream.len() {
            self.pos += 1;
        }
    }

    /// Consume and return the element under the cursor.
    pub fn take(&mut self) -> Option<&'a Spanned<T>> {
        let elem = self.peek(0);
        if elem.is_some() {
            self.pos += 1;
        }
        elem
    }

    /// Adopt the position of another head over the same stream.
    pub fn commit(&mut self, other: &Head<'a, T>) {
        self.pos = other.pos;
    }

    /// The union of the spans of all elements between this head and a
    /// further one.
    pub fn span_until(&self, other: &Head<'a, T>) -> Span {
        covering_span(self.stream.slice(self.pos, other.pos))
    }

    /// Run a sub-parse against a cloned cursor, committing on success.
    ///
    /// On `Ok` the cursor advances to the clone's final position and the
    /// result is wrapped in a `Spanned` covering everything the sub-parse
    /// consumed. On `Err` the clone is discarded and this cursor is
    /// untouched, however many elements the sub-parse had consumed.
    pub fn sub<R, E>(
        &mut self,
        f: impl FnOnce(&mut Head<'a, T>) -> Result<R, E>,
    ) -> Result<Spanned<R>, E> {
        let mut fork = *self;
        let data = f(&mut fork)?;
        let span = self.span_until(&fork);
        self.commit(&fork);
        Ok(Spanned::new(data, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Loc;

    fn stream_of(text: &str) -> Stream<char> {
        text.chars()
            .enumerate()
            .map(|(i, c)| Spanned::new(c, Span::unit(Loc::new(0, i))))
            .collect()
    }

    #[test]
    fn test_peek_does_not_move() {
        let s = stream_of("abc");
        let head = s.head();
        assert_eq!(head.peek(0).map(|c| c.data), Some('a'));
        assert_eq!(head.peek(2).map(|c| c.data), Some('c'));
        assert_eq!(head.peek(3).map(|c| c.data), None);
        assert_eq!(head.pos(), 0);
    }

    #[test]
    fn test_take_consumes() {
        let s = stream_of("ab");
        let mut head = s.head();
        assert_eq!(head.take().map(|c| c.data), Some('a'));
        assert_eq!(head.take().map(|c| c.data), Some('b'));
        assert_eq!(head.take().map(|c| c.data), None);
        assert_eq!(head.pos(), 2);
    }

    #[test]
    fn test_clone_is_independent() {
        let s = stream_of("abc");
        let head = s.head();
        let mut fork = head;
        fork.bump();
        fork.bump();
        assert_eq!(head.pos(), 0);
        assert_eq!(fork.pos(), 2);
    }

    #[test]
    fn test_sub_commits_on_success() {
        let s = stream_of("abc");
        let mut head = s.head();
        let got: Result<_, ()> = head.sub(|h| {
            h.bump();
            h.bump();
            Ok("two")
        });
        let got = got.unwrap();
        assert_eq!(got.data, "two");
        assert_eq!(got.span, Span::new(Loc::new(0, 0), Loc::new(0, 1)));
        assert_eq!(head.pos(), 2);
    }

    #[test]
    fn test_sub_rolls_back_on_failure() {
        let s = stream_of("abc");
        let mut head = s.head();
        head.bump();
        let got: Result<Spanned<()>, &str> = head.sub(|h| {
            h.bump();
            h.bump();
            Err("nope")
        });
        assert_eq!(got.unwrap_err(), "nope");
        assert_eq!(head.pos(), 1);
    }

    #[test]
    fn test_sub_of_nothing_has_empty_span() {
        let s = stream_of("abc");
        let mut head = s.head();
        let got: Result<_, ()> = head.sub(|_| Ok(()));
        assert!(got.unwrap().span.is_empty());
        assert_eq!(head.pos(), 0);
    }
}
