//! Lexer for the slx format
//!
//! The lexer consumes a character `Stream` through a `Head`, one token per
//! iteration, and produces a `Stream` of spanned tokens. Whitespace and
//! `#` line comments produce no token. Multi-character symbols are matched
//! before single-character symbols with a shared prefix: `::` before `:`,
//! and `->` / `<-` require their second character (a lone `-` or `<` at the
//! start of a token is a lexical error, never a fallback).

use crate::diagnostics::{Diagnostic, ParseResult};
use crate::span::{Loc, Span, Spanned};
use crate::stream::{Head, Stream};
use serde::Serialize;
use std::fmt;

/// The fixed symbols of the slx punctuation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Symbol {
    /// `$`
    Declare,
    /// `{`
    OpenBrace,
    /// `}`
    CloseBrace,
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `[`
    OpenBracket,
    /// `]`
    CloseBracket,
    /// `=`
    Equal,
    /// `->`
    Right,
    /// `<-`
    Left,
    /// `,`
    Comma,
    /// `;`
    Semi,
    /// `::`
    Scope,
    /// `:`
    Colon,
}

impl Symbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::Declare => "$",
            Symbol::OpenBrace => "{",
            Symbol::CloseBrace => "}",
            Symbol::OpenParen => "(",
            Symbol::CloseParen => ")",
            Symbol::OpenBracket => "[",
            Symbol::CloseBracket => "]",
            Symbol::Equal => "=",
            Symbol::Right => "->",
            Symbol::Left => "<-",
            Symbol::Comma => ",",
            Symbol::Semi => ";",
            Symbol::Scope => "::",
            Symbol::Colon => ":",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lexed token: a fixed symbol, a name, or the end-of-input sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Token {
    Sym(Symbol),
    Ident(String),
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Sym(sym) => write!(f, "'{}'", sym),
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::End => write!(f, "end of input"),
        }
    }
}

/// Characters that may appear in an unquoted identifier.
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Split a text into a stream of characters with per-character spans.
pub fn chars_of_text(text: &str) -> Stream<char> {
    let mut loc = Loc::new(0, 0);
    let mut chars = Vec::new();
    for c in text.chars() {
        chars.push(Spanned::new(c, Span::unit(loc)));
        loc = if c == '\n' { loc.newline() } else { loc.newcol() };
    }
    Stream::new(chars)
}

/// Lex a whole text: characters, then tokens.
pub fn lex(text: &str) -> ParseResult<Stream<Token>> {
    tokens_of_chars(&chars_of_text(text))
}

/// Turn a character stream into a token stream.
///
/// Every emitted token is wrapped in a `Spanned` covering exactly the
/// characters it consumed. A single `End` sentinel is appended, spanning
/// one column past the last character of the input.
pub fn tokens_of_chars(chars: &Stream<char>) -> ParseResult<Stream<Token>> {
    let mut head = chars.head();
    let mut tokens = Vec::new();
    loop {
        skip_trivia(&mut head);
        if head.peek(0).is_none() {
            break;
        }
        tokens.push(head.sub(scan_token)?);
    }
    let end_loc = match chars.last() {
        Some(c) => c.span.end.newcol(),
        None => Loc::new(0, 0),
    };
    tokens.push(Spanned::new(Token::End, Span::unit(end_loc)));
    Ok(Stream::new(tokens))
}

/// Skip runs of whitespace and `#` line comments.
fn skip_trivia(head: &mut Head<'_, char>) {
    while let Some(c) = head.peek(0) {
        match c.data {
            ' ' | '\t' | '\n' => head.bump(),
            '#' => {
                while head.peek(0).is_some_and(|c| c.data != '\n') {
                    head.bump();
                }
            }
            _ => break,
        }
    }
}

/// Scan exactly one token. The caller guarantees the head is on a
/// non-trivia character.
fn scan_token(head: &mut Head<'_, char>) -> ParseResult<Token> {
    let first = match head.take() {
        Some(first) => first,
        None => {
            return Err(Diagnostic::new(
                "Premature End",
                "no character left to begin a token",
            ))
        }
    };
    let sym = match first.data {
        '$' => Symbol::Declare,
        '{' => Symbol::OpenBrace,
        '}' => Symbol::CloseBrace,
        '(' => Symbol::OpenParen,
        ')' => Symbol::CloseParen,
        '[' => Symbol::OpenBracket,
        ']' => Symbol::CloseBracket,
        '=' => Symbol::Equal,
        ',' => Symbol::Comma,
        ';' => Symbol::Semi,
        ':' => {
            if head.peek(0).is_some_and(|c| c.data == ':') {
                head.bump();
                Symbol::Scope
            } else {
                Symbol::Colon
            }
        }
        '-' => {
            expect_second(head, first, '>')?;
            Symbol::Right
        }
        '<' => {
            expect_second(head, first, '-')?;
            Symbol::Left
        }
        '\'' => return scan_quoted(head, first),
        c if is_name_char(c) => return Ok(scan_ident(head, c)),
        c => {
            return Err(Diagnostic::new(
                "Unknown Character",
                format!("'{}' does not begin any valid token", c),
            )
            .with_span(first.span))
        }
    };
    Ok(Token::Sym(sym))
}

/// Require the second character of a two-character symbol. Absence or a
/// wrong character is a lexical error, not a fallback to a shorter token.
fn expect_second(
    head: &mut Head<'_, char>,
    first: &Spanned<char>,
    second: char,
) -> ParseResult<()> {
    match head.peek(0) {
        Some(c) if c.data == second => {
            head.bump();
            Ok(())
        }
        Some(c) => Err(Diagnostic::new(
            "Unterminated Symbol",
            format!("'{}' must be followed by '{}', found '{}'", first.data, second, c.data),
        )
        .with_span(first.span.until(c.span))),
        None => Err(Diagnostic::new(
            "Unterminated Symbol",
            format!("'{}' must be followed by '{}'", first.data, second),
        )
        .with_span(first.span)),
    }
}

/// Scan the remainder of an unquoted identifier run.
///
/// A `-` that begins a `->` sequence terminates the run: the dash belongs
/// to the arrow, not the name.
fn scan_ident(head: &mut Head<'_, char>, first: char) -> Token {
    let mut name = String::new();
    name.push(first);
    while let Some(c) = head.peek(0) {
        if !is_name_char(c.data) {
            break;
        }
        if c.data == '-' && head.peek(1).is_some_and(|n| n.data == '>') {
            break;
        }
        name.push(c.data);
        head.bump();
    }
    Token::Ident(name)
}

/// Scan a quoted literal identifier. `quote` is the already-consumed
/// opening `'`; `\` escapes the next character verbatim.
fn scan_quoted(head: &mut Head<'_, char>, quote: &Spanned<char>) -> ParseResult<Token> {
    let mut name = String::new();
    loop {
        match head.take() {
            None => {
                return Err(Diagnostic::new(
                    "Unterminated Literal",
                    "the closing quote of this literal is missing",
                )
                .with_span(quote.span))
            }
            Some(c) if c.data == '\'' => break,
            Some(c) if c.data == '\\' => match head.take() {
                Some(escaped) => name.push(escaped.data),
                None => {
                    return Err(Diagnostic::new(
                        "Unterminated Escape",
                        "the input ends in the middle of an escape sequence",
                    )
                    .with_span(c.span))
                }
            },
            Some(c) => name.push(c.data),
        }
    }
    Ok(Token::Ident(name))
}
