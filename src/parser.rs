//! Recursive-descent grammar for the slx DSL
//!
//! One function per production, each taking a token `Head` and returning
//! either the spanned AST fragment or a `Diagnostic`. Compound productions
//! call `Head::sub` on their sub-productions, so any inner failure rolls
//! back exactly the span attempted; a caller that tries alternatives in
//! sequence retries on the same original cursor position.
//!
//! Grammar:
//!
//! ```text
//! DefList  := (Def | Target)* <end>
//! Def      := '$' Ident '=' ItemList ';'
//! Target   := '[' Ident ']' ';'
//! ItemList := '{' Item (',' Item)* (',')? '}' | Item
//! Item     := '$' Ident | Entry ('::' ItemList)?
//! Entry    := Ident Tag*
//! Tag      := (':' | '<-' | '->') Ident Params?
//! Params   := '(' (Ident (',' Ident)*)? ')'
//! ```
//!
//! The only retried alternatives are the two top-level ones (`Target`,
//! else `Def`) and the optional continuations: a trailing `Tag*` run, the
//! `':: ItemList'` tail, and a trailing comma. When an optional
//! continuation's absence is indistinguishable from a deeper error, the
//! diagnostic of the failed continuation attempt is kept pending and
//! attached as the cause of whatever expectation fails next, so the
//! deepest meaningful blame surfaces in rendering.

use crate::ast::{
    Def, DefList, Entry, Expand, Ident, Item, ItemList, ListItem, Params, Tag, TagKind, Target,
    TopLevel,
};
use crate::diagnostics::{Diagnostic, ParseResult};
use crate::lexer::{self, Symbol, Token};
use crate::span::Spanned;
use crate::stream::{Head, Stream};

type TokenHead<'a> = Head<'a, Token>;

/// A diagnostic that would explain a failure if one occurs immediately
/// after a best-effort partial match.
type Pending = Option<Diagnostic>;

/// Lex and parse a whole source text.
pub fn parse(text: &str) -> ParseResult<Spanned<DefList>> {
    let tokens = lexer::lex(text)?;
    parse_tokens(&tokens)
}

/// Parse an already-lexed token stream.
pub fn parse_tokens(tokens: &Stream<Token>) -> ParseResult<Spanned<DefList>> {
    let mut head = tokens.head();
    head.sub(def_list)
}

/// Unwrap a spanned `(value, pending)` pair produced through `Head::sub`.
fn split<T>(spanned: Spanned<(T, Pending)>) -> (Spanned<T>, Pending) {
    let Spanned {
        data: (data, pending),
        span,
    } = spanned;
    (Spanned::new(data, span), pending)
}

/// Attach a pending best-effort diagnostic as the cause of `err`.
fn attach(err: Diagnostic, pending: Pending) -> Diagnostic {
    match pending {
        Some(inner) => err.with_cause(inner),
        None => err,
    }
}

/// Consume a required symbol, or fail naming what was expected.
fn expect_sym(h: &mut TokenHead, sym: Symbol, ctx: &str) -> ParseResult<()> {
    match h.take() {
        Some(tok) if tok.data == Token::Sym(sym) => Ok(()),
        Some(tok) => Err(Diagnostic::new(
            "Expected Symbol",
            format!("expected '{}' {}, found {}", sym, ctx, tok.data),
        )
        .with_span(tok.span)),
        None => Err(Diagnostic::new(
            "Premature End",
            format!("expected '{}' {}", sym, ctx),
        )),
    }
}

fn peek_is_sym(h: &TokenHead, sym: Symbol) -> bool {
    h.peek(0).is_some_and(|tok| tok.data == Token::Sym(sym))
}

/// `Ident`: a single identifier token.
fn ident(h: &mut TokenHead) -> ParseResult<Ident> {
    match h.take() {
        Some(tok) => match &tok.data {
            Token::Ident(name) => Ok(Ident {
                name: Spanned::new(name.clone(), tok.span),
            }),
            other => Err(Diagnostic::new(
                "Expected Identifier",
                format!("expected an identifier, found {}", other),
            )
            .with_span(tok.span)),
        },
        None => Err(Diagnostic::new(
            "Premature End",
            "expected an identifier",
        )),
    }
}

/// `DefList := (Def | Target)*` up to (but not consuming) the end token.
fn def_list(h: &mut TokenHead) -> ParseResult<DefList> {
    let mut defs = Vec::new();
    loop {
        if h.peek(0).map_or(true, |tok| tok.data == Token::End) {
            break;
        }
        let target_err = match h.sub(|h| target(h).map(TopLevel::Target)) {
            Ok(t) => {
                defs.push(t);
                continue;
            }
            Err(err) => err,
        };
        let def_err = match h.sub(|h| def(h).map(TopLevel::Def)) {
            Ok(d) => {
                defs.push(d);
                continue;
            }
            Err(err) => err,
        };
        // Neither alternative matched. When one of them was genuinely
        // entered (the leading token is its opener), its own diagnostic
        // is the meaningful one and bubbles up unchanged; otherwise
        // nothing here could apply and the blame is this production's.
        let err = match h.peek(0).map(|tok| &tok.data) {
            Some(Token::Sym(Symbol::Declare)) => def_err,
            Some(Token::Sym(Symbol::OpenBracket)) => target_err,
            _ => {
                let mut diag = Diagnostic::new(
                    "Expected Declaration",
                    "expected a definition ('$') or a target ('[')",
                );
                if let Some(tok) = h.peek(0) {
                    diag = diag.with_span(tok.span);
                }
                diag
            }
        };
        return Err(err);
    }
    Ok(DefList { defs })
}

/// `Target := '[' Ident ']' ';'`
fn target(h: &mut TokenHead) -> ParseResult<Target> {
    expect_sym(h, Symbol::OpenBracket, "to declare a target")?;
    let name = h.sub(ident)?;
    expect_sym(h, Symbol::CloseBracket, "after the target name")?;
    expect_sym(h, Symbol::Semi, "at the end of a target declaration")?;
    Ok(Target { name })
}

/// `Def := '$' Ident '=' ItemList ';'`
fn def(h: &mut TokenHead) -> ParseResult<Def> {
    expect_sym(h, Symbol::Declare, "to open a definition")?;
    let name = h.sub(ident)?;
    expect_sym(h, Symbol::Equal, "after the definition name")?;
    let (value, pending) = item_list(h)?;
    if let Err(err) = expect_sym(h, Symbol::Semi, "at the end of a definition") {
        return Err(attach(err, pending));
    }
    Ok(Def { name, value })
}

/// `ItemList := '{' Item (',' Item)* (',')? '}' | Item`
fn item_list(h: &mut TokenHead) -> ParseResult<(Spanned<ItemList>, Pending)> {
    h.sub(item_list_inner).map(split)
}

fn item_list_inner(h: &mut TokenHead) -> ParseResult<(ItemList, Pending)> {
    if !peek_is_sym(h, Symbol::OpenBrace) {
        // Non-brace form: exactly one item.
        let (item, pending) = item(h)?;
        return Ok((ItemList { items: vec![item] }, pending));
    }
    h.bump();
    let mut items = Vec::new();
    let (first, mut pending) = item(h)?;
    items.push(first);
    loop {
        if peek_is_sym(h, Symbol::CloseBrace) {
            h.bump();
            break;
        }
        if let Err(err) = expect_sym(h, Symbol::Comma, "between items") {
            return Err(attach(err, pending));
        }
        // Trailing comma before the closing brace.
        if peek_is_sym(h, Symbol::CloseBrace) {
            h.bump();
            break;
        }
        let (next, next_pending) = item(h)?;
        items.push(next);
        pending = next_pending;
    }
    // The brace closed the list; anything pending inside no longer
    // explains a failure at the caller's level.
    Ok((ItemList { items }, None))
}

/// `Item := '$' Ident | Entry ('::' ItemList)?`
fn item(h: &mut TokenHead) -> ParseResult<(Spanned<ListItem>, Pending)> {
    h.sub(item_inner).map(split)
}

fn item_inner(h: &mut TokenHead) -> ParseResult<(ListItem, Pending)> {
    if peek_is_sym(h, Symbol::Declare) {
        h.bump();
        let name = h.sub(ident)?;
        return Ok((ListItem::Expand(Expand { name }), None));
    }
    let (entry, pending) = entry(h)?;
    if peek_is_sym(h, Symbol::Scope) {
        h.bump();
        let (tail, tail_pending) = item_list(h)?;
        Ok((
            ListItem::Item(Item {
                entry,
                tail: Some(tail),
            }),
            tail_pending,
        ))
    } else {
        Ok((ListItem::Item(Item { entry, tail: None }), pending))
    }
}

/// `Entry := Ident Tag*`
///
/// The tag run is greedy and best-effort: the attempt that ends it is
/// kept as the pending diagnostic, because "this continuation is absent"
/// and "this continuation is broken" look the same from here.
fn entry(h: &mut TokenHead) -> ParseResult<(Spanned<Entry>, Pending)> {
    h.sub(entry_inner).map(split)
}

fn entry_inner(h: &mut TokenHead) -> ParseResult<(Entry, Pending)> {
    let name = h.sub(ident)?;
    let mut tags = Vec::new();
    let pending = loop {
        match h.sub(tag) {
            Ok(t) => tags.push(t),
            Err(err) => break Some(err),
        }
    };
    Ok((Entry::new(name, tags), pending))
}

/// `Tag := (':' | '<-' | '->') Ident Params?`
fn tag(h: &mut TokenHead) -> ParseResult<Tag> {
    let kind = match h.take() {
        Some(tok) => match tok.data {
            Token::Sym(Symbol::Colon) => TagKind::Label,
            Token::Sym(Symbol::Left) => TagKind::Induce,
            Token::Sym(Symbol::Right) => TagKind::Depend,
            ref other => {
                return Err(Diagnostic::new(
                    "Expected Tag",
                    format!(
                        "expected a tag marker (':', '<-' or '->'), found {}",
                        other
                    ),
                )
                .with_span(tok.span))
            }
        },
        None => {
            return Err(Diagnostic::new(
                "Premature End",
                "expected a tag marker (':', '<-' or '->')",
            ))
        }
    };
    let name = h.sub(ident)?;
    let params = if peek_is_sym(h, Symbol::OpenParen) {
        h.sub(params)?
    } else {
        Params::empty()
    };
    Ok(Tag { kind, name, params })
}

/// `Params := '(' (Ident (',' Ident)*)? ')'`
fn params(h: &mut TokenHead) -> ParseResult<Params> {
    expect_sym(h, Symbol::OpenParen, "to open a parameter list")?;
    let mut vals = Vec::new();
    if peek_is_sym(h, Symbol::CloseParen) {
        h.bump();
        return Ok(Params { vals });
    }
    loop {
        vals.push(h.sub(ident)?);
        match h.take() {
            Some(tok) if tok.data == Token::Sym(Symbol::Comma) => continue,
            Some(tok) if tok.data == Token::Sym(Symbol::CloseParen) => break,
            Some(tok) => {
                return Err(Diagnostic::new(
                    "Expected Symbol",
                    format!("expected ',' or ')' in a parameter list, found {}", tok.data),
                )
                .with_span(tok.span))
            }
            None => {
                return Err(Diagnostic::new(
                    "Premature End",
                    "expected ',' or ')' in a parameter list",
                ))
            }
        }
    }
    Ok(Params { vals })
}
