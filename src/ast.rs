//! AST node types for the slx DSL
//!
//! One closed sum type per grammar nonterminal, so every consumer matches
//! exhaustively and the compiler rejects unhandled variants. Nodes are
//! built bottom-up as productions succeed and never mutated afterwards;
//! every node's span is exactly the union of the spans of the tokens it
//! consumed.

use crate::span::{Span, Spanned};
use serde::Serialize;
use std::fmt;

/// A name, either from an unquoted run or a quoted literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ident {
    pub name: Spanned<String>,
}

impl Ident {
    pub fn as_str(&self) -> &str {
        &self.name.data
    }
}

/// The parse root: the ordered top-level declarations of a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefList {
    pub defs: Vec<Spanned<TopLevel>>,
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TopLevel {
    Def(Def),
    Target(Target),
}

/// A standalone declared build target: `[name];`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub name: Spanned<Ident>,
}

/// A named binding of files and entries: `$name = items;`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Def {
    pub name: Spanned<Ident>,
    pub value: Spanned<ItemList>,
}

/// A non-empty list of items; the empty-list production does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemList {
    pub items: Vec<Spanned<ListItem>>,
}

/// One element of an item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ListItem {
    Item(Item),
    /// A reference to a previously bound `Def`: `$name`.
    Expand(Expand),
}

/// A leaf entry, or a branch scoping a nested list via `entry :: list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub entry: Spanned<Entry>,
    pub tail: Option<Spanned<ItemList>>,
}

/// A reference to a previously bound `Def`, resolved by a later stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expand {
    pub name: Spanned<Ident>,
}

/// A named item with its tags partitioned by kind.
///
/// A tag is classified once by its leading marker and never reclassified;
/// each list preserves arrival order, and the three lists are disjoint by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: Spanned<Ident>,
    pub labels: Vec<Spanned<Tag>>,
    pub induces: Vec<Spanned<Tag>>,
    pub depends: Vec<Spanned<Tag>>,
}

impl Entry {
    /// Partition a mixed tag sequence by kind, keeping arrival order.
    pub fn new(name: Spanned<Ident>, tags: Vec<Spanned<Tag>>) -> Self {
        let mut entry = Entry {
            name,
            labels: Vec::new(),
            induces: Vec::new(),
            depends: Vec::new(),
        };
        for tag in tags {
            match tag.data.kind {
                TagKind::Label => entry.labels.push(tag),
                TagKind::Induce => entry.induces.push(tag),
                TagKind::Depend => entry.depends.push(tag),
            }
        }
        entry
    }
}

/// The marker a tag was introduced with: `:`, `<-`, or `->`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TagKind {
    Label,
    Induce,
    Depend,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Label => "Label",
            TagKind::Induce => "Induce",
            TagKind::Depend => "Depend",
        }
    }
}

/// A classified tag: marker kind, name, and optional parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub kind: TagKind,
    pub name: Spanned<Ident>,
    pub params: Spanned<Params>,
}

/// A possibly empty parenthesized parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Params {
    pub vals: Vec<Spanned<Ident>>,
}

impl Params {
    pub fn empty() -> Spanned<Params> {
        Spanned::new(Params { vals: Vec::new() }, Span::empty())
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.name.data)
    }
}

impl fmt::Display for DefList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DefList {{")?;
        for def in &self.defs {
            writeln!(f, "{}", indent(&def.data.to_string()))?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for TopLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopLevel::Def(def) => write!(f, "{}", def),
            TopLevel::Target(target) => write!(f, "{}", target),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target {}", self.name.data)
    }
}

impl fmt::Display for Def {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Def {} := {}", self.name.data, self.value.data)
    }
}

impl fmt::Display for ItemList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ItemList {{")?;
        for item in &self.items {
            writeln!(f, "{}", indent(&item.data.to_string()))?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for ListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListItem::Item(item) => write!(f, "{}", item),
            ListItem::Expand(expand) => write!(f, "{}", expand),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tail {
            None => write!(f, "Leaf ({})", self.entry.data),
            Some(tail) => write!(
                f,
                "Branch ({}) ::\n{}",
                self.entry.data,
                indent(&tail.data.to_string())
            ),
        }
    }
}

impl fmt::Display for Expand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expand({})", self.name.data)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entry({})", self.name.data)?;
        for tag in self
            .labels
            .iter()
            .chain(self.induces.iter())
            .chain(self.depends.iter())
        {
            write!(f, "\n{}", indent(&tag.data.to_string()))?;
        }
        Ok(())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.as_str(), self.name.data)?;
        if !self.params.data.vals.is_empty() {
            write!(f, " {}", self.params.data)?;
        }
        Ok(())
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Params({})",
            self.vals
                .iter()
                .map(|v| v.data.name.data.as_str())
                .collect::<Vec<_>>()
                .join(",")
        )
    }
}
