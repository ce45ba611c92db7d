//! # slx
//!
//! A front end and build planner for the slx document-build format: a
//! small declarative DSL describing a document's source files, their
//! roles (body text, figure, bibliography, header), and their
//! induce/depend relations.
//!
//! The pipeline is: raw text → character stream → lexer → token stream →
//! backtracking recursive-descent parser → AST, then the later stages
//! consume the AST ([`analysis`], [`recipe`]) or plain rendered text
//! ([`trim`]). The whole parse is a pure function of the input text: a
//! cursor is a plain index into an immutable stream, so speculative
//! sub-parses are integer copies and every failure is a returned
//! [`Diagnostic`], never an unwind.

pub mod analysis;
pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod recipe;
pub mod span;
pub mod stream;
pub mod trim;

pub use diagnostics::{Diagnostic, ParseResult};
pub use parser::parse;
