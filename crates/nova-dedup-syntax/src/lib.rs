//! Java syntax layer for the dedup engine.
//!
//! - [`parse`] turns a compilation unit into an arena-backed [`SyntaxTree`].
//!   Each node remembers the source text it was parsed from, and comments are
//!   attached to the statement or declaration they belong to.
//! - [`render`] prints a tree back to Java source. Nodes that were not edited
//!   are copied from the source as written; edited ones get a fixed layout
//!   (4-space indentation, one member per block).
//! - [`render_node`] prints a node in the fixed layout without comments, which
//!   is what code comparisons use.
//!
//! Constructs the parser does not understand (record patterns, for example)
//! are reported as [`ParseError`]s rather than skipped, so a file is either
//! fully understood or left alone.

mod lexer;
mod origin;
mod parser;
mod printer;
mod tree;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use lexer::{lex, lex_with_comments, Comment, Token, TokenKind};
pub use printer::{render, render_node};
pub use tree::{
    Annotation, AnnotationArgs, CatchClause, Declarator, FieldDecl, ImportDecl, LambdaParam,
    Literal, LiteralKind, LocalVarDecl, MethodDecl, Modifier, Modifiers, Node, NodeId, NodeKind,
    Param, SwitchCase, SyntaxTree, TypeDecl, TypeKind, Visibility,
};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message} at offset {offset}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset into the source text.
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Parses a Java compilation unit.
pub fn parse(text: &str) -> Result<SyntaxTree, ParseError> {
    let result = parser::parse(text);
    if let Err(err) = &result {
        tracing::debug!(
            target = "nova.dedup.syntax",
            offset = err.offset,
            message = %err.message,
            "failed to parse compilation unit"
        );
    }
    result
}
