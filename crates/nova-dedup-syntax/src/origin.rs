//! Source spans and comment placement for freshly parsed trees.
//!
//! Every node the parser tracked gets the byte span of its tokens. Comments
//! are then hung on the statement or declaration they belong to:
//!
//! - a comment on the same line after a node's last token trails that node;
//! - a comment right before a closing brace dangles inside that block;
//! - any other comment leads the next statement or declaration.
//!
//! When several nodes start (or end) at the same token the widest one wins, so
//! a Javadoc belongs to the method and not to its return type.

use std::collections::HashMap;
use std::sync::Arc;

use crate::lexer::{line_indent, Comment, Token, TokenKind};
use crate::tree::{NodeId, NodeKind, Span, SyntaxTree, Trivia};

pub(crate) struct Layout<'a> {
    pub(crate) text: &'a str,
    pub(crate) tokens: &'a [Token],
    pub(crate) comments: &'a [Comment],
    /// Token range `[start, end)` per node.
    pub(crate) ranges: &'a [Option<(usize, usize)>],
    /// Closing-brace token per block or type body.
    pub(crate) closers: &'a [(usize, NodeId)],
}

enum Place {
    Leading,
    Trailing,
    Dangling,
}

/// Nodes printed on lines of their own, which are the ones comments attach to.
fn is_line_node(kind: &NodeKind) -> bool {
    kind.is_statement()
        || matches!(
            kind,
            NodeKind::CompilationUnit { .. }
                | NodeKind::Import(_)
                | NodeKind::TypeDecl(_)
                | NodeKind::Field(_)
                | NodeKind::Method(_)
                | NodeKind::Initializer { .. }
                | NodeKind::EnumConstant { .. }
        )
}

fn widest(map: &mut HashMap<usize, (NodeId, usize)>, token: usize, id: NodeId, len: usize) {
    let slot = map.entry(token).or_insert((id, len));
    if len >= slot.1 {
        *slot = (id, len);
    }
}

/// True if at least one empty line separates `offset` from the code before it.
fn blank_line_before(text: &str, offset: usize) -> bool {
    text[..offset]
        .chars()
        .rev()
        .take_while(|ch| ch.is_whitespace())
        .filter(|ch| *ch == '\n')
        .count()
        >= 2
}

pub(crate) fn attach(tree: &mut SyntaxTree, layout: &Layout<'_>) {
    let tokens = layout.tokens;
    let root = tree.root();
    let ranges: Vec<Option<(usize, usize)>> = layout
        .ranges
        .iter()
        .map(|range| range.filter(|(start, end)| end > start))
        .collect();

    let mut starts = HashMap::new();
    let mut ends = HashMap::new();
    let mut trivia: HashMap<NodeId, Trivia> = HashMap::new();
    for (index, range) in ranges.iter().enumerate() {
        let Some((start, end)) = *range else {
            continue;
        };
        let id = NodeId::from_raw(index as u32);
        if !is_line_node(tree.kind(id)) {
            continue;
        }
        widest(&mut starts, start, id, end - start);
        // Comments after the last type trail that type, not the file.
        if id != root {
            widest(&mut ends, end - 1, id, end - start);
        }
        trivia.insert(id, Trivia::default());
    }
    let closers: HashMap<usize, NodeId> = layout.closers.iter().copied().collect();

    let mut first_leading: HashMap<NodeId, usize> = HashMap::new();
    for comment in layout.comments {
        let next = tokens.partition_point(|token| token.offset < comment.end);
        let same_line = next.checked_sub(1).and_then(|prev| {
            let gap = &layout.text[tokens[prev].end()..comment.offset];
            (!gap.contains('\n')).then_some(prev)
        });
        let slot = same_line
            .and_then(|prev| ends.get(&prev))
            .map(|(id, _)| (*id, Place::Trailing))
            .or_else(|| {
                if tokens.get(next).is_some_and(|t| t.kind == TokenKind::Eof) {
                    Some((root, Place::Dangling))
                } else {
                    closers.get(&next).map(|id| (*id, Place::Dangling))
                }
            })
            .or_else(|| starts.get(&next).map(|(id, _)| (*id, Place::Leading)));
        let Some((id, place)) = slot else {
            continue;
        };
        let entry = trivia.entry(id).or_default();
        match place {
            Place::Leading => {
                first_leading.entry(id).or_insert(comment.offset);
                entry.leading.push(comment.text.clone());
            }
            Place::Trailing => match &mut entry.trailing {
                Some(trailing) => {
                    trailing.push(' ');
                    trailing.push_str(&comment.text);
                }
                None => entry.trailing = Some(comment.text.clone()),
            },
            Place::Dangling => entry.dangling.push(comment.text.clone()),
        }
    }

    for (id, entry) in trivia.iter_mut() {
        let Some((start, _)) = ranges[id.idx()] else {
            continue;
        };
        entry.blank_line_before = if *id == root {
            // Whether the file header stands apart from the code.
            (!entry.leading.is_empty())
                .then(|| blank_line_before(layout.text, tokens[start].offset))
        } else if start == 0
            || (tokens[start - 1].kind == TokenKind::Punct && tokens[start - 1].text == "{")
        {
            None
        } else {
            let offset = first_leading
                .get(id)
                .copied()
                .unwrap_or(tokens[start].offset);
            Some(blank_line_before(layout.text, offset))
        };
    }

    let source: Arc<str> = Arc::from(layout.text);
    for (index, range) in ranges.iter().enumerate() {
        let id = NodeId::from_raw(index as u32);
        let span = range.map(|(start, end)| {
            let offset = tokens[start].offset;
            Span {
                source: Arc::clone(&source),
                start: offset,
                end: tokens[end - 1].end(),
                indent: line_indent(layout.text, offset),
            }
        });
        tree.set_origin(id, span, trivia.remove(&id));
    }
}
