//! Tree queries shared by the validator and the strategies.

use std::collections::BTreeSet;

use nova_dedup_syntax::{
    parse, render_node, Literal, LiteralKind, NodeId, NodeKind, ParseError, SyntaxTree,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::RefactorError;

const SNIPPET_CLASS: &str = "__Snippet";
const SNIPPET_METHOD: &str = "__snippet";
const LITERAL_MASK: &str = "__LITERAL__";

static JAVA_LANG_TYPES: &[&str] = &[
    "Object", "String", "StringBuilder", "StringBuffer", "CharSequence", "Boolean", "Byte",
    "Character", "Short", "Integer", "Long", "Float", "Double", "Number", "Math", "StrictMath",
    "System", "Thread", "Runnable", "Iterable", "Comparable", "AutoCloseable", "Class", "Enum",
    "Record", "Void", "Exception", "RuntimeException", "Error", "Throwable",
    "IllegalArgumentException", "IllegalStateException", "NullPointerException",
    "UnsupportedOperationException", "IndexOutOfBoundsException", "ArithmeticException",
    "ClassCastException", "NumberFormatException", "InterruptedException", "CloneNotSupportedException",
    "Override", "Deprecated", "SuppressWarnings", "FunctionalInterface", "SafeVarargs",
];

pub(crate) fn is_java_lang_type(name: &str) -> bool {
    JAVA_LANG_TYPES.contains(&name)
}

/// Removes all whitespace.
pub(crate) fn normalized(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `java.util.List<String>[]` becomes `List`.
pub(crate) fn simple_type_name(ty: &str) -> &str {
    let base = ty.split('<').next().unwrap_or(ty).trim();
    let base = base.trim_end_matches("...").trim_end_matches("[]").trim();
    base.rsplit('.').next().unwrap_or(base)
}

static TYPE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*(?:\.[A-Za-z_$][A-Za-z0-9_$]*)*").expect("valid regex"));

/// Identifier tokens of a type string, qualified names kept whole.
pub(crate) fn type_identifiers(ty: &str) -> Vec<String> {
    TYPE_TOKEN
        .find_iter(ty)
        .map(|m| m.as_str())
        .filter(|token| !matches!(*token, "extends" | "super" | "final"))
        .map(str::to_string)
        .collect()
}

/// Splits `parseUserName` into `["parse", "User", "Name"]`.
pub(crate) fn camel_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = name.chars().collect();
    for (i, ch) in chars.iter().copied().enumerate() {
        if ch == '_' || ch == '$' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        let boundary = ch.is_uppercase()
            && !current.is_empty()
            && (chars[i - 1].is_lowercase()
                || chars[i - 1].is_ascii_digit()
                || chars.get(i + 1).is_some_and(|next| next.is_lowercase()));
        if boundary {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first == '$' || unicode_ident::is_xid_start(first))
        && chars.all(|c| c == '$' || unicode_ident::is_xid_continue(c))
        && !is_java_keyword(name)
}

fn is_java_keyword(name: &str) -> bool {
    matches!(
        name,
        "abstract" | "assert" | "boolean" | "break" | "byte" | "case" | "catch" | "char"
            | "class" | "const" | "continue" | "default" | "do" | "double" | "else" | "enum"
            | "extends" | "final" | "finally" | "float" | "for" | "goto" | "if" | "implements"
            | "import" | "instanceof" | "int" | "interface" | "long" | "native" | "new"
            | "package" | "private" | "protected" | "public" | "return" | "short" | "static"
            | "strictfp" | "super" | "switch" | "synchronized" | "this" | "throw" | "throws"
            | "transient" | "try" | "void" | "volatile" | "while" | "true" | "false" | "null"
            | "var" | "record" | "yield"
    )
}

pub(crate) fn callable_body(tree: &SyntaxTree, callable: NodeId) -> Option<NodeId> {
    tree.method(callable).and_then(|decl| decl.body)
}

/// Every node under `roots`, pre-order, roots included.
pub(crate) fn nodes_under(tree: &SyntaxTree, roots: &[NodeId]) -> Vec<NodeId> {
    roots.iter().flat_map(|root| tree.descendants(*root)).collect()
}

/// Non-null literals under `roots`, in source order.
pub(crate) fn literals_in(tree: &SyntaxTree, roots: &[NodeId]) -> Vec<NodeId> {
    nodes_under(tree, roots)
        .into_iter()
        .filter(|id| {
            matches!(tree.kind(*id), NodeKind::Literal(lit) if lit.kind != LiteralKind::Null)
        })
        .collect()
}

pub(crate) fn literal(tree: &SyntaxTree, id: NodeId) -> Option<&Literal> {
    match tree.kind(id) {
        NodeKind::Literal(lit) => Some(lit),
        _ => None,
    }
}

/// Bare names written by assignments or `++`/`--` under `roots`.
pub(crate) fn mutated_names(tree: &SyntaxTree, roots: &[NodeId]) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for id in nodes_under(tree, roots) {
        let written = match tree.kind(id) {
            NodeKind::Assign { target, .. } => Some(*target),
            NodeKind::Unary { op, operand, .. } if op == "++" || op == "--" => Some(*operand),
            _ => None,
        };
        if let Some(NodeKind::Name { ident }) = written.map(|t| tree.kind(t)) {
            out.insert(ident.clone());
        }
    }
    out
}

/// Names declared anywhere under `roots` (locals, loop variables, catch
/// parameters, lambda parameters, pattern bindings).
pub(crate) fn declared_names(tree: &SyntaxTree, roots: &[NodeId]) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for id in nodes_under(tree, roots) {
        match tree.kind(id) {
            NodeKind::LocalVar(decl) => {
                out.extend(decl.declarators.iter().map(|d| d.name.clone()));
            }
            NodeKind::ForEach { name, .. } => {
                out.insert(name.clone());
            }
            NodeKind::Try { catches, .. } => {
                out.extend(catches.iter().map(|c| c.name.clone()));
            }
            NodeKind::Lambda { params, .. } => {
                out.extend(params.iter().map(|p| p.name.clone()));
            }
            NodeKind::InstanceOf {
                binding: Some(binding),
                ..
            } => {
                out.insert(binding.clone());
            }
            NodeKind::TypePattern { name, .. } => {
                out.insert(name.clone());
            }
            _ => {}
        }
    }
    out
}

/// `(name, type)` of every local declared directly by one of `statements`.
pub(crate) fn top_level_locals(tree: &SyntaxTree, statements: &[NodeId]) -> Vec<(String, String)> {
    statements
        .iter()
        .filter_map(|id| match tree.kind(*id) {
            NodeKind::LocalVar(decl) => Some(decl),
            _ => None,
        })
        .flat_map(|decl| {
            decl.declarators
                .iter()
                .map(|d| (d.name.clone(), decl.ty.clone()))
        })
        .collect()
}

/// Parameters and locals of a callable with their declared types.
pub(crate) fn callable_scope(tree: &SyntaxTree, callable: NodeId) -> Vec<(String, String)> {
    let Some(decl) = tree.method(callable) else {
        return Vec::new();
    };
    let mut out: Vec<(String, String)> = decl
        .params
        .iter()
        .map(|p| (p.name.clone(), p.effective_type()))
        .collect();
    let Some(body) = decl.body else {
        return out;
    };
    for id in tree.descendants(body) {
        match tree.kind(id) {
            NodeKind::LocalVar(local) => {
                out.extend(
                    local
                        .declarators
                        .iter()
                        .map(|d| (d.name.clone(), local.ty.clone())),
                );
            }
            NodeKind::ForEach { ty, name, .. } | NodeKind::TypePattern { ty, name } => {
                out.push((name.clone(), ty.clone()));
            }
            NodeKind::Try { catches, .. } => {
                for clause in catches {
                    out.push((clause.name.clone(), clause.types.join(" | ")));
                }
            }
            _ => {}
        }
    }
    out
}

/// Names read or written as bare identifiers under `roots`.
pub(crate) fn referenced_names(tree: &SyntaxTree, roots: &[NodeId]) -> BTreeSet<String> {
    nodes_under(tree, roots)
        .into_iter()
        .filter_map(|id| match tree.kind(id) {
            NodeKind::Name { ident } => Some(ident.clone()),
            _ => None,
        })
        .collect()
}

/// Whitespace-free rendering of `statements`.
pub(crate) fn statements_text(tree: &SyntaxTree, statements: &[NodeId]) -> String {
    statements
        .iter()
        .map(|id| normalized(&render_node(tree, *id)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rendering of `statements` with every non-null literal replaced by a mask.
pub(crate) fn masked_text(tree: &SyntaxTree, statements: &[NodeId]) -> String {
    let mut scratch = tree.clone();
    for id in literals_in(tree, statements) {
        if let NodeKind::Literal(lit) = scratch.kind_mut(id) {
            lit.text = LITERAL_MASK.to_string();
        }
    }
    statements_text(&scratch, statements)
}

/// True if a `return` (outside lambdas and anonymous classes) or a
/// `break`/`continue` that leaves the run appears under `statements`.
///
/// An unlabeled `break` inside a `switch` stays local; `continue` there still
/// targets an enclosing loop. Labeled jumps always count as escaping.
pub(crate) fn contains_escaping_jump(tree: &SyntaxTree, statements: &[NodeId]) -> bool {
    #[derive(Clone, Copy)]
    struct Depth {
        loops: usize,
        switches: usize,
    }

    fn walk(tree: &SyntaxTree, id: NodeId, depth: Depth) -> bool {
        match tree.kind(id) {
            NodeKind::Return { .. } => return true,
            NodeKind::Break { label } => {
                if label.is_some() || depth.loops + depth.switches == 0 {
                    return true;
                }
            }
            NodeKind::Continue { label } => {
                if label.is_some() || depth.loops == 0 {
                    return true;
                }
            }
            NodeKind::Lambda { .. } | NodeKind::New { body: Some(_), .. } => return false,
            _ => {}
        }
        let depth = match tree.kind(id) {
            NodeKind::While { .. }
            | NodeKind::DoWhile { .. }
            | NodeKind::For { .. }
            | NodeKind::ForEach { .. } => Depth {
                loops: depth.loops + 1,
                ..depth
            },
            NodeKind::Switch { .. } => Depth {
                switches: depth.switches + 1,
                ..depth
            },
            _ => depth,
        };
        tree.children(id)
            .into_iter()
            .any(|child| walk(tree, child, depth))
    }
    let top = Depth {
        loops: 0,
        switches: 0,
    };
    statements.iter().any(|id| walk(tree, *id, top))
}

fn snippet_error(message: String) -> RefactorError {
    RefactorError::Parse(ParseError::new(message, 0))
}

/// Parses one member declaration and copies it, detached, into `dest`.
pub(crate) fn import_member(dest: &mut SyntaxTree, text: &str) -> Result<NodeId, RefactorError> {
    let source = format!("class {SNIPPET_CLASS} {{\n{text}\n}}\n");
    let scratch = parse(&source)?;
    let member = scratch
        .top_level_types()
        .first()
        .and_then(|ty| scratch.type_decl(*ty))
        .and_then(|decl| decl.members.first().copied())
        .ok_or_else(|| snippet_error(format!("no member in `{text}`")))?;
    Ok(import_generated(dest, &scratch, member))
}

/// Parses one statement and copies it, detached, into `dest`.
pub(crate) fn import_statement(dest: &mut SyntaxTree, text: &str) -> Result<NodeId, RefactorError> {
    let source = format!("class {SNIPPET_CLASS} {{\nvoid {SNIPPET_METHOD}() {{\n{text}\n}}\n}}\n");
    let scratch = parse(&source)?;
    let statement = scratch
        .top_level_types()
        .first()
        .and_then(|ty| scratch.methods_of(*ty).first().copied())
        .and_then(|method| callable_body(&scratch, method))
        .and_then(|body| scratch.block_statements(body).first().copied())
        .ok_or_else(|| snippet_error(format!("no statement in `{text}`")))?;
    Ok(import_generated(dest, &scratch, statement))
}

/// Generated code has no layout worth keeping.
fn import_generated(dest: &mut SyntaxTree, scratch: &SyntaxTree, id: NodeId) -> NodeId {
    let copy = dest.import_subtree(scratch, id);
    dest.clear_origin(copy);
    copy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> (SyntaxTree, Vec<NodeId>, NodeId) {
        let tree = parse(source).unwrap();
        let class = tree.top_level_types()[0];
        let method = tree.methods_of(class)[0];
        let body = callable_body(&tree, method).unwrap();
        let statements = tree.block_statements(body).to_vec();
        (tree, statements, method)
    }

    #[test]
    fn camel_words_split_acronyms() {
        assert_eq!(camel_words("parseUserName"), vec!["parse", "User", "Name"]);
        assert_eq!(camel_words("loadHTTPConfig"), vec!["load", "HTTP", "Config"]);
        assert_eq!(camel_words("OrderServiceTest"), vec!["Order", "Service", "Test"]);
    }

    #[test]
    fn simple_type_name_strips_packages_and_generics() {
        assert_eq!(simple_type_name("java.util.List<String>"), "List");
        assert_eq!(simple_type_name("int[]"), "int");
        assert_eq!(simple_type_name("String..."), "String");
        assert_eq!(
            type_identifiers("Map<String, java.util.List<? extends Foo>>"),
            vec!["Map", "String", "java.util.List", "Foo"]
        );
    }

    #[test]
    fn mutation_and_declaration_sets() {
        let (tree, statements, method) = run(
            "class A { void m(int p) { int x = 1; total += x; count++; this.f = 2; for (String s : xs) { s.trim(); } } }",
        );
        let mutated = mutated_names(&tree, &statements);
        assert_eq!(
            mutated.into_iter().collect::<Vec<_>>(),
            vec!["count".to_string(), "total".to_string()]
        );
        let declared = declared_names(&tree, &statements);
        assert!(declared.contains("x") && declared.contains("s"));
        let scope = callable_scope(&tree, method);
        assert_eq!(scope[0], ("p".to_string(), "int".to_string()));
        assert!(scope.contains(&("x".to_string(), "int".to_string())));
    }

    #[test]
    fn masked_text_ignores_literal_values() {
        let (a, sa, _) = run("class A { void m() { check(\"a\", 1); } }");
        let (b, sb, _) = run("class B { void m() { check(\"b\", 2); } }");
        assert_eq!(masked_text(&a, &sa), masked_text(&b, &sb));
        assert_ne!(statements_text(&a, &sa), statements_text(&b, &sb));
    }

    #[test]
    fn jumps_inside_nested_loops_and_lambdas_stay_local() {
        let (tree, statements, _) = run(
            "class A { void m() { for (int i = 0; i < 3; i++) { if (i == 1) { continue; } } run(() -> { return; }); } }",
        );
        assert!(!contains_escaping_jump(&tree, &statements));
        let (tree, statements, _) = run("class A { void m() { if (x) { return; } } }");
        assert!(contains_escaping_jump(&tree, &statements));
    }

    #[test]
    fn switch_breaks_stay_local_but_continue_escapes() {
        let (tree, statements, _) = run(
            "class A { void m() { switch (k) { case 1: a(); break; default: b(); } } }",
        );
        assert!(!contains_escaping_jump(&tree, &statements));
        let (tree, statements, _) =
            run("class A { void m() { switch (k) { case 1: continue; default: b(); } } }");
        assert!(contains_escaping_jump(&tree, &statements));
        let (tree, statements, _) =
            run("class A { void m() { outer: while (x) { while (y) { break outer; } } } }");
        assert!(contains_escaping_jump(&tree, &statements));
    }

    #[test]
    fn identifiers_follow_java_rules() {
        assert!(is_valid_identifier("größe"));
        assert!(is_valid_identifier("$cache"));
        assert!(is_valid_identifier("_x1"));
        assert!(!is_valid_identifier("1x"));
        assert!(!is_valid_identifier("class"));
        assert!(!is_valid_identifier("a-b"));
    }

    #[test]
    fn snippets_import_detached_nodes() {
        let mut tree = SyntaxTree::new_compilation_unit(None);
        let stmt = import_statement(&mut tree, "helper(a, 1);").unwrap();
        assert_eq!(tree.parent(stmt), None);
        assert_eq!(render_node(&tree, stmt), "helper(a, 1);");
        let call = import_statement(&mut tree, "return Util.run(x);").unwrap();
        assert_eq!(render_node(&tree, call), "return Util.run(x);");
        let unicode = import_statement(&mut tree, "größe = $rate * _base;").unwrap();
        assert_eq!(render_node(&tree, unicode), "größe = $rate * _base;");
        let member = import_member(&mut tree, "private static int two() { return 2; }").unwrap();
        assert!(tree.method(member).is_some());
    }
}
