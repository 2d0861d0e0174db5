//! Post-pass removing private methods nothing refers to anymore.
//!
//! A private method survives if either holds:
//!
//! - its name is used somewhere in the file: a call, a method reference, or a
//!   string in a method-source annotation;
//! - it carries one of the preserved framework annotations.
//!
//! Usage is collected per file, not per class, and by name only. A call in one
//! top-level or nested class therefore keeps a same-named private method alive
//! in every other class of the file, and any overload keeps all of them. This
//! errs on the side of keeping code.
//!
//! One pass per call; helpers that become unused only after this pass are left
//! for the next one. Untouched parts of the file keep their comments and
//! layout.

use std::collections::BTreeSet;

use nova_dedup_syntax::{
    parse, render, AnnotationArgs, LiteralKind, Modifier, NodeId, NodeKind, SyntaxTree,
};

use crate::config::DeadCodeConfig;
use crate::error::RefactorError;

/// Removes dead private methods from `tree`, returning their names.
pub fn collect_dead_code(tree: &mut SyntaxTree, config: &DeadCodeConfig) -> Vec<String> {
    let used = used_method_names(tree, config);
    let mut doomed: Vec<(NodeId, NodeId, String)> = Vec::new();
    for class in tree.all_types() {
        for method in tree.methods_of(class) {
            let Some(decl) = tree.method(method) else {
                continue;
            };
            if decl.is_constructor() || !decl.modifiers.has(Modifier::Private) {
                continue;
            }
            let preserved = config
                .preserved_annotations
                .iter()
                .any(|name| tree.has_annotation(method, name));
            if used.contains(&decl.name) || preserved {
                continue;
            }
            doomed.push((class, method, decl.name.clone()));
        }
    }

    let mut removed = Vec::new();
    for (class, method, name) in doomed {
        if tree.remove_member(class, method) {
            tracing::debug!(
                target = "nova.dedup.dead_code",
                method = %name,
                "removed unused private method"
            );
            removed.push(name);
        }
    }
    removed
}

/// Text-level wrapper around [`collect_dead_code`].
///
/// The text is returned unchanged when nothing was removed.
pub fn remove_dead_code(
    text: &str,
    config: &DeadCodeConfig,
) -> Result<(String, Vec<String>), RefactorError> {
    let mut tree = parse(text)?;
    let removed = collect_dead_code(&mut tree, config);
    if removed.is_empty() {
        return Ok((text.to_string(), removed));
    }
    Ok((render(&tree), removed))
}

fn used_method_names(tree: &SyntaxTree, config: &DeadCodeConfig) -> BTreeSet<String> {
    let mut used = BTreeSet::new();
    for id in tree.descendants(tree.root()) {
        match tree.kind(id) {
            NodeKind::MethodCall { name, .. } | NodeKind::MethodRef { name, .. } => {
                used.insert(name.clone());
            }
            NodeKind::Annotation(annotation)
                if annotation.simple_name().ends_with(&config.method_source_marker) =>
            {
                match &annotation.args {
                    // `@MethodSource` alone names a factory with the test's own name.
                    AnnotationArgs::None => {
                        if let Some(decl) = tree.parent(id).and_then(|p| tree.method(p)) {
                            used.insert(decl.name.clone());
                        }
                    }
                    AnnotationArgs::Value(value) => collect_strings(tree, *value, &mut used),
                    AnnotationArgs::Named(pairs) => {
                        for (_, value) in pairs {
                            collect_strings(tree, *value, &mut used);
                        }
                    }
                }
            }
            _ => {}
        }
    }
    used
}

/// String literals of a single value or array initializer, unquoted.
///
/// `Type#method` references contribute the method part.
fn collect_strings(tree: &SyntaxTree, value: NodeId, out: &mut BTreeSet<String>) {
    match tree.kind(value) {
        NodeKind::Literal(lit) if lit.kind == LiteralKind::String => {
            let text = lit.text.trim_matches('"');
            let method = text.rsplit('#').next().unwrap_or(text);
            out.insert(method.to_string());
        }
        NodeKind::ArrayInit { elements } => {
            for element in elements {
                collect_strings(tree, *element, out);
            }
        }
        _ => {}
    }
}
