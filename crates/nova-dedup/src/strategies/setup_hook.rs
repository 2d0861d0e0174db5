use std::collections::BTreeSet;

use nova_dedup_syntax::{ImportDecl, LocalVarDecl, Modifiers, NodeId, NodeKind, SyntaxTree};

use crate::analysis::{callable_body, import_member, top_level_locals};
use crate::error::RefactorError;
use crate::model::{Cluster, RefactoringKind, RefactoringResult};
use crate::strategies::{finish, remove_run, Located, StrategyContext};
use crate::workspace::ChangeSet;

const TEST_ANNOTATIONS: &[&str] = &["Test", "ParameterizedTest", "RepeatedTest", "TestFactory"];
const JUNIT4_TEST: &str = "org.junit.Test";

/// Moves a statement run shared by several tests of one class into the
/// class's before-each hook.
pub(crate) fn extract_setup_hook(
    cx: &mut StrategyContext<'_>,
    cluster: &Cluster,
) -> Result<RefactoringResult, RefactorError> {
    let ws = cx.ws;
    let primary = Located::new(ws, &cluster.primary)?;
    let file = primary.occurrence.file.clone();
    let source = primary.tree;
    let class = primary.class;

    let is_test_class = source.methods_of(class).into_iter().any(|method| {
        TEST_ANNOTATIONS
            .iter()
            .any(|annotation| source.has_annotation(method, annotation))
    });
    if !is_test_class {
        return Err(RefactorError::NotATestClass(primary.class_name().to_string()));
    }

    let mut runs: Vec<Located<'_>> = Vec::new();
    for occurrence in cluster.all_occurrences() {
        if occurrence.file != file {
            tracing::debug!(
                target = "nova.dedup.setup_hook",
                file = %occurrence.file,
                "skipping occurrence outside the primary file"
            );
            continue;
        }
        let site = Located::new(ws, occurrence)?;
        if site.class == class {
            runs.push(site);
        }
    }

    let existing_fields: BTreeSet<String> = source.field_names(class).into_iter().collect();
    let mut promoted: Vec<(String, String)> = Vec::new();
    for (name, ty) in top_level_locals(source, &primary.occurrence.statements) {
        let shareable = ty != "var" && cx.classifier.is_shareable(&ty);
        let taken = existing_fields.contains(&name) || promoted.iter().any(|(n, _)| *n == name);
        if shareable && !taken {
            promoted.push((name, ty));
        } else {
            tracing::debug!(
                target = "nova.dedup.setup_hook",
                variable = %name,
                ty = %ty,
                shareable,
                "keeping variable local to the hook"
            );
        }
    }
    let promoted_names: BTreeSet<&str> = promoted.iter().map(|(name, _)| name.as_str()).collect();

    let hook_name = cx.config.setup_hook.method_name.as_str();
    let mut changes = ChangeSet::new(ws);
    let tree = changes.tree_mut(&file)?;
    let hook = match source.find_method(class, hook_name) {
        Some(existing) => existing,
        None => create_hook(tree, class, hook_name)?,
    };
    let hook_body = callable_body(tree, hook).ok_or_else(|| RefactorError::InvalidOccurrence {
        file: file.clone(),
        reason: format!("`{hook_name}` has no body"),
    })?;

    let mut field_index = last_field_index(tree, class).map_or(0, |i| i + 1);
    for (name, ty) in &promoted {
        let field = import_member(tree, &format!("private {ty} {name};"))?;
        tree.insert_member(class, field_index, field);
        field_index += 1;
    }
    for statement in &primary.occurrence.statements {
        for moved in hoist_statement(tree, *statement, &promoted_names) {
            tree.append_statement(hook_body, moved);
        }
    }

    // Later runs first so earlier offsets stay valid.
    runs.sort_by(|a, b| (a.body, b.occurrence.start).cmp(&(b.body, a.occurrence.start)));
    for run in &runs {
        remove_run(tree, run)?;
    }

    let description = format!(
        "Moved {} statement(s) from {} test(s) into `{hook_name}`, promoting {} field(s)",
        primary.occurrence.len(),
        runs.len(),
        promoted.len()
    );
    Ok(finish(changes, RefactoringKind::SetupHook, description))
}

/// Adds an empty before-each hook ahead of the first method.
///
/// JUnit 4 classes (importing `org.junit.Test`) get `@Before`, others
/// `@BeforeEach`.
fn create_hook(tree: &mut SyntaxTree, class: NodeId, name: &str) -> Result<NodeId, RefactorError> {
    let junit4 = tree.has_import(&ImportDecl::single(JUNIT4_TEST));
    let (annotation, import) = if junit4 {
        ("Before", "org.junit.Before")
    } else {
        ("BeforeEach", "org.junit.jupiter.api.BeforeEach")
    };
    let hook = import_member(tree, &format!("@{annotation}\npublic void {name}() {{\n}}"))?;
    let index = tree
        .type_decl(class)
        .and_then(|decl| {
            decl.members
                .iter()
                .position(|m| matches!(tree.kind(*m), NodeKind::Method(_)))
        })
        .unwrap_or(usize::MAX);
    tree.insert_member(class, index, hook);
    tree.add_import(ImportDecl::single(import));
    tracing::debug!(
        target = "nova.dedup.setup_hook",
        hook = name,
        annotation,
        "created setup hook"
    );
    Ok(hook)
}

fn last_field_index(tree: &SyntaxTree, class: NodeId) -> Option<usize> {
    tree.type_decl(class)?
        .members
        .iter()
        .rposition(|m| matches!(tree.kind(*m), NodeKind::Field(_)))
}

/// Copies `statement`; promoted declarations become plain assignments.
fn hoist_statement(
    tree: &mut SyntaxTree,
    statement: NodeId,
    promoted: &BTreeSet<&str>,
) -> Vec<NodeId> {
    let copy = tree.clone_subtree(statement);
    let NodeKind::LocalVar(decl) = tree.kind(copy).clone() else {
        return vec![copy];
    };
    if !decl
        .declarators
        .iter()
        .any(|d| promoted.contains(d.name.as_str()))
    {
        return vec![copy];
    }

    let mut out = Vec::new();
    for declarator in decl.declarators {
        if !promoted.contains(declarator.name.as_str()) {
            out.push(tree.alloc(NodeKind::LocalVar(LocalVarDecl {
                modifiers: Modifiers {
                    annotations: Vec::new(),
                    keywords: decl.modifiers.keywords.clone(),
                },
                ty: decl.ty.clone(),
                declarators: vec![declarator],
            })));
            continue;
        }
        let Some(value) = declarator.init else {
            continue;
        };
        let target = tree.alloc(NodeKind::Name {
            ident: declarator.name,
        });
        let assign = tree.alloc(NodeKind::Assign {
            op: "=".to_string(),
            target,
            value,
        });
        out.push(tree.alloc(NodeKind::ExprStmt { expr: assign }));
    }
    out
}
