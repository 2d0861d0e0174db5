use std::collections::BTreeSet;

use nova_dedup_syntax::{LiteralKind, Modifier, NodeId, NodeKind, SyntaxTree};

use crate::analysis::{
    callable_body, callable_scope, contains_escaping_jump, declared_names, import_member,
    import_statement, literal, literals_in, masked_text, mutated_names, referenced_names,
    top_level_locals,
};
use crate::error::RefactorError;
use crate::model::{Cluster, FileId, Recommendation, RefactoringKind, RefactoringResult};
use crate::naming::NameRequest;
use crate::strategies::{finish, locate_all, remove_run, Located, StrategyContext};
use crate::workspace::ChangeSet;

/// A class that receives its own copy of the helper.
struct Receiver {
    file: FileId,
    class: NodeId,
    /// First callable of the class holding an occurrence.
    anchor: NodeId,
    is_static: bool,
}

/// Replaces every duplicated run with a call to a private helper method
/// extracted into each class that holds a run.
pub(crate) fn extract_helper_method(
    cx: &mut StrategyContext<'_>,
    cluster: &Cluster,
    recommendation: &Recommendation,
) -> Result<RefactoringResult, RefactorError> {
    let ws = cx.ws;
    let sites = locate_all(ws, &cluster.all_occurrences())?;
    let Some(primary) = sites.first() else {
        return Err(RefactorError::HelperMethod("cluster has no occurrences".to_string()));
    };
    let source = primary.tree;
    let statements = &primary.occurrence.statements;

    for site in &sites {
        if contains_escaping_jump(site.tree, &site.occurrence.statements) {
            return Err(RefactorError::HelperMethod(format!(
                "run in `{}` returns or jumps out of the duplicated statements",
                describe(site)
            )));
        }
    }
    let shape = masked_text(source, statements);
    if let Some(other) = sites
        .iter()
        .find(|site| masked_text(site.tree, &site.occurrence.statements) != shape)
    {
        return Err(RefactorError::BodyMismatch {
            primary: describe(primary),
            other: describe(other),
        });
    }

    let rows: Vec<Vec<String>> = sites
        .iter()
        .map(|site| literal_texts(site.tree, &site.occurrence.statements))
        .collect();
    let kinds: Vec<LiteralKind> = literals_in(source, statements)
        .into_iter()
        .filter_map(|id| literal(source, id).map(|lit| lit.kind))
        .collect();
    let varying: Vec<usize> = (0..kinds.len())
        .filter(|position| rows.iter().any(|row| row.get(*position) != rows[0].get(*position)))
        .collect();

    let free = free_variables(primary)?;
    let returned = returned_local(&sites)?;

    let mut taken: BTreeSet<String> = declared_names(source, statements);
    taken.extend(free.iter().map(|(name, _)| name.clone()));
    let mut params: Vec<(String, String)> = Vec::new();
    for (index, position) in varying.iter().enumerate() {
        let suggested = recommendation.suggested_parameters.get(index);
        let base = suggested
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("value{}", index + 1));
        let ty = suggested
            .map(|p| p.ty.clone())
            .filter(|ty| !ty.is_empty())
            .unwrap_or_else(|| kinds[*position].java_type().to_string());
        let name = unused_name(&base, &taken);
        taken.insert(name.clone());
        params.push((name, ty));
    }
    params.extend(free.iter().cloned());
    tracing::debug!(
        target = "nova.dedup.helper_method",
        occurrences = sites.len(),
        literal_params = varying.len(),
        free_params = free.len(),
        returns = returned.as_ref().map(|(name, _)| name.as_str()),
        "extracting helper method"
    );

    let receivers = receivers(&sites);
    let existing: Vec<String> = receivers
        .iter()
        .filter_map(|r| ws.tree(&r.file).map(|tree| tree.method_names(r.class)))
        .flatten()
        .collect();
    let mut request = NameRequest::new().statements(source, statements).existing(existing);
    if let Some(name) = &recommendation.suggested_name {
        request = request.fixed(name.clone());
    }
    if let Some((local, _)) = &returned {
        request = request.return_hint(local.clone());
    }
    let name = cx.naming.generate(&request);

    let return_ty = returned.as_ref().map_or("void", |(_, ty)| ty.as_str());
    let param_list = params
        .iter()
        .map(|(name, ty)| format!("{ty} {name}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut changes = ChangeSet::new(ws);
    for receiver in &receivers {
        let tree = changes.tree_mut(&receiver.file)?;
        let modifier = if receiver.is_static { "private static" } else { "private" };
        let signature = format!("{modifier} {return_ty} {name}({param_list}) {{\n}}");
        let helper = import_member(tree, &signature)?;
        let body = callable_body(tree, helper).ok_or_else(|| {
            RefactorError::HelperMethod(format!("helper `{name}` has no body"))
        })?;

        let copies: Vec<NodeId> = statements
            .iter()
            .map(|statement| tree.import_subtree(source, *statement))
            .collect();
        let copied_literals = literals_in(tree, &copies);
        for ((param, _), position) in params.iter().zip(&varying) {
            let placeholder = tree.alloc(NodeKind::Name {
                ident: param.clone(),
            });
            tree.replace(copied_literals[*position], placeholder);
        }
        let mut helper_statements = copies;
        if let Some((local, _)) = &returned {
            helper_statements.push(import_statement(tree, &format!("return {local};"))?);
        }
        tree.set_block_statements(body, helper_statements);

        let index = tree
            .member_index(receiver.class, receiver.anchor)
            .map_or(usize::MAX, |i| i + 1);
        tree.insert_member(receiver.class, index, helper);
    }

    // Later runs of a body first so earlier offsets stay valid.
    let mut order: Vec<usize> = (0..sites.len()).collect();
    order.sort_by(|a, b| {
        let (a, b) = (&sites[*a], &sites[*b]);
        (&a.occurrence.file, a.body, b.occurrence.start).cmp(&(
            &b.occurrence.file,
            b.body,
            a.occurrence.start,
        ))
    });
    for index in order {
        let site = &sites[index];
        let args: Vec<&str> = varying
            .iter()
            .map(|position| rows[index][*position].as_str())
            .chain(free.iter().map(|(name, _)| name.as_str()))
            .collect();
        let call = format!("{name}({})", args.join(", "));
        let text = match &returned {
            Some((local, ty)) => format!("{ty} {local} = {call};"),
            None => format!("{call};"),
        };
        let tree = changes.tree_mut(&site.occurrence.file)?;
        remove_run(tree, site)?;
        let replacement = import_statement(tree, &text)?;
        tree.insert_statement(site.body, site.occurrence.start, replacement);
    }

    let description = format!(
        "Extracted {} duplicated statement run(s) into helper `{name}` in {} class(es)",
        sites.len(),
        receivers.len()
    );
    Ok(finish(changes, RefactoringKind::HelperMethod, description))
}

fn describe(site: &Located<'_>) -> String {
    format!("{}.{}", site.class_name(), site.callable_name())
}

fn literal_texts(tree: &SyntaxTree, statements: &[NodeId]) -> Vec<String> {
    literals_in(tree, statements)
        .into_iter()
        .filter_map(|id| literal(tree, id).map(|lit| lit.text.clone()))
        .collect()
}

/// Parameters and locals declared before the run and read inside it, with
/// their declared types.
fn free_variables(site: &Located<'_>) -> Result<Vec<(String, String)>, RefactorError> {
    let tree = site.tree;
    let statements = &site.occurrence.statements;
    let declared = declared_names(tree, statements);
    let scope = callable_scope(tree, site.occurrence.callable);
    let mut free: Vec<(String, String)> = Vec::new();
    for name in referenced_names(tree, statements) {
        if declared.contains(&name) {
            continue;
        }
        if let Some((_, ty)) = scope.iter().find(|(local, _)| *local == name) {
            free.push((name, ty.clone()));
        }
    }
    let written = mutated_names(tree, statements);
    if let Some((name, _)) = free.iter().find(|(name, _)| written.contains(name)) {
        return Err(RefactorError::HelperMethod(format!(
            "run in `{}` assigns to `{name}`, which is declared outside it",
            describe(site)
        )));
    }
    Ok(free)
}

/// The single local declared by the runs and read after any of them.
fn returned_local(sites: &[Located<'_>]) -> Result<Option<(String, String)>, RefactorError> {
    let mut used_after: BTreeSet<String> = BTreeSet::new();
    for site in sites {
        let end = site.occurrence.start + site.occurrence.len();
        let following = site
            .tree
            .block_statements(site.body)
            .get(end..)
            .unwrap_or_default()
            .to_vec();
        let read = referenced_names(site.tree, &following);
        used_after.extend(
            top_level_locals(site.tree, &site.occurrence.statements)
                .into_iter()
                .map(|(name, _)| name)
                .filter(|name| read.contains(name)),
        );
    }
    if used_after.len() > 1 {
        let names: Vec<String> = used_after.into_iter().collect();
        return Err(RefactorError::HelperMethod(format!(
            "more than one local is used after the duplicated statements: {}",
            names.join(", ")
        )));
    }
    let Some(name) = used_after.into_iter().next() else {
        return Ok(None);
    };
    let primary = &sites[0];
    let ty = top_level_locals(primary.tree, &primary.occurrence.statements)
        .into_iter()
        .find(|(local, _)| *local == name)
        .map(|(_, ty)| ty)
        .unwrap_or_else(|| "var".to_string());
    if ty == "var" {
        return Err(RefactorError::HelperMethod(format!(
            "cannot return `{name}` because its type is inferred with `var`"
        )));
    }
    Ok(Some((name, ty)))
}

fn receivers(sites: &[Located<'_>]) -> Vec<Receiver> {
    let mut out: Vec<Receiver> = Vec::new();
    for site in sites {
        let is_static = site
            .tree
            .method(site.occurrence.callable)
            .is_some_and(|decl| decl.modifiers.has(Modifier::Static));
        match out
            .iter_mut()
            .find(|r| r.file == site.occurrence.file && r.class == site.class)
        {
            Some(receiver) => receiver.is_static |= is_static,
            None => out.push(Receiver {
                file: site.occurrence.file.clone(),
                class: site.class,
                anchor: site.occurrence.callable,
                is_static,
            }),
        }
    }
    out
}

fn unused_name(base: &str, taken: &BTreeSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Occurrence;
    use crate::workspace::Workspace;

    fn workspace(text: &str) -> Workspace {
        Workspace::from_sources([("A.java", text)]).unwrap()
    }

    fn occurrence(ws: &Workspace, method: &str, start: usize, count: usize) -> Occurrence {
        ws.locate_occurrence(&FileId::new("A.java"), "A", method, start, count)
            .unwrap()
    }

    #[test]
    fn free_variables_come_from_the_enclosing_scope() {
        let ws = workspace(
            "class A {\n    void m(String name) {\n        int size = 2;\n        System.out.println(name + size);\n        int local = size;\n    }\n}\n",
        );
        let occ = occurrence(&ws, "m", 1, 1);
        let site = Located::new(&ws, &occ).unwrap();
        assert_eq!(
            free_variables(&site).unwrap(),
            vec![
                ("name".to_string(), "String".to_string()),
                ("size".to_string(), "int".to_string()),
            ]
        );
    }

    #[test]
    fn assigning_an_outer_local_is_rejected() {
        let ws = workspace(
            "class A {\n    void m() {\n        int total = 0;\n        total = total + 1;\n    }\n}\n",
        );
        let occ = occurrence(&ws, "m", 1, 1);
        let site = Located::new(&ws, &occ).unwrap();
        assert!(matches!(free_variables(&site), Err(RefactorError::HelperMethod(_))));
    }

    #[test]
    fn one_local_used_later_is_returned() {
        let ws = workspace(
            "class A {\n    void m() {\n        String a = \"x\";\n        String b = a.trim();\n        System.out.println(b);\n    }\n}\n",
        );
        let occ = occurrence(&ws, "m", 0, 2);
        let sites = vec![Located::new(&ws, &occ).unwrap()];
        assert_eq!(
            returned_local(&sites).unwrap(),
            Some(("b".to_string(), "String".to_string()))
        );
    }

    #[test]
    fn names_avoid_taken_identifiers() {
        let taken: BTreeSet<String> = ["value1".to_string(), "value11".to_string()].into();
        assert_eq!(unused_name("value2", &taken), "value2");
        assert_eq!(unused_name("value1", &taken), "value12");
    }
}
