use std::collections::BTreeSet;

use nova_dedup_syntax::{
    parse, render_node, ImportDecl, Modifier, NodeId, NodeKind, SyntaxTree, TypeKind, Visibility,
};

use crate::analysis::{
    callable_body, callable_scope, camel_words, import_statement, normalized, type_identifiers,
};
use crate::error::RefactorError;
use crate::imports::reconcile_imports;
use crate::model::{Cluster, FileId, RefactoringKind, RefactoringResult};
use crate::strategies::{finish, locate_all, unique_callables, Located, StrategyContext};
use crate::workspace::ChangeSet;

/// Where the shared method ends up.
struct ParentClass {
    name: String,
    file: FileId,
    package: Option<String>,
    /// Name of the method every child inherits.
    method_name: String,
    /// Whitespace-free body every copy must match.
    body_text: String,
    /// The copy kept in place when a cluster class becomes the parent.
    kept: Option<(FileId, NodeId)>,
}

/// Moves the duplicated method into a common superclass.
pub(crate) fn extract_parent_class(
    cx: &mut StrategyContext<'_>,
    cluster: &Cluster,
) -> Result<RefactoringResult, RefactorError> {
    let ws = cx.ws;
    let sites = unique_callables(locate_all(ws, &cluster.all_occurrences())?);
    let primary = Located::new(ws, &cluster.primary)?;

    for site in &sites {
        check_movable(site)?;
    }

    let mut class_names: Vec<&str> = Vec::new();
    for site in &sites {
        let name = site.class_name();
        if !class_names.contains(&name) {
            class_names.push(name);
        }
    }
    let parent_name = parent_class_name(&class_names);
    tracing::debug!(
        target = "nova.dedup.parent_class",
        parent = %parent_name,
        classes = ?class_names,
        "extracting parent class"
    );

    let mut changes = ChangeSet::new(ws);
    let parent = match sites.iter().find(|site| site.class_name() == parent_name) {
        Some(peer) => promote_peer(&mut changes, peer, &parent_name)?,
        None => create_parent(cx, &mut changes, &primary, &parent_name)?,
    };

    for site in &sites {
        let file = &site.occurrence.file;
        let is_parent = site.class_name() == parent.name;
        if is_parent {
            if parent.kept != Some((file.clone(), site.occurrence.callable)) {
                adopt_copy(&mut changes, site, &parent)?;
            }
            continue;
        }
        link_to_parent(&mut changes, site, &parent)?;
        adopt_copy(&mut changes, site, &parent)?;
    }

    let description = format!(
        "Extracted `{}` into parent class `{}`",
        parent.method_name, parent.name
    );
    Ok(finish(changes, RefactoringKind::ParentClass, description))
}

/// Rejects callables that depend on things a superclass cannot see.
fn check_movable(site: &Located<'_>) -> Result<(), RefactorError> {
    let tree = site.tree;
    let callable = site.occurrence.callable;
    let is_class = tree
        .type_decl(site.class)
        .is_some_and(|decl| decl.kind == TypeKind::Class);
    if !is_class {
        return Err(RefactorError::ParentClass(format!(
            "`{}` is not a class",
            site.class_name()
        )));
    }

    let nested: BTreeSet<&str> = tree
        .all_types()
        .into_iter()
        .filter(|id| tree.enclosing_type(*id).is_some())
        .filter_map(|id| tree.type_decl(id).map(|decl| decl.name.as_str()))
        .collect();
    if let Some(name) = referenced_types(tree, callable)
        .into_iter()
        .find(|name| nested.contains(name.as_str()))
    {
        return Err(RefactorError::ParentClass(format!(
            "`{}` references nested type `{name}`",
            site.callable_name()
        )));
    }

    let fields: BTreeSet<String> = tree
        .fields_of(site.class)
        .into_iter()
        .filter(|field| !field.modifiers.has(Modifier::Static))
        .flat_map(|field| field.declarators.iter().map(|d| d.name.clone()))
        .collect();
    let scope: BTreeSet<String> = callable_scope(tree, callable)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    let Some(body) = callable_body(tree, callable) else {
        return Ok(());
    };
    for id in tree.descendants(body) {
        let field = match tree.kind(id) {
            NodeKind::Name { ident } if !scope.contains(ident) => Some(ident),
            NodeKind::FieldAccess { target, name }
                if matches!(tree.kind(*target), NodeKind::This { qualifier: None }) =>
            {
                Some(name)
            }
            _ => None,
        };
        if let Some(field) = field.filter(|f| fields.contains(*f)) {
            return Err(RefactorError::ParentClass(format!(
                "`{}` uses instance field `{field}`",
                site.callable_name()
            )));
        }
    }
    Ok(())
}

/// Simple type names mentioned anywhere in a callable's declaration or body.
fn referenced_types(tree: &SyntaxTree, callable: NodeId) -> BTreeSet<String> {
    let mut types: Vec<String> = Vec::new();
    if let Some(decl) = tree.method(callable) {
        types.extend(decl.return_ty.iter().cloned());
        types.extend(decl.params.iter().map(|p| p.ty.clone()));
        types.extend(decl.throws.iter().cloned());
    }
    for id in tree.descendants(callable) {
        match tree.kind(id) {
            NodeKind::LocalVar(local) => types.push(local.ty.clone()),
            NodeKind::ForEach { ty, .. }
            | NodeKind::New { ty, .. }
            | NodeKind::NewArray { ty, .. }
            | NodeKind::Cast { ty, .. }
            | NodeKind::InstanceOf { ty, .. }
            | NodeKind::TypePattern { ty, .. }
            | NodeKind::ClassLit { ty } => types.push(ty.clone()),
            NodeKind::Try { catches, .. } => {
                types.extend(catches.iter().flat_map(|c| c.types.iter().cloned()));
            }
            NodeKind::Lambda { params, .. } => {
                types.extend(params.iter().filter_map(|p| p.ty.clone()));
            }
            NodeKind::Name { ident } => types.push(ident.clone()),
            _ => {}
        }
    }
    types
        .iter()
        .flat_map(|ty| type_identifiers(ty))
        .flat_map(|ident| ident.split('.').map(str::to_string).collect::<Vec<_>>())
        .collect()
}

/// `Base` plus the longest common camel-case suffix, else `Abstract<first>`.
fn parent_class_name(class_names: &[&str]) -> String {
    let words: Vec<Vec<String>> = class_names.iter().map(|name| camel_words(name)).collect();
    let Some(first) = words.first() else {
        return "AbstractBase".to_string();
    };
    let mut common = 0;
    while common < first.len() {
        let word = &first[first.len() - 1 - common];
        let shared = words
            .iter()
            .all(|w| w.len() > common && w[w.len() - 1 - common] == *word);
        if !shared {
            break;
        }
        common += 1;
    }
    if common == 0 {
        return format!("Abstract{}", class_names[0]);
    }
    let suffix = first[first.len() - common..].concat();
    if suffix.starts_with("Base") {
        suffix
    } else {
        format!("Base{suffix}")
    }
}

/// Keeps a cluster class's own copy as the shared method.
fn promote_peer(
    changes: &mut ChangeSet<'_>,
    peer: &Located<'_>,
    parent_name: &str,
) -> Result<ParentClass, RefactorError> {
    let callable = peer.occurrence.callable;
    let body_text = body_text(peer.tree, callable);
    let tree = changes.tree_mut(&peer.occurrence.file)?;
    if let Some(decl) = tree.method_mut(callable) {
        if decl.modifiers.visibility() == Visibility::Private {
            decl.modifiers.set_visibility(Visibility::Protected);
        }
    }
    tracing::debug!(
        target = "nova.dedup.parent_class",
        parent = parent_name,
        "promoting cluster class to parent"
    );
    Ok(ParentClass {
        name: parent_name.to_string(),
        file: peer.occurrence.file.clone(),
        package: peer.tree.package().map(str::to_string),
        method_name: peer.callable_name().to_string(),
        body_text,
        kept: Some((peer.occurrence.file.clone(), callable)),
    })
}

/// Synthesizes `public abstract class <name>` next to the primary file.
fn create_parent(
    cx: &StrategyContext<'_>,
    changes: &mut ChangeSet<'_>,
    primary: &Located<'_>,
    parent_name: &str,
) -> Result<ParentClass, RefactorError> {
    let source = primary.tree;
    let callable = primary.occurrence.callable;
    let package = source.package().map(str::to_string);
    let header = package
        .as_deref()
        .map(|p| format!("package {p};\n\n"))
        .unwrap_or_default();
    let mut tree = parse(&format!("{header}public abstract class {parent_name} {{\n}}\n"))?;
    let file = primary.occurrence.file.sibling(&format!("{parent_name}.java"));
    let class = tree
        .find_type(parent_name)
        .ok_or_else(|| RefactorError::UnknownFile(file.clone()))?;

    let method = tree.import_subtree(source, callable);
    tree.remove_annotations(method, &["Override"]);
    if let Some(decl) = tree.method_mut(method) {
        if decl.modifiers.visibility() != Visibility::Public {
            decl.modifiers.set_visibility(Visibility::Protected);
        }
    }
    tree.push_member(class, method);
    reconcile_imports(cx.ws, &primary.occurrence.file, callable, &mut tree, cx.discovery);
    changes.create(file.clone(), tree)?;

    Ok(ParentClass {
        name: parent_name.to_string(),
        file,
        package,
        method_name: primary.callable_name().to_string(),
        body_text: body_text(source, callable),
        kept: None,
    })
}

/// Adds the `extends` clause and, across packages, the import.
fn link_to_parent(
    changes: &mut ChangeSet<'_>,
    site: &Located<'_>,
    parent: &ParentClass,
) -> Result<(), RefactorError> {
    let class_name = site.class_name();
    let child_package = site.tree.package();
    let import = match (parent.package.as_deref(), child_package) {
        (Some(parent_pkg), Some(child_pkg)) if parent_pkg == child_pkg => None,
        (Some(parent_pkg), _) => Some(ImportDecl::single(format!("{parent_pkg}.{}", parent.name))),
        (None, None) => None,
        (None, Some(_)) => {
            return Err(RefactorError::ParentClass(format!(
                "`{}` would live in the default package and cannot be imported by `{class_name}`",
                parent.name
            )));
        }
    };

    let tree = changes.tree_mut(&site.occurrence.file)?;
    let Some(decl) = tree.type_decl_mut(site.class) else {
        return Ok(());
    };
    match decl.extends.as_deref() {
        None => decl.extends = Some(parent.name.clone()),
        Some(existing) if existing == parent.name => {}
        Some(existing) => {
            return Err(RefactorError::ConflictingSuperclass {
                class: class_name.to_string(),
                existing: existing.to_string(),
            });
        }
    }
    if let Some(import) = import {
        if site.occurrence.file != parent.file {
            tree.add_import(import);
        }
    }
    Ok(())
}

/// Removes a child's identical copy, or makes a renamed copy delegate.
fn adopt_copy(
    changes: &mut ChangeSet<'_>,
    site: &Located<'_>,
    parent: &ParentClass,
) -> Result<(), RefactorError> {
    let callable = site.occurrence.callable;
    if body_text(site.tree, callable) != parent.body_text {
        return Err(RefactorError::BodyMismatch {
            primary: parent.method_name.clone(),
            other: format!("{}.{}", site.class_name(), site.callable_name()),
        });
    }
    let Some(decl) = site.tree.method(callable) else {
        return Ok(());
    };
    let tree = changes.tree_mut(&site.occurrence.file)?;
    if decl.name == parent.method_name {
        tree.remove_member(site.class, callable);
        return Ok(());
    }

    let args: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();
    let call = format!("{}({})", parent.method_name, args.join(", "));
    let statement = if decl.returns_void() {
        format!("{call};")
    } else {
        format!("return {call};")
    };
    let statement = import_statement(tree, &statement)?;
    if let Some(body) = callable_body(tree, callable) {
        tree.set_block_statements(body, vec![statement]);
    }
    Ok(())
}

fn body_text(tree: &SyntaxTree, callable: NodeId) -> String {
    callable_body(tree, callable)
        .map(|body| normalized(&render_node(tree, body)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_names_use_the_shared_suffix() {
        assert_eq!(
            parent_class_name(&["OrderServiceTest", "UserServiceTest"]),
            "BaseServiceTest"
        );
        assert_eq!(parent_class_name(&["Cat", "Dog"]), "AbstractCat");
        assert_eq!(parent_class_name(&["BaseRepository", "UserRepository"]), "BaseRepository");
    }

    #[test]
    fn referenced_types_split_qualified_names() {
        let tree = parse(
            "class A {\n    void m(java.util.List<Inner> xs) {\n        Outer.Nested n = new Outer.Nested();\n    }\n}\n",
        )
        .unwrap();
        let class = tree.find_type("A").unwrap();
        let types = referenced_types(&tree, tree.find_method(class, "m").unwrap());
        assert!(types.contains("Inner"));
        assert!(types.contains("Nested"));
        assert!(types.contains("List"));
    }
}
