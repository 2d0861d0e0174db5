use nova_dedup_syntax::{render_node, ImportDecl, NodeId, SyntaxTree};

use crate::model::FileId;
use crate::semantic::DependencyDiscovery;
use crate::workspace::Workspace;

/// Copies the imports `callable` needs from its source file into
/// `destination`, each at most once. Returns the imports that were added.
///
/// When dependency discovery is inconclusive the callable's rendered text is
/// scanned for the imports' simple names instead.
pub fn reconcile_imports(
    ws: &Workspace,
    source_file: &FileId,
    callable: NodeId,
    destination: &mut SyntaxTree,
    discovery: &dyn DependencyDiscovery,
) -> Vec<ImportDecl> {
    let Some(source) = ws.tree(source_file) else {
        return Vec::new();
    };
    let required = discovery.required_names(ws, source_file, callable);
    let best_effort = required.is_empty();
    let text = if best_effort {
        render_node(source, callable)
    } else {
        String::new()
    };
    let destination_package = destination.package().unwrap_or_default().to_string();

    let mut added = Vec::new();
    for (_, import) in source.imports() {
        if !import.is_static && import.package() == destination_package {
            continue;
        }
        let relevant = if best_effort {
            !import.is_wildcard && uses_name(&text, import.simple_name(), import.is_static)
        } else if import.is_wildcard {
            required
                .iter()
                .any(|name| name.rsplit_once('.').is_some_and(|(parent, _)| parent == import.path))
        } else if import.is_static {
            required
                .iter()
                .any(|name| *name == import.path || name == import.simple_name())
        } else {
            required.iter().any(|name| *name == import.path)
        };
        if relevant && destination.add_import(import.clone()) {
            tracing::trace!(
                target = "nova.dedup.imports",
                import = %import.qualified_name(),
                best_effort,
                "copied import"
            );
            added.push(import.clone());
        }
    }
    added
}

/// Whether `name` occurs in `text` as a whole identifier not preceded by `.`.
///
/// Type usages must also start with an uppercase letter.
fn uses_name(text: &str, name: &str, is_static: bool) -> bool {
    if name.is_empty() || (!is_static && !name.starts_with(char::is_uppercase)) {
        return false;
    }
    let is_ident = |c: char| c == '$' || unicode_ident::is_xid_continue(c);
    text.match_indices(name).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + name.len()..].chars().next();
        !before.is_some_and(|c| is_ident(c) || c == '.') && !after.is_some_and(is_ident)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::ImportScanner;

    struct Inconclusive;

    impl DependencyDiscovery for Inconclusive {
        fn required_names(&self, _: &Workspace, _: &FileId, _: NodeId) -> Vec<String> {
            Vec::new()
        }
    }

    const SOURCE: &str = "package com.acme;\n\nimport java.util.List;\nimport java.util.Map;\nimport com.acme.model.*;\nimport com.acme.Local;\nimport static java.util.Objects.requireNonNull;\n\nclass Service {\n    List<Order> orders(List<Order> input) {\n        requireNonNull(input);\n        Local marker = null;\n        return input;\n    }\n}\n";

    fn setup() -> (Workspace, FileId, NodeId) {
        let ws = Workspace::from_sources([
            ("src/com/acme/Service.java", SOURCE),
            ("src/com/acme/model/Order.java", "package com.acme.model;\npublic class Order {}\n"),
        ])
        .unwrap();
        let file = FileId::new("src/com/acme/Service.java");
        let tree = ws.tree(&file).unwrap();
        let callable = tree.find_method(tree.find_type("Service").unwrap(), "orders").unwrap();
        (ws, file, callable)
    }

    fn qualified(imports: &[ImportDecl]) -> Vec<String> {
        imports.iter().map(ImportDecl::qualified_name).collect()
    }

    #[test]
    fn copies_only_required_imports() {
        let (ws, file, callable) = setup();
        let mut destination = SyntaxTree::new_compilation_unit(Some("com.acme.util".into()));
        let added = reconcile_imports(&ws, &file, callable, &mut destination, &ImportScanner);
        assert_eq!(
            qualified(&added),
            vec![
                "java.util.List".to_string(),
                "com.acme.model.*".to_string(),
                "com.acme.Local".to_string(),
                "java.util.Objects.requireNonNull".to_string(),
            ]
        );
        let again = reconcile_imports(&ws, &file, callable, &mut destination, &ImportScanner);
        assert!(again.is_empty());
    }

    #[test]
    fn same_package_imports_are_skipped() {
        let (ws, file, callable) = setup();
        let mut destination = SyntaxTree::new_compilation_unit(Some("com.acme".into()));
        let added = reconcile_imports(&ws, &file, callable, &mut destination, &ImportScanner);
        assert!(!qualified(&added).contains(&"com.acme.Local".to_string()));
    }

    #[test]
    fn best_effort_matches_type_usages() {
        let (ws, file, callable) = setup();
        let mut destination = SyntaxTree::new_compilation_unit(Some("com.acme.util".into()));
        let added = reconcile_imports(&ws, &file, callable, &mut destination, &Inconclusive);
        assert_eq!(
            qualified(&added),
            vec![
                "java.util.List".to_string(),
                "com.acme.Local".to_string(),
                "java.util.Objects.requireNonNull".to_string(),
            ]
        );
    }

    #[test]
    fn uses_name_ignores_member_access() {
        assert!(uses_name("List<String> xs", "List", false));
        assert!(!uses_name("this.List", "List", false));
        assert!(!uses_name("ArrayList<String>", "List", false));
        assert!(uses_name("requireNonNull(x)", "requireNonNull", true));
    }
}
