use std::collections::BTreeSet;

use nova_dedup_syntax::{parse, ImportDecl, Modifier, NodeId, NodeKind, SyntaxTree, Visibility};

use crate::analysis::{callable_body, callable_scope, declared_names, import_statement};
use crate::error::RefactorError;
use crate::imports::reconcile_imports;
use crate::model::{Cluster, FileId, Recommendation, RefactoringKind, RefactoringResult};
use crate::naming::NameRequest;
use crate::semantic::{MethodHandle, MethodSignature};
use crate::strategies::{finish, locate_all, unique_callables, Located, StrategyContext};
use crate::workspace::{ChangeSet, Workspace};

/// Moves the duplicated callable into a static member of a new utility class
/// and points every matching call at it.
pub(crate) fn extract_utility_class(
    cx: &mut StrategyContext<'_>,
    cluster: &Cluster,
    recommendation: &Recommendation,
) -> Result<RefactoringResult, RefactorError> {
    let ws = cx.ws;
    let sites = unique_callables(locate_all(ws, &cluster.all_occurrences())?);
    let primary = Located::new(ws, &cluster.primary)?;
    let source = primary.tree;
    let callable = primary.occurrence.callable;
    let Some(decl) = source.method(callable) else {
        return Err(RefactorError::InvalidOccurrence {
            file: primary.occurrence.file.clone(),
            reason: "callable handle does not name a method".to_string(),
        });
    };
    tracing::debug!(
        target = "nova.dedup.utility_class",
        callable = %decl.name,
        occurrences = sites.len(),
        "extracting utility class"
    );

    for site in &sites {
        if let Err(reason) = static_compatibility(site.tree, site.class, site.occurrence.callable) {
            tracing::debug!(
                target = "nova.dedup.utility_class",
                callable = site.callable_name(),
                reason = %reason,
                "callable is not static-compatible"
            );
            return Err(RefactorError::NotStaticCompatible {
                name: site.callable_name().to_string(),
                reason,
            });
        }
    }

    let is_constructor = decl.is_constructor();
    let method_name = if is_constructor {
        let mut request = NameRequest::new()
            .statements(source, &primary.occurrence.statements);
        if let Some(name) = &recommendation.suggested_name {
            request = request.fixed(name.clone());
        }
        cx.naming.generate(&request)
    } else {
        decl.name.clone()
    };
    let class_name = utility_class_name(&method_name);
    let suffix = &cx.config.utility.package_suffix;
    let package = match source.package() {
        Some(package) => format!("{package}.{suffix}"),
        None => suffix.clone(),
    };
    let utility_file = primary
        .occurrence
        .file
        .sibling(&format!("{suffix}/{class_name}.java"));
    let utility_import = ImportDecl::single(format!("{package}.{class_name}"));

    let mut changes = ChangeSet::new(ws);
    let mut utility = utility_skeleton(&package, &class_name)?;
    let utility_class = utility
        .find_type(&class_name)
        .ok_or_else(|| RefactorError::UnknownFile(utility_file.clone()))?;
    let extracted = utility.import_subtree(source, callable);
    make_public_static(&mut utility, extracted, &method_name);
    utility.push_member(utility_class, extracted);
    reconcile_imports(ws, &primary.occurrence.file, callable, &mut utility, cx.discovery);
    changes.create(utility_file.clone(), utility)?;

    let signature = MethodSignature::from_decl(decl);
    let catalogued: BTreeSet<(FileId, NodeId)> = sites
        .iter()
        .map(|site| (site.occurrence.file.clone(), site.occurrence.callable))
        .collect();

    for file in cluster.files() {
        let original = ws.require(&file)?;
        let rewrites: Vec<NodeId> = if is_constructor {
            Vec::new()
        } else {
            original
                .descendants(original.root())
                .into_iter()
                .filter(|id| is_candidate_call(original, *id, &signature.name))
                .filter(|id| {
                    cx.resolver
                        .resolve_call(ws, &file, *id)
                        .is_some_and(|handle| {
                            targets_extracted(ws, &handle, &signature, &catalogued)
                        })
                })
                .collect()
        };

        let tree = changes.tree_mut(&file)?;
        if tree.package() != Some(package.as_str()) {
            tree.add_import(utility_import.clone());
        }
        for call in &rewrites {
            qualify_call(tree, *call, &class_name);
        }
        tracing::debug!(
            target = "nova.dedup.utility_class",
            file = %file,
            rewritten = rewrites.len(),
            "rewrote calls"
        );

        for site in sites.iter().filter(|site| site.occurrence.file == file) {
            let copy = site.occurrence.callable;
            let shares_signature = tree
                .method(copy)
                .is_some_and(|decl| MethodSignature::from_decl(decl) == signature);
            if !is_constructor && shares_signature {
                tree.remove_member(site.class, copy);
            } else {
                // Calls to this copy were not rewritten; it forwards instead.
                delegate_copy(tree, copy, &class_name, &method_name)?;
            }
        }
    }

    let description = format!(
        "Extracted `{method_name}` into utility class `{package}.{class_name}`"
    );
    Ok(finish(changes, RefactoringKind::UtilityClass, description))
}

/// Reason the callable cannot move out of its class, if any.
///
/// The moved copy keeps its body verbatim, so any bare reference to a member
/// of the declaring class would dangle: instance state, and static fields and
/// methods alike. Calls to the callable itself are fine.
fn static_compatibility(tree: &SyntaxTree, class: NodeId, callable: NodeId) -> Result<(), String> {
    let Some(decl) = tree.method(callable) else {
        return Err("not a method".to_string());
    };
    let Some(body) = decl.body else {
        return Err("has no body".to_string());
    };
    let mut instance_methods = BTreeSet::new();
    let mut static_methods = BTreeSet::new();
    for method in tree.methods_of(class).into_iter().filter_map(|m| tree.method(m)) {
        if method.is_constructor() || method.name == decl.name {
            continue;
        }
        if method.modifiers.has(Modifier::Static) {
            static_methods.insert(method.name.clone());
        } else {
            instance_methods.insert(method.name.clone());
        }
    }
    let mut instance_fields = BTreeSet::new();
    let mut static_fields = BTreeSet::new();
    for field in tree.fields_of(class) {
        let names = field.declarators.iter().map(|d| d.name.clone());
        if field.modifiers.has(Modifier::Static) {
            static_fields.extend(names);
        } else {
            instance_fields.extend(names);
        }
    }
    let mut locals: BTreeSet<String> = callable_scope(tree, callable)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    locals.extend(declared_names(tree, &[body]));

    for id in tree.descendants(body) {
        match tree.kind(id) {
            NodeKind::This { .. } => return Err("uses `this`".to_string()),
            NodeKind::Super { .. } => return Err("uses `super`".to_string()),
            NodeKind::MethodCall {
                target: None, name, ..
            } => {
                if name == "this" || name == "super" {
                    return Err(format!("delegates to `{name}(...)`"));
                }
                if instance_methods.contains(name) {
                    return Err(format!("calls instance method `{name}`"));
                }
                if static_methods.contains(name) {
                    return Err(format!("calls static method `{name}`"));
                }
            }
            NodeKind::Name { ident } if !locals.contains(ident) => {
                if instance_fields.contains(ident) {
                    return Err(format!("reads instance field `{ident}`"));
                }
                if static_fields.contains(ident) {
                    return Err(format!("reads static field `{ident}`"));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Readability bucket for the utility class.
fn utility_class_name(method_name: &str) -> String {
    const BUCKETS: &[(&str, &[&str])] = &[
        ("ValidationUtils", &["validate", "is", "check", "verify"]),
        ("StringUtils", &["string", "format", "concat", "trim", "text", "str"]),
        ("DateUtils", &["date", "time"]),
        ("MathUtils", &["math", "calc", "compute", "sum", "average", "round"]),
    ];
    let lower = method_name.to_lowercase();
    BUCKETS
        .iter()
        .find(|(_, prefixes)| prefixes.iter().any(|p| lower.starts_with(p)))
        .map(|(name, _)| (*name).to_string())
        .unwrap_or_else(|| "CommonUtils".to_string())
}

fn utility_skeleton(package: &str, class_name: &str) -> Result<SyntaxTree, RefactorError> {
    let text = format!(
        "package {package};\n\n\
         public final class {class_name} {{\n\
         private {class_name}() {{\n\
         throw new UnsupportedOperationException(\"Utility class\");\n\
         }}\n\
         }}\n"
    );
    let mut tree = parse(&text)?;
    let root = tree.root();
    tree.clear_origin(root);
    Ok(tree)
}

/// Turns an imported copy of the callable into `public static`, dropping its
/// annotations. A constructor copy becomes a `void` method named `name`.
fn make_public_static(tree: &mut SyntaxTree, method: NodeId, name: &str) {
    let annotations: Vec<String> = tree
        .annotations_of(method)
        .iter()
        .map(|a| a.simple_name().to_string())
        .collect();
    let annotations: Vec<&str> = annotations.iter().map(String::as_str).collect();
    tree.remove_annotations(method, &annotations);
    if let Some(decl) = tree.method_mut(method) {
        if decl.is_constructor() {
            decl.return_ty = Some("void".to_string());
            decl.name = name.to_string();
        }
        decl.modifiers.set_visibility(Visibility::Public);
        decl.modifiers.remove(Modifier::Abstract);
        decl.modifiers.insert(Modifier::Static);
    }
}

/// Unqualified or `this`-qualified call named `name`.
fn is_candidate_call(tree: &SyntaxTree, id: NodeId, name: &str) -> bool {
    match tree.kind(id) {
        NodeKind::MethodCall {
            target,
            name: call_name,
            ..
        } if call_name == name => match target {
            None => true,
            Some(target) => matches!(tree.kind(*target), NodeKind::This { qualifier: None }),
        },
        _ => false,
    }
}

fn targets_extracted(
    ws: &Workspace,
    handle: &MethodHandle,
    signature: &MethodSignature,
    catalogued: &BTreeSet<(FileId, NodeId)>,
) -> bool {
    catalogued.contains(&(handle.file.clone(), handle.method))
        && handle.signature(ws).as_ref() == Some(signature)
}

/// Replaces the call's receiver with the utility class name.
fn qualify_call(tree: &mut SyntaxTree, call: NodeId, class_name: &str) {
    let NodeKind::MethodCall { name, args, .. } = tree.kind(call).clone() else {
        return;
    };
    let qualifier = tree.alloc(NodeKind::Name {
        ident: class_name.to_string(),
    });
    let rewritten = tree.alloc(NodeKind::MethodCall {
        target: Some(qualifier),
        name,
        args,
    });
    tree.replace(call, rewritten);
}

/// Replaces the body of a copy that stays in place with a call to the
/// extracted method, returning its result unless the copy is `void` or a
/// constructor.
fn delegate_copy(
    tree: &mut SyntaxTree,
    copy: NodeId,
    class_name: &str,
    method_name: &str,
) -> Result<(), RefactorError> {
    let Some((args, returns)) = tree.method(copy).map(|decl| {
        let args: Vec<String> = decl.params.iter().map(|p| p.name.clone()).collect();
        (args, !decl.is_constructor() && !decl.returns_void())
    }) else {
        return Ok(());
    };
    let Some(body) = callable_body(tree, copy) else {
        return Ok(());
    };
    let call = format!("{class_name}.{method_name}({})", args.join(", "));
    let statement = if returns {
        import_statement(tree, &format!("return {call};"))?
    } else {
        import_statement(tree, &format!("{call};"))?
    };
    tree.set_block_statements(body, vec![statement]);
    tracing::debug!(
        target = "nova.dedup.utility_class",
        callable = tree.method(copy).map_or("", |decl| decl.name.as_str()),
        "copy now delegates"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_names_follow_method_prefixes() {
        assert_eq!(utility_class_name("validateEmail"), "ValidationUtils");
        assert_eq!(utility_class_name("isBlank"), "ValidationUtils");
        assert_eq!(utility_class_name("formatName"), "StringUtils");
        assert_eq!(utility_class_name("timestampOf"), "DateUtils");
        assert_eq!(utility_class_name("computeTotal"), "MathUtils");
        assert_eq!(utility_class_name("sendMail"), "CommonUtils");
    }

    #[test]
    fn class_members_block_static_extraction() {
        let tree = parse(
            "class A {\n    int count;\n    static int shared;\n    void bump() {}\n    static int twice(int x) { return 2 * x; }\n    int a(int x) { return x + shared; }\n    int b() { return count; }\n    int c(int count) { return count; }\n    void d() { bump(); }\n    void e() { this.bump(); }\n    private static int f(int shared) { return shared + 1; }\n    static int g(int x) { return twice(x); }\n    static int h(int n) { return n <= 0 ? 0 : h(n - 1); }\n    int i(java.util.List<Integer> xs) { return xs.stream().mapToInt(count -> count).sum(); }\n}\n",
        )
        .unwrap();
        let class = tree.find_type("A").unwrap();
        let check = |name: &str| static_compatibility(&tree, class, tree.find_method(class, name).unwrap());
        assert_eq!(check("a"), Err("reads static field `shared`".to_string()));
        assert_eq!(check("b"), Err("reads instance field `count`".to_string()));
        assert!(check("c").is_ok());
        assert_eq!(check("d"), Err("calls instance method `bump`".to_string()));
        assert_eq!(check("e"), Err("uses `this`".to_string()));
        assert!(check("f").is_ok());
        assert_eq!(check("g"), Err("calls static method `twice`".to_string()));
        assert!(check("h").is_ok());
        assert!(check("i").is_ok());
    }
}
