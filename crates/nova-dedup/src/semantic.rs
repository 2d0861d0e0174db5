//! Narrow semantic collaborators the strategies depend on.
//!
//! None of these is a full type checker. Each trait has a default
//! implementation that works from the syntax trees in a [`Workspace`] alone,
//! and callers with real semantic information can substitute their own.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use nova_dedup_syntax::{LiteralKind, MethodDecl, NodeId, NodeKind, SyntaxTree};
use once_cell::sync::Lazy;

use crate::analysis::{self, is_java_lang_type, simple_type_name, type_identifiers};
use crate::model::FileId;
use crate::workspace::Workspace;

/// Method name plus parameter types with whitespace removed.
///
/// Two declarations with equal signatures are the same overload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodSignature {
    pub name: String,
    pub param_types: Vec<String>,
}

impl MethodSignature {
    pub fn from_decl(decl: &MethodDecl) -> Self {
        Self {
            name: decl.name.clone(),
            param_types: decl
                .params
                .iter()
                .map(|p| analysis::normalized(&p.effective_type()))
                .collect(),
        }
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.param_types.join(", "))
    }
}

/// A method declaration somewhere in the workspace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodHandle {
    pub file: FileId,
    pub method: NodeId,
}

impl MethodHandle {
    pub fn decl<'ws>(&self, ws: &'ws Workspace) -> Option<&'ws MethodDecl> {
        ws.tree(&self.file)?.method(self.method)
    }

    pub fn signature(&self, ws: &Workspace) -> Option<MethodSignature> {
        self.decl(ws).map(MethodSignature::from_decl)
    }
}

/// Resolves a call expression to the declaration it most likely targets.
pub trait CallResolver: Send + Sync {
    /// `call` must be a method-call node of `file`'s tree in `ws`.
    fn resolve_call(&self, ws: &Workspace, file: &FileId, call: NodeId) -> Option<MethodHandle>;
}

/// Reports the qualified names one callable depends on.
pub trait DependencyDiscovery: Send + Sync {
    /// An empty result means the pass was inconclusive.
    fn required_names(&self, ws: &Workspace, file: &FileId, callable: NodeId) -> Vec<String>;
}

/// Decides whether a value of a type may be shared between test cases.
pub trait MutabilityClassifier: Send + Sync {
    fn is_shareable(&self, type_name: &str) -> bool;
}

/// Resolves calls by walking class declarations found in the workspace.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkspaceResolver;

impl WorkspaceResolver {
    fn search(
        &self,
        ws: &Workspace,
        mut file: FileId,
        mut type_id: NodeId,
        name: &str,
        args: &[Option<LiteralKind>],
    ) -> Option<MethodHandle> {
        let mut visited = HashSet::new();
        loop {
            if !visited.insert((file.clone(), type_id)) {
                return None;
            }
            let tree = ws.tree(&file)?;
            let candidates: Vec<NodeId> = tree
                .methods_of(type_id)
                .into_iter()
                .filter(|m| {
                    tree.method(*m).is_some_and(|decl| {
                        !decl.is_constructor() && decl.name == name && arity_matches(decl, args.len())
                    })
                })
                .collect();
            if !candidates.is_empty() {
                return pick_overload(tree, &candidates, args).map(|method| MethodHandle {
                    file: file.clone(),
                    method,
                });
            }
            let (next_file, next_type) = superclass_of(ws, &file, tree, type_id)?;
            file = next_file;
            type_id = next_type;
        }
    }
}

impl CallResolver for WorkspaceResolver {
    fn resolve_call(&self, ws: &Workspace, file: &FileId, call: NodeId) -> Option<MethodHandle> {
        let tree = ws.tree(file)?;
        if !tree.contains(call) {
            return None;
        }
        let NodeKind::MethodCall { target, name, args } = tree.kind(call) else {
            return None;
        };
        if name == "this" || name == "super" {
            return None;
        }
        let arg_kinds: Vec<Option<LiteralKind>> = args
            .iter()
            .map(|arg| match tree.kind(*arg) {
                NodeKind::Literal(lit) if lit.kind != LiteralKind::Null => Some(lit.kind),
                _ => None,
            })
            .collect();

        let (start_file, start_type) = match target.map(|t| tree.kind(t)) {
            None | Some(NodeKind::This { qualifier: None }) => {
                (file.clone(), tree.enclosing_type(call)?)
            }
            Some(NodeKind::Super { qualifier: None }) => {
                let current = tree.enclosing_type(call)?;
                superclass_of(ws, file, tree, current)?
            }
            Some(NodeKind::Name { ident }) if starts_uppercase(ident) => {
                match tree.find_type(ident) {
                    Some(id) => (file.clone(), id),
                    None => {
                        let (found_file, id) = ws.find_type(ident)?;
                        (found_file.clone(), id)
                    }
                }
            }
            _ => return None,
        };
        let resolved = self.search(ws, start_file, start_type, name, &arg_kinds);
        tracing::trace!(
            target = "nova.dedup.semantic",
            file = %file,
            call = name.as_str(),
            resolved = resolved.is_some(),
            "resolved call"
        );
        resolved
    }
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn arity_matches(decl: &MethodDecl, arg_count: usize) -> bool {
    match decl.params.last() {
        Some(last) if last.varargs => arg_count + 1 >= decl.params.len(),
        _ => decl.params.len() == arg_count,
    }
}

fn literal_fits(kind: LiteralKind, param_type: &str) -> bool {
    let param_type = simple_type_name(param_type);
    match kind {
        LiteralKind::Int => matches!(
            param_type,
            "int" | "Integer" | "long" | "Long" | "float" | "Float" | "double" | "Double"
                | "short" | "byte" | "Number" | "Object"
        ),
        LiteralKind::Long => matches!(
            param_type,
            "long" | "Long" | "float" | "Float" | "double" | "Double" | "Number" | "Object"
        ),
        LiteralKind::Float => matches!(
            param_type,
            "float" | "Float" | "double" | "Double" | "Number" | "Object"
        ),
        LiteralKind::Double => matches!(param_type, "double" | "Double" | "Number" | "Object"),
        LiteralKind::Char => matches!(
            param_type,
            "char" | "Character" | "int" | "long" | "float" | "double" | "Object"
        ),
        LiteralKind::String | LiteralKind::TextBlock => {
            matches!(param_type, "String" | "CharSequence" | "Object")
        }
        LiteralKind::Boolean => matches!(param_type, "boolean" | "Boolean" | "Object"),
        LiteralKind::Null => true,
    }
}

fn literal_exact(kind: LiteralKind, param_type: &str) -> bool {
    let param_type = simple_type_name(param_type);
    param_type == kind.java_type()
}

/// Narrows same-arity overloads using literal arguments.
fn pick_overload(
    tree: &SyntaxTree,
    candidates: &[NodeId],
    args: &[Option<LiteralKind>],
) -> Option<NodeId> {
    if let [only] = candidates {
        return Some(*only);
    }
    let param_type = |decl: &MethodDecl, idx: usize| -> Option<String> {
        let last = decl.params.len().checked_sub(1)?;
        let param = decl.params.get(idx.min(last))?;
        Some(param.ty.clone())
    };
    let fitting: Vec<NodeId> = candidates
        .iter()
        .copied()
        .filter(|m| {
            let Some(decl) = tree.method(*m) else {
                return false;
            };
            args.iter().enumerate().all(|(idx, kind)| match (kind, param_type(decl, idx)) {
                (Some(kind), Some(ty)) => literal_fits(*kind, &ty),
                _ => true,
            })
        })
        .collect();
    if let [only] = fitting.as_slice() {
        return Some(*only);
    }
    let exact: Vec<NodeId> = fitting
        .iter()
        .copied()
        .filter(|m| {
            let Some(decl) = tree.method(*m) else {
                return false;
            };
            args.iter().enumerate().all(|(idx, kind)| match (kind, param_type(decl, idx)) {
                (Some(kind), Some(ty)) => literal_exact(*kind, &ty),
                _ => true,
            })
        })
        .collect();
    match exact.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

/// Superclass declaration of `type_id`, preferring the same file.
fn superclass_of(
    ws: &Workspace,
    file: &FileId,
    tree: &SyntaxTree,
    type_id: NodeId,
) -> Option<(FileId, NodeId)> {
    let extends = tree.type_decl(type_id)?.extends.as_deref()?;
    let name = simple_type_name(extends);
    if let Some(id) = tree.find_type(name) {
        return Some((file.clone(), id));
    }
    ws.find_type(name).map(|(f, id)| (f.clone(), id))
}

/// Collects names from one callable and maps them through the file's imports.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImportScanner;

impl ImportScanner {
    fn collect_names(tree: &SyntaxTree, callable: NodeId) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let Some(decl) = tree.method(callable) else {
            return names;
        };
        let mut type_strings: Vec<String> = Vec::new();
        type_strings.extend(decl.return_ty.clone());
        type_strings.extend(decl.params.iter().map(|p| p.ty.clone()));
        type_strings.extend(decl.throws.iter().cloned());

        for id in tree.descendants(callable) {
            match tree.kind(id) {
                NodeKind::Annotation(annotation) => {
                    names.insert(annotation.name.clone());
                }
                NodeKind::LocalVar(local) => type_strings.push(local.ty.clone()),
                NodeKind::ForEach { ty, .. }
                | NodeKind::Cast { ty, .. }
                | NodeKind::InstanceOf { ty, .. }
                | NodeKind::TypePattern { ty, .. }
                | NodeKind::New { ty, .. }
                | NodeKind::NewArray { ty, .. }
                | NodeKind::ClassLit { ty } => type_strings.push(ty.clone()),
                NodeKind::Try { catches, .. } => {
                    for clause in catches {
                        type_strings.extend(clause.types.iter().cloned());
                    }
                }
                NodeKind::Lambda { params, .. } => {
                    type_strings.extend(params.iter().filter_map(|p| p.ty.clone()));
                }
                NodeKind::Name { ident } => {
                    names.insert(ident.clone());
                }
                NodeKind::MethodCall {
                    target: None, name, ..
                } => {
                    names.insert(name.clone());
                }
                _ => {}
            }
        }
        for ty in &type_strings {
            names.extend(type_identifiers(ty));
        }

        let mut type_params = BTreeSet::new();
        let enclosing = tree.enclosing_type(callable).and_then(|t| tree.type_decl(t));
        for params in [decl.type_params.as_deref(), enclosing.and_then(|t| t.type_params.as_deref())]
            .into_iter()
            .flatten()
        {
            type_params.extend(type_parameter_names(params));
        }
        names.retain(|name| !type_params.contains(name) && name != "var");
        names
    }
}

/// Declared names of a `<T extends Foo, U>` list.
fn type_parameter_names(params: &str) -> Vec<String> {
    params
        .split(['<', '>', ','])
        .filter_map(|segment| segment.split_whitespace().next())
        .filter(|word| word.chars().all(|c| c.is_alphanumeric() || c == '_'))
        .map(str::to_string)
        .collect()
}

impl DependencyDiscovery for ImportScanner {
    fn required_names(&self, ws: &Workspace, file: &FileId, callable: NodeId) -> Vec<String> {
        let Some(tree) = ws.tree(file) else {
            return Vec::new();
        };
        if !tree.contains(callable) {
            return Vec::new();
        }
        let imports = tree.imports();
        let mut required = BTreeSet::new();
        for name in Self::collect_names(tree, callable) {
            let name = if let Some((outer, _)) = name.split_once('.') {
                // Already qualified in source.
                if name.starts_with(char::is_lowercase) {
                    required.insert(name.clone());
                    continue;
                }
                // `Outer.Inner` needs `Outer`.
                outer.to_string()
            } else {
                name
            };
            if let Some((_, import)) = imports
                .iter()
                .find(|(_, i)| !i.is_wildcard && !i.is_static && i.simple_name() == name)
            {
                required.insert(import.path.clone());
                continue;
            }
            if let Some((_, import)) = imports
                .iter()
                .find(|(_, i)| i.is_static && !i.is_wildcard && i.simple_name() == name)
            {
                required.insert(import.path.clone());
                continue;
            }
            if !starts_uppercase(&name) || is_java_lang_type(&name) {
                continue;
            }
            if let Some((decl_file, _)) = ws.find_type(&name) {
                match ws.tree(decl_file).and_then(SyntaxTree::package) {
                    Some(pkg) => required.insert(format!("{pkg}.{name}")),
                    None => required.insert(name),
                };
                continue;
            }
            for (_, import) in imports.iter().filter(|(_, i)| i.is_wildcard && !i.is_static) {
                required.insert(format!("{}.{name}", import.path));
            }
        }
        required.into_iter().collect()
    }
}

static IMMUTABLE_TYPES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "boolean", "byte", "char", "short", "int", "long", "float", "double",
        "Boolean", "Byte", "Character", "Short", "Integer", "Long", "Float", "Double",
        "String", "BigDecimal", "BigInteger", "UUID", "LocalDate", "LocalDateTime",
        "LocalTime", "ZonedDateTime", "OffsetDateTime", "OffsetTime", "Instant",
        "Duration", "Period", "Year", "YearMonth", "MonthDay", "ZoneId", "ZoneOffset",
        "Path", "Pattern", "Optional", "OptionalInt", "OptionalLong", "OptionalDouble",
        "URI", "Locale", "Currency", "Class", "ImmutableList", "ImmutableSet",
        "ImmutableMap", "ImmutableSortedSet", "ImmutableSortedMap", "ImmutableMultimap",
    ]
    .into_iter()
    .collect()
});

const TEST_DOUBLE_SUFFIXES: &[&str] = &["Mock", "Stub", "Fake", "Dummy", "Spy"];

/// Name-based immutability heuristic.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicClassifier;

impl MutabilityClassifier for HeuristicClassifier {
    fn is_shareable(&self, type_name: &str) -> bool {
        let trimmed = type_name.trim();
        if trimmed.ends_with(']') || trimmed.ends_with("...") || trimmed == "var" {
            return false;
        }
        let simple = simple_type_name(trimmed);
        if IMMUTABLE_TYPES.contains(simple) {
            return true;
        }
        (simple.starts_with("Mock") && simple.len() > "Mock".len())
            || TEST_DOUBLE_SUFFIXES
                .iter()
                .any(|suffix| simple.ends_with(suffix) && simple.len() > suffix.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_dedup_syntax::parse;

    fn calls(tree: &SyntaxTree, name: &str) -> Vec<NodeId> {
        tree.descendants(tree.root())
            .into_iter()
            .filter(|id| matches!(tree.kind(*id), NodeKind::MethodCall { name: n, .. } if n == name))
            .collect()
    }

    #[test]
    fn literal_arguments_pick_the_overload() {
        let source = r#"
class A {
    void log(String s) {}
    void log(int i) {}
    void run() { log("x"); log(1); log(value()); }
    int value() { return 1; }
}
"#;
        let ws = Workspace::from_sources([("A.java", source)]).unwrap();
        let file = FileId::new("A.java");
        let tree = ws.tree(&file).unwrap();
        let found = calls(tree, "log");
        let resolver = WorkspaceResolver;

        let first = resolver.resolve_call(&ws, &file, found[0]).unwrap();
        assert_eq!(first.signature(&ws).unwrap().to_string(), "log(String)");
        let second = resolver.resolve_call(&ws, &file, found[1]).unwrap();
        assert_eq!(second.signature(&ws).unwrap().to_string(), "log(int)");
        assert!(resolver.resolve_call(&ws, &file, found[2]).is_none());
    }

    #[test]
    fn resolution_walks_workspace_superclasses() {
        let ws = Workspace::from_sources([
            ("Base.java", "class Base { protected void helper(int x) {} }"),
            ("Child.java", "class Child extends Base { void run() { helper(2); } }"),
        ])
        .unwrap();
        let file = FileId::new("Child.java");
        let call = calls(ws.tree(&file).unwrap(), "helper")[0];
        let handle = WorkspaceResolver.resolve_call(&ws, &file, call).unwrap();
        assert_eq!(handle.file, FileId::new("Base.java"));
    }

    #[test]
    fn scanner_maps_through_imports_and_workspace_types() {
        let ws = Workspace::from_sources([
            (
                "src/a/Service.java",
                "package a;\nimport java.util.List;\nimport java.util.Map;\nimport static org.junit.Assert.assertTrue;\nimport b.*;\nclass Service {\n    void run(List<String> items) {\n        Helper h = new Helper();\n        assertTrue(items.isEmpty());\n    }\n}\n",
            ),
            ("src/b/Helper.java", "package b;\npublic class Helper {}\n"),
        ])
        .unwrap();
        let file = FileId::new("src/a/Service.java");
        let tree = ws.tree(&file).unwrap();
        let callable = tree.find_method(tree.find_type("Service").unwrap(), "run").unwrap();
        let names = ImportScanner.required_names(&ws, &file, callable);
        assert_eq!(
            names,
            vec![
                "b.Helper".to_string(),
                "java.util.List".to_string(),
                "org.junit.Assert.assertTrue".to_string(),
            ]
        );
    }

    #[test]
    fn classifier_accepts_immutables_and_doubles() {
        let classifier = HeuristicClassifier;
        assert!(classifier.is_shareable("String"));
        assert!(classifier.is_shareable("java.math.BigDecimal"));
        assert!(classifier.is_shareable("Optional<User>"));
        assert!(classifier.is_shareable("PaymentGatewayStub"));
        assert!(classifier.is_shareable("MockMailer"));
        assert!(!classifier.is_shareable("List<String>"));
        assert!(!classifier.is_shareable("int[]"));
        assert!(!classifier.is_shareable("StringBuilder"));
        assert!(!classifier.is_shareable("Mock"));
    }
}
