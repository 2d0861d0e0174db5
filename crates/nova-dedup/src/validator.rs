//! Safety checks run before any strategy edits a file.
//!
//! Every check always runs so the caller sees all problems at once. Issues are
//! data, not errors: [`ValidationReport::is_valid`] decides whether the
//! refactoring may proceed and warnings never block.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use nova_dedup_syntax::{Modifier, NodeId, NodeKind, SyntaxTree, TypeKind};
use serde::{Deserialize, Serialize};

use crate::analysis::{self, callable_scope, declared_names, mutated_names, simple_type_name};
use crate::config::ValidatorConfig;
use crate::model::{Cluster, FileId, Occurrence, Recommendation, Strategy, VariationKind};
use crate::workspace::{verify_occurrence, Workspace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    NameCollision,
    EscapingMutation,
    ControlFlowDivergence,
    TooManyParameters,
    FinalFieldAssignment,
    NestedType,
    InvalidOccurrence,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    pub message: String,
    #[serde(default)]
    pub file: Option<FileId>,
}

impl ValidationIssue {
    fn error(kind: IssueKind, file: Option<&FileId>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            file: file.cloned(),
        }
    }

    fn warning(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            message: message.into(),
            file: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn has(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.errors().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(&issue.message)?;
        }
        Ok(())
    }
}

/// Validates a strategy recommendation for `cluster`.
pub fn validate(
    ws: &Workspace,
    cluster: &Cluster,
    recommendation: &Recommendation,
    config: &ValidatorConfig,
) -> ValidationReport {
    run_checks(ws, cluster, Some(recommendation), config)
}

/// Validation for setup-hook extraction, which is not a [`Strategy`].
///
/// Name collision and nested-type checks do not apply.
pub(crate) fn validate_setup_hook(
    ws: &Workspace,
    cluster: &Cluster,
    config: &ValidatorConfig,
) -> ValidationReport {
    run_checks(ws, cluster, None, config)
}

fn run_checks(
    ws: &Workspace,
    cluster: &Cluster,
    recommendation: Option<&Recommendation>,
    config: &ValidatorConfig,
) -> ValidationReport {
    let strategy = recommendation.map(|r| r.strategy);
    let mut report = ValidationReport::default();
    let occurrences = cluster.all_occurrences();

    let mut sites = Vec::new();
    for occurrence in &occurrences {
        match Site::resolve(ws, occurrence) {
            Ok(site) => sites.push(site),
            Err(reason) => report.issues.push(ValidationIssue::error(
                IssueKind::InvalidOccurrence,
                Some(&occurrence.file),
                reason,
            )),
        }
    }

    if strategy == Some(Strategy::ExtractHelperMethod) {
        if let Some(name) = recommendation.and_then(|r| r.suggested_name.as_deref()) {
            check_name_collision(&sites, name, &mut report);
        }
    }
    for site in &sites {
        check_escaping_mutations(ws, site, &mut report);
    }
    check_control_flow(cluster, &mut report);
    if let Some(recommendation) = recommendation {
        check_parameter_count(recommendation, config, &mut report);
    }
    if strategy != Some(Strategy::ConstructorDelegation) {
        for site in &sites {
            check_final_field_assignments(site, &mut report);
        }
    }
    if strategy == Some(Strategy::ExtractParentClass) {
        for site in &sites {
            check_nesting(site, &mut report);
        }
    }

    tracing::debug!(
        target = "nova.dedup.validator",
        strategy = ?strategy,
        occurrences = occurrences.len(),
        errors = report.errors().count(),
        warnings = report.warnings().count(),
        "validated cluster"
    );
    report
}

/// One occurrence with its tree and enclosing declarations looked up.
struct Site<'a> {
    occurrence: &'a Occurrence,
    tree: &'a SyntaxTree,
    class: NodeId,
}

impl<'a> Site<'a> {
    fn resolve(ws: &'a Workspace, occurrence: &'a Occurrence) -> Result<Self, String> {
        let tree = ws
            .tree(&occurrence.file)
            .ok_or_else(|| format!("unknown file {}", occurrence.file))?;
        verify_occurrence(tree, occurrence).map_err(|err| err.to_string())?;
        let class = tree
            .enclosing_type(occurrence.callable)
            .ok_or_else(|| format!("callable in {} has no enclosing type", occurrence.file))?;
        Ok(Self {
            occurrence,
            tree,
            class,
        })
    }

    fn class_name(&self) -> &str {
        self.tree
            .type_decl(self.class)
            .map(|decl| decl.name.as_str())
            .unwrap_or_default()
    }

    fn callable_name(&self) -> &str {
        self.tree
            .method(self.occurrence.callable)
            .map(|decl| decl.name.as_str())
            .unwrap_or_default()
    }

    fn file(&self) -> &FileId {
        &self.occurrence.file
    }
}

fn check_name_collision(sites: &[Site<'_>], name: &str, report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for site in sites {
        if !seen.insert((site.file().clone(), site.class)) {
            continue;
        }
        if site.tree.method_names(site.class).iter().any(|m| m == name) {
            report.issues.push(ValidationIssue::error(
                IssueKind::NameCollision,
                Some(site.file()),
                format!("method `{name}` already exists in `{}`", site.class_name()),
            ));
        }
    }
}

/// Fields of `class` plus those of its superclasses declared in the workspace.
fn visible_fields(ws: &Workspace, tree: &SyntaxTree, class: NodeId) -> BTreeSet<String> {
    let mut fields: BTreeSet<String> = tree.field_names(class).into_iter().collect();
    let mut seen = HashSet::new();
    let mut extends = tree
        .type_decl(class)
        .and_then(|decl| decl.extends.clone());
    while let Some(parent) = extends {
        let name = simple_type_name(&parent).to_string();
        if !seen.insert(name.clone()) {
            break;
        }
        let Some((file, id)) = ws.find_type(&name) else {
            break;
        };
        let Some(parent_tree) = ws.tree(file) else {
            break;
        };
        fields.extend(parent_tree.field_names(id));
        extends = parent_tree
            .type_decl(id)
            .and_then(|decl| decl.extends.clone());
    }
    fields
}

fn check_escaping_mutations(ws: &Workspace, site: &Site<'_>, report: &mut ValidationReport) {
    let statements = &site.occurrence.statements;
    let declared = declared_names(site.tree, statements);
    let fields = visible_fields(ws, site.tree, site.class);
    let escaping: Vec<String> = mutated_names(site.tree, statements)
        .into_iter()
        .filter(|name| !declared.contains(name) && !fields.contains(name))
        .collect();
    if !escaping.is_empty() {
        report.issues.push(ValidationIssue::error(
            IssueKind::EscapingMutation,
            Some(site.file()),
            format!(
                "`{}` mutates outer variable(s) {}",
                site.callable_name(),
                escaping
                    .iter()
                    .map(|n| format!("`{n}`"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ));
    }
}

fn check_control_flow(cluster: &Cluster, report: &mut ValidationReport) {
    if cluster
        .pairs
        .iter()
        .any(|pair| pair.variation == VariationKind::ControlFlow)
    {
        report.issues.push(ValidationIssue::error(
            IssueKind::ControlFlowDivergence,
            None,
            "occurrences differ in control flow",
        ));
    }
}

fn check_parameter_count(
    recommendation: &Recommendation,
    config: &ValidatorConfig,
    report: &mut ValidationReport,
) {
    let count = recommendation.suggested_parameters.len();
    if count > config.max_parameters {
        report.issues.push(ValidationIssue::warning(
            IssueKind::TooManyParameters,
            format!(
                "{count} parameters exceed the recommended maximum of {}",
                config.max_parameters
            ),
        ));
    }
}

fn final_fields(tree: &SyntaxTree, class: NodeId) -> BTreeSet<String> {
    tree.fields_of(class)
        .into_iter()
        .filter(|field| field.modifiers.has(Modifier::Final))
        .flat_map(|field| field.declarators.iter().map(|d| d.name.clone()))
        .collect()
}

fn check_final_field_assignments(site: &Site<'_>, report: &mut ValidationReport) {
    let tree = site.tree;
    let finals = final_fields(tree, site.class);
    if finals.is_empty() {
        return;
    }
    let shadowing: BTreeSet<String> = callable_scope(tree, site.occurrence.callable)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    let class_name = site.class_name();

    let mut assigned = BTreeSet::new();
    for id in analysis::nodes_under(tree, &site.occurrence.statements) {
        let target = match tree.kind(id) {
            NodeKind::Assign { target, .. } => *target,
            NodeKind::Unary { op, operand, .. } if op == "++" || op == "--" => *operand,
            _ => continue,
        };
        let field = match tree.kind(target) {
            NodeKind::Name { ident } if !shadowing.contains(ident) => Some(ident),
            NodeKind::FieldAccess { target, name } => match tree.kind(*target) {
                NodeKind::This { qualifier: None } | NodeKind::Super { qualifier: None } => {
                    Some(name)
                }
                NodeKind::Name { ident } if ident == class_name => Some(name),
                _ => None,
            },
            _ => None,
        };
        if let Some(field) = field.filter(|f| finals.contains(*f)) {
            assigned.insert(field.clone());
        }
    }
    for field in assigned {
        report.issues.push(ValidationIssue::error(
            IssueKind::FinalFieldAssignment,
            Some(site.file()),
            format!("`{}` assigns final field `{field}`", site.callable_name()),
        ));
    }
}

fn check_nesting(site: &Site<'_>, report: &mut ValidationReport) {
    let tree = site.tree;
    let mut problems = Vec::new();
    if tree
        .type_decl(site.class)
        .is_some_and(|decl| decl.kind == TypeKind::Enum)
    {
        problems.push("is declared in an enum");
    }
    let direct_member = tree
        .parent(site.occurrence.callable)
        .is_some_and(|parent| parent == site.class);
    if !direct_member {
        problems.push("is not a direct member of its class");
    }
    if tree.enclosing_type(site.class).is_some() {
        problems.push("belongs to a nested class");
    }
    for problem in problems {
        report.issues.push(ValidationIssue::error(
            IssueKind::NestedType,
            Some(site.file()),
            format!("`{}` {problem}", site.callable_name()),
        ));
    }
}
