//! Strategy executors.
//!
//! Each executor borrows the workspace, stages its edits on a [`ChangeSet`]
//! and renders the touched files. Returning an error drops the change set, so
//! a failed strategy never produces partial output.

mod helper_method;
mod parent_class;
mod setup_hook;
mod utility_class;

pub(crate) use helper_method::extract_helper_method;
pub(crate) use parameterized_test::extract_parameterized_test;
pub(crate) use parent_class::extract_parent_class;
pub(crate) use setup_hook::extract_setup_hook;
pub(crate) use utility_class::extract_utility_class;

use std::collections::HashSet;

use nova_dedup_syntax::{NodeId, SyntaxTree};

use crate::config::DedupConfig;
use crate::error::RefactorError;
use crate::model::{Occurrence, RefactoringKind, RefactoringResult};
use crate::naming::NameGenerator;
use crate::semantic::{CallResolver, DependencyDiscovery, MutabilityClassifier};
use crate::workspace::{verify_occurrence, ChangeSet, Workspace};

/// Everything an executor needs for one invocation.
pub(crate) struct StrategyContext<'a> {
    pub(crate) ws: &'a Workspace,
    pub(crate) config: &'a DedupConfig,
    pub(crate) resolver: &'a dyn CallResolver,
    pub(crate) discovery: &'a dyn DependencyDiscovery,
    pub(crate) classifier: &'a dyn MutabilityClassifier,
    pub(crate) naming: &'a mut NameGenerator,
}

/// An occurrence checked against its tree, with the enclosing declarations.
pub(crate) struct Located<'a> {
    pub(crate) occurrence: &'a Occurrence,
    pub(crate) tree: &'a SyntaxTree,
    pub(crate) class: NodeId,
    pub(crate) body: NodeId,
}

impl<'a> Located<'a> {
    pub(crate) fn new(ws: &'a Workspace, occurrence: &'a Occurrence) -> Result<Self, RefactorError> {
        let tree = ws.require(&occurrence.file)?;
        let body = verify_occurrence(tree, occurrence)?;
        let class = tree.enclosing_type(occurrence.callable).ok_or_else(|| {
            RefactorError::InvalidOccurrence {
                file: occurrence.file.clone(),
                reason: "callable has no enclosing type".to_string(),
            }
        })?;
        Ok(Self {
            occurrence,
            tree,
            class,
            body,
        })
    }

    pub(crate) fn class_name(&self) -> &'a str {
        self.tree
            .type_decl(self.class)
            .map(|decl| decl.name.as_str())
            .unwrap_or_default()
    }

    pub(crate) fn callable_name(&self) -> &'a str {
        self.tree
            .method(self.occurrence.callable)
            .map(|decl| decl.name.as_str())
            .unwrap_or_default()
    }
}

/// Locates every occurrence of `occurrences`, failing on the first bad one.
pub(crate) fn locate_all<'a>(
    ws: &'a Workspace,
    occurrences: &[&'a Occurrence],
) -> Result<Vec<Located<'a>>, RefactorError> {
    occurrences
        .iter()
        .map(|occurrence| Located::new(ws, occurrence))
        .collect()
}

/// Keeps the first located occurrence of each callable.
pub(crate) fn unique_callables<'a>(sites: Vec<Located<'a>>) -> Vec<Located<'a>> {
    let mut seen = HashSet::new();
    sites
        .into_iter()
        .filter(|site| seen.insert((site.occurrence.file.clone(), site.occurrence.callable)))
        .collect()
}

/// Detaches an occurrence's run from its body after checking it is still in
/// place. Runs sharing a body must be removed from the last one backwards.
pub(crate) fn remove_run(tree: &mut SyntaxTree, site: &Located<'_>) -> Result<(), RefactorError> {
    let occurrence = site.occurrence;
    let end = occurrence.start + occurrence.len();
    let intact = tree
        .block_statements(site.body)
        .get(occurrence.start..end)
        .is_some_and(|current| current == occurrence.statements.as_slice());
    if !intact {
        return Err(RefactorError::InvalidOccurrence {
            file: occurrence.file.clone(),
            reason: format!("overlapping statement runs in `{}`", site.callable_name()),
        });
    }
    tree.remove_statements(site.body, occurrence.start, occurrence.len());
    Ok(())
}

pub(crate) fn finish(
    changes: ChangeSet<'_>,
    kind: RefactoringKind,
    description: String,
) -> RefactoringResult {
    let files = changes.render();
    tracing::info!(
        target = "nova.dedup.strategies",
        kind = ?kind,
        files = files.len(),
        created = changes.created().len(),
        "{description}"
    );
    RefactoringResult {
        files,
        kind,
        description,
    }
}
