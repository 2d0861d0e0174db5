use std::collections::BTreeMap;

use nova_dedup_syntax::{parse, render, NodeId, SyntaxTree};

use crate::error::RefactorError;
use crate::model::{FileId, Occurrence};

/// Parsed files owned by the caller.
///
/// Refactorings only borrow the workspace; every edit is staged on a
/// [`ChangeSet`] and returned as text.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    files: BTreeMap<FileId, SyntaxTree>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: FileId, tree: SyntaxTree) -> Option<SyntaxTree> {
        self.files.insert(file, tree)
    }

    /// Parses `text` and stores it under `file`.
    pub fn add_source(&mut self, file: FileId, text: &str) -> Result<(), RefactorError> {
        let tree = parse(text)?;
        self.files.insert(file, tree);
        Ok(())
    }

    pub fn from_sources<I, P, T>(sources: I) -> Result<Self, RefactorError>
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: AsRef<str>,
    {
        let mut ws = Workspace::new();
        for (path, text) in sources {
            ws.add_source(FileId::new(path), text.as_ref())?;
        }
        Ok(ws)
    }

    pub fn tree(&self, file: &FileId) -> Option<&SyntaxTree> {
        self.files.get(file)
    }

    pub(crate) fn require(&self, file: &FileId) -> Result<&SyntaxTree, RefactorError> {
        self.tree(file)
            .ok_or_else(|| RefactorError::UnknownFile(file.clone()))
    }

    pub fn files(&self) -> impl Iterator<Item = (&FileId, &SyntaxTree)> {
        self.files.iter()
    }

    pub fn contains(&self, file: &FileId) -> bool {
        self.files.contains_key(file)
    }

    /// Finds a type declaration by simple name across every file.
    ///
    /// Files are searched in path order; the first match wins.
    pub fn find_type(&self, name: &str) -> Option<(&FileId, NodeId)> {
        self.files
            .iter()
            .find_map(|(file, tree)| tree.find_type(name).map(|id| (file, id)))
    }

    /// Builds an [`Occurrence`] from names and statement offsets.
    ///
    /// `method` may name a constructor by its class name.
    pub fn locate_occurrence(
        &self,
        file: &FileId,
        class: &str,
        method: &str,
        start: usize,
        count: usize,
    ) -> Result<Occurrence, RefactorError> {
        let tree = self.require(file)?;
        let invalid = |reason: String| RefactorError::InvalidOccurrence {
            file: file.clone(),
            reason,
        };
        let type_id = tree
            .find_type(class)
            .ok_or_else(|| invalid(format!("no type named `{class}`")))?;
        let callable = tree
            .methods_of(type_id)
            .into_iter()
            .find(|m| tree.method(*m).is_some_and(|decl| decl.name == method))
            .ok_or_else(|| invalid(format!("no method `{method}` in `{class}`")))?;
        let body = tree
            .method(callable)
            .and_then(|decl| decl.body)
            .ok_or_else(|| invalid(format!("`{method}` has no body")))?;
        let statements = tree.block_statements(body);
        let end = start
            .checked_add(count)
            .filter(|end| *end <= statements.len() && count > 0)
            .ok_or_else(|| {
                invalid(format!(
                    "statements {start}..{} out of range for `{method}` ({} statements)",
                    start.saturating_add(count),
                    statements.len()
                ))
            })?;
        Ok(Occurrence::new(
            file.clone(),
            callable,
            start,
            statements[start..end].to_vec(),
        ))
    }
}

/// Copy-on-write working trees for one refactoring invocation.
///
/// Reads fall through to the workspace until a file is first written.
/// Dropping the change set discards every staged edit.
pub(crate) struct ChangeSet<'ws> {
    workspace: &'ws Workspace,
    trees: BTreeMap<FileId, SyntaxTree>,
    created: Vec<FileId>,
}

impl<'ws> ChangeSet<'ws> {
    pub(crate) fn new(workspace: &'ws Workspace) -> Self {
        Self {
            workspace,
            trees: BTreeMap::new(),
            created: Vec::new(),
        }
    }

    pub(crate) fn tree_mut(&mut self, file: &FileId) -> Result<&mut SyntaxTree, RefactorError> {
        if !self.trees.contains_key(file) {
            let original = self.workspace.require(file)?.clone();
            self.trees.insert(file.clone(), original);
        }
        self.trees
            .get_mut(file)
            .ok_or_else(|| RefactorError::UnknownFile(file.clone()))
    }

    /// Stages a brand-new file. Fails if the path is already taken.
    pub(crate) fn create(&mut self, file: FileId, tree: SyntaxTree) -> Result<(), RefactorError> {
        if self.workspace.contains(&file) || self.trees.contains_key(&file) {
            return Err(RefactorError::FileExists(file));
        }
        self.created.push(file.clone());
        self.trees.insert(file, tree);
        Ok(())
    }

    pub(crate) fn created(&self) -> &[FileId] {
        &self.created
    }

    /// Renders every touched file.
    pub(crate) fn render(&self) -> BTreeMap<FileId, String> {
        self.trees
            .iter()
            .map(|(file, tree)| (file.clone(), render(tree)))
            .collect()
    }
}

/// Checks that `occurrence` still addresses a contiguous statement run.
pub(crate) fn verify_occurrence(
    tree: &SyntaxTree,
    occurrence: &Occurrence,
) -> Result<NodeId, RefactorError> {
    let invalid = |reason: &str| RefactorError::InvalidOccurrence {
        file: occurrence.file.clone(),
        reason: reason.to_string(),
    };
    if occurrence.is_empty() {
        return Err(invalid("no statements"));
    }
    if !tree.contains(occurrence.callable) || tree.method(occurrence.callable).is_none() {
        return Err(invalid("callable handle does not name a method"));
    }
    let body = tree
        .method(occurrence.callable)
        .and_then(|decl| decl.body)
        .ok_or_else(|| invalid("callable has no body"))?;
    let statements = tree.block_statements(body);
    let end = occurrence.start + occurrence.len();
    if end > statements.len() {
        return Err(invalid("statement run exceeds the body"));
    }
    if statements[occurrence.start..end] != occurrence.statements[..] {
        return Err(invalid("statement handles do not match the recorded offset"));
    }
    Ok(body)
}
