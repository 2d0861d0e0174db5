use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use nova_dedup_syntax::NodeId;
use serde::{Deserialize, Serialize};

/// Identifier for a workspace file (its path).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory part of the path, without a trailing separator.
    pub fn dir(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Path of `relative` next to this file.
    pub fn sibling(&self, relative: &str) -> FileId {
        let dir = self.dir();
        if dir.is_empty() {
            FileId::new(relative)
        } else {
            FileId::new(format!("{dir}/{relative}"))
        }
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One duplicated statement run inside one callable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Occurrence {
    pub file: FileId,
    /// The method or constructor containing the run.
    pub callable: NodeId,
    /// Offset of the first matched statement in its block.
    pub start: usize,
    pub statements: Vec<NodeId>,
}

/// Identity of an occurrence: the nodes it covers, never their text.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OccurrenceKey {
    pub file: FileId,
    pub callable: NodeId,
    pub statements: Vec<NodeId>,
}

impl Occurrence {
    pub fn new(file: FileId, callable: NodeId, start: usize, statements: Vec<NodeId>) -> Self {
        Self {
            file,
            callable,
            start,
            statements,
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey {
            file: self.file.clone(),
            callable: self.callable,
            statements: self.statements.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationKind {
    Identical,
    LiteralOnly,
    ControlFlow,
}

/// Two occurrences judged similar, stored directed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimilarityPair {
    pub first: Occurrence,
    pub second: Occurrence,
    pub variation: VariationKind,
}

/// One duplication finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    pub primary: Occurrence,
    pub pairs: Vec<SimilarityPair>,
}

impl Cluster {
    pub fn new(primary: Occurrence) -> Self {
        Self {
            primary,
            pairs: Vec::new(),
        }
    }

    /// Adds a pair linking the primary occurrence to `other`.
    pub fn with_peer(mut self, other: Occurrence, variation: VariationKind) -> Self {
        self.pairs.push(SimilarityPair {
            first: self.primary.clone(),
            second: other,
            variation,
        });
        self
    }

    /// Primary plus every paired occurrence, de-duplicated by node identity.
    ///
    /// Order is first-seen: the primary, then each pair's `first` and `second`.
    pub fn all_occurrences(&self) -> Vec<&Occurrence> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let candidates = std::iter::once(&self.primary)
            .chain(self.pairs.iter().flat_map(|p| [&p.first, &p.second]));
        for occurrence in candidates {
            if seen.insert(occurrence.key()) {
                out.push(occurrence);
            }
        }
        out
    }

    pub fn files(&self) -> BTreeSet<FileId> {
        self.all_occurrences()
            .into_iter()
            .map(|o| o.file.clone())
            .collect()
    }

    pub fn has_control_flow_variation(&self) -> bool {
        self.pairs
            .iter()
            .any(|p| p.variation == VariationKind::ControlFlow)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

impl ParameterSpec {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ExtractHelperMethod,
    ExtractUtilityClass,
    ExtractParentClass,
    ExtractParameterizedTest,
    ConstructorDelegation,
    ManualReviewRequired,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub strategy: Strategy,
    #[serde(default)]
    pub suggested_name: Option<String>,
    #[serde(default)]
    pub suggested_parameters: Vec<ParameterSpec>,
}

impl Recommendation {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            suggested_name: None,
            suggested_parameters: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.suggested_name = Some(name.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<ParameterSpec>) -> Self {
        self.suggested_parameters = parameters;
        self
    }
}

/// The executor that produced a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefactoringKind {
    HelperMethod,
    UtilityClass,
    ParentClass,
    ParameterizedTest,
    SetupHook,
}

/// Full replacement text of every touched file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactoringResult {
    pub files: BTreeMap<FileId, String>,
    pub kind: RefactoringKind,
    pub description: String,
}
