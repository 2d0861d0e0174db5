//! Refactorings that remove duplicated Java code.
//!
//! A duplicate detector reports a [`Cluster`] of matching statement runs and a
//! [`Recommendation`]. [`RefactoringEngine::apply`] checks that the edit is
//! safe and runs one of the strategies:
//! - extract a private helper method in each class holding a run
//! - extract a static method into a utility class
//! - extract a shared abstract parent class
//! - merge literal-only test variants into a `@ParameterizedTest`
//! - hoist shared test setup into a before-each hook
//!   ([`RefactoringEngine::extract_setup_hook`])
//!
//! The [`Workspace`] is never mutated; results are the full new text of every
//! touched file. [`dead_code`] offers a post-pass that drops private methods
//! left without callers.

pub mod ai;
pub mod config;
pub mod dead_code;
pub mod engine;
pub mod error;
pub mod imports;
pub mod model;
pub mod naming;
pub mod semantic;
pub mod validator;
pub mod workspace;

mod analysis;
mod strategies;

pub use ai::{AiError, OpenAiCompatibleGenerator, TextGenerator};
pub use config::{DedupConfig, NamingStrategy};
pub use dead_code::{collect_dead_code, remove_dead_code};
pub use engine::RefactoringEngine;
pub use error::{ConfigError, RefactorError};
pub use model::{
    Cluster, FileId, Occurrence, ParameterSpec, Recommendation, RefactoringKind,
    RefactoringResult, SimilarityPair, Strategy, VariationKind,
};
pub use naming::{NameGenerator, NameRequest};
pub use semantic::{
    CallResolver, DependencyDiscovery, HeuristicClassifier, ImportScanner, MethodHandle,
    MethodSignature, MutabilityClassifier, WorkspaceResolver,
};
pub use validator::{validate, IssueKind, Severity, ValidationIssue, ValidationReport};
pub use workspace::Workspace;
