//! The refactoring entry point.

use crate::ai::TextGenerator;
use crate::config::DedupConfig;
use crate::dead_code::remove_dead_code;
use crate::error::RefactorError;
use crate::model::{Cluster, Recommendation, RefactoringResult, Strategy};
use crate::naming::NameGenerator;
use crate::semantic::{
    CallResolver, DependencyDiscovery, HeuristicClassifier, ImportScanner, MutabilityClassifier,
    WorkspaceResolver,
};
use crate::strategies::{self, StrategyContext};
use crate::validator::{self, validate_setup_hook, ValidationReport};
use crate::workspace::Workspace;

/// Validates and applies refactorings for clusters of duplicated code.
///
/// One engine is one naming session: names it hands out are never reused,
/// even across clusters.
pub struct RefactoringEngine {
    config: DedupConfig,
    resolver: Box<dyn CallResolver>,
    discovery: Box<dyn DependencyDiscovery>,
    classifier: Box<dyn MutabilityClassifier>,
    naming: NameGenerator,
}

impl RefactoringEngine {
    pub fn new(config: DedupConfig) -> Self {
        let naming = NameGenerator::new(config.naming.clone());
        Self {
            config,
            resolver: Box::new(WorkspaceResolver),
            discovery: Box::new(ImportScanner),
            classifier: Box::new(HeuristicClassifier),
            naming,
        }
    }

    pub fn with_resolver(mut self, resolver: Box<dyn CallResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_discovery(mut self, discovery: Box<dyn DependencyDiscovery>) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn MutabilityClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Routes AI naming through `generator` instead of the configured client.
    pub fn with_text_generator(mut self, generator: Box<dyn TextGenerator>) -> Self {
        self.naming = self.naming.with_text_generator(generator);
        self
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    pub fn naming(&self) -> &NameGenerator {
        &self.naming
    }

    pub fn validate(
        &self,
        ws: &Workspace,
        cluster: &Cluster,
        recommendation: &Recommendation,
    ) -> ValidationReport {
        validator::validate(ws, cluster, recommendation, &self.config.validator)
    }

    /// Validates the recommendation, then runs its strategy.
    ///
    /// Nothing in `ws` changes; the result carries the new text of every
    /// touched file.
    pub fn apply(
        &mut self,
        ws: &Workspace,
        cluster: &Cluster,
        recommendation: &Recommendation,
    ) -> Result<RefactoringResult, RefactorError> {
        let report = self.validate(ws, cluster, recommendation);
        if !report.is_valid() {
            tracing::info!(
                target = "nova.dedup.engine",
                strategy = ?recommendation.strategy,
                errors = report.errors().count(),
                "refactoring rejected by validation"
            );
            return Err(RefactorError::Validation(report));
        }
        for warning in report.warnings() {
            tracing::warn!(
                target = "nova.dedup.engine",
                kind = ?warning.kind,
                "{}",
                warning.message
            );
        }

        let mut cx = self.context(ws);
        match recommendation.strategy {
            Strategy::ExtractHelperMethod => {
                strategies::extract_helper_method(&mut cx, cluster, recommendation)
            }
            Strategy::ExtractUtilityClass => {
                strategies::extract_utility_class(&mut cx, cluster, recommendation)
            }
            Strategy::ExtractParentClass => strategies::extract_parent_class(&mut cx, cluster),
            Strategy::ExtractParameterizedTest => {
                strategies::extract_parameterized_test(&mut cx, cluster)
            }
            strategy @ (Strategy::ConstructorDelegation | Strategy::ManualReviewRequired) => {
                Err(RefactorError::UnsupportedStrategy(strategy))
            }
        }
    }

    /// Moves statements shared by the tests of one class into its
    /// before-each hook.
    pub fn extract_setup_hook(
        &mut self,
        ws: &Workspace,
        cluster: &Cluster,
    ) -> Result<RefactoringResult, RefactorError> {
        let report = validate_setup_hook(ws, cluster, &self.config.validator);
        if !report.is_valid() {
            return Err(RefactorError::Validation(report));
        }
        let mut cx = self.context(ws);
        strategies::extract_setup_hook(&mut cx, cluster)
    }

    /// Removes unreferenced private methods from one rendered file.
    pub fn collect_dead_code(&self, text: &str) -> Result<(String, Vec<String>), RefactorError> {
        remove_dead_code(text, &self.config.dead_code)
    }

    fn context<'a>(&'a mut self, ws: &'a Workspace) -> StrategyContext<'a> {
        StrategyContext {
            ws,
            config: &self.config,
            resolver: self.resolver.as_ref(),
            discovery: self.discovery.as_ref(),
            classifier: self.classifier.as_ref(),
            naming: &mut self.naming,
        }
    }
}

impl Default for RefactoringEngine {
    fn default() -> Self {
        Self::new(DedupConfig::default())
    }
}
