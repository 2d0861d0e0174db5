//! Collision-free names for members introduced by refactorings.
//!
//! A [`NameGenerator`] lives for a whole session. Each request walks a
//! fallback chain (fixed name, preferred strategy, return-variable hint, AI
//! suggestion, semantic analysis, sequential counter), then the result is made
//! unique against the destination's methods and every name issued before.

use std::collections::HashSet;

use nova_dedup_syntax::{render_node, NodeId, NodeKind, SyntaxTree};

use crate::ai::{OpenAiCompatibleGenerator, TextGenerator};
use crate::analysis::{
    camel_words, capitalize, is_java_lang_type, is_valid_identifier, nodes_under,
    simple_type_name, top_level_locals,
};
use crate::config::{NamingConfig, NamingStrategy};

const VERBS: &[&str] = &[
    "get", "set", "create", "build", "validate", "check", "calculate", "compute", "process",
    "parse", "format", "convert", "load", "save", "find", "update", "delete", "remove", "add",
    "send", "handle", "initialize", "init", "fetch", "read", "write", "print", "render", "apply",
    "verify", "prepare", "assert",
];

const GENERIC_SUFFIXES: &[&str] = &["Impl", "Dto", "DTO", "Data", "Info", "Object", "Bean", "Entity"];

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "of", "to", "value", "result", "temp", "tmp", "data", "item", "obj", "var",
    "val", "it",
];

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void", "var",
];

/// Inputs for one name.
#[derive(Clone, Debug, Default)]
pub struct NameRequest<'a> {
    pub fixed: Option<String>,
    pub preferred: Option<NamingStrategy>,
    pub return_hint: Option<String>,
    pub tree: Option<&'a SyntaxTree>,
    pub statements: Vec<NodeId>,
    /// Method names already declared by the receiving class.
    pub existing: Vec<String>,
}

impl<'a> NameRequest<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixed(mut self, name: impl Into<String>) -> Self {
        self.fixed = Some(name.into());
        self
    }

    pub fn preferred(mut self, strategy: NamingStrategy) -> Self {
        self.preferred = Some(strategy);
        self
    }

    pub fn return_hint(mut self, hint: impl Into<String>) -> Self {
        self.return_hint = Some(hint.into());
        self
    }

    pub fn statements(mut self, tree: &'a SyntaxTree, statements: &[NodeId]) -> Self {
        self.tree = Some(tree);
        self.statements = statements.to_vec();
        self
    }

    pub fn existing<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.existing.extend(names.into_iter().map(Into::into));
        self
    }
}

/// Session-scoped name generator.
pub struct NameGenerator {
    config: NamingConfig,
    ai: Option<Box<dyn TextGenerator>>,
    issued: HashSet<String>,
    counter: usize,
}

impl NameGenerator {
    /// Builds a generator; an AI client is created when `config.ai.enabled`.
    ///
    /// A misconfigured AI client is logged and left out.
    pub fn new(config: NamingConfig) -> Self {
        let ai: Option<Box<dyn TextGenerator>> = if config.ai.enabled {
            match OpenAiCompatibleGenerator::from_config(&config.ai) {
                Ok(generator) => Some(Box::new(generator)),
                Err(err) => {
                    tracing::warn!(
                        target = "nova.dedup.naming",
                        error = %err,
                        "AI naming disabled: invalid configuration"
                    );
                    None
                }
            }
        } else {
            None
        };
        Self {
            config,
            ai,
            issued: HashSet::new(),
            counter: 0,
        }
    }

    pub fn with_text_generator(mut self, generator: Box<dyn TextGenerator>) -> Self {
        self.ai = Some(generator);
        self
    }

    /// Every name handed out so far.
    pub fn issued(&self) -> &HashSet<String> {
        &self.issued
    }

    /// Produces a name unique within the destination and this session.
    pub fn generate(&mut self, request: &NameRequest<'_>) -> String {
        let (base, source) = self.choose(request);
        let name = self.uniquify(&base, &request.existing);
        tracing::debug!(
            target = "nova.dedup.naming",
            name = %name,
            base = %base,
            source,
            "chose name"
        );
        self.issued.insert(name.clone());
        name
    }

    fn choose(&mut self, request: &NameRequest<'_>) -> (String, &'static str) {
        if let Some(fixed) = request.fixed.as_deref().filter(|n| is_valid_identifier(n)) {
            return (fixed.to_string(), "fixed");
        }

        let mut ai_tried = false;
        let preferred = request.preferred.or(self.config.preferred);
        match preferred {
            Some(NamingStrategy::Sequential) => return (self.sequential(), "sequential"),
            Some(NamingStrategy::Semantic) => {
                if let Some(name) = self.semantic(request) {
                    return (name, "semantic");
                }
            }
            Some(NamingStrategy::Ai) => {
                ai_tried = true;
                if let Some(name) = self.ai_suggestion(request) {
                    return (name, "ai");
                }
            }
            None => {}
        }

        if let Some(hint) = request.return_hint.as_deref() {
            let name = format!("get{}", capitalize(hint));
            if is_valid_identifier(&name) {
                return (name, "return_hint");
            }
        }
        if !ai_tried {
            if let Some(name) = self.ai_suggestion(request) {
                return (name, "ai");
            }
        }
        if let Some(name) = self.semantic(request) {
            return (name, "semantic");
        }
        (self.sequential(), "sequential")
    }

    fn sequential(&mut self) -> String {
        self.counter += 1;
        format!("{}{}", self.config.sequential_prefix, self.counter)
    }

    fn uniquify(&self, base: &str, existing: &[String]) -> String {
        let taken = |name: &str| self.issued.contains(name) || existing.iter().any(|e| e == name);
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{base}{n}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn ai_suggestion(&self, request: &NameRequest<'_>) -> Option<String> {
        let generator = self.ai.as_ref()?;
        let tree = request.tree?;
        let code = request
            .statements
            .iter()
            .map(|id| render_node(tree, *id))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Suggest one concise lowerCamelCase Java method name for code that performs the \
             following statements. Reply with the name only.\n\n{code}"
        );
        match generator.generate(&prompt) {
            Ok(text) => {
                let candidate = clean_suggestion(&text);
                let acceptable = is_valid_identifier(&candidate)
                    && candidate.starts_with(char::is_lowercase)
                    && candidate.len() <= self.config.max_length;
                if acceptable {
                    Some(candidate)
                } else {
                    tracing::debug!(
                        target = "nova.dedup.naming",
                        suggestion = %text.trim(),
                        "discarding unusable AI suggestion"
                    );
                    None
                }
            }
            Err(err) => {
                tracing::debug!(
                    target = "nova.dedup.naming",
                    error = %err,
                    "AI naming failed, falling through"
                );
                None
            }
        }
    }

    fn semantic(&self, request: &NameRequest<'_>) -> Option<String> {
        let tree = request.tree?;
        let calls: Vec<(String, Vec<String>)> = nodes_under(tree, &request.statements)
            .into_iter()
            .filter_map(|id| match tree.kind(id) {
                NodeKind::MethodCall { name, .. } if name != "this" && name != "super" => {
                    split_verb(name)
                }
                _ => None,
            })
            .collect();
        let (verb, words) = calls.first()?;

        let object = if words.is_empty() {
            declared_object(tree, &request.statements)?
        } else {
            words.concat()
        };
        let second = calls
            .iter()
            .skip(1)
            .filter(|(v, words)| v == verb && !words.is_empty())
            .map(|(_, words)| words.concat())
            .find(|other| *other != object);

        let mut name = format!("{verb}{object}");
        if let Some(second) = second {
            let combined = format!("{name}And{second}");
            if combined.len() <= self.config.max_length {
                name = combined;
            }
        }
        let acceptable = is_valid_identifier(&name)
            && name.len() <= self.config.max_length
            && !VERBS.contains(&name.as_str());
        acceptable.then_some(name)
    }
}

/// Splits a call name into a known verb and its filtered object words.
fn split_verb(name: &str) -> Option<(String, Vec<String>)> {
    let words = camel_words(name);
    let (first, rest) = words.split_first()?;
    let verb = first.to_lowercase();
    if !VERBS.contains(&verb.as_str()) {
        return None;
    }
    Some((verb, object_words(rest)))
}

fn object_words(words: &[String]) -> Vec<String> {
    words
        .iter()
        .filter(|w| w.chars().count() > 1 && !GENERIC_SUFFIXES.contains(&w.as_str()))
        .filter(|w| !STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .map(|w| capitalize(w))
        .collect()
}

/// Object derived from the types, then the names, of declared locals.
fn declared_object(tree: &SyntaxTree, statements: &[NodeId]) -> Option<String> {
    let locals = top_level_locals(tree, statements);
    let from_types = locals.iter().find_map(|(_, ty)| {
        let simple = simple_type_name(ty);
        if PRIMITIVES.contains(&simple) || is_java_lang_type(simple) {
            return None;
        }
        let words = object_words(&camel_words(simple));
        (!words.is_empty()).then(|| words.concat())
    });
    from_types.or_else(|| {
        locals.iter().find_map(|(name, _)| {
            let words = object_words(&camel_words(name));
            (!words.is_empty()).then(|| words.concat())
        })
    })
}

/// First token of a model reply with quotes, backticks and `()` removed.
fn clean_suggestion(text: &str) -> String {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let token = line.split_whitespace().next().unwrap_or("");
    token
        .trim_matches(|c: char| matches!(c, '`' | '"' | '\'' | '.' | ','))
        .trim_end_matches("()")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiError;
    use nova_dedup_syntax::parse;

    fn statements(tree: &SyntaxTree) -> Vec<NodeId> {
        let class = tree.top_level_types()[0];
        let method = tree.methods_of(class)[0];
        let body = tree.method(method).and_then(|m| m.body).unwrap();
        tree.block_statements(body).to_vec()
    }

    struct Fixed(Result<String, AiError>);

    impl TextGenerator for Fixed {
        fn generate(&self, _prompt: &str) -> Result<String, AiError> {
            self.0.clone()
        }
    }

    #[test]
    fn semantic_names_combine_verb_and_object() {
        let tree = parse("class A { void m() { validateUserDto(u); validateAddress(a); } }").unwrap();
        let stmts = statements(&tree);
        let mut names = NameGenerator::new(NamingConfig::default());
        let name = names.generate(&NameRequest::new().statements(&tree, &stmts));
        assert_eq!(name, "validateUserAndAddress");
    }

    #[test]
    fn object_falls_back_to_declared_types() {
        let tree = parse("class A { void m() { OrderEntity order = build(); } }").unwrap();
        let stmts = statements(&tree);
        let mut names = NameGenerator::new(NamingConfig::default());
        assert_eq!(
            names.generate(&NameRequest::new().statements(&tree, &stmts)),
            "buildOrder"
        );
    }

    #[test]
    fn bare_verbs_fall_back_to_sequential_names() {
        let tree = parse("class A { void m() { int x = 1; process(x); } }").unwrap();
        let stmts = statements(&tree);
        let mut names = NameGenerator::new(NamingConfig::default());
        assert_eq!(
            names.generate(&NameRequest::new().statements(&tree, &stmts)),
            "extractedMethod1"
        );
    }

    #[test]
    fn names_are_unique_per_session_and_destination() {
        let mut names = NameGenerator::new(NamingConfig::default());
        let request = NameRequest::new().fixed("setUpData");
        assert_eq!(names.generate(&request), "setUpData");
        assert_eq!(names.generate(&request), "setUpData1");
        let request = NameRequest::new().fixed("run").existing(["run", "run1"]);
        assert_eq!(names.generate(&request), "run2");
    }

    #[test]
    fn return_hint_produces_getter_name() {
        let mut names = NameGenerator::new(NamingConfig::default());
        assert_eq!(
            names.generate(&NameRequest::new().return_hint("total")),
            "getTotal"
        );
    }

    #[test]
    fn ai_suggestions_are_cleaned_and_failures_fall_through() {
        let tree = parse("class A { void m() { x(); } }").unwrap();
        let stmts = statements(&tree);
        let request = NameRequest::new().statements(&tree, &stmts);

        let mut names = NameGenerator::new(NamingConfig::default())
            .with_text_generator(Box::new(Fixed(Ok("`normalizeInput()`\n".into()))));
        assert_eq!(names.generate(&request), "normalizeInput");

        let mut names = NameGenerator::new(NamingConfig::default())
            .with_text_generator(Box::new(Fixed(Err(AiError::Timeout))));
        assert_eq!(names.generate(&request), "extractedMethod1");

        let mut names = NameGenerator::new(NamingConfig::default())
            .with_text_generator(Box::new(Fixed(Ok("Not A Name!".into()))));
        assert_eq!(names.generate(&request), "extractedMethod1");
    }
}
