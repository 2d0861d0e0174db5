use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine configuration, usually loaded from a `dedup.toml`.
///
/// Every field has a default, so an empty document is a valid config.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DedupConfig {
    pub validator: ValidatorConfig,
    pub naming: NamingConfig,
    pub utility: UtilityConfig,
    pub setup_hook: SetupHookConfig,
    pub parameterized: ParameterizedConfig,
    pub dead_code: DeadCodeConfig,
}

impl DedupConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file from TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Suggested parameter lists longer than this produce a warning.
    #[serde(default = "ValidatorConfig::default_max_parameters")]
    pub max_parameters: usize,
}

impl ValidatorConfig {
    fn default_max_parameters() -> usize {
        5
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_parameters: Self::default_max_parameters(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingStrategy {
    Sequential,
    Semantic,
    Ai,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamingConfig {
    /// Strategy tried before the regular fallback chain.
    #[serde(default)]
    pub preferred: Option<NamingStrategy>,

    /// Semantic names longer than this are rejected.
    #[serde(default = "NamingConfig::default_max_length")]
    pub max_length: usize,

    #[serde(default = "NamingConfig::default_sequential_prefix")]
    pub sequential_prefix: String,

    #[serde(default)]
    pub ai: AiNamingConfig,
}

impl NamingConfig {
    fn default_max_length() -> usize {
        40
    }

    fn default_sequential_prefix() -> String {
        "extractedMethod".to_string()
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            preferred: None,
            max_length: Self::default_max_length(),
            sequential_prefix: Self::default_sequential_prefix(),
            ai: AiNamingConfig::default(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint used for name suggestions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AiNamingConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Accepts both `http://host:port` and `http://host:port/v1`.
    #[serde(default = "AiNamingConfig::default_base_url")]
    pub base_url: String,

    #[serde(default = "AiNamingConfig::default_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "AiNamingConfig::default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "AiNamingConfig::default_max_tokens")]
    pub max_tokens: u32,
}

impl AiNamingConfig {
    fn default_base_url() -> String {
        "http://localhost:11434".to_string()
    }

    fn default_model() -> String {
        "llama3".to_string()
    }

    fn default_timeout_ms() -> u64 {
        // Naming is opportunistic; keep the blocking call short.
        10_000
    }

    fn default_max_tokens() -> u32 {
        64
    }
}

impl Default for AiNamingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: Self::default_base_url(),
            model: Self::default_model(),
            api_key: None,
            timeout_ms: Self::default_timeout_ms(),
            max_tokens: Self::default_max_tokens(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UtilityConfig {
    /// Sub-package (and sub-directory) receiving extracted utility classes.
    #[serde(default = "UtilityConfig::default_package_suffix")]
    pub package_suffix: String,
}

impl UtilityConfig {
    fn default_package_suffix() -> String {
        "util".to_string()
    }
}

impl Default for UtilityConfig {
    fn default() -> Self {
        Self {
            package_suffix: Self::default_package_suffix(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetupHookConfig {
    #[serde(default = "SetupHookConfig::default_method_name")]
    pub method_name: String,
}

impl SetupHookConfig {
    fn default_method_name() -> String {
        "setUp".to_string()
    }
}

impl Default for SetupHookConfig {
    fn default() -> Self {
        Self {
            method_name: Self::default_method_name(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterizedConfig {
    #[serde(default = "ParameterizedConfig::default_min_occurrences")]
    pub min_occurrences: usize,
}

impl ParameterizedConfig {
    fn default_min_occurrences() -> usize {
        3
    }
}

impl Default for ParameterizedConfig {
    fn default() -> Self {
        Self {
            min_occurrences: Self::default_min_occurrences(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeadCodeConfig {
    /// Annotations whose simple name ends with this marker name methods by string.
    #[serde(default = "DeadCodeConfig::default_method_source_marker")]
    pub method_source_marker: String,

    /// Simple names of annotations that keep a private method alive.
    #[serde(default = "DeadCodeConfig::default_preserved_annotations")]
    pub preserved_annotations: Vec<String>,
}

impl DeadCodeConfig {
    fn default_method_source_marker() -> String {
        "MethodSource".to_string()
    }

    fn default_preserved_annotations() -> Vec<String> {
        [
            "Test",
            "BeforeEach",
            "AfterEach",
            "BeforeAll",
            "AfterAll",
            "Before",
            "After",
            "BeforeClass",
            "AfterClass",
            "ParameterizedTest",
            "RepeatedTest",
            "TestFactory",
            "Bean",
        ]
        .into_iter()
        .map(str::to_string)
        .collect()
    }
}

impl Default for DeadCodeConfig {
    fn default() -> Self {
        Self {
            method_source_marker: Self::default_method_source_marker(),
            preserved_annotations: Self::default_preserved_annotations(),
        }
    }
}
