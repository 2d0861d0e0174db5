use std::io::Write;

use nova_dedup::{ConfigError, DedupConfig, NamingStrategy};
use pretty_assertions::assert_eq;

#[test]
fn empty_config_uses_defaults() {
    let config = DedupConfig::from_toml_str("").unwrap();
    assert_eq!(config, DedupConfig::default());
    assert_eq!(config.validator.max_parameters, 5);
    assert_eq!(config.naming.max_length, 40);
    assert_eq!(config.naming.sequential_prefix, "extractedMethod");
    assert!(!config.naming.ai.enabled);
    assert_eq!(config.utility.package_suffix, "util");
    assert_eq!(config.setup_hook.method_name, "setUp");
    assert_eq!(config.parameterized.min_occurrences, 3);
    assert_eq!(config.dead_code.method_source_marker, "MethodSource");
    assert!(config
        .dead_code
        .preserved_annotations
        .iter()
        .any(|a| a == "BeforeEach"));
}

#[test]
fn loads_partial_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[validator]
max_parameters = 3

[naming]
preferred = "semantic"

[naming.ai]
enabled = true
base_url = "http://localhost:8080/v1"
model = "small-coder"
timeout_ms = 500

[setup_hook]
method_name = "init"
"#
    )
    .unwrap();

    let config = DedupConfig::load(file.path()).unwrap();
    assert_eq!(config.validator.max_parameters, 3);
    assert_eq!(config.naming.preferred, Some(NamingStrategy::Semantic));
    assert!(config.naming.ai.enabled);
    assert_eq!(config.naming.ai.model, "small-coder");
    assert_eq!(config.naming.ai.timeout_ms, 500);
    assert_eq!(config.naming.ai.max_tokens, 64);
    assert_eq!(config.setup_hook.method_name, "init");
    assert_eq!(config.utility.package_suffix, "util");
}

#[test]
fn unknown_fields_are_rejected() {
    let err = DedupConfig::from_toml_str("[utility]\npackage_suffx = \"helpers\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err}");

    let err = DedupConfig::from_toml_str("[strategies]\nenabled = true\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err}");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dedup.toml");
    let err = DedupConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "{err}");
}
