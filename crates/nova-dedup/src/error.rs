use nova_dedup_syntax::ParseError;
use thiserror::Error;

use crate::model::{FileId, Strategy};
use crate::validator::ValidationReport;

#[derive(Debug, Error)]
pub enum RefactorError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("unknown file {0:?}")]
    UnknownFile(FileId),
    #[error("file {0:?} already exists")]
    FileExists(FileId),
    #[error("invalid occurrence in {file:?}: {reason}")]
    InvalidOccurrence { file: FileId, reason: String },
    #[error("validation failed: {0}")]
    Validation(ValidationReport),
    #[error("strategy {0:?} cannot be applied automatically")]
    UnsupportedStrategy(Strategy),
    #[error("`{name}` cannot be made static: {reason}")]
    NotStaticCompatible { name: String, reason: String },
    #[error("need at least {required} consistent occurrences, found {found}")]
    InsufficientOccurrences { required: usize, found: usize },
    #[error("test method `{0}` is already parameterized")]
    AlreadyParameterized(String),
    #[error("literal alignment failed: {0}")]
    LiteralAlignment(String),
    #[error("body of `{other}` differs from `{primary}`")]
    BodyMismatch { primary: String, other: String },
    #[error("class `{class}` already extends `{existing}`")]
    ConflictingSuperclass { class: String, existing: String },
    #[error("cannot extract parent class: {0}")]
    ParentClass(String),
    #[error("cannot extract helper method: {0}")]
    HelperMethod(String),
    #[error("`{0}` is not a test class")]
    NotATestClass(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(#[from] toml::de::Error),
}
