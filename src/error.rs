use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TemplateError {
    #[error("Unterminated tag: missing closing '{0}'")]
    UnterminatedTag(String),

    #[error("Malformed tag: {0}")]
    MalformedTag(String),

    #[error("Malformed condition: {0}")]
    MalformedCondition(String),

    #[error("Unbalanced '{0}' tag outside of an open block")]
    UnbalancedTag(String),

    #[error("Unclosed block at end of template")]
    UnclosedBlock,

    #[error("Import depth limit ({0}) exceeded")]
    ImportDepthExceeded(usize),

    #[error("Cannot import '{file}': {message}")]
    ImportFailed { file: String, message: String },
}

#[derive(Error, Debug)]
pub enum SpecError {
    #[error("Spec file not found: {0}")]
    Missing(PathBuf),

    #[error("Cannot read spec file {path}: {message}")]
    Unreadable { path: PathBuf, message: String },

    #[error("Malformed spec file {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Parameter '{id}': default index {index} is out of range for {count} options")]
    OptionOutOfRange {
        id: String,
        index: usize,
        count: usize,
    },

    #[error("Invalid condition '{condition}' in spec: {source}")]
    InvalidCondition {
        condition: String,
        source: TemplateError,
    },

    #[error("Invalid file pattern '{pattern}' in spec: {message}")]
    InvalidFilePattern { pattern: String, message: String },
}
