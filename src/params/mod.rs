//! Baseline parameter documents and the configuration sweep generator.

pub mod baseline;
pub mod configuration;
pub mod generator;
pub mod schema;

pub use baseline::{load_baseline, BaselineDocument};
pub use configuration::{ConfigId, ParameterConfiguration};
pub use generator::{get_num_combinations, Combinations, ConfigGenerator, ParameterCombination};
pub use schema::{ParameterField, ParameterSchema};

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can be wrong with a baseline or configuration document.
///
/// All of these are raised before any simulation is scheduled.
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{field}' must be {expected}")]
    WrongFieldType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),
    #[error("unexpected parameters: {}", .0.join(", "))]
    UnexpectedParameters(Vec<String>),
    #[error("parameter '{name}' must be a list of numbers")]
    NotAList { name: String },
    #[error("parameter '{name}' has no candidate values")]
    EmptyCandidates { name: String },
    #[error("parameter '{name}' candidate #{index} is not a number")]
    NonNumericCandidate { name: String, index: usize },
    #[error("configuration document has no numeric value at '{path}' for {name}")]
    MissingPath { name: String, path: String },
    #[error("configuration document does not match the scoring layout: {0}")]
    Layout(String),
    #[error("value {value} is not a candidate for parameter '{name}'")]
    NotACandidate { name: String, value: f64 },
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("configuration index overflows a space of {0} entries")]
    IndexOverflow(u128),
}
