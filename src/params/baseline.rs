//! Baseline document loading and validation.
//!
//! The document shape is `{config_name, description, parameters}` where
//! `parameters` maps every schema name to a non-empty list of numeric candidates.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{ConfigValidationError, ParameterSchema};
use crate::league::ScoringParameters;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineDocument {
    pub config_name: String,
    pub description: String,
    pub parameters: BTreeMap<String, Vec<f64>>,
}

impl BaselineDocument {
    /// Validate a parsed JSON value against `schema`.
    pub fn from_value(value: &Value, schema: &ParameterSchema) -> Result<Self, ConfigValidationError> {
        let root = value.as_object().ok_or(ConfigValidationError::WrongFieldType {
            field: "<root>",
            expected: "an object",
        })?;

        let config_name = string_field(root, "config_name")?;
        let description = string_field(root, "description")?;
        let raw_parameters = root
            .get("parameters")
            .ok_or(ConfigValidationError::MissingField("parameters"))?
            .as_object()
            .ok_or(ConfigValidationError::WrongFieldType {
                field: "parameters",
                expected: "an object",
            })?;

        let required = schema.required_names();
        let provided: BTreeSet<&str> = raw_parameters.keys().map(String::as_str).collect();

        let missing: Vec<String> = required
            .difference(&provided)
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigValidationError::MissingParameters(missing));
        }
        let unexpected: Vec<String> = provided
            .difference(&required)
            .map(|name| name.to_string())
            .collect();
        if !unexpected.is_empty() {
            return Err(ConfigValidationError::UnexpectedParameters(unexpected));
        }

        let mut parameters = BTreeMap::new();
        for (name, raw) in raw_parameters {
            parameters.insert(name.clone(), candidate_list(name, raw)?);
        }

        Ok(Self {
            config_name,
            description,
            parameters,
        })
    }

    pub fn from_json_str(raw: &str, schema: &ParameterSchema) -> Result<Self, ConfigValidationError> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(&value, schema)
    }

    /// Single-candidate baseline holding the values of `params`.
    pub fn from_scoring(
        config_name: &str,
        description: &str,
        params: &ScoringParameters,
        schema: &ParameterSchema,
    ) -> Result<Self, ConfigValidationError> {
        let document = serde_json::to_value(params)?;
        let mut parameters = BTreeMap::new();
        for field in schema.fields() {
            let value = field
                .path
                .iter()
                .try_fold(&document, |node, key| node.get(key))
                .and_then(Value::as_f64)
                .ok_or_else(|| ConfigValidationError::MissingPath {
                    name: field.name.clone(),
                    path: field.dotted_path(),
                })?;
            parameters.insert(field.name.clone(), vec![value]);
        }
        Ok(Self {
            config_name: config_name.to_string(),
            description: description.to_string(),
            parameters,
        })
    }
}

/// Read and validate a baseline document from disk.
pub fn load_baseline(
    path: impl AsRef<Path>,
    schema: &ParameterSchema,
) -> Result<BaselineDocument, ConfigValidationError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConfigValidationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    BaselineDocument::from_json_str(&raw, schema)
}

fn string_field(root: &Map<String, Value>, field: &'static str) -> Result<String, ConfigValidationError> {
    root.get(field)
        .ok_or(ConfigValidationError::MissingField(field))?
        .as_str()
        .map(str::to_string)
        .ok_or(ConfigValidationError::WrongFieldType {
            field,
            expected: "a string",
        })
}

fn candidate_list(name: &str, raw: &Value) -> Result<Vec<f64>, ConfigValidationError> {
    let items = raw.as_array().ok_or_else(|| ConfigValidationError::NotAList {
        name: name.to_string(),
    })?;
    if items.is_empty() {
        return Err(ConfigValidationError::EmptyCandidates {
            name: name.to_string(),
        });
    }
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_f64()
                .ok_or_else(|| ConfigValidationError::NonNumericCandidate {
                    name: name.to_string(),
                    index,
                })
        })
        .collect()
}
