//! Cartesian expansion of a baseline into concrete configurations.
//!
//! Parameter names are iterated in sorted order with the last name varying
//! fastest, so combination `i` is the same on every run and can be decoded
//! directly by index without walking the product.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use super::{BaselineDocument, ConfigValidationError, ParameterSchema};

/// One fully resolved flat configuration: parameter name to value.
pub type ParameterCombination = BTreeMap<String, f64>;

/// Number of combinations in the product of `params`, without materializing it.
pub fn get_num_combinations(params: &BTreeMap<String, Vec<f64>>) -> u128 {
    params
        .values()
        .fold(1u128, |acc, values| acc.saturating_mul(values.len() as u128))
}

#[derive(Debug, Clone)]
pub struct ConfigGenerator {
    config_name: String,
    description: String,
    schema: ParameterSchema,
    value_sets: BTreeMap<String, Vec<f64>>,
}

impl ConfigGenerator {
    pub fn from_baseline(baseline: BaselineDocument, schema: ParameterSchema) -> Self {
        Self {
            config_name: baseline.config_name,
            description: baseline.description,
            schema,
            value_sets: baseline.parameters,
        }
    }

    /// Generator over an arbitrary parameter map, laid out with the default scoring schema.
    pub fn from_parameters(value_sets: BTreeMap<String, Vec<f64>>) -> Self {
        Self {
            config_name: "custom".to_string(),
            description: String::new(),
            schema: ParameterSchema::default_scoring(),
            value_sets,
        }
    }

    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    pub fn generate_all_parameter_value_sets(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.value_sets
    }

    pub fn num_combinations(&self) -> u128 {
        get_num_combinations(&self.value_sets)
    }

    /// Every combination, materialized. Prefer [ConfigGenerator::combinations] for large spaces.
    pub fn generate_all_combinations(&self) -> Vec<ParameterCombination> {
        self.combinations().collect()
    }

    /// Lazy iterator over the product, in index order.
    pub fn combinations(&self) -> Combinations<'_> {
        let exhausted = self.value_sets.values().any(Vec::is_empty);
        Combinations {
            generator: self,
            digits: if exhausted {
                None
            } else {
                Some(vec![0; self.value_sets.len()])
            },
        }
    }

    /// Decode combination `index` by mixed radix. `None` when out of range.
    pub fn combination_at(&self, index: u128) -> Option<ParameterCombination> {
        if index >= self.num_combinations() {
            return None;
        }
        let mut remaining = index;
        let mut combination = ParameterCombination::new();
        for (name, values) in self.value_sets.iter().rev() {
            let radix = values.len() as u128;
            let digit = (remaining % radix) as usize;
            remaining /= radix;
            combination.insert(name.clone(), values[digit]);
        }
        Some(combination)
    }

    /// Inverse of [ConfigGenerator::combination_at]: the index of a combination
    /// whose every value is one of its parameter's candidates.
    pub fn index_of(&self, combination: &ParameterCombination) -> Result<u128, ConfigValidationError> {
        let unexpected: Vec<String> = combination
            .keys()
            .filter(|name| !self.value_sets.contains_key(*name))
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            return Err(ConfigValidationError::UnexpectedParameters(unexpected));
        }

        let mut index = 0u128;
        for (name, values) in &self.value_sets {
            let value = *combination
                .get(name)
                .ok_or_else(|| ConfigValidationError::MissingParameters(vec![name.clone()]))?;
            let digit = values
                .iter()
                .position(|candidate| *candidate == value)
                .ok_or_else(|| ConfigValidationError::NotACandidate {
                    name: name.clone(),
                    value,
                })?;
            index = index
                .checked_mul(values.len() as u128)
                .and_then(|scaled| scaled.checked_add(digit as u128))
                .ok_or(ConfigValidationError::IndexOverflow(self.num_combinations()))?;
        }
        Ok(index)
    }

    /// Parameters in schema order, then any names the schema does not know, sorted.
    pub fn parameter_order(&self) -> Vec<String> {
        let mut order: Vec<String> = self
            .schema
            .fields()
            .iter()
            .map(|field| field.name.clone())
            .filter(|name| self.value_sets.contains_key(name))
            .collect();
        for name in self.value_sets.keys() {
            if !order.contains(name) {
                order.push(name.clone());
            }
        }
        order
    }

    /// The configuration made of every parameter's first candidate.
    pub fn first_combination(&self) -> Option<ParameterCombination> {
        self.combination_at(0)
    }

    /// Rehydrate a flat combination into the nested configuration document.
    pub fn create_config_dict(&self, combination: &ParameterCombination) -> Value {
        let mut root = Map::new();
        for (name, value) in combination {
            let path = self.schema.path_for(name);
            insert_at_path(&mut root, &path, json!(value));
        }
        Value::Object(root)
    }

    /// Inverse of [ConfigGenerator::create_config_dict] for this generator's parameter names.
    pub fn flatten_config_dict(
        &self,
        document: &Value,
    ) -> Result<ParameterCombination, ConfigValidationError> {
        let mut combination = ParameterCombination::new();
        for name in self.value_sets.keys() {
            let path = self.schema.path_for(name);
            let value = path
                .iter()
                .try_fold(document, |node, key| node.get(key))
                .and_then(Value::as_f64)
                .ok_or_else(|| ConfigValidationError::MissingPath {
                    name: name.clone(),
                    path: path.join("."),
                })?;
            combination.insert(name.clone(), value);
        }
        Ok(combination)
    }
}

fn insert_at_path(root: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((leaf, parents)) = path.split_last() else {
        return;
    };
    let mut node = root;
    for key in parents {
        let entry = node
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(child) = entry else {
            return;
        };
        node = child;
    }
    node.insert(leaf.clone(), value);
}

/// Odometer over the candidate lists; the last parameter turns fastest.
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    generator: &'a ConfigGenerator,
    digits: Option<Vec<usize>>,
}

impl Iterator for Combinations<'_> {
    type Item = ParameterCombination;

    fn next(&mut self) -> Option<Self::Item> {
        let digits = self.digits.as_mut()?;
        let sets = &self.generator.value_sets;

        let combination: ParameterCombination = sets
            .iter()
            .zip(digits.iter())
            .map(|((name, values), &digit)| (name.clone(), values[digit]))
            .collect();

        let mut carried = true;
        for (digit, values) in digits.iter_mut().rev().zip(sets.values().rev()) {
            *digit += 1;
            if *digit < values.len() {
                carried = false;
                break;
            }
            *digit = 0;
        }
        if carried {
            self.digits = None;
        }

        Some(combination)
    }
}
