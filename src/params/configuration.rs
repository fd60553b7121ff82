//! A materialized sweep entry: its position in the product, its flat values and
//! the typed scoring parameters the league engine consumes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ConfigGenerator, ConfigValidationError, ParameterCombination};
use crate::league::ScoringParameters;

/// Index of a configuration in the generator's Cartesian product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(pub u64);

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config_{:06}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterConfiguration {
    pub id: ConfigId,
    pub values: ParameterCombination,
    pub params: ScoringParameters,
}

impl ParameterConfiguration {
    pub fn document(&self, generator: &ConfigGenerator) -> Value {
        generator.create_config_dict(&self.values)
    }
}

impl ConfigGenerator {
    /// Materialize configuration `index`. `Ok(None)` past the end of the product.
    pub fn configuration_at(
        &self,
        index: u64,
    ) -> Result<Option<ParameterConfiguration>, ConfigValidationError> {
        let Some(values) = self.combination_at(u128::from(index)) else {
            return Ok(None);
        };
        let params = ScoringParameters::from_document(&self.create_config_dict(&values))?;
        Ok(Some(ParameterConfiguration {
            id: ConfigId(index),
            values,
            params,
        }))
    }

    /// Id of a combination drawn from the candidate lists.
    pub fn config_id_for(&self, values: &ParameterCombination) -> Result<ConfigId, ConfigValidationError> {
        let index = self.index_of(values)?;
        u64::try_from(index)
            .map(ConfigId)
            .map_err(|_| ConfigValidationError::IndexOverflow(index))
    }

    pub fn configuration_for(
        &self,
        values: ParameterCombination,
    ) -> Result<ParameterConfiguration, ConfigValidationError> {
        let id = self.config_id_for(&values)?;
        let params = ScoringParameters::from_document(&self.create_config_dict(&values))?;
        Ok(ParameterConfiguration { id, values, params })
    }

    /// One configuration per candidate of `name`, every other parameter held at `current_best`.
    pub fn single_parameter_configurations(
        &self,
        name: &str,
        current_best: &ParameterCombination,
    ) -> Result<Vec<ParameterConfiguration>, ConfigValidationError> {
        let candidates = self
            .generate_all_parameter_value_sets()
            .get(name)
            .ok_or_else(|| ConfigValidationError::UnknownParameter(name.to_string()))?;
        candidates
            .iter()
            .map(|&candidate| {
                let mut values = current_best.clone();
                values.insert(name.to_string(), candidate);
                self.configuration_for(values)
            })
            .collect()
    }

    /// Configurations for `indices`, stopping at the first invalid document.
    pub fn configurations_for(
        &self,
        indices: impl IntoIterator<Item = u64>,
    ) -> Result<Vec<ParameterConfiguration>, ConfigValidationError> {
        let mut configs = Vec::new();
        for index in indices {
            if let Some(config) = self.configuration_at(index)? {
                configs.push(config);
            }
        }
        Ok(configs)
    }
}
