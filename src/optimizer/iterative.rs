//! Coordinate descent: sweep one parameter at a time while every other
//! parameter stays at the best value found so far.
//!
//! Each finished pass is written to `intermediate_{pass:02}_{NAME}.json` in the
//! output directory. A later run resumes after the highest checkpoint that
//! still matches the parameter order; anything else starts from scratch.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::iter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::manager::{SimulationManager, SweepMode, SweepReport};
use super::output::{save_sweep, write_json};
use super::{select_optimal, ConfigPerformance, PerformanceSummary, SweepError};
use crate::params::{ConfigGenerator, ConfigId, ParameterCombination, ParameterConfiguration};

pub const CHECKPOINT_PREFIX: &str = "intermediate_";

/// Outcome of sweeping a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterPass {
    /// 1-based position in the parameter order.
    pub pass: usize,
    pub parameter: String,
    pub candidates: Vec<f64>,
    /// Configurations run in this pass; the others were already known.
    pub simulated: usize,
    pub previous_value: f64,
    pub selected_value: f64,
    /// `None` when no candidate had a successful run.
    pub best: Option<PerformanceSummary>,
    pub current_best: ParameterCombination,
}

impl SimulationManager {
    /// Optimize the parameters one by one in schema order, resuming from the
    /// checkpoints of an interrupted run. The result is a local optimum.
    pub fn run_iterative_optimization(&self) -> Result<SweepReport, SweepError> {
        let started = Instant::now();
        let generated_at = Utc::now();
        let generator = self.generator();
        let dir = self.settings().output_dir.as_path();
        let order = generator.parameter_order();
        let mut current = generator.first_combination().ok_or(SweepError::EmptySpace)?;

        let mut passes = match find_resume_point(dir, &order, generator) {
            Some(restored) => restored,
            None => {
                let removed = clear_checkpoints(dir);
                if removed > 0 {
                    info!(removed, "cleared checkpoints of a previous run");
                }
                Vec::new()
            }
        };
        let completed = passes.last().map_or(0, |pass| pass.pass);
        if let Some(last) = passes.last() {
            current = last.current_best.clone();
            info!(resume_pass = completed + 1, parameters = order.len(), "resuming iterative optimization");
        }
        info!(
            parameters = order.len(),
            planned_runs = %self.planned_runs(SweepMode::Iterative, 0),
            "starting iterative optimization"
        );

        let mut seen: BTreeMap<ConfigId, ConfigPerformance> = BTreeMap::new();
        for (offset, name) in order.iter().enumerate().skip(completed) {
            let pass = offset + 1;
            let configs = generator.single_parameter_configurations(name, &current)?;
            let values_by_id: BTreeMap<ConfigId, ParameterCombination> = configs
                .iter()
                .map(|config| (config.id, config.values.clone()))
                .collect();

            let mut queued = BTreeSet::new();
            let fresh: Vec<ParameterConfiguration> = configs
                .into_iter()
                .filter(|config| !seen.contains_key(&config.id) && queued.insert(config.id))
                .collect();
            let simulated = fresh.len();
            if simulated > 0 {
                for performance in self.run_tracked(simulated, iter::once(Ok(fresh)))? {
                    seen.insert(performance.config_id(), performance);
                }
            }

            let contenders: Vec<ConfigPerformance> = values_by_id
                .keys()
                .filter_map(|id| seen.get(id))
                .cloned()
                .collect();
            let previous_value = current.get(name).copied().unwrap_or_default();
            let best = select_optimal(&contenders);
            match best.and_then(|winner| values_by_id.get(&winner.config_id())) {
                Some(values) => current = values.clone(),
                None => warn!(pass, parameter = %name, "no candidate had a successful run, keeping the current value"),
            }
            let selected_value = current.get(name).copied().unwrap_or_default();
            info!(
                pass,
                parameter = %name,
                previous = previous_value,
                selected = selected_value,
                simulated,
                "parameter pass finished"
            );

            let record = ParameterPass {
                pass,
                parameter: name.clone(),
                candidates: generator
                    .generate_all_parameter_value_sets()
                    .get(name)
                    .cloned()
                    .unwrap_or_default(),
                simulated,
                previous_value,
                selected_value,
                best: best.map(ConfigPerformance::summary),
                current_best: current.clone(),
            };
            write_checkpoint(dir, &record)?;
            passes.push(record);
        }

        let optimal = generator.config_id_for(&current)?;
        let performances = seen.into_values().collect();
        let mut report = self.build_report(
            SweepMode::Iterative,
            performances,
            Some(optimal),
            passes,
            started,
            generated_at,
        )?;
        report.saved = Some(save_sweep(&report, dir)?);
        Ok(report)
    }
}

fn checkpoint_path(dir: &Path, pass: usize, parameter: &str) -> PathBuf {
    dir.join(format!("{CHECKPOINT_PREFIX}{pass:02}_{parameter}.json"))
}

fn write_checkpoint(dir: &Path, pass: &ParameterPass) -> Result<(), SweepError> {
    fs::create_dir_all(dir).map_err(|source| SweepError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = checkpoint_path(dir, pass.pass, &pass.parameter);
    write_json(&path, pass)?;
    debug!(path = %path.display(), "checkpoint written");
    Ok(())
}

/// `intermediate_03_BASE_BYE_PENALTY.json` → `(3, "BASE_BYE_PENALTY")`.
fn parse_checkpoint_name(file_name: &str) -> Option<(usize, &str)> {
    let rest = file_name.strip_prefix(CHECKPOINT_PREFIX)?.strip_suffix(".json")?;
    let (pass, parameter) = rest.split_once('_')?;
    Some((pass.parse().ok()?, parameter))
}

/// Checkpointed passes to resume from, in pass order. `None` means start over.
fn find_resume_point(dir: &Path, order: &[String], generator: &ConfigGenerator) -> Option<Vec<ParameterPass>> {
    let entries = fs::read_dir(dir).ok()?;
    let mut restored = BTreeMap::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if !file_name.starts_with(CHECKPOINT_PREFIX) {
            continue;
        }
        let Some((pass, parameter)) = parse_checkpoint_name(file_name) else {
            warn!(file = file_name, "skipping checkpoint with an unrecognized name");
            continue;
        };
        if pass == 0 || pass > order.len() {
            debug!(file = file_name, "checkpoint outside the parameter order");
            continue;
        }
        if order[pass - 1] != parameter {
            warn!(
                file = file_name,
                expected = %order[pass - 1],
                "parameter order changed since the checkpoint, starting fresh"
            );
            return None;
        }

        let checkpoint = fs::read_to_string(entry.path())
            .ok()
            .and_then(|raw| serde_json::from_str::<ParameterPass>(&raw).ok());
        match checkpoint {
            Some(checkpoint)
                if checkpoint.pass == pass
                    && checkpoint.parameter == parameter
                    && generator.index_of(&checkpoint.current_best).is_ok() =>
            {
                restored.insert(pass, checkpoint);
            }
            _ => warn!(file = file_name, "skipping unreadable checkpoint"),
        }
    }

    let (&highest, _) = restored.last_key_value()?;
    if highest >= order.len() {
        debug!(passes = highest, "previous run finished every pass");
        return None;
    }
    Some(restored.into_values().collect())
}

fn clear_checkpoints(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        let is_checkpoint = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(CHECKPOINT_PREFIX));
        if !is_checkpoint {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(err) => warn!(path = %entry.path().display(), error = %err, "failed to remove checkpoint"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::data::{synthetic_players, PlayerPool};
    use crate::league::{LeagueSettings, ScoringParameters};
    use crate::optimizer::ManagerSettings;
    use crate::params::{BaselineDocument, ParameterSchema};

    fn manager(output_dir: PathBuf) -> SimulationManager {
        let schema = ParameterSchema::default_scoring();
        let mut baseline =
            BaselineDocument::from_scoring("unit", "", &ScoringParameters::default(), &schema).unwrap();
        baseline
            .parameters
            .insert("NORMALIZATION_MAX_SCALE".to_string(), vec![50.0, 100.0, 150.0]);
        baseline
            .parameters
            .insert("BASE_BYE_PENALTY".to_string(), vec![0.0, 40.0]);
        SimulationManager::new(
            ConfigGenerator::from_baseline(baseline, schema),
            Arc::new(PlayerPool::new(synthetic_players(5)).unwrap()),
            LeagueSettings::default(),
            ManagerSettings {
                sims_per_config: 2,
                workers: 2,
                base_seed: 5,
                output_dir,
                chunk_size: 4,
            },
        )
        .unwrap()
    }

    fn fresh_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("draftsim-iterative-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn checkpoint_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .flatten()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(CHECKPOINT_PREFIX))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn each_pass_changes_only_its_own_parameter() {
        let dir = fresh_dir("passes");
        let manager = manager(dir.clone());
        let order = manager.generator().parameter_order();

        let report = manager.run_iterative_optimization().unwrap();
        assert_eq!(report.mode, SweepMode::Iterative);
        assert_eq!(report.passes.len(), order.len());

        let mut previous = manager.generator().first_combination().unwrap();
        for (pass, name) in report.passes.iter().zip(&order) {
            assert_eq!(&pass.parameter, name);
            let changed: Vec<&String> = pass
                .current_best
                .iter()
                .filter(|(key, value)| previous[*key] != **value)
                .map(|(key, _)| key)
                .collect();
            assert!(
                changed.iter().all(|key| key.as_str() == name.as_str()),
                "pass {} changed {changed:?}",
                pass.pass
            );
            assert_eq!(pass.previous_value, previous[name]);
            assert_eq!(pass.selected_value, pass.current_best[name]);
            previous = pass.current_best.clone();
        }
        assert_eq!(
            report.optimal.config_id,
            manager.generator().config_id_for(&previous).unwrap()
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn known_configurations_are_not_simulated_again() {
        let dir = fresh_dir("cache");
        let report = manager(dir.clone()).run_iterative_optimization().unwrap();

        assert_eq!(report.passes[0].parameter, "NORMALIZATION_MAX_SCALE");
        assert_eq!(report.passes[0].simulated, 3);
        let bye = report
            .passes
            .iter()
            .find(|pass| pass.parameter == "BASE_BYE_PENALTY")
            .unwrap();
        assert_eq!(bye.simulated, 1);
        assert!(report
            .passes
            .iter()
            .filter(|pass| pass.candidates.len() == 1)
            .all(|pass| pass.simulated == 0));
        assert_eq!(report.configurations_tested, 4);
        assert_eq!(report.total_runs, 8);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn every_pass_leaves_a_checkpoint() {
        let dir = fresh_dir("checkpoints");
        let manager = manager(dir.clone());
        manager.run_iterative_optimization().unwrap();

        let expected: Vec<String> = manager
            .generator()
            .parameter_order()
            .iter()
            .enumerate()
            .map(|(offset, name)| format!("intermediate_{:02}_{name}.json", offset + 1))
            .collect();
        assert_eq!(checkpoint_files(&dir), expected);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn interrupted_run_resumes_after_last_checkpoint() {
        let dir = fresh_dir("resume");
        let first = manager(dir.clone()).run_iterative_optimization().unwrap();
        for name in checkpoint_files(&dir) {
            if !name.starts_with("intermediate_01_") {
                fs::remove_file(dir.join(name)).unwrap();
            }
        }

        let resumed = manager(dir.clone()).run_iterative_optimization().unwrap();
        assert_eq!(resumed.passes.len(), first.passes.len());
        assert_eq!(resumed.passes[0].parameter, first.passes[0].parameter);
        assert_eq!(resumed.passes[0].current_best, first.passes[0].current_best);
        // Pass 2 re-runs the restored best once; later passes reuse it.
        assert_eq!(resumed.passes[1].simulated, 1);
        assert_eq!(resumed.configurations_tested, 2);
        assert_eq!(resumed.optimal.config_id, first.optimal.config_id);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn finished_or_mismatched_checkpoints_start_fresh() {
        let dir = fresh_dir("restart");
        manager(dir.clone()).run_iterative_optimization().unwrap();
        let again = manager(dir.clone()).run_iterative_optimization().unwrap();
        assert_eq!(again.passes[0].simulated, 3);
        assert_eq!(again.configurations_tested, 4);

        for name in checkpoint_files(&dir) {
            fs::remove_file(dir.join(name)).unwrap();
        }
        let stale = dir.join("intermediate_01_NOT_A_PARAMETER.json");
        fs::write(&stale, "{}").unwrap();
        let fresh = manager(dir.clone()).run_iterative_optimization().unwrap();
        assert!(!stale.exists());
        assert_eq!(fresh.configurations_tested, 4);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn checkpoint_names_parse_back() {
        assert_eq!(
            parse_checkpoint_name("intermediate_03_BASE_BYE_PENALTY.json"),
            Some((3, "BASE_BYE_PENALTY"))
        );
        assert_eq!(parse_checkpoint_name("intermediate_x_NAME.json"), None);
        assert_eq!(parse_checkpoint_name("optimal_full_20260101_000000.json"), None);
    }
}
