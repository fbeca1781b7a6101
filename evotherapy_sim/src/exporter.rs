//! JSON exporter for plotting.
//!
//! Exports time series, grid snapshots and run summaries so an external
//! plotting script can draw the comparison figures. Grids are written as
//! rows of cell codes (0 empty, 1 healthy, 2 sensitive, 3 resistant).

use crate::error::SimError;
use crate::mean_field::MeanFieldResult;
use crate::runner::RunSummary;
use crate::settings::ExperimentSettings;
use crate::spatial::{RunOutcome, SpatialResult};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Grid captured at one step.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotFrame {
    pub step: usize,
    pub cells: Vec<Vec<u8>>,
}

/// Spatial run in exportable form.
#[derive(Debug, Clone, Serialize)]
pub struct SpatialExport {
    pub policy: String,
    pub time: Vec<usize>,
    pub healthy: Vec<f64>,
    pub sensitive: Vec<f64>,
    pub resistant: Vec<f64>,
    pub dose: Vec<f64>,
    pub toxicity: Vec<f64>,
    pub initial_grid: Vec<Vec<u8>>,

    /// Designated snapshot steps; steps missing from `snapshots` were never reached
    pub snapshot_steps: Vec<usize>,
    pub snapshots: Vec<SnapshotFrame>,

    /// Step at which the toxicity limit ended the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_step: Option<usize>,
}

impl From<&SpatialResult> for SpatialExport {
    fn from(result: &SpatialResult) -> Self {
        Self {
            policy: result.policy.clone(),
            time: result.time.clone(),
            healthy: result.healthy.clone(),
            sensitive: result.sensitive.clone(),
            resistant: result.resistant.clone(),
            dose: result.dose.clone(),
            toxicity: result.toxicity.clone(),
            initial_grid: result.initial_grid.to_rows(),
            snapshot_steps: result.snapshot_schedule.clone(),
            snapshots: result
                .snapshots
                .iter()
                .map(|s| SnapshotFrame {
                    step: s.step,
                    cells: s.grid.to_rows(),
                })
                .collect(),
            death_step: match result.outcome {
                RunOutcome::Completed => None,
                RunOutcome::ToxicityLimit { step, .. } => Some(step),
            },
        }
    }
}

/// Complete experiment export.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentExport {
    /// Seed used
    pub seed: u64,

    /// Engine configurations
    pub settings: ExperimentSettings,

    /// Mean-field runs
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mean_field: Vec<MeanFieldResult>,

    /// Spatial runs
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub spatial: Vec<SpatialExport>,

    /// Headline numbers of every run
    pub summaries: Vec<RunSummary>,
}

impl ExperimentExport {
    /// Creates a new export container.
    pub fn new(seed: u64, settings: ExperimentSettings) -> Self {
        Self {
            seed,
            settings,
            mean_field: Vec::new(),
            spatial: Vec::new(),
            summaries: Vec::new(),
        }
    }

    /// Adds a mean-field run and its summary.
    pub fn add_mean_field(&mut self, summary: RunSummary, result: MeanFieldResult) {
        self.summaries.push(summary);
        self.mean_field.push(result);
    }

    /// Adds a spatial run and its summary.
    pub fn add_spatial(&mut self, summary: RunSummary, result: &SpatialResult) {
        self.summaries.push(summary);
        self.spatial.push(SpatialExport::from(result));
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::PolicyId;
    use crate::runner::ExperimentRunner;
    use evotherapy_core::SpatialConfig;

    #[test]
    fn test_spatial_export_uses_cell_codes() {
        let settings = ExperimentSettings {
            spatial: SpatialConfig {
                grid_size: 30,
                time_steps: 20,
                snapshot_steps: Some(vec![0, 19]),
                ..Default::default()
            },
            ..Default::default()
        };
        let runner = ExperimentRunner::new(5).with_settings(settings.clone());
        let result = runner.run_spatial(PolicyId::Metronomic).unwrap();

        let mut export = ExperimentExport::new(5, settings);
        export.add_spatial(RunSummary::from_spatial(PolicyId::Metronomic, &result), &result);

        let frame = &export.spatial[0];
        assert_eq!(frame.snapshots.len(), 2);
        assert_eq!(frame.snapshots[1].step, 19);
        assert_eq!(frame.initial_grid.len(), 30);
        assert!(frame.initial_grid.iter().flatten().all(|c| *c <= 3));
        assert_eq!(frame.death_step, None);
        assert_eq!(frame.snapshot_steps, vec![0, 19]);

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["seed"], 5);
        assert_eq!(json["summaries"][0]["policy"], "metronomic");
        assert_eq!(json["summaries"][0]["engine"], "spatial");
        assert!(json.get("mean_field").is_none());
    }

    #[test]
    fn test_export_keeps_schedule_after_toxicity_death() {
        let settings = ExperimentSettings {
            spatial: SpatialConfig {
                grid_size: 30,
                time_steps: 100,
                toxicity_limit: 10.0,
                snapshot_steps: Some(vec![5, 60]),
                ..Default::default()
            },
            ..Default::default()
        };
        let runner = ExperimentRunner::new(8).with_settings(settings);
        let result = runner.run_spatial(PolicyId::Mtd).unwrap();
        let frame = SpatialExport::from(&result);

        assert_eq!(frame.death_step, Some(10));
        assert_eq!(frame.snapshot_steps, vec![5, 60]);
        assert_eq!(frame.snapshots.len(), 1);
        assert_eq!(frame.snapshots[0].step, 5);
    }

    #[test]
    fn test_write_to_file() {
        let runner = ExperimentRunner::new(1);
        let result = runner.run_mean_field(PolicyId::Adaptive).unwrap();
        let mut export = ExperimentExport::new(1, ExperimentSettings::default());
        export.add_mean_field(RunSummary::from_mean_field(PolicyId::Adaptive, &result), result);

        let path = std::env::temp_dir().join("evotherapy_export_test.json");
        export.write_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["mean_field"][0]["policy"], "adaptive");
        assert_eq!(value["mean_field"][0]["time"].as_array().unwrap().len(), 2000);
        let _ = std::fs::remove_file(&path);
    }
}
