use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

use crate::app::ports::{DatasetSinkPort, DatasetSourcePort};
use crate::config::{Config, InputConfig};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::pipeline::{Pipeline, PipelineOutcome};

/// One dataset after the pipeline has run over it
#[derive(Debug, Clone)]
pub struct DatasetRun {
    pub input: InputConfig,
    pub outcome: PipelineOutcome,
}

/// Paths written by [`ReconcileUseCase::persist`]
#[derive(Debug, Clone, Default)]
pub struct PersistedOutputs {
    pub datasets: Vec<PathBuf>,
    pub reports: Vec<PathBuf>,
    pub copied: Vec<PathBuf>,
}

/// Load every configured input, normalize each one, then hand the results to the sink.
///
/// Every input is loaded before the first pipeline runs, and every copy-through
/// file is checked before the first write, so a missing file aborts the run with
/// nothing written.
pub struct ReconcileUseCase {
    config: Config,
    source: Box<dyn DatasetSourcePort>,
    sink: Box<dyn DatasetSinkPort>,
}

impl ReconcileUseCase {
    pub fn new(
        config: Config,
        source: Box<dyn DatasetSourcePort>,
        sink: Box<dyn DatasetSinkPort>,
    ) -> Self {
        Self {
            config,
            source,
            sink,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn load_all(&self) -> Result<Vec<(InputConfig, Dataset)>> {
        let mut loaded = Vec::with_capacity(self.config.inputs.len());
        for input in &self.config.inputs {
            match self.source.load(input) {
                Ok(dataset) => loaded.push((input.clone(), dataset)),
                Err(e) => {
                    error!("Aborting run: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(loaded)
    }

    /// Runs every pipeline in memory without writing anything.
    pub fn process(&self) -> Result<Vec<DatasetRun>> {
        let loaded = self.load_all()?;
        let runs = loaded
            .into_iter()
            .map(|(input, dataset)| {
                let pipeline = Pipeline::new(input.schema(), self.config.dates.order);
                let outcome = pipeline.run(dataset);
                DatasetRun { input, outcome }
            })
            .collect();
        Ok(runs)
    }

    /// Checks that every copy-through file can be read before anything is written.
    pub fn check_copy_through(&self) -> Result<()> {
        for source in &self.config.output.copy_through {
            if let Err(e) = self.source.require_file(source) {
                error!("Aborting run: {}", e);
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn persist(&self, runs: &[DatasetRun]) -> Result<PersistedOutputs> {
        self.check_copy_through()?;
        let mut outputs = PersistedOutputs::default();
        for run in runs {
            let destination = self.config.output_path(&run.input);
            self.sink.write_dataset(&run.outcome.dataset, &destination)?;
            outputs.datasets.push(destination);

            if self.config.output.write_reports {
                let report_path = self.config.report_path(&run.input);
                self.sink.write_report(&run.outcome.report, &report_path)?;
                outputs.reports.push(report_path);
            }
        }

        for source in &self.config.output.copy_through {
            let Some(file_name) = source.file_name() else {
                warn!("Skipping copy-through entry without a file name: {}", source.display());
                continue;
            };
            let destination = self.config.output.directory.join(file_name);
            self.sink.copy_file(source, &destination)?;
            outputs.copied.push(destination);
        }
        Ok(outputs)
    }

    #[instrument(skip(self))]
    pub fn run(&self) -> Result<(Vec<DatasetRun>, PersistedOutputs)> {
        info!("🚀 Reconciling {} dataset(s)", self.config.inputs.len());
        self.check_copy_through()?;
        let runs = self.process()?;
        let outputs = self.persist(&runs)?;
        info!(
            "✅ Wrote {} dataset(s), {} report(s), {} copied file(s)",
            outputs.datasets.len(),
            outputs.reports.len(),
            outputs.copied.len()
        );
        Ok((runs, outputs))
    }
}
