use std::fs;
use std::path::Path;
use tracing::info;

use crate::app::ports::DatasetSinkPort;
use crate::dataset::Dataset;
use crate::error::{ReconcileError, Result};
use crate::pipeline::DiagnosticReport;

/// Writes normalized datasets as UTF-8 CSV and reports as pretty JSON.
///
/// Parent directories are created before anything is written.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    date_format: String,
}

impl CsvFileSink {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| ReconcileError::io(parent, e))
        }
        _ => Ok(()),
    }
}

impl DatasetSinkPort for CsvFileSink {
    fn write_dataset(&self, dataset: &Dataset, destination: &Path) -> Result<()> {
        ensure_parent(destination)?;
        let mut writer =
            csv::Writer::from_path(destination).map_err(|e| ReconcileError::csv(destination, e))?;
        writer
            .write_record(dataset.columns())
            .map_err(|e| ReconcileError::csv(destination, e))?;
        for row in dataset.rows() {
            writer
                .write_record(row.iter().map(|value| value.render(&self.date_format)))
                .map_err(|e| ReconcileError::csv(destination, e))?;
        }
        writer
            .flush()
            .map_err(|e| ReconcileError::io(destination, e))?;
        info!(
            "💾 Transformed {} saved to {}",
            dataset.name(),
            destination.display()
        );
        Ok(())
    }

    fn write_report(&self, report: &DiagnosticReport, destination: &Path) -> Result<()> {
        ensure_parent(destination)?;
        let json = serde_json::to_string_pretty(report)?;
        fs::write(destination, json).map_err(|e| ReconcileError::io(destination, e))?;
        info!("Report for {} saved to {}", report.dataset, destination.display());
        Ok(())
    }

    fn copy_file(&self, source: &Path, destination: &Path) -> Result<()> {
        if !source.exists() {
            return Err(ReconcileError::MissingInput {
                path: source.to_path_buf(),
            });
        }
        ensure_parent(destination)?;
        fs::copy(source, destination).map_err(|e| ReconcileError::io(source, e))?;
        info!("Copied {} to {}", source.display(), destination.display());
        Ok(())
    }
}
