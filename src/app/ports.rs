use std::path::Path;

use crate::config::InputConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::pipeline::DiagnosticReport;

/// Provides raw tabular input for one configured dataset
pub trait DatasetSourcePort {
    fn load(&self, input: &InputConfig) -> Result<Dataset>;

    /// Fails with `MissingInput` when `path` cannot be read as a file.
    fn require_file(&self, path: &Path) -> Result<()>;
}

/// Accepts normalized output and run reports
pub trait DatasetSinkPort {
    fn write_dataset(&self, dataset: &Dataset, destination: &Path) -> Result<()>;

    fn write_report(&self, report: &DiagnosticReport, destination: &Path) -> Result<()>;

    fn copy_file(&self, source: &Path, destination: &Path) -> Result<()>;
}
