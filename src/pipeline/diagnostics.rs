use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

/// Non-fatal conditions a stage absorbs and reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// An expected column is absent from the dataset
    MissingColumn { stage: &'static str, column: String },
    /// Cells that could not be parsed and were replaced with null
    CoercedToNull {
        stage: &'static str,
        column: String,
        count: usize,
    },
    /// Records excluded from an aggregate because their grouping key is null
    NullGroupKey {
        key: String,
        target: String,
        count: usize,
    },
    /// More than one group shares the extreme value
    AmbiguousAnomaly {
        key: String,
        minimum: f64,
        candidates: usize,
    },
    /// The anomaly lookup found nothing to rank
    NoMinimum { column: String, reason: String },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::MissingColumn { stage, column } => {
                write!(f, "[{stage}] expected column '{column}' is missing")
            }
            PipelineWarning::CoercedToNull {
                stage,
                column,
                count,
            } => write!(
                f,
                "[{stage}] {count} value(s) in column '{column}' could not be parsed and were set to null"
            ),
            PipelineWarning::NullGroupKey { key, target, count } => write!(
                f,
                "{count} record(s) with null '{key}' were left out of '{target}'"
            ),
            PipelineWarning::AmbiguousAnomaly {
                key,
                minimum,
                candidates,
            } => write!(
                f,
                "{candidates} '{key}' groups share the minimum value {minimum}; reporting the earliest"
            ),
            PipelineWarning::NoMinimum { column, reason } => {
                write!(f, "no minimum found in '{column}': {reason}")
            }
        }
    }
}

/// Diagnostics collaborator owned by one pipeline run.
///
/// Every warning is emitted through `tracing` and kept for the run report, so two
/// runs never share state.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    dataset: String,
    warnings: Vec<PipelineWarning>,
}

impl Diagnostics {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            warnings: Vec::new(),
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn stage_started(&self, stage: &str) {
        info!(dataset = %self.dataset, stage, "Starting stage");
    }

    pub fn note(&self, message: &str) {
        debug!(dataset = %self.dataset, "{}", message);
    }

    pub fn warn(&mut self, warning: PipelineWarning) {
        warn!(dataset = %self.dataset, "{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[PipelineWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<PipelineWarning> {
        self.warnings
    }
}
