// Normalization pipeline: typed stages over an in-memory dataset

pub mod diagnostics;
pub mod orchestrator;
pub mod processing;

pub use diagnostics::{Diagnostics, PipelineWarning};
pub use orchestrator::{DiagnosticReport, Pipeline, PipelineOutcome, Shape};
