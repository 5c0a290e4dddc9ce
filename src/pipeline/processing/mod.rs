pub mod aggregate;
pub mod anomaly;
pub mod dates;
pub mod describe;
pub mod numeric;

use crate::dataset::Dataset;
use crate::pipeline::diagnostics::Diagnostics;

pub use aggregate::AggregateRecalculator;
pub use anomaly::{AnomalyInspector, AnomalyOutcome, AnomalyReport, NoMinimumReason};
pub use dates::{DateNormalizer, FieldOrder};
pub use describe::{summarize, ColumnSummary};
pub use numeric::NumericCoercer;

/// A transform from one dataset state to the next.
///
/// Implementations must not mutate the input: the returned dataset is a new value,
/// and the row count is preserved.
pub trait DatasetStage {
    fn apply(&self, dataset: &Dataset, diagnostics: &mut Diagnostics) -> Dataset;

    fn stage_name(&self) -> &'static str;
}
