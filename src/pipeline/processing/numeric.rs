use tracing::info;

use super::DatasetStage;
use crate::dataset::{Dataset, Value};
use crate::pipeline::diagnostics::{Diagnostics, PipelineWarning};

const STAGE: &str = "numeric";

/// Parse a raw cell as a finite real number.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric view of a cell regardless of whether the coercer has run yet.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Some(*n),
        Value::Text(raw) => parse_number(raw),
        _ => None,
    }
}

/// Coerces financial columns into `Value::Number`, turning unparsable cells into `Value::Null`.
///
/// Listed columns that the dataset does not have are skipped without a warning.
#[derive(Debug, Clone, Default)]
pub struct NumericCoercer {
    columns: Vec<String>,
}

impl NumericCoercer {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn coerce(&self, dataset: &Dataset, diagnostics: &mut Diagnostics) -> Dataset {
        let mut current = dataset.clone();
        for column in &self.columns {
            let mut failures = 0usize;
            let coerced = current.map_column(column, |value| match value {
                Value::Number(n) if n.is_finite() => Value::Number(*n),
                Value::Null => Value::Null,
                Value::Text(raw) if raw.trim().is_empty() => Value::Null,
                Value::Text(raw) => match parse_number(raw) {
                    Some(n) => Value::Number(n),
                    None => {
                        failures += 1;
                        Value::Null
                    }
                },
                Value::Number(_) | Value::Date(_) => {
                    failures += 1;
                    Value::Null
                }
            });

            let Some(coerced) = coerced else {
                diagnostics.note(&format!("numeric column '{column}' not present, skipping"));
                continue;
            };

            if failures > 0 {
                diagnostics.warn(PipelineWarning::CoercedToNull {
                    stage: STAGE,
                    column: column.clone(),
                    count: failures,
                });
            }
            current = coerced;
        }
        info!(
            dataset = %dataset.name(),
            columns = self.columns.len(),
            "Coerced numeric columns"
        );
        current
    }
}

impl DatasetStage for NumericCoercer {
    fn apply(&self, dataset: &Dataset, diagnostics: &mut Diagnostics) -> Dataset {
        self.coerce(dataset, diagnostics)
    }

    fn stage_name(&self) -> &'static str {
        STAGE
    }
}
