use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::DatasetStage;
use crate::dataset::{Dataset, Value};
use crate::pipeline::diagnostics::{Diagnostics, PipelineWarning};

const STAGE: &str = "dates";

/// Formats whose field order is unambiguous (year first, or a spelled-out month).
const UNAMBIGUOUS_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d-%b-%Y",
];

const MONTH_FIRST_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m-%d-%Y",
    "%m-%d-%Y %H:%M",
    "%m.%d.%Y",
    "%m/%d/%y",
    "%m/%d/%y %H:%M",
    "%m-%d-%y",
];

const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%Y",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y",
    "%d/%m/%y",
    "%d/%m/%y %H:%M",
    "%d-%m-%y",
];

/// Which numeric field comes first in an all-digit date such as `03/04/2018`.
///
/// Fixed for the whole run. A value is only read the other way round when its
/// preferred reading is not a calendar date at all (e.g. `13/02/2024` under
/// `MonthFirst`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrder {
    #[default]
    MonthFirst,
    DayFirst,
}

impl FieldOrder {
    fn preferred(self) -> &'static [&'static str] {
        match self {
            FieldOrder::MonthFirst => MONTH_FIRST_FORMATS,
            FieldOrder::DayFirst => DAY_FIRST_FORMATS,
        }
    }

    fn fallback(self) -> &'static [&'static str] {
        match self {
            FieldOrder::MonthFirst => DAY_FIRST_FORMATS,
            FieldOrder::DayFirst => MONTH_FIRST_FORMATS,
        }
    }
}

/// Parses date columns into `Value::Date`, turning anything unparsable into `Value::Null`.
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    order: FieldOrder,
    columns: Vec<String>,
}

impl DateNormalizer {
    pub fn new(order: FieldOrder) -> Self {
        Self {
            order,
            columns: Vec::new(),
        }
    }

    pub fn for_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn order(&self) -> FieldOrder {
        self.order
    }

    /// Parse one raw cell. Any time-of-day component is dropped.
    pub fn parse(&self, raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        UNAMBIGUOUS_FORMATS
            .iter()
            .chain(self.order.preferred())
            .chain(self.order.fallback())
            .find_map(|format| parse_with_format(raw, format))
    }

    /// Normalize a single column. A missing column is reported and left as is.
    pub fn normalize_column(
        &self,
        dataset: &Dataset,
        column: &str,
        diagnostics: &mut Diagnostics,
    ) -> Dataset {
        let mut failures = 0usize;
        let normalized = dataset.map_column(column, |value| match value {
            Value::Date(d) => Value::Date(*d),
            Value::Null => Value::Null,
            Value::Text(raw) if raw.trim().is_empty() => Value::Null,
            Value::Text(raw) => match self.parse(raw) {
                Some(date) => Value::Date(date),
                None => {
                    failures += 1;
                    Value::Null
                }
            },
            Value::Number(_) => {
                failures += 1;
                Value::Null
            }
        });

        let Some(normalized) = normalized else {
            diagnostics.warn(PipelineWarning::MissingColumn {
                stage: STAGE,
                column: column.to_string(),
            });
            return dataset.clone();
        };

        if failures > 0 {
            diagnostics.warn(PipelineWarning::CoercedToNull {
                stage: STAGE,
                column: column.to_string(),
                count: failures,
            });
        }
        info!(
            dataset = %dataset.name(),
            column,
            failures,
            "Normalized date column"
        );
        normalized
    }
}

impl DatasetStage for DateNormalizer {
    fn apply(&self, dataset: &Dataset, diagnostics: &mut Diagnostics) -> Dataset {
        let mut current = dataset.clone();
        for column in &self.columns {
            current = self.normalize_column(&current, column, diagnostics);
        }
        current
    }

    fn stage_name(&self) -> &'static str {
        STAGE
    }
}

fn parse_with_format(raw: &str, format: &str) -> Option<NaiveDate> {
    let parsed = if format.contains("%H") {
        NaiveDateTime::parse_from_str(raw, format)
            .ok()
            .map(|dt| dt.date())
    } else {
        NaiveDate::parse_from_str(raw, format).ok()
    };
    // `%Y` happily reads `24` as year 24; leave short years to the `%y` formats.
    parsed.filter(|date| (1000..=9999).contains(&date.year()))
}
