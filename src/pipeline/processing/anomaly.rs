use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::info;

use super::numeric::numeric_value;
use crate::dataset::Dataset;
use crate::pipeline::diagnostics::{Diagnostics, PipelineWarning};
use crate::schema::AnomalyProbe;

/// The group carrying the extreme minimum, with its line items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub key_column: String,
    pub value_column: String,
    pub group_id: String,
    pub minimum: f64,
    pub line_item_count: usize,
    /// Number of groups sharing `minimum`, including the reported one
    pub tied_groups: usize,
    pub items: Dataset,
}

/// Why no minimum could be ranked. Each case points at a problem upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMinimumReason {
    EmptyDataset,
    MissingColumn(String),
    AllNull,
}

impl fmt::Display for NoMinimumReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoMinimumReason::EmptyDataset => write!(f, "dataset has no records"),
            NoMinimumReason::MissingColumn(column) => write!(f, "column '{column}' is missing"),
            NoMinimumReason::AllNull => write!(f, "every value is null"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnomalyOutcome {
    Found(AnomalyReport),
    NoMinimum { reason: NoMinimumReason },
}

impl AnomalyOutcome {
    pub fn report(&self) -> Option<&AnomalyReport> {
        match self {
            AnomalyOutcome::Found(report) => Some(report),
            AnomalyOutcome::NoMinimum { .. } => None,
        }
    }
}

/// Locates the group with the lowest derived value.
#[derive(Debug, Clone)]
pub struct AnomalyInspector {
    probe: AnomalyProbe,
}

impl AnomalyInspector {
    pub fn new(probe: AnomalyProbe) -> Self {
        Self { probe }
    }

    pub fn probe(&self) -> &AnomalyProbe {
        &self.probe
    }

    /// Only records with both a key and a numeric value take part. When several
    /// groups tie, the one whose first line item comes earliest in record order wins.
    pub fn inspect(&self, dataset: &Dataset, diagnostics: &mut Diagnostics) -> AnomalyOutcome {
        let probe = &self.probe;
        if dataset.is_empty() {
            return self.no_minimum(NoMinimumReason::EmptyDataset, diagnostics);
        }
        let (Some(key_idx), Some(value_idx)) = (
            dataset.column_index(&probe.key),
            dataset.column_index(&probe.value),
        ) else {
            let missing = if dataset.has_column(&probe.key) {
                &probe.value
            } else {
                &probe.key
            };
            diagnostics.warn(PipelineWarning::MissingColumn {
                stage: "anomaly",
                column: missing.clone(),
            });
            return self.no_minimum(NoMinimumReason::MissingColumn(missing.clone()), diagnostics);
        };

        let mut first_seen: HashMap<String, usize> = HashMap::new();
        let mut line_items: HashMap<String, usize> = HashMap::new();
        let mut scored: Vec<(String, f64)> = Vec::new();
        for (position, row) in dataset.rows().iter().enumerate() {
            let Some(key) = row[key_idx].group_key() else {
                continue;
            };
            first_seen.entry(key.clone()).or_insert(position);
            *line_items.entry(key.clone()).or_insert(0) += 1;
            if let Some(value) = numeric_value(&row[value_idx]) {
                scored.push((key, value));
            }
        }

        let Some(minimum) = scored.iter().map(|(_, v)| *v).reduce(f64::min) else {
            return self.no_minimum(NoMinimumReason::AllNull, diagnostics);
        };

        let mut candidates: Vec<&str> = scored
            .iter()
            .filter(|(_, v)| *v == minimum)
            .map(|(k, _)| k.as_str())
            .collect();
        candidates.sort_by_key(|k| first_seen[*k]);
        candidates.dedup();
        let tied_groups = candidates.len();
        let group_id = candidates[0].to_string();

        if tied_groups > 1 {
            diagnostics.warn(PipelineWarning::AmbiguousAnomaly {
                key: probe.key.clone(),
                minimum,
                candidates: tied_groups,
            });
        }

        let projection: Vec<&str> = probe.projection.iter().map(String::as_str).collect();
        let items = dataset
            .filter(|record| {
                record
                    .get(&probe.key)
                    .and_then(|v| v.group_key())
                    .is_some_and(|k| k == group_id)
            })
            .project(&projection);
        let line_item_count = line_items[&group_id];

        info!(
            dataset = %dataset.name(),
            key = %probe.key,
            group_id = %group_id,
            minimum,
            line_item_count,
            "Most problematic group located"
        );

        AnomalyOutcome::Found(AnomalyReport {
            key_column: probe.key.clone(),
            value_column: probe.value.clone(),
            group_id,
            minimum,
            line_item_count,
            tied_groups,
            items,
        })
    }

    fn no_minimum(&self, reason: NoMinimumReason, diagnostics: &mut Diagnostics) -> AnomalyOutcome {
        diagnostics.warn(PipelineWarning::NoMinimum {
            column: self.probe.value.clone(),
            reason: reason.to_string(),
        });
        AnomalyOutcome::NoMinimum { reason }
    }
}
