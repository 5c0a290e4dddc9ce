use std::collections::HashMap;
use tracing::info;

use super::numeric::numeric_value;
use super::DatasetStage;
use crate::dataset::{Dataset, Value};
use crate::pipeline::diagnostics::{Diagnostics, PipelineWarning};
use crate::schema::AggregateRule;

const STAGE: &str = "aggregate";

/// Recomputes derived totals from line items with group-and-broadcast semantics.
///
/// Null policy, applied to every rule alike:
/// - null source values are left out of the sum;
/// - a group whose source values are all null gets a null total;
/// - records with a null key take no part in any group and get a null total.
#[derive(Debug, Clone, Default)]
pub struct AggregateRecalculator {
    rules: Vec<AggregateRule>,
}

impl AggregateRecalculator {
    pub fn new(rules: Vec<AggregateRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[AggregateRule] {
        &self.rules
    }

    pub fn recalculate(&self, dataset: &Dataset, diagnostics: &mut Diagnostics) -> Dataset {
        let mut current = dataset.clone();
        for rule in &self.rules {
            current = broadcast_sum(&current, rule, diagnostics);
        }
        current
    }
}

impl DatasetStage for AggregateRecalculator {
    fn apply(&self, dataset: &Dataset, diagnostics: &mut Diagnostics) -> Dataset {
        self.recalculate(dataset, diagnostics)
    }

    fn stage_name(&self) -> &'static str {
        STAGE
    }
}

/// Sum `rule.source` per `rule.key` and write the group's sum into `rule.target` on
/// every record of the group. The row count never changes.
pub fn broadcast_sum(
    dataset: &Dataset,
    rule: &AggregateRule,
    diagnostics: &mut Diagnostics,
) -> Dataset {
    let key_idx = dataset.column_index(&rule.key);
    let source_idx = dataset.column_index(&rule.source);
    let (Some(key_idx), Some(source_idx)) = (key_idx, source_idx) else {
        for (column, idx) in [(&rule.key, key_idx), (&rule.source, source_idx)] {
            if idx.is_none() {
                diagnostics.warn(PipelineWarning::MissingColumn {
                    stage: STAGE,
                    column: column.clone(),
                });
            }
        }
        return dataset.clone();
    };

    let mut totals: HashMap<String, Option<f64>> = HashMap::new();
    let mut keys: Vec<Option<String>> = Vec::with_capacity(dataset.len());
    let mut null_keys = 0usize;

    for row in dataset.rows() {
        let key = row[key_idx].group_key();
        match &key {
            Some(k) => {
                let total = totals.entry(k.clone()).or_insert(None);
                if let Some(amount) = numeric_value(&row[source_idx]) {
                    *total = Some(total.unwrap_or(0.0) + amount);
                }
            }
            None => null_keys += 1,
        }
        keys.push(key);
    }

    if null_keys > 0 {
        diagnostics.warn(PipelineWarning::NullGroupKey {
            key: rule.key.clone(),
            target: rule.target.clone(),
            count: null_keys,
        });
    }

    let values: Vec<Value> = keys
        .iter()
        .map(|key| {
            key.as_ref()
                .and_then(|k| totals.get(k).copied().flatten())
                .map_or(Value::Null, Value::Number)
        })
        .collect();

    info!(
        dataset = %dataset.name(),
        key = %rule.key,
        target = %rule.target,
        groups = totals.len(),
        "Recalculated aggregate"
    );
    dataset.with_column(&rule.target, values)
}
