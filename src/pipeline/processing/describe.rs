use serde::Serialize;

use crate::dataset::{Dataset, Value};

/// count/mean/std/min/quartiles/max for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` below two values
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

/// Summaries for every column that holds numbers and nothing but numbers or nulls.
pub fn summarize(dataset: &Dataset) -> Vec<ColumnSummary> {
    dataset
        .columns()
        .iter()
        .filter_map(|column| summarize_column(dataset, column))
        .collect()
}

pub fn summarize_column(dataset: &Dataset, column: &str) -> Option<ColumnSummary> {
    let values = dataset.column_values(column)?;
    let mut numbers = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Number(n) => numbers.push(*n),
            Value::Null => {}
            Value::Text(_) | Value::Date(_) => return None,
        }
    }
    if numbers.is_empty() {
        return None;
    }
    numbers.sort_by(f64::total_cmp);

    let count = numbers.len();
    let mean = numbers.iter().sum::<f64>() / count as f64;
    let std = (count > 1).then(|| {
        let var = numbers.iter().map(|n| (n - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        var.sqrt()
    });

    Some(ColumnSummary {
        column: column.to_string(),
        count,
        mean,
        std,
        min: numbers[0],
        p25: quantile(&numbers, 0.25),
        p50: quantile(&numbers, 0.5),
        p75: quantile(&numbers, 0.75),
        max: numbers[count - 1],
    })
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_matches_hand_computed_values() {
        let mut dataset = Dataset::new("orders", vec!["Sales".into(), "Type".into()]);
        for n in [1.0, 2.0, 3.0, 4.0] {
            dataset.push_row(vec![Value::Number(n), Value::Text("DEBIT".into())]);
        }
        dataset.push_row(vec![Value::Null, Value::Text("CASH".into())]);

        let summaries = summarize(&dataset);
        assert_eq!(summaries.len(), 1);
        let sales = &summaries[0];
        assert_eq!(sales.column, "Sales");
        assert_eq!(sales.count, 4);
        assert_eq!(sales.mean, 2.5);
        assert_eq!(sales.min, 1.0);
        assert_eq!(sales.p25, 1.75);
        assert_eq!(sales.p50, 2.5);
        assert_eq!(sales.p75, 3.25);
        assert_eq!(sales.max, 4.0);
        assert!((sales.std.unwrap() - 1.2909944).abs() < 1e-6);
    }

    #[test]
    fn test_single_value_has_no_std() {
        let mut dataset = Dataset::new("orders", vec!["Sales".into()]);
        dataset.push_row(vec![Value::Number(-3.0)]);
        let summary = summarize_column(&dataset, "Sales").unwrap();
        assert_eq!(summary.std, None);
        assert_eq!(summary.p75, -3.0);
    }

    #[test]
    fn test_untyped_columns_are_not_summarized() {
        let dataset = Dataset::from_text_rows("orders", &["Sales"], &[&["1"], &["2"]]);
        assert!(summarize(&dataset).is_empty());
    }
}
