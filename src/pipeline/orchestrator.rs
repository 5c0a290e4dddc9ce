use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::diagnostics::{Diagnostics, PipelineWarning};
use super::processing::{
    summarize, AggregateRecalculator, AnomalyInspector, AnomalyOutcome, ColumnSummary,
    DatasetStage, DateNormalizer, FieldOrder, NumericCoercer,
};
use crate::dataset::Dataset;
use crate::schema::Schema;

/// Rows shown in the debug preview after each run
const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Shape {
    pub rows: usize,
    pub columns: usize,
}

impl From<(usize, usize)> for Shape {
    fn from((rows, columns): (usize, usize)) -> Self {
        Self { rows, columns }
    }
}

/// Everything a run found out about one dataset, persisted next to its output.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub dataset: String,
    pub schema: String,
    pub loaded_shape: Shape,
    pub output_shape: Shape,
    pub summaries: Vec<ColumnSummary>,
    /// `None` when the schema declares no anomaly probe
    pub anomaly: Option<AnomalyOutcome>,
    pub warnings: Vec<PipelineWarning>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub dataset: Dataset,
    pub report: DiagnosticReport,
}

/// Runs dates → numerics → aggregates → anomaly inspection over one dataset.
pub struct Pipeline {
    schema: Schema,
    stages: Vec<Box<dyn DatasetStage>>,
    inspector: Option<AnomalyInspector>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("schema", &self.schema.name)
            .field(
                "stages",
                &self.stages.iter().map(|s| s.stage_name()).collect::<Vec<_>>(),
            )
            .field("inspector", &self.inspector.is_some())
            .finish()
    }
}

impl Pipeline {
    pub fn new(schema: Schema, date_order: FieldOrder) -> Self {
        let stages: Vec<Box<dyn DatasetStage>> = vec![
            Box::new(DateNormalizer::new(date_order).for_columns(schema.date_columns.clone())),
            Box::new(NumericCoercer::new(schema.numeric_columns.clone())),
            Box::new(AggregateRecalculator::new(schema.aggregates.clone())),
        ];
        let inspector = schema.anomaly_probe.clone().map(AnomalyInspector::new);
        Self {
            schema,
            stages,
            inspector,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.stage_name()).collect()
    }

    /// Always completes; every per-column problem ends up in the report's warnings.
    #[instrument(skip(self, dataset), fields(dataset = %dataset.name(), schema = %self.schema.name))]
    pub fn run(&self, dataset: Dataset) -> PipelineOutcome {
        let mut diagnostics = Diagnostics::new(dataset.name());
        let loaded_shape = Shape::from(dataset.shape());
        info!(
            "📥 Loaded {} rows x {} columns",
            loaded_shape.rows, loaded_shape.columns
        );

        let mut current = dataset;
        for stage in &self.stages {
            diagnostics.stage_started(stage.stage_name());
            current = stage.apply(&current, &mut diagnostics);
        }

        let summaries = summarize(&current);
        for summary in &summaries {
            debug!(
                column = %summary.column,
                count = summary.count,
                mean = summary.mean,
                min = summary.min,
                max = summary.max,
                "Column summary"
            );
        }

        let anomaly = self.inspector.as_ref().map(|inspector| {
            diagnostics.stage_started("anomaly");
            inspector.inspect(&current, &mut diagnostics)
        });

        if let Ok(preview) = serde_json::to_string(&current.head(PREVIEW_ROWS)) {
            debug!(preview = %preview, "Sample of normalized dataset");
        }

        let output_shape = Shape::from(current.shape());
        let warnings = diagnostics.into_warnings();
        info!(
            "✅ Pipeline finished: {} rows, {} warning(s)",
            output_shape.rows,
            warnings.len()
        );

        PipelineOutcome {
            report: DiagnosticReport {
                run_id: Uuid::new_v4(),
                generated_at: Utc::now(),
                dataset: current.name().to_string(),
                schema: self.schema.name.clone(),
                loaded_shape,
                output_shape,
                summaries,
                anomaly,
                warnings,
            },
            dataset: current,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    #[test]
    fn test_access_logs_pipeline_skips_aggregates_and_probe() {
        let dataset = Dataset::from_text_rows(
            "tokenized_access_logs",
            &["Product", "Date", "Hour"],
            &[&["Adidas Kids' RG III Mid Football Cleat", "9/1/2017 6:00", "6"]],
        );
        let outcome = Pipeline::new(Schema::access_logs(), FieldOrder::MonthFirst).run(dataset);

        assert!(outcome.report.anomaly.is_none());
        assert!(outcome.report.warnings.is_empty());
        assert_eq!(outcome.report.summaries.len(), 1);
        assert_eq!(
            outcome.dataset.column_values("Date").unwrap()[0],
            &Value::Date(chrono::NaiveDate::from_ymd_opt(2017, 9, 1).unwrap())
        );
    }

    #[test]
    fn test_row_count_is_preserved() {
        let dataset = Dataset::from_text_rows(
            "orders",
            &["Order Id", "Customer Id", "Order Profit Per Order", "Sales"],
            &[&["1", "9", "5", "10"], &["", "9", "1", "1"], &["2", "", "x", "3"]],
        );
        let outcome = Pipeline::new(Schema::supply_chain(), FieldOrder::MonthFirst).run(dataset);
        assert_eq!(outcome.report.loaded_shape.rows, 3);
        assert_eq!(outcome.report.output_shape.rows, 3);
        assert_eq!(outcome.report.output_shape.columns, 6);
    }

    #[test]
    fn test_stage_order() {
        let pipeline = Pipeline::new(Schema::supply_chain(), FieldOrder::DayFirst);
        assert_eq!(pipeline.stage_names(), vec!["dates", "numeric", "aggregate"]);
    }
}
