use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;

use supply_reconcile::app::{DatasetRun, ReconcileUseCase};
use supply_reconcile::config::Config;
use supply_reconcile::infra::{CsvFileSink, CsvFileSource};
use supply_reconcile::logging;
use supply_reconcile::pipeline::processing::AnomalyOutcome;

#[derive(Parser)]
#[command(name = "supply_reconcile")]
#[command(about = "Normalize DataCo supply-chain datasets and flag unprofitable orders")]
#[command(version)]
struct Cli {
    /// TOML configuration file (falls back to RECONCILE_CONFIG, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the rolling JSON log
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize every configured dataset and write outputs and reports
    Run,
    /// Run the pipeline in memory and print the anomaly findings
    Inspect,
    /// Print shape and numeric column summaries after normalization
    Describe,
}

fn print_anomaly(run: &DatasetRun, date_format: &str) {
    let Some(outcome) = &run.outcome.report.anomaly else {
        return;
    };
    println!("\n🔎 Investigating extreme negative values in {}...", run.input.name);
    match outcome {
        AnomalyOutcome::Found(report) => {
            println!(
                "   The most problematic {} is: {} ({} = {})",
                report.key_column, report.group_id, report.value_column, report.minimum
            );
            println!("   This group has {} item(s).", report.line_item_count);
            if report.tied_groups > 1 {
                println!("   ⚠️  {} groups share this minimum", report.tied_groups);
            }
            println!("   {}", report.items.columns().join(" | "));
            for row in report.items.rows() {
                let cells: Vec<String> = row.iter().map(|v| v.render(date_format)).collect();
                println!("   {}", cells.join(" | "));
            }
        }
        AnomalyOutcome::NoMinimum { reason } => {
            println!("   ⚠️  Could not find a minimum ({reason}). The aggregate step likely failed upstream.");
        }
    }
}

fn print_warnings(run: &DatasetRun) {
    let warnings = &run.outcome.report.warnings;
    if warnings.is_empty() {
        return;
    }
    println!("\n⚠️  {} warning(s) for {}:", warnings.len(), run.input.name);
    for warning in warnings {
        println!("   - {warning}");
    }
}

fn print_summary(run: &DatasetRun) {
    let report = &run.outcome.report;
    println!(
        "\n📊 {} shape: ({}, {})",
        run.input.name, report.output_shape.rows, report.output_shape.columns
    );
    for s in &report.summaries {
        println!(
            "   {:<32} count={:<8} mean={:<12.4} std={:<12} min={:<10} 25%={:<10} 50%={:<10} 75%={:<10} max={}",
            s.column,
            s.count,
            s.mean,
            s.std.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string()),
            s.min,
            s.p25,
            s.p50,
            s.p75,
            s.max
        );
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _guard = logging::init_logging(&cli.log_dir);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let date_format = config.dates.output_format.clone();
    let use_case = ReconcileUseCase::new(
        config,
        Box::new(CsvFileSource),
        Box::new(CsvFileSink::new(date_format.clone())),
    );

    let result = match cli.command {
        Commands::Run => use_case.run().map(|(runs, outputs)| {
            for run in &runs {
                print_anomaly(run, &date_format);
                print_warnings(run);
            }
            println!();
            for path in outputs.datasets.iter().chain(&outputs.reports).chain(&outputs.copied) {
                println!("💾 {}", path.display());
            }
        }),
        Commands::Inspect => use_case.process().map(|runs| {
            for run in &runs {
                print_anomaly(run, &date_format);
                print_warnings(run);
            }
        }),
        Commands::Describe => use_case.process().map(|runs| {
            for run in &runs {
                print_summary(run);
            }
        }),
    };

    if let Err(e) = &result {
        error!("Run failed: {}", e);
    }
    result.map_err(anyhow::Error::from)
}
