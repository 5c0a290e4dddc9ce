use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use supply_reconcile::app::ReconcileUseCase;
use supply_reconcile::config::{Config, InputConfig, OutputMode};
use supply_reconcile::infra::{CsvFileSink, CsvFileSource};
use supply_reconcile::ReconcileError;

const ACCESS_LOGS: &str = "\
Product,Category,Date,Month,Hour,Department,ip,url
Adidas Kids' RG III Mid Football Cleat,Cleats,9/1/2017 6:00,Sep,6,fitness,37.97.182.65,/department/apparel/category/cleats/product/adidas-kids-rg-iii-mid-football-cleat
Nike Men's Dri-FIT Victory Golf Polo,Men's Footwear,not-a-date,Sep,7,apparel,206.56.112.1,/department/apparel/category/mens-footwear
";

fn write_supply_chain(path: &Path) {
    // Latin-1 encoded, with "Caguás" in Customer City
    let mut bytes = b"Type,order date (DateOrders),shipping date (DateOrders),Order Id,Customer Id,Customer City,Order Item Quantity,Order Profit Per Order,Sales,Benefit per order,Sales per customer\n".to_vec();
    bytes.extend_from_slice(b"DEBIT,1/31/2018 22:56,2/3/2018 22:56,77202,20755,Cagu");
    bytes.push(0xE1);
    bytes.extend_from_slice(b"s,1,91.25,327.75,91.25,314.64\n");
    bytes.extend_from_slice(b"TRANSFER,1/13/2018 12:27,1/18/2018 12:27,75939,19492,Caguas,1,-249.25,327.75,-249.25,311.36\n");
    bytes.extend_from_slice(b"CASH,1/13/2018 12:06,1/17/2018 12:06,75939,19492,Caguas,2,-100.5,200,-249.25,309.72\n");
    bytes.extend_from_slice(b"DEBIT,13/01/2018 11:45,garbage,75938,19491,San Jose,1,22.86,327.75,22.86,304.81\n");
    fs::write(path, bytes).unwrap();
}

fn config_for(root: &Path, out: &Path) -> Config {
    Config {
        inputs: InputConfig::dataco_defaults(root),
        output: supply_reconcile::config::OutputConfig {
            directory: out.to_path_buf(),
            ..Default::default()
        },
        ..Config::default()
    }
}

fn use_case(config: Config) -> ReconcileUseCase {
    let date_format = config.dates.output_format.clone();
    ReconcileUseCase::new(
        config,
        Box::new(CsvFileSource),
        Box::new(CsvFileSink::new(date_format)),
    )
}

#[test]
fn test_full_run_writes_normalized_outputs_and_reports() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().join("datasets");
    fs::create_dir_all(&root)?;
    fs::write(root.join("tokenized_access_logs.csv"), ACCESS_LOGS)?;
    write_supply_chain(&root.join("DataCoSupplyChainDataset.csv"));
    let out = dir.path().join("data");

    let (runs, outputs) = use_case(config_for(&root, &out)).run()?;
    assert_eq!(runs.len(), 2);
    assert_eq!(outputs.datasets.len(), 2);
    assert_eq!(outputs.reports.len(), 2);

    let logs = fs::read_to_string(out.join("tokenized_access_logs_transformed.csv"))?;
    let mut lines = logs.lines().skip(1);
    assert!(lines.next().unwrap().contains(",01/09/2017,Sep,6,"));
    assert!(lines.next().unwrap().contains(",,Sep,7,"));

    let orders = fs::read_to_string(out.join("DataCoSupplyChainDataset_transformed.csv"))?;
    let rows: Vec<&str> = orders.lines().collect();
    assert_eq!(rows.len(), 5);
    assert_eq!(
        rows[1],
        "DEBIT,31/01/2018,03/02/2018,77202,20755,Caguás,1,91.25,327.75,91.25,327.75"
    );
    assert!(rows[2].ends_with(",-349.75,527.75"));
    assert!(rows[3].ends_with(",-349.75,527.75"));
    // Day-first only reading is accepted; the unparsable shipping date becomes empty
    assert!(rows[4].starts_with("DEBIT,13/01/2018,,75938"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(
        out.join("DataCoSupplyChainDataset_report.json"),
    )?)?;
    assert_eq!(report["anomaly"]["status"], "found");
    assert_eq!(report["anomaly"]["group_id"], "75939");
    assert_eq!(report["anomaly"]["line_item_count"], 2);
    assert_eq!(report["loaded_shape"]["rows"], 4);
    let warnings = report["warnings"].as_array().unwrap();
    assert!(warnings.iter().any(|w| w["kind"] == "coerced_to_null"
        && w["column"] == "shipping date (DateOrders)"
        && w["count"] == 1));

    // Raw inputs are untouched in directory mode
    assert!(fs::read_to_string(root.join("tokenized_access_logs.csv"))?.contains("9/1/2017 6:00"));
    Ok(())
}

#[test]
fn test_missing_input_aborts_before_writing() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().join("datasets");
    fs::create_dir_all(&root)?;
    fs::write(root.join("tokenized_access_logs.csv"), ACCESS_LOGS)?;
    let out = dir.path().join("data");

    let err = use_case(config_for(&root, &out)).run().unwrap_err();
    match err {
        ReconcileError::MissingInput { path } => {
            assert!(path.ends_with("DataCoSupplyChainDataset.csv"))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!out.exists());
    Ok(())
}

#[test]
fn test_overwrite_mode_and_copy_through() -> Result<()> {
    let dir = tempdir()?;
    let source = dir.path().join("logs.csv");
    fs::write(&source, ACCESS_LOGS)?;
    let description = dir.path().join("DescriptionDataCoSupplyChain.csv");
    fs::write(&description, "FIELDS,DESCRIPTION\nDate,Access date\n")?;
    let out = dir.path().join("reports");

    let config = Config::from_toml_str(&format!(
        r#"
        [output]
        mode = "overwrite"
        directory = {out:?}
        copy_through = [{description:?}]

        [[inputs]]
        name = "logs"
        path = {source:?}
        schema = "access_logs"
        "#,
        out = out.display().to_string(),
        description = description.display().to_string(),
        source = source.display().to_string(),
    ))?;
    assert_eq!(config.output.mode, OutputMode::Overwrite);

    use_case(config).run()?;

    let rewritten = fs::read_to_string(&source)?;
    assert!(rewritten.contains("01/09/2017"));
    assert!(out.join("logs_report.json").exists());
    assert_eq!(
        fs::read_to_string(out.join("DescriptionDataCoSupplyChain.csv"))?,
        "FIELDS,DESCRIPTION\nDate,Access date\n"
    );
    Ok(())
}

#[test]
fn test_missing_copy_through_leaves_overwrite_source_untouched() -> Result<()> {
    let dir = tempdir()?;
    let source = dir.path().join("logs.csv");
    fs::write(&source, ACCESS_LOGS)?;
    let description = dir.path().join("DescriptionDataCoSupplyChain.csv");
    let out = dir.path().join("reports");

    let config = Config::from_toml_str(&format!(
        r#"
        [output]
        mode = "overwrite"
        directory = {out:?}
        copy_through = [{description:?}]

        [[inputs]]
        name = "logs"
        path = {source:?}
        schema = "access_logs"
        "#,
        out = out.display().to_string(),
        description = description.display().to_string(),
        source = source.display().to_string(),
    ))?;

    let err = use_case(config).run().unwrap_err();
    match err {
        ReconcileError::MissingInput { path } => assert_eq!(path, description),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fs::read_to_string(&source)?, ACCESS_LOGS);
    assert!(!out.join("logs_report.json").exists());
    assert!(!out.exists());
    Ok(())
}
