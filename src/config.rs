use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{
    ACCESS_LOGS_FILE, CONFIG_ENV, DATA_ROOT_ENV, DEFAULT_DATA_ROOT, DEFAULT_OUTPUT_DATE_FORMAT,
    DEFAULT_OUTPUT_DIR, REPORT_SUFFIX, SUPPLY_CHAIN_FILE, TRANSFORMED_SUFFIX,
};
use crate::error::{ReconcileError, Result};
use crate::infra::csv_source::resolve_encoding;
use crate::pipeline::processing::FieldOrder;
use crate::schema::{Schema, SchemaPreset};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_inputs")]
    pub inputs: Vec<InputConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub dates: DateConfig,
}

/// One delimited input file and how to read it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    pub schema: SchemaPreset,
    /// Replaces the preset's date columns when set
    #[serde(default)]
    pub date_columns: Option<Vec<String>>,
    /// Replaces the preset's numeric columns when set
    #[serde(default)]
    pub numeric_columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Write `<stem>_transformed.csv` into `output.directory`, leaving the source intact
    #[default]
    Directory,
    /// Replace the source file in place.
    ///
    /// The rewritten dates use `dates.output_format`. When that format puts the day
    /// and month in the opposite order to `dates.order`, a second run reads them
    /// back swapped, so `Config::validate` warns about the combination.
    Overwrite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub mode: OutputMode,
    /// Output CSVs (in `directory` mode), reports and copied files land here
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
    /// Extra files copied verbatim into `directory`, e.g. a column description sheet
    #[serde(default)]
    pub copy_through: Vec<PathBuf>,
    #[serde(default = "default_true")]
    pub write_reports: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateConfig {
    #[serde(default)]
    pub order: FieldOrder,
    #[serde(default = "default_date_format")]
    pub output_format: String,
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_true() -> bool {
    true
}

fn default_date_format() -> String {
    DEFAULT_OUTPUT_DATE_FORMAT.to_string()
}

fn default_inputs() -> Vec<InputConfig> {
    let root = std::env::var(DATA_ROOT_ENV).unwrap_or_else(|_| DEFAULT_DATA_ROOT.to_string());
    InputConfig::dataco_defaults(Path::new(&root))
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::default(),
            directory: default_output_dir(),
            copy_through: Vec::new(),
            write_reports: true,
        }
    }
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            order: FieldOrder::default(),
            output_format: default_date_format(),
        }
    }
}

impl DateConfig {
    /// Field order of `output_format`. `None` when it lacks `%d` or `%m`, or is
    /// ISO-ordered (year, month, day), which parses the same under either order.
    pub fn output_order(&self) -> Option<FieldOrder> {
        let day = self.output_format.find("%d")?;
        let month = self.output_format.find("%m")?;
        if self.output_format.find("%Y").is_some_and(|year| year < month) && month < day {
            return None;
        }
        Some(if day < month {
            FieldOrder::DayFirst
        } else {
            FieldOrder::MonthFirst
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: default_inputs(),
            output: OutputConfig::default(),
            dates: DateConfig::default(),
        }
    }
}

impl InputConfig {
    /// The two DataCo Smart Supply exports: UTF-8 access logs, latin-1 order lines.
    pub fn dataco_defaults(root: &Path) -> Vec<InputConfig> {
        vec![
            InputConfig {
                name: "tokenized_access_logs".to_string(),
                path: root.join(ACCESS_LOGS_FILE),
                encoding: "utf-8".to_string(),
                delimiter: ',',
                schema: SchemaPreset::AccessLogs,
                date_columns: None,
                numeric_columns: None,
            },
            InputConfig {
                name: "DataCoSupplyChainDataset".to_string(),
                path: root.join(SUPPLY_CHAIN_FILE),
                encoding: "latin-1".to_string(),
                delimiter: ',',
                schema: SchemaPreset::SupplyChain,
                date_columns: None,
                numeric_columns: None,
            },
        ]
    }

    pub fn schema(&self) -> Schema {
        let mut schema = Schema::from_preset(self.schema);
        if let Some(columns) = &self.date_columns {
            schema = schema.with_date_columns(columns.clone());
        }
        if let Some(columns) = &self.numeric_columns {
            schema = schema.with_numeric_columns(columns.clone());
        }
        schema
    }

    fn file_stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

impl Config {
    /// Explicit path first, then `RECONCILE_CONFIG`, then built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let content = fs::read_to_string(&path).map_err(|e| {
                    ReconcileError::Config(format!(
                        "Failed to read config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_toml_str(&content)?
            }
            None => {
                info!("No configuration file given, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(ReconcileError::Config("no inputs configured".to_string()));
        }
        let mut names = HashSet::new();
        for input in &self.inputs {
            if !names.insert(input.name.as_str()) {
                return Err(ReconcileError::Config(format!(
                    "duplicate input name '{}'",
                    input.name
                )));
            }
            resolve_encoding(&input.encoding)?;
            if !input.delimiter.is_ascii() {
                return Err(ReconcileError::Config(format!(
                    "delimiter for '{}' must be a single ASCII character",
                    input.name
                )));
            }
        }
        if self.dates.output_format.trim().is_empty() {
            return Err(ReconcileError::Config(
                "dates.output_format must not be empty".to_string(),
            ));
        }
        if self.rewrites_dates_unreadably() {
            warn!(
                "⚠️  Overwrite mode writes dates as '{}' but reads them as {:?}; a second run will swap day and month",
                self.dates.output_format, self.dates.order
            );
        }
        Ok(())
    }

    /// True when overwritten sources would not parse back to the same dates.
    pub fn rewrites_dates_unreadably(&self) -> bool {
        self.output.mode == OutputMode::Overwrite
            && self
                .dates
                .output_order()
                .is_some_and(|order| order != self.dates.order)
    }

    /// Where the normalized CSV for `input` is written.
    pub fn output_path(&self, input: &InputConfig) -> PathBuf {
        match self.output.mode {
            OutputMode::Overwrite => input.path.clone(),
            OutputMode::Directory => self
                .output
                .directory
                .join(format!("{}{}.csv", input.file_stem(), TRANSFORMED_SUFFIX)),
        }
    }

    pub fn report_path(&self, input: &InputConfig) -> PathBuf {
        self.output
            .directory
            .join(format!("{}{}.json", input.file_stem(), REPORT_SUFFIX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let config = Config::from_toml_str(
            r#"
            [[inputs]]
            name = "orders"
            path = "raw/orders.csv"
            encoding = "latin-1"
            schema = "supply_chain"
            "#,
        )
        .unwrap();

        assert_eq!(config.inputs.len(), 1);
        assert_eq!(config.inputs[0].delimiter, ',');
        assert_eq!(config.output.mode, OutputMode::Directory);
        assert_eq!(config.dates.order, FieldOrder::MonthFirst);
        assert_eq!(config.dates.output_format, "%d/%m/%Y");
        config.validate().unwrap();
        assert_eq!(
            config.output_path(&config.inputs[0]),
            PathBuf::from("data/orders_transformed.csv")
        );
        assert_eq!(
            config.report_path(&config.inputs[0]),
            PathBuf::from("data/orders_report.json")
        );
    }

    #[test]
    fn test_overwrite_mode_targets_source() {
        let config = Config::from_toml_str(
            r#"
            [output]
            mode = "overwrite"

            [dates]
            order = "day_first"

            [[inputs]]
            name = "logs"
            path = "raw/logs.csv"
            schema = "access_logs"
            date_columns = ["When"]
            "#,
        )
        .unwrap();

        assert_eq!(config.output_path(&config.inputs[0]), PathBuf::from("raw/logs.csv"));
        assert_eq!(config.dates.order, FieldOrder::DayFirst);
        assert_eq!(config.inputs[0].schema().date_columns, vec!["When".to_string()]);
    }

    #[test]
    fn test_unknown_encoding_is_rejected() {
        let config = Config::from_toml_str(
            r#"
            [[inputs]]
            name = "orders"
            path = "orders.csv"
            encoding = "klingon"
            schema = "plain"
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ReconcileError::Config(_))));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut config = Config::default();
        let first = config.inputs[0].clone();
        config.inputs.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults_point_at_dataco_exports() {
        let inputs = InputConfig::dataco_defaults(Path::new("datasets/DataCo_Smart_Supply"));
        assert_eq!(inputs[0].encoding, "utf-8");
        assert_eq!(inputs[1].encoding, "latin-1");
        assert!(inputs[1].path.ends_with("DataCoSupplyChainDataset.csv"));
    }

    #[test]
    fn test_overwrite_with_swapped_date_order_is_flagged() {
        let mut config = Config::default();
        assert_eq!(config.dates.output_order(), Some(FieldOrder::DayFirst));
        assert!(!config.rewrites_dates_unreadably());

        config.output.mode = OutputMode::Overwrite;
        assert!(config.rewrites_dates_unreadably());
        assert!(config.validate().is_ok());

        config.dates.order = FieldOrder::DayFirst;
        assert!(!config.rewrites_dates_unreadably());

        config.dates.order = FieldOrder::MonthFirst;
        config.dates.output_format = "%m/%d/%Y".to_string();
        assert_eq!(config.dates.output_order(), Some(FieldOrder::MonthFirst));
        assert!(!config.rewrites_dates_unreadably());

        config.dates.order = FieldOrder::DayFirst;
        config.dates.output_format = "%Y-%m-%d".to_string();
        assert_eq!(config.dates.output_order(), None);
        assert!(!config.rewrites_dates_unreadably());
    }
}
