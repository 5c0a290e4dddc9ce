use encoding_rs::Encoding;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::app::ports::DatasetSourcePort;
use crate::config::InputConfig;
use crate::dataset::{Dataset, Value};
use crate::error::{ReconcileError, Result};

/// Resolve an encoding label such as `utf-8`, `latin-1` or `cp1252`.
///
/// Labels follow the WHATWG registry, plus the `latin-1`/`latin_1` spellings that
/// most data tooling accepts. `latin-1` maps to windows-1252, its superset.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    let normalized = label.trim().to_ascii_lowercase();
    let lookup = match normalized.as_str() {
        "latin-1" | "latin_1" => "latin1",
        "utf_8" => "utf-8",
        other => other,
    };
    Encoding::for_label(lookup.as_bytes())
        .ok_or_else(|| ReconcileError::Config(format!("unknown encoding '{label}'")))
}

/// Reads a delimited file with a header row into an untyped [`Dataset`].
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    encoding: &'static Encoding,
    delimiter: u8,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, encoding_label: &str, delimiter: char) -> Result<Self> {
        let delimiter = u8::try_from(delimiter).map_err(|_| {
            ReconcileError::Config(format!("delimiter '{delimiter}' is not a single byte"))
        })?;
        Ok(Self {
            path: path.into(),
            encoding: resolve_encoding(encoding_label)?,
            delimiter,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cells are kept as text; blank cells become `Null`.
    pub fn load(&self, name: &str) -> Result<Dataset> {
        let bytes = fs::read(&self.path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                error!("Dataset not found at {}", self.path.display());
                ReconcileError::MissingInput {
                    path: self.path.clone(),
                }
            } else {
                error!("Failed to read {}: {}", self.path.display(), e);
                ReconcileError::io(&self.path, e)
            }
        })?;

        // Strips a BOM if present.
        let (text, _, had_errors) = self.encoding.decode(&bytes);
        if had_errors {
            warn!(
                "{} contains bytes that are not valid {}; replaced with U+FFFD",
                self.path.display(),
                self.encoding.name()
            );
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_reader(text.as_bytes());

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| ReconcileError::csv(&self.path, e))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut dataset = Dataset::new(name, columns);
        for record in reader.records() {
            let record = record.map_err(|e| ReconcileError::csv(&self.path, e))?;
            dataset.push_row(record.iter().map(Value::from_raw).collect());
        }

        info!(
            "Loaded {} ({} rows x {} columns, {})",
            self.path.display(),
            dataset.len(),
            dataset.columns().len(),
            self.encoding.name()
        );
        Ok(dataset)
    }
}

/// Filesystem-backed source used by the CLI.
#[derive(Debug, Clone, Default)]
pub struct CsvFileSource;

impl DatasetSourcePort for CsvFileSource {
    fn load(&self, input: &InputConfig) -> Result<Dataset> {
        CsvSource::new(&input.path, &input.encoding, input.delimiter)?.load(&input.name)
    }

    fn require_file(&self, path: &Path) -> Result<()> {
        if path.is_file() {
            Ok(())
        } else {
            error!("❌ Required file missing: {}", path.display());
            Err(ReconcileError::MissingInput {
                path: path.to_path_buf(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolves_common_labels() {
        assert_eq!(resolve_encoding("UTF-8").unwrap(), encoding_rs::UTF_8);
        assert_eq!(resolve_encoding("latin-1").unwrap(), encoding_rs::WINDOWS_1252);
        assert_eq!(resolve_encoding("cp1252").unwrap(), encoding_rs::WINDOWS_1252);
        assert!(resolve_encoding("no-such-encoding").is_err());
    }

    #[test]
    fn test_decodes_latin1_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        // "Customer City" with a latin-1 encoded "Caguás"
        let mut bytes = b"Customer City,Sales\nCagu".to_vec();
        bytes.push(0xE1);
        bytes.extend_from_slice(b"s,10\n,\n");
        fs::write(&path, bytes).unwrap();

        let dataset = CsvSource::new(&path, "latin-1", ',').unwrap().load("orders").unwrap();
        assert_eq!(dataset.shape(), (2, 2));
        assert_eq!(
            dataset.column_values("Customer City").unwrap()[0],
            &Value::Text("Caguás".to_string())
        );
        assert_eq!(dataset.column_values("Sales").unwrap()[1], &Value::Null);
    }

    #[test]
    fn test_missing_file_is_fatal_io() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        let err = CsvSource::new(&path, "utf-8", ',').unwrap().load("absent").unwrap_err();
        assert!(err.is_fatal_io());
        assert!(err.to_string().contains("absent.csv"));
    }

    #[test]
    fn test_require_file_rejects_missing_and_directories() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("description.csv");
        fs::write(&present, "FIELDS,DESCRIPTION\n").unwrap();

        assert!(CsvFileSource.require_file(&present).is_ok());
        assert!(matches!(
            CsvFileSource.require_file(&dir.path().join("absent.csv")),
            Err(ReconcileError::MissingInput { .. })
        ));
        assert!(CsvFileSource.require_file(dir.path()).is_err());
    }

    #[test]
    fn test_custom_delimiter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs.tsv");
        fs::write(&path, "Date\tHour\n9/1/2017 6:00\t6\n").unwrap();
        let dataset = CsvSource::new(&path, "utf-8", '\t').unwrap().load("logs").unwrap();
        assert_eq!(dataset.columns(), &["Date".to_string(), "Hour".to_string()]);
    }
}
