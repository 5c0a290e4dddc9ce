// Filesystem adapters for the app-layer ports

pub mod csv_sink;
pub mod csv_source;

pub use csv_sink::CsvFileSink;
pub use csv_source::{CsvFileSource, CsvSource};
