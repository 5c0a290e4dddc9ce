//! Normalization and reconciliation of the DataCo supply-chain and access-log datasets.
//!
//! Dates and financial columns are coerced into typed values, per-order and
//! per-customer totals are recomputed from line items, and the order with the most
//! negative benefit is reported for manual review.

pub mod app;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod infra;
pub mod logging;
pub mod pipeline;
pub mod schema;

pub use dataset::{Dataset, Record, Value};
pub use error::{ReconcileError, Result};
pub use schema::Schema;
