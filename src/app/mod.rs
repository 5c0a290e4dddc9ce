// Application layer: use cases and the ports they depend on

pub mod ports;
pub mod reconcile_use_case;

pub use reconcile_use_case::{DatasetRun, PersistedOutputs, ReconcileUseCase};
