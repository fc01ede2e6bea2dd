//! `orderfold-recon`: order reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded datasets, returns the upload
//! ledger plus a summary. No CLI or IO dependencies.

pub mod aggregate;
pub mod classify;
pub mod coerce;
pub mod columns;
pub mod config;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod export;
pub mod key;
pub mod merge;
pub mod model;
pub mod project;

pub use config::RunConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{CanonicalLedgerRow, CellValue, RawDataset, RecordShape, RunOutcome};
