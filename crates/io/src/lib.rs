// File I/O: dataset readers and ledger writers

pub mod error;
pub mod input;
pub mod ledger;

pub use error::IoError;
pub use input::{read_all, read_dataset, ReadBatch};
pub use ledger::{write_ledger, LedgerFormat};
