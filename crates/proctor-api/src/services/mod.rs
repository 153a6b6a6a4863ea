//! Proctoring services shared by the handlers.

pub mod ledger;
pub mod pipeline;
pub mod results;

pub use ledger::{LedgerEntry, ViolationLedger};
pub use pipeline::ProctorPipeline;
pub use results::ResultStore;
