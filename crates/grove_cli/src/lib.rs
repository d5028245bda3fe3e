//! grove engine: snapshot in, findings out.
//!
//! The `grove` binary is a thin layer over [`Engine`]; everything it prints
//! comes from [`ValidationReport`] or the index and maturity types it wraps.

pub mod engine;
pub mod removal;
pub mod report;

pub use engine::{Analysis, DocumentResult, Engine};
pub use removal::{plan_removal, unlink, RemovalPlan, Rewrite};
pub use report::{Summary, ValidationReport, EXIT_DRIFT, EXIT_ERROR, EXIT_OK, EXIT_WARNINGS};
