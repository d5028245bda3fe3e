//! Per-document checks: which template contract a document kind must meet,
//! whether the document meets it, and whether its maturity status matches
//! its content.

pub mod maturity;
pub mod templates;
pub mod validate;

pub use maturity::{proposed_status, suggested_status, validate_status, StatusOverride, StatusSignals};
pub use templates::{
    KindTable, TemplateContract, TemplateRepository, TemplateTable, COMPLEXITY_TABLE, FLAGS_TABLE,
};
pub use validate::{is_valid_url, validate_document};
