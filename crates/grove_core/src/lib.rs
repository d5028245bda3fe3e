//! Shared vocabulary for the grove vault engine: typed findings, the error
//! taxonomy and vault policy configuration.

pub mod config;
pub mod error;
pub mod finding;
pub mod span;

pub use config::{GroveConfig, LinkPolicy, MaturityPolicy, SchemaPolicy, TemplateOverride};
pub use error::{ConfigError, ParseError, StoreError, TemplateError};
pub use finding::{sort_findings, worst_severity, Finding, FindingKind, Severity};
pub use span::Span;
