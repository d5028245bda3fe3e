use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::span::Span;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every distinct problem the engine can report, grouped by the component
/// that produces it.
///
/// The serialized form is the stable `rule_id` (e.g. `schema/too-few-examples`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FindingKind {
    // Document model
    MissingFrontmatter,
    MalformedFrontmatter,
    UnknownSection,
    // Template selector
    UnknownKind,
    // Schema validator
    MissingField,
    MissingRequiredSection,
    SectionOrder,
    EmptySection,
    TooFewExamples,
    MissingCallout,
    InvalidEnum,
    InvalidDate,
    InvalidDateOrder,
    InvalidUrl,
    CategoryMismatch,
    MissingKindTable,
    TemplatePlaceholder,
    // Maturity
    StatusOverclaim,
    StatusUpgradeAvailable,
    // Cross-reference graph
    Dangling,
    Ambiguous,
    MissingBacklink,
    Orphaned,
    DanglingHeading,
    // Index synchronizer
    IndexStale,
    MissingIndex,
    // Run
    TimedOut,
}

const ALL_KINDS: &[FindingKind] = &[
    FindingKind::MissingFrontmatter,
    FindingKind::MalformedFrontmatter,
    FindingKind::UnknownSection,
    FindingKind::UnknownKind,
    FindingKind::MissingField,
    FindingKind::MissingRequiredSection,
    FindingKind::SectionOrder,
    FindingKind::EmptySection,
    FindingKind::TooFewExamples,
    FindingKind::MissingCallout,
    FindingKind::InvalidEnum,
    FindingKind::InvalidDate,
    FindingKind::InvalidDateOrder,
    FindingKind::InvalidUrl,
    FindingKind::CategoryMismatch,
    FindingKind::MissingKindTable,
    FindingKind::TemplatePlaceholder,
    FindingKind::StatusOverclaim,
    FindingKind::StatusUpgradeAvailable,
    FindingKind::Dangling,
    FindingKind::Ambiguous,
    FindingKind::MissingBacklink,
    FindingKind::Orphaned,
    FindingKind::DanglingHeading,
    FindingKind::IndexStale,
    FindingKind::MissingIndex,
    FindingKind::TimedOut,
];

impl FindingKind {
    pub fn rule_id(self) -> &'static str {
        match self {
            FindingKind::MissingFrontmatter => "parse/missing-frontmatter",
            FindingKind::MalformedFrontmatter => "parse/malformed-frontmatter",
            FindingKind::UnknownSection => "parse/unknown-section",
            FindingKind::UnknownKind => "template/unknown-kind",
            FindingKind::MissingField => "schema/missing-field",
            FindingKind::MissingRequiredSection => "schema/missing-section",
            FindingKind::SectionOrder => "schema/section-order",
            FindingKind::EmptySection => "schema/empty-section",
            FindingKind::TooFewExamples => "schema/too-few-examples",
            FindingKind::MissingCallout => "schema/missing-callout",
            FindingKind::InvalidEnum => "schema/invalid-enum",
            FindingKind::InvalidDate => "schema/invalid-date",
            FindingKind::InvalidDateOrder => "schema/invalid-date-order",
            FindingKind::InvalidUrl => "schema/invalid-url",
            FindingKind::CategoryMismatch => "schema/category-mismatch",
            FindingKind::MissingKindTable => "schema/missing-kind-table",
            FindingKind::TemplatePlaceholder => "schema/template-placeholder",
            FindingKind::StatusOverclaim => "status/overclaim",
            FindingKind::StatusUpgradeAvailable => "status/upgrade-available",
            FindingKind::Dangling => "link/dangling",
            FindingKind::Ambiguous => "link/ambiguous",
            FindingKind::MissingBacklink => "link/missing-backlink",
            FindingKind::Orphaned => "link/orphaned",
            FindingKind::DanglingHeading => "link/dangling-heading",
            FindingKind::IndexStale => "index/stale",
            FindingKind::MissingIndex => "index/missing-index",
            FindingKind::TimedOut => "run/timed-out",
        }
    }

    pub fn from_rule_id(rule_id: &str) -> Option<Self> {
        ALL_KINDS.iter().copied().find(|k| k.rule_id() == rule_id)
    }

    /// Severity used unless caller policy escalates it (see `LinkPolicy::strict_dangling`).
    pub fn default_severity(self) -> Severity {
        match self {
            FindingKind::MissingFrontmatter
            | FindingKind::MalformedFrontmatter
            | FindingKind::UnknownKind => Severity::Error,
            FindingKind::UnknownSection
            | FindingKind::StatusUpgradeAvailable
            | FindingKind::MissingIndex => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule_id())
    }
}

impl Serialize for FindingKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.rule_id())
    }
}

impl<'de> Deserialize<'de> for FindingKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FindingKind::from_rule_id(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown rule_id `{raw}`")))
    }
}

/// A single typed finding attached to one vault document.
///
/// `path` is the vault-relative document path so output stays deterministic
/// across machines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    #[serde(rename = "rule_id")]
    pub kind: FindingKind,
    pub severity: Severity,
    pub path: String,
    pub span: Span,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Value>,
}

impl Finding {
    pub fn new(kind: FindingKind, path: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            path: path.to_string(),
            span: Span::file(path),
            message: message.into(),
            evidence: None,
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.span.line = Some(line);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_evidence(mut self, evidence: Value) -> Self {
        self.evidence = Some(evidence);
        self
    }

    pub fn rule_id(&self) -> &'static str {
        self.kind.rule_id()
    }

    /// Total order used for every emitted findings list.
    pub fn sort_key(&self) -> (&str, Option<u32>, &'static str, &str) {
        (&self.path, self.span.line, self.kind.rule_id(), &self.message)
    }
}

pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

/// The most severe level present, or `None` for an empty list.
pub fn worst_severity(findings: &[Finding]) -> Option<Severity> {
    findings.iter().map(|f| f.severity).min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_ids_round_trip_through_lookup() {
        for kind in ALL_KINDS {
            assert_eq!(FindingKind::from_rule_id(kind.rule_id()), Some(*kind));
        }
        assert_eq!(FindingKind::from_rule_id("schema/nope"), None);
    }

    #[test]
    fn parse_failures_default_to_errors() {
        assert_eq!(
            FindingKind::MissingFrontmatter.default_severity(),
            Severity::Error
        );
        assert_eq!(FindingKind::Dangling.default_severity(), Severity::Warning);
        assert_eq!(
            FindingKind::StatusUpgradeAvailable.default_severity(),
            Severity::Info
        );
    }

    #[test]
    fn worst_severity_prefers_errors() {
        let findings = vec![
            Finding::new(FindingKind::UnknownSection, "a.md", "x"),
            Finding::new(FindingKind::Orphaned, "a.md", "y"),
        ];
        assert_eq!(worst_severity(&findings), Some(Severity::Warning));
        assert_eq!(worst_severity(&[]), None);
    }

    #[test]
    fn serializes_kind_as_rule_id() {
        let finding = Finding::new(FindingKind::TooFewExamples, "Concepts/a", "found 2").at_line(4);
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["rule_id"], "schema/too-few-examples");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["span"]["line"], 4);
        let back: Finding = serde_json::from_value(json).unwrap();
        assert_eq!(back, finding);
    }
}
