//! Seed → growing → evergreen progression.
//!
//! Status is authored metadata. The engine only suggests a status from
//! measured content signals and reports disagreement; it never rewrites the
//! stored value on its own. Manual overrides go through [`StatusOverride`],
//! which logs an explicit event.

use grove_core::{Finding, FindingKind, MaturityPolicy};
use grove_document::{Document, Status};
use serde::Serialize;
use serde_json::json;

use crate::templates::TemplateContract;

/// Content measurements that drive the suggested status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSignals {
    pub word_count: usize,
    pub example_count: usize,
    /// Every contract-required section is present and non-empty.
    pub sections_complete: bool,
}

impl StatusSignals {
    pub fn measure(
        doc: &Document,
        contract: &TemplateContract,
        extra_languages: &[String],
    ) -> StatusSignals {
        let sections_complete = contract
            .required_sections
            .iter()
            .all(|tag| doc.section(tag).is_some_and(|s| !s.is_empty()));
        StatusSignals {
            word_count: doc.word_count(),
            example_count: doc.example_count(extra_languages),
            sections_complete,
        }
    }
}

/// Highest status whose thresholds the signals meet.
pub fn suggested_status(signals: &StatusSignals, policy: &MaturityPolicy) -> Status {
    let evergreen = signals.word_count >= policy.evergreen_min_words
        && signals.example_count >= policy.evergreen_min_examples
        && signals.sections_complete;
    if evergreen {
        return Status::Evergreen;
    }
    if signals.word_count >= policy.growing_min_words
        && signals.example_count >= policy.growing_min_examples
    {
        return Status::Growing;
    }
    Status::Seed
}

/// Status an automatic promotion would propose: never below the stored one.
pub fn proposed_status(stored: Status, suggested: Status) -> Status {
    stored.max(suggested)
}

/// Compare the stored status to the suggested one.
///
/// Index documents and documents whose stored status is not a valid value
/// (already reported by the schema validator) yield nothing.
pub fn validate_status(
    doc: &Document,
    contract: &TemplateContract,
    policy: &MaturityPolicy,
    extra_languages: &[String],
) -> Option<Finding> {
    if doc.is_index() {
        return None;
    }
    let stored = doc.status.known()?;
    let signals = StatusSignals::measure(doc, contract, extra_languages);
    let suggested = suggested_status(&signals, policy);
    let evidence = json!({
        "stored": stored.as_str(),
        "suggested": suggested.as_str(),
        "signals": signals,
    });

    match stored.cmp(&suggested) {
        std::cmp::Ordering::Greater => Some(
            Finding::new(
                FindingKind::StatusOverclaim,
                &doc.path,
                format!(
                    "status is {stored} but content only supports {suggested} ({} words, {} examples)",
                    signals.word_count, signals.example_count
                ),
            )
            .with_evidence(evidence),
        ),
        std::cmp::Ordering::Less => Some(
            Finding::new(
                FindingKind::StatusUpgradeAvailable,
                &doc.path,
                format!("content supports {}; status is {stored}", suggested.label()),
            )
            .with_evidence(evidence),
        ),
        std::cmp::Ordering::Equal => None,
    }
}

/// An explicit, author-requested status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusOverride {
    pub doc: String,
    pub from: Option<Status>,
    pub to: Status,
    pub reason: Option<String>,
}

impl StatusOverride {
    pub fn new(doc: &str, from: Option<Status>, to: Status, reason: Option<String>) -> Self {
        Self {
            doc: doc.to_string(),
            from,
            to,
            reason,
        }
    }

    /// True when the override lowers the status, which promotion never does.
    pub fn is_downgrade(&self) -> bool {
        self.from.is_some_and(|from| self.to < from)
    }

    pub fn log(&self) {
        tracing::info!(
            event = "status_override",
            doc = %self.doc,
            from = self.from.map(Status::as_str).unwrap_or("invalid"),
            to = self.to.as_str(),
            reason = self.reason.as_deref().unwrap_or(""),
            downgrade = self.is_downgrade(),
            "manual status override"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::{TemplateRepository, TemplateTable};
    use grove_document::parse_document;

    fn signals(words: usize, examples: usize, complete: bool) -> StatusSignals {
        StatusSignals {
            word_count: words,
            example_count: examples,
            sections_complete: complete,
        }
    }

    #[test]
    fn thresholds() {
        let policy = MaturityPolicy::default();
        assert_eq!(suggested_status(&signals(999, 5, true), &policy), Status::Seed);
        assert_eq!(suggested_status(&signals(1000, 1, true), &policy), Status::Seed);
        assert_eq!(suggested_status(&signals(1000, 2, false), &policy), Status::Growing);
        assert_eq!(suggested_status(&signals(2999, 9, true), &policy), Status::Growing);
        assert_eq!(suggested_status(&signals(3000, 3, false), &policy), Status::Growing);
        assert_eq!(suggested_status(&signals(3000, 3, true), &policy), Status::Evergreen);
    }

    #[test]
    fn promotion_never_downgrades() {
        assert_eq!(proposed_status(Status::Evergreen, Status::Seed), Status::Evergreen);
        assert_eq!(proposed_status(Status::Seed, Status::Growing), Status::Growing);
    }

    fn long_doc(status: &str) -> String {
        let prose = "word ".repeat(3200);
        format!(
            "---
category: Concepts
difficulty: beginner
status: {status}
date-created: 2024-01-10
date-updated: 2024-01-10
sources: [https://example.com]
---
## Summary
{prose}
## Examples
```python
a()
```
```python
b()
```
```python
c()
```
```python
d()
```
## Related Topics
- [[Concepts/other]]
## References
- https://example.com
"
        )
    }

    #[test]
    fn upgrade_available_names_the_target() {
        let doc = parse_document("Concepts/long.md", &long_doc("seed")).unwrap();
        let table = TemplateTable::default();
        let contract = table.contract_for(doc.kind);
        let signals = StatusSignals::measure(&doc, contract, &[]);
        assert!(signals.word_count >= 3200);
        assert_eq!(signals.example_count, 4);
        assert!(signals.sections_complete);

        let finding =
            validate_status(&doc, contract, &MaturityPolicy::default(), &[]).unwrap();
        assert_eq!(finding.kind, FindingKind::StatusUpgradeAvailable);
        assert_eq!(finding.severity, grove_core::Severity::Info);
        assert!(finding.message.contains("Evergreen"));
        assert_eq!(finding.evidence.unwrap()["suggested"], "evergreen");
    }

    #[test]
    fn overclaim_is_a_warning_and_match_is_silent() {
        let raw = "---
category: Concepts
difficulty: beginner
status: evergreen
date-created: 2024-01-10
date-updated: 2024-01-10
sources: [https://example.com]
---
## Summary
Short.
";
        let doc = parse_document("Concepts/short.md", raw).unwrap();
        let table = TemplateTable::default();
        let contract = table.contract_for(doc.kind);
        let finding =
            validate_status(&doc, contract, &MaturityPolicy::default(), &[]).unwrap();
        assert_eq!(finding.kind, FindingKind::StatusOverclaim);
        assert_eq!(finding.severity, grove_core::Severity::Warning);

        let doc = parse_document("Concepts/long.md", &long_doc("evergreen")).unwrap();
        assert_eq!(
            validate_status(&doc, contract, &MaturityPolicy::default(), &[]),
            None
        );
    }

    #[test]
    fn suggestion_is_stable() {
        let doc = parse_document("Concepts/long.md", &long_doc("growing")).unwrap();
        let table = TemplateTable::default();
        let contract = table.contract_for(doc.kind);
        let policy = MaturityPolicy::default();
        let first = suggested_status(&StatusSignals::measure(&doc, contract, &[]), &policy);
        let second = suggested_status(&StatusSignals::measure(&doc, contract, &[]), &policy);
        assert_eq!(first, second);
    }

    #[test]
    fn overrides_know_their_direction() {
        let down = StatusOverride::new("a", Some(Status::Evergreen), Status::Seed, None);
        assert!(down.is_downgrade());
        let up = StatusOverride::new("a", Some(Status::Seed), Status::Growing, Some("done".into()));
        assert!(!up.is_downgrade());
        up.log();
    }
}
