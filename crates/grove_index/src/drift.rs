use grove_core::{Finding, FindingKind};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

use crate::listing::{ListingRow, ListingTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowChange {
    pub id: String,
    pub field: &'static str,
    pub expected: String,
    pub actual: String,
}

/// Divergence between an index's stored listing and the expected one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexDrift {
    pub missing_block: bool,
    pub missing: Vec<ListingRow>,
    pub extra: Vec<ListingRow>,
    pub changed: Vec<RowChange>,
    pub reordered: bool,
}

impl IndexDrift {
    pub fn is_empty(&self) -> bool {
        !self.missing_block
            && self.missing.is_empty()
            && self.extra.is_empty()
            && self.changed.is_empty()
            && !self.reordered
    }

    pub fn summary(&self) -> String {
        let ids = |rows: &[ListingRow]| {
            rows.iter()
                .map(|r| r.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let mut parts = Vec::new();
        if self.missing_block {
            parts.push("no listing block".to_string());
        }
        if !self.missing.is_empty() {
            parts.push(format!("missing {}", ids(&self.missing)));
        }
        if !self.extra.is_empty() {
            parts.push(format!("extra {}", ids(&self.extra)));
        }
        if !self.changed.is_empty() {
            let changed: Vec<String> = self
                .changed
                .iter()
                .map(|c| format!("{} {}", c.id, c.field))
                .collect();
            parts.push(format!("changed {}", changed.join(", ")));
        }
        if self.reordered {
            parts.push("rows out of order".to_string());
        }
        parts.join("; ")
    }

    pub fn to_finding(&self, category: &str, index_path: &str) -> Finding {
        Finding::new(
            FindingKind::IndexStale,
            index_path,
            format!("listing for `{category}` is stale: {}", self.summary()),
        )
        .with_evidence(json!({ "category": category, "drift": self }))
    }
}

fn group_label(group: &Option<String>) -> String {
    group.clone().unwrap_or_else(|| "(direct)".to_string())
}

/// Compare the expected listing with what the index currently stores.
/// `None` means no drift.
pub fn diff(expected: &ListingTable, actual: Option<&ListingTable>) -> Option<IndexDrift> {
    let Some(actual) = actual else {
        return Some(IndexDrift {
            missing_block: true,
            missing: expected.rows().map(|(_, row)| row.clone()).collect(),
            ..IndexDrift::default()
        });
    };

    let mut drift = IndexDrift::default();
    let mut actual_rows: BTreeMap<&str, (&Option<String>, &ListingRow)> = BTreeMap::new();
    let mut actual_order = Vec::new();
    for (group, row) in actual.rows() {
        if actual_rows.insert(row.id.as_str(), (group, row)).is_some() {
            drift.extra.push(row.clone());
        } else {
            actual_order.push(row.id.as_str());
        }
    }

    let mut expected_order = Vec::new();
    for (group, row) in expected.rows() {
        let Some((actual_group, actual_row)) = actual_rows.get(row.id.as_str()) else {
            drift.missing.push(row.clone());
            continue;
        };
        expected_order.push(row.id.as_str());
        let fields = [
            ("group", group_label(group), group_label(actual_group)),
            ("title", row.title.clone(), actual_row.title.clone()),
            ("difficulty", row.difficulty.clone(), actual_row.difficulty.clone()),
            ("status", row.status.clone(), actual_row.status.clone()),
        ];
        for (field, want, have) in fields {
            if want != have {
                drift.changed.push(RowChange {
                    id: row.id.clone(),
                    field,
                    expected: want,
                    actual: have,
                });
            }
        }
    }

    let expected_ids: std::collections::BTreeSet<&str> =
        expected.rows().map(|(_, row)| row.id.as_str()).collect();
    for id in &actual_order {
        if !expected_ids.contains(id) {
            if let Some((_, row)) = actual_rows.get(id) {
                drift.extra.push((*row).clone());
            }
        }
    }
    let common_actual: Vec<&str> = actual_order
        .into_iter()
        .filter(|id| expected_ids.contains(id))
        .collect();
    drift.reordered = common_actual != expected_order;

    (!drift.is_empty()).then_some(drift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ListingGroup;

    fn row(id: &str, difficulty: &str) -> ListingRow {
        ListingRow {
            id: id.to_string(),
            title: id.to_string(),
            difficulty: difficulty.to_string(),
            status: "Seed".to_string(),
        }
    }

    fn table(groups: Vec<(Option<&str>, Vec<ListingRow>)>) -> ListingTable {
        ListingTable {
            category: "C".to_string(),
            groups: groups
                .into_iter()
                .map(|(sub, rows)| ListingGroup {
                    subcategory: sub.map(String::from),
                    rows,
                })
                .collect(),
        }
    }

    #[test]
    fn identical_listings_have_no_drift() {
        let t = table(vec![(None, vec![row("a", "Beginner"), row("b", "Advanced")])]);
        assert_eq!(diff(&t, Some(&t)), None);
    }

    #[test]
    fn missing_block_is_drift() {
        let t = table(vec![(None, vec![row("a", "Beginner")])]);
        let drift = diff(&t, None).unwrap();
        assert!(drift.missing_block);
        assert_eq!(drift.missing.len(), 1);
    }

    #[test]
    fn reports_missing_extra_changed_and_order() {
        let expected = table(vec![
            (None, vec![row("a", "Beginner"), row("b", "Beginner"), row("c", "Advanced")]),
            (Some("Sub"), vec![row("d", "Beginner")]),
        ]);
        let actual = table(vec![(
            None,
            vec![
                row("b", "Beginner"),
                row("a", "Intermediate"),
                row("zz", "Beginner"),
                row("d", "Beginner"),
            ],
        )]);
        let drift = diff(&expected, Some(&actual)).unwrap();
        assert_eq!(drift.missing, vec![row("c", "Advanced")]);
        assert_eq!(drift.extra, vec![row("zz", "Beginner")]);
        let changed: Vec<(&str, &str)> =
            drift.changed.iter().map(|c| (c.id.as_str(), c.field)).collect();
        assert_eq!(changed, vec![("a", "difficulty"), ("d", "group")]);
        assert!(drift.reordered);
        assert_eq!(
            drift.summary(),
            "missing c; extra zz; changed a difficulty, d group; rows out of order"
        );
    }

    #[test]
    fn stale_finding_names_missing_entries() {
        let expected = table(vec![(None, vec![row("C/x", "Beginner"), row("C/y", "Beginner")])]);
        let actual = table(vec![(None, vec![row("C/x", "Beginner")])]);
        let finding = diff(&expected, Some(&actual))
            .unwrap()
            .to_finding("C", "C/index.md");
        assert_eq!(finding.rule_id(), "index/stale");
        assert!(finding.message.contains("missing C/y"));
        assert_eq!(finding.evidence.unwrap()["drift"]["missing"][0]["id"], "C/y");
    }
}
