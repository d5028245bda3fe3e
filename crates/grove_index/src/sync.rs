use grove_core::{Finding, FindingKind};
use grove_document::Document;
use grove_links::Category;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::drift::{diff, IndexDrift};
use crate::listing::{expected_listing, parse_listing, ListingTable};

/// Expected listing and drift for one category index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub category: String,
    pub index_id: String,
    pub index_path: String,
    pub expected: ListingTable,
    pub drift: Option<IndexDrift>,
}

impl IndexReport {
    pub fn finding(&self) -> Option<Finding> {
        self.drift
            .as_ref()
            .map(|drift| drift.to_finding(&self.category, &self.index_path))
    }
}

pub fn sync_index(index: &Document, docs: &[Document]) -> IndexReport {
    let expected = expected_listing(&index.category, docs);
    let actual = parse_listing(&index.category, index.body());
    let drift = diff(&expected, actual.as_ref());
    IndexReport {
        category: index.category.clone(),
        index_id: index.id.clone(),
        index_path: index.path.clone(),
        expected,
        drift,
    }
}

/// Reports for every category index, plus drift and missing-index findings.
pub fn check_indexes(
    docs: &[Document],
    categories: &BTreeMap<String, Category>,
) -> (Vec<IndexReport>, Vec<Finding>) {
    let by_id: BTreeMap<&str, &Document> = docs.iter().map(|d| (d.id.as_str(), d)).collect();
    let mut reports = Vec::new();
    let mut findings = Vec::new();

    for category in categories.values() {
        match &category.index_id {
            Some(index_id) => {
                let Some(index) = by_id.get(index_id.as_str()) else {
                    continue;
                };
                let report = sync_index(index, docs);
                if let Some(drift) = &report.drift {
                    tracing::debug!(
                        category = %report.category,
                        summary = %drift.summary(),
                        "index listing drift"
                    );
                }
                findings.extend(report.finding());
                reports.push(report);
            }
            None if !category.member_ids.is_empty() && !category.path.is_empty() => {
                findings.push(Finding::new(
                    FindingKind::MissingIndex,
                    &category.path,
                    format!(
                        "category `{}` has {} document(s) but no index document",
                        category.path,
                        category.member_ids.len()
                    ),
                ));
            }
            None => {}
        }
    }
    (reports, findings)
}

/// Normalize a category argument as typed on the command line.
pub fn normalize_category(arg: &str) -> String {
    arg.trim().replace('\\', "/").trim_matches('/').to_string()
}
