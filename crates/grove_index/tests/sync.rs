use chrono::NaiveDate;
use grove_document::{parse_document, Document};
use grove_index::{apply_listing, check_indexes, parse_listing, render_listing, sync_index};
use grove_links::build_categories;

fn member(path: &str, title: &str, difficulty: &str) -> Document {
    let category = path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
    let raw = format!(
        "---\ntitle: {title}\ncategory: {category}\ndifficulty: {difficulty}\nstatus: seed\ndate-created: 2024-01-01\ndate-updated: 2024-01-01\n---\n# {title}\n"
    );
    parse_document(path, &raw).unwrap()
}

fn index_raw(category: &str, listing: &str) -> String {
    format!(
        "---\ntitle: {category}\ncategory: {category}\nkind: index\nstatus: seed\ndate-created: 2024-01-01\ndate-updated: 2024-01-01\n---\n# Overview\n\n{listing}\n"
    )
}

fn algorithms() -> Vec<Document> {
    vec![
        member("Concepts/Algorithms/binary-search.md", "Binary Search", "beginner"),
        member("Concepts/Algorithms/bfs.md", "BFS", "beginner"),
        member("Concepts/Algorithms/dfs.md", "DFS", "beginner"),
        member("Concepts/Algorithms/dijkstra.md", "Dijkstra", "intermediate"),
        member("Concepts/Algorithms/a-star.md", "A*", "advanced"),
        member("Concepts/Algorithms/quicksort.md", "Quicksort", "intermediate"),
    ]
}

#[test]
fn index_listing_one_member_short_is_stale() {
    let mut docs = algorithms();
    let five: Vec<Document> = docs
        .iter()
        .filter(|d| d.id != "Concepts/Algorithms/quicksort")
        .cloned()
        .collect();
    let listing = render_listing(&grove_index::expected_listing("Concepts/Algorithms", &five));
    let index = parse_document(
        "Concepts/Algorithms/index.md",
        &index_raw("Concepts/Algorithms", &listing),
    )
    .unwrap();
    assert_eq!(parse_listing("Concepts/Algorithms", index.body()).unwrap().len(), 5);
    docs.push(index);

    let categories = build_categories(&docs);
    let (reports, findings) = check_indexes(&docs, &categories);
    assert_eq!(reports.len(), 1);
    let drift = reports[0].drift.as_ref().unwrap();
    let missing: Vec<&str> = drift.missing.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(missing, vec!["Concepts/Algorithms/quicksort"]);
    assert!(drift.extra.is_empty());

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule_id(), "index/stale");
    assert_eq!(findings[0].path, "Concepts/Algorithms/index.md");
    assert!(findings[0].message.contains("Concepts/Algorithms/quicksort"));
}

#[test]
fn applied_listing_has_no_drift() {
    let mut docs = algorithms();
    let raw = index_raw("Concepts/Algorithms", "Hand-written notes.");
    let index = parse_document("Concepts/Algorithms/index.md", &raw).unwrap();
    let report = sync_index(&index, &docs);
    assert!(report.drift.as_ref().unwrap().missing_block);

    let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    let written = apply_listing(&index.path, &raw, &report.expected, today).unwrap();
    assert!(written.contains("Hand-written notes."));
    assert!(written.contains("date-updated: 2026-10-17"));

    let reparsed = parse_document("Concepts/Algorithms/index.md", &written).unwrap();
    assert_eq!(sync_index(&reparsed, &docs).drift, None);

    docs.push(reparsed);
    let (_, findings) = check_indexes(&docs, &build_categories(&docs));
    assert!(findings.is_empty(), "{findings:?}");
}

#[test]
fn padded_title_settles_after_one_apply() {
    let docs = vec![member("C/heap.md", "\"Heap \"", "beginner")];
    assert_eq!(docs[0].title, "Heap ");
    let raw = index_raw("C", "");
    let index = parse_document("C/index.md", &raw).unwrap();
    let report = sync_index(&index, &docs);

    let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    let written = apply_listing(&index.path, &raw, &report.expected, today).unwrap();
    let reparsed = parse_document("C/index.md", &written).unwrap();
    assert_eq!(sync_index(&reparsed, &docs).drift, None);
}

#[test]
fn category_without_index_is_reported_once() {
    let docs = vec![
        member("Tools/grep.md", "grep", "beginner"),
        member("Tools/sed.md", "sed", "intermediate"),
    ];
    let (reports, findings) = check_indexes(&docs, &build_categories(&docs));
    assert!(reports.is_empty());
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].rule_id(), "index/missing-index");
    assert_eq!(findings[0].path, "Tools");
    assert_eq!(findings[0].severity, grove_core::Severity::Info);
}
