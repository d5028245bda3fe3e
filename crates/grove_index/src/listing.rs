use grove_document::{
    is_table_separator, parse_wikilink_inner, split_table_row, Difficulty, Document, FieldValue,
};
use grove_links::is_within;
use serde::Serialize;
use std::cmp::Ordering;

pub const LISTING_START: &str = "<!-- grove:listing:start -->";
pub const LISTING_END: &str = "<!-- grove:listing:end -->";

const HEADER: &str = "| Topic | Difficulty | Status |";
const SEPARATOR: &str = "|---|---|---|";
const NO_DIFFICULTY: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRow {
    pub id: String,
    pub title: String,
    pub difficulty: String,
    pub status: String,
}

impl ListingRow {
    pub fn for_document(doc: &Document) -> Self {
        let difficulty = match &doc.difficulty {
            Some(FieldValue::Known(d)) => d.label().to_string(),
            Some(FieldValue::Invalid(raw)) => cell_text(raw),
            None => NO_DIFFICULTY.to_string(),
        };
        let status = match &doc.status {
            FieldValue::Known(s) => s.label().to_string(),
            FieldValue::Invalid(raw) => cell_text(raw),
        };
        // An empty alias reads back as the link target.
        let title = match cell_text(&doc.title) {
            title if title.is_empty() => doc.id.clone(),
            title => title,
        };
        Self {
            id: doc.id.clone(),
            title,
            difficulty,
            status,
        }
    }

    fn render(&self) -> String {
        format!(
            "| [[{}\\|{}]] | {} | {} |",
            self.id,
            escape_cell(&self.title),
            escape_cell(&self.difficulty),
            escape_cell(&self.status)
        )
    }
}

/// A table cell holds one line with no padding, which is what parsing gives back.
fn cell_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Rows of one subcategory; `subcategory` is `None` for direct members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingGroup {
    pub subcategory: Option<String>,
    pub rows: Vec<ListingRow>,
}

/// Listing of one category index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingTable {
    pub category: String,
    pub groups: Vec<ListingGroup>,
}

impl ListingTable {
    pub fn rows(&self) -> impl Iterator<Item = (&Option<String>, &ListingRow)> {
        self.groups
            .iter()
            .flat_map(|g| g.rows.iter().map(move |row| (&g.subcategory, row)))
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.rows.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn difficulty_rank(doc: &Document) -> u8 {
    match doc.difficulty.as_ref().and_then(FieldValue::known) {
        Some(Difficulty::Beginner) => 0,
        Some(Difficulty::Intermediate) => 1,
        Some(Difficulty::Advanced) => 2,
        None => 3,
    }
}

fn listing_order(a: &Document, b: &Document) -> Ordering {
    difficulty_rank(a)
        .cmp(&difficulty_rank(b))
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Expected listing for `category`: every non-index document at or beneath
/// it, direct members first, nested members grouped by subcategory path.
/// Rows sort by difficulty (missing last), then title, then id.
pub fn expected_listing(category: &str, docs: &[Document]) -> ListingTable {
    let mut direct: Vec<&Document> = Vec::new();
    let mut nested: std::collections::BTreeMap<&str, Vec<&Document>> = Default::default();
    for doc in docs.iter().filter(|d| !d.is_index()) {
        if doc.category == category {
            direct.push(doc);
        } else if is_within(&doc.category, category) {
            nested.entry(doc.category.as_str()).or_default().push(doc);
        }
    }

    let to_rows = |mut members: Vec<&Document>| {
        members.sort_by(|a, b| listing_order(a, b));
        members.into_iter().map(ListingRow::for_document).collect()
    };

    let mut groups = vec![ListingGroup {
        subcategory: None,
        rows: to_rows(direct),
    }];
    for (path, members) in nested {
        let label = path
            .strip_prefix(category)
            .map(|rest| rest.trim_start_matches('/'))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(path);
        groups.push(ListingGroup {
            subcategory: Some(label.to_string()),
            rows: to_rows(members),
        });
    }

    ListingTable {
        category: category.to_string(),
        groups,
    }
}

/// Render the managed block, markers included, without a trailing newline.
pub fn render_listing(table: &ListingTable) -> String {
    let mut out = vec![LISTING_START.to_string()];
    for group in &table.groups {
        if let Some(sub) = &group.subcategory {
            out.push(String::new());
            out.push(format!("### {sub}"));
            out.push(String::new());
        }
        out.push(HEADER.to_string());
        out.push(SEPARATOR.to_string());
        out.extend(group.rows.iter().map(ListingRow::render));
    }
    out.push(LISTING_END.to_string());
    out.join("\n")
}

/// Line range `[start, end]` (0-based, inclusive) of the managed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSpan {
    Found { start: usize, end: usize },
    Absent,
    /// A start marker without a matching end marker.
    Unterminated { start: usize },
}

pub fn locate_block(text: &str) -> BlockSpan {
    let mut start = None;
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        match start {
            None if trimmed == LISTING_START => start = Some(idx),
            Some(s) if trimmed == LISTING_END => return BlockSpan::Found { start: s, end: idx },
            _ => {}
        }
    }
    match start {
        Some(start) => BlockSpan::Unterminated { start },
        None => BlockSpan::Absent,
    }
}

/// Parse the managed block out of an index document. `None` when the document
/// has no complete block.
pub fn parse_listing(category: &str, text: &str) -> Option<ListingTable> {
    let BlockSpan::Found { start, end } = locate_block(text) else {
        return None;
    };
    let mut groups = vec![ListingGroup {
        subcategory: None,
        rows: Vec::new(),
    }];
    for line in text.lines().skip(start + 1).take(end - start - 1) {
        let trimmed = line.trim();
        if let Some(sub) = trimmed.strip_prefix("### ") {
            groups.push(ListingGroup {
                subcategory: Some(sub.trim().to_string()),
                rows: Vec::new(),
            });
            continue;
        }
        if is_table_separator(trimmed) {
            continue;
        }
        let Some(cells) = split_table_row(trimmed) else {
            continue;
        };
        if cells
            .first()
            .is_some_and(|c| c.eq_ignore_ascii_case("topic"))
        {
            continue;
        }
        if let Some(row) = parse_row(&cells) {
            if let Some(group) = groups.last_mut() {
                group.rows.push(row);
            }
        }
    }
    Some(ListingTable {
        category: category.to_string(),
        groups,
    })
}

fn parse_row(cells: &[String]) -> Option<ListingRow> {
    let topic = cells.first()?.trim();
    let (id, title) = match topic
        .strip_prefix("[[")
        .and_then(|rest| rest.strip_suffix("]]"))
        .and_then(parse_wikilink_inner)
    {
        Some((target, alias, _)) => {
            let title = alias.unwrap_or_else(|| target.clone());
            (target, title)
        }
        None => (topic.to_string(), topic.to_string()),
    };
    let cell = |idx: usize| cells.get(idx).map(|c| c.trim().to_string()).unwrap_or_default();
    Some(ListingRow {
        id,
        title,
        difficulty: cell(1),
        status: cell(2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_document::parse_document;

    fn member(path: &str, title: &str, difficulty: Option<&str>, status: &str) -> Document {
        let category = path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
        let difficulty = difficulty
            .map(|d| format!("difficulty: {d}\n"))
            .unwrap_or_default();
        let raw = format!(
            "---\ntitle: {title}\ncategory: {category}\n{difficulty}status: {status}\ndate-created: 2024-01-01\ndate-updated: 2024-01-01\n---\n"
        );
        parse_document(path, &raw).unwrap()
    }

    #[test]
    fn expected_rows_sort_by_difficulty_then_title() {
        let docs = vec![
            member("Concepts/zeta.md", "Zeta", Some("beginner"), "seed"),
            member("Concepts/alpha.md", "alpha", Some("advanced"), "growing"),
            member("Concepts/beta.md", "Beta", Some("beginner"), "evergreen"),
            member("Concepts/none.md", "Aardvark", None, "seed"),
            member("Concepts/Algorithms/bfs.md", "BFS", Some("intermediate"), "seed"),
            member("Other/x.md", "X", Some("beginner"), "seed"),
        ];
        let table = expected_listing("Concepts", &docs);
        let direct: Vec<&str> = table.groups[0].rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(direct, vec!["Beta", "Zeta", "alpha", "Aardvark"]);
        assert_eq!(table.groups[0].rows[3].difficulty, "-");
        assert_eq!(table.groups.len(), 2);
        assert_eq!(table.groups[1].subcategory.as_deref(), Some("Algorithms"));
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn render_then_parse_is_lossless() {
        let docs = vec![
            member("Concepts/a.md", "Pipes | Filters", Some("beginner"), "seed"),
            member("Concepts/Graphs/bfs.md", "BFS", Some("intermediate"), "growing"),
        ];
        let table = expected_listing("Concepts", &docs);
        let rendered = render_listing(&table);
        assert!(rendered.contains("| [[Concepts/a\\|Pipes \\| Filters]] | Beginner | Seed |"));
        assert!(rendered.contains("### Graphs"));
        let text = format!("# Concepts\n\n{rendered}\n\nFooter\n");
        assert_eq!(parse_listing("Concepts", &text), Some(table));
    }

    #[test]
    fn padded_and_multiline_titles_survive_the_table() {
        let padded = parse_document(
            "Concepts/heap.md",
            "---\ntitle: \"Heap \"\ncategory: Concepts\nstatus: seed\ndate-created: 2024-01-01\ndate-updated: 2024-01-01\n---\n",
        )
        .unwrap();
        assert_eq!(padded.title, "Heap ");
        let folded = parse_document(
            "Concepts/trie.md",
            "---\ntitle: \"Prefix\\n  Tree\"\ncategory: Concepts\nstatus: seed\ndate-created: 2024-01-01\ndate-updated: 2024-01-01\n---\n",
        )
        .unwrap();
        let table = expected_listing("Concepts", &[padded, folded]);
        let titles: Vec<&str> = table.groups[0].rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Heap", "Prefix Tree"]);
        let text = render_listing(&table);
        assert_eq!(parse_listing("Concepts", &text), Some(table));
    }

    #[test]
    fn block_location() {
        assert_eq!(locate_block("a\nb"), BlockSpan::Absent);
        assert_eq!(
            locate_block(&format!("x\n{LISTING_START}\n{LISTING_END}\n")),
            BlockSpan::Found { start: 1, end: 2 }
        );
        assert_eq!(
            locate_block(&format!("{LISTING_START}\nrows")),
            BlockSpan::Unterminated { start: 0 }
        );
        assert_eq!(parse_listing("c", "no block"), None);
    }
}
