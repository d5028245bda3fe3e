use chrono::NaiveDate;
use grove_core::ParseError;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::frontmatter::{opens_frontmatter, parse_yaml_to_json_map, split_frontmatter, value_type_name};
use crate::links::{extract_external_links, extract_wikilinks, ExternalLink, WikiLink};
use crate::model::{Difficulty, DocumentKind, FieldValue, Status};
use crate::scan::{
    classify_lines, count_words, heading_slug, is_table_separator, parse_callout, parse_heading,
    split_table_row, Callout, CalloutStyle, FencedBlock, Heading, LineClass, TableHeader,
};
use crate::sections::{Section, SectionTag};

/// One parsed vault document.
///
/// Immutable once parsed; content updates produce a new raw text that is
/// parsed again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Vault-relative path without extension.
    pub id: String,
    /// Vault-relative path as stored.
    pub path: String,
    pub title: String,
    pub category: String,
    pub kind: DocumentKind,
    pub tags: BTreeSet<String>,
    pub difficulty: Option<FieldValue<Difficulty>>,
    pub status: FieldValue<Status>,
    pub created: FieldValue<NaiveDate>,
    pub updated: FieldValue<NaiveDate>,
    pub sources: Vec<String>,
    /// Level-2 sections in body order.
    pub sections: Vec<Section>,
    pub headings: Vec<Heading>,
    pub links: Vec<WikiLink>,
    pub external_links: Vec<ExternalLink>,
    pub callouts: Vec<Callout>,
    /// Fenced blocks, each paired with the index of its enclosing section.
    pub code_blocks: Vec<(Option<usize>, FencedBlock)>,
    pub tables: Vec<(Option<usize>, TableHeader)>,
    #[serde(skip)]
    pub frontmatter: BTreeMap<String, Value>,
    #[serde(skip)]
    pub raw: String,
    #[serde(skip)]
    pub body_line: u32,
}

/// Derived content signals; computed on demand, never stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentMetrics {
    pub word_count: usize,
    pub example_count: usize,
    pub has_tip_callout: bool,
    pub has_warning_callout: bool,
}

impl Document {
    pub fn parse(path: &str, raw: &str) -> Result<Document, ParseError> {
        parse_document(path, raw)
    }

    pub fn body(&self) -> &str {
        split_frontmatter(&self.raw).map(|b| b.body).unwrap_or("")
    }

    /// Directory the document physically lives in (`""` at the vault root).
    pub fn location(&self) -> &str {
        self.path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }

    /// File name without extension.
    pub fn stem(&self) -> &str {
        self.id.rsplit_once('/').map(|(_, stem)| stem).unwrap_or(&self.id)
    }

    pub fn is_index(&self) -> bool {
        self.kind.is_index()
    }

    pub fn section(&self, tag: &SectionTag) -> Option<&Section> {
        self.sections.iter().find(|s| &s.tag == tag)
    }

    pub fn unknown_sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| !s.tag.is_known())
    }

    pub fn word_count(&self) -> usize {
        classify_lines(self.body())
            .into_iter()
            .map(|class| match class {
                LineClass::Prose(line) => count_words(line),
                _ => 0,
            })
            .sum()
    }

    /// Body lines outside fenced code, paired with their file line number.
    pub fn prose_lines(&self) -> Vec<(u32, &str)> {
        classify_lines(self.body())
            .into_iter()
            .enumerate()
            .filter_map(|(idx, class)| match class {
                LineClass::Prose(line) => Some((self.body_line + idx as u32, line)),
                _ => None,
            })
            .collect()
    }

    pub fn example_count(&self, extra_languages: &[String]) -> usize {
        self.code_blocks
            .iter()
            .filter(|(_, block)| block.is_example(extra_languages))
            .count()
    }

    pub fn section_example_count(&self, section: usize, extra_languages: &[String]) -> usize {
        self.code_blocks
            .iter()
            .filter(|(idx, block)| *idx == Some(section) && block.is_example(extra_languages))
            .count()
    }

    pub fn has_callout(&self, style: CalloutStyle) -> bool {
        self.callouts.iter().any(|c| c.style == style)
    }

    pub fn metrics(&self, extra_languages: &[String]) -> DocumentMetrics {
        DocumentMetrics {
            word_count: self.word_count(),
            example_count: self.example_count(extra_languages),
            has_tip_callout: self.has_callout(CalloutStyle::Tip),
            has_warning_callout: self.has_callout(CalloutStyle::Warning),
        }
    }

    /// True if `heading` (raw or slug form) names a heading in this document.
    pub fn has_heading(&self, heading: &str) -> bool {
        let slug = heading_slug(heading);
        self.headings.iter().any(|h| heading_slug(&h.text) == slug)
    }
}

/// `path` without its extension, with separators normalized to `/`.
pub fn document_id(path: &str) -> String {
    let path = path.replace('\\', "/");
    let (dir, file) = match path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, path.as_str()),
    };
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };
    match dir {
        Some(dir) => format!("{dir}/{stem}"),
        None => stem.to_string(),
    }
}

/// Parse one raw vault file into a `Document`.
///
/// Fails only for missing/malformed frontmatter or an unknown `kind`;
/// everything else (enum values, dates, section structure) is left for the
/// schema validator to report.
pub fn parse_document(path: &str, raw: &str) -> Result<Document, ParseError> {
    let path = path.replace('\\', "/");
    let Some(block) = split_frontmatter(raw) else {
        if opens_frontmatter(raw) {
            return Err(ParseError::MalformedFrontmatter(
                "frontmatter block is not terminated".to_string(),
            ));
        }
        return Err(ParseError::MissingFrontmatter);
    };
    let fm = parse_yaml_to_json_map(&block.yaml).map_err(ParseError::MalformedFrontmatter)?;

    let category = required_string(&fm, "category")?;
    let status = FieldValue::parse(&required_string(&fm, "status")?);
    let created = FieldValue::parse(&required_date(&fm, "date-created")?);
    let updated = FieldValue::parse(&required_date(&fm, "date-updated")?);
    let kind = match optional_string(&fm, "kind")?.or(optional_string(&fm, "type")?) {
        Some(raw_kind) => raw_kind.parse::<DocumentKind>()?,
        None => DocumentKind::Standard,
    };
    let difficulty = optional_string(&fm, "difficulty")?.map(|d| FieldValue::parse(&d));
    let tags = string_list(&fm, "tags")?.into_iter().collect();
    let sources = string_list(&fm, "sources")?;
    let fm_title = optional_string(&fm, "title")?;

    let body = Body::scan(block.body, block.body_line);
    for section in body.sections.iter().filter(|s| !s.tag.is_known()) {
        tracing::debug!(
            doc = %path,
            heading = %section.heading,
            line = section.line,
            "section heading outside the controlled vocabulary"
        );
    }

    let id = document_id(&path);
    let title = fm_title
        .or(body.h1.clone())
        .unwrap_or_else(|| id.rsplit('/').next().unwrap_or(&id).to_string());

    tracing::debug!(doc = %path, kind = %kind, sections = body.sections.len(), "parsed document");

    Ok(Document {
        id,
        path,
        title,
        category: category.trim().trim_matches('/').to_string(),
        kind,
        tags,
        difficulty,
        status,
        created,
        updated,
        sources,
        sections: body.sections,
        headings: body.headings,
        links: body.links,
        external_links: body.external_links,
        callouts: body.callouts,
        code_blocks: body.code_blocks,
        tables: body.tables,
        frontmatter: fm,
        raw: raw.to_string(),
        body_line: block.body_line,
    })
}

fn required_string(fm: &BTreeMap<String, Value>, key: &str) -> Result<String, ParseError> {
    optional_string(fm, key)?
        .ok_or_else(|| ParseError::MalformedFrontmatter(format!("required key `{key}` is missing")))
}

fn optional_string(fm: &BTreeMap<String, Value>, key: &str) -> Result<Option<String>, ParseError> {
    match fm.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ParseError::MalformedFrontmatter(format!(
            "key `{key}` should be a string, got {}",
            value_type_name(other)
        ))),
    }
}

/// Dates must be present; YAML may hand them over as strings or, for odd
/// spellings like `20240115`, as numbers, which are kept for the validator.
fn required_date(fm: &BTreeMap<String, Value>, key: &str) -> Result<String, ParseError> {
    match fm.get(key) {
        None | Some(Value::Null) => Err(ParseError::MalformedFrontmatter(format!(
            "required key `{key}` is missing"
        ))),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(ParseError::MalformedFrontmatter(format!(
            "key `{key}` should be a date, got {}",
            value_type_name(other)
        ))),
    }
}

fn string_list(fm: &BTreeMap<String, Value>, key: &str) -> Result<Vec<String>, ParseError> {
    match fm.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                other => Err(ParseError::MalformedFrontmatter(format!(
                    "key `{key}` should contain strings, found {}",
                    value_type_name(other)
                ))),
            })
            .collect(),
        Some(other) => Err(ParseError::MalformedFrontmatter(format!(
            "key `{key}` should be a list, got {}",
            value_type_name(other)
        ))),
    }
}

/// Result of a single fence-aware pass over the body.
#[derive(Default)]
struct Body {
    h1: Option<String>,
    sections: Vec<Section>,
    headings: Vec<Heading>,
    links: Vec<WikiLink>,
    external_links: Vec<ExternalLink>,
    callouts: Vec<Callout>,
    code_blocks: Vec<(Option<usize>, FencedBlock)>,
    tables: Vec<(Option<usize>, TableHeader)>,
}

impl Body {
    fn scan(body: &str, first_line: u32) -> Body {
        let mut out = Body::default();
        let raw_lines: Vec<&str> = body.lines().collect();
        let classes = classify_lines(body);
        let mut current: Option<usize> = None;

        for (idx, class) in classes.iter().enumerate() {
            let line_no = first_line + idx as u32;
            let raw_line = raw_lines.get(idx).copied().unwrap_or("");

            if let LineClass::Prose(line) = class {
                if let Some((level, text)) = parse_heading(line) {
                    out.headings.push(Heading {
                        level,
                        text: text.to_string(),
                        line: line_no,
                    });
                    if level == 1 && out.h1.is_none() {
                        out.h1 = Some(text.to_string());
                    }
                    if level == 2 {
                        out.sections.push(Section {
                            tag: SectionTag::from_heading(text),
                            heading: text.to_string(),
                            line: line_no,
                            body: String::new(),
                        });
                        current = Some(out.sections.len() - 1);
                        continue;
                    }
                }
            }

            if let Some(section) = current.and_then(|i| out.sections.get_mut(i)) {
                section.body.push_str(raw_line);
                section.body.push('\n');
            }

            match class {
                LineClass::Prose(line) => {
                    out.links.extend(extract_wikilinks(line, line_no, current));
                    out.external_links
                        .extend(extract_external_links(line, line_no, current));
                    if let Some((callout_type, style)) = parse_callout(line) {
                        out.callouts.push(Callout {
                            callout_type,
                            style,
                            line: line_no,
                        });
                    }
                    let next_is_separator = matches!(
                        classes.get(idx + 1),
                        Some(LineClass::Prose(next)) if is_table_separator(next)
                    );
                    if next_is_separator && !is_table_separator(line) {
                        if let Some(cells) = split_table_row(line) {
                            out.tables.push((current, TableHeader { cells, line: line_no }));
                        }
                    }
                }
                LineClass::FenceOpen { lang } => {
                    out.code_blocks.push((
                        current,
                        FencedBlock {
                            lang: lang.map(str::to_string),
                            line: line_no,
                        },
                    ));
                }
                LineClass::Code | LineClass::FenceClose => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "---
category: Concepts/Algorithms
kind: algorithm
tags: [search, arrays]
difficulty: beginner
status: growing
date-created: 2024-01-10
date-updated: 2024-02-01
sources:
  - https://en.wikipedia.org/wiki/Binary_search
---
# Binary Search

## Summary
Halve the search space each step. See [[Linear Search]].

> [!tip] Sorted input
> Only works on sorted arrays.

## Complexity
| Case | Time | Space |
|---|---|---|
| Worst | O(log n) | O(1) |

## Examples
```python
def bsearch(xs, x): ...
```
```mermaid
graph TD
```
```rust
// ## not a heading [[Not A Link]]
```

## Historical Notes
Invented early.

## Related Topics
- [[Concepts/Algorithms/linear-search|Linear Search]]
";

    #[test]
    fn parses_frontmatter_fields() {
        let doc = parse_document("Concepts/Algorithms/binary-search.md", DOC).unwrap();
        assert_eq!(doc.id, "Concepts/Algorithms/binary-search");
        assert_eq!(doc.title, "Binary Search");
        assert_eq!(doc.category, "Concepts/Algorithms");
        assert_eq!(doc.location(), "Concepts/Algorithms");
        assert_eq!(doc.stem(), "binary-search");
        assert_eq!(doc.kind, DocumentKind::AlgorithmOrDataStructure);
        assert_eq!(doc.difficulty, Some(FieldValue::Known(Difficulty::Beginner)));
        assert_eq!(doc.status, FieldValue::Known(Status::Growing));
        assert_eq!(
            doc.created.known(),
            NaiveDate::from_ymd_opt(2024, 1, 10)
        );
        assert!(doc.tags.contains("arrays"));
        assert_eq!(doc.sources.len(), 1);
    }

    #[test]
    fn splits_sections_and_keeps_unknown_ones() {
        let doc = parse_document("Concepts/Algorithms/binary-search.md", DOC).unwrap();
        let tags: Vec<_> = doc.sections.iter().map(|s| s.tag.clone()).collect();
        assert_eq!(
            tags,
            vec![
                SectionTag::Summary,
                SectionTag::Complexity,
                SectionTag::Examples,
                SectionTag::Other("Historical Notes".to_string()),
                SectionTag::RelatedTopics,
            ]
        );
        assert_eq!(doc.unknown_sections().count(), 1);
        assert_eq!(doc.sections[0].line, 14);
    }

    #[test]
    fn derived_metrics_ignore_code() {
        let doc = parse_document("Concepts/Algorithms/binary-search.md", DOC).unwrap();
        let metrics = doc.metrics(&[]);
        assert_eq!(metrics.example_count, 2);
        assert!(metrics.has_tip_callout);
        assert!(!metrics.has_warning_callout);
        assert_eq!(doc.section_example_count(2, &[]), 2);
        assert_eq!(doc.example_count(&["mermaid".to_string()]), 3);
        assert!(metrics.word_count > 20);
    }

    #[test]
    fn links_outside_code_only() {
        let doc = parse_document("Concepts/Algorithms/binary-search.md", DOC).unwrap();
        let targets: Vec<_> = doc.links.iter().map(|l| l.target.as_str()).collect();
        assert_eq!(
            targets,
            vec!["Linear Search", "Concepts/Algorithms/linear-search"]
        );
        assert_eq!(doc.links[0].section, Some(0));
        assert_eq!(doc.links[1].section, Some(4));
        assert_eq!(doc.external_links.len(), 0);
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(doc.tables[0].1.cells, vec!["Case", "Time", "Space"]);
        assert!(doc.has_heading("related-topics"));
        assert!(!doc.has_heading("not a heading"));
    }

    #[test]
    fn missing_frontmatter() {
        assert_eq!(
            parse_document("a.md", "# Title\nBody"),
            Err(ParseError::MissingFrontmatter)
        );
    }

    #[test]
    fn malformed_frontmatter() {
        let err = parse_document("a.md", "---\nstatus: seed\n---\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedFrontmatter(ref m) if m.contains("category")));

        let err = parse_document(
            "a.md",
            "---\ncategory: A\nstatus: seed\ndate-created: 2024-01-01\ndate-updated: 2024-01-01\ntags: one\n---\n",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::MalformedFrontmatter(ref m) if m.contains("list")));

        let err = parse_document("a.md", "---\ncategory: A\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedFrontmatter(_)));
    }

    #[test]
    fn unknown_kind_is_a_template_error() {
        let err = parse_document(
            "a.md",
            "---\ncategory: A\nkind: recipe\nstatus: seed\ndate-created: 2024-01-01\ndate-updated: 2024-01-01\n---\n",
        )
        .unwrap_err();
        assert_eq!(err.kind(), grove_core::FindingKind::UnknownKind);
    }

    #[test]
    fn invalid_enums_survive_parsing() {
        let doc = parse_document(
            "A/x.md",
            "---\ncategory: A\nstatus: ripe\ndifficulty: expert\ndate-created: 2024-13-01\ndate-updated: 2024-01-01\n---\n",
        )
        .unwrap();
        assert_eq!(doc.status, FieldValue::Invalid("ripe".to_string()));
        assert_eq!(doc.difficulty, Some(FieldValue::Invalid("expert".to_string())));
        assert_eq!(doc.created, FieldValue::Invalid("2024-13-01".to_string()));
        assert_eq!(doc.title, "x");
        assert_eq!(doc.kind, DocumentKind::Standard);
    }

    #[test]
    fn ids_drop_extension() {
        assert_eq!(document_id("Concepts/a.b/c.md"), "Concepts/a.b/c");
        assert_eq!(document_id("root.md"), "root");
        assert_eq!(document_id("dir\\x.md"), "dir/x");
    }
}
