//! Removing a document without leaving dangling links behind.

use chrono::NaiveDate;
use grove_core::StoreError;
use grove_document::{find_wikilink_tokens, parse_wikilink_inner, set_frontmatter_field, Document};
use grove_index::{locate_block, BlockSpan};
use grove_snapshot::FileStore;
use std::collections::{BTreeMap, BTreeSet};

use crate::engine::Analysis;

/// A rewritten document whose links to the removed one were unlinked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub path: String,
    pub text: String,
    /// Text the document had when the plan was made.
    pub original: String,
    pub unlinked: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPlan {
    pub path: String,
    pub id: String,
    pub category: String,
    pub rewrites: Vec<Rewrite>,
}

impl RemovalPlan {
    /// Write every rewrite, then delete the document. If any step fails the
    /// rewrites already written are put back and the document stays.
    pub fn execute(&self, store: &dyn FileStore) -> Result<(), StoreError> {
        let mut written: Vec<&Rewrite> = Vec::new();
        for rewrite in &self.rewrites {
            if let Err(err) = store.write(&rewrite.path, &rewrite.text) {
                restore(store, &written);
                return Err(err);
            }
            tracing::info!(path = %rewrite.path, unlinked = rewrite.unlinked, "pruned links");
            written.push(rewrite);
        }
        if let Err(err) = store.remove(&self.path) {
            restore(store, &written);
            return Err(err);
        }
        tracing::info!(path = %self.path, "removed document");
        Ok(())
    }
}

fn restore(store: &dyn FileStore, written: &[&Rewrite]) {
    for rewrite in written.iter().rev() {
        if let Err(err) = store.write(&rewrite.path, &rewrite.original) {
            tracing::error!(path = %rewrite.path, error = %err, "could not restore document");
        }
    }
}

/// 1-based file lines of an index's managed listing, which is regenerated
/// rather than edited.
fn listing_lines(doc: &Document) -> Option<(u32, u32)> {
    if !doc.is_index() {
        return None;
    }
    match locate_block(&doc.raw) {
        BlockSpan::Found { start, end } => Some((start as u32 + 1, end as u32 + 1)),
        _ => None,
    }
}

/// Work out every edit that removing `doc` requires, without touching the store.
pub fn plan_removal(analysis: &Analysis, doc: &Document, today: NaiveDate) -> RemovalPlan {
    let listings: BTreeMap<&str, (u32, u32)> = analysis
        .documents
        .iter()
        .filter_map(|d| listing_lines(d).map(|span| (d.id.as_str(), span)))
        .collect();
    let in_listing = |source: &str, line: u32| {
        listings
            .get(source)
            .is_some_and(|(start, end)| (*start..=*end).contains(&line))
    };

    let mut by_source: BTreeMap<&str, BTreeSet<(u32, &str)>> = BTreeMap::new();
    if let Some(graph) = &analysis.graph {
        for link in graph.links_to(&doc.id) {
            if link.source_id != doc.id && !in_listing(&link.source_id, link.line) {
                by_source
                    .entry(link.source_id.as_str())
                    .or_default()
                    .insert((link.line, link.target_ref.as_str()));
            }
        }
    }

    let date = today.format("%Y-%m-%d").to_string();
    let mut rewrites = Vec::new();
    for (source_id, refs) in by_source {
        let Some(source) = analysis.documents.iter().find(|d| d.id == source_id) else {
            continue;
        };
        let (text, unlinked) = unlink(&source.raw, &refs);
        if unlinked == 0 {
            continue;
        }
        let text = set_frontmatter_field(&text, "date-updated", &date).unwrap_or(text);
        rewrites.push(Rewrite {
            path: source.path.clone(),
            text,
            original: source.raw.clone(),
            unlinked,
        });
    }

    RemovalPlan {
        path: doc.path.clone(),
        id: doc.id.clone(),
        category: doc.category.clone(),
        rewrites,
    }
}

/// Replace the listed wikilink tokens, given as `(line, token)`, with the text
/// a reader sees for them. Returns the new text and how many tokens changed.
pub fn unlink(raw: &str, refs: &BTreeSet<(u32, &str)>) -> (String, usize) {
    let mut out = String::with_capacity(raw.len());
    let mut unlinked = 0;
    for (idx, line) in raw.split_inclusive('\n').enumerate() {
        let line_no = idx as u32 + 1;
        let wanted: Vec<&str> = refs
            .range((line_no, "")..)
            .take_while(|(l, _)| *l == line_no)
            .map(|(_, token)| *token)
            .collect();
        if wanted.is_empty() {
            out.push_str(line);
            continue;
        }

        let mut cursor = 0;
        for token in find_wikilink_tokens(line) {
            let written = &line[token.start..token.end];
            if !wanted.contains(&written) {
                continue;
            }
            let inner = &line[token.inner_start..token.inner_end];
            let Some((target, alias, _)) = parse_wikilink_inner(inner) else {
                continue;
            };
            out.push_str(&line[cursor..token.start]);
            out.push_str(alias.as_deref().unwrap_or(&target));
            cursor = token.end;
            unlinked += 1;
        }
        out.push_str(&line[cursor..]);
    }
    (out, unlinked)
}
