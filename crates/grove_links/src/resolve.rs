//! Pure wikilink resolution against the set of known document ids.

use grove_document::Document;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// How a link target was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    ExactId,
    Relative,
    Stem,
    Title,
    /// Several candidates; the one in the source's own category won.
    SameCategory,
    Ambiguous,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub resolved: Option<String>,
    pub kind: ResolutionKind,
    pub candidates: Vec<String>,
    pub norm_target: String,
}

impl Resolution {
    fn found(id: &str, kind: ResolutionKind, norm_target: String) -> Self {
        Self {
            resolved: Some(id.to_string()),
            kind,
            candidates: vec![id.to_string()],
            norm_target,
        }
    }

    fn missing(norm_target: String) -> Self {
        Self {
            resolved: None,
            kind: ResolutionKind::Missing,
            candidates: Vec::new(),
            norm_target,
        }
    }
}

/// Normalized link key: trimmed, `\` → `/`, no leading `./` or `/`, no
/// `.md` suffix, lowercase, with spaces and underscores turned into `-`.
pub fn normalize_key(s: &str) -> String {
    let mut out = s.trim().replace('\\', "/");
    while let Some(rest) = out.strip_prefix("./") {
        out = rest.to_string();
    }
    let out = out.trim_start_matches('/');
    let out = match out.len().checked_sub(3) {
        Some(cut) if out.is_char_boundary(cut) && out[cut..].eq_ignore_ascii_case(".md") => {
            &out[..cut]
        }
        _ => out,
    };
    out.to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '_' { '-' } else { c })
        .collect()
}

fn last_segment(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Lookup tables over one vault snapshot.
#[derive(Debug, Clone, Default)]
pub struct LinkResolver {
    ids: BTreeMap<String, String>,
    stems: BTreeMap<String, BTreeSet<String>>,
    titles: BTreeMap<String, BTreeSet<String>>,
    categories: BTreeMap<String, String>,
}

impl LinkResolver {
    pub fn new<'a>(docs: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut resolver = LinkResolver::default();
        for doc in docs {
            let key = normalize_key(&doc.id);
            resolver
                .stems
                .entry(last_segment(&key).to_string())
                .or_default()
                .insert(doc.id.clone());
            resolver
                .titles
                .entry(normalize_key(&doc.title))
                .or_default()
                .insert(doc.id.clone());
            resolver.ids.insert(key, doc.id.clone());
            resolver
                .categories
                .insert(doc.id.clone(), doc.category.clone());
        }
        resolver
    }

    /// Resolve `raw_target` as written in document `from_id`.
    ///
    /// Order: full id, path-like targets relative to the source's directory,
    /// path suffix or file stem, then title. Multiple stem or title candidates resolve only
    /// when exactly one shares the source's category.
    pub fn resolve(&self, from_id: &str, raw_target: &str) -> Resolution {
        let key = normalize_key(raw_target);
        if key.is_empty() {
            return Resolution::missing(key);
        }

        if let Some(id) = self.ids.get(&key) {
            return Resolution::found(id, ResolutionKind::ExactId, key);
        }

        if key.contains('/') {
            if let Some((dir, _)) = from_id.rsplit_once('/') {
                let relative = normalize_key(&format!("{dir}/{key}"));
                if let Some(id) = self.ids.get(&relative) {
                    return Resolution::found(id, ResolutionKind::Relative, key);
                }
            }
        }

        let suffix = format!("/{key}");
        let by_stem: Vec<String> = self
            .stems
            .get(last_segment(&key))
            .into_iter()
            .flatten()
            .filter(|id| {
                let id_key = normalize_key(id);
                id_key == key || id_key.ends_with(&suffix)
            })
            .cloned()
            .collect();
        if !by_stem.is_empty() {
            return self.pick(from_id, by_stem, ResolutionKind::Stem, key);
        }

        if let Some(ids) = self.titles.get(&key) {
            let ids = ids.iter().cloned().collect();
            return self.pick(from_id, ids, ResolutionKind::Title, key);
        }

        Resolution::missing(key)
    }

    fn pick(
        &self,
        from_id: &str,
        candidates: Vec<String>,
        kind: ResolutionKind,
        norm_target: String,
    ) -> Resolution {
        if let [only] = candidates.as_slice() {
            return Resolution::found(only, kind, norm_target);
        }
        let source_category = self.categories.get(from_id).map(String::as_str);
        match choose_ambiguous_target(source_category, &candidates, &self.categories) {
            Some(id) => Resolution {
                resolved: Some(id),
                kind: ResolutionKind::SameCategory,
                candidates,
                norm_target,
            },
            None => Resolution {
                resolved: None,
                kind: ResolutionKind::Ambiguous,
                candidates,
                norm_target,
            },
        }
    }
}

/// Break a tie between same-named documents: the single candidate in the
/// source's own category wins; anything else stays ambiguous.
pub fn choose_ambiguous_target(
    source_category: Option<&str>,
    candidates: &[String],
    categories: &BTreeMap<String, String>,
) -> Option<String> {
    let source_category = source_category?;
    let same: Vec<&String> = candidates
        .iter()
        .filter(|c| categories.get(*c).map(String::as_str) == Some(source_category))
        .collect();
    match same.as_slice() {
        [only] => Some((*only).clone()),
        _ => None,
    }
}
