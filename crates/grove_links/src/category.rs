use grove_document::Document;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One category path with its index document and direct members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Category {
    pub path: String,
    pub index_id: Option<String>,
    /// Non-index documents whose `category` equals `path`.
    pub member_ids: BTreeSet<String>,
    /// Further index documents claiming the same path, beyond `index_id`.
    pub extra_index_ids: Vec<String>,
}

impl Category {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }
}

/// Group a snapshot into categories. When several index documents claim one
/// path the lexicographically first id owns it.
pub fn build_categories<'a>(
    docs: impl IntoIterator<Item = &'a Document>,
) -> BTreeMap<String, Category> {
    let mut out: BTreeMap<String, Category> = BTreeMap::new();
    let mut indexes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for doc in docs {
        let entry = out
            .entry(doc.category.clone())
            .or_insert_with(|| Category::new(&doc.category));
        if doc.is_index() {
            indexes
                .entry(doc.category.clone())
                .or_default()
                .insert(doc.id.clone());
        } else {
            entry.member_ids.insert(doc.id.clone());
        }
    }
    for (path, ids) in indexes {
        if let Some(category) = out.get_mut(&path) {
            let mut ids = ids.into_iter();
            category.index_id = ids.next();
            category.extra_index_ids = ids.collect();
        }
    }
    out
}

/// `path` and each of its ancestors, nearest first, ending with the root `""`.
pub fn ancestor_paths(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut current = path.trim_matches('/');
    loop {
        out.push(current);
        match current.rsplit_once('/') {
            Some((parent, _)) => current = parent,
            None if !current.is_empty() => current = "",
            None => break,
        }
    }
    out
}

/// Index id of `path` or of its nearest ancestor category that has one.
pub fn nearest_index<'c>(
    categories: &'c BTreeMap<String, Category>,
    path: &str,
) -> Option<&'c str> {
    ancestor_paths(path)
        .into_iter()
        .find_map(|p| categories.get(p).and_then(|c| c.index_id.as_deref()))
}

/// True when `path` equals `ancestor` or lies beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    ancestor.is_empty()
        || path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grove_document::parse_document;

    fn doc(path: &str, kind: &str) -> Document {
        let category = path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
        let raw = format!(
            "---\ncategory: {category}\nkind: {kind}\nstatus: seed\ndate-created: 2024-01-01\ndate-updated: 2024-01-01\n---\n"
        );
        parse_document(path, &raw).unwrap()
    }

    #[test]
    fn groups_members_and_indexes() {
        let docs = vec![
            doc("Concepts/index.md", "index"),
            doc("Concepts/recursion.md", "standard"),
            doc("Concepts/Algorithms/binary-search.md", "algorithm"),
            doc("Concepts/Algorithms/zz-index.md", "index"),
            doc("Concepts/Algorithms/aa-index.md", "index"),
        ];
        let categories = build_categories(&docs);
        let concepts = &categories["Concepts"];
        assert_eq!(concepts.index_id.as_deref(), Some("Concepts/index"));
        assert_eq!(concepts.member_ids.len(), 1);
        let algos = &categories["Concepts/Algorithms"];
        assert_eq!(algos.index_id.as_deref(), Some("Concepts/Algorithms/aa-index"));
        assert_eq!(algos.extra_index_ids, vec!["Concepts/Algorithms/zz-index"]);
    }

    #[test]
    fn nearest_index_walks_up() {
        let docs = vec![
            doc("Concepts/index.md", "index"),
            doc("Concepts/Algorithms/Graphs/bfs.md", "algorithm"),
        ];
        let categories = build_categories(&docs);
        assert_eq!(
            nearest_index(&categories, "Concepts/Algorithms/Graphs"),
            Some("Concepts/index")
        );
        assert_eq!(nearest_index(&categories, "Tools"), None);
        assert_eq!(ancestor_paths("a/b"), vec!["a/b", "a", ""]);
        assert_eq!(ancestor_paths(""), vec![""]);
    }

    #[test]
    fn within() {
        assert!(is_within("Concepts/Algorithms", "Concepts"));
        assert!(is_within("Concepts", "Concepts"));
        assert!(!is_within("ConceptsExtra", "Concepts"));
        assert!(is_within("Anything", ""));
    }
}
