use grove_core::{sort_findings, Finding, FindingKind, LinkPolicy, Severity};
use grove_document::{heading_slug, Document, SectionTag, WikiLink};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::category::{build_categories, nearest_index, Category};
use crate::resolve::{LinkResolver, ResolutionKind};

/// One wikilink occurrence with its resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub source_id: String,
    /// Token as written, e.g. `[[B|Bee]]`.
    pub target_ref: String,
    pub target: String,
    pub heading: Option<String>,
    pub line: u32,
    pub in_related_topics: bool,
    pub resolved: Option<String>,
    pub resolution: ResolutionKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<String>,
}

impl Link {
    pub fn is_dangling(&self) -> bool {
        self.resolution == ResolutionKind::Missing
    }

    fn is_self_link(&self) -> bool {
        self.resolved.as_deref() == Some(self.source_id.as_str())
    }
}

#[derive(Debug, Clone)]
struct Node {
    path: String,
    category: String,
    is_index: bool,
    heading_slugs: BTreeSet<String>,
}

/// Directed reference graph over one immutable vault snapshot.
///
/// Links are stored sorted by source id, then by position in the source
/// body, whatever order the documents were supplied in.
#[derive(Debug, Clone)]
pub struct CrossReferenceGraph {
    nodes: BTreeMap<String, Node>,
    links: Vec<Link>,
    outbound: BTreeMap<String, BTreeSet<String>>,
    inbound: BTreeMap<String, BTreeSet<String>>,
    categories: BTreeMap<String, Category>,
}

impl CrossReferenceGraph {
    pub fn build(docs: &[Document]) -> Self {
        let mut sorted: Vec<&Document> = docs.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        let resolver = LinkResolver::new(sorted.iter().copied());
        let categories = build_categories(sorted.iter().copied());
        let mut nodes = BTreeMap::new();
        let mut links = Vec::new();
        let mut outbound: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut inbound: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for doc in &sorted {
            nodes.insert(
                doc.id.clone(),
                Node {
                    path: doc.path.clone(),
                    category: doc.category.clone(),
                    is_index: doc.is_index(),
                    heading_slugs: doc.headings.iter().map(|h| heading_slug(&h.text)).collect(),
                },
            );

            let related: BTreeSet<usize> = doc
                .sections
                .iter()
                .enumerate()
                .filter(|(_, s)| s.tag == SectionTag::RelatedTopics)
                .map(|(idx, _)| idx)
                .collect();

            let mut doc_links: Vec<&WikiLink> =
                doc.links.iter().filter(|l| !is_asset_embed(l)).collect();
            doc_links.sort_by_key(|l| l.line);
            for wikilink in doc_links {
                let resolution = resolver.resolve(&doc.id, &wikilink.target);
                let link = Link {
                    source_id: doc.id.clone(),
                    target_ref: wikilink.raw.clone(),
                    target: wikilink.target.clone(),
                    heading: wikilink.heading.clone(),
                    line: wikilink.line,
                    in_related_topics: wikilink.section.is_some_and(|s| related.contains(&s)),
                    resolved: resolution.resolved,
                    resolution: resolution.kind,
                    candidates: if resolution.kind == ResolutionKind::Ambiguous {
                        resolution.candidates
                    } else {
                        Vec::new()
                    },
                };
                if let (Some(target), false) = (&link.resolved, link.is_self_link()) {
                    outbound
                        .entry(doc.id.clone())
                        .or_default()
                        .insert(target.clone());
                    inbound
                        .entry(target.clone())
                        .or_default()
                        .insert(doc.id.clone());
                }
                links.push(link);
            }
        }

        tracing::debug!(
            documents = nodes.len(),
            links = links.len(),
            "built cross-reference graph"
        );

        Self {
            nodes,
            links,
            outbound,
            inbound,
            categories,
        }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Links from other documents that resolve to `id`.
    pub fn links_to<'g>(&'g self, id: &'g str) -> impl Iterator<Item = &'g Link> + 'g {
        self.links
            .iter()
            .filter(move |l| l.resolved.as_deref() == Some(id) && l.source_id != id)
    }

    pub fn outbound(&self, id: &str) -> impl Iterator<Item = &str> {
        self.outbound.get(id).into_iter().flatten().map(String::as_str)
    }

    pub fn inbound(&self, id: &str) -> impl Iterator<Item = &str> {
        self.inbound.get(id).into_iter().flatten().map(String::as_str)
    }

    pub fn categories(&self) -> &BTreeMap<String, Category> {
        &self.categories
    }

    /// Run every whole-vault link check. Findings come back sorted.
    pub fn check(&self, policy: &LinkPolicy) -> Vec<Finding> {
        let mut findings = Vec::new();
        self.check_targets(policy, &mut findings);
        self.check_backlinks(policy, &mut findings);
        self.check_orphans(&mut findings);
        sort_findings(&mut findings);
        findings
    }

    fn source_path<'a>(&'a self, id: &'a str) -> &'a str {
        self.nodes.get(id).map(|n| n.path.as_str()).unwrap_or(id)
    }

    fn check_targets(&self, policy: &LinkPolicy, findings: &mut Vec<Finding>) {
        for link in &self.links {
            let path = self.source_path(&link.source_id);
            match (&link.resolved, link.resolution) {
                (None, ResolutionKind::Ambiguous) => findings.push(
                    Finding::new(
                        FindingKind::Ambiguous,
                        path,
                        format!(
                            "link `{}` matches several documents: {}",
                            link.target_ref,
                            link.candidates.join(", ")
                        ),
                    )
                    .at_line(link.line)
                    .with_evidence(json!({ "target": link.target, "candidates": link.candidates })),
                ),
                (None, _) => {
                    let severity = if policy.strict_dangling {
                        Severity::Error
                    } else {
                        Severity::Warning
                    };
                    findings.push(
                        Finding::new(
                            FindingKind::Dangling,
                            path,
                            format!("link `{}` does not resolve to any document", link.target_ref),
                        )
                        .at_line(link.line)
                        .with_severity(severity)
                        .with_evidence(json!({ "target": link.target })),
                    );
                }
                (Some(target), _) => {
                    let Some(heading) = &link.heading else {
                        continue;
                    };
                    let known = self
                        .nodes
                        .get(target)
                        .is_some_and(|n| n.heading_slugs.contains(&heading_slug(heading)));
                    if !known {
                        findings.push(
                            Finding::new(
                                FindingKind::DanglingHeading,
                                path,
                                format!("`{target}` has no heading `{heading}`"),
                            )
                            .at_line(link.line)
                            .with_evidence(json!({ "target": target, "heading": heading })),
                        );
                    }
                }
            }
        }
    }

    /// Every resolved link A → B between non-index documents needs B to link
    /// back to A. The finding is attached to B, which is where the fix goes.
    fn check_backlinks(&self, policy: &LinkPolicy, findings: &mut Vec<Finding>) {
        let mut counted_back: BTreeSet<(&str, &str)> = BTreeSet::new();
        for link in &self.links {
            if link.is_self_link() {
                continue;
            }
            if let Some(target) = &link.resolved {
                if !policy.backlinks_in_related_topics_only || link.in_related_topics {
                    counted_back.insert((link.source_id.as_str(), target.as_str()));
                }
            }
        }

        let mut reported: BTreeSet<(&str, &str)> = BTreeSet::new();
        for link in &self.links {
            let Some(target) = link.resolved.as_deref() else {
                continue;
            };
            let source = link.source_id.as_str();
            if source == target || self.is_index(source) || self.is_index(target) {
                continue;
            }
            if counted_back.contains(&(target, source)) || !reported.insert((source, target)) {
                continue;
            }
            let suffix = if policy.backlinks_in_related_topics_only {
                " in Related Topics"
            } else {
                ""
            };
            findings.push(
                Finding::new(
                    FindingKind::MissingBacklink,
                    self.source_path(target),
                    format!("`{source}` links here but this document does not link back{suffix}"),
                )
                .with_evidence(json!({ "from": source, "line": link.line })),
            );
        }
    }

    fn is_index(&self, id: &str) -> bool {
        self.nodes.get(id).is_some_and(|n| n.is_index)
    }

    /// Non-index documents with no inbound link from any other document and
    /// not reachable from the nearest ancestor category index.
    fn check_orphans(&self, findings: &mut Vec<Finding>) {
        let mut reachable_from: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (id, node) in &self.nodes {
            if node.is_index {
                continue;
            }
            // Self-links never enter `inbound`.
            if self.inbound(id).next().is_some() {
                continue;
            }
            let index = nearest_index(&self.categories, &node.category);
            let reachable = index.is_some_and(|index| {
                reachable_from
                    .entry(index)
                    .or_insert_with(|| self.reachable(index))
                    .contains(id.as_str())
            });
            if reachable {
                continue;
            }
            let message = match index {
                Some(index) => format!("no document links here and `{index}` does not reach it"),
                None => "no document links here and no category index covers it".to_string(),
            };
            findings.push(
                Finding::new(FindingKind::Orphaned, &node.path, message)
                    .with_evidence(json!({ "index": index })),
            );
        }
    }

    /// Breadth-first closure over outbound links, starting at `start`.
    pub fn reachable(&self, start: &str) -> BTreeSet<&str> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let Some((start, _)) = self.nodes.get_key_value(start) else {
            return seen;
        };
        let mut queue = VecDeque::from([start.as_str()]);
        seen.insert(start.as_str());
        while let Some(current) = queue.pop_front() {
            for next in self.outbound(current) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }
}

/// `![[diagram.png]]` and similar embeds point at attachments, not documents.
fn is_asset_embed(link: &WikiLink) -> bool {
    if !link.embed {
        return false;
    }
    let file = link.target.rsplit('/').next().unwrap_or(&link.target);
    match file.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && !ext.eq_ignore_ascii_case("md"),
        None => false,
    }
}
