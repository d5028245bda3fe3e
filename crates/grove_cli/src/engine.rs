//! The validation pipeline.
//!
//! Per-document work (parse, schema, maturity) runs in parallel over the
//! snapshot. The cross-reference graph and the index synchronizer only run
//! once every document has been parsed, over that complete set.

use grove_core::{sort_findings, ConfigError, Finding, FindingKind, GroveConfig};
use grove_document::{parse_document, Document};
use grove_index::{check_indexes, normalize_category, IndexReport};
use grove_links::CrossReferenceGraph;
use grove_schema::{validate_document, validate_status, TemplateRepository, TemplateTable};
use grove_snapshot::{normalize_rel_path, RawSnapshot, ReadFailure};
use rayon::prelude::*;
use serde_json::json;
use std::time::{Duration, Instant};

/// Result of the per-document phase for one file.
#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub path: String,
    /// `None` when the file failed to parse.
    pub document: Option<Document>,
    pub findings: Vec<Finding>,
}

enum Outcome {
    Checked(DocumentResult),
    Skipped(String),
}

/// Everything one run learned about a snapshot.
#[derive(Debug)]
pub struct Analysis {
    pub snapshot_sha256: String,
    pub file_count: usize,
    /// Successfully parsed documents, sorted by path.
    pub documents: Vec<Document>,
    pub findings: Vec<Finding>,
    /// Files the per-document phase never reached before the deadline.
    pub skipped: Vec<String>,
    pub unreadable: Vec<ReadFailure>,
    /// `None` when the run timed out before the graph phase.
    pub graph: Option<CrossReferenceGraph>,
    pub indexes: Vec<IndexReport>,
}

impl Analysis {
    pub fn timed_out(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Look a document up by vault-relative path (extension optional) or id.
    pub fn document(&self, key: &str) -> Option<&Document> {
        let key = normalize_rel_path(key);
        self.documents
            .iter()
            .find(|d| d.path == key)
            .or_else(|| {
                let with_ext = format!("{key}.md");
                self.documents.iter().find(|d| d.path == with_ext)
            })
            .or_else(|| self.documents.iter().find(|d| d.id == key))
    }

    pub fn index_report(&self, category: &str) -> Option<&IndexReport> {
        let category = normalize_category(category);
        self.indexes.iter().find(|r| r.category == category)
    }

    pub fn findings_for<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a Finding> + 'a {
        self.findings.iter().filter(move |f| f.path == path)
    }
}

pub struct Engine {
    config: GroveConfig,
    templates: TemplateTable,
    timeout: Option<Duration>,
}

impl Engine {
    pub fn new(config: GroveConfig) -> Result<Self, ConfigError> {
        let templates = TemplateTable::from_config(&config)?;
        Ok(Self {
            config,
            templates,
            timeout: None,
        })
    }

    /// Escalate dangling links to errors on top of whatever the config says.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.config.links.strict_dangling |= strict;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn config(&self) -> &GroveConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateTable {
        &self.templates
    }

    /// Parse one file and run every check that needs only that file.
    pub fn check_document(&self, path: &str, text: &str) -> DocumentResult {
        let doc = match parse_document(path, text) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::debug!(path, error = %err, "document failed to parse");
                return DocumentResult {
                    path: path.to_string(),
                    document: None,
                    findings: vec![err.to_finding(path)],
                };
            }
        };

        let contract = self.templates.contract_for(doc.kind);
        let extra = &self.config.schema.extra_example_languages;
        let mut findings = validate_document(&doc, contract, &self.config.schema);
        findings.extend(validate_status(&doc, contract, &self.config.maturity, extra));
        tracing::debug!(
            path,
            kind = doc.kind.as_str(),
            findings = findings.len(),
            "checked document"
        );
        DocumentResult {
            path: path.to_string(),
            document: Some(doc),
            findings,
        }
    }

    pub fn analyze(&self, snapshot: &RawSnapshot) -> Analysis {
        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);
        tracing::info!(documents = snapshot.len(), "per-document phase");

        let outcomes: Vec<Outcome> = snapshot
            .files()
            .par_iter()
            .map(|file| {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    Outcome::Skipped(file.path.clone())
                } else {
                    Outcome::Checked(self.check_document(&file.path, &file.text))
                }
            })
            .collect();

        let mut documents = Vec::new();
        let mut findings = Vec::new();
        let mut skipped = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Checked(result) => {
                    findings.extend(result.findings);
                    documents.extend(result.document);
                }
                Outcome::Skipped(path) => skipped.push(path),
            }
        }

        let mut graph = None;
        let mut indexes = Vec::new();
        if skipped.is_empty() {
            tracing::info!(documents = documents.len(), "graph phase");
            let built = CrossReferenceGraph::build(&documents);
            findings.extend(built.check(&self.config.links));

            tracing::info!(categories = built.categories().len(), "index phase");
            let (reports, index_findings) = check_indexes(&documents, built.categories());
            findings.extend(index_findings);
            indexes = reports;
            graph = Some(built);
        } else {
            tracing::warn!(
                skipped = skipped.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "timed out; graph and index phases skipped"
            );
            findings.push(
                Finding::new(
                    FindingKind::TimedOut,
                    "",
                    format!(
                        "run timed out: {} of {} documents not checked; link and index checks skipped",
                        skipped.len(),
                        snapshot.len()
                    ),
                )
                .with_evidence(json!({ "skipped": skipped })),
            );
        }

        sort_findings(&mut findings);
        Analysis {
            snapshot_sha256: snapshot.sha256().to_string(),
            file_count: snapshot.len(),
            documents,
            findings,
            skipped,
            unreadable: snapshot.failures().to_vec(),
            graph,
            indexes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(files: &[(&str, &str)]) -> RawSnapshot {
        RawSnapshot::from_texts(files.iter().map(|(p, t)| (*p, t.to_string())))
    }

    const NOTE: &str = "---\ncategory: Concepts\ndifficulty: beginner\nstatus: seed\ndate-created: 2024-01-01\ndate-updated: 2024-01-01\nsources: [\"https://example.com\"]\n---\n## Summary\nShort.\n";

    #[test]
    fn parse_failures_stay_with_their_document() {
        let snap = snapshot(&[
            ("Concepts/broken.md", "# no frontmatter\n"),
            ("Concepts/ok.md", NOTE),
        ]);
        let analysis = Engine::new(GroveConfig::default()).unwrap().analyze(&snap);
        assert_eq!(analysis.documents.len(), 1);
        assert!(analysis
            .findings_for("Concepts/broken.md")
            .any(|f| f.rule_id() == "parse/missing-frontmatter"));
        assert!(analysis.graph.is_some());
        assert!(!analysis.timed_out());
    }

    #[test]
    fn zero_timeout_skips_everything_and_reports_it() {
        let snap = snapshot(&[("Concepts/ok.md", NOTE)]);
        let analysis = Engine::new(GroveConfig::default())
            .unwrap()
            .with_timeout(Some(Duration::ZERO))
            .analyze(&snap);
        assert_eq!(analysis.skipped, vec!["Concepts/ok.md"]);
        assert!(analysis.graph.is_none());
        assert_eq!(analysis.findings.len(), 1);
        assert_eq!(analysis.findings[0].rule_id(), "run/timed-out");
    }

    #[test]
    fn documents_are_found_by_path_stem_or_id() {
        let snap = snapshot(&[("Concepts/ok.md", NOTE)]);
        let analysis = Engine::new(GroveConfig::default()).unwrap().analyze(&snap);
        assert!(analysis.document("Concepts/ok.md").is_some());
        assert!(analysis.document("./Concepts/ok").is_some());
        assert!(analysis.document("Concepts/missing").is_none());
    }
}
