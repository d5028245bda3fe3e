use grove_core::{ConfigError, GroveConfig, SchemaPolicy, TemplateError, TemplateOverride};
use grove_document::{DocumentKind, SectionTag};
use serde::Serialize;

/// A table a kind must carry somewhere in its body, recognised by header keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindTable {
    pub name: &'static str,
    /// A table qualifies when any header cell contains any of these (case-insensitive).
    pub header_keywords: &'static [&'static str],
}

pub const COMPLEXITY_TABLE: KindTable = KindTable {
    name: "complexity table",
    header_keywords: &["time", "space", "complexity"],
};

pub const FLAGS_TABLE: KindTable = KindTable {
    name: "flags table",
    header_keywords: &["flag", "option", "switch"],
};

/// What a document of one kind must contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateContract {
    pub kind: DocumentKind,
    pub required_sections: Vec<SectionTag>,
    /// Required sections must appear in the listed relative order.
    pub ordered: bool,
    /// Section that must open the body, independent of `ordered`.
    pub first_section: Option<SectionTag>,
    pub min_examples: usize,
    pub requires_difficulty: bool,
    pub requires_sources: bool,
    /// Growing/evergreen documents need a tip-style and a warning-style callout.
    pub requires_callouts: bool,
    pub kind_table: Option<KindTable>,
}

impl TemplateContract {
    /// Built-in contract for `kind`, with example minimums taken from `policy`.
    pub fn builtin(kind: DocumentKind, policy: &SchemaPolicy) -> TemplateContract {
        use SectionTag::*;
        let content = |sections: Vec<SectionTag>, ordered: bool, table: Option<KindTable>| {
            TemplateContract {
                kind,
                required_sections: sections,
                ordered,
                first_section: Some(Summary),
                min_examples: policy.min_examples,
                requires_difficulty: true,
                requires_sources: true,
                requires_callouts: true,
                kind_table: table,
            }
        };
        match kind {
            DocumentKind::Index => TemplateContract {
                kind,
                required_sections: Vec::new(),
                ordered: false,
                first_section: None,
                min_examples: 0,
                requires_difficulty: false,
                requires_sources: false,
                requires_callouts: false,
                kind_table: None,
            },
            DocumentKind::Standard => content(
                vec![Summary, Examples, RelatedTopics, References],
                false,
                None,
            ),
            DocumentKind::AlgorithmOrDataStructure => content(
                vec![
                    Summary,
                    Theory,
                    Complexity,
                    Examples,
                    EdgeCases,
                    RelatedTopics,
                    References,
                ],
                true,
                Some(COMPLEXITY_TABLE),
            ),
            DocumentKind::PromptingTechnique => content(
                vec![Summary, Theory, Examples, Patterns, RelatedTopics, References],
                true,
                None,
            ),
            DocumentKind::ShellTool => content(
                vec![
                    Summary,
                    QuickReference,
                    Examples,
                    Patterns,
                    RelatedTopics,
                    References,
                ],
                true,
                Some(FLAGS_TABLE),
            ),
            DocumentKind::FrameworkFeature => content(
                vec![
                    Summary,
                    QuickReference,
                    Examples,
                    EdgeCases,
                    RelatedTopics,
                    References,
                ],
                true,
                None,
            ),
        }
    }

    fn apply_override(&mut self, name: &str, over: &TemplateOverride) -> Result<(), ConfigError> {
        if let Some(sections) = &over.required_sections {
            let mut tags = Vec::with_capacity(sections.len());
            for section in sections {
                let tag = SectionTag::from_name(section).ok_or_else(|| ConfigError::Parse {
                    path: format!("templates.{name}"),
                    message: format!("unknown section `{section}`"),
                })?;
                tags.push(tag);
            }
            if self.first_section.as_ref().is_some_and(|f| !tags.contains(f)) {
                self.first_section = None;
            }
            self.required_sections = tags;
        }
        if let Some(ordered) = over.ordered {
            self.ordered = ordered;
        }
        if let Some(min_examples) = over.min_examples {
            self.min_examples = min_examples;
        }
        if let Some(require_callouts) = over.require_callouts {
            self.requires_callouts = require_callouts;
        }
        Ok(())
    }
}

/// Lookup from document kind to template contract.
pub trait TemplateRepository: Send + Sync {
    fn contract_for(&self, kind: DocumentKind) -> &TemplateContract;

    /// Lookup by kind name as written in frontmatter or configuration.
    fn contract_for_name(&self, name: &str) -> Result<&TemplateContract, TemplateError> {
        let kind = name.parse::<DocumentKind>()?;
        Ok(self.contract_for(kind))
    }
}

/// Static contract table, one entry per `DocumentKind`.
#[derive(Debug, Clone)]
pub struct TemplateTable {
    contracts: Vec<TemplateContract>,
}

impl TemplateTable {
    pub fn builtin(policy: &SchemaPolicy) -> Self {
        Self {
            contracts: DocumentKind::ALL
                .iter()
                .map(|kind| TemplateContract::builtin(*kind, policy))
                .collect(),
        }
    }

    /// Built-in table with `[templates.<kind>]` overrides applied.
    pub fn from_config(config: &GroveConfig) -> Result<Self, ConfigError> {
        let mut table = Self::builtin(&config.schema);
        for (name, over) in &config.templates {
            let kind = name.parse::<DocumentKind>()?;
            table.contracts[kind_slot(kind)].apply_override(name, over)?;
        }
        Ok(table)
    }
}

impl Default for TemplateTable {
    fn default() -> Self {
        Self::builtin(&SchemaPolicy::default())
    }
}

impl TemplateRepository for TemplateTable {
    fn contract_for(&self, kind: DocumentKind) -> &TemplateContract {
        &self.contracts[kind_slot(kind)]
    }
}

fn kind_slot(kind: DocumentKind) -> usize {
    DocumentKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default()
}
