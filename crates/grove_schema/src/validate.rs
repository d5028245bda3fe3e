use grove_core::{sort_findings, Finding, FindingKind, SchemaPolicy};
use grove_document::{CalloutStyle, Difficulty, Document, FieldValue, SectionTag, Status};
use serde_json::{json, Value};

use crate::templates::TemplateContract;

const PLACEHOLDER_MARKERS: &[&str] = &["{{", "}}"];
const DATE_PLACEHOLDER: &str = "YYYY-MM-DD";

/// Check one document against its template contract and the global
/// frontmatter rules.
///
/// Never consults other documents, so every document in a vault can be
/// validated independently. Findings come back sorted.
pub fn validate_document(
    doc: &Document,
    contract: &TemplateContract,
    policy: &SchemaPolicy,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    check_frontmatter(doc, contract, &mut findings);
    check_sections(doc, contract, &mut findings);
    check_examples(doc, contract, policy, &mut findings);
    check_callouts(doc, contract, &mut findings);
    check_urls(doc, &mut findings);
    check_kind_table(doc, contract, &mut findings);
    check_placeholders(doc, &mut findings);

    for section in doc.unknown_sections() {
        findings.push(
            Finding::new(
                FindingKind::UnknownSection,
                &doc.path,
                format!(
                    "section `{}` is not in the section vocabulary; kept but not checked",
                    section.heading
                ),
            )
            .at_line(section.line),
        );
    }

    sort_findings(&mut findings);
    findings
}

fn check_frontmatter(doc: &Document, contract: &TemplateContract, findings: &mut Vec<Finding>) {
    let path = doc.path.as_str();

    if let FieldValue::Invalid(raw) = &doc.status {
        findings.push(invalid_enum(path, "status", raw, Status::VALUES));
    }

    match &doc.difficulty {
        Some(FieldValue::Invalid(raw)) => {
            findings.push(invalid_enum(path, "difficulty", raw, Difficulty::VALUES));
        }
        None if contract.requires_difficulty => {
            findings.push(missing_field(path, "difficulty", contract));
        }
        _ => {}
    }

    if contract.requires_sources && doc.sources.is_empty() {
        findings.push(missing_field(path, "sources", contract));
    }

    for (key, value) in [("date-created", &doc.created), ("date-updated", &doc.updated)] {
        if let FieldValue::Invalid(raw) = value {
            findings.push(
                Finding::new(
                    FindingKind::InvalidDate,
                    path,
                    format!("`{key}` value `{raw}` is not a YYYY-MM-DD date"),
                )
                .with_evidence(json!({ "field": key, "value": raw })),
            );
        }
    }
    if let (Some(created), Some(updated)) = (doc.created.known(), doc.updated.known()) {
        if updated < created {
            findings.push(
                Finding::new(
                    FindingKind::InvalidDateOrder,
                    path,
                    format!("`date-updated` {updated} is earlier than `date-created` {created}"),
                )
                .with_evidence(json!({
                    "date-created": created.to_string(),
                    "date-updated": updated.to_string(),
                })),
            );
        }
    }

    if doc.category != doc.location() {
        findings.push(
            Finding::new(
                FindingKind::CategoryMismatch,
                path,
                format!(
                    "category `{}` does not match the document's location `{}`",
                    doc.category,
                    doc.location()
                ),
            )
            .with_evidence(json!({ "category": doc.category, "location": doc.location() })),
        );
    }
}

fn invalid_enum(path: &str, field: &str, raw: &str, allowed: &[&str]) -> Finding {
    Finding::new(
        FindingKind::InvalidEnum,
        path,
        format!(
            "`{field}` value `{raw}` is not one of: {}",
            allowed.join(", ")
        ),
    )
    .with_evidence(json!({ "field": field, "value": raw, "allowed": allowed }))
}

fn missing_field(path: &str, field: &str, contract: &TemplateContract) -> Finding {
    Finding::new(
        FindingKind::MissingField,
        path,
        format!("`{field}` is required for {} documents", contract.kind),
    )
    .with_evidence(json!({ "field": field }))
}

fn check_sections(doc: &Document, contract: &TemplateContract, findings: &mut Vec<Finding>) {
    let path = doc.path.as_str();

    for tag in &contract.required_sections {
        match doc.section(tag) {
            None => findings.push(
                Finding::new(
                    FindingKind::MissingRequiredSection,
                    path,
                    format!("required section `{tag}` is missing"),
                )
                .with_evidence(json!({ "section": tag.label() })),
            ),
            Some(section) if section.is_empty() => findings.push(
                Finding::new(
                    FindingKind::EmptySection,
                    path,
                    format!("required section `{tag}` has no content"),
                )
                .at_line(section.line),
            ),
            Some(_) => {}
        }
    }

    if let Some(first) = &contract.first_section {
        if let (Some(wanted), Some(actual)) = (doc.section(first), doc.sections.first()) {
            if actual.tag != *first {
                findings.push(
                    Finding::new(
                        FindingKind::SectionOrder,
                        path,
                        format!("`{first}` must be the first section, found `{}`", actual.heading),
                    )
                    .at_line(wanted.line),
                );
            }
        }
    }

    if contract.ordered {
        check_section_order(doc, &contract.required_sections, findings);
    }
}

/// Required sections present in the document must follow the contract's
/// relative order; each section that appears after a later one is reported.
fn check_section_order(doc: &Document, required: &[SectionTag], findings: &mut Vec<Finding>) {
    let mut seen: Vec<&SectionTag> = Vec::new();
    let mut latest: Option<(usize, &SectionTag)> = None;
    for section in &doc.sections {
        if seen.contains(&&section.tag) {
            continue;
        }
        let Some(rank) = required.iter().position(|t| *t == section.tag) else {
            continue;
        };
        seen.push(&section.tag);
        match latest {
            Some((latest_rank, latest_tag)) if rank < latest_rank => {
                findings.push(
                    Finding::new(
                        FindingKind::SectionOrder,
                        &doc.path,
                        format!("section `{}` should come before `{latest_tag}`", section.tag),
                    )
                    .at_line(section.line)
                    .with_evidence(json!({
                        "expected_order": required.iter().map(SectionTag::label).collect::<Vec<_>>(),
                    })),
                );
            }
            _ => latest = Some((rank, &section.tag)),
        }
    }
}

fn check_examples(
    doc: &Document,
    contract: &TemplateContract,
    policy: &SchemaPolicy,
    findings: &mut Vec<Finding>,
) {
    if doc.is_index() {
        return;
    }
    let found = doc.example_count(&policy.extra_example_languages);
    if found < contract.min_examples {
        let line = doc.section(&SectionTag::Examples).map(|s| s.line);
        let mut finding = Finding::new(
            FindingKind::TooFewExamples,
            &doc.path,
            format!(
                "found {found} code example(s), {} documents need at least {}",
                contract.kind, contract.min_examples
            ),
        )
        .with_evidence(json!({ "found": found, "required": contract.min_examples }));
        if let Some(line) = line {
            finding = finding.at_line(line);
        }
        findings.push(finding);
    }
}

fn check_callouts(doc: &Document, contract: &TemplateContract, findings: &mut Vec<Finding>) {
    if !contract.requires_callouts || doc.is_index() {
        return;
    }
    // Seed documents are allowed to be incomplete.
    let Some(status) = doc.status.known().filter(|s| *s >= Status::Growing) else {
        return;
    };
    for (style, name) in [(CalloutStyle::Tip, "tip"), (CalloutStyle::Warning, "warning")] {
        if !doc.has_callout(style) {
            findings.push(
                Finding::new(
                    FindingKind::MissingCallout,
                    &doc.path,
                    format!("{status} documents need at least one {name}-style callout"),
                )
                .with_evidence(json!({ "style": name })),
            );
        }
    }
}

fn check_urls(doc: &Document, findings: &mut Vec<Finding>) {
    for source in &doc.sources {
        if !is_valid_url(source) {
            findings.push(
                Finding::new(
                    FindingKind::InvalidUrl,
                    &doc.path,
                    format!("source `{source}` is not a valid http(s) URL"),
                )
                .with_evidence(json!({ "field": "sources", "value": source })),
            );
        }
    }

    let references: Vec<usize> = doc
        .sections
        .iter()
        .enumerate()
        .filter(|(_, s)| s.tag == SectionTag::References)
        .map(|(idx, _)| idx)
        .collect();
    for link in &doc.external_links {
        let in_references = link.section.is_some_and(|idx| references.contains(&idx));
        if in_references && !is_valid_url(&link.url) {
            findings.push(
                Finding::new(
                    FindingKind::InvalidUrl,
                    &doc.path,
                    format!("reference `{}` is not a valid http(s) URL", link.url),
                )
                .at_line(link.line)
                .with_evidence(json!({ "field": "references", "value": link.url })),
            );
        }
    }
}

/// Absolute http(s) URL with a host.
pub fn is_valid_url(raw: &str) -> bool {
    match url::Url::parse(raw.trim()) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

fn check_kind_table(doc: &Document, contract: &TemplateContract, findings: &mut Vec<Finding>) {
    let Some(table) = &contract.kind_table else {
        return;
    };
    let found = doc.tables.iter().any(|(_, header)| {
        header.cells.iter().any(|cell| {
            let cell = cell.to_lowercase();
            table.header_keywords.iter().any(|k| cell.contains(k))
        })
    });
    if !found {
        findings.push(
            Finding::new(
                FindingKind::MissingKindTable,
                &doc.path,
                format!("{} documents need a {}", contract.kind, table.name),
            )
            .with_evidence(json!({ "table": table.name, "header_keywords": table.header_keywords })),
        );
    }
}

fn check_placeholders(doc: &Document, findings: &mut Vec<Finding>) {
    for (key, value) in &doc.frontmatter {
        if contains_placeholder(value) {
            findings.push(
                Finding::new(
                    FindingKind::TemplatePlaceholder,
                    &doc.path,
                    format!("frontmatter `{key}` still holds template scaffolding"),
                )
                .with_evidence(json!({ "field": key })),
            );
        }
    }
    // One finding per body is enough to point the author at the leftovers.
    if let Some((line, text)) = doc
        .prose_lines()
        .into_iter()
        .find(|(_, text)| PLACEHOLDER_MARKERS.iter().any(|m| text.contains(m)))
    {
        findings.push(
            Finding::new(
                FindingKind::TemplatePlaceholder,
                &doc.path,
                "body still contains template scaffolding",
            )
            .at_line(line)
            .with_evidence(json!({ "text": text.trim() })),
        );
    }
}

/// Frontmatter values also count the literal `YYYY-MM-DD` date stub.
fn contains_placeholder(value: &Value) -> bool {
    match value {
        Value::String(s) => {
            PLACEHOLDER_MARKERS.iter().any(|m| s.contains(m)) || s.contains(DATE_PLACEHOLDER)
        }
        Value::Array(items) => items.iter().any(contains_placeholder),
        Value::Object(map) => map.values().any(contains_placeholder),
        _ => false,
    }
}
