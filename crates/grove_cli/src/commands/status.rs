use anyhow::{anyhow, bail, Result};
use clap::Parser;
use grove_cli::{ValidationReport, EXIT_OK};
use grove_document::{set_frontmatter_field, Document, FieldValue, Status};
use grove_schema::{proposed_status, suggested_status, StatusOverride, StatusSignals, TemplateRepository};
use grove_snapshot::FileStore;
use serde_json::json;
use std::path::PathBuf;

use super::{print_json, today, Vault};
use crate::Cli;

#[derive(Parser, Debug)]
pub(crate) struct StatusArgs {
    /// Document path (vault-relative or on disk) or id
    pub doc: PathBuf,
}

#[derive(Parser, Debug)]
pub(crate) struct SetStatusArgs {
    /// Document path (vault-relative or on disk) or id
    pub doc: PathBuf,
    /// New status: seed, growing or evergreen
    #[arg(value_parser = parse_status)]
    pub status: Status,
    /// Why the status is being set by hand; recorded in the log
    #[arg(long)]
    pub reason: Option<String>,
}

fn parse_status(raw: &str) -> Result<Status, String> {
    raw.parse()
        .map_err(|_| format!("expected one of {}", Status::VALUES.join(", ")))
}

fn stored_label(doc: &Document) -> String {
    match &doc.status {
        FieldValue::Known(status) => status.as_str().to_string(),
        FieldValue::Invalid(raw) => format!("invalid({raw})"),
    }
}

pub(crate) fn run_status(cli: &Cli, args: &StatusArgs) -> Result<i32> {
    let vault = Vault::open(cli, None)?;
    let (_, analysis) = vault.analyze()?;
    let key = vault.relative(&args.doc);
    let doc = analysis
        .document(&key)
        .ok_or_else(|| anyhow!("no parsed document matches `{key}`"))?;

    let config = vault.engine.config();
    let contract = vault.engine.templates().contract_for(doc.kind);
    let signals = StatusSignals::measure(doc, contract, &config.schema.extra_example_languages);
    let suggested = suggested_status(&signals, &config.maturity);
    let proposed = doc.status.known().map(|stored| proposed_status(stored, suggested));
    let tracked = !doc.is_index();

    if cli.json {
        print_json(&json!({
            "doc": doc.path,
            "kind": doc.kind.as_str(),
            "tracked": tracked,
            "stored": stored_label(doc),
            "suggested": suggested.as_str(),
            "proposed": proposed.map(Status::as_str),
            "signals": signals,
        }))?;
    } else {
        println!("doc={}", doc.path);
        println!("kind={}", doc.kind.as_str());
        println!("tracked={tracked}");
        println!("stored={}", stored_label(doc));
        println!("suggested={}", suggested.as_str());
        if let Some(proposed) = proposed {
            println!("proposed={}", proposed.as_str());
        }
        println!("word_count={}", signals.word_count);
        println!("example_count={}", signals.example_count);
        println!("sections_complete={}", signals.sections_complete);
    }
    Ok(EXIT_OK)
}

pub(crate) fn run_set_status(cli: &Cli, args: &SetStatusArgs) -> Result<i32> {
    let vault = Vault::open(cli, None)?;
    let (_, analysis) = vault.analyze()?;
    let key = vault.relative(&args.doc);
    let Some(doc) = analysis.document(&key) else {
        bail!("no parsed document matches `{key}`");
    };

    let date = today().format("%Y-%m-%d").to_string();
    let text = set_frontmatter_field(&doc.raw, "status", args.status.as_str())
        .and_then(|text| set_frontmatter_field(&text, "date-updated", &date))
        .ok_or_else(|| anyhow!("{}: no frontmatter block to update", doc.path))?;

    let change = StatusOverride::new(&doc.id, doc.status.known(), args.status, args.reason.clone());
    vault.store.write(&doc.path, &text)?;
    change.log();

    let (_, after) = vault.analyze()?;
    let report = ValidationReport::from_analysis(&after, Some(doc.path.as_str()));
    if cli.json {
        print_json(&json!({ "override": change, "report": report }))?;
    } else {
        println!("doc={}", doc.path);
        println!(
            "status={} -> {}",
            change.from.map(Status::as_str).unwrap_or("invalid"),
            change.to.as_str()
        );
        println!("downgrade={}", change.is_downgrade());
        print!("{}", report.render_text());
    }
    Ok(EXIT_OK)
}
