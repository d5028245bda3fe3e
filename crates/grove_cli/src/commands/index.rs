use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use grove_cli::{Analysis, EXIT_DRIFT, EXIT_OK};
use grove_index::{apply_listing, normalize_category, render_listing, ApplyError, IndexReport};
use grove_snapshot::FileStore;
use serde_json::json;

use super::{print_json, today, Vault};
use crate::Cli;

#[derive(Parser, Debug)]
pub(crate) struct ReindexArgs {
    /// Category path, e.g. Concepts/Algorithms
    pub category: String,
}

#[derive(Parser, Debug)]
pub(crate) struct ApplyReindexArgs {
    /// Category path, e.g. Concepts/Algorithms
    pub category: String,
}

fn index_report<'a>(analysis: &'a Analysis, category: &str) -> Result<&'a IndexReport> {
    let Some(graph) = &analysis.graph else {
        bail!("run timed out before the index phase");
    };
    analysis.index_report(category).ok_or_else(|| {
        if graph.categories().contains_key(category) {
            anyhow!("category `{category}` has no index document")
        } else {
            anyhow!("unknown category `{category}`")
        }
    })
}

pub(crate) fn run_reindex(cli: &Cli, args: &ReindexArgs) -> Result<i32> {
    let vault = Vault::open(cli, None)?;
    let (_, analysis) = vault.analyze()?;
    let category = normalize_category(&args.category);
    let report = index_report(&analysis, &category)?;

    if cli.json {
        print_json(report)?;
    } else {
        println!("category={}", report.category);
        println!("index={}", report.index_path);
        match &report.drift {
            Some(drift) => {
                println!("drift={}", drift.summary());
                println!();
                println!("{}", render_listing(&report.expected));
            }
            None => println!("drift=none"),
        }
    }
    Ok(if report.drift.is_some() { EXIT_DRIFT } else { EXIT_OK })
}

pub(crate) fn run_apply_reindex(cli: &Cli, args: &ApplyReindexArgs) -> Result<i32> {
    let vault = Vault::open(cli, None)?;
    let (snapshot, analysis) = vault.analyze()?;
    let category = normalize_category(&args.category);
    let report = index_report(&analysis, &category)?;

    let written = match &report.drift {
        None => false,
        Some(drift) => {
            let raw = snapshot
                .get(&report.index_path)
                .with_context(|| format!("{} missing from snapshot", report.index_path))?;
            let text = apply_listing(&report.index_path, &raw.text, &report.expected, today())?;
            vault
                .store
                .write(&report.index_path, &text)
                .map_err(ApplyError::from)?;
            tracing::info!(
                index = %report.index_path,
                drift = %drift.summary(),
                "rewrote index listing"
            );
            true
        }
    };

    // Re-validate from disk so the result reflects what was actually written.
    let (_, after) = vault.analyze()?;
    let after_report = index_report(&after, &category)?;
    if after_report.drift.is_some() {
        return Err(ApplyError::StillDrifting(after_report.index_path.clone()).into());
    }
    let index_findings: Vec<_> = after.findings_for(&after_report.index_path).collect();

    if cli.json {
        print_json(&json!({
            "category": after_report.category,
            "index": after_report.index_path,
            "written": written,
            "rows": after_report.expected.len(),
            "findings": index_findings,
        }))?;
    } else {
        println!("category={}", after_report.category);
        println!("index={}", after_report.index_path);
        println!("written={written}");
        println!("rows={}", after_report.expected.len());
        println!("drift=none");
        for finding in index_findings {
            println!("{}: {}", finding.rule_id(), finding.message);
        }
    }
    Ok(EXIT_OK)
}
