use anyhow::{bail, Context, Result};
use clap::Parser;
use grove_cli::{plan_removal, ValidationReport, EXIT_OK};
use grove_index::apply_listing;
use grove_links::is_within;
use grove_snapshot::FileStore;
use serde_json::json;
use std::path::PathBuf;

use super::{print_json, today, Vault};
use crate::Cli;

#[derive(Parser, Debug)]
pub(crate) struct RemoveArgs {
    /// Document path (vault-relative or on disk) or id
    pub doc: PathBuf,
}

pub(crate) fn run_remove(cli: &Cli, args: &RemoveArgs) -> Result<i32> {
    let vault = Vault::open(cli, None)?;
    let (_, analysis) = vault.analyze()?;
    if analysis.timed_out() {
        bail!("run timed out before links could be traced; nothing removed");
    }
    let key = vault.relative(&args.doc);
    let Some(doc) = analysis.document(&key) else {
        bail!("no parsed document matches `{key}`");
    };

    let date = today();
    let plan = plan_removal(&analysis, doc, date);
    plan.execute(&vault.store).with_context(|| format!("remove {}", plan.path))?;

    // Listings of the removed document's category and its ancestors.
    let (snapshot, after) = vault.analyze()?;
    let mut reindexed = Vec::new();
    for report in after.indexes.iter().filter(|r| r.drift.is_some()) {
        if !is_within(&plan.category, &report.category) {
            continue;
        }
        let Some(raw) = snapshot.get(&report.index_path) else {
            continue;
        };
        let text = apply_listing(&report.index_path, &raw.text, &report.expected, date)?;
        vault.store.write(&report.index_path, &text)?;
        reindexed.push(report.index_path.clone());
    }

    let (_, final_analysis) = vault.analyze()?;
    let report = ValidationReport::from_analysis(&final_analysis, None);
    let unlinked: usize = plan.rewrites.iter().map(|r| r.unlinked).sum();
    if cli.json {
        print_json(&json!({
            "removed": plan.path,
            "unlinked": unlinked,
            "rewritten": plan.rewrites.iter().map(|r| &r.path).collect::<Vec<_>>(),
            "reindexed": reindexed,
            "report": report,
        }))?;
    } else {
        println!("removed={}", plan.path);
        println!("unlinked={unlinked} in {} document(s)", plan.rewrites.len());
        for index in &reindexed {
            println!("reindexed={index}");
        }
        print!("{}", report.render_text());
    }
    Ok(EXIT_OK)
}
