use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use grove_cli::ValidationReport;

use super::Vault;
use crate::Cli;

#[derive(Parser, Debug)]
pub(crate) struct ValidateArgs {
    /// Document or vault directory to check (default: the whole vault)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,
}

pub(crate) fn run_validate(cli: &Cli, args: &ValidateArgs) -> Result<i32> {
    let vault = Vault::open(cli, args.path.as_deref())?;
    let (snapshot, analysis) = vault.analyze()?;

    // A single file is checked in the context of its whole vault; only its
    // own findings are reported.
    let only = match &args.path {
        Some(path) if path.is_file() => {
            let rel = vault.relative(path);
            let listed = snapshot.get(&rel).is_some()
                || analysis.unreadable.iter().any(|u| u.path == rel);
            if !listed {
                bail!("{rel} is not a vault document (ignored path or unsupported extension)");
            }
            Some(rel)
        }
        _ => None,
    };

    let report = ValidationReport::from_analysis(&analysis, only.as_deref());
    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(report.exit_code())
}
