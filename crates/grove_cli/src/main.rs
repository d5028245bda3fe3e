use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::index::{ApplyReindexArgs, ReindexArgs};
use commands::remove::RemoveArgs;
use commands::status::{SetStatusArgs, StatusArgs};
use commands::validate::ValidateArgs;

#[derive(Parser)]
#[command(
    name = "grove",
    version,
    about = "Schema validation and cross-reference checks for Markdown knowledge vaults"
)]
pub(crate) struct Cli {
    /// Vault root (default: nearest ancestor with a .grove/ directory, else the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub vault: Option<PathBuf>,

    /// Output JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Treat dangling links as errors
    #[arg(long, global = true)]
    pub strict: bool,

    /// Stop checking documents after this many seconds and report what was found
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Log engine progress to stderr (GROVE_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check documents against their templates and the link graph
    Validate(ValidateArgs),
    /// Show how a category index listing differs from its members
    Reindex(ReindexArgs),
    /// Rewrite a category index listing
    ApplyReindex(ApplyReindexArgs),
    /// Show stored and suggested status for a document
    Status(StatusArgs),
    /// Override a document's status
    SetStatus(SetStatusArgs),
    /// Delete a document and unlink every reference to it
    Remove(RemoveArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("GROVE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    // Usage errors exit 1 like any other failure; 2 is reserved for warnings.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                grove_cli::EXIT_ERROR
            } else {
                grove_cli::EXIT_OK
            };
            process::exit(code);
        }
    };
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Validate(args) => commands::validate::run_validate(&cli, args),
        Commands::Reindex(args) => commands::index::run_reindex(&cli, args),
        Commands::ApplyReindex(args) => commands::index::run_apply_reindex(&cli, args),
        Commands::Status(args) => commands::status::run_status(&cli, args),
        Commands::SetStatus(args) => commands::status::run_set_status(&cli, args),
        Commands::Remove(args) => commands::remove::run_remove(&cli, args),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(grove_cli::EXIT_ERROR);
        }
    }
}
