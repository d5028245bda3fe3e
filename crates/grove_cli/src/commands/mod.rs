//! Command implementations for the `grove` binary.

pub mod index;
pub mod remove;
pub mod status;
pub mod validate;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use grove_cli::{Analysis, Engine};
use grove_core::config::discover_vault_root;
use grove_core::GroveConfig;
use grove_document::frontmatter::{parse_yaml_to_json_map, split_frontmatter};
use grove_snapshot::{normalize_rel_path, FsStore, RawSnapshot};
use serde::Serialize;

use crate::Cli;

/// A vault opened for one command: root, policy and store.
pub(crate) struct Vault {
    pub root: PathBuf,
    pub store: FsStore,
    pub engine: Engine,
}

impl Vault {
    /// `hint` is a path named on the command line; the vault root is found
    /// from it when `--vault` is not given.
    pub fn open(cli: &Cli, hint: Option<&Path>) -> Result<Self> {
        let root = resolve_root(cli, hint)?;
        let config = GroveConfig::load(&root)
            .with_context(|| format!("load configuration for {}", root.display()))?;
        let store = FsStore::new(&root, &config.vault);
        let engine = Engine::new(config)
            .context("apply template overrides")?
            .with_strict(cli.strict)
            .with_timeout(cli.timeout_secs.map(Duration::from_secs));
        tracing::info!(root = %root.display(), "opened vault");
        Ok(Self {
            root,
            store,
            engine,
        })
    }

    pub fn snapshot(&self) -> Result<RawSnapshot> {
        RawSnapshot::load(&self.store).context("read vault")
    }

    pub fn analyze(&self) -> Result<(RawSnapshot, Analysis)> {
        let snapshot = self.snapshot()?;
        let analysis = self.engine.analyze(&snapshot);
        Ok((snapshot, analysis))
    }

    /// Vault-relative form of a path given on the command line. Paths that
    /// exist on disk are resolved against the root; anything else is taken
    /// as already vault-relative.
    pub fn relative(&self, arg: &Path) -> String {
        if let (Ok(abs), Ok(root)) = (arg.canonicalize(), self.root.canonicalize()) {
            if let Ok(rel) = abs.strip_prefix(&root) {
                return normalize_rel_path(&rel.to_string_lossy());
            }
        }
        normalize_rel_path(&arg.to_string_lossy())
    }
}

fn resolve_root(cli: &Cli, hint: Option<&Path>) -> Result<PathBuf> {
    if let Some(vault) = &cli.vault {
        return Ok(vault.clone());
    }
    let cwd = std::env::current_dir().context("read current directory")?;
    let start = match hint {
        Some(path) => path.to_path_buf(),
        None => cwd.clone(),
    };
    let start = start.canonicalize().unwrap_or(start);
    if let Some(found) = discover_vault_root(&start) {
        return Ok(found);
    }
    if start.is_dir() {
        return Ok(start);
    }

    let parent = start
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    if let Some(root) = root_from_category(&start, &parent) {
        return Ok(root);
    }
    let cwd = cwd.canonicalize().unwrap_or(cwd);
    if start.starts_with(&cwd) {
        return Ok(cwd);
    }
    Ok(parent)
}

/// The ancestor of `dir` that makes the document's location agree with its
/// `category` frontmatter, e.g. `vault/` for `vault/Concepts/Graphs/bfs.md`
/// declaring `Concepts/Graphs`.
fn root_from_category(file: &Path, dir: &Path) -> Option<PathBuf> {
    let text = std::fs::read_to_string(file).ok()?;
    let raw = split_frontmatter(&text)?;
    let fields = parse_yaml_to_json_map(&raw.yaml).ok()?;
    let category = fields.get("category")?.as_str()?.trim().trim_matches('/');

    let mut root = dir;
    for part in category.split('/').filter(|p| !p.is_empty()).rev() {
        if root.file_name()?.to_str()? != part {
            return None;
        }
        root = root.parent()?;
    }
    tracing::debug!(root = %root.display(), category, "vault root taken from document category");
    Some(root.to_path_buf())
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("encode json")?;
    println!("{json}");
    Ok(())
}
