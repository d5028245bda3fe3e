use thiserror::Error;

use crate::finding::{Finding, FindingKind};

/// Why a raw document could not be turned into a `Document`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no frontmatter block found")]
    MissingFrontmatter,
    #[error("malformed frontmatter: {0}")]
    MalformedFrontmatter(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl ParseError {
    pub fn kind(&self) -> FindingKind {
        match self {
            ParseError::MissingFrontmatter => FindingKind::MissingFrontmatter,
            ParseError::MalformedFrontmatter(_) => FindingKind::MalformedFrontmatter,
            ParseError::Template(err) => err.kind(),
        }
    }

    pub fn to_finding(&self, path: &str) -> Finding {
        Finding::new(self.kind(), path, self.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown document kind `{0}`")]
    UnknownKind(String),
}

impl TemplateError {
    pub fn kind(&self) -> FindingKind {
        match self {
            TemplateError::UnknownKind(_) => FindingKind::UnknownKind,
        }
    }
}

/// Failures of the file store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The vault itself cannot be listed; aborts the whole run.
    #[error("vault unavailable at {root}: {message}")]
    Unavailable { root: String, message: String },
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("read {path}: {message}")]
    Read { path: String, message: String },
    #[error("write {path}: {message}")]
    Write { path: String, message: String },
    #[error("remove {path}: {message}")]
    Remove { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error(transparent)]
    Template(#[from] TemplateError),
}
