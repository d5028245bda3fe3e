use chrono::NaiveDate;
use grove_core::StoreError;
use grove_document::set_frontmatter_field;
use thiserror::Error;

use crate::listing::{locate_block, render_listing, BlockSpan, ListingTable};

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("{0}: no frontmatter block to update")]
    MissingFrontmatter(String),
    #[error("{path}: listing start marker on line {line} has no end marker")]
    UnterminatedBlock { path: String, line: usize },
    #[error("{0}: listing still drifts after writing")]
    StillDrifting(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Replace (or append) the managed listing block in an index document and
/// bump its `date-updated`. Everything outside the block is kept as is.
pub fn apply_listing(
    path: &str,
    raw: &str,
    table: &ListingTable,
    today: NaiveDate,
) -> Result<String, ApplyError> {
    let newline = if raw.contains("\r\n") { "\r\n" } else { "\n" };
    let rendered = render_listing(table).replace('\n', newline);

    let mut out = String::with_capacity(raw.len() + rendered.len());
    match locate_block(raw) {
        BlockSpan::Found { start, end } => {
            for (idx, line) in raw.split_inclusive('\n').enumerate() {
                if idx < start || idx > end {
                    out.push_str(line);
                } else if idx == start {
                    out.push_str(&rendered);
                } else if idx == end && line.ends_with('\n') {
                    // A block ending at EOF without a newline keeps that shape.
                    out.push_str(newline);
                }
            }
        }
        BlockSpan::Absent => {
            out.push_str(raw);
            if !raw.is_empty() && !raw.ends_with('\n') {
                out.push_str(newline);
            }
            if !raw.trim_end().is_empty() && !raw.ends_with(&format!("{newline}{newline}")) {
                out.push_str(newline);
            }
            out.push_str(&rendered);
            out.push_str(newline);
        }
        BlockSpan::Unterminated { start } => {
            return Err(ApplyError::UnterminatedBlock {
                path: path.to_string(),
                line: start + 1,
            });
        }
    }

    let date = today.format("%Y-%m-%d").to_string();
    set_frontmatter_field(&out, "date-updated", &date)
        .ok_or_else(|| ApplyError::MissingFrontmatter(path.to_string()))
}
