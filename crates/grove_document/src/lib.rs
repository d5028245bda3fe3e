//! In-memory model of one vault document.
//!
//! `parse_document` turns raw file text into a [`Document`]: typed
//! frontmatter, ordered level-2 sections, outbound wikilinks and external
//! references. Derived metrics (word count, example count, callouts) are
//! computed on demand.

pub mod document;
pub mod frontmatter;
pub mod links;
pub mod model;
pub mod scan;
pub mod sections;

pub use document::{document_id, parse_document, Document, DocumentMetrics};
pub use frontmatter::set_frontmatter_field;
pub use links::{find_wikilink_tokens, parse_wikilink_inner, ExternalLink, WikiLink, WikiToken};
pub use model::{Difficulty, DocumentKind, FieldValue, Status};
pub use scan::{
    heading_slug, is_table_separator, split_table_row, Callout, CalloutStyle, FencedBlock, Heading,
    TableHeader,
};
pub use sections::{Section, SectionTag};
