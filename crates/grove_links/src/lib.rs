//! Whole-vault link analysis.
//!
//! Everything here runs over one complete, parsed snapshot; nothing in this
//! crate reads or writes files.

pub mod category;
pub mod graph;
pub mod resolve;

pub use category::{ancestor_paths, build_categories, is_within, nearest_index, Category};
pub use graph::{CrossReferenceGraph, Link};
pub use resolve::{choose_ambiguous_target, normalize_key, LinkResolver, Resolution, ResolutionKind};
