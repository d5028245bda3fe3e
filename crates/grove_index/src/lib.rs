//! Index synchronizer: derives each category index's listing from the
//! snapshot, diffs it against what the index stores and rewrites the
//! managed block on request.

pub mod apply;
pub mod drift;
pub mod listing;
pub mod sync;

pub use apply::{apply_listing, ApplyError};
pub use drift::{diff, IndexDrift, RowChange};
pub use listing::{
    expected_listing, locate_block, parse_listing, render_listing, BlockSpan, ListingGroup,
    ListingRow, ListingTable, LISTING_END, LISTING_START,
};
pub use sync::{check_indexes, normalize_category, sync_index, IndexReport};
