//! Archive handling for snapshots.
//!
//! - `extract`: unpacks the provider's zip snapshot into the workspace.
//! - `filter`: narrows the extracted tree to a requested subdirectory.
//! - `pack`: repacks a tree into a gzip-compressed tar file.

pub mod extract;
pub mod filter;
pub mod pack;

pub use extract::extract;
pub use filter::resolve;
pub use pack::pack;
