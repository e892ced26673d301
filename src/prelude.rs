//! The `repotar` prelude for convenient library usage.
//!
//! This module re-exports the most commonly used types and functions from the
//! `repotar` library.
//!
//! # Example
//!
//! ```
//! use repotar::prelude::*;
//! # fn main() -> Result<()> {
//!
//! let config = Config::default();
//! let request = from_path("/github.com/acme/widgets/docs", &PathQuery::default(), &config)?;
//! assert_eq!(request.spec.archive_url(), "https://github.com/acme/widgets/archive/main.zip");
//!
//! let token = CancellationToken::new();
//! assert!(!token.is_cancelled());
//!
//! # Ok(())
//! # }
//! ```

pub use crate::archive::{extract, pack, resolve};
pub use crate::build_archive;
pub use crate::cancellation::CancellationToken;
pub use crate::config::{Config, ConfigBuilder, PipelineConfig};
pub use crate::core_types::{FetchSpec, PackedArchive};
pub use crate::errors::{Error, Result};
pub use crate::fetch::{fetch, FetchOptions};
pub use crate::request::{from_body, from_path, FetchRequest, PathQuery};
pub use crate::web::{create_router, start_server};
pub use crate::workspace::Workspace;
