//! Filesystem backend for the promoter.
//!
//! Each record is one property-list file below a repository root. Rewrites
//! happen in place rather than through a temporary file, so an interrupted
//! write can leave a record truncated.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::FsRecordStore;
