//! The `RecordStore` trait.
//!
//! Implemented by storage backends (e.g. `promoter-store`). The batch runner
//! depends on this abstraction, not on any concrete backend.

use std::path::{Path, PathBuf};

use crate::record::Record;

/// Abstraction over a directory of package-metadata records.
///
/// Records are identified by path. Every call is synchronous; a record is
/// read, evaluated and, if needed, rewritten before the next one is touched.
pub trait RecordStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every record in the store, in a stable order.
  fn list(&self) -> Result<Vec<PathBuf>, Self::Error>;

  /// Read and decode one record.
  fn load(&self, path: &Path) -> Result<Record, Self::Error>;

  /// Overwrite one record in place.
  fn save(&self, path: &Path, record: &Record) -> Result<(), Self::Error>;
}
