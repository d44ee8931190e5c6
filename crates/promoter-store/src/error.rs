//! Error type for `promoter-store`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] promoter_core::Error),

  #[error("repository directory {0} does not exist")]
  MissingRoot(PathBuf),

  #[error("repository directory {0} is not writable")]
  ReadOnlyRoot(PathBuf),

  #[error("i/o error on {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl Error {
  /// Attach `path` to an I/O error, for use with `map_err`.
  pub(crate) fn io(
    path: impl Into<PathBuf>,
  ) -> impl FnOnce(std::io::Error) -> Self {
    let path = path.into();
    move |source| Self::Io { path, source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
