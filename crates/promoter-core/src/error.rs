//! Error types for `promoter-core`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  // ── Configuration ─────────────────────────────────────────────────────

  #[error("promotion {0:?} not found")]
  PolicyNotFound(String),

  #[error(
    "promotion {0:?} improperly defined: which catalog(s) it promotes to is \
     undefined"
  )]
  InvalidPolicy(String),

  #[error(
    "promotion {name:?} improperly defined: days_in_catalog must be a \
     non-negative integer, got {value}"
  )]
  InvalidDays { name: String, value: String },

  #[error(
    "promotion {0:?} improperly defined: days_in_catalog is undefined and no \
     default_days_in_catalog has been set"
  )]
  DaysUndefined(String),

  #[error("default_days_in_catalog must be a non-negative integer, got {0}")]
  InvalidDefaultDays(String),

  #[error("no promotions are defined")]
  NoPromotions,

  #[error(
    "selection type must be \"inclusion\", \"exclusion\" or \"all\", got {0:?}"
  )]
  InvalidSelection(String),

  #[error("configuration root must be a mapping")]
  InvalidConfigRoot,

  #[error("yaml error: {0}")]
  Yaml(#[from] serde_yaml::Error),

  // ── Records ───────────────────────────────────────────────────────────

  #[error("record is missing expected key `{0}`")]
  MissingKey(&'static str),

  #[error("record key `{key}` has the wrong type (expected {expected})")]
  WrongType {
    key:      &'static str,
    expected: &'static str,
  },

  #[error("record is not a property-list dictionary")]
  NotADictionary,

  #[error("plist error: {0}")]
  Plist(#[from] plist::Error),

  #[error("malformed record {path}: {source}")]
  MalformedRecord {
    path:   PathBuf,
    #[source]
    source: Box<Error>,
  },

  // ── Store ─────────────────────────────────────────────────────────────

  #[error("could not write {path}: {source}")]
  CommitWrite {
    path:   PathBuf,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// `true` for errors caused by the policy table or selection config rather
  /// than by a record or the store.
  pub fn is_configuration(&self) -> bool {
    matches!(
      self,
      Self::PolicyNotFound(_)
        | Self::InvalidPolicy(_)
        | Self::InvalidDays { .. }
        | Self::DaysUndefined(_)
        | Self::InvalidDefaultDays(_)
        | Self::NoPromotions
        | Self::InvalidSelection(_)
        | Self::InvalidConfigRoot
        | Self::Yaml(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
