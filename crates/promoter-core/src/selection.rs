//! The selection filter: which otherwise-eligible records may be changed.

use serde_yaml::Value;

use crate::{Error, Result, config::catalog_list};

/// Process-wide item filter, applied after eligibility.
///
/// An `items` list of `None` means the list was absent or malformed:
/// inclusion then selects nothing and exclusion selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
  #[default]
  All,
  Inclusion(Option<Vec<String>>),
  Exclusion(Option<Vec<String>>),
}

impl Selection {
  /// Whether the record with display name `name` may be changed.
  pub fn includes(&self, name: &str) -> bool {
    match self {
      Self::All => true,
      Self::Inclusion(None) => false,
      Self::Inclusion(Some(items)) => items.iter().any(|i| i == name),
      Self::Exclusion(None) => true,
      Self::Exclusion(Some(items)) => !items.iter().any(|i| i == name),
    }
  }

  /// Decode the `selection` key of the configuration document.
  ///
  /// A missing key or a mapping without `type` selects everything; an
  /// unrecognised `type` is an error.
  pub(crate) fn from_yaml(value: Option<&Value>) -> Result<Self> {
    let Some(value) = value else {
      return Ok(Self::All);
    };
    let Some(kind) = value.get("type") else {
      tracing::warn!(
        "selection key found but no selection type; all items will be \
         considered"
      );
      return Ok(Self::All);
    };

    let items = value.get("items").and_then(catalog_list);
    match kind.as_str() {
      Some("all") => Ok(Self::All),
      Some("inclusion") => {
        if items.is_none() {
          tracing::warn!(
            "selection type set to inclusion but no list of items defined; \
             no items will be considered"
          );
        }
        Ok(Self::Inclusion(items))
      }
      Some("exclusion") => {
        if items.is_none() {
          tracing::warn!(
            "selection type set to exclusion but no list of items defined; \
             all items will be considered"
          );
        }
        Ok(Self::Exclusion(items))
      }
      other => Err(Error::InvalidSelection(
        other.map_or_else(|| format!("{kind:?}"), str::to_string),
      )),
    }
  }
}
