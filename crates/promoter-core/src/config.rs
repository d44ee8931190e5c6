//! The promotion configuration: policy table, default dwell time and
//! selection.
//!
//! The YAML document is decoded into a [`serde_yaml::Value`] and validated
//! into typed values. Shape problems that make a policy unusable are kept as
//! [`PolicyDefect`]s on the entry rather than failing the load, so that a
//! listing can still show every policy; they become errors once that policy
//! is resolved. Malformed optional fields fall back to their defaults.

use std::{
  collections::HashMap,
  fs,
  path::{Path, PathBuf},
};

use serde_yaml::{Mapping, Value};

use crate::{Error, Result, selection::Selection};

/// The file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
  /// No configuration file was found; the built-in policy table is in use.
  Default,
  Loaded(PathBuf),
}

impl std::fmt::Display for ConfigSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Default => f.write_str("the built-in default configuration"),
      Self::Loaded(path) => write!(f, "{}", path.display()),
    }
  }
}

// ─── Policies ────────────────────────────────────────────────────────────────

/// A per-item exception to a policy. Each field overrides independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Override {
  pub days:         Option<u32>,
  pub promote_to:   Option<Vec<String>>,
  pub promote_from: Option<Vec<String>>,
}

/// A well-formed policy definition as written in the table, before defaults
/// are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySpec {
  pub promote_to:   Vec<String>,
  pub promote_from: Option<Vec<String>>,
  pub days:         Option<u32>,
  pub custom_items: HashMap<String, Override>,
}

/// Why a policy entry cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDefect {
  /// `promote_to` is missing, not a list of strings, or empty.
  MissingPromoteTo,
  /// `days_in_catalog` is present but not a non-negative integer.
  InvalidDays(String),
}

/// One named entry of the policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyEntry {
  pub name: String,
  pub spec: Result<PolicySpec, PolicyDefect>,
}

/// A policy with all defaults applied; the input to the eligibility engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPolicy {
  pub name:         String,
  pub promote_to:   Vec<String>,
  pub promote_from: Vec<String>,
  pub days:         u32,
  pub custom_items: HashMap<String, Override>,
}

/// All policies in declaration order plus the table-wide default dwell time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyTable {
  entries:      Vec<PolicyEntry>,
  default_days: Option<u32>,
}

impl PolicyTable {
  pub fn new(entries: Vec<PolicyEntry>, default_days: Option<u32>) -> Self {
    Self {
      entries,
      default_days,
    }
  }

  pub fn entries(&self) -> &[PolicyEntry] { &self.entries }

  pub fn default_days(&self) -> Option<u32> { self.default_days }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn get(&self, name: &str) -> Option<&PolicyEntry> {
    self.entries.iter().find(|e| e.name == name)
  }

  /// Resolve the effective parameters of the policy called `name`.
  pub fn resolve(&self, name: &str) -> Result<ResolvedPolicy> {
    let entry = self
      .get(name)
      .ok_or_else(|| Error::PolicyNotFound(name.to_string()))?;

    let spec = match &entry.spec {
      Ok(spec) => spec,
      Err(PolicyDefect::MissingPromoteTo) => {
        return Err(Error::InvalidPolicy(name.to_string()));
      }
      Err(PolicyDefect::InvalidDays(value)) => {
        return Err(Error::InvalidDays {
          name:  name.to_string(),
          value: value.clone(),
        });
      }
    };

    let days = spec
      .days
      .or(self.default_days)
      .ok_or_else(|| Error::DaysUndefined(name.to_string()))?;

    Ok(ResolvedPolicy {
      name: name.to_string(),
      promote_to: spec.promote_to.clone(),
      promote_from: spec
        .promote_from
        .clone()
        .unwrap_or_else(|| vec![name.to_string()]),
      days,
      custom_items: spec.custom_items.clone(),
    })
  }

  /// Resolve every policy in declaration order, failing on the first one
  /// that cannot be resolved.
  pub fn resolve_all(&self) -> Result<Vec<ResolvedPolicy>> {
    if self.entries.is_empty() {
      return Err(Error::NoPromotions);
    }
    self.entries.iter().map(|e| self.resolve(&e.name)).collect()
  }
}

// ─── Whole configuration ─────────────────────────────────────────────────────

/// The validated promotion configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoterConfig {
  pub policies:  PolicyTable,
  pub selection: Selection,
}

impl Default for PromoterConfig {
  /// `autopkg` moves new imports into `staging`; `staging` moves them on to
  /// `production`. Both wait seven days.
  fn default() -> Self {
    let strings = |items: &[&str]| -> Vec<String> {
      items.iter().map(|s| s.to_string()).collect()
    };
    let policies = PolicyTable::new(
      vec![
        PolicyEntry {
          name: "autopkg".to_string(),
          spec: Ok(PolicySpec {
            promote_to:   strings(&["staging", "autopkg"]),
            promote_from: None,
            days:         None,
            custom_items: HashMap::new(),
          }),
        },
        PolicyEntry {
          name: "staging".to_string(),
          spec: Ok(PolicySpec {
            promote_to:   strings(&["production"]),
            promote_from: Some(strings(&["staging", "autopkg"])),
            days:         None,
            custom_items: HashMap::new(),
          }),
        },
      ],
      Some(7),
    );
    Self {
      policies,
      selection: Selection::All,
    }
  }
}

impl PromoterConfig {
  /// Parse and validate a YAML document.
  pub fn from_yaml_str(input: &str) -> Result<Self> {
    let root: Value = serde_yaml::from_str(input)?;
    Self::from_yaml_value(&root)
  }

  pub fn from_yaml_value(root: &Value) -> Result<Self> {
    // An empty document parses as null; treat it as an empty mapping.
    let empty = Mapping::new();
    let root = match root {
      Value::Null => &empty,
      Value::Mapping(m) => m,
      _ => return Err(Error::InvalidConfigRoot),
    };

    let default_days = match root.get("default_days_in_catalog") {
      None | Some(Value::Null) => None,
      Some(v) => Some(
        as_days(v).ok_or_else(|| Error::InvalidDefaultDays(render(v)))?,
      ),
    };

    let entries = match root.get("promotions") {
      Some(Value::Mapping(promotions)) => promotions
        .iter()
        .filter_map(|(k, v)| Some(parse_entry(scalar_string(k)?, v)))
        .collect(),
      _ => Vec::new(),
    };

    let selection = Selection::from_yaml(root.get("selection"))?;

    Ok(Self {
      policies: PolicyTable::new(entries, default_days),
      selection,
    })
  }

  /// Load the configuration file.
  ///
  /// `path` is the user-specified file, if any. A specified file must exist.
  /// Without one, [`DEFAULT_CONFIG_FILE`] is used when present and the
  /// built-in configuration otherwise.
  pub fn load(path: Option<&Path>) -> Result<(Self, ConfigSource), LoadError> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => {
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
        if !fallback.exists() {
          tracing::warn!(
            "no configuration file is present; continuing with default \
             settings"
          );
          return Ok((Self::default(), ConfigSource::Default));
        }
        fallback
      }
    };

    tracing::info!("loading {}", path.display());
    let raw = fs::read_to_string(&path).map_err(|source| LoadError::Read {
      path: path.clone(),
      source,
    })?;
    let config = Self::from_yaml_str(&raw).map_err(|source| {
      LoadError::Invalid {
        path: path.clone(),
        source,
      }
    })?;
    tracing::info!("successfully loaded {}", path.display());
    Ok((config, ConfigSource::Loaded(path)))
  }
}

/// Failure to load a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
  #[error("could not read configuration file {path}: {source}")]
  Read {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid configuration file {path}: {source}")]
  Invalid {
    path:   PathBuf,
    #[source]
    source: Error,
  },
}

// ─── Shape helpers ───────────────────────────────────────────────────────────

fn parse_entry(name: String, value: &Value) -> PolicyEntry {
  let spec = parse_spec(value);
  PolicyEntry { name, spec }
}

fn parse_spec(value: &Value) -> Result<PolicySpec, PolicyDefect> {
  let Value::Mapping(policy) = value else {
    return Err(PolicyDefect::MissingPromoteTo);
  };

  let promote_to = policy
    .get("promote_to")
    .and_then(catalog_list)
    .ok_or(PolicyDefect::MissingPromoteTo)?;

  let days = match policy.get("days_in_catalog") {
    None | Some(Value::Null) => None,
    Some(v) => {
      Some(as_days(v).ok_or_else(|| PolicyDefect::InvalidDays(render(v)))?)
    }
  };

  let custom_items = match policy.get("custom_items") {
    Some(Value::Mapping(items)) => items
      .iter()
      .filter_map(|(k, v)| Some((scalar_string(k)?, parse_override(v)?)))
      .collect(),
    _ => HashMap::new(),
  };

  Ok(PolicySpec {
    promote_to,
    promote_from: policy.get("promote_from").and_then(catalog_list),
    days,
    custom_items,
  })
}

/// `None` when the override is not a mapping; malformed fields are dropped.
fn parse_override(value: &Value) -> Option<Override> {
  let Value::Mapping(item) = value else {
    return None;
  };
  Some(Override {
    days:         item.get("days_in_catalog").and_then(as_days),
    promote_to:   item.get("promote_to").and_then(catalog_list),
    promote_from: item.get("promote_from").and_then(catalog_list),
  })
}

/// A non-empty list of scalars, read as strings.
pub(crate) fn catalog_list(value: &Value) -> Option<Vec<String>> {
  let Value::Sequence(items) = value else {
    return None;
  };
  let list: Vec<String> =
    items.iter().map(scalar_string).collect::<Option<_>>()?;
  (!list.is_empty()).then_some(list)
}

fn as_days(value: &Value) -> Option<u32> {
  value.as_u64().and_then(|d| u32::try_from(d).ok())
}

/// Names and catalogs may be written unquoted as numbers or booleans.
fn scalar_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

fn render(value: &Value) -> String {
  serde_yaml::to_string(value)
    .map(|s| s.trim_end().to_string())
    .unwrap_or_else(|_| format!("{value:?}"))
}
