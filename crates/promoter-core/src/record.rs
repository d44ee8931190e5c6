//! Package-metadata records and their property-list codec.
//!
//! A record is decoded from an XML (or binary) property list into a typed
//! view of the keys the engine cares about. The full source dictionary is
//! retained so that re-encoding preserves every key the engine does not touch.

use std::{
  collections::HashSet,
  io::{Read, Seek, Write},
  time::SystemTime,
};

use chrono::{DateTime, Utc};
use plist::{Dictionary, Value};

use crate::{Error, Result};

// ─── Keys ────────────────────────────────────────────────────────────────────

pub const NAME_KEY: &str = "name";
pub const VERSION_KEY: &str = "version";
pub const CATALOGS_KEY: &str = "catalogs";
pub const ARCHITECTURES_KEY: &str = "supported_architectures";
pub const METADATA_KEY: &str = "_metadata";
/// Metadata key holding the moment the record entered its current catalogs.
pub const DWELL_START_KEY: &str = "munki-promoter_edit_date";
pub const CREATION_DATE_KEY: &str = "creation_date";

// ─── Record ──────────────────────────────────────────────────────────────────

/// One package-metadata record.
#[derive(Debug, Clone)]
pub struct Record {
  pub name:          String,
  /// Values of `supported_architectures`; only used to qualify the display
  /// name.
  pub architectures: Vec<String>,
  pub version:       String,
  /// Current catalog membership. Order is preserved on write but ignored when
  /// matching.
  pub catalogs:      Vec<String>,
  /// When the record entered its current catalog set.
  pub dwell_start:   Option<DateTime<Utc>>,
  pub creation_date: Option<DateTime<Utc>>,
  /// The dictionary the record was decoded from.
  raw:               Dictionary,
}

impl Record {
  /// Build a record with no metadata and no extra keys.
  pub fn new(
    name: impl Into<String>,
    version: impl Into<String>,
    catalogs: impl IntoIterator<Item = impl Into<String>>,
  ) -> Self {
    Self {
      name:          name.into(),
      architectures: Vec::new(),
      version:       version.into(),
      catalogs:      catalogs.into_iter().map(Into::into).collect(),
      dwell_start:   None,
      creation_date: None,
      raw:           Dictionary::new(),
    }
  }

  /// Decode a record from a property-list dictionary.
  ///
  /// Fails with [`Error::MissingKey`] when `name`, `version` or `catalogs` is
  /// absent. Unreadable timestamps are treated as absent.
  pub fn from_dictionary(raw: Dictionary) -> Result<Self> {
    let name = required_string(&raw, NAME_KEY)?;
    let version = required_string(&raw, VERSION_KEY)?;

    let catalogs = raw
      .get(CATALOGS_KEY)
      .ok_or(Error::MissingKey(CATALOGS_KEY))?
      .as_array()
      .ok_or(Error::WrongType {
        key:      CATALOGS_KEY,
        expected: "array of strings",
      })?
      .iter()
      .map(|v| {
        v.as_string().map(str::to_string).ok_or(Error::WrongType {
          key:      CATALOGS_KEY,
          expected: "array of strings",
        })
      })
      .collect::<Result<Vec<_>>>()?;

    let architectures = raw
      .get(ARCHITECTURES_KEY)
      .and_then(Value::as_array)
      .map(|values| {
        values
          .iter()
          .filter_map(Value::as_string)
          .map(str::to_string)
          .collect()
      })
      .unwrap_or_default();

    let metadata = raw.get(METADATA_KEY).and_then(Value::as_dictionary);
    let dwell_start = metadata.and_then(|m| metadata_date(m, DWELL_START_KEY));
    let creation_date =
      metadata.and_then(|m| metadata_date(m, CREATION_DATE_KEY));

    Ok(Self {
      name,
      architectures,
      version,
      catalogs,
      dwell_start,
      creation_date,
      raw,
    })
  }

  /// Decode a record from a property-list byte stream.
  pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
    let value = Value::from_reader(reader)?;
    let dict = value.into_dictionary().ok_or(Error::NotADictionary)?;
    Self::from_dictionary(dict)
  }

  /// Re-encode the record, overlaying catalogs and dwell start onto the
  /// original dictionary.
  pub fn to_dictionary(&self) -> Dictionary {
    let mut dict = self.raw.clone();
    dict.insert(NAME_KEY.to_string(), Value::String(self.name.clone()));
    dict.insert(
      VERSION_KEY.to_string(),
      Value::String(self.version.clone()),
    );
    dict.insert(
      CATALOGS_KEY.to_string(),
      Value::Array(
        self.catalogs.iter().cloned().map(Value::String).collect(),
      ),
    );

    if self.dwell_start.is_some() || self.creation_date.is_some() {
      let mut metadata = dict
        .get(METADATA_KEY)
        .and_then(Value::as_dictionary)
        .cloned()
        .unwrap_or_default();
      if let Some(ts) = self.dwell_start {
        metadata.insert(DWELL_START_KEY.to_string(), date_value(ts));
      }
      if let Some(ts) = self.creation_date {
        metadata.insert(CREATION_DATE_KEY.to_string(), date_value(ts));
      }
      dict.insert(METADATA_KEY.to_string(), Value::Dictionary(metadata));
    }

    dict
  }

  /// Write the record as an XML property list.
  pub fn write_xml<W: Write>(&self, writer: W) -> Result<()> {
    Value::Dictionary(self.to_dictionary()).to_writer_xml(writer)?;
    Ok(())
  }

  /// The name used for custom items and selection: the bare name, qualified
  /// with the supported architectures when there are any, e.g.
  /// `Firefox (arm64, x86_64)`.
  pub fn display_name(&self) -> String {
    if self.architectures.is_empty() {
      self.name.clone()
    } else {
      format!("{} ({})", self.name, self.architectures.join(", "))
    }
  }

  /// Set equality between the record's catalogs and `catalogs`.
  pub fn in_exactly(&self, catalogs: &[String]) -> bool {
    let current: HashSet<&str> =
      self.catalogs.iter().map(String::as_str).collect();
    let wanted: HashSet<&str> = catalogs.iter().map(String::as_str).collect();
    current == wanted
  }

  /// Move the record into `catalogs` and restart its dwell clock.
  pub fn promote(&mut self, catalogs: &[String], now: DateTime<Utc>) {
    self.catalogs = catalogs.to_vec();
    self.dwell_start = Some(now);
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn required_string(dict: &Dictionary, key: &'static str) -> Result<String> {
  dict
    .get(key)
    .ok_or(Error::MissingKey(key))?
    .as_string()
    .map(str::to_string)
    .ok_or(Error::WrongType {
      key,
      expected: "string",
    })
}

fn metadata_date(metadata: &Dictionary, key: &str) -> Option<DateTime<Utc>> {
  metadata
    .get(key)
    .and_then(Value::as_date)
    .map(|d| DateTime::<Utc>::from(SystemTime::from(d)))
}

fn date_value(ts: DateTime<Utc>) -> Value {
  Value::Date(SystemTime::from(ts).into())
}
