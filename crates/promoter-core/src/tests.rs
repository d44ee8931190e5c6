//! Runner tests against an in-memory store.

use std::{
  cell::{Cell, RefCell},
  io,
  path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
  Error,
  batch::{CustomPromotion, PromotedItem, Runner},
  config::PromoterConfig,
  record::Record,
  selection::Selection,
  store::RecordStore,
};

// ─── In-memory store ─────────────────────────────────────────────────────────

/// Records keyed by a synthetic path; `None` stands for an undecodable file.
pub(crate) struct MemoryStore {
  records:    RefCell<Vec<(PathBuf, Option<Record>)>>,
  writes:     Cell<usize>,
  /// Writes fail once this many have succeeded.
  fail_after: Cell<Option<usize>>,
}

impl MemoryStore {
  pub(crate) fn new(records: impl IntoIterator<Item = Record>) -> Self {
    let records = records
      .into_iter()
      .map(|r| (Self::path_for(&r.name), Some(r)))
      .collect();
    Self {
      records:    RefCell::new(records),
      writes:     Cell::new(0),
      fail_after: Cell::new(None),
    }
  }

  pub(crate) fn path_for(name: &str) -> PathBuf {
    PathBuf::from(format!("pkgsinfo/{name}.plist"))
  }

  pub(crate) fn add_corrupt(&self, name: &str) {
    self.records.borrow_mut().push((Self::path_for(name), None));
  }

  pub(crate) fn get(&self, name: &str) -> Record {
    self
      .records
      .borrow()
      .iter()
      .find_map(|(_, r)| r.as_ref().filter(|r| r.name == name).cloned())
      .expect("record in store")
  }

  pub(crate) fn writes(&self) -> usize { self.writes.get() }
}

impl RecordStore for MemoryStore {
  type Error = io::Error;

  fn list(&self) -> Result<Vec<PathBuf>, Self::Error> {
    Ok(self.records.borrow().iter().map(|(p, _)| p.clone()).collect())
  }

  fn load(&self, path: &Path) -> Result<Record, Self::Error> {
    let records = self.records.borrow();
    let (_, record) = records
      .iter()
      .find(|(p, _)| p == path)
      .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
    record
      .clone()
      .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "corrupt"))
  }

  fn save(&self, path: &Path, record: &Record) -> Result<(), Self::Error> {
    if self
      .fail_after
      .get()
      .is_some_and(|limit| self.writes.get() >= limit)
    {
      return Err(io::Error::from(io::ErrorKind::PermissionDenied));
    }
    let mut records = self.records.borrow_mut();
    let slot = records
      .iter_mut()
      .find(|(p, _)| p == path)
      .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
    slot.1 = Some(record.clone());
    self.writes.set(self.writes.get() + 1);
    Ok(())
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn now() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn dwelt(name: &str, catalogs: &[&str], days_ago: i64) -> Record {
  let mut record = Record::new(name, "1.0", catalogs.iter().copied());
  record.dwell_start = Some(now() - Duration::days(days_ago));
  record
}

fn config(yaml: &str) -> PromoterConfig {
  PromoterConfig::from_yaml_str(yaml).unwrap()
}

const STAGING: &str = r#"
promotions:
  staging:
    promote_to: [production]
    days_in_catalog: 7
"#;

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn staging_to_production_end_to_end() {
  let store = MemoryStore::new([dwelt("Firefox", &["staging"], 10)]);
  let config = config(STAGING);
  let runner = Runner::new(&store, &config.selection, now());

  let report = runner.run_all(&config.policies).unwrap();
  assert_eq!(report.policies.len(), 1);
  assert_eq!(report.policies[0].policy, "staging");
  assert_eq!(report.policies[0].promote_to, vec!["production"]);
  assert_eq!(
    report.policies[0].standard,
    vec![PromotedItem {
      name:    "Firefox".into(),
      version: "1.0".into(),
    }]
  );

  // Nothing is written before commit.
  assert_eq!(store.writes(), 0);
  assert_eq!(store.get("Firefox").catalogs, vec!["staging"]);

  assert_eq!(report.commit(&store).unwrap(), 1);
  let committed = store.get("Firefox");
  assert_eq!(committed.catalogs, vec!["production"]);
  assert_eq!(committed.dwell_start, Some(now()));
}

#[test]
fn first_matching_policy_claims_the_record() {
  let store = MemoryStore::new([dwelt("Firefox", &["staging"], 30)]);
  let config = config(
    r#"
promotions:
  fast:
    promote_from: [staging]
    promote_to: [production]
    days_in_catalog: 1
  slow:
    promote_from: [staging]
    promote_to: [archive]
    days_in_catalog: 2
"#,
  );
  let report = Runner::new(&store, &config.selection, now())
    .run_all(&config.policies)
    .unwrap();

  assert_eq!(report.policies.len(), 1);
  assert_eq!(report.policies[0].policy, "fast");
  assert_eq!(report.pending.len(), 1);
  assert_eq!(report.pending[0].record.catalogs, vec!["production"]);
}

#[test]
fn later_policy_claims_when_earlier_is_not_due() {
  let store = MemoryStore::new([dwelt("Firefox", &["staging"], 5)]);
  let config = config(
    r#"
promotions:
  slow:
    promote_from: [staging]
    promote_to: [archive]
    days_in_catalog: 10
  fast:
    promote_from: [staging]
    promote_to: [production]
    days_in_catalog: 1
"#,
  );
  let report = Runner::new(&store, &config.selection, now())
    .run_all(&config.policies)
    .unwrap();
  assert_eq!(report.policies.len(), 1);
  assert_eq!(report.policies[0].policy, "fast");
}

#[test]
fn report_follows_declaration_order() {
  let store = MemoryStore::new([
    dwelt("Alpha", &["testing"], 30),
    dwelt("Beta", &["staging"], 30),
  ]);
  let config = config(
    r#"
promotions:
  staging:
    promote_to: [production]
  testing:
    promote_to: [staging]
  unused:
    promote_to: [nowhere]
default_days_in_catalog: 7
"#,
  );
  let report = Runner::new(&store, &config.selection, now())
    .run_all(&config.policies)
    .unwrap();
  let order: Vec<_> =
    report.policies.iter().map(|p| p.policy.as_str()).collect();
  assert_eq!(order, vec!["staging", "testing"]);
}

#[test]
fn run_one_only_evaluates_the_named_policy() {
  let store = MemoryStore::new([
    dwelt("Alpha", &["testing"], 30),
    dwelt("Beta", &["staging"], 30),
  ]);
  let config = config(
    r#"
promotions:
  staging:
    promote_to: [production]
  testing:
    promote_to: [staging]
default_days_in_catalog: 7
"#,
  );
  let report = Runner::new(&store, &config.selection, now())
    .run_one(&config.policies, "testing")
    .unwrap();
  assert_eq!(report.pending.len(), 1);
  assert_eq!(report.policies[0].standard[0].name, "Alpha");
}

#[test]
fn run_one_rejects_unknown_policy() {
  let store = MemoryStore::new([]);
  let config = config(STAGING);
  let err = Runner::new(&store, &config.selection, now())
    .run_one(&config.policies, "missing")
    .unwrap_err();
  assert!(matches!(err, Error::PolicyNotFound(_)));
}

#[test]
fn invalid_policy_aborts_before_any_write() {
  let store = MemoryStore::new([Record::new("Bare", "1.0", ["staging"])]);
  let config = config(
    r#"
promotions:
  staging:
    promote_to: [production]
    days_in_catalog: 7
  broken:
    days_in_catalog: 7
"#,
  );
  let err = Runner::new(&store, &config.selection, now())
    .run_all(&config.policies)
    .unwrap_err();
  assert!(err.is_configuration());
  assert_eq!(store.writes(), 0);
}

#[test]
fn unselected_records_are_neither_reported_nor_changed() {
  let store = MemoryStore::new([
    dwelt("Firefox", &["staging"], 30),
    dwelt("Chrome", &["staging"], 30),
  ]);
  let config = config(STAGING);
  let selection = Selection::Exclusion(Some(vec!["Chrome".into()]));
  let report = Runner::new(&store, &selection, now())
    .run_all(&config.policies)
    .unwrap();

  assert_eq!(report.pending.len(), 1);
  assert_eq!(report.pending[0].record.name, "Firefox");
  assert_eq!(report.policies[0].standard.len(), 1);
}

#[test]
fn inclusion_without_items_promotes_nothing() {
  let store = MemoryStore::new([dwelt("Firefox", &["staging"], 30)]);
  let config = config(STAGING);
  let report = Runner::new(&store, &Selection::Inclusion(None), now())
    .run_all(&config.policies)
    .unwrap();
  assert!(report.is_empty());
  assert!(report.policies.is_empty());
}

#[test]
fn custom_routed_promotions_are_reported_separately() {
  let store = MemoryStore::new([
    dwelt("Firefox", &["staging"], 30),
    dwelt("Chrome", &["staging"], 30),
  ]);
  let config = config(
    r#"
promotions:
  staging:
    promote_to: [production]
    days_in_catalog: 7
    custom_items:
      Chrome:
        promote_to: [production, pilot]
"#,
  );
  let report = Runner::new(&store, &config.selection, now())
    .run_all(&config.policies)
    .unwrap();

  let policy = &report.policies[0];
  assert_eq!(policy.standard.len(), 1);
  assert_eq!(
    policy.custom,
    vec![CustomPromotion {
      name:       "Chrome".into(),
      version:    "1.0".into(),
      promote_to: vec!["production".into(), "pilot".into()],
    }]
  );
  let chrome = report
    .pending
    .iter()
    .find(|c| c.record.name == "Chrome")
    .unwrap();
  assert_eq!(chrome.record.catalogs, vec!["production", "pilot"]);
}

#[test]
fn backfill_is_written_immediately_and_only_once() {
  let store = MemoryStore::new([Record::new("Bare", "1.0", ["staging"])]);
  let config = config(STAGING);

  let report = Runner::new(&store, &config.selection, now())
    .run_all(&config.policies)
    .unwrap();
  assert!(report.is_empty());
  assert_eq!(report.backfilled, vec![MemoryStore::path_for("Bare")]);
  assert_eq!(store.writes(), 1);
  assert_eq!(store.get("Bare").dwell_start, Some(now()));

  let again = Runner::new(&store, &config.selection, now())
    .run_all(&config.policies)
    .unwrap();
  assert!(again.backfilled.is_empty());
  assert_eq!(store.writes(), 1);
  assert_eq!(store.get("Bare").dwell_start, Some(now()));
}

#[test]
fn backfill_ignores_selection() {
  let store = MemoryStore::new([Record::new("Bare", "1.0", ["staging"])]);
  let config = config(STAGING);
  Runner::new(&store, &Selection::Inclusion(None), now())
    .run_all(&config.policies)
    .unwrap();
  assert_eq!(store.get("Bare").dwell_start, Some(now()));
}

#[test]
fn failed_backfill_write_is_not_fatal() {
  let store = MemoryStore::new([
    Record::new("Bare", "1.0", ["staging"]),
    dwelt("Firefox", &["staging"], 30),
  ]);
  store.fail_after.set(Some(0));
  let config = config(STAGING);

  let report = Runner::new(&store, &config.selection, now())
    .run_all(&config.policies)
    .unwrap();
  assert_eq!(report.pending.len(), 1);
  assert!(report.backfilled.is_empty());
  assert_eq!(report.backfill_failed, vec![MemoryStore::path_for("Bare")]);
  assert_eq!(store.get("Bare").dwell_start, None);
}

#[test]
fn failed_commit_stops_at_first_error() {
  let store = MemoryStore::new([dwelt("Firefox", &["staging"], 30)]);
  let config = config(STAGING);
  let report = Runner::new(&store, &config.selection, now())
    .run_all(&config.policies)
    .unwrap();

  store.fail_after.set(Some(0));
  let err = report.commit(&store).unwrap_err();
  assert!(matches!(err, Error::CommitWrite { .. }));
  assert_eq!(store.get("Firefox").catalogs, vec!["staging"]);
}

#[test]
fn failed_commit_keeps_earlier_writes_and_skips_later_ones() {
  let store = MemoryStore::new([
    dwelt("Chrome", &["staging"], 30),
    dwelt("Firefox", &["staging"], 30),
    dwelt("Zoom", &["staging"], 30),
  ]);
  let config = config(STAGING);
  let report = Runner::new(&store, &config.selection, now())
    .run_all(&config.policies)
    .unwrap();
  assert_eq!(report.pending.len(), 3);

  store.fail_after.set(Some(1));
  let err = report.commit(&store).unwrap_err();
  let Error::CommitWrite { path, .. } = &err else {
    panic!("expected CommitWrite, got {err:?}");
  };
  assert_eq!(path, &MemoryStore::path_for("Firefox"));

  assert_eq!(store.writes(), 1);
  assert_eq!(store.get("Chrome").catalogs, vec!["production"]);
  assert_eq!(store.get("Firefox").catalogs, vec!["staging"]);
  assert_eq!(store.get("Zoom").catalogs, vec!["staging"]);
}

#[test]
fn undecodable_record_aborts_the_run() {
  let store = MemoryStore::new([dwelt("Firefox", &["staging"], 30)]);
  store.add_corrupt("Broken");
  let config = config(STAGING);
  let err = Runner::new(&store, &config.selection, now())
    .run_all(&config.policies)
    .unwrap_err();
  assert!(matches!(err, Error::Store(_)));
}
