//! The promotion batch runner.
//!
//! Runs the eligibility engine over every record in a store and collects the
//! result per policy. Nothing but timestamp backfills is written until the
//! caller commits the returned report.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  Error, Result,
  config::{PolicyTable, ResolvedPolicy},
  eligibility::{Outcome, Promotion, evaluate},
  record::Record,
  selection::Selection,
  store::RecordStore,
};

// ─── Report types ────────────────────────────────────────────────────────────

/// A record promoted to its policy's standard destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotedItem {
  pub name:    String,
  pub version: String,
}

/// A record whose destination was changed by a custom item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomPromotion {
  pub name:       String,
  pub version:    String,
  pub promote_to: Vec<String>,
}

/// Everything one policy promoted in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyReport {
  pub policy:     String,
  /// The policy's standard destination.
  pub promote_to: Vec<String>,
  pub standard:   Vec<PromotedItem>,
  pub custom:     Vec<CustomPromotion>,
}

impl PolicyReport {
  fn new(policy: &ResolvedPolicy) -> Self {
    Self {
      policy:     policy.name.clone(),
      promote_to: policy.promote_to.clone(),
      standard:   Vec::new(),
      custom:     Vec::new(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.standard.is_empty() && self.custom.is_empty()
  }

  fn push(&mut self, record: &Record, promotion: &Promotion) {
    let name = record.display_name();
    let version = record.version.clone();
    if promotion.overridden {
      self.custom.push(CustomPromotion {
        name,
        version,
        promote_to: promotion.promote_to.clone(),
      });
    } else {
      self.standard.push(PromotedItem { name, version });
    }
  }
}

/// A changed record waiting to be written back.
#[derive(Debug, Clone)]
pub struct PendingChange {
  pub path:   PathBuf,
  pub record: Record,
}

/// The result of a promotion run.
#[derive(Debug, Clone, Default)]
pub struct PromotionReport {
  /// Policies that promoted at least one record, in declaration order.
  pub policies:        Vec<PolicyReport>,
  /// Promoted records, not yet written.
  pub pending:         Vec<PendingChange>,
  /// Records whose backfilled dwell start has been written.
  pub backfilled:      Vec<PathBuf>,
  /// Records whose backfilled dwell start could not be written; it is retried
  /// next run.
  pub backfill_failed: Vec<PathBuf>,
}

impl PromotionReport {
  /// `true` when nothing would be promoted.
  pub fn is_empty(&self) -> bool { self.pending.is_empty() }

  /// Write every promoted record back to `store`.
  pub fn commit<S: RecordStore>(&self, store: &S) -> Result<usize> {
    commit(store, &self.pending)
  }
}

/// Write `changes` to `store` in order, stopping at the first failure.
/// Records written before the failure stay written.
pub fn commit<S: RecordStore>(
  store: &S,
  changes: &[PendingChange],
) -> Result<usize> {
  for change in changes {
    tracing::info!(
      "writing {} with catalogs {:?}",
      change.path.display(),
      change.record.catalogs
    );
    store
      .save(&change.path, &change.record)
      .map_err(|e| Error::CommitWrite {
        path:   change.path.clone(),
        source: Box::new(e),
      })?;
  }
  Ok(changes.len())
}

pub(crate) fn store_error<E>(e: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(e))
}

// ─── Runner ──────────────────────────────────────────────────────────────────

/// Evaluates policies over a store at a fixed instant.
pub struct Runner<'a, S: RecordStore> {
  store:     &'a S,
  selection: &'a Selection,
  now:       DateTime<Utc>,
}

impl<'a, S: RecordStore> Runner<'a, S> {
  pub fn new(
    store: &'a S,
    selection: &'a Selection,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      store,
      selection,
      now,
    }
  }

  /// Run every policy. Each record is claimed by the first policy, in
  /// declaration order, under which it is eligible and selected.
  ///
  /// Every policy is resolved before any record is read.
  pub fn run_all(&self, table: &PolicyTable) -> Result<PromotionReport> {
    let policies = table.resolve_all()?;
    self.run(&policies)
  }

  /// Run only the policy called `name`.
  pub fn run_one(
    &self,
    table: &PolicyTable,
    name: &str,
  ) -> Result<PromotionReport> {
    let policy = table.resolve(name)?;
    self.run(std::slice::from_ref(&policy))
  }

  fn run(&self, policies: &[ResolvedPolicy]) -> Result<PromotionReport> {
    let mut reports: Vec<PolicyReport> =
      policies.iter().map(PolicyReport::new).collect();
    let mut report = PromotionReport::default();

    for path in self.store.list().map_err(store_error)? {
      let mut record = self.store.load(&path).map_err(store_error)?;

      let mut claim = None;
      for (index, policy) in policies.iter().enumerate() {
        match evaluate(&mut record, policy, self.now) {
          Outcome::NotEligible => {}
          Outcome::Backfilled => {
            if self.persist_backfill(&path, &record) {
              report.backfilled.push(path.clone());
            } else {
              report.backfill_failed.push(path.clone());
            }
          }
          Outcome::Eligible(promotion) => {
            if self.selection.includes(&record.display_name()) {
              claim = Some((index, promotion));
              break;
            }
            tracing::debug!(
              item = %record.display_name(),
              policy = %policy.name,
              "eligible but not selected"
            );
          }
        }
      }

      if let Some((index, promotion)) = claim {
        reports[index].push(&record, &promotion);
        record.promote(&promotion.promote_to, self.now);
        report.pending.push(PendingChange { path, record });
      }
    }

    reports.retain(|r| !r.is_empty());
    report.policies = reports;
    Ok(report)
  }

  /// A failed backfill write is not fatal: the in-memory value is used for
  /// this run. Returns whether the write succeeded.
  fn persist_backfill(
    &self,
    path: &std::path::Path,
    record: &Record,
  ) -> bool {
    tracing::info!("adding missing metadata to {}", path.display());
    match self.store.save(path, record) {
      Ok(()) => true,
      Err(e) => {
        tracing::warn!(
          "{} is missing metadata and could not be written: {e}",
          path.display()
        );
        false
      }
    }
  }
}
