//! Bulk maintenance of dwell-start timestamps.
//!
//! Used to seed a repository whose records predate the promoter, or to restart
//! every dwell clock. Changes are planned first and committed separately.

use chrono::{DateTime, Duration, Utc};

use crate::{
  Result,
  batch::{PendingChange, commit, store_error},
  config::ResolvedPolicy,
  eligibility::effective,
  record::Record,
  selection::Selection,
  store::RecordStore,
};

/// Which records get a new dwell start, and what it becomes.
#[derive(Debug, Clone)]
pub enum EditDateMode {
  /// Every record's dwell start becomes now.
  ResetAll,
  /// Records without a dwell start get now.
  FillUnknown,
  /// Records without a dwell start that sit in `policy`'s source catalogs
  /// get their creation date plus `days_before`, or now if they have no
  /// creation date.
  InferFromCreation {
    policy:      ResolvedPolicy,
    days_before: u32,
  },
}

/// The planned edit-date changes.
#[derive(Debug, Clone, Default)]
pub struct EditDatePlan {
  /// Display names of the changed records, in store order.
  pub names:   Vec<String>,
  pub pending: Vec<PendingChange>,
}

impl EditDatePlan {
  pub fn is_empty(&self) -> bool { self.pending.is_empty() }

  pub fn commit<S: RecordStore>(&self, store: &S) -> Result<usize> {
    commit(store, &self.pending)
  }
}

/// Plan dwell-start changes for every selected record in `store`.
pub fn plan_edit_dates<S: RecordStore>(
  store: &S,
  mode: &EditDateMode,
  selection: &Selection,
  now: DateTime<Utc>,
) -> Result<EditDatePlan> {
  let mut plan = EditDatePlan::default();

  for path in store.list().map_err(store_error)? {
    let mut record = store.load(&path).map_err(store_error)?;
    let name = record.display_name();
    let Some(start) = new_dwell_start(&record, mode, now) else {
      continue;
    };
    if !selection.includes(&name) {
      continue;
    }
    record.dwell_start = Some(start);
    plan.names.push(name);
    plan.pending.push(PendingChange { path, record });
  }

  Ok(plan)
}

fn new_dwell_start(
  record: &Record,
  mode: &EditDateMode,
  now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
  match mode {
    EditDateMode::ResetAll => Some(now),
    EditDateMode::FillUnknown => record.dwell_start.is_none().then_some(now),
    EditDateMode::InferFromCreation {
      policy,
      days_before,
    } => {
      if record.dwell_start.is_some() {
        return None;
      }
      let params = effective(policy, &record.display_name());
      if !record.in_exactly(params.promote_from) {
        return None;
      }
      match record.creation_date {
        Some(created) => {
          created.checked_add_signed(Duration::days(i64::from(*days_before)))
        }
        None => {
          tracing::info!(
            item = %record.display_name(),
            "missing a creation date; setting the last edit date to now"
          );
          Some(now)
        }
      }
    }
  }
}
