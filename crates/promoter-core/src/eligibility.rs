//! The eligibility engine: decides whether one record is due for promotion
//! under one policy.

use chrono::{DateTime, Duration, Utc};

use crate::{config::ResolvedPolicy, record::Record};

/// A promotion the engine has decided on but not yet applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Promotion {
  /// The catalogs the record moves into.
  pub promote_to: Vec<String>,
  /// `true` when a custom item changed the destination.
  pub overridden: bool,
}

/// The result of evaluating a record against a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// The record is not in the policy's source catalogs, or has not dwelt
  /// there long enough.
  NotEligible,
  /// The record had no dwell start or creation date. Its dwell start was set
  /// to `now` in memory and must be persisted; it is not promoted.
  Backfilled,
  Eligible(Promotion),
}

/// The effective policy parameters for a single record, after custom-item
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effective<'a> {
  pub promote_to:   &'a [String],
  pub promote_from: &'a [String],
  pub days:         u32,
  pub overridden:   bool,
}

/// Apply the custom item for `display_name`, if any, to `policy`.
pub fn effective<'a>(
  policy: &'a ResolvedPolicy,
  display_name: &str,
) -> Effective<'a> {
  let mut out = Effective {
    promote_to:   &policy.promote_to,
    promote_from: &policy.promote_from,
    days:         policy.days,
    overridden:   false,
  };
  let Some(item) = policy.custom_items.get(display_name) else {
    return out;
  };

  if let Some(days) = item.days {
    out.days = days;
  }
  if let Some(to) = &item.promote_to {
    out.promote_to = to;
    out.overridden = true;
  }
  if let Some(from) = &item.promote_from {
    out.promote_from = from;
  }
  out
}

/// Evaluate `record` against `policy` at `now`.
///
/// The only change this makes to `record` is a dwell-start backfill, signalled
/// by [`Outcome::Backfilled`]. Promotions are returned for the caller to
/// apply with [`Record::promote`].
pub fn evaluate(
  record: &mut Record,
  policy: &ResolvedPolicy,
  now: DateTime<Utc>,
) -> Outcome {
  let display_name = record.display_name();
  let params = effective(policy, &display_name);

  if !record.in_exactly(params.promote_from) {
    return Outcome::NotEligible;
  }

  let dwell_start = match (record.dwell_start, record.creation_date) {
    (Some(start), _) => start,
    (None, Some(created)) => {
      tracing::info!(
        item = %display_name,
        "missing a last edit date; using creation date {created} and \
         assuming it has been in its current catalogs since then"
      );
      created
    }
    (None, None) => {
      tracing::info!(
        item = %display_name,
        "missing a creation date; setting the last edit date to now"
      );
      record.dwell_start = Some(now);
      // A dwell of zero or more days cannot have elapsed since `now`.
      return Outcome::Backfilled;
    }
  };

  let due = dwell_start
    .checked_add_signed(Duration::days(i64::from(params.days)));
  if due.is_some_and(|due| due < now) {
    tracing::debug!(
      item = %display_name,
      policy = %policy.name,
      "eligible for promotion"
    );
    Outcome::Eligible(Promotion {
      promote_to: params.promote_to.to_vec(),
      overridden: params.overridden,
    })
  } else {
    Outcome::NotEligible
  }
}
