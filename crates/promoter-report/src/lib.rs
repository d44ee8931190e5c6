//! Human-readable renderings of promotion results.
//!
//! Pure string and JSON building; writing files and sending webhooks is left
//! to the caller.
//!
//! # Quick start
//!
//! ```no_run
//! use promoter_core::batch::PromotionReport;
//!
//! let report = PromotionReport::default();
//! print!("{}", promoter_report::summary(&report.policies));
//! ```

mod console;
mod markdown;
mod slack;
mod text;

use promoter_core::{
  batch::PolicyReport,
  config::{ConfigSource, PolicyTable},
};

pub use text::and_join;

/// The confirmation text shown before promoted records are written.
pub fn summary(policies: &[PolicyReport]) -> String {
  policies.iter().map(console::describe).collect()
}

/// One line per policy: where it promotes from and to. Invalid policies are
/// listed after the valid ones.
pub fn list_policies(table: &PolicyTable, source: &ConfigSource) -> String {
  console::list_policies(table, source)
}

/// A Markdown change-log entry for the applied promotions.
pub fn markdown(policies: &[PolicyReport]) -> String {
  policies.iter().map(markdown::describe).collect()
}

/// A Slack Block Kit message announcing the applied promotions.
pub fn slack_message(policies: &[PolicyReport]) -> serde_json::Value {
  slack::message(policies)
}

// ─── Shared test helpers ──────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod test_helpers {
  use promoter_core::batch::{CustomPromotion, PolicyReport, PromotedItem};

  /// A staging → production report with two standard items and one custom
  /// item.
  pub(crate) fn staging_report() -> PolicyReport {
    PolicyReport {
      policy:     "staging".into(),
      promote_to: vec!["production".into()],
      standard:   vec![
        PromotedItem {
          name:    "Firefox".into(),
          version: "124.0".into(),
        },
        PromotedItem {
          name:    "Google Chrome".into(),
          version: "123.0.6312.86".into(),
        },
      ],
      custom:     vec![CustomPromotion {
        name:       "Zoom".into(),
        version:    "5.17.11".into(),
        promote_to: vec!["production".into(), "pilot".into()],
      }],
    }
  }
}
