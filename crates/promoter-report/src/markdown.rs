//! Markdown change-log entries.

use std::fmt::Write as _;

use promoter_core::batch::PolicyReport;

use crate::text::{and_join, catalog_noun};

pub(crate) fn describe(report: &PolicyReport) -> String {
  let mut out = format!("Applied promotion \"{}\".\n", report.policy);

  if !report.standard.is_empty() {
    let _ = writeln!(
      out,
      "The following items have been automatically promoted to Munki {} {}:",
      and_join(&report.promote_to),
      catalog_noun(report.promote_to.len())
    );
    for item in &report.standard {
      let _ = writeln!(out, "- {}: {}", item.name, item.version);
    }
  }

  if !report.custom.is_empty() {
    out.push_str(
      "The following custom items have been automatically promoted:\n",
    );
    for item in &report.custom {
      let _ = writeln!(
        out,
        "- {}: {} (promoted to Munki {} {})",
        item.name,
        item.version,
        and_join(&item.promote_to),
        catalog_noun(item.promote_to.len())
      );
    }
  }

  out.push('\n');
  out
}
