//! Plain-text output for the terminal.

use std::fmt::Write as _;

use promoter_core::{
  batch::PolicyReport,
  config::{ConfigSource, PolicyDefect, PolicyTable},
};

use crate::text::{and_join, pad};

const RULE: &str = "------------------------------------------------------------\
                    ------------------------";

pub(crate) fn describe(report: &PolicyReport) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "\n{RULE}");
  let _ = writeln!(out, "{:>24}Applying promotion \"{}\"", "", report.policy);
  let _ = writeln!(
    out,
    "   Promoting the catalogs of the following pkgsinfo files to {}",
    and_join(&report.promote_to)
  );
  let _ = writeln!(out, "{RULE}");

  let names: Vec<&str> =
    report.standard.iter().map(|i| i.name.as_str()).collect();
  for (name, item) in pad(&names).iter().zip(&report.standard) {
    let _ = writeln!(out, "{name} - {}", item.version);
  }

  if !report.custom.is_empty() {
    out.push_str(
      "The following pkgsinfo files are custom items that impact which \
       catalog they will be promoted to:\n",
    );
    let names: Vec<&str> =
      report.custom.iter().map(|i| i.name.as_str()).collect();
    let versions: Vec<&str> =
      report.custom.iter().map(|i| i.version.as_str()).collect();
    for ((name, version), item) in
      pad(&names).iter().zip(pad(&versions)).zip(&report.custom)
    {
      let _ = writeln!(
        out,
        "{name} - {version} - will be promoted to {}",
        and_join(&item.promote_to)
      );
    }
  }
  out
}

pub(crate) fn list_policies(
  table: &PolicyTable,
  source: &ConfigSource,
) -> String {
  if table.is_empty() {
    return format!(
      "No promotions are currently defined. Promotions can be configured in \
       {source}.\n"
    );
  }

  let mut valid = Vec::new();
  let mut invalid = Vec::new();
  for entry in table.entries() {
    match &entry.spec {
      Ok(spec) => {
        let from = spec
          .promote_from
          .as_deref()
          .map(and_join)
          .unwrap_or_else(|| entry.name.clone());
        valid.push((entry.name.as_str(), from, and_join(&spec.promote_to)));
      }
      Err(defect) => invalid.push((entry.name.as_str(), defect)),
    }
  }

  let names: Vec<&str> = valid
    .iter()
    .map(|(name, ..)| *name)
    .chain(invalid.iter().map(|(name, _)| *name))
    .collect();
  let names = pad(&names);
  let froms: Vec<&str> =
    valid.iter().map(|(_, from, _)| from.as_str()).collect();
  let froms = pad(&froms);

  let mut out = String::new();
  for ((name, from), (_, _, to)) in names.iter().zip(&froms).zip(&valid) {
    let _ = writeln!(out, "{name} : promotes from {from} to {to}");
  }
  for (name, (policy, defect)) in names[valid.len()..].iter().zip(&invalid) {
    let problem = match defect {
      PolicyDefect::MissingPromoteTo => format!(
        "which catalog(s) promotion \"{policy}\" promotes to is undefined"
      ),
      PolicyDefect::InvalidDays(value) => {
        format!("days_in_catalog is not a valid number of days ({value})")
      }
    };
    let _ = writeln!(
      out,
      "{name} : improperly defined! {problem}. Promotions can be configured \
       in {source}."
    );
  }
  out
}
