//! Slack Block Kit payloads.

use promoter_core::batch::PolicyReport;
use serde_json::{Value, json};

use crate::text::{and_join, catalog_noun};

const FOOTER: &str = ":monkey_face: This message brought to you by \
                      <https://github.com/jc0b/munki-promoter|munki-promoter>.";

pub(crate) fn message(policies: &[PolicyReport]) -> Value {
  let mut blocks = vec![json!({
    "type": "header",
    "text": {
      "type": "plain_text",
      "text": "New items automatically promoted in Munki",
      "emoji": true,
    },
  })];

  for report in policies {
    blocks.extend(policy_blocks(report));
    blocks.push(divider());
  }

  blocks.push(json!({
    "type": "context",
    "elements": [{ "type": "mrkdwn", "text": FOOTER }],
  }));
  blocks.push(divider());

  json!({ "blocks": blocks })
}

fn policy_blocks(report: &PolicyReport) -> Vec<Value> {
  let mut blocks = vec![section(json!({
    "type": "text",
    "text": format!("Applied promotion \"{}\".", report.policy),
    "style": { "bold": true },
  }))];

  if !report.standard.is_empty() {
    blocks.push(section(text(format!(
      "The following items have been promoted to Munki {} {}:",
      and_join(&report.promote_to),
      catalog_noun(report.promote_to.len())
    ))));
    blocks.push(bullets(
      report
        .standard
        .iter()
        .map(|item| format!("{} - {}\n", item.name, item.version)),
    ));
  }

  if !report.custom.is_empty() {
    blocks.push(section(text(
      "The following custom items have been promoted:".to_string(),
    )));
    blocks.push(bullets(report.custom.iter().map(|item| {
      format!(
        "{} - {} - promoted to Munki {} {}\n",
        item.name,
        item.version,
        and_join(&item.promote_to),
        catalog_noun(item.promote_to.len())
      )
    })));
  }

  blocks
}

fn text(s: String) -> Value { json!({ "type": "text", "text": s }) }

fn divider() -> Value { json!({ "type": "divider" }) }

/// A rich-text block holding a single section.
fn section(element: Value) -> Value {
  json!({
    "type": "rich_text",
    "elements": [{ "type": "rich_text_section", "elements": [element] }],
  })
}

/// A rich-text block holding a bullet list with one entry per line.
fn bullets(lines: impl Iterator<Item = String>) -> Value {
  let items: Vec<Value> = lines
    .map(|line| {
      json!({ "type": "rich_text_section", "elements": [text(line)] })
    })
    .collect();
  json!({
    "type": "rich_text",
    "elements": [{
      "type": "rich_text_list",
      "style": "bullet",
      "indent": 0,
      "border": 0,
      "elements": items,
    }],
  })
}
