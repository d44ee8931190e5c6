//! Post-commit notifications: the Markdown change log and the Slack webhook.

use std::{fs::OpenOptions, io::Write as _, path::Path, time::Duration};

use anyhow::{Context as _, Result, anyhow};
use reqwest::Client;

/// Append `entry` to the Markdown file at `path`, creating it if needed.
pub fn append_markdown(path: &Path, entry: &str) -> Result<()> {
  let mut file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("failed to open {}", path.display()))?;
  file
    .write_all(entry.as_bytes())
    .with_context(|| format!("failed to write {}", path.display()))?;
  tracing::info!("appended promotion log to {}", path.display());
  Ok(())
}

/// POST a Block Kit message to a Slack incoming webhook.
pub async fn post_slack(url: &str, message: &serde_json::Value) -> Result<()> {
  let client = Client::builder()
    .timeout(Duration::from_secs(30))
    .build()
    .context("failed to build HTTP client")?;

  let resp = client
    .post(url)
    .json(message)
    .send()
    .await
    .context("Slack webhook request failed")?;
  if !resp.status().is_success() {
    return Err(anyhow!("Slack webhook → {}", resp.status()));
  }
  tracing::info!("sent Slack notification");
  Ok(())
}
