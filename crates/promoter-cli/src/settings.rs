//! Runtime settings: built-in defaults, then `PROMOTER_*` environment
//! variables, then command-line flags.

use std::path::PathBuf;

use anyhow::Context as _;
use serde::Deserialize;

use crate::Args;

pub const DEFAULT_REPO_PATH: &str = "/Users/Shared/munki-repo/pkgsinfo";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// Root directory of the pkgsinfo tree.
  pub repo_path:     PathBuf,
  #[serde(default)]
  pub slack_webhook: Option<String>,
  #[serde(default)]
  pub markdown_path: Option<PathBuf>,
}

impl Settings {
  pub fn load(args: &Args) -> anyhow::Result<Self> {
    let layered: Self = config::Config::builder()
      .set_default("repo_path", DEFAULT_REPO_PATH)?
      .add_source(config::Environment::with_prefix("PROMOTER"))
      .build()
      .context("failed to read settings")?
      .try_deserialize()
      .context("failed to deserialise settings")?;
    Ok(layered.with_args(args))
  }

  fn with_args(mut self, args: &Args) -> Self {
    if let Some(repo) = &args.repo {
      self.repo_path = repo.clone();
    }
    if let Some(url) = &args.slack {
      self.slack_webhook = Some(url.clone());
    }
    if let Some(path) = &args.markdown {
      self.markdown_path = Some(path.clone());
    }
    self
  }
}

#[cfg(test)]
mod tests {
  use clap::Parser;

  use super::*;

  fn base() -> Settings {
    Settings {
      repo_path:     DEFAULT_REPO_PATH.into(),
      slack_webhook: Some("https://hooks.example/env".into()),
      markdown_path: None,
    }
  }

  #[test]
  fn flags_override_layered_values() {
    let args = Args::try_parse_from([
      "munki-promoter",
      "--repo",
      "/tmp/pkgsinfo",
      "--markdown",
      "changes.md",
    ])
    .unwrap();
    let settings = base().with_args(&args);
    assert_eq!(settings.repo_path, PathBuf::from("/tmp/pkgsinfo"));
    assert_eq!(settings.markdown_path, Some(PathBuf::from("changes.md")));
    assert_eq!(
      settings.slack_webhook.as_deref(),
      Some("https://hooks.example/env")
    );
  }
}
