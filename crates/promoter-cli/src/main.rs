//! `munki-promoter` — promote munki pkginfo records between catalogs once
//! they have dwelt long enough in their current ones.
//!
//! # Usage
//!
//! ```text
//! munki-promoter --list
//! munki-promoter --repo /Users/Shared/munki-repo/pkgsinfo
//! munki-promoter --promotion staging --auto --slack https://hooks.slack.com/...
//! munki-promoter --promotion staging --days-before-current-catalog 3
//! ```

mod notify;
mod prompt;
mod settings;

use std::{io, path::PathBuf};

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::Parser;
use promoter_core::{
  batch::Runner,
  config::PromoterConfig,
  dates::{EditDateMode, plan_edit_dates},
};
use promoter_store::FsRecordStore;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
  name = "munki-promoter",
  version,
  about = "Promote munki items between catalogs after a dwell period",
  after_help = "Do not run two instances against the same repository at \
                once; record files are rewritten in place."
)]
pub struct Args {
  /// Apply only this promotion instead of every configured one.
  #[arg(short, long, value_name = "NAME")]
  promotion: Option<String>,

  /// List the configured promotions and exit.
  #[arg(short, long)]
  list: bool,

  /// Root of the pkgsinfo tree [default: /Users/Shared/munki-repo/pkgsinfo].
  #[arg(short = 'm', long, value_name = "DIR")]
  repo: Option<PathBuf>,

  /// Promotion configuration file [default: config.yml, if present].
  #[arg(short = 'y', long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Slack incoming-webhook URL to notify after promoting.
  #[arg(short, long, env = "SLACK_WEBHOOK", value_name = "URL")]
  slack: Option<String>,

  /// Append a Markdown description of the promotions to this file.
  #[arg(long, value_name = "FILE")]
  markdown: Option<PathBuf>,

  /// Do not ask for confirmation.
  #[arg(short, long)]
  auto: bool,

  /// Set every item's edit date to now.
  #[arg(long, group = "edit_date")]
  reset_edit_date: bool,

  /// Set the edit date of items without one to now.
  #[arg(long, group = "edit_date")]
  set_unknown_edit_date: bool,

  /// For items in the promotion's source catalogs without an edit date, set
  /// it to their creation date plus this many days.
  #[arg(
    long,
    group = "edit_date",
    requires = "promotion",
    value_name = "DAYS"
  )]
  days_before_current_catalog: Option<u32>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let settings = Settings::load(&args)?;

  let (config, source) = PromoterConfig::load(args.config.as_deref())
    .context("failed to load promotion configuration")?;

  if args.list {
    print!(
      "{}",
      promoter_report::list_policies(&config.policies, &source)
    );
    return Ok(());
  }

  let store = FsRecordStore::open(&settings.repo_path).with_context(|| {
    format!("failed to open repository {}", settings.repo_path.display())
  })?;

  if let Some(mode) = edit_date_mode(&args, &config)? {
    return update_edit_dates(&store, &mode, &config, args.auto);
  }

  promote(&args, &settings, &store, &config).await
}

// ─── Modes ────────────────────────────────────────────────────────────────────

async fn promote(
  args: &Args,
  settings: &Settings,
  store: &FsRecordStore,
  config: &PromoterConfig,
) -> Result<()> {
  let runner = Runner::new(store, &config.selection, Utc::now());
  let report = match &args.promotion {
    Some(name) => runner.run_one(&config.policies, name),
    None => runner.run_all(&config.policies),
  }
  .context("promotion run failed")?;

  if !report.backfilled.is_empty() {
    tracing::info!(
      "recorded an initial edit date on {} items",
      report.backfilled.len()
    );
  }
  if !report.backfill_failed.is_empty() {
    tracing::warn!(
      "could not record an initial edit date on {} items",
      report.backfill_failed.len()
    );
  }
  if report.is_empty() {
    tracing::info!("no items are due for promotion");
    return Ok(());
  }

  print!("{}", promoter_report::summary(&report.policies));
  if !args.auto && !ask()? {
    tracing::info!("aborted");
    return Ok(());
  }

  let written = report
    .commit(store)
    .context("failed to write promoted items")?;
  tracing::info!("promoted {written} items");

  if let Some(path) = &settings.markdown_path {
    let entry = promoter_report::markdown(&report.policies);
    notify::append_markdown(path, &entry)?;
  }
  if let Some(url) = &settings.slack_webhook {
    let message = promoter_report::slack_message(&report.policies);
    notify::post_slack(url, &message).await?;
  }
  Ok(())
}

fn edit_date_mode(
  args: &Args,
  config: &PromoterConfig,
) -> Result<Option<EditDateMode>> {
  if args.reset_edit_date {
    return Ok(Some(EditDateMode::ResetAll));
  }
  if args.set_unknown_edit_date {
    return Ok(Some(EditDateMode::FillUnknown));
  }
  let Some(days_before) = args.days_before_current_catalog else {
    return Ok(None);
  };
  // clap enforces `--promotion` alongside this flag.
  let name = args.promotion.as_deref().unwrap_or_default();
  let policy = config
    .policies
    .resolve(name)
    .with_context(|| format!("cannot infer edit dates for \"{name}\""))?;
  Ok(Some(EditDateMode::InferFromCreation {
    policy,
    days_before,
  }))
}

fn update_edit_dates(
  store: &FsRecordStore,
  mode: &EditDateMode,
  config: &PromoterConfig,
  auto: bool,
) -> Result<()> {
  let plan = plan_edit_dates(store, mode, &config.selection, Utc::now())
    .context("failed to plan edit-date changes")?;
  if plan.is_empty() {
    tracing::info!("no items need a new edit date");
    return Ok(());
  }

  println!("The edit date of the following items will be updated:");
  for name in &plan.names {
    println!("{name}");
  }
  if !auto && !ask()? {
    tracing::info!("aborted");
    return Ok(());
  }

  let written = plan
    .commit(store)
    .context("failed to write edit dates")?;
  tracing::info!("updated the edit date of {written} items");
  Ok(())
}

fn ask() -> Result<bool> {
  prompt::confirm(io::stdin().lock(), io::stdout())
    .context("failed to read confirmation")
}
