use anyhow::{Context, Result};
use chrono::Local;
use rehandle::{
    Config, GitHubClient, Orchestrator, Pacer, RehandleError, RunOptions, RunReport,
    UsernamePair,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::core::output::OutputWriter;
use crate::core::reporter::ConsoleReporter;

pub struct MigrateArgs {
    pub old: Option<String>,
    pub new: Option<String>,
    pub token: Option<String>,
    pub dry_run: bool,
    pub skip_forks: bool,
    pub verbose: bool,
    pub config: Option<PathBuf>,
    pub api_base: Option<String>,
}

pub async fn run(args: MigrateArgs, format: &crate::OutputFormat) -> Result<()> {
    // Both usernames are checked before anything touches the network
    let old = args
        .old
        .context("Old username is required (--old or OLD_USERNAME)")?;
    let new = args
        .new
        .context("New username is required (--new or NEW_USERNAME)")?;
    let usernames = UsernamePair::new(&old, &new)?;

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(api_base) = args.api_base {
        config.github.api_base = api_base;
    }
    config.github.token = Some(resolve_token(args.token, config.github.token.take())?);

    let pacer = Pacer::tokio(config.pacing.clone());
    let client =
        GitHubClient::from_config(&config, pacer.clone()).context("Failed to create GitHub client")?;

    let options = RunOptions::new(usernames)
        .dry_run(args.dry_run)
        .include_forks(!args.skip_forks);
    let reporter = Arc::new(ConsoleReporter::new(args.verbose));
    let orchestrator = Orchestrator::new(Arc::new(client), options, pacer, reporter.clone());

    if args.dry_run {
        eprintln!("🔍 Dry run: nothing will be committed");
    }
    eprintln!("Replacing \"{}\" with \"{}\"", old, new);

    let start = Instant::now();
    let report = drive(&orchestrator, &reporter).await.map_err(explain)?;
    tracing::debug!("Run finished in {:?}", start.elapsed());

    OutputWriter::new(format).write_report(&report)?;

    if *format == crate::OutputFormat::Text {
        println!("\nFinished in {:.1}s", start.elapsed().as_secs_f64());
        if report.dry_run && report.stats.updated > 0 {
            println!("💡 Run without --dry-run to commit these changes");
        }
    }

    Ok(())
}

/// Run the batch; the progress bar is cleared whether or not it succeeds.
async fn drive(
    orchestrator: &Orchestrator,
    reporter: &ConsoleReporter,
) -> Result<RunReport, RehandleError> {
    let outcome = orchestrator.run().await;
    reporter.finish();
    outcome
}

/// `--token` / GITHUB_TOKEN first (clap folds the two together), then the config file.
fn resolve_token(flag: Option<String>, configured: Option<String>) -> Result<String, RehandleError> {
    flag.into_iter()
        .chain(configured)
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
        .ok_or(RehandleError::MissingToken)
}

fn explain(err: RehandleError) -> anyhow::Error {
    let context = match &err {
        RehandleError::RateLimited { reset_in_secs } => {
            let reset_at = i64::try_from(*reset_in_secs)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .and_then(|wait| Local::now().checked_add_signed(wait));
            match reset_at {
                Some(at) => format!(
                    "GitHub rate limit exhausted; quota resets around {}",
                    at.format("%H:%M:%S")
                ),
                None => "GitHub rate limit exhausted; reset time is out of range".to_string(),
            }
        }
        RehandleError::Auth(_) => "Could not authenticate with GitHub".to_string(),
        _ => "Username migration aborted".to_string(),
    };

    anyhow::Error::new(err).context(context)
}
