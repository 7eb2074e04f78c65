use anyhow::Result;
use rehandle::processor::Bucket;
use rehandle::{RepositoryReport, RunReport};
use std::fmt::Write;

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: &crate::OutputFormat) -> Self {
        let format = match format {
            crate::OutputFormat::Text => OutputFormat::Text,
            crate::OutputFormat::Json => OutputFormat::Json,
            crate::OutputFormat::Markdown => OutputFormat::Markdown,
        };
        Self { format }
    }

    pub fn write_report(&self, report: &RunReport) -> Result<()> {
        println!("{}", self.render_report(report)?);
        Ok(())
    }

    pub fn render_report(&self, report: &RunReport) -> Result<String> {
        let mut out = String::new();

        match self.format {
            OutputFormat::Json => {
                out.push_str(&serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Text => {
                let mode = if report.dry_run { " (dry-run)" } else { "" };
                writeln!(out, "✓ Username migration complete{}", mode)?;
                writeln!(
                    out,
                    "  {} → {} (authenticated as {})",
                    report.old_username, report.new_username, report.login
                )?;
                writeln!(out, "  Repositories: {}", report.stats.total_repos)?;
                writeln!(out, "  Updated: {}", report.stats.updated)?;
                writeln!(out, "  Skipped: {}", report.stats.skipped)?;
                writeln!(out, "  Failed: {}", report.stats.failed)?;
                writeln!(out, "  Files changed: {}", report.stats.files_changed)?;
                write!(out, "  Replacements made: {}", report.stats.total_replacements)?;

                let updated = in_bucket(report, Bucket::Updated);
                if !updated.is_empty() {
                    write!(out, "\n\nUpdated repositories:")?;
                    for repo in updated {
                        write!(out, "\n  • {}: {}", repo.full_name, repo.outcome)?;
                        for file in &repo.changed_files {
                            write!(out, "\n      {} ({})", file.path, file.count)?;
                        }
                    }
                }

                let failed = in_bucket(report, Bucket::Failed);
                if !failed.is_empty() {
                    write!(out, "\n\nFailed repositories:")?;
                    for repo in failed {
                        write!(out, "\n  ⚠️  {}: {}", repo.full_name, repo.outcome)?;
                    }
                }
            }
            OutputFormat::Markdown => {
                writeln!(
                    out,
                    "# Username migration: `{}` → `{}`\n",
                    report.old_username, report.new_username
                )?;
                if report.dry_run {
                    writeln!(out, "_Dry run: nothing was committed._\n")?;
                }
                writeln!(out, "| Metric | Count |")?;
                writeln!(out, "|--------|-------|")?;
                writeln!(out, "| Repositories | {} |", report.stats.total_repos)?;
                writeln!(out, "| Updated | {} |", report.stats.updated)?;
                writeln!(out, "| Skipped | {} |", report.stats.skipped)?;
                writeln!(out, "| Failed | {} |", report.stats.failed)?;
                writeln!(out, "| Files changed | {} |", report.stats.files_changed)?;
                write!(
                    out,
                    "| Replacements | {} |",
                    report.stats.total_replacements
                )?;

                if !report.repositories.is_empty() {
                    write!(out, "\n\n## Repositories\n")?;
                    for repo in &report.repositories {
                        write!(out, "\n- **{}**: {}", repo.full_name, repo.outcome)?;
                        for file in &repo.changed_files {
                            write!(out, "\n  - `{}` ({} replacement(s))", file.path, file.count)?;
                        }
                    }
                }
            }
        }

        Ok(out)
    }
}

fn in_bucket(report: &RunReport, bucket: Bucket) -> Vec<&RepositoryReport> {
    report
        .repositories
        .iter()
        .filter(|r| r.outcome.bucket() == bucket)
        .collect()
}
