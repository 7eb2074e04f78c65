use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod core;

use commands::migrate::MigrateArgs;

#[derive(Parser, Debug)]
#[command(name = "rehandle")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Replace an old GitHub username with a new one across all of your repositories",
    long_about = "Walks every repository the token can see, rewrites occurrences of the old \
                  username in text files and commits each changed file back with its own \
                  commit. Use --dry-run to see what would change first."
)]
struct Cli {
    /// Username to replace
    #[arg(short, long, env = "OLD_USERNAME", required_unless_present = "init_config")]
    old: Option<String>,

    /// Username to write in its place
    #[arg(short, long, env = "NEW_USERNAME", required_unless_present = "init_config")]
    new: Option<String>,

    /// GitHub personal access token
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Scan and report without committing anything
    #[arg(short, long)]
    dry_run: bool,

    /// Leave forked repositories untouched
    #[arg(long)]
    skip_forks: bool,

    /// Output format for the summary (text, json, markdown)
    #[arg(short = 'f', long, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Path to a config file (defaults to ./rehandle.toml, then ~/.config/rehandle/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the API base URL (GitHub Enterprise, local mocks)
    #[arg(long)]
    api_base: Option<String>,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Markdown,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "rehandle=debug,rehandle_cli=debug"
    } else {
        "rehandle=warn,rehandle_cli=warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // GITHUB_TOKEN / OLD_USERNAME / NEW_USERNAME may live in .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.init_config {
        return commands::init_config::run(cli.config);
    }

    let args = MigrateArgs {
        old: cli.old,
        new: cli.new,
        token: cli.token,
        dry_run: cli.dry_run,
        skip_forks: cli.skip_forks,
        verbose: cli.verbose,
        config: cli.config,
        api_base: cli.api_base,
    };

    commands::migrate::run(args, &cli.format).await
}
