use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for rehandle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// GitHub API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Base URL for the REST API (e.g., "https://api.github.com")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Personal access token; usually supplied via GITHUB_TOKEN instead
    #[serde(default)]
    pub token: Option<String>,

    /// Repositories requested per listing page (GitHub caps this at 100)
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Fixed pauses between requests, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Between repository listing pages
    #[serde(default = "default_listing_ms")]
    pub listing_ms: u64,

    /// After each file read
    #[serde(default = "default_file_read_ms")]
    pub file_read_ms: u64,

    /// After each commit
    #[serde(default = "default_commit_ms")]
    pub commit_ms: u64,

    /// Between two repositories
    #[serde(default = "default_repository_ms")]
    pub repository_ms: u64,
}

/// Behaviour once GitHub reports an exhausted quota
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// How many times a rate-limited request is retried after waiting
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Extra wait added on top of the reported reset time
    #[serde(default = "default_safety_margin_ms")]
    pub safety_margin_ms: u64,

    /// Longest reset wait worth sleeping through; anything longer gives up
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

// Default value functions
fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_per_page() -> u32 {
    100
}

fn default_user_agent() -> String {
    format!("rehandle/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_listing_ms() -> u64 {
    1500
}

fn default_file_read_ms() -> u64 {
    300
}

fn default_commit_ms() -> u64 {
    500
}

fn default_repository_ms() -> u64 {
    1500
}

fn default_max_retries() -> u32 {
    3
}

fn default_safety_margin_ms() -> u64 {
    1000
}

fn default_max_wait_secs() -> u64 {
    3600
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: None,
            per_page: default_per_page(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            listing_ms: default_listing_ms(),
            file_read_ms: default_file_read_ms(),
            commit_ms: default_commit_ms(),
            repository_ms: default_repository_ms(),
        }
    }
}

impl PacingConfig {
    /// No pauses at all; used by tests and mock servers.
    pub fn none() -> Self {
        Self {
            listing_ms: 0,
            file_read_ms: 0,
            commit_ms: 0,
            repository_ms: 0,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            safety_margin_ms: default_safety_margin_ms(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

impl RetryConfig {
    pub fn safety_margin(&self) -> Duration {
        Duration::from_millis(self.safety_margin_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl Config {
    /// Load configuration.
    ///
    /// With an explicit `path`, only that file is read and it must exist.
    /// Otherwise both of these are layered over the defaults, later keys
    /// overriding earlier ones:
    /// 1. `~/.config/rehandle/config.toml`
    /// 2. `./rehandle.toml`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            tracing::info!("Loading config from: {}", path.display());
            return Self::load_from_file(path);
        }

        let layers: Vec<PathBuf> = Self::global_config_path()
            .into_iter()
            .chain(std::iter::once(Self::project_config_path()))
            .filter(|p| p.exists())
            .collect();

        if layers.is_empty() {
            tracing::debug!("No config file found, using defaults");
            return Ok(Config::default());
        }

        Self::load_layered(&layers)
    }

    /// Load config from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::load_layered(&[path.to_path_buf()])
    }

    /// Merge the given files key by key, in order, then apply defaults.
    pub fn load_layered(paths: &[PathBuf]) -> Result<Self> {
        let mut merged = toml::Table::new();

        for path in paths {
            tracing::info!("Loading config from: {}", path.display());
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let table: toml::Table = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            merge_tables(&mut merged, table);
        }

        let config: Config = toml::Value::Table(merged)
            .try_into()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.github.per_page == 0 || self.github.per_page > 100 {
            anyhow::bail!(
                "github.per_page must be between 1 and 100, got {}",
                self.github.per_page
            );
        }
        url::Url::parse(&self.github.api_base)
            .with_context(|| format!("Invalid github.api_base: {}", self.github.api_base))?;
        Ok(())
    }

    /// Get the global config path (~/.config/rehandle/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("rehandle").join("config.toml"))
    }

    /// Get the project config path (./rehandle.toml in current directory)
    pub fn project_config_path() -> PathBuf {
        PathBuf::from("rehandle.toml")
    }

    /// Create a default config file at the specified path
    pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Config::default();
        let toml_string =
            toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        fs::write(path.as_ref(), toml_string)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(nested) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, nested),
                _ => {
                    base.insert(key, toml::Value::Table(nested));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}
