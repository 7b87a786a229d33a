use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::counter::default_counter_path;
use crate::usage::{
    Pricing, UsageBudget, UsageCalculator, DEFAULT_COST_PER_THOUSAND_USD, DEFAULT_TOTAL_TOKENS,
};

/// Environment variable consulted when no gateway token is configured
pub const GATEWAY_TOKEN_ENV: &str = "TOKENTRACK_GATEWAY_TOKEN";

/// Command line arguments
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Token usage monitor")]
pub struct Config {
    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Where to read the token count from
    #[arg(short, long, value_enum)]
    pub source: Option<SourceKind>,

    /// Refresh interval in milliseconds
    #[arg(short = 'i', long)]
    pub interval: Option<u64>,

    /// Path to the counter file (file source)
    #[arg(long)]
    pub counter_file: Option<PathBuf>,

    /// Gateway base URL (remote source)
    #[arg(long)]
    pub gateway_url: Option<String>,
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Where samples come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Local counter file written by `update_tokens`
    #[default]
    File,
    /// Gateway JSON-RPC `session.status`
    Remote,
}

/// Application settings (from config file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Count source
    #[serde(default)]
    pub source: SourceKind,

    /// Refresh interval override in milliseconds (source default when unset)
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    /// Budget and pricing
    #[serde(default)]
    pub budget: BudgetSettings,

    /// Gateway connection (remote source)
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Counter file (file source and `update_tokens`)
    #[serde(default)]
    pub counter: CounterSettings,

    /// UI settings
    #[serde(default)]
    pub ui: UiSettings,
}

/// Budget settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSettings {
    /// Token ceiling the percentage is computed against
    #[serde(default = "default_total_tokens")]
    pub total_tokens: u64,

    /// Flat USD rate per 1000 tokens
    #[serde(default = "default_cost_per_thousand")]
    pub cost_per_thousand_usd: f64,
}

fn default_total_tokens() -> u64 {
    DEFAULT_TOTAL_TOKENS
}

fn default_cost_per_thousand() -> f64 {
    DEFAULT_COST_PER_THOUSAND_USD
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            total_tokens: default_total_tokens(),
            cost_per_thousand_usd: default_cost_per_thousand(),
        }
    }
}

/// Gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Base URL; `/v1/rpc` is appended
    #[serde(default = "default_gateway_url")]
    pub base_url: String,

    /// Bearer token (falls back to `TOKENTRACK_GATEWAY_TOKEN`)
    #[serde(default)]
    pub token: Option<String>,

    /// Session whose status is queried
    #[serde(default = "default_session_key")]
    pub session_key: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_gateway_timeout")]
    pub timeout_ms: u64,
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:18789".to_string()
}

fn default_session_key() -> String {
    "agent:main:main".to_string()
}

fn default_gateway_timeout() -> u64 {
    5000
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
            token: None,
            session_key: default_session_key(),
            timeout_ms: default_gateway_timeout(),
        }
    }
}

impl GatewaySettings {
    /// Configured token, else the environment variable; empty values count as unset
    pub fn bearer_token(&self) -> Option<String> {
        self.token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(GATEWAY_TOKEN_ENV).ok().filter(|t| !t.is_empty()))
    }
}

/// Counter file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterSettings {
    /// Counter file path
    #[serde(default = "default_counter_path")]
    pub path: PathBuf,
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            path: default_counter_path(),
        }
    }
}

/// UI-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiSettings {
    /// Title shown at the top of the panel
    #[serde(default = "default_title")]
    pub title: String,

    /// Enable color output
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_title() -> String {
    "Token Usage".to_string()
}

fn default_color() -> bool {
    true
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            title: default_title(),
            color: default_color(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(p) = path {
            if !p.exists() {
                bail!("Config file not found: {:?}", p);
            }
            return Self::load_file(p);
        }

        let default_paths = [
            dirs::config_dir().map(|p| p.join("tokentrack/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/tokentrack/config.toml")),
            dirs::home_dir().map(|p| p.join(".tokentrack.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_file(path);
            }
        }

        Ok(Self::default())
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(source) = cli.source {
            self.source = source;
        }
        if let Some(interval) = cli.interval {
            self.poll_interval_ms = Some(interval);
        }
        if let Some(ref path) = cli.counter_file {
            self.counter.path = path.clone();
        }
        if let Some(ref url) = cli.gateway_url {
            self.gateway.base_url = url.clone();
        }
    }

    /// Validate and normalize settings values
    ///
    /// Rejects a zero budget and invalid rates; raises intervals and
    /// timeouts to a floor.
    pub fn validate(&mut self) -> Result<()> {
        const MIN_POLL_INTERVAL: u64 = 100;
        const MIN_TIMEOUT: u64 = 100;

        UsageBudget::new(self.budget.total_tokens).context("Invalid [budget] total_tokens")?;
        Pricing::new(self.budget.cost_per_thousand_usd)
            .context("Invalid [budget] cost_per_thousand_usd")?;

        if let Some(ms) = self.poll_interval_ms {
            self.poll_interval_ms = Some(ms.max(MIN_POLL_INTERVAL));
        }
        if self.gateway.timeout_ms < MIN_TIMEOUT {
            self.gateway.timeout_ms = MIN_TIMEOUT;
        }
        Ok(())
    }

    /// Calculator for the configured budget and rate
    pub fn calculator(&self) -> Result<UsageCalculator> {
        let budget = UsageBudget::new(self.budget.total_tokens)?;
        let pricing = Pricing::new(self.budget.cost_per_thousand_usd)?;
        Ok(UsageCalculator::new(budget, pricing))
    }

    /// Refresh period: the override if set, else the source's default
    pub fn poll_interval(&self, source_default: Duration) -> Duration {
        self.poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(source_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.source, SourceKind::File);
        assert_eq!(settings.budget.total_tokens, 200_000);
        assert_eq!(settings.budget.cost_per_thousand_usd, 0.01);
        assert_eq!(settings.gateway.base_url, "http://127.0.0.1:18789");
        assert_eq!(settings.gateway.session_key, "agent:main:main");
        assert_eq!(settings.gateway.timeout_ms, 5000);
        assert!(settings.poll_interval_ms.is_none());
        assert!(settings.counter.path.ends_with("token_count.json"));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            source = "remote"
            poll_interval_ms = 3000

            [budget]
            total_tokens = 1000000

            [gateway]
            base_url = "http://localhost:9000"
            token = "abc"

            [ui]
            title = "crypticClaw"
        "#;

        let settings: Settings = toml::from_str(toml).expect("Should parse TOML");
        assert_eq!(settings.source, SourceKind::Remote);
        assert_eq!(settings.poll_interval_ms, Some(3000));
        assert_eq!(settings.budget.total_tokens, 1_000_000);
        assert_eq!(settings.budget.cost_per_thousand_usd, 0.01);
        assert_eq!(settings.gateway.base_url, "http://localhost:9000");
        assert_eq!(settings.gateway.session_key, "agent:main:main");
        assert_eq!(settings.ui.title, "crypticClaw");
        assert!(settings.ui.color);
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut settings = Settings::default();
        settings.budget.total_tokens = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_rate() {
        let mut settings = Settings::default();
        settings.budget.cost_per_thousand_usd = -1.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_clamps_intervals() {
        let mut settings = Settings {
            poll_interval_ms: Some(0),
            ..Settings::default()
        };
        settings.gateway.timeout_ms = 0;
        settings.validate().unwrap();
        assert_eq!(settings.poll_interval_ms, Some(100));
        assert_eq!(settings.gateway.timeout_ms, 100);
    }

    #[test]
    fn test_poll_interval_override() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.poll_interval(Duration::from_secs(2)),
            Duration::from_secs(2)
        );
        settings.poll_interval_ms = Some(750);
        assert_eq!(
            settings.poll_interval(Duration::from_secs(2)),
            Duration::from_millis(750)
        );
    }

    #[test]
    fn test_merge_cli() {
        let cli = Config::parse_from([
            "tokentrack",
            "--source",
            "remote",
            "-i",
            "500",
            "--counter-file",
            "/tmp/count.json",
            "--gateway-url",
            "http://10.0.0.2:18789",
        ]);
        let mut settings = Settings::default();
        settings.merge_cli(&cli);

        assert_eq!(settings.source, SourceKind::Remote);
        assert_eq!(settings.poll_interval_ms, Some(500));
        assert_eq!(settings.counter.path, PathBuf::from("/tmp/count.json"));
        assert_eq!(settings.gateway.base_url, "http://10.0.0.2:18789");
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[budget]\ntotal_tokens = 5000").unwrap();

        let settings = Settings::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(settings.budget.total_tokens, 5000);
    }

    #[test]
    fn test_load_missing_explicit_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_invalid_toml_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "source = [").unwrap();
        assert!(Settings::load(Some(&file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_bearer_token_prefers_config() {
        temp_env::with_var(GATEWAY_TOKEN_ENV, Some("from-env"), || {
            let gateway = GatewaySettings {
                token: Some("from-config".to_string()),
                ..GatewaySettings::default()
            };
            assert_eq!(gateway.bearer_token().as_deref(), Some("from-config"));
        });
    }

    #[test]
    fn test_bearer_token_from_env() {
        temp_env::with_var(GATEWAY_TOKEN_ENV, Some("from-env"), || {
            let gateway = GatewaySettings {
                token: Some(String::new()),
                ..GatewaySettings::default()
            };
            assert_eq!(gateway.bearer_token().as_deref(), Some("from-env"));
        });
    }

    #[test]
    fn test_bearer_token_unset() {
        temp_env::with_var_unset(GATEWAY_TOKEN_ENV, || {
            assert!(GatewaySettings::default().bearer_token().is_none());
        });
    }
}
