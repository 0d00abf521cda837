use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Origin the page would have been loaded from, e.g. `http://localhost:11235`.
    /// Its scheme picks `ws:` or `wss:` for the stream.
    pub origin: String,
    /// Id of the table body element rows are appended to.
    #[serde(default = "default_table_id")]
    pub table_id: String,
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,
    /// How often to log session stats (batches applied/dropped, reconnects, rows) at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

fn default_table_id() -> String {
    "stats".into()
}

fn default_resolve_timeout_ms() -> u64 {
    5000
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

/// Exponential backoff used when the stream drops.
#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    pub enabled: bool,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

impl ReconnectConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Clear the terminal before each redraw.
    pub clear_screen: bool,
    /// Rows not refreshed for this long are marked stale; 0 disables marking.
    pub stale_after_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            clear_screen: true,
            stale_after_secs: 30,
        }
    }
}

impl DisplayConfig {
    pub fn stale_after(&self) -> Option<Duration> {
        (self.stale_after_secs > 0).then(|| Duration::from_secs(self.stale_after_secs))
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {}", path, e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let origin = self.monitor.origin.as_str();
        anyhow::ensure!(
            origin.starts_with("http://") || origin.starts_with("https://"),
            "monitor.origin must be an http:// or https:// URL, got {:?}",
            origin
        );
        anyhow::ensure!(
            !self.monitor.table_id.is_empty(),
            "monitor.table_id must be non-empty"
        );
        anyhow::ensure!(
            self.monitor.resolve_timeout_ms > 0,
            "monitor.resolve_timeout_ms must be > 0, got {}",
            self.monitor.resolve_timeout_ms
        );
        anyhow::ensure!(
            self.monitor.stats_log_interval_secs > 0,
            "monitor.stats_log_interval_secs must be > 0, got {}",
            self.monitor.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.reconnect.initial_delay_ms > 0,
            "reconnect.initial_delay_ms must be > 0, got {}",
            self.reconnect.initial_delay_ms
        );
        anyhow::ensure!(
            self.reconnect.max_delay_ms >= self.reconnect.initial_delay_ms,
            "reconnect.max_delay_ms must be >= reconnect.initial_delay_ms, got {} < {}",
            self.reconnect.max_delay_ms,
            self.reconnect.initial_delay_ms
        );
        anyhow::ensure!(
            self.reconnect.multiplier >= 1.0,
            "reconnect.multiplier must be >= 1.0, got {}",
            self.reconnect.multiplier
        );
        Ok(())
    }
}
