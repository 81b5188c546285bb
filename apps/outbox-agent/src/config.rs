//! Agent configuration.
//!
//! Reads TOML at `~/.config/outbox/agent.toml` (or the path given with
//! `--config`). A missing file is created with defaults on first start so
//! there is always something to edit.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveTime;
use outbox_collector::{HttpTransportConfig, RetryPolicy};
use outbox_notify::WebhookConfig;
use outbox_sync::SyncConfig;
use outbox_transfer::{DEFAULT_CHUNK_SIZE, DigestAlgorithm};
use serde::{Deserialize, Serialize};

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Prefix for archive names. Defaults to the hostname.
    #[serde(default = "default_device_id")]
    pub device_id: String,
    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: PathBuf,
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_upload_path")]
    pub upload_path: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub digest: DigestAlgorithm,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub archive: ArchiveSection,
    #[serde(default)]
    pub schedule: ScheduleSection,
    #[serde(default)]
    pub log: LogSection,
    #[serde(default)]
    pub notify: NotifySection,
    #[serde(default)]
    pub auth: AuthSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub delay_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSection {
    /// Files per unit in the archive name's unit count.
    #[serde(default = "default_unit_divisor")]
    pub unit_divisor: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSection {
    /// Daily local wall-clock times, `"HH:MM"`.
    #[serde(default = "default_times")]
    pub times: Vec<String>,
    #[serde(default = "default_true")]
    pub run_at_start: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSection {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// Size in bytes at which the log file rolls over before midnight.
    #[serde(default = "default_max_log_file_size")]
    pub max_file_size: u64,
    /// Rolled-over log files kept before the oldest is deleted.
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotifySection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Chat user ids (not display names) mentioned in every notification.
    #[serde(default)]
    pub mentioned: Vec<String>,
    #[serde(default)]
    pub mention_all: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

fn default_device_id() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "outbox".into())
}

fn default_outbox_dir() -> PathBuf {
    home_dir().join("outbox")
}

fn default_server_url() -> String {
    "http://127.0.0.1:8080".into()
}

fn default_upload_path() -> String {
    outbox_collector::http::DEFAULT_UPLOAD_PATH.into()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_request_timeout_secs() -> u64 {
    outbox_collector::http::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_max_attempts() -> u32 {
    outbox_collector::retry::DEFAULT_MAX_ATTEMPTS
}

fn default_retry_delay_secs() -> u64 {
    outbox_collector::retry::DEFAULT_RETRY_DELAY.as_secs()
}

fn default_unit_divisor() -> usize {
    outbox_archive::DEFAULT_UNIT_DIVISOR
}

fn default_times() -> Vec<String> {
    vec!["15:00".into()]
}

fn default_true() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    data_base_dir().join("outbox").join("logs")
}

fn default_max_log_file_size() -> u64 {
    100 * 1024 * 1024
}

fn default_max_log_files() -> usize {
    7
}

fn default_log_filter() -> String {
    "info,outbox_collector=debug,outbox_sync=debug".into()
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_secs: default_retry_delay_secs(),
        }
    }
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            unit_divisor: default_unit_divisor(),
        }
    }
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            times: default_times(),
            run_at_start: true,
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            max_file_size: default_max_log_file_size(),
            max_files: default_max_log_files(),
            filter: default_log_filter(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            outbox_dir: default_outbox_dir(),
            server_url: default_server_url(),
            upload_path: default_upload_path(),
            chunk_size: default_chunk_size(),
            request_timeout_secs: default_request_timeout_secs(),
            digest: DigestAlgorithm::default(),
            retry: RetrySection::default(),
            archive: ArchiveSection::default(),
            schedule: ScheduleSection::default(),
            log: LogSection::default(),
            notify: NotifySection::default(),
            auth: AuthSection::default(),
        }
    }
}

impl AgentConfig {
    /// Loads `path`, writing a default file first if it does not exist.
    ///
    /// Returns the configuration and whether the file was just created.
    pub fn load_or_init(path: &Path) -> anyhow::Result<(Self, bool)> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok((config, true));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok((config, false))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write config file: {}", path.display()))?;
        set_permissions_0600(path);
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.device_id.trim().is_empty() {
            anyhow::bail!("device_id must not be empty");
        }
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            anyhow::bail!("server_url must start with http:// or https://");
        }
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be > 0");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be > 0");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be >= 1");
        }
        if self.archive.unit_divisor == 0 {
            anyhow::bail!("archive.unit_divisor must be >= 1");
        }
        if self.log.max_file_size == 0 {
            anyhow::bail!("log.max_file_size must be > 0");
        }
        if self.log.max_files == 0 {
            anyhow::bail!("log.max_files must be >= 1");
        }
        self.schedule_times()?;
        Ok(())
    }

    /// Parsed `schedule.times`.
    pub fn schedule_times(&self) -> anyhow::Result<Vec<NaiveTime>> {
        self.schedule
            .times
            .iter()
            .map(|t| {
                NaiveTime::parse_from_str(t.trim(), "%H:%M")
                    .with_context(|| format!("schedule.times: invalid time {t:?}, expected HH:MM"))
            })
            .collect()
    }

    pub fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::new(&self.device_id, &self.outbox_dir);
        config.chunk_size = self.chunk_size;
        config.retry = RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_secs(self.retry.delay_secs),
        );
        config.unit_divisor = self.archive.unit_divisor;
        config.digest = self.digest;
        config
    }

    pub fn transport_config(&self) -> HttpTransportConfig {
        let mut config = HttpTransportConfig::new(&self.server_url);
        config.upload_path = self.upload_path.clone();
        config.timeout = Duration::from_secs(self.request_timeout_secs);
        config.bearer_token = self.auth.bearer_token.clone();
        config
    }

    /// Webhook settings, if a webhook is configured.
    pub fn webhook_config(&self) -> Option<WebhookConfig> {
        let url = self.notify.webhook_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        let mut config = WebhookConfig::new(url);
        config.mentioned = self.notify.mentioned.clone();
        config.mention_all = self.notify.mention_all;
        Some(config)
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// Default config file location.
pub fn default_config_path() -> PathBuf {
    config_base_dir().join("outbox").join("agent.toml")
}

fn home_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        PathBuf::from(std::env::var("USERPROFILE").unwrap_or_else(|_| "C:\\Users\\Default".into()))
    }

    #[cfg(not(target_os = "windows"))]
    {
        PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".into()))
    }
}

fn config_base_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        PathBuf::from(
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into()),
        )
    }

    #[cfg(not(target_os = "windows"))]
    {
        home_dir().join(".config")
    }
}

fn data_base_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        PathBuf::from(
            std::env::var("LOCALAPPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into()),
        )
    }

    #[cfg(not(target_os = "windows"))]
    {
        home_dir().join(".local").join("share")
    }
}
