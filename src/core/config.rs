//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.noteterm/config.toml`. If missing on first run, a
//! commented-out default is generated so operators can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NotetermConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub splash_seconds: Option<u64>,
    pub effect_timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub listen: Option<String>,
    pub max_sessions: Option<usize>,
    pub handshake_timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StoreConfig {
    pub backend: Option<StoreBackend>,
    pub sqlite_path: Option<String>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ThemeConfig {
    pub accent: Option<String>,
    pub text: Option<String>,
    pub border: Option<String>,
    pub muted: Option<String>,
    pub list_margin_x: Option<u16>,
    pub list_margin_y: Option<u16>,
    pub banner: Option<String>,
    pub app_name: Option<String>,
}

/// Which persistence backend the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Http,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "http" => Ok(StoreBackend::Http),
            other => Err(ConfigError::Invalid(format!(
                "unknown store backend '{other}' (expected sqlite or http)"
            ))),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Sqlite => f.write_str("sqlite"),
            StoreBackend::Http => f.write_str("http"),
        }
    }
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_SPLASH_SECONDS: u64 = 5;
pub const DEFAULT_EFFECT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_LISTEN: &str = "127.0.0.1:2323";
pub const DEFAULT_MAX_SESSIONS: usize = 64;
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_ACCENT: &str = "#7571F9";
pub const DEFAULT_TEXT: &str = "#E0DEFF";
pub const DEFAULT_BORDER: &str = "#444444";
pub const DEFAULT_MUTED: &str = "#8A8A9E";
pub const DEFAULT_LIST_MARGIN_X: u16 = 10;
pub const DEFAULT_LIST_MARGIN_Y: u16 = 4;
pub const DEFAULT_APP_NAME: &str = "noteterm";

pub const DEFAULT_BANNER: &str = "\
██╗      ██████╗  ██████╗ ██╗███╗   ██╗
██║     ██╔═══██╗██╔════╝ ██║████╗  ██║
██║     ██║   ██║██║  ███╗██║██╔██╗ ██║
██║     ██║   ██║██║   ██║██║██║╚██╗██║
███████╗╚██████╔╝╚██████╔╝██║██║ ╚████║
╚══════╝ ╚═════╝  ╚═════╝ ╚═╝╚═╝  ╚═══╝";

// ============================================================================
// Resolved Config (concrete values)
// ============================================================================

/// Final settings. Only secrets, the HTTP endpoint and the optional
/// effect timeout stay optional.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub splash_dwell: Duration,
    /// `None` when `effect_timeout_seconds = 0`.
    pub effect_timeout: Option<Duration>,
    pub listen: String,
    pub max_sessions: usize,
    pub handshake_timeout: Duration,
    pub store: StoreBackend,
    pub sqlite_path: PathBuf,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub theme: ThemeSettings,
}

/// Theme values as configured; colors are parsed by the TUI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeSettings {
    pub accent: String,
    pub text: String,
    pub border: String,
    pub muted: String,
    pub list_margin_x: u16,
    pub list_margin_y: u16,
    pub banner: String,
    pub app_name: String,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        resolve_theme(&ThemeConfig::default())
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.noteterm`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".noteterm"))
}

/// Returns the path to `~/.noteterm/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.noteterm/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `NotetermConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<NotetermConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(NotetermConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(NotetermConfig::default());
    }

    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<NotetermConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: NotetermConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", redacted(&config));
    Ok(config)
}

fn redacted(config: &NotetermConfig) -> String {
    format!(
        "general={:?} server={:?} store=(backend={:?}, sqlite_path={:?}, endpoint={:?}, api_key={}) theme={:?}",
        config.general,
        config.server,
        config.store.backend,
        config.store.sqlite_path,
        config.store.endpoint,
        if config.store.api_key.is_some() { "<set>" } else { "<unset>" },
        config.theme,
    )
}

const DEFAULT_CONFIG_TEMPLATE: &str = r##"# noteterm configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# splash_seconds = 5
# effect_timeout_seconds = 30        # 0 disables the per-request timeout

# [server]
# listen = "127.0.0.1:2323"          # Or set NOTETERM_LISTEN
# max_sessions = 64
# handshake_timeout_seconds = 10

# [store]
# backend = "sqlite"                 # "sqlite" or "http", or set NOTETERM_STORE
# sqlite_path = "~/.noteterm/notes.db"   # Or set NOTETERM_DB
# endpoint = "http://localhost:8080" # Or set NOTETERM_ENDPOINT
# api_key = "..."                    # Or set NOTETERM_API_KEY

# [theme]
# accent = "#7571F9"
# text = "#E0DEFF"
# border = "#444444"
# muted = "#8A8A9E"
# list_margin_x = 10
# list_margin_y = 4
# app_name = "noteterm"
# banner = """
# LOGIN
# """
"##;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG_TEMPLATE) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Command-line overrides; `None` means the flag was not given.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub listen: Option<String>,
    pub store: Option<String>,
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &NotetermConfig, cli: &CliOverrides) -> Result<ResolvedConfig, ConfigError> {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`] with an injectable environment lookup.
pub fn resolve_with_env(
    config: &NotetermConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig, ConfigError> {
    // Listen address: CLI → env → config → default
    let listen = cli
        .listen
        .clone()
        .or_else(|| env("NOTETERM_LISTEN"))
        .or_else(|| config.server.listen.clone())
        .unwrap_or_else(|| DEFAULT_LISTEN.to_string());

    // Store backend: CLI → env → config → default
    let store = match cli.store.clone().or_else(|| env("NOTETERM_STORE")) {
        Some(name) => name.parse()?,
        None => config.store.backend.unwrap_or_default(),
    };

    let sqlite_path = env("NOTETERM_DB")
        .or_else(|| config.store.sqlite_path.clone())
        .map(|p| expand_home(&p))
        .unwrap_or_else(default_sqlite_path);

    let endpoint = env("NOTETERM_ENDPOINT").or_else(|| config.store.endpoint.clone());
    let api_key = env("NOTETERM_API_KEY").or_else(|| config.store.api_key.clone());

    if store == StoreBackend::Http && endpoint.is_none() {
        return Err(ConfigError::Invalid(
            "the http store needs [store].endpoint or NOTETERM_ENDPOINT".to_string(),
        ));
    }

    let max_sessions = config.server.max_sessions.unwrap_or(DEFAULT_MAX_SESSIONS);
    if max_sessions == 0 {
        return Err(ConfigError::Invalid("max_sessions must be at least 1".to_string()));
    }

    let effect_timeout = match config
        .general
        .effect_timeout_seconds
        .unwrap_or(DEFAULT_EFFECT_TIMEOUT_SECONDS)
    {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    Ok(ResolvedConfig {
        splash_dwell: Duration::from_secs(
            config.general.splash_seconds.unwrap_or(DEFAULT_SPLASH_SECONDS),
        ),
        effect_timeout,
        listen,
        max_sessions,
        handshake_timeout: Duration::from_secs(
            config
                .server
                .handshake_timeout_seconds
                .unwrap_or(DEFAULT_HANDSHAKE_TIMEOUT_SECONDS),
        ),
        store,
        sqlite_path,
        endpoint,
        api_key,
        theme: resolve_theme(&config.theme),
    })
}

fn resolve_theme(theme: &ThemeConfig) -> ThemeSettings {
    let or = |value: &Option<String>, default: &str| {
        value.clone().unwrap_or_else(|| default.to_string())
    };
    ThemeSettings {
        accent: or(&theme.accent, DEFAULT_ACCENT),
        text: or(&theme.text, DEFAULT_TEXT),
        border: or(&theme.border, DEFAULT_BORDER),
        muted: or(&theme.muted, DEFAULT_MUTED),
        list_margin_x: theme.list_margin_x.unwrap_or(DEFAULT_LIST_MARGIN_X),
        list_margin_y: theme.list_margin_y.unwrap_or(DEFAULT_LIST_MARGIN_Y),
        banner: theme
            .banner
            .as_deref()
            .map(|b| b.trim_matches('\n').to_string())
            .unwrap_or_else(|| DEFAULT_BANNER.to_string()),
        app_name: or(&theme.app_name, DEFAULT_APP_NAME),
    }
}

fn default_sqlite_path() -> PathBuf {
    config_dir()
        .map(|d| d.join("notes.db"))
        .unwrap_or_else(|| PathBuf::from("noteterm.db"))
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
