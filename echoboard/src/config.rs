// Configuration loading and parsing (echoboard.toml plus the
// ECHOBOARD_API_URL environment override).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Backend used when neither the environment nor a config file names one.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "ECHOBOARD_API_URL";

const CONFIG_FILE: &str = "echoboard.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub board: BoardConfig,
}

/// `[api]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// `[board]` table: timings of the board controller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Delays after a successful submit at which the list is re-fetched to
    /// pick up server-side enrichment.
    pub reconcile_delays_ms: Vec<u64>,
    /// How long the submit confirmation toast stays visible.
    pub toast_ms: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            reconcile_delays_ms: vec![1500, 5000],
            toast_ms: 2000,
        }
    }
}

impl BoardConfig {
    pub fn reconcile_delays(&self) -> Vec<Duration> {
        self.reconcile_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }
}

/// Raw deserialization target for the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiConfig,
    board: BoardConfig,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/echoboard.toml` relative to `base_dir`.
///
/// A missing file yields the built-in defaults. The environment override is
/// not consulted here; see [`load_config`].
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let mut config = read_config_file(&path)?.unwrap_or_default();
    config.api.base_url = resolve_base_url(&config.api.base_url, None);
    validate(&config)?;
    Ok(config)
}

/// Parse a config file, returning `None` when it does not exist.
fn read_config_file(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(Config {
        api: file.api,
        board: file.board,
    }))
}

/// Pick the effective base URL: a non-empty environment override wins, then
/// the configured value, then [`DEFAULT_BASE_URL`]. Trailing slashes are
/// stripped before the emptiness check.
pub fn resolve_base_url(configured: &str, env_override: Option<&str>) -> String {
    let normalize = |raw: &str| raw.trim().trim_end_matches('/').to_string();

    env_override
        .map(normalize)
        .filter(|url| !url.is_empty())
        .or_else(|| Some(normalize(configured)).filter(|url| !url.is_empty()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Seed `config/echoboard.toml` from `defaults/echoboard.toml` when it is
/// missing. Returns the seeded path, or `None` when nothing was copied. An
/// existing config file is never overwritten, and a missing default is not an
/// error since the built-in defaults cover it.
pub fn seed_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Ok(None);
    }

    let config_dir = base_dir.join("config");
    let target = config_dir.join(CONFIG_FILE);
    let copy_error = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to seed {}: {e}", target.display()),
    };

    std::fs::create_dir_all(&config_dir).map_err(copy_error)?;
    // Claim the target atomically so a concurrent or earlier copy wins.
    match std::fs::OpenOptions::new().write(true).create_new(true).open(&target) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => return Err(copy_error(e)),
    }
    std::fs::copy(&source, &target).map_err(copy_error)?;
    Ok(Some(target))
}

/// Per-user config file, e.g. `~/.config/echoboard/echoboard.toml`.
fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "echoboard")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Load the effective configuration.
///
/// Looks for `config/echoboard.toml` under the working directory (seeding it
/// from `defaults/` first), then the per-user config file, then falls back to
/// built-in defaults. `ECHOBOARD_API_URL` is applied last.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if let Some(path) = seed_config_file(&cwd)? {
        info!("Seeded {} from defaults", path.display());
    }

    let mut config = if cwd.join("config").join(CONFIG_FILE).exists() {
        load_config_from(&cwd)?
    } else {
        match user_config_path() {
            Some(path) => read_config_file(&path)?.unwrap_or_default(),
            None => Config::default(),
        }
    };

    let env_override = std::env::var(API_URL_ENV).ok();
    config.api.base_url = resolve_base_url(&config.api.base_url, env_override.as_deref());
    validate(&config)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    match reqwest::Url::parse(&config.api.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => {
            return Err(ConfigError::ValidationError {
                field: "api.base_url".into(),
                message: format!("unsupported scheme `{}`", url.scheme()),
            });
        }
        Err(e) => {
            return Err(ConfigError::ValidationError {
                field: "api.base_url".into(),
                message: format!("not an absolute URL ({e}): {}", config.api.base_url),
            });
        }
    }

    if config.board.toast_ms == 0 {
        return Err(ConfigError::ValidationError {
            field: "board.toast_ms".into(),
            message: "must be > 0".into(),
        });
    }

    if let Some(pos) = config.board.reconcile_delays_ms.iter().position(|ms| *ms == 0) {
        return Err(ConfigError::ValidationError {
            field: format!("board.reconcile_delays_ms[{pos}]"),
            message: "must be > 0".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
