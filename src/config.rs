//! Configuration management for rostercli.
//!
//! Values are read from environment variables, which may be seeded from a
//! `.env` file in the local data directory. Every accessor falls back to a
//! sensible default so the client works against a local API without any
//! setup.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// The file lives under `rostercli/.env` in the platform-specific local data
/// directory:
/// - Linux: `~/.local/share/rostercli/.env`
/// - macOS: `~/Library/Application Support/rostercli/.env`
/// - Windows: `%LOCALAPPDATA%/rostercli/.env`
///
/// The directory is created when missing. A missing `.env` file is not an
/// error; variables already set in the process environment win over the file.
///
/// # Errors
///
/// Returns an error string if the directory cannot be created or the file
/// exists but cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path).map_err(|e| e.to_string())
}

/// Returns the application's directory inside the local data directory.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("rostercli");
    path
}

/// Base URL of the roster API, without a trailing slash.
///
/// Read from `ROSTER_API_URL`, e.g. `https://roster.example.org/api`.
pub fn api_url() -> String {
    env::var("ROSTER_API_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Number of items requested per page (`ROSTER_PAGE_SIZE`).
pub fn page_size() -> u32 {
    parse_var("ROSTER_PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1)
}

/// Quiet period before search input is considered settled
/// (`ROSTER_DEBOUNCE_MS`).
pub fn debounce() -> Duration {
    Duration::from_millis(parse_var("ROSTER_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS))
}

/// Upper bound for one API call (`ROSTER_REQUEST_TIMEOUT_SECS`).
///
/// Covers the first send, a credential refresh and the replay together, and
/// also bounds each individual HTTP exchange.
pub fn request_timeout() -> Duration {
    Duration::from_secs(parse_var(
        "ROSTER_REQUEST_TIMEOUT_SECS",
        DEFAULT_REQUEST_TIMEOUT_SECS,
    ))
}

/// Maximum age of a cached page (`ROSTER_CACHE_TTL_SECS`).
///
/// Unset means cached pages never expire on their own and are only dropped
/// when the filters change.
pub fn cache_ttl() -> Option<Duration> {
    env::var("ROSTER_CACHE_TTL_SECS")
        .ok()
        .and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(_) => {
                warn!(value = %raw, "ignoring malformed ROSTER_CACHE_TTL_SECS");
                None
            }
        })
}

/// Location of the persisted session record (`ROSTER_SESSION_FILE`).
pub fn session_file() -> PathBuf {
    env::var("ROSTER_SESSION_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir().join("session.json"))
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "ignoring malformed value, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Snapshot of every setting the client needs, handed to the components at
/// construction time.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub page_size: u32,
    pub debounce: Duration,
    pub request_timeout: Duration,
    pub cache_ttl: Option<Duration>,
    pub session_file: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            api_url: api_url(),
            page_size: page_size(),
            debounce: debounce(),
            request_timeout: request_timeout(),
            cache_ttl: cache_ttl(),
            session_file: session_file(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cache_ttl: None,
            session_file: data_dir().join("session.json"),
        }
    }
}
