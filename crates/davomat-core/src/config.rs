//! Shared configuration for Davomat.
//!
//! Provides the state directory layout used by both binaries and the
//! environment-driven settings for the upstream ERP connection.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.davomat/
//! ├── config/
//! │   └── .env.local      # Secrets (bot token, keys)
//! └── state/
//!     └── credentials.json
//! ```
//!
//! # Environment Variables
//!
//! | Variable                   | Required | Default                                          |
//! |----------------------------|----------|--------------------------------------------------|
//! | `DAVOMAT_STATE_DIR`        | no       | `~/.davomat`                                     |
//! | `CREDENTIAL_KEY`           | **yes**  | --                                               |
//! | `ERP_BASE_URL`             | no       | `https://acharyajava.uz/AcharyaInstituteUZB/api` |
//! | `ERP_TIMEOUT_SECS`         | no       | `20`                                             |
//! | `ERP_ATTENDANCE_PERIOD`    | no       | `3`                                              |
//! | `ERP_ACCEPT_INVALID_CERTS` | no       | `false`                                          |
//! | `ERP_SERVICE_USERNAME`     | no       | --                                               |
//! | `ERP_SERVICE_PASSWORD`     | no       | --                                               |

use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use thiserror::Error;

/// Environment variable for a custom state directory.
pub const STATE_DIR_ENV: &str = "DAVOMAT_STATE_DIR";

/// Environment variable holding the base64 password-encryption key.
pub const CREDENTIAL_KEY_ENV: &str = "CREDENTIAL_KEY";

/// Default upstream API base URL.
pub const DEFAULT_ERP_BASE_URL: &str = "https://acharyajava.uz/AcharyaInstituteUZB/api";

/// Default per-request timeout for upstream calls.
pub const DEFAULT_ERP_TIMEOUT_SECS: u64 = 20;

/// Default attendance period (semester) requested from upstream.
pub const DEFAULT_ATTENDANCE_PERIOD: &str = "3";

const DEFAULT_STATE_DIR: &str = ".davomat";
const CONFIG_SUBDIR: &str = "config";
const STATE_SUBDIR: &str = "state";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("{name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Get the Davomat state directory.
///
/// Determined by `DAVOMAT_STATE_DIR`, then `~/.davomat`, then `.davomat` in
/// the current directory.
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the user config directory.
pub fn config_dir() -> PathBuf {
    state_dir().join(CONFIG_SUBDIR)
}

/// Get the runtime state directory.
pub fn runtime_state_dir() -> PathBuf {
    state_dir().join(STATE_SUBDIR)
}

/// Get the credential store file path.
pub fn credentials_file() -> PathBuf {
    runtime_state_dir().join("credentials.json")
}

/// Get the `.env.local` file path for secrets.
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Ensure the config and state directories exist.
pub fn ensure_all_dirs() -> std::io::Result<()> {
    std::fs::create_dir_all(config_dir())?;
    std::fs::create_dir_all(runtime_state_dir())?;
    Ok(())
}

/// Loads environment files: the config-dir `.env.local` first, then a local
/// `.env.local` or `.env`. Already-set variables win.
pub fn load_env_files() {
    let env_path = env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
    let _ = dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv());
}

/// Reads a required secret from the environment.
pub fn required_env(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Fixed service account used for the mentor directory.
#[derive(Clone)]
pub struct ServiceAccount {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Upstream ERP connection settings.
#[derive(Debug, Clone)]
pub struct ErpConfig {
    /// API base URL without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Attendance period used when the caller does not specify one.
    pub attendance_period: String,
    /// Skip TLS certificate validation for the upstream host.
    pub accept_invalid_certs: bool,
    /// Service account for mentor lookups, if configured.
    pub service_account: Option<ServiceAccount>,
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ERP_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_ERP_TIMEOUT_SECS),
            attendance_period: DEFAULT_ATTENDANCE_PERIOD.to_string(),
            accept_invalid_certs: false,
            service_account: None,
        }
    }
}

impl ErpConfig {
    /// Creates a config pointing at `base_url` with defaults otherwise.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the mentor-lookup service account.
    pub fn with_service_account(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.service_account = Some(ServiceAccount {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Loads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = match get("ERP_BASE_URL") {
            Some(url) => Self::new(url),
            None => Self::default(),
        };

        if let Some(secs) = get("ERP_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|e| ConfigError::Invalid {
                name: "ERP_TIMEOUT_SECS",
                reason: format!("{}", e),
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(period) = get("ERP_ATTENDANCE_PERIOD") {
            config.attendance_period = period;
        }

        if let Some(flag) = get("ERP_ACCEPT_INVALID_CERTS") {
            config.accept_invalid_certs = parse_bool(&flag).ok_or(ConfigError::Invalid {
                name: "ERP_ACCEPT_INVALID_CERTS",
                reason: format!("expected true/false, got {}", flag),
            })?;
        }

        config.service_account = match (get("ERP_SERVICE_USERNAME"), get("ERP_SERVICE_PASSWORD")) {
            (Some(username), Some(password)) => Some(ServiceAccount { username, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ERP_SERVICE_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ERP_SERVICE_USERNAME")),
        };

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_from_empty_env() {
        let config = ErpConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_ERP_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.attendance_period, "3");
        assert!(!config.accept_invalid_certs);
        assert!(config.service_account.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ErpConfig::from_lookup(lookup(&[
            ("ERP_BASE_URL", "http://localhost:9000/api/"),
            ("ERP_TIMEOUT_SECS", "5"),
            ("ERP_ATTENDANCE_PERIOD", "4"),
            ("ERP_ACCEPT_INVALID_CERTS", "yes"),
            ("ERP_SERVICE_USERNAME", "svc"),
            ("ERP_SERVICE_PASSWORD", "pw"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:9000/api");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.attendance_period, "4");
        assert!(config.accept_invalid_certs);
        assert_eq!(config.service_account.unwrap().username, "svc");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ErpConfig::from_lookup(lookup(&[("ERP_TIMEOUT_SECS", "soon")])),
            Err(ConfigError::Invalid { name: "ERP_TIMEOUT_SECS", .. })
        ));
        assert!(matches!(
            ErpConfig::from_lookup(lookup(&[("ERP_ACCEPT_INVALID_CERTS", "maybe")])),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_half_configured_service_account() {
        assert_eq!(
            ErpConfig::from_lookup(lookup(&[("ERP_SERVICE_USERNAME", "svc")])).unwrap_err(),
            ConfigError::Missing("ERP_SERVICE_PASSWORD")
        );
    }

    #[test]
    fn test_service_account_debug_redacts_password() {
        let config = ErpConfig::default().with_service_account("svc", "hunter2");
        let debug = format!("{:?}", config);
        assert!(debug.contains("svc"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_file_names() {
        assert!(credentials_file().ends_with("state/credentials.json"));
        assert!(env_file().ends_with("config/.env.local"));
    }
}
