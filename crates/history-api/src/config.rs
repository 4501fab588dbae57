//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// History API server configuration.
///
/// Provider credentials are read by the provider crates themselves.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Shared bearer token required on every request, if set.
    pub api_token: Option<String>,
    /// Whether moderators may read other users' entries.
    pub moderation_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `HISTORY_API_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:history.db?mode=rwc` |
    /// | `HISTORY_API_TOKEN` | Bearer token required on requests | (disabled) |
    /// | `ENABLE_HISTORY_MODERATION` | Moderator read access | `false` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("HISTORY_API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:history.db?mode=rwc".to_string());

        let api_token = env::var("HISTORY_API_TOKEN")
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let moderation_enabled = env::var("ENABLE_HISTORY_MODERATION")
            .ok()
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            addr,
            database_url,
            api_token,
            moderation_enabled,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid HISTORY_API_ADDR format")]
    InvalidAddr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_vars() {
            env::remove_var("HISTORY_API_ADDR");
            env::remove_var("SQLITE_PATH");
            env::remove_var("HISTORY_API_TOKEN");
            env::remove_var("ENABLE_HISTORY_MODERATION");
        }

        // Defaults
        clear_all_vars();
        let config = Config::from_env().unwrap();
        assert_eq!(config.addr, "127.0.0.1:8790".parse().unwrap());
        assert_eq!(config.database_url, "sqlite:history.db?mode=rwc");
        assert!(config.api_token.is_none());
        assert!(!config.moderation_enabled);

        // Overrides
        clear_all_vars();
        env::set_var("HISTORY_API_ADDR", "0.0.0.0:9000");
        env::set_var("SQLITE_PATH", "sqlite::memory:");
        env::set_var("HISTORY_API_TOKEN", " secret ");
        env::set_var("ENABLE_HISTORY_MODERATION", "TRUE");
        let config = Config::from_env().unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.api_token.as_deref(), Some("secret"));
        assert!(config.moderation_enabled);

        // Blank token disables auth; bad address is rejected
        clear_all_vars();
        env::set_var("HISTORY_API_TOKEN", "  ");
        assert!(Config::from_env().unwrap().api_token.is_none());
        env::set_var("HISTORY_API_ADDR", "not-an-address");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidAddr)));

        clear_all_vars();
    }
}
