//! Registry configuration
//!
//! Loaded from environment variables with sensible defaults. When no
//! `DATABASE_URL` is set the registry falls back to a local SQLite file.

use crate::allocator::DEFAULT_MAX_PROBES;
use crate::registry::DEFAULT_MAX_ATTEMPTS;
use std::fmt;
use std::str::FromStr;

/// Local SQLite database used when `DATABASE_URL` is unset
pub const DEFAULT_SQLITE_URL: &str = "sqlite://videos.db";

/// Physical database behind the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
    Memory,
}

impl Backend {
    /// Infer the backend from a connection URL scheme
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Backend::Postgres)
        } else if url.starts_with("sqlite:") {
            Some(Backend::Sqlite)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Postgres => "postgres",
            Backend::Sqlite => "sqlite",
            Backend::Memory => "memory",
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Backend::Postgres),
            "sqlite" => Ok(Backend::Sqlite),
            "memory" | "mem" => Ok(Backend::Memory),
            other => Err(format!("Unknown registry backend: {}", other)),
        }
    }
}

#[derive(Clone)]
pub struct RegistryConfig {
    pub backend: Backend,
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Connection verification timeout
    pub connect_timeout_secs: u64,
    /// Connection acquisition timeout (get connection from pool)
    pub acquire_timeout_secs: u64,
    /// Insert attempts per registration
    pub max_attempts: u32,
    /// Existence probes per allocation
    pub max_probes: u32,
    /// Bot the deep links point to
    pub bot_username: Option<String>,
    /// Chat whose videos the transport registers
    pub group_id: Option<i64>,
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("backend", &self.backend)
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("max_probes", &self.max_probes)
            .field("bot_username", &self.bot_username)
            .field("group_id", &self.group_id)
            .finish()
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            database_url: DEFAULT_SQLITE_URL.to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 10,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_probes: DEFAULT_MAX_PROBES,
            bot_username: None,
            group_id: None,
        }
    }
}

impl RegistryConfig {
    /// In-memory registry, nothing persisted
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory,
            database_url: String::new(),
            ..Self::default()
        }
    }

    /// Create a new RegistryConfig from environment variables
    ///
    /// `REGISTRY_BACKEND` overrides the backend inferred from `DATABASE_URL`.
    /// An explicit SQL backend must agree with the URL scheme; `memory` ignores the URL.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_SQLITE_URL.to_string());

        let inferred = Backend::from_url(&database_url);
        let backend = match parse_env_optional::<String>("REGISTRY_BACKEND") {
            Some(raw) => {
                let backend: Backend = raw.parse()?;
                if backend != Backend::Memory && inferred != Some(backend) {
                    return Err(format!(
                        "REGISTRY_BACKEND={} does not match the DATABASE_URL scheme",
                        backend.as_str()
                    ));
                }
                backend
            }
            None => inferred.ok_or_else(|| "DATABASE_URL has an unsupported scheme".to_string())?,
        };

        Ok(Self {
            backend,
            database_url,
            max_connections: parse_env_with_default("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_env_with_default("DB_MIN_CONNECTIONS", defaults.min_connections),
            connect_timeout_secs: parse_env_with_default(
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            ),
            acquire_timeout_secs: parse_env_with_default(
                "DB_ACQUIRE_TIMEOUT_SECS",
                defaults.acquire_timeout_secs,
            ),
            max_attempts: parse_env_with_default("REGISTRY_MAX_ATTEMPTS", defaults.max_attempts),
            max_probes: parse_env_with_default("REGISTRY_MAX_PROBES", defaults.max_probes),
            bot_username: parse_env_optional("BOT_USERNAME"),
            group_id: parse_env_optional("GROUP_ID"),
        })
    }
}

/// Parse an environment variable with a default fallback
fn parse_env_with_default<T: FromStr>(key: &str, default: T) -> T {
    parse_env_optional(key).unwrap_or(default)
}

/// Parse an environment variable, returning None if missing or invalid
fn parse_env_optional<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[&str] = &[
        "DATABASE_URL",
        "REGISTRY_BACKEND",
        "DB_MAX_CONNECTIONS",
        "DB_MIN_CONNECTIONS",
        "DB_CONNECT_TIMEOUT_SECS",
        "DB_ACQUIRE_TIMEOUT_SECS",
        "REGISTRY_MAX_ATTEMPTS",
        "REGISTRY_MAX_PROBES",
        "BOT_USERNAME",
        "GROUP_ID",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial_test::serial]
    fn test_defaults_fall_back_to_sqlite() {
        clear_env();

        let config = RegistryConfig::from_env().unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.database_url, DEFAULT_SQLITE_URL);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.max_probes, DEFAULT_MAX_PROBES);
        assert_eq!(config.bot_username, None);
    }

    #[test]
    #[serial_test::serial]
    fn test_postgres_inferred_and_overrides_applied() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/videos");
        std::env::set_var("REGISTRY_MAX_ATTEMPTS", "8");
        std::env::set_var("DB_MAX_CONNECTIONS", "not-a-number");
        std::env::set_var("BOT_USERNAME", "VideoRelayBot");
        std::env::set_var("GROUP_ID", "-1001234567890");

        let config = RegistryConfig::from_env().unwrap();
        assert_eq!(config.backend, Backend::Postgres);
        assert_eq!(config.max_attempts, 8);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.bot_username.as_deref(), Some("VideoRelayBot"));
        assert_eq!(config.group_id, Some(-1_001_234_567_890));

        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn test_backend_override_and_rejects_unknown() {
        clear_env();
        std::env::set_var("REGISTRY_BACKEND", "memory");
        assert_eq!(RegistryConfig::from_env().unwrap().backend, Backend::Memory);

        std::env::set_var("REGISTRY_BACKEND", "mongo");
        assert!(RegistryConfig::from_env().is_err());

        std::env::remove_var("REGISTRY_BACKEND");
        std::env::set_var("DATABASE_URL", "mysql://localhost/videos");
        assert!(RegistryConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    #[serial_test::serial]
    fn test_backend_must_match_url_scheme() {
        clear_env();
        std::env::set_var("REGISTRY_BACKEND", "postgres");
        let err = RegistryConfig::from_env().unwrap_err();
        assert!(err.contains("REGISTRY_BACKEND=postgres"));

        std::env::set_var("REGISTRY_BACKEND", "sqlite");
        std::env::set_var("DATABASE_URL", "postgres://localhost/videos");
        assert!(RegistryConfig::from_env().is_err());

        std::env::set_var("REGISTRY_BACKEND", "postgres");
        assert_eq!(RegistryConfig::from_env().unwrap().backend, Backend::Postgres);

        std::env::remove_var("DATABASE_URL");
        std::env::set_var("REGISTRY_BACKEND", "sqlite");
        let config = RegistryConfig::from_env().unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.database_url, DEFAULT_SQLITE_URL);

        clear_env();
    }

    #[test]
    fn test_debug_redacts_url() {
        let config = RegistryConfig {
            database_url: "postgres://user:secret@db/videos".to_string(),
            ..RegistryConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
