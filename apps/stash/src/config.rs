//! # Configuration
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `stash.toml` (or the file named by `--config`)
//! 3. `STASH_*` environment variables
//! 4. CLI flags
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [storage]
//! backend = "redb"      # or "memory"
//! path = "stash.db"
//!
//! [allocator]
//! strategy = "counter"  # or "scan"
//! overflow = "fail"     # or "widen"
//! max_attempts = 5
//!
//! [security]
//! api_key = "..."
//! rate_limit = 100      # requests per second, 0 disables
//! cors_origins = "http://localhost:3000"
//! ```

use serde::Deserialize;
use stash_core::{AllocatorConfig, IdentifierAllocator, Registry, StashError, StorageBackend};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File read when no `--config` is given, if present.
pub const DEFAULT_CONFIG_FILE: &str = "stash.toml";

/// Default rate limit in requests per second.
pub const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// CONFIG SECTIONS
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StashConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub allocator: AllocatorConfig,
    pub security: SecurityConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which record store backs the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// redb database file (ACID, persistent).
    #[default]
    Redb,
    /// Process memory (volatile).
    Memory,
}

impl FromStr for BackendKind {
    type Err = StashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "memory" => Ok(Self::Memory),
            other => Err(StashError::ConfigError(format!(
                "Unknown backend '{}'. Valid: redb, memory",
                other
            ))),
        }
    }
}

/// Record store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// Database file, used by the redb backend.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: PathBuf::from("stash.db"),
        }
    }
}

/// HTTP transport hygiene: API key, rate limit, CORS.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Bearer key required on every endpoint but `/health`. `None` disables.
    pub api_key: Option<String>,
    /// Requests per second; 0 disables limiting.
    pub rate_limit: u32,
    /// Comma-separated origins, or `*`. `None` means localhost only.
    pub cors_origins: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            cors_origins: None,
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl StashConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, StashError> {
        toml::from_str(text).map_err(|e| StashError::ConfigError(e.to_string()))
    }

    /// Load configuration from file and process environment.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, StashError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::read_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, StashError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StashError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply `STASH_*` overrides obtained through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), StashError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("STASH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = get("STASH_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| StashError::ConfigError(format!("Invalid STASH_PORT: {}", port)))?;
        }
        if let Some(path) = get("STASH_DATABASE") {
            self.storage.path = PathBuf::from(path);
        }
        if let Some(backend) = get("STASH_BACKEND") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(key) = get("STASH_API_KEY") {
            self.security.api_key = Some(key);
        }
        if let Some(limit) = get("STASH_RATE_LIMIT") {
            self.security.rate_limit = limit.trim().parse().map_err(|_| {
                StashError::ConfigError(format!("Invalid STASH_RATE_LIMIT: {}", limit))
            })?;
        }
        if let Some(origins) = get("STASH_CORS_ORIGINS") {
            self.security.cors_origins = Some(origins);
        }
        Ok(())
    }

    /// Reject configurations the application cannot start with.
    pub fn validate(&self) -> Result<(), StashError> {
        if self.server.host.trim().is_empty() {
            return Err(StashError::ConfigError("server.host is empty".to_string()));
        }
        if self.storage.backend == BackendKind::Redb && self.storage.path.as_os_str().is_empty()
        {
            return Err(StashError::ConfigError("storage.path is empty".to_string()));
        }
        self.allocator.validate()
    }

    /// The API key, if authentication is enabled.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.security
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
    }

    /// Open the registry described by `[storage]` and `[allocator]`.
    pub fn open_registry(&self) -> Result<Registry, StashError> {
        let allocator = IdentifierAllocator::new(self.allocator);
        match self.storage.backend {
            BackendKind::Memory => Ok(Registry::with_backend(
                StorageBackend::default(),
                allocator,
            )),
            BackendKind::Redb => Registry::with_redb(&self.storage.path, allocator),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use stash_core::{SequenceStrategy, SuffixOverflow};
    use std::collections::BTreeMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config = StashConfig::from_toml_str("").expect("parse");
        assert_eq!(config, StashConfig::default());
        assert_eq!(config.server.address(), "127.0.0.1:8080");
        assert_eq!(config.storage.backend, BackendKind::Redb);
        assert_eq!(config.allocator.max_attempts, 5);
        assert_eq!(config.security.rate_limit, DEFAULT_RATE_LIMIT);
    }

    #[test]
    fn parses_all_sections() {
        let config = StashConfig::from_toml_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9090

            [storage]
            backend = "memory"

            [allocator]
            strategy = "scan"
            overflow = "widen"
            max_attempts = 3

            [security]
            api_key = "secret"
            rate_limit = 0
            "#,
        )
        .expect("parse");

        assert_eq!(config.server.address(), "0.0.0.0:9090");
        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert_eq!(config.allocator.strategy, SequenceStrategy::Scan);
        assert_eq!(config.allocator.overflow, SuffixOverflow::Widen);
        assert_eq!(config.allocator.max_attempts, 3);
        assert_eq!(config.api_key(), Some("secret"));
        assert_eq!(config.security.rate_limit, 0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = StashConfig::from_toml_str("[server]\nhots = \"x\"\n").expect_err("typo");
        assert!(matches!(err, StashError::ConfigError(_)));

        let err =
            StashConfig::from_toml_str("[allocator]\nstratgy = \"scan\"\n").expect_err("typo");
        assert!(matches!(err, StashError::ConfigError(_)));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = StashConfig::default();
        config
            .apply_env(env(&[
                ("STASH_HOST", "10.0.0.1"),
                ("STASH_PORT", "7000"),
                ("STASH_BACKEND", "Memory"),
                ("STASH_DATABASE", "/tmp/other.db"),
                ("STASH_API_KEY", "k"),
                ("STASH_RATE_LIMIT", "5"),
                ("STASH_CORS_ORIGINS", "*"),
            ]))
            .expect("apply");

        assert_eq!(config.server.address(), "10.0.0.1:7000");
        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.api_key(), Some("k"));
        assert_eq!(config.security.rate_limit, 5);
        assert_eq!(config.security.cors_origins.as_deref(), Some("*"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = StashConfig::default();
        config
            .apply_env(env(&[("STASH_HOST", "  "), ("STASH_API_KEY", "")]))
            .expect("apply");
        assert_eq!(config, StashConfig::default());
        assert!(config.api_key().is_none());
    }

    #[test]
    fn invalid_env_values_are_errors() {
        let mut config = StashConfig::default();
        assert!(config.apply_env(env(&[("STASH_PORT", "eighty")])).is_err());
        assert!(config.apply_env(env(&[("STASH_BACKEND", "mongo")])).is_err());
        assert!(config.apply_env(env(&[("STASH_RATE_LIMIT", "-1")])).is_err());
    }

    #[test]
    fn zero_attempts_fail_validation() {
        let config = StashConfig::from_toml_str("[allocator]\nmax_attempts = 0\n").expect("parse");
        assert!(matches!(config.validate(), Err(StashError::ConfigError(_))));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = StashConfig::load(Some(Path::new("/nonexistent/stash.toml")))
            .expect_err("missing file");
        assert!(matches!(err, StashError::ConfigError(_)));
    }

    #[test]
    fn open_registry_per_backend() {
        let memory = StashConfig {
            storage: StorageConfig {
                backend: BackendKind::Memory,
                ..StorageConfig::default()
            },
            ..StashConfig::default()
        };
        assert!(!memory.open_registry().expect("memory").is_persistent());

        let temp = tempfile::tempdir().expect("temp dir");
        let persistent = StashConfig {
            storage: StorageConfig {
                backend: BackendKind::Redb,
                path: temp.path().join("stash.db"),
            },
            ..StashConfig::default()
        };
        assert!(persistent.open_registry().expect("redb").is_persistent());
    }
}
