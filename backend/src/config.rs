//! # Application Configuration
//!
//! Settings are read from a single YAML file and can be overridden from the
//! environment.
//!
//! ## YAML Format
//!
//! ```yaml
//! backend: firebase          # or "memory"
//! firebase:
//!   api_key: "AIza..."
//!   project_id: "herdbook-prod"
//!   database: "(default)"
//!   request_timeout_secs: 30
//! logging:
//!   filter: "info,herdbook_backend=debug"
//! session:
//!   sign_out_on_shutdown: false
//! ```
//!
//! A missing file yields the defaults, which run against the in-memory
//! backend.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const ENV_BACKEND: &str = "HERDBOOK_BACKEND";
pub const ENV_FIREBASE_API_KEY: &str = "HERDBOOK_FIREBASE_API_KEY";
pub const ENV_FIREBASE_PROJECT_ID: &str = "HERDBOOK_FIREBASE_PROJECT_ID";
pub const ENV_LOG: &str = "HERDBOOK_LOG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Unknown backend '{0}', expected 'memory' or 'firebase'")]
    UnknownBackend(String),
    #[error("Firebase backend requires {0}")]
    MissingFirebaseSetting(&'static str),
}

/// Which implementation backs the storage traits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Firebase,
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "firebase" => Ok(BackendKind::Firebase),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Firebase project settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    /// Firestore database id
    pub database: String,
    pub auth_base_url: String,
    pub token_base_url: String,
    pub firestore_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            database: "(default)".to_string(),
            auth_base_url: "https://identitytoolkit.googleapis.com".to_string(),
            token_base_url: "https://securetoken.googleapis.com".to_string(),
            firestore_base_url: "https://firestore.googleapis.com".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sign the user out when the app shuts down
    pub sign_out_on_shutdown: bool,
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendKind,
    pub firebase: FirebaseConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Parse a YAML document
    pub fn from_yaml(yaml: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Load the config file, falling back to defaults when it does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        if !path.exists() {
            info!("No config file at {}, using defaults", display);
            return Ok(Self::default());
        }

        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config = Self::from_yaml(&yaml, &display)?;
        debug!("Loaded config from {}", display);
        Ok(config)
    }

    /// Load from `path`, apply process environment overrides and validate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_or_default(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup(ENV_BACKEND) {
            self.backend = backend.parse()?;
        }
        if let Some(api_key) = lookup(ENV_FIREBASE_API_KEY) {
            self.firebase.api_key = api_key;
        }
        if let Some(project_id) = lookup(ENV_FIREBASE_PROJECT_ID) {
            self.firebase.project_id = project_id;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.logging.filter = filter;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == BackendKind::Firebase {
            if self.firebase.api_key.trim().is_empty() {
                return Err(ConfigError::MissingFirebaseSetting("firebase.api_key"));
            }
            if self.firebase.project_id.trim().is_empty() {
                return Err(ConfigError::MissingFirebaseSetting("firebase.project_id"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let config = AppConfig::load_or_default(dir.path().join("herdbook.yaml")).expect("defaults");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.firebase.database, "(default)");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("herdbook.yaml");
        fs::write(
            &path,
            "backend: firebase\nfirebase:\n  api_key: key123\n  project_id: farm\n",
        )
        .expect("write config");

        let config = AppConfig::load_or_default(&path).expect("load");
        assert_eq!(config.backend, BackendKind::Firebase);
        assert_eq!(config.firebase.api_key, "key123");
        assert_eq!(config.firebase.request_timeout_secs, 30);
        assert_eq!(config.logging.filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_yaml_is_reported() {
        let result = AppConfig::from_yaml("backend: [not, a, backend]", "inline");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_BACKEND, "Firebase"),
            (ENV_FIREBASE_API_KEY, "env-key"),
            (ENV_FIREBASE_PROJECT_ID, "env-project"),
            (ENV_LOG, "debug"),
        ]);
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .expect("overrides");

        assert_eq!(config.backend, BackendKind::Firebase);
        assert_eq!(config.firebase.api_key, "env-key");
        assert_eq!(config.firebase.project_id, "env-project");
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_unknown_backend_override() {
        let mut config = AppConfig::default();
        let result = config.apply_overrides(|key| (key == ENV_BACKEND).then(|| "sqlite".to_string()));
        assert!(matches!(result, Err(ConfigError::UnknownBackend(b)) if b == "sqlite"));
    }

    #[test]
    fn test_firebase_requires_credentials() {
        let config = AppConfig {
            backend: BackendKind::Firebase,
            ..AppConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingFirebaseSetting("firebase.api_key"))
        ));
    }
}
