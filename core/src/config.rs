//! Translation configuration.
//!
//! Configuration is stored at `~/.fanyi/config.toml`. It is read again on
//! every translation attempt, so a credential change takes effect on the next
//! invocation without restarting the host.

use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::provider::AUTO_LANGUAGE;
use crate::provider::DEFAULT_ENDPOINT;
use crate::provider::LanguagePair;

/// Default transport timeout for translation requests (in milliseconds).
const DEFAULT_TIMEOUT_MS: u64 = 30000;

/// Environment variable overriding `app_id`.
pub const APP_ID_ENV: &str = "FANYI_APP_ID";

/// Environment variable overriding `secret_key`.
pub const SECRET_KEY_ENV: &str = "FANYI_SECRET_KEY";

/// Provider credentials.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub app_id: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Both fields must be non-empty before a request may be attempted.
    pub fn is_valid(&self) -> bool {
        !self.app_id.is_empty() && !self.secret_key.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.secret_key.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("secret_key", &secret)
            .finish()
    }
}

/// Source of credentials for the pipeline.
///
/// Implementations must not cache: every call reflects the current settings.
pub trait ConfigProvider: Send + Sync {
    fn credentials(&self) -> Credentials;

    fn is_valid(&self, credentials: &Credentials) -> bool {
        credentials.is_valid()
    }
}

/// Translation configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Provider application id.
    #[serde(default)]
    pub app_id: String,

    /// Provider secret key. Never sent over the wire.
    #[serde(default)]
    pub secret_key: String,

    /// Default source language (`auto` lets the provider detect it).
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Default target language.
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Custom endpoint (for proxies or test servers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Transport timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

fn default_source_language() -> String {
    AUTO_LANGUAGE.to_string()
}

fn default_target_language() -> String {
    "zh".to_string()
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            secret_key: String::new(),
            source_language: default_source_language(),
            target_language: default_target_language(),
            endpoint: None,
            timeout_ms: None,
        }
    }
}

impl TranslationConfig {
    /// Get the default configuration file path.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".fanyi").join("config.toml"))
    }

    /// Load configuration from `path`, or return default if it is missing or
    /// unreadable.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<TranslationConfig>(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        "Failed to parse translation config: {e}, using default"
                    );
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "Failed to read translation config: {e}, using default"
                );
                Self::default()
            }
        }
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

        fs::write(path, &content)?;

        // The file holds the secret key: owner read/write only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            let _ = fs::set_permissions(path, permissions);
        }

        Ok(())
    }

    /// Replace file values with non-empty values from `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(app_id) = lookup(APP_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.app_id = app_id;
        }
        if let Some(secret_key) = lookup(SECRET_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.secret_key = secret_key;
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.app_id.trim(), self.secret_key.trim())
    }

    /// Language pair used when a command does not name one.
    pub fn language_pair(&self) -> LanguagePair {
        LanguagePair::new(&self.source_language, &self.target_language)
    }

    pub fn effective_endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn effective_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }
}

/// Reads [`TranslationConfig`] from disk on every call.
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
    read_env: bool,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_env: true,
        }
    }

    /// Ignore `FANYI_APP_ID` / `FANYI_SECRET_KEY`.
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> TranslationConfig {
        let mut config = TranslationConfig::load_from(&self.path);
        if self.read_env {
            config.apply_env_overrides(|key| std::env::var(key).ok());
        }
        config
    }
}

impl ConfigProvider for FileConfigProvider {
    fn credentials(&self) -> Credentials {
        self.load().credentials()
    }
}
