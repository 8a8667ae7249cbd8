//! Client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name searched for in the current directory.
pub const LOCAL_CONFIG_FILE: &str = "schoolhub.toml";

/// Connection settings for the school API.
///
/// Note: Custom Debug impl masks the token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API root, e.g. `https://school.example.org/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Unread-count refresh period in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Default page size for listings.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("poll_interval_secs", &self.poll_interval_secs)
            .field("page_size", &self.page_size)
            .finish()
    }
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    30
}
fn default_page_size() -> u32 {
    20
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout(),
            poll_interval_secs: default_poll_interval(),
            page_size: default_page_size(),
        }
    }
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `schoolhub.toml` in the current directory
/// 2. `~/.config/schoolhub/config.toml`
///
/// Environment variable overrides: `SCHOOLHUB_BASE_URL`, `SCHOOLHUB_TOKEN`.
pub fn load_config() -> Result<ClientConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ClientConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loading config");
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ClientConfig::default(),
    };

    if let Ok(url) = std::env::var("SCHOOLHUB_BASE_URL") {
        config.base_url = url;
    }
    if let Ok(token) = std::env::var("SCHOOLHUB_TOKEN") {
        config.token = Some(token);
    }

    Ok(config)
}

/// Parse a config document and resolve `${VAR}` references.
pub fn parse_config(content: &str) -> Result<ClientConfig> {
    let mut config: ClientConfig = toml::from_str(content)?;
    config.base_url = resolve_env_vars(&config.base_url);
    config.token = config
        .token
        .as_deref()
        .map(resolve_env_vars)
        .filter(|t| !t.is_empty());
    Ok(config)
}

/// `~/.config/schoolhub`
pub fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("schoolhub"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_SCHOOLHUB_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_SCHOOLHUB_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_SCHOOLHUB_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_SCHOOLHUB_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
        assert!(config.token.is_none());
    }

    #[test]
    fn parse_with_env_token() {
        std::env::set_var("_SCHOOLHUB_TEST_TOKEN", "tok-123");
        let config = parse_config(
            r#"
base_url = "https://school.example.org/api"
token = "${_SCHOOLHUB_TEST_TOKEN}"
poll_interval_secs = 10
"#,
        )
        .unwrap();
        std::env::remove_var("_SCHOOLHUB_TEST_TOKEN");
        assert_eq!(config.base_url, "https://school.example.org/api");
        assert_eq!(config.token.as_deref(), Some("tok-123"));
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn unset_token_variable_means_no_token() {
        let config = parse_config(r#"token = "${_SCHOOLHUB_SURELY_UNSET}""#).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn debug_masks_token() {
        let config = ClientConfig {
            token: Some("very-secret".into()),
            ..ClientConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn explicit_missing_path_fails() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn explicit_path_is_read() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "timeout_secs = 5\npage_size = 50\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.page_size, 50);
    }
}
