use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_DIR: &str = "clearframe";
pub const CONFIG_FILE: &str = "config.json";
const TOKEN_XOR_KEY: &[u8] = b"clearframe-local-key-v1";

pub const API_URL_ENV: &str = "CLEARFRAME_API_URL";
pub const APP_ENV: &str = "CLEARFRAME_ENV";
pub const DEVELOPMENT_API_URL: &str = "http://localhost:8000";
pub const PRODUCTION_API_URL: &str = "https://api.clearframe.app";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const MIN_POLL_INTERVAL_MS: u64 = 250;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(std::io::Error),

    #[error("Failed to save config: {0}")]
    Write(std::io::Error),

    #[error("Failed to create config dir: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: Option<String>,
    pub auth_token_obfuscated: Option<String>,
    pub poll_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            auth_token_obfuscated: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn auth_token(&self) -> Option<String> {
        self.auth_token_obfuscated
            .as_deref()
            .and_then(deobfuscate_token)
    }

    pub fn set_auth_token(&mut self, token: Option<&str>) {
        self.auth_token_obfuscated = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(obfuscate_token);
    }

    /// Env override first, then the stored value, then the build environment default
    pub fn resolve_api_base_url(&self) -> String {
        resolve_api_base_url(
            std::env::var(API_URL_ENV).ok(),
            self.api_base_url.clone(),
            std::env::var(APP_ENV).ok(),
        )
    }
}

pub fn resolve_api_base_url(env_url: Option<String>, configured: Option<String>, app_env: Option<String>) -> String {
    let non_empty = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(url) = non_empty(env_url) {
        return url;
    }
    if let Some(url) = non_empty(configured) {
        return url;
    }
    match app_env.as_deref().map(str::trim) {
        Some(env) if env.eq_ignore_ascii_case("development") => DEVELOPMENT_API_URL.to_string(),
        _ => PRODUCTION_API_URL.to_string(),
    }
}

pub fn config_path(dir: &Path) -> Result<PathBuf, ConfigError> {
    let dir = dir.join(CONFIG_DIR);
    fs::create_dir_all(&dir).map_err(ConfigError::CreateDir)?;
    Ok(dir.join(CONFIG_FILE))
}

pub fn load_or_create(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        let config = AppConfig::default();
        save(path, &config)?;
        return Ok(config);
    }

    let raw = fs::read_to_string(path).map_err(ConfigError::Read)?;
    match serde_json::from_str::<AppConfig>(&raw) {
        Ok(config) => Ok(config),
        Err(e) => {
            tracing::warn!("Config at {} is unreadable ({}), restoring defaults", path.display(), e);
            let backup = path.with_extension("json.bak");
            let _ = fs::copy(path, backup);
            let config = AppConfig::default();
            save(path, &config)?;
            Ok(config)
        }
    }
}

pub fn save(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).map_err(ConfigError::Write)
}

fn obfuscate_token(token: &str) -> String {
    let mut bytes = token.as_bytes().to_vec();
    for (idx, byte) in bytes.iter_mut().enumerate() {
        *byte ^= TOKEN_XOR_KEY[idx % TOKEN_XOR_KEY.len()];
    }
    BASE64_STANDARD.encode(bytes)
}

fn deobfuscate_token(obfuscated: &str) -> Option<String> {
    let mut bytes = BASE64_STANDARD.decode(obfuscated).ok()?;
    for (idx, byte) in bytes.iter_mut().enumerate() {
        *byte ^= TOKEN_XOR_KEY[idx % TOKEN_XOR_KEY.len()];
    }
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(dir.path()).unwrap();

        let config = load_or_create(&path).unwrap();

        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
    }

    #[test]
    fn corrupt_file_is_backed_up_and_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(dir.path()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let config = load_or_create(&path).unwrap();

        assert_eq!(config, AppConfig::default());
        let backup = fs::read_to_string(path.with_extension("json.bak")).unwrap();
        assert_eq!(backup, "{not json");
    }

    #[test]
    fn token_is_not_stored_in_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(dir.path()).unwrap();
        let mut config = AppConfig::default();
        config.set_auth_token(Some(" eyJhbGciOi.secret "));
        save(&path, &config).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("eyJhbGciOi"));
        assert_eq!(load_or_create(&path).unwrap().auth_token().as_deref(), Some("eyJhbGciOi.secret"));

        config.set_auth_token(Some("   "));
        assert!(config.auth_token().is_none());
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let config = AppConfig {
            poll_interval_ms: 10,
            ..AppConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn api_url_priority() {
        let s = |v: &str| Some(v.to_string());
        assert_eq!(
            resolve_api_base_url(s("http://env:1"), s("http://cfg:2"), s("development")),
            "http://env:1"
        );
        assert_eq!(resolve_api_base_url(s(" "), s("http://cfg:2"), None), "http://cfg:2");
        assert_eq!(resolve_api_base_url(None, None, s("development")), DEVELOPMENT_API_URL);
        assert_eq!(resolve_api_base_url(None, None, None), PRODUCTION_API_URL);
    }
}
