use anyhow::Context;
use serde::Deserialize;

use crate::clients::drive::{DRIVE_API_BASE_URL, DRIVE_UPLOAD_BASE_URL};
use crate::core::credential::Credential;

/// Env var naming an optional TOML file read before env overrides.
pub const CONFIG_PATH_ENV: &str = "DRIVE_GATEWAY_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriveConfig {
    pub api_base_url: String,
    pub upload_base_url: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base_url: DRIVE_API_BASE_URL.to_owned(),
            upload_base_url: DRIVE_UPLOAD_BASE_URL.to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: String, // "server" or "stdio"
    pub port: u16,
    pub drive: DriveConfig,
    /// Fallback credential when a call carries none. Env only, never TOML.
    pub access_token: Option<Credential>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: "server".into(),
            port: 8080,
            drive: DriveConfig::default(),
            access_token: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    mode: Option<String>,
    port: Option<u16>,
    drive: Option<DriveConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// TOML file named by `DRIVE_GATEWAY_CONFIG` (if any), then env overrides.
    pub fn from_env_and_toml() -> anyhow::Result<Self> {
        let base = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config file {path}"))?;
                Self::from_toml_str(&raw).with_context(|| format!("parsing config file {path}"))?
            }
            _ => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let file: FileConfig = toml::from_str(raw)?;
        let defaults = Self::default();
        Ok(Self {
            mode: file.mode.unwrap_or(defaults.mode),
            port: file.port.unwrap_or(defaults.port),
            drive: file.drive.unwrap_or(defaults.drive),
            access_token: None,
        })
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(mode) = std::env::var("MODE") {
            self.mode = mode;
        }
        if let Some(port) = std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(url) = non_empty_env("DRIVE_API_BASE_URL") {
            self.drive.api_base_url = url;
        }
        if let Some(url) = non_empty_env("DRIVE_UPLOAD_BASE_URL") {
            self.drive.upload_base_url = url;
        }
        self.access_token = std::env::var("DRIVE_ACCESS_TOKEN")
            .ok()
            .and_then(|v| Credential::from_header_value(&v));
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !matches!(self.mode.as_str(), "server" | "stdio") {
            anyhow::bail!("Invalid MODE: {}. Must be 'server' or 'stdio'", self.mode);
        }
        if self.mode == "server" && self.port == 0 {
            anyhow::bail!("PORT cannot be 0");
        }
        for url in [&self.drive.api_base_url, &self.drive.upload_base_url] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                anyhow::bail!("Drive base URL must be http(s): {url}");
            }
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
