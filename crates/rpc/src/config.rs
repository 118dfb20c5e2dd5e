//! Connection settings for the gateway client.

use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::{Context, Result, anyhow};
use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use url::Url;

/// Hostnames that may be reached over plain HTTP without `insecure`.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1", "::1"];

/// Default gateway address used when neither flag, env, nor config file
/// provides one.
pub const DEFAULT_ADDR: &str = "localhost:10006";

/// Connection settings for one shell session.
///
/// Resolution order is flags, then environment (`FLOWSH_ADDR`,
/// `FLOWSH_USER`, `FLOWSH_PASSWORD`), then the JSON config file; the
/// binary owns that layering and hands the resolved struct here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    /// Gateway address as `host:port`, or a full URL when a scheme is given.
    pub address: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    /// Allow plain HTTP for non-localhost gateways.
    #[serde(default)]
    pub insecure: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDR.into(),
            user: String::new(),
            password: String::new(),
            insecure: false,
        }
    }
}

impl ShellConfig {
    /// Load settings from a JSON config file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Resolve the address into a validated base URL.
    ///
    /// A bare `host:port` gets `http://` for localhost and `https://`
    /// otherwise (`http://` when `insecure` is set). An explicit scheme is
    /// kept as given and validated.
    pub fn base_url(&self) -> Result<String> {
        let base = if self.address.contains("://") {
            self.address.clone()
        } else if self.is_local_address() || self.insecure {
            format!("http://{}", self.address)
        } else {
            format!("https://{}", self.address)
        };
        validate_base_url(&base, self.insecure)?;
        Ok(base.trim_end_matches('/').to_string())
    }

    fn is_local_address(&self) -> bool {
        let host = self.address.rsplit_once(':').map_or(self.address.as_str(), |(h, _)| h);
        LOCALHOST_DOMAINS.iter().any(|&local| host.eq_ignore_ascii_case(local))
    }
}

/// Validate that a base URL is acceptable for gateway use.
///
/// Rules:
/// - `localhost`/`127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS unless `insecure` was requested
fn validate_base_url(base: &str, insecure: bool) -> Result<()> {
    let parsed = Url::parse(base).map_err(|e| anyhow!("invalid gateway address '{}': {}", base, e))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("gateway address '{}' must include a host", base))?;

    if LOCALHOST_DOMAINS.iter().any(|&local| host.eq_ignore_ascii_case(local)) {
        return Ok(());
    }

    if parsed.scheme() != "https" && !insecure {
        return Err(anyhow!(
            "gateway address '{}' must use https for non-localhost hosts; pass --insecure to override",
            base
        ));
    }

    Ok(())
}

/// Get the default path for the shell configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var("FLOWSH_CONFIG_PATH")
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flowsh")
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(address: &str, insecure: bool) -> ShellConfig {
        ShellConfig {
            address: address.into(),
            insecure,
            ..Default::default()
        }
    }

    #[test]
    fn localhost_defaults_to_http() {
        assert_eq!(config("localhost:10006", false).base_url().expect("valid"), "http://localhost:10006");
        assert_eq!(config("127.0.0.1:8080", false).base_url().expect("valid"), "http://127.0.0.1:8080");
    }

    #[test]
    fn remote_hosts_default_to_https() {
        assert_eq!(
            config("node.example.com:10006", false).base_url().expect("valid"),
            "https://node.example.com:10006"
        );
    }

    #[test]
    fn explicit_http_scheme_requires_insecure_for_remote_hosts() {
        assert!(config("http://node.example.com:10006", false).base_url().is_err());
        assert_eq!(
            config("http://node.example.com:10006", true).base_url().expect("valid"),
            "http://node.example.com:10006"
        );
    }

    #[test]
    fn explicit_localhost_scheme_is_kept() {
        assert_eq!(
            config("http://localhost:9000", false).base_url().expect("valid"),
            "http://localhost:9000"
        );
    }

    #[test]
    fn hostless_or_malformed_addresses_are_rejected() {
        assert!(config("https://", false).base_url().is_err());
    }

    #[test]
    fn config_file_round_trip() {
        let json = r#"{"address": "node.example.com:10006", "user": "ops"}"#;
        let parsed: ShellConfig = serde_json::from_str(json).expect("deserialize");
        assert_eq!(parsed.address, "node.example.com:10006");
        assert_eq!(parsed.user, "ops");
        assert!(parsed.password.is_empty());
        assert!(!parsed.insecure);
    }
}
