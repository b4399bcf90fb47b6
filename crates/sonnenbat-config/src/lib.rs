//! Configuration for the sonnenbat exporter.
//!
//! Process settings come from figment (defaults, optional TOML file,
//! `SONNENBAT_*` env). Battery sources come from comma-separated lists
//! (`SONNENBATTERIE_IPS` and friends) or, failing that, from `[[sources]]`
//! tables in the TOML file. Output is a `sonnenbat_core::CollectorConfig`.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use sonnenbat_core::{ApiFlavor, CollectorConfig, PowerSource, Source};

pub const DEFAULT_PORT: u16 = 9090;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Env var holding device addresses for the v2 flavor.
pub const IPS_VAR: &str = "SONNENBATTERIE_IPS";
/// Env var holding proxy base URLs for the proxy flavor.
pub const API_URLS_VAR: &str = "SONNENBATTERIE_API_URLS";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{variable} must be set")]
    MissingAddresses { variable: &'static str },

    #[error("number of addresses ({addresses}) must match number of tokens ({tokens})")]
    LengthMismatch { addresses: usize, tokens: usize },

    #[error("no valid batteries configured")]
    NoSources,

    #[error("battery name '{name}' is used more than once")]
    DuplicateName { name: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config structs ──────────────────────────────────────────────────

/// Process-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub api: ApiFlavor,

    #[serde(default)]
    pub power_source: PowerSource,

    /// Batteries from the config file. Ignored when an address list is set.
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            api: ApiFlavor::default(),
            power_source: PowerSource::default(),
            sources: Vec::new(),
        }
    }
}

fn default_listen() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// A `[[sources]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceEntry {
    pub name: String,
    /// IP, `host:port`, or full base URL.
    pub address: String,
    /// Plaintext token. Prefer the env list for secrets.
    pub token: Option<String>,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check settings that deserialize fine but cannot work at runtime.
    ///
    /// Run again after any override layered on top of [`load_config`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "timeout_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Combine these settings with resolved sources.
    pub fn collector_config(&self, sources: Vec<Source>) -> CollectorConfig {
        CollectorConfig {
            sources,
            power_source: self.power_source,
            timeout: self.timeout(),
        }
    }
}

// ── Config loading ──────────────────────────────────────────────────

/// Load settings from defaults, the optional TOML file, then `SONNENBAT_*`.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

    if let Some(path) = path {
        if !path.is_file() {
            return Err(ConfigError::MissingFile {
                path: path.to_path_buf(),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("SONNENBAT_").only(&[
        "listen",
        "port",
        "timeout_secs",
        "api",
        "power_source",
    ]));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ── Source resolution ───────────────────────────────────────────────

/// Raw comma-separated lists as read from the environment or CLI.
#[derive(Debug, Clone, Default)]
pub struct SourceLists {
    pub ips: Option<String>,
    pub tokens: Option<String>,
    pub names: Option<String>,
    pub api_urls: Option<String>,
}

/// Resolve the battery sources for `config.api`.
///
/// A non-empty address list wins over `[[sources]]` in the config file.
pub fn resolve_sources(config: &Config, lists: &SourceLists) -> Result<Vec<Source>, ConfigError> {
    let (addresses, tokens, variable) = match config.api {
        ApiFlavor::V2 => (lists.ips.as_deref(), lists.tokens.as_deref(), IPS_VAR),
        // The proxy takes no auth token.
        ApiFlavor::Proxy => (lists.api_urls.as_deref(), None, API_URLS_VAR),
    };

    let sources = match addresses.filter(|a| !a.trim().is_empty()) {
        Some(addresses) => sources_from_lists(addresses, tokens, lists.names.as_deref())?,
        None if !config.sources.is_empty() => sources_from_entries(&config.sources)?,
        None => return Err(ConfigError::MissingAddresses { variable }),
    };

    ensure_unique(&sources)?;
    Ok(sources)
}

/// Parse comma-separated address, token, and name lists.
///
/// Entries are trimmed. An entry with an empty address, or an empty token
/// when tokens are given, is skipped. Unnamed entries become
/// `battery<index>`, using the entry's position in the list.
pub fn sources_from_lists(
    addresses: &str,
    tokens: Option<&str>,
    names: Option<&str>,
) -> Result<Vec<Source>, ConfigError> {
    let addresses = split_list(addresses);
    let tokens = tokens.filter(|t| !t.trim().is_empty()).map(split_list);
    let names = names.map(split_list).unwrap_or_default();

    if let Some(tokens) = &tokens {
        if tokens.len() != addresses.len() {
            return Err(ConfigError::LengthMismatch {
                addresses: addresses.len(),
                tokens: tokens.len(),
            });
        }
    }

    let mut sources = Vec::with_capacity(addresses.len());
    for (index, address) in addresses.iter().enumerate() {
        let token = match &tokens {
            Some(tokens) => match tokens.get(index) {
                Some(token) if !token.is_empty() => Some(*token),
                _ => continue,
            },
            None => None,
        };
        if address.is_empty() {
            continue;
        }

        let name = names
            .get(index)
            .filter(|n| !n.is_empty())
            .map_or_else(|| format!("battery{index}"), |n| (*n).to_owned());

        sources.push(Source::new(
            name,
            parse_address(address)?,
            token.map(|t| SecretString::from(t.to_owned())),
        ));
    }

    if sources.is_empty() {
        return Err(ConfigError::NoSources);
    }
    Ok(sources)
}

fn sources_from_entries(entries: &[SourceEntry]) -> Result<Vec<Source>, ConfigError> {
    entries
        .iter()
        .map(|entry| {
            let name = entry.name.trim();
            if name.is_empty() {
                return Err(ConfigError::Validation {
                    field: "sources.name".into(),
                    reason: "must not be empty".into(),
                });
            }
            let token = entry
                .token
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| SecretString::from(t.to_owned()));
            Ok(Source::new(name, parse_address(entry.address.trim())?, token))
        })
        .collect()
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',').map(str::trim).collect()
}

/// Turn an IP, `host:port`, or URL into a base URL. Bare hosts get `http://`.
pub fn parse_address(raw: &str) -> Result<Url, ConfigError> {
    let candidate = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("http://{raw}")
    };
    let url = Url::parse(&candidate).map_err(|e| ConfigError::Validation {
        field: "address".into(),
        reason: format!("'{raw}': {e}"),
    })?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Validation {
            field: "address".into(),
            reason: format!("'{raw}' has no host"),
        });
    }
    Ok(url)
}

fn ensure_unique(sources: &[Source]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for source in sources {
        if !seen.insert(source.name.as_str()) {
            return Err(ConfigError::DuplicateName {
                name: source.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn names(sources: &[Source]) -> Vec<&str> {
        sources.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn single_battery_with_name() {
        let sources = sources_from_lists("192.168.1.100", Some("token123"), Some("home")).unwrap();
        assert_eq!(names(&sources), vec!["home"]);
        assert_eq!(sources[0].address(), "192.168.1.100");
        assert_eq!(
            sources[0].credential.as_ref().unwrap().expose_secret(),
            "token123"
        );
    }

    #[test]
    fn single_battery_without_name() {
        let sources = sources_from_lists("192.168.1.100", Some("token123"), Some("")).unwrap();
        assert_eq!(names(&sources), vec!["battery0"]);
    }

    #[test]
    fn multiple_batteries_with_spaces() {
        let sources = sources_from_lists(
            " 192.168.1.100 , 192.168.1.101 ",
            Some(" token1 , token2 "),
            Some(" house , garage "),
        )
        .unwrap();
        assert_eq!(names(&sources), vec!["house", "garage"]);
        assert_eq!(sources[1].address(), "192.168.1.101");
    }

    #[test]
    fn mismatched_ip_and_token_count() {
        let err = sources_from_lists("192.168.1.100,192.168.1.101", Some("token1"), None)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::LengthMismatch {
                addresses: 2,
                tokens: 1
            }
        ));
    }

    #[test]
    fn empty_values_skipped() {
        let sources = sources_from_lists(
            "192.168.1.100,,192.168.1.101",
            Some("token1,,token2"),
            Some("house,,garage"),
        )
        .unwrap();
        assert_eq!(names(&sources), vec!["house", "garage"]);
    }

    #[test]
    fn default_name_uses_list_position() {
        let sources = sources_from_lists(",192.168.1.101", None, None).unwrap();
        assert_eq!(names(&sources), vec!["battery1"]);
    }

    #[test]
    fn tokens_are_optional() {
        let sources = sources_from_lists("192.168.1.100", None, None).unwrap();
        assert!(sources[0].credential.is_none());
    }

    #[test]
    fn all_entries_empty_is_an_error() {
        let err = sources_from_lists(" , ", None, None).unwrap_err();
        assert!(matches!(err, ConfigError::NoSources));
    }

    #[test]
    fn missing_ips() {
        let lists = SourceLists {
            tokens: Some("token1".into()),
            ..SourceLists::default()
        };
        let err = resolve_sources(&Config::default(), &lists).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingAddresses {
                variable: "SONNENBATTERIE_IPS"
            }
        ));
    }

    #[test]
    fn proxy_uses_url_list_and_ignores_tokens() {
        let config = Config {
            api: ApiFlavor::Proxy,
            ..Config::default()
        };
        let lists = SourceLists {
            ips: Some("192.168.1.100".into()),
            tokens: Some("a,b,c".into()),
            api_urls: Some("http://proxy.local:8080".into()),
            ..SourceLists::default()
        };
        let sources = resolve_sources(&config, &lists).unwrap();
        assert_eq!(sources[0].endpoint.as_str(), "http://proxy.local:8080/");
        assert!(sources[0].credential.is_none());
    }

    #[test]
    fn duplicate_names_rejected() {
        let lists = SourceLists {
            ips: Some("10.0.0.1,10.0.0.2".into()),
            names: Some("house,house".into()),
            ..SourceLists::default()
        };
        let err = resolve_sources(&Config::default(), &lists).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { ref name } if name == "house"));
    }

    #[test]
    fn file_sources_used_when_no_list() {
        let config = Config {
            sources: vec![SourceEntry {
                name: "house".into(),
                address: "https://battery.local".into(),
                token: Some(" ".into()),
            }],
            ..Config::default()
        };
        let sources = resolve_sources(&config, &SourceLists::default()).unwrap();
        assert_eq!(names(&sources), vec!["house"]);
        assert_eq!(sources[0].endpoint.scheme(), "https");
        assert!(sources[0].credential.is_none());
    }

    #[test]
    fn address_forms() {
        assert_eq!(
            parse_address("192.168.1.100").unwrap().as_str(),
            "http://192.168.1.100/"
        );
        assert_eq!(parse_address("10.0.0.5:8080").unwrap().port(), Some(8080));
        assert_eq!(
            parse_address("http://proxy/base").unwrap().path(),
            "/base"
        );
        assert!(parse_address("http://").is_err());
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.port, 9090);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9090");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.api, ApiFlavor::V2);
        assert_eq!(config.power_source, PowerSource::Status);
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "timeout_secs")
        );
    }
}
