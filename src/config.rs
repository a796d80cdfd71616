//! Loading of the on-disk hook configuration.
//!
//! The configuration is a JSON document (traditionally named `config.ini`). Its shape depends on the provider:
//! - [`ProviderKind::GoogleAcmeDns`]: `{ "domains": { "<zone>": "<token>", ... } }`
//! - [`ProviderKind::NameCom`]: `{ "username": "<user>", "token": "<token>", "domains": ["<zone>", ...] }`
//!
//! When no provider is selected explicitly, [`detect_kind`] picks it from that shape.
//!
//! Zones keep the order in which they appear in the file, as zone resolution is order dependent.

use std::{fs, path::Path};

use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::zone::{Credential, ZoneConfig, Zones};

/// Errors raised while loading the configuration or looking up credentials.
/// All of them are fatal for the current invocation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no `{0}` defined in config")]
    MissingKey(&'static str),
    #[error("invalid value for `{key}`: {msg}")]
    InvalidValue { key: String, msg: String },
    #[error("no token found for {0}")]
    MissingCredential(String),
}

/// The DNS provider a configuration is meant for
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Google ACME DNS, one token per zone
    GoogleAcmeDns,
    /// name.com, one account for all zones
    NameCom,
}

/// A loaded configuration: the provider it belongs to and its zones
#[derive(Debug)]
pub struct Config {
    pub kind: ProviderKind,
    pub zones: Zones,
}

// Raw file layouts. Every key is optional here so that a missing key can be reported by name.
#[derive(Debug, Deserialize)]
struct TokenPerZoneFile {
    domains: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct SharedAccountFile {
    username: Option<String>,
    token: Option<String>,
    domains: Option<Vec<String>>,
}

/// Read and parse the configuration file at `path`.
/// Without an explicit `kind`, the provider is detected from the file's shape.
pub fn load(path: &Path, kind: Option<ProviderKind>) -> Result<Config, ConfigError> {
    debug!("Reading configuration from {}", path.display());
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let kind = match kind {
        Some(k) => k,
        None => detect_kind(&raw)?,
    };
    let zones = parse(&raw, kind)?;
    Ok(Config { kind, zones })
}

/// Guess the provider from the layout of a configuration document:
/// a `domains` object maps zones to tokens (Google ACME DNS),
/// a `domains` list or a `username`/`token` pair is a name.com account
pub fn detect_kind(raw: &str) -> Result<ProviderKind, ConfigError> {
    let doc: Map<String, Value> = serde_json::from_str(raw)?;
    let kind = match doc.get("domains") {
        Some(Value::Object(_)) => ProviderKind::GoogleAcmeDns,
        Some(Value::Array(_)) => ProviderKind::NameCom,
        _ if doc.contains_key("username") || doc.contains_key("token") => ProviderKind::NameCom,
        Some(_) => {
            return Err(ConfigError::InvalidValue {
                key: "domains".to_string(),
                msg: "expected an object of zone tokens or a list of zones".to_string(),
            })
        }
        None => return Err(ConfigError::MissingKey("domains")),
    };
    debug!("Detected {:?} configuration", kind);
    Ok(kind)
}

/// Parse a configuration document
pub fn parse(raw: &str, kind: ProviderKind) -> Result<Zones, ConfigError> {
    let zones = match kind {
        ProviderKind::GoogleAcmeDns => parse_token_per_zone(serde_json::from_str(raw)?)?,
        ProviderKind::NameCom => parse_shared_account(serde_json::from_str(raw)?)?,
    };
    if zones.is_empty() {
        return Err(ConfigError::MissingKey("domains"));
    }
    debug!("Configured zones: {:?}", zones.names().collect::<Vec<_>>());
    Ok(zones)
}

fn parse_token_per_zone(file: TokenPerZoneFile) -> Result<Zones, ConfigError> {
    let domains = file.domains.ok_or(ConfigError::MissingKey("domains"))?;
    let zones = domains
        .into_iter()
        .map(|(name, token)| match token {
            Value::String(t) => Ok(ZoneConfig {
                name,
                credential: Credential::Token(t),
            }),
            _ => Err(ConfigError::InvalidValue {
                key: format!("domains.{}", name),
                msg: "token must be a string".to_string(),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Zones::new(zones))
}

fn parse_shared_account(file: SharedAccountFile) -> Result<Zones, ConfigError> {
    let username = file
        .username
        .filter(|u| !u.is_empty())
        .ok_or(ConfigError::MissingKey("username"))?;
    let password = file
        .token
        .filter(|t| !t.is_empty())
        .ok_or(ConfigError::MissingKey("token"))?;
    let domains = file.domains.ok_or(ConfigError::MissingKey("domains"))?;

    let credential = Credential::Basic { username, password };
    Ok(Zones::new(
        domains
            .into_iter()
            .map(|d| ZoneConfig {
                name: d.trim().to_owned(),
                credential: credential.clone(),
            })
            .collect(),
    ))
}
