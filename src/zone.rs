//! Managed zones and the credentials that unlock them.
//!
//! A challenge fqdn is mapped onto a configured zone with [`resolve_zone()`]. The first zone
//! (in configuration order) whose name appears anywhere in the fqdn wins, so `example.com`
//! also matches `notexample.com` and overlapping zones are decided by file order, not by length.
//! Unmatched names resolve to [`UNKNOWN_ZONE`], which never has a credential attached.

use std::fmt::Debug;

use log::{debug, trace};

use crate::config::ConfigError;

/// Zone name returned by [`resolve_zone()`] when no configured zone matches
pub const UNKNOWN_ZONE: &str = "unknown";

/// Secret used to authenticate requests for a zone
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Credential {
    /// Opaque per-zone access token
    Token(String),
    /// Account-wide username and API token, sent as HTTP Basic auth
    Basic { username: String, password: String },
}
// Manual impl so that secrets never end up in log output
impl Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Token(_) => write!(f, "Token(***)"),
            Credential::Basic { username, .. } => {
                write!(f, "Basic {{ username: {:?}, password: *** }}", username)
            }
        }
    }
}

/// A single managed DNS zone
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZoneConfig {
    pub name: String,
    pub credential: Credential,
}

/// The configured zones, in the order they were declared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zones {
    zones: Vec<ZoneConfig>,
}

/// An fqdn resolved against the configured zones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Name of the owning zone
    pub zone: String,
    /// Labels in front of the zone name, empty for the zone apex
    pub subdomain: String,
    pub credential: Credential,
}

impl Zones {
    pub fn new(zones: Vec<ZoneConfig>) -> Self {
        Zones { zones }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.zones.iter().map(|z| z.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Return the credential for a configured zone
    pub fn credential_for(&self, zone: &str) -> Result<&Credential, ConfigError> {
        self.zones
            .iter()
            .find(|z| z.name == zone)
            .map(|z| &z.credential)
            .ok_or_else(|| ConfigError::MissingCredential(zone.to_owned()))
    }

    /// Find the zone, subdomain and credential for a challenge fqdn.
    ///
    /// Names that match no zone resolve to [`UNKNOWN_ZONE`] and therefore fail the credential lookup.
    pub fn resolve(&self, fqdn: &str) -> Result<ResolvedTarget, ConfigError> {
        let zone = resolve_zone(fqdn, self.names());
        let credential = self.credential_for(zone)?.clone();
        let target = ResolvedTarget {
            zone: zone.to_owned(),
            subdomain: subdomain(fqdn, zone),
            credential,
        };
        debug!(
            "Resolved {} to zone {} (subdomain: {:?})",
            fqdn, target.zone, target.subdomain
        );
        Ok(target)
    }
}

/// Return the first zone name contained in `fqdn`, or [`UNKNOWN_ZONE`]
pub fn resolve_zone<'a>(fqdn: &str, zones: impl IntoIterator<Item = &'a str>) -> &'a str {
    if fqdn.is_empty() {
        return UNKNOWN_ZONE;
    }
    for zone in zones {
        trace!("Checking zone {} for {}", zone, fqdn);
        if fqdn.contains(zone) {
            return zone;
        }
    }
    UNKNOWN_ZONE
}

/// Strip the zone from an fqdn, returning the remaining labels
pub fn subdomain(fqdn: &str, zone: &str) -> String {
    if fqdn.trim() == zone.trim() {
        return String::new();
    }
    fqdn.replacen(&format!(".{}", zone), "", 1)
        .trim()
        .to_owned()
}
