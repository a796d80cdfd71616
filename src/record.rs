//! Construction of ACME challenge TXT records.
//!
//! Digest and names are passed through untouched, validating them is up to the ACME client.

use std::fmt::Display;

/// Label under which dns-01 challenge records are published
pub const CHALLENGE_LABEL: &str = "_acme-challenge";

/// TTL (in seconds) for challenge records on providers that take one
pub const CHALLENGE_TTL: u32 = 300;

/// Provider-agnostic view of a challenge TXT record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxtRecord {
    /// Record name. Either fully qualified or relative to the zone, depending on the provider
    pub host: String,
    /// The challenge digest
    pub value: String,
    pub ttl: Option<u32>,
    /// Provider record id, only known after looking the record up in the live zone
    pub id: Option<i64>,
}
impl Display for TxtRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: TXT {}", self.host, self.value)
    }
}

/// Challenge host name for `label`, which may be empty
pub fn challenge_host(label: &str) -> String {
    if label.is_empty() {
        CHALLENGE_LABEL.to_string()
    } else {
        format!("{}.{}", CHALLENGE_LABEL, label)
    }
}

/// Record for providers addressing records by their fully qualified name
pub fn rotate_record(fqdn: &str, digest: &str) -> TxtRecord {
    TxtRecord {
        host: challenge_host(fqdn),
        value: digest.to_owned(),
        ttl: None,
        id: None,
    }
}

/// Record for providers addressing records relative to the zone
pub fn crud_record(subdomain: &str, digest: &str) -> TxtRecord {
    TxtRecord {
        host: challenge_host(subdomain),
        value: digest.to_owned(),
        ttl: Some(CHALLENGE_TTL),
        id: None,
    }
}
