//! DNS providers that can publish and retract challenge records.
//!
//! Every provider implements the [`Provider`] trait. Two are currently available:
//! - [`AcmeDnsProvider`]: Google ACME DNS, rotating a zone's challenge set in a single call
//! - [`NameComProvider`]: the name.com record API (list, create, delete)

mod acmedns;
mod helpers;
mod namecom;

#[cfg(test)]
use mockall::automock;

// Re-exports for convenience
pub use self::acmedns::{
    AcmeChallengeSet, AcmeDnsProvider, AcmeDnsProviderConfig, AcmeTxtRecord, ACME_DNS_API_URL,
};
pub use self::namecom::{
    NameComProvider, NameComProviderConfig, NameComRecord, NAME_COM_API_URL, NAME_COM_DEV_API_URL,
};

use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use thiserror::Error;

use crate::{record::TxtRecord, zone::ResolvedTarget};

/// Timeout applied to every outbound API request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A provider is a DNS service (Google ACME DNS, name.com, ...) that can serve challenge records.
///
/// Records are built by the provider itself through [`Provider::build_record()`], as every API
/// expects a different record naming scheme.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short, human-readable provider name
    fn name(&self) -> &'static str;

    /// Build the challenge record for `fqdn` in the shape this provider expects
    fn build_record(&self, target: &ResolvedTarget, fqdn: &str, digest: &str) -> TxtRecord;

    /// Publish a challenge record in the target zone
    async fn publish(&self, target: &ResolvedTarget, record: &TxtRecord)
        -> Result<(), ProviderError>;

    /// Remove a challenge record from the target zone.
    /// A record that does not exist (anymore) is not an error.
    async fn retract(
        &self,
        target: &ResolvedTarget,
        record: &TxtRecord,
    ) -> Result<Retraction, ProviderError>;
}

/// Result of a successful [`Provider::retract()`] call
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Retraction {
    /// The record was removed
    Removed,
    /// No matching record was present, nothing to do
    NotPresent,
}

/// Errors returned by provider actions
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The request could not be sent or no response was received
    #[error("request failed: {0}")]
    Transport(String),
    /// The API answered with a non-success status
    #[error("[{status}] {body}")]
    Api { status: StatusCode, body: String },
    /// The response body could not be parsed
    #[error("unable to parse response: {0}")]
    Decode(String),
    /// No matching record exists in the zone
    #[error("no record found for {0}")]
    NotFound(String),
    /// The configured credential cannot be used with this provider
    #[error("unsupported credential: {0}")]
    Credential(String),
    /// The HTTP client could not be set up
    #[error("unable to create HTTP client: {0}")]
    Client(String),
}
