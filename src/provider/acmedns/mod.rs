use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    helpers::{http_client, parse_json},
    Provider, ProviderError, Retraction, REQUEST_TIMEOUT,
};
use crate::{
    record::{self, TxtRecord},
    zone::{Credential, ResolvedTarget},
};

/// Production endpoint of the Google ACME DNS API
pub const ACME_DNS_API_URL: &str = "https://acmedns.googleapis.com";

/// A [`Provider`] for the Google ACME DNS API.
///
/// The API only manages `_acme-challenge` TXT records. Records are added and removed through a single
/// `rotateChallenges` call per zone, authenticated with a per-zone access token.
///
/// To create a provider, use the [`AcmeDnsProvider::from_config()`] function.
#[non_exhaustive]
pub struct AcmeDnsProvider {
    client: Client,
    api_url: String,
    keep_expired_records: Option<bool>,
}

/// Configuration object for an [`AcmeDnsProvider`]. Must be supplied when creating a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AcmeDnsProviderConfig<'a> {
    /// Base URL of the API, without trailing path
    pub api_url: &'a str,
    /// Timeout for each API request
    pub timeout: Duration,
    /// Forwarded as `keepExpiredRecords` on every rotation if set
    pub keep_expired_records: Option<bool>,
}
impl Default for AcmeDnsProviderConfig<'_> {
    fn default() -> Self {
        AcmeDnsProviderConfig {
            api_url: ACME_DNS_API_URL,
            timeout: REQUEST_TIMEOUT,
            keep_expired_records: None,
        }
    }
}

/// A TXT record as represented by the ACME DNS API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcmeTxtRecord {
    pub fqdn: String,
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}
impl From<&TxtRecord> for AcmeTxtRecord {
    fn from(r: &TxtRecord) -> Self {
        AcmeTxtRecord {
            fqdn: r.host.to_owned(),
            digest: r.value.to_owned(),
            update_time: None,
        }
    }
}

/// All challenge records currently published for a zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AcmeChallengeSet {
    #[serde(default)]
    pub record: Vec<AcmeTxtRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RotateChallengesRequest<'a> {
    access_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    records_to_add: Option<&'a [AcmeTxtRecord]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    records_to_remove: Option<&'a [AcmeTxtRecord]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_expired_records: Option<bool>,
}

impl AcmeDnsProvider {
    pub fn try_new(config: &AcmeDnsProviderConfig) -> Result<AcmeDnsProvider, ProviderError> {
        Ok(AcmeDnsProvider {
            client: http_client(config.timeout)?,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            keep_expired_records: config.keep_expired_records,
        })
    }

    pub fn from_config(config: &AcmeDnsProviderConfig) -> Result<Box<dyn Provider>, ProviderError> {
        Ok(Box::new(AcmeDnsProvider::try_new(config)?))
    }

    /// Fetch the challenge records currently published for `zone`
    pub async fn challenge_set(&self, zone: &str) -> Result<AcmeChallengeSet, ProviderError> {
        let url = format!("{}/v1/acmeChallengeSets/{}", self.api_url, zone);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        parse_json(response).await
    }

    /// Add and/or remove challenge records of `zone` in a single request.
    /// Either side may be omitted, in which case it is left out of the request entirely.
    pub async fn rotate(
        &self,
        zone: &str,
        access_token: &str,
        add: Option<&[AcmeTxtRecord]>,
        remove: Option<&[AcmeTxtRecord]>,
        keep_expired: Option<bool>,
    ) -> Result<AcmeChallengeSet, ProviderError> {
        let url = format!(
            "{}/v1/acmeChallengeSets/{}:rotateChallenges",
            self.api_url, zone
        );
        let body = RotateChallengesRequest {
            access_token,
            records_to_add: add,
            records_to_remove: remove,
            keep_expired_records: keep_expired,
        };
        debug!(
            "POST {} (add: {:?}, remove: {:?})",
            url, body.records_to_add, body.records_to_remove
        );
        let response = self.client.post(&url).json(&body).send().await?;
        let set: AcmeChallengeSet = parse_json(response).await?;
        trace!("Challenge set for {} after rotation: {:?}", zone, set);
        Ok(set)
    }
}

fn access_token(target: &ResolvedTarget) -> Result<&str, ProviderError> {
    match &target.credential {
        Credential::Token(t) => Ok(t.as_str()),
        Credential::Basic { .. } => Err(ProviderError::Credential(format!(
            "zone {} needs an access token, not a username/password pair",
            target.zone
        ))),
    }
}

#[async_trait]
impl Provider for AcmeDnsProvider {
    fn name(&self) -> &'static str {
        "Google ACME DNS"
    }

    fn build_record(&self, _target: &ResolvedTarget, fqdn: &str, digest: &str) -> TxtRecord {
        record::rotate_record(fqdn, digest)
    }

    async fn publish(
        &self,
        target: &ResolvedTarget,
        record: &TxtRecord,
    ) -> Result<(), ProviderError> {
        let add = [AcmeTxtRecord::from(record)];
        self.rotate(
            &target.zone,
            access_token(target)?,
            Some(&add[..]),
            None,
            self.keep_expired_records,
        )
        .await?;
        debug!("Added record {} to zone {}", record, target.zone);
        Ok(())
    }

    async fn retract(
        &self,
        target: &ResolvedTarget,
        record: &TxtRecord,
    ) -> Result<Retraction, ProviderError> {
        let remove = [AcmeTxtRecord::from(record)];
        self.rotate(
            &target.zone,
            access_token(target)?,
            None,
            Some(&remove[..]),
            self.keep_expired_records,
        )
        .await?;
        debug!("Removed record {} from zone {}", record, target.zone);
        Ok(Retraction::Removed)
    }
}
