mod types;

pub use types::NameComRecord;

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::{Client, RequestBuilder};

use self::types::{select_by_host, ListRecordsResponse};
use super::{
    helpers::{expect_success, http_client, parse_json},
    Provider, ProviderError, Retraction, REQUEST_TIMEOUT,
};
use crate::{
    record::{self, TxtRecord},
    zone::{Credential, ResolvedTarget},
};

/// Production endpoint of the name.com API
pub const NAME_COM_API_URL: &str = "https://api.name.com";
/// Sandbox endpoint of the name.com API, for testing with development credentials
pub const NAME_COM_DEV_API_URL: &str = "https://api.dev.name.com";

const NAME_COM_RECORD_PAGE_SIZE: u32 = 1000;

/// A [`Provider`] for the name.com v4 DNS API.
///
/// Records are created with a single request, while deleting one requires looking up its id first.
/// All requests authenticate with the account username and API token through HTTP Basic auth.
///
/// To create a provider, use the [`NameComProvider::from_config()`] function.
#[non_exhaustive]
pub struct NameComProvider {
    client: Client,
    api_url: String,
}

/// Configuration object for a [`NameComProvider`]. Must be supplied when creating a provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameComProviderConfig<'a> {
    /// Base URL of the API, see [`NAME_COM_API_URL`] and [`NAME_COM_DEV_API_URL`]
    pub api_url: &'a str,
    /// Timeout for each API request
    pub timeout: Duration,
}
impl Default for NameComProviderConfig<'_> {
    fn default() -> Self {
        NameComProviderConfig {
            api_url: NAME_COM_API_URL,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl NameComProvider {
    pub fn try_new(config: &NameComProviderConfig) -> Result<NameComProvider, ProviderError> {
        Ok(NameComProvider {
            client: http_client(config.timeout)?,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn from_config(config: &NameComProviderConfig) -> Result<Box<dyn Provider>, ProviderError> {
        Ok(Box::new(NameComProvider::try_new(config)?))
    }

    fn records_url(&self, zone: &str) -> String {
        format!("{}/v4/domains/{}/records", self.api_url, zone)
    }

    /// Return all records of the target zone, following pagination
    pub async fn list(&self, target: &ResolvedTarget) -> Result<Vec<NameComRecord>, ProviderError> {
        let url = self.records_url(&target.zone);
        let mut page = 1;
        let mut records = Vec::new();

        loop {
            debug!("GET {} (page {})", url, page);
            let request = self.client.get(&url).query(&[
                ("page", page),
                ("perPage", NAME_COM_RECORD_PAGE_SIZE),
            ]);
            let response: ListRecordsResponse =
                parse_json(authenticate(request, target)?.send().await?).await?;
            records.extend(response.records);

            match response.next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }
        trace!("Collected records for {}: {:?}", target.zone, records);
        Ok(records)
    }

    /// Find the TXT record named `fqdn` in the target zone.
    /// If several records have that name, the one whose answer is `answer` is preferred.
    pub async fn find_by_host(
        &self,
        target: &ResolvedTarget,
        fqdn: &str,
        answer: Option<&str>,
    ) -> Result<TxtRecord, ProviderError> {
        select_by_host(self.list(target).await?, &target.zone, fqdn, answer)
            .map(TxtRecord::from)
            .ok_or_else(|| ProviderError::NotFound(fqdn.to_owned()))
    }

    /// Create a record in the target zone, returning it as stored by name.com
    pub async fn create(
        &self,
        target: &ResolvedTarget,
        record: &TxtRecord,
    ) -> Result<NameComRecord, ProviderError> {
        let url = self.records_url(&target.zone);
        debug!("POST {} ({})", url, record);
        let request = self.client.post(&url).json(&NameComRecord::from(record));
        parse_json(authenticate(request, target)?.send().await?).await
    }

    /// Delete the record with id `id` from the target zone
    pub async fn delete(&self, target: &ResolvedTarget, id: i64) -> Result<(), ProviderError> {
        let url = format!("{}/{}", self.records_url(&target.zone), id);
        debug!("DELETE {}", url);
        let request = self.client.delete(&url);
        expect_success(authenticate(request, target)?.send().await?).await
    }
}

fn authenticate(
    request: RequestBuilder,
    target: &ResolvedTarget,
) -> Result<RequestBuilder, ProviderError> {
    match &target.credential {
        Credential::Basic { username, password } => Ok(request.basic_auth(username, Some(password))),
        Credential::Token(_) => Err(ProviderError::Credential(format!(
            "zone {} needs a username and token, not a per-zone access token",
            target.zone
        ))),
    }
}

#[async_trait]
impl Provider for NameComProvider {
    fn name(&self) -> &'static str {
        "name.com"
    }

    fn build_record(&self, target: &ResolvedTarget, _fqdn: &str, digest: &str) -> TxtRecord {
        record::crud_record(&target.subdomain, digest)
    }

    async fn publish(
        &self,
        target: &ResolvedTarget,
        record: &TxtRecord,
    ) -> Result<(), ProviderError> {
        let created = self.create(target, record).await?;
        debug!(
            "Created record {} with id {:?} in zone {}",
            record, created.id, target.zone
        );
        Ok(())
    }

    async fn retract(
        &self,
        target: &ResolvedTarget,
        record: &TxtRecord,
    ) -> Result<Retraction, ProviderError> {
        let fqdn = format!("{}.{}", record.host, target.zone);
        let found = match self.find_by_host(target, &fqdn, Some(&record.value)).await {
            Ok(found) => found,
            Err(ProviderError::NotFound(_)) => {
                debug!("No record {} in zone {}, nothing to delete", fqdn, target.zone);
                return Ok(Retraction::NotPresent);
            }
            Err(e) => return Err(e),
        };
        let id = found.id.ok_or_else(|| {
            ProviderError::Decode(format!("record {} was returned without an id", fqdn))
        })?;
        self.delete(target, id).await?;
        debug!(
            "Deleted record {} with id {} from zone {}",
            fqdn, id, target.zone
        );
        Ok(Retraction::Removed)
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider(server: &MockServer) -> NameComProvider {
        NameComProvider::try_new(&NameComProviderConfig {
            api_url: &server.uri(),
            ..Default::default()
        })
        .unwrap()
    }

    fn target(subdomain: &str) -> ResolvedTarget {
        ResolvedTarget {
            zone: "example.com".to_string(),
            subdomain: subdomain.to_string(),
            credential: Credential::Basic {
                username: "u".to_string(),
                password: "t".to_string(),
            },
        }
    }

    fn challenge(id: i64, host: &str, answer: &str) -> serde_json::Value {
        json!({
            "id": id,
            "domainName": "example.com",
            "host": host,
            "fqdn": format!("{}.example.com.", host),
            "type": "TXT",
            "answer": answer,
            "ttl": 300
        })
    }

    #[test]
    fn should_build_relative_record() {
        let p = NameComProvider::try_new(&NameComProviderConfig::default()).unwrap();
        let rec = p.build_record(&target("foo"), "foo.example.com", "abc");
        assert_eq!(rec.host, "_acme-challenge.foo");
        assert_eq!(rec.ttl, Some(300));
        let rec = p.build_record(&target(""), "example.com", "abc");
        assert_eq!(rec.host, "_acme-challenge");
    }

    #[tokio::test]
    async fn should_create_record_with_basic_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v4/domains/example.com/records"))
            .and(basic_auth("u", "t"))
            .and(body_json(json!({
                "host": "_acme-challenge.foo",
                "type": "TXT",
                "answer": "abc",
                "ttl": 300
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(challenge(42, "_acme-challenge.foo", "abc")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let p = provider(&server);
        let rec = p.build_record(&target("foo"), "foo.example.com", "abc");
        let created = p.create(&target("foo"), &rec).await.unwrap();
        assert_eq!(created.id, Some(42));
    }

    #[tokio::test]
    async fn should_follow_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/domains/example.com/records"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [challenge(1, "_acme-challenge.a", "one")],
                "nextPage": 2,
                "lastPage": 2
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v4/domains/example.com/records"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [challenge(2, "_acme-challenge.b", "two")]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let records = provider(&server).list(&target("a")).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, Some(2));
    }

    #[tokio::test]
    async fn should_delete_found_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/domains/example.com/records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [
                    challenge(7, "_acme-challenge.bar", "other"),
                    challenge(8, "_acme-challenge.foo", "abc")
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v4/domains/example.com/records/8"))
            .and(basic_auth("u", "t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let p = provider(&server);
        let rec = p.build_record(&target("foo"), "foo.example.com", "abc");
        assert_eq!(
            p.retract(&target("foo"), &rec).await.unwrap(),
            Retraction::Removed
        );
    }

    #[tokio::test]
    async fn should_delete_record_with_matching_answer_among_shared_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/domains/example.com/records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [
                    challenge(3, "_acme-challenge", "wildcard"),
                    challenge(4, "_acme-challenge", "apex")
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v4/domains/example.com/records/4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v4/domains/example.com/records/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let p = provider(&server);
        let rec = p.build_record(&target(""), "example.com", "apex");
        assert_eq!(
            p.retract(&target(""), &rec).await.unwrap(),
            Retraction::Removed
        );
    }

    #[tokio::test]
    async fn should_treat_missing_record_as_retracted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/domains/example.com/records"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let p = provider(&server);
        let rec = p.build_record(&target("foo"), "foo.example.com", "abc");
        assert_eq!(
            p.retract(&target("foo"), &rec).await.unwrap(),
            Retraction::NotPresent
        );
    }

    #[tokio::test]
    async fn should_report_not_found_on_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        assert!(matches!(
            provider(&server)
                .find_by_host(&target("foo"), "_acme-challenge.foo.example.com", None)
                .await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_fail_retract_when_delete_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [challenge(8, "_acme-challenge.foo", "abc")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let p = provider(&server);
        let rec = p.build_record(&target("foo"), "foo.example.com", "abc");
        match p.retract(&target("foo"), &rec).await {
            Err(ProviderError::Api { status, body }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "internal error");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn should_fail_retract_when_listing_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "Unauthenticated"
            })))
            .mount(&server)
            .await;

        let p = provider(&server);
        let rec = p.build_record(&target("foo"), "foo.example.com", "abc");
        assert!(p.retract(&target("foo"), &rec).await.is_err());
    }

    #[tokio::test]
    async fn should_reject_token_credentials() {
        let p = NameComProvider::try_new(&NameComProviderConfig::default()).unwrap();
        let mut t = target("foo");
        t.credential = Credential::Token("TOKEN".to_string());
        let rec = p.build_record(&t, "foo.example.com", "abc");
        assert!(matches!(
            p.publish(&t, &rec).await,
            Err(ProviderError::Credential(_))
        ));
    }
}
