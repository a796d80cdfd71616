//! The hook controller, mapping hook invocations onto provider calls.
//!
//! ACME clients call the hook with a verb and its arguments. Only two verbs are acted upon:
//! - `deploy_challenge`: publish the challenge record, then wait for it to propagate
//! - `clean_challenge`: remove the challenge record, if it is still present
//!
//! Every other verb (`startup_hook`, `deploy_cert`, ...) is accepted and ignored.

use std::{fmt::Display, time::Duration};

use itertools::Itertools;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::time::sleep;

use crate::{
    config::ConfigError,
    provider::{Provider, ProviderError, Retraction},
    zone::Zones,
};

/// Time to wait after publishing a record before the ACME client may validate it
pub const PROPAGATION_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HookVerb {
    Deploy,
    Clean,
    Unknown(String),
}
impl HookVerb {
    pub fn parse(verb: &str) -> Self {
        match verb.trim() {
            "deploy_challenge" => HookVerb::Deploy,
            "clean_challenge" => HookVerb::Clean,
            other => HookVerb::Unknown(other.to_owned()),
        }
    }
}
impl Display for HookVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookVerb::Deploy => write!(f, "deploy_challenge"),
            HookVerb::Clean => write!(f, "clean_challenge"),
            HookVerb::Unknown(v) => write!(f, "{}", v),
        }
    }
}

/// A single challenge to deploy or clean
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChallengeRequest {
    pub verb: HookVerb,
    pub fqdn: String,
    pub digest: String,
}

impl ChallengeRequest {
    pub fn new(verb: HookVerb, fqdn: &str, digest: &str) -> Self {
        ChallengeRequest {
            verb,
            fqdn: fqdn.trim().to_owned(),
            digest: digest.trim().to_owned(),
        }
    }

    /// Build the requests for a hook invocation.
    ///
    /// `args` are the arguments following the verb: `<fqdn> <token-file> <digest>`, repeated once per domain
    /// when the client chains hook calls. The token file name is not used. Incomplete trailing groups are dropped,
    /// unless there is no complete group at all, in which case missing values are left empty.
    pub fn from_args(verb: &str, args: &[String]) -> Vec<ChallengeRequest> {
        let verb = HookVerb::parse(verb);
        let requests = args
            .iter()
            .tuples()
            .map(|(fqdn, _, digest)| ChallengeRequest::new(verb.clone(), fqdn, digest))
            .collect::<Vec<_>>();
        if !requests.is_empty() {
            return requests;
        }
        let arg = |i: usize| args.get(i).map(String::as_str).unwrap_or_default();
        vec![ChallengeRequest::new(verb, arg(0), arg(2))]
    }
}

/// Successful result of handling a [`ChallengeRequest`]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The challenge record was published
    Deployed,
    /// The challenge record was removed
    Cleaned,
    /// There was no challenge record to remove
    NothingToClean,
    /// The verb is not handled by this hook
    Ignored,
}

#[derive(Error, Debug)]
pub enum HookError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Dispatches challenge requests to a [`Provider`]
pub struct Hook<'a> {
    provider: &'a dyn Provider,
    zones: &'a Zones,
    propagation_delay: Duration,
}

impl<'a> Hook<'a> {
    pub fn new(provider: &'a dyn Provider, zones: &'a Zones, propagation_delay: Duration) -> Self {
        Hook {
            provider,
            zones,
            propagation_delay,
        }
    }

    /// Handle a single request
    pub async fn run(&self, request: &ChallengeRequest) -> Result<Outcome, HookError> {
        let mut outcomes = self.run_all(std::slice::from_ref(request)).await?;
        Ok(outcomes.pop().unwrap_or(Outcome::Ignored))
    }

    /// Handle all requests in order.
    /// Deploys stop at the first failure. Cleans are attempted for every request and the first failure is
    /// returned afterwards. If any record was published, the propagation delay is awaited once after the last request.
    pub async fn run_all(&self, requests: &[ChallengeRequest]) -> Result<Vec<Outcome>, HookError> {
        let mut outcomes = Vec::with_capacity(requests.len());
        let mut first_error = None;
        for request in requests {
            match self.dispatch(request).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) if request.verb == HookVerb::Clean => {
                    warn!("Failed to clean challenge for {}: {}", request.fqdn, e);
                    first_error.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }
        if outcomes.contains(&Outcome::Deployed) {
            self.wait_for_propagation().await;
        }
        Ok(outcomes)
    }

    async fn dispatch(&self, request: &ChallengeRequest) -> Result<Outcome, HookError> {
        match request.verb {
            HookVerb::Deploy => {
                let target = self.zones.resolve(&request.fqdn)?;
                let record = self
                    .provider
                    .build_record(&target, &request.fqdn, &request.digest);
                info!(
                    "Deploying challenge for {} to {} zone {}",
                    request.fqdn,
                    self.provider.name(),
                    target.zone
                );
                self.provider.publish(&target, &record).await?;
                Ok(Outcome::Deployed)
            }
            HookVerb::Clean => {
                let target = self.zones.resolve(&request.fqdn)?;
                let record = self
                    .provider
                    .build_record(&target, &request.fqdn, &request.digest);
                info!(
                    "Cleaning challenge for {} from {} zone {}",
                    request.fqdn,
                    self.provider.name(),
                    target.zone
                );
                match self.provider.retract(&target, &record).await? {
                    Retraction::Removed => Ok(Outcome::Cleaned),
                    Retraction::NotPresent => Ok(Outcome::NothingToClean),
                }
            }
            HookVerb::Unknown(ref verb) => {
                debug!("Ignoring hook {:?}", verb);
                Ok(Outcome::Ignored)
            }
        }
    }

    async fn wait_for_propagation(&self) {
        info!(
            "Waiting {}s for propagation",
            self.propagation_delay.as_secs()
        );
        sleep(self.propagation_delay).await;
    }
}
