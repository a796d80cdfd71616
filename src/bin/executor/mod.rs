use std::{path::Path, time::Duration};

use dns01_hook::{
    config::{self, ConfigError, ProviderKind},
    hook::{ChallengeRequest, Hook, HookError, Outcome},
    provider::{
        AcmeDnsProvider, AcmeDnsProviderConfig, NameComProvider, NameComProviderConfig, Provider,
        ProviderError, ACME_DNS_API_URL, NAME_COM_API_URL, REQUEST_TIMEOUT,
    },
    zone::Zones,
};
use log::{debug, info};
use thiserror::Error;

use crate::cli::Cli;

/// An executor performs the complete set of actions needed to answer a hook invocation
pub struct Executor {
    provider: Box<dyn Provider>,
    zones: Zones,
    propagation_delay: Duration,
}

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("`{0}`")]
    Config(ConfigError),
    #[error("`{0}`")]
    Provider(ProviderError),
    #[error("`{0}`")]
    Hook(HookError),
}
impl From<ConfigError> for ExecutorError {
    fn from(c: ConfigError) -> Self {
        ExecutorError::Config(c)
    }
}
impl From<ProviderError> for ExecutorError {
    fn from(p: ProviderError) -> Self {
        ExecutorError::Provider(p)
    }
}
impl From<HookError> for ExecutorError {
    fn from(h: HookError) -> Self {
        ExecutorError::Hook(h)
    }
}

impl Executor {
    /// Load the configuration and connect to the provider selected on the command line,
    /// or to the one the configuration file is written for
    pub fn try_new(cli: &Cli, config_path: &Path) -> Result<Executor, ExecutorError> {
        let config = config::load(config_path, cli.provider.map(ProviderKind::from))?;
        let provider = get_provider(cli, config.kind)?;
        debug!("Using provider {}", provider.name());
        Ok(Executor {
            provider,
            zones: config.zones,
            propagation_delay: Duration::from_secs(cli.propagation_delay),
        })
    }

    pub async fn run(&self, requests: &[ChallengeRequest]) -> Result<Vec<Outcome>, ExecutorError> {
        let hook = Hook::new(self.provider.as_ref(), &self.zones, self.propagation_delay);
        let outcomes = hook.run_all(requests).await?;
        for (request, outcome) in requests.iter().zip(&outcomes) {
            info!("{} {}: {:?}", request.verb, request.fqdn, outcome);
        }
        Ok(outcomes)
    }
}

fn get_provider(cli: &Cli, kind: ProviderKind) -> Result<Box<dyn Provider>, ProviderError> {
    match kind {
        ProviderKind::GoogleAcmeDns => AcmeDnsProvider::from_config(&AcmeDnsProviderConfig {
            api_url: cli.api_url.as_deref().unwrap_or(ACME_DNS_API_URL),
            timeout: REQUEST_TIMEOUT,
            keep_expired_records: cli.keep_expired_records,
        }),
        ProviderKind::NameCom => NameComProvider::from_config(&NameComProviderConfig {
            api_url: cli.api_url.as_deref().unwrap_or(NAME_COM_API_URL),
            timeout: REQUEST_TIMEOUT,
        }),
    }
}
