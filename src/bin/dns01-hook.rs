mod cli;
mod executor;

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use env_logger::Builder;
use log::{debug, error, info};

use dns01_hook::hook::{ChallengeRequest, HookVerb};

use cli::{Cli, DEFAULT_CONFIG_FILE};
use executor::Executor;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    Builder::new().filter_level(cli.loglevel.into()).init();

    let requests = ChallengeRequest::from_args(cli.hook.as_deref().unwrap_or_default(), &cli.args);
    if requests
        .iter()
        .all(|r| matches!(r.verb, HookVerb::Unknown(_)))
    {
        debug!("Nothing to do for hook {:?}", cli.hook);
        return ExitCode::SUCCESS;
    }

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let executor = match Executor::try_new(&cli, &config_path) {
        Ok(e) => e,
        Err(e) => {
            error!("Unable to set up hook: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match executor.run(&requests).await {
        Ok(_) => {
            info!("Completed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Hook failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

// The configuration lives next to the hook executable, not in the working directory of the ACME client
fn default_config_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_CONFIG_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
