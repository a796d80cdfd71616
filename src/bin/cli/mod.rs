use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use dns01_hook::config::ProviderKind;
use log::LevelFilter;

macro_rules! env_prefix {
    () => {
        "DNS01_HOOK_"
    };
}

/// The configuration file name, looked up next to the executable unless `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "config.ini";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Hook verb passed by the ACME client. Only deploy_challenge and clean_challenge are acted upon
    #[arg(value_name = "HOOK")]
    pub hook: Option<String>,

    /// Hook arguments: <DOMAIN> <TOKEN_FILENAME> <TOKEN_VALUE>, repeated for chained hook calls
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,

    /// DNS provider to use. Detected from the configuration file when not given
    #[arg(
        value_enum,
        short = 'p',
        long,
        env = concat!(env_prefix!(), "PROVIDER")
    )]
    pub provider: Option<Provider>,

    /// Path to the JSON configuration file. Defaults to config.ini next to the executable
    #[arg(
        short = 'c',
        long,
        value_name = "FILE",
        env = concat!(env_prefix!(), "CONFIG")
    )]
    pub config: Option<PathBuf>,

    /// Set the loglevel of the application
    #[arg(
        value_enum,
        short = 'l',
        long,
        default_value_t = Loglevel::Info,
        value_name = "LEVEL",
        env = concat!(env_prefix!(), "LOGLEVEL")
    )]
    pub loglevel: Loglevel,

    /// Time to wait after deploying a challenge, in seconds
    #[arg(
        long,
        default_value_t = 30,
        value_name = "SECONDS",
        env = concat!(env_prefix!(), "PROPAGATION_DELAY")
    )]
    pub propagation_delay: u64,

    /// Override the provider API endpoint, e.g. https://api.dev.name.com for the name.com sandbox
    #[arg(
        long,
        value_name = "URL",
        env = concat!(env_prefix!(), "API_URL")
    )]
    pub api_url: Option<String>,

    /// Google ACME DNS only: whether expired challenge records should be kept on rotation
    #[arg(
        long,
        value_name = "BOOL",
        env = concat!(env_prefix!(), "KEEP_EXPIRED_RECORDS")
    )]
    pub keep_expired_records: Option<bool>,
}

/// Used to set the applications loglevel
// This is essentially a re-creation of log:Level. However, that enum doesn't derive ValueEnum, so we have to do it manually here
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ValueEnum)]
pub enum Loglevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
impl From<Loglevel> for LevelFilter {
    fn from(ll: Loglevel) -> Self {
        match ll {
            Loglevel::Error => LevelFilter::Error,
            Loglevel::Warn => LevelFilter::Warn,
            Loglevel::Info => LevelFilter::Info,
            Loglevel::Debug => LevelFilter::Debug,
            Loglevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Which dns provider to use
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ValueEnum)]
pub enum Provider {
    GoogleAcmeDns,
    NameCom,
}
impl From<Provider> for ProviderKind {
    fn from(value: Provider) -> Self {
        match value {
            Provider::GoogleAcmeDns => ProviderKind::GoogleAcmeDns,
            Provider::NameCom => ProviderKind::NameCom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_hook_arguments() {
        let cli = Cli::try_parse_from([
            "dns01-hook",
            "--provider",
            "name-com",
            "deploy_challenge",
            "foo.example.com",
            "-",
            "-abc_DEF",
        ])
        .unwrap();
        assert_eq!(cli.hook.as_deref(), Some("deploy_challenge"));
        assert_eq!(cli.args, vec!["foo.example.com", "-", "-abc_DEF"]);
        assert_eq!(cli.provider, Some(Provider::NameCom));
        assert_eq!(cli.propagation_delay, 30);
    }

    #[test]
    fn should_accept_plain_hook_invocation_without_provider() {
        std::env::remove_var("DNS01_HOOK_PROVIDER");
        for argv in [
            ["dns01-hook", "unknown_hook", "a.example.com", "-", "x"],
            ["dns01-hook", "deploy_challenge", "foo.example.com", "-", "abc"],
            ["dns01-hook", "clean_challenge", "foo.example.com", "-", "abc"],
        ] {
            let cli = Cli::try_parse_from(argv).unwrap();
            assert_eq!(cli.hook.as_deref(), Some(argv[1]));
            assert_eq!(cli.args, argv[2..].to_vec());
            assert_eq!(cli.provider, None);
        }
    }

    #[test]
    fn should_accept_missing_hook() {
        let cli = Cli::try_parse_from(["dns01-hook", "-p", "google-acme-dns"]).unwrap();
        assert_eq!(cli.hook, None);
        assert!(cli.args.is_empty());
    }

    #[test]
    fn should_accept_lifecycle_hooks_with_many_arguments() {
        let cli = Cli::try_parse_from([
            "dns01-hook",
            "-p",
            "name-com",
            "deploy_cert",
            "example.com",
            "/etc/ssl/privkey.pem",
            "/etc/ssl/cert.pem",
            "/etc/ssl/fullchain.pem",
            "/etc/ssl/chain.pem",
            "1700000000",
        ])
        .unwrap();
        assert_eq!(cli.args.len(), 6);
    }
}
