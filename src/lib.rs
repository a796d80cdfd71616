//! Main crate for the `dns01-hook` application.
//!
//! `dns01-hook` is a hook for dehydrated-style ACME clients that answers `dns-01` challenges by publishing
//! TXT records through a DNS provider API.
//!
//! The following modules might be of interest if you want to add new functionality:
//! - [`provider`]s are DNS services such as Google ACME DNS or name.com that ultimately serve the challenge records
//! - [`hook`] maps the hook verbs passed by the ACME client onto provider calls
//! - [`zone`] resolves challenge names to configured zones and their credentials

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod hook;
pub mod provider;
pub mod record;
pub mod zone;
